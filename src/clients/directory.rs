use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::clients::ldap::LdapDirectoryClient;
use crate::clients::static_directory::StaticDirectoryClient;
use crate::config::{DirectoryConfig, DirectoryKind};
use crate::domain::Role;

/// A person as reported by the organizational directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub employee_id: String,
    pub email: String,
    pub display_name: String,
    pub department: Option<String>,
    pub title: Option<String>,
    pub phone: Option<String>,
    pub manager: Option<String>,
    pub distinguished_name: Option<String>,
    /// Group DNs (or names) the entry belongs to.
    pub groups: Vec<String>,
    pub disabled: bool,
}

#[async_trait]
pub trait DirectoryClient: Send + Sync {
    fn kind(&self) -> DirectoryKind;

    /// Every user matched by the configured search.
    async fn fetch_users(&self) -> Result<Vec<DirectoryEntry>>;

    /// Checks `password` for the account with `email`.
    ///
    /// Returns `Ok(None)` for unknown accounts and wrong passwords; errors are
    /// reserved for an unreachable or misconfigured directory.
    async fn authenticate(&self, email: &str, password: &str) -> Result<Option<DirectoryEntry>>;
}

/// Builds the configured client, or `None` when the integration is off.
#[must_use]
pub fn build_client(config: &DirectoryConfig) -> Option<Arc<dyn DirectoryClient>> {
    if !config.enabled {
        return None;
    }

    let client: Arc<dyn DirectoryClient> = match config.kind {
        DirectoryKind::Ldap => Arc::new(LdapDirectoryClient::new(config.clone())),
        DirectoryKind::Static => Arc::new(StaticDirectoryClient::new(config.static_entries.clone())),
    };

    Some(client)
}

/// Highest role granted by any of the groups. Group DNs compare case-insensitively.
#[must_use]
pub fn derive_role(groups: &[String], config: &DirectoryConfig) -> Role {
    let member_of = |configured: &[String]| {
        configured.iter().any(|wanted| {
            groups
                .iter()
                .any(|group| normalize_dn(group) == normalize_dn(wanted))
        })
    };

    if member_of(&config.admin_groups) {
        Role::Admin
    } else if member_of(&config.manager_groups) {
        Role::Manager
    } else {
        Role::Viewer
    }
}

/// Lower-cases and drops whitespace around RDN separators.
pub(crate) fn normalize_dn(dn: &str) -> String {
    dn.split(',')
        .map(|part| part.trim().to_lowercase())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DirectoryConfig {
        DirectoryConfig {
            admin_groups: vec!["CN=IT-Admins,OU=Groups,DC=corp,DC=example".to_string()],
            manager_groups: vec!["cn=it-staff,ou=groups,dc=corp,dc=example".to_string()],
            ..DirectoryConfig::default()
        }
    }

    #[test]
    fn test_derive_role_prefers_highest() {
        let groups = vec![
            "cn=it-staff, ou=groups, dc=corp, dc=example".to_string(),
            "cn=it-admins,ou=groups,dc=corp,dc=example".to_string(),
        ];
        assert_eq!(derive_role(&groups, &config()), Role::Admin);
    }

    #[test]
    fn test_derive_role_manager_and_default() {
        let manager = vec!["CN=IT-Staff,OU=Groups,DC=corp,DC=example".to_string()];
        assert_eq!(derive_role(&manager, &config()), Role::Manager);

        let nobody = vec!["cn=sales,dc=corp,dc=example".to_string()];
        assert_eq!(derive_role(&nobody, &config()), Role::Viewer);
        assert_eq!(derive_role(&[], &config()), Role::Viewer);
    }

    #[test]
    fn test_build_client_respects_enabled_flag() {
        let mut config = DirectoryConfig::default();
        assert!(build_client(&config).is_none());

        config.enabled = true;
        config.kind = DirectoryKind::Static;
        let client = build_client(&config).unwrap();
        assert_eq!(client.kind(), DirectoryKind::Static);
    }
}
