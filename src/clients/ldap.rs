//! LDAP / Active Directory client built on `ldap3`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, Scope, SearchEntry, ldap_escape};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::clients::directory::{DirectoryClient, DirectoryEntry};
use crate::config::{DirectoryAttributeMap, DirectoryConfig, DirectoryKind};

/// `userAccountControl` flag for a disabled account.
const ACCOUNTDISABLE: u32 = 0x2;

/// LDAP result code for a rejected bind.
const INVALID_CREDENTIALS: u32 = 49;

pub struct LdapDirectoryClient {
    config: DirectoryConfig,
}

impl LdapDirectoryClient {
    #[must_use]
    pub const fn new(config: DirectoryConfig) -> Self {
        Self { config }
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_seconds.max(1))
    }

    /// Opens a connection and binds with the service account (or anonymously).
    async fn connect(&self) -> Result<Ldap> {
        let settings = LdapConnSettings::new().set_conn_timeout(self.timeout());

        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &self.config.url)
            .await
            .with_context(|| format!("Failed to connect to directory at {}", self.config.url))?;
        ldap3::drive!(conn);

        if !self.config.bind_dn.is_empty() {
            ldap.with_timeout(self.timeout())
                .simple_bind(&self.config.bind_dn, &self.config.bind_password)
                .await
                .context("Service bind failed")?
                .success()
                .context("Service bind was rejected")?;
        }

        Ok(ldap)
    }

    fn requested_attributes(&self) -> Vec<String> {
        let map = &self.config.attributes;
        [
            &map.employee_id,
            &map.email,
            &map.display_name,
            &map.department,
            &map.title,
            &map.phone,
            &map.manager,
            &map.member_of,
            &map.account_control,
        ]
        .into_iter()
        .filter(|attr| !attr.is_empty())
        .cloned()
        .collect()
    }

    async fn search(&self, ldap: &mut Ldap, filter: &str) -> Result<Vec<SearchEntry>> {
        let attrs = self.requested_attributes();

        let (entries, _) = ldap
            .with_timeout(self.timeout())
            .search(&self.config.base_dn, Scope::Subtree, filter, attrs)
            .await
            .context("Directory search failed")?
            .success()
            .context("Directory search was rejected")?;

        Ok(entries.into_iter().map(SearchEntry::construct).collect())
    }

    /// Fills in group membership with `compare` for servers that do not
    /// publish `memberOf`.
    async fn resolve_groups(&self, ldap: &mut Ldap, entry: &mut DirectoryEntry) -> Result<()> {
        if !entry.groups.is_empty() {
            return Ok(());
        }
        let Some(dn) = entry.distinguished_name.clone() else {
            return Ok(());
        };

        let configured = self
            .config
            .admin_groups
            .iter()
            .chain(self.config.manager_groups.iter());

        for group in configured {
            let is_member = ldap
                .with_timeout(self.timeout())
                .compare(group, "member", dn.as_bytes())
                .await
                .with_context(|| format!("Membership check against {group} failed"))?
                .equal()
                .unwrap_or(false);

            if is_member {
                entry.groups.push(group.clone());
            }
        }

        Ok(())
    }

    fn user_filter(&self) -> String {
        let filter = self.config.user_filter.trim();
        if filter.is_empty() {
            "(objectClass=person)".to_string()
        } else if filter.starts_with('(') {
            filter.to_string()
        } else {
            format!("({filter})")
        }
    }
}

#[async_trait]
impl DirectoryClient for LdapDirectoryClient {
    fn kind(&self) -> DirectoryKind {
        DirectoryKind::Ldap
    }

    async fn fetch_users(&self) -> Result<Vec<DirectoryEntry>> {
        let mut ldap = self.connect().await?;
        let raw = self.search(&mut ldap, &self.user_filter()).await?;
        let total = raw.len();

        let mut entries = Vec::with_capacity(total);
        for search_entry in raw {
            let Some(mut entry) = entry_from_attrs(
                search_entry.dn,
                &search_entry.attrs,
                &self.config.attributes,
            ) else {
                continue;
            };

            self.resolve_groups(&mut ldap, &mut entry).await?;
            entries.push(entry);
        }

        close(&mut ldap).await;

        if entries.len() < total {
            warn!(
                skipped = total - entries.len(),
                "Directory entries without an email or employee id were skipped"
            );
        }

        Ok(entries)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<Option<DirectoryEntry>> {
        // An empty password would turn the bind into an unauthenticated one.
        if password.is_empty() {
            return Ok(None);
        }

        let mut ldap = self.connect().await?;

        let filter = format!(
            "(&{}({}={}))",
            self.user_filter(),
            self.config.attributes.email,
            ldap_escape(email.trim())
        );

        let mut found = self.search(&mut ldap, &filter).await?;
        if found.len() != 1 {
            debug!(matches = found.len(), "Directory login lookup did not match exactly one entry");
            close(&mut ldap).await;
            return Ok(None);
        }

        let search_entry = found.remove(0);
        let Some(mut entry) =
            entry_from_attrs(search_entry.dn, &search_entry.attrs, &self.config.attributes)
        else {
            close(&mut ldap).await;
            return Ok(None);
        };

        if entry.disabled {
            close(&mut ldap).await;
            return Ok(None);
        }

        self.resolve_groups(&mut ldap, &mut entry).await?;

        let dn = entry.distinguished_name.clone().unwrap_or_default();
        let result = ldap
            .with_timeout(self.timeout())
            .simple_bind(&dn, password)
            .await
            .context("User bind failed")?;
        close(&mut ldap).await;

        match result.rc {
            0 => Ok(Some(entry)),
            INVALID_CREDENTIALS => Ok(None),
            rc => anyhow::bail!("Directory rejected bind with code {rc}: {}", result.text),
        }
    }
}

/// Case-insensitive first value of an attribute, blanks folded to `None`.
fn first_value(attrs: &HashMap<String, Vec<String>>, name: &str) -> Option<String> {
    if name.is_empty() {
        return None;
    }

    attrs
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .and_then(|(_, values)| values.first())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn all_values(attrs: &HashMap<String, Vec<String>>, name: &str) -> Vec<String> {
    attrs
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, values)| values.clone())
        .unwrap_or_default()
}

/// Maps one search result onto a [`DirectoryEntry`]. Entries without an
/// email or employee id cannot be matched to local records and are dropped.
pub(crate) fn entry_from_attrs(
    dn: String,
    attrs: &HashMap<String, Vec<String>>,
    map: &DirectoryAttributeMap,
) -> Option<DirectoryEntry> {
    let email = first_value(attrs, &map.email)?.to_lowercase();
    let employee_id = first_value(attrs, &map.employee_id)?;

    let display_name = first_value(attrs, &map.display_name).unwrap_or_else(|| email.clone());

    let disabled = first_value(attrs, &map.account_control)
        .and_then(|v| v.parse::<u32>().ok())
        .is_some_and(|flags| flags & ACCOUNTDISABLE != 0);

    Some(DirectoryEntry {
        employee_id,
        email,
        display_name,
        department: first_value(attrs, &map.department),
        title: first_value(attrs, &map.title),
        phone: first_value(attrs, &map.phone),
        manager: first_value(attrs, &map.manager),
        distinguished_name: Some(dn).filter(|dn| !dn.is_empty()),
        groups: all_values(attrs, &map.member_of),
        disabled,
    })
}

async fn close(ldap: &mut Ldap) {
    if let Err(e) = ldap.unbind().await {
        debug!(error = %e, "Directory unbind failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &[&str])]) -> HashMap<String, Vec<String>> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.iter().map(|s| (*s).to_string()).collect()))
            .collect()
    }

    #[test]
    fn test_entry_from_attrs_maps_fields() {
        let attrs = attrs(&[
            ("employeeID", &["1001"]),
            ("mail", &["Grace.Hopper@Corp.Example"]),
            ("displayName", &["Grace Hopper"]),
            ("department", &["Engineering"]),
            ("memberOf", &["cn=it-admins,dc=corp", "cn=all,dc=corp"]),
            ("userAccountControl", &["512"]),
        ]);

        let entry = entry_from_attrs(
            "cn=Grace Hopper,ou=People,dc=corp".to_string(),
            &attrs,
            &DirectoryAttributeMap::default(),
        )
        .unwrap();

        assert_eq!(entry.employee_id, "1001");
        assert_eq!(entry.email, "grace.hopper@corp.example");
        assert_eq!(entry.department.as_deref(), Some("Engineering"));
        assert_eq!(entry.groups.len(), 2);
        assert!(!entry.disabled);
    }

    #[test]
    fn test_entry_from_attrs_is_case_insensitive_and_detects_disabled() {
        let attrs = attrs(&[
            ("EMPLOYEEID", &["7"]),
            ("MAIL", &["x@corp.example"]),
            ("useraccountcontrol", &["514"]),
        ]);

        let entry =
            entry_from_attrs(String::new(), &attrs, &DirectoryAttributeMap::default()).unwrap();

        assert!(entry.disabled);
        assert_eq!(entry.display_name, "x@corp.example");
        assert_eq!(entry.distinguished_name, None);
    }

    #[test]
    fn test_entry_without_identifiers_is_dropped() {
        let no_id = attrs(&[("mail", &["a@corp.example"])]);
        assert!(entry_from_attrs("cn=a".to_string(), &no_id, &DirectoryAttributeMap::default()).is_none());

        let no_mail = attrs(&[("employeeID", &["1"])]);
        assert!(entry_from_attrs("cn=a".to_string(), &no_mail, &DirectoryAttributeMap::default()).is_none());
    }

    #[test]
    fn test_user_filter_wraps_bare_expressions() {
        let mut config = DirectoryConfig {
            user_filter: "objectClass=user".to_string(),
            ..DirectoryConfig::default()
        };
        assert_eq!(LdapDirectoryClient::new(config.clone()).user_filter(), "(objectClass=user)");

        config.user_filter = "(&(a=b)(c=d))".to_string();
        assert_eq!(LdapDirectoryClient::new(config).user_filter(), "(&(a=b)(c=d))");
    }
}
