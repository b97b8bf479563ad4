//! Directory backed by entries from the config file.

use anyhow::Result;
use async_trait::async_trait;

use crate::clients::directory::{DirectoryClient, DirectoryEntry};
use crate::config::{DirectoryKind, StaticDirectoryEntry};

pub struct StaticDirectoryClient {
    entries: Vec<StaticDirectoryEntry>,
}

impl StaticDirectoryClient {
    #[must_use]
    pub const fn new(entries: Vec<StaticDirectoryEntry>) -> Self {
        Self { entries }
    }
}

impl From<&StaticDirectoryEntry> for DirectoryEntry {
    fn from(entry: &StaticDirectoryEntry) -> Self {
        Self {
            employee_id: entry.employee_id.trim().to_string(),
            email: entry.email.trim().to_lowercase(),
            display_name: entry.display_name.trim().to_string(),
            department: entry.department.clone(),
            title: entry.title.clone(),
            phone: entry.phone.clone(),
            manager: entry.manager.clone(),
            distinguished_name: None,
            groups: entry.groups.clone(),
            disabled: entry.disabled,
        }
    }
}

#[async_trait]
impl DirectoryClient for StaticDirectoryClient {
    fn kind(&self) -> DirectoryKind {
        DirectoryKind::Static
    }

    async fn fetch_users(&self) -> Result<Vec<DirectoryEntry>> {
        Ok(self.entries.iter().map(DirectoryEntry::from).collect())
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<Option<DirectoryEntry>> {
        let email = email.trim().to_lowercase();

        let matched = self.entries.iter().find(|entry| {
            !entry.disabled
                && entry.email.trim().to_lowercase() == email
                && entry
                    .password
                    .as_deref()
                    .is_some_and(|expected| !password.is_empty() && expected == password)
        });

        Ok(matched.map(DirectoryEntry::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> StaticDirectoryClient {
        StaticDirectoryClient::new(vec![
            StaticDirectoryEntry {
                employee_id: "E1".to_string(),
                email: "Ada@Example.com".to_string(),
                display_name: "Ada".to_string(),
                password: Some("secret".to_string()),
                ..StaticDirectoryEntry::default()
            },
            StaticDirectoryEntry {
                employee_id: "E2".to_string(),
                email: "bob@example.com".to_string(),
                display_name: "Bob".to_string(),
                password: Some("secret".to_string()),
                disabled: true,
                ..StaticDirectoryEntry::default()
            },
        ])
    }

    #[tokio::test]
    async fn test_fetch_users_normalizes_email() {
        let users = client().fetch_users().await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].email, "ada@example.com");
        assert!(users[1].disabled);
    }

    #[tokio::test]
    async fn test_authenticate() {
        let client = client();
        assert!(client.authenticate("ada@example.com", "secret").await.unwrap().is_some());
        assert!(client.authenticate("ada@example.com", "nope").await.unwrap().is_none());
        assert!(client.authenticate("ada@example.com", "").await.unwrap().is_none());
        assert!(client.authenticate("bob@example.com", "secret").await.unwrap().is_none());
        assert!(client.authenticate("eve@example.com", "secret").await.unwrap().is_none());
    }
}
