use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Placeholder written over secrets when the config is shown through the API.
pub const REDACTED: &str = "********";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub security: SecurityConfig,

    pub directory: DirectoryConfig,

    pub import: ImportConfig,

    pub dashboard: DashboardConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    pub max_db_connections: u32,

    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/assetdesk.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStoreKind {
    #[default]
    Memory,
    Database,
}

impl SessionStoreKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Database => "database",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,

    /// Whether to set the Secure flag on session cookies.
    /// Set to false for local development without HTTPS.
    pub secure_cookies: bool,

    /// Sessions expire after this many minutes without a request.
    pub session_inactivity_minutes: i64,

    pub session_store: SessionStoreKind,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            cors_allowed_origins: vec![
                "http://localhost:8080".to_string(),
                "http://127.0.0.1:8080".to_string(),
            ],
            secure_cookies: true,
            session_inactivity_minutes: 480,
            session_store: SessionStoreKind::Memory,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    pub argon2_parallelism: u32,

    pub min_password_length: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            min_password_length: 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryKind {
    #[default]
    Ldap,
    Static,
}

impl DirectoryKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ldap => "ldap",
            Self::Static => "static",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub enabled: bool,

    pub kind: DirectoryKind,

    /// `ldap://host:389` or `ldaps://host:636`
    pub url: String,

    pub bind_dn: String,

    pub bind_password: String,

    pub base_dn: String,

    pub user_filter: String,

    pub timeout_seconds: u64,

    pub attributes: DirectoryAttributeMap,

    /// Members of any of these groups get the `admin` role.
    pub admin_groups: Vec<String>,

    /// Members of any of these groups get the `manager` role.
    pub manager_groups: Vec<String>,

    /// Let directory accounts sign in with their directory password.
    pub allow_directory_login: bool,

    /// Entries served by the `static` directory kind.
    pub static_entries: Vec<StaticDirectoryEntry>,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            kind: DirectoryKind::Ldap,
            url: "ldap://localhost:389".to_string(),
            bind_dn: String::new(),
            bind_password: String::new(),
            base_dn: String::new(),
            user_filter: "(&(objectClass=person)(mail=*))".to_string(),
            timeout_seconds: 10,
            attributes: DirectoryAttributeMap::default(),
            admin_groups: Vec::new(),
            manager_groups: Vec::new(),
            allow_directory_login: false,
            static_entries: Vec::new(),
        }
    }
}

/// LDAP attribute names used to fill directory user fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryAttributeMap {
    pub employee_id: String,
    pub email: String,
    pub display_name: String,
    pub department: String,
    pub title: String,
    pub phone: String,
    pub manager: String,
    pub member_of: String,
    /// Active Directory `userAccountControl`; bit 2 marks the account disabled.
    pub account_control: String,
}

impl Default for DirectoryAttributeMap {
    fn default() -> Self {
        Self {
            employee_id: "employeeID".to_string(),
            email: "mail".to_string(),
            display_name: "displayName".to_string(),
            department: "department".to_string(),
            title: "title".to_string(),
            phone: "telephoneNumber".to_string(),
            manager: "manager".to_string(),
            member_of: "memberOf".to_string(),
            account_control: "userAccountControl".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticDirectoryEntry {
    pub employee_id: String,
    pub email: String,
    pub display_name: String,
    pub department: Option<String>,
    pub title: Option<String>,
    pub phone: Option<String>,
    pub manager: Option<String>,
    pub groups: Vec<String>,
    /// Password accepted for directory login. Entries without one cannot sign in.
    pub password: Option<String>,
    pub disabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub max_rows: usize,

    pub sample_rows: usize,

    /// Suggestions scoring below this are dropped (0.0 - 1.0).
    pub suggestion_threshold: f64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_rows: 5000,
            sample_rows: 5,
            suggestion_threshold: 0.6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub warranty_window_days: i64,

    pub recent_activity_limit: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            warranty_window_days: 30,
            recent_activity_limit: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,

    pub loki_labels: HashMap<String, String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let mut labels = HashMap::new();
        labels.insert("app".to_string(), "assetdesk".to_string());

        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
            loki_labels: labels,
        }
    }
}

impl Config {
    /// Loads from `ASSETDESK_CONFIG` if set, otherwise the first existing
    /// file on the search path, otherwise defaults.
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var("ASSETDESK_CONFIG") {
            return Self::load_from_path(Path::new(&path));
        }

        for path in &Self::config_paths() {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("assetdesk").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".assetdesk").join("config.toml"));
        }

        paths
    }

    /// Writes a default config to `path` unless one exists. Returns whether a file was written.
    pub fn create_default_if_missing(path: &Path) -> Result<bool> {
        if path.exists() {
            Ok(false)
        } else {
            Self::default().save_to_path(path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.general.database_path.trim().is_empty() {
            anyhow::bail!("general.database_path cannot be empty");
        }

        if self.general.min_db_connections > self.general.max_db_connections {
            anyhow::bail!("general.min_db_connections cannot exceed max_db_connections");
        }

        if self.server.session_inactivity_minutes <= 0 {
            anyhow::bail!("server.session_inactivity_minutes must be > 0");
        }

        if self.security.min_password_length < 4 {
            anyhow::bail!("security.min_password_length must be at least 4");
        }

        if !(0.0..=1.0).contains(&self.import.suggestion_threshold) {
            anyhow::bail!("import.suggestion_threshold must be between 0.0 and 1.0");
        }

        if self.import.max_rows == 0 {
            anyhow::bail!("import.max_rows must be > 0");
        }

        if self.dashboard.warranty_window_days < 0 {
            anyhow::bail!("dashboard.warranty_window_days cannot be negative");
        }

        if self.directory.enabled {
            match self.directory.kind {
                DirectoryKind::Ldap => {
                    let url = url::Url::parse(&self.directory.url)
                        .with_context(|| format!("Invalid directory.url: {}", self.directory.url))?;
                    if !matches!(url.scheme(), "ldap" | "ldaps") {
                        anyhow::bail!("directory.url must use the ldap:// or ldaps:// scheme");
                    }
                    if self.directory.base_dn.trim().is_empty() {
                        anyhow::bail!("directory.base_dn is required when the LDAP directory is enabled");
                    }
                }
                DirectoryKind::Static => {
                    if self.directory.static_entries.is_empty() {
                        anyhow::bail!("directory.static_entries is empty; nothing to sync");
                    }
                }
            }
        }

        Ok(())
    }

    /// Copy safe to show to administrators: passwords replaced by [`REDACTED`].
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();

        if !config.directory.bind_password.is_empty() {
            config.directory.bind_password = REDACTED.to_string();
        }
        for entry in &mut config.directory.static_entries {
            if entry.password.is_some() {
                entry.password = Some(REDACTED.to_string());
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert!(!config.directory.enabled);
        assert_eq!(config.import.max_rows, 5000);
        assert_eq!(config.dashboard.warranty_window_days, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[directory]"));
        assert!(toml_str.contains("[import]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [directory]
            enabled = true
            kind = "static"

            [[directory.static_entries]]
            employee_id = "E1"
            email = "a@example.com"
            display_name = "A"
            groups = ["cn=it"]
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.directory.kind, DirectoryKind::Static);
        assert_eq!(config.directory.static_entries.len(), 1);
        assert_eq!(config.server.port, 8080);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_ldap_without_base_dn() {
        let mut config = Config::default();
        config.directory.enabled = true;
        config.directory.url = "ldap://dc.example.com".to_string();

        assert!(config.validate().is_err());

        config.directory.base_dn = "dc=example,dc=com".to_string();
        assert!(config.validate().is_ok());

        config.directory.url = "http://dc.example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_threshold_out_of_range() {
        let mut config = Config::default();
        config.import.suggestion_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_redacted_hides_passwords() {
        let mut config = Config::default();
        config.directory.bind_password = "hunter2".to_string();
        config.directory.static_entries.push(StaticDirectoryEntry {
            password: Some("pw".to_string()),
            ..StaticDirectoryEntry::default()
        });

        let redacted = config.redacted();
        assert_eq!(redacted.directory.bind_password, REDACTED);
        assert_eq!(
            redacted.directory.static_entries[0].password.as_deref(),
            Some(REDACTED)
        );
        assert_eq!(config.directory.bind_password, "hunter2");
    }
}
