//! Domain primitives shared by storage, services and the HTTP layer.
//!
//! Every enumeration here is persisted as its lower-case string form, so the
//! `as_str` / `FromStr` pairs are the single source of truth for the stored
//! representation.

pub mod audit;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Access level of a local login account.
///
/// Variants are ordered so that `role >= Role::Manager` reads naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Viewer,
    Manager,
    Admin,
}

impl Role {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Manager => "manager",
            Self::Admin => "admin",
        }
    }

    #[must_use]
    pub fn allows(&self, required: Self) -> bool {
        *self >= required
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "viewer" | "user" | "readonly" => Ok(Self::Viewer),
            "manager" | "editor" => Ok(Self::Manager),
            "admin" | "administrator" => Ok(Self::Admin),
            other => Err(format!("Unknown role: {other}")),
        }
    }
}

/// Lifecycle state of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetStatus {
    #[default]
    Available,
    Assigned,
    Maintenance,
    Retired,
    Lost,
}

impl AssetStatus {
    pub const ALL: [Self; 5] = [
        Self::Available,
        Self::Assigned,
        Self::Maintenance,
        Self::Retired,
        Self::Lost,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Assigned => "assigned",
            Self::Maintenance => "maintenance",
            Self::Retired => "retired",
            Self::Lost => "lost",
        }
    }
}

impl fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();

        match normalized.as_str() {
            "available" | "instock" | "spare" | "unassigned" => Ok(Self::Available),
            "assigned" | "inuse" | "deployed" => Ok(Self::Assigned),
            "maintenance" | "repair" | "inrepair" => Ok(Self::Maintenance),
            "retired" | "disposed" | "decommissioned" => Ok(Self::Retired),
            "lost" | "stolen" | "missing" => Ok(Self::Lost),
            _ => Err(format!(
                "Invalid status '{}'. Expected one of: available, assigned, maintenance, retired, lost",
                s.trim()
            )),
        }
    }
}

/// Broad class of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    #[default]
    Hardware,
    Software,
}

impl AssetType {
    pub const ALL: [Self; 2] = [Self::Hardware, Self::Software];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Hardware => "hardware",
            Self::Software => "software",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hardware" | "hw" | "device" => Ok(Self::Hardware),
            "software" | "sw" | "license" | "licence" => Ok(Self::Software),
            other => Err(format!(
                "Invalid asset type '{other}'. Expected hardware or software"
            )),
        }
    }
}

/// Kind of record an audit entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Asset,
    Category,
    DirectoryUser,
    User,
    ImportTemplate,
}

impl EntityType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Category => "category",
            Self::DirectoryUser => "directory_user",
            Self::User => "user",
            Self::ImportTemplate => "import_template",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "asset" => Ok(Self::Asset),
            "category" => Ok(Self::Category),
            "directory_user" => Ok(Self::DirectoryUser),
            "user" => Ok(Self::User),
            "import_template" => Ok(Self::ImportTemplate),
            other => Err(format!("Unknown entity type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Assign,
    Unassign,
    Import,
    Sync,
}

impl AuditAction {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Assign => "assign",
            Self::Unassign => "unassign",
            Self::Import => "import",
            Self::Sync => "sync",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            "assign" => Ok(Self::Assign),
            "unassign" => Ok(Self::Unassign),
            "import" => Ok(Self::Import),
            "sync" => Ok(Self::Sync),
            other => Err(format!("Unknown audit action: {other}")),
        }
    }
}

/// Where a directory user record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectorySource {
    Ldap,
    Manual,
}

impl DirectorySource {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ldap => "ldap",
            Self::Manual => "manual",
        }
    }
}

impl FromStr for DirectorySource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ldap" => Ok(Self::Ldap),
            "manual" => Ok(Self::Manual),
            other => Err(format!("Unknown directory source: {other}")),
        }
    }
}

/// How a local login account authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthSource {
    Local,
    Directory,
}

impl AuthSource {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Directory => "directory",
        }
    }
}

impl FromStr for AuthSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "local" => Ok(Self::Local),
            "directory" => Ok(Self::Directory),
            other => Err(format!("Unknown auth source: {other}")),
        }
    }
}

/// Identity recorded on audit rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: Option<i32>,
    pub name: String,
}

impl Actor {
    #[must_use]
    pub fn user(id: i32, email: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: email.into(),
        }
    }

    /// Non-interactive actor such as the CLI or a directory sync run.
    #[must_use]
    pub fn system(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }
}
