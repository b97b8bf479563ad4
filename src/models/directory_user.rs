use serde::{Deserialize, Serialize};

use super::{clean_text, double_option};
use crate::domain::{DirectorySource, Role};
use crate::entities::directory_users;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryUser {
    pub id: i32,
    pub employee_id: String,
    pub email: String,
    pub display_name: String,
    pub department: Option<String>,
    pub title: Option<String>,
    pub phone: Option<String>,
    pub manager: Option<String>,
    pub distinguished_name: Option<String>,
    pub source: DirectorySource,
    pub role: Role,
    pub active: bool,
    pub last_synced_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<directory_users::Model> for DirectoryUser {
    fn from(model: directory_users::Model) -> Self {
        Self {
            id: model.id,
            employee_id: model.employee_id,
            email: model.email,
            display_name: model.display_name,
            department: model.department,
            title: model.title,
            phone: model.phone,
            manager: model.manager,
            distinguished_name: model.distinguished_name,
            source: model.source.parse().unwrap_or(DirectorySource::Manual),
            role: model.role.parse().unwrap_or_default(),
            active: model.active,
            last_synced_at: model.last_synced_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Normalized column values shared by manual edits and directory sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryUserFields {
    pub employee_id: String,
    pub email: String,
    pub display_name: String,
    pub department: Option<String>,
    pub title: Option<String>,
    pub phone: Option<String>,
    pub manager: Option<String>,
    pub distinguished_name: Option<String>,
    pub source: DirectorySource,
    pub role: Role,
    pub active: bool,
}

impl DirectoryUserFields {
    #[must_use]
    pub fn from_user(user: &DirectoryUser) -> Self {
        Self {
            employee_id: user.employee_id.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            department: user.department.clone(),
            title: user.title.clone(),
            phone: user.phone.clone(),
            manager: user.manager.clone(),
            distinguished_name: user.distinguished_name.clone(),
            source: user.source,
            role: user.role,
            active: user.active,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryUserInput {
    pub employee_id: String,
    pub email: String,
    pub display_name: String,
    pub department: Option<String>,
    pub title: Option<String>,
    pub phone: Option<String>,
    pub manager: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

impl DirectoryUserInput {
    pub fn normalize(self) -> Result<DirectoryUserFields, String> {
        Ok(DirectoryUserFields {
            employee_id: normalize_employee_id(&self.employee_id)?,
            email: normalize_email(&self.email)?,
            display_name: normalize_display_name(&self.display_name)?,
            department: clean_text(self.department),
            title: clean_text(self.title),
            phone: clean_text(self.phone),
            manager: clean_text(self.manager),
            distinguished_name: None,
            source: DirectorySource::Manual,
            role: self.role,
            active: self.active,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectoryUserPatch {
    pub employee_id: Option<String>,
    pub email: Option<String>,
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub department: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub manager: Option<Option<String>>,
    pub role: Option<Role>,
    pub active: Option<bool>,
}

impl DirectoryUserPatch {
    pub fn apply(self, current: &DirectoryUser) -> Result<DirectoryUserFields, String> {
        let mut fields = DirectoryUserFields::from_user(current);

        if let Some(employee_id) = self.employee_id {
            fields.employee_id = normalize_employee_id(&employee_id)?;
        }
        if let Some(email) = self.email {
            fields.email = normalize_email(&email)?;
        }
        if let Some(display_name) = self.display_name {
            fields.display_name = normalize_display_name(&display_name)?;
        }
        if let Some(department) = self.department {
            fields.department = clean_text(department);
        }
        if let Some(title) = self.title {
            fields.title = clean_text(title);
        }
        if let Some(phone) = self.phone {
            fields.phone = clean_text(phone);
        }
        if let Some(manager) = self.manager {
            fields.manager = clean_text(manager);
        }
        if let Some(role) = self.role {
            fields.role = role;
        }
        if let Some(active) = self.active {
            fields.active = active;
        }

        Ok(fields)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectoryUserFilter {
    pub q: Option<String>,
    pub department: Option<String>,
    pub active: Option<bool>,
}

pub(crate) fn normalize_employee_id(value: &str) -> Result<String, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("Employee ID is required".to_string());
    }
    if value.len() > 64 {
        return Err("Employee ID must be 64 characters or less".to_string());
    }
    Ok(value.to_string())
}

pub(crate) fn normalize_email(value: &str) -> Result<String, String> {
    let value = value.trim().to_lowercase();
    if crate::api::validation::is_valid_email(&value) {
        Ok(value)
    } else {
        Err(format!("Invalid email address: '{value}'"))
    }
}

fn normalize_display_name(value: &str) -> Result<String, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("Display name is required".to_string());
    }
    Ok(value.to_string())
}
