use serde::{Deserialize, Serialize};

use crate::domain::{AuthSource, Role};
use crate::entities::users;

/// Login account as returned from the repository (never carries the password hash).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub auth_source: AuthSource,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            display_name: model.display_name,
            role: model.role.parse().unwrap_or_default(),
            auth_source: model.auth_source.parse().unwrap_or(AuthSource::Local),
            api_key: model.api_key,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub display_name: Option<String>,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}
