use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Login identifier, stored lower-case
    #[sea_orm(unique)]
    pub email: String,

    pub display_name: String,

    /// Argon2id password hash. Empty for accounts that authenticate against the directory.
    pub password_hash: String,

    /// `admin`, `manager` or `viewer`
    pub role: String,

    /// Random API key (64-char hex string)
    #[sea_orm(unique)]
    pub api_key: String,

    /// `local` or `directory`
    pub auth_source: String,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
