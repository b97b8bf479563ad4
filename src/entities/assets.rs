use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "assets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub asset_tag: String,
    pub name: String,
    pub asset_type: String,
    pub status: String,
    pub category_id: Option<i32>,
    pub assigned_to: Option<i32>,
    pub serial_number: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub location: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    /// `YYYY-MM-DD`
    pub purchase_date: Option<String>,
    pub purchase_cost: Option<f64>,
    /// `YYYY-MM-DD`
    pub warranty_expires: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Categories,
    #[sea_orm(
        belongs_to = "super::directory_users::Entity",
        from = "Column::AssignedTo",
        to = "super::directory_users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    DirectoryUsers,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl Related<super::directory_users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DirectoryUsers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
