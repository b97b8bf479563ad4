use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::domain::DirectorySource;
use crate::entities::directory_users;
use crate::models::directory_user::{DirectoryUser, DirectoryUserFields, DirectoryUserFilter};
use crate::models::now_rfc3339;

pub struct DirectoryUserRepository {
    conn: DatabaseConnection,
}

impl DirectoryUserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self, filter: &DirectoryUserFilter) -> Result<Vec<DirectoryUser>> {
        let mut query = directory_users::Entity::find();

        if let Some(q) = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(directory_users::Column::DisplayName.contains(q))
                    .add(directory_users::Column::Email.contains(q.to_lowercase()))
                    .add(directory_users::Column::EmployeeId.contains(q)),
            );
        }

        if let Some(department) = filter.department.as_deref().filter(|d| !d.is_empty()) {
            query = query.filter(directory_users::Column::Department.eq(department));
        }

        if let Some(active) = filter.active {
            query = query.filter(directory_users::Column::Active.eq(active));
        }

        let rows = query
            .order_by_asc(directory_users::Column::DisplayName)
            .all(&self.conn)
            .await
            .context("Failed to list directory users")?;

        Ok(rows.into_iter().map(DirectoryUser::from).collect())
    }

    pub async fn list_by_source(&self, source: DirectorySource) -> Result<Vec<DirectoryUser>> {
        let rows = directory_users::Entity::find()
            .filter(directory_users::Column::Source.eq(source.as_str()))
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(DirectoryUser::from).collect())
    }

    pub async fn get(&self, id: i32) -> Result<Option<DirectoryUser>> {
        let row = directory_users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query directory user")?;

        Ok(row.map(DirectoryUser::from))
    }

    pub async fn get_by_employee_id(&self, employee_id: &str) -> Result<Option<DirectoryUser>> {
        let row = directory_users::Entity::find()
            .filter(directory_users::Column::EmployeeId.eq(employee_id.trim()))
            .one(&self.conn)
            .await?;

        Ok(row.map(DirectoryUser::from))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<DirectoryUser>> {
        let row = directory_users::Entity::find()
            .filter(directory_users::Column::Email.eq(email.trim().to_lowercase()))
            .one(&self.conn)
            .await?;

        Ok(row.map(DirectoryUser::from))
    }

    /// Returns the id of a record other than `except_id` already holding the
    /// employee id or email.
    pub async fn find_conflict(
        &self,
        employee_id: &str,
        email: &str,
        except_id: Option<i32>,
    ) -> Result<Option<DirectoryUser>> {
        let rows = directory_users::Entity::find()
            .filter(
                Condition::any()
                    .add(directory_users::Column::EmployeeId.eq(employee_id))
                    .add(directory_users::Column::Email.eq(email)),
            )
            .all(&self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(DirectoryUser::from)
            .find(|u| Some(u.id) != except_id))
    }

    pub async fn create(
        &self,
        fields: &DirectoryUserFields,
        synced_at: Option<String>,
    ) -> Result<DirectoryUser> {
        let now = now_rfc3339();
        let mut active = directory_users::ActiveModel {
            last_synced_at: Set(synced_at),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };
        apply_fields(&mut active, fields);

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert directory user")?;

        Ok(DirectoryUser::from(model))
    }

    pub async fn update(
        &self,
        id: i32,
        fields: &DirectoryUserFields,
        synced_at: Option<String>,
    ) -> Result<Option<DirectoryUser>> {
        let Some(row) = directory_users::Entity::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: directory_users::ActiveModel = row.into();
        apply_fields(&mut active, fields);
        if synced_at.is_some() {
            active.last_synced_at = Set(synced_at);
        }
        active.updated_at = Set(now_rfc3339());

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update directory user")?;

        Ok(Some(DirectoryUser::from(model)))
    }

    /// Stamps `last_synced_at` without touching anything else.
    pub async fn touch_synced(&self, id: i32, synced_at: &str) -> Result<()> {
        let Some(row) = directory_users::Entity::find_by_id(id).one(&self.conn).await? else {
            return Ok(());
        };

        let mut active: directory_users::ActiveModel = row.into();
        active.last_synced_at = Set(Some(synced_at.to_string()));
        active.update(&self.conn).await?;

        Ok(())
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = directory_users::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete directory user")?;

        Ok(result.rows_affected > 0)
    }

    /// Most recent sync timestamp across all records.
    pub async fn last_synced_at(&self) -> Result<Option<String>> {
        let row = directory_users::Entity::find()
            .filter(directory_users::Column::LastSyncedAt.is_not_null())
            .order_by_desc(directory_users::Column::LastSyncedAt)
            .one(&self.conn)
            .await?;

        Ok(row.and_then(|r| r.last_synced_at))
    }
}

fn apply_fields(active: &mut directory_users::ActiveModel, fields: &DirectoryUserFields) {
    active.employee_id = Set(fields.employee_id.clone());
    active.email = Set(fields.email.clone());
    active.display_name = Set(fields.display_name.clone());
    active.department = Set(fields.department.clone());
    active.title = Set(fields.title.clone());
    active.phone = Set(fields.phone.clone());
    active.manager = Set(fields.manager.clone());
    active.distinguished_name = Set(fields.distinguished_name.clone());
    active.source = Set(fields.source.as_str().to_string());
    active.role = Set(fields.role.as_str().to_string());
    active.active = Set(fields.active);
}
