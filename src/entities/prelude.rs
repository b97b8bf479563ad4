pub use super::assets::Entity as Assets;
pub use super::audit_logs::Entity as AuditLogs;
pub use super::categories::Entity as Categories;
pub use super::directory_users::Entity as DirectoryUsers;
pub use super::import_templates::Entity as ImportTemplates;
pub use super::users::Entity as Users;
