pub mod prelude;

pub mod assets;
pub mod audit_logs;
pub mod categories;
pub mod directory_users;
pub mod import_templates;
pub mod users;
