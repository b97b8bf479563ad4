pub mod asset;
pub mod audit;
pub mod category;
pub mod directory_user;
pub mod import_template;
pub mod stats;
pub mod user;
