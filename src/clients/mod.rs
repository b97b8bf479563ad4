pub mod directory;
pub mod ldap;
pub mod static_directory;
