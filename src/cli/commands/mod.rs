mod serve;
mod stats;
mod sync;
mod users;

pub use serve::cmd_serve;
pub use stats::cmd_stats;
pub use sync::cmd_sync_directory;
pub use users::cmd_create_user;
