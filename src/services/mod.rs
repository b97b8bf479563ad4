pub mod audit;
pub use audit::{AuditService, ExportFormat};

pub mod asset_service;
pub mod asset_service_impl;
pub use asset_service::{AssetError, AssetService};
pub use asset_service_impl::SeaOrmAssetService;

pub mod category_service;
pub mod category_service_impl;
pub use category_service::{CategoryError, CategoryService};
pub use category_service_impl::SeaOrmCategoryService;

pub mod directory_service;
pub mod directory_service_impl;
pub use directory_service::{DirectoryError, DirectoryService, DirectoryStatus, SyncReport};
pub use directory_service_impl::SeaOrmDirectoryService;

pub mod import_service;
pub mod import_service_impl;
pub use import_service::{ImportError, ImportReport, ImportRequest, ImportService};
pub use import_service_impl::SeaOrmImportService;

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService};
pub use auth_service_impl::SeaOrmAuthService;

pub mod system_service;
pub mod system_service_impl;
pub use system_service::{DashboardStats, SystemError, SystemService, SystemStatus};
pub use system_service_impl::SeaOrmSystemService;
