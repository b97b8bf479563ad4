use std::sync::Arc;

use crate::clients::directory::{DirectoryClient, build_client};
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AssetService, AuditService, AuthService, CategoryService, DirectoryService, ImportService,
    SeaOrmAssetService, SeaOrmAuthService, SeaOrmCategoryService, SeaOrmDirectoryService,
    SeaOrmImportService, SeaOrmSystemService, SystemService,
};

/// Store, configuration and the domain services built on top of them.
/// Shared by the HTTP layer and the CLI commands.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub audit: AuditService,

    pub directory_client: Option<Arc<dyn DirectoryClient>>,

    pub asset_service: Arc<dyn AssetService>,

    pub category_service: Arc<dyn CategoryService>,

    pub directory_service: Arc<dyn DirectoryService>,

    pub import_service: Arc<dyn ImportService>,

    pub auth_service: Arc<dyn AuthService>,

    pub system_service: Arc<dyn SystemService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Ok(Self::with_store(config, store))
    }

    #[must_use]
    pub fn with_store(config: Config, store: Store) -> Self {
        let config = Arc::new(config);
        let audit = AuditService::new(store.clone());
        let directory_client = build_client(&config.directory);

        let asset_service = Arc::new(SeaOrmAssetService::new(store.clone(), audit.clone()))
            as Arc<dyn AssetService + Send + Sync + 'static>;

        let category_service = Arc::new(SeaOrmCategoryService::new(store.clone(), audit.clone()))
            as Arc<dyn CategoryService + Send + Sync + 'static>;

        let directory_service = Arc::new(SeaOrmDirectoryService::new(
            store.clone(),
            audit.clone(),
            config.directory.clone(),
            directory_client.clone(),
        )) as Arc<dyn DirectoryService + Send + Sync + 'static>;

        let import_service = Arc::new(SeaOrmImportService::new(
            store.clone(),
            audit.clone(),
            asset_service.clone(),
            config.import.clone(),
        )) as Arc<dyn ImportService + Send + Sync + 'static>;

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            audit.clone(),
            config.security.clone(),
            config.directory.clone(),
            directory_client.clone(),
        )) as Arc<dyn AuthService + Send + Sync + 'static>;

        let system_service = Arc::new(SeaOrmSystemService::new(
            store.clone(),
            audit.clone(),
            config.clone(),
        )) as Arc<dyn SystemService + Send + Sync + 'static>;

        Self {
            config,
            store,
            audit,
            directory_client,
            asset_service,
            category_service,
            directory_service,
            import_service,
            auth_service,
            system_service,
        }
    }
}
