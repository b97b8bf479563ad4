use axum::{
    Router,
    extract::OriginalUri,
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::session_store::ExpiredDeletion;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::SqliteStore;
use tracing::info;

use crate::config::{Config, ServerConfig, SessionStoreKind};
use crate::services::{
    AssetService, AuthService, CategoryService, DirectoryService, ImportService, SystemService,
};
use crate::state::SharedState;

mod assets;
mod audit;
pub mod auth;
mod categories;
mod dashboard;
mod directory;
mod error;
mod import;
mod observability;
mod system;
mod types;
mod ui;
mod users;
pub mod validation;

pub use error::ApiError;
pub use types::*;

/// Where login sessions live.
#[derive(Clone)]
pub enum SessionBackend {
    Memory(MemoryStore),
    Database(SqliteStore),
}

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub sessions: SessionBackend,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<Config> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn asset_service(&self) -> &Arc<dyn AssetService> {
        &self.shared.asset_service
    }

    #[must_use]
    pub fn category_service(&self) -> &Arc<dyn CategoryService> {
        &self.shared.category_service
    }

    #[must_use]
    pub fn directory_service(&self) -> &Arc<dyn DirectoryService> {
        &self.shared.directory_service
    }

    #[must_use]
    pub fn import_service(&self) -> &Arc<dyn ImportService> {
        &self.shared.import_service
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn system_service(&self) -> &Arc<dyn SystemService> {
        &self.shared.system_service
    }
}

pub async fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let sessions = match shared.config.server.session_store {
        SessionStoreKind::Memory => SessionBackend::Memory(MemoryStore::default()),
        SessionStoreKind::Database => {
            let pool = shared.store.conn.get_sqlite_connection_pool().clone();
            let store = SqliteStore::new(pool);
            store
                .migrate()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to prepare session table: {e}"))?;
            if let Err(e) = store.delete_expired().await {
                tracing::warn!(error = %e, "Failed to purge expired sessions");
            }
            SessionBackend::Database(store)
        }
    };

    info!(
        store = shared.config.server.session_store.as_str(),
        "Session store ready"
    );

    Ok(Arc::new(AppState {
        shared,
        sessions,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    }))
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    create_app_state(shared, prometheus_handle).await
}

fn session_layer<S: SessionStore + Clone>(
    store: S,
    server: &ServerConfig,
) -> SessionManagerLayer<S> {
    SessionManagerLayer::new(store)
        .with_name("assetdesk_session")
        .with_secure(server.secure_cookies)
        .with_http_only(true)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            server.session_inactivity_minutes,
        )))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let server = state.config().server.clone();

    let api_router = Router::new()
        .merge(create_protected_router(state.clone()))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/health", get(system::health))
        .fallback(api_not_found);

    let api_router = match &state.sessions {
        SessionBackend::Memory(store) => api_router.layer(session_layer(store.clone(), &server)),
        SessionBackend::Database(store) => {
            api_router.layer(session_layer(store.clone(), &server))
        }
    }
    .with_state(state.clone());

    let cors_layer = if server.cors_allowed_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = server
            .cors_allowed_origins
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .fallback(ui::serve_asset)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(middleware::from_fn(observability::security_headers_middleware))
        .layer(middleware::from_fn(observability::logging_middleware))
        .layer(TraceLayer::new_for_http())
}

async fn api_not_found(OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::NotFound(format!("No route for {}", uri.path()))
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/me", get(auth::get_current_user))
        .route("/auth/password", put(auth::change_password))
        .route("/auth/api-key", get(auth::get_api_key))
        .route(
            "/auth/api-key/regenerate",
            post(auth::regenerate_api_key),
        )
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/{id}", axum::routing::delete(users::delete_user))
        .route("/users/{id}/role", put(users::update_role))
        .route("/assets", get(assets::list_assets).post(assets::create_asset))
        .route("/assets/export", get(assets::export_assets))
        .route(
            "/assets/{id}",
            get(assets::get_asset)
                .put(assets::update_asset)
                .delete(assets::delete_asset),
        )
        .route("/assets/{id}/assign", post(assets::assign_asset))
        .route("/assets/{id}/history", get(assets::asset_history))
        .route(
            "/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route("/categories/tree", get(categories::category_tree))
        .route(
            "/categories/{id}",
            get(categories::get_category)
                .put(categories::update_category)
                .delete(categories::delete_category),
        )
        .route(
            "/directory-users",
            get(directory::list_directory_users).post(directory::create_directory_user),
        )
        .route(
            "/directory-users/{id}",
            get(directory::get_directory_user)
                .put(directory::update_directory_user)
                .delete(directory::delete_directory_user),
        )
        .route(
            "/directory-users/{id}/assets",
            get(directory::directory_user_assets),
        )
        .route("/directory/sync", post(directory::sync_directory))
        .route("/directory/status", get(directory::directory_status))
        .route("/audit", get(audit::list_audit))
        .route("/audit/export", get(audit::export_audit))
        .route("/audit/{id}", get(audit::get_audit_entry))
        .route("/import/preview", post(import::preview_import))
        .route("/import/assets", post(import::import_assets))
        .route(
            "/import/templates",
            get(import::list_templates).post(import::create_template),
        )
        .route(
            "/import/templates/{id}",
            put(import::update_template).delete(import::delete_template),
        )
        .route("/dashboard/stats", get(dashboard::get_stats))
        .route("/system/status", get(system::get_status))
        .route("/system/config", get(system::get_config))
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
