//! `SeaORM` implementation of the `SystemService` trait.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::audit::AuditService;
use crate::services::system_service::{DashboardStats, SystemError, SystemService, SystemStatus};

pub struct SeaOrmSystemService {
    store: Store,
    audit: AuditService,
    config: Arc<Config>,
}

impl SeaOrmSystemService {
    #[must_use]
    pub const fn new(store: Store, audit: AuditService, config: Arc<Config>) -> Self {
        Self {
            store,
            audit,
            config,
        }
    }
}

#[async_trait]
impl SystemService for SeaOrmSystemService {
    async fn dashboard(&self) -> Result<DashboardStats, SystemError> {
        let stats = self.store.stats();
        let window = self.config.dashboard.warranty_window_days;

        let today = Utc::now().date_naive();
        let until = today + Duration::days(window);

        let expiring_warranties = stats
            .warranties_expiring(
                &today.format("%Y-%m-%d").to_string(),
                &until.format("%Y-%m-%d").to_string(),
            )
            .await?;

        let recent_activity = self
            .audit
            .recent(self.config.dashboard.recent_activity_limit)
            .await?;

        Ok(DashboardStats {
            totals: stats.totals().await?,
            by_status: stats.by_status().await?,
            by_type: stats.by_type().await?,
            by_category: stats.by_category().await?,
            warranty_window_days: window,
            expiring_warranties,
            recent_activity,
        })
    }

    async fn status(&self, uptime_secs: u64, version: &str) -> SystemStatus {
        let database = match self.store.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Database ping failed");
                false
            }
        };

        let directory = &self.config.directory;

        SystemStatus {
            version: version.to_string(),
            uptime: uptime_secs,
            database,
            directory_enabled: directory.enabled,
            directory_kind: directory
                .enabled
                .then(|| directory.kind.as_str().to_string()),
            session_store: self.config.server.session_store.as_str().to_string(),
        }
    }

    fn redacted_config(&self) -> Config {
        self.config.redacted()
    }
}
