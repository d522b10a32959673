//! # Docket Console
//!
//! Application layer of the quotation/invoice console. Wires configuration,
//! storage backends and the chat notifier around the pure document logic,
//! and exposes the commands the `docket` binary runs.
//!
//! ## Module Organization
//! ```text
//! docket_console/
//! ├── lib.rs          ◄─── You are here (startup, AppState)
//! ├── config.rs       ◄─── Layered configuration (defaults, toml, env)
//! ├── service.rs      ◄─── Save orchestration + number allocation
//! ├── commands.rs     ◄─── list / show / next-number / new / check
//! ├── print.rs        ◄─── Plain-text page preview
//! ├── notify.rs       ◄─── Chat webhook notifier
//! ├── session.rs      ◄─── Operator identity
//! └── error.rs        ◄─── SaveError / ApiError
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. init_tracing        RUST_LOG or "info,docket=debug,sqlx=warn"      │
//! │  2. ConsoleConfig::load defaults → docket.toml → DOCKET__* env         │
//! │  3. AppState::connect                                                  │
//! │     • catalog:   Postgres when database_url is set, else memory        │
//! │     • documents: redis | postgres | memory                             │
//! │     • notifier:  webhook when webhook_url is set, else no-op           │
//! │  4. Run the command                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod notify;
pub mod print;
pub mod service;
pub mod session;

use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use docket_core::{NumberAllocator, PaginationConfig, TaxConfig};
use docket_db::{
    CatalogGateway, Database, DbConfig, DbError, DocumentGateway, KvDocumentStore, MemoryStore,
};

use crate::config::{ConsoleConfig, DocumentsBackend};
use crate::error::ApiError;
use crate::notify::{NoopNotifier, Notifier, WebhookNotifier};
use crate::service::DocumentService;

pub use config::ConfigError;
pub use error::{ErrorCode, SaveError};
pub use session::SessionContext;

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,docket=debug,sqlx=warn";

/// Installs the global subscriber. Logs go to stderr so command output
/// stays pipeable.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// =============================================================================
// Application State
// =============================================================================

/// Everything a command needs, built once at startup.
pub struct AppState {
    pub config: ConsoleConfig,
    pub pagination: PaginationConfig,
    pub tax: TaxConfig,
    pub service: DocumentService,
    pub catalog: Arc<dyn CatalogGateway>,
    database: Option<Database>,
}

impl AppState {
    /// Connects the configured backends.
    pub async fn connect(config: ConsoleConfig) -> Result<Self, ApiError> {
        config.validate()?;
        let pagination = config.pagination.to_config()?;
        let tax = config.tax.to_config()?;

        let database = match &config.storage.database_url {
            Some(url) => {
                let db_config = DbConfig::new(url.clone())
                    .max_connections(config.storage.max_connections)
                    .acquire_timeout(Duration::from_secs(config.storage.acquire_timeout_secs))
                    .run_migrations(config.storage.run_migrations);
                Some(Database::new(db_config).await?)
            }
            None => None,
        };

        let memory = Arc::new(MemoryStore::new());
        let catalog: Arc<dyn CatalogGateway> = match &database {
            Some(db) => Arc::new(db.catalog()),
            None => memory.clone(),
        };

        let documents: Arc<dyn DocumentGateway> = match config.storage.documents_backend {
            DocumentsBackend::Redis => {
                let url = config
                    .storage
                    .redis_url
                    .as_deref()
                    .ok_or_else(|| ApiError::from(DbError::ConnectionFailed("redis_url is not set".into())))?;
                Arc::new(KvDocumentStore::connect(url).await?)
            }
            DocumentsBackend::Postgres => match &database {
                Some(db) => Arc::new(db.documents()),
                None => {
                    return Err(DbError::ConnectionFailed("database_url is not set".into()).into());
                }
            },
            DocumentsBackend::Memory => memory,
        };

        let notifier: Arc<dyn Notifier> = match &config.notifications.webhook_url {
            Some(url) => Arc::new(
                WebhookNotifier::new(url.clone(), Duration::from_secs(config.notifications.timeout_secs))
                    .map_err(|e| ApiError::internal(e.to_string()))?,
            ),
            None => Arc::new(NoopNotifier),
        };

        info!(
            documents = documents.backend(),
            catalog = if database.is_some() { "postgres" } else { "memory" },
            notifications = config.notifications.webhook_url.is_some(),
            "Backends connected"
        );

        let service = DocumentService::new(
            documents,
            notifier,
            NumberAllocator::new(config.organization.prefix.clone()),
            config.save.max_number_retries,
        );

        Ok(AppState {
            config,
            pagination,
            tax,
            service,
            catalog,
            database,
        })
    }

    /// Builds state around existing gateways (tests, embedding).
    pub fn with_gateways(
        config: ConsoleConfig,
        documents: Arc<dyn DocumentGateway>,
        catalog: Arc<dyn CatalogGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ApiError> {
        let pagination = config.pagination.to_config()?;
        let tax = config.tax.to_config()?;
        let service = DocumentService::new(
            documents,
            notifier,
            NumberAllocator::new(config.organization.prefix.clone()),
            config.save.max_number_retries,
        );
        Ok(AppState {
            config,
            pagination,
            tax,
            service,
            catalog,
            database: None,
        })
    }

    pub async fn shutdown(&self) {
        if let Some(db) = &self.database {
            db.close().await;
        }
    }
}
