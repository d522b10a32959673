//! # Console Configuration
//!
//! Loaded once at startup and read-only afterwards.
//!
//! ## Sources (later wins)
//! 1. Defaults (this file)
//! 2. `docket.toml` (optional, path overridable with `--config`)
//! 3. Environment variables `DOCKET__<SECTION>__<KEY>`,
//!    e.g. `DOCKET__STORAGE__REDIS_URL`
//!
//! ```toml
//! [organization]
//! prefix = "ACME"
//! name = "Acme Geotechnical Services"
//!
//! [pagination]
//! items_first_page = 8
//!
//! [tax]
//! cgst_percent = 9.0
//!
//! [storage]
//! documents_backend = "redis"
//! redis_url = "redis://127.0.0.1/"
//! database_url = "postgres://docket@localhost/docket"
//! ```

use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use docket_core::pagination::PaginationConfig;
use docket_core::validation::validate_capacity;
use docket_core::{Rate, TaxConfig, ValidationError, DEFAULT_ORG_PREFIX};

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "docket.toml";

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub organization: OrganizationConfig,
    pub pagination: PaginationSettings,
    pub tax: TaxSettings,
    pub storage: StorageConfig,
    pub notifications: NotificationConfig,
    pub save: SaveConfig,
}

/// Letterhead and numbering prefix.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizationConfig {
    /// First segment of every document number.
    pub prefix: String,
    pub name: String,
    pub address: Vec<String>,
    pub gstin: Option<String>,
    pub bank: BankDetails,
}

impl Default for OrganizationConfig {
    fn default() -> Self {
        OrganizationConfig {
            prefix: DEFAULT_ORG_PREFIX.to_string(),
            name: "Docket Dev Organization".to_string(),
            address: Vec::new(),
            gstin: None,
            bank: BankDetails::default(),
        }
    }
}

/// Printed on the bank details page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BankDetails {
    pub account_name: String,
    pub account_number: String,
    pub bank_name: String,
    pub branch: String,
    pub ifsc: String,
}

/// Raw page capacities. Zero is rejected when converted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationSettings {
    pub items_first_page: usize,
    pub items_continuation_page: usize,
    pub term_groups_first_page: usize,
    pub term_groups_continuation_page: usize,
    pub technical_groups_first_page: usize,
    pub technical_groups_continuation_page: usize,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        let defaults = PaginationConfig::default();
        PaginationSettings {
            items_first_page: defaults.items_first_page.get(),
            items_continuation_page: defaults.items_continuation_page.get(),
            term_groups_first_page: defaults.term_groups_first_page.get(),
            term_groups_continuation_page: defaults.term_groups_continuation_page.get(),
            technical_groups_first_page: defaults.technical_groups_first_page.get(),
            technical_groups_continuation_page: defaults.technical_groups_continuation_page.get(),
        }
    }
}

impl PaginationSettings {
    pub fn to_config(&self) -> Result<PaginationConfig, ValidationError> {
        let items = validate_capacity("items", self.items_first_page, self.items_continuation_page)?;
        let terms = validate_capacity(
            "term groups",
            self.term_groups_first_page,
            self.term_groups_continuation_page,
        )?;
        let technicals = validate_capacity(
            "technical groups",
            self.technical_groups_first_page,
            self.technical_groups_continuation_page,
        )?;

        Ok(PaginationConfig {
            items_first_page: items.first,
            items_continuation_page: items.continuation,
            term_groups_first_page: terms.first,
            term_groups_continuation_page: terms.continuation,
            technical_groups_first_page: technicals.first,
            technical_groups_continuation_page: technicals.continuation,
        })
    }
}

/// GST percentages. Unset means 9% each.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxSettings {
    pub cgst_percent: Option<f64>,
    pub sgst_percent: Option<f64>,
}

impl TaxSettings {
    pub fn to_config(&self) -> Result<TaxConfig, ValidationError> {
        let cgst = self
            .cgst_percent
            .map(|pct| Rate::from_percentage("cgst", pct))
            .transpose()?;
        let sgst = self
            .sgst_percent
            .map(|pct| Rate::from_percentage("sgst", pct))
            .transpose()?;
        Ok(TaxConfig::new(cgst, sgst))
    }
}

/// Where document records live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentsBackend {
    /// The managed key-value store.
    Redis,
    Postgres,
    /// Process memory; nothing survives exit.
    #[default]
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub documents_backend: DocumentsBackend,
    /// Postgres URL. Also the catalog source whenever set.
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub max_connections: u32,
    /// Seconds to wait for a pooled Postgres connection.
    pub acquire_timeout_secs: u64,
    /// Apply embedded migrations on connect. Off when the schema is managed elsewhere.
    pub run_migrations: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            documents_backend: DocumentsBackend::Memory,
            database_url: None,
            redis_url: None,
            max_connections: 5,
            acquire_timeout_secs: 30,
            run_migrations: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Chat webhook receiving `{"text": ...}` posts. Unset disables notifications.
    pub webhook_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        NotificationConfig {
            webhook_url: None,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveConfig {
    /// Re-allocations after a duplicate number before giving up.
    pub max_number_retries: u32,
}

impl Default for SaveConfig {
    fn default() -> Self {
        SaveConfig { max_number_retries: 3 }
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] ValidationError),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

impl ConsoleConfig {
    /// Loads defaults, then `path` (if it exists), then `DOCKET__*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));

        let settings = Config::builder()
            .add_source(File::from(file).required(path.is_some()))
            .add_source(
                Environment::with_prefix("DOCKET")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: ConsoleConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field requirements the types cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pagination.to_config()?;
        self.tax.to_config()?;

        match self.storage.documents_backend {
            DocumentsBackend::Redis if self.storage.redis_url.is_none() => {
                Err(ConfigError::MissingRequired("storage.redis_url".to_string()))
            }
            DocumentsBackend::Postgres if self.storage.database_url.is_none() => {
                Err(ConfigError::MissingRequired("storage.database_url".to_string()))
            }
            _ => Ok(()),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
