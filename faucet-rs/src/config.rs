//! Configuration for faucet-rs

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::disburse::Coin;
use crate::error::{FaucetError, Result};

/// Main faucet configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FaucetConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Daily quota and ledger configuration
    #[serde(default)]
    pub quota: QuotaConfig,
    /// Disbursement service configuration
    #[serde(default)]
    pub disbursement: DisbursementConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Listen address (e.g., "0.0.0.0:3000")
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Bearer token for admin routes. Unset leaves them unmounted.
    #[serde(default)]
    pub admin_token: Option<String>,
}

/// Which calendar decides where a day ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DayBoundary {
    /// Process-local midnight
    #[default]
    Local,
    /// UTC midnight
    Utc,
}

/// Quota configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QuotaConfig {
    /// Successful requests allowed per identity per day
    #[serde(default = "default_daily_limit")]
    pub daily_limit: u32,
    /// Path of the persisted ledger
    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,
    /// Day boundary used for counting and for the nightly reset
    #[serde(default)]
    pub timezone: DayBoundary,
}

/// Disbursement backend selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisbursementBackend {
    /// Remote signing service reached over HTTP
    #[default]
    Http,
    /// In-process mock that always succeeds
    Mock,
}

/// Disbursement configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DisbursementConfig {
    #[serde(default)]
    pub backend: DisbursementBackend,
    /// Base URL of the disbursement service
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Credential for the disbursement service. Unset means unconfigured.
    #[serde(default)]
    pub api_token: Option<String>,
    /// Amount sent per request, in base units
    #[serde(default = "default_amount")]
    pub amount: u64,
    #[serde(default = "default_denom")]
    pub denom: String,
    #[serde(default = "default_fee_amount")]
    pub fee_amount: u64,
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
    /// Upper bound on a single disbursement call
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Required bech32 prefix for destination addresses (e.g., "osmo")
    #[serde(default)]
    pub address_prefix: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// "pretty" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_listen_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_daily_limit() -> u32 {
    2
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("requests.json")
}

fn default_endpoint() -> String {
    "http://127.0.0.1:1317".to_string()
}

fn default_amount() -> u64 {
    100_000
}

fn default_denom() -> String {
    "uosmo".to_string()
}

fn default_fee_amount() -> u64 {
    5_000
}

fn default_gas_limit() -> u64 {
    200_000
}

fn default_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            admin_token: None,
        }
    }
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            daily_limit: default_daily_limit(),
            ledger_path: default_ledger_path(),
            timezone: DayBoundary::default(),
        }
    }
}

impl Default for DisbursementConfig {
    fn default() -> Self {
        Self {
            backend: DisbursementBackend::default(),
            endpoint: default_endpoint(),
            api_token: None,
            amount: default_amount(),
            denom: default_denom(),
            fee_amount: default_fee_amount(),
            gas_limit: default_gas_limit(),
            timeout_seconds: default_timeout(),
            address_prefix: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl ServerConfig {
    /// Admin token, if one is set and not blank
    pub fn admin_token(&self) -> Option<&str> {
        self.admin_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }
}

impl DisbursementConfig {
    /// Amount sent on every successful request
    pub fn coin(&self) -> Coin {
        Coin::new(self.amount, self.denom.clone())
    }

    /// Fee attached to every transfer
    pub fn fee(&self) -> Coin {
        Coin::new(self.fee_amount, self.denom.clone())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Whether credentials for the service are present
    pub fn is_configured(&self) -> bool {
        match self.backend {
            DisbursementBackend::Mock => true,
            DisbursementBackend::Http => self
                .api_token
                .as_deref()
                .is_some_and(|token| !token.trim().is_empty()),
        }
    }
}

impl FaucetConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FaucetError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| FaucetError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load an optional TOML file overlaid with `FAUCET__SECTION__KEY` variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix("FAUCET")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Create a default development configuration
    pub fn development() -> Self {
        Self {
            server: ServerConfig {
                listen_addr: "127.0.0.1:3000".to_string(),
                admin_token: None,
            },
            quota: QuotaConfig {
                ledger_path: PathBuf::from("data/requests.json"),
                ..Default::default()
            },
            disbursement: DisbursementConfig {
                backend: DisbursementBackend::Mock,
                ..Default::default()
            },
            logging: LoggingConfig::default(),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.quota.daily_limit == 0 {
            return Err(FaucetError::Config(
                "quota.daily_limit must be at least 1".to_string(),
            ));
        }

        let disbursement = &self.disbursement;
        if disbursement.amount == 0 {
            return Err(FaucetError::Config(
                "disbursement.amount must be positive".to_string(),
            ));
        }
        if disbursement.denom.trim().is_empty() {
            return Err(FaucetError::Config(
                "disbursement.denom must not be empty".to_string(),
            ));
        }
        if disbursement.timeout_seconds == 0 {
            return Err(FaucetError::Config(
                "disbursement.timeout_seconds must be positive".to_string(),
            ));
        }

        if disbursement.backend == DisbursementBackend::Http {
            reqwest::Url::parse(&disbursement.endpoint).map_err(|e| {
                FaucetError::Config(format!(
                    "Invalid disbursement endpoint '{}': {}",
                    disbursement.endpoint, e
                ))
            })?;
        }

        Ok(())
    }
}
