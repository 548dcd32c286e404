//! Disbursement service abstraction
//!
//! The faucet never signs or broadcasts transactions itself. It hands the
//! destination and amount to a [`Disburser`] and only looks at the receipt.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{DisbursementBackend, DisbursementConfig};
use crate::error::Result;

pub mod http;
pub mod mock;

pub use http::HttpDisburser;
pub use mock::{MockDisburser, MockOutcome};

/// An amount of a single denomination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub amount: u64,
    pub denom: String,
}

impl Coin {
    pub fn new(amount: u64, denom: impl Into<String>) -> Self {
        Coin {
            amount,
            denom: denom.into(),
        }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Result reported by the disbursement service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: String,
    /// Zero on success; any other value is a failed transaction
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub raw_log: Option<String>,
}

impl TxReceipt {
    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}

/// Something that can move funds to an identity
#[async_trait::async_trait]
pub trait Disburser: Send + Sync {
    /// Send `amount` to `destination`
    async fn disburse(&self, destination: &str, amount: &Coin) -> Result<TxReceipt>;

    /// Short name for logs
    fn name(&self) -> &str;
}

/// Build the configured disburser, or `None` when credentials are missing
pub fn from_config(config: &DisbursementConfig) -> Result<Option<Arc<dyn Disburser>>> {
    if !config.is_configured() {
        warn!("Disbursement service not configured, requests will be refused");
        return Ok(None);
    }

    let disburser: Arc<dyn Disburser> = match config.backend {
        DisbursementBackend::Mock => Arc::new(MockDisburser::new()),
        DisbursementBackend::Http => Arc::new(HttpDisburser::from_config(config)?),
    };

    info!("Using {} disburser", disburser.name());
    Ok(Some(disburser))
}
