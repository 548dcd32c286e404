use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::outcome::FaucetOutcome;
use crate::clock::Clock;
use crate::config::FaucetConfig;
use crate::disburse::{Coin, Disburser};
use crate::error::FaucetError;
use crate::quota::{Decision, QuotaEngine};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Front door of the faucet.
///
/// Funds are sent before usage is committed, so a failed or timed-out
/// transfer leaves the identity's quota untouched.
pub struct FaucetService {
    engine: Arc<QuotaEngine>,
    disburser: Option<Arc<dyn Disburser>>,
    amount: Coin,
    clock: Clock,
    timeout: Duration,
    address_prefix: Option<String>,
}

impl FaucetService {
    /// Create a service. `disburser` is `None` when no credentials are set.
    pub fn new(
        engine: Arc<QuotaEngine>,
        disburser: Option<Arc<dyn Disburser>>,
        amount: Coin,
        clock: Clock,
    ) -> Self {
        Self {
            engine,
            disburser,
            amount,
            clock,
            timeout: DEFAULT_TIMEOUT,
            address_prefix: None,
        }
    }

    /// Create a service from the disbursement and quota sections of `config`
    pub fn from_config(
        config: &FaucetConfig,
        engine: Arc<QuotaEngine>,
        disburser: Option<Arc<dyn Disburser>>,
    ) -> Self {
        Self::new(
            engine,
            disburser,
            config.disbursement.coin(),
            config.quota.timezone.into(),
        )
        .with_timeout(config.disbursement.timeout())
        .with_address_prefix(config.disbursement.address_prefix.clone())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Require destinations to be bech32 addresses with this prefix
    pub fn with_address_prefix(mut self, prefix: Option<String>) -> Self {
        self.address_prefix = prefix.filter(|p| !p.is_empty());
        self
    }

    pub fn engine(&self) -> &Arc<QuotaEngine> {
        &self.engine
    }

    pub fn clock(&self) -> Clock {
        self.clock
    }

    fn validate_identity<'a>(&self, identity: Option<&'a str>) -> Result<&'a str, String> {
        let identity = identity
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| "Wallet address is required.".to_string())?;

        if let Some(prefix) = &self.address_prefix {
            let hrp = format!("{}1", prefix);
            if !identity.starts_with(&hrp) || identity.len() == hrp.len() {
                return Err(format!("Wallet address must start with '{}'.", hrp));
            }
        }

        Ok(identity)
    }

    /// Serve one request for `identity`.
    ///
    /// Once past validation the request runs to completion even if the
    /// returned future is dropped.
    pub async fn handle_request(&self, identity: Option<&str>) -> FaucetOutcome {
        let identity = match self.validate_identity(identity) {
            Ok(identity) => identity,
            Err(reason) => {
                debug!("Rejected request: {}", reason);
                return FaucetOutcome::InvalidRequest { reason };
            }
        };

        let disburser = match &self.disburser {
            Some(disburser) => disburser,
            None => {
                error!("Request for {} refused: disbursement service not configured", identity);
                return FaucetOutcome::ServiceUnavailable {
                    reason: "Disbursement service not configured.".to_string(),
                };
            }
        };

        let request = Disbursal {
            engine: Arc::clone(&self.engine),
            disburser: Arc::clone(disburser),
            amount: self.amount.clone(),
            identity: identity.to_string(),
            today: self.clock.today(),
            timeout: self.timeout,
        };

        // Detached so a dropped caller cannot cancel between send and commit
        match tokio::spawn(request.run()).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Request for {} aborted: {}", identity, e);
                FaucetOutcome::ServiceUnavailable {
                    reason: "Request could not be completed.".to_string(),
                }
            }
        }
    }
}

/// One approved request, from reservation to commit
struct Disbursal {
    engine: Arc<QuotaEngine>,
    disburser: Arc<dyn Disburser>,
    amount: Coin,
    identity: String,
    today: NaiveDate,
    timeout: Duration,
}

impl Disbursal {
    async fn run(self) -> FaucetOutcome {
        let identity = self.identity.as_str();
        let today = self.today;

        let reservation = match self.engine.try_reserve(identity, today).await {
            Decision::Allowed(reservation) => reservation,
            Decision::Denied(reason) => {
                debug!("{} denied on {}: {:?}", identity, today, reason);
                return FaucetOutcome::QuotaExceeded;
            }
        };

        let send = self.disburser.disburse(identity, &self.amount);
        let result = tokio::time::timeout(self.timeout, send)
            .await
            .unwrap_or(Err(FaucetError::Timeout(self.timeout)));

        let receipt = match result {
            Ok(receipt) if receipt.is_success() => receipt,
            Ok(receipt) => {
                warn!(
                    "Transaction {} to {} failed with code {}",
                    receipt.tx_hash, identity, receipt.code
                );
                return FaucetOutcome::DisbursementFailed {
                    detail: format!("Transaction failed with code {}.", receipt.code),
                };
            }
            Err(e) => {
                warn!("Disbursement to {} failed: {}", identity, e);
                return FaucetOutcome::DisbursementFailed {
                    detail: e.to_string(),
                };
            }
        };

        if let Err(e) = reservation.commit().await {
            error!(
                "Sent {} to {} in {} but could not record usage: {}",
                self.amount, identity, receipt.tx_hash, e
            );
            return FaucetOutcome::ServiceUnavailable {
                reason: "Tokens were sent but usage could not be recorded.".to_string(),
            };
        }

        info!("Sent {} to {} in {}", self.amount, identity, receipt.tx_hash);
        FaucetOutcome::Success {
            message: format!("Successfully sent {} to {}", self.amount, identity),
            tx_hash: receipt.tx_hash,
        }
    }
}
