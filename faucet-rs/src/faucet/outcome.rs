use serde::Serialize;

/// Typed result of one faucet request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FaucetOutcome {
    /// Funds were sent and the usage recorded
    Success { message: String, tx_hash: String },
    /// The request itself is unusable
    InvalidRequest { reason: String },
    /// The faucet cannot serve requests right now (configuration or storage)
    ServiceUnavailable { reason: String },
    /// The identity used up today's allowance
    QuotaExceeded,
    /// The transfer failed; no quota was consumed
    DisbursementFailed { detail: String },
}

impl FaucetOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FaucetOutcome::Success { .. })
    }

    /// Human-readable message for the client
    pub fn message(&self) -> String {
        match self {
            FaucetOutcome::Success { message, .. } => message.clone(),
            FaucetOutcome::InvalidRequest { reason } => reason.clone(),
            FaucetOutcome::ServiceUnavailable { reason } => reason.clone(),
            FaucetOutcome::QuotaExceeded => {
                "This wallet has reached its daily request limit.".to_string()
            }
            FaucetOutcome::DisbursementFailed { detail } => {
                format!("Failed to send tokens. Error: {}", detail)
            }
        }
    }
}
