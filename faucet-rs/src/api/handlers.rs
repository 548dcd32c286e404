//! Request handlers

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};

use crate::faucet::{FaucetOutcome, FaucetService};
use crate::quota::QuotaUsage;
use crate::scheduler::ResetScheduler;

/// Shared handler state
pub struct AppState {
    pub service: Arc<FaucetService>,
    pub scheduler: Arc<ResetScheduler>,
    /// Bearer token guarding admin routes. `None` leaves them unmounted.
    pub admin_token: Option<String>,
}

/// Body of a faucet request
#[derive(Debug, Deserialize)]
pub struct FaucetRequest {
    #[serde(default)]
    pub wallet: Option<String>,
}

/// Body of every faucet response
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
}

/// Body of a reset response
#[derive(Debug, Serialize, Deserialize)]
pub struct ResetResponse {
    pub removed: usize,
}

impl FaucetOutcome {
    /// HTTP status for this outcome
    pub fn status_code(&self) -> StatusCode {
        match self {
            FaucetOutcome::Success { .. } => StatusCode::OK,
            FaucetOutcome::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            FaucetOutcome::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            FaucetOutcome::QuotaExceeded => StatusCode::TOO_MANY_REQUESTS,
            FaucetOutcome::DisbursementFailed { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for FaucetOutcome {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = MessageResponse {
            message: self.message(),
            tx_hash: match self {
                FaucetOutcome::Success { tx_hash, .. } => Some(tx_hash),
                _ => None,
            },
        };
        (status, Json(body)).into_response()
    }
}

/// POST / - Send tokens to `wallet`
pub async fn request_tokens(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<FaucetRequest>, JsonRejection>,
) -> FaucetOutcome {
    let wallet = match payload {
        Ok(Json(request)) => request.wallet,
        Err(rejection) => {
            debug!("Unreadable faucet request: {}", rejection);
            None
        }
    };

    state.service.handle_request(wallet.as_deref()).await
}

/// GET /quota/:identity - Today's usage for an identity
pub async fn quota_status(
    State(state): State<Arc<AppState>>,
    Path(identity): Path<String>,
) -> Json<QuotaUsage> {
    let today = state.service.clock().today();
    Json(state.service.engine().usage(identity.trim(), today).await)
}

/// POST /admin/reset - Prune stale ledger entries now
pub async fn reset_ledger(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ResetResponse>, (StatusCode, Json<MessageResponse>)> {
    let removed = state.scheduler.run_once().await.map_err(|e| {
        error!("Manual ledger reset failed: {}", e);
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(MessageResponse {
                message: e.to_string(),
                tx_hash: None,
            }),
        )
    })?;

    Ok(Json(ResetResponse { removed }))
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (
                FaucetOutcome::Success {
                    message: String::new(),
                    tx_hash: String::new(),
                },
                StatusCode::OK,
            ),
            (
                FaucetOutcome::InvalidRequest {
                    reason: String::new(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                FaucetOutcome::ServiceUnavailable {
                    reason: String::new(),
                },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (FaucetOutcome::QuotaExceeded, StatusCode::TOO_MANY_REQUESTS),
            (
                FaucetOutcome::DisbursementFailed {
                    detail: String::new(),
                },
                StatusCode::BAD_GATEWAY,
            ),
        ];

        for (outcome, status) in cases {
            assert_eq!(outcome.status_code(), status);
        }
    }
}
