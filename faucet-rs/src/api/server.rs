//! API Server - HTTP server for the faucet

use axum::{
    extract::{Request, State},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method, StatusCode,
    },
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::handlers::{self, AppState, MessageResponse};
use crate::error::Result;

/// Faucet HTTP server
pub struct FaucetServer {
    state: Arc<AppState>,
    addr: String,
}

impl FaucetServer {
    /// Create a new server
    pub fn new(state: AppState, addr: impl Into<String>) -> Self {
        Self {
            state: Arc::new(state),
            addr: addr.into(),
        }
    }

    /// Build the router with all routes
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

        let mut router = Router::new()
            .route("/", post(handlers::request_tokens))
            .route("/health", get(handlers::health))
            .route("/quota/:identity", get(handlers::quota_status));

        // Admin routes (bearer token required)
        if self.state.admin_token.is_some() {
            let admin_routes = Router::new()
                .route("/admin/reset", post(handlers::reset_ledger))
                .route_layer(middleware::from_fn_with_state(
                    self.state.clone(),
                    admin_auth_middleware,
                ));
            router = router.merge(admin_routes);
        }

        router
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the server until it fails
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(&self.addr).await?;
        info!("Faucet listening on {}", self.addr);

        axum::serve(listener, self.router()).await?;

        Ok(())
    }
}

/// Rejects requests whose bearer token does not match the admin token
async fn admin_auth_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let authorized = match (bearer_token(&req), state.admin_token.as_deref()) {
        (Some(token), Some(expected)) => token == expected,
        _ => false,
    };

    if authorized {
        return next.run(req).await;
    }

    warn!("Rejected unauthenticated admin request to {}", req.uri().path());
    (
        StatusCode::UNAUTHORIZED,
        Json(MessageResponse {
            message: "Missing or invalid admin token.".to_string(),
            tx_hash: None,
        }),
    )
        .into_response()
}

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}
