//! Operator namespace under `/admin`
//!
//! Everything except `/admin/health` requires an `X-Admin-Key` header equal
//! to the vault value named by `auth.admin_key_key`. The response types are
//! shared with `warden-cli`.

pub mod handlers;

use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::audit::{AuditStats, MatchRecord};
use crate::guard::constant_time_eq;
use crate::proxy::{AppState, ProxyError};

/// Header carrying the admin key
pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Default and maximum page size for `/admin/blocks`
pub const DEFAULT_BLOCKS_LIMIT: usize = 50;
pub const MAX_BLOCKS_LIMIT: usize = 500;

/// Kill switch state, used as both request and response body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillState {
    pub enabled: bool,
}

/// `/admin/stats` response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsResponse {
    pub enabled: bool,
    #[serde(flatten)]
    pub audit: AuditStats,
}

/// `/admin/blocks` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlocksResponse {
    pub blocks: Vec<MatchRecord>,
    pub limit: usize,
}

/// `/admin/test` response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestAlertResponse {
    pub sent: bool,
}

/// Build the admin router, to be nested under `/admin`
pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let gated = Router::new()
        .route(
            "/kill",
            get(handlers::kill_status_handler).post(handlers::kill_toggle_handler),
        )
        .route("/stats", get(handlers::stats_handler))
        .route("/blocks", get(handlers::blocks_handler))
        .route("/test", post(handlers::test_alert_handler))
        .route_layer(middleware::from_fn_with_state(state, require_admin_key));

    Router::new()
        .route("/health", get(handlers::health_handler))
        .merge(gated)
}

async fn require_admin_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let expected = state.vault.get(&state.config.auth.admin_key_key);
    let presented = request
        .headers()
        .get(ADMIN_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    let authorized = match (presented, expected.as_deref()) {
        (Some(presented), Some(expected)) => {
            constant_time_eq(presented.as_bytes(), expected.as_bytes())
        }
        _ => false,
    };

    if !authorized {
        tracing::debug!("Rejected admin request with invalid key");
        return ProxyError::Unauthorized.into_response();
    }

    next.run(request).await
}
