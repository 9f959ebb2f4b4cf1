use axum::{
    Json,
    body::Body,
    extract::{Query, State},
    http::{Response, StatusCode},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::admin::{
    BlocksResponse, DEFAULT_BLOCKS_LIMIT, KillState, MAX_BLOCKS_LIMIT, StatsResponse,
    TestAlertResponse,
};
use crate::audit::RecordKind;
use crate::error::WardenError;
use crate::proxy::{AppState, error_response};

type AdminResult<T> = std::result::Result<Json<T>, Response<Body>>;

fn store_failure(e: WardenError) -> Response<Body> {
    tracing::warn!("Admin request failed: {e}");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR", &e.to_string())
}

pub async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

pub async fn kill_status_handler(State(state): State<Arc<AppState>>) -> Json<KillState> {
    Json(KillState {
        enabled: state.kill_switch.is_enabled().await,
    })
}

pub async fn kill_toggle_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<KillState>,
) -> AdminResult<KillState> {
    state
        .kill_switch
        .set_enabled(request.enabled)
        .await
        .map_err(store_failure)?;

    if request.enabled {
        tracing::info!("Kill switch released, traffic enabled");
    } else {
        tracing::warn!("Kill switch engaged, all proxied traffic is blocked");
    }

    Ok(Json(request))
}

pub async fn stats_handler(State(state): State<Arc<AppState>>) -> AdminResult<StatsResponse> {
    let audit = state.audit.stats().await.map_err(store_failure)?;

    Ok(Json(StatsResponse {
        enabled: state.kill_switch.is_enabled().await,
        audit,
    }))
}

#[derive(Debug, Deserialize, Default)]
pub struct BlocksQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_BLOCKS_LIMIT
}

pub async fn blocks_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BlocksQuery>,
) -> AdminResult<BlocksResponse> {
    let limit = query.limit.clamp(1, MAX_BLOCKS_LIMIT);

    let blocks = state
        .audit
        .recent(RecordKind::Block, limit)
        .await
        .map_err(store_failure)?;

    Ok(Json(BlocksResponse { blocks, limit }))
}

/// Send a test notification through the configured notifier.
///
/// Unlike pipeline alerts this one is awaited, so delivery failures are
/// reported back to the operator.
pub async fn test_alert_handler(
    State(state): State<Arc<AppState>>,
) -> AdminResult<TestAlertResponse> {
    state
        .notifier
        .send("Warden test alert: notifications are working")
        .await
        .map_err(|e| {
            tracing::warn!("Test alert failed: {e}");
            error_response(StatusCode::BAD_GATEWAY, "NOTIFY_FAILED", &e.to_string())
        })?;

    Ok(Json(TestAlertResponse { sent: true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_query_default_limit() {
        let query: BlocksQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.limit, 50);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let Json(body) = health_handler().await;
        assert_eq!(body["status"], "ok");
    }
}
