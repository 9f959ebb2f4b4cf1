//! Request/response firewall pipeline
//!
//! Every proxied call runs the inbound guards in a fixed order, each one
//! terminal on failure:
//!
//! 1. route resolution (404, unlogged)
//! 2. kill switch (503, block-logged)
//! 3. proxy token (401, unlogged)
//! 4. rate limiter (429, block-logged)
//! 5. inbound secret scan (403, block-logged)
//!
//! Admitted requests are forwarded with the real provider credential. For
//! completion endpoints streaming is turned off before forwarding and the
//! response is reassembled and scanned before the caller sees it.

use axum::{
    body::Body,
    http::{HeaderMap, HeaderValue, Request, Response, StatusCode, header},
};
use bytes::Bytes;
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::audit::{MatchRecord, Reason, UsageRecord};
use crate::dispatch::spawn_detached;
use crate::guard::{RateDecision, verify_bearer};
use crate::scan::{KnownSecret, scan_completion};
use crate::stream;

use super::ProxyError;
use super::forward::{UpstreamResponse, outbound_headers, send_upstream};
use super::server::AppState;

/// Header carrying the caller-chosen agent identity
pub const AGENT_ID_HEADER: &str = "x-agent-id";

/// Agent identity used when the header is absent or empty
pub const DEFAULT_AGENT_ID: &str = "anonymous";

/// Run one request through the pipeline
pub async fn handle(state: &AppState, request: Request<Body>) -> Response<Body> {
    match process(state, request).await {
        Ok(response) => response,
        Err(e) => {
            debug!(code = e.code(), "Request rejected: {e}");
            axum::response::IntoResponse::into_response(e)
        }
    }
}

async fn process(state: &AppState, request: Request<Body>) -> Result<Response<Body>, ProxyError> {
    let (parts, body) = request.into_parts();
    let agent_id = agent_id(&parts.headers);

    let target = state
        .routes
        .resolve(parts.uri.path(), parts.uri.query())
        .ok_or_else(|| ProxyError::RouteNotFound(first_segment(parts.uri.path()).to_string()))?;
    let route = target.route;
    let provider = route.prefix.as_str();

    if !state.kill_switch.is_enabled().await {
        record_block(state, &agent_id, provider, Reason::KillSwitch, "kill switch active");
        return Err(ProxyError::KillSwitchActive);
    }

    let proxy_token = state.vault.get(&state.config.auth.proxy_token_key);
    if !verify_bearer(&parts.headers, proxy_token.as_deref()) {
        debug!(agent_id = %agent_id, provider, "Rejected request with invalid proxy token");
        return Err(ProxyError::Unauthorized);
    }

    let decision = state.rate_limiter.admit(&agent_id, Utc::now()).await;
    if decision != RateDecision::Allow {
        record_block(state, &agent_id, provider, Reason::RateLimit, &decision.to_string());
        return Err(ProxyError::RateLimited(decision));
    }

    let body = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(|e| ProxyError::Request(format!("Failed to read request body: {e}")))?;

    if let Some(pattern) = state.inbound.scan(&body).await {
        record_block(
            state,
            &agent_id,
            provider,
            Reason::SecretDetected,
            &format!("matched pattern {pattern}"),
        );
        return Err(ProxyError::SecretDetected { pattern });
    }

    let completion = is_completion_endpoint(&target.normalized_path());
    let body = if completion {
        match rewrite_stream_flag(&body) {
            Some(rewritten) => {
                debug!(agent_id = %agent_id, provider, "Disabled streaming for inspection");
                Bytes::from(rewritten)
            }
            None => body,
        }
    } else {
        body
    };

    let credential = state.vault.get(&route.credential_key);
    if credential.is_none() {
        warn!(provider, key = %route.credential_key, "No provider credential configured, forwarding without one");
    }
    let headers = outbound_headers(&parts.headers, route, credential.as_deref());

    debug!(agent_id = %agent_id, provider, url = %target.url, "Forwarding request");
    let upstream = send_upstream(&state.client, parts.method.clone(), &target.url, headers, body).await?;

    record_usage(
        state,
        UsageRecord {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            agent_id: agent_id.clone(),
            provider: provider.to_string(),
            method: parts.method.to_string(),
            path: target.rest.clone(),
            status: upstream.status.as_u16(),
        },
    );

    if completion && upstream.status.is_success() {
        return Ok(inspect_completion(state, &agent_id, provider, upstream));
    }

    Ok(build_response(upstream.status, upstream.headers, upstream.body))
}

/// Reassemble (if streamed) and scan a successful completion response
fn inspect_completion(
    state: &AppState,
    agent_id: &str,
    provider: &str,
    upstream: UpstreamResponse,
) -> Response<Body> {
    let text = if stream::is_event_stream(upstream.content_type(), &upstream.body) {
        debug!(agent_id, provider, "Upstream answered with an event stream, reassembling");
        stream::assemble(&String::from_utf8_lossy(&upstream.body))
    } else {
        match String::from_utf8(upstream.body.to_vec()) {
            Ok(text) => text,
            // Not text, so there is nothing to scan
            Err(_) => return build_response(upstream.status, upstream.headers, upstream.body),
        }
    };

    let outcome = scan_completion(&text, &known_secrets(state));
    if !outcome.is_clean() {
        record_leak(state, agent_id, provider, &outcome.matches);
    }

    let mut headers = upstream.headers;
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    build_response(upstream.status, headers, outcome.text)
}

/// Every secret value that must never reach the caller
pub fn known_secrets(state: &AppState) -> Vec<KnownSecret> {
    let mut names: Vec<&str> = state
        .routes
        .routes()
        .map(|route| route.credential_key.as_str())
        .collect();
    names.push(&state.config.auth.proxy_token_key);
    names.push(&state.config.auth.admin_key_key);
    names.extend(state.config.scanner.honeypot_keys.iter().map(String::as_str));
    names.sort_unstable();
    names.dedup();

    names
        .into_iter()
        .filter_map(|name| state.vault.get(name).map(|value| KnownSecret::new(name, value)))
        .collect()
}

fn agent_id(headers: &HeaderMap) -> String {
    headers
        .get(AGENT_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .unwrap_or(DEFAULT_AGENT_ID)
        .to_string()
}

fn first_segment(path: &str) -> &str {
    let trimmed = path.trim_start_matches('/');
    trimmed.split('/').next().unwrap_or(trimmed)
}

/// Whether the path below the provider prefix is a completion endpoint
pub fn is_completion_endpoint(rest: &str) -> bool {
    rest.trim_end_matches('/').ends_with("completions")
}

/// Turn `"stream": true` into `false` and drop `stream_options`.
///
/// Returns `None` when the body is not a JSON object requesting streaming.
pub fn rewrite_stream_flag(body: &[u8]) -> Option<Vec<u8>> {
    let mut json: Value = serde_json::from_slice(body).ok()?;
    let obj = json.as_object_mut()?;

    if obj.get("stream") != Some(&Value::Bool(true)) {
        return None;
    }

    obj.insert("stream".to_string(), Value::Bool(false));
    obj.remove("stream_options");

    serde_json::to_vec(&json).ok()
}

fn build_response(status: StatusCode, headers: HeaderMap, body: impl Into<Body>) -> Response<Body> {
    let mut response = Response::new(body.into());
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

fn record_block(state: &AppState, agent_id: &str, provider: &str, reason: Reason, detail: &str) {
    info!(agent_id, provider, reason = reason.as_str(), "Request blocked");

    let record = MatchRecord::new(agent_id, provider, reason, detail);

    if state.config.alerts.notify_on_block {
        let notifier = state.notifier.clone();
        let message = format!(
            "Warden blocked a request from agent '{}' to '{}': {} ({})",
            record.agent_id,
            record.provider,
            reason.as_str(),
            record.detail
        );
        spawn_detached("block_alert", async move { notifier.send(&message).await });
    }

    let audit = state.audit.clone();
    spawn_detached("block_log", async move { audit.record_block(&record).await });
}

fn record_leak(state: &AppState, agent_id: &str, provider: &str, matches: &[String]) {
    warn!(agent_id, provider, matches = matches.len(), "Secret leak redacted from response");

    let record = MatchRecord::new(agent_id, provider, Reason::SecretLeaked, matches.join(", "));

    let notifier = state.notifier.clone();
    let message = format!(
        "Warden redacted a secret leak in a response to agent '{}' from '{}': {}",
        record.agent_id, record.provider, record.detail
    );
    spawn_detached("leak_alert", async move { notifier.send(&message).await });

    let audit = state.audit.clone();
    spawn_detached("leak_log", async move { audit.record_leak(&record).await });
}

fn record_usage(state: &AppState, record: UsageRecord) {
    let audit = state.audit.clone();
    spawn_detached("usage_log", async move { audit.record_usage(&record).await });
}
