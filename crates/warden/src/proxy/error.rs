//! Caller-visible proxy errors
//!
//! Every rejection the pipeline produces maps to one variant here and is
//! rendered as `{"error": <message>, "code": <CODE>}` with its status.
//! Upstream error statuses are not errors at this layer; they pass through
//! untouched.

use axum::{
    body::Body,
    http::{Response, StatusCode, header},
    response::IntoResponse,
};
use thiserror::Error;

use crate::guard::RateDecision;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProxyError {
    /// No route for the first path segment
    #[error("Unknown provider route: {0}")]
    RouteNotFound(String),

    /// Missing or incorrect proxy token
    #[error("Unauthorized")]
    Unauthorized,

    /// Kill switch is tripped
    #[error("Service disabled by kill switch")]
    KillSwitchActive,

    /// Agent exceeded a request ceiling
    #[error("Rate limit exceeded: {0}")]
    RateLimited(RateDecision),

    /// Request body matched an inbound secret pattern
    #[error("Secret detected in request")]
    SecretDetected { pattern: String },

    /// Malformed inbound request (unreadable body, bad method)
    #[error("Invalid request: {0}")]
    Request(String),

    /// Upstream could not be reached or its response could not be read
    #[error("Upstream request failed: {0}")]
    Upstream(String),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            ProxyError::Unauthorized => StatusCode::UNAUTHORIZED,
            ProxyError::KillSwitchActive => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ProxyError::SecretDetected { .. } => StatusCode::FORBIDDEN,
            ProxyError::Request(_) => StatusCode::BAD_REQUEST,
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ProxyError::RouteNotFound(_) => "ROUTE_NOT_FOUND",
            ProxyError::Unauthorized => "UNAUTHORIZED",
            ProxyError::KillSwitchActive => "KILL_SWITCH_ACTIVE",
            ProxyError::RateLimited(_) => "RATE_LIMITED",
            ProxyError::SecretDetected { .. } => "SECRET_DETECTED",
            ProxyError::Request(_) => "INVALID_REQUEST",
            ProxyError::Upstream(_) => "UPSTREAM_ERROR",
        }
    }
}

/// Build a `{error, code}` JSON response
pub fn error_response(status: StatusCode, code: &str, message: &str) -> Response<Body> {
    let body = serde_json::json!({
        "error": message,
        "code": code,
    });

    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap_or_else(|_| {
            let mut fallback = Response::new(Body::empty());
            *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        })
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response<Body> {
        error_response(self.status(), self.code(), &self.to_string())
    }
}
