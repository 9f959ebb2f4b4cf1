//! Upstream transport
//!
//! Builds the outbound header set for a provider route and performs the
//! single awaited upstream call. The response body is buffered in full so
//! the content firewall can inspect it.

use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use bytes::Bytes;
use reqwest::Client;
use url::Url;

use super::ProxyError;
use super::route::ProviderRoute;

/// Hop-by-hop headers that should not be forwarded in either direction
pub const HOP_BY_HOP_HEADERS: &[&str] = &[
    "host",
    "connection",
    "keep-alive",
    "transfer-encoding",
    "proxy-connection",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "upgrade",
];

/// Caller headers that never reach the provider.
///
/// `accept-encoding` is dropped so the upstream answers uncompressed and
/// the body stays scannable.
const STRIPPED_REQUEST_HEADERS: &[&str] = &[
    "authorization",
    "x-agent-id",
    "x-admin-key",
    "content-length",
    "accept-encoding",
];

/// A fully buffered upstream response
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl UpstreamResponse {
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(axum::http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }
}

/// Build the header set sent upstream.
///
/// The caller's own credentials are removed and the provider credential, if
/// the vault has one, is injected under the route's header name.
pub fn outbound_headers(
    headers: &HeaderMap,
    route: &ProviderRoute,
    credential: Option<&str>,
) -> HeaderMap {
    let mut forwarded = HeaderMap::new();
    for (name, value) in headers.iter() {
        let name_str = name.as_str();
        if HOP_BY_HOP_HEADERS.contains(&name_str) || STRIPPED_REQUEST_HEADERS.contains(&name_str) {
            continue;
        }
        forwarded.append(name.clone(), value.clone());
    }

    if let Some(credential) = credential {
        let name = HeaderName::from_bytes(route.credential_header.as_bytes());
        let value = HeaderValue::from_str(&route.credential_value(credential));
        match (name, value) {
            (Ok(name), Ok(mut value)) => {
                value.set_sensitive(true);
                forwarded.insert(name, value);
            }
            _ => tracing::warn!(
                provider = %route.prefix,
                header = %route.credential_header,
                "Provider credential is not a valid header, forwarding without it"
            ),
        }
    }

    forwarded
}

/// Strip hop-by-hop headers and `content-length` from an upstream response
pub fn inbound_headers(headers: &HeaderMap) -> HeaderMap {
    let mut filtered = HeaderMap::new();
    for (name, value) in headers.iter() {
        let name_str = name.as_str();
        if HOP_BY_HOP_HEADERS.contains(&name_str) || name_str == "content-length" {
            continue;
        }
        filtered.append(name.clone(), value.clone());
    }
    filtered
}

/// Send one request upstream and buffer the response
pub async fn send_upstream(
    client: &Client,
    method: Method,
    url: &Url,
    headers: HeaderMap,
    body: Bytes,
) -> Result<UpstreamResponse, ProxyError> {
    let response = client
        .request(method, url.clone())
        .headers(headers)
        .body(body)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                ProxyError::Upstream(format!("Request timed out: {e}"))
            } else if e.is_connect() {
                ProxyError::Upstream(format!("Failed to connect to upstream: {e}"))
            } else {
                ProxyError::Upstream(format!("Request failed: {e}"))
            }
        })?;

    let status = response.status();
    let headers = inbound_headers(response.headers());

    let body = response
        .bytes()
        .await
        .map_err(|e| ProxyError::Upstream(format!("Failed to read response body: {e}")))?;

    Ok(UpstreamResponse {
        status,
        headers,
        body,
    })
}
