//! HTTP surface of the firewall
//!
//! Every path outside `/admin` is handed to the pipeline; the first path
//! segment names the provider route.

use axum::{
    Router,
    body::Body,
    extract::{Request, State},
    http::Response,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

use crate::admin;
use crate::audit::AuditLog;
use crate::config::Config;
use crate::error::{Result, WardenError};
use crate::guard::{KillSwitch, RateLimiter};
use crate::notify::Notifier;
use crate::scan::InboundScanner;
use crate::storage::KvStore;
use crate::vault::CredentialVault;

use super::pipeline;
use super::route::RouteTable;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Full configuration
    pub config: Config,
    /// HTTP client for upstream requests
    pub client: reqwest::Client,
    /// Shared key-value store holding all cross-request state
    pub store: Arc<dyn KvStore>,
    /// Credential lookups (provider keys, proxy token, admin key, honeypots)
    pub vault: Arc<dyn CredentialVault>,
    /// Alert destination
    pub notifier: Arc<dyn Notifier>,
    pub routes: Arc<RouteTable>,
    pub kill_switch: KillSwitch,
    pub rate_limiter: RateLimiter,
    pub inbound: InboundScanner,
    pub audit: AuditLog,
}

impl AppState {
    /// Wire the guards and audit log over the given collaborators.
    ///
    /// Fails only on an invalid routing table.
    pub fn new(
        config: Config,
        client: reqwest::Client,
        store: Arc<dyn KvStore>,
        vault: Arc<dyn CredentialVault>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let routes = Arc::new(RouteTable::from_config(&config.routes)?);

        Ok(Self {
            kill_switch: KillSwitch::new(store.clone()),
            rate_limiter: RateLimiter::new(store.clone(), &config.limits),
            inbound: InboundScanner::new(store.clone(), config.scanner.inbound_patterns.clone()),
            audit: AuditLog::new(store.clone(), config.audit.retention_days),
            routes,
            config,
            client,
            store,
            vault,
            notifier,
        })
    }
}

/// The firewall proxy server
pub struct ProxyServer {
    config: Config,
    store: Arc<dyn KvStore>,
    vault: Arc<dyn CredentialVault>,
    notifier: Arc<dyn Notifier>,
}

impl ProxyServer {
    pub fn new(
        config: Config,
        store: Arc<dyn KvStore>,
        vault: Arc<dyn CredentialVault>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            store,
            vault,
            notifier,
        }
    }

    /// Bind the listen address and serve until Ctrl+C or SIGTERM
    pub async fn serve(&self) -> Result<()> {
        let client = build_client(self.config.proxy.timeout_secs)?;

        let state = AppState::new(
            self.config.clone(),
            client,
            self.store.clone(),
            self.vault.clone(),
            self.notifier.clone(),
        )?;

        let mut providers: Vec<&str> = state.routes.routes().map(|r| r.prefix.as_str()).collect();
        providers.sort_unstable();
        let providers = providers.join(", ");

        let addr: SocketAddr = self
            .config
            .proxy
            .listen_addr
            .parse()
            .map_err(|e| WardenError::Config(format!("Invalid listen address: {e}")))?;

        tracing::info!("Starting firewall proxy on {addr}");
        tracing::info!("Provider routes: {providers}");
        tracing::info!(
            per_minute = self.config.limits.requests_per_minute,
            per_hour = self.config.limits.requests_per_hour,
            "Rate limits configured"
        );
        if self.vault.get(&self.config.auth.proxy_token_key).is_none() {
            tracing::warn!(
                key = %self.config.auth.proxy_token_key,
                "No proxy token configured, every proxied request will be rejected"
            );
        }

        let app = create_router(Arc::new(state));

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| WardenError::Proxy(format!("Failed to bind to {addr}: {e}")))?;

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| WardenError::Proxy(format!("Server error: {e}")))?;

        tracing::info!("Firewall proxy shut down gracefully");
        Ok(())
    }
}

/// Upstream client with the configured timeout.
///
/// No automatic decompression is enabled, so bodies arrive as sent.
pub fn build_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| WardenError::Proxy(format!("Failed to create HTTP client: {e}")))
}

/// Create the router with all routes configured
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/admin", admin::router(state.clone()))
        .fallback(proxy_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn proxy_handler(State(state): State<Arc<AppState>>, request: Request) -> Response<Body> {
    pipeline::handle(&state, request).await
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}
