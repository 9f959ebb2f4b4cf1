//! Test utilities for warden - in-memory collaborators and a state builder
//!
//! Unit tests and the integration suites under `tests/` share these so a
//! full router can be stood up against a mock upstream in a few lines.

use async_trait::async_trait;
use axum::Router;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::{Config, RouteConfig};
use crate::error::{Result, WardenError};
use crate::notify::Notifier;
use crate::proxy::{AppState, create_router};
use crate::vault::CredentialVault;

pub use crate::storage::MemoryKvStore;
pub use crate::vault::StaticVault;

/// Proxy token configured by [`TestHarness::new`]
pub const TEST_PROXY_TOKEN: &str = "test-proxy-token";

/// Admin key configured by [`TestHarness::new`]
pub const TEST_ADMIN_KEY: &str = "test-admin-key";

/// Notifier that keeps every message in memory
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every send fails (messages are still recorded)
    pub fn failing() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Poll until at least `count` messages arrived or roughly a second passed.
    ///
    /// Alerts are dispatched as detached tasks, so tests cannot read them
    /// synchronously after the response.
    pub async fn wait_for(&self, count: usize) -> Vec<String> {
        for _ in 0..100 {
            let messages = self.messages();
            if messages.len() >= count {
                return messages;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.messages()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: &str) -> Result<()> {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
        if self.fail {
            return Err(WardenError::Notify("recording notifier set to fail".to_string()));
        }
        Ok(())
    }
}

/// Vault wrapper that counts every lookup
#[derive(Debug, Clone, Default)]
pub struct CountingVault {
    inner: StaticVault,
    lookups: Arc<AtomicUsize>,
}

impl CountingVault {
    pub fn new(inner: StaticVault) -> Self {
        Self {
            inner,
            lookups: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl CredentialVault for CountingVault {
    fn get(&self, name: &str) -> Option<String> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.get(name)
    }
}

/// Builder for a fully wired [`AppState`] over in-memory collaborators
#[derive(Clone)]
pub struct TestHarness {
    pub config: Config,
    pub vault: StaticVault,
    pub store: Arc<MemoryKvStore>,
    pub notifier: Arc<RecordingNotifier>,
    vault_lookups: Arc<AtomicUsize>,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    /// Default config with a proxy token and admin key in the vault
    pub fn new() -> Self {
        let config = Config::default();
        let vault = StaticVault::new()
            .with(&config.auth.proxy_token_key, TEST_PROXY_TOKEN)
            .with(&config.auth.admin_key_key, TEST_ADMIN_KEY);

        Self {
            config,
            vault,
            store: Arc::new(MemoryKvStore::new()),
            notifier: Arc::new(RecordingNotifier::new()),
            vault_lookups: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_secret(mut self, name: &str, value: &str) -> Self {
        self.vault = self.vault.with(name, value);
        self
    }

    /// Register a decoy credential that must never appear in a response
    pub fn with_honeypot(mut self, name: &str, value: &str) -> Self {
        self.config.scanner.honeypot_keys.push(name.to_string());
        self.with_secret(name, value)
    }

    pub fn with_config(mut self, update: impl FnOnce(&mut Config)) -> Self {
        update(&mut self.config);
        self
    }

    pub fn with_notifier(mut self, notifier: RecordingNotifier) -> Self {
        self.notifier = Arc::new(notifier);
        self
    }

    /// Vault lookups made by every state this harness has built
    pub fn vault_lookups(&self) -> usize {
        self.vault_lookups.load(Ordering::SeqCst)
    }

    /// `Authorization` header value carrying the test proxy token
    pub fn bearer(&self) -> String {
        format!("Bearer {TEST_PROXY_TOKEN}")
    }

    /// State whose `openai` and `anthropic` routes both point at `upstream`
    pub fn state_for(&self, upstream: &str) -> Arc<AppState> {
        let mut config = self.config.clone();
        config.routes = vec![
            RouteConfig {
                prefix: "openai".to_string(),
                upstream: upstream.to_string(),
                credential_header: "authorization".to_string(),
                credential_prefix: "Bearer ".to_string(),
                credential_key: "OPENAI_API_KEY".to_string(),
            },
            RouteConfig {
                prefix: "anthropic".to_string(),
                upstream: upstream.to_string(),
                credential_header: "x-api-key".to_string(),
                credential_prefix: String::new(),
                credential_key: "ANTHROPIC_API_KEY".to_string(),
            },
        ];

        let vault = CountingVault {
            inner: self.vault.clone(),
            lookups: self.vault_lookups.clone(),
        };

        let state = AppState::new(
            config,
            reqwest::Client::new(),
            self.store.clone(),
            Arc::new(vault),
            self.notifier.clone(),
        )
        .expect("Test route table must be valid");

        Arc::new(state)
    }

    pub fn router_for(&self, upstream: &str) -> Router {
        create_router(self.state_for(upstream))
    }
}
