//! Read-only access to provider credentials and shared secrets

use std::collections::HashMap;
use std::env;

/// Looks up a secret value by name
pub trait CredentialVault: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
}

/// Vault reading secrets from process environment variables
///
/// An optional prefix is prepended to every lookup, so a vault created with
/// `EnvVault::with_prefix("WARDEN_")` resolves `OPENAI_API_KEY` from
/// `WARDEN_OPENAI_API_KEY`. Empty values are treated as absent.
#[derive(Debug, Clone, Default)]
pub struct EnvVault {
    prefix: String,
}

impl EnvVault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl CredentialVault for EnvVault {
    fn get(&self, name: &str) -> Option<String> {
        env::var(format!("{}{}", self.prefix, name))
            .ok()
            .filter(|v| !v.is_empty())
    }
}

/// Fixed in-memory vault, used for tests and embedded deployments
#[derive(Debug, Clone, Default)]
pub struct StaticVault {
    secrets: HashMap<String, String>,
}

impl StaticVault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets.insert(name.into(), value.into());
        self
    }
}

impl CredentialVault for StaticVault {
    fn get(&self, name: &str) -> Option<String> {
        self.secrets.get(name).filter(|v| !v.is_empty()).cloned()
    }
}
