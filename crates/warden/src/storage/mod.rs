//! Shared key-value store abstraction
//!
//! All cross-request state (rate counters, the kill switch, audit records,
//! inbound pattern lists) lives behind [`KvStore`]. Implementations are
//! expected to behave like an eventually consistent edge store: no
//! transactions, no compare-and-swap, entries expire by TTL.

pub mod memory;

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

pub use memory::MemoryKvStore;

/// Store key holding the kill-switch flag
pub const KILL_SWITCH_KEY: &str = "config:kill_switch";

/// Store key holding the JSON array of inbound secret patterns
pub const SECRET_PATTERNS_KEY: &str = "config:secret_patterns";

/// Minimal key-value contract consumed by the firewall pipeline
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read a value, `None` when the key is absent or expired
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value; `ttl` of `None` keeps it until overwritten
    async fn put(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    /// List live keys starting with `prefix`, in lexicographic order
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;
}
