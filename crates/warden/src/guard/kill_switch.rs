//! Process-wide traffic kill switch
//!
//! The flag lives in the shared store and is read on every request; there
//! is deliberately no local cache, so a toggle takes effect as soon as the
//! store propagates it.

use std::sync::Arc;
use tracing::warn;

use crate::error::Result;
use crate::storage::{KILL_SWITCH_KEY, KvStore};

/// Stored value that stops all traffic. Anything else, or no value, lets it flow.
pub const DISABLED: &str = "disabled";

/// Stored value written when traffic is re-enabled
pub const ENABLED: &str = "enabled";

#[derive(Clone)]
pub struct KillSwitch {
    store: Arc<dyn KvStore>,
}

impl KillSwitch {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Whether traffic may flow. Store read failures count as enabled.
    pub async fn is_enabled(&self) -> bool {
        match self.store.get(KILL_SWITCH_KEY).await {
            Ok(Some(value)) => value != DISABLED,
            Ok(None) => true,
            Err(e) => {
                warn!(error = %e, "Kill switch read failed, treating as enabled");
                true
            }
        }
    }

    pub async fn set_enabled(&self, enabled: bool) -> Result<()> {
        let value = if enabled { ENABLED } else { DISABLED };
        self.store.put(KILL_SWITCH_KEY, value, None).await
    }
}
