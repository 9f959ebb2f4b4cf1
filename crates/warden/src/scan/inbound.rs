//! Inbound request scanning against operator-supplied patterns.
//!
//! Patterns are data, not code: the active list is read from the shared
//! store on every call (falling back to the config file), so policy changes
//! need no redeploy. Misconfiguration never blocks traffic; only an actual
//! match does.

use regex::RegexBuilder;
use std::sync::Arc;
use tracing::warn;

use crate::storage::{KvStore, SECRET_PATTERNS_KEY};

/// Return the first pattern (in order) matching anywhere in `body`.
///
/// Matching is case-insensitive. Patterns that fail to compile are skipped.
pub fn scan_body(body: &str, patterns: &[String]) -> Option<String> {
    for pattern in patterns {
        let regex = match RegexBuilder::new(pattern).case_insensitive(true).build() {
            Ok(regex) => regex,
            Err(e) => {
                warn!(pattern = %pattern, error = %e, "Skipping malformed inbound pattern");
                continue;
            }
        };

        if regex.is_match(body) {
            return Some(pattern.clone());
        }
    }

    None
}

/// Loads the active pattern list and scans request bodies with it
#[derive(Clone)]
pub struct InboundScanner {
    store: Arc<dyn KvStore>,
    fallback: Vec<String>,
}

impl InboundScanner {
    pub fn new(store: Arc<dyn KvStore>, fallback: Vec<String>) -> Self {
        Self { store, fallback }
    }

    /// Resolve the pattern list for this call.
    ///
    /// `None` means the stored configuration is unusable and scanning should
    /// be skipped.
    pub async fn patterns(&self) -> Option<Vec<String>> {
        match self.store.get(SECRET_PATTERNS_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(patterns) => Some(patterns),
                Err(e) => {
                    warn!(error = %e, "Stored secret patterns are not a JSON string array, skipping scan");
                    None
                }
            },
            Ok(None) => Some(self.fallback.clone()),
            Err(e) => {
                warn!(error = %e, "Failed to load secret patterns, skipping scan");
                None
            }
        }
    }

    /// Scan a raw request body, returning the matched pattern if any
    pub async fn scan(&self, body: &[u8]) -> Option<String> {
        if body.is_empty() {
            return None;
        }

        let patterns = self.patterns().await?;
        let text = String::from_utf8_lossy(body);
        scan_body(&text, &patterns)
    }
}
