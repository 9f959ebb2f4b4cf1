//! Write-once audit records kept in the shared store
//!
//! Records are keyed by kind and creation time so a prefix listing returns
//! them oldest first:
//!
//! ```text
//! block:{millis:013}:{uuid}
//! leak:{millis:013}:{uuid}
//! usage:{millis:013}:{uuid}
//! ```

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::error::Result;
use crate::storage::KvStore;

/// Longest body excerpt kept in a record
pub const MAX_EXCERPT_CHARS: usize = 200;

const SECONDS_PER_DAY: u64 = 86_400;

/// Most store reads in flight while loading records
const READ_BATCH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Block,
    Leak,
    Usage,
}

impl RecordKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            RecordKind::Block => "block:",
            RecordKind::Leak => "leak:",
            RecordKind::Usage => "usage:",
        }
    }
}

/// Why a request was blocked or flagged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    KillSwitch,
    RateLimit,
    SecretDetected,
    SecretLeaked,
}

impl Reason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reason::KillSwitch => "kill_switch",
            Reason::RateLimit => "rate_limit",
            Reason::SecretDetected => "secret_detected",
            Reason::SecretLeaked => "secret_leaked",
        }
    }
}

/// A block or leak entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub agent_id: String,
    pub provider: String,
    pub reason: Reason,
    /// Truncated body excerpt or the matched pattern/tag list
    pub detail: String,
}

impl MatchRecord {
    pub fn new(
        agent_id: impl Into<String>,
        provider: impl Into<String>,
        reason: Reason,
        detail: impl AsRef<str>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            agent_id: agent_id.into(),
            provider: provider.into(),
            reason,
            detail: truncate_excerpt(detail.as_ref()),
        }
    }
}

/// One forwarded request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub agent_id: String,
    pub provider: String,
    pub method: String,
    pub path: String,
    pub status: u16,
}

/// Counts over the live audit records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditStats {
    pub requests: u64,
    pub blocks: u64,
    pub leaks: u64,
    pub blocks_by_reason: BTreeMap<String, u64>,
}

/// Truncate to [`MAX_EXCERPT_CHARS`] on a char boundary
pub fn truncate_excerpt(text: &str) -> String {
    match text.char_indices().nth(MAX_EXCERPT_CHARS) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[derive(Clone)]
pub struct AuditLog {
    store: Arc<dyn KvStore>,
    ttl: Duration,
}

impl AuditLog {
    pub fn new(store: Arc<dyn KvStore>, retention_days: u64) -> Self {
        Self {
            store,
            ttl: Duration::from_secs(retention_days.max(1) * SECONDS_PER_DAY),
        }
    }

    fn key(kind: RecordKind, timestamp: DateTime<Utc>, id: Uuid) -> String {
        format!(
            "{}{:013}:{}",
            kind.prefix(),
            timestamp.timestamp_millis().max(0),
            id
        )
    }

    pub async fn record_block(&self, record: &MatchRecord) -> Result<()> {
        self.write(RecordKind::Block, record.timestamp, record.id, record)
            .await
    }

    pub async fn record_leak(&self, record: &MatchRecord) -> Result<()> {
        self.write(RecordKind::Leak, record.timestamp, record.id, record)
            .await
    }

    pub async fn record_usage(&self, record: &UsageRecord) -> Result<()> {
        self.write(RecordKind::Usage, record.timestamp, record.id, record)
            .await
    }

    async fn write<T: Serialize>(
        &self,
        kind: RecordKind,
        timestamp: DateTime<Utc>,
        id: Uuid,
        record: &T,
    ) -> Result<()> {
        let value = serde_json::to_string(record)?;
        self.store
            .put(&Self::key(kind, timestamp, id), &value, Some(self.ttl))
            .await
    }

    /// Most recent match records of `kind`, newest first
    pub async fn recent(&self, kind: RecordKind, limit: usize) -> Result<Vec<MatchRecord>> {
        let keys = self.store.list(kind.prefix()).await?;
        let newest: Vec<&String> = keys.iter().rev().take(limit).collect();

        let mut records = Vec::with_capacity(newest.len());
        for batch in newest.chunks(READ_BATCH) {
            records.extend(self.load_batch(batch).await?);
        }

        Ok(records)
    }

    async fn load_batch(&self, keys: &[&String]) -> Result<Vec<MatchRecord>> {
        let values = join_all(keys.iter().map(|key| self.store.get(key))).await;

        let mut records = Vec::with_capacity(values.len());
        for value in values {
            // Entries can expire between list and get
            if let Some(raw) = value? {
                if let Ok(record) = serde_json::from_str::<MatchRecord>(&raw) {
                    records.push(record);
                }
            }
        }

        Ok(records)
    }

    pub async fn stats(&self) -> Result<AuditStats> {
        let requests = self.store.list(RecordKind::Usage.prefix()).await?.len() as u64;
        let leaks = self.store.list(RecordKind::Leak.prefix()).await?.len() as u64;
        let keys = self.store.list(RecordKind::Block.prefix()).await?;
        let keys: Vec<&String> = keys.iter().collect();

        let mut blocks = 0;
        let mut blocks_by_reason = BTreeMap::new();
        for batch in keys.chunks(READ_BATCH) {
            for record in self.load_batch(batch).await? {
                blocks += 1;
                *blocks_by_reason
                    .entry(record.reason.as_str().to_string())
                    .or_insert(0) += 1;
            }
        }

        Ok(AuditStats {
            requests,
            blocks,
            leaks,
            blocks_by_reason,
        })
    }
}
