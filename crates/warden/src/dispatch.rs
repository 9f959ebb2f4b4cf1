//! Fire-and-forget side effects
//!
//! Audit writes and alerts run as detached tasks. The request path never
//! awaits them and their failures stop here.

use std::future::Future;
use tracing::warn;

use crate::error::Result;

/// Spawn `task` onto the runtime and discard its outcome.
///
/// `label` names the side effect in the log line emitted on failure.
pub fn spawn_detached<F>(label: &'static str, task: F)
where
    F: Future<Output = Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = task.await {
            warn!(side_effect = label, error = %e, "Side effect failed, ignoring");
        }
    });
}
