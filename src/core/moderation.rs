// src/core/moderation.rs

//! The moderation side-channel: turns a `ModerationAction` into a
//! structured delete filter and invokes the external executor
//! (`/app/strfry delete --filter <json>` by default, injected per
//! REDESIGN FLAGS so it's testable without a real subprocess).

use serde_json::json;
use tracing::{debug, warn};

use crate::core::decision::ModerationAction;

/// Builds the JSON filter argument for the executor, per spec §4.H.
pub fn build_filter(action: &ModerationAction) -> serde_json::Value {
    match action {
        ModerationAction::DeleteEvent { event_id } => json!({ "ids": [event_id] }),
        ModerationAction::BlockAndDeletePubkey { pubkey } => json!({ "authors": [pubkey] }),
    }
}

/// Runs the configured executor with the filter for `action`. Synchronous
/// on the calling task: per spec §4.H, the host is expected to process
/// events serially, so this is allowed to block the decision loop for the
/// duration of the subprocess call. Failure is logged; callers must still
/// emit `shadowReject` regardless of the outcome here.
pub async fn execute(executor: &[String], action: &ModerationAction) {
    let Some((program, args)) = executor.split_first() else {
        warn!("moderation executor is not configured; skipping delete invocation");
        return;
    };

    let filter = build_filter(action).to_string();
    let mut cmd = tokio::process::Command::new(program);
    cmd.args(args).arg("delete").arg("--filter").arg(&filter);

    match cmd.output().await {
        Ok(output) => {
            debug!(
                status = ?output.status,
                stdout = %String::from_utf8_lossy(&output.stdout),
                "moderation executor finished"
            );
            if !output.status.success() {
                warn!(
                    stderr = %String::from_utf8_lossy(&output.stderr),
                    "moderation executor exited non-zero"
                );
            }
        }
        Err(e) => {
            warn!(error = %e, "failed to invoke moderation executor");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_event_filter_shape() {
        let action = ModerationAction::DeleteEvent {
            event_id: "abc".to_string(),
        };
        assert_eq!(build_filter(&action), json!({ "ids": ["abc"] }));
    }

    #[test]
    fn block_pubkey_filter_shape() {
        let action = ModerationAction::BlockAndDeletePubkey {
            pubkey: "vv..vv".to_string(),
        };
        assert_eq!(build_filter(&action), json!({ "authors": ["vv..vv"] }));
    }

    #[tokio::test]
    async fn execute_with_empty_executor_does_not_panic() {
        let action = ModerationAction::DeleteEvent {
            event_id: "x".to_string(),
        };
        execute(&[], &action).await;
    }
}
