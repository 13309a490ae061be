// src/core/pipeline.rs

//! The stdin/stdout request loop (§6): single-consumer of stdin,
//! single-producer of stdout, one response per request line in strict
//! input order. Malformed input is the only fatal error in the system.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tracing::{error, info};

use crate::core::decision::{self, classify_moderation};
use crate::core::event::RequestEnvelope;
use crate::core::moderation;
use crate::core::state::AppState;

/// Runs the main decision loop against real process stdin/stdout until
/// EOF. Returns an error (and the caller should exit non-zero) on
/// malformed input, per spec §6/§7.
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();
    run_with(state, stdin, stdout).await
}

/// Testable core of the loop, parameterized over the reader/writer so
/// unit tests can drive it without real stdio.
pub async fn run_with<R, W>(state: Arc<AppState>, reader: R, writer: W) -> Result<()>
where
    R: tokio::io::AsyncRead + Unpin,
    W: tokio::io::AsyncWrite + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    let mut out = BufWriter::new(writer);

    while let Some(line) = lines.next_line().await.context("reading request line")? {
        if line.trim().is_empty() {
            continue;
        }

        let envelope: RequestEnvelope = match serde_json::from_str(&line) {
            Ok(e) => e,
            Err(e) => {
                error!(error = %e, line = %line, "malformed input line, terminating");
                bail!("malformed input: {e}");
            }
        };

        let snapshot = state.current_snapshot();

        let verdict = if let Some(privileged) = classify_moderation(&envelope.event, &snapshot) {
            if let Some(action) = &privileged.action {
                moderation::execute(&state.config.moderation_executor, action).await;
            }
            decision::shadow_reject(&envelope.event)
        } else {
            decision::decide(&envelope.event, &snapshot, &state.pubkeys)
        };

        if let Some(metrics) = &state.metrics {
            metrics.emit_decision(&snapshot.relay_id, envelope.event.kind, verdict.action);
        }

        let response = serde_json::to_string(&verdict).context("serializing verdict")?;
        out.write_all(response.as_bytes()).await?;
        out.write_all(b"\n").await?;
        out.flush().await?;
    }

    info!("stdin closed, shutting down decision loop");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn test_config() -> Config {
        Config {
            relay_config_url: "http://unused".to_string(),
            log_level: "info".to_string(),
            moderation_executor: vec![],
        }
    }

    #[tokio::test]
    async fn one_response_per_request_in_order() {
        let state = AppState::new(test_config(), None);
        let input = concat!(
            r#"{"event":{"content":"hi","created_at":0,"id":"e1","kind":1,"pubkey":"aa","sig":"","tags":[]},"receivedAt":0,"sourceInfo":"","sourceType":"","type":"new"}"#,
            "\n",
            r#"{"event":{"content":"hi2","created_at":0,"id":"e2","kind":1,"pubkey":"bb","sig":"","tags":[]},"receivedAt":0,"sourceInfo":"","sourceType":"","type":"new"}"#,
            "\n"
        );

        let mut output = Vec::new();
        run_with(state, input.as_bytes(), &mut output).await.unwrap();

        let text = String::from_utf8(output).unwrap();
        let responses: Vec<&str> = text.lines().collect();
        assert_eq!(responses.len(), 2);
        assert!(responses[0].contains("\"id\":\"e1\""));
        assert!(responses[1].contains("\"id\":\"e2\""));
    }

    #[tokio::test]
    async fn malformed_input_is_fatal() {
        let state = AppState::new(test_config(), None);
        let input = b"not json\n";
        let mut output = Vec::new();
        let result = run_with(state, &input[..], &mut output).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn moderator_report_with_no_tag_still_shadow_rejects() {
        // Regression test: a moderation-report event from a moderator
        // with no e-tag or p-tag has no action to execute, but the
        // kind+moderator precondition alone must still force
        // shadowReject rather than falling through to `decide`.
        use crate::core::policy::PolicySnapshot;

        let state = AppState::new(test_config(), None);
        let mut snapshot = PolicySnapshot::default_allow_all();
        snapshot.owner = "mod..mod".to_string();
        state.snapshot.store(Arc::new(snapshot));

        let input = concat!(
            r#"{"event":{"content":"","created_at":0,"id":"e1","kind":1984,"pubkey":"mod..mod","sig":"","tags":[]},"receivedAt":0,"sourceInfo":"","sourceType":"","type":"new"}"#,
            "\n"
        );

        let mut output = Vec::new();
        run_with(state, input.as_bytes(), &mut output).await.unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("\"action\":\"shadowReject\""));
    }
}
