// src/core/metrics.rs

//! The optional metrics sink: emits one point per decision to an
//! InfluxDB-compatible line-protocol endpoint. Absence of the env file
//! (§6) disables this silently; delivery failures are swallowed, as this
//! is explicitly a fire-and-forget collaborator (§1 Out of scope).

use tracing::debug;

use crate::core::decision::Action;

/// Configuration for the metrics sink, loaded from the env file described
/// in `config::load_metrics_config`. `None` at the call site means
/// metrics are disabled.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    pub url: String,
    pub token: String,
    pub org: String,
    pub bucket: String,
    pub measurement: String,
}

/// A fire-and-forget line-protocol writer.
#[derive(Debug, Clone)]
pub struct MetricsSink {
    config: MetricsConfig,
    client: reqwest::Client,
}

impl MetricsSink {
    pub fn new(config: MetricsConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    /// Emits one point for a decision: tags `{kind, relay_id}`, fields
    /// `{event=1, blocked, allowed}`. Spawns the write so the decision
    /// loop is never blocked waiting on the metrics endpoint.
    pub fn emit_decision(&self, relay_id: &str, kind: i32, action: Action) {
        let (blocked, allowed) = match action {
            Action::Accept => (0, 1),
            Action::Reject | Action::ShadowReject => (1, 0),
        };

        let line = format!(
            "{measurement},kind={kind},relay_id={relay_id} event=1i,blocked={blocked}i,allowed={allowed}i",
            measurement = escape_measurement(&self.config.measurement),
        );

        let sink = self.clone();
        tokio::spawn(async move {
            sink.write_line(line).await;
        });
    }

    async fn write_line(&self, line: String) {
        let url = format!(
            "{}/api/v2/write?org={}&bucket={}&precision=ns",
            self.config.url.trim_end_matches('/'),
            self.config.org,
            self.config.bucket
        );

        let result = self
            .client
            .post(&url)
            .header("Authorization", format!("Token {}", self.config.token))
            .body(line)
            .send()
            .await;

        match result {
            Ok(resp) if !resp.status().is_success() => {
                debug!(status = %resp.status(), "metrics write rejected by sink");
            }
            Err(e) => {
                debug!(error = %e, "metrics write failed");
            }
            _ => {}
        }
    }
}

fn escape_measurement(name: &str) -> String {
    name.replace(' ', "\\ ").replace(',', "\\,")
}
