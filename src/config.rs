// src/config.rs

//! Loads the runtime configuration: the config-endpoint URL file, the
//! optional metrics env file, and the moderation executor. Deliberately
//! small — the bulk of the system's state lives in the policy snapshot,
//! which is fetched over HTTP rather than read from disk.

use anyhow::Result;
use std::collections::HashMap;
use std::fs;
use tracing::warn;

use crate::core::metrics::MetricsConfig;

/// Built-in fallback used when the URL file can't be read.
const DEFAULT_CONFIG_URL: &str = "http://127.0.0.1:8090/spamblaster-config.json";

/// Default path to the single-line file holding the config endpoint URL.
const DEFAULT_URL_FILE: &str = "./spamblaster.cfg";

/// Default path to the metrics env file.
const DEFAULT_METRICS_ENV_FILE: &str = "/usr/local/etc/.spamblaster.env";

/// The resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the policy snapshot endpoint (§4.D).
    pub relay_config_url: String,
    /// Log level used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Argv template for the moderation executor, e.g.
    /// `["/app/strfry"]`. Injected per REDESIGN FLAGS rather than
    /// hard-coded at the call site.
    pub moderation_executor: Vec<String>,
}

impl Config {
    /// Loads configuration given an optional override for the URL file
    /// path (from `--config`). Never fails: a missing or unreadable URL
    /// file falls back to the built-in default and is logged as a
    /// warning, matching the teacher's graceful degradation for optional
    /// config pieces.
    pub fn load(url_file_override: Option<&str>) -> Self {
        let url_file = url_file_override.unwrap_or(DEFAULT_URL_FILE);
        let relay_config_url = match fs::read_to_string(url_file) {
            Ok(contents) => {
                let trimmed = contents.trim();
                if trimmed.is_empty() {
                    warn!(path = %url_file, "config URL file is empty, using built-in default");
                    DEFAULT_CONFIG_URL.to_string()
                } else {
                    trimmed.to_string()
                }
            }
            Err(e) => {
                warn!(path = %url_file, error = %e, "could not read config URL file, using built-in default");
                DEFAULT_CONFIG_URL.to_string()
            }
        };

        Self {
            relay_config_url,
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            moderation_executor: vec!["/app/strfry".to_string()],
        }
    }
}

/// Loads the optional metrics sink configuration from the env file at
/// `/usr/local/etc/.spamblaster.env`. Returns `None` if the file is
/// absent or missing any required key — absence disables metrics
/// silently, per §6.
pub fn load_metrics_config(path: &str) -> Option<MetricsConfig> {
    let contents = fs::read_to_string(path).ok()?;
    let vars = parse_env_file(&contents);

    Some(MetricsConfig {
        url: vars.get("INFLUXDB_URL")?.clone(),
        token: vars.get("INFLUXDB_TOKEN")?.clone(),
        org: vars.get("INFLUXDB_ORG")?.clone(),
        bucket: vars.get("INFLUXDB_BUCKET")?.clone(),
        measurement: vars.get("INFLUXDB_MEASUREMENT")?.clone(),
    })
}

pub fn default_metrics_env_path() -> &'static str {
    DEFAULT_METRICS_ENV_FILE
}

fn parse_env_file(contents: &str) -> HashMap<String, String> {
    contents
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            let (key, value) = line.split_once('=')?;
            Some((
                key.trim().to_string(),
                value.trim().trim_matches('"').to_string(),
            ))
        })
        .collect()
}

/// Parses the CLI arguments for a `--config <path>` flag, mirroring the
/// teacher's manual `env::args()` scan for its own `--config`/`--port`
/// flags rather than reaching for a full argument-parsing crate.
pub fn config_path_from_args(args: &[String]) -> Option<String> {
    args.iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .cloned()
}
