// src/core/acl/refresher.rs

//! Per-source periodic refresher (§4.F): fetches one ACL source on a
//! 60-minute ticker (after an initial synchronous fetch performed by the
//! aggregator) and upserts/reconciles its pubkeys in the shared index.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{info, warn};

use super::feed::feed_for;
use crate::core::policy::AclSourceConfig;
use crate::core::pubkey_index::PubkeyIndex;

const REFRESH_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Runs a single source's periodic fetch loop until told to stop. The
/// caller (the aggregator) is responsible for the initial synchronous
/// fetch and the 30s stagger before spawning this.
pub async fn run(
    source: AclSourceConfig,
    index: Arc<PubkeyIndex>,
    client: reqwest::Client,
    mut stop_rx: broadcast::Receiver<()>,
) {
    let mut interval = tokio::time::interval(REFRESH_INTERVAL);
    interval.tick().await; // consume the immediate first tick; caller already did the initial fetch.

    loop {
        tokio::select! {
            _ = interval.tick() => {
                refresh_once(&source, &index, &client).await;
            }
            _ = stop_rx.recv() => {
                info!(source_id = %source.id, "ACL refresher stopping");
                return;
            }
        }
    }
}

/// Performs one fetch-and-reconcile cycle for `source`. On any failure,
/// logs and leaves the index untouched for this source (stale data is
/// preserved, per §4.F and §7).
pub async fn refresh_once(source: &AclSourceConfig, index: &PubkeyIndex, client: &reqwest::Client) {
    let feed = feed_for(source.source_type);
    match feed.fetch(client, &source.url).await {
        Ok(pubkeys) => {
            for pk in &pubkeys {
                index.upsert(pk, &source.id);
            }
            index.reconcile(&source.id, &pubkeys);
            info!(source_id = %source.id, count = pubkeys.len(), "ACL source refreshed");
        }
        Err(e) => {
            warn!(source_id = %source.id, error = %e, "ACL source refresh failed, keeping stale data");
        }
    }
}
