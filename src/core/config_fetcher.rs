// src/core/config_fetcher.rs

//! The config fetcher (§4.D): a single 60s ticker that refreshes the
//! policy snapshot from the config HTTP endpoint, folds the relay
//! allow-list into the pubkey index under the `"relay"` source tag, and
//! publishes the current ACL source list to the aggregator.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};

use crate::core::identity::canonicalize;
use crate::core::policy::{AclSourceConfig, PolicySnapshot, RELAY_SOURCE};
use crate::core::pubkey_index::PubkeyIndex;
use crate::core::state::AppState;

const TICK_INTERVAL: Duration = Duration::from_secs(60);
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

pub struct ConfigFetcher {
    state: Arc<AppState>,
    sources_tx: mpsc::Sender<Vec<AclSourceConfig>>,
}

impl ConfigFetcher {
    pub fn new(state: Arc<AppState>, sources_tx: mpsc::Sender<Vec<AclSourceConfig>>) -> Self {
        Self { state, sources_tx }
    }

    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) {
        let mut interval = tokio::time::interval(TICK_INTERVAL);
        loop {
            tokio::select! {
                _ = interval.tick() => self.tick().await,
                _ = shutdown_rx.recv() => {
                    info!("config fetcher shutting down");
                    return;
                }
            }
        }
    }

    async fn tick(&self) {
        match self.fetch_snapshot().await {
            Ok(new_snapshot) => {
                self.apply_relay_allow_list(&self.state.pubkeys, &new_snapshot);
                let sources = new_snapshot.acl_sources.clone();
                self.state.snapshot.store(Arc::new(new_snapshot));
                // Unbuffered in spirit: a capacity-1 channel gives the
                // aggregator a rendezvous point without losing an update
                // if it's mid-processing the previous one.
                if self.sources_tx.send(sources).await.is_err() {
                    warn!("ACL source list channel closed; aggregator may have exited");
                }
            }
            Err(e) => {
                warn!(error = %e, "config fetch failed, retaining previous snapshot");
            }
        }
    }

    async fn fetch_snapshot(&self) -> Result<PolicySnapshot, crate::core::errors::GateError> {
        let resp = self
            .state
            .http
            .get(&self.state.config.relay_config_url)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await?;
        if resp.status() != reqwest::StatusCode::OK {
            return Err(crate::core::errors::GateError::HttpStatus(
                resp.status().as_u16(),
            ));
        }
        Ok(resp.json::<PolicySnapshot>().await?)
    }

    fn apply_relay_allow_list(&self, index: &PubkeyIndex, snapshot: &PolicySnapshot) {
        let mut desired = HashSet::with_capacity(snapshot.allow_list.pubkeys.len());
        for entry in &snapshot.allow_list.pubkeys {
            let hex = canonicalize(&entry.pubkey);
            index.upsert(&hex, RELAY_SOURCE);
            desired.insert(hex);
        }
        index.reconcile(RELAY_SOURCE, &desired);
    }
}
