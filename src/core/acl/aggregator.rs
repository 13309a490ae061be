// src/core/acl/aggregator.rs

//! The ACL aggregator (§4.E): single consumer of the source-list channel
//! published by the config fetcher. Starts/stops a per-source refresher
//! as sources come and go, and purges an index source's entries when its
//! source id disappears from the list.
//!
//! Per the Open Question resolution in DESIGN.md, this diffs the
//! incoming list by its *set of ids* rather than by length — the spec's
//! documented length-only trigger is a likely bug and is not reproduced
//! here.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tracing::info;

use super::refresher;
use crate::core::policy::AclSourceConfig;
use crate::core::pubkey_index::PubkeyIndex;

/// Stagger delay between a new source's initial synchronous fetch and
/// the start of its periodic ticker.
const STAGGER: Duration = Duration::from_secs(30);

struct SourceHandle {
    stop_tx: broadcast::Sender<()>,
    task: tokio::task::JoinHandle<()>,
}

pub struct AclAggregator {
    index: Arc<PubkeyIndex>,
    client: reqwest::Client,
    old_sources: Vec<AclSourceConfig>,
    handles: HashMap<String, SourceHandle>,
}

impl AclAggregator {
    pub fn new(index: Arc<PubkeyIndex>, client: reqwest::Client) -> Self {
        Self {
            index,
            client,
            old_sources: Vec::new(),
            handles: HashMap::new(),
        }
    }

    /// Consumes the source-list channel until it closes or `shutdown_rx` fires.
    pub async fn run(
        mut self,
        mut sources_rx: mpsc::Receiver<Vec<AclSourceConfig>>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                maybe_sources = sources_rx.recv() => {
                    match maybe_sources {
                        Some(sources) => self.apply(sources).await,
                        None => break,
                    }
                }
                _ = shutdown_rx.recv() => break,
            }
        }
        self.stop_all().await;
    }

    /// Diffs `new_sources` against the currently tracked set and
    /// starts/stops refreshers accordingly.
    pub async fn apply(&mut self, new_sources: Vec<AclSourceConfig>) {
        let new_ids: HashSet<&str> = new_sources.iter().map(|s| s.id.as_str()).collect();
        let old_ids: HashSet<&str> = self.old_sources.iter().map(|s| s.id.as_str()).collect();
        if new_ids == old_ids {
            return;
        }

        for source in &new_sources {
            if !old_ids.contains(source.id.as_str()) {
                self.start_source(source.clone()).await;
            }
        }

        let removed: Vec<String> = self
            .old_sources
            .iter()
            .filter(|s| !new_ids.contains(s.id.as_str()))
            .map(|s| s.id.clone())
            .collect();
        for id in removed {
            self.stop_source(&id).await;
        }

        self.old_sources = new_sources;
    }

    async fn start_source(&mut self, source: AclSourceConfig) {
        refresher::refresh_once(&source, &self.index, &self.client).await;
        tokio::time::sleep(STAGGER).await;

        let (stop_tx, stop_rx) = broadcast::channel(1);
        let index = self.index.clone();
        let client = self.client.clone();
        let id = source.id.clone();
        let task = tokio::spawn(async move {
            refresher::run(source, index, client, stop_rx).await;
        });
        self.handles.insert(id, SourceHandle { stop_tx, task });
    }

    async fn stop_source(&mut self, id: &str) {
        if let Some(handle) = self.handles.remove(id) {
            let _ = handle.stop_tx.send(());
            let _ = handle.task.await;
        }
        let removed = self.index.purge(id);
        info!(source_id = %id, removed, "ACL source removed, purged its entries");
    }

    async fn stop_all(&mut self) {
        let ids: Vec<String> = self.handles.keys().cloned().collect();
        for id in ids {
            self.stop_source(&id).await;
        }
    }
}
