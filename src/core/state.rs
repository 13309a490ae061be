// src/core/state.rs

//! The central `AppState` struct, analogous to the teacher's
//! `ServerState`: holds everything shared between the decision loop and
//! the background tasks, wrapped in `Arc` and cloned cheaply per task.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::Config;
use crate::core::metrics::MetricsSink;
use crate::core::policy::PolicySnapshot;
use crate::core::pubkey_index::PubkeyIndex;

/// Shared, server-wide state. Constructed once at startup and handed to
/// the decision loop and every background task.
pub struct AppState {
    /// The live policy snapshot, swapped atomically by the config fetcher.
    pub snapshot: ArcSwap<PolicySnapshot>,
    /// The concurrent pubkey -> source-tag index.
    pub pubkeys: Arc<PubkeyIndex>,
    /// Resolved runtime configuration.
    pub config: Config,
    /// The shared HTTP client used by the config fetcher and ACL refreshers.
    pub http: reqwest::Client,
    /// The optional metrics sink; `None` disables metrics emission.
    pub metrics: Option<MetricsSink>,
}

impl AppState {
    pub fn new(config: Config, metrics: Option<MetricsSink>) -> Arc<Self> {
        Arc::new(Self {
            snapshot: ArcSwap::from_pointee(PolicySnapshot::default_allow_all()),
            pubkeys: Arc::new(PubkeyIndex::new()),
            config,
            http: reqwest::Client::new(),
            metrics,
        })
    }

    pub fn current_snapshot(&self) -> Arc<PolicySnapshot> {
        self.snapshot.load_full()
    }
}
