// src/core/acl/feed.rs

//! Parses the two known ACL feed payload shapes (§3) and exposes a single
//! `fetch` capability per source type, per the polymorphic-feed design
//! note in spec §9: the refresher is written against this trait, not
//! against per-type branches.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

use crate::core::errors::GateError;
use crate::core::policy::AclSourceType;

#[derive(Debug, Deserialize)]
struct GrapevineData {
    #[allow(dead_code)]
    query: Option<String>,
    #[allow(dead_code)]
    #[serde(rename = "numPubkeys")]
    num_pubkeys: Option<u64>,
    pubkeys: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GrapevineResponse {
    #[allow(dead_code)]
    success: bool,
    data: GrapevineData,
    #[allow(dead_code)]
    kinds: Option<Vec<i32>>,
}

#[derive(Debug, Deserialize)]
struct Nip05Response {
    names: std::collections::HashMap<String, String>,
}

/// Fetches and parses a single ACL source, returning the set of hex
/// pubkeys it currently asserts. Transport, status, or parse failures are
/// returned as `GateError`; callers treat these as soft failures that
/// preserve stale index state.
#[async_trait]
pub trait AclFeed: Send + Sync {
    async fn fetch(&self, client: &reqwest::Client, url: &str) -> Result<HashSet<String>, GateError>;
}

pub struct GrapevineFeed;
pub struct Nip05Feed;

#[async_trait]
impl AclFeed for GrapevineFeed {
    async fn fetch(&self, client: &reqwest::Client, url: &str) -> Result<HashSet<String>, GateError> {
        let resp = client
            .get(url)
            .timeout(Duration::from_secs(20))
            .send()
            .await?;
        if resp.status() != reqwest::StatusCode::OK {
            return Err(GateError::HttpStatus(resp.status().as_u16()));
        }
        let body: GrapevineResponse = resp.json().await?;
        Ok(body.data.pubkeys.into_iter().collect())
    }
}

#[async_trait]
impl AclFeed for Nip05Feed {
    async fn fetch(&self, client: &reqwest::Client, url: &str) -> Result<HashSet<String>, GateError> {
        let url = ensure_nip05_suffix(url);
        let resp = client
            .get(&url)
            .timeout(Duration::from_secs(10))
            .send()
            .await?;
        if resp.status() != reqwest::StatusCode::OK {
            return Err(GateError::HttpStatus(resp.status().as_u16()));
        }
        let body: Nip05Response = resp.json().await?;
        Ok(body.names.into_values().collect())
    }
}

fn ensure_nip05_suffix(url: &str) -> String {
    const SUFFIX: &str = "/.well-known/nostr.json";
    if url.ends_with(SUFFIX) {
        url.to_string()
    } else {
        format!("{}{SUFFIX}", url.trim_end_matches('/'))
    }
}

/// Returns the feed implementation for a given source type.
pub fn feed_for(source_type: AclSourceType) -> Box<dyn AclFeed> {
    match source_type {
        AclSourceType::Grapevine => Box::new(GrapevineFeed),
        AclSourceType::Nip05 => Box::new(Nip05Feed),
    }
}
