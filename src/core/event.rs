// src/core/event.rs

//! Wire types for the request side of the stdin/stdout protocol.

use serde::{Deserialize, Serialize};

/// A single event as published by a client, as relayed by the host.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Event {
    pub content: String,
    pub created_at: i64,
    pub id: String,
    pub kind: i32,
    pub pubkey: String,
    #[serde(default)]
    pub sig: String,
    #[serde(default)]
    pub tags: Vec<Vec<String>>,
}

impl Event {
    /// Returns the value of the first tag with the given name (e.g. `"e"`, `"p"`).
    pub fn first_tag_value(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.first().map(String::as_str) == Some(name))
            .and_then(|t| t.get(1))
            .map(String::as_str)
    }

    /// Returns all tags with the given name.
    pub fn tags_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Vec<String>> {
        self.tags
            .iter()
            .filter(move |t| t.first().map(String::as_str) == Some(name))
    }
}

/// The full request envelope received on stdin, one per line.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RequestEnvelope {
    pub event: Event,
    #[serde(default, rename = "receivedAt")]
    pub received_at: i64,
    #[serde(default, rename = "sourceInfo")]
    pub source_info: String,
    #[serde(default, rename = "sourceType")]
    pub source_type: String,
    #[serde(default, rename = "type")]
    pub r#type: String,
}

/// Giftwrap / opaque-encrypted event kinds that bypass keyword rules
/// when `allow_giftwrap` is enabled.
pub const GIFTWRAP_KINDS: [i32; 8] = [13, 1059, 1060, 24, 25, 26, 27, 35834];

pub const KIND_MODERATION_REPORT: i32 = 1984;
pub const KIND_REACTION: i32 = 7;
