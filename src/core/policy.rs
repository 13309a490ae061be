// src/core/policy.rs

//! The policy snapshot: an immutable-per-tick description of relay rules,
//! fetched from the config endpoint (§4.D) and swapped in atomically.

use serde::{Deserialize, Serialize};

/// A single keyword rule carrying the reason shown to (or logged for) the client.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KeywordEntry {
    pub keyword: String,
    #[serde(default)]
    pub reason: String,
}

/// A single kind rule.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KindEntry {
    pub kind: i32,
    #[serde(default)]
    pub reason: String,
}

/// A single pubkey rule. The pubkey may be bech32-encoded in the source
/// document; callers must canonicalize before matching.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PubkeyEntry {
    pub pubkey: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RuleList {
    #[serde(default)]
    pub keywords: Vec<KeywordEntry>,
    #[serde(default)]
    pub pubkeys: Vec<PubkeyEntry>,
    #[serde(default)]
    pub kinds: Vec<KindEntry>,
}

/// The provenance discriminator used in the pubkey index. `"relay"` for
/// the allow-list carried in the policy snapshot itself.
pub const RELAY_SOURCE: &str = "relay";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AclSourceType {
    Grapevine,
    Nip05,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AclSourceConfig {
    pub id: String,
    pub url: String,
    #[serde(rename = "type")]
    pub source_type: AclSourceType,
}

/// Immutable-per-tick description of the relay's current rules. Replaced
/// atomically by the config fetcher; readers always observe one
/// consistent snapshot for the lifetime of a single decision.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PolicySnapshot {
    pub relay_id: String,
    pub default_message_policy: bool,
    #[serde(default)]
    pub allow_giftwrap: bool,
    #[serde(default)]
    pub allow_tagged: bool,
    #[serde(default)]
    pub allow_keyword_pubkey: bool,
    pub owner: String,
    #[serde(default)]
    pub moderators: Vec<String>,
    #[serde(default)]
    pub allow_list: RuleList,
    #[serde(default)]
    pub block_list: RuleList,
    #[serde(default)]
    pub acl_sources: Vec<AclSourceConfig>,
}

impl PolicySnapshot {
    /// A conservative default used when the config endpoint has never
    /// successfully returned a snapshot: allow everything, no ACL feeds.
    pub fn default_allow_all() -> Self {
        Self {
            relay_id: "unconfigured".to_string(),
            default_message_policy: true,
            allow_giftwrap: true,
            allow_tagged: false,
            allow_keyword_pubkey: false,
            owner: String::new(),
            moderators: Vec::new(),
            allow_list: RuleList::default(),
            block_list: RuleList::default(),
            acl_sources: Vec::new(),
        }
    }

    /// True if `pk` is the owner (raw equality) or a moderator (compared
    /// in canonical form, so a bech32-encoded moderator entry still
    /// matches a hex event pubkey). The owner comparison is intentionally
    /// not canonicalized — see DESIGN.md.
    pub fn is_moderator(&self, pk: &str) -> bool {
        if pk == self.owner {
            return true;
        }
        self.moderators
            .iter()
            .any(|m| crate::core::identity::canonicalize(m) == pk)
    }
}
