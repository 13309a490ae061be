// src/core/decision.rs

//! The decision pipeline: classifies one event against a policy snapshot
//! and the pubkey index, producing a verdict. This is the hot path run
//! once per input line; it must never block beyond the in-memory reads
//! it performs here (moderation invocation is dispatched by the caller).

use serde::Serialize;

use crate::core::event::{Event, GIFTWRAP_KINDS, KIND_MODERATION_REPORT, KIND_REACTION};
use crate::core::identity::canonicalize;
use crate::core::policy::PolicySnapshot;
use crate::core::pubkey_index::PubkeyIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    Accept,
    Reject,
    ShadowReject,
}

#[derive(Debug, Clone, Serialize)]
pub struct Verdict {
    pub id: String,
    pub action: Action,
    pub msg: String,
}

impl Verdict {
    fn accept(id: &str) -> Self {
        Self {
            id: id.to_string(),
            action: Action::Accept,
            msg: String::new(),
        }
    }

    fn reject(id: &str, msg: String) -> Self {
        Self {
            id: id.to_string(),
            action: Action::Reject,
            msg,
        }
    }

    fn shadow_reject(id: &str) -> Self {
        Self {
            id: id.to_string(),
            action: Action::ShadowReject,
            msg: String::new(),
        }
    }
}

/// The moderation action a privileged event requests, computed by
/// `classify_moderation` and executed out-of-band by the caller via
/// `core::moderation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationAction {
    DeleteEvent { event_id: String },
    BlockAndDeletePubkey { pubkey: String },
}

/// The outcome of checking whether `e` falls under the moderation
/// short-circuit: the kind+moderator precondition decides whether the
/// short-circuit fires at all; `action` separately says whether a
/// matching tag was present to determine *what* to execute. A
/// moderation event from a moderator with no usable tag still
/// shadow-rejects — it just has nothing to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivilegedModeration {
    pub action: Option<ModerationAction>,
}

/// Checks whether `e` meets spec §4.G step 1's short-circuit
/// precondition (`e.kind==1984`, or `e.kind==7` with ❌/🔨 content, from
/// a moderator or the owner). Returns `None` if the precondition isn't
/// met, in which case the caller should fall through to `decide`.
/// Returns `Some` whenever it is met, regardless of whether a usable
/// tag was found — the caller must shadow-reject in both cases and only
/// invoke the executor when `action` is `Some`.
pub fn classify_moderation(e: &Event, policy: &PolicySnapshot) -> Option<PrivilegedModeration> {
    if !policy.is_moderator(&e.pubkey) {
        return None;
    }

    if e.kind == KIND_MODERATION_REPORT {
        let action = e
            .first_tag_value("e")
            .map(|id| ModerationAction::DeleteEvent {
                event_id: id.to_string(),
            })
            .or_else(|| {
                e.first_tag_value("p")
                    .map(|pk| ModerationAction::BlockAndDeletePubkey {
                        pubkey: pk.to_string(),
                    })
            });
        return Some(PrivilegedModeration { action });
    }

    if e.kind == KIND_REACTION {
        let action = match e.content.as_str() {
            "❌" => e.first_tag_value("e").map(|id| ModerationAction::DeleteEvent {
                event_id: id.to_string(),
            }),
            "🔨" => e
                .first_tag_value("p")
                .map(|pk| ModerationAction::BlockAndDeletePubkey {
                    pubkey: pk.to_string(),
                }),
            _ => return None,
        };
        return Some(PrivilegedModeration { action });
    }

    None
}

/// Runs the full rule-precedence pipeline for `e` against `policy` and
/// `index`, per spec §4.G steps 2-10. Callers must first check
/// `classify_moderation`; if it returns `Some`, the moderation
/// short-circuit applies instead of this function.
pub fn decide(e: &Event, policy: &PolicySnapshot, index: &PubkeyIndex) -> Verdict {
    let is_mod = policy.is_moderator(&e.pubkey);
    let mut allow = policy.default_message_policy;
    let mut reason: Option<String> = None;

    // Step 3: author allow check (only when default = deny).
    if !policy.default_message_policy {
        if index.lookup(&e.pubkey).is_some() {
            allow = true;
        }
        if policy.allow_tagged {
            for tag in e.tags_named("p") {
                if let Some(value) = tag.get(1)
                    && index.lookup(value).is_some()
                {
                    allow = true;
                }
            }
        }
    }

    // Step 4: keyword allow branch (only when default = deny AND allow-keyword list non-empty).
    if !policy.default_message_policy && !policy.allow_list.keywords.is_empty() {
        let content_lower = e.content.to_lowercase();
        let found = policy
            .allow_list
            .keywords
            .iter()
            .any(|kw| content_lower.contains(&kw.keyword.to_lowercase()));

        if policy.allow_keyword_pubkey {
            allow = found && (allow || is_mod);
        } else {
            if found {
                allow = true;
            }
            if is_mod {
                allow = true;
            }
        }
    } else if !policy.default_message_policy && is_mod {
        // Keyword-allow branch not entered: mods bypass non-keyword-mode restrictions.
        allow = true;
    }

    // Step 5: kind allow-list backstop (only when default = deny).
    if !policy.default_message_policy
        && !allow
        && policy.allow_list.kinds.iter().any(|k| k.kind == e.kind)
    {
        allow = true;
    }

    // Step 6: pubkey block (exact equality on canonical form; see DESIGN.md
    // for the departure from the original's substring match).
    let canonical_pubkey = canonicalize(&e.pubkey);
    if let Some(entry) = policy
        .block_list
        .pubkeys
        .iter()
        .find(|p| canonicalize(&p.pubkey) == canonical_pubkey)
    {
        allow = false;
        reason = Some(format!(
            "blocked pubkey {} reason: {}",
            entry.pubkey, entry.reason
        ));
    }

    // Step 7: keyword block.
    let content_lower = e.content.to_lowercase();
    if let Some(entry) = policy
        .block_list
        .keywords
        .iter()
        .find(|kw| content_lower.contains(&kw.keyword.to_lowercase()))
    {
        allow = false;
        reason = Some(format!(
            "blocked. {} reason: {}",
            entry.keyword, entry.reason
        ));
    }

    // Step 8: giftwrap override.
    if policy.allow_giftwrap && GIFTWRAP_KINDS.contains(&e.kind) {
        allow = true;
    }

    // Step 9: kind block (final override).
    if let Some(entry) = policy.block_list.kinds.iter().find(|k| k.kind == e.kind) {
        allow = false;
        reason = Some(format!("blocked kind {} reason: {}", entry.kind, entry.reason));
    }

    if allow {
        Verdict::accept(&e.id)
    } else {
        Verdict::reject(&e.id, reason.unwrap_or_default())
    }
}

pub fn shadow_reject(e: &Event) -> Verdict {
    Verdict::shadow_reject(&e.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::policy::{KeywordEntry, KindEntry, PubkeyEntry, RuleList};

    fn event(kind: i32, pubkey: &str, content: &str) -> Event {
        Event {
            content: content.to_string(),
            created_at: 0,
            id: "evt1".to_string(),
            kind,
            pubkey: pubkey.to_string(),
            sig: String::new(),
            tags: vec![],
        }
    }

    fn allow_all_policy() -> PolicySnapshot {
        PolicySnapshot::default_allow_all()
    }

    #[test]
    fn default_allow_with_no_rules_accepts() {
        let policy = allow_all_policy();
        let index = PubkeyIndex::new();
        let e = event(1, "aa", "hi");
        let v = decide(&e, &policy, &index);
        assert_eq!(v.action, Action::Accept);
    }

    #[test]
    fn default_deny_allowlisted_pubkey_accepts() {
        let mut policy = allow_all_policy();
        policy.default_message_policy = false;
        let index = PubkeyIndex::new();
        index.upsert("aa..aa", "relay");
        let e = event(1, "aa..aa", "hi");
        let v = decide(&e, &policy, &index);
        assert_eq!(v.action, Action::Accept);
    }

    #[test]
    fn default_deny_allow_tagged_accepts() {
        let mut policy = allow_all_policy();
        policy.default_message_policy = false;
        policy.allow_tagged = true;
        let index = PubkeyIndex::new();
        index.upsert("bb..bb", "relay");
        let mut e = event(1, "cc..cc", "hi");
        e.tags = vec![vec!["p".to_string(), "bb..bb".to_string()]];
        let v = decide(&e, &policy, &index);
        assert_eq!(v.action, Action::Accept);
    }

    #[test]
    fn block_keyword_rejects_with_message() {
        let mut policy = allow_all_policy();
        policy.block_list.keywords.push(KeywordEntry {
            keyword: "spam".to_string(),
            reason: "dup".to_string(),
        });
        let index = PubkeyIndex::new();
        let e = event(1, "aa", "This is SPAM");
        let v = decide(&e, &policy, &index);
        assert_eq!(v.action, Action::Reject);
        assert_eq!(v.msg, "blocked. spam reason: dup");
    }

    #[test]
    fn giftwrap_override_beats_keyword_block() {
        let mut policy = allow_all_policy();
        policy.allow_giftwrap = true;
        policy.block_list.keywords.push(KeywordEntry {
            keyword: "x".to_string(),
            reason: "r".to_string(),
        });
        let index = PubkeyIndex::new();
        let e = event(1059, "aa", "x");
        let v = decide(&e, &policy, &index);
        assert_eq!(v.action, Action::Accept);
    }

    #[test]
    fn kind_block_overrides_giftwrap_allow() {
        let mut policy = allow_all_policy();
        policy.allow_giftwrap = true;
        policy.block_list.kinds.push(KindEntry {
            kind: 1059,
            reason: "no dm".to_string(),
        });
        let index = PubkeyIndex::new();
        let e = event(1059, "aa", "");
        let v = decide(&e, &policy, &index);
        assert_eq!(v.action, Action::Reject);
        assert!(v.msg.contains("blocked kind 1059"));
    }

    #[test]
    fn block_list_kind_overrides_everything_else() {
        let mut policy = allow_all_policy();
        policy.block_list.kinds.push(KindEntry {
            kind: 9,
            reason: "nope".to_string(),
        });
        let index = PubkeyIndex::new();
        let e = event(9, "aa", "fine");
        let v = decide(&e, &policy, &index);
        assert_eq!(v.action, Action::Reject);
    }

    #[test]
    fn pubkey_block_is_exact_not_substring() {
        let mut policy = allow_all_policy();
        policy.block_list.pubkeys.push(PubkeyEntry {
            pubkey: "aa".to_string(),
            reason: "r".to_string(),
        });
        let index = PubkeyIndex::new();
        let e = event(1, "aabb", "hi");
        let v = decide(&e, &policy, &index);
        // "aabb" is not exactly "aa": must not be blocked under the
        // exact-equality semantics chosen in DESIGN.md.
        assert_eq!(v.action, Action::Accept);
    }

    #[test]
    fn moderation_report_with_e_tag_deletes_event() {
        let mut policy = allow_all_policy();
        policy.owner = "mm..mm".to_string();
        let mut e = event(1984, "mm..mm", "");
        e.tags = vec![vec!["e".to_string(), "target-id".to_string()]];
        let outcome = classify_moderation(&e, &policy);
        assert_eq!(
            outcome,
            Some(PrivilegedModeration {
                action: Some(ModerationAction::DeleteEvent {
                    event_id: "target-id".to_string()
                })
            })
        );
    }

    #[test]
    fn reaction_hammer_from_moderator_blocks_and_deletes_pubkey() {
        let mut policy = allow_all_policy();
        policy.owner = "mm..mm".to_string();
        let mut e = event(7, "mm..mm", "🔨");
        e.tags = vec![vec!["p".to_string(), "vv..vv".to_string()]];
        let outcome = classify_moderation(&e, &policy);
        assert_eq!(
            outcome,
            Some(PrivilegedModeration {
                action: Some(ModerationAction::BlockAndDeletePubkey {
                    pubkey: "vv..vv".to_string()
                })
            })
        );
    }

    #[test]
    fn non_moderator_moderation_event_does_not_short_circuit() {
        let policy = allow_all_policy();
        let mut e = event(1984, "random", "");
        e.tags = vec![vec!["e".to_string(), "x".to_string()]];
        assert_eq!(classify_moderation(&e, &policy), None);
    }

    #[test]
    fn moderation_report_without_matching_tag_still_short_circuits() {
        // No e-tag or p-tag: the precondition (kind 1984 + moderator) is
        // still met, so the short-circuit must fire even though there's
        // no action to execute.
        let mut policy = allow_all_policy();
        policy.owner = "mm..mm".to_string();
        let e = event(1984, "mm..mm", "");
        let outcome = classify_moderation(&e, &policy);
        assert_eq!(outcome, Some(PrivilegedModeration { action: None }));
    }

    #[test]
    fn reaction_hammer_without_p_tag_still_short_circuits() {
        let mut policy = allow_all_policy();
        policy.owner = "mm..mm".to_string();
        let e = event(7, "mm..mm", "🔨");
        let outcome = classify_moderation(&e, &policy);
        assert_eq!(outcome, Some(PrivilegedModeration { action: None }));
    }

    #[test]
    fn reaction_with_unrelated_content_does_not_short_circuit() {
        let mut policy = allow_all_policy();
        policy.owner = "mm..mm".to_string();
        let e = event(7, "mm..mm", "+1");
        assert_eq!(classify_moderation(&e, &policy), None);
    }
}
