// src/core/identity.rs

//! Normalizes an author identifier to canonical hex form.
//!
//! Upstream components may hand us either a raw hex pubkey or a
//! bech32-encoded form (`npub1...`, `nsec1...`, etc). This module is the
//! one place that knows how to tell the two apart and decode the latter.

use tracing::warn;

/// Known bech32 human-readable-part prefixes worth attempting to decode.
/// Any other input is assumed to already be canonical hex.
const BECH32_PREFIXES: [&str; 4] = ["npub1", "nsec1", "note1", "nprofile1"];

/// Normalizes `s` to canonical hex. If `s` looks like a bech32-form
/// identifier, attempts to decode it; on any failure, or if `s` doesn't
/// look bech32-encoded at all, returns `s` unchanged.
///
/// Total function: never panics, always returns a string.
pub fn canonicalize(s: &str) -> String {
    if !looks_bech32(s) {
        return s.to_string();
    }

    match decode_bech32_to_hex(s) {
        Some(hex) => hex,
        None => {
            warn!(input = %s, "failed to decode bech32-form identifier, using input verbatim");
            s.to_string()
        }
    }
}

fn looks_bech32(s: &str) -> bool {
    BECH32_PREFIXES.iter().any(|p| s.starts_with(p))
}

fn decode_bech32_to_hex(s: &str) -> Option<String> {
    let (_hrp, data) = bech32::decode(s).ok()?;
    Some(hex_encode(&data))
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}
