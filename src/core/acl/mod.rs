// src/core/acl/mod.rs

//! ACL aggregation subsystem (§4.E, §4.F): merges pubkeys from N
//! asynchronous ACL feeds into the shared pubkey index, reacting to
//! source add/remove by spawning or stopping per-source refreshers.

pub mod aggregator;
pub mod feed;
pub mod refresher;

pub use aggregator::AclAggregator;
