//! Shared types and JID/phone normalization used across the gateway crates.

pub mod jid;
pub mod types;
