//! payout-core: creator matching, cross-platform deduplication and
//! payout costing.
//!
//! Flow: raw records → `matcher` → per-creator groups → `dedup` →
//! `bonus` → `pipeline::PayoutReport`.

pub mod bonus;
pub mod config;
pub mod dedup;
pub mod diagnostic;
pub mod error;
pub mod matcher;
pub mod money;
pub mod normalize;
pub mod pipeline;
pub mod record;
pub mod registry;
pub mod roster;
pub mod store;
pub mod types;
