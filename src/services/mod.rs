// src/services/mod.rs

//! Upstream feed adapters and the forecast oracle client.
//!
//! Each adapter wraps exactly one upstream integration and exposes the same
//! `fetch(kind)` contract. Adapters never retry internally; retry and
//! fallback policy belong to the refresh pipeline so that fallback decisions
//! see the true failure count for a cycle.

pub mod bulletin;
pub mod gridded;
pub mod ocean;
pub mod oracle;
pub mod track;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{FeedFamily, FeedKind, Snapshot, Storm};

// Re-export for convenience
pub use gridded::GriddedFeed;
pub use ocean::OceanFeed;
pub use oracle::{HttpOracle, Oracle};
pub use track::TrackFeed;

/// One upstream feed integration.
///
/// A successful `fetch` appends exactly one immutable snapshot to the store
/// and returns it; existing snapshots are never mutated.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// The feed family this adapter serves.
    fn family(&self) -> FeedFamily;

    /// The kinds this adapter can fetch.
    fn kinds(&self) -> &[FeedKind];

    /// Fetch one kind, append the resulting snapshot, and return it.
    async fn fetch(&self, kind: FeedKind) -> Result<Snapshot>;
}

/// Secondary authoritative live source for currently-active storms.
///
/// Consulted by the refresh pipeline only when every track-geometry call in a
/// cycle has failed.
#[async_trait]
pub trait ActiveStormSource: Send + Sync {
    async fn active_storms(&self) -> Result<Vec<Storm>>;
}
