//! Storage abstractions for snapshots, storms, and forecasts.
//!
//! The store is an append-only keyed repository. Snapshots and forecasts are
//! immutable once appended and receive a monotonic sequence id at append
//! time; "latest" is always a derived view (greatest timestamp, ties broken
//! by most-recent insertion). Storms are the one mutable collection, replaced
//! whole by id on each upsert.

pub mod local;
pub mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{FeedFamily, FeedKind, Forecast, Snapshot, Storm};

// Re-export for convenience
pub use local::LocalStore;
pub use memory::MemoryStore;

/// Trait for snapshot/storm/forecast storage backends.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Append one immutable snapshot; returns it with its assigned id.
    async fn append_snapshot(&self, snapshot: Snapshot) -> Result<Snapshot>;

    /// Latest snapshot for a (family, kind), by timestamp then insertion.
    async fn latest_snapshot(
        &self,
        family: FeedFamily,
        kind: FeedKind,
    ) -> Result<Option<Snapshot>>;

    /// All snapshots for a family, optionally narrowed to one kind,
    /// newest first.
    async fn snapshots(&self, family: FeedFamily, kind: Option<FeedKind>)
        -> Result<Vec<Snapshot>>;

    /// All storms, optionally only the active ones.
    async fn list_storms(&self, active_only: bool) -> Result<Vec<Storm>>;

    /// One storm by id.
    async fn get_storm(&self, id: &str) -> Result<Option<Storm>>;

    /// Full-replace upsert keyed by storm id.
    async fn upsert_storm(&self, storm: Storm) -> Result<Storm>;

    /// Append one immutable forecast; returns it with its assigned id.
    async fn append_forecast(&self, forecast: Forecast) -> Result<Forecast>;

    /// Latest forecast for a storm, by creation time then insertion.
    async fn latest_forecast(&self, storm_id: &str) -> Result<Option<Forecast>>;

    /// All forecasts, optionally narrowed to one storm, newest first.
    async fn list_forecasts(&self, storm_id: Option<&str>) -> Result<Vec<Forecast>>;
}
