// src/pipeline/refresh.rs

//! Refresh cycle: fan-out fetch, storm materialization, fallback.
//!
//! One cycle fetches every kind of every adapter concurrently and collects
//! per-call success/failure; one adapter's failure never cancels or blocks
//! the others. Failures are absorbed here; they surface only through the
//! status view's recency classification. The cycle result is never fatal to
//! the caller except for a defect inside the fallback synthesis itself.

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt};

use crate::error::Result;
use crate::models::{Config, FeedFamily, FeedKind, Snapshot, SnapshotPayload};
use crate::pipeline::materialize::storms_from_features;
use crate::services::{ActiveStormSource, SourceAdapter};
use crate::storage::SnapshotStore;

/// Aggregate result of one refresh cycle.
#[derive(Debug, Default)]
pub struct RefreshOutcome {
    /// Fetches attempted per family
    pub attempted: HashMap<FeedFamily, usize>,
    /// Fetches failed per family
    pub failed: HashMap<FeedFamily, usize>,
    /// Storms upserted from feed snapshots or the fallback source
    pub storms_upserted: usize,
    /// Whether the secondary bulletin source supplied the storms
    pub fallback_used: bool,
}

impl RefreshOutcome {
    /// True when every call in the family failed this cycle.
    pub fn family_failed(&self, family: FeedFamily) -> bool {
        let attempted = self.attempted.get(&family).copied().unwrap_or(0);
        let failed = self.failed.get(&family).copied().unwrap_or(0);
        attempted > 0 && failed == attempted
    }

    /// Total successful fetches.
    pub fn succeeded(&self) -> usize {
        self.total_attempted() - self.total_failed()
    }

    pub fn total_attempted(&self) -> usize {
        self.attempted.values().sum()
    }

    pub fn total_failed(&self) -> usize {
        self.failed.values().sum()
    }
}

/// Fetch a single (adapter, kind) pair, tagging the result with its family.
///
/// Factored into a named async fn so the fetch future has a concrete,
/// unambiguous signature; an inline `async move` closure here trips the
/// compiler's "FnOnce is not general enough" lifetime inference when the
/// enclosing future is later spawned.
async fn fetch_one(
    adapter: Arc<dyn SourceAdapter>,
    kind: FeedKind,
) -> (FeedFamily, FeedKind, Result<Snapshot>) {
    let result = adapter.fetch(kind).await;
    (adapter.family(), kind, result)
}

/// Run one refresh cycle.
///
/// Shared by the scheduler and the manual refresh entry point, so both paths
/// have identical fetch and materialization behavior.
pub async fn run_refresh(
    config: &Config,
    store: &Arc<dyn SnapshotStore>,
    adapters: &[Arc<dyn SourceAdapter>],
    bulletin: Option<&Arc<dyn ActiveStormSource>>,
) -> Result<RefreshOutcome> {
    let mut outcome = RefreshOutcome::default();

    // Stage 1: fan out every (adapter, kind) pair, bounded by concurrency.
    let jobs: Vec<_> = adapters
        .iter()
        .flat_map(|adapter| {
            adapter
                .kinds()
                .iter()
                .map(move |kind| (Arc::clone(adapter), *kind))
        })
        .collect();

    for (adapter, _) in &jobs {
        *outcome.attempted.entry(adapter.family()).or_default() += 1;
    }

    let concurrency = config.fetch.max_concurrent.max(1);
    let mut fetched: Vec<Snapshot> = Vec::new();
    let fetch_futures: Vec<_> = jobs
        .into_iter()
        .map(|(adapter, kind)| fetch_one(adapter, kind))
        .collect();
    let mut fetch_stream = stream::iter(fetch_futures).buffer_unordered(concurrency);

    while let Some((family, kind, result)) = fetch_stream.next().await {
        match result {
            Ok(snapshot) => fetched.push(snapshot),
            Err(error) => {
                *outcome.failed.entry(family).or_default() += 1;
                log::warn!("Fetch failed for {family}/{kind}: {error}");
            }
        }
    }

    // Stage 2: materialize storms from successful track-geometry snapshots.
    for snapshot in &fetched {
        if snapshot.family != FeedFamily::TrackGeometry {
            continue;
        }
        let SnapshotPayload::Geometry { data } = &snapshot.payload else {
            continue;
        };
        for storm in storms_from_features(data) {
            store.upsert_storm(storm).await?;
            outcome.storms_upserted += 1;
        }
    }

    // Stage 3: when the whole track-geometry family failed, consult the
    // secondary live source. If that is unreachable too, existing storms are
    // left untouched; the gap shows up in the status view instead.
    if outcome.family_failed(FeedFamily::TrackGeometry) {
        if let Some(source) = bulletin {
            match source.active_storms().await {
                Ok(storms) => {
                    for storm in storms {
                        store.upsert_storm(storm).await?;
                        outcome.storms_upserted += 1;
                        outcome.fallback_used = true;
                    }
                }
                Err(error) => {
                    log::warn!(
                        "Track-geometry family down and bulletin unreachable ({error}); \
                         keeping existing storms"
                    );
                }
            }
        }
    }

    log::info!(
        "Refresh cycle complete: {}/{} fetches succeeded, {} storm(s) upserted{}",
        outcome.succeeded(),
        outcome.total_attempted(),
        outcome.storms_upserted,
        if outcome.fallback_used {
            " (bulletin fallback)"
        } else {
            ""
        }
    );

    Ok(outcome)
}
