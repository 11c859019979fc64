// src/pipeline/scheduler.rs

//! Periodic refresh scheduling.
//!
//! One scheduler instance owns one repeating timer. Everything it needs is
//! injected, so tests can run multiple independent instances. A cycle error
//! is logged and never unregisters the timer; overlap between a scheduled
//! cycle and a manual refresh is harmless because all store writes are
//! append-only or idempotent full-replace.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::models::Config;
use crate::pipeline::refresh::run_refresh;
use crate::services::{ActiveStormSource, SourceAdapter};
use crate::storage::SnapshotStore;

/// Owns the repeating refresh timer.
pub struct Scheduler {
    config: Arc<Config>,
    store: Arc<dyn SnapshotStore>,
    adapters: Vec<Arc<dyn SourceAdapter>>,
    bulletin: Option<Arc<dyn ActiveStormSource>>,
    handle: Option<JoinHandle<()>>,
}

impl Scheduler {
    pub fn new(
        config: Arc<Config>,
        store: Arc<dyn SnapshotStore>,
        adapters: Vec<Arc<dyn SourceAdapter>>,
        bulletin: Option<Arc<dyn ActiveStormSource>>,
    ) -> Self {
        Self {
            config,
            store,
            adapters,
            bulletin,
            handle: None,
        }
    }

    /// Start the timer: one cycle immediately, then one per interval.
    ///
    /// Calling `start` on a running scheduler is a no-op.
    pub fn start(&mut self) {
        if self.handle.is_some() {
            return;
        }

        let config = Arc::clone(&self.config);
        let store = Arc::clone(&self.store);
        let adapters = self.adapters.clone();
        let bulletin = self.bulletin.clone();

        let period = Duration::from_secs(config.fetch.refresh_interval_mins * 60);
        log::info!(
            "Starting refresh scheduler (every {} min)",
            config.fetch.refresh_interval_mins
        );

        self.handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                // First tick completes immediately.
                ticker.tick().await;
                if let Err(error) =
                    run_refresh(&config, &store, &adapters, bulletin.as_ref()).await
                {
                    log::error!("Refresh cycle failed: {error}");
                }
            }
        }));
    }

    /// Stop the timer. Snapshots already appended stay in the store.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            log::info!("Refresh scheduler stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::models::{FeedFamily, FeedKind, Snapshot, SnapshotPayload};
    use crate::services::SourceAdapter;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use chrono::Utc;

    struct CountingAdapter {
        store: Arc<dyn SnapshotStore>,
    }

    #[async_trait]
    impl SourceAdapter for CountingAdapter {
        fn family(&self) -> FeedFamily {
            FeedFamily::GriddedWeather
        }

        fn kinds(&self) -> &[FeedKind] {
            &[FeedKind::Pressure]
        }

        async fn fetch(&self, kind: FeedKind) -> Result<Snapshot> {
            let snapshot = Snapshot::new(
                kind,
                Utc::now(),
                Snapshot::GLOBAL_BOUNDS,
                SnapshotPayload::Raster {
                    grib_url: None,
                    netcdf_url: None,
                    cog_url: None,
                    tile_url: None,
                },
                None,
            );
            self.store.append_snapshot(snapshot).await
        }
    }

    #[tokio::test]
    async fn test_start_runs_immediate_cycle_and_stop_halts() {
        let store: Arc<dyn SnapshotStore> = Arc::new(MemoryStore::new());
        let adapters: Vec<Arc<dyn SourceAdapter>> = vec![Arc::new(CountingAdapter {
            store: Arc::clone(&store),
        })];

        let mut scheduler =
            Scheduler::new(Arc::new(Config::default()), Arc::clone(&store), adapters, None);
        assert!(!scheduler.is_running());

        scheduler.start();
        assert!(scheduler.is_running());

        // Give the immediate first tick a chance to run.
        tokio::time::sleep(Duration::from_millis(50)).await;
        scheduler.stop();
        assert!(!scheduler.is_running());

        let latest = store
            .latest_snapshot(FeedFamily::GriddedWeather, FeedKind::Pressure)
            .await
            .unwrap();
        assert!(latest.is_some());
    }

    #[tokio::test]
    async fn test_start_twice_is_noop() {
        let store: Arc<dyn SnapshotStore> = Arc::new(MemoryStore::new());
        let mut scheduler =
            Scheduler::new(Arc::new(Config::default()), store, Vec::new(), None);
        scheduler.start();
        scheduler.start();
        assert!(scheduler.is_running());
        scheduler.stop();
    }
}
