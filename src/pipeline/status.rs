// src/pipeline/status.rs

//! System-status aggregation.
//!
//! A pure read over current store state and startup configuration; computing
//! status never triggers a fetch.

use chrono::{Duration, Utc};

use crate::error::Result;
use crate::models::{
    Config, FamilyHealth, FamilyStatus, FeedFamily, SystemMode, SystemStatus,
};
use crate::storage::SnapshotStore;

/// Compute the current system-status view.
pub async fn compute_status(config: &Config, store: &dyn SnapshotStore) -> Result<SystemStatus> {
    let active_storms = store.list_storms(true).await?.len();
    let staleness = Duration::minutes(config.fetch.staleness_mins);
    let now = Utc::now();

    let mut families = Vec::with_capacity(3);
    for family in FeedFamily::all() {
        let newest = store.snapshots(family, None).await?.into_iter().next();

        let health = if !family_configured(config, family) {
            FamilyHealth::Unavailable
        } else if family == FeedFamily::OceanField && !config.ocean.has_credentials() {
            FamilyHealth::MissingCredentials
        } else {
            // Freshness is judged on fetch time; the data's own model
            // timestamp may legitimately lag by a cycle.
            match &newest {
                Some(snapshot) if now - snapshot.created_at <= staleness => {
                    FamilyHealth::Operational
                }
                _ => FamilyHealth::ConfiguredUnreachable,
            }
        };

        families.push(FamilyStatus {
            family,
            health,
            last_update: newest.map(|s| s.timestamp),
        });
    }

    let oracle_configured = config.oracle.is_configured();
    let mode = if active_storms > 0 && oracle_configured {
        SystemMode::Live
    } else {
        SystemMode::Limited
    };

    Ok(SystemStatus {
        active_storms,
        mode,
        oracle_configured,
        families,
    })
}

fn family_configured(config: &Config, family: FeedFamily) -> bool {
    match family {
        FeedFamily::TrackGeometry => !config.track.base_url.is_empty(),
        FeedFamily::GriddedWeather => !config.gridded.base_url.is_empty(),
        FeedFamily::OceanField => !config.ocean.base_url.is_empty(),
    }
}
