// src/models/mod.rs

//! Domain models for the stormwatch application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod forecast;
mod snapshot;
mod status;
mod storm;

// Re-export all public types
pub use config::{
    Config, FetchConfig, GriddedConfig, OceanConfig, OracleConfig, TrackConfig,
};
pub use forecast::{Forecast, IntensityForecast, LandfallAssessment, PathPrediction};
pub use snapshot::{FeedFamily, FeedKind, Snapshot, SnapshotPayload};
pub use status::{FamilyHealth, FamilyStatus, SystemMode, SystemStatus};
pub use storm::{Storm, StormOrigin};
