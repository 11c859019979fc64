// src/models/status.rs

//! Derived system-status view.
//!
//! Computed at read time from snapshot recency and configuration; never
//! stored and never the trigger for a fetch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::snapshot::FeedFamily;

/// Health classification for one feed family.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FamilyHealth {
    /// A snapshot newer than the staleness threshold exists
    Operational,
    /// Configured, but the latest snapshot is missing or stale
    ConfiguredUnreachable,
    /// Required credentials are absent
    MissingCredentials,
    /// No endpoint configured for this family
    Unavailable,
}

/// Per-family status line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FamilyStatus {
    pub family: FeedFamily,
    pub health: FamilyHealth,
    /// Timestamp of the newest snapshot in this family, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<DateTime<Utc>>,
}

/// Composite system status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SystemMode {
    /// At least one active storm and the oracle is configured
    Live,
    Limited,
}

/// Derived system-health view read by reporting endpoints.
///
/// Carries no computation timestamp: two computations over the same store
/// state must compare equal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SystemStatus {
    pub active_storms: usize,
    pub mode: SystemMode,
    pub oracle_configured: bool,
    pub families: Vec<FamilyStatus>,
}

impl SystemStatus {
    /// Look up the status line for a family.
    pub fn family(&self, family: FeedFamily) -> Option<&FamilyStatus> {
        self.families.iter().find(|f| f.family == family)
    }
}
