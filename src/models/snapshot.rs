// src/models/snapshot.rs

//! Environmental snapshot data structures.
//!
//! A snapshot is one immutable fetch result for a given feed family and kind.
//! Snapshots are append-only; "latest" is always a derived view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One of the three upstream data categories.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum FeedFamily {
    /// Storm cones, tracks, and warnings (vector geodata)
    TrackGeometry,
    /// Gridded atmospheric fields (raster references)
    GriddedWeather,
    /// Ocean currents and waves (raster references)
    OceanField,
}

impl FeedFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedFamily::TrackGeometry => "track-geometry",
            FeedFamily::GriddedWeather => "gridded-weather",
            FeedFamily::OceanField => "ocean-field",
        }
    }

    /// All families, in refresh order.
    pub fn all() -> [FeedFamily; 3] {
        [
            FeedFamily::TrackGeometry,
            FeedFamily::GriddedWeather,
            FeedFamily::OceanField,
        ]
    }
}

impl std::fmt::Display for FeedFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A concrete dataset within a feed family.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    Cones,
    Tracks,
    Warnings,
    Temperature,
    Pressure,
    Wind,
    Currents,
    Waves,
}

impl FeedKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedKind::Cones => "cones",
            FeedKind::Tracks => "tracks",
            FeedKind::Warnings => "warnings",
            FeedKind::Temperature => "temperature",
            FeedKind::Pressure => "pressure",
            FeedKind::Wind => "wind",
            FeedKind::Currents => "currents",
            FeedKind::Waves => "waves",
        }
    }

    /// The family this kind belongs to. The mapping is total.
    pub fn family(&self) -> FeedFamily {
        match self {
            FeedKind::Cones | FeedKind::Tracks | FeedKind::Warnings => FeedFamily::TrackGeometry,
            FeedKind::Temperature | FeedKind::Pressure | FeedKind::Wind => {
                FeedFamily::GriddedWeather
            }
            FeedKind::Currents | FeedKind::Waves => FeedFamily::OceanField,
        }
    }

    /// Parse a kind from its wire name.
    pub fn parse(s: &str) -> Option<FeedKind> {
        match s.to_lowercase().as_str() {
            "cones" => Some(FeedKind::Cones),
            "tracks" => Some(FeedKind::Tracks),
            "warnings" => Some(FeedKind::Warnings),
            "temperature" => Some(FeedKind::Temperature),
            "pressure" => Some(FeedKind::Pressure),
            "wind" => Some(FeedKind::Wind),
            "currents" => Some(FeedKind::Currents),
            "waves" => Some(FeedKind::Waves),
            _ => None,
        }
    }
}

impl std::fmt::Display for FeedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot payload, tagged by shape.
///
/// Track-geometry feeds carry a geometry collection; gridded and ocean feeds
/// carry references into raster/object storage. Untyped upstream payloads are
/// validated into this shape at the adapter boundary and never passed further.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SnapshotPayload {
    /// GeoJSON-style feature collection
    Geometry { data: serde_json::Value },
    /// References to raster data products
    Raster {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        grib_url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        netcdf_url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cog_url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tile_url: Option<String>,
    },
}

impl SnapshotPayload {
    /// Hex-encoded SHA-256 digest of the canonical payload encoding.
    ///
    /// Stored alongside the snapshot for the audit trail.
    pub fn digest(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        hex::encode(hasher.finalize())
    }
}

/// One immutable fetch result for a feed family/kind at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    /// Store-assigned monotonic sequence id (0 until appended)
    #[serde(default)]
    pub id: u64,

    /// Feed family this snapshot belongs to
    pub family: FeedFamily,

    /// Concrete dataset kind
    pub kind: FeedKind,

    /// Observation/model timestamp reported for the data
    pub timestamp: DateTime<Utc>,

    /// Spatial bounds as [min_lng, min_lat, max_lng, max_lat]
    pub bounds: [f64; 4],

    /// The payload itself
    pub payload: SnapshotPayload,

    /// Free-form provenance metadata (source, resolution, endpoint, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,

    /// SHA-256 digest of the payload, for the audit trail
    pub digest: String,

    /// When this snapshot was created locally
    pub created_at: DateTime<Utc>,
}

impl Snapshot {
    /// Construct a snapshot from a validated payload.
    ///
    /// The family is derived from the kind; the digest and creation time are
    /// stamped here so every append sees a fully-built record.
    pub fn new(
        kind: FeedKind,
        timestamp: DateTime<Utc>,
        bounds: [f64; 4],
        payload: SnapshotPayload,
        metadata: Option<serde_json::Value>,
    ) -> Self {
        let digest = payload.digest();
        Self {
            id: 0,
            family: kind.family(),
            kind,
            timestamp,
            bounds,
            payload,
            metadata,
            digest,
            created_at: Utc::now(),
        }
    }

    /// Global bounds covering the whole grid.
    pub const GLOBAL_BOUNDS: [f64; 4] = [-180.0, -90.0, 180.0, 90.0];

    /// Atlantic basin bounds used for track-geometry products.
    pub const ATLANTIC_BOUNDS: [f64; 4] = [-100.0, 5.0, -10.0, 60.0];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_family_mapping_is_total() {
        let kinds = [
            FeedKind::Cones,
            FeedKind::Tracks,
            FeedKind::Warnings,
            FeedKind::Temperature,
            FeedKind::Pressure,
            FeedKind::Wind,
            FeedKind::Currents,
            FeedKind::Waves,
        ];
        for kind in kinds {
            let family = kind.family();
            assert!(FeedFamily::all().contains(&family));
            assert_eq!(FeedKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn test_parse_rejects_unknown_kind() {
        assert_eq!(FeedKind::parse("salinity"), None);
    }

    #[test]
    fn test_digest_is_stable() {
        let payload = SnapshotPayload::Geometry {
            data: serde_json::json!({"features": []}),
        };
        assert_eq!(payload.digest(), payload.digest());
        assert_eq!(payload.digest().len(), 64);
    }

    #[test]
    fn test_new_derives_family_and_digest() {
        let payload = SnapshotPayload::Raster {
            grib_url: Some("https://example.com/gfs.grb2".to_string()),
            netcdf_url: None,
            cog_url: None,
            tile_url: None,
        };
        let snapshot = Snapshot::new(
            FeedKind::Pressure,
            Utc::now(),
            Snapshot::GLOBAL_BOUNDS,
            payload.clone(),
            None,
        );
        assert_eq!(snapshot.family, FeedFamily::GriddedWeather);
        assert_eq!(snapshot.digest, payload.digest());
    }
}
