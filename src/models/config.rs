//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
///
/// Read once at startup; never reloaded. Missing credentials degrade the
/// status view instead of failing startup.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP and refresh behavior settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Track-geometry feed endpoints
    #[serde(default)]
    pub track: TrackConfig,

    /// Gridded-weather feed endpoints
    #[serde(default)]
    pub gridded: GriddedConfig,

    /// Ocean-field feed endpoints and credentials
    #[serde(default)]
    pub ocean: OceanConfig,

    /// Forecast oracle endpoint and key
    #[serde(default)]
    pub oracle: OracleConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.overlay_env();
        Ok(config)
    }

    /// Load configuration or return defaults if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            let mut config = Self::default();
            config.overlay_env();
            config
        })
    }

    /// Overlay secrets from the environment.
    ///
    /// File values win; the environment only fills blanks so config files can
    /// stay credential-free.
    pub fn overlay_env(&mut self) {
        if self.oracle.api_key.is_empty() {
            if let Ok(key) = std::env::var("STORMWATCH_ORACLE_KEY") {
                self.oracle.api_key = key;
            }
        }
        if self.ocean.username.is_empty() {
            if let Ok(user) = std::env::var("STORMWATCH_OCEAN_USERNAME") {
                self.ocean.username = user;
            }
        }
        if self.ocean.password.is_empty() {
            if let Ok(pass) = std::env::var("STORMWATCH_OCEAN_PASSWORD") {
                self.ocean.password = pass;
            }
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.fetch.user_agent.trim().is_empty() {
            return Err(AppError::config("fetch.user_agent is empty"));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(AppError::config("fetch.timeout_secs must be > 0"));
        }
        if self.fetch.max_concurrent == 0 {
            return Err(AppError::config("fetch.max_concurrent must be > 0"));
        }
        if self.fetch.refresh_interval_mins == 0 {
            return Err(AppError::config("fetch.refresh_interval_mins must be > 0"));
        }
        if self.fetch.staleness_mins <= 0 {
            return Err(AppError::config("fetch.staleness_mins must be > 0"));
        }
        if self.oracle.timeout_secs == 0 {
            return Err(AppError::config("oracle.timeout_secs must be > 0"));
        }
        for (name, value) in [
            ("track.base_url", &self.track.base_url),
            ("track.bulletin_url", &self.track.bulletin_url),
            ("gridded.base_url", &self.gridded.base_url),
            ("ocean.base_url", &self.ocean.base_url),
        ] {
            if !value.is_empty() {
                url::Url::parse(value)
                    .map_err(|e| AppError::config(format!("{name} is not a valid URL: {e}")))?;
            }
        }
        Ok(())
    }
}

/// HTTP client and refresh behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Maximum concurrent feed fetches within one cycle
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Minutes between scheduled refresh cycles
    #[serde(default = "defaults::refresh_interval")]
    pub refresh_interval_mins: u64,

    /// Age in minutes beyond which a snapshot no longer counts as operational
    #[serde(default = "defaults::staleness")]
    pub staleness_mins: i64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_concurrent: defaults::max_concurrent(),
            refresh_interval_mins: defaults::refresh_interval(),
            staleness_mins: defaults::staleness(),
        }
    }
}

/// Track-geometry feed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackConfig {
    /// Primary map-service base URL (per-layer query endpoints)
    #[serde(default = "defaults::track_base_url")]
    pub base_url: String,

    /// Alternate map-service base URL tried when the primary fails
    #[serde(default = "defaults::track_alt_url")]
    pub alt_url: String,

    /// Active-storms bulletin URL (secondary live source for fallback)
    #[serde(default = "defaults::bulletin_url")]
    pub bulletin_url: String,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::track_base_url(),
            alt_url: defaults::track_alt_url(),
            bulletin_url: defaults::bulletin_url(),
        }
    }
}

/// Gridded-weather feed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GriddedConfig {
    /// Object-storage base URL holding model cycle files
    #[serde(default = "defaults::gridded_base_url")]
    pub base_url: String,

    /// Tile-server base URL for raster rendering
    #[serde(default = "defaults::tiler_url")]
    pub tiler_url: String,
}

impl Default for GriddedConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::gridded_base_url(),
            tiler_url: defaults::tiler_url(),
        }
    }
}

/// Ocean-field feed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OceanConfig {
    /// Catalog base URL for analysis/forecast datasets
    #[serde(default = "defaults::ocean_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,
}

impl OceanConfig {
    /// Whether credentials are present.
    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

impl Default for OceanConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::ocean_base_url(),
            username: String::new(),
            password: String::new(),
        }
    }
}

/// Forecast oracle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Chat-completions style endpoint
    #[serde(default = "defaults::oracle_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "defaults::oracle_model")]
    pub model: String,

    /// Oracle call timeout in seconds
    #[serde(default = "defaults::oracle_timeout")]
    pub timeout_secs: u64,
}

impl OracleConfig {
    /// Whether the oracle is usable.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.endpoint.is_empty()
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::oracle_endpoint(),
            api_key: String::new(),
            model: defaults::oracle_model(),
            timeout_secs: defaults::oracle_timeout(),
        }
    }
}

mod defaults {
    // Fetch defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; stormwatch/1.0)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn max_concurrent() -> usize {
        5
    }
    pub fn refresh_interval() -> u64 {
        30
    }
    pub fn staleness() -> i64 {
        180
    }

    // Track feed defaults
    pub fn track_base_url() -> String {
        "https://idpgis.ncep.noaa.gov/arcgis/rest/services/NWS_Forecasts_Guidance_Warnings/NHC_Atl_trop_cyclones/MapServer".into()
    }
    pub fn track_alt_url() -> String {
        "https://www.nhc.noaa.gov/gis/rest/services/nhc_at_public_layers/hurricanes/MapServer"
            .into()
    }
    pub fn bulletin_url() -> String {
        "https://www.nhc.noaa.gov/gis/kml/nhc_active.kml".into()
    }

    // Gridded feed defaults
    pub fn gridded_base_url() -> String {
        "https://noaa-gfs-bdp-pds.s3.amazonaws.com".into()
    }
    pub fn tiler_url() -> String {
        "http://localhost:8001".into()
    }

    // Ocean feed defaults
    pub fn ocean_base_url() -> String {
        "https://nrt.cmems-du.eu/thredds/dodsC".into()
    }

    // Oracle defaults
    pub fn oracle_endpoint() -> String {
        "https://api.openai.com/v1/chat/completions".into()
    }
    pub fn oracle_model() -> String {
        "gpt-4o".into()
    }
    pub fn oracle_timeout() -> u64 {
        60
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.fetch.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_interval() {
        let mut config = Config::default();
        config.fetch.refresh_interval_mins = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_endpoint_url() {
        let mut config = Config::default();
        config.track.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_credentials_presence() {
        let mut ocean = OceanConfig::default();
        assert!(!ocean.has_credentials());
        ocean.username = "user".into();
        ocean.password = "pass".into();
        assert!(ocean.has_credentials());
    }

    #[test]
    fn test_oracle_configured_requires_key() {
        let mut oracle = OracleConfig::default();
        assert!(!oracle.is_configured());
        oracle.api_key = "sk-test".into();
        assert!(oracle.is_configured());
    }
}
