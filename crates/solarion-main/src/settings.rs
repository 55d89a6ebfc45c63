// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of SolarION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Process settings: cache, upstream endpoints and fallback policy.
//!
//! Load order: `config.toml`, then `config.json`, then defaults with
//! environment overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use solarion_types::weather::WeatherSource;
use solarion_weather::WeatherProviderConfig;
use std::path::PathBuf;
use tracing::{info, warn};

fn default_cache_dir() -> PathBuf {
    PathBuf::from("./cache")
}

fn default_precision() -> usize {
    5
}

fn default_radius_km() -> f64 {
    15.0
}

fn default_ttl_days() -> u64 {
    30
}

fn default_pvgis_base_url() -> String {
    "https://re.jrc.ec.europa.eu/api/v5_2".to_owned()
}

fn default_pvgis_timeout() -> u64 {
    120
}

fn default_nasa_base_url() -> String {
    "https://power.larc.nasa.gov/api/temporal/hourly/point".to_owned()
}

fn default_nasa_timeout() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

fn default_source() -> WeatherSource {
    WeatherSource::Pvgis
}

/// Main application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory for the geohash cache
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Geohash precision (5 ≈ 4.9 km cell edge)
    #[serde(default = "default_precision")]
    pub geohash_precision: usize,

    /// Spatial reuse radius (km)
    #[serde(default = "default_radius_km")]
    pub cache_radius_km: f64,

    /// Weather-frame time to live (days)
    #[serde(default = "default_ttl_days")]
    pub cache_ttl_days: u64,

    #[serde(default = "default_pvgis_base_url")]
    pub pvgis_base_url: String,

    /// PVGIS request timeout (seconds)
    #[serde(default = "default_pvgis_timeout")]
    pub pvgis_timeout_secs: u64,

    #[serde(default = "default_nasa_base_url")]
    pub nasa_base_url: String,

    /// NASA POWER request timeout (seconds)
    #[serde(default = "default_nasa_timeout")]
    pub nasa_timeout_secs: u64,

    /// Whether the secondary source may be tried on primary failure
    #[serde(default = "default_true")]
    pub weather_fallback_enabled: bool,

    /// Preferred source when the request does not name one
    #[serde(default = "default_source")]
    pub default_source: WeatherSource,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            geohash_precision: default_precision(),
            cache_radius_km: default_radius_km(),
            cache_ttl_days: default_ttl_days(),
            pvgis_base_url: default_pvgis_base_url(),
            pvgis_timeout_secs: default_pvgis_timeout(),
            nasa_base_url: default_nasa_base_url(),
            nasa_timeout_secs: default_nasa_timeout(),
            weather_fallback_enabled: true,
            default_source: default_source(),
        }
    }
}

impl Settings {
    /// Load settings from config files or the environment.
    pub fn load() -> Result<Self> {
        if let Ok(raw) = std::fs::read_to_string("config.toml") {
            let settings: Settings =
                toml::from_str(&raw).context("Failed to parse config.toml")?;
            info!("Loaded configuration from config.toml");
            settings.validate()?;
            return Ok(settings);
        }

        if let Ok(raw) = std::fs::read_to_string("config.json") {
            let settings: Settings =
                serde_json::from_str(&raw).context("Failed to parse config.json")?;
            info!("Loaded configuration from config.json");
            settings.validate()?;
            return Ok(settings);
        }

        warn!("No configuration file found, using defaults with environment overrides");
        let settings = Self::from_env();
        settings.validate()?;
        Ok(settings)
    }

    /// Defaults with `SOLARION_*` environment overrides.
    pub fn from_env() -> Self {
        let mut settings = Self::default();

        if let Ok(dir) = std::env::var("SOLARION_CACHE_DIR") {
            settings.cache_dir = PathBuf::from(dir);
        }
        if let Ok(raw) = std::env::var("SOLARION_GEOHASH_PRECISION")
            && let Ok(precision) = raw.parse::<usize>()
        {
            settings.geohash_precision = precision;
        }
        if let Ok(raw) = std::env::var("SOLARION_CACHE_RADIUS_KM")
            && let Ok(radius) = raw.parse::<f64>()
        {
            settings.cache_radius_km = radius;
        }
        if let Ok(raw) = std::env::var("SOLARION_CACHE_TTL_DAYS")
            && let Ok(ttl) = raw.parse::<u64>()
        {
            settings.cache_ttl_days = ttl;
        }
        if let Ok(url) = std::env::var("SOLARION_PVGIS_BASE_URL") {
            settings.pvgis_base_url = url;
        }
        if let Ok(raw) = std::env::var("SOLARION_PVGIS_TIMEOUT_SECS")
            && let Ok(secs) = raw.parse::<u64>()
        {
            settings.pvgis_timeout_secs = secs;
        }
        if let Ok(url) = std::env::var("SOLARION_NASA_BASE_URL") {
            settings.nasa_base_url = url;
        }
        if let Ok(raw) = std::env::var("SOLARION_NASA_TIMEOUT_SECS")
            && let Ok(secs) = raw.parse::<u64>()
        {
            settings.nasa_timeout_secs = secs;
        }
        if let Ok(raw) = std::env::var("SOLARION_WEATHER_FALLBACK")
            && let Ok(enabled) = raw.parse::<bool>()
        {
            settings.weather_fallback_enabled = enabled;
        }
        if let Ok(raw) = std::env::var("SOLARION_DEFAULT_SOURCE") {
            match raw.to_lowercase().as_str() {
                "pvgis" => settings.default_source = WeatherSource::Pvgis,
                "nasa" => settings.default_source = WeatherSource::Nasa,
                other => warn!("Unknown SOLARION_DEFAULT_SOURCE '{}', keeping pvgis", other),
            }
        }

        settings
    }

    pub fn validate(&self) -> Result<()> {
        if self.geohash_precision == 0 || self.geohash_precision > 12 {
            anyhow::bail!("geohash_precision must be between 1 and 12");
        }
        if self.cache_radius_km <= 0.0 {
            anyhow::bail!("cache_radius_km must be positive");
        }
        if self.pvgis_timeout_secs == 0 || self.nasa_timeout_secs == 0 {
            anyhow::bail!("upstream timeouts must be at least 1 second");
        }
        if self.pvgis_base_url.is_empty() || self.nasa_base_url.is_empty() {
            anyhow::bail!("upstream base URLs cannot be empty");
        }
        Ok(())
    }

    pub fn provider_config(&self) -> WeatherProviderConfig {
        WeatherProviderConfig {
            cache_dir: self.cache_dir.clone(),
            geohash_precision: self.geohash_precision,
            cache_radius_km: self.cache_radius_km,
            cache_ttl_days: self.cache_ttl_days,
            pvgis_base_url: self.pvgis_base_url.clone(),
            pvgis_timeout_secs: self.pvgis_timeout_secs,
            nasa_base_url: self.nasa_base_url.clone(),
            nasa_timeout_secs: self.nasa_timeout_secs,
            fallback_enabled: self.weather_fallback_enabled,
            default_source: self.default_source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.geohash_precision, 5);
        assert_eq!(settings.cache_radius_km, 15.0);
        assert_eq!(settings.cache_ttl_days, 30);
        assert_eq!(settings.pvgis_timeout_secs, 120);
        assert_eq!(settings.nasa_timeout_secs, 60);
    }

    #[test]
    fn test_toml_round_trip() {
        let settings = Settings::default();
        let raw = toml::to_string_pretty(&settings).unwrap();
        let back: Settings = toml::from_str(&raw).unwrap();
        assert_eq!(back.cache_radius_km, settings.cache_radius_km);
        assert_eq!(back.default_source, settings.default_source);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let back: Settings = toml::from_str("cache_radius_km = 20.0").unwrap();
        assert_eq!(back.cache_radius_km, 20.0);
        assert_eq!(back.geohash_precision, 5);
    }

    #[test]
    fn test_invalid_precision_rejected() {
        let mut settings = Settings::default();
        settings.geohash_precision = 0;
        assert!(settings.validate().is_err());
    }
}
