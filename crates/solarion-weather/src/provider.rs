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

//! The weather provider: preferred source first, fallback to the other
//! source when allowed, spatial cache in front of both.

use crate::cache::GeohashCache;
use crate::nasa::NasaPowerClient;
use crate::pvgis::PvgisClient;
use solarion_types::error::{EngineError, Result};
use solarion_types::geo::Coordinate;
use solarion_types::weather::{FrameSummary, WeatherFrame, WeatherSource};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{info, warn};

/// Provider construction knobs, filled by the binary's settings layer.
#[derive(Debug, Clone)]
pub struct WeatherProviderConfig {
    pub cache_dir: PathBuf,
    pub geohash_precision: usize,
    pub cache_radius_km: f64,
    pub cache_ttl_days: u64,
    pub pvgis_base_url: String,
    pub pvgis_timeout_secs: u64,
    pub nasa_base_url: String,
    pub nasa_timeout_secs: u64,
    pub fallback_enabled: bool,
    pub default_source: WeatherSource,
}

impl Default for WeatherProviderConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("./cache"),
            geohash_precision: crate::cache::DEFAULT_PRECISION,
            cache_radius_km: crate::cache::DEFAULT_RADIUS_KM,
            cache_ttl_days: crate::cache::DEFAULT_TTL_DAYS,
            pvgis_base_url: crate::pvgis::DEFAULT_BASE_URL.to_owned(),
            pvgis_timeout_secs: crate::pvgis::DEFAULT_TIMEOUT_SECS,
            nasa_base_url: crate::nasa::DEFAULT_BASE_URL.to_owned(),
            nasa_timeout_secs: crate::nasa::DEFAULT_TIMEOUT_SECS,
            fallback_enabled: true,
            default_source: WeatherSource::Pvgis,
        }
    }
}

/// Shared handle over the two upstream clients and the spatial cache.
///
/// Construct once at process start and pass by reference; the handle is
/// cheap to clone and safe to share across worker threads.
#[derive(Debug, Clone)]
pub struct WeatherProvider {
    pvgis: PvgisClient,
    nasa: NasaPowerClient,
    cache: GeohashCache,
    fallback_enabled: bool,
    default_source: WeatherSource,
}

impl WeatherProvider {
    pub fn new(config: &WeatherProviderConfig) -> Self {
        Self {
            pvgis: PvgisClient::new(&config.pvgis_base_url, config.pvgis_timeout_secs),
            nasa: NasaPowerClient::new(&config.nasa_base_url, config.nasa_timeout_secs),
            cache: GeohashCache::new(
                &config.cache_dir,
                config.geohash_precision,
                config.cache_radius_km,
                config.cache_ttl_days,
            ),
            fallback_enabled: config.fallback_enabled,
            default_source: config.default_source,
        }
    }

    pub fn cache(&self) -> &GeohashCache {
        &self.cache
    }

    pub fn default_source(&self) -> WeatherSource {
        self.default_source
    }

    /// Fetches a normalised frame, preferring `preferred` (or the configured
    /// default). Returns the frame together with the source that actually
    /// served it, which may differ when the fallback kicked in.
    pub fn fetch(
        &self,
        lat: f64,
        lon: f64,
        preferred: Option<WeatherSource>,
        allow_fallback: bool,
    ) -> Result<(WeatherFrame, WeatherSource)> {
        let coord = Coordinate::new(lat, lon)?;
        let (lat, lon) = coord.rounded();
        let primary = preferred.unwrap_or(self.default_source);

        match self.fetch_one(lat, lon, primary) {
            Ok(frame) => Ok((frame, primary)),
            Err(primary_err) => {
                warn!("Error fetching from {}: {}", primary, primary_err);
                if !(allow_fallback && self.fallback_enabled) {
                    return Err(EngineError::FallbackDisabled(format!(
                        "{primary} failed and fallback is disabled: {primary_err}"
                    )));
                }
                let secondary = primary.other();
                warn!("Falling back to {}", secondary);
                match self.fetch_one(lat, lon, secondary) {
                    Ok(frame) => {
                        info!("Fallback to {} succeeded", secondary);
                        Ok((frame, secondary))
                    }
                    Err(secondary_err) => Err(EngineError::NoWeatherData(format!(
                        "{primary}: {primary_err}; {secondary}: {secondary_err}"
                    ))),
                }
            }
        }
    }

    fn fetch_one(&self, lat: f64, lon: f64, source: WeatherSource) -> Result<WeatherFrame> {
        let params = Self::frame_params(source);

        if let Some(frame) = self.cache.get::<WeatherFrame>(lat, lon, &params) {
            info!("Geohash cache HIT for ({lat}, {lon}) [{source}]");
            return Ok(frame);
        }
        info!("Geohash cache MISS for ({lat}, {lon}) [{source}], calling API");

        let frame = match source {
            WeatherSource::Pvgis => self.pvgis.fetch_weather_data(lat, lon)?,
            WeatherSource::Nasa => self.nasa.fetch_weather_data(lat, lon)?,
        };

        if !self.cache.set(lat, lon, &frame, &params) {
            warn!("Cache write not performed for ({lat}, {lon}) [{source}]");
        }
        Ok(frame)
    }

    /// Per-source statistics for the data-summary surface.
    pub fn data_summary(
        &self,
        lat: f64,
        lon: f64,
        preferred: Option<WeatherSource>,
        allow_fallback: bool,
    ) -> Result<FrameSummary> {
        let (frame, _) = self.fetch(lat, lon, preferred, allow_fallback)?;
        Ok(frame.summary())
    }

    /// Raw-frame cache key params; the source tag keeps PVGIS and NASA
    /// frames from colliding while POA series carry their own params.
    fn frame_params(source: WeatherSource) -> BTreeMap<String, String> {
        BTreeMap::from([("source".to_owned(), source.as_str().to_owned())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn pvgis_body() -> String {
        let mut hourly = Vec::new();
        for hour in 0..24 {
            hourly.push(format!(
                r#"{{"time":"20190101:{hour:02}10","G(i)":{g},"T2m":25.0,"WS10m":2.0}}"#,
                g = if (9..18).contains(&hour) { 600.0 } else { 0.0 }
            ));
        }
        format!(r#"{{"outputs":{{"hourly":[{}]}}}}"#, hourly.join(","))
    }

    fn provider(server: &mockito::Server, dir: &TempDir, fallback: bool) -> WeatherProvider {
        let config = WeatherProviderConfig {
            cache_dir: dir.path().to_path_buf(),
            pvgis_base_url: server.url(),
            nasa_base_url: format!("{}/nasa", server.url()),
            pvgis_timeout_secs: 5,
            nasa_timeout_secs: 5,
            fallback_enabled: fallback,
            ..WeatherProviderConfig::default()
        };
        WeatherProvider::new(&config)
    }

    #[test]
    fn test_fetch_primary_success_and_cache_reuse() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/seriescalc")
            .match_query(mockito::Matcher::Any)
            .with_body(pvgis_body())
            .expect(1) // the second fetch must be served by the cache
            .create();
        let dir = TempDir::new().unwrap();
        let provider = provider(&server, &dir, true);

        let (frame, source) = provider.fetch(-15.79, -47.88, None, true).unwrap();
        assert_eq!(source, WeatherSource::Pvgis);
        assert_eq!(frame.len(), 24);

        // ~1 km away: served from the spatial cache, no second HTTP call.
        let (frame2, _) = provider.fetch(-15.80, -47.88, None, true).unwrap();
        assert_eq!(frame2.len(), 24);
        mock.assert();
    }

    #[test]
    fn test_fallback_disabled_error() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/seriescalc")
            .match_query(mockito::Matcher::Any)
            .with_status(502)
            .create();
        let dir = TempDir::new().unwrap();
        let provider = provider(&server, &dir, false);

        let err = provider.fetch(-15.79, -47.88, None, true).unwrap_err();
        assert!(matches!(err, EngineError::FallbackDisabled(_)));
        assert_eq!(err.status_code(), 502);
    }

    #[test]
    fn test_both_sources_failing_is_no_weather_data() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", mockito::Matcher::Any)
            .with_status(500)
            .create();
        let dir = TempDir::new().unwrap();
        let provider = provider(&server, &dir, true);

        let err = provider.fetch(-15.79, -47.88, None, true).unwrap_err();
        assert!(matches!(err, EngineError::NoWeatherData(_)));
    }

    #[test]
    fn test_invalid_coordinate_rejected_before_io() {
        let server = mockito::Server::new();
        let dir = TempDir::new().unwrap();
        let provider = provider(&server, &dir, true);
        let err = provider.fetch(123.0, 0.0, None, true).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }
}
