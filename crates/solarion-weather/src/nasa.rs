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

//! NASA POWER hourly point client.

use crate::normalize::clean_frame;
use chrono::{Datelike, TimeZone, Utc};
use reqwest::blocking::Client;
use serde::Deserialize;
use solarion_types::error::{EngineError, Result};
use solarion_types::weather::{WeatherFrame, WeatherSource, localize_utc};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_BASE_URL: &str = "https://power.larc.nasa.gov/api/temporal/hourly/point";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Number of most-recent complete years requested.
const YEARS_BACK: i32 = 2;

#[derive(Debug, Deserialize)]
struct NasaResponse {
    properties: NasaProperties,
}

#[derive(Debug, Deserialize)]
struct NasaProperties {
    parameter: BTreeMap<String, BTreeMap<String, f64>>,
}

/// Client for the NASA POWER renewable-energy hourly API.
#[derive(Debug, Clone)]
pub struct NasaPowerClient {
    base_url: String,
    client: Client,
    years_back: i32,
}

impl Default for NasaPowerClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS)
    }
}

impl NasaPowerClient {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.into(),
            client,
            years_back: YEARS_BACK,
        }
    }

    /// Downloads and normalises the hourly series for a coordinate.
    pub fn fetch_weather_data(&self, lat: f64, lon: f64) -> Result<WeatherFrame> {
        let end_year = Utc::now().year() - 1;
        let start_year = end_year - self.years_back + 1;
        let url = format!(
            "{}?parameters=ALLSKY_SFC_SW_DWN,T2M,WS10M,PS&community=RE&longitude={}&latitude={}&start={}0101&end={}1231&format=JSON",
            self.base_url, lon, lat, start_year, end_year
        );
        info!("Requesting NASA POWER series: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| EngineError::Nasa(format!("HTTP request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(EngineError::Nasa(format!(
                "HTTP {} from NASA POWER",
                response.status()
            )));
        }

        let parsed: NasaResponse = response
            .json()
            .map_err(|e| EngineError::Nasa(format!("invalid JSON payload: {e}")))?;

        self.process_parameters(lat, lon, parsed.properties.parameter)
    }

    fn process_parameters(
        &self,
        lat: f64,
        lon: f64,
        parameters: BTreeMap<String, BTreeMap<String, f64>>,
    ) -> Result<WeatherFrame> {
        // Accept mapped and upper-case names; the API responds upper-case,
        // pre-mapped payloads arrive lower-case.
        let ghi = pick(&parameters, &["ALLSKY_SFC_SW_DWN", "GHI", "ghi"]).ok_or_else(|| {
            EngineError::Nasa("response is missing the GHI parameter".into())
        })?;
        let dni = pick(&parameters, &["ALLSKY_SFC_SW_DNI", "DNI", "dni"]);
        let dhi = pick(&parameters, &["ALLSKY_SFC_SW_DIFF", "DHI", "dhi"]);
        let temp = pick(&parameters, &["T2M", "TAMB", "TEMP_AIR", "temp_air"]);
        let wind = pick(&parameters, &["WS10M", "WS", "WIND_SPEED", "wind_speed"]);
        let pressure = pick(&parameters, &["PS", "PRESSURE", "pressure"]);

        let mut frame = WeatherFrame::empty(WeatherSource::Nasa, lat, lon);
        let mut dropped = 0usize;

        for (stamp, ghi_value) in ghi {
            let Some(ts) = parse_nasa_timestamp(stamp) else {
                dropped += 1;
                continue;
            };
            let lookup = |series: Option<&BTreeMap<String, f64>>, default: f64| {
                series
                    .and_then(|s| s.get(stamp))
                    .copied()
                    .unwrap_or(default)
            };

            // NASA fill value is -999; treat it as missing irradiance.
            let ghi_clean = if *ghi_value < 0.0 { 0.0 } else { *ghi_value };
            let mut pressure_pa = lookup(pressure, 101_325.0);
            if pressure_pa < 10_000.0 {
                // Surface pressure arrives in kPa on this endpoint.
                pressure_pa *= 1000.0;
            }

            frame.timestamps.push(ts);
            frame.ghi.push(ghi_clean);
            frame.dni.push(lookup(dni, 0.0).max(0.0));
            frame.dhi.push(lookup(dhi, 0.0).max(0.0));
            frame.temp_air.push(lookup(temp, 25.0));
            frame.wind_speed.push(lookup(wind, 2.0).max(0.0));
            frame.pressure.push(pressure_pa);
        }

        if frame.is_empty() {
            return Err(EngineError::Nasa(format!(
                "no valid records processed ({dropped} dropped)"
            )));
        }
        if dropped > 0 {
            warn!("Dropped {} NASA POWER records", dropped);
        }

        clean_frame(&mut frame);
        frame
            .validate()
            .map_err(|e| EngineError::Nasa(e.to_string()))?;

        info!(
            "Processed {} NASA POWER records for years {:?}",
            frame.len(),
            frame.years()
        );
        Ok(frame)
    }
}

fn pick<'a>(
    parameters: &'a BTreeMap<String, BTreeMap<String, f64>>,
    names: &[&str],
) -> Option<&'a BTreeMap<String, f64>> {
    names.iter().find_map(|n| parameters.get(*n))
}

/// Parses the NASA POWER timestamp format `YYYYMMDDHH` (UTC).
fn parse_nasa_timestamp(raw: &str) -> Option<chrono::DateTime<chrono_tz::Tz>> {
    if raw.len() != 10 {
        return None;
    }
    let year: i32 = raw.get(0..4)?.parse().ok()?;
    let month: u32 = raw.get(4..6)?.parse().ok()?;
    let day: u32 = raw.get(6..8)?.parse().ok()?;
    let hour: u32 = raw.get(8..10)?.parse().ok()?;
    let utc = Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).single()?;
    Some(localize_utc(utc))
}
