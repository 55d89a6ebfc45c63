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

//! PVGIS seriescalc client.

use crate::normalize::clean_frame;
use chrono::{TimeZone, Utc};
use reqwest::blocking::Client;
use serde::Deserialize;
use solarion_types::error::{EngineError, Result};
use solarion_types::weather::{WeatherFrame, WeatherSource, localize_utc};
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_BASE_URL: &str = "https://re.jrc.ec.europa.eu/api/v5_2";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Historical window requested from seriescalc.
const START_YEAR: i32 = 2015;
const END_YEAR: i32 = 2020;

#[derive(Debug, Deserialize)]
struct PvgisResponse {
    outputs: PvgisOutputs,
}

#[derive(Debug, Deserialize)]
struct PvgisOutputs {
    hourly: Vec<PvgisHourlyRecord>,
}

#[derive(Debug, Deserialize)]
struct PvgisHourlyRecord {
    /// `YYYYMMDD:hhmm`
    time: String,
    #[serde(rename = "G(i)")]
    ghi: Option<f64>,
    #[serde(rename = "Gb(n)")]
    dni: Option<f64>,
    #[serde(rename = "Gd(n)")]
    dhi: Option<f64>,
    #[serde(rename = "T2m")]
    temp_air: Option<f64>,
    #[serde(rename = "WS10m")]
    wind_speed: Option<f64>,
}

/// Client for the PVGIS hourly radiation API.
#[derive(Debug, Clone)]
pub struct PvgisClient {
    base_url: String,
    client: Client,
    start_year: i32,
    end_year: i32,
}

impl Default for PvgisClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS)
    }
}

impl PvgisClient {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.into(),
            client,
            start_year: START_YEAR,
            end_year: END_YEAR,
        }
    }

    /// Downloads and normalises the hourly series for a coordinate.
    pub fn fetch_weather_data(&self, lat: f64, lon: f64) -> Result<WeatherFrame> {
        let url = format!(
            "{}/seriescalc?lat={}&lon={}&startyear={}&endyear={}&outputformat=json&usehorizon=1&selectrad=1&angle=0&aspect=0",
            self.base_url, lat, lon, self.start_year, self.end_year
        );
        info!("Requesting PVGIS series: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| EngineError::Pvgis(format!("HTTP request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(EngineError::Pvgis(format!(
                "HTTP {} from seriescalc",
                response.status()
            )));
        }

        let parsed: PvgisResponse = response
            .json()
            .map_err(|e| EngineError::Pvgis(format!("invalid JSON payload: {e}")))?;

        self.process_records(lat, lon, parsed.outputs.hourly)
    }

    fn process_records(
        &self,
        lat: f64,
        lon: f64,
        records: Vec<PvgisHourlyRecord>,
    ) -> Result<WeatherFrame> {
        let total = records.len();
        let mut frame = WeatherFrame::empty(WeatherSource::Pvgis, lat, lon);
        let mut dropped = 0usize;

        for record in records {
            let Some(ts) = parse_pvgis_timestamp(&record.time) else {
                dropped += 1;
                continue;
            };
            let Some(ghi) = record.ghi else {
                dropped += 1;
                continue;
            };
            if !(0.0..=1500.0).contains(&ghi) {
                dropped += 1;
                continue;
            }

            frame.timestamps.push(ts);
            frame.ghi.push(ghi);
            frame.dni.push(record.dni.unwrap_or(0.0));
            frame.dhi.push(record.dhi.unwrap_or(0.0));
            frame.temp_air.push(record.temp_air.unwrap_or(25.0));
            frame.wind_speed.push(record.wind_speed.unwrap_or(2.0));
            frame.pressure.push(101_325.0);
        }

        if frame.is_empty() {
            return Err(EngineError::Pvgis(format!(
                "no valid records processed ({dropped} of {total} dropped)"
            )));
        }
        if dropped > 0 {
            warn!("Dropped {} of {} PVGIS records", dropped, total);
        }

        clean_frame(&mut frame);
        frame.validate().map_err(|e| EngineError::Pvgis(e.to_string()))?;

        info!(
            "Processed {} PVGIS records for years {:?} ({} dropped)",
            frame.len(),
            frame.years(),
            dropped
        );
        Ok(frame)
    }
}

/// Parses the PVGIS timestamp format `YYYYMMDD:hhmm` as UTC and localises
/// it to the frame timezone. Unparseable stamps are dropped by the caller.
fn parse_pvgis_timestamp(raw: &str) -> Option<chrono::DateTime<chrono_tz::Tz>> {
    let bytes = raw.as_bytes();
    if bytes.len() != 13 || bytes[8] != b':' {
        return None;
    }
    let year: i32 = raw.get(0..4)?.parse().ok()?;
    let month: u32 = raw.get(4..6)?.parse().ok()?;
    let day: u32 = raw.get(6..8)?.parse().ok()?;
    let hour: u32 = raw.get(9..11)?.parse().ok()?;
    let minute: u32 = raw.get(11..13)?.parse().ok()?;
    let utc = Utc
        .with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()?;
    Some(localize_utc(utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hourly_payload() -> String {
        // Two days of synthetic records, hourly, PVGIS shape.
        let mut hourly = Vec::new();
        for day in 1..=2 {
            for hour in 0..24 {
                hourly.push(format!(
                    r#"{{"time":"201901{day:02}:{hour:02}10","G(i)":{ghi},"Gb(n)":0.0,"Gd(n)":0.0,"T2m":24.5,"WS10m":2.1}}"#,
                    day = day,
                    hour = hour,
                    ghi = if (6..18).contains(&hour) { 450.0 } else { 0.0 },
                ));
            }
        }
        format!(r#"{{"outputs":{{"hourly":[{}]}}}}"#, hourly.join(","))
    }

    #[test]
    fn test_timestamp_parsing() {
        let ts = parse_pvgis_timestamp("20200101:0010").unwrap();
        // 00:10 UTC is 21:10 the previous day in São Paulo.
        assert_eq!(ts.to_rfc3339(), "2019-12-31T21:10:00-03:00");
        assert!(parse_pvgis_timestamp("2020010:0010").is_none());
        assert!(parse_pvgis_timestamp("20200101-0010").is_none());
    }

    #[test]
    fn test_fetch_parses_mockito_payload() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/seriescalc")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(hourly_payload())
            .create();

        let client = PvgisClient::new(server.url(), 10);
        let frame = client.fetch_weather_data(-15.79, -47.88).unwrap();
        mock.assert();

        assert_eq!(frame.len(), 48);
        assert_eq!(frame.source, WeatherSource::Pvgis);
        assert!(frame.dni_is_zero());
        assert!(frame.ghi.iter().copied().fold(0.0, f64::max) > 0.0);
    }

    #[test]
    fn test_http_error_is_pvgis_error() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/seriescalc")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .create();

        let client = PvgisClient::new(server.url(), 10);
        let err = client.fetch_weather_data(-15.79, -47.88).unwrap_err();
        assert!(matches!(err, EngineError::Pvgis(_)));
    }

    #[test]
    fn test_unparseable_records_dropped_silently() {
        let body = r#"{"outputs":{"hourly":[
            {"time":"garbage","G(i)":100.0},
            {"time":"20190101:1210","G(i)":500.0,"T2m":25.0,"WS10m":2.0}
        ]}}"#;
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/seriescalc")
            .match_query(mockito::Matcher::Any)
            .with_body(body)
            .create();

        let client = PvgisClient::new(server.url(), 10);
        let frame = client.fetch_weather_data(-15.79, -47.88).unwrap();
        assert_eq!(frame.len(), 1);
    }
}
