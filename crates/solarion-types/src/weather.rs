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

//! The hourly weather frame every downstream model consumes.
//!
//! Modelled as a struct of parallel arrays with a shared length invariant;
//! timestamps are localised to America/Sao_Paulo regardless of source.

use crate::error::{EngineError, Result};
use chrono::{DateTime, Datelike};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Timezone every frame is localised to.
pub const FRAME_TZ: Tz = chrono_tz::America::Sao_Paulo;

/// Upstream weather data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherSource {
    Pvgis,
    Nasa,
}

impl WeatherSource {
    pub fn other(self) -> Self {
        match self {
            Self::Pvgis => Self::Nasa,
            Self::Nasa => Self::Pvgis,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pvgis => "pvgis",
            Self::Nasa => "nasa",
        }
    }
}

impl std::fmt::Display for WeatherSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hourly meteorological time series for one site.
///
/// All columns are SI: W/m², °C, m/s, Pa. The index is strictly increasing
/// with a 1-hour step and no gaps within a year. Missing DNI/DHI may arrive
/// as zero and are regenerated by the decomposition stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherFrame {
    #[serde(with = "sao_paulo_timestamps")]
    pub timestamps: Vec<DateTime<Tz>>,
    /// Global horizontal irradiance (W/m²)
    pub ghi: Vec<f64>,
    /// Direct normal irradiance (W/m²); zero when the source omits it
    pub dni: Vec<f64>,
    /// Diffuse horizontal irradiance (W/m²); zero when the source omits it
    pub dhi: Vec<f64>,
    /// Ambient temperature (°C)
    pub temp_air: Vec<f64>,
    /// Wind speed at 10 m (m/s)
    pub wind_speed: Vec<f64>,
    /// Surface pressure (Pa)
    pub pressure: Vec<f64>,
    pub source: WeatherSource,
    pub latitude: f64,
    pub longitude: f64,
}

impl WeatherFrame {
    pub fn empty(source: WeatherSource, latitude: f64, longitude: f64) -> Self {
        Self {
            timestamps: Vec::new(),
            ghi: Vec::new(),
            dni: Vec::new(),
            dhi: Vec::new(),
            temp_air: Vec::new(),
            wind_speed: Vec::new(),
            pressure: Vec::new(),
            source,
            latitude,
            longitude,
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Distinct calendar years covered by the frame, ascending.
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.timestamps.iter().map(|t| t.year()).collect();
        years.sort_unstable();
        years.dedup();
        years
    }

    pub fn year_count(&self) -> usize {
        self.years().len()
    }

    /// Historical minimum ambient temperature over the whole frame (°C).
    pub fn min_temperature(&self) -> Option<f64> {
        self.temp_air
            .iter()
            .copied()
            .fold(None, |acc, t| match acc {
                None => Some(t),
                Some(m) => Some(m.min(t)),
            })
    }

    /// True when the source delivered no usable direct component.
    pub fn dni_is_zero(&self) -> bool {
        self.dni.iter().all(|v| *v == 0.0)
    }

    /// Checks the parallel-array and index invariants.
    pub fn validate(&self) -> Result<()> {
        let n = self.timestamps.len();
        if n == 0 {
            return Err(EngineError::Calculation(
                "weather frame is empty after filtering".into(),
            ));
        }
        let columns: [(&str, &Vec<f64>); 6] = [
            ("ghi", &self.ghi),
            ("dni", &self.dni),
            ("dhi", &self.dhi),
            ("temp_air", &self.temp_air),
            ("wind_speed", &self.wind_speed),
            ("pressure", &self.pressure),
        ];
        for (name, col) in columns {
            if col.len() != n {
                return Err(EngineError::Calculation(format!(
                    "column {name} has {} rows, expected {n}",
                    col.len()
                )));
            }
            if col.iter().any(|v| !v.is_finite()) {
                return Err(EngineError::Calculation(format!(
                    "column {name} contains non-finite values"
                )));
            }
        }
        for w in self.timestamps.windows(2) {
            let step = w[1].signed_duration_since(w[0]);
            if step.num_seconds() <= 0 {
                return Err(EngineError::Calculation(
                    "weather frame index is not strictly increasing".into(),
                ));
            }
        }
        Ok(())
    }

    /// Per-source statistics exposed by the data-summary operation.
    pub fn summary(&self) -> FrameSummary {
        let mean = |v: &[f64]| {
            if v.is_empty() {
                0.0
            } else {
                v.iter().sum::<f64>() / v.len() as f64
            }
        };
        let max = |v: &[f64]| v.iter().copied().fold(f64::MIN, f64::max);
        FrameSummary {
            source: self.source,
            records: self.len(),
            years: self.years(),
            ghi_mean: mean(&self.ghi),
            ghi_max: if self.ghi.is_empty() { 0.0 } else { max(&self.ghi) },
            temp_mean: mean(&self.temp_air),
            temp_min: self.min_temperature().unwrap_or(0.0),
            wind_mean: mean(&self.wind_speed),
        }
    }
}

/// Statistics block for the irradiation/data-summary responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameSummary {
    pub source: WeatherSource,
    pub records: usize,
    pub years: Vec<i32>,
    pub ghi_mean: f64,
    pub ghi_max: f64,
    pub temp_mean: f64,
    pub temp_min: f64,
    pub wind_mean: f64,
}

/// Serde helper: RFC 3339 on the wire, America/Sao_Paulo in memory.
mod sao_paulo_timestamps {
    use super::FRAME_TZ;
    use chrono::DateTime;
    use chrono_tz::Tz;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(ts: &[DateTime<Tz>], ser: S) -> Result<S::Ok, S::Error> {
        let strings: Vec<String> = ts.iter().map(|t| t.to_rfc3339()).collect();
        strings.serialize(ser)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<DateTime<Tz>>, D::Error> {
        let strings = Vec::<String>::deserialize(de)?;
        strings
            .into_iter()
            .map(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .map(|t| t.with_timezone(&FRAME_TZ))
                    .map_err(serde::de::Error::custom)
            })
            .collect()
    }
}

/// Builds the frame timestamp for a UTC instant.
pub fn localize_utc(utc: DateTime<chrono::Utc>) -> DateTime<Tz> {
    utc.with_timezone(&FRAME_TZ)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn hourly_frame(hours: usize) -> WeatherFrame {
        let start = Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap();
        let mut frame = WeatherFrame::empty(WeatherSource::Pvgis, -23.55, -46.63);
        for h in 0..hours {
            frame
                .timestamps
                .push(localize_utc(start + chrono::Duration::hours(h as i64)));
            frame.ghi.push(500.0);
            frame.dni.push(0.0);
            frame.dhi.push(0.0);
            frame.temp_air.push(25.0);
            frame.wind_speed.push(2.0);
            frame.pressure.push(101_325.0);
        }
        frame
    }

    #[test]
    fn test_validate_accepts_hourly_frame() {
        assert!(hourly_frame(48).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_frame() {
        let frame = WeatherFrame::empty(WeatherSource::Pvgis, 0.0, 0.0);
        assert!(frame.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_ragged_columns() {
        let mut frame = hourly_frame(24);
        frame.ghi.pop();
        assert!(frame.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_monotonic_index() {
        let mut frame = hourly_frame(24);
        frame.timestamps.swap(3, 4);
        assert!(frame.validate().is_err());
    }

    #[test]
    fn test_dni_zero_detection() {
        let mut frame = hourly_frame(24);
        assert!(frame.dni_is_zero());
        frame.dni[10] = 120.0;
        assert!(!frame.dni_is_zero());
    }

    #[test]
    fn test_serde_round_trip_preserves_timezone() {
        let frame = hourly_frame(3);
        let json = serde_json::to_string(&frame).unwrap();
        let back: WeatherFrame = serde_json::from_str(&json).unwrap();
        assert_eq!(back.timestamps, frame.timestamps);
        assert_eq!(back.len(), 3);
    }

    #[test]
    fn test_years_and_min_temperature() {
        let mut frame = hourly_frame(24);
        frame.temp_air[5] = -3.5;
        assert_eq!(frame.years(), vec![2018, 2019]);
        assert_eq!(frame.min_temperature(), Some(-3.5));
    }
}
