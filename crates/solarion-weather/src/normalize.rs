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

//! Normalisation of raw upstream series into the common frame schema.
//!
//! Every column is clipped to its physical range; out-of-range samples are
//! treated as missing, interpolated linearly over runs of up to 24 hours
//! and the remainder filled with the column median.

use solarion_types::weather::WeatherFrame;
use tracing::{debug, warn};

/// Longest NaN run the linear interpolation will bridge, in hours.
const INTERPOLATION_LIMIT: usize = 24;

/// Physical ranges of the required columns.
pub const GHI_RANGE: (f64, f64) = (0.0, 1500.0);
pub const TEMP_RANGE: (f64, f64) = (-50.0, 60.0);
pub const WIND_RANGE: (f64, f64) = (0.0, 50.0);
pub const PRESSURE_RANGE: (f64, f64) = (70_000.0, 110_000.0);

/// Cleans a frame in place: range clipping, gap interpolation, median fill.
pub fn clean_frame(frame: &mut WeatherFrame) {
    clean_column("ghi", &mut frame.ghi, GHI_RANGE);
    clean_column("temp_air", &mut frame.temp_air, TEMP_RANGE);
    clean_column("wind_speed", &mut frame.wind_speed, WIND_RANGE);
    clean_column("pressure", &mut frame.pressure, PRESSURE_RANGE);

    // DNI/DHI are optional inputs; negative values are measurement noise.
    for v in frame.dni.iter_mut().chain(frame.dhi.iter_mut()) {
        if !v.is_finite() || *v < 0.0 {
            *v = 0.0;
        }
    }
}

fn clean_column(name: &str, values: &mut [f64], (min, max): (f64, f64)) {
    let mut invalid = 0usize;
    for v in values.iter_mut() {
        if !v.is_finite() || *v < min || *v > max {
            *v = f64::NAN;
            invalid += 1;
        }
    }
    if invalid == 0 {
        return;
    }
    warn!(
        "Found {} invalid {} values, clipping to valid range",
        invalid, name
    );

    interpolate_gaps(values, INTERPOLATION_LIMIT);

    if values.iter().any(|v| v.is_nan()) {
        let med = median(values);
        for v in values.iter_mut() {
            if v.is_nan() {
                *v = med;
            }
        }
        debug!("Filled remaining NaN in {} with median {:.2}", name, med);
    }

    for v in values.iter_mut() {
        *v = v.clamp(min, max);
    }
}

/// Linearly interpolates NaN runs bounded by valid samples on both sides,
/// leaving runs longer than `limit` (and edge runs) untouched.
fn interpolate_gaps(values: &mut [f64], limit: usize) {
    let n = values.len();
    let mut i = 0;
    while i < n {
        if !values[i].is_nan() {
            i += 1;
            continue;
        }
        let run_start = i;
        while i < n && values[i].is_nan() {
            i += 1;
        }
        let run_len = i - run_start;
        if run_start == 0 || i == n || run_len > limit {
            continue;
        }
        let left = values[run_start - 1];
        let right = values[i];
        for (k, slot) in (1..=run_len).zip(run_start..i) {
            let t = k as f64 / (run_len + 1) as f64;
            values[slot] = left + (right - left) * t;
        }
    }
}

/// Median of the finite values; 0 when none exist.
fn median(values: &[f64]) -> f64 {
    let mut finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return 0.0;
    }
    finite.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = finite.len() / 2;
    if finite.len() % 2 == 0 {
        (finite[mid - 1] + finite[mid]) / 2.0
    } else {
        finite[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use solarion_types::weather::{WeatherSource, localize_utc};

    fn frame_with_ghi(ghi: Vec<f64>) -> WeatherFrame {
        let start = Utc.with_ymd_and_hms(2019, 6, 1, 0, 0, 0).unwrap();
        let n = ghi.len();
        let mut frame = WeatherFrame::empty(WeatherSource::Pvgis, -15.79, -47.88);
        for h in 0..n {
            frame
                .timestamps
                .push(localize_utc(start + chrono::Duration::hours(h as i64)));
        }
        frame.ghi = ghi;
        frame.dni = vec![0.0; n];
        frame.dhi = vec![0.0; n];
        frame.temp_air = vec![25.0; n];
        frame.wind_speed = vec![2.0; n];
        frame.pressure = vec![101_325.0; n];
        frame
    }

    #[test]
    fn test_out_of_range_is_interpolated() {
        let mut frame = frame_with_ghi(vec![100.0, 2500.0, 300.0]);
        clean_frame(&mut frame);
        assert!((frame.ghi[1] - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_long_gap_falls_back_to_median() {
        let mut ghi = vec![400.0; 60];
        for v in ghi.iter_mut().take(40).skip(10) {
            *v = f64::NAN; // 30-hour gap, beyond the interpolation limit
        }
        let mut frame = frame_with_ghi(ghi);
        clean_frame(&mut frame);
        assert!(frame.ghi.iter().all(|v| v.is_finite()));
        assert!((frame.ghi[20] - 400.0).abs() < 1e-9);
    }

    #[test]
    fn test_edge_gap_uses_median() {
        let mut frame = frame_with_ghi(vec![f64::NAN, f64::NAN, 500.0, 500.0]);
        clean_frame(&mut frame);
        assert!((frame.ghi[0] - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_clean_respects_bounds_after_fill() {
        let mut frame = frame_with_ghi(vec![100.0; 24]);
        frame.temp_air[3] = 95.0;
        frame.wind_speed[4] = -2.0;
        frame.pressure[5] = 5_000.0;
        clean_frame(&mut frame);
        assert!(frame.temp_air.iter().all(|t| (-50.0..=60.0).contains(t)));
        assert!(frame.wind_speed.iter().all(|w| (0.0..=50.0).contains(w)));
        assert!(
            frame
                .pressure
                .iter()
                .all(|p| (70_000.0..=110_000.0).contains(p))
        );
    }

    #[test]
    fn test_negative_dni_zeroed() {
        let mut frame = frame_with_ghi(vec![100.0; 4]);
        frame.dni[2] = -5.0;
        clean_frame(&mut frame);
        assert_eq!(frame.dni[2], 0.0);
    }
}
