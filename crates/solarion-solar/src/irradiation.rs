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

//! Monthly irradiation analysis plus the cache-aware POA helper shared
//! with the PV simulator.

use crate::decomposition::decompose_ghi;
use crate::transposition::poa_series;
use chrono::Datelike;
use solarion_types::error::{EngineError, Result};
use solarion_types::irradiance::{DecompositionModel, TranspositionModel};
use solarion_types::requests::IrradiationAnalysisRequest;
use solarion_types::responses::{
    IrradiationAnalysisResponse, IrradiationConfiguration, MonthExtreme,
};
use solarion_types::weather::{WeatherFrame, WeatherSource};
use solarion_weather::{GeohashCache, WeatherProvider};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// POA series with the geohash cache in front.
///
/// The cache key carries `{tilt, azimuth, model, type: "poa", source}`;
/// the model tag names the full chain (decomposition + transposition) so
/// differently-modelled series never collide.
pub fn poa_cached(
    cache: &GeohashCache,
    frame: &WeatherFrame,
    tilt_deg: f64,
    azimuth_deg: f64,
    decomposition: DecompositionModel,
    transposition: TranspositionModel,
    source: WeatherSource,
) -> Vec<f64> {
    let params = BTreeMap::from([
        ("tilt".to_owned(), format_angle(tilt_deg)),
        ("azimuth".to_owned(), format_angle(azimuth_deg)),
        (
            "model".to_owned(),
            format!("{}+{}", decomposition.as_str(), transposition.as_str()),
        ),
        ("type".to_owned(), "poa".to_owned()),
        ("source".to_owned(), source.as_str().to_owned()),
    ]);

    if let Some(cached) = cache.get::<Vec<f64>>(frame.latitude, frame.longitude, &params) {
        if cached.len() == frame.len() {
            info!(
                "Geohash cache HIT for POA (tilt={}, azimuth={})",
                tilt_deg, azimuth_deg
            );
            return cached;
        }
        debug!("Cached POA length mismatch, recomputing");
    }

    let poa = poa_series(frame, tilt_deg, azimuth_deg, transposition);
    if !cache.set(frame.latitude, frame.longitude, &poa, &params) {
        debug!("POA cache write not performed");
    }
    poa
}

fn format_angle(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{v:.1}")
    }
}

/// Restricts a frame to a calendar-year window.
pub fn filter_years(frame: &WeatherFrame, start: i32, end: i32) -> Result<WeatherFrame> {
    let mut out = WeatherFrame::empty(frame.source, frame.latitude, frame.longitude);
    for i in 0..frame.len() {
        let year = frame.timestamps[i].year();
        if (start..=end).contains(&year) {
            out.timestamps.push(frame.timestamps[i]);
            out.ghi.push(frame.ghi[i]);
            out.dni.push(frame.dni[i]);
            out.dhi.push(frame.dhi[i]);
            out.temp_air.push(frame.temp_air[i]);
            out.wind_speed.push(frame.wind_speed[i]);
            out.pressure.push(frame.pressure[i]);
        }
    }
    if out.is_empty() {
        return Err(EngineError::Calculation(format!(
            "weather frame is empty after filtering to {start}-{end}"
        )));
    }
    Ok(out)
}

/// Monthly mean irradiation in kWh/m²/day from an hourly W/m² series.
pub fn monthly_daily_means(frame: &WeatherFrame, series: &[f64]) -> [f64; 12] {
    // Daily totals first, then the mean of the daily totals per month.
    let mut day_totals: BTreeMap<(i32, u32, u32), f64> = BTreeMap::new();
    for (ts, v) in frame.timestamps.iter().zip(series) {
        *day_totals
            .entry((ts.year(), ts.month(), ts.day()))
            .or_insert(0.0) += v / 1000.0;
    }
    let mut sums = [0.0f64; 12];
    let mut counts = [0usize; 12];
    for ((_, month, _), total) in day_totals {
        sums[(month - 1) as usize] += total;
        counts[(month - 1) as usize] += 1;
    }
    let mut means = [0.0f64; 12];
    for m in 0..12 {
        if counts[m] > 0 {
            means[m] = sums[m] / counts[m] as f64;
        }
    }
    means
}

/// Runs the irradiation analysis for a site.
pub fn analyze_irradiation(
    provider: &WeatherProvider,
    request: &IrradiationAnalysisRequest,
) -> Result<IrradiationAnalysisResponse> {
    let (frame, actual_source) = provider.fetch(
        request.latitude,
        request.longitude,
        request.source,
        request.allow_fallback,
    )?;
    let mut frame = filter_years(&frame, request.startyear, request.endyear)?;

    let tilted = request.tilt_deg > 0.0 || request.azimuth_deg != 0.0;
    let series: Vec<f64> = if tilted {
        if frame.dni_is_zero() {
            decompose_ghi(&mut frame, request.decomposition);
        }
        poa_cached(
            provider.cache(),
            &frame,
            request.tilt_deg,
            request.azimuth_deg,
            request.decomposition,
            request.transposition,
            actual_source,
        )
    } else {
        // Horizontal analysis: GHI is used directly, no POA branch.
        frame.ghi.clone()
    };

    let monthly = monthly_daily_means(&frame, &series);
    let annual_mean = monthly.iter().sum::<f64>() / 12.0;

    let (max_idx, max_value) = monthly
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, v)| (i, *v))
        .unwrap_or((0, 0.0));
    let (min_idx, min_value) = monthly
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, v)| (i, *v))
        .unwrap_or((0, 0.0));

    let seasonal_variation_pct = if annual_mean > 0.0 {
        (max_value - min_value) / annual_mean * 100.0
    } else {
        0.0
    };

    Ok(IrradiationAnalysisResponse {
        monthly_kwh_m2_day: monthly,
        annual_mean,
        maximum: MonthExtreme {
            value: max_value,
            month: max_idx as u32 + 1,
        },
        minimum: MonthExtreme {
            value: min_value,
            month: min_idx as u32 + 1,
        },
        seasonal_variation_pct,
        configuration: IrradiationConfiguration {
            tilt_deg: request.tilt_deg,
            azimuth_deg: request.azimuth_deg,
            decomposition: request.decomposition,
            transposition: request.transposition,
            tilted_plane: tilted,
            source: actual_source,
        },
        record_count: frame.len(),
    })
}
