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

//! The PV plant simulator: weather → per-plane POA and DC → per-inverter
//! AC. Planes are order-independent and fan out over the rayon pool; the
//! aggregation joins them per inverter.

use crate::decomposition::decompose_ghi;
use crate::inverter::{aggregate_inverter, capacity_factor_pct, specific_yield};
use crate::irradiation::poa_cached;
use crate::pvmodel::simulate_plane_dc;
use chrono::Datelike;
use rayon::prelude::*;
use solarion_types::error::{EngineError, Result};
use solarion_types::requests::PvSystemRequest;
use solarion_types::responses::{PlaneResult, PvSystemSummary};
use solarion_types::weather::WeatherFrame;
use solarion_weather::WeatherProvider;
use std::collections::BTreeMap;
use tracing::info;

/// Simulation output: the response block plus the hourly AC series and the
/// weather frame the downstream stages reuse.
#[derive(Debug, Clone)]
pub struct PvSimulation {
    pub summary: PvSystemSummary,
    /// Total plant AC power after losses, hourly (W)
    pub ac_series: Vec<f64>,
    pub frame: WeatherFrame,
}

/// Stateless simulator over a shared weather-provider handle.
#[derive(Debug, Clone)]
pub struct PvSimulator<'a> {
    provider: &'a WeatherProvider,
}

impl<'a> PvSimulator<'a> {
    pub fn new(provider: &'a WeatherProvider) -> Self {
        Self { provider }
    }

    pub fn simulate(&self, request: &PvSystemRequest) -> Result<PvSimulation> {
        let (mut frame, actual_source) = self.provider.fetch(
            request.site.latitude,
            request.site.longitude,
            request.site.source,
            request.site.allow_fallback,
        )?;
        frame.validate()?;

        let needs_poa = request.planes.iter().any(|p| !p.is_horizontal());
        if needs_poa && frame.dni_is_zero() {
            decompose_ghi(&mut frame, request.decomposition);
        }

        let year_count = frame.year_count();
        let n_days = (frame.len() / 24).max(1) as f64;
        info!(
            "Simulating {} planes over {} hours ({} years) from {}",
            request.planes.len(),
            frame.len(),
            year_count,
            actual_source
        );

        // Per-MPPT DC simulations are order-independent; fan out.
        let plane_outputs: Vec<(PlaneResult, Vec<f64>)> = request
            .planes
            .par_iter()
            .map(|plane| {
                let poa = if plane.is_horizontal() {
                    frame.ghi.clone()
                } else {
                    poa_cached(
                        self.provider.cache(),
                        &frame,
                        plane.tilt_deg,
                        plane.azimuth_deg,
                        request.decomposition,
                        request.transposition,
                        actual_source,
                    )
                };
                let dc = simulate_plane_dc(plane, &request.module, &frame, &poa);
                let dc_annual_kwh = dc.iter().sum::<f64>() / 1000.0 / year_count.max(1) as f64;
                let poa_daily_mean = poa.iter().sum::<f64>() / 1000.0 / n_days;
                let result = PlaneResult {
                    plane_id: plane.id.clone(),
                    inverter_id: plane.inverter_id.clone(),
                    mppt_index: plane.mppt_index,
                    tilt_deg: plane.tilt_deg,
                    azimuth_deg: plane.azimuth_deg,
                    module_count: plane.module_count(),
                    dc_nameplate_w: plane.dc_nameplate_w(&request.module),
                    dc_annual_kwh,
                    poa_daily_mean_kwh_m2: poa_daily_mean,
                };
                (result, dc)
            })
            .collect();

        // Join per inverter.
        let loss_factor = request.losses.ac_factor();
        let mut grouped: BTreeMap<String, Vec<(String, u32, f64, Vec<f64>)>> = BTreeMap::new();
        for (result, dc) in &plane_outputs {
            grouped.entry(result.inverter_id.clone()).or_default().push((
                result.plane_id.clone(),
                result.module_count,
                result.dc_nameplate_w,
                dc.clone(),
            ));
        }

        let mut by_inverter = Vec::new();
        let mut warnings = Vec::new();
        let mut ac_series = vec![0.0f64; frame.len()];
        for inverter in &request.inverters {
            let Some(series) = grouped.remove(inverter.id.as_str()) else {
                continue;
            };
            let aggregation = aggregate_inverter(inverter, &series, loss_factor, year_count);
            for (acc, v) in ac_series.iter_mut().zip(&aggregation.ac_final_series) {
                *acc += v;
            }
            warnings.extend(aggregation.warnings);
            by_inverter.push(aggregation.result);
        }
        if let Some(orphan) = grouped.keys().next() {
            return Err(EngineError::Validation(format!(
                "plane references unknown inverter '{orphan}'"
            )));
        }

        // System totals.
        let dc_nameplate_w: f64 = by_inverter.iter().map(|r| r.dc_nameplate_w).sum();
        let dc_annual_kwh: f64 = by_inverter.iter().map(|r| r.dc_annual_kwh).sum();
        let ac_pre_clip_kwh: f64 = by_inverter.iter().map(|r| r.ac_pre_clip_kwh).sum();
        let ac_post_clip_kwh: f64 = by_inverter.iter().map(|r| r.ac_post_clip_kwh).sum();
        let annual_energy_kwh: f64 = by_inverter.iter().map(|r| r.ac_final_kwh).sum();

        let performance_ratio_pct = if dc_annual_kwh > 0.0 {
            annual_energy_kwh / dc_annual_kwh * 100.0
        } else {
            0.0
        };

        let monthly_generation_kwh = monthly_energy(&frame, &ac_series, year_count);

        let summary = PvSystemSummary {
            power_kwp: dc_nameplate_w / 1000.0,
            annual_energy_kwh,
            monthly_generation_kwh,
            dc_annual_kwh,
            ac_pre_clip_kwh,
            ac_post_clip_kwh,
            performance_ratio_pct,
            specific_yield: specific_yield(annual_energy_kwh, dc_nameplate_w),
            capacity_factor_pct: capacity_factor_pct(annual_energy_kwh, dc_nameplate_w),
            by_plane: plane_outputs.into_iter().map(|(r, _)| r).collect(),
            by_inverter,
            data_years: frame.years(),
            weather_source: actual_source,
            warnings,
        };

        info!(
            "PV simulation done: {:.2} kWp, {:.0} kWh/year, PR {:.1}%",
            summary.power_kwp, summary.annual_energy_kwh, summary.performance_ratio_pct
        );

        Ok(PvSimulation {
            summary,
            ac_series,
            frame,
        })
    }
}

/// Mean energy per calendar month across the data years (kWh).
fn monthly_energy(frame: &WeatherFrame, series: &[f64], year_count: usize) -> [f64; 12] {
    let mut sums = [0.0f64; 12];
    for (ts, v) in frame.timestamps.iter().zip(series) {
        sums[ts.month() as usize - 1] += v / 1000.0;
    }
    let years = year_count.max(1) as f64;
    sums.map(|s| s / years)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use solarion_types::weather::{WeatherSource, localize_utc};

    #[test]
    fn test_monthly_energy_splits_by_month() {
        let start = Utc.with_ymd_and_hms(2019, 1, 1, 3, 0, 0).unwrap();
        let mut frame = WeatherFrame::empty(WeatherSource::Pvgis, -15.0, -47.0);
        let mut series = Vec::new();
        for h in 0..(24 * 59) {
            frame
                .timestamps
                .push(localize_utc(start + chrono::Duration::hours(h)));
            frame.ghi.push(0.0);
            frame.dni.push(0.0);
            frame.dhi.push(0.0);
            frame.temp_air.push(25.0);
            frame.wind_speed.push(2.0);
            frame.pressure.push(101_325.0);
            series.push(1000.0); // 1 kWh per hour
        }
        let monthly = monthly_energy(&frame, &series, 1);
        // January has 31 days × 24 h, February the rest.
        assert!((monthly[0] - 744.0).abs() < 1.0);
        assert!((monthly[1] - (24.0 * 59.0 - 744.0)).abs() < 1.0);
        assert_eq!(monthly[5], 0.0);
    }
}
