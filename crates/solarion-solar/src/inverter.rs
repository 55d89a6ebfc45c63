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

//! Per-inverter aggregation: sum the MPPT DC series, apply the nominal
//! conversion efficiency, clip at the AC nameplate and apply the single
//! system-loss factor.
//!
//! The performance ratio is AC_final / DC_total — the conversion
//! efficiency deliberately stays out of the denominator, a diluted PR is
//! the metric the sizing reports are calibrated against.

use solarion_types::inverter::Inverter;
use solarion_types::responses::InverterResult;
use tracing::{info, warn};

/// Aggregation output: the booked energies plus the final AC series.
#[derive(Debug, Clone)]
pub struct InverterAggregation {
    pub result: InverterResult,
    /// Hourly AC power after clipping and losses (W)
    pub ac_final_series: Vec<f64>,
    pub warnings: Vec<String>,
}

/// Collapses the per-plane DC series feeding one inverter.
///
/// `plane_series` pairs each plane id with its DC power series; all series
/// must share the frame length. `loss_factor` is `1 − Σ losses/100`.
pub fn aggregate_inverter(
    inverter: &Inverter,
    plane_series: &[(String, u32, f64, Vec<f64>)],
    loss_factor: f64,
    year_count: usize,
) -> InverterAggregation {
    let n = plane_series.first().map_or(0, |(_, _, _, s)| s.len());
    let years = year_count.max(1) as f64;

    let mut dc_total = vec![0.0f64; n];
    let mut module_count = 0u32;
    let mut dc_nameplate_w = 0.0f64;
    let mut plane_ids = Vec::new();
    for (id, modules, nameplate, series) in plane_series {
        plane_ids.push(id.clone());
        module_count += modules;
        dc_nameplate_w += nameplate;
        for (acc, v) in dc_total.iter_mut().zip(series) {
            *acc += v;
        }
    }

    let efficiency = inverter.nominal_efficiency();
    let p_aco = inverter.p_aco_w;

    let mut dc_sum_wh = 0.0;
    let mut pre_sum_wh = 0.0;
    let mut clip_sum_wh = 0.0;
    let mut final_sum_wh = 0.0;
    let mut clipped_hours = 0usize;
    let mut ac_final_series = Vec::with_capacity(n);

    for dc in &dc_total {
        let ac_pre = dc * efficiency;
        let ac_clipped = ac_pre.min(p_aco);
        let ac_final = ac_clipped * loss_factor;
        if ac_pre > p_aco {
            clipped_hours += 1;
        }
        dc_sum_wh += dc;
        pre_sum_wh += ac_pre;
        clip_sum_wh += ac_clipped;
        final_sum_wh += ac_final;
        ac_final_series.push(ac_final);
    }

    let annual_kwh = final_sum_wh / 1000.0 / years;
    let performance_ratio_pct = if dc_sum_wh > 0.0 {
        final_sum_wh / dc_sum_wh * 100.0
    } else {
        0.0
    };
    let clipping_pct = if n > 0 {
        clipped_hours as f64 / n as f64 * 100.0
    } else {
        0.0
    };
    let oversizing_pct = if p_aco > 0.0 {
        dc_nameplate_w / p_aco * 100.0
    } else {
        0.0
    };

    let mut warnings = Vec::new();
    if dc_sum_wh > 0.0 && !(70.0..=95.0).contains(&performance_ratio_pct) {
        warnings.push(format!(
            "inverter {}: performance ratio {:.1}% outside the expected 70-95% band",
            inverter.id, performance_ratio_pct
        ));
    }
    if clipping_pct > 20.0 {
        warnings.push(format!(
            "inverter {}: clipping on {:.1}% of hours, consider a larger AC rating",
            inverter.id, clipping_pct
        ));
    }
    if module_count > 0 {
        let per_module = annual_kwh / f64::from(module_count);
        if !(300.0..=2000.0).contains(&per_module) {
            warnings.push(format!(
                "inverter {}: energy per module {:.0} kWh/year outside the plausible 300-2000 range",
                inverter.id, per_module
            ));
        }
    }
    for w in &warnings {
        warn!("{}", w);
    }

    info!(
        "Inverter {}: DC={:.1}kWh -> AC={:.1}kWh (clipping {:.1}%)",
        inverter.id,
        dc_sum_wh / 1000.0 / years,
        annual_kwh,
        clipping_pct
    );

    InverterAggregation {
        result: InverterResult {
            inverter_id: inverter.id.clone(),
            p_aco_w: p_aco,
            plane_ids,
            module_count,
            dc_nameplate_w,
            dc_annual_kwh: dc_sum_wh / 1000.0 / years,
            ac_pre_clip_kwh: pre_sum_wh / 1000.0 / years,
            ac_post_clip_kwh: clip_sum_wh / 1000.0 / years,
            ac_final_kwh: annual_kwh,
            performance_ratio_pct,
            clipping_pct,
            oversizing_pct,
        },
        ac_final_series,
        warnings,
    }
}

/// Specific yield in kWh/kWp/year.
pub fn specific_yield(annual_kwh: f64, dc_nameplate_w: f64) -> f64 {
    if dc_nameplate_w > 0.0 {
        annual_kwh / (dc_nameplate_w / 1000.0)
    } else {
        0.0
    }
}

/// Capacity factor in percent.
pub fn capacity_factor_pct(annual_kwh: f64, dc_nameplate_w: f64) -> f64 {
    let theoretical = dc_nameplate_w / 1000.0 * 8760.0;
    if theoretical > 0.0 {
        annual_kwh / theoretical * 100.0
    } else {
        0.0
    }
}
