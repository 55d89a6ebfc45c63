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

//! The Group A financial engine: the generating unit sits on a Green
//! tariff with peak/off-peak bands. Instantaneous self-consumption abates
//! local off-peak; credits abate local off-peak 1:1 and local peak through
//! the TE-ratio factor, then the surplus feeds the remote classes.

use crate::credit::{remote_a_month, remote_b_month};
use crate::indicators::{
    self, discounted_payback_years, irr_pct, lcoe, profitability_index, simple_payback_years,
};
use crate::sensitivity::{Perturbation, scenario_analysis, sensitivity_analysis};
use solarion_types::error::Result;
use solarion_types::financial::{CashFlowRow, FinancialResult, ScenarioResult};
use solarion_types::requests::GroupAFinancialRequest;
use tracing::info;

/// Runs the full Group A analysis.
pub fn calculate_group_a(request: &GroupAFinancialRequest) -> Result<FinancialResult> {
    request.economics.validate()?;
    request.fio_b_schedule.validate()?;
    request.remotes.validate()?;
    info!(
        "Group A analysis: CAPEX R$ {:.2}, TE ratio {:.3}",
        request.economics.capex,
        request.peak_adjustment_factor()
    );

    let mut warnings = Vec::new();
    let rows = cash_flow(request, Perturbation::BASE);

    let capex = request.economics.capex;
    let discount = request.economics.discount_rate_pct / 100.0;
    let flows: Vec<f64> = rows.iter().map(|r| r.nominal).collect();
    let npv_value = rows.last().map_or(0.0, |r| r.cumulative_discounted);
    let (irr, irr_warning) = irr_pct(&flows);
    if let Some(w) = irr_warning {
        warnings.push(w);
    }
    let om_by_year: Vec<f64> = rows.iter().skip(1).map(|r| r.om_cost).collect();
    let gen_by_year: Vec<f64> = rows.iter().skip(1).map(|r| r.generation_kwh).collect();

    let scenarios = scenario_analysis(|p| {
        let rows = cash_flow(request, p);
        let flows: Vec<f64> = rows.iter().map(|r| r.nominal).collect();
        let (irr, _) = irr_pct(&flows);
        ScenarioResult {
            npv: rows.last().map_or(0.0, |r| r.cumulative_discounted),
            irr_pct: irr,
            payback_years: simple_payback_years(&flows),
        }
    });
    let sensitivity = sensitivity_analysis(
        request.tariff_off_peak_kwh,
        request.economics.energy_inflation_pct,
        request.economics.discount_rate_pct,
        |p| {
            let rows = cash_flow(request, p);
            rows.last().map_or(0.0, |r| r.cumulative_discounted)
        },
    );

    Ok(FinancialResult {
        npv: indicators::sanitize(npv_value, 999_999_999.0),
        irr_pct: indicators::sanitize(irr, 999.0),
        payback_simple_years: simple_payback_years(&flows),
        payback_discounted_years: discounted_payback_years(&flows, discount),
        lcoe: lcoe(capex, &om_by_year, &gen_by_year, discount),
        profitability_index: profitability_index(npv_value, capex),
        cash_flow: rows,
        scenarios,
        sensitivity,
        warnings,
    })
}

/// The yearly loop with monthly Group A credit accounting. Remote classes
/// keep their own persistent banks fed by the monthly allocation.
fn cash_flow(request: &GroupAFinancialRequest, perturbation: Perturbation) -> Vec<CashFlowRow> {
    let econ = &request.economics;
    let capex = econ.capex * perturbation.capex_factor;
    let energy_inflation = (econ.energy_inflation_pct + perturbation.inflation_delta_pp) / 100.0;
    let om_inflation = econ.om_inflation_pct / 100.0;
    let degradation = econ.degradation_pct / 100.0;
    let discount = perturbation.adjusted_discount(econ.discount_rate_pct) / 100.0;
    let lifetime = econ.lifetime_years;

    let tariff_fp_base = request.tariff_off_peak_kwh * perturbation.tariff_factor;
    let tariff_p_base = request.tariff_peak_kwh * perturbation.tariff_factor;
    let tusd_fp = request.tusd_off_peak();
    let tusd_p = request.tusd_peak();
    let local_factor = request.peak_adjustment_factor();

    let mut rows = Vec::with_capacity(lifetime as usize + 1);
    let mut cumulative_nominal = -capex;
    let mut cumulative_discounted = -capex;
    rows.push(CashFlowRow {
        year: 0,
        nominal: -capex,
        cumulative_nominal,
        discounted: -capex,
        cumulative_discounted,
        generation_kwh: 0.0,
        savings: 0.0,
        om_cost: 0.0,
    });

    // Per-class remote banks persist across months and years.
    let mut bank_b = 0.0f64;
    let mut bank_green = 0.0f64;
    let mut bank_blue = 0.0f64;

    for year in 1..=lifetime {
        let degradation_factor = (1.0 - degradation).powi(year as i32 - 1);
        let inflation_factor = (1.0 + energy_inflation).powi(year as i32 - 1);
        let tariff_fp_y = tariff_fp_base * inflation_factor;
        let tariff_p_y = tariff_p_base * inflation_factor;
        let tusd_fp_y = tusd_fp * inflation_factor;
        let tusd_p_y = tusd_p * inflation_factor;
        let te_fp_y = request.te_off_peak * inflation_factor;
        let calendar_year = request.fio_b_schedule.calendar_year(year);
        let noncomp = request.fio_b_schedule.noncompensated_fraction(calendar_year);

        let mut savings_y = 0.0;
        let mut generation_y = 0.0;

        for month in 0..12 {
            let r#gen = request.generation_monthly_kwh[month] * degradation_factor;
            let cons_fp = request.consumption_off_peak_kwh[month];
            let cons_p = request.consumption_peak_kwh[month];
            generation_y += r#gen;

            // Instantaneous self-consumption abates local off-peak only,
            // valued at the full off-peak tariff.
            let simultaneous = (r#gen * econ.simultaneity_factor).min(cons_fp);
            let mut savings_m = simultaneous * tariff_fp_y;

            let cons_fp_after = (cons_fp - simultaneous).max(0.0);
            let credits = (r#gen - simultaneous).max(0.0);

            // Local abatement: off-peak first (1:1), then peak through the
            // TE-ratio factor, valued at tariff − TUSD.
            let abated_fp = credits.min(cons_fp_after);
            let after_fp = credits - abated_fp;
            let abated_p = (after_fp / local_factor).min(cons_p);
            let credits_used_p = abated_p * local_factor;
            savings_m += abated_fp * (tariff_fp_y - tusd_fp_y);
            savings_m += abated_p * (tariff_p_y - tusd_p_y);

            // What is left feeds the remote classes.
            let available = after_fp - credits_used_p;
            let remotes = &request.remotes;

            if remotes.remote_b.enabled {
                let lot = available * remotes.remote_b.credit_share_pct / 100.0;
                let total = lot + bank_b;
                let (savings, leftover) = remote_b_month(
                    total,
                    remotes.remote_b.monthly_kwh[month],
                    te_fp_y,
                    remotes.remote_b.tariff_kwh * inflation_factor,
                    remotes.remote_b.fio_b_kwh * inflation_factor,
                    noncomp,
                );
                savings_m += savings;
                bank_b = leftover;
            }
            if remotes.remote_a_green.enabled {
                let unit = &remotes.remote_a_green;
                let lot = available * unit.credit_share_pct / 100.0;
                let out = remote_a_month(
                    lot + bank_green,
                    unit.monthly_off_peak_kwh[month],
                    unit.monthly_peak_kwh[month],
                    unit.tariff_off_peak_kwh * inflation_factor,
                    unit.tariff_peak_kwh * inflation_factor,
                    unit.tusd_off_peak() * inflation_factor,
                    unit.tusd_peak() * inflation_factor,
                    unit.peak_adjustment_factor(),
                );
                savings_m += out.savings;
                bank_green = out.leftover_kwh;
            }
            if remotes.remote_a_blue.enabled {
                let unit = &remotes.remote_a_blue;
                let lot = available * unit.credit_share_pct / 100.0;
                let out = remote_a_month(
                    lot + bank_blue,
                    unit.monthly_off_peak_kwh[month],
                    unit.monthly_peak_kwh[month],
                    unit.tariff_off_peak_kwh * inflation_factor,
                    unit.tariff_peak_kwh * inflation_factor,
                    unit.tusd_off_peak() * inflation_factor,
                    unit.tusd_peak() * inflation_factor,
                    unit.peak_adjustment_factor(),
                );
                savings_m += out.savings;
                bank_blue = out.leftover_kwh;
            }

            savings_y += savings_m;
        }

        let om_y = econ.om_cost_first_year * (1.0 + om_inflation).powi(year as i32 - 1);
        let mut nominal = savings_y - om_y;
        if year == lifetime {
            nominal += capex * econ.salvage_pct;
        }
        let discounted = nominal / (1.0 + discount).powi(year as i32);
        cumulative_nominal += nominal;
        cumulative_discounted += discounted;

        rows.push(CashFlowRow {
            year,
            nominal,
            cumulative_nominal,
            discounted,
            cumulative_discounted,
            generation_kwh: generation_y,
            savings: savings_y,
            om_cost: om_y,
        });
    }

    rows
}
