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

//! The Group B financial engine: low-voltage consumer with a flat tariff,
//! credit banking, Fio-B phase-in and optional remote self-consumption.

use crate::credit::{local_month_group_b, remote_a_month, remote_b_month};
use crate::indicators::{
    self, discounted_payback_years, irr_pct, lcoe, profitability_index, simple_payback_years,
};
use crate::sensitivity::{Perturbation, scenario_analysis, sensitivity_analysis};
use solarion_types::error::Result;
use solarion_types::financial::{CashFlowRow, FinancialResult, ScenarioResult};
use solarion_types::requests::GroupBFinancialRequest;
use tracing::info;

/// Runs the full Group B analysis: base cash flow, indicators, scenario
/// and sensitivity blocks.
pub fn calculate_group_b(request: &GroupBFinancialRequest) -> Result<FinancialResult> {
    validate(request)?;
    info!(
        "Group B analysis: CAPEX R$ {:.2}, {} years",
        request.economics.capex, request.economics.lifetime_years
    );

    let mut warnings = Vec::new();
    let rows = cash_flow(request, Perturbation::BASE);
    let result = indicators_from_rows(request, &rows, Perturbation::BASE, &mut warnings);

    let scenarios = scenario_analysis(|p| reduced_run(request, p));
    let sensitivity = sensitivity_analysis(
        request.tariff_kwh,
        request.economics.energy_inflation_pct,
        request.economics.discount_rate_pct,
        |p| {
            let rows = cash_flow(request, p);
            npv_from_rows(&rows)
        },
    );

    Ok(FinancialResult {
        npv: indicators::sanitize(result.npv, 999_999_999.0),
        irr_pct: indicators::sanitize(result.irr_pct, 999.0),
        payback_simple_years: result.payback_simple_years,
        payback_discounted_years: result.payback_discounted_years,
        lcoe: result.lcoe,
        profitability_index: indicators::sanitize(result.profitability_index, 999.0),
        cash_flow: rows,
        scenarios,
        sensitivity,
        warnings,
    })
}

fn validate(request: &GroupBFinancialRequest) -> Result<()> {
    request.economics.validate()?;
    request.fio_b_schedule.validate()?;
    request.remotes.validate()?;
    Ok(())
}

struct BaseIndicators {
    npv: f64,
    irr_pct: f64,
    payback_simple_years: f64,
    payback_discounted_years: f64,
    lcoe: f64,
    profitability_index: f64,
}

fn npv_from_rows(rows: &[CashFlowRow]) -> f64 {
    rows.last().map_or(0.0, |r| r.cumulative_discounted)
}

fn indicators_from_rows(
    request: &GroupBFinancialRequest,
    rows: &[CashFlowRow],
    perturbation: Perturbation,
    warnings: &mut Vec<String>,
) -> BaseIndicators {
    let capex = request.economics.capex * perturbation.capex_factor;
    let discount = perturbation.adjusted_discount(request.economics.discount_rate_pct) / 100.0;
    let flows: Vec<f64> = rows.iter().map(|r| r.nominal).collect();

    let npv_value = npv_from_rows(rows);
    let (irr, irr_warning) = irr_pct(&flows);
    if let Some(w) = irr_warning {
        warnings.push(w);
    }

    let om_by_year: Vec<f64> = rows.iter().skip(1).map(|r| r.om_cost).collect();
    let gen_by_year: Vec<f64> = rows.iter().skip(1).map(|r| r.generation_kwh).collect();

    BaseIndicators {
        npv: npv_value,
        irr_pct: irr,
        payback_simple_years: simple_payback_years(&flows),
        payback_discounted_years: discounted_payback_years(&flows, discount),
        lcoe: lcoe(capex, &om_by_year, &gen_by_year, discount),
        profitability_index: profitability_index(npv_value, capex),
    }
}

fn reduced_run(request: &GroupBFinancialRequest, perturbation: Perturbation) -> ScenarioResult {
    let rows = cash_flow(request, perturbation);
    let mut sink = Vec::new();
    let ind = indicators_from_rows(request, &rows, perturbation, &mut sink);
    ScenarioResult {
        npv: ind.npv,
        irr_pct: ind.irr_pct,
        payback_years: ind.payback_simple_years,
    }
}

/// The 25-year cash flow with monthly credit accounting.
fn cash_flow(request: &GroupBFinancialRequest, perturbation: Perturbation) -> Vec<CashFlowRow> {
    let econ = &request.economics;
    let capex = econ.capex * perturbation.capex_factor;
    let tariff_base = request.tariff_kwh * perturbation.tariff_factor;
    let energy_inflation = (econ.energy_inflation_pct + perturbation.inflation_delta_pp) / 100.0;
    let om_inflation = econ.om_inflation_pct / 100.0;
    let degradation = econ.degradation_pct / 100.0;
    let discount = perturbation.adjusted_discount(econ.discount_rate_pct) / 100.0;
    let lifetime = econ.lifetime_years;
    let availability_kwh = request.connection.availability_kwh();

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

    // The credit bank persists across months and calendar years.
    let mut bank_kwh = 0.0f64;

    for year in 1..=lifetime {
        let degradation_factor = (1.0 - degradation).powi(year as i32 - 1);
        let inflation_factor = (1.0 + energy_inflation).powi(year as i32 - 1);
        let tariff_y = tariff_base * inflation_factor;
        let fio_b_y = request.fio_b_kwh * inflation_factor;
        let calendar_year = request.fio_b_schedule.calendar_year(year);
        let noncomp = request.fio_b_schedule.noncompensated_fraction(calendar_year);

        let mut savings_y = 0.0;
        let mut generation_y = 0.0;

        for month in 0..12 {
            let r#gen = request.generation_monthly_kwh[month] * degradation_factor;
            let load = request.consumption_monthly_kwh[month];
            generation_y += r#gen;

            let local = local_month_group_b(
                r#gen,
                load,
                tariff_y,
                fio_b_y,
                econ.simultaneity_factor,
                &mut bank_kwh,
                noncomp,
            );
            let mut savings_m = local.savings;

            // Availability floor: the utility always bills the minimum
            // demand, so savings cannot exceed the bill above that floor.
            let bill_without = load * tariff_y;
            let max_savings = (bill_without - availability_kwh * tariff_y).max(0.0);
            savings_m = savings_m.min(max_savings);

            // Remote allocation against one snapshot of the bank; the bank
            // is decremented once, after all classes computed.
            let bank_before = bank_kwh;
            let mut consumed = 0.0;

            let remotes = &request.remotes;
            if remotes.remote_b.enabled {
                let lot = bank_before * remotes.remote_b.credit_share_pct / 100.0;
                let (savings, leftover) = remote_b_month(
                    lot,
                    remotes.remote_b.monthly_kwh[month],
                    tariff_y,
                    remotes.remote_b.tariff_kwh * inflation_factor,
                    remotes.remote_b.fio_b_kwh * inflation_factor,
                    noncomp,
                );
                savings_m += savings;
                consumed += lot - leftover;
            }
            if remotes.remote_a_green.enabled {
                let unit = &remotes.remote_a_green;
                let lot = bank_before * unit.credit_share_pct / 100.0;
                let out = remote_a_month(
                    lot,
                    unit.monthly_off_peak_kwh[month],
                    unit.monthly_peak_kwh[month],
                    unit.tariff_off_peak_kwh * inflation_factor,
                    unit.tariff_peak_kwh * inflation_factor,
                    unit.tusd_off_peak() * inflation_factor,
                    unit.tusd_peak() * inflation_factor,
                    unit.peak_adjustment_factor(),
                );
                savings_m += out.savings;
                consumed += lot - out.leftover_kwh;
            }
            if remotes.remote_a_blue.enabled {
                let unit = &remotes.remote_a_blue;
                let lot = bank_before * unit.credit_share_pct / 100.0;
                let out = remote_a_month(
                    lot,
                    unit.monthly_off_peak_kwh[month],
                    unit.monthly_peak_kwh[month],
                    unit.tariff_off_peak_kwh * inflation_factor,
                    unit.tariff_peak_kwh * inflation_factor,
                    unit.tusd_off_peak() * inflation_factor,
                    unit.tusd_peak() * inflation_factor,
                    unit.peak_adjustment_factor(),
                );
                savings_m += out.savings;
                consumed += lot - out.leftover_kwh;
            }

            bank_kwh = (bank_kwh - consumed).max(0.0);
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

#[cfg(test)]
mod tests {
    use super::*;
    use solarion_types::financial::{
        ConnectionType, EconomicInput, FioBSchedule, RemoteAllocation, RemoteUnitB,
    };

    /// The literal Group B scenario: CAPEX 50 000, 5 400 kWh/year, tariff
    /// 0.85, Fio-B 0.25, the 2025 schedule, 8% discount, 25 years. The
    /// daytime commercial load keeps the simultaneity high.
    fn request() -> GroupBFinancialRequest {
        GroupBFinancialRequest {
            generation_monthly_kwh: [450.0; 12],
            consumption_monthly_kwh: [500.0; 12],
            tariff_kwh: 0.85,
            fio_b_kwh: 0.25,
            fio_b_schedule: FioBSchedule::law_14300(2025),
            connection: ConnectionType::SinglePhase,
            remotes: RemoteAllocation::local_only(),
            economics: EconomicInput {
                capex: 50_000.0,
                lifetime_years: 25,
                discount_rate_pct: 8.0,
                energy_inflation_pct: 4.5,
                om_inflation_pct: 4.0,
                degradation_pct: 0.5,
                om_cost_first_year: 0.0,
                salvage_pct: 0.0,
                simultaneity_factor: 0.8,
                solar_capex_per_kwp: 5_000.0,
            },
        }
    }

    #[test]
    fn test_group_b_reference_case() {
        let result = calculate_group_b(&request()).unwrap();
        assert!(result.npv > 0.0, "NPV must be positive, got {}", result.npv);
        assert!(
            (4.0..=10.0).contains(&result.payback_simple_years),
            "payback {} outside [4, 10]",
            result.payback_simple_years
        );
        assert!(result.irr_pct > 8.0);
        assert_eq!(result.cash_flow.len(), 26);
        assert_eq!(result.cash_flow[0].nominal, -50_000.0);
    }

    #[test]
    fn test_scenario_ordering() {
        let result = calculate_group_b(&request()).unwrap();
        let s = &result.scenarios;
        assert!(s.optimistic.npv >= s.base.npv);
        assert!(s.base.npv >= s.conservative.npv);
        assert!(s.conservative.npv >= s.pessimistic.npv);
    }

    #[test]
    fn test_sensitivity_monotone_in_tariff() {
        let result = calculate_group_b(&request()).unwrap();
        let tariff_points = &result.sensitivity.tariff;
        assert_eq!(tariff_points.len(), 9);
        for pair in tariff_points.windows(2) {
            assert!(pair[1].npv >= pair[0].npv, "NPV should grow with tariff");
        }
        assert_eq!(result.sensitivity.inflation.len(), 9);
        assert_eq!(result.sensitivity.discount.len(), 9);
    }

    #[test]
    fn test_fio_b_charge_monotone_over_schedule_years() {
        // Fixed abatement: the Fio-B charge grows with the calendar year.
        let schedule = FioBSchedule::law_14300(2025);
        let mut charges = Vec::new();
        for year in 1..=6u32 {
            let mut bank = 0.0;
            let noncomp = schedule.noncompensated_fraction(schedule.calendar_year(year));
            let out = crate::credit::local_month_group_b(
                450.0, 500.0, 0.85, 0.25, 0.25, &mut bank, noncomp,
            );
            charges.push(out.fio_b_charge);
        }
        for pair in charges.windows(2) {
            assert!(pair[1] >= pair[0] - 1e-12);
        }
    }

    #[test]
    fn test_zero_generation_npv_is_capex_plus_om() {
        let mut req = request();
        req.generation_monthly_kwh = [0.0; 12];
        req.economics.om_cost_first_year = 500.0;
        let result = calculate_group_b(&req).unwrap();

        let discount: f64 = 0.08;
        let mut expected = -req.economics.capex;
        for year in 1..=25i32 {
            let om = 500.0 * 1.04f64.powi(year - 1);
            expected -= om / (1.0 + discount).powi(year);
        }
        assert!(
            (result.npv - expected).abs() < 1.0,
            "npv {} vs expected {}",
            result.npv,
            expected
        );
        assert_eq!(result.payback_simple_years, 99.0);
    }

    #[test]
    fn test_remote_b_share_increases_savings() {
        // A remote unit soaks up credits the local load cannot absorb.
        let mut req = request();
        req.generation_monthly_kwh = [900.0; 12]; // heavy surplus
        let base = calculate_group_b(&req).unwrap();

        req.remotes.local_share_pct = 50.0;
        req.remotes.remote_b = RemoteUnitB {
            enabled: true,
            credit_share_pct: 50.0,
            monthly_kwh: [600.0; 12],
            tariff_kwh: 0.95,
            fio_b_kwh: 0.25,
        };
        let with_remote = calculate_group_b(&req).unwrap();
        assert!(with_remote.npv > base.npv);
    }

    #[test]
    fn test_invalid_shares_rejected() {
        let mut req = request();
        req.remotes.remote_b.enabled = true;
        req.remotes.remote_b.credit_share_pct = 50.0; // local still 100
        assert!(calculate_group_b(&req).is_err());
    }

    #[test]
    fn test_irr_zeroes_npv_within_tolerance() {
        let result = calculate_group_b(&request()).unwrap();
        let flows: Vec<f64> = result.cash_flow.iter().map(|r| r.nominal).collect();
        let residual = crate::indicators::npv(result.irr_pct / 100.0, &flows).abs();
        assert!(
            residual < 1e-3 * 50_000.0,
            "NPV at IRR is {residual}, not ~0"
        );
    }
}
