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

//! The hourly BESS dispatcher.
//!
//! Steps a state-of-charge model through the year against generation and
//! load curves under a time-of-use tariff. Hour t strictly depends on hour
//! t−1; the loop never parallelises.

use solarion_types::bess::{BessSpec, DispatchStrategy};
use solarion_types::error::{EngineError, Result};
use solarion_types::responses::BessSummary;
use solarion_types::tariff::{Tariff, TariffKind};
use tracing::info;

/// SOC margin kept before flipping between charge and discharge.
const SOC_MARGIN: f64 = 0.05;
/// PV surplus/deficit dead-band for the self-consumption strategy (kW).
const BALANCE_DEADBAND_KW: f64 = 0.1;
/// Export is credited at this fraction of the purchase tariff.
const EXPORT_CREDIT_FACTOR: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Charge,
    Discharge,
    Idle,
}

/// Full simulation output: the response block plus the hourly series.
#[derive(Debug, Clone)]
pub struct BessSimulation {
    pub summary: BessSummary,
    /// State of charge per hour (0-1)
    pub soc_series: Vec<f64>,
    /// Battery power per hour, positive = charging (kW)
    pub battery_kw_series: Vec<f64>,
    /// Grid power per hour, positive = purchase (kW)
    pub grid_kw_series: Vec<f64>,
}

/// Tariff in force at an hour of the day, as the dispatcher sees it.
///
/// White resolves the peak window and the fixed intermediate windows
/// (16-18 h and 21-22 h); the other modalities dispatch on off-peak.
pub fn tariff_at_hour(tariff: &Tariff, hour_of_day: u32) -> f64 {
    match tariff.kind {
        TariffKind::White => {
            if let (Some(start), Some(end)) = (tariff.peak_start, tariff.peak_end) {
                use chrono::Timelike;
                let (sh, eh) = (start.hour(), end.hour());
                if sh <= hour_of_day && hour_of_day < eh {
                    return tariff.peak_kwh;
                }
            }
            if let Some(intermediate) = tariff.intermediate_kwh {
                if (16..18).contains(&hour_of_day) || (21..22).contains(&hour_of_day) {
                    return intermediate;
                }
            }
            tariff.off_peak_kwh
        }
        TariffKind::Conventional | TariffKind::Green | TariffKind::Blue => {
            if tariff.off_peak_kwh > 0.0 {
                tariff.off_peak_kwh
            } else {
                tariff.peak_kwh
            }
        }
    }
}

/// Simulates a full year of operation (one step per hour).
///
/// `pv_w` and `load_w` are hourly series in W and must share their length.
/// Returns the booked energies, costs with and without the battery, and
/// the hourly trajectories.
pub fn simulate_annual_operation(
    spec: &BessSpec,
    strategy: DispatchStrategy,
    tariff: &Tariff,
    pv_w: &[f64],
    load_w: &[f64],
    peak_shaving_limit_kw: Option<f64>,
) -> Result<BessSimulation> {
    if pv_w.len() != load_w.len() {
        return Err(EngineError::Validation(format!(
            "generation ({}) and load ({}) series lengths differ",
            pv_w.len(),
            load_w.len()
        )));
    }
    spec.validate()?;
    let n_hours = pv_w.len();
    let capacity = spec.capacity_kwh;
    let power = spec.power_kw;
    let (eff_charge, eff_discharge) = spec.split_efficiencies();
    let active = capacity > 0.0 && power > 0.0;

    info!(
        "Starting BESS simulation: {}kWh, {}kW, strategy={:?}",
        capacity, power, strategy
    );

    let mut soc = spec.soc_initial;
    let mut soc_series = Vec::with_capacity(n_hours);
    let mut battery_kw_series = Vec::with_capacity(n_hours);
    let mut grid_kw_series = Vec::with_capacity(n_hours);

    let mut charged_kwh = 0.0;
    let mut discharged_kwh = 0.0;
    let mut losses_kwh = 0.0;
    let mut cost_with = 0.0;
    let mut cost_without = 0.0;
    let mut hours_charging = 0u32;
    let mut hours_discharging = 0u32;
    let mut hours_idle = 0u32;
    let mut soc_sum = 0.0;
    let mut soc_min_seen = f64::MAX;
    let mut soc_max_seen = f64::MIN;

    for hour in 0..n_hours {
        let pv_kw = pv_w[hour] / 1000.0;
        let load_kw = load_w[hour] / 1000.0;
        let hour_of_day = (hour % 24) as u32;
        let rate = tariff_at_hour(tariff, hour_of_day);

        // Positive balance: PV surplus. Negative: deficit.
        let balance_kw = pv_kw - load_kw;

        let action = if !active {
            Action::Idle
        } else {
            decide(
                strategy,
                tariff,
                rate,
                load_kw,
                balance_kw,
                soc,
                spec,
                peak_shaving_limit_kw,
            )
        };

        // Battery power for the hour, positive = charging.
        let mut battery_kw = 0.0;

        match action {
            Action::Charge => {
                // Drawn energy is measured at the battery input, before
                // conversion; the headroom cap is input-side too.
                let cap = power.min((spec.soc_max - soc) * capacity / eff_charge);
                let drawn = if balance_kw > 0.0 {
                    cap.min(balance_kw)
                } else if strategy == DispatchStrategy::Arbitrage {
                    // Arbitrage may charge from the grid.
                    cap
                } else {
                    0.0
                };
                if drawn > 0.0 {
                    let stored = drawn * eff_charge;
                    soc = (soc + stored / capacity).min(spec.soc_max);
                    battery_kw = drawn;
                    charged_kwh += drawn;
                    losses_kwh += drawn - stored;
                    hours_charging += 1;
                } else {
                    hours_idle += 1;
                }
            }
            Action::Discharge => {
                // Deliverable energy after the discharge efficiency.
                let available = (soc - spec.soc_min) * capacity * eff_discharge;
                let cap = power.min(available);
                let delivered = if balance_kw < 0.0 {
                    cap.min(-balance_kw)
                } else if strategy == DispatchStrategy::Arbitrage {
                    cap
                } else {
                    0.0
                };
                if delivered > 0.0 {
                    let withdrawn = delivered / eff_discharge;
                    soc = (soc - withdrawn / capacity).max(spec.soc_min);
                    battery_kw = -delivered;
                    discharged_kwh += delivered;
                    losses_kwh += withdrawn - delivered;
                    hours_discharging += 1;
                } else {
                    hours_idle += 1;
                }
            }
            Action::Idle => {
                hours_idle += 1;
            }
        }

        // grid = load − pv − battery_out + battery_in
        let grid_kw = load_kw - pv_kw + battery_kw;

        // Hourly bill with the battery.
        cost_with += if grid_kw > 0.0 {
            grid_kw * rate
        } else {
            grid_kw * rate * EXPORT_CREDIT_FACTOR
        };
        // Baseline bill, same computation with battery power zero.
        let grid_baseline_kw = load_kw - pv_kw;
        cost_without += if grid_baseline_kw > 0.0 {
            grid_baseline_kw * rate
        } else {
            grid_baseline_kw * rate * EXPORT_CREDIT_FACTOR
        };

        soc_series.push(soc);
        battery_kw_series.push(battery_kw);
        grid_kw_series.push(grid_kw);
        soc_sum += soc;
        soc_min_seen = soc_min_seen.min(soc);
        soc_max_seen = soc_max_seen.max(soc);
    }

    let hours = n_hours.max(1) as f64;
    let soc_mean = soc_sum / hours;
    let observed_roundtrip = if charged_kwh > 0.0 {
        discharged_kwh / charged_kwh
    } else {
        0.0
    };
    let equivalent_cycles = if capacity > 0.0 {
        (charged_kwh + discharged_kwh) / (2.0 * capacity)
    } else {
        0.0
    };
    let utilization_pct = f64::from(hours_charging + hours_discharging) / hours * 100.0;
    let annual_savings = cost_without - cost_with;

    info!(
        "BESS simulation done: {:.1} cycles, savings R$ {:.2}, utilization {:.1}%",
        equivalent_cycles, annual_savings, utilization_pct
    );

    Ok(BessSimulation {
        summary: BessSummary {
            capacity_kwh: capacity,
            power_kw: power,
            charged_kwh,
            discharged_kwh,
            losses_kwh,
            observed_roundtrip,
            equivalent_cycles,
            estimated_degradation_pct: equivalent_cycles * 0.01,
            soc_mean_pct: soc_mean * 100.0,
            soc_min_pct: if n_hours > 0 { soc_min_seen * 100.0 } else { 0.0 },
            soc_max_pct: if n_hours > 0 { soc_max_seen * 100.0 } else { 0.0 },
            dod_mean: 1.0 - soc_mean,
            utilization_pct,
            hours_charging,
            hours_discharging,
            hours_idle,
            cost_without_bess: cost_without,
            cost_with_bess: cost_with,
            annual_savings,
        },
        soc_series,
        battery_kw_series,
        grid_kw_series,
    })
}

#[allow(clippy::too_many_arguments)]
fn decide(
    strategy: DispatchStrategy,
    tariff: &Tariff,
    rate: f64,
    load_kw: f64,
    balance_kw: f64,
    soc: f64,
    spec: &BessSpec,
    peak_shaving_limit_kw: Option<f64>,
) -> Action {
    let can_charge = soc < spec.soc_max - SOC_MARGIN;
    let can_discharge = soc > spec.soc_min + SOC_MARGIN;

    match strategy {
        DispatchStrategy::Arbitrage => {
            let mean_rate = (tariff.peak_kwh + tariff.off_peak_kwh) / 2.0;
            if rate < mean_rate && can_charge {
                Action::Charge
            } else if rate >= mean_rate && can_discharge {
                Action::Discharge
            } else {
                Action::Idle
            }
        }
        DispatchStrategy::PeakShaving => {
            if peak_shaving_limit_kw.is_some_and(|limit| load_kw > limit) {
                if can_discharge {
                    Action::Discharge
                } else {
                    Action::Idle
                }
            } else if balance_kw > 0.0 && can_charge {
                Action::Charge
            } else {
                Action::Idle
            }
        }
        DispatchStrategy::SelfConsumption => {
            if balance_kw > BALANCE_DEADBAND_KW && can_charge {
                Action::Charge
            } else if balance_kw < -BALANCE_DEADBAND_KW && can_discharge {
                Action::Discharge
            } else {
                Action::Idle
            }
        }
        DispatchStrategy::Custom => Action::Idle,
    }
}
