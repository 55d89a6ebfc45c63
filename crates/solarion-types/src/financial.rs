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

//! Financial-engine data model: Fio-B schedule, remote-consumption
//! allocation, economic assumptions, cash flow and result shapes.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fio-B phase-in schedule of Law 14.300/2022.
///
/// Maps calendar year to the non-compensated fraction in [0, 1]. Years past
/// the last mapped entry inherit the last value; years before the first
/// entry use the first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FioBSchedule {
    /// Calendar year of simulation year 1
    pub base_year: i32,
    pub schedule: BTreeMap<i32, f64>,
}

impl FioBSchedule {
    /// The standard post-2025 phase-in.
    pub fn law_14300(base_year: i32) -> Self {
        let schedule = BTreeMap::from([
            (2025, 0.45),
            (2026, 0.60),
            (2027, 0.75),
            (2028, 0.90),
        ]);
        Self {
            base_year,
            schedule,
        }
    }

    /// Non-compensated fraction for a calendar year, clamped to the
    /// schedule's edges.
    pub fn noncompensated_fraction(&self, calendar_year: i32) -> f64 {
        if self.schedule.is_empty() {
            return 1.0;
        }
        if let Some(v) = self.schedule.get(&calendar_year) {
            return *v;
        }
        if let Some((_, v)) = self.schedule.range(..calendar_year).next_back() {
            return *v;
        }
        // Before the first mapped year.
        self.schedule.values().next().copied().unwrap_or(1.0)
    }

    /// Calendar year of simulation year `y` (1-based).
    pub fn calendar_year(&self, simulation_year: u32) -> i32 {
        self.base_year + simulation_year as i32 - 1
    }

    pub fn validate(&self) -> Result<()> {
        for (year, frac) in &self.schedule {
            if !(0.0..=1.0).contains(frac) {
                return Err(EngineError::Validation(format!(
                    "Fio-B fraction for {year} must be in [0, 1], got {frac}"
                )));
            }
        }
        Ok(())
    }
}

/// Remote self-consumption unit in Group B.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteUnitB {
    pub enabled: bool,
    /// Share of the credit bank allocated to this unit (percent)
    pub credit_share_pct: f64,
    /// Monthly consumption, January first (kWh)
    pub monthly_kwh: [f64; 12],
    /// Full local tariff at the remote unit (R$/kWh)
    pub tariff_kwh: f64,
    /// Fio-B component at the remote unit (R$/kWh)
    pub fio_b_kwh: f64,
}

impl RemoteUnitB {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            credit_share_pct: 0.0,
            monthly_kwh: [0.0; 12],
            tariff_kwh: 0.0,
            fio_b_kwh: 0.0,
        }
    }
}

/// Remote self-consumption unit in Group A (Green or Blue modality).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteUnitA {
    pub enabled: bool,
    /// Share of the credit bank allocated to this unit (percent)
    pub credit_share_pct: f64,
    /// Monthly off-peak consumption (kWh)
    pub monthly_off_peak_kwh: [f64; 12],
    /// Monthly peak consumption (kWh)
    pub monthly_peak_kwh: [f64; 12],
    /// Full off-peak tariff, TE + TUSD (R$/kWh)
    pub tariff_off_peak_kwh: f64,
    /// Full peak tariff, TE + TUSD (R$/kWh)
    pub tariff_peak_kwh: f64,
    /// Energy component, off-peak (R$/kWh)
    pub te_off_peak: f64,
    /// Energy component, peak (R$/kWh)
    pub te_peak: f64,
}

impl RemoteUnitA {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            credit_share_pct: 0.0,
            monthly_off_peak_kwh: [0.0; 12],
            monthly_peak_kwh: [0.0; 12],
            tariff_off_peak_kwh: 0.0,
            tariff_peak_kwh: 0.0,
            te_off_peak: 0.0,
            te_peak: 0.0,
        }
    }

    /// Peak/off-peak credit-adjustment factor f = TE_peak / TE_off_peak.
    /// Abating 1 kWh of peak consumption burns f kWh of credits.
    pub fn peak_adjustment_factor(&self) -> f64 {
        if self.te_off_peak > 0.0 {
            self.te_peak / self.te_off_peak
        } else {
            1.0
        }
    }

    /// TUSD per band, derived as full tariff minus the energy component.
    pub fn tusd_off_peak(&self) -> f64 {
        (self.tariff_off_peak_kwh - self.te_off_peak).max(0.0)
    }

    pub fn tusd_peak(&self) -> f64 {
        (self.tariff_peak_kwh - self.te_peak).max(0.0)
    }
}

/// Credit allocation across the local unit and the three remote classes.
///
/// Invariant: the enabled shares plus the local share sum to 100 % ± 1 %.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteAllocation {
    /// Share of credits kept at the generating unit (percent)
    pub local_share_pct: f64,
    pub remote_b: RemoteUnitB,
    pub remote_a_green: RemoteUnitA,
    pub remote_a_blue: RemoteUnitA,
}

impl RemoteAllocation {
    pub fn local_only() -> Self {
        Self {
            local_share_pct: 100.0,
            remote_b: RemoteUnitB::disabled(),
            remote_a_green: RemoteUnitA::disabled(),
            remote_a_blue: RemoteUnitA::disabled(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let mut total = self.local_share_pct;
        if self.remote_b.enabled {
            total += self.remote_b.credit_share_pct;
        }
        if self.remote_a_green.enabled {
            total += self.remote_a_green.credit_share_pct;
        }
        if self.remote_a_blue.enabled {
            total += self.remote_a_blue.credit_share_pct;
        }
        if (total - 100.0).abs() > 1.0 {
            return Err(EngineError::Validation(format!(
                "credit shares must sum to 100% ± 1%, got {total:.2}%"
            )));
        }
        Ok(())
    }
}

/// Group B connection type, sets the monthly availability-cost floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionType {
    #[serde(alias = "monofasico")]
    SinglePhase,
    #[serde(alias = "bifasico")]
    TwoPhase,
    #[default]
    #[serde(alias = "trifasico")]
    ThreePhase,
}

impl ConnectionType {
    /// Minimum billed demand in kWh/month.
    pub fn availability_kwh(self) -> f64 {
        match self {
            Self::SinglePhase => 30.0,
            Self::TwoPhase => 50.0,
            Self::ThreePhase => 100.0,
        }
    }
}

fn default_lifetime() -> u32 {
    25
}

fn default_degradation() -> f64 {
    0.5
}

fn default_salvage() -> f64 {
    0.0
}

fn default_simultaneity() -> f64 {
    0.25
}

fn default_capex_per_kwp() -> f64 {
    5_000.0
}

/// Economic assumptions shared by every financial mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomicInput {
    /// Initial investment (R$)
    pub capex: f64,
    /// Project lifetime in years
    #[serde(default = "default_lifetime")]
    pub lifetime_years: u32,
    /// Annual discount rate (percent)
    pub discount_rate_pct: f64,
    /// Annual energy-tariff inflation (percent)
    pub energy_inflation_pct: f64,
    /// Annual O&M inflation (percent)
    pub om_inflation_pct: f64,
    /// Module degradation per year (percent)
    #[serde(default = "default_degradation")]
    pub degradation_pct: f64,
    /// First-year O&M cost (R$)
    pub om_cost_first_year: f64,
    /// Salvage value at end of life, fraction of CAPEX
    #[serde(default = "default_salvage")]
    pub salvage_pct: f64,
    /// Fraction of generation consumed at the instant it is produced
    #[serde(default = "default_simultaneity")]
    pub simultaneity_factor: f64,
    /// Solar CAPEX per installed kWp, hybrid sizing only (R$/kWp)
    #[serde(default = "default_capex_per_kwp")]
    pub solar_capex_per_kwp: f64,
}

impl EconomicInput {
    pub fn validate(&self) -> Result<()> {
        if self.capex <= 0.0 {
            return Err(EngineError::Validation("CAPEX must be positive".into()));
        }
        if self.lifetime_years == 0 || self.lifetime_years > 99 {
            return Err(EngineError::Validation(
                "lifetime must be between 1 and 99 years".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.simultaneity_factor) {
            return Err(EngineError::Validation(
                "simultaneity factor must be in [0, 1]".into(),
            ));
        }
        if self.degradation_pct < 0.0 || self.degradation_pct >= 100.0 {
            return Err(EngineError::Validation(
                "degradation must be in [0, 100) percent".into(),
            ));
        }
        Ok(())
    }
}

/// One row of the yearly cash flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowRow {
    pub year: u32,
    /// Nominal flow of the year (R$); year 0 is −CAPEX
    pub nominal: f64,
    pub cumulative_nominal: f64,
    /// Flow discounted to present value (R$)
    pub discounted: f64,
    pub cumulative_discounted: f64,
    /// Energy generated in the year (kWh)
    pub generation_kwh: f64,
    /// Gross savings before O&M (R$)
    pub savings: f64,
    /// O&M cost of the year (R$)
    pub om_cost: f64,
}

/// Result of one scenario run (reduced indicator set).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub npv: f64,
    pub irr_pct: f64,
    pub payback_years: f64,
}

/// Base + three perturbed scenarios.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioAnalysis {
    pub base: ScenarioResult,
    #[serde(rename = "otimista")]
    pub optimistic: ScenarioResult,
    #[serde(rename = "conservador")]
    pub conservative: ScenarioResult,
    #[serde(rename = "pessimista")]
    pub pessimistic: ScenarioResult,
}

/// One point of a sensitivity sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityPoint {
    /// The swept parameter value (tariff, inflation pp or discount pp)
    pub parameter: f64,
    pub npv: f64,
}

/// NPV sensitivity to tariff, inflation and discount-rate perturbations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityAnalysis {
    pub tariff: Vec<SensitivityPoint>,
    pub inflation: Vec<SensitivityPoint>,
    pub discount: Vec<SensitivityPoint>,
}

/// Full financial result of one mode run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialResult {
    /// Net present value (R$)
    pub npv: f64,
    /// Internal rate of return (percent)
    pub irr_pct: f64,
    /// Simple payback (years, capped at 99)
    pub payback_simple_years: f64,
    /// Discounted payback (years, capped at 99)
    pub payback_discounted_years: f64,
    /// Levelised cost of energy (R$/kWh)
    pub lcoe: f64,
    /// (NPV + CAPEX) / CAPEX
    pub profitability_index: f64,
    pub cash_flow: Vec<CashFlowRow>,
    pub scenarios: ScenarioAnalysis,
    pub sensitivity: SensitivityAnalysis,
    /// Non-fatal notes: IRR fallback, sanitised outputs, …
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fio_b_schedule_clamps_to_edges() {
        let s = FioBSchedule::law_14300(2025);
        assert_eq!(s.noncompensated_fraction(2025), 0.45);
        assert_eq!(s.noncompensated_fraction(2027), 0.75);
        // Past the last key: inherit the last value.
        assert_eq!(s.noncompensated_fraction(2035), 0.90);
        // Before the first key: the first value.
        assert_eq!(s.noncompensated_fraction(2020), 0.45);
    }

    #[test]
    fn test_fio_b_calendar_year() {
        let s = FioBSchedule::law_14300(2025);
        assert_eq!(s.calendar_year(1), 2025);
        assert_eq!(s.calendar_year(4), 2028);
    }

    #[test]
    fn test_fio_b_fraction_monotone_within_schedule() {
        let s = FioBSchedule::law_14300(2025);
        let mut last = 0.0;
        for year in 2025..=2035 {
            let frac = s.noncompensated_fraction(year);
            assert!(frac >= last, "fraction decreased at {year}");
            last = frac;
        }
    }

    #[test]
    fn test_allocation_shares_must_close() {
        let mut alloc = RemoteAllocation::local_only();
        assert!(alloc.validate().is_ok());

        alloc.local_share_pct = 60.0;
        alloc.remote_b = RemoteUnitB {
            enabled: true,
            credit_share_pct: 40.0,
            monthly_kwh: [100.0; 12],
            tariff_kwh: 0.90,
            fio_b_kwh: 0.25,
        };
        assert!(alloc.validate().is_ok());

        alloc.remote_b.credit_share_pct = 55.0;
        assert!(alloc.validate().is_err());
    }

    #[test]
    fn test_peak_adjustment_factor() {
        let mut unit = RemoteUnitA::disabled();
        unit.te_peak = 0.55158;
        unit.te_off_peak = 0.34334;
        let f = unit.peak_adjustment_factor();
        assert!((f - 1.6065).abs() < 1e-3);
    }

    #[test]
    fn test_availability_floor() {
        assert_eq!(ConnectionType::SinglePhase.availability_kwh(), 30.0);
        assert_eq!(ConnectionType::ThreePhase.availability_kwh(), 100.0);
    }
}
