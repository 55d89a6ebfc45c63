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

//! Response DTOs. The three hybrid top-level blocks keep the upstream
//! contract names (`sistema_solar`, `sistema_bess`, `analise_hibrida`).

use crate::irradiance::{DecompositionModel, TranspositionModel};
use crate::weather::WeatherSource;
use serde::{Deserialize, Serialize};

/// Per-MPPT (roof-plane) simulation breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaneResult {
    pub plane_id: String,
    pub inverter_id: String,
    pub mppt_index: u32,
    pub tilt_deg: f64,
    pub azimuth_deg: f64,
    pub module_count: u32,
    /// DC nameplate of the plane (W)
    pub dc_nameplate_w: f64,
    /// Annual DC energy before conversion (kWh)
    pub dc_annual_kwh: f64,
    /// Mean daily plane-of-array irradiation (kWh/m²/day)
    pub poa_daily_mean_kwh_m2: f64,
}

/// Per-inverter aggregation result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InverterResult {
    pub inverter_id: String,
    pub p_aco_w: f64,
    pub plane_ids: Vec<String>,
    pub module_count: u32,
    pub dc_nameplate_w: f64,
    /// Annual DC input (kWh)
    pub dc_annual_kwh: f64,
    /// Annual AC before clipping (kWh)
    pub ac_pre_clip_kwh: f64,
    /// Annual AC after clipping (kWh)
    pub ac_post_clip_kwh: f64,
    /// Annual AC after the system-loss factor (kWh)
    pub ac_final_kwh: f64,
    /// Performance ratio, AC_final / DC_total (percent)
    pub performance_ratio_pct: f64,
    /// Fraction of hours clipped (percent)
    pub clipping_pct: f64,
    /// DC/AC oversizing (percent)
    pub oversizing_pct: f64,
}

/// The `sistema_solar` response block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PvSystemSummary {
    /// Total DC nameplate (kWp)
    pub power_kwp: f64,
    /// Annual energy after losses (kWh/year, mean over the data years)
    pub annual_energy_kwh: f64,
    /// Monthly generation, January first (kWh)
    pub monthly_generation_kwh: [f64; 12],
    /// Annual DC energy (kWh)
    pub dc_annual_kwh: f64,
    /// Annual AC before clipping (kWh)
    pub ac_pre_clip_kwh: f64,
    /// Annual AC after clipping (kWh)
    pub ac_post_clip_kwh: f64,
    /// System performance ratio (percent)
    pub performance_ratio_pct: f64,
    /// Specific yield (kWh/kWp/year)
    pub specific_yield: f64,
    /// Capacity factor (percent)
    pub capacity_factor_pct: f64,
    pub by_plane: Vec<PlaneResult>,
    pub by_inverter: Vec<InverterResult>,
    /// Calendar years of weather data behind the simulation
    pub data_years: Vec<i32>,
    /// Source that actually served the weather data
    pub weather_source: WeatherSource,
    /// Non-fatal quality flags (PR range, clipping, energy per module)
    pub warnings: Vec<String>,
}

/// The `sistema_bess` response block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BessSummary {
    pub capacity_kwh: f64,
    pub power_kw: f64,
    /// Total energy charged over the year (kWh)
    pub charged_kwh: f64,
    /// Total energy discharged over the year (kWh)
    pub discharged_kwh: f64,
    /// Conversion losses (kWh)
    pub losses_kwh: f64,
    /// Observed round-trip efficiency, discharged / charged
    pub observed_roundtrip: f64,
    /// Equivalent full cycles per year
    pub equivalent_cycles: f64,
    /// Estimated capacity degradation from cycling (percent)
    pub estimated_degradation_pct: f64,
    pub soc_mean_pct: f64,
    pub soc_min_pct: f64,
    pub soc_max_pct: f64,
    /// Mean depth of discharge (0-1)
    pub dod_mean: f64,
    /// Share of hours charging or discharging (percent)
    pub utilization_pct: f64,
    pub hours_charging: u32,
    pub hours_discharging: u32,
    pub hours_idle: u32,
    /// Annual bill without the battery (R$)
    pub cost_without_bess: f64,
    /// Annual bill with the battery (R$)
    pub cost_with_bess: f64,
    /// Annual savings attributable to the battery (R$)
    pub annual_savings: f64,
}

/// Hybrid energy-flow bookkeeping (kWh/year).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyFlows {
    pub pv_generation_kwh: f64,
    pub consumption_kwh: f64,
    pub pv_to_load_kwh: f64,
    pub pv_to_bess_kwh: f64,
    pub pv_to_grid_kwh: f64,
    pub bess_to_load_kwh: f64,
    pub grid_to_load_kwh: f64,
}

/// One line of the four-way scenario comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonEntry {
    pub investment: f64,
    pub annual_savings: f64,
    pub npv: f64,
    pub irr_pct: f64,
    pub payback_years: f64,
}

/// The hybrid-vs-alternatives comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioComparison {
    pub no_system: ComparisonEntry,
    pub solar_only: ComparisonEntry,
    pub bess_only: ComparisonEntry,
    pub hybrid: ComparisonEntry,
    /// NPV advantage of the hybrid over the solar-only flow (R$)
    pub hybrid_vs_solar_npv: f64,
    /// NPV advantage of the hybrid over the BESS-only flow (R$)
    pub hybrid_vs_bess_npv: f64,
}

/// The `analise_hibrida` response block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HybridAnalysis {
    pub flows: EnergyFlows,
    /// (PV→load + BESS→load) / load (percent)
    pub self_sufficiency_pct: f64,
    /// (PV→load + PV→BESS) / PV generated (percent)
    pub solar_self_consumption_pct: f64,
    pub investment_solar: f64,
    pub investment_bess: f64,
    pub investment_total: f64,
    pub npv: f64,
    pub irr_pct: f64,
    pub payback_simple_years: f64,
    pub payback_discounted_years: f64,
    pub lcoe: f64,
    pub comparison: ScenarioComparison,
    pub recommendations: Vec<String>,
    pub alerts: Vec<String>,
}

/// Optional 8760-point series block of the hybrid response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlySeriesBlock {
    pub soc_pct: Vec<f64>,
    /// Battery power, positive = charging (kW)
    pub battery_kw: Vec<f64>,
    /// Grid power, positive = purchase (kW)
    pub grid_kw: Vec<f64>,
    pub pv_kw: Vec<f64>,
    pub load_kw: Vec<f64>,
}

/// Top-level hybrid dimensioning response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HybridDimensioningResponse {
    #[serde(rename = "sistema_solar")]
    pub solar: PvSystemSummary,
    #[serde(rename = "sistema_bess")]
    pub bess: BessSummary,
    #[serde(rename = "analise_hibrida")]
    pub analysis: HybridAnalysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<HourlySeriesBlock>,
}

/// Month extreme for the irradiation analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthExtreme {
    /// kWh/m²/day
    pub value: f64,
    /// Month number, 1-12
    pub month: u32,
}

/// Configuration echo of the irradiation analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrradiationConfiguration {
    pub tilt_deg: f64,
    pub azimuth_deg: f64,
    pub decomposition: DecompositionModel,
    pub transposition: TranspositionModel,
    /// True when the tilted-plane branch was used
    pub tilted_plane: bool,
    /// Source that actually served the data
    pub source: WeatherSource,
}

/// Irradiation analysis response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrradiationAnalysisResponse {
    /// Monthly mean irradiation, January first (kWh/m²/day)
    pub monthly_kwh_m2_day: [f64; 12],
    /// Annual mean (kWh/m²/day)
    pub annual_mean: f64,
    pub maximum: MonthExtreme,
    pub minimum: MonthExtreme,
    /// (max − min) / mean × 100 (percent)
    pub seasonal_variation_pct: f64,
    pub configuration: IrradiationConfiguration,
    /// Hours of data behind the analysis
    pub record_count: usize,
}

/// MPPT sizing-check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MpptSizingResult {
    /// Historical minimum ambient temperature used (°C)
    pub t_min_c: f64,
    /// Cold open-circuit voltage (V)
    pub v_oc_cold: f64,
    /// Admissible modules per MPPT
    pub modules_per_mppt: u32,
    /// Admissible modules per string
    pub modules_per_string: u32,
    /// Admissible total for the inverter
    pub modules_total: u32,
    /// Which bound decided: "voltage" or "power"
    pub limiting_factor: String,
    /// DC/AC ratio at the admissible maximum (percent)
    pub oversizing_pct: f64,
    pub warnings: Vec<String>,
}
