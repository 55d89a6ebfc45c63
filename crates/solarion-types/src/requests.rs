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

//! Request DTOs consumed from the external HTTP layer.

use crate::bess::{BessSpec, DispatchStrategy};
use crate::consumption::ConsumptionProfile;
use crate::financial::{ConnectionType, EconomicInput, FioBSchedule, RemoteAllocation};
use crate::inverter::Inverter;
use crate::irradiance::{DecompositionModel, TranspositionModel};
use crate::module::PvModule;
use crate::plane::RoofPlane;
use crate::tariff::Tariff;
use crate::weather::WeatherSource;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// Site block: coordinate plus weather-source preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteRequest {
    pub latitude: f64,
    pub longitude: f64,
    /// Preferred source; the configured default applies when omitted
    pub source: Option<WeatherSource>,
    /// Whether the other source may be tried when the preferred one fails
    #[serde(default = "default_true")]
    pub allow_fallback: bool,
}

/// System-level loss budget, applied once at the AC post-clip stage.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LossesSpec {
    /// Soiling losses (percent)
    #[serde(default)]
    pub soiling_pct: f64,
    /// Shading losses (percent)
    #[serde(default)]
    pub shading_pct: f64,
    /// Module mismatch losses (percent)
    #[serde(default)]
    pub mismatch_pct: f64,
    /// DC/AC wiring losses (percent)
    #[serde(default)]
    pub wiring_pct: f64,
    /// Anything else (percent)
    #[serde(default)]
    pub other_pct: f64,
}

impl LossesSpec {
    /// Common Brazilian default, the 4.5 % budget of the reference sizing.
    pub fn typical() -> Self {
        Self {
            soiling_pct: 2.0,
            shading_pct: 0.0,
            mismatch_pct: 1.0,
            wiring_pct: 1.0,
            other_pct: 0.5,
        }
    }

    pub fn total_pct(&self) -> f64 {
        self.soiling_pct + self.shading_pct + self.mismatch_pct + self.wiring_pct + self.other_pct
    }

    /// Multiplicative AC factor, `1 − Σ losses/100`.
    pub fn ac_factor(&self) -> f64 {
        (1.0 - self.total_pct() / 100.0).max(0.0)
    }
}

/// Full PV-plant description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PvSystemRequest {
    pub site: SiteRequest,
    pub planes: Vec<RoofPlane>,
    pub module: PvModule,
    pub inverters: Vec<Inverter>,
    #[serde(default)]
    pub losses: LossesSpec,
    pub consumption: ConsumptionProfile,
    pub tariff: Tariff,
    #[serde(default)]
    pub decomposition: DecompositionModel,
    #[serde(default)]
    pub transposition: TranspositionModel,
}

/// BESS block of the hybrid request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BessSystemRequest {
    pub spec: BessSpec,
    pub strategy: DispatchStrategy,
    /// Demand limit for the peak-shaving strategy (kW)
    pub peak_shaving_limit_kw: Option<f64>,
    /// Battery cost (R$/kWh)
    pub capex_per_kwh: f64,
    /// Converter cost (R$/kW)
    pub capex_per_kw: f64,
    /// Fixed installation cost (R$)
    #[serde(default)]
    pub installation_cost: f64,
}

impl BessSystemRequest {
    /// Total BESS investment (R$).
    pub fn capex(&self) -> f64 {
        self.spec.capacity_kwh * self.capex_per_kwh
            + self.spec.power_kw * self.capex_per_kw
            + self.installation_cost
    }
}

/// Top-level hybrid dimensioning request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HybridDimensioningRequest {
    pub pv: PvSystemRequest,
    pub bess: BessSystemRequest,
    pub economics: EconomicInput,
    /// Include the 8760-point series block in the response
    #[serde(default)]
    pub include_series: bool,
}

fn default_startyear() -> i32 {
    2015
}

fn default_endyear() -> i32 {
    2020
}

/// Irradiation analysis request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrradiationAnalysisRequest {
    pub latitude: f64,
    pub longitude: f64,
    /// Plane tilt; 0 together with azimuth 0 analyses the horizontal GHI
    #[serde(default)]
    pub tilt_deg: f64,
    #[serde(default)]
    pub azimuth_deg: f64,
    #[serde(default)]
    pub decomposition: DecompositionModel,
    #[serde(default)]
    pub transposition: TranspositionModel,
    pub source: Option<WeatherSource>,
    #[serde(default = "default_true")]
    pub allow_fallback: bool,
    #[serde(default = "default_startyear")]
    pub startyear: i32,
    #[serde(default = "default_endyear")]
    pub endyear: i32,
}

/// MPPT sizing-check request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MpptSizingRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub module: PvModule,
    pub inverter: Inverter,
    pub source: Option<WeatherSource>,
    #[serde(default = "default_true")]
    pub allow_fallback: bool,
}

/// Group B financial request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupBFinancialRequest {
    /// Monthly generation, January first (kWh)
    pub generation_monthly_kwh: [f64; 12],
    /// Monthly local consumption (kWh)
    pub consumption_monthly_kwh: [f64; 12],
    /// Full local tariff (R$/kWh)
    pub tariff_kwh: f64,
    /// Fio-B component of the local tariff (R$/kWh)
    pub fio_b_kwh: f64,
    pub fio_b_schedule: FioBSchedule,
    #[serde(default)]
    pub connection: ConnectionType,
    #[serde(default = "RemoteAllocation::local_only")]
    pub remotes: RemoteAllocation,
    pub economics: EconomicInput,
}

/// Group A (Green local unit) financial request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupAFinancialRequest {
    /// Monthly generation, January first (kWh)
    pub generation_monthly_kwh: [f64; 12],
    /// Monthly local off-peak consumption (kWh)
    pub consumption_off_peak_kwh: [f64; 12],
    /// Monthly local peak consumption (kWh)
    pub consumption_peak_kwh: [f64; 12],
    /// Full off-peak tariff, TE + TUSD (R$/kWh)
    pub tariff_off_peak_kwh: f64,
    /// Full peak tariff, TE + TUSD (R$/kWh)
    pub tariff_peak_kwh: f64,
    /// Energy component, off-peak (R$/kWh)
    pub te_off_peak: f64,
    /// Energy component, peak (R$/kWh)
    pub te_peak: f64,
    pub fio_b_schedule: FioBSchedule,
    #[serde(default = "RemoteAllocation::local_only")]
    pub remotes: RemoteAllocation,
    pub economics: EconomicInput,
}

impl GroupAFinancialRequest {
    /// Credits-to-peak factor of the generating unit.
    pub fn peak_adjustment_factor(&self) -> f64 {
        if self.te_off_peak > 0.0 {
            self.te_peak / self.te_off_peak
        } else {
            1.0
        }
    }

    pub fn tusd_off_peak(&self) -> f64 {
        (self.tariff_off_peak_kwh - self.te_off_peak).max(0.0)
    }

    pub fn tusd_peak(&self) -> f64 {
        (self.tariff_peak_kwh - self.te_peak).max(0.0)
    }
}
