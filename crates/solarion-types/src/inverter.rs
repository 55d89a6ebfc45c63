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

use serde::{Deserialize, Serialize};

/// Sandia inverter model coefficients, when the catalogue provides them.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SandiaInverterParams {
    /// DC voltage at nominal operation (V)
    pub v_dco: Option<f64>,
    /// Power-on threshold (W)
    pub p_so: Option<f64>,
    pub c0: Option<f64>,
    pub c1: Option<f64>,
    pub c2: Option<f64>,
    pub c3: Option<f64>,
    /// Night tare loss (W)
    pub p_nt: Option<f64>,
}

/// One inverter model with its MPPT topology.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inverter {
    /// Unique ID for this inverter within the request
    pub id: String,
    #[serde(default)]
    pub manufacturer: String,
    #[serde(default)]
    pub model: String,

    /// AC nameplate output (W)
    pub p_aco_w: f64,
    /// Maximum DC input power (W); falls back to `p_aco_w` in sizing
    pub p_dc_max_w: Option<f64>,
    /// Number of MPPT channels
    pub mppt_count: u32,
    /// Strings each MPPT accepts
    pub strings_per_mppt: u32,
    /// Maximum input current per MPPT (A)
    pub max_input_current_a: f64,
    /// MPPT operating window lower bound (V)
    pub v_mppt_min: f64,
    /// MPPT operating window upper bound (V)
    pub v_mppt_max: f64,
    /// Nominal DC→AC conversion efficiency (0-1); 0.98 when omitted
    pub efficiency: Option<f64>,

    #[serde(default)]
    pub sandia: SandiaInverterParams,
}

impl Inverter {
    /// Nominal conversion efficiency used by the aggregator.
    pub fn nominal_efficiency(&self) -> f64 {
        self.efficiency.unwrap_or(0.98)
    }

    /// DC power limit used by the sizing check: `p_dc_max_w` when supplied,
    /// otherwise the AC nameplate.
    pub fn dc_power_limit_w(&self) -> f64 {
        self.p_dc_max_w.unwrap_or(self.p_aco_w)
    }
}
