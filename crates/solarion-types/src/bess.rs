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

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// Battery chemistry, informational for degradation reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BatteryChemistry {
    #[default]
    LithiumIon,
    Lfp,
    LeadAcid,
}

/// Dispatch strategy tag. Unknown strings fail request validation;
/// `Custom` is a recognised no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStrategy {
    #[serde(alias = "arbitragem")]
    Arbitrage,
    PeakShaving,
    #[serde(alias = "auto_consumo")]
    SelfConsumption,
    Custom,
}

/// Battery energy storage system specification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BessSpec {
    /// Usable nominal capacity (kWh)
    pub capacity_kwh: f64,
    /// Converter power rating (kW)
    pub power_kw: f64,
    #[serde(default)]
    pub chemistry: BatteryChemistry,
    /// Round-trip efficiency (0-1); charge × discharge
    pub roundtrip_efficiency: f64,
    /// Charge efficiency; √roundtrip when omitted
    pub charge_efficiency: Option<f64>,
    /// Discharge efficiency; √roundtrip when omitted
    pub discharge_efficiency: Option<f64>,
    /// Minimum state of charge (0-1)
    pub soc_min: f64,
    /// Maximum state of charge (0-1)
    pub soc_max: f64,
    /// Initial state of charge (0-1)
    pub soc_initial: f64,
    /// Maximum depth of discharge (0-1)
    pub dod_max: f64,
}

impl BessSpec {
    /// Charge/discharge efficiency pair; the split defaults to √η_rt each
    /// so that their product recovers the round-trip figure.
    pub fn split_efficiencies(&self) -> (f64, f64) {
        match (self.charge_efficiency, self.discharge_efficiency) {
            (Some(c), Some(d)) => (c, d),
            _ => {
                let each = self.roundtrip_efficiency.sqrt();
                (each, each)
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity_kwh < 0.0 || self.power_kw < 0.0 {
            return Err(EngineError::Validation(
                "BESS capacity and power must be non-negative".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.roundtrip_efficiency) || self.roundtrip_efficiency == 0.0 {
            return Err(EngineError::Validation(
                "roundtrip efficiency must be in (0, 1]".into(),
            ));
        }
        for (name, v) in [
            ("soc_min", self.soc_min),
            ("soc_max", self.soc_max),
            ("soc_initial", self.soc_initial),
            ("dod_max", self.dod_max),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(EngineError::Validation(format!(
                    "{name} must be in [0, 1], got {v}"
                )));
            }
        }
        if self.soc_min >= self.soc_max {
            return Err(EngineError::Validation(
                "soc_min must be less than soc_max".into(),
            ));
        }
        if self.soc_initial < self.soc_min || self.soc_initial > self.soc_max {
            return Err(EngineError::Validation(
                "soc_initial must lie within [soc_min, soc_max]".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub fn spec() -> BessSpec {
        BessSpec {
            capacity_kwh: 100.0,
            power_kw: 50.0,
            chemistry: BatteryChemistry::LithiumIon,
            roundtrip_efficiency: 0.90,
            charge_efficiency: None,
            discharge_efficiency: None,
            soc_min: 0.10,
            soc_max: 1.00,
            soc_initial: 0.50,
            dod_max: 0.90,
        }
    }

    #[test]
    fn test_split_efficiencies_recover_roundtrip() {
        let (c, d) = spec().split_efficiencies();
        assert!((c * d - 0.90).abs() < 1e-12);
        assert!((c - d).abs() < 1e-12);
    }

    #[test]
    fn test_explicit_split_wins() {
        let mut s = spec();
        s.charge_efficiency = Some(0.97);
        s.discharge_efficiency = Some(0.93);
        assert_eq!(s.split_efficiencies(), (0.97, 0.93));
    }

    #[test]
    fn test_soc_bounds_checked() {
        let mut s = spec();
        s.soc_min = 0.95;
        s.soc_max = 0.90;
        assert!(s.validate().is_err());

        let mut s = spec();
        s.soc_initial = 0.05;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_strategy_aliases() {
        let s: DispatchStrategy = serde_json::from_str("\"arbitragem\"").unwrap();
        assert_eq!(s, DispatchStrategy::Arbitrage);
        let s: DispatchStrategy = serde_json::from_str("\"peak_shaving\"").unwrap();
        assert_eq!(s, DispatchStrategy::PeakShaving);
        assert!(serde_json::from_str::<DispatchStrategy>("\"fancy\"").is_err());
    }
}
