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
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Brazilian tariff modality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TariffKind {
    /// Low-voltage flat tariff
    #[serde(alias = "convencional")]
    Conventional,
    /// Low-voltage time-of-use tariff ("tarifa branca")
    #[serde(alias = "branca")]
    White,
    /// Group A with a single demand contract
    #[serde(alias = "verde")]
    Green,
    /// Group A with peak/off-peak demand contracts
    #[serde(alias = "azul")]
    Blue,
}

/// Energy tariff with its time-of-use bands.
///
/// Prices are R$/kWh. The peak window is a pair of time-of-day values;
/// outside White the window only matters when peak pricing is defined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tariff {
    pub kind: TariffKind,
    /// Peak-band energy price (R$/kWh)
    pub peak_kwh: f64,
    /// Intermediate-band price, White only (R$/kWh)
    pub intermediate_kwh: Option<f64>,
    /// Off-peak energy price (R$/kWh)
    pub off_peak_kwh: f64,
    /// Peak window start, e.g. 18:00
    pub peak_start: Option<NaiveTime>,
    /// Peak window end (exclusive), e.g. 21:00
    pub peak_end: Option<NaiveTime>,
    /// Demand charge, peak band (R$/kW)
    pub demand_peak_kw: Option<f64>,
    /// Demand charge, off-peak band (R$/kW)
    pub demand_off_peak_kw: Option<f64>,
}

impl Tariff {
    pub fn validate(&self) -> Result<()> {
        if self.peak_kwh < 0.0 || self.off_peak_kwh < 0.0 {
            return Err(EngineError::Validation(
                "tariff prices must be non-negative".into(),
            ));
        }
        if self.kind == TariffKind::White && (self.peak_start.is_none() || self.peak_end.is_none())
        {
            return Err(EngineError::Validation(
                "white tariff requires a peak window".into(),
            ));
        }
        Ok(())
    }

    /// Weighted mean price over a day, used by the hybrid baseline.
    /// White assumes 3 h peak, 2 h intermediate, 19 h off-peak.
    pub fn daily_mean_kwh(&self) -> f64 {
        match self.kind {
            TariffKind::White => {
                let intermediate = self.intermediate_kwh.unwrap_or(self.off_peak_kwh);
                (self.peak_kwh * 3.0 + intermediate * 2.0 + self.off_peak_kwh * 19.0) / 24.0
            }
            TariffKind::Conventional | TariffKind::Green | TariffKind::Blue => {
                if self.off_peak_kwh > 0.0 {
                    self.off_peak_kwh
                } else {
                    self.peak_kwh
                }
            }
        }
    }
}
