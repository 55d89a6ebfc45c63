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

/// Monthly consumption with an optional daily shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumptionProfile {
    /// Twelve monthly totals, January first (kWh)
    pub monthly_kwh: [f64; 12],
    /// Optional 24-value daily shape in percent of daily energy per hour.
    /// Must sum to 100 ± 1 when present.
    pub hourly_shape_pct: Option<[f64; 24]>,
}

impl ConsumptionProfile {
    pub fn flat(monthly_kwh: f64) -> Self {
        Self {
            monthly_kwh: [monthly_kwh; 12],
            hourly_shape_pct: None,
        }
    }

    pub fn annual_kwh(&self) -> f64 {
        self.monthly_kwh.iter().sum()
    }

    pub fn validate(&self) -> Result<()> {
        if self.monthly_kwh.iter().any(|v| *v < 0.0 || !v.is_finite()) {
            return Err(EngineError::Validation(
                "monthly consumption must be non-negative and finite".into(),
            ));
        }
        if let Some(shape) = &self.hourly_shape_pct {
            if shape.iter().any(|v| *v < 0.0 || !v.is_finite()) {
                return Err(EngineError::Validation(
                    "hourly shape values must be non-negative and finite".into(),
                ));
            }
            let total: f64 = shape.iter().sum();
            if (total - 100.0).abs() > 1.0 {
                return Err(EngineError::Validation(format!(
                    "hourly shape must sum to 100% ± 1%, got {total:.2}%"
                )));
            }
        }
        Ok(())
    }
}
