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

/// GHI → (DNI, DHI) decomposition model. Closed set; unknown strings are a
/// validation error at the request boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DecompositionModel {
    #[default]
    Erbs,
    Disc,
    Dirint,
    Louche,
}

impl DecompositionModel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Erbs => "erbs",
            Self::Disc => "disc",
            Self::Dirint => "dirint",
            Self::Louche => "louche",
        }
    }
}

/// Sky model for the plane-of-array transposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TranspositionModel {
    #[default]
    Perez,
    Isotropic,
    HayDavies,
}

impl TranspositionModel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Perez => "perez",
            Self::Isotropic => "isotropic",
            Self::HayDavies => "hay-davies",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(DecompositionModel::default(), DecompositionModel::Erbs);
        assert_eq!(TranspositionModel::default(), TranspositionModel::Perez);
    }

    #[test]
    fn test_unknown_model_rejected() {
        assert!(serde_json::from_str::<DecompositionModel>("\"boland\"").is_err());
        let m: TranspositionModel = serde_json::from_str("\"hay-davies\"").unwrap();
        assert_eq!(m, TranspositionModel::HayDavies);
    }
}
