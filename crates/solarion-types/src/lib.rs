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

pub mod bess;
pub mod consumption;
pub mod error;
pub mod financial;
pub mod geo;
pub mod inverter;
pub mod irradiance;
pub mod module;
pub mod plane;
pub mod requests;
pub mod responses;
pub mod tariff;
pub mod weather;

// Re-export common types for convenience
pub use bess::{BatteryChemistry, BessSpec, DispatchStrategy};
pub use consumption::ConsumptionProfile;
pub use error::{EngineError, Result};
pub use financial::{
    CashFlowRow, ConnectionType, EconomicInput, FinancialResult, FioBSchedule, RemoteAllocation,
    RemoteUnitA, RemoteUnitB, ScenarioAnalysis, ScenarioResult, SensitivityAnalysis,
    SensitivityPoint,
};
pub use geo::Coordinate;
pub use inverter::{Inverter, SandiaInverterParams};
pub use irradiance::{DecompositionModel, TranspositionModel};
pub use module::{PvModule, SapmThermalParams, SingleDiodeParams};
pub use plane::RoofPlane;
pub use requests::{
    BessSystemRequest, GroupAFinancialRequest, GroupBFinancialRequest, HybridDimensioningRequest,
    IrradiationAnalysisRequest, LossesSpec, MpptSizingRequest, PvSystemRequest, SiteRequest,
};
pub use responses::{
    BessSummary, HybridAnalysis, HybridDimensioningResponse, IrradiationAnalysisResponse,
    MpptSizingResult, PvSystemSummary,
};
pub use tariff::{Tariff, TariffKind};
pub use weather::{WeatherFrame, WeatherSource};
