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

//! Structural validation of the hybrid dimensioning request. Every
//! failure here maps to a 400 at the external routing layer.

use solarion_types::bess::DispatchStrategy;
use solarion_types::error::{EngineError, Result};
use solarion_types::geo::Coordinate;
use solarion_types::requests::HybridDimensioningRequest;
use std::collections::HashSet;

pub fn validate_hybrid_request(request: &HybridDimensioningRequest) -> Result<()> {
    let pv = &request.pv;

    Coordinate::new(pv.site.latitude, pv.site.longitude)?;

    if pv.planes.is_empty() {
        return Err(EngineError::Validation(
            "at least one roof plane is required".into(),
        ));
    }
    if pv.inverters.is_empty() {
        return Err(EngineError::Validation(
            "at least one inverter is required".into(),
        ));
    }

    if pv.module.power_stc_w <= 0.0 {
        return Err(EngineError::Validation(
            "module STC power must be positive".into(),
        ));
    }
    if pv.module.v_oc_stc <= 0.0 || pv.module.i_sc_stc <= 0.0 {
        return Err(EngineError::Validation(
            "module Voc and Isc must be positive".into(),
        ));
    }

    let mut inverter_ids = HashSet::new();
    for inverter in &pv.inverters {
        if inverter.id.is_empty() {
            return Err(EngineError::Validation("inverter has an empty id".into()));
        }
        if !inverter_ids.insert(inverter.id.as_str()) {
            return Err(EngineError::Validation(format!(
                "duplicate inverter id '{}'",
                inverter.id
            )));
        }
        if inverter.p_aco_w <= 0.0 {
            return Err(EngineError::Validation(format!(
                "inverter '{}' AC nameplate must be positive",
                inverter.id
            )));
        }
        if inverter.mppt_count == 0 {
            return Err(EngineError::Validation(format!(
                "inverter '{}' must expose at least one MPPT",
                inverter.id
            )));
        }
        if let Some(eff) = inverter.efficiency {
            if !(0.0..=1.0).contains(&eff) || eff == 0.0 {
                return Err(EngineError::Validation(format!(
                    "inverter '{}' efficiency must be in (0, 1]",
                    inverter.id
                )));
            }
        }
    }

    // The (inverter, MPPT) pair is unique across planes of one system.
    let mut mppt_assignments = HashSet::new();
    for plane in &pv.planes {
        if !(0.0..=90.0).contains(&plane.tilt_deg) {
            return Err(EngineError::Validation(format!(
                "plane '{}' tilt {} outside [0, 90]",
                plane.id, plane.tilt_deg
            )));
        }
        if !(0.0..360.0).contains(&plane.azimuth_deg) {
            return Err(EngineError::Validation(format!(
                "plane '{}' azimuth {} outside [0, 360)",
                plane.id, plane.azimuth_deg
            )));
        }
        if plane.modules_per_string == 0 || plane.strings == 0 {
            return Err(EngineError::Validation(format!(
                "plane '{}' needs at least one module per string and one string",
                plane.id
            )));
        }
        let Some(inverter) = pv.inverters.iter().find(|i| i.id == plane.inverter_id) else {
            return Err(EngineError::Validation(format!(
                "plane '{}' references unknown inverter '{}'",
                plane.id, plane.inverter_id
            )));
        };
        if plane.mppt_index == 0 || plane.mppt_index > inverter.mppt_count {
            return Err(EngineError::Validation(format!(
                "plane '{}' MPPT index {} outside 1..={}",
                plane.id, plane.mppt_index, inverter.mppt_count
            )));
        }
        if !mppt_assignments.insert((plane.inverter_id.as_str(), plane.mppt_index)) {
            return Err(EngineError::Validation(format!(
                "MPPT {} of inverter '{}' is assigned to more than one plane",
                plane.mppt_index, plane.inverter_id
            )));
        }
    }

    if pv.losses.total_pct() >= 100.0 {
        return Err(EngineError::Validation(
            "system losses must stay below 100%".into(),
        ));
    }

    pv.consumption.validate()?;
    pv.tariff.validate()?;
    request.bess.spec.validate()?;
    request.economics.validate()?;

    if request.bess.strategy == DispatchStrategy::PeakShaving
        && request.bess.peak_shaving_limit_kw.is_none()
    {
        return Err(EngineError::Validation(
            "peak-shaving strategy requires a demand limit".into(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use solarion_types::bess::{BatteryChemistry, BessSpec};
    use solarion_types::consumption::ConsumptionProfile;
    use solarion_types::financial::EconomicInput;
    use solarion_types::inverter::{Inverter, SandiaInverterParams};
    use solarion_types::module::{PvModule, SapmThermalParams, SingleDiodeParams};
    use solarion_types::plane::RoofPlane;
    use solarion_types::requests::{
        BessSystemRequest, LossesSpec, PvSystemRequest, SiteRequest,
    };
    use solarion_types::tariff::{Tariff, TariffKind};

    pub fn request() -> HybridDimensioningRequest {
        HybridDimensioningRequest {
            pv: PvSystemRequest {
                site: SiteRequest {
                    latitude: -15.79,
                    longitude: -47.88,
                    source: None,
                    allow_fallback: true,
                },
                planes: vec![RoofPlane {
                    id: "p1".into(),
                    name: "telhado".into(),
                    tilt_deg: 20.0,
                    azimuth_deg: 180.0,
                    modules_per_string: 6,
                    strings: 2,
                    inverter_id: "inv-1".into(),
                    mppt_index: 1,
                }],
                module: PvModule {
                    manufacturer: "Canadian Solar".into(),
                    model: "CS3W-540MS".into(),
                    power_stc_w: 540.0,
                    v_oc_stc: 49.7,
                    i_sc_stc: 13.91,
                    v_mpp: 41.8,
                    i_mpp: 13.16,
                    alpha_sc: None,
                    beta_oc: None,
                    gamma_pmp: Some(-0.0044),
                    cells_in_series: Some(144),
                    diode: SingleDiodeParams::default(),
                    thermal: SapmThermalParams::default(),
                    width_mm: None,
                    height_mm: None,
                    weight_kg: None,
                },
                inverters: vec![Inverter {
                    id: "inv-1".into(),
                    manufacturer: String::new(),
                    model: String::new(),
                    p_aco_w: 6000.0,
                    p_dc_max_w: Some(8000.0),
                    mppt_count: 2,
                    strings_per_mppt: 2,
                    max_input_current_a: 40.0,
                    v_mppt_min: 200.0,
                    v_mppt_max: 1000.0,
                    efficiency: None,
                    sandia: SandiaInverterParams::default(),
                }],
                losses: LossesSpec::typical(),
                consumption: ConsumptionProfile::flat(500.0),
                tariff: Tariff {
                    kind: TariffKind::White,
                    peak_kwh: 1.20,
                    intermediate_kwh: Some(0.80),
                    off_peak_kwh: 0.50,
                    peak_start: NaiveTime::from_hms_opt(18, 0, 0),
                    peak_end: NaiveTime::from_hms_opt(21, 0, 0),
                    demand_peak_kw: None,
                    demand_off_peak_kw: None,
                },
                decomposition: Default::default(),
                transposition: Default::default(),
            },
            bess: BessSystemRequest {
                spec: BessSpec {
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
                },
                strategy: DispatchStrategy::Arbitrage,
                peak_shaving_limit_kw: None,
                capex_per_kwh: 2_000.0,
                capex_per_kw: 800.0,
                installation_cost: 10_000.0,
            },
            economics: EconomicInput {
                capex: 50_000.0,
                lifetime_years: 25,
                discount_rate_pct: 8.0,
                energy_inflation_pct: 4.5,
                om_inflation_pct: 4.0,
                degradation_pct: 0.5,
                om_cost_first_year: 500.0,
                salvage_pct: 0.0,
                simultaneity_factor: 0.25,
                solar_capex_per_kwp: 5_000.0,
            },
            include_series: false,
        }
    }

    #[test]
    fn test_valid_request_passes() {
        assert!(validate_hybrid_request(&request()).is_ok());
    }

    #[test]
    fn test_duplicate_mppt_assignment_rejected() {
        let mut req = request();
        let mut second = req.pv.planes[0].clone();
        second.id = "p2".into(); // same inverter, same MPPT
        req.pv.planes.push(second);
        let err = validate_hybrid_request(&req).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_second_mppt_is_fine() {
        let mut req = request();
        let mut second = req.pv.planes[0].clone();
        second.id = "p2".into();
        second.mppt_index = 2;
        req.pv.planes.push(second);
        assert!(validate_hybrid_request(&req).is_ok());
    }

    #[test]
    fn test_unknown_inverter_rejected() {
        let mut req = request();
        req.pv.planes[0].inverter_id = "ghost".into();
        assert!(validate_hybrid_request(&req).is_err());
    }

    #[test]
    fn test_out_of_range_site_rejected() {
        let mut req = request();
        req.pv.site.latitude = -95.0;
        assert!(validate_hybrid_request(&req).is_err());
    }

    #[test]
    fn test_peak_shaving_needs_a_limit() {
        let mut req = request();
        req.bess.strategy = DispatchStrategy::PeakShaving;
        assert!(validate_hybrid_request(&req).is_err());
        req.bess.peak_shaving_limit_kw = Some(30.0);
        assert!(validate_hybrid_request(&req).is_ok());
    }

    #[test]
    fn test_bad_tilt_rejected() {
        let mut req = request();
        req.pv.planes[0].tilt_deg = 120.0;
        assert!(validate_hybrid_request(&req).is_err());
    }
}
