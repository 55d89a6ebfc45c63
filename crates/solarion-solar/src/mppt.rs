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

//! MPPT sizing check: how many modules per string and strings per MPPT a
//! candidate inverter/module pairing admits at the site's historical
//! minimum temperature.

use solarion_types::error::{EngineError, Result};
use solarion_types::inverter::Inverter;
use solarion_types::module::PvModule;
use solarion_types::responses::MpptSizingResult;
use tracing::info;

/// Regulatory short-circuit safety factor on string current.
const ISC_SAFETY_FACTOR: f64 = 1.25;

/// Runs the sizing check against a known minimum ambient temperature.
///
/// `t_min_c` comes from the site's weather frame (minimum hourly value over
/// all years). Fails with a validation error on the fatal current check and
/// on DC/AC ratios outside [1.0, 1.5].
pub fn check_mppt_sizing(
    module: &PvModule,
    inverter: &Inverter,
    t_min_c: f64,
) -> Result<MpptSizingResult> {
    if module.power_stc_w <= 0.0 {
        return Err(EngineError::Validation(
            "module STC power must be positive".into(),
        ));
    }
    if module.v_oc_stc <= 0.0 {
        return Err(EngineError::Validation(
            "module Voc at STC must be positive".into(),
        ));
    }
    if inverter.mppt_count == 0 || inverter.strings_per_mppt == 0 {
        return Err(EngineError::Validation(
            "inverter must expose at least one MPPT with one string".into(),
        ));
    }

    // Cold open-circuit voltage. beta is V/°C; express it relative to Voc
    // the way datasheets quote it (%/°C over 100).
    let beta_voc_pct = module
        .beta_oc
        .map_or(-0.28, |b| b / module.v_oc_stc * 100.0);
    let v_oc_cold = module.v_oc_stc * (1.0 + (beta_voc_pct / 100.0) * (t_min_c - 25.0));
    info!(
        "VocCold = {:.2}V (VocSTC={}V, beta={:.2}%/°C, Tmin={:.1}°C)",
        v_oc_cold, module.v_oc_stc, beta_voc_pct, t_min_c
    );

    // Voltage bound per MPPT.
    let voltage_bound = (inverter.v_mppt_max / v_oc_cold).floor().max(0.0) as u32;

    // Power bound: whole-system cap split over the MPPT channels.
    let p_limit = inverter.dc_power_limit_w();
    let power_bound_total = (p_limit / module.power_stc_w).floor().max(0.0) as u32;
    let power_bound_per_mppt = power_bound_total / inverter.mppt_count;

    let modules_per_mppt = power_bound_per_mppt.min(voltage_bound);
    let modules_per_string = (modules_per_mppt / inverter.strings_per_mppt).max(1);
    let modules_total = modules_per_mppt * inverter.mppt_count;

    let limiting_factor = if power_bound_per_mppt <= voltage_bound {
        "power"
    } else {
        "voltage"
    };

    // Fatal: string current against the MPPT input rating.
    let string_current = f64::from(inverter.strings_per_mppt) * ISC_SAFETY_FACTOR * module.i_sc_stc;
    if string_current > inverter.max_input_current_a {
        return Err(EngineError::Validation(format!(
            "string current {:.1}A ({} strings × {} × Isc {:.1}A) exceeds the MPPT input limit {:.1}A",
            string_current,
            inverter.strings_per_mppt,
            ISC_SAFETY_FACTOR,
            module.i_sc_stc,
            inverter.max_input_current_a
        )));
    }

    // DC/AC ratio gate.
    let mut warnings = Vec::new();
    let oversizing = p_limit / inverter.p_aco_w;
    if oversizing < 1.0 {
        return Err(EngineError::Validation(format!(
            "DC input limit {:.0}W below the AC nameplate {:.0}W (ratio {:.2})",
            p_limit, inverter.p_aco_w, oversizing
        )));
    }
    if oversizing > 1.5 {
        return Err(EngineError::Validation(format!(
            "DC/AC ratio {:.2} above the admissible 1.50",
            oversizing
        )));
    }
    if oversizing > 1.0 {
        warnings.push(format!("DC/AC oversizing {:.0}%", oversizing * 100.0));
    }

    info!(
        "MPPT sizing: {} modules/MPPT × {} MPPTs = {} total (limited by {})",
        modules_per_mppt, inverter.mppt_count, modules_total, limiting_factor
    );

    Ok(MpptSizingResult {
        t_min_c,
        v_oc_cold,
        modules_per_mppt,
        modules_per_string,
        modules_total,
        limiting_factor: limiting_factor.to_owned(),
        oversizing_pct: oversizing * 100.0,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use solarion_types::inverter::SandiaInverterParams;
    use solarion_types::module::{SapmThermalParams, SingleDiodeParams};

    fn module() -> PvModule {
        PvModule {
            manufacturer: String::new(),
            model: String::new(),
            power_stc_w: 540.0,
            v_oc_stc: 49.7,
            i_sc_stc: 13.91,
            v_mpp: 41.8,
            i_mpp: 13.16,
            alpha_sc: None,
            beta_oc: Some(-0.0028 * 49.7),
            gamma_pmp: Some(-0.0044),
            cells_in_series: Some(144),
            diode: SingleDiodeParams::default(),
            thermal: SapmThermalParams::default(),
            width_mm: None,
            height_mm: None,
            weight_kg: None,
        }
    }

    fn inverter() -> Inverter {
        Inverter {
            id: "inv-1".into(),
            manufacturer: String::new(),
            model: String::new(),
            p_aco_w: 15_000.0,
            p_dc_max_w: Some(22_000.0),
            mppt_count: 2,
            strings_per_mppt: 2,
            max_input_current_a: 40.0,
            v_mppt_min: 200.0,
            v_mppt_max: 1000.0,
            efficiency: None,
            sandia: SandiaInverterParams::default(),
        }
    }

    #[test]
    fn test_cold_voltage_rises_above_stc() {
        let result = check_mppt_sizing(&module(), &inverter(), -10.0).unwrap();
        // −0.28%/°C × −35°C ≈ +9.8%
        assert!(result.v_oc_cold > module().v_oc_stc);
        assert!((result.v_oc_cold - 49.7 * 1.098).abs() < 0.2);
        // Cold Voc must stay below the MPPT ceiling for any sane string.
        assert!(result.v_oc_cold < inverter().v_mppt_max);
    }

    #[test]
    fn test_bounds_and_limiting_factor() {
        let result = check_mppt_sizing(&module(), &inverter(), 0.0).unwrap();
        // Voltage bound: 1000 / (49.7 × 1.07) ≈ 18 modules.
        // Power bound: 22000/540 = 40 total → 20 per MPPT.
        assert_eq!(result.modules_per_mppt, 18);
        assert_eq!(result.limiting_factor, "voltage");
        assert_eq!(result.modules_per_string, 9);
        assert_eq!(result.modules_total, 36);
    }

    #[test]
    fn test_current_check_is_fatal() {
        let mut inv = inverter();
        inv.max_input_current_a = 20.0; // 2 × 1.25 × 13.91 = 34.8 A > 20 A
        let err = check_mppt_sizing(&module(), &inv, 0.0).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn test_oversizing_gate() {
        let mut inv = inverter();
        inv.p_dc_max_w = Some(12_000.0); // ratio 0.8: undersized
        assert!(check_mppt_sizing(&module(), &inv, 0.0).is_err());

        inv.p_dc_max_w = Some(24_000.0); // ratio 1.6: too much
        assert!(check_mppt_sizing(&module(), &inv, 0.0).is_err());

        inv.p_dc_max_w = Some(21_000.0); // ratio 1.4: fine, informs
        let result = check_mppt_sizing(&module(), &inv, 0.0).unwrap();
        assert!(!result.warnings.is_empty());
    }
}
