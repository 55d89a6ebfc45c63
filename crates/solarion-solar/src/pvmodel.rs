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

//! Plane-level DC model: pvwatts power with SAPM cell temperature.
//!
//! Plane DC series carry no system losses; soiling, shading, mismatch and
//! wiring are applied once at the AC post-clip stage by the aggregator.

use crate::thermal::{
    DEFAULT_SAPM_A, DEFAULT_SAPM_B, DEFAULT_SAPM_DELTA_T, cell_temperature,
};
use solarion_types::module::PvModule;
use solarion_types::plane::RoofPlane;
use solarion_types::weather::WeatherFrame;

/// Fully-resolved module coefficients after the catalogue-fallback lookup.
///
/// Upstream catalogues are frequently partial; this is the single place
/// where missing coefficients get their hardcoded stand-ins (the values of
/// a 540 Wp crystalline-silicon reference module).
#[derive(Debug, Clone, Copy)]
pub struct ResolvedModule {
    pub power_stc_w: f64,
    pub v_oc_stc: f64,
    pub i_sc_stc: f64,
    pub gamma_pdc: f64,
    pub alpha_sc: f64,
    pub beta_oc: f64,
    pub cells_in_series: u32,
    pub a_ref: f64,
    pub i_l_ref: f64,
    pub i_o_ref: f64,
    pub r_s: f64,
    pub r_sh_ref: f64,
    pub sapm_a: f64,
    pub sapm_b: f64,
    pub sapm_delta_t: f64,
}

/// The one lookup that fills missing module coefficients.
pub fn resolve_module(module: &PvModule) -> ResolvedModule {
    ResolvedModule {
        power_stc_w: module.power_stc_w,
        v_oc_stc: module.v_oc_stc,
        i_sc_stc: module.i_sc_stc,
        gamma_pdc: module.gamma_pmp.unwrap_or(-0.0044),
        alpha_sc: module.alpha_sc.unwrap_or(0.0004),
        beta_oc: module.beta_oc.unwrap_or(-0.0028),
        cells_in_series: module.cells_in_series.unwrap_or(144),
        a_ref: module.diode.a_ref.unwrap_or(1.8),
        i_l_ref: module.diode.i_l_ref.unwrap_or(module.i_sc_stc),
        i_o_ref: module.diode.i_o_ref.unwrap_or(2.5e-12),
        r_s: module.diode.r_s.unwrap_or(0.25),
        r_sh_ref: module.diode.r_sh_ref.unwrap_or(450.0),
        sapm_a: module.thermal.a.unwrap_or(DEFAULT_SAPM_A),
        sapm_b: module.thermal.b.unwrap_or(DEFAULT_SAPM_B),
        sapm_delta_t: module.thermal.delta_t.unwrap_or(DEFAULT_SAPM_DELTA_T),
    }
}

/// DC power series of one roof plane (W, positive).
///
/// pvwatts: `P = P_stc · (POA/1000) · (1 + γ (T_cell − 25))`, linear below
/// STC irradiance. The series/parallel configuration enters through the
/// plane nameplate `modules_per_string × strings × P_module`.
pub fn simulate_plane_dc(
    plane: &RoofPlane,
    module: &PvModule,
    frame: &WeatherFrame,
    poa: &[f64],
) -> Vec<f64> {
    let resolved = resolve_module(module);
    let nameplate_w = plane.dc_nameplate_w(module);

    poa.iter()
        .zip(frame.temp_air.iter())
        .zip(frame.wind_speed.iter())
        .map(|((poa_i, temp_i), wind_i)| {
            if *poa_i <= 0.0 {
                return 0.0;
            }
            let t_cell = cell_temperature(
                *poa_i,
                *temp_i,
                *wind_i,
                resolved.sapm_a,
                resolved.sapm_b,
                resolved.sapm_delta_t,
            );
            let power =
                nameplate_w * (poa_i / 1000.0) * (1.0 + resolved.gamma_pdc * (t_cell - 25.0));
            power.max(0.0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use solarion_types::module::{SapmThermalParams, SingleDiodeParams};
    use solarion_types::weather::{WeatherSource, localize_utc};

    pub fn test_module() -> PvModule {
        PvModule {
            manufacturer: "Canadian Solar".into(),
            model: "CS3W-540MS".into(),
            power_stc_w: 540.0,
            v_oc_stc: 49.7,
            i_sc_stc: 13.91,
            v_mpp: 41.8,
            i_mpp: 13.16,
            alpha_sc: None,
            beta_oc: Some(-0.0028 * 49.7), // V/°C
            gamma_pmp: Some(-0.0044),
            cells_in_series: Some(144),
            diode: SingleDiodeParams::default(),
            thermal: SapmThermalParams::default(),
            width_mm: None,
            height_mm: None,
            weight_kg: None,
        }
    }

    fn test_plane() -> RoofPlane {
        RoofPlane {
            id: "p1".into(),
            name: String::new(),
            tilt_deg: 20.0,
            azimuth_deg: 0.0,
            modules_per_string: 6,
            strings: 2,
            inverter_id: "inv-1".into(),
            mppt_index: 1,
        }
    }

    fn frame(n: usize, temp: f64, wind: f64) -> WeatherFrame {
        let start = Utc.with_ymd_and_hms(2019, 1, 1, 12, 0, 0).unwrap();
        let mut f = WeatherFrame::empty(WeatherSource::Pvgis, -15.79, -47.88);
        for h in 0..n {
            f.timestamps
                .push(localize_utc(start + chrono::Duration::hours(h as i64)));
            f.ghi.push(0.0);
            f.dni.push(0.0);
            f.dhi.push(0.0);
            f.temp_air.push(temp);
            f.wind_speed.push(wind);
            f.pressure.push(101_325.0);
        }
        f
    }

    #[test]
    fn test_defaults_fill_missing_coefficients() {
        let mut module = test_module();
        module.gamma_pmp = None;
        module.cells_in_series = None;
        let resolved = resolve_module(&module);
        assert_eq!(resolved.gamma_pdc, -0.0044);
        assert_eq!(resolved.cells_in_series, 144);
        assert_eq!(resolved.i_l_ref, 13.91); // falls back to Isc
        assert_eq!(resolved.sapm_a, DEFAULT_SAPM_A);
    }

    #[test]
    fn test_stc_conditions_give_near_nameplate() {
        let plane = test_plane();
        let module = test_module();
        // 25 °C cell requires a cold ambient at full sun; pick one that
        // lands close to STC: T_cell ≈ T_amb + ~27 °C at 1000 W/m², 1 m/s.
        let f = frame(1, -2.0, 1.0);
        let dc = simulate_plane_dc(&plane, &module, &f, &[1000.0]);
        let nameplate = plane.dc_nameplate_w(&module);
        assert!(
            (dc[0] - nameplate).abs() / nameplate < 0.05,
            "dc {:.0} vs nameplate {:.0}",
            dc[0],
            nameplate
        );
    }

    #[test]
    fn test_hot_cell_derates_power() {
        let plane = test_plane();
        let module = test_module();
        let f = frame(1, 38.0, 0.5);
        let dc = simulate_plane_dc(&plane, &module, &f, &[1000.0]);
        let nameplate = plane.dc_nameplate_w(&module);
        assert!(dc[0] < nameplate * 0.90, "hot cell should derate: {:.0}", dc[0]);
    }

    #[test]
    fn test_sub_stc_is_linear_in_poa() {
        let plane = test_plane();
        let module = test_module();
        let f = frame(2, 25.0, 2.0);
        let dc = simulate_plane_dc(&plane, &module, &f, &[200.0, 400.0]);
        // Same temperature driver is irradiance-dependent, so only roughly
        // double; the ratio must sit near 2.
        let ratio = dc[1] / dc[0];
        assert!((1.8..2.1).contains(&ratio), "ratio {ratio:.2}");
    }

    #[test]
    fn test_night_is_zero() {
        let plane = test_plane();
        let module = test_module();
        let f = frame(1, 20.0, 2.0);
        let dc = simulate_plane_dc(&plane, &module, &f, &[0.0]);
        assert_eq!(dc[0], 0.0);
    }
}
