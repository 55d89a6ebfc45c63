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

//! Plane-of-array transposition: isotropic, Hay-Davies and Perez sky
//! models plus the ground-reflected term with a fixed 0.20 albedo.

use crate::position::{SolarPosition, extraterrestrial_normal, relative_airmass, solar_position};
use solarion_types::irradiance::TranspositionModel;
use solarion_types::weather::WeatherFrame;

const ALBEDO: f64 = 0.20;

/// Perez (1990) brightness-coefficient table, indexed by the sky-clearness
/// bin. Columns: f11, f12, f13, f21, f22, f23.
const PEREZ_COEFFS: [[f64; 6]; 8] = [
    [-0.008, 0.588, -0.062, -0.060, 0.072, -0.022],
    [0.130, 0.683, -0.151, -0.019, 0.066, -0.029],
    [0.330, 0.487, -0.221, 0.055, -0.064, -0.026],
    [0.568, 0.187, -0.295, 0.109, -0.152, -0.014],
    [0.873, -0.392, -0.362, 0.226, -0.462, 0.001],
    [1.132, -1.237, -0.412, 0.288, -0.823, 0.056],
    [1.060, -1.600, -0.359, 0.264, -1.127, 0.131],
    [0.678, -0.327, -0.250, 0.156, -1.377, 0.251],
];

/// Sky-clearness bin edges for epsilon.
const PEREZ_BINS: [f64; 7] = [1.065, 1.23, 1.5, 1.95, 2.8, 4.5, 6.2];

/// Computes the POA global irradiance series for a plane.
pub fn poa_series(
    frame: &WeatherFrame,
    tilt_deg: f64,
    azimuth_deg: f64,
    model: TranspositionModel,
) -> Vec<f64> {
    (0..frame.len())
        .map(|i| {
            let pos = solar_position(frame.timestamps[i], frame.latitude, frame.longitude);
            poa_sample(
                frame.ghi[i],
                frame.dni[i],
                frame.dhi[i],
                &pos,
                tilt_deg,
                azimuth_deg,
                model,
            )
        })
        .collect()
}

/// One-sample POA global irradiance (W/m²).
pub fn poa_sample(
    ghi: f64,
    dni: f64,
    dhi: f64,
    pos: &SolarPosition,
    tilt_deg: f64,
    azimuth_deg: f64,
    model: TranspositionModel,
) -> f64 {
    if ghi <= 0.0 {
        return 0.0;
    }

    let tilt = tilt_deg.to_radians();
    let cos_incidence = incidence_cosine(pos, tilt_deg, azimuth_deg);
    let beam = dni * cos_incidence.max(0.0);
    let ground = ghi * ALBEDO * (1.0 - tilt.cos()) / 2.0;

    let sky = match model {
        TranspositionModel::Isotropic => dhi * (1.0 + tilt.cos()) / 2.0,
        TranspositionModel::HayDavies => hay_davies_sky(dni, dhi, pos, tilt, cos_incidence),
        TranspositionModel::Perez => perez_sky(dni, dhi, pos, tilt, cos_incidence),
    };

    (beam + sky + ground).max(0.0)
}

/// Cosine of the angle between the sun and the plane normal.
fn incidence_cosine(pos: &SolarPosition, tilt_deg: f64, azimuth_deg: f64) -> f64 {
    let zenith = pos.zenith_deg.to_radians();
    let tilt = tilt_deg.to_radians();
    let az_diff = (pos.azimuth_deg - azimuth_deg).to_radians();
    zenith.cos() * tilt.cos() + zenith.sin() * tilt.sin() * az_diff.cos()
}

fn hay_davies_sky(dni: f64, dhi: f64, pos: &SolarPosition, tilt: f64, cos_incidence: f64) -> f64 {
    let e0 = extraterrestrial_normal(pos.day_of_year);
    let cos_z = pos.cos_zenith().max(0.065); // cos 85°, horizon guard
    let anisotropy = (dni / e0).clamp(0.0, 1.0);
    let rb = cos_incidence.max(0.0) / cos_z;
    dhi * (anisotropy * rb + (1.0 - anisotropy) * (1.0 + tilt.cos()) / 2.0)
}

fn perez_sky(dni: f64, dhi: f64, pos: &SolarPosition, tilt: f64, cos_incidence: f64) -> f64 {
    if dhi <= 0.0 {
        return 0.0;
    }
    let zenith_rad = pos.zenith_deg.to_radians();
    let cos_z = pos.cos_zenith().max(0.065);

    // Sky clearness epsilon with the kappa·z³ stabiliser.
    const KAPPA: f64 = 1.041;
    let z3 = KAPPA * zenith_rad.powi(3);
    let epsilon = ((dhi + dni) / dhi + z3) / (1.0 + z3);

    let bin = PEREZ_BINS.iter().take_while(|edge| epsilon >= **edge).count();
    let [f11, f12, f13, f21, f22, f23] = PEREZ_COEFFS[bin.min(7)];

    // Sky brightness delta.
    let am = relative_airmass(pos.zenith_deg);
    let e0 = extraterrestrial_normal(pos.day_of_year);
    let delta = dhi * am / e0;

    let f1 = (f11 + f12 * delta + f13 * zenith_rad).max(0.0);
    let f2 = f21 + f22 * delta + f23 * zenith_rad;

    let a = cos_incidence.max(0.0);
    let b = cos_z;

    let sky = dhi * ((1.0 - f1) * (1.0 + tilt.cos()) / 2.0 + f1 * a / b + f2 * tilt.sin());
    sky.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noon_position() -> SolarPosition {
        SolarPosition {
            elevation_deg: 70.0,
            zenith_deg: 20.0,
            azimuth_deg: 0.0, // sun due north, southern hemisphere noon
            day_of_year: 172.0,
        }
    }

    #[test]
    fn test_horizontal_plane_recovers_ghi_isotropic() {
        let pos = noon_position();
        let ghi = 800.0;
        let dni = 650.0;
        let dhi = ghi - dni * pos.cos_zenith();
        let poa = poa_sample(ghi, dni, dhi, &pos, 0.0, 0.0, TranspositionModel::Isotropic);
        assert!((poa - ghi).abs() < 1.0, "horizontal POA {poa:.1} vs GHI {ghi}");
    }

    #[test]
    fn test_tilt_towards_sun_beats_horizontal() {
        // Low winter sun from the north (southern hemisphere).
        let pos = SolarPosition {
            elevation_deg: 35.0,
            zenith_deg: 55.0,
            azimuth_deg: 0.0,
            day_of_year: 172.0,
        };
        let (ghi, dni) = (500.0, 700.0);
        let dhi = (ghi - dni * pos.cos_zenith()).max(50.0);
        for model in [
            TranspositionModel::Isotropic,
            TranspositionModel::HayDavies,
            TranspositionModel::Perez,
        ] {
            let flat = poa_sample(ghi, dni, dhi, &pos, 0.0, 0.0, model);
            let tilted = poa_sample(ghi, dni, dhi, &pos, 25.0, 0.0, model);
            assert!(tilted > flat, "{model:?}: tilted {tilted:.0} <= flat {flat:.0}");
        }
    }

    #[test]
    fn test_night_sample_is_zero() {
        let pos = SolarPosition {
            elevation_deg: -10.0,
            zenith_deg: 100.0,
            azimuth_deg: 250.0,
            day_of_year: 10.0,
        };
        let poa = poa_sample(0.0, 0.0, 0.0, &pos, 20.0, 0.0, TranspositionModel::Perez);
        assert_eq!(poa, 0.0);
    }

    #[test]
    fn test_models_agree_within_reason() {
        let pos = noon_position();
        let (ghi, dni) = (850.0, 700.0);
        let dhi = ghi - dni * pos.cos_zenith();
        let iso = poa_sample(ghi, dni, dhi, &pos, 20.0, 0.0, TranspositionModel::Isotropic);
        let hay = poa_sample(ghi, dni, dhi, &pos, 20.0, 0.0, TranspositionModel::HayDavies);
        let perez = poa_sample(ghi, dni, dhi, &pos, 20.0, 0.0, TranspositionModel::Perez);
        for (name, value) in [("hay", hay), ("perez", perez)] {
            let spread = (value - iso).abs() / iso;
            assert!(spread < 0.15, "{name} deviates {spread:.2} from isotropic");
        }
    }

    #[test]
    fn test_perez_sky_nonnegative_at_horizon() {
        let pos = SolarPosition {
            elevation_deg: 2.0,
            zenith_deg: 88.0,
            azimuth_deg: 95.0,
            day_of_year: 300.0,
        };
        let poa = poa_sample(60.0, 5.0, 58.0, &pos, 30.0, 0.0, TranspositionModel::Perez);
        assert!(poa >= 0.0);
    }
}
