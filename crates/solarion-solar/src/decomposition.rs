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

//! GHI → (DNI, DHI) decomposition.
//!
//! Applied when the source delivered no usable direct component. All models
//! work from the clearness index; outputs are clipped at zero and DHI never
//! exceeds GHI.

use crate::position::{extraterrestrial_normal, relative_airmass, solar_position};
use solarion_types::irradiance::DecompositionModel;
use solarion_types::weather::WeatherFrame;
use tracing::info;

/// Zenith angle beyond which the direct component is forced to zero.
const MAX_ZENITH_DEG: f64 = 87.0;

/// Fills `frame.dni` / `frame.dhi` from GHI and the solar position.
pub fn decompose_ghi(frame: &mut WeatherFrame, model: DecompositionModel) {
    info!("Decomposing GHI using model {}", model.as_str());
    for i in 0..frame.len() {
        let pos = solar_position(frame.timestamps[i], frame.latitude, frame.longitude);
        let ghi = frame.ghi[i];
        let (dni, dhi) = decompose_sample(ghi, pos.zenith_deg, pos.day_of_year, model);
        frame.dni[i] = dni;
        frame.dhi[i] = dhi.min(ghi);
    }
}

/// One-sample decomposition. Returns (DNI, DHI), both ≥ 0.
pub fn decompose_sample(
    ghi: f64,
    zenith_deg: f64,
    day_of_year: f64,
    model: DecompositionModel,
) -> (f64, f64) {
    if ghi <= 0.0 || zenith_deg >= MAX_ZENITH_DEG {
        return (0.0, ghi.max(0.0));
    }

    let cos_z = (zenith_deg.to_radians()).cos().max(1e-4);
    let e0 = extraterrestrial_normal(day_of_year);
    let kt = (ghi / (e0 * cos_z)).clamp(0.0, 1.2);

    let dni = match model {
        DecompositionModel::Erbs => erbs_dni(ghi, kt, cos_z),
        DecompositionModel::Disc => disc_dni(kt, zenith_deg, e0),
        DecompositionModel::Dirint => dirint_dni(kt, zenith_deg, e0),
        DecompositionModel::Louche => louche_dni(kt, e0),
    };

    let dni = dni.max(0.0).min(e0);
    let dhi = (ghi - dni * cos_z).max(0.0).min(ghi);
    (dni, dhi)
}

/// Erbs (1982): diffuse fraction as a piecewise polynomial of kt.
fn erbs_dni(ghi: f64, kt: f64, cos_z: f64) -> f64 {
    let df = if kt <= 0.22 {
        1.0 - 0.09 * kt
    } else if kt <= 0.80 {
        0.9511 - 0.1604 * kt + 4.388 * kt.powi(2) - 16.638 * kt.powi(3) + 12.336 * kt.powi(4)
    } else {
        0.165
    };
    let dhi = df.clamp(0.0, 1.0) * ghi;
    (ghi - dhi) / cos_z
}

/// DISC (Maxwell 1987): direct clearness from kt and air mass.
fn disc_dni(kt: f64, zenith_deg: f64, e0: f64) -> f64 {
    let am = relative_airmass(zenith_deg);
    let (a, b, c) = if kt <= 0.6 {
        (
            0.512 - 1.56 * kt + 2.286 * kt.powi(2) - 2.222 * kt.powi(3),
            0.37 + 0.962 * kt,
            -0.28 + 0.932 * kt - 2.048 * kt.powi(2),
        )
    } else {
        (
            -5.743 + 21.77 * kt - 27.49 * kt.powi(2) + 11.56 * kt.powi(3),
            41.4 - 118.5 * kt + 66.05 * kt.powi(2) + 31.9 * kt.powi(3),
            -47.01 + 184.2 * kt - 222.0 * kt.powi(2) + 73.81 * kt.powi(3),
        )
    };
    let kn_clear = 0.866 - 0.122 * am + 0.0121 * am.powi(2) - 0.000653 * am.powi(3)
        + 1.4e-5 * am.powi(4);
    let delta_kn = a + b * (c * am).exp();
    let kn = (kn_clear - delta_kn).clamp(0.0, 1.0);
    kn * e0
}

/// DIRINT without the full research lookup table: DISC direct irradiance
/// rescaled through the zenith-independent clearness index kt'.
fn dirint_dni(kt: f64, zenith_deg: f64, e0: f64) -> f64 {
    let am = relative_airmass(zenith_deg);
    let ktp = kt / (1.031 * (-1.4 / (0.9 + 9.4 / am)).exp() + 0.1);
    let disc = disc_dni(kt, zenith_deg, e0);
    // The stability bins collapse to a mild attenuation of turbid samples.
    let correction = if ktp > 0.65 { 1.0 } else { 0.95 + 0.05 * (ktp / 0.65) };
    disc * correction
}

/// Louche (1991): direct clearness as a quintic of kt.
fn louche_dni(kt: f64, e0: f64) -> f64 {
    let kb = -10.627 * kt.powi(5) + 15.307 * kt.powi(4) - 5.205 * kt.powi(3)
        + 0.994 * kt.powi(2)
        - 0.059 * kt
        + 0.002;
    kb.clamp(0.0, 1.0) * e0
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOY: f64 = 172.0;

    #[test]
    fn test_night_sample_is_all_diffuse() {
        for model in [
            DecompositionModel::Erbs,
            DecompositionModel::Disc,
            DecompositionModel::Dirint,
            DecompositionModel::Louche,
        ] {
            let (dni, dhi) = decompose_sample(0.0, 95.0, DOY, model);
            assert_eq!(dni, 0.0);
            assert_eq!(dhi, 0.0);
        }
    }

    #[test]
    fn test_clear_sky_sample_is_mostly_direct() {
        // High sun, high irradiance: clear conditions.
        let (dni, dhi) = decompose_sample(900.0, 20.0, DOY, DecompositionModel::Erbs);
        assert!(dni > 600.0, "clear-sky DNI should dominate, got {dni:.0}");
        assert!(dhi < 250.0);
    }

    #[test]
    fn test_overcast_sample_is_mostly_diffuse() {
        let (dni, dhi) = decompose_sample(120.0, 40.0, DOY, DecompositionModel::Erbs);
        assert!(dni < 60.0);
        assert!(dhi > 100.0);
    }

    #[test]
    fn test_dhi_never_exceeds_ghi() {
        for model in [
            DecompositionModel::Erbs,
            DecompositionModel::Disc,
            DecompositionModel::Dirint,
            DecompositionModel::Louche,
        ] {
            for ghi in [50.0, 300.0, 700.0, 1000.0] {
                for zenith in [10.0, 45.0, 70.0, 86.0] {
                    let (dni, dhi) = decompose_sample(ghi, zenith, DOY, model);
                    assert!(dhi <= ghi + 1e-9, "{model:?} ghi={ghi} z={zenith}");
                    assert!(dni >= 0.0 && dhi >= 0.0);
                }
            }
        }
    }

    #[test]
    fn test_disc_and_erbs_roughly_agree_on_clear_sky() {
        let (erbs, _) = decompose_sample(850.0, 30.0, DOY, DecompositionModel::Erbs);
        let (disc, _) = decompose_sample(850.0, 30.0, DOY, DecompositionModel::Disc);
        let spread = (erbs - disc).abs() / erbs.max(disc);
        assert!(spread < 0.35, "models disagree too much: {erbs:.0} vs {disc:.0}");
    }
}
