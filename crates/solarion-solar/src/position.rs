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

//! Solar geometry: Spencer declination and equation of time, hour angle,
//! elevation/zenith and azimuth, plus the extraterrestrial irradiance with
//! its eccentricity correction.

use chrono::{DateTime, Datelike, Timelike, Utc};
use chrono_tz::Tz;
use std::f64::consts::PI;

/// Solar constant (W/m²).
pub const SOLAR_CONSTANT: f64 = 1361.0;

const DEG: f64 = PI / 180.0;

/// Sun position for one instant at one site.
#[derive(Debug, Clone, Copy)]
pub struct SolarPosition {
    /// Elevation above the horizon (degrees); negative at night
    pub elevation_deg: f64,
    /// Zenith angle, 90 − elevation (degrees)
    pub zenith_deg: f64,
    /// Azimuth from North, clockwise (degrees)
    pub azimuth_deg: f64,
    /// Day of year, 1-366
    pub day_of_year: f64,
}

impl SolarPosition {
    pub fn cos_zenith(&self) -> f64 {
        (self.zenith_deg * DEG).cos()
    }

    pub fn is_daytime(&self) -> bool {
        self.elevation_deg > 0.0
    }
}

/// Computes the sun position for a frame timestamp.
pub fn solar_position(ts: DateTime<Tz>, lat_deg: f64, lon_deg: f64) -> SolarPosition {
    let utc = ts.with_timezone(&Utc);
    let doy = f64::from(utc.ordinal());
    let ut_h = f64::from(utc.hour())
        + f64::from(utc.minute()) / 60.0
        + f64::from(utc.second()) / 3600.0;

    // Spencer (1971) day angle.
    let b = 2.0 * PI * (doy - 1.0) / 365.0;

    let decl_deg = (180.0 / PI)
        * (0.006918 - 0.399912 * b.cos() + 0.070257 * b.sin()
            - 0.006758 * (2.0 * b).cos()
            + 0.000907 * (2.0 * b).sin()
            - 0.002697 * (3.0 * b).cos()
            + 0.00148 * (3.0 * b).sin());
    let decl = decl_deg * DEG;

    // Equation of time in minutes (Spencer 1971).
    let eot_min = 229.18
        * (0.000075 + 0.001868 * b.cos()
            - 0.032077 * b.sin()
            - 0.014615 * (2.0 * b).cos()
            - 0.04089 * (2.0 * b).sin());

    // True solar time straight from the longitude.
    let lst_h = (ut_h + lon_deg / 15.0 + eot_min / 60.0).rem_euclid(24.0);
    let omega = 15.0 * (lst_h - 12.0) * DEG;

    let lat = lat_deg * DEG;
    let sin_alpha = lat.sin() * decl.sin() + lat.cos() * decl.cos() * omega.cos();
    let alpha_rad = sin_alpha.clamp(-1.0, 1.0).asin();
    let alpha_deg = alpha_rad / DEG;

    // Azimuth from North, clockwise.
    let cos_az = if alpha_rad.cos().abs() > 1e-9 {
        (decl.sin() - sin_alpha * lat.sin()) / (alpha_rad.cos() * lat.cos())
    } else {
        0.0
    };
    let az_abs = cos_az.clamp(-1.0, 1.0).acos() / DEG;
    let azimuth_deg = if omega > 0.0 { 360.0 - az_abs } else { az_abs };

    SolarPosition {
        elevation_deg: alpha_deg,
        zenith_deg: 90.0 - alpha_deg,
        azimuth_deg,
        day_of_year: doy,
    }
}

/// Eccentricity-corrected extraterrestrial normal irradiance (W/m²).
pub fn extraterrestrial_normal(day_of_year: f64) -> f64 {
    let b = 2.0 * PI * (day_of_year - 1.0) / 365.0;
    SOLAR_CONSTANT
        * (1.00011 + 0.034221 * b.cos() + 0.00128 * b.sin() + 0.000719 * (2.0 * b).cos()
            + 0.000077 * (2.0 * b).sin())
}

/// Relative air mass, Kasten & Young (1989). Unbounded near the horizon,
/// clamped below at 1.
pub fn relative_airmass(zenith_deg: f64) -> f64 {
    if zenith_deg >= 90.0 {
        return 38.0; // horizon limit of the Kasten-Young fit
    }
    let elevation = 90.0 - zenith_deg;
    let am = 1.0 / ((zenith_deg * DEG).cos() + 0.50572 * (elevation + 6.07995).powf(-1.6364));
    am.max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use solarion_types::weather::localize_utc;

    #[test]
    fn test_noon_elevation_brasilia_summer() {
        // Brasília (−15.79, −47.88), December solstice. Local solar noon is
        // ~15:11 UTC; the sun passes close to the zenith.
        let ts = localize_utc(Utc.with_ymd_and_hms(2019, 12, 21, 15, 10, 0).unwrap());
        let pos = solar_position(ts, -15.79, -47.88);
        assert!(
            pos.elevation_deg > 80.0,
            "expected near-zenith sun, got {:.1}°",
            pos.elevation_deg
        );
    }

    #[test]
    fn test_midnight_is_night() {
        let ts = localize_utc(Utc.with_ymd_and_hms(2019, 6, 21, 3, 0, 0).unwrap());
        let pos = solar_position(ts, -15.79, -47.88);
        assert!(!pos.is_daytime());
    }

    #[test]
    fn test_winter_noon_lower_than_summer_noon() {
        let summer = solar_position(
            localize_utc(Utc.with_ymd_and_hms(2019, 12, 21, 15, 10, 0).unwrap()),
            -23.55,
            -46.63,
        );
        let winter = solar_position(
            localize_utc(Utc.with_ymd_and_hms(2019, 6, 21, 15, 10, 0).unwrap()),
            -23.55,
            -46.63,
        );
        assert!(summer.elevation_deg > winter.elevation_deg + 30.0);
    }

    #[test]
    fn test_morning_sun_in_the_east() {
        let ts = localize_utc(Utc.with_ymd_and_hms(2019, 3, 21, 11, 0, 0).unwrap());
        let pos = solar_position(ts, -15.79, -47.88);
        assert!(pos.is_daytime());
        assert!(
            (30.0..150.0).contains(&pos.azimuth_deg),
            "morning azimuth should point east, got {:.1}°",
            pos.azimuth_deg
        );
    }

    #[test]
    fn test_airmass_bounds() {
        assert!((relative_airmass(0.0) - 1.0).abs() < 0.01);
        assert!(relative_airmass(60.0) > 1.9);
        assert!(relative_airmass(95.0) > 30.0);
    }

    #[test]
    fn test_extraterrestrial_range() {
        // Perihelion (early January) is ~3.3% above the solar constant.
        let january = extraterrestrial_normal(3.0);
        let july = extraterrestrial_normal(185.0);
        assert!(january > july);
        assert!((1320.0..1420.0).contains(&january));
    }
}
