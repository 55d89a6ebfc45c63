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

//! Monthly totals → 8760-point hourly series in W.
//!
//! The reference calendar defaults to 2023 (non-leap, 8760 hours); make it
//! configurable if leap-year alignment ever matters to downstream charts.

use chrono::NaiveDate;

/// Default commercial daily shape: fraction of daily energy per hour,
/// business-hours peaks around 10-12 h and 14-17 h.
pub const COMMERCIAL_SHAPE: [f64; 24] = [
    0.02, 0.015, 0.01, 0.01, 0.015, 0.025, 0.04, 0.055, 0.06, 0.055, 0.05, 0.05, 0.055, 0.06,
    0.065, 0.07, 0.075, 0.08, 0.07, 0.06, 0.05, 0.04, 0.03, 0.025,
];

/// Canonical solar bell: zero at night, generation between 06:00 and
/// 18:00, normalised to sum 1.
pub const SOLAR_SHAPE: [f64; 24] = [
    0.00, 0.00, 0.00, 0.00, 0.00, 0.00, // 0h-5h
    0.01, 0.03, 0.06, 0.09, 0.11, 0.12, // 6h-11h
    0.13, 0.12, 0.11, 0.09, 0.07, 0.04, // 12h-17h
    0.02, 0.00, 0.00, 0.00, 0.00, 0.00, // 18h-23h
];

/// Reference calendar for the monthly → hourly expansion.
#[derive(Debug, Clone, Copy)]
pub struct ProfileCalendar {
    pub reference_year: i32,
}

impl Default for ProfileCalendar {
    fn default() -> Self {
        Self {
            reference_year: 2023,
        }
    }
}

impl ProfileCalendar {
    pub fn days_in_month(&self, month: u32) -> u32 {
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(self.reference_year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(self.reference_year, month + 1, 1)
        };
        let first = NaiveDate::from_ymd_opt(self.reference_year, month, 1);
        match (first, next) {
            (Some(f), Some(n)) => n.signed_duration_since(f).num_days() as u32,
            _ => 30,
        }
    }

    pub fn hours_in_year(&self) -> usize {
        (1..=12).map(|m| self.days_in_month(m) as usize * 24).sum()
    }
}

fn expand(monthly_kwh: &[f64; 12], shape: &[f64; 24], calendar: ProfileCalendar) -> Vec<f64> {
    // Normalise so the shape sums to exactly 1.
    let total: f64 = shape.iter().sum();
    let shape: Vec<f64> = if total > 0.0 {
        shape.iter().map(|v| v / total).collect()
    } else {
        vec![1.0 / 24.0; 24]
    };

    let mut series = Vec::with_capacity(calendar.hours_in_year());
    for (month_idx, month_kwh) in monthly_kwh.iter().enumerate() {
        let days = calendar.days_in_month(month_idx as u32 + 1);
        let daily_kwh = month_kwh / f64::from(days);
        for _ in 0..days {
            for fraction in &shape {
                // kWh over one hour → mean power in W.
                series.push(daily_kwh * fraction * 1000.0);
            }
        }
    }
    series
}

/// Expands monthly consumption to an hourly load series in W.
///
/// `shape_pct` is the 24-value daily shape in percent; the commercial
/// default applies when the caller gives none.
pub fn build_load_profile(
    monthly_kwh: &[f64; 12],
    shape_pct: Option<&[f64; 24]>,
    calendar: ProfileCalendar,
) -> Vec<f64> {
    let shape = match shape_pct {
        Some(pct) => {
            let mut s = [0.0f64; 24];
            for (slot, p) in s.iter_mut().zip(pct) {
                *slot = p / 100.0;
            }
            s
        }
        None => COMMERCIAL_SHAPE,
    };
    expand(monthly_kwh, &shape, calendar)
}

/// Expands monthly PV generation to an hourly series in W using the
/// canonical solar bell.
pub fn build_solar_profile(monthly_kwh: &[f64; 12], calendar: ProfileCalendar) -> Vec<f64> {
    expand(monthly_kwh, &SOLAR_SHAPE, calendar)
}

/// Rolls an hourly W series back up to monthly kWh totals.
pub fn monthly_rollup(series_w: &[f64], calendar: ProfileCalendar) -> [f64; 12] {
    let mut totals = [0.0f64; 12];
    let mut cursor = 0usize;
    for month in 1..=12u32 {
        let hours = calendar.days_in_month(month) as usize * 24;
        let end = (cursor + hours).min(series_w.len());
        totals[month as usize - 1] = series_w[cursor..end].iter().sum::<f64>() / 1000.0;
        cursor = end;
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_year_is_8760_hours() {
        let cal = ProfileCalendar::default();
        assert_eq!(cal.hours_in_year(), 8760);
        assert_eq!(cal.days_in_month(2), 28);

        let leap = ProfileCalendar {
            reference_year: 2024,
        };
        assert_eq!(leap.hours_in_year(), 8784);
    }

    #[test]
    fn test_shapes_are_normalised() {
        assert!((COMMERCIAL_SHAPE.iter().sum::<f64>() - 1.0).abs() < 0.01);
        assert!((SOLAR_SHAPE.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_load_profile_monthly_round_trip() {
        let monthly = [
            500.0, 480.0, 510.0, 470.0, 450.0, 430.0, 440.0, 460.0, 490.0, 520.0, 530.0, 540.0,
        ];
        let cal = ProfileCalendar::default();
        let series = build_load_profile(&monthly, None, cal);
        assert_eq!(series.len(), 8760);

        let recovered = monthly_rollup(&series, cal);
        for (orig, back) in monthly.iter().zip(recovered) {
            let err = (orig - back).abs() / orig;
            assert!(err < 0.01, "round-trip error {err:.4} for {orig} kWh");
        }
    }

    #[test]
    fn test_solar_profile_dark_at_night() {
        let monthly = [800.0; 12];
        let series = build_solar_profile(&monthly, ProfileCalendar::default());
        // First day: hours 0-5 and 19-23 must be zero, midday positive.
        for h in 0..6 {
            assert_eq!(series[h], 0.0);
        }
        assert!(series[12] > 0.0);
        for h in 19..24 {
            assert_eq!(series[h], 0.0);
        }
    }

    #[test]
    fn test_custom_shape_is_respected() {
        let mut shape = [0.0f64; 24];
        shape[12] = 100.0; // everything at noon
        let monthly = [310.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let series = build_load_profile(&monthly, Some(&shape), ProfileCalendar::default());
        // 310 kWh over 31 days = 10 kWh/day, all in hour 12 → 10 kW.
        assert!((series[12] - 10_000.0).abs() < 1e-6);
        assert_eq!(series[11], 0.0);
    }
}
