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

//! Monthly energy-credit accounting.
//!
//! The kWh credit bank is never negative and carries across months without
//! a calendar cut-off. Remote classes compute against a single bank
//! snapshot taken before allocation; the bank is decremented once, after
//! all classes ran.

/// Result of one month of local Group B accounting.
#[derive(Debug, Clone, Copy)]
pub struct LocalMonthOutcome {
    /// Monetary savings of the month (R$)
    pub savings: f64,
    /// Instantaneous self-consumption (kWh)
    pub simultaneous_kwh: f64,
    /// Local consumption abated with fresh credits (kWh)
    pub abated_new_kwh: f64,
    /// Local consumption abated from the bank (kWh)
    pub abated_bank_kwh: f64,
    /// Fio-B charge on the abated energy (R$)
    pub fio_b_charge: f64,
}

/// One month of the local Group B skeleton. Mutates the credit bank.
///
/// 1. `sim = min(gen × f_simul, load)`, valued at the full tariff.
/// 2. Fresh credit `new = gen − sim` abates the remaining load first.
/// 3. The bank covers what is left; the surplus of `new` tops the bank up.
/// 4. Fio-B is charged on all credit-abated energy at the calendar-year
///    non-compensated fraction.
pub fn local_month_group_b(
    generation_kwh: f64,
    consumption_kwh: f64,
    tariff: f64,
    fio_b: f64,
    simultaneity_factor: f64,
    bank_kwh: &mut f64,
    noncompensated_fraction: f64,
) -> LocalMonthOutcome {
    let simultaneous = (generation_kwh * simultaneity_factor).min(consumption_kwh);
    let savings_simultaneous = simultaneous * tariff;

    let new_credit = (generation_kwh - simultaneous).max(0.0);
    let remaining = (consumption_kwh - simultaneous).max(0.0);

    let abated_new = new_credit.min(remaining);
    let still_remaining = remaining - abated_new;
    let abated_bank = bank_kwh.min(still_remaining);

    let surplus = new_credit - abated_new;
    *bank_kwh = *bank_kwh - abated_bank + surplus;

    let fio_b_charge = (abated_new + abated_bank) * fio_b * noncompensated_fraction;
    let savings_credit = (abated_new + abated_bank) * tariff - fio_b_charge;

    LocalMonthOutcome {
        savings: savings_simultaneous + savings_credit,
        simultaneous_kwh: simultaneous,
        abated_new_kwh: abated_new,
        abated_bank_kwh: abated_bank,
        fio_b_charge,
    }
}

/// One month of remote Group B abatement against an allocated credit lot.
///
/// Credits are produced at the generator's tariff and spent at the remote
/// unit's; the equivalence factor converts between the two. Returns the
/// savings and the unspent part of the lot.
pub fn remote_b_month(
    credits_kwh: f64,
    consumption_kwh: f64,
    generator_tariff: f64,
    remote_tariff: f64,
    remote_fio_b: f64,
    noncompensated_fraction: f64,
) -> (f64, f64) {
    if remote_tariff <= 0.0 || credits_kwh <= 0.0 {
        return (0.0, credits_kwh.max(0.0));
    }
    let equivalence = generator_tariff / remote_tariff;
    let credits_equivalent = credits_kwh / equivalence;
    let abated = credits_equivalent.min(consumption_kwh);
    let credits_used = abated * equivalence;
    let leftover = credits_kwh - credits_used;

    let fio_b_charge = abated * remote_fio_b * noncompensated_fraction;
    let savings = abated * remote_tariff - fio_b_charge;
    (savings, leftover)
}

/// Result of one month of Group A abatement (off-peak priority).
#[derive(Debug, Clone, Copy)]
pub struct RemoteAMonthOutcome {
    pub savings: f64,
    pub leftover_kwh: f64,
    pub abated_off_peak_kwh: f64,
    pub abated_peak_kwh: f64,
    /// Credits burnt on the peak band (abated × f)
    pub credits_used_peak_kwh: f64,
}

/// One month of Group A abatement against an allocated credit lot.
///
/// Off-peak is abated 1:1 first; the remainder abates peak consumption
/// through the TE-ratio factor `f` (1 kWh of peak costs `f` kWh of
/// credits). Savings value each band at tariff − TUSD.
pub fn remote_a_month(
    credits_kwh: f64,
    consumption_off_peak_kwh: f64,
    consumption_peak_kwh: f64,
    tariff_off_peak: f64,
    tariff_peak: f64,
    tusd_off_peak: f64,
    tusd_peak: f64,
    peak_factor: f64,
) -> RemoteAMonthOutcome {
    let credits = credits_kwh.max(0.0);
    let abated_off_peak = credits.min(consumption_off_peak_kwh);
    let after_off_peak = credits - abated_off_peak;

    let factor = peak_factor.max(1e-9);
    let abated_peak = (after_off_peak / factor).min(consumption_peak_kwh);
    let credits_used_peak = abated_peak * factor;
    let leftover = after_off_peak - credits_used_peak;

    let savings_off_peak = abated_off_peak * (tariff_off_peak - tusd_off_peak);
    let savings_peak = abated_peak * (tariff_peak - tusd_peak);

    RemoteAMonthOutcome {
        savings: savings_off_peak + savings_peak,
        leftover_kwh: leftover,
        abated_off_peak_kwh: abated_off_peak,
        abated_peak_kwh: abated_peak,
        credits_used_peak_kwh: credits_used_peak,
    }
}
