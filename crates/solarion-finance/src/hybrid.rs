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

//! The hybrid comparison: four independent flow series — no system,
//! solar only, BESS only, hybrid — under one set of tariff and inflation
//! assumptions. The battery is repositioned at year 10 (0.70 × BESS
//! CAPEX) whenever the horizon extends past it.

use crate::indicators::{discounted_payback_years, irr_pct, npv, simple_payback_years};
use solarion_types::error::Result;
use solarion_types::responses::{
    BessSummary, ComparisonEntry, EnergyFlows, HybridAnalysis, PvSystemSummary, ScenarioComparison,
};
use tracing::info;

/// Annual solar output decay used by the comparison flows.
const SOLAR_DECAY: f64 = 0.995;
/// Annual battery capability decay.
const BESS_DECAY: f64 = 0.975;
/// Reposition cost at year 10, as a fraction of the BESS CAPEX.
const BESS_REPOSITION_FACTOR: f64 = 0.70;
const BESS_REPOSITION_YEAR: u32 = 10;
/// Share of PV generation assumed consumed directly by the load.
const PV_TO_LOAD_SHARE: f64 = 0.60;
/// Share of the charged energy assumed to come from PV.
const PV_TO_BESS_SHARE: f64 = 0.70;
/// Inputs the orchestrator assembles for the comparison.
#[derive(Debug, Clone)]
pub struct HybridFinancialInput {
    pub investment_solar: f64,
    pub investment_bess: f64,
    /// Annual consumption (kWh)
    pub consumption_annual_kwh: f64,
    /// Mean energy tariff (R$/kWh)
    pub mean_tariff_kwh: f64,
    /// Annual discount rate (decimal)
    pub discount_rate: f64,
    /// Annual energy inflation (decimal)
    pub energy_inflation: f64,
    pub lifetime_years: u32,
}

/// Builds the `analise_hibrida` block from the PV and BESS results.
pub fn analyze_hybrid_system(
    solar: &PvSystemSummary,
    bess: &BessSummary,
    input: &HybridFinancialInput,
) -> Result<HybridAnalysis> {
    info!(
        "Hybrid financial analysis: solar R$ {:.0}, BESS R$ {:.0}",
        input.investment_solar, input.investment_bess
    );

    let generation = solar.annual_energy_kwh;
    let consumption = input.consumption_annual_kwh;
    let investment_total = input.investment_solar + input.investment_bess;

    // Energy flows.
    let pv_to_load = generation * PV_TO_LOAD_SHARE;
    let pv_to_bess = bess.charged_kwh * PV_TO_BESS_SHARE;
    let pv_to_grid = (generation - pv_to_load - pv_to_bess).max(0.0);
    let bess_to_load = bess.discharged_kwh;
    let grid_to_load = (consumption - pv_to_load - bess_to_load).max(0.0);

    let self_sufficiency_pct = if consumption > 0.0 {
        ((pv_to_load + bess_to_load) / consumption * 100.0).min(100.0)
    } else {
        0.0
    };
    let solar_self_consumption_pct = if generation > 0.0 {
        ((pv_to_load + pv_to_bess) / generation * 100.0).min(100.0)
    } else {
        0.0
    };

    // Annual first-year savings of each flow.
    let savings_solar = generation * input.mean_tariff_kwh;
    let savings_bess = bess.annual_savings;
    let savings_hybrid = savings_solar + savings_bess;
    let baseline_cost = consumption * input.mean_tariff_kwh;

    let lifetime = input.lifetime_years;
    let reposition = lifetime > BESS_REPOSITION_YEAR;

    // Flow series; index 0 is year 0.
    let mut flow_none = vec![0.0];
    let mut flow_solar = vec![-input.investment_solar];
    let mut flow_bess = vec![-input.investment_bess];
    let mut flow_hybrid = vec![-investment_total];
    for year in 1..=lifetime {
        let inflation = (1.0 + input.energy_inflation).powi(year as i32 - 1);
        let solar_y = savings_solar * SOLAR_DECAY.powi(year as i32) * inflation;
        let mut bess_y = savings_bess * BESS_DECAY.powi(year as i32) * inflation;
        if reposition && year == BESS_REPOSITION_YEAR {
            bess_y -= input.investment_bess * BESS_REPOSITION_FACTOR;
        }
        flow_none.push(-baseline_cost * inflation);
        flow_solar.push(solar_y);
        flow_bess.push(bess_y);
        flow_hybrid.push(solar_y + bess_y);
    }

    let entry = |investment: f64, savings: f64, flows: &[f64]| {
        let (irr, _) = irr_pct(flows);
        ComparisonEntry {
            investment,
            annual_savings: savings,
            npv: npv(input.discount_rate, flows),
            irr_pct: irr,
            payback_years: simple_payback_years(flows),
        }
    };

    let solar_only = entry(input.investment_solar, savings_solar, &flow_solar);
    let bess_only = entry(input.investment_bess, savings_bess, &flow_bess);
    let hybrid = entry(investment_total, savings_hybrid, &flow_hybrid);
    // Doing nothing has no investment and no return; its NPV is the
    // present value of the energy bills it keeps paying.
    let no_system = ComparisonEntry {
        investment: 0.0,
        annual_savings: 0.0,
        npv: npv(input.discount_rate, &flow_none),
        irr_pct: 0.0,
        payback_years: 0.0,
    };

    // LCOE over discounted delivered energy.
    let mut discounted_energy = 0.0;
    for year in 1..=lifetime {
        let energy_y = generation * SOLAR_DECAY.powi(year as i32)
            + bess.discharged_kwh * BESS_DECAY.powi(year as i32);
        discounted_energy += energy_y / (1.0 + input.discount_rate).powi(year as i32);
    }
    let mut total_costs = investment_total;
    if reposition {
        total_costs += input.investment_bess * BESS_REPOSITION_FACTOR
            / (1.0 + input.discount_rate).powi(BESS_REPOSITION_YEAR as i32);
    }
    let lcoe = if discounted_energy > 0.0 {
        total_costs / discounted_energy
    } else {
        0.0
    };

    // Recommendations and alerts.
    let mut recommendations = Vec::new();
    let mut alerts = Vec::new();
    if hybrid.npv > solar_only.npv && hybrid.npv > bess_only.npv {
        recommendations.push(format!(
            "Hybrid system offers the best return (NPV R$ {:.0})",
            hybrid.npv
        ));
    } else if solar_only.npv > hybrid.npv {
        alerts.push("A solar-only system may be more attractive for this profile".to_owned());
    }
    if self_sufficiency_pct > 80.0 {
        recommendations.push(format!(
            "High self-sufficiency ({self_sufficiency_pct:.0}%) reduces grid dependence"
        ));
    } else if self_sufficiency_pct < 50.0 {
        alerts.push("Low self-sufficiency - consider a larger battery".to_owned());
    }
    if hybrid.payback_years > 10.0 {
        alerts.push(format!(
            "Long payback ({:.1} years) may hurt viability",
            hybrid.payback_years
        ));
    }
    if input.discount_rate > 0.10 {
        alerts.push(format!(
            "High discount rate ({:.1}%) reduces project attractiveness",
            input.discount_rate * 100.0
        ));
    }

    Ok(HybridAnalysis {
        flows: EnergyFlows {
            pv_generation_kwh: generation,
            consumption_kwh: consumption,
            pv_to_load_kwh: pv_to_load,
            pv_to_bess_kwh: pv_to_bess,
            pv_to_grid_kwh: pv_to_grid,
            bess_to_load_kwh: bess_to_load,
            grid_to_load_kwh: grid_to_load,
        },
        self_sufficiency_pct,
        solar_self_consumption_pct,
        investment_solar: input.investment_solar,
        investment_bess: input.investment_bess,
        investment_total,
        npv: hybrid.npv,
        irr_pct: hybrid.irr_pct,
        payback_simple_years: hybrid.payback_years,
        payback_discounted_years: discounted_payback_years(&flow_hybrid, input.discount_rate),
        lcoe,
        comparison: ScenarioComparison {
            hybrid_vs_solar_npv: hybrid.npv - solar_only.npv,
            hybrid_vs_bess_npv: hybrid.npv - bess_only.npv,
            no_system,
            solar_only,
            bess_only,
            hybrid,
        },
        recommendations,
        alerts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solar_summary(annual_kwh: f64) -> PvSystemSummary {
        PvSystemSummary {
            power_kwp: 6.48,
            annual_energy_kwh: annual_kwh,
            monthly_generation_kwh: [annual_kwh / 12.0; 12],
            dc_annual_kwh: annual_kwh / 0.93,
            ac_pre_clip_kwh: annual_kwh / 0.955,
            ac_post_clip_kwh: annual_kwh / 0.955,
            performance_ratio_pct: 80.0,
            specific_yield: annual_kwh / 6.48,
            capacity_factor_pct: 17.0,
            by_plane: Vec::new(),
            by_inverter: Vec::new(),
            data_years: vec![2019],
            weather_source: solarion_types::weather::WeatherSource::Pvgis,
            warnings: Vec::new(),
        }
    }

    fn bess_summary(savings: f64) -> BessSummary {
        BessSummary {
            capacity_kwh: 100.0,
            power_kw: 50.0,
            charged_kwh: 20_000.0,
            discharged_kwh: 18_000.0,
            losses_kwh: 2_000.0,
            observed_roundtrip: 0.9,
            equivalent_cycles: 190.0,
            estimated_degradation_pct: 1.9,
            soc_mean_pct: 55.0,
            soc_min_pct: 10.0,
            soc_max_pct: 100.0,
            dod_mean: 0.45,
            utilization_pct: 40.0,
            hours_charging: 1800,
            hours_discharging: 1700,
            hours_idle: 5260,
            cost_without_bess: 60_000.0,
            cost_with_bess: 60_000.0 - savings,
            annual_savings: savings,
        }
    }

    fn input() -> HybridFinancialInput {
        HybridFinancialInput {
            investment_solar: 32_400.0,
            investment_bess: 80_000.0,
            consumption_annual_kwh: 60_000.0,
            mean_tariff_kwh: 0.95,
            discount_rate: 0.08,
            energy_inflation: 0.045,
            lifetime_years: 25,
        }
    }

    #[test]
    fn test_hybrid_npv_beats_both_when_both_pay() {
        // Hardware that makes the hybrid attractive: both stand-alone flows
        // carry a positive NPV, so the combined flow must beat either.
        let analysis =
            analyze_hybrid_system(&solar_summary(9_800.0), &bess_summary(25_000.0), &input())
                .unwrap();
        let c = &analysis.comparison;
        assert!(c.solar_only.npv > 0.0);
        assert!(c.bess_only.npv > 0.0);
        assert!(c.hybrid.npv > c.solar_only.npv.max(c.bess_only.npv));
        assert!(analysis.comparison.hybrid_vs_solar_npv > 0.0);
        assert!(analysis.comparison.hybrid_vs_bess_npv > 0.0);
    }

    #[test]
    fn test_flow_additivity() {
        // The hybrid flow is the sum of the two stand-alone flows, so its
        // NPV is exactly additive.
        let analysis =
            analyze_hybrid_system(&solar_summary(9_800.0), &bess_summary(25_000.0), &input())
                .unwrap();
        let c = &analysis.comparison;
        assert!((c.hybrid.npv - (c.solar_only.npv + c.bess_only.npv)).abs() < 1.0);
    }

    #[test]
    fn test_self_sufficiency_definition() {
        let analysis =
            analyze_hybrid_system(&solar_summary(30_000.0), &bess_summary(25_000.0), &input())
                .unwrap();
        let f = &analysis.flows;
        let expected = (f.pv_to_load_kwh + f.bess_to_load_kwh) / f.consumption_kwh * 100.0;
        assert!((analysis.self_sufficiency_pct - expected.min(100.0)).abs() < 1e-9);
        assert!(analysis.self_sufficiency_pct <= 100.0);
    }

    #[test]
    fn test_reposition_lowers_bess_npv() {
        let mut short = input();
        short.lifetime_years = 10; // no reposition at exactly 10
        let with_reposition =
            analyze_hybrid_system(&solar_summary(9_800.0), &bess_summary(25_000.0), &input())
                .unwrap();
        let without =
            analyze_hybrid_system(&solar_summary(9_800.0), &bess_summary(25_000.0), &short)
                .unwrap();
        // The 25-year horizon carries a reposition; per-year value of the
        // first 10 years is identical, so the delta shows in the flows.
        let r10 = with_reposition.comparison.bess_only.npv;
        let r10_short = without.comparison.bess_only.npv;
        // Longer horizon adds years of savings but subtracts the reposition;
        // just pin that the reposition was actually booked.
        assert!((r10 - r10_short).abs() > 1_000.0);
    }

    #[test]
    fn test_alerts_on_long_payback() {
        let analysis =
            analyze_hybrid_system(&solar_summary(2_000.0), &bess_summary(1_000.0), &input())
                .unwrap();
        assert!(
            analysis
                .alerts
                .iter()
                .any(|a| a.contains("payback") || a.contains("solar-only")),
            "alerts: {:?}",
            analysis.alerts
        );
    }
}
