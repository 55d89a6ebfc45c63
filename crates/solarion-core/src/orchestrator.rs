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

//! The hybrid orchestrator: weather → PV simulation → hourly profiles →
//! BESS dispatch → financial comparison, assembled into the three-block
//! response.

use crate::validation::validate_hybrid_request;
use solarion_bess::dispatch::simulate_annual_operation;
use solarion_bess::profile::{ProfileCalendar, build_load_profile, build_solar_profile};
use solarion_finance::hybrid::{HybridFinancialInput, analyze_hybrid_system};
use solarion_solar::irradiation::analyze_irradiation;
use solarion_solar::mppt::check_mppt_sizing;
use solarion_solar::simulate::PvSimulator;
use solarion_types::error::{EngineError, Result};
use solarion_types::requests::{
    HybridDimensioningRequest, IrradiationAnalysisRequest, MpptSizingRequest,
};
use solarion_types::responses::{
    HourlySeriesBlock, HybridDimensioningResponse, IrradiationAnalysisResponse, MpptSizingResult,
};
use solarion_weather::WeatherProvider;
use tracing::info;

/// Owns the composition; one instance per process, shared across workers.
#[derive(Debug, Clone)]
pub struct HybridOrchestrator<'a> {
    provider: &'a WeatherProvider,
    calendar: ProfileCalendar,
}

impl<'a> HybridOrchestrator<'a> {
    pub fn new(provider: &'a WeatherProvider) -> Self {
        Self {
            provider,
            calendar: ProfileCalendar::default(),
        }
    }

    pub fn with_reference_year(provider: &'a WeatherProvider, reference_year: i32) -> Self {
        Self {
            provider,
            calendar: ProfileCalendar { reference_year },
        }
    }

    /// Runs the full hybrid dimensioning pipeline.
    pub fn calculate_hybrid(
        &self,
        request: &HybridDimensioningRequest,
    ) -> Result<HybridDimensioningResponse> {
        validate_hybrid_request(request)?;
        info!("Hybrid dimensioning started");

        // Stage 1: PV production.
        let simulator = PvSimulator::new(self.provider);
        let pv = simulator.simulate(&request.pv)?;
        info!(
            "PV stage done: {:.2} kWp, {:.0} kWh/year",
            pv.summary.power_kwp, pv.summary.annual_energy_kwh
        );

        // Stage 2: hourly profiles on the reference calendar.
        let load_w = build_load_profile(
            &request.pv.consumption.monthly_kwh,
            request.pv.consumption.hourly_shape_pct.as_ref(),
            self.calendar,
        );
        let solar_w = build_solar_profile(&pv.summary.monthly_generation_kwh, self.calendar);

        // Stage 3: BESS dispatch.
        let bess = simulate_annual_operation(
            &request.bess.spec,
            request.bess.strategy,
            &request.pv.tariff,
            &solar_w,
            &load_w,
            request.bess.peak_shaving_limit_kw,
        )?;
        info!(
            "BESS stage done: {:.1} cycles, savings R$ {:.2}",
            bess.summary.equivalent_cycles, bess.summary.annual_savings
        );

        // Stage 4: integrated financial comparison.
        let investment_solar = pv.summary.power_kwp * request.economics.solar_capex_per_kwp;
        let investment_bess = request.bess.capex();
        let analysis = analyze_hybrid_system(
            &pv.summary,
            &bess.summary,
            &HybridFinancialInput {
                investment_solar,
                investment_bess,
                consumption_annual_kwh: request.pv.consumption.annual_kwh(),
                mean_tariff_kwh: request.pv.tariff.daily_mean_kwh(),
                discount_rate: request.economics.discount_rate_pct / 100.0,
                energy_inflation: request.economics.energy_inflation_pct / 100.0,
                lifetime_years: request.economics.lifetime_years,
            },
        )?;

        let series = request.include_series.then(|| HourlySeriesBlock {
            soc_pct: bess.soc_series.iter().map(|s| s * 100.0).collect(),
            battery_kw: bess.battery_kw_series.clone(),
            grid_kw: bess.grid_kw_series.clone(),
            pv_kw: solar_w.iter().map(|w| w / 1000.0).collect(),
            load_kw: load_w.iter().map(|w| w / 1000.0).collect(),
        });

        info!("Hybrid dimensioning finished");
        Ok(HybridDimensioningResponse {
            solar: pv.summary,
            bess: bess.summary,
            analysis,
            series,
        })
    }

    /// Monthly irradiation analysis for a site.
    pub fn analyze_irradiation(
        &self,
        request: &IrradiationAnalysisRequest,
    ) -> Result<IrradiationAnalysisResponse> {
        analyze_irradiation(self.provider, request)
    }

    /// MPPT sizing check against the site's historical minimum temperature.
    pub fn mppt_sizing(&self, request: &MpptSizingRequest) -> Result<MpptSizingResult> {
        let (frame, _) = self.provider.fetch(
            request.latitude,
            request.longitude,
            request.source,
            request.allow_fallback,
        )?;
        let t_min = frame
            .min_temperature()
            .ok_or_else(|| EngineError::Calculation("weather frame carries no temperature".into()))?;
        check_mppt_sizing(&request.module, &request.inverter, t_min)
    }
}
