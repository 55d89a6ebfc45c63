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

//! SolarION CLI: runs the energy-calculation engine against JSON request
//! files. The HTTP layer lives elsewhere; this binary is the local
//! entrypoint for sizing runs, irradiation analysis and cache upkeep.

mod settings;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use settings::Settings;
use solarion_core::{HybridOrchestrator, calculate_group_a, calculate_group_b};
use solarion_types::requests::{
    GroupAFinancialRequest, GroupBFinancialRequest, HybridDimensioningRequest,
    IrradiationAnalysisRequest, MpptSizingRequest,
};
use solarion_weather::WeatherProvider;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "solarion")]
#[command(author, version, about = "SolarION - PV + BESS dimensioning engine")]
#[command(
    long_about = "Sizes and simulates grid-connected PV plants, battery storage and hybrid\n\
    installations for Brazilian sites, and runs their financial viability under\n\
    Law 14.300/2022.\n\
    \nExamples:\n  \
    solarion hybrid --request request.json\n  \
    solarion irradiation --request site.json --output analysis.json\n  \
    solarion cache stats"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full hybrid PV + BESS dimensioning from a JSON request
    Hybrid(RequestArgs),
    /// Monthly irradiation analysis for a site
    Irradiation(RequestArgs),
    /// MPPT sizing check for a module/inverter pairing at a site
    Mppt(RequestArgs),
    /// Group B financial analysis (low-voltage, flat tariff)
    FinancialB(RequestArgs),
    /// Group A financial analysis (Green tariff generating unit)
    FinancialA(RequestArgs),
    /// Weather-data summary for a coordinate (period, GHI/temp/wind stats)
    WeatherSummary {
        #[arg(long)]
        lat: f64,
        #[arg(long)]
        lon: f64,
    },
    /// Geohash cache maintenance
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Parser)]
struct RequestArgs {
    /// Path to the JSON request file
    #[arg(long)]
    request: PathBuf,
    /// Write the JSON response here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum CacheAction {
    /// Print cache statistics
    Stats,
    /// Remove expired entries
    ClearExpired,
    /// Remove every entry
    ClearAll,
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    let cli = Cli::parse();
    let settings = Settings::load()?;
    let provider = WeatherProvider::new(&settings.provider_config());
    let orchestrator = HybridOrchestrator::new(&provider);

    match cli.command {
        Commands::Hybrid(args) => {
            let request: HybridDimensioningRequest = read_request(&args.request)?;
            let response = orchestrator.calculate_hybrid(&request)?;
            write_response(args.output.as_deref(), &response)
        }
        Commands::Irradiation(args) => {
            let request: IrradiationAnalysisRequest = read_request(&args.request)?;
            let response = orchestrator.analyze_irradiation(&request)?;
            write_response(args.output.as_deref(), &response)
        }
        Commands::Mppt(args) => {
            let request: MpptSizingRequest = read_request(&args.request)?;
            let response = orchestrator.mppt_sizing(&request)?;
            write_response(args.output.as_deref(), &response)
        }
        Commands::FinancialB(args) => {
            let request: GroupBFinancialRequest = read_request(&args.request)?;
            let response = calculate_group_b(&request)?;
            write_response(args.output.as_deref(), &response)
        }
        Commands::FinancialA(args) => {
            let request: GroupAFinancialRequest = read_request(&args.request)?;
            let response = calculate_group_a(&request)?;
            write_response(args.output.as_deref(), &response)
        }
        Commands::WeatherSummary { lat, lon } => {
            let summary = provider.data_summary(lat, lon, None, true)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        Commands::Cache { action } => {
            let cache = provider.cache();
            match action {
                CacheAction::Stats => {
                    let stats = cache.stats();
                    println!("{}", serde_json::to_string_pretty(&stats)?);
                }
                CacheAction::ClearExpired => {
                    let removed = cache.clear_expired();
                    info!("Removed {} expired cache entries", removed);
                }
                CacheAction::ClearAll => {
                    let removed = cache.clear_all();
                    info!("Removed {} cache entries", removed);
                }
            }
            Ok(())
        }
    }
}

fn read_request<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read request file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse request file {}", path.display()))
}

fn write_response<T: serde::Serialize>(output: Option<&Path>, response: &T) -> Result<()> {
    let raw = serde_json::to_string_pretty(response)?;
    match output {
        Some(path) => {
            std::fs::write(path, raw)
                .with_context(|| format!("Failed to write response to {}", path.display()))?;
            info!("Response written to {}", path.display());
        }
        None => println!("{raw}"),
    }
    Ok(())
}
