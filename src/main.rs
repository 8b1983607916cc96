use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::{info, warn};
use std::fs::File;
use std::path::PathBuf;

use pellet_dosing::dosing::{
    recommend_pellet_protocol_for_male, suggest_estradiol_dosing, suggest_testosterone_dosing,
    suggestions::summarize, validate_t100_male_calculation,
};
use pellet_dosing::models::{EstradiolDosageParams, PelletType, TestosteroneDosageParams};
use pellet_dosing::{output, EngineConfig, EstradiolEngine, TestosteroneEngine};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Engine {
    Testosterone,
    Estradiol,
}

#[derive(Parser)]
#[command(name = "pellet_dosing")]
#[command(about = "Hormone pellet dosing calculator")]
struct Cli {
    /// Patient parameter file (JSON)
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory
    #[arg(short, long)]
    output: PathBuf,

    /// Engine configuration file; built-in clinical tables when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Which dosing engine to run
    #[arg(short, long, value_enum, default_value = "testosterone")]
    engine: Engine,

    /// Also compute every dosage tier
    #[arg(long)]
    all_tiers: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("failed to load engine configuration from {:?}", path))?,
        None => EngineConfig::default(),
    };

    std::fs::create_dir_all(&cli.output)
        .with_context(|| format!("failed to create output directory {:?}", cli.output))?;

    match cli.engine {
        Engine::Testosterone => run_testosterone(&cli, config),
        Engine::Estradiol => run_estradiol(&cli, config),
    }
}

fn run_testosterone(cli: &Cli, config: EngineConfig) -> anyhow::Result<()> {
    let file = File::open(&cli.input).with_context(|| format!("failed to open {:?}", cli.input))?;
    let params: TestosteroneDosageParams =
        serde_json::from_reader(file).with_context(|| format!("failed to parse {:?}", cli.input))?;

    let engine = TestosteroneEngine::new(config)?;
    let result = engine.calculate_dosage(&params)?;
    info!(
        "{:?} {:?}: {} mg in {} pellets, expected duration {} days",
        result.pellet_type,
        result.tier,
        result.dosing_calculation.final_dose_mg,
        result.dosing_calculation.pellet_count,
        result.clinical_recommendations.expected_duration_days
    );

    let validation = if params.protocol_selection.pellet_type == PelletType::T100
        && params.patient_demographics.is_male()
    {
        let recommendation = recommend_pellet_protocol_for_male(
            &params.lifestyle_factors,
            &params.medications,
            &params.genetic_data,
            &params.protocol_selection,
        );
        info!(
            "Protocol recommendation: {:?} ({}) - {}",
            recommendation.protocol,
            recommendation.strength.label(),
            recommendation.rationale
        );

        let report = validate_t100_male_calculation(&result, &params);
        for error in &report.errors {
            warn!("Validation error: {}", error);
        }
        Some(report)
    } else {
        None
    };

    output::save_testosterone_result(&result, validation.as_ref(), &cli.output)?;

    if cli.all_tiers {
        let suggestions = suggest_testosterone_dosing(&engine, &params)?;
        output::save_tier_summary(&summarize(&suggestions), &cli.output)?;
    }

    info!("Results saved to {:?}", cli.output);
    Ok(())
}

fn run_estradiol(cli: &Cli, config: EngineConfig) -> anyhow::Result<()> {
    let file = File::open(&cli.input).with_context(|| format!("failed to open {:?}", cli.input))?;
    let params: EstradiolDosageParams =
        serde_json::from_reader(file).with_context(|| format!("failed to parse {:?}", cli.input))?;

    let engine = EstradiolEngine::new(&config)?;
    let result = engine.calculate_dosage(&params)?;
    info!(
        "Estradiol {:?}: {} mg ({})",
        result.tier, result.dosing_calculation.final_dose_mg, result.dosing_calculation.pellet_configuration
    );

    output::save_estradiol_result(&result, &cli.output)?;

    if cli.all_tiers {
        let suggestions = suggest_estradiol_dosing(&engine, &params)?;
        output::save_tier_summary(&summarize(&suggestions), &cli.output)?;
    }

    info!("Results saved to {:?}", cli.output);
    Ok(())
}
