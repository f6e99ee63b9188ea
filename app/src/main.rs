// In app/src/main.rs

use anyhow::{Context, Result};
use api_client::ApiClient;
use app_config::Settings;
use clap::{Parser, Subcommand};
use core_types::{Evaluation, Ticker};
use engine::Engine;
use std::path::PathBuf;
use tracing_subscriber::prelude::*;

// --- Command-Line Interface Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = "Price vs. SMA crossover alerts for B3 tickers.")]
struct Cli {
    /// Directory holding `base.toml` and the per-environment overrides.
    #[arg(long, global = true, default_value = "config")]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs the analysis on the configured schedule until Ctrl-C.
    Run,

    /// Runs a single analysis pass over every configured ticker and exits.
    Once,

    /// Evaluates one ticker and prints the result. Nothing is recorded.
    Analyze {
        /// The ticker to analyze (e.g., "PETR4").
        #[arg(short, long)]
        ticker: String,
    },
}

// --- Main Application Entry Point ---

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from a .env file, if it exists.
    dotenvy::dotenv().ok();

    // Parse command-line arguments.
    let cli = Cli::parse();

    let settings = app_config::load_settings(&cli.config_dir)
        .with_context(|| format!("failed to load settings from {}", cli.config_dir.display()))?;

    init_tracing(&settings.app.log_level);
    tracing::info!(environment = %settings.app.environment, "Application settings loaded successfully.");

    match cli.command {
        Commands::Run => {
            let engine = Engine::from_settings(&settings).await?;
            engine.run().await?;
        }
        Commands::Once => {
            let engine = Engine::from_settings(&settings).await?;
            let summary = engine.run_once().await;
            if summary.failed_fetches == summary.tickers {
                anyhow::bail!("Every ticker failed to fetch.");
            }
        }
        Commands::Analyze { ticker } => {
            handle_analyze(&settings, &ticker).await?;
        }
    }

    tracing::info!("Application has finished successfully.");

    Ok(())
}

fn init_tracing(log_level: &str) {
    let level = log_level.parse::<tracing::Level>().unwrap_or(tracing::Level::INFO);
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_filter(tracing_subscriber::filter::Targets::new()
            .with_target("sqlx::query", tracing::Level::WARN) // Disable sqlx query debug logs
            .with_default(level));
    tracing_subscriber::registry().with(fmt_layer).init();

    if !log_level.eq_ignore_ascii_case(level.as_str()) {
        tracing::warn!(log_level, "Unknown log level. Falling back to INFO.");
    }
}

// --- "Analyze" Subcommand Logic ---

async fn handle_analyze(settings: &Settings, raw_ticker: &str) -> Result<()> {
    let ticker = Ticker::new(raw_ticker)?;
    let source = ApiClient::new(&settings.quotes)?;
    let detector = strategies::factory::create_detector(&settings.signal)?;

    let report = engine::analyze_ticker(&source, detector.as_ref(), &ticker).await?;

    println!("{} ({} fetched, {} valid)", report.ticker, report.fetched, report.valid);
    match &report.evaluation {
        Evaluation::InsufficientData { valid_points, required } => {
            println!("  not enough data: {valid_points} valid points, {required} required");
        }
        Evaluation::NoCrossover { timestamp, price, sma } => {
            println!("  {timestamp}: price {price}, SMA {sma}, no crossover");
        }
        Evaluation::Crossover(alert) => {
            println!(
                "  {}: {} signal, price {} crossed SMA({}) {}",
                alert.timestamp, alert.kind, alert.price, alert.window, alert.sma
            );
        }
    }

    Ok(())
}
