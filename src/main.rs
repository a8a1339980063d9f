//! loss-analytics - batch analytics runner
//!
//! One-shot batch analyses over the production time-series store, invoked
//! by the orchestrating service (or an operator) per scheduled run. Each
//! subcommand performs a single analysis over a window ending now and
//! prints the structured result as JSON on stdout.
//!
//! # Usage
//!
//! ```bash
//! # Univariate anomalies + aggregated alerts for a line
//! loss-analytics anomalies LINE-A --window-hours 24 --lookback-days 30
//!
//! # Pattern rules over one asset's telemetry
//! loss-analytics patterns CNC-7 --window-hours 24
//!
//! # Mahalanobis multivariate detection
//! loss-analytics multivariate LINE-A --window-hours 24
//!
//! # OEE for an asset, loss Pareto and trend forecast for a line
//! loss-analytics oee CNC-7 --window-hours 8
//! loss-analytics losses LINE-A --window-hours 168
//! loss-analytics trend LINE-A --days-history 30 --days-forecast 7
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL`: Postgres/TimescaleDB connection string
//! - `LOSS_ANALYTICS_CONFIG`: path to analytics.toml threshold overrides
//! - `RUST_LOG`: logging level (default: info)

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use loss_analytics::cache::SledCache;
use loss_analytics::config::AnalyticsConfig;
use loss_analytics::engine::AnalyticsEngine;
use loss_analytics::store::{create_pool, PgStore};
use loss_analytics::types::TimeRange;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "loss-analytics")]
#[command(about = "Statistical loss analytics for production telemetry")]
#[command(version)]
struct CliArgs {
    /// Postgres/TimescaleDB connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Path of the local ideal-cycle-time cache
    #[arg(long, env = "LOSS_ANALYTICS_CACHE", default_value = "data/cycle_cache")]
    cache_path: PathBuf,

    /// Explicit analytics.toml path (otherwise the standard lookup order)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Univariate OEE anomaly detection for a line, plus aggregated alerts
    Anomalies {
        line_id: String,
        /// Recent window scored against the baseline, hours
        #[arg(long, default_value_t = 24)]
        window_hours: i64,
        /// Baseline lookback before the recent window, days
        #[arg(long, default_value_t = 30)]
        lookback_days: i64,
    },
    /// Heuristic pattern rules over one asset's telemetry
    Patterns {
        asset_id: String,
        #[arg(long, default_value_t = 24)]
        window_hours: i64,
    },
    /// Multivariate (Mahalanobis) detection across a line
    Multivariate {
        line_id: String,
        #[arg(long, default_value_t = 24)]
        window_hours: i64,
    },
    /// OEE calculation for one asset
    Oee {
        asset_id: String,
        #[arg(long, default_value_t = 8)]
        window_hours: i64,
    },
    /// Pareto loss analysis for a line
    Losses {
        line_id: String,
        #[arg(long, default_value_t = 168)]
        window_hours: i64,
    },
    /// Daily-OEE trend fit and forward projection for a line
    Trend {
        line_id: String,
        #[arg(long, default_value_t = 30)]
        days_history: i64,
        #[arg(long, default_value_t = 7)]
        days_forecast: usize,
    },
}

/// Window of the trailing `hours` ending now.
fn trailing_hours(hours: i64) -> TimeRange {
    let end = Utc::now();
    TimeRange::new(end - Duration::hours(hours), end)
}

/// Window of the trailing `days` ending now.
fn trailing_days(days: i64) -> TimeRange {
    let end = Utc::now();
    TimeRange::new(end - Duration::days(days), end)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    let config = match &args.config {
        Some(path) => AnalyticsConfig::load_from(path),
        None => AnalyticsConfig::load(),
    };

    let pool = create_pool(&args.database_url)
        .await
        .context("connecting to the time-series store")?;
    let cache = SledCache::open(&args.cache_path)
        .with_context(|| format!("opening cycle-time cache at {}", args.cache_path.display()))?;

    let engine = AnalyticsEngine::new(PgStore::new(pool), cache, config);

    match args.command {
        Command::Anomalies {
            line_id,
            window_hours,
            lookback_days,
        } => {
            let recent = trailing_hours(window_hours);
            let historical = TimeRange::new(
                recent.start - Duration::days(lookback_days),
                recent.start,
            );
            let anomalies = engine
                .detect_oee_anomalies(&line_id, &recent, &historical)
                .await?;
            let alerts = engine.generate_alerts(&anomalies);
            info!(
                anomalies = anomalies.len(),
                alerts = alerts.len(),
                "detection run finished"
            );
            print_json(&serde_json::json!({
                "anomalies": anomalies,
                "alerts": alerts,
            }))?;
        }
        Command::Patterns {
            asset_id,
            window_hours,
        } => {
            let events = engine
                .detect_pattern_anomalies(&asset_id, &trailing_hours(window_hours))
                .await?;
            print_json(&events)?;
        }
        Command::Multivariate {
            line_id,
            window_hours,
        } => {
            let observations = engine
                .detect_multivariate_anomalies(&line_id, &trailing_hours(window_hours))
                .await?;
            print_json(&observations)?;
        }
        Command::Oee {
            asset_id,
            window_hours,
        } => {
            let record = engine
                .calculate_oee(&asset_id, &trailing_hours(window_hours))
                .await?;
            print_json(&record)?;
        }
        Command::Losses {
            line_id,
            window_hours,
        } => {
            let analysis = engine
                .analyze_losses(&line_id, &trailing_hours(window_hours))
                .await?;
            print_json(&analysis)?;
        }
        Command::Trend {
            line_id,
            days_history,
            days_forecast,
        } => {
            let analysis = engine
                .forecast_oee_trend(&line_id, &trailing_days(days_history), days_forecast)
                .await?;
            print_json(&analysis)?;
        }
    }

    Ok(())
}
