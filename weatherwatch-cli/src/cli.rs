use anyhow::{Context, bail};
use chrono::Duration;
use clap::{Parser, Subcommand};
use inquire::{
    CustomUserError, Password, Text,
    validator::{ErrorMessage, Validation},
};
use std::path::PathBuf;
use weatherwatch_core::{
    Config, Pipeline, PipelineError, SqliteObservationStore, compute_trend, convert,
    store::ObservationStore, trend::DEFAULT_TREND_WINDOW_HOURS,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherwatch", version, about = "Weather observations, trends and alerts")]
pub struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print results as JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the WeatherAPI key, database location and display timezone.
    Configure,

    /// Fetch current conditions, store them and show alerts and trends.
    Refresh {
        /// Location name, e.g. "Warangal".
        location: String,

        /// Query the forecast endpoint with this many days.
        #[arg(long)]
        days: Option<u8>,
    },

    /// Show the most recent stored observation.
    Latest {
        location: String,
    },

    /// Show averages over a look-back window.
    Trend {
        location: String,

        #[arg(long, default_value_t = DEFAULT_TREND_WINDOW_HOURS)]
        hours: i64,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let json = self.json;
        match self.command {
            Command::Configure => configure(),
            Command::Refresh { location, days } => refresh(&location, days, json).await,
            Command::Latest { location } => latest(&location, json),
            Command::Trend { location, hours } => trend(&location, hours, json),
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let path = Config::config_file_path()?;
    let mut cfg = Config::load_from(&path)?;

    let api_key = Password::new("WeatherAPI key:")
        .without_confirmation()
        .with_help_message("Get one at https://www.weatherapi.com/")
        .prompt()
        .context("Failed to read API key")?;
    cfg.set_api_key(api_key.trim().to_string());

    let default_db = cfg.database_path()?.display().to_string();
    let db = Text::new("Database file:").with_default(&default_db).prompt()?;
    cfg.storage.database_path = Some(PathBuf::from(db.trim()));

    let current_tz = cfg.display_timezone.clone().unwrap_or_else(|| "UTC".to_string());
    let tz = Text::new("Display timezone:")
        .with_default(&current_tz)
        .with_validator(validate_timezone)
        .prompt()?;
    cfg.display_timezone = Some(tz.trim().to_string());

    cfg.save()?;
    println!("Saved configuration to {}", path.display());
    Ok(())
}

fn validate_timezone(input: &str) -> Result<Validation, CustomUserError> {
    Ok(match convert::to_local(chrono::Utc::now(), input.trim()) {
        Ok(_) => Validation::Valid,
        Err(err) => Validation::Invalid(ErrorMessage::Custom(err.to_string())),
    })
}

async fn refresh(location: &str, days: Option<u8>, json: bool) -> anyhow::Result<()> {
    let cfg = Config::load()?;
    let pipeline = Pipeline::from_config(&cfg)?.with_forecast_days(days);

    match pipeline.refresh_location(location).await {
        Ok(outcome) if json => {
            println!("{}", render::json(&outcome)?);
            Ok(())
        }
        Ok(outcome) => {
            println!("{}", render::outcome(&outcome, cfg.display_timezone.as_deref()));
            Ok(())
        }
        Err(PipelineError::LocationNotFound { query }) => bail!("No location found: {query}"),
        Err(err) => {
            Err(err).with_context(|| format!("Failed to refresh weather for '{location}'"))
        }
    }
}

fn open_store(cfg: &Config) -> anyhow::Result<SqliteObservationStore> {
    SqliteObservationStore::open(cfg.database_path()?)
}

fn latest(location: &str, json: bool) -> anyhow::Result<()> {
    let cfg = Config::load()?;
    let store = open_store(&cfg)?;
    let latest = store.latest(location)?;

    if json {
        println!("{}", render::json(&latest)?);
        return Ok(());
    }

    match latest {
        Some(stored) => {
            println!("{}", render::observation(&stored, cfg.display_timezone.as_deref()))
        }
        None => println!("No observations stored for '{location}'."),
    }
    Ok(())
}

/// `--hours` as a window; rejects non-positive and out-of-range values.
fn trend_window(hours: i64) -> anyhow::Result<Duration> {
    if hours <= 0 {
        bail!("--hours must be positive, got {hours}");
    }
    Duration::try_hours(hours).with_context(|| format!("--hours {hours} is too large"))
}

fn trend(location: &str, hours: i64, json: bool) -> anyhow::Result<()> {
    let window = trend_window(hours)?;

    let cfg = Config::load()?;
    let store = open_store(&cfg)?;

    let summary = compute_trend(&store, location, window)?;
    if json {
        println!("{}", render::json(&summary)?);
    } else {
        println!("{}", render::trend(summary.as_ref()));
    }
    Ok(())
}
