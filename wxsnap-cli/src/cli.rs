use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Select, Text};
use tracing::debug;
use wxsnap_core::{Config, UnitSystem, service_from_config};

use crate::report;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "wxsnap", version, about = "Weather snapshot for a US postal code")]
pub struct Cli {
    /// Log progress to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the default postal code and unit system.
    Configure,

    /// Show current conditions and forecast for a postal code.
    Show {
        /// US postal code; falls back to the configured default.
        postal_code: Option<String>,

        /// Unit selector: "us" or "f" for US customary, anything else for metric.
        #[arg(short, long)]
        units: Option<String>,

        /// Number of hourly periods used for the high/low line.
        #[arg(
            long,
            default_value_t = report::DEFAULT_PERIODS,
            value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
        )]
        periods: usize,

        /// Print the report and current readings as JSON.
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show {
                postal_code,
                units,
                periods,
                json,
            } => show(postal_code, units, periods, json).await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let current_code = config.default_postal_code.clone().unwrap_or_default();
    let postal_code = Text::new("Default postal code:")
        .with_default(&current_code)
        .prompt()
        .context("Failed to read postal code")?;

    let options = vec!["us", "si"];
    let start = match config.unit_system() {
        UnitSystem::Imperial => 0,
        UnitSystem::Metric => 1,
    };
    let units = Select::new("Units:", options)
        .with_starting_cursor(start)
        .prompt()
        .context("Failed to read unit selection")?;

    config.set_default_postal_code(postal_code.trim());
    config.set_units(units);
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(
    postal_code: Option<String>,
    units: Option<String>,
    periods: usize,
    json: bool,
) -> anyhow::Result<()> {
    let config = Config::load()?;

    let postal_code = match postal_code {
        Some(code) => code,
        None => config.default_postal_code()?.to_string(),
    };
    let units = match units {
        Some(selector) => UnitSystem::from_selector(&selector),
        None => config.unit_system(),
    };

    debug!(%postal_code, %units, "fetching snapshot");
    let service = service_from_config(&config)?;
    let snapshot = service
        .fetch_weather(&postal_code, units)
        .await
        .with_context(|| format!("Failed to fetch weather for {postal_code}"))?;

    let text = report::text_report(&snapshot, periods);
    if json {
        let value = report::json_report(&snapshot, &text);
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{text}");
    }

    Ok(())
}
