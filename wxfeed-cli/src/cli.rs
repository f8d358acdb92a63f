use anyhow::{Context, bail};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use clap::{Parser, Subcommand};
use inquire::{Password, Select, Text};
use tracing::{error, info};
use wxfeed_core::{Config, HttpTransport, Station, Units, WeatherRecords};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "wxfeed", version, about = "Weather station feed")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure location, API key and units.
    Configure,

    /// Run one refresh cycle and print the result.
    Show {
        /// Print the decoded records as JSON.
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { json } => show(json).await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut cfg = Config::load()?;

    cfg.city = Text::new("City:").with_default(&cfg.city).prompt()?;
    cfg.country = Text::new("Country code:").with_default(&cfg.country).prompt()?;

    let key = Password::new("API key (leave empty to keep current):")
        .without_confirmation()
        .prompt()?;
    if !key.trim().is_empty() {
        cfg.api_key = key.trim().to_string();
    }

    let current = Units::all().iter().position(|u| *u == cfg.units).unwrap_or_default();
    cfg.units = Select::new("Units:", Units::all().to_vec())
        .with_starting_cursor(current)
        .prompt()?;
    cfg.language = Text::new("Language:").with_default(&cfg.language).prompt()?;

    cfg.validate()?;
    cfg.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(json: bool) -> anyhow::Result<()> {
    let cfg = Config::load()?;
    cfg.validate()?;

    info!(city = %cfg.city, units = %cfg.units, "Refreshing weather data");
    let transport = Box::new(HttpTransport::from_config(&cfg));
    let mut station = Station::new(&cfg, transport).context("Failed to set up station")?;

    if !station.refresh().await {
        error!(city = %cfg.city, country = %cfg.country, "Refresh cycle failed");
        bail!("Failed to receive weather data for {}, {}", cfg.city, cfg.country);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(station.records())?);
    } else {
        print!("{}", render(station.records(), cfg.units));
    }

    Ok(())
}

fn render(records: &WeatherRecords, units: Units) -> String {
    let (temp, pressure, rain) = match units {
        Units::Metric => ("°C", "hPa", "mm"),
        Units::Imperial => ("°F", "inHg", "in"),
    };
    let c = &records.conditions;
    let offset = c.utc_offset().unwrap_or_else(|| Utc.fix());

    let mut out = String::new();
    out.push_str(&format!("{} ({}) icon {}\n", c.main, c.description, c.icon));
    out.push_str(&format!(
        "  {:.1}{temp} (low {:.1}, high {:.1}), humidity {:.0}%\n",
        c.temperature, c.low, c.high, c.humidity
    ));
    out.push_str(&format!("  pressure {:.2} {pressure} trend {}\n", c.pressure, c.trend));
    out.push_str(&format!(
        "  wind {:.1} at {:.0}°, clouds {}%, visibility {} m\n",
        c.wind_speed, c.wind_direction, c.cloud_cover, c.visibility
    ));
    out.push_str(&format!(
        "  sunrise {} sunset {}\n",
        local_time(c.sunrise_time(), offset),
        local_time(c.sunset_time(), offset)
    ));

    out.push_str("Forecast:\n");
    for (i, p) in records.forecast.iter().enumerate() {
        // only the first period is converted to imperial
        let unit = if i == 0 { rain } else { "mm" };
        out.push_str(&format!(
            "  {} {:>6.1}{temp} {:>8.1} hPa rain {:.2}{unit} snow {:.2}{unit} {}\n",
            local_time(p.time(), offset),
            p.temperature,
            p.pressure,
            p.rainfall,
            p.snowfall,
            p.icon
        ));
    }

    out
}

fn local_time(time: Option<DateTime<Utc>>, offset: FixedOffset) -> String {
    time.map(|t| t.with_timezone(&offset).format("%a %H:%M").to_string())
        .unwrap_or_else(|| "--".to_string())
}
