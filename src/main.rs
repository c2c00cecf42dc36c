mod catalog;
mod config;
mod ephemeris;
mod error;
mod frame;
mod identify;
mod objects;
mod observer;
mod precision;
mod provider;
mod service;
mod visibility;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use catalog::{refresh_group, Catalog};
use config::{Config, BODIES_GROUP};
use error::FinderError;
use identify::PointingQuery;
use observer::Observer;
use precision::AnglePrecision;
use provider::{BodiesProvider, LowPrecisionSun, PropagationProvider, Sgp4Provider};
use service::{parse_time_utc, IdentifyRequest, SkyFinder, VisibleRequest};

#[derive(Parser)]
#[command(
    name = "skyfind",
    version,
    about = "Find which satellites and solar-system bodies are in your sky, or identify the one you are pointing at"
)]
struct Cli {
    /// Configuration file (default: ./skyfind.toml, then the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Angle precision of the results
    #[arg(long, global = true, value_enum)]
    precision: Option<AnglePrecision>,

    /// Log level or filter directive; RUST_LOG takes precedence
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct LocationArgs {
    /// Observer latitude, degrees
    #[arg(long, allow_negative_numbers = true, requires = "lon")]
    lat: Option<f64>,

    /// Observer longitude, degrees
    #[arg(long, allow_negative_numbers = true, requires = "lat")]
    lon: Option<f64>,

    /// Observer altitude, meters
    #[arg(long, allow_negative_numbers = true)]
    alt: Option<f64>,

    /// UTC time as "YYYY-MM-DD HH:MM:SS" (default: now)
    #[arg(long)]
    time: Option<String>,

    /// Object group
    #[arg(long, default_value = "brightest")]
    group: String,
}

#[derive(Subcommand)]
enum Command {
    /// List objects above the horizon
    Visible {
        #[command(flatten)]
        location: LocationArgs,

        /// Include objects below the horizon
        #[arg(long)]
        show_all: bool,

        /// Log per-object diagnostics
        #[arg(long)]
        debug: bool,
    },
    /// Identify the sunlit object nearest a pointing direction
    Identify {
        #[command(flatten)]
        location: LocationArgs,

        /// Pointing azimuth, degrees clockwise from north
        #[arg(long, allow_negative_numbers = true)]
        az: f64,

        /// Pointing elevation, degrees
        #[arg(long, allow_negative_numbers = true)]
        el: f64,

        /// Largest angular error to accept, degrees
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Download fresh element sets for a group
    Refresh {
        #[arg(long)]
        group: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::discover(cli.config.as_deref())?;

    let debug = matches!(cli.command, Command::Visible { debug: true, .. });
    let level = if debug {
        "debug".to_string()
    } else {
        cli.log_level
            .clone()
            .unwrap_or_else(|| config.logging.level.clone())
    };
    init_logging(&level);

    let precision = cli.precision.unwrap_or(config.output.precision);

    match cli.command {
        Command::Visible {
            location,
            show_all,
            debug,
        } => {
            let (observer, time) = resolve_location(&location, &config)?;
            let propagation = open_provider(&config, &location.group)?;
            let finder = SkyFinder::new(propagation.as_ref(), &LowPrecisionSun, precision);

            let records = finder.visible(&VisibleRequest {
                observer,
                time,
                show_all,
                debug,
            })?;
            print_json(&records)?;
        }
        Command::Identify {
            location,
            az,
            el,
            threshold,
        } => {
            let (observer, time) = resolve_location(&location, &config)?;
            let query = PointingQuery::new(
                az,
                el,
                threshold.unwrap_or(config.identify.default_threshold),
            );
            let propagation = open_provider(&config, &location.group)?;
            let finder = SkyFinder::new(propagation.as_ref(), &LowPrecisionSun, precision);

            let records = finder.identify(&IdentifyRequest {
                observer,
                time,
                query,
            })?;
            print_json(&records)?;
        }
        Command::Refresh { group } => {
            if group == BODIES_GROUP {
                return Err(anyhow!("group '{}' is built in and has nothing to refresh", group));
            }
            let group_config = config
                .group(&group)
                .ok_or_else(|| FinderError::UnknownGroup(group.clone()))?;
            let url = group_config
                .url
                .as_deref()
                .ok_or_else(|| anyhow!("group '{}' has no download url configured", group))?;

            let count = refresh_group(url, &group_config.tle_file)
                .with_context(|| format!("refreshing group '{}'", group))?;
            println!("Updated {} with {} objects", group_config.tle_file.display(), count);
        }
    }

    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_location(args: &LocationArgs, config: &Config) -> Result<(Observer, DateTime<Utc>)> {
    let observer = match (args.lat, args.lon, &config.observer) {
        (Some(lat), Some(lon), _) => Observer::new(lat, lon, args.alt.unwrap_or(0.0)),
        (_, _, Some(configured)) => {
            tracing::debug!(name = %configured.name, "using configured observer");
            Observer::new(
                configured.latitude,
                configured.longitude,
                args.alt.unwrap_or(configured.altitude),
            )
        }
        _ => {
            return Err(anyhow!(
                "no observer location: pass --lat and --lon or set [observer] in the configuration"
            ))
        }
    };

    let time = match &args.time {
        Some(text) => parse_time_utc(text)?,
        None => Utc::now(),
    };

    Ok((observer, time))
}

fn open_provider(config: &Config, group: &str) -> Result<Box<dyn PropagationProvider>> {
    tracing::info!(%group, "object group");
    if group == BODIES_GROUP {
        return Ok(Box::new(BodiesProvider));
    }

    let group_config = config
        .group(group)
        .ok_or_else(|| FinderError::UnknownGroup(group.to_string()))?;
    let catalog = Catalog::load(&group_config.tle_file)?;
    Ok(Box::new(Sgp4Provider::new(catalog)))
}

fn print_json<T: Serialize>(records: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(records)?);
    Ok(())
}
