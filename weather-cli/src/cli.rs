use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use inquire::{Confirm, CustomType, InquireError, Password, PasswordDisplayMode, Text};
use tracing::debug;
use weather_core::{
    Config, Coordinates, Dashboard, OpenWeatherProvider, SearchOutcome,
    geolocation::geolocator_for, provider::provider_from_config,
};

use crate::output;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-dashboard", version, about = "Current weather and 5-day forecast")]
pub struct Cli {
    /// Print the dashboard as JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and an optional home position.
    Configure,

    /// Show weather for a city.
    Search {
        /// City name, e.g. "New York".
        #[arg(required = true, num_args = 1..)]
        city: Vec<String>,
    },

    /// Show weather for the device position, or a fallback city.
    Locate(PositionArgs),

    /// Load by position, then keep prompting for cities.
    Interactive(PositionArgs),
}

#[derive(Debug, Clone, Copy, Args)]
pub struct PositionArgs {
    /// Latitude of the device position (overrides the configured home).
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude of the device position.
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,
}

impl PositionArgs {
    fn coordinates(self) -> Option<Coordinates> {
        Some(Coordinates::new(self.lat?, self.lon?))
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        let json = self.json;

        match self.command {
            Command::Configure => {
                tokio::task::spawn_blocking(configure)
                    .await
                    .context("Configuration prompt panicked")??;
                Ok(ExitCode::SUCCESS)
            }
            Command::Search { city } => {
                let (config, dashboard) = load_dashboard()?;
                debug!(base_url = %config.base_url, "Dashboard ready");

                let outcome = dashboard.search_city(&city.join(" ")).await;
                if outcome == SearchOutcome::Ignored {
                    bail!("City name must not be blank.");
                }
                output::print(&dashboard.view().await, json)?;
                Ok(exit_code(outcome))
            }
            Command::Locate(position) => {
                let (config, dashboard) = load_dashboard()?;
                let geolocator = geolocator_for(position.coordinates(), config.home);

                let outcome = dashboard.load_from_geolocation(geolocator.as_ref()).await;
                output::print(&dashboard.view().await, json)?;
                Ok(exit_code(outcome))
            }
            Command::Interactive(position) => {
                let (config, dashboard) = load_dashboard()?;
                let geolocator = geolocator_for(position.coordinates(), config.home);

                dashboard.load_from_geolocation(geolocator.as_ref()).await;
                output::print(&dashboard.view().await, json)?;

                prompt_loop(&dashboard, json).await?;
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

fn load_dashboard() -> anyhow::Result<(Config, Dashboard<OpenWeatherProvider>)> {
    let config = Config::load()?;
    let provider = provider_from_config(&config)?;
    let dashboard = Dashboard::from_config(provider, &config);
    Ok((config, dashboard))
}

fn exit_code(outcome: SearchOutcome) -> ExitCode {
    match outcome {
        SearchOutcome::Rendered => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}

/// Each submitted line is one search; Esc or Ctrl-C ends the session.
async fn prompt_loop(dashboard: &Dashboard<OpenWeatherProvider>, json: bool) -> anyhow::Result<()> {
    loop {
        let answer = tokio::task::spawn_blocking(|| {
            Text::new("City:")
                .with_help_message("Enter to search, Esc to quit")
                .prompt()
        })
        .await
        .context("Search prompt panicked")?;

        let text = match answer {
            Ok(text) => text,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                return Ok(());
            }
            Err(err) => {
                return Err(anyhow::Error::new(err).context("Failed to read search input"));
            }
        };

        if dashboard.search_city(&text).await != SearchOutcome::Ignored {
            output::print(&dashboard.view().await, json)?;
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()
        .context("Failed to read API key")?;
    let api_key = api_key.trim();
    if api_key.is_empty() {
        bail!("API key must not be empty.");
    }
    config.set_api_key(api_key.to_string());

    let set_home = Confirm::new("Set a home position for start-up lookups?")
        .with_default(config.home.is_some())
        .prompt()
        .context("Failed to read answer")?;

    config.home = if set_home {
        let latitude = CustomType::<f64>::new("Latitude:")
            .with_error_message("Please type a number, e.g. 51.5")
            .prompt()
            .context("Failed to read latitude")?;
        let longitude = CustomType::<f64>::new("Longitude:")
            .with_error_message("Please type a number, e.g. -0.12")
            .prompt()
            .context("Failed to read longitude")?;
        Some(Coordinates::new(latitude, longitude))
    } else {
        None
    };

    config.save()?;
    println!(
        "Saved configuration to {}",
        Config::config_file_path()?.display()
    );

    Ok(())
}
