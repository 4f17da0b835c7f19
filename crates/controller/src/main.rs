//! Controller entry point
//!
//! Advances the fitting chain by one Metropolis step per invocation; an
//! external driver alternates controller runs with scenario ensembles.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use btbfit_controller::ControllerSettings;

#[derive(Parser, Debug)]
#[command(name = "btbfit-controller")]
#[command(about = "Adaptive Metropolis controller for bTB cluster fitting")]
struct Cli {
    /// The controller configuration file.
    #[arg(short, long)]
    config: PathBuf,

    /// Accepted for interface parity with the scenario runner; unused.
    #[arg(short, long)]
    params: Option<PathBuf>,

    /// Accepted for interface parity with the scenario runner; unused.
    #[arg(short, long)]
    id: Option<String>,

    /// Log level filter.
    #[arg(short = 'l', long, default_value = "info")]
    level: String,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(config = %cli.config.display(), "initialising controller");

    let settings = match ControllerSettings::load(&cli.config) {
        Ok(settings) => settings,
        Err(e) => {
            error!("failed to load configuration: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = btbfit_controller::run(&settings) {
        error!("controller step failed: {e}");
        process::exit(1);
    }
}
