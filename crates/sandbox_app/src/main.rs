//! # sandbox_app — simulation runner
//!
//! Builds the world (maze walls plus roaming robots), then runs the
//! fixed-timestep loop: obstacle rebuild gate, agent behavior, physics step.
//!
//! Usage: `sandbox_app [config.toml]` — all settings have defaults, so the
//! config file is optional.

mod config;
mod factory;
mod kinematics;
mod sim;

use std::path::PathBuf;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::SimConfig;
use sim::Simulation;

fn main() -> Result<()> {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("sandbox_app=info".parse()?))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => SimConfig::load(&PathBuf::from(path))?,
        None => SimConfig::default(),
    };
    info!(
        cell_size = config.cell_size,
        agents = config.agent_count,
        "sandbox starting"
    );

    let mut sim = Simulation::new(config);
    sim.populate()?;
    sim.run();

    info!("sandbox shut down");
    Ok(())
}
