// src/main.rs
// Entry point for the Eos autonav demo: plans a trip, then runs the control loop
// against simulated sensors and random traffic until arrival or the cycle limit.

// Imports dependencies and Eos modules.
// - env_logger: Logging for debugging (RUST_LOG overrides the default `info`).
// - serde_yaml: Trip summary printed as YAML on stdout.
use eos_autonav::{LogSink, NavConfig, NavigationLoop};
use log::info;
use std::error::Error;

/// Main function to load configuration and run one trip.
/// Usage: `eos-autonav [config.yaml]`
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("Starting Eos autonomous navigation...");

    let config = match std::env::args().nth(1) {
        Some(path) => NavConfig::from_yaml_file(path)?,
        None => NavConfig::default(),
    };

    info!(
        "Vehicle at {}, destination {}, initial speed {:.0} km/h",
        config.trip.origin, config.trip.destination, config.trip.initial_speed
    );

    let mut nav = NavigationLoop::simulated(config)?;
    nav.plan_route();

    let summary = nav.run(&mut LogSink)?;

    println!("{}", serde_yaml::to_string(&summary)?);
    Ok(())
}
