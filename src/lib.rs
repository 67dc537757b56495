//! Eos Autonav - autonomous navigation control loop
//!
//! This library fuses proximity-sensor detections into scored obstacles, governs
//! vehicle speed from traffic and obstacle risk, and advances a point-mass
//! vehicle along a planned waypoint route until it reaches its destination.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// Vehicle-side types: geometry, sensors, traffic and state
pub mod core;
/// Route planning, obstacle scoring, speed governing and the control loop
pub mod navigation;
/// Per-cycle and end-of-trip reporting
pub mod report;

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

// Re-export commonly used items for easier access
pub use crate::core::{
    Detection, DetectionBatch, FixedTraffic, NavPhase, Position, RandomTraffic, SensorError,
    SensorSource, SimulatedSensors, TrafficLevel, TrafficSource, VehicleState, Waypoint,
};
pub use navigation::{
    EvasiveAction, NavigationLoop, Obstacle, ObstacleEvaluator, PerceptionConfig,
    PositionIntegrator, RouteBuilder, RouteConfig, RoutePlan, SpeedConfig, SpeedDecision,
    SpeedGovernor,
};
pub use report::{CycleReport, LogSink, RecordingSink, ReportSink, SensorSummary, TripSummary};

/// Main configuration structure for a navigation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Trip endpoints and loop limits
    pub trip: TripConfig,
    /// Route generation parameters
    pub route: RouteConfig,
    /// Sensor acceptance ranges
    pub perception: PerceptionConfig,
    /// Speed governing parameters
    pub speed: SpeedConfig,
    /// Seed for every random source; `None` seeds from entropy
    pub seed: Option<u64>,
    /// Consecutive failed sensor reads tolerated before the run aborts
    pub max_sensor_failures: u32,
}

/// Trip parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripConfig {
    /// Starting point of the trip
    pub origin: Position,
    /// Point the vehicle is driving to
    pub destination: Position,
    /// Starting speed in km/h
    pub initial_speed: f64,
    /// Cycles to run before giving up on arrival
    pub max_cycles: u32,
    /// Distance to the destination that counts as arrived
    pub arrival_tolerance: f64,
    /// Length of one control cycle in seconds
    pub time_step: f64,
}

impl Default for NavConfig {
    fn default() -> Self {
        NavConfig {
            trip: TripConfig::default(),
            route: RouteConfig::default(),
            perception: PerceptionConfig::default(),
            speed: SpeedConfig::default(),
            seed: None,
            max_sensor_failures: 3,
        }
    }
}

impl Default for TripConfig {
    fn default() -> Self {
        TripConfig {
            origin: Position::new(0.0, 0.0),
            destination: Position::new(100.0, 100.0),
            initial_speed: 50.0,
            max_cycles: 5,
            arrival_tolerance: 5.0,
            time_step: 1.0,
        }
    }
}

impl NavConfig {
    /// Loads and validates a configuration from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, NavError> {
        let file = std::fs::File::open(path.as_ref())?;
        let config: NavConfig = serde_yaml::from_reader(file)?;
        config.validate()?;
        log::info!("Loaded navigation config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Parses and validates a configuration from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, NavError> {
        let config: NavConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every parameter is usable by the control loop.
    pub fn validate(&self) -> Result<(), NavError> {
        let trip = &self.trip;
        if !trip.origin.is_finite() || !trip.destination.is_finite() {
            return Err(NavError::Config("trip endpoints must be finite".into()));
        }
        if !(trip.initial_speed.is_finite() && trip.initial_speed >= 0.0) {
            return Err(NavError::Config(format!(
                "initial speed must be a non-negative number, got {}",
                trip.initial_speed
            )));
        }
        if trip.max_cycles == 0 {
            return Err(NavError::Config("max_cycles must be at least 1".into()));
        }
        if !(trip.arrival_tolerance > 0.0) {
            return Err(NavError::Config("arrival_tolerance must be positive".into()));
        }
        if !(trip.time_step > 0.0) {
            return Err(NavError::Config("time_step must be positive".into()));
        }
        self.route.validate()?;
        self.speed.validate()?;
        Ok(())
    }
}

/// Eos Autonav error types
#[derive(Debug, Error)]
pub enum NavError {
    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),
    /// Could not read a configuration file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Malformed YAML
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// Sensor collaborator failed too many times in a row
    #[error("Sensor failure after {consecutive} consecutive failed reads: {source}")]
    SensorFailure {
        /// Failed reads in a row, including this one
        consecutive: u32,
        /// Error from the last failed read
        #[source]
        source: SensorError,
    },
    /// A cycle was requested after the destination was reached
    #[error("Trip already complete")]
    TripComplete,
}
