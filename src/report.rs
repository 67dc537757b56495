//! Reporting sink for the navigation loop
//!
//! Each cycle produces a `CycleReport` and each run ends with a `TripSummary`.
//! Both go to a `ReportSink` for logging or telemetry; nothing in the control
//! loop reads them back.

use crate::core::{DetectionBatch, NavPhase, Position, TrafficLevel};
use crate::navigation::controller::SpeedTransition;
use crate::navigation::obstacles::Obstacle;
use log::{info, warn};
use serde::Serialize;

/// Detection counts per sensor for one cycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SensorSummary {
    /// Lidar returns
    pub lidar_objects: usize,
    /// Radar echoes
    pub radar_signals: usize,
    /// Objects across all cameras
    pub visual_objects: usize,
}

impl SensorSummary {
    /// Counts the detections in `batch`.
    pub fn from_batch(batch: &DetectionBatch) -> Self {
        SensorSummary {
            lidar_objects: batch.lidar.len(),
            radar_signals: batch.radar.len(),
            visual_objects: batch.visual_object_count(),
        }
    }
}

/// Structured summary of one control cycle
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CycleReport {
    /// 1-based cycle number
    pub cycle: u32,
    /// `None` when the sensor read failed and the cycle ran fail-safe
    pub sensors: Option<SensorSummary>,
    /// Every obstacle scored this cycle
    pub obstacles: Vec<Obstacle>,
    /// Traffic level used this cycle
    pub traffic: TrafficLevel,
    /// Speed after governing, km/h
    pub speed: f64,
    /// Reported speed change, if any
    pub transition: Option<SpeedTransition>,
    /// Position after integration
    pub position: Position,
    /// Straight-line distance to the destination
    pub distance_remaining: f64,
    /// Phase after the arrival check
    pub phase: NavPhase,
}

impl CycleReport {
    /// Obstacles whose danger score is critical.
    pub fn critical_obstacles(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacles.iter().filter(|o| o.is_critical())
    }

    /// True when the cycle ran without sensor data.
    pub fn is_fail_safe(&self) -> bool {
        self.sensors.is_none()
    }
}

/// End-of-run summary
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TripSummary {
    /// Whether the destination was reached
    pub arrived: bool,
    /// Cycles run
    pub cycles: u32,
    /// Where the vehicle ended up
    pub final_position: Position,
    /// Speed at the end of the run, km/h
    pub final_speed: f64,
    /// Obstacles scored over the whole run
    pub total_obstacles: usize,
    /// Waypoints still queued
    pub remaining_waypoints: usize,
    /// Straight-line distance to the destination
    pub distance_remaining: f64,
}

/// Consumer of navigation reports
pub trait ReportSink {
    /// Called once per completed cycle.
    fn cycle(&mut self, report: &CycleReport);
    /// Called once when the run ends.
    fn finish(&mut self, summary: &TripSummary);
}

/// Writes reports to the `log` facade
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl ReportSink for LogSink {
    fn cycle(&mut self, report: &CycleReport) {
        info!("--- Cycle {} ---", report.cycle);
        match &report.sensors {
            Some(s) => info!(
                "Sensors: lidar={} radar={} visual={}",
                s.lidar_objects, s.radar_signals, s.visual_objects
            ),
            None => warn!("Sensors: no data, running fail-safe"),
        }
        info!(
            "Obstacles: {} ({} critical)",
            report.obstacles.len(),
            report.critical_obstacles().count()
        );
        info!(
            "Position: {}, {:.1} m to destination, {:.0} km/h, traffic {}",
            report.position, report.distance_remaining, report.speed, report.traffic
        );
        if report.phase == NavPhase::Arrived {
            info!("Destination reached");
        }
    }

    fn finish(&mut self, summary: &TripSummary) {
        info!(
            "Trip {} after {} cycles: position {}, speed {:.0} km/h, \
             {} obstacles seen, {} waypoints left",
            if summary.arrived { "complete" } else { "not complete" },
            summary.cycles,
            summary.final_position,
            summary.final_speed,
            summary.total_obstacles,
            summary.remaining_waypoints
        );
    }
}

/// Keeps every report in memory, for callers that want the whole trace.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    /// Cycle reports in order
    pub cycles: Vec<CycleReport>,
    /// Trip summary, once the run has finished
    pub summary: Option<TripSummary>,
}

impl ReportSink for RecordingSink {
    fn cycle(&mut self, report: &CycleReport) {
        self.cycles.push(report.clone());
    }

    fn finish(&mut self, summary: &TripSummary) {
        self.summary = Some(summary.clone());
    }
}
