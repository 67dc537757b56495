// src/navigation/obstacles.rs
// Turns raw detections into scored obstacles with a recommended evasive action.

use crate::core::{Bearing, Detection, DetectionBatch, ObjectKind, SensorKind};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Danger score above which an obstacle is critical
pub const CRITICAL_DANGER: f64 = 0.7;

/// Lidar range under which the vehicle must brake regardless of bearing
const BRAKE_DISTANCE: f64 = 15.0;

/// Radar closing speed at or below which the target is pulling away fast enough to pass
const OVERTAKE_CLOSING_SPEED: f64 = -5.0;

/// Per-source acceptance thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptionConfig {
    /// Lidar detections must be strictly closer than this
    pub lidar_range: f64,
    /// Radar detections must be strictly closer than this
    pub radar_range: f64,
    /// Camera detections must be strictly closer than this
    pub camera_range: f64,
    /// Camera detections must be strictly more confident than this
    pub camera_min_confidence: f64,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        PerceptionConfig {
            lidar_range: 50.0,
            radar_range: 100.0,
            camera_range: 30.0,
            camera_min_confidence: 0.8,
        }
    }
}

/// What the vehicle should do about an obstacle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EvasiveAction {
    /// Something is inside braking distance
    BrakeImmediately,
    /// Obstacle ahead
    ReduceSpeed,
    /// Obstacle alongside
    ChangeLane,
    /// Obstacle behind
    MaintainCourse,
    /// Radar target holding or closing
    MaintainDistance,
    /// Radar target pulling away
    MayOvertake,
    /// Needs confirmation from a second system; never acted on alone
    ConfirmVisual,
}

impl fmt::Display for EvasiveAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EvasiveAction::BrakeImmediately => "BRAKE_IMMEDIATELY",
            EvasiveAction::ReduceSpeed => "REDUCE_SPEED",
            EvasiveAction::ChangeLane => "CHANGE_LANE",
            EvasiveAction::MaintainCourse => "MAINTAIN_COURSE",
            EvasiveAction::MaintainDistance => "MAINTAIN_DISTANCE",
            EvasiveAction::MayOvertake => "MAY_OVERTAKE",
            EvasiveAction::ConfirmVisual => "CONFIRM_VISUAL",
        };
        f.write_str(label)
    }
}

/// A scored detection. Lives for one cycle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Sensor that produced the detection
    pub source: SensorKind,
    /// Where the obstacle is
    pub bearing: Bearing,
    /// Range in metres
    pub distance: f64,
    /// Object class, when known
    pub object: Option<ObjectKind>,
    /// Closing speed, when measured
    pub relative_speed: Option<f64>,
    /// Camera confidence, when visual
    pub confidence: Option<f64>,
    /// Saturating risk score in [0, 1]
    pub danger_score: f64,
    /// Recommended response
    pub action: EvasiveAction,
}

impl Obstacle {
    /// True when the danger score is above `CRITICAL_DANGER`.
    pub fn is_critical(&self) -> bool {
        self.danger_score > CRITICAL_DANGER
    }
}

/// Additive, saturating danger score.
///
/// Distance contributes 0.8 / 0.5 / 0.2 below 10 / 25 / 50 m. Closing speed
/// contributes 0.6 above 10 and 0.3 above 0. The sum is clamped to [0, 1];
/// NaN inputs contribute nothing.
pub fn danger_score(distance: f64, relative_speed: f64) -> f64 {
    let proximity: f64 = if distance < 10.0 {
        0.8
    } else if distance < 25.0 {
        0.5
    } else if distance < 50.0 {
        0.2
    } else {
        0.0
    };

    let closing: f64 = if relative_speed > 10.0 {
        0.6
    } else if relative_speed > 0.0 {
        0.3
    } else {
        0.0
    };

    (proximity + closing).clamp(0.0, 1.0)
}

/// Evasive action for a Lidar return.
pub fn lidar_action(bearing: Bearing, distance: f64) -> EvasiveAction {
    if distance < BRAKE_DISTANCE {
        return EvasiveAction::BrakeImmediately;
    }
    match bearing {
        Bearing::Compass(point) if point.is_northern() => EvasiveAction::ReduceSpeed,
        Bearing::Compass(point) if point.is_lateral() => EvasiveAction::ChangeLane,
        _ => EvasiveAction::MaintainCourse,
    }
}

/// Evasive action for a radar echo.
pub fn radar_action(relative_speed: f64) -> EvasiveAction {
    if relative_speed > OVERTAKE_CLOSING_SPEED {
        EvasiveAction::MaintainDistance
    } else {
        EvasiveAction::MayOvertake
    }
}

/// Scores detections against a fixed danger model.
///
/// Overlapping detections of one physical object from different sensors are
/// kept as separate obstacles; there is no cross-source association.
pub struct ObstacleEvaluator {
    config: PerceptionConfig,
}

impl ObstacleEvaluator {
    /// Creates a new obstacle evaluator
    pub fn new(config: &PerceptionConfig) -> Self {
        ObstacleEvaluator {
            config: config.clone(),
        }
    }

    /// Scores every relevant detection in the batch.
    pub fn evaluate(&self, batch: &DetectionBatch) -> Vec<Obstacle> {
        let obstacles = batch
            .iter()
            .filter_map(|d| self.classify(d))
            .collect::<Vec<_>>();

        for obstacle in obstacles.iter().filter(|o| o.is_critical()) {
            warn!(
                "Critical obstacle: {} at {:.1} m ({}) - {}",
                obstacle
                    .object
                    .map(|o| format!("{:?}", o))
                    .unwrap_or_else(|| format!("{:?} target", obstacle.source)),
                obstacle.distance,
                obstacle.bearing,
                obstacle.action
            );
        }

        obstacles
    }

    /// Scores one detection, or returns `None` when it falls outside the
    /// acceptance window for its sensor.
    pub fn classify(&self, detection: &Detection) -> Option<Obstacle> {
        let distance = detection.distance;
        if !(distance.is_finite() && distance >= 0.0) {
            debug!("Discarding detection with invalid distance {}", distance);
            return None;
        }

        let (closing_speed, action) = match detection.source {
            SensorKind::Lidar => {
                if distance >= self.config.lidar_range {
                    return None;
                }
                (
                    detection.relative_speed.unwrap_or(0.0),
                    lidar_action(detection.bearing, distance),
                )
            }
            SensorKind::Radar => {
                if distance >= self.config.radar_range {
                    return None;
                }
                let relative_speed = detection.relative_speed.unwrap_or(0.0);
                (relative_speed, radar_action(relative_speed))
            }
            SensorKind::Camera => {
                let confidence = detection.confidence.unwrap_or(0.0);
                let trusted = distance < self.config.camera_range
                    && confidence > self.config.camera_min_confidence;
                if !trusted {
                    return None;
                }
                // Cameras give no closing speed
                (0.0, EvasiveAction::ConfirmVisual)
            }
        };

        let score = danger_score(distance, closing_speed);
        debug!(
            "{:?} detection at {:.1} m ({}) scored {:.2}",
            detection.source, distance, detection.bearing, score
        );

        Some(Obstacle {
            source: detection.source,
            bearing: detection.bearing,
            distance,
            object: detection.object,
            relative_speed: detection.relative_speed,
            confidence: detection.confidence,
            danger_score: score,
            action,
        })
    }
}

/// The critical subset of an obstacle list.
pub fn critical(obstacles: &[Obstacle]) -> Vec<&Obstacle> {
    obstacles.iter().filter(|o| o.is_critical()).collect()
}
