// src/navigation/controller.rs
// Governs vehicle speed from traffic conditions and critical obstacles.

// Imports shared types.
// - TrafficLevel: exogenous congestion input for the cycle.
// - Obstacle: scored detections from the obstacle evaluator.
use crate::NavError;
use crate::core::TrafficLevel;
use crate::navigation::obstacles::Obstacle;
use log::info;
use serde::{Deserialize, Serialize};

/// Speed governing parameters. All speeds in km/h.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedConfig {
    /// Base speed on an open road
    pub free: f64,
    /// Base speed in moderate traffic
    pub moderate: f64,
    /// Base speed in heavy traffic
    pub heavy: f64,
    /// Base speed in congestion
    pub congested: f64,
    /// Base speed when the traffic level is not recognised
    pub unknown: f64,
    /// Gaps larger than this are closed in steps instead of at once
    pub rate_limit_threshold: f64,
    /// Speed gained per cycle while closing a large gap upward
    pub accel_step: f64,
    /// Speed shed per cycle while closing a large gap downward
    pub brake_step: f64,
    /// Changes larger than this are reported
    pub report_threshold: f64,
}

impl Default for SpeedConfig {
    fn default() -> Self {
        SpeedConfig {
            free: 80.0,
            moderate: 60.0,
            heavy: 40.0,
            congested: 20.0,
            unknown: 50.0,
            rate_limit_threshold: 20.0,
            accel_step: 15.0,
            brake_step: 20.0,
            report_threshold: 5.0,
        }
    }
}

impl SpeedConfig {
    pub(crate) fn validate(&self) -> Result<(), NavError> {
        let speeds = [self.free, self.moderate, self.heavy, self.congested, self.unknown];
        if speeds.iter().any(|s| !(s.is_finite() && *s >= 0.0)) {
            return Err(NavError::Config("base speeds must be non-negative numbers".into()));
        }
        if !(self.accel_step > 0.0 && self.brake_step > 0.0) {
            return Err(NavError::Config("speed steps must be positive".into()));
        }
        if !(self.rate_limit_threshold >= 0.0 && self.report_threshold >= 0.0) {
            return Err(NavError::Config("speed thresholds must be non-negative".into()));
        }
        Ok(())
    }
}

/// Direction of a reported speed change
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SpeedTrend {
    /// Speed went up
    Accelerating,
    /// Speed went down
    Braking,
    /// Speed unchanged
    Holding,
}

/// A reportable speed change and what caused it
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SpeedTransition {
    /// Speed before the change
    pub from: f64,
    /// Speed after the change
    pub to: f64,
    /// Direction of the change
    pub trend: SpeedTrend,
    /// Traffic level this cycle
    pub traffic: TrafficLevel,
    /// Critical obstacles seen this cycle
    pub critical_count: usize,
    /// Distance to the nearest critical obstacle, if any
    pub nearest_critical: Option<f64>,
}

/// Outcome of one governing step
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SpeedDecision {
    /// Speed to drive at this cycle
    pub speed: f64,
    /// Speed the governor is working toward
    pub target: f64,
    /// Present only when the change exceeds the report threshold
    pub transition: Option<SpeedTransition>,
}

/// Maps traffic level and obstacle risk to a rate-limited speed.
pub struct SpeedGovernor {
    config: SpeedConfig,
}

impl SpeedGovernor {
    /// Creates a new speed governor
    pub fn new(config: &SpeedConfig) -> Self {
        SpeedGovernor {
            config: config.clone(),
        }
    }

    /// Base target speed for a traffic level.
    pub fn base_speed(&self, traffic: TrafficLevel) -> f64 {
        match traffic {
            TrafficLevel::Free => self.config.free,
            TrafficLevel::Moderate => self.config.moderate,
            TrafficLevel::Heavy => self.config.heavy,
            TrafficLevel::Congested => self.config.congested,
            TrafficLevel::Unknown => self.config.unknown,
        }
    }

    /// Target speed once the nearest critical obstacle has had its say.
    pub fn target_speed(&self, traffic: TrafficLevel, obstacles: &[Obstacle]) -> f64 {
        let base = self.base_speed(traffic);
        match nearest_critical(obstacles) {
            Some(d) if d < 10.0 => 0.0,
            Some(d) if d < 20.0 => base.min(15.0),
            Some(d) if d < 50.0 => base.min(30.0),
            _ => base,
        }
    }

    /// Picks this cycle's speed.
    /// - `traffic`: congestion level for the cycle.
    /// - `obstacles`: every obstacle scored this cycle (critical ones are filtered here).
    /// - `current`: speed at the start of the cycle.
    pub fn decide(
        &self,
        traffic: TrafficLevel,
        obstacles: &[Obstacle],
        current: f64,
    ) -> SpeedDecision {
        let target = self.target_speed(traffic, obstacles);
        let critical_count = obstacles.iter().filter(|o| o.is_critical()).count();
        self.step_toward(target, current, traffic, critical_count, nearest_critical(obstacles))
    }

    /// Maximum-caution decision for a cycle with no usable sensor data: the
    /// target drops to zero and the usual braking limit applies.
    pub fn fail_safe(&self, traffic: TrafficLevel, current: f64) -> SpeedDecision {
        self.step_toward(0.0, current, traffic, 0, None)
    }

    /// Moves `current` toward `target`, closing large gaps by at most one
    /// step per cycle. Never returns a negative speed.
    pub fn rate_limit(&self, target: f64, current: f64) -> f64 {
        let gap = target - current;
        let next = if gap.abs() > self.config.rate_limit_threshold {
            if gap > 0.0 {
                current + self.config.accel_step
            } else {
                current - self.config.brake_step
            }
        } else {
            target
        };
        next.max(0.0)
    }

    fn step_toward(
        &self,
        target: f64,
        current: f64,
        traffic: TrafficLevel,
        critical_count: usize,
        nearest: Option<f64>,
    ) -> SpeedDecision {
        let speed = self.rate_limit(target, current);

        let transition = ((speed - current).abs() > self.config.report_threshold).then(|| {
            let trend = if speed > current {
                SpeedTrend::Accelerating
            } else if speed < current {
                SpeedTrend::Braking
            } else {
                SpeedTrend::Holding
            };
            info!(
                "{:?}: {:.0} -> {:.0} km/h (traffic {}, {} critical obstacles)",
                trend, current, speed, traffic, critical_count
            );
            if let Some(d) = nearest {
                info!("Nearest critical obstacle: {:.1} m", d);
            }
            SpeedTransition {
                from: current,
                to: speed,
                trend,
                traffic,
                critical_count,
                nearest_critical: nearest,
            }
        });

        SpeedDecision {
            speed,
            target,
            transition,
        }
    }
}

/// Distance to the closest obstacle whose danger score is critical.
fn nearest_critical(obstacles: &[Obstacle]) -> Option<f64> {
    obstacles
        .iter()
        .filter(|o| o.is_critical())
        .map(|o| o.distance)
        .min_by(|a, b| a.total_cmp(b))
}
