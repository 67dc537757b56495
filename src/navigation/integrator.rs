// src/navigation/integrator.rs
// Advances the vehicle along its route by straight-line steps.

use crate::core::{Position, Waypoint, kmh_to_ms};
use log::{debug, info};
use std::collections::VecDeque;

/// Result of one integration step
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Advance {
    /// Distance travelled this step
    pub travelled: f64,
    /// Waypoint reached (and removed from the queue) this step
    pub reached: Option<Waypoint>,
}

/// Moves a point-mass vehicle toward the next queued waypoint.
///
/// A step may overshoot an intermediate waypoint; the overshoot is kept and
/// the waypoint is consumed.
pub struct PositionIntegrator {
    time_step: f64,
}

impl PositionIntegrator {
    /// Creates an integrator for a fixed time step in seconds.
    pub fn new(time_step: f64) -> Self {
        PositionIntegrator { time_step }
    }

    /// Advances `position` for one time step at `speed` (km/h).
    ///
    /// The queue's front entry is the waypoint last passed; the vehicle heads
    /// for the second. Does nothing when fewer than two waypoints remain or
    /// the vehicle is stopped. The queue never grows.
    pub fn advance(
        &self,
        position: &mut Position,
        route: &mut VecDeque<Waypoint>,
        speed: f64,
    ) -> Advance {
        if route.len() < 2 || !(speed > 0.0) {
            return Advance::default();
        }

        let step = kmh_to_ms(speed) * self.time_step;
        let target = route[1];
        let heading = position.vector_to(&target.position);
        let distance_to_target = heading.norm();

        let Some(direction) = heading.try_normalize(f64::EPSILON) else {
            // Sitting on the waypoint: consume it and hold position this step
            debug!("Already at waypoint {}, holding position", target.index);
            route.pop_front();
            return Advance {
                travelled: 0.0,
                reached: Some(target),
            };
        };

        *position = position.translated(direction * step);

        let reached = if distance_to_target < step {
            route.pop_front();
            info!("Reached waypoint {} at {}", target.index, target.position);
            Some(target)
        } else {
            None
        };

        Advance {
            travelled: step,
            reached,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(points: &[(f64, f64)]) -> VecDeque<Waypoint> {
        points
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| Waypoint::new(i, Position::new(x, y)))
            .collect()
    }

    #[test]
    fn moves_toward_next_waypoint() {
        let integrator = PositionIntegrator::new(1.0);
        let mut position = Position::new(0.0, 0.0);
        let mut queue = route(&[(0.0, 0.0), (0.0, 100.0)]);
        let step = integrator.advance(&mut position, &mut queue, 36.0);
        assert!((position.y - 10.0).abs() < 1e-9);
        assert!(position.x.abs() < 1e-9);
        assert_eq!(step.travelled, 10.0);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn overshoot_consumes_waypoint() {
        let integrator = PositionIntegrator::new(1.0);
        let mut position = Position::new(0.0, 0.0);
        let mut queue = route(&[(0.0, 0.0), (4.0, 0.0), (50.0, 0.0)]);
        let step = integrator.advance(&mut position, &mut queue, 36.0);
        assert!((position.x - 10.0).abs() < 1e-9);
        assert_eq!(step.reached.map(|w| w.index), Some(1));
        assert_eq!(queue.front().map(|w| w.index), Some(1));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn stopped_or_exhausted_is_a_no_op() {
        let integrator = PositionIntegrator::new(1.0);
        let mut position = Position::new(1.0, 1.0);
        let mut queue = route(&[(0.0, 0.0), (10.0, 0.0)]);
        assert_eq!(integrator.advance(&mut position, &mut queue, 0.0), Advance::default());

        let mut single = route(&[(1.0, 1.0)]);
        assert_eq!(integrator.advance(&mut position, &mut single, 50.0), Advance::default());
        assert_eq!(position, Position::new(1.0, 1.0));
        assert_eq!(single.len(), 1);
    }

    #[test]
    fn coincident_waypoint_is_consumed_without_moving() {
        let integrator = PositionIntegrator::new(1.0);
        let mut position = Position::new(5.0, 5.0);
        let mut queue = route(&[(0.0, 0.0), (5.0, 5.0), (20.0, 5.0)]);
        let step = integrator.advance(&mut position, &mut queue, 50.0);
        assert_eq!(position, Position::new(5.0, 5.0));
        assert_eq!(step.travelled, 0.0);
        assert_eq!(queue.len(), 2);
    }
}
