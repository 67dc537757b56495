// core/state.rs

// Vehicle state threaded through every control cycle, plus the navigation
// phase machine (Planning -> Cycling -> Arrived). The loop owns one
// `VehicleState` and lends each component exclusive access to the part it is
// allowed to change: the governor writes speed, the integrator writes position
// and consumes the route.

use log::info;
use serde::Serialize;
use std::collections::VecDeque;

use super::geometry::{Position, Waypoint, path_length};

/// Navigation phases
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum NavPhase {
    /// No route yet
    Planning,
    /// Following the route, one cycle per time step
    Cycling,
    /// Within tolerance of the destination (terminal)
    Arrived,
}

/// Mutable state of the vehicle during a run
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VehicleState {
    /// Current position
    pub position: Position,
    /// Current speed in km/h, never negative
    pub speed: f64,
    /// Remaining waypoints. The front entry is the last point passed, the
    /// second is the point being driven toward.
    pub route: VecDeque<Waypoint>,
}

impl VehicleState {
    /// Vehicle at `position` with no route. Negative speeds are floored at 0.
    pub fn new(position: Position, speed: f64) -> Self {
        VehicleState {
            position,
            speed: speed.max(0.0),
            route: VecDeque::new(),
        }
    }

    /// Replaces the route queue with a freshly planned one.
    pub fn load_route(&mut self, waypoints: Vec<Waypoint>) {
        info!("Loaded route with {} waypoints", waypoints.len());
        self.route = waypoints.into();
    }

    /// Waypoint currently being driven toward, if any.
    pub fn next_waypoint(&self) -> Option<&Waypoint> {
        self.route.get(1)
    }

    /// Length of the remaining route measured from the current position.
    pub fn remaining_route_length(&self) -> f64 {
        match self.next_waypoint() {
            Some(next) => {
                self.position.distance_to(&next.position) + path_length(self.route.iter().skip(1))
            }
            None => 0.0,
        }
    }
}
