// src/navigation/planner.rs
// Builds the waypoint route the vehicle follows from origin to destination.

// Imports dependencies and shared types.
// - rand: jitter source, injected so runs can be replayed from a seed.
// - nalgebra (via Position): interpolation along the straight line.
use crate::NavError;
use crate::core::{Position, Waypoint, kmh_to_ms, path_length};
use log::info;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Route generation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    /// Straight-line distance covered by each route segment
    pub point_spacing: f64,
    /// Lower bound on the number of segments
    pub min_points: usize,
    /// Half-width of the uniform offset applied to intermediate points
    pub jitter: f64,
    /// Decimal places kept on intermediate coordinates
    pub decimals: u32,
}

impl Default for RouteConfig {
    fn default() -> Self {
        RouteConfig {
            point_spacing: 20.0,
            min_points: 5,
            jitter: 5.0,
            decimals: 1,
        }
    }
}

impl RouteConfig {
    pub(crate) fn validate(&self) -> Result<(), NavError> {
        if !(self.point_spacing > 0.0) {
            return Err(NavError::Config("route point_spacing must be positive".into()));
        }
        if self.min_points == 0 {
            return Err(NavError::Config("route min_points must be at least 1".into()));
        }
        if !(self.jitter.is_finite() && self.jitter >= 0.0) {
            return Err(NavError::Config("route jitter must be a non-negative number".into()));
        }
        Ok(())
    }
}

/// A planned route and its summary figures
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutePlan {
    /// Ordered waypoints; first is the origin, last is the destination
    pub waypoints: Vec<Waypoint>,
    /// Sum of the segment lengths
    pub path_length: f64,
    /// Travel time in seconds at the planning speed, `None` when stopped.
    /// Informational only.
    pub estimated_time: Option<f64>,
}

impl RoutePlan {
    /// Waypoints strictly between origin and destination.
    pub fn intermediate_count(&self) -> usize {
        self.waypoints.len().saturating_sub(2)
    }
}

/// Straight-line route builder with street-grid jitter.
pub struct RouteBuilder {
    config: RouteConfig,
}

impl RouteBuilder {
    /// Creates a new route builder.
    pub fn new(config: &RouteConfig) -> Self {
        RouteBuilder {
            config: config.clone(),
        }
    }

    /// Plans a route from `origin` to `destination`.
    /// - `speed`: current speed (km/h), used only for the time estimate.
    /// - `rng`: jitter source for the intermediate points.
    ///
    /// The segment count is `max(min_points, floor(d / point_spacing))`. Each
    /// intermediate point sits at `i / n` along the straight line, displaced
    /// independently on both axes by up to `jitter`, and is rounded. The
    /// endpoints are kept exactly. Coincident endpoints give a one-point route.
    pub fn build_route<R: Rng + ?Sized>(
        &self,
        origin: Position,
        destination: Position,
        speed: f64,
        rng: &mut R,
    ) -> RoutePlan {
        let distance = origin.distance_to(&destination);

        let waypoints = if distance <= f64::EPSILON {
            vec![Waypoint::new(0, origin)]
        } else {
            let segments = self.segment_count(distance);
            (0..=segments)
                .map(|i| {
                    let position = if i == 0 {
                        origin
                    } else if i == segments {
                        destination
                    } else {
                        let base = origin.lerp(&destination, i as f64 / segments as f64);
                        self.perturb(base, rng).rounded(self.config.decimals)
                    };
                    Waypoint::new(i, position)
                })
                .collect::<Vec<_>>()
        };

        let length = path_length(&waypoints);
        let speed_ms = kmh_to_ms(speed);
        let estimated_time = (speed_ms > 0.0).then(|| length / speed_ms);

        let plan = RoutePlan {
            waypoints,
            path_length: length,
            estimated_time,
        };

        info!(
            "Route planned: {} -> {}, {} intermediate points, {:.1} m",
            origin,
            destination,
            plan.intermediate_count(),
            plan.path_length
        );
        match plan.estimated_time {
            Some(t) => info!("Estimated travel time: {:.1} s at {:.0} km/h", t, speed),
            None => info!("No travel time estimate: vehicle is stopped"),
        }

        plan
    }

    fn segment_count(&self, distance: f64) -> usize {
        let by_spacing = (distance / self.config.point_spacing).floor() as usize;
        by_spacing.max(self.config.min_points)
    }

    fn perturb<R: Rng + ?Sized>(&self, base: Position, rng: &mut R) -> Position {
        let j = self.config.jitter;
        if j == 0.0 {
            return base;
        }
        Position::new(base.x + rng.gen_range(-j..=j), base.y + rng.gen_range(-j..=j))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn builder() -> RouteBuilder {
        RouteBuilder::new(&RouteConfig::default())
    }

    #[test]
    fn diagonal_route_has_one_point_per_twenty_units() {
        let mut rng = StdRng::seed_from_u64(1);
        let plan = builder().build_route(
            Position::new(0.0, 0.0),
            Position::new(100.0, 100.0),
            50.0,
            &mut rng,
        );
        // d = 141.4 -> floor(7.07) = 7 segments -> 8 points
        assert_eq!(plan.waypoints.len(), 8);
        assert_eq!(plan.intermediate_count(), 6);
        assert!(plan.waypoints.iter().enumerate().all(|(i, w)| w.index == i));
    }

    #[test]
    fn short_route_uses_minimum_point_count() {
        let mut rng = StdRng::seed_from_u64(2);
        let plan = builder().build_route(
            Position::new(0.0, 0.0),
            Position::new(30.0, 0.0),
            50.0,
            &mut rng,
        );
        assert_eq!(plan.waypoints.len(), 6);
    }

    #[test]
    fn intermediate_points_stay_within_jitter_and_are_rounded() {
        let mut rng = StdRng::seed_from_u64(3);
        let origin = Position::new(0.0, 0.0);
        let destination = Position::new(200.0, 0.0);
        let plan = builder().build_route(origin, destination, 50.0, &mut rng);
        let n = plan.waypoints.len() - 1;
        for wp in &plan.waypoints[1..n] {
            let ideal = origin.lerp(&destination, wp.index as f64 / n as f64);
            assert!((wp.position.x - ideal.x).abs() <= 5.05);
            assert!((wp.position.y - ideal.y).abs() <= 5.05);
            assert_eq!(wp.position, wp.position.rounded(1));
        }
    }

    #[test]
    fn coincident_endpoints_give_single_point_route() {
        let mut rng = StdRng::seed_from_u64(4);
        let p = Position::new(12.5, -3.0);
        let plan = builder().build_route(p, p, 50.0, &mut rng);
        assert_eq!(plan.waypoints, vec![Waypoint::new(0, p)]);
        assert_eq!(plan.path_length, 0.0);
    }

    #[test]
    fn time_estimate_uses_metres_per_second() {
        let config = RouteConfig {
            jitter: 0.0,
            ..RouteConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(5);
        let plan = RouteBuilder::new(&config).build_route(
            Position::new(0.0, 0.0),
            Position::new(100.0, 0.0),
            36.0,
            &mut rng,
        );
        assert!((plan.path_length - 100.0).abs() < 1e-9);
        assert!((plan.estimated_time.unwrap() - 10.0).abs() < 1e-9);

        let stopped = RouteBuilder::new(&config).build_route(
            Position::new(0.0, 0.0),
            Position::new(100.0, 0.0),
            0.0,
            &mut rng,
        );
        assert!(stopped.estimated_time.is_none());
    }
}
