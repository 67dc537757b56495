// core/geometry.rs

// Plane geometry for the vehicle: positions, waypoints and the vector math the
// route builder and position integrator share.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A point on the navigation plane (distance units are metres).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Position {
    /// Creates a position from plane coordinates.
    pub const fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }

    /// Euclidean distance to another position.
    pub fn distance_to(&self, other: &Position) -> f64 {
        (other.to_vector() - self.to_vector()).norm()
    }

    /// Vector pointing from `self` to `other`.
    pub fn vector_to(&self, other: &Position) -> Vector2<f64> {
        other.to_vector() - self.to_vector()
    }

    /// Linear interpolation between `self` (factor 0) and `other` (factor 1).
    pub fn lerp(&self, other: &Position, factor: f64) -> Position {
        Position::from_vector(self.to_vector() + self.vector_to(other) * factor)
    }

    /// Offsets the position by a displacement vector.
    pub fn translated(&self, delta: Vector2<f64>) -> Position {
        Position::from_vector(self.to_vector() + delta)
    }

    /// Rounds both coordinates to the given number of decimal places.
    pub fn rounded(&self, decimals: u32) -> Position {
        let scale = 10f64.powi(decimals as i32);
        Position {
            x: (self.x * scale).round() / scale,
            y: (self.y * scale).round() / scale,
        }
    }

    /// True when both coordinates are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// As an `nalgebra` vector.
    pub fn to_vector(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }

    /// From an `nalgebra` vector.
    pub fn from_vector(v: Vector2<f64>) -> Self {
        Position { x: v.x, y: v.y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// One point of a planned route together with its ordinal in that route.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Index in the route (0 = origin)
    pub index: usize,
    /// Location of the waypoint
    pub position: Position,
}

impl Waypoint {
    /// Creates a waypoint.
    pub fn new(index: usize, position: Position) -> Self {
        Waypoint { index, position }
    }
}

/// Sum of consecutive segment lengths along a sequence of waypoints.
pub fn path_length<'a, I>(waypoints: I) -> f64
where
    I: IntoIterator<Item = &'a Waypoint>,
{
    let mut total = 0.0;
    let mut previous: Option<&Waypoint> = None;
    for wp in waypoints {
        if let Some(prev) = previous {
            total += prev.position.distance_to(&wp.position);
        }
        previous = Some(wp);
    }
    total
}

/// Converts a speed in km/h to m/s.
pub fn kmh_to_ms(speed_kmh: f64) -> f64 {
    speed_kmh * 1000.0 / 3600.0
}
