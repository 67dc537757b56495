// core/mod.rs

// Declares the vehicle-side building blocks the navigation loop works on:
// plane geometry, the sensor contract, traffic input and the per-run vehicle
// state.

/// Positions, waypoints and distance helpers
pub mod geometry;
/// Detections and the sensor contract
pub mod perception;
/// Vehicle state and navigation phase
pub mod state;
/// Traffic levels and their sources
pub mod traffic;

pub use geometry::{Position, Waypoint, kmh_to_ms, path_length};
pub use perception::{
    Bearing, CameraReport, CompassPoint, Detection, DetectionBatch, Mount, ObjectKind, SensorError,
    SensorKind, SensorSource, SimulatedSensors,
};
pub use state::{NavPhase, VehicleState};
pub use traffic::{FixedTraffic, RandomTraffic, TrafficLevel, TrafficSource};
