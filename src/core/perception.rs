// core/perception.rs

// Sensor-fusion contract for the navigation loop. A `SensorSource` hands back one
// complete `DetectionBatch` per control cycle: Lidar returns around the eight
// compass points, front/rear radar echoes and the objects reported by the four
// mounted cameras. `SimulatedSensors` stands in for the hardware during demos
// and tests, drawing every reading from an injected random generator.

use log::info;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::SystemTime;
use thiserror::Error;

/// Which sensor produced a detection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorKind {
    /// Rotating laser range finder
    Lidar,
    /// Front/rear Doppler radar
    Radar,
    /// Visual classifier on one of the body cameras
    Camera,
}

/// Eight-way compass bearing used by the Lidar ring
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompassPoint {
    /// Straight ahead
    North,
    /// Ahead, right
    NorthEast,
    /// Right
    East,
    /// Behind, right
    SouthEast,
    /// Straight behind
    South,
    /// Behind, left
    SouthWest,
    /// Left
    West,
    /// Ahead, left
    NorthWest,
}

impl CompassPoint {
    /// Every compass point, clockwise from North.
    pub const ALL: [CompassPoint; 8] = [
        CompassPoint::North,
        CompassPoint::NorthEast,
        CompassPoint::East,
        CompassPoint::SouthEast,
        CompassPoint::South,
        CompassPoint::SouthWest,
        CompassPoint::West,
        CompassPoint::NorthWest,
    ];

    /// North, North-East and North-West: the points ahead of the vehicle.
    pub fn is_northern(self) -> bool {
        matches!(
            self,
            CompassPoint::North | CompassPoint::NorthEast | CompassPoint::NorthWest
        )
    }

    /// East or West: directly beside the vehicle.
    pub fn is_lateral(self) -> bool {
        matches!(self, CompassPoint::East | CompassPoint::West)
    }

    /// Points along the direction of travel, where Lidar can resolve longitudinal speed.
    pub fn is_longitudinal(self) -> bool {
        matches!(self, CompassPoint::North | CompassPoint::South)
    }
}

/// Fixed sensor mounting position on the vehicle body
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mount {
    /// Front of the body
    Front,
    /// Rear of the body
    Rear,
    /// Left side
    Left,
    /// Right side
    Right,
}

impl Mount {
    /// Radar units sit front and rear only.
    pub const RADAR: [Mount; 2] = [Mount::Front, Mount::Rear];
    /// One camera on each side of the body.
    pub const CAMERAS: [Mount; 4] = [Mount::Front, Mount::Rear, Mount::Left, Mount::Right];
}

/// Where a detection was observed relative to the vehicle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bearing {
    /// Lidar ring direction
    Compass(CompassPoint),
    /// Mounting position of the radar or camera
    Mount(Mount),
}

impl fmt::Display for Bearing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bearing::Compass(point) => write!(f, "{:?}", point),
            Bearing::Mount(mount) => write!(f, "{:?}", mount),
        }
    }
}

/// Object classes reported by Lidar and the camera classifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Any vehicle (Lidar)
    Vehicle,
    /// Person on foot
    Pedestrian,
    /// Fixed obstruction (Lidar)
    StaticObject,
    /// Passenger car (camera)
    Car,
    /// Truck (camera)
    Truck,
    /// Motorcycle (camera)
    Motorcycle,
    /// Road sign (camera)
    Sign,
}

impl ObjectKind {
    const LIDAR: [ObjectKind; 3] = [
        ObjectKind::Vehicle,
        ObjectKind::Pedestrian,
        ObjectKind::StaticObject,
    ];
    const VISUAL: [ObjectKind; 5] = [
        ObjectKind::Car,
        ObjectKind::Truck,
        ObjectKind::Motorcycle,
        ObjectKind::Pedestrian,
        ObjectKind::Sign,
    ];
}

/// One raw sensor observation, before any scoring
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Sensor that saw the object
    pub source: SensorKind,
    /// Where the object is relative to the vehicle
    pub bearing: Bearing,
    /// Range to the object in metres
    pub distance: f64,
    /// Closing speed; positive means the object is approaching
    pub relative_speed: Option<f64>,
    /// Classifier confidence in [0, 1]
    pub confidence: Option<f64>,
    /// Object class, when the sensor reports one
    pub object: Option<ObjectKind>,
    /// Radar return strength in [0, 1]
    pub signal_strength: Option<f64>,
}

impl Detection {
    /// A Lidar return. `speed` is only resolvable along the travel axis.
    pub fn lidar(
        direction: CompassPoint,
        distance: f64,
        object: ObjectKind,
        speed: Option<f64>,
    ) -> Self {
        Detection {
            source: SensorKind::Lidar,
            bearing: Bearing::Compass(direction),
            distance,
            relative_speed: speed,
            confidence: None,
            object: Some(object),
            signal_strength: None,
        }
    }

    /// A radar echo.
    pub fn radar(mount: Mount, distance: f64, relative_speed: f64, signal_strength: f64) -> Self {
        Detection {
            source: SensorKind::Radar,
            bearing: Bearing::Mount(mount),
            distance,
            relative_speed: Some(relative_speed),
            confidence: None,
            object: None,
            signal_strength: Some(signal_strength),
        }
    }

    /// An object reported by a camera's visual classifier.
    pub fn camera(mount: Mount, distance: f64, confidence: f64, object: ObjectKind) -> Self {
        Detection {
            source: SensorKind::Camera,
            bearing: Bearing::Mount(mount),
            distance,
            relative_speed: None,
            confidence: Some(confidence),
            object: Some(object),
            signal_strength: None,
        }
    }
}

/// Output of one camera for one cycle
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraReport {
    /// Which camera
    pub mount: Mount,
    /// Objects the classifier found
    pub objects: Vec<Detection>,
    /// Image quality estimate in [0, 1]
    pub image_quality: f64,
}

/// Every detection gathered during one control cycle
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionBatch {
    /// When the batch was read
    pub timestamp: SystemTime,
    /// Lidar returns
    pub lidar: Vec<Detection>,
    /// Radar echoes
    pub radar: Vec<Detection>,
    /// One report per camera
    pub cameras: Vec<CameraReport>,
}

impl DetectionBatch {
    /// A batch with no detections from any sensor.
    pub fn empty() -> Self {
        DetectionBatch {
            timestamp: SystemTime::now(),
            lidar: Vec::new(),
            radar: Vec::new(),
            cameras: Vec::new(),
        }
    }

    /// Iterates Lidar, then radar, then camera detections.
    pub fn iter(&self) -> impl Iterator<Item = &Detection> {
        self.lidar
            .iter()
            .chain(self.radar.iter())
            .chain(self.cameras.iter().flat_map(|c| c.objects.iter()))
    }

    /// Total objects reported across all cameras.
    pub fn visual_object_count(&self) -> usize {
        self.cameras.iter().map(|c| c.objects.len()).sum()
    }

    /// Total detections from every sensor.
    pub fn len(&self) -> usize {
        self.lidar.len() + self.radar.len() + self.visual_object_count()
    }

    /// True when no sensor saw anything.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Failure of the sensor collaborator to deliver a batch
#[derive(Debug, Error)]
pub enum SensorError {
    /// Sensor offline
    #[error("sensor {0:?} unavailable")]
    Unavailable(SensorKind),
    /// No batch within the read deadline
    #[error("sensor read timed out")]
    Timeout,
    /// Any other failure
    #[error("sensor read failed: {0}")]
    Other(String),
}

/// Anything that can deliver a detection batch once per control cycle.
///
/// The call blocks until the whole batch is available; there are no partial
/// batches.
pub trait SensorSource {
    /// Reads one complete batch.
    fn read(&mut self) -> Result<DetectionBatch, SensorError>;
}

// Simulated hardware characteristics
const LIDAR_HIT_PROBABILITY: f64 = 0.3;
const LIDAR_RANGE: (f64, f64) = (5.0, 100.0);
const LIDAR_SPEED: (f64, f64) = (-20.0, 20.0);
const RADAR_HIT_PROBABILITY: f64 = 0.4;
const RADAR_RANGE: (f64, f64) = (10.0, 200.0);
const RADAR_SPEED: (f64, f64) = (-30.0, 30.0);
const RADAR_SIGNAL: (f64, f64) = (0.5, 1.0);
const CAMERA_MAX_OBJECTS: usize = 3;
const CAMERA_RANGE: (f64, f64) = (5.0, 50.0);
const CAMERA_CONFIDENCE: (f64, f64) = (0.6, 1.0);
const CAMERA_QUALITY: (f64, f64) = (0.7, 1.0);

/// Randomised stand-in for the vehicle's sensor suite.
///
/// Seed the generator (e.g. `StdRng::seed_from_u64`) to replay a run exactly.
pub struct SimulatedSensors<R: Rng> {
    rng: R,
}

impl<R: Rng> SimulatedSensors<R> {
    /// Creates the simulator around a random generator.
    pub fn new(rng: R) -> Self {
        SimulatedSensors { rng }
    }

    /// Produces one full batch of simulated readings.
    pub fn sample(&mut self) -> DetectionBatch {
        let lidar = CompassPoint::ALL
            .iter()
            .filter_map(|&direction| self.sample_lidar(direction))
            .collect::<Vec<_>>();

        let radar = Mount::RADAR
            .iter()
            .filter_map(|&mount| self.sample_radar(mount))
            .collect::<Vec<_>>();

        let cameras = Mount::CAMERAS
            .iter()
            .map(|&mount| self.sample_camera(mount))
            .collect::<Vec<_>>();

        let batch = DetectionBatch {
            timestamp: SystemTime::now(),
            lidar,
            radar,
            cameras,
        };

        info!(
            "Sensors read: lidar={} objects, radar={} signals, cameras={} visual objects",
            batch.lidar.len(),
            batch.radar.len(),
            batch.visual_object_count()
        );
        batch
    }

    fn sample_lidar(&mut self, direction: CompassPoint) -> Option<Detection> {
        if !self.rng.gen_bool(LIDAR_HIT_PROBABILITY) {
            return None;
        }
        let distance = self.uniform(LIDAR_RANGE);
        let object = ObjectKind::LIDAR[self.rng.gen_range(0..ObjectKind::LIDAR.len())];
        let speed = if direction.is_longitudinal() {
            self.uniform(LIDAR_SPEED)
        } else {
            0.0
        };
        Some(Detection::lidar(direction, distance, object, Some(speed)))
    }

    fn sample_radar(&mut self, mount: Mount) -> Option<Detection> {
        if !self.rng.gen_bool(RADAR_HIT_PROBABILITY) {
            return None;
        }
        let distance = self.uniform(RADAR_RANGE);
        let relative_speed = self.uniform(RADAR_SPEED);
        let signal = self.uniform(RADAR_SIGNAL);
        Some(Detection::radar(mount, distance, relative_speed, signal))
    }

    fn sample_camera(&mut self, mount: Mount) -> CameraReport {
        let count = self.rng.gen_range(0..=CAMERA_MAX_OBJECTS);
        let objects = (0..count)
            .map(|_| {
                let object = ObjectKind::VISUAL[self.rng.gen_range(0..ObjectKind::VISUAL.len())];
                let distance = self.uniform(CAMERA_RANGE);
                let confidence = self.uniform(CAMERA_CONFIDENCE);
                Detection::camera(mount, distance, confidence, object)
            })
            .collect();

        CameraReport {
            mount,
            objects,
            image_quality: self.uniform(CAMERA_QUALITY),
        }
    }

    fn uniform(&mut self, (low, high): (f64, f64)) -> f64 {
        self.rng.gen_range(low..high)
    }
}

impl<R: Rng> SensorSource for SimulatedSensors<R> {
    fn read(&mut self) -> Result<DetectionBatch, SensorError> {
        Ok(self.sample())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn simulated_batches_respect_hardware_ranges() {
        let mut sensors = SimulatedSensors::new(StdRng::seed_from_u64(7));
        for _ in 0..200 {
            let batch = sensors.sample();
            assert!(batch.lidar.len() <= 8);
            assert!(batch.radar.len() <= 2);
            assert_eq!(batch.cameras.len(), 4);

            for d in &batch.lidar {
                assert!((5.0..100.0).contains(&d.distance));
                let speed = d.relative_speed.unwrap();
                match d.bearing {
                    Bearing::Compass(p) if p.is_longitudinal() => {
                        assert!((-20.0..20.0).contains(&speed))
                    }
                    _ => assert_eq!(speed, 0.0),
                }
            }
            for d in &batch.radar {
                assert!((10.0..200.0).contains(&d.distance));
                assert!((-30.0..30.0).contains(&d.relative_speed.unwrap()));
                assert!((0.5..1.0).contains(&d.signal_strength.unwrap()));
            }
            for cam in &batch.cameras {
                assert!(cam.objects.len() <= 3);
                assert!((0.7..1.0).contains(&cam.image_quality));
                for d in &cam.objects {
                    assert_eq!(d.source, SensorKind::Camera);
                    assert!((5.0..50.0).contains(&d.distance));
                    assert!((0.6..1.0).contains(&d.confidence.unwrap()));
                }
            }
        }
    }

    #[test]
    fn same_seed_replays_same_readings() {
        let mut a = SimulatedSensors::new(StdRng::seed_from_u64(42));
        let mut b = SimulatedSensors::new(StdRng::seed_from_u64(42));
        for _ in 0..10 {
            let (x, y) = (a.sample(), b.sample());
            assert_eq!(x.lidar, y.lidar);
            assert_eq!(x.radar, y.radar);
            assert_eq!(x.cameras, y.cameras);
        }
    }

    #[test]
    fn batch_iteration_covers_every_source() {
        let batch = DetectionBatch {
            timestamp: SystemTime::now(),
            lidar: vec![Detection::lidar(CompassPoint::North, 12.0, ObjectKind::Vehicle, None)],
            radar: vec![Detection::radar(Mount::Front, 40.0, 3.0, 0.9)],
            cameras: vec![CameraReport {
                mount: Mount::Left,
                objects: vec![
                    Detection::camera(Mount::Left, 8.0, 0.95, ObjectKind::Pedestrian),
                    Detection::camera(Mount::Left, 20.0, 0.7, ObjectKind::Sign),
                ],
                image_quality: 0.9,
            }],
        };
        let sources: Vec<_> = batch.iter().map(|d| d.source).collect();
        assert_eq!(
            sources,
            vec![SensorKind::Lidar, SensorKind::Radar, SensorKind::Camera, SensorKind::Camera]
        );
        assert_eq!(batch.len(), 4);
        assert_eq!(batch.visual_object_count(), 2);
        assert!(DetectionBatch::empty().is_empty());
    }

    #[test]
    fn compass_groupings() {
        let northern: Vec<_> = CompassPoint::ALL.iter().filter(|p| p.is_northern()).collect();
        assert_eq!(northern.len(), 3);
        assert!(CompassPoint::East.is_lateral());
        assert!(CompassPoint::West.is_lateral());
        assert!(!CompassPoint::SouthEast.is_lateral());
    }
}
