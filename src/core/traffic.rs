// core/traffic.rs

// Exogenous traffic conditions. The navigation loop asks a `TrafficSource` for
// the current congestion level once per cycle; the speed governor turns that
// level into a base target speed.

use log::warn;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Congestion level reported by the traffic-estimation collaborator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrafficLevel {
    /// Open road
    Free,
    /// Some traffic
    Moderate,
    /// Dense traffic
    Heavy,
    /// Stop-and-go
    Congested,
    /// A label the estimator produced that we do not recognise
    Unknown,
}

impl TrafficLevel {
    /// The four levels a well-behaved estimator reports.
    pub const KNOWN: [TrafficLevel; 4] = [
        TrafficLevel::Free,
        TrafficLevel::Moderate,
        TrafficLevel::Heavy,
        TrafficLevel::Congested,
    ];

    /// Parses an estimator label, case-insensitively.
    ///
    /// Accepts the English names as well as the estimator's Spanish labels
    /// (`LIBRE`, `MODERADO`, `PESADO`, `CONGESTION`). Anything else maps to
    /// `Unknown` rather than failing.
    pub fn from_label(label: &str) -> TrafficLevel {
        match label.trim().to_ascii_lowercase().as_str() {
            "free" | "libre" => TrafficLevel::Free,
            "moderate" | "moderado" => TrafficLevel::Moderate,
            "heavy" | "pesado" => TrafficLevel::Heavy,
            "congested" | "congestion" => TrafficLevel::Congested,
            other => {
                warn!("Unrecognised traffic level '{}', using default speed", other);
                TrafficLevel::Unknown
            }
        }
    }
}

impl fmt::Display for TrafficLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TrafficLevel::Free => "free",
            TrafficLevel::Moderate => "moderate",
            TrafficLevel::Heavy => "heavy",
            TrafficLevel::Congested => "congested",
            TrafficLevel::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Supplies the traffic level for each control cycle
pub trait TrafficSource {
    /// Level for the current cycle.
    fn current_level(&mut self) -> TrafficLevel;
}

/// Always reports the same level
#[derive(Clone, Copy, Debug)]
pub struct FixedTraffic(pub TrafficLevel);

impl TrafficSource for FixedTraffic {
    fn current_level(&mut self) -> TrafficLevel {
        self.0
    }
}

/// Picks one of the four known levels uniformly at random each cycle
pub struct RandomTraffic<R: Rng> {
    rng: R,
}

impl<R: Rng> RandomTraffic<R> {
    /// Creates a source drawing from `rng`.
    pub fn new(rng: R) -> Self {
        RandomTraffic { rng }
    }
}

impl<R: Rng> TrafficSource for RandomTraffic<R> {
    fn current_level(&mut self) -> TrafficLevel {
        TrafficLevel::KNOWN[self.rng.gen_range(0..TrafficLevel::KNOWN.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn labels_parse_in_both_vocabularies() {
        assert_eq!(TrafficLevel::from_label("LIBRE"), TrafficLevel::Free);
        assert_eq!(TrafficLevel::from_label("moderate"), TrafficLevel::Moderate);
        assert_eq!(TrafficLevel::from_label(" Pesado "), TrafficLevel::Heavy);
        assert_eq!(TrafficLevel::from_label("CONGESTION"), TrafficLevel::Congested);
        assert_eq!(TrafficLevel::from_label("gridlock"), TrafficLevel::Unknown);
        assert_eq!(TrafficLevel::from_label(""), TrafficLevel::Unknown);
    }

    #[test]
    fn random_traffic_never_reports_unknown() {
        let mut source = RandomTraffic::new(StdRng::seed_from_u64(3));
        for _ in 0..100 {
            assert_ne!(source.current_level(), TrafficLevel::Unknown);
        }
    }
}
