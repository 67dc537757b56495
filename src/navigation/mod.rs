//! Navigation system for Eos Autonav
//!
//! This module plans the route, scores obstacles, governs speed and advances
//! the vehicle. `NavigationLoop` ties the pieces together into one control
//! cycle per time step:
//! sensors -> obstacle evaluation -> speed governing -> integration -> arrival check.

/// Speed governor
pub mod controller;
/// Position integrator
pub mod integrator;
/// Obstacle evaluator
pub mod obstacles;
/// Route builder
pub mod planner;

pub use controller::{SpeedConfig, SpeedDecision, SpeedGovernor, SpeedTransition, SpeedTrend};
pub use integrator::{Advance, PositionIntegrator};
pub use obstacles::{CRITICAL_DANGER, EvasiveAction, Obstacle, ObstacleEvaluator, PerceptionConfig};
pub use planner::{RouteBuilder, RouteConfig, RoutePlan};

use crate::core::{
    NavPhase, Position, RandomTraffic, SensorSource, SimulatedSensors, TrafficSource, VehicleState,
};
use crate::report::{CycleReport, ReportSink, SensorSummary, TripSummary};
use crate::{NavConfig, NavError};
use log::{error, info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Orchestrates planning and the per-cycle control flow for one trip.
///
/// The loop owns the vehicle state outright; each component gets exclusive
/// access to the part it changes for the duration of its step.
pub struct NavigationLoop<S, T> {
    config: NavConfig,
    route_builder: RouteBuilder,
    evaluator: ObstacleEvaluator,
    governor: SpeedGovernor,
    integrator: PositionIntegrator,
    sensors: S,
    traffic: T,
    rng: StdRng,
    state: VehicleState,
    phase: NavPhase,
    plan: Option<RoutePlan>,
    cycles: u32,
    total_obstacles: usize,
    sensor_failures: u32,
}

impl NavigationLoop<SimulatedSensors<StdRng>, RandomTraffic<StdRng>> {
    /// Builds a loop driven by simulated sensors and random traffic, all seeded
    /// from `config.seed`.
    pub fn simulated(config: NavConfig) -> Result<Self, NavError> {
        let seed = config.seed;
        let sensors = SimulatedSensors::new(seeded_rng(seed, 1));
        let traffic = RandomTraffic::new(seeded_rng(seed, 2));
        NavigationLoop::new(config, sensors, traffic)
    }
}

impl<S: SensorSource, T: TrafficSource> NavigationLoop<S, T> {
    /// Creates a new navigation loop in the `Planning` phase.
    pub fn new(config: NavConfig, sensors: S, traffic: T) -> Result<Self, NavError> {
        config.validate()?;

        let state = VehicleState::new(config.trip.origin, config.trip.initial_speed);
        Ok(NavigationLoop {
            route_builder: RouteBuilder::new(&config.route),
            evaluator: ObstacleEvaluator::new(&config.perception),
            governor: SpeedGovernor::new(&config.speed),
            integrator: PositionIntegrator::new(config.trip.time_step),
            rng: seeded_rng(config.seed, 0),
            sensors,
            traffic,
            state,
            phase: NavPhase::Planning,
            plan: None,
            cycles: 0,
            total_obstacles: 0,
            sensor_failures: 0,
            config,
        })
    }

    /// Current vehicle state.
    pub fn state(&self) -> &VehicleState {
        &self.state
    }

    /// Current navigation phase.
    pub fn phase(&self) -> NavPhase {
        self.phase
    }

    /// Cycles completed so far.
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    /// The most recent route plan, once planning has run.
    pub fn route_plan(&self) -> Option<&RoutePlan> {
        self.plan.as_ref()
    }

    /// Straight-line distance left to the destination.
    pub fn distance_to_destination(&self) -> f64 {
        self.state.position.distance_to(&self.config.trip.destination)
    }

    /// Plans the route from the trip origin and leaves `Planning`.
    pub fn plan_route(&mut self) -> &RoutePlan {
        let origin = self.config.trip.origin;
        self.build_and_load(origin)
    }

    /// Rebuilds the route from the current position. This is the only way the
    /// route queue can grow during a trip.
    pub fn replan(&mut self) -> &RoutePlan {
        info!("Replanning from {}", self.state.position);
        let from = self.state.position;
        self.build_and_load(from)
    }

    fn build_and_load(&mut self, from: Position) -> &RoutePlan {
        let plan = self.route_builder.build_route(
            from,
            self.config.trip.destination,
            self.state.speed,
            &mut self.rng,
        );
        self.state.load_route(plan.waypoints.clone());

        self.phase = if self.distance_to_destination() < self.config.trip.arrival_tolerance {
            info!("Already within tolerance of the destination");
            NavPhase::Arrived
        } else {
            NavPhase::Cycling
        };

        self.plan.insert(plan)
    }

    /// Runs one control cycle, planning first if needed.
    ///
    /// A failed sensor read makes the cycle fail-safe: no obstacles are
    /// assumed and the target speed is forced to zero. Once more than
    /// `max_sensor_failures` reads in a row have failed the run is aborted.
    pub fn step(&mut self) -> Result<CycleReport, NavError> {
        if self.phase == NavPhase::Planning {
            self.plan_route();
        }
        if self.phase == NavPhase::Arrived {
            return Err(NavError::TripComplete);
        }

        let cycle = self.cycles + 1;
        let current_speed = self.state.speed;

        let (sensors, obstacles, traffic, decision) = match self.sensors.read() {
            Ok(batch) => {
                self.sensor_failures = 0;
                let obstacles = self.evaluator.evaluate(&batch);
                let traffic = self.traffic.current_level();
                let decision = self.governor.decide(traffic, &obstacles, current_speed);
                (Some(SensorSummary::from_batch(&batch)), obstacles, traffic, decision)
            }
            Err(source) => {
                self.sensor_failures += 1;
                if self.sensor_failures > self.config.max_sensor_failures {
                    error!(
                        "Aborting at cycle {}: {} consecutive sensor failures ({})",
                        cycle, self.sensor_failures, source
                    );
                    return Err(NavError::SensorFailure {
                        consecutive: self.sensor_failures,
                        source,
                    });
                }
                warn!("Cycle {}: sensor read failed ({}), braking fail-safe", cycle, source);
                let traffic = self.traffic.current_level();
                let decision = self.governor.fail_safe(traffic, current_speed);
                (None, Vec::new(), traffic, decision)
            }
        };

        self.state.speed = decision.speed;
        let advance = self.integrator.advance(
            &mut self.state.position,
            &mut self.state.route,
            self.state.speed,
        );

        let distance_remaining = self.distance_to_destination();
        if distance_remaining < self.config.trip.arrival_tolerance {
            self.phase = NavPhase::Arrived;
            info!("Destination reached at cycle {}", cycle);
        } else if advance.reached.is_some() && self.state.route.len() < 2 {
            // Overshot the last waypoint: the vehicle holds here until replanned
            warn!(
                "Cycle {}: route exhausted {:.1} m from the destination, replan to continue",
                cycle, distance_remaining
            );
        }

        self.cycles = cycle;
        self.total_obstacles += obstacles.len();

        Ok(CycleReport {
            cycle,
            sensors,
            obstacles,
            traffic,
            speed: self.state.speed,
            transition: decision.transition,
            position: self.state.position,
            distance_remaining,
            phase: self.phase,
        })
    }

    /// Runs cycles until arrival or the cycle limit, reporting each one to
    /// `sink`. Hitting the limit is not an error; the summary says whether
    /// the vehicle arrived.
    pub fn run<K: ReportSink + ?Sized>(&mut self, sink: &mut K) -> Result<TripSummary, NavError> {
        if self.phase == NavPhase::Planning {
            self.plan_route();
        }

        while self.phase == NavPhase::Cycling && self.cycles < self.config.trip.max_cycles {
            let report = self.step()?;
            sink.cycle(&report);
        }

        let summary = self.summary();
        sink.finish(&summary);
        Ok(summary)
    }

    /// Snapshot of the trip so far.
    pub fn summary(&self) -> TripSummary {
        TripSummary {
            arrived: self.phase == NavPhase::Arrived,
            cycles: self.cycles,
            final_position: self.state.position,
            final_speed: self.state.speed,
            total_obstacles: self.total_obstacles,
            remaining_waypoints: self.state.route.len(),
            distance_remaining: self.distance_to_destination(),
        }
    }
}

/// Deterministic generator for `stream` when a seed is configured, entropy otherwise.
fn seeded_rng(seed: Option<u64>, stream: u64) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(stream)),
        None => StdRng::from_entropy(),
    }
}
