// tests/obstacle_tests.rs
// Danger scoring and evasive-action selection.

use eos_autonav::core::{Bearing, CompassPoint, Mount, ObjectKind};
use eos_autonav::navigation::obstacles::{critical, danger_score, lidar_action, radar_action};
use eos_autonav::{Detection, EvasiveAction, ObstacleEvaluator, PerceptionConfig};
use rstest::rstest;

fn evaluator() -> ObstacleEvaluator {
    ObstacleEvaluator::new(&PerceptionConfig::default())
}

#[rstest]
#[case(5.0, 0.0, 0.8)]
#[case(9.99, -3.0, 0.8)]
#[case(10.0, 0.0, 0.5)]
#[case(24.9, 5.0, 0.8)]
#[case(25.0, 0.0, 0.2)]
#[case(49.9, 11.0, 0.8)]
#[case(50.0, 0.0, 0.0)]
#[case(80.0, 10.0, 0.3)]
#[case(80.0, 10.01, 0.6)]
#[case(3.0, 25.0, 1.0)]
fn danger_bands(#[case] distance: f64, #[case] relative_speed: f64, #[case] expected: f64) {
    assert!((danger_score(distance, relative_speed) - expected).abs() < 1e-12);
}

#[rstest]
#[case(-30.0)]
#[case(0.0)]
#[case(0.5)]
#[case(10.5)]
#[case(1e9)]
fn danger_never_decreases_as_distance_closes(#[case] relative_speed: f64) {
    let distances = [120.0, 60.0, 49.0, 30.0, 24.0, 12.0, 9.0, 2.0, 0.0];
    let scores: Vec<f64> = distances.iter().map(|&d| danger_score(d, relative_speed)).collect();
    assert!(scores.windows(2).all(|w| w[1] >= w[0]), "{:?}", scores);
}

#[test]
fn danger_is_always_within_unit_interval() {
    let distances = [0.0, 1e-9, 9.0, 24.0, 49.0, 1e12, f64::INFINITY, f64::NAN];
    let speeds = [f64::NEG_INFINITY, -1e12, -5.0, 0.0, 3.0, 11.0, 1e12, f64::INFINITY, f64::NAN];
    for &d in &distances {
        for &v in &speeds {
            let score = danger_score(d, v);
            assert!((0.0..=1.0).contains(&score), "d={} v={} -> {}", d, v, score);
        }
    }
}

#[test]
fn five_metres_closing_at_fifteen_is_critical_and_brakes() {
    let detection = Detection::lidar(CompassPoint::South, 5.0, ObjectKind::Vehicle, Some(15.0));
    let obstacle = evaluator().classify(&detection).unwrap();
    assert_eq!(obstacle.danger_score, 1.0);
    assert!(obstacle.is_critical());
    assert_eq!(obstacle.action, EvasiveAction::BrakeImmediately);
}

#[rstest]
#[case(CompassPoint::North, EvasiveAction::ReduceSpeed)]
#[case(CompassPoint::NorthEast, EvasiveAction::ReduceSpeed)]
#[case(CompassPoint::NorthWest, EvasiveAction::ReduceSpeed)]
#[case(CompassPoint::East, EvasiveAction::ChangeLane)]
#[case(CompassPoint::West, EvasiveAction::ChangeLane)]
#[case(CompassPoint::South, EvasiveAction::MaintainCourse)]
#[case(CompassPoint::SouthEast, EvasiveAction::MaintainCourse)]
#[case(CompassPoint::SouthWest, EvasiveAction::MaintainCourse)]
fn lidar_action_by_bearing(#[case] point: CompassPoint, #[case] expected: EvasiveAction) {
    assert_eq!(lidar_action(Bearing::Compass(point), 15.0), expected);
    assert_eq!(lidar_action(Bearing::Compass(point), 14.99), EvasiveAction::BrakeImmediately);
}

#[rstest]
#[case(12.0, EvasiveAction::MaintainDistance)]
#[case(0.0, EvasiveAction::MaintainDistance)]
#[case(-4.9, EvasiveAction::MaintainDistance)]
#[case(-5.0, EvasiveAction::MayOvertake)]
#[case(-25.0, EvasiveAction::MayOvertake)]
fn radar_action_by_closing_speed(#[case] relative_speed: f64, #[case] expected: EvasiveAction) {
    assert_eq!(radar_action(relative_speed), expected);
    let detection = Detection::radar(Mount::Rear, 60.0, relative_speed, 0.7);
    assert_eq!(evaluator().classify(&detection).unwrap().action, expected);
}

#[test]
fn radar_scores_use_relative_speed() {
    let closing = evaluator()
        .classify(&Detection::radar(Mount::Front, 20.0, 18.0, 0.9))
        .unwrap();
    assert_eq!(closing.danger_score, 1.0);

    let receding = evaluator()
        .classify(&Detection::radar(Mount::Front, 20.0, -18.0, 0.9))
        .unwrap();
    assert_eq!(receding.danger_score, 0.5);
    assert!(!receding.is_critical());
}

#[test]
fn critical_filter_uses_strict_threshold() {
    let e = evaluator();
    let ahead = |d| Detection::lidar(CompassPoint::North, d, ObjectKind::Vehicle, Some(4.0));
    let obstacles = vec![
        // 0.5 + 0.3 = 0.8
        e.classify(&ahead(20.0)).unwrap(),
        // 0.2 + 0.3 = 0.5
        e.classify(&ahead(40.0)).unwrap(),
        // 0.5
        e.classify(&Detection::camera(Mount::Front, 20.0, 0.9, ObjectKind::Truck)).unwrap(),
    ];
    let critical = critical(&obstacles);
    assert_eq!(critical.len(), 1);
    assert_eq!(critical[0].distance, 20.0);
}

#[test]
fn custom_ranges_are_honoured() {
    let config = PerceptionConfig {
        lidar_range: 20.0,
        ..PerceptionConfig::default()
    };
    let e = ObstacleEvaluator::new(&config);
    assert!(e
        .classify(&Detection::lidar(CompassPoint::West, 25.0, ObjectKind::StaticObject, None))
        .is_none());
}
