use approx::assert_relative_eq;

use slider_pg::biped::Side;
use slider_pg::{PlannerConfig, PlannerError, SlidingPlanner};

const TURNING_WALK: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/configs/turning_walk.toml");

#[test]
fn test_turning_walk_config_composes() {
    let config = PlannerConfig::from_file(TURNING_WALK).unwrap();
    assert_eq!(config.first_support_foot, Side::Right);
    assert_eq!(config.steps.len(), 15);

    let steps = config.steps.clone();
    let out = SlidingPlanner::unchecked(config).unwrap().produce_traj(&steps).unwrap();
    assert_eq!(out.half_steps.len(), 5);
    assert_eq!(out.half_steps[0].definition.support_foot, Side::Right);
    assert_relative_eq!(out.final_stance.support.pose.theta, 0.45, epsilon = 1e-12);

    let peak = out
        .trajectory
        .traj
        .iter()
        .map(|s| s.left_foot.height.max(s.right_foot.height))
        .fold(0.0, f64::max);
    assert_relative_eq!(peak, 0.03, epsilon = 5e-4);
}

#[test]
fn test_missing_file_is_an_io_error() {
    let err = PlannerConfig::from_file("does/not/exist.toml").unwrap_err();
    assert!(matches!(err, PlannerError::Io(_)));
}
