use approx::assert_relative_eq;

use slider_pg::biped::{FootDimensions, Side};
use slider_pg::projection::samples_at;
use slider_pg::se2::Se2;
use slider_pg::sliding::parse_step_list;
use slider_pg::stability::{LegReach, RejectionPolicy, ValidityOracle, ZmpInsideFootprints};
use slider_pg::trajectory::InstantFeatures;
use slider_pg::{Composition, PlannerConfig, PlannerError, SlidingPlanner, StepCommand};

fn compose(first_support_foot: Side, commands: &[StepCommand]) -> Composition {
    let config = PlannerConfig {
        first_support_foot,
        ..PlannerConfig::default()
    };
    SlidingPlanner::unchecked(config)
        .unwrap()
        .produce_from_commands(commands)
        .unwrap()
}

fn schedule() -> Vec<StepCommand> {
    parse_step_list(&[
        0.1, 0.0, 0.0, //
        0.15, 0.03, 0.1, //
        0.15, -0.02, 0.1, //
        0.1, 0.0, -0.05, //
        0.05, 0.0, 0.0,
    ])
    .unwrap()
}

#[test]
fn test_two_step_walk_end_to_end() {
    let config = PlannerConfig::default();
    let steps = config.steps.clone();
    let out = SlidingPlanner::unchecked(config).unwrap().produce_traj(&steps).unwrap();
    let traj = &out.trajectory;

    let times: Vec<f64> = samples_at(traj).map(|(t, _)| t).collect();
    assert!(times.windows(2).all(|w| w[1] >= w[0]));
    assert_eq!(traj.half_steps_start_indexes.len(), 2);

    let first = &traj.traj[0];
    let last = traj.last().unwrap();
    // At rest over the last landed foot.
    assert_relative_eq!(last.com_x, 0.2, epsilon = 1e-6);
    assert_relative_eq!(last.com_y, 0.0, epsilon = 1e-6);
    assert_eq!(first.left_foot.height, 0.0);
    assert_eq!(first.right_foot.height, 0.0);
    assert_relative_eq!(last.left_foot.height, 0.0, epsilon = 1e-12);
    assert_relative_eq!(last.right_foot.height, 0.0, epsilon = 1e-12);
}

#[test]
fn test_com_is_continuous_across_seams() {
    let out = compose(Side::Left, &schedule());
    let traj = &out.trajectory.traj;

    for &k in &out.trajectory.half_steps_start_indexes[1..] {
        let jump = (traj[k].com_x - traj[k - 1].com_x).hypot(traj[k].com_y - traj[k - 1].com_y);
        assert!(jump < 1e-2, "position jump {jump} at seam {k}");

        let zmp_jump = (traj[k].zmp_x - traj[k - 1].zmp_x).hypot(traj[k].zmp_y - traj[k - 1].zmp_y);
        assert!(zmp_jump < 1e-3, "ZMP jump {zmp_jump} at seam {k}");
        let zmp_ddx = traj[k + 1].zmp_x - 2.0 * traj[k].zmp_x + traj[k - 1].zmp_x;
        let zmp_ddy = traj[k + 1].zmp_y - 2.0 * traj[k].zmp_y + traj[k - 1].zmp_y;
        assert!(zmp_ddx.abs() < 1e-3 && zmp_ddy.abs() < 1e-3, "ZMP kink at seam {k}");
    }
    // Second differences stay at the scale of acc * dt^2 everywhere,
    // seams included.
    for w in traj.windows(3) {
        let ddx = w[2].com_x - 2.0 * w[1].com_x + w[0].com_x;
        let ddy = w[2].com_y - 2.0 * w[1].com_y + w[0].com_y;
        assert!(ddx.abs() < 5e-4 && ddy.abs() < 5e-4);
    }
}

#[test]
fn test_support_foot_alternates() {
    for first in [Side::Left, Side::Right] {
        let out = compose(first, &schedule());
        let mut expected = first;
        for h in &out.half_steps {
            assert_eq!(h.definition.support_foot, expected);
            expected = expected.opposite();
        }
    }
}

#[test]
fn test_start_indexes_partition_the_trajectory() {
    let out = compose(Side::Left, &schedule());
    let starts = &out.trajectory.half_steps_start_indexes;
    let total = out.trajectory.size();

    assert_eq!(starts.len(), 5);
    assert_eq!(starts[0], 0);
    assert!(starts.windows(2).all(|w| w[0] < w[1]));
    assert!(*starts.last().unwrap() < total);
    let spans: usize = starts
        .iter()
        .zip(starts.iter().skip(1).chain(std::iter::once(&total)))
        .map(|(a, b)| b - a)
        .sum();
    assert_eq!(spans, total);
}

#[test]
fn test_mirrored_schedule_mirrors_trajectory() {
    let commands = schedule();
    let mirrored: Vec<StepCommand> = commands
        .iter()
        .map(|c| StepCommand {
            displacement: c.displacement.mirrored(),
            ..*c
        })
        .collect();

    let out = compose(Side::Left, &commands);
    let mirror = compose(Side::Right, &mirrored);
    assert_eq!(out.trajectory.size(), mirror.trajectory.size());

    for (a, b) in out.trajectory.traj.iter().zip(&mirror.trajectory.traj) {
        assert_relative_eq!(a.com_x, b.com_x, epsilon = 1e-9);
        assert_relative_eq!(a.com_y, -b.com_y, epsilon = 1e-9);
        assert_relative_eq!(a.zmp_x, b.zmp_x, epsilon = 1e-9);
        assert_relative_eq!(a.zmp_y, -b.zmp_y, epsilon = 1e-9);
        assert_relative_eq!(a.left_foot.x, b.right_foot.x, epsilon = 1e-9);
        assert_relative_eq!(a.left_foot.y, -b.right_foot.y, epsilon = 1e-9);
        assert_relative_eq!(a.left_foot.height, b.right_foot.height, epsilon = 1e-9);
        assert_relative_eq!(a.right_foot.orient, -b.left_foot.orient, epsilon = 1e-9);
    }
}

#[test]
fn test_turning_walk_lands_where_commanded() {
    let out = compose(Side::Left, &schedule());
    let mut support = Se2::default();
    for h in &out.half_steps {
        assert_eq!(h.support_foot_config, support);
        support = h.landing_pose();
    }
    let heading: f64 = schedule().iter().map(|c| c.displacement.theta).sum();
    assert_relative_eq!(support.theta, heading, epsilon = 1e-12);
}

#[test]
fn test_walk_keeps_zmp_inside_footprints() {
    let oracle = ZmpInsideFootprints::new(FootDimensions::default());

    let config = PlannerConfig::default();
    let steps = config.steps.clone();
    let out = SlidingPlanner::unchecked(config).unwrap().produce_traj(&steps).unwrap();
    for (k, s) in out.trajectory.traj.iter().enumerate() {
        assert!(oracle.is_valid(s), "ZMP outside the support polygon at sample {k}");
    }

    for first in [Side::Left, Side::Right] {
        let out = compose(first, &schedule());
        assert!(out.trajectory.traj.iter().all(|s| oracle.is_valid(s)));
    }
}

#[test]
fn test_zmp_and_leg_reach_checks_combine() {
    let zmp_check = ZmpInsideFootprints::new(FootDimensions::default());
    let both = move |reach: LegReach| {
        move |s: &InstantFeatures| zmp_check.is_valid(s) && reach.is_valid(s)
    };

    let config = PlannerConfig::default();
    let steps = config.steps.clone();
    let out = SlidingPlanner::new(config, both(LegReach::new(0.5, 0.5)))
        .unwrap()
        .produce_traj(&steps)
        .unwrap();
    assert_eq!(out.half_steps.len(), 2);
    assert!(out.rejections.is_empty());

    // Standing, the CoM is about 0.806 from each foot.
    let config = PlannerConfig {
        rejection_policy: RejectionPolicy::Abort,
        ..PlannerConfig::default()
    };
    let err = SlidingPlanner::new(config, both(LegReach::new(0.4, 0.4)))
        .unwrap()
        .produce_traj(&steps)
        .unwrap_err();
    match err {
        PlannerError::Rejected(r) => {
            assert_eq!(r.step, 0);
            assert_eq!(r.sample, Some(0));
        }
        other => panic!("unexpected error {other}"),
    }
}
