use nalgebra as na;
use serde::{Deserialize, Serialize};

use crate::biped::{FootDimensions, Side};
use crate::half_step::HalfStep;
use crate::se2::Se2;
use crate::trajectory::InstantFeatures;
use crate::zmp::{convex_hull, foot_support_polygon, inside_margin};

/// Height above the lowest foot under which a foot still counts as grounded.
const GROUND_TOLERANCE: f64 = 1e-6;

/// Feasibility check applied to every generated sample, and to every
/// generated half-step as a whole, before they are committed to the
/// composite trajectory.
///
/// Any `Fn(&InstantFeatures) -> bool` is an oracle.
pub trait ValidityOracle {
    fn is_valid(&self, sample: &InstantFeatures) -> bool;

    fn is_valid_half_step(&self, _half_step: &HalfStep) -> bool {
        true
    }
}

impl<F> ValidityOracle for F
where
    F: Fn(&InstantFeatures) -> bool,
{
    fn is_valid(&self, sample: &InstantFeatures) -> bool {
        self(sample)
    }
}

/// Accepts everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysValid;

impl ValidityOracle for AlwaysValid {
    fn is_valid(&self, _sample: &InstantFeatures) -> bool {
        true
    }
}

/// What the sliding planner does with a half-step the oracle refuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RejectionPolicy {
    /// Stop the whole composition with an error.
    Abort,
    /// Keep the half-step and report the rejection alongside the trajectory.
    #[default]
    Flag,
    /// Drop the half-step, keep the stance unchanged, report the rejection.
    Skip,
}

/// Balance criterion: the ZMP must lie inside the support polygon, the
/// convex hull of the grounded footprints, by at least `margin`.
#[derive(Debug, Clone, Copy)]
pub struct ZmpInsideFootprints {
    pub ft_dim: FootDimensions,
    pub margin: f64,
}

impl ZmpInsideFootprints {
    pub fn new(ft_dim: FootDimensions) -> Self {
        Self { ft_dim, margin: 0.0 }
    }

    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    fn support_polygon(&self, sample: &InstantFeatures) -> Vec<na::Vector2<f64>> {
        let lowest = sample.left_foot.height.min(sample.right_foot.height);
        let corners: Vec<_> = [Side::Left, Side::Right]
            .iter()
            .map(|&side| sample.foot(side))
            .filter(|foot| foot.height <= lowest + GROUND_TOLERANCE)
            .flat_map(|foot| foot_support_polygon(&Se2::new(foot.x, foot.y, foot.orient), &self.ft_dim))
            .collect();
        convex_hull(&corners)
    }
}

impl ValidityOracle for ZmpInsideFootprints {
    fn is_valid(&self, sample: &InstantFeatures) -> bool {
        let zmp = na::Vector2::new(sample.zmp_x, sample.zmp_y);
        inside_margin(&zmp, &self.support_polygon(sample)) >= self.margin
    }
}

/// Kinematic criterion: every foot within reach of the CoM, for a two-link
/// leg with the given segment lengths.
#[derive(Debug, Clone, Copy)]
pub struct LegReach {
    /// Length of upper link (e.g., thigh)
    pub upper_length: f64,
    /// Length of lower link (e.g., shin)
    pub lower_length: f64,
}

impl LegReach {
    pub fn new(upper_length: f64, lower_length: f64) -> Self {
        Self {
            upper_length,
            lower_length,
        }
    }

    pub fn max_reach(&self) -> f64 {
        self.upper_length + self.lower_length
    }
}

impl ValidityOracle for LegReach {
    fn is_valid(&self, sample: &InstantFeatures) -> bool {
        let com = na::Vector3::new(sample.com_x, sample.com_y, sample.com_height);
        [&sample.left_foot, &sample.right_foot].iter().all(|foot| {
            let foot = na::Vector3::new(foot.x, foot.y, foot.height);
            (com - foot).norm() <= self.max_reach()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trajectory::FootState;

    fn double_support(zmp_x: f64, zmp_y: f64) -> InstantFeatures {
        InstantFeatures {
            com_x: zmp_x,
            com_y: zmp_y,
            com_height: 0.8,
            zmp_x,
            zmp_y,
            left_foot: FootState {
                y: 0.1,
                ..Default::default()
            },
            right_foot: FootState {
                y: -0.1,
                ..Default::default()
            },
            waist_orient: 0.0,
        }
    }

    #[test]
    fn test_closure_is_an_oracle() {
        let oracle = |s: &InstantFeatures| s.com_height > 0.5;
        assert!(oracle.is_valid(&double_support(0.0, 0.0)));
        assert!(AlwaysValid.is_valid(&InstantFeatures::default()));
    }

    #[test]
    fn test_zmp_between_feet_in_double_support() {
        let oracle = ZmpInsideFootprints::new(FootDimensions::default());
        assert!(oracle.is_valid(&double_support(0.0, 0.0)));
        assert!(!oracle.is_valid(&double_support(0.2, 0.0)));
    }

    #[test]
    fn test_zmp_must_be_under_support_foot_in_single_support() {
        let oracle = ZmpInsideFootprints::new(FootDimensions::default());
        let mut sample = double_support(0.0, 0.0);
        sample.right_foot.height = 0.02;
        assert!(!oracle.is_valid(&sample));

        sample.zmp_y = 0.1;
        assert!(oracle.is_valid(&sample));
        assert!(!oracle.with_margin(0.1).is_valid(&sample));
    }

    #[test]
    fn test_leg_reach() {
        let sample = double_support(0.0, 0.0);
        assert!(LegReach::new(0.45, 0.45).is_valid(&sample));
        assert!(!LegReach::new(0.4, 0.4).is_valid(&sample));
    }
}
