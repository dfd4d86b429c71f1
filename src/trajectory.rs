use serde::{Deserialize, Serialize};

use crate::biped::{FootPlacement, Side};
use crate::error::DomainError;

/// Residual below which `t_total / incr_time` counts as an exact multiple.
const DIVISION_TOLERANCE: f64 = 1e-9;

/// Position, absolute height and heading (radians) of one foot.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FootState {
    pub x: f64,
    pub y: f64,
    pub height: f64,
    pub orient: f64,
}

impl From<&FootPlacement> for FootState {
    fn from(p: &FootPlacement) -> Self {
        Self {
            x: p.pose.x,
            y: p.pose.y,
            height: p.level,
            orient: p.pose.theta,
        }
    }
}

/// One time slice of the lower-body features: CoM, ZMP, both feet and the
/// waist orientation. Always absolute, never relative to a foot.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct InstantFeatures {
    pub com_x: f64,
    pub com_y: f64,
    pub com_height: f64,
    pub zmp_x: f64,
    pub zmp_y: f64,
    pub left_foot: FootState,
    pub right_foot: FootState,
    /// Waist heading (radians)
    pub waist_orient: f64,
}

impl InstantFeatures {
    pub fn foot(&self, side: Side) -> &FootState {
        match side {
            Side::Left => &self.left_foot,
            Side::Right => &self.right_foot,
        }
    }

    pub fn foot_mut(&mut self, side: Side) -> &mut FootState {
        match side {
            Side::Left => &mut self.left_foot,
            Side::Right => &mut self.right_foot,
        }
    }

    /// `self + (current - origin)` on every channel.
    ///
    /// This is how a later segment's motion is superposed onto an earlier
    /// one while sliding: `origin` is the later segment's first sample.
    pub fn displaced(&self, origin: &Self, current: &Self) -> Self {
        let d = |base: f64, from: f64, to: f64| base + (to - from);
        let foot = |base: &FootState, from: &FootState, to: &FootState| FootState {
            x: d(base.x, from.x, to.x),
            y: d(base.y, from.y, to.y),
            height: d(base.height, from.height, to.height),
            orient: d(base.orient, from.orient, to.orient),
        };
        Self {
            com_x: d(self.com_x, origin.com_x, current.com_x),
            com_y: d(self.com_y, origin.com_y, current.com_y),
            com_height: d(self.com_height, origin.com_height, current.com_height),
            zmp_x: d(self.zmp_x, origin.zmp_x, current.zmp_x),
            zmp_y: d(self.zmp_y, origin.zmp_y, current.zmp_y),
            left_foot: foot(&self.left_foot, &origin.left_foot, &current.left_foot),
            right_foot: foot(&self.right_foot, &origin.right_foot, &current.right_foot),
            waist_orient: d(self.waist_orient, origin.waist_orient, current.waist_orient),
        }
    }
}

/// Discretized trajectory of the lower-body end effectors. The configuration
/// space trajectory is obtained later through inverse kinematics.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrajFeatures {
    pub traj: Vec<InstantFeatures>,
    /// Index in `traj` where each half-step begins.
    pub half_steps_start_indexes: Vec<usize>,
    /// Duration of one discretization step (s)
    pub incr_time: f64,
}

impl TrajFeatures {
    pub fn new(incr_time: f64) -> Self {
        Self {
            traj: Vec::new(),
            half_steps_start_indexes: Vec::new(),
            incr_time,
        }
    }

    pub fn size(&self) -> usize {
        self.traj.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traj.is_empty()
    }

    pub fn time_at(&self, index: usize) -> f64 {
        index as f64 * self.incr_time
    }

    pub fn duration(&self) -> f64 {
        self.time_at(self.size())
    }

    pub fn last(&self) -> Option<&InstantFeatures> {
        self.traj.last()
    }
}

/// Number of samples covering `t_total` at `incr_time`, rounding down when
/// the interval does not divide the duration evenly. The residual
/// `t_total - n * incr_time` (less than one interval) is dropped.
pub fn sample_count(t_total: f64, incr_time: f64) -> Result<usize, DomainError> {
    if !(incr_time > 0.0) || !(incr_time <= t_total) {
        return Err(DomainError::InvalidSamplingInterval { incr_time, t_total });
    }
    Ok((t_total / incr_time + DIVISION_TOLERANCE).floor() as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sample_count_exact_division() {
        assert_eq!(sample_count(0.8, 0.005).unwrap(), 160);
        assert_eq!(sample_count(0.8, 0.1).unwrap(), 8);
    }

    #[test]
    fn test_sample_count_rounds_down() {
        assert_eq!(sample_count(0.8, 0.3).unwrap(), 2);
    }

    #[test]
    fn test_sample_count_rejects_bad_interval() {
        assert!(sample_count(0.8, 0.0).is_err());
        assert!(sample_count(0.8, -0.01).is_err());
        assert!(sample_count(0.8, 1.0).is_err());
    }

    #[test]
    fn test_displaced_adds_motion_delta() {
        let base = InstantFeatures {
            com_x: 1.0,
            ..Default::default()
        };
        let origin = InstantFeatures {
            com_x: 0.5,
            ..Default::default()
        };
        let mut current = origin;
        current.com_x = 0.75;
        current.right_foot.height = 0.01;

        let out = base.displaced(&origin, &current);
        assert_relative_eq!(out.com_x, 1.25);
        assert_relative_eq!(out.right_foot.height, 0.01);
        assert_relative_eq!(out.left_foot.height, 0.0);
    }
}
