//! Read-only views of a composite trajectory for plotting and export.

use nalgebra as na;

use crate::biped::{FootDimensions, Side};
use crate::sliding::Composition;
use crate::trajectory::{InstantFeatures, TrajFeatures};
use crate::zmp::foot_support_polygon;

/// `(time, value)` pairs at the sampling interval.
pub type Curve = Vec<(f64, f64)>;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComZmpCurves {
    pub com: Curve,
    pub zmp: Curve,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeetHeightCurves {
    pub left: Curve,
    pub right: Curve,
}

/// Samples paired with their time stamps.
pub fn samples_at(traj: &TrajFeatures) -> impl Iterator<Item = (f64, &InstantFeatures)> + '_ {
    traj.traj
        .iter()
        .enumerate()
        .map(move |(k, sample)| (traj.time_at(k), sample))
}

fn curve(traj: &TrajFeatures, channel: impl Fn(&InstantFeatures) -> f64) -> Curve {
    samples_at(traj).map(|(t, s)| (t, channel(s))).collect()
}

pub fn com_zmp_along_x(traj: &TrajFeatures) -> ComZmpCurves {
    ComZmpCurves {
        com: curve(traj, |s| s.com_x),
        zmp: curve(traj, |s| s.zmp_x),
    }
}

pub fn com_zmp_along_y(traj: &TrajFeatures) -> ComZmpCurves {
    ComZmpCurves {
        com: curve(traj, |s| s.com_y),
        zmp: curve(traj, |s| s.zmp_y),
    }
}

pub fn feet_height(traj: &TrajFeatures) -> FeetHeightCurves {
    FeetHeightCurves {
        left: curve(traj, |s| s.foot(Side::Left).height),
        right: curve(traj, |s| s.foot(Side::Right).height),
    }
}

pub fn com_height(traj: &TrajFeatures) -> Curve {
    curve(traj, |s| s.com_height)
}

/// Rectangle corners of every foot placement: both feet of the initial
/// stance, then each landing in schedule order.
pub fn footprints(composition: &Composition, ft_dim: &FootDimensions) -> Vec<Vec<na::Vector2<f64>>> {
    let stance = &composition.initial_stance;
    [stance.support.pose, stance.swing.pose]
        .into_iter()
        .chain(composition.half_steps.iter().map(|h| h.landing_pose()))
        .map(|pose| foot_support_polygon(&pose, ft_dim))
        .collect()
}
