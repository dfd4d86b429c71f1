use nalgebra as na;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::se2::Se2;

/// Which foot is which
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// +1 for the left foot, -1 for the right foot: the sign of the foot's
    /// lateral offset in the other foot's frame.
    pub fn lateral_sign(self) -> f64 {
        match self {
            Side::Left => 1.0,
            Side::Right => -1.0,
        }
    }
}

/// Physical and timing constants shared by every half-step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HalfStepConstants {
    /// Gravitational acceleration (m/s^2)
    pub g: f64,
    /// Time at which the CoM/ZMP shift starts (s)
    pub t_start: f64,
    /// Total duration of an isolated half-step (s)
    pub t_total: f64,
    /// Reference height of the center of mass above the support surface (m)
    pub standard_height: f64,
}

impl Default for HalfStepConstants {
    fn default() -> Self {
        Self {
            g: 9.81,
            t_start: 0.1,
            t_total: 0.8,
            standard_height: 0.8,
        }
    }
}

impl HalfStepConstants {
    pub fn validate(&self) -> Result<(), DomainError> {
        if !(self.g > 0.0) {
            return Err(DomainError::NonPositiveGravity(self.g));
        }
        if !(self.standard_height > 0.0) {
            return Err(DomainError::NonPositiveHeight(self.standard_height));
        }
        if !(self.t_start > 0.0) {
            return Err(DomainError::NonPositiveStart(self.t_start));
        }
        if !(self.t_total > self.t_start) || !self.t_total.is_finite() {
            return Err(DomainError::TotalNotAfterStart {
                t_start: self.t_start,
                t_total: self.t_total,
            });
        }
        Ok(())
    }

    /// Duration of the CoM shift, from `t_start` to `t_total`.
    pub fn shift_duration(&self) -> f64 {
        self.t_total - self.t_start
    }

    /// Cart-table time constant `standard_height / g`.
    pub fn pendulum_constant(&self) -> f64 {
        self.standard_height / self.g
    }
}

/// Footprint of one foot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FootDimensions {
    pub width: f64,
    pub length: f64,
}

impl Default for FootDimensions {
    fn default() -> Self {
        Self {
            width: 0.13,
            length: 0.23,
        }
    }
}

impl FootDimensions {
    pub fn validate(&self) -> Result<(), DomainError> {
        if !(self.width > 0.0) || !(self.length > 0.0) {
            return Err(DomainError::NonPositiveFootDimension {
                width: self.width,
                length: self.length,
            });
        }
        Ok(())
    }
}

/// Shape of the swing-foot arc. Symmetric for both support feet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViaPointConfig {
    /// Height of the swing foot at mid-swing (m)
    pub max_height: f64,
    /// Lateral distance between the parallel feet (m). The swing foot passes
    /// the support foot at no less than this distance, and a zero lateral
    /// displacement command lands it at exactly this distance.
    pub h_distance: f64,
}

impl Default for ViaPointConfig {
    fn default() -> Self {
        Self {
            max_height: 0.02,
            h_distance: 0.2,
        }
    }
}

impl ViaPointConfig {
    pub fn validate(&self) -> Result<(), DomainError> {
        if !(self.max_height >= 0.0) {
            return Err(DomainError::NegativeSwingHeight(self.max_height));
        }
        if !(self.h_distance > 0.0) {
            return Err(DomainError::NonPositiveSeparation(self.h_distance));
        }
        Ok(())
    }
}

/// A foot on the ground: its global planar pose plus the height of the
/// surface it stands on.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FootPlacement {
    pub pose: Se2,
    pub level: f64,
}

impl FootPlacement {
    pub fn new(pose: Se2, level: f64) -> Self {
        Self { pose, level }
    }

    pub fn on_ground(pose: Se2) -> Self {
        Self { pose, level: 0.0 }
    }
}

/// Both feet at the start of a half-step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stance {
    pub support_side: Side,
    pub support: FootPlacement,
    pub swing: FootPlacement,
}

impl Stance {
    /// Standing posture: the swing foot parallel to the support foot at the
    /// configured lateral distance.
    pub fn standing(support_side: Side, support: FootPlacement, vp_config: &ViaPointConfig) -> Self {
        let offset = Se2::new(
            0.0,
            support_side.opposite().lateral_sign() * vp_config.h_distance,
            0.0,
        );
        Self {
            support_side,
            support,
            swing: FootPlacement::new(support.pose.compose(&offset), support.level),
        }
    }

    pub fn swing_side(&self) -> Side {
        self.support_side.opposite()
    }

    /// Midpoint of the two feet, where the CoM and ZMP rest between
    /// half-steps.
    pub fn rest_point(&self) -> na::Vector2<f64> {
        (self.support.pose.position() + self.swing.pose.position()) * 0.5
    }

    pub fn placement(&self, side: Side) -> &FootPlacement {
        if side == self.support_side {
            &self.support
        } else {
            &self.swing
        }
    }

    /// Stance of the following half-step once the swing foot has landed at
    /// `landing`: the roles of the two feet swap.
    pub fn after_landing(&self, landing: FootPlacement) -> Self {
        Self {
            support_side: self.swing_side(),
            support: landing,
            swing: self.support,
        }
    }
}
