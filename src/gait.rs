use serde::{Deserialize, Serialize};

use crate::biped::{FootDimensions, HalfStepConstants, Side, Stance, ViaPointConfig};
use crate::error::{DomainError, SequenceError};
use crate::se2::Se2;
use crate::trajectory::FootState;

/// Fraction of `t_total - t_start` spent in double support between
/// `t_start` and liftoff, while the ZMP moves onto the support foot.
pub const LIFTOFF_MARGIN: f64 = 0.35;

/// Fraction of `t_total - t_start` left between touchdown and `t_total`,
/// while the ZMP moves back between the feet.
pub const TOUCHDOWN_MARGIN: f64 = 0.4;

/// Distinguishes half-steps climbing onto a higher surface from half-steps
/// descending to a lower one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HalfStepType {
    #[default]
    Up,
    Down,
}

/// Low dimensional definition of a half-step.
///
/// Only `pos_and_orient` varies from step to step in a flat walk: the pose
/// of the swing foot once it is back on the ground, ALWAYS expressed in the
/// support foot's frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HalfStepDefinition {
    pub support_foot: Side,
    pub half_step_type: HalfStepType,
    /// Height difference between the landing surface and the support
    /// surface. Its sign comes from `half_step_type`.
    pub level_change: f64,
    pub vp_config: ViaPointConfig,
    pub pos_and_orient: Se2,
    pub ft_dim: FootDimensions,
    pub constants: HalfStepConstants,
}

impl HalfStepDefinition {
    pub fn validate(&self) -> Result<(), DomainError> {
        self.constants.validate()?;
        self.ft_dim.validate()?;
        self.vp_config.validate()?;
        if !(self.level_change >= 0.0) {
            return Err(DomainError::NegativeLevelChange(self.level_change));
        }
        Ok(())
    }

    pub fn swing_foot(&self) -> Side {
        self.support_foot.opposite()
    }

    /// Surface level under the landed swing foot.
    pub fn landing_level(&self, support_level: f64) -> f64 {
        match self.half_step_type {
            HalfStepType::Up => support_level + self.level_change,
            HalfStepType::Down => support_level - self.level_change,
        }
    }
}

/// Timing of the swing phase inside a half-step, and the factor applied to
/// the via-point height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwingProfile {
    /// Liftoff time (s), local to the half-step
    pub lift: f64,
    /// Touchdown time (s), local to the half-step
    pub land: f64,
    /// Swing height reduction coefficient, in (0, 1]
    pub reduction_coef: f64,
}

impl SwingProfile {
    pub fn nominal(constants: &HalfStepConstants) -> Self {
        let shift = constants.shift_duration();
        Self {
            lift: constants.t_start + LIFTOFF_MARGIN * shift,
            land: constants.t_total - TOUCHDOWN_MARGIN * shift,
            reduction_coef: 1.0,
        }
    }

    /// Swing window once the half-step is slid `overlap` seconds over the
    /// previous one.
    ///
    /// Beyond [`airborne_safe_overlap`] the liftoff would precede the
    /// previous touchdown, so it is delayed by the excess and the swing
    /// height is scaled by the remaining fraction of the nominal window.
    pub fn for_overlap(constants: &HalfStepConstants, overlap: f64) -> Result<Self, SequenceError> {
        let nominal = Self::nominal(constants);
        let excess = overlap - airborne_safe_overlap(constants);
        if excess <= 0.0 {
            return Ok(nominal);
        }
        let lift = nominal.lift + excess;
        if lift >= nominal.land {
            return Err(SequenceError::SwingCompressedAway { overlap });
        }
        Ok(Self {
            lift,
            land: nominal.land,
            reduction_coef: (nominal.land - lift) / nominal.duration(),
        })
    }

    pub fn duration(&self) -> f64 {
        self.land - self.lift
    }

    /// Normalized swing progress in [0, 1] at local time `t`.
    pub fn progress(&self, t: f64) -> f64 {
        ((t - self.lift) / self.duration()).clamp(0.0, 1.0)
    }
}

/// Largest overlap for which the next liftoff never precedes the previous
/// touchdown with nominal swing windows.
pub fn airborne_safe_overlap(constants: &HalfStepConstants) -> f64 {
    let nominal = SwingProfile::nominal(constants);
    (constants.t_total - nominal.land) + nominal.lift
}

/// Default overlap: the next liftoff coincides with the end of the previous
/// half-step, so the next ZMP transfer onto its support foot plays over the
/// previous post-landing double support.
pub fn nominal_overlap(constants: &HalfStepConstants) -> f64 {
    constants.t_start + LIFTOFF_MARGIN * constants.shift_duration()
}

/// Quintic smooth step: 0 -> 1 with zero velocity and acceleration at both
/// ends.
pub fn smooth_step(u: f64) -> f64 {
    let u = u.clamp(0.0, 1.0);
    u * u * u * (10.0 + u * (-15.0 + 6.0 * u))
}

/// Second derivative of [`smooth_step`] with respect to `u`.
pub fn smooth_step_dd(u: f64) -> f64 {
    let u = u.clamp(0.0, 1.0);
    60.0 * u * (1.0 + u * (-3.0 + 2.0 * u))
}

/// Bell profile 0 -> 1 -> 0 peaking at `u = 0.5`, with zero velocity and
/// acceleration at both ends. Shapes the swing height and the ZMP
/// corrections.
pub fn bell_curve(u: f64) -> f64 {
    let u = u.clamp(0.0, 1.0);
    let v = u * (1.0 - u);
    64.0 * v * v * v
}

fn lerp(a: f64, b: f64, s: f64) -> f64 {
    a + (b - a) * s
}

/// Swing foot state at local time `t`.
///
/// The foot travels from its liftoff pose to the landing pose along a
/// smooth-step path in the support foot frame. At mid-swing it passes the
/// support foot at a lateral distance of at least `h_distance` (the via
/// point) and reaches `max_height * reduction_coef` above the interpolated
/// surface level. The heading interpolates monotonically.
pub fn swing_foot_state(
    stance: &Stance,
    def: &HalfStepDefinition,
    profile: &SwingProfile,
    t: f64,
) -> FootState {
    let u = profile.progress(t);
    let s = smooth_step(u);
    let bell = bell_curve(u);

    let start = stance.swing.pose.relative_to(&stance.support.pose);
    let end = def.pos_and_orient;

    let sign = def.swing_foot().lateral_sign();
    let mid_y = 0.5 * (start.y + end.y);
    let clearance = (def.vp_config.h_distance - sign * mid_y).max(0.0);

    let local = Se2::new(
        lerp(start.x, end.x, s),
        lerp(start.y, end.y, s) + sign * clearance * bell,
        lerp(start.theta, end.theta, s),
    );
    let global = stance.support.pose.compose(&local);

    let ground = lerp(stance.swing.level, def.landing_level(stance.support.level), s);
    FootState {
        x: global.x,
        y: global.y,
        height: ground + profile.reduction_coef * def.vp_config.max_height * bell,
        orient: global.theta,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biped::FootPlacement;
    use approx::assert_relative_eq;

    fn definition(support_foot: Side, target: Se2) -> HalfStepDefinition {
        HalfStepDefinition {
            support_foot,
            half_step_type: HalfStepType::Up,
            level_change: 0.0,
            vp_config: ViaPointConfig::default(),
            pos_and_orient: target,
            ft_dim: FootDimensions::default(),
            constants: HalfStepConstants::default(),
        }
    }

    #[test]
    fn test_smooth_step_endpoints() {
        assert_eq!(smooth_step(0.0), 0.0);
        assert_eq!(smooth_step(1.0), 1.0);
        assert_relative_eq!(smooth_step(0.5), 0.5);
    }

    #[test]
    fn test_smooth_step_acceleration() {
        assert_eq!(smooth_step_dd(0.0), 0.0);
        assert_eq!(smooth_step_dd(1.0), 0.0);
        assert_relative_eq!(smooth_step_dd(0.5), 0.0);
        let h = 1e-4;
        let u = 0.3;
        let fd = (smooth_step(u + h) - 2.0 * smooth_step(u) + smooth_step(u - h)) / (h * h);
        assert_relative_eq!(fd, smooth_step_dd(u), epsilon = 1e-5);
    }

    #[test]
    fn test_bell_curve_peak() {
        assert_eq!(bell_curve(0.0), 0.0);
        assert_eq!(bell_curve(1.0), 0.0);
        assert_relative_eq!(bell_curve(0.5), 1.0);
        assert_relative_eq!(bell_curve(0.25), bell_curve(0.75));
    }

    #[test]
    fn test_nominal_profile_times() {
        let c = HalfStepConstants::default();
        let p = SwingProfile::nominal(&c);
        assert_relative_eq!(p.lift, 0.345, epsilon = 1e-12);
        assert_relative_eq!(p.land, 0.52, epsilon = 1e-12);
        assert_eq!(p.reduction_coef, 1.0);
        assert_relative_eq!(airborne_safe_overlap(&c), 0.625, epsilon = 1e-12);
        assert_relative_eq!(nominal_overlap(&c), 0.345, epsilon = 1e-12);
    }

    #[test]
    fn test_large_overlap_delays_liftoff_and_reduces_height() {
        let c = HalfStepConstants::default();
        let p = SwingProfile::for_overlap(&c, 0.7).unwrap();
        assert_relative_eq!(p.lift, 0.42, epsilon = 1e-12);
        assert_relative_eq!(p.reduction_coef, 0.1 / 0.175, epsilon = 1e-12);

        assert_eq!(SwingProfile::for_overlap(&c, 0.3).unwrap(), SwingProfile::nominal(&c));
        assert!(matches!(
            SwingProfile::for_overlap(&c, 0.85),
            Err(SequenceError::SwingCompressedAway { .. })
        ));
    }

    #[test]
    fn test_swing_foot_lands_on_target() {
        let vp = ViaPointConfig::default();
        let stance = Stance::standing(Side::Left, FootPlacement::on_ground(Se2::default()), &vp);
        let def = definition(Side::Left, Se2::new(0.1, -0.2, 0.3));
        let profile = SwingProfile::nominal(&def.constants);

        let before = swing_foot_state(&stance, &def, &profile, 0.0);
        assert_relative_eq!(before.y, -0.2, epsilon = 1e-12);
        assert_eq!(before.height, 0.0);

        let after = swing_foot_state(&stance, &def, &profile, 0.7);
        assert_relative_eq!(after.x, 0.1, epsilon = 1e-12);
        assert_relative_eq!(after.y, -0.2, epsilon = 1e-12);
        assert_relative_eq!(after.orient, 0.3, epsilon = 1e-12);
        assert_eq!(after.height, 0.0);

        let mid = swing_foot_state(&stance, &def, &profile, 0.4325);
        assert_relative_eq!(mid.height, vp.max_height, epsilon = 1e-12);
    }

    #[test]
    fn test_swing_foot_keeps_lateral_clearance() {
        let vp = ViaPointConfig::default();
        let stance = Stance::standing(Side::Left, FootPlacement::on_ground(Se2::default()), &vp);
        // Landing closer to the support foot than the nominal separation.
        let def = definition(Side::Left, Se2::new(0.1, -0.1, 0.0));
        let profile = SwingProfile::nominal(&def.constants);

        let mid = swing_foot_state(&stance, &def, &profile, 0.4325);
        assert_relative_eq!(mid.y, -vp.h_distance, epsilon = 1e-12);
    }

    #[test]
    fn test_down_step_lands_lower() {
        let vp = ViaPointConfig::default();
        let stance = Stance::standing(Side::Right, FootPlacement::new(Se2::default(), 0.1), &vp);
        let mut def = definition(Side::Right, Se2::new(0.1, 0.2, 0.0));
        def.half_step_type = HalfStepType::Down;
        def.level_change = 0.05;
        let profile = SwingProfile::nominal(&def.constants);

        let landed = swing_foot_state(&stance, &def, &profile, 0.75);
        assert_relative_eq!(landed.height, 0.05, epsilon = 1e-12);
    }
}
