//! Synthesis of one isolated half-step.
//!
//! A half-step runs from `0` to `t_total` and starts and ends at rest, the
//! CoM and ZMP both on the midpoint of the two feet ([`Stance::rest_point`]):
//!
//! 1. pre-shift, `0 -> t_start`: nothing moves;
//! 2. shift, `t_start ->` [`SwingProfile::lift`]: both feet grounded, the ZMP
//!    moves onto the support foot;
//! 3. swing-and-land, `lift -> land`: the ZMP stays on the support foot
//!    while the swing foot travels to its target;
//! 4. settle, `land ->` last sample: both feet grounded again, the ZMP
//!    moves back to the midpoint of the support and landed feet.
//!
//! The ZMP is the primary reference. The CoM is its exact cart-table
//! response, and a bell added to each ZMP transfer is sized so that the CoM
//! ends at rest on the new midpoint. The landing pose is
//! `support ∘ pos_and_orient`.

use nalgebra as na;

use crate::biped::{HalfStepConstants, Stance};
use crate::error::DomainError;
use crate::gait::{
    bell_curve, smooth_step, smooth_step_dd, swing_foot_state, HalfStepDefinition, SwingProfile,
};
use crate::se2::Se2;
use crate::trajectory::{sample_count, FootState, InstantFeatures, TrajFeatures};
use crate::zmp::{PendulumState, ZmpCalculator};

/// One realized half-step: its definition, where it was performed and how it
/// was slid over its predecessor.
#[derive(Debug, Clone, PartialEq)]
pub struct HalfStep {
    pub definition: HalfStepDefinition,
    /// Global pose of the support foot
    pub support_foot_config: Se2,
    /// Features of the isolated half-step, before sliding
    pub traj_feats: TrajFeatures,
    /// Time (s) this half-step was slid back over the previous one
    pub negative_overlap: f64,
    /// Factor applied to the swing foot height
    pub reduction_coef: f64,
}

impl HalfStep {
    /// Global pose of the swing foot once landed.
    pub fn landing_pose(&self) -> Se2 {
        self.support_foot_config.compose(&self.definition.pos_and_orient)
    }
}

/// Number of samples of a half-step, provided the grid holds a sample after
/// `t_start` and at least one sample after the touchdown.
pub fn check_sampling(
    constants: &HalfStepConstants,
    profile: &SwingProfile,
    incr_time: f64,
) -> Result<usize, DomainError> {
    let n = sample_count(constants.t_total, incr_time)?;
    let t_end = n.saturating_sub(1) as f64 * incr_time;
    if t_end <= constants.t_start || t_end <= profile.land {
        return Err(DomainError::InvalidSamplingInterval {
            incr_time,
            t_total: constants.t_total,
        });
    }
    Ok(n)
}

/// Double-support interval over which the ZMP moves.
#[derive(Debug, Clone, Copy)]
struct Transfer {
    begin: f64,
    end: f64,
}

impl Transfer {
    fn progress(&self, t: f64) -> f64 {
        (t - self.begin) / (self.end - self.begin)
    }
}

/// ZMP path of a half-step: `rest_start` to `foot` during `onto_support`,
/// held on `foot`, then `foot` to `rest_end` during `between_feet`.
#[derive(Debug, Clone, Copy)]
struct ZmpPlan {
    rest_start: na::Vector2<f64>,
    foot: na::Vector2<f64>,
    rest_end: na::Vector2<f64>,
    onto_support: Transfer,
    between_feet: Transfer,
}

impl ZmpPlan {
    fn nominal(&self, t: f64) -> na::Vector2<f64> {
        self.rest_start
            + (self.foot - self.rest_start) * smooth_step(self.onto_support.progress(t))
            + (self.rest_end - self.foot) * smooth_step(self.between_feet.progress(t))
    }

    /// Both correction bells in one signal, x for the first transfer and y
    /// for the second, so that their responses come out of a single pass.
    fn bells(&self, t: f64) -> na::Vector2<f64> {
        na::Vector2::new(
            bell_curve(self.onto_support.progress(t)),
            bell_curve(self.between_feet.progress(t)),
        )
    }

    /// Samples of the path at `times`, corrected so that the CoM ends at rest
    /// on `rest_end`. `None` when the grid is too coarse for that.
    fn sample(
        &self,
        zmp_calc: &ZmpCalculator,
        times: &[f64],
        incr_time: f64,
    ) -> Option<Vec<na::Vector2<f64>>> {
        let nominal: Vec<_> = times.iter().map(|&t| self.nominal(t)).collect();
        let bells: Vec<_> = times.iter().map(|&t| self.bells(t)).collect();

        let nominal_end = zmp_calc
            .track(&nominal, PendulumState::at_rest(self.rest_start), incr_time)
            .last()
            .copied()?;
        let bells_end = zmp_calc
            .track(&bells, PendulumState::at_rest(na::Vector2::zeros()), incr_time)
            .last()
            .copied()?;

        // At rest on `rest_end` both components equal it. Rows: divergent
        // then convergent. Gains: one row per bell, one column per axis.
        let response = na::Matrix2::new(
            bells_end.divergent.x,
            bells_end.divergent.y,
            bells_end.convergent.x,
            bells_end.convergent.y,
        );
        let residual = na::Matrix2::from_rows(&[
            (self.rest_end - nominal_end.divergent).transpose(),
            (self.rest_end - nominal_end.convergent).transpose(),
        ]);
        let gains = response.try_inverse()? * residual;
        let first: na::Vector2<f64> = gains.row(0).transpose();
        let second: na::Vector2<f64> = gains.row(1).transpose();

        Some(
            nominal
                .iter()
                .zip(&bells)
                .map(|(z, bell)| z + first * bell.x + second * bell.y)
                .collect(),
        )
    }
}

/// Features of the half-step `def` performed from `stance`, sampled every
/// `incr_time`, with the nominal swing window.
pub fn generate_half_step_features(
    stance: &Stance,
    def: &HalfStepDefinition,
    incr_time: f64,
) -> Result<TrajFeatures, DomainError> {
    generate_with_profile(stance, def, &SwingProfile::nominal(&def.constants), incr_time)
}

/// Same as [`generate_half_step_features`] with an explicit swing window.
///
/// The segment holds `floor(t_total / incr_time)` samples, sample `k` being
/// at time `k * incr_time`.
pub fn generate_with_profile(
    stance: &Stance,
    def: &HalfStepDefinition,
    profile: &SwingProfile,
    incr_time: f64,
) -> Result<TrajFeatures, DomainError> {
    def.validate()?;
    if stance.support_side != def.support_foot {
        return Err(DomainError::SupportSideMismatch {
            stance: stance.support_side,
            definition: def.support_foot,
        });
    }
    let c = &def.constants;
    let n = check_sampling(c, profile, incr_time)?;
    let t_end = (n - 1) as f64 * incr_time;
    let times: Vec<f64> = (0..n).map(|k| k as f64 * incr_time).collect();
    let zmp_calc = ZmpCalculator::new(c);

    let support = &stance.support;
    let landing = support.pose.compose(&def.pos_and_orient);
    let landing_level = def.landing_level(support.level);
    let foot = support.pose.position();
    let rest_start = stance.rest_point();
    let rest_end = (foot + landing.position()) * 0.5;

    let plan = ZmpPlan {
        rest_start,
        foot,
        rest_end,
        onto_support: Transfer {
            begin: c.t_start,
            end: profile.lift,
        },
        between_feet: Transfer {
            begin: profile.land,
            end: t_end,
        },
    };
    let zmp = plan
        .sample(&zmp_calc, &times, incr_time)
        .ok_or(DomainError::InvalidSamplingInterval {
            incr_time,
            t_total: c.t_total,
        })?;
    let states = zmp_calc.track(&zmp, PendulumState::at_rest(rest_start), incr_time);
    let support_state = FootState::from(support);

    let mut segment = TrajFeatures::new(incr_time);
    segment.traj.reserve(n);
    segment.half_steps_start_indexes.push(0);

    for ((&t, z), state) in times.iter().zip(&zmp).zip(&states) {
        let com = state.com();
        // The CoM height follows the mean level of the two feet.
        let s = smooth_step((t - c.t_start) / (t_end - c.t_start));
        let swing_level = stance.swing.level + (landing_level - stance.swing.level) * s;
        let swing_state = swing_foot_state(stance, def, profile, t);

        let mut sample = InstantFeatures {
            com_x: com.x,
            com_y: com.y,
            com_height: c.standard_height + 0.5 * (support.level + swing_level),
            zmp_x: z.x,
            zmp_y: z.y,
            waist_orient: 0.5 * (support_state.orient + swing_state.orient),
            ..Default::default()
        };
        *sample.foot_mut(def.support_foot) = support_state;
        *sample.foot_mut(def.swing_foot()) = swing_state;
        segment.traj.push(sample);
    }

    Ok(segment)
}

/// Samples following `from`, a sample at rest with both feet grounded, that
/// bring the CoM to rest on `target` over `samples * incr_time` seconds.
///
/// The CoM follows a quintic smooth step and the ZMP is its cart-table
/// image, so both start and end on the CoM. Feet, height and waist stay put.
pub fn final_settle(
    from: &InstantFeatures,
    target: na::Vector2<f64>,
    zmp_calc: &ZmpCalculator,
    incr_time: f64,
    samples: usize,
) -> Vec<InstantFeatures> {
    let start = na::Vector2::new(from.com_x, from.com_y);
    let travel = target - start;
    let duration = samples as f64 * incr_time;
    (1..=samples)
        .map(|k| {
            let u = k as f64 / samples as f64;
            let com = start + travel * smooth_step(u);
            let com_ddot = travel * (smooth_step_dd(u) / (duration * duration));
            let zmp = zmp_calc.calculate_zmp(&com, &com_ddot);
            InstantFeatures {
                com_x: com.x,
                com_y: com.y,
                zmp_x: zmp.x,
                zmp_y: zmp.y,
                ..*from
            }
        })
        .collect()
}
