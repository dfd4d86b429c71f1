//! Sliding composition of half-steps into one trajectory.
//!
//! Each half-step is synthesized as if isolated, starting and ending at
//! rest. Concatenating them would make the robot stop at every step, so each
//! new segment is slid back over the tail of the composite by the negative
//! overlap and superposed onto it: the composite gains the segment's motion
//! relative to its first sample. The cart-table model is linear, so the sum
//! of two valid CoM/ZMP motions is itself valid. A segment holds still until
//! its `t_start`, so at the seam the composite carries on with the previous
//! motion unchanged.
//!
//! Once the schedule is exhausted, a final settle brings the CoM to rest
//! over the last landed foot.

use tracing::{debug, info, warn};

use crate::biped::{FootPlacement, Stance};
use crate::config::PlannerConfig;
use crate::error::{PlannerError, Result, SequenceError, ValidationRejection};
use crate::gait::{HalfStepDefinition, HalfStepType, SwingProfile};
use crate::half_step::{final_settle, generate_with_profile, HalfStep};
use crate::se2::Se2;
use crate::stability::{AlwaysValid, RejectionPolicy, ValidityOracle};
use crate::trajectory::{InstantFeatures, TrajFeatures};
use crate::zmp::ZmpCalculator;

/// One entry of the step schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepCommand {
    /// Landing pose of the swing foot relative to the standing posture:
    /// `(0, 0, 0)` puts it parallel to the support foot at `h_distance`.
    pub displacement: Se2,
    pub half_step_type: HalfStepType,
    pub level_change: f64,
}

impl StepCommand {
    /// A step on the same surface: an `Up` half-step with `level_change = 0`.
    pub fn flat(displacement: Se2) -> Self {
        Self {
            displacement,
            half_step_type: HalfStepType::Up,
            level_change: 0.0,
        }
    }
}

/// Reads a flat list of reals as `(x, y, theta)` triples.
pub fn parse_step_list(values: &[f64]) -> std::result::Result<Vec<StepCommand>, SequenceError> {
    if values.len() % 3 != 0 {
        return Err(SequenceError::MalformedSchedule(values.len()));
    }
    values
        .chunks_exact(3)
        .enumerate()
        .map(|(step, v)| {
            if v.iter().all(|x| x.is_finite()) {
                Ok(StepCommand::flat(Se2::new(v[0], v[1], v[2])))
            } else {
                Err(SequenceError::NonFiniteDisplacement { step })
            }
        })
        .collect()
}

/// Accumulator threaded through the composition, one half-step at a time.
#[derive(Debug, Clone)]
pub struct SlidingState {
    /// Stance for the next half-step
    pub stance: Stance,
    pub trajectory: TrajFeatures,
    pub half_steps: Vec<HalfStep>,
    pub rejections: Vec<ValidationRejection>,
    /// Index of the next command in the schedule
    pub next_step: usize,
}

impl SlidingState {
    pub fn new(stance: Stance, incr_time: f64) -> Self {
        Self {
            stance,
            trajectory: TrajFeatures::new(incr_time),
            half_steps: Vec::new(),
            rejections: Vec::new(),
            next_step: 0,
        }
    }
}

/// Result of a composition.
#[derive(Debug, Clone)]
pub struct Composition {
    pub initial_stance: Stance,
    /// Stance the robot ends in
    pub final_stance: Stance,
    pub trajectory: TrajFeatures,
    pub half_steps: Vec<HalfStep>,
    /// Rejections reported under [`RejectionPolicy::Flag`] or
    /// [`RejectionPolicy::Skip`]
    pub rejections: Vec<ValidationRejection>,
}

/// Walking pattern generator: turns a step schedule into the composite
/// trajectory of CoM, ZMP and feet.
pub struct SlidingPlanner<O = AlwaysValid> {
    config: PlannerConfig,
    oracle: O,
}

impl SlidingPlanner<AlwaysValid> {
    pub fn unchecked(config: PlannerConfig) -> Result<Self> {
        Self::new(config, AlwaysValid)
    }
}

impl<O: ValidityOracle> SlidingPlanner<O> {
    pub fn new(config: PlannerConfig, oracle: O) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, oracle })
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn initial_stance(&self) -> Stance {
        Stance::standing(
            self.config.first_support_foot,
            FootPlacement::on_ground(self.config.initial_support),
            &self.config.vp_config,
        )
    }

    /// Composite trajectory for a flat list of `(x, y, theta)` triples.
    pub fn produce_traj(&self, steps: &[f64]) -> Result<Composition> {
        let commands = parse_step_list(steps)?;
        self.produce_from_commands(&commands)
    }

    pub fn produce_from_commands(&self, commands: &[StepCommand]) -> Result<Composition> {
        let initial_stance = self.initial_stance();
        info!(
            steps = commands.len(),
            first_support = ?initial_stance.support_side,
            "composing half-steps"
        );

        let state = commands.iter().try_fold(
            SlidingState::new(initial_stance, self.config.incr_time),
            |state, command| self.slide(state, command),
        )?;
        let state = self.settle(state)?;

        info!(
            samples = state.trajectory.size(),
            half_steps = state.half_steps.len(),
            rejections = state.rejections.len(),
            "composition done"
        );
        Ok(Composition {
            initial_stance,
            final_stance: state.stance,
            trajectory: state.trajectory,
            half_steps: state.half_steps,
            rejections: state.rejections,
        })
    }

    fn definition(&self, stance: &Stance, command: &StepCommand) -> HalfStepDefinition {
        let d = command.displacement;
        let lateral = stance.swing_side().lateral_sign() * self.config.vp_config.h_distance;
        HalfStepDefinition {
            support_foot: stance.support_side,
            half_step_type: command.half_step_type,
            level_change: command.level_change,
            vp_config: self.config.vp_config,
            pos_and_orient: Se2::new(d.x, d.y + lateral, d.theta),
            ft_dim: self.config.ft_dim,
            constants: self.config.constants,
        }
    }

    /// Folds one more half-step into `state`.
    pub fn slide(&self, mut state: SlidingState, command: &StepCommand) -> Result<SlidingState> {
        let step = state.next_step;
        state.next_step += 1;

        let stance = state.stance;
        let def = self.definition(&stance, command);
        let incr_time = self.config.incr_time;

        let (overlap_samples, profile) = if state.trajectory.is_empty() {
            (0, SwingProfile::nominal(&def.constants))
        } else {
            let samples = self.config.overlap_samples();
            let profile = SwingProfile::for_overlap(&def.constants, samples as f64 * incr_time)?;
            (samples, profile)
        };
        let negative_overlap = overlap_samples as f64 * incr_time;

        let landing_level = def.landing_level(stance.support.level);
        if landing_level < 0.0 {
            return Err(SequenceError::BelowGround {
                step,
                side: stance.swing_side(),
                level: landing_level,
            }
            .into());
        }

        let segment = generate_with_profile(&stance, &def, &profile, incr_time)?;
        let start = state.trajectory.size().saturating_sub(overlap_samples);
        let staged = superpose(&state.trajectory, start, &segment);

        let record = HalfStep {
            definition: def,
            support_foot_config: stance.support.pose,
            traj_feats: segment,
            negative_overlap,
            reduction_coef: profile.reduction_coef,
        };

        if let Some(rejection) = self.check(step, start, &staged, &record) {
            if self.reject(&mut state, rejection)? {
                return Ok(state);
            }
        }

        debug!(
            step,
            support = ?stance.support_side,
            x = stance.support.pose.x,
            y = stance.support.pose.y,
            start,
            negative_overlap,
            reduction_coef = profile.reduction_coef,
            "half-step committed"
        );

        let landing = FootPlacement::new(record.landing_pose(), landing_level);
        state.trajectory.traj.truncate(start);
        state.trajectory.traj.extend(staged);
        state.trajectory.half_steps_start_indexes.push(start);
        state.half_steps.push(record);
        state.stance = stance.after_landing(landing);
        Ok(state)
    }

    /// Appends the final settle onto the last landed foot, the current
    /// support. Nothing to settle before the first half-step.
    pub fn settle(&self, mut state: SlidingState) -> Result<SlidingState> {
        let samples = self.config.settle_samples();
        let Some(from) = state.trajectory.last().copied() else {
            return Ok(state);
        };
        if samples == 0 {
            return Ok(state);
        }

        let target = state.stance.support.pose.position();
        let zmp_calc = ZmpCalculator::new(&self.config.constants);
        let settle = final_settle(&from, target, &zmp_calc, self.config.incr_time, samples);
        let start = state.trajectory.size();

        if let Some(j) = settle.iter().position(|s| !self.oracle.is_valid(s)) {
            let rejection = ValidationRejection {
                step: state.next_step,
                sample: Some(start + j),
                reason: "final settle failed the validity check".into(),
            };
            if self.reject(&mut state, rejection)? {
                return Ok(state);
            }
        }

        debug!(samples, x = target.x, y = target.y, "final settle appended");
        state.trajectory.traj.extend(settle);
        Ok(state)
    }

    /// Applies the rejection policy. `Ok(true)` when the rejected piece is
    /// dropped.
    fn reject(&self, state: &mut SlidingState, rejection: ValidationRejection) -> Result<bool> {
        let policy = self.config.rejection_policy;
        warn!(step = rejection.step, ?policy, "{}", rejection);
        match policy {
            RejectionPolicy::Abort => Err(PlannerError::Rejected(rejection)),
            RejectionPolicy::Skip => {
                state.rejections.push(rejection);
                Ok(true)
            }
            RejectionPolicy::Flag => {
                state.rejections.push(rejection);
                Ok(false)
            }
        }
    }

    fn check(
        &self,
        step: usize,
        start: usize,
        staged: &[InstantFeatures],
        record: &HalfStep,
    ) -> Option<ValidationRejection> {
        if let Some(j) = staged.iter().position(|s| !self.oracle.is_valid(s)) {
            return Some(ValidationRejection {
                step,
                sample: Some(start + j),
                reason: "sample failed the validity check".into(),
            });
        }
        if !self.oracle.is_valid_half_step(record) {
            return Some(ValidationRejection {
                step,
                sample: None,
                reason: "half-step failed the validity check".into(),
            });
        }
        None
    }
}

/// Samples replacing `composite.traj[start..]` once `segment` is slid to
/// begin at `start`: the composite, held at its last sample past its end,
/// plus the segment's motion since its first sample.
fn superpose(composite: &TrajFeatures, start: usize, segment: &TrajFeatures) -> Vec<InstantFeatures> {
    let (Some(origin), Some(held)) = (segment.traj.first(), composite.last()) else {
        return segment.traj.clone();
    };
    segment
        .traj
        .iter()
        .enumerate()
        .map(|(j, sample)| {
            let base = composite.traj.get(start + j).unwrap_or(held);
            base.displaced(origin, sample)
        })
        .collect()
}
