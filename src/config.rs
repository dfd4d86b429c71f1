use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::biped::{FootDimensions, HalfStepConstants, Side, ViaPointConfig};
use crate::error::{DomainError, Result, SequenceError};
use crate::gait::{nominal_overlap, SwingProfile};
use crate::half_step::check_sampling;
use crate::se2::Se2;
use crate::stability::RejectionPolicy;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_incr_time() -> f64 {
    0.005
}
const fn default_first_support_foot() -> Side {
    Side::Left
}
const fn default_settle_time() -> f64 {
    1.0
}
fn default_steps() -> Vec<f64> {
    vec![0.1, 0.0, 0.0, 0.1, 0.0, 0.0]
}

// ---------------------------------------------------------------------------
// PlannerConfig
// ---------------------------------------------------------------------------

/// Everything the sliding planner needs, set once before composing.
///
/// Every field has a default, so an empty TOML document is a valid
/// configuration: two 10 cm steps forward from the left foot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Sampling interval of the trajectory in seconds (default: 0.005 = 200 Hz).
    #[serde(default = "default_incr_time")]
    pub incr_time: f64,

    /// Foot supporting the robot during the first half-step.
    #[serde(default = "default_first_support_foot")]
    pub first_support_foot: Side,

    #[serde(default)]
    pub vp_config: ViaPointConfig,

    #[serde(default)]
    pub ft_dim: FootDimensions,

    #[serde(default)]
    pub constants: HalfStepConstants,

    /// Time (s) each half-step is slid back over the previous one. Defaults
    /// to [`nominal_overlap`].
    #[serde(default)]
    pub overlap: Option<f64>,

    /// Duration (s) of the final settle bringing the CoM to rest over the
    /// last landed foot. `0` ends the trajectory between the feet.
    #[serde(default = "default_settle_time")]
    pub settle_time: f64,

    #[serde(default)]
    pub rejection_policy: RejectionPolicy,

    /// Global pose of the first support foot.
    #[serde(default)]
    pub initial_support: Se2,

    /// Step schedule as flat `(x, y, theta)` triples, used by the binary.
    #[serde(default = "default_steps")]
    pub steps: Vec<f64>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            incr_time: default_incr_time(),
            first_support_foot: default_first_support_foot(),
            vp_config: ViaPointConfig::default(),
            ft_dim: FootDimensions::default(),
            constants: HalfStepConstants::default(),
            overlap: None,
            settle_time: default_settle_time(),
            rejection_policy: RejectionPolicy::default(),
            initial_support: Se2::default(),
            steps: default_steps(),
        }
    }
}

impl PlannerConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<()> {
        self.constants.validate()?;
        self.ft_dim.validate()?;
        self.vp_config.validate()?;
        if !self.initial_support.is_finite() {
            return Err(DomainError::NonFinitePose.into());
        }

        let n = check_sampling(
            &self.constants,
            &SwingProfile::nominal(&self.constants),
            self.incr_time,
        )?;

        let overlap = self.overlap();
        if !(overlap >= 0.0) {
            return Err(SequenceError::NegativeOverlap(overlap).into());
        }
        if self.overlap_samples() >= n {
            return Err(SequenceError::OverlapTooLarge {
                overlap,
                duration: self.constants.t_total,
            }
            .into());
        }
        let profile = SwingProfile::for_overlap(&self.constants, self.used_overlap())?;
        check_sampling(&self.constants, &profile, self.incr_time)?;

        if !(self.settle_time >= 0.0 && self.settle_time.is_finite()) {
            return Err(SequenceError::InvalidSettleTime(self.settle_time).into());
        }
        Ok(())
    }

    pub fn overlap(&self) -> f64 {
        self.overlap.unwrap_or_else(|| nominal_overlap(&self.constants))
    }

    /// The overlap as a whole number of samples.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn overlap_samples(&self) -> usize {
        (self.overlap() / self.incr_time).round() as usize
    }

    /// The overlap actually applied once rounded to the sampling grid.
    pub fn used_overlap(&self) -> f64 {
        self.overlap_samples() as f64 * self.incr_time
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn settle_samples(&self) -> usize {
        (self.settle_time / self.incr_time).round() as usize
    }
}
