use thiserror::Error;

use crate::biped::Side;

/// Invalid timing or geometry constants.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("t_start must be > 0, got {0}")]
    NonPositiveStart(f64),
    #[error("t_total ({t_total}) must be greater than t_start ({t_start})")]
    TotalNotAfterStart { t_start: f64, t_total: f64 },
    #[error("gravity must be > 0, got {0}")]
    NonPositiveGravity(f64),
    #[error("standard_height must be > 0, got {0}")]
    NonPositiveHeight(f64),
    #[error("sampling interval must be in (0, t_total], got {incr_time} for t_total {t_total}")]
    InvalidSamplingInterval { incr_time: f64, t_total: f64 },
    #[error("foot dimensions must be > 0, got width {width} and length {length}")]
    NonPositiveFootDimension { width: f64, length: f64 },
    #[error("via-point max height must be >= 0, got {0}")]
    NegativeSwingHeight(f64),
    #[error("lateral foot separation must be > 0, got {0}")]
    NonPositiveSeparation(f64),
    #[error("level change must be >= 0, got {0}")]
    NegativeLevelChange(f64),
    #[error("initial support pose is not finite")]
    NonFinitePose,
    #[error("stance is supported by the {stance:?} foot but the half-step by the {definition:?} foot")]
    SupportSideMismatch { stance: Side, definition: Side },
}

/// Malformed or infeasible step schedule.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SequenceError {
    #[error("step list has {0} values, expected groups of three (x, y, theta)")]
    MalformedSchedule(usize),
    #[error("step {step} contains a non-finite displacement")]
    NonFiniteDisplacement { step: usize },
    #[error("overlap {overlap}s leaves no samples of a {duration}s half-step")]
    OverlapTooLarge { overlap: f64, duration: f64 },
    #[error("overlap must be >= 0, got {0}")]
    NegativeOverlap(f64),
    #[error("overlap {overlap}s compresses the swing window away")]
    SwingCompressedAway { overlap: f64 },
    #[error("step {step} would place the {side:?} foot below ground level ({level})")]
    BelowGround { step: usize, side: Side, level: f64 },
    #[error("final settle time must be finite and >= 0, got {0}")]
    InvalidSettleTime(f64),
}

/// The validity oracle refused a generated half-step.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("half-step {step} rejected{}: {reason}", .sample.map(|s| format!(" at sample {s}")).unwrap_or_default())]
pub struct ValidationRejection {
    /// Index of the half-step in the schedule.
    pub step: usize,
    /// Index of the offending sample in the composite trajectory, if per sample.
    pub sample: Option<usize>,
    pub reason: String,
}

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
    #[error("sequence error: {0}")]
    Sequence(#[from] SequenceError),
    #[error("validation rejected: {0}")]
    Rejected(#[from] ValidationRejection),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, PlannerError>;
