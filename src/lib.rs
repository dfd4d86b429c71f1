//! Half-step based walking pattern generator for biped robots.
//!
//! A walk is described as a list of half-steps, each moving one foot while
//! the other supports the robot. Every half-step is synthesized in isolation
//! from rest to rest, then slid back over the tail of the trajectory built so
//! far so the robot keeps moving between steps.

pub mod biped;
pub mod config;
pub mod error;
pub mod gait;
pub mod half_step;
pub mod projection;
pub mod se2;
pub mod sliding;
pub mod stability;
pub mod trajectory;
pub mod zmp;

pub use config::PlannerConfig;
pub use error::{PlannerError, Result};
pub use sliding::{Composition, SlidingPlanner, StepCommand};
