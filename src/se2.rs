use nalgebra as na;
use serde::{Deserialize, Serialize};

/// Element of the special Euclidean group SE(2): a planar position plus a
/// heading in radians.
///
/// The heading is a free real. Composition adds headings without wrapping
/// them into (-pi, pi].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Se2 {
    pub x: f64,
    pub y: f64,
    pub theta: f64,
}

impl Se2 {
    pub const fn new(x: f64, y: f64, theta: f64) -> Self {
        Self { x, y, theta }
    }

    pub fn position(&self) -> na::Vector2<f64> {
        na::Vector2::new(self.x, self.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.theta.is_finite()
    }

    /// Rigid transform composition `self ∘ local`: `local` is expressed in
    /// the frame of `self`, the result in the frame `self` is expressed in.
    pub fn compose(&self, local: &Se2) -> Se2 {
        let p = self.position() + na::Rotation2::new(self.theta) * local.position();
        Se2::new(p.x, p.y, self.theta + local.theta)
    }

    pub fn inverse(&self) -> Se2 {
        let p = na::Rotation2::new(-self.theta) * -self.position();
        Se2::new(p.x, p.y, -self.theta)
    }

    /// Pose of `self` expressed in the local frame of `frame`.
    pub fn relative_to(&self, frame: &Se2) -> Se2 {
        frame.inverse().compose(self)
    }

    /// Euclidean distance between the two positions; headings are ignored.
    pub fn dist(&self, other: &Se2) -> f64 {
        (self.position() - other.position()).norm()
    }

    /// Reflection through the x axis.
    pub fn mirrored(&self) -> Se2 {
        Se2::new(self.x, -self.y, -self.theta)
    }
}
