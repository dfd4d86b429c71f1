use nalgebra as na;

use crate::biped::{FootDimensions, HalfStepConstants};
use crate::se2::Se2;

/// CoM motion of the cart-table model split into its divergent and
/// convergent components, `com + com_dot / omega` and `com - com_dot / omega`.
///
/// The divergent component runs away from the ZMP and the convergent one
/// falls onto it: `d' = omega (d - zmp)`, `c' = -omega (c - zmp)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendulumState {
    pub divergent: na::Vector2<f64>,
    pub convergent: na::Vector2<f64>,
}

impl PendulumState {
    pub fn at_rest(com: na::Vector2<f64>) -> Self {
        Self {
            divergent: com,
            convergent: com,
        }
    }

    pub fn com(&self) -> na::Vector2<f64> {
        (self.divergent + self.convergent) * 0.5
    }

    pub fn com_velocity(&self, omega: f64) -> na::Vector2<f64> {
        (self.divergent - self.convergent) * (0.5 * omega)
    }
}

/// Zero Moment Point from the cart-table model.
///
/// With the CoM kept at a constant reference height `z`, the ZMP is
/// x_zmp = x_com - (z / g) * x_com_ddot
/// y_zmp = y_com - (z / g) * y_com_ddot
///
/// The relation is linear, so the ZMP of a sum of CoM motions is the sum of
/// their ZMPs. Sliding composition relies on this.
pub struct ZmpCalculator {
    /// z / g (s^2)
    pendulum_constant: f64,
}

impl ZmpCalculator {
    pub fn new(constants: &HalfStepConstants) -> Self {
        Self {
            pendulum_constant: constants.pendulum_constant(),
        }
    }

    pub fn calculate_zmp(
        &self,
        com: &na::Vector2<f64>,
        com_acceleration: &na::Vector2<f64>,
    ) -> na::Vector2<f64> {
        com - com_acceleration * self.pendulum_constant
    }

    /// Natural frequency `sqrt(g / z)` (1/s).
    pub fn omega(&self) -> f64 {
        self.pendulum_constant.recip().sqrt()
    }

    /// Exact state `dt` seconds later while the ZMP moves linearly from
    /// `zmp_from` to `zmp_to`.
    pub fn advance(
        &self,
        state: &PendulumState,
        zmp_from: &na::Vector2<f64>,
        zmp_to: &na::Vector2<f64>,
        dt: f64,
    ) -> PendulumState {
        let omega = self.omega();
        // ZMP velocity over omega
        let lead = (zmp_to - zmp_from) / (omega * dt);
        let growth = (omega * dt).exp();
        PendulumState {
            divergent: zmp_to + lead + (state.divergent - zmp_from - lead) * growth,
            convergent: zmp_to - lead + (state.convergent - zmp_from + lead) / growth,
        }
    }

    /// States at every sample of a ZMP reference sampled every `dt` and
    /// linear in between, `start` being the state at the first sample.
    pub fn track(&self, zmp: &[na::Vector2<f64>], start: PendulumState, dt: f64) -> Vec<PendulumState> {
        if zmp.is_empty() {
            return Vec::new();
        }
        std::iter::once(start)
            .chain(zmp.windows(2).scan(start, |state, w| {
                *state = self.advance(state, &w[0], &w[1], dt);
                Some(*state)
            }))
            .collect()
    }
}

/// The four corners of a rectangular foot centered on `pose`, counter
/// clockwise.
pub fn foot_support_polygon(pose: &Se2, ft_dim: &FootDimensions) -> Vec<na::Vector2<f64>> {
    let half_length = ft_dim.length / 2.0;
    let half_width = ft_dim.width / 2.0;
    [
        (-half_length, -half_width),
        (half_length, -half_width),
        (half_length, half_width),
        (-half_length, half_width),
    ]
    .iter()
    .map(|&(x, y)| pose.compose(&Se2::new(x, y, 0.0)).position())
    .collect()
}

fn cross(o: &na::Vector2<f64>, a: &na::Vector2<f64>, b: &na::Vector2<f64>) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Convex hull (counter clockwise, monotone chain) of a point set: the
/// support polygon of several grounded footprints.
pub fn convex_hull(points: &[na::Vector2<f64>]) -> Vec<na::Vector2<f64>> {
    let mut pts = points.to_vec();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let mut hull: Vec<na::Vector2<f64>> = Vec::with_capacity(2 * pts.len());
    for p in &pts {
        while hull.len() >= 2 && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(*p);
    }
    // Upper chain must not eat into the lower one.
    let lower_len = hull.len() + 1;
    for p in pts.iter().rev().skip(1) {
        while hull.len() >= lower_len
            && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], p) <= 0.0
        {
            hull.pop();
        }
        hull.push(*p);
    }
    hull.pop();
    hull
}

/// Signed distance from `p` to the boundary of a counter clockwise convex
/// polygon: positive inside, negative outside (clamped per edge, so the
/// outside value is a lower bound on the true distance).
pub fn inside_margin(p: &na::Vector2<f64>, polygon: &[na::Vector2<f64>]) -> f64 {
    if polygon.len() < 3 {
        return f64::NEG_INFINITY;
    }
    polygon
        .iter()
        .zip(polygon.iter().cycle().skip(1))
        .map(|(a, b)| {
            let edge = b - a;
            cross(a, b, p) / edge.norm()
        })
        .fold(f64::INFINITY, f64::min)
}
