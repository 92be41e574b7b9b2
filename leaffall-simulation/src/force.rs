//! Acceleration field acting on the leaves.
//!
//! The field is a sum of contributions: ambient gravity and wind everywhere,
//! plus a radial push and swirl around an active pointer. Sampling never
//! touches particle state.

use crate::disturbance::DisturbanceSource;
use glam::Vec2;
use leaffall_config::FieldParams;
use std::f64::consts::TAU;
use std::ops::Add;

/// One contribution to the field at a point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FieldSample {
    pub acceleration: Vec2,
    /// Strongest pointer falloff seen by this sample, used for the spin nudge.
    pub falloff: f32,
}

impl FieldSample {
    pub const ZERO: Self = Self { acceleration: Vec2::ZERO, falloff: 0.0 };
}

impl Add for FieldSample {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            acceleration: self.acceleration + rhs.acceleration,
            falloff: self.falloff.max(rhs.falloff),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ForceField {
    params: FieldParams,
}

impl ForceField {
    pub fn new(params: FieldParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &FieldParams {
        &self.params
    }

    /// Gravity plus an oscillating horizontal wind. Independent of position.
    pub fn ambient(&self, time: f64) -> FieldSample {
        let p = &self.params;
        let oscillation = (TAU * p.wind_osc_freq as f64 * time).sin() as f32;
        let wind = p.wind_base + p.wind_osc_amp * oscillation;
        FieldSample {
            acceleration: Vec2::new(wind * p.wind_to_accel, p.gravity),
            falloff: 0.0,
        }
    }

    /// Radial push and tangential swirl around the pointer.
    ///
    /// Faster pointer motion gives a stronger impulse, up to the speed cap.
    pub fn disturbance(&self, position: Vec2, source: &DisturbanceSource) -> FieldSample {
        let influence = source.influence_at(position);
        if influence.is_none() {
            return FieldSample::ZERO;
        }

        let p = &self.params;
        let boost = 1.0 + source.speed().min(p.speed_cap) / p.speed_normalizer;
        let impulse = p.impulse_strength * influence.falloff * boost;
        let push = influence.direction * impulse;
        let swirl = influence.direction.perp() * (impulse * p.swirl * p.swirl_scale);

        FieldSample {
            acceleration: push + swirl,
            falloff: influence.falloff,
        }
    }

    /// Total field at `position` and simulated `time`.
    pub fn acceleration_at(&self, position: Vec2, time: f64, source: &DisturbanceSource) -> FieldSample {
        self.ambient(time) + self.disturbance(position, source)
    }

    /// Random spin change for a leaf under the given falloff; `u` is uniform in [0, 1).
    pub fn spin_nudge(&self, falloff: f32, u: f32) -> f32 {
        (u - 0.5) * self.params.spin_kick * falloff
    }
}
