//! Pointer tracking and the spatial influence it exerts on leaves.

use glam::Vec2;
use leaffall_config::PointerParams;
use log::{debug, warn};
use serde::Serialize;

/// Parking spot for the pointer while it is outside the viewport.
pub const SENTINEL: Vec2 = Vec2::new(-9999.0, -9999.0);

/// Push direction for a leaf sitting exactly on the pointer.
pub const FALLBACK_DIRECTION: Vec2 = Vec2::NEG_Y;

/// Strength and push direction of the disturbance at one point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Influence {
    /// 1 at the pointer, falling linearly to 0 at the influence radius.
    pub falloff: f32,
    /// Unit vector from the pointer towards the sampled point.
    pub direction: Vec2,
}

impl Influence {
    pub const NONE: Self = Self { falloff: 0.0, direction: Vec2::ZERO };

    pub fn is_none(&self) -> bool {
        self.falloff <= 0.0
    }
}

/// Read-only copy of the pointer state for renderers and logs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointerSnapshot {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub speed: f32,
    pub active: bool,
}

/// The pointer as a source of disturbance.
///
/// State only changes through [`on_motion`](Self::on_motion),
/// [`on_leave`](Self::on_leave) and [`decay`](Self::decay), which keeps the
/// active flag consistent with the sample history.
#[derive(Debug, Clone)]
pub struct DisturbanceSource {
    position: Vec2,
    velocity: Vec2,
    speed: f32,
    last_update: f64,
    active: bool,
    // false until the first sample after creation or a leave
    tracking: bool,
    radius: f32,
    params: PointerParams,
}

impl DisturbanceSource {
    pub fn new(radius: f32, params: PointerParams) -> Self {
        Self {
            position: SENTINEL,
            velocity: Vec2::ZERO,
            speed: 0.0,
            last_update: 0.0,
            active: false,
            tracking: false,
            radius,
            params,
        }
    }

    /// Record a motion sample. Returns `false` if the sample was rejected.
    ///
    /// Velocity is the displacement since the previous sample over the elapsed
    /// time, with the elapsed time floored at `min_interval`. The first sample
    /// after a leave has no previous position and yields zero velocity.
    pub fn on_motion(&mut self, x: f32, y: f32, timestamp: f64) -> bool {
        if !(x.is_finite() && y.is_finite() && timestamp.is_finite()) {
            warn!("Dropping non-finite pointer sample ({}, {}) at {}", x, y, timestamp);
            return false;
        }

        let position = Vec2::new(x, y);
        let elapsed = (timestamp - self.last_update).max(self.params.min_interval) as f32;
        self.velocity = if self.tracking {
            (position - self.position) / elapsed
        } else {
            Vec2::ZERO
        };
        if !self.velocity.is_finite() {
            warn!("Pointer jump to ({}, {}) overflows velocity, treating it as a fresh entry", x, y);
            self.velocity = Vec2::ZERO;
        }
        self.speed = self.velocity.length();
        self.position = position;
        self.last_update = timestamp;
        self.tracking = true;
        if !self.active {
            debug!("Pointer active at ({:.1}, {:.1})", x, y);
        }
        self.active = true;
        true
    }

    /// The pointer left the viewport.
    pub fn on_leave(&mut self) {
        self.position = SENTINEL;
        self.velocity = Vec2::ZERO;
        self.speed = 0.0;
        self.tracking = false;
    }

    /// Falloff and outward direction at `point`; zero when inactive or out of range.
    pub fn influence_at(&self, point: Vec2) -> Influence {
        if !self.active {
            return Influence::NONE;
        }
        let offset = point - self.position;
        let distance = offset.length();
        if !(distance < self.radius) {
            return Influence::NONE;
        }
        let direction = if distance > 0.0 {
            offset / distance
        } else {
            FALLBACK_DIRECTION
        };
        Influence {
            falloff: 1.0 - distance / self.radius,
            direction,
        }
    }

    /// Called once per tick with the host time. Bleeds off speed once the
    /// pointer has been idle past the timeout and deactivates it when slow.
    pub fn decay(&mut self, now: f64) {
        if !self.active || now - self.last_update <= self.params.idle_timeout {
            return;
        }
        self.speed *= self.params.decay;
        self.velocity *= self.params.decay;
        if self.speed < self.params.sleep_speed {
            self.active = false;
            debug!("Pointer idle, disturbance off");
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn last_update(&self) -> f64 {
        self.last_update
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn snapshot(&self) -> PointerSnapshot {
        PointerSnapshot {
            x: self.position.x,
            y: self.position.y,
            vx: self.velocity.x,
            vy: self.velocity.y,
            speed: self.speed,
            active: self.active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> DisturbanceSource {
        DisturbanceSource::new(110.0, PointerParams::default())
    }

    #[test]
    fn starts_without_influence() {
        let source = source();
        assert!(!source.is_active());
        assert_eq!(source.position(), SENTINEL);
        assert!(source.influence_at(Vec2::new(0.0, 0.0)).is_none());
        assert!(source.influence_at(SENTINEL).is_none());
    }

    #[test]
    fn velocity_from_consecutive_samples() {
        let mut source = source();
        assert!(source.on_motion(100.0, 100.0, 1.0));
        assert_eq!(source.speed(), 0.0);
        assert!(source.is_active());

        source.on_motion(110.0, 100.0, 1.01);
        assert!((source.velocity().x - 1000.0).abs() < 0.5);
        assert!((source.speed() - 1000.0).abs() < 0.5);
        assert_eq!(source.last_update(), 1.01);
    }

    #[test]
    fn elapsed_time_is_floored() {
        let mut source = source();
        source.on_motion(0.0, 0.0, 2.0);
        source.on_motion(1.0, 0.0, 2.0);
        // 1 px over the 1 ms floor
        assert!((source.speed() - 1000.0).abs() < 1e-2);
        assert!(source.speed().is_finite());
    }

    #[test]
    fn non_finite_samples_are_ignored() {
        let mut source = source();
        source.on_motion(10.0, 10.0, 0.5);
        assert!(!source.on_motion(f32::NAN, 10.0, 0.6));
        assert!(!source.on_motion(10.0, f32::INFINITY, 0.6));
        assert!(!source.on_motion(10.0, 10.0, f64::NAN));
        assert_eq!(source.position(), Vec2::new(10.0, 10.0));
        assert_eq!(source.last_update(), 0.5);
    }

    #[test]
    fn overflowing_jump_still_decays() {
        let mut source = source();
        source.on_motion(3e38, 0.0, 1.0);
        source.on_motion(100.0, 100.0, 1.01);
        assert!(source.speed().is_finite());
        assert!(source.velocity().is_finite());
        assert_eq!(source.position(), Vec2::new(100.0, 100.0));

        source.decay(1.5);
        assert!(!source.is_active());
    }

    #[test]
    fn falloff_decreases_with_distance() {
        let mut source = source();
        source.on_motion(500.0, 300.0, 0.0);

        let mut previous = f32::INFINITY;
        for step in 0..110 {
            let influence = source.influence_at(Vec2::new(500.0 + step as f32, 300.0));
            assert!(influence.falloff < previous, "not decreasing at {}", step);
            assert!(influence.falloff > 0.0);
            previous = influence.falloff;
        }
        assert_eq!(source.influence_at(Vec2::new(610.0, 300.0)).falloff, 0.0);
        assert_eq!(source.influence_at(Vec2::new(500.0, 900.0)).falloff, 0.0);
    }

    #[test]
    fn direction_points_away_from_pointer() {
        let mut source = source();
        source.on_motion(0.0, 0.0, 0.0);

        let influence = source.influence_at(Vec2::new(30.0, 40.0));
        assert!((influence.falloff - (1.0 - 50.0 / 110.0)).abs() < 1e-6);
        assert!((influence.direction - Vec2::new(0.6, 0.8)).length() < 1e-6);
    }

    #[test]
    fn coincident_point_uses_fallback_direction() {
        let mut source = source();
        source.on_motion(20.0, 20.0, 0.0);
        let influence = source.influence_at(Vec2::new(20.0, 20.0));
        assert_eq!(influence.falloff, 1.0);
        assert_eq!(influence.direction, FALLBACK_DIRECTION);
    }

    #[test]
    fn leave_parks_the_pointer() {
        let mut source = source();
        source.on_motion(20.0, 20.0, 0.0);
        source.on_motion(40.0, 20.0, 0.02);
        source.on_leave();

        assert_eq!(source.position(), SENTINEL);
        assert_eq!(source.speed(), 0.0);
        assert!(source.influence_at(Vec2::new(40.0, 20.0)).is_none());

        // re-entering does not derive a velocity from the parking spot
        source.on_motion(60.0, 20.0, 0.04);
        assert_eq!(source.speed(), 0.0);
    }

    #[test]
    fn decays_to_inactive_after_timeout() {
        let mut source = source();
        source.on_motion(0.0, 0.0, 0.0);
        source.on_motion(10.0, 0.0, 0.01);
        assert!(source.speed() > 900.0);

        // within the timeout nothing changes
        source.decay(0.1);
        assert!(source.speed() > 900.0);

        let mut now = 0.2;
        let mut ticks = 0;
        while source.is_active() {
            source.decay(now);
            now += 0.016;
            ticks += 1;
            assert!(ticks < 200, "pointer never went idle");
        }
        assert!(source.speed() < 5.0);
        assert!(source.influence_at(Vec2::new(5.0, 0.0)).is_none());

        // new motion wakes it up
        source.on_motion(5.0, 0.0, now);
        assert!(source.is_active());
        assert!(!source.influence_at(Vec2::new(5.0, 0.0)).is_none());
    }
}
