use crate::shape::LeafShape;
use glam::Vec2;
use leaffall_config::{FieldParams, SimulationConfig, SpawnParams};
use leaffall_core::Viewport;
use rand::Rng;
use std::f32::consts::TAU;

/// One falling leaf.
///
/// Kinematic state is public; size, shape and colour are fixed at spawn and
/// only readable.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Viewport pixels.
    pub position: Vec2,
    /// px/s.
    pub velocity: Vec2,
    /// Orientation in radians.
    pub angle: f32,
    /// Angular velocity in rad/s.
    pub spin: f32,
    /// Phase of the cosmetic wobble.
    pub wobble: f32,
    wobble_rate: f32,
    size: f32,
    color_index: usize,
    shape: LeafShape,
    generation: u32,
}

impl Particle {
    pub fn new(position: Vec2, velocity: Vec2, size: f32, shape: LeafShape, color_index: usize) -> Self {
        Self {
            position,
            velocity,
            angle: 0.0,
            spin: 0.0,
            wobble: 0.0,
            wobble_rate: 1.0,
            size,
            color_index,
            shape,
            generation: 0,
        }
    }

    /// A new leaf somewhere around or above the visible area, ready to fall into view.
    pub fn spawn<R: Rng + ?Sized>(rng: &mut R, viewport: Viewport, config: &SimulationConfig) -> Self {
        let margin = config.field.respawn_margin;
        let spawn = &config.spawn;
        let population = &config.population;

        let size = rng.gen_range(population.size_min..=population.size_max);
        let position = Vec2::new(
            rng.gen_range(-margin..=viewport.width + margin),
            rng.gen_range(-margin..=viewport.height),
        );
        let mut particle = Self::new(
            position,
            Vec2::ZERO,
            size,
            LeafShape::generate(rng),
            rng.gen_range(0..config.palette.len().max(1)),
        );
        particle.randomize_motion(rng, spawn);
        particle.angle = rng.gen_range(0.0..TAU);
        particle.wobble = rng.gen_range(0.0..TAU);
        particle.wobble_rate = rng.gen_range(spawn.wobble_rate_min..=spawn.wobble_rate_max);
        particle
    }

    /// Fresh fall velocity and spin, as for a leaf just entering the scene.
    pub(crate) fn randomize_motion<R: Rng + ?Sized>(&mut self, rng: &mut R, spawn: &SpawnParams) {
        self.velocity = Vec2::new(
            rng.gen_range(-spawn.drift_speed..=spawn.drift_speed),
            rng.gen_range(spawn.fall_speed_min..=spawn.fall_speed_max),
        );
        self.spin = rng.gen_range(-spawn.spin..=spawn.spin);
    }

    pub(crate) fn mark_respawned(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Semi-implicit Euler step: velocity first, then position.
    ///
    /// `dt` must already be clamped by the caller.
    pub fn integrate(&mut self, dt: f32, acceleration: Vec2, field: &FieldParams) {
        self.velocity += acceleration * dt;
        self.velocity *= 1.0 - field.drag_lin * dt;

        let speed = self.velocity.length();
        if speed > field.max_speed {
            self.velocity *= field.max_speed / speed;
        }

        self.position += self.velocity * dt;

        self.spin *= 1.0 - field.ang_drag * dt;
        self.angle += self.spin * dt;
        self.wobble += self.wobble_rate * dt;
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn shape(&self) -> &LeafShape {
        &self.shape
    }

    pub fn color_index(&self) -> usize {
        self.color_index
    }

    pub fn wobble_rate(&self) -> f32 {
        self.wobble_rate
    }

    /// How many times this leaf has re-entered from the top.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn leaf(velocity: Vec2) -> Particle {
        let shape = LeafShape::generate(&mut StdRng::seed_from_u64(1));
        Particle::new(Vec2::new(100.0, 100.0), velocity, 10.0, shape, 0)
    }

    #[test]
    fn velocity_is_updated_before_position() {
        let field = FieldParams { drag_lin: 0.0, ..FieldParams::default() };
        let mut p = leaf(Vec2::ZERO);
        p.integrate(0.5, Vec2::new(0.0, 10.0), &field);
        assert_eq!(p.velocity, Vec2::new(0.0, 5.0));
        // semi-implicit: the new velocity moves the leaf in the same step
        assert_eq!(p.position, Vec2::new(100.0, 102.5));
    }

    #[test]
    fn drag_applies_per_axis() {
        let field = FieldParams { drag_lin: 0.5, ..FieldParams::default() };
        let mut p = leaf(Vec2::new(10.0, -20.0));
        p.integrate(0.1, Vec2::ZERO, &field);
        assert!((p.velocity.x - 9.5).abs() < 1e-5);
        assert!((p.velocity.y + 19.0).abs() < 1e-5);
    }

    #[test]
    fn speed_is_clamped() {
        let field = FieldParams::default();
        let mut p = leaf(Vec2::new(300.0, 300.0));
        p.integrate(0.033, Vec2::new(5000.0, -8000.0), &field);
        assert!(p.speed() <= field.max_speed + 1e-3);

        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..500 {
            let accel = Vec2::new(rng.gen_range(-1e5..1e5), rng.gen_range(-1e5..1e5));
            p.integrate(rng.gen_range(0.001..0.033), accel, &field);
            assert!(p.speed() <= field.max_speed + 1e-3);
        }
    }

    #[test]
    fn clamp_preserves_direction() {
        let field = FieldParams::default();
        let mut p = leaf(Vec2::ZERO);
        p.integrate(1.0, Vec2::new(3000.0, 4000.0), &field);
        let dir = p.velocity.normalize();
        assert!((dir.x - 0.6).abs() < 1e-4);
        assert!((dir.y - 0.8).abs() < 1e-4);
    }

    #[test]
    fn spin_and_wobble_advance() {
        let field = FieldParams { ang_drag: 0.0, ..FieldParams::default() };
        let mut p = leaf(Vec2::ZERO);
        p.spin = 2.0;
        p.integrate(0.25, Vec2::ZERO, &field);
        assert!((p.angle - 0.5).abs() < 1e-6);
        assert!((p.wobble - 0.25).abs() < 1e-6);

        let damped = FieldParams { ang_drag: 0.5, ..FieldParams::default() };
        p.integrate(0.1, Vec2::ZERO, &damped);
        assert!((p.spin - 1.9).abs() < 1e-5);
    }

    #[test]
    fn zero_step_keeps_position() {
        let field = FieldParams::default();
        let mut p = leaf(Vec2::new(12.0, 34.0));
        let before = p.clone();
        p.integrate(0.0, Vec2::new(100.0, 100.0), &field);
        assert_eq!(p, before);
    }

    #[test]
    fn spawn_respects_ranges() {
        let config = SimulationConfig::default();
        let viewport = Viewport::new(1280.0, 720.0);
        let margin = config.field.respawn_margin;
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..500 {
            let p = Particle::spawn(&mut rng, viewport, &config);
            assert!(p.size() >= 8.0 && p.size() <= 18.0);
            assert!(p.position.x >= -margin && p.position.x <= viewport.width + margin);
            assert!(p.position.y >= -margin && p.position.y <= viewport.height);
            assert!(p.velocity.x.abs() <= 10.0);
            assert!(p.velocity.y >= 10.0 && p.velocity.y <= 40.0);
            assert!(p.spin.abs() <= 1.2);
            assert!(p.color_index() < config.palette.len());
            assert_eq!(p.generation(), 0);
        }
    }
}
