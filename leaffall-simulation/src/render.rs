//! The renderer contract and the geometry every renderer shares.

use crate::disturbance::PointerSnapshot;
use crate::particle::Particle;
use crate::population::Population;
use crate::shape::Outline;
use glam::Vec2;

/// How far the wobble tilts a leaf, in radians at full swing.
pub const WOBBLE_TILT: f32 = 0.15;
/// Leaf size to outline scale.
pub const DRAW_SCALE: f32 = 0.6;
/// Leaves are drawn a little narrower vertically.
pub const ASPECT: f32 = 0.9;

/// Everything a renderer gets for one tick.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub population: &'a Population,
    pub pointer: PointerSnapshot,
    /// Simulated seconds since start.
    pub time: f64,
    /// Ticks since start, starting at 1.
    pub number: u64,
}

/// Receives the population once per tick, after all leaves have moved.
pub trait Renderer {
    fn draw_frame(&mut self, frame: &Frame<'_>);
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn draw_frame(&mut self, frame: &Frame<'_>) {
        (**self).draw_frame(frame)
    }
}

impl<R: Renderer + ?Sized> Renderer for &mut R {
    fn draw_frame(&mut self, frame: &Frame<'_>) {
        (**self).draw_frame(frame)
    }
}

/// Discards every frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn draw_frame(&mut self, _frame: &Frame<'_>) {}
}

/// Orientation a leaf is drawn at: its angle plus a small wobble tilt.
pub fn draw_angle(particle: &Particle) -> f32 {
    particle.angle + particle.wobble.sin() * WOBBLE_TILT
}

pub fn draw_scale(particle: &Particle) -> Vec2 {
    let s = particle.size() * DRAW_SCALE;
    Vec2::new(s, s * ASPECT)
}

/// The leaf's polygon in viewport pixels: scaled, rotated, then moved to its position.
pub fn outline(particle: &Particle) -> Outline {
    let scale = draw_scale(particle);
    let rotation = Vec2::from_angle(draw_angle(particle));
    particle
        .shape()
        .points()
        .iter()
        .map(|&p| particle.position + rotation.rotate(p * scale))
        .collect()
}
