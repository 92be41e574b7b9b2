//! Serializable snapshots of a rendered frame.

use leaffall_core::Viewport;
use leaffall_simulation::{draw_angle, draw_scale, outline, Frame, Particle, PointerSnapshot};
use serde::{Deserialize, Serialize};

/// Full per-frame state, outlines included. Sent as JSON.
#[derive(Serialize, Debug)]
pub struct FrameState<'a> {
    pub frame: u64,
    pub time: f64,
    pub viewport: Viewport,
    pub pointer: PointerSnapshot,
    pub leaves: Vec<LeafState<'a>>,
}

#[derive(Serialize, Debug)]
pub struct LeafState<'a> {
    pub x: f32,
    pub y: f32,
    /// Drawn orientation, wobble included.
    pub angle: f32,
    pub scale: [f32; 2],
    pub color: &'a str,
    pub generation: u32,
    /// Polygon in viewport pixels.
    pub outline: Vec<[f32; 2]>,
}

impl<'a> FrameState<'a> {
    pub fn capture(frame: &Frame<'a>) -> Self {
        let population = frame.population;
        let palette = &population.config().palette;
        let leaves = population
            .particles()
            .iter()
            .map(|p| LeafState::capture(p, palette))
            .collect();
        Self {
            frame: frame.number,
            time: frame.time,
            viewport: population.viewport(),
            pointer: frame.pointer,
            leaves,
        }
    }
}

impl<'a> LeafState<'a> {
    fn capture(particle: &Particle, palette: &'a [String]) -> Self {
        let scale = draw_scale(particle);
        Self {
            x: particle.position.x,
            y: particle.position.y,
            angle: draw_angle(particle),
            scale: [scale.x, scale.y],
            color: palette.get(particle.color_index()).map_or("", String::as_str),
            generation: particle.generation(),
            outline: outline(particle).iter().map(|p| [p.x, p.y]).collect(),
        }
    }
}

/// Fixed-size leaf record for the binary format. Clients rebuild shapes themselves.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct CompactLeaf {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub size: f32,
    /// Index into the configured palette.
    pub color: u8,
    pub generation: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CompactFrame {
    pub frame: u64,
    pub time: f64,
    pub width: f32,
    pub height: f32,
    pub pointer: [f32; 2],
    pub pointer_active: bool,
    pub leaves: Vec<CompactLeaf>,
}

impl CompactFrame {
    pub fn capture(frame: &Frame<'_>) -> Self {
        let viewport = frame.population.viewport();
        let leaves = frame
            .population
            .particles()
            .iter()
            .map(|p| CompactLeaf {
                x: p.position.x,
                y: p.position.y,
                angle: draw_angle(p),
                size: p.size(),
                color: p.color_index().min(u8::MAX as usize) as u8,
                generation: p.generation(),
            })
            .collect();
        Self {
            frame: frame.number,
            time: frame.time,
            width: viewport.width,
            height: viewport.height,
            pointer: [frame.pointer.x, frame.pointer.y],
            pointer_active: frame.pointer.active,
            leaves,
        }
    }
}
