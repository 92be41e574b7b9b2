//! Falling-leaf particle simulation.
//!
//! Leaves drift under gravity and an oscillating wind and get pushed around
//! by the pointer. [`LoopDriver`] ties it together: it owns the
//! [`Population`], samples the [`ForceField`] for every leaf, integrates,
//! recycles leaves that left the scene and hands each finished tick to a
//! [`Renderer`].

pub mod disturbance;
pub mod driver;
pub mod force;
pub mod particle;
pub mod population;
pub mod render;
pub mod shape;

pub use disturbance::{DisturbanceSource, Influence, PointerSnapshot};
pub use driver::{DriverState, LoopDriver};
pub use force::{FieldSample, ForceField};
pub use particle::Particle;
pub use population::{recycle, target_count, Population, Recycle, RecycleStats};
pub use render::{draw_angle, draw_scale, outline, Frame, NullRenderer, Renderer};
pub use shape::{LeafShape, Outline};
