//! Host-facing building blocks shared by the leaffall crates.
//!
//! Nothing in here knows about leaves or forces. The simulation crate builds
//! its loop driver on top of these primitives:
//! - [`HostClock`] and [`FrameClock`] turn wall-clock frames into bounded steps.
//! - [`FrameScheduler`] decides when (and whether) the next frame runs.
//! - [`InputSender`]/[`InputReceiver`] carry pointer and resize events into the loop.

pub mod clock;
pub mod input;
pub mod scheduler;
pub mod viewport;

pub use clock::{FrameClock, HostClock};
pub use input::{input_channel, InputEvent, InputReceiver, InputSender};
pub use scheduler::{FrameScheduler, ManualScheduler, PacedScheduler};
pub use viewport::Viewport;
