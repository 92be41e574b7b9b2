use crate::disturbance::DisturbanceSource;
use crate::force::ForceField;
use crate::population::{Population, RecycleStats};
use crate::render::{Frame, Renderer};
use leaffall_config::SimulationConfig;
use leaffall_core::{FrameClock, FrameScheduler, InputEvent, InputReceiver, Viewport};
use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Frames between periodic debug summaries.
const SUMMARY_INTERVAL: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Stopped,
    Running,
}

/// Owns the simulation and advances it one tick per host frame.
///
/// Each tick drains queued input, moves every leaf through the force field,
/// recycles the ones that left the scene, draws once and finally lets the
/// pointer decay.
pub struct LoopDriver<R: Renderer> {
    field: ForceField,
    population: Population,
    pointer: DisturbanceSource,
    clock: FrameClock,
    renderer: R,
    input: Option<InputReceiver>,
    state: DriverState,
    frames: u64,
}

impl<R: Renderer> LoopDriver<R> {
    pub fn new(config: SimulationConfig, viewport: Viewport, renderer: R) -> Self {
        Self::build(config, viewport, renderer, StdRng::from_entropy())
    }

    /// Deterministic leaves and per-tick randomness for a given seed.
    pub fn with_seed(config: SimulationConfig, viewport: Viewport, renderer: R, seed: u64) -> Self {
        Self::build(config, viewport, renderer, StdRng::seed_from_u64(seed))
    }

    fn build(config: SimulationConfig, viewport: Viewport, renderer: R, rng: StdRng) -> Self {
        let field = ForceField::new(config.field.clone());
        let pointer = DisturbanceSource::new(config.field.impulse_radius, config.pointer.clone());
        let clock = FrameClock::new(config.clock.max_dt, config.clock.fallback_dt);
        let population = Population::with_rng(config, viewport, rng);
        Self {
            field,
            population,
            pointer,
            clock,
            renderer,
            input: None,
            state: DriverState::Stopped,
            frames: 0,
        }
    }

    /// Read motion and resize events from this queue at the start of each tick.
    pub fn with_input(mut self, input: InputReceiver) -> Self {
        self.input = Some(input);
        self
    }

    pub fn start(&mut self) {
        if self.state == DriverState::Running {
            return;
        }
        self.state = DriverState::Running;
        let viewport = self.population.viewport();
        info!(
            "Loop started with {} leaves at {}x{}",
            self.population.len(),
            viewport.width,
            viewport.height
        );
    }

    pub fn on_motion(&mut self, x: f32, y: f32, timestamp: f64) {
        if self.pointer.on_motion(x, y, timestamp) {
            trace!("Pointer at ({:.1}, {:.1}) speed {:.1}", x, y, self.pointer.speed());
        }
    }

    pub fn on_leave(&mut self) {
        debug!("Pointer left the viewport");
        self.pointer.on_leave();
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.population.resize(width, height);
    }

    /// Apply every queued input event. Returns how many were applied.
    pub fn pump_input(&mut self) -> usize {
        let Some(input) = self.input.take() else {
            return 0;
        };
        let mut applied = 0;
        for event in input.drain() {
            match event {
                InputEvent::PointerMove { x, y, timestamp } => self.on_motion(x, y, timestamp),
                InputEvent::PointerLeave => self.on_leave(),
                InputEvent::Resize { width, height } => self.resize(width, height),
            }
            applied += 1;
        }
        self.input = Some(input);
        applied
    }

    /// Advance by an explicit raw delta in seconds. Returns `false` when stopped.
    pub fn tick(&mut self, raw_dt: f32) -> bool {
        if self.state != DriverState::Running {
            return false;
        }
        let (now, dt) = self.clock.advance_by(raw_dt);
        self.step(now, dt);
        true
    }

    /// Advance to the host timestamp `now`. Returns `false` when stopped.
    pub fn frame(&mut self, now: f64) -> bool {
        if self.state != DriverState::Running {
            return false;
        }
        let dt = self.clock.advance_to(now);
        self.step(now, dt);
        true
    }

    /// Start and tick once per scheduled frame until the scheduler declines.
    pub fn run<S: FrameScheduler>(&mut self, mut scheduler: S) -> u64 {
        self.start();
        let mut ticks = 0;
        while let Some(now) = scheduler.next_frame() {
            self.frame(now);
            ticks += 1;
        }
        info!("Loop finished after {} frames ({:.1}s simulated)", ticks, self.clock.elapsed());
        ticks
    }

    fn step(&mut self, now: f64, dt: f32) {
        self.pump_input();

        let time = self.clock.elapsed();
        let field = &self.field;
        let pointer = &self.pointer;
        let stats = self.population.update(|particle, rng| {
            let sample = field.acceleration_at(particle.position, time, pointer);
            if sample.falloff > 0.0 {
                particle.spin += field.spin_nudge(sample.falloff, rng.gen::<f32>());
            }
            particle.integrate(dt, sample.acceleration, field.params());
        });

        self.frames += 1;
        let frame = Frame {
            population: &self.population,
            pointer: self.pointer.snapshot(),
            time,
            number: self.frames,
        };
        self.renderer.draw_frame(&frame);

        self.pointer.decay(now);
        self.log_frame(dt, time, stats);
    }

    fn log_frame(&self, dt: f32, time: f64, stats: RecycleStats) {
        trace!(
            "Frame {} dt={:.4} respawned={} wrapped={}",
            self.frames,
            dt,
            stats.respawned,
            stats.wrapped
        );
        if self.frames % SUMMARY_INTERVAL == 0 {
            debug!(
                "Frame {}: t={:.2}s leaves={} pointer_active={}",
                self.frames,
                time,
                self.population.len(),
                self.pointer.is_active()
            );
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn pointer(&self) -> &DisturbanceSource {
        &self.pointer
    }

    pub fn field(&self) -> &ForceField {
        &self.field
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }
}
