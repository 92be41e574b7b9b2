use crate::particle::Particle;
use leaffall_config::{PopulationParams, SimulationConfig, SpawnParams};
use leaffall_core::Viewport;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Number of leaves for a viewport: proportional to its area, kept within
/// `min_count..=max_count`.
pub fn target_count(params: &PopulationParams, viewport: Viewport) -> usize {
    let scaled = (params.base_count as f32 * viewport.area() / params.reference_area()).round();
    let count = (scaled.max(0.0) as usize).max(params.min_count as usize);
    let ceiling = (params.max_count as usize).max(params.min_count as usize);
    if count > ceiling {
        warn!(
            "{}x{} wants {} leaves, capping at {}",
            viewport.width, viewport.height, count, ceiling
        );
        return ceiling;
    }
    count
}

/// What [`recycle`] did to a particle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recycle {
    Kept,
    /// Fell out of the bottom and re-entered from the top.
    Respawned,
    /// Crossed a side edge, or was pushed back down at the top.
    Wrapped,
}

/// Bring a particle that left the padded viewport back into it.
///
/// Leaves below the bottom get a new life at the top; side exits wrap around
/// and only move the position. A leaf blown above the top is held at the edge.
pub fn recycle<R: Rng + ?Sized>(
    particle: &mut Particle,
    viewport: Viewport,
    margin: f32,
    spawn: &SpawnParams,
    rng: &mut R,
) -> Recycle {
    let mut outcome = Recycle::Kept;

    if particle.position.y > viewport.height + margin {
        particle.position.y = -margin;
        particle.position.x = rng.gen_range(-margin..=viewport.width + margin);
        particle.randomize_motion(rng, spawn);
        particle.mark_respawned();
        return Recycle::Respawned;
    }

    if particle.position.y < -margin {
        particle.position.y = -margin;
        particle.velocity.y = particle.velocity.y.max(0.0);
        outcome = Recycle::Wrapped;
    }

    if particle.position.x < -margin {
        particle.position.x = viewport.width + margin;
        outcome = Recycle::Wrapped;
    } else if particle.position.x > viewport.width + margin {
        particle.position.x = -margin;
        outcome = Recycle::Wrapped;
    }

    outcome
}

/// Counters from one [`Population::update`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecycleStats {
    pub respawned: usize,
    pub wrapped: usize,
}

/// Owns the leaves and keeps their number in line with the viewport.
#[derive(Debug)]
pub struct Population {
    particles: Vec<Particle>,
    viewport: Viewport,
    config: SimulationConfig,
    rng: StdRng,
}

impl Population {
    pub fn new(config: SimulationConfig, viewport: Viewport) -> Self {
        Self::with_rng(config, viewport, StdRng::from_entropy())
    }

    /// Same as [`new`](Self::new) with an explicit random source, for reproducible runs.
    pub fn with_rng(config: SimulationConfig, viewport: Viewport, rng: StdRng) -> Self {
        let mut population = Self {
            particles: Vec::new(),
            viewport,
            config,
            rng,
        };
        population.reseed(viewport.width, viewport.height);
        population
    }

    /// Drop every leaf and spawn a fresh set for the given size.
    pub fn reseed(&mut self, width: f32, height: f32) {
        let viewport = Viewport::new(width, height);
        if !viewport.is_valid() {
            warn!("Ignoring reseed to invalid viewport {}x{}", width, height);
            return;
        }
        self.viewport = viewport;
        self.particles.clear();
        self.fill(false);
        info!(
            "Seeded {} leaves for {}x{}",
            self.particles.len(),
            viewport.width,
            viewport.height
        );
    }

    /// Match the new viewport size, keeping every surviving leaf as it is.
    ///
    /// Growing appends freshly spawned leaves at the top edge; shrinking drops
    /// from the end.
    pub fn resize(&mut self, width: f32, height: f32) {
        let viewport = Viewport::new(width, height);
        if !viewport.is_valid() {
            warn!("Ignoring resize to invalid viewport {}x{}", width, height);
            return;
        }
        let before = self.particles.len();
        self.viewport = viewport;
        self.particles.truncate(self.target_count());
        self.fill(true);
        info!(
            "Resized to {}x{}: {} -> {} leaves",
            width,
            height,
            before,
            self.particles.len()
        );
    }

    fn fill(&mut self, from_top: bool) {
        let target = self.target_count();
        let margin = self.margin();
        self.particles.reserve(target.saturating_sub(self.particles.len()));
        while self.particles.len() < target {
            let mut particle = Particle::spawn(&mut self.rng, self.viewport, &self.config);
            if from_top {
                particle.position.y = -margin;
            }
            self.particles.push(particle);
        }
    }

    /// Run `step` on every leaf, then recycle it.
    ///
    /// The closure gets the population's random source so that per-leaf
    /// randomness stays reproducible under a seed.
    pub fn update<F>(&mut self, mut step: F) -> RecycleStats
    where
        F: FnMut(&mut Particle, &mut StdRng),
    {
        let mut stats = RecycleStats::default();
        let margin = self.margin();
        for particle in &mut self.particles {
            step(particle, &mut self.rng);
            match recycle(particle, self.viewport, margin, &self.config.spawn, &mut self.rng) {
                Recycle::Kept => {}
                Recycle::Respawned => stats.respawned += 1,
                Recycle::Wrapped => stats.wrapped += 1,
            }
        }
        stats
    }

    pub fn target_count(&self) -> usize {
        target_count(&self.config.population, self.viewport)
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn margin(&self) -> f32 {
        self.config.field.respawn_margin
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }
}
