//! Particle pool plus the emitters and effectors that drive it

use rand::rngs::StdRng;
use rand::SeedableRng;
use slotmap::{new_key_type, SlotMap};

use super::effector::Effector;
use super::emitter::Emitter;
use super::particle::{Particle, ParticleInstance};
use super::ParticleError;

new_key_type! {
    /// Handle to an emitter owned by a [`ParticleSystem`]
    pub struct EmitterKey;
}

/// Bounded particle pool
///
/// Each [`update`](Self::update) runs the same fixed pipeline:
/// 1. age every particle and drop the expired ones
/// 2. integrate position and orientation
/// 3. run emitters; spawns past `capacity` are dropped and counted
/// 4. run effectors over every live particle
#[derive(Debug)]
pub struct ParticleSystem {
    capacity: usize,
    particles: Vec<Particle>,
    emitters: SlotMap<EmitterKey, Emitter>,
    effectors: Vec<Effector>,
    rng: StdRng,
    spawn_buffer: Vec<Particle>,
    dropped_spawns: u64,
}

impl ParticleSystem {
    /// Create a pool holding at most `capacity` particles
    pub fn new(capacity: usize) -> Self {
        Self::with_rng(capacity, StdRng::from_entropy())
    }

    /// Create a pool with a deterministic random sequence
    pub fn with_seed(capacity: usize, seed: u64) -> Self {
        Self::with_rng(capacity, StdRng::seed_from_u64(seed))
    }

    fn with_rng(capacity: usize, rng: StdRng) -> Self {
        Self {
            capacity,
            particles: Vec::with_capacity(capacity),
            emitters: SlotMap::with_key(),
            effectors: Vec::new(),
            rng,
            spawn_buffer: Vec::new(),
            dropped_spawns: 0,
        }
    }

    /// Validate and register an emitter
    pub fn add_emitter(&mut self, emitter: impl Into<Emitter>) -> Result<EmitterKey, ParticleError> {
        let emitter = emitter.into();
        emitter.validate()?;
        Ok(self.emitters.insert(emitter))
    }

    /// Unregister an emitter; its live particles stay
    pub fn remove_emitter(&mut self, key: EmitterKey) -> Option<Emitter> {
        self.emitters.remove(key)
    }

    /// Emitter by key
    pub fn emitter(&self, key: EmitterKey) -> Option<&Emitter> {
        self.emitters.get(key)
    }

    /// Emitter by key
    pub fn emitter_mut(&mut self, key: EmitterKey) -> Option<&mut Emitter> {
        self.emitters.get_mut(key)
    }

    /// Number of registered emitters
    pub fn emitter_count(&self) -> usize {
        self.emitters.len()
    }

    /// Validate and register an effector; effectors run in insertion order
    pub fn add_effector(&mut self, effector: impl Into<Effector>) -> Result<(), ParticleError> {
        let effector = effector.into();
        effector.validate()?;
        self.effectors.push(effector);
        Ok(())
    }

    /// Registered effectors
    pub fn effectors(&self) -> &[Effector] {
        &self.effectors
    }

    /// Live particles
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Number of live particles
    pub fn active_count(&self) -> usize {
        self.particles.len()
    }

    /// Pool size
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Spawns dropped because the pool was full, since creation
    pub fn dropped_spawns(&self) -> u64 {
        self.dropped_spawns
    }

    /// Remove every live particle; emitters keep their schedules
    pub fn clear(&mut self) {
        self.particles.clear();
    }

    /// Advance the simulation by `delta_time` seconds
    pub fn update(&mut self, delta_time: f32) {
        for particle in &mut self.particles {
            particle.age_by(delta_time);
        }
        self.particles.retain(|particle| !particle.is_expired());

        for particle in &mut self.particles {
            particle.integrate(delta_time);
        }

        for emitter in self.emitters.values_mut() {
            emitter.emit(delta_time, &mut self.rng, &mut self.spawn_buffer);
        }
        self.accept_spawns();

        for particle in &mut self.particles {
            for effector in &self.effectors {
                effector.apply(particle);
            }
        }
    }

    fn accept_spawns(&mut self) {
        if self.spawn_buffer.is_empty() {
            return;
        }

        let room = self.capacity.saturating_sub(self.particles.len());
        let requested = self.spawn_buffer.len();
        let accepted = requested.min(room);
        self.particles.extend(self.spawn_buffer.drain(..accepted));

        let dropped = requested - accepted;
        if dropped > 0 {
            self.spawn_buffer.clear();
            self.dropped_spawns += dropped as u64;
            log::warn!(
                "Particle pool full ({} of {}), dropped {} spawns",
                self.particles.len(),
                self.capacity,
                dropped
            );
        } else {
            log::trace!("Spawned {} particles, {} live", accepted, self.particles.len());
        }
    }

    /// Render data for every live particle
    pub fn instances(&self) -> Vec<ParticleInstance> {
        self.particles.iter().map(Particle::to_instance).collect()
    }
}
