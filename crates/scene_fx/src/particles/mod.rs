//! Particle effects
//!
//! A small frame-stepped particle engine:
//! - [`emitter`] spawns particles on a randomized schedule
//! - [`effector`] animates particle color and scale from keyframes
//! - [`system`] owns the particle pool, emitters and effectors
//! - [`explosion`] composes the above into a reusable explosion effect
//!
//! Emitters and effectors are linked through [`EffectorMask`] bits: an
//! effector only touches particles whose mask shares a bit with its own.

pub mod effector;
pub mod emitter;
pub mod explosion;
pub mod particle;
pub mod system;

use thiserror::Error;

pub use effector::{
    ColorKeyframesEffector, Effector, Keyframes, Lerp, MasterScaleKeyframesEffector,
};
pub use emitter::{
    BoxGenerator, Emitter, EmitterCore, FieldEmitter, FieldGenerator, RadialEmitter, RadialSpread,
    SphereGenerator,
};
pub use explosion::{
    ExplosionComponents, ExplosionConfig, ExplosionEffects, ExplosionSprites, ExplosionSystem,
    TextureLookup,
};
pub use particle::{EffectorMask, Particle, ParticleInstance, SpriteRect};
pub use system::{EmitterKey, ParticleSystem};

/// Emitter and effector validation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParticleError {
    /// A min/max pair is inverted or not finite
    #[error("invalid {name} range: min {min} > max {max}")]
    InvalidRange {
        /// Which setting is broken
        name: &'static str,
        /// Lower bound
        min: f32,
        /// Upper bound
        max: f32,
    },

    /// Emitters need at least one sprite rectangle to pick from
    #[error("emitter has no sprite rectangles")]
    EmptySpriteList,

    /// Lifetimes must be positive and finite
    #[error("invalid particle lifetime: {0}")]
    InvalidLifetime(f32),
}

/// Check a scalar min/max pair
pub(crate) fn check_range(name: &'static str, min: f32, max: f32) -> Result<(), ParticleError> {
    if min.is_finite() && max.is_finite() && min <= max {
        Ok(())
    } else {
        Err(ParticleError::InvalidRange { name, min, max })
    }
}

/// Check a lifetime value
pub(crate) fn check_lifetime(life: f32) -> Result<(), ParticleError> {
    if life.is_finite() && life > 0.0 {
        Ok(())
    } else {
        Err(ParticleError::InvalidLifetime(life))
    }
}
