//! Sprite-based explosion effect
//!
//! Follows the layered explosion recipe from the gamedev.net article
//! "Make a Particle Explosion Effect": separate flame/smoke, flash and
//! flying spark groups, each with its own emitter, effectors and mask bit.
//! The default sprite tables index into the `fig7.png` explosion sheet.
//!
//! Only the flying sparks fire by default; flame/smoke and flash are switched
//! on through [`ExplosionConfig::enabled`].

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::effector::{ColorKeyframesEffector, Keyframes, MasterScaleKeyframesEffector};
use super::emitter::{Emitter, FieldEmitter, RadialEmitter, RadialSpread, SphereGenerator};
use super::particle::{EffectorMask, ParticleInstance, SpriteRect};
use super::system::{EmitterKey, ParticleSystem};
use super::ParticleError;
use crate::config::Config;
use crate::foundation::math::{constants::PI, Vec3, Vec4};

bitflags! {
    /// Mask bits of the explosion's particle groups
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ExplosionComponents: u16 {
        /// Flame and smoke puffs
        const FLAME_SMOKE = 0x1;
        /// Initial flash
        const FLASH = 0x2;
        /// Streaking sparks
        const FLYING_SPARKS = 0x4;
        /// Smoke trails
        const SMOKE_TRAILS = 0x8;
        /// Round sparks
        const ROUND_SPARKS = 0x10;
        /// Debris chunks
        const DEBRIS = 0x20;
        /// Shockwave ring
        const SHOCKWAVE = 0x40;
    }
}

impl ExplosionComponents {
    /// Effector mask for this set of groups
    pub fn mask(self) -> EffectorMask {
        EffectorMask(self.bits())
    }
}

/// Texture category and names of the explosion sprite sheets
pub const TEXTURE_CATEGORY: &str = "explosions";
/// Default explosion sprite sheet
pub const DEFAULT_TEXTURE: &str = "fig7.png";
/// Sprite sheet with numbered cells for checking the sprite tables
pub const DEBUG_TEXTURE: &str = "fig7_debug.png";

/// Source of textures by category and name
pub trait TextureLookup {
    /// Texture handle type
    type Texture;

    /// Find a texture, `None` if it is not loaded
    fn lookup(&self, category: &str, name: &str) -> Option<Self::Texture>;
}

/// Which sub-effects `show_explosion` arms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplosionEffects {
    /// Flame and smoke puffs
    pub flame_smoke: bool,
    /// Initial flash
    pub flash: bool,
    /// Streaking sparks
    pub flying_sparks: bool,
}

impl Default for ExplosionEffects {
    fn default() -> Self {
        Self {
            flame_smoke: false,
            flash: false,
            flying_sparks: true,
        }
    }
}

/// Sprite sheet keys and per-group sprite rectangles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplosionSprites {
    /// Texture category for the sheets
    pub texture_category: String,
    /// Regular sprite sheet
    pub texture: String,
    /// Debug sprite sheet
    pub debug_texture: String,
    /// Flame and smoke cells
    pub flame_smoke: Vec<SpriteRect>,
    /// Flash cells
    pub flash: Vec<SpriteRect>,
    /// Smoke trail cells
    pub smoke_trails: Vec<SpriteRect>,
    /// Flying spark cells
    pub flying_sparks: Vec<SpriteRect>,
}

impl Default for ExplosionSprites {
    fn default() -> Self {
        Self {
            texture_category: TEXTURE_CATEGORY.to_string(),
            texture: DEFAULT_TEXTURE.to_string(),
            debug_texture: DEBUG_TEXTURE.to_string(),
            flame_smoke: vec![
                SpriteRect::new(0.0, 0.0, 0.25, 0.25),
                SpriteRect::new(0.0, 0.25, 0.25, 0.25),
                SpriteRect::new(0.25, 0.25, 0.25, 0.25),
                SpriteRect::new(0.25, 0.0, 0.25, 0.25),
            ],
            flash: vec![
                SpriteRect::new(0.5, 0.0, 0.25, 0.25),
                SpriteRect::new(0.75, 0.0, 0.25, 0.25),
                SpriteRect::new(0.5, 0.25, 0.25, 0.25),
                SpriteRect::new(0.75, 0.25, 0.25, 0.25),
            ],
            smoke_trails: vec![
                SpriteRect::new(0.0, 0.5, 0.5, 0.125),
                SpriteRect::new(0.0, 0.625, 0.5, 0.125),
                SpriteRect::new(0.0, 0.75, 0.5, 0.125),
            ],
            flying_sparks: vec![SpriteRect::new(0.75, 0.85, 0.25, 0.05)],
        }
    }
}

/// Explosion look and timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplosionConfig {
    /// Tint of the flame/smoke color animation
    pub flame_color: Vec4,
    /// Tint of the flash color animation
    pub flash_color: Vec4,
    /// Tint multiplied into the flying sparks' gray-to-white color range;
    /// white leaves the sparks untinted
    pub flying_sparks_color: Vec4,

    /// Multiplies every duration below; also divides spark speed
    pub duration_scale: f32,
    /// Flame/smoke lifetime before scaling
    pub flame_smoke_duration: f32,
    /// Flash lifetime before scaling
    pub flash_duration: f32,
    /// Flying spark lifetime before scaling
    pub flying_sparks_duration: f32,

    /// Sub-effects armed by `show_explosion`
    pub enabled: ExplosionEffects,

    /// Sprite sheet keys and cells
    pub sprites: ExplosionSprites,
}

impl Default for ExplosionConfig {
    fn default() -> Self {
        Self {
            flame_color: Vec4::new(1.0, 165.0 / 255.0, 0.0, 1.0),
            flash_color: Vec4::new(1.0, 1.0, 0.0, 1.0),
            flying_sparks_color: Vec4::new(1.0, 1.0, 1.0, 1.0),
            duration_scale: 3.0,
            flame_smoke_duration: 2.5,
            flash_duration: 0.75,
            flying_sparks_duration: 2.5,
            enabled: ExplosionEffects::default(),
            sprites: ExplosionSprites::default(),
        }
    }
}

impl Config for ExplosionConfig {}

impl ExplosionConfig {
    /// Scaled flame/smoke lifetime in seconds
    pub fn flame_smoke_life(&self) -> f32 {
        self.duration_scale * self.flame_smoke_duration
    }

    /// Scaled flash lifetime in seconds
    pub fn flash_life(&self) -> f32 {
        self.duration_scale * self.flash_duration
    }

    /// Scaled flying spark lifetime in seconds
    pub fn flying_sparks_life(&self) -> f32 {
        self.duration_scale * self.flying_sparks_duration
    }
}

/// Reusable explosion effect over one particle pool
///
/// Build once, then call [`show_explosion`](Self::show_explosion) for every
/// blast and [`update`](Self::update) once per frame.
#[derive(Debug)]
pub struct ExplosionSystem {
    config: ExplosionConfig,
    particles: ParticleSystem,
    flame_smoke: EmitterKey,
    flash: EmitterKey,
    flying_sparks: EmitterKey,
}

impl ExplosionSystem {
    /// Explosion system with room for `capacity` particles
    pub fn new(capacity: usize, config: ExplosionConfig) -> Result<Self, ParticleError> {
        Self::build(ParticleSystem::new(capacity), config)
    }

    /// Explosion system with a deterministic random sequence
    pub fn with_seed(capacity: usize, config: ExplosionConfig, seed: u64) -> Result<Self, ParticleError> {
        Self::build(ParticleSystem::with_seed(capacity, seed), config)
    }

    fn build(mut particles: ParticleSystem, config: ExplosionConfig) -> Result<Self, ParticleError> {
        let flame_smoke = Self::add_flame_smoke(&mut particles, &config)?;
        let flash = Self::add_flash(&mut particles, &config)?;
        let flying_sparks = Self::add_flying_sparks(&mut particles, &config)?;

        log::debug!(
            "Explosion system ready: capacity {}, {} emitters, {} effectors",
            particles.capacity(),
            particles.emitter_count(),
            particles.effectors().len()
        );

        Ok(Self {
            config,
            particles,
            flame_smoke,
            flash,
            flying_sparks,
        })
    }

    fn add_flame_smoke(
        particles: &mut ParticleSystem,
        config: &ExplosionConfig,
    ) -> Result<EmitterKey, ParticleError> {
        let duration = config.flame_smoke_life();
        let mask = ExplosionComponents::FLAME_SMOKE.mask();

        let mut emitter = RadialEmitter::default();
        emitter.r_min = 0.0;
        emitter.r_max = 1.0;
        let core = &mut emitter.core;
        core.sprite_rectangles = config.sprites.flame_smoke.clone();
        core.particles_per_emission_min = 1;
        core.particles_per_emission_max = 3;
        core.emission_interval_min = 0.0;
        core.emission_interval_max = 0.1 * duration;
        core.total_emissions_left = Some(0);
        core.life = duration;
        core.orientation_min = Vec3::zeros();
        core.orientation_max = Vec3::new(0.0, 0.0, PI);
        core.angular_velocity_min = Vec3::new(0.0, 0.0, -0.5);
        core.angular_velocity_max = Vec3::new(0.0, 0.0, 0.5);
        core.effector_mask = mask;
        let key = particles.add_emitter(emitter)?;

        particles.add_effector(ColorKeyframesEffector {
            keyframes: Keyframes::new()
                .with(0.0, Vec4::new(1.0, 1.0, 1.0, 1.0))
                .with(0.5 * duration, Vec4::new(0.0, 0.0, 0.0, 0.5))
                .with(duration, Vec4::new(0.0, 0.0, 0.0, 0.0)),
            color_mask: config.flame_color,
            particle_lifetime: duration,
            effector_mask: mask,
        })?;
        particles.add_effector(MasterScaleKeyframesEffector {
            keyframes: Keyframes::new()
                .with(0.0, 0.1)
                .with(0.5 * duration, 1.0)
                .with(duration, 1.2),
            particle_lifetime: duration,
            effector_mask: mask,
        })?;

        Ok(key)
    }

    fn add_flash(
        particles: &mut ParticleSystem,
        config: &ExplosionConfig,
    ) -> Result<EmitterKey, ParticleError> {
        let duration = config.flash_life();
        let mask = ExplosionComponents::FLASH.mask();

        let mut emitter = FieldEmitter::new(SphereGenerator::default());
        emitter.velocity = Vec3::zeros();
        let core = &mut emitter.core;
        core.sprite_rectangles = config.sprites.flash.clone();
        core.particles_per_emission_min = 1;
        core.particles_per_emission_max = 2;
        core.emission_interval_min = 0.0;
        core.emission_interval_max = 0.2 * duration;
        core.total_emissions_left = Some(0);
        core.life = duration;
        core.orientation_min = Vec3::zeros();
        core.orientation_max = Vec3::new(0.0, 0.0, 2.0 * PI);
        core.effector_mask = mask;
        let key = particles.add_emitter(emitter)?;

        particles.add_effector(ColorKeyframesEffector {
            keyframes: Keyframes::new()
                .with(0.0, Vec4::new(1.0, 1.0, 1.0, 1.0))
                .with(duration, Vec4::new(1.0, 1.0, 1.0, 0.0)),
            color_mask: config.flash_color,
            particle_lifetime: duration,
            effector_mask: mask,
        })?;
        particles.add_effector(MasterScaleKeyframesEffector {
            keyframes: Keyframes::new().with(0.0, 1.0).with(duration, 1.5),
            particle_lifetime: duration,
            effector_mask: mask,
        })?;

        Ok(key)
    }

    fn add_flying_sparks(
        particles: &mut ParticleSystem,
        config: &ExplosionConfig,
    ) -> Result<EmitterKey, ParticleError> {
        let duration = config.flying_sparks_life();
        let tint = config.flying_sparks_color;

        let mut emitter = RadialEmitter::default();
        emitter.spread = RadialSpread::Planar;
        emitter.orient_away_from_center_z = true;
        let core = &mut emitter.core;
        core.sprite_rectangles = config.sprites.flying_sparks.clone();
        core.set_particles_per_emission(4);
        core.emission_interval_min = 0.0;
        core.emission_interval_max = 0.1 * duration;
        core.total_emissions_left = Some(0);
        core.life = duration;
        core.component_scale = Vec3::new(10.0, 1.0, 1.0);
        core.color_component_min = Vec4::new(0.5, 0.5, 0.5, 1.0).component_mul(&tint);
        core.color_component_max = tint;
        core.effector_mask = ExplosionComponents::FLYING_SPARKS.mask();

        particles.add_emitter(emitter)
    }

    /// Arm the enabled sub-effects for one blast at `position`
    ///
    /// `intensity` scales spawn radius, speed and sprite size.
    pub fn show_explosion(&mut self, position: Vec3, intensity: f32) {
        let enabled = self.config.enabled;
        log::debug!("Explosion at {:?}, intensity {}, effects {:?}", position, intensity, enabled);

        if enabled.flame_smoke {
            if let Some(Emitter::Radial(flame)) = self.particles.emitter_mut(self.flame_smoke) {
                flame.center = position;
                flame.core.component_scale = Vec3::new(intensity, intensity, 1.0);
                flame.core.velocity_magnitude_min = 0.2 * intensity;
                flame.core.velocity_magnitude_max = 0.3 * intensity;
                flame.core.arm(3);
            }
        }

        if enabled.flash {
            if let Some(Emitter::Field(flash)) = self.particles.emitter_mut(self.flash) {
                flash.set_generator(SphereGenerator::new(position, 0.3 * intensity));
                flash.core.component_scale = Vec3::new(intensity, intensity, 1.0);
                flash.core.arm(2);
            }
        }

        if enabled.flying_sparks {
            let speed = intensity / self.config.duration_scale;
            if let Some(Emitter::Radial(sparks)) = self.particles.emitter_mut(self.flying_sparks) {
                sparks.center = position;
                sparks.radius_offset = 3.0 * intensity;
                sparks.core.velocity_magnitude_min = speed;
                sparks.core.velocity_magnitude_max = speed;
                sparks.core.arm(4);
            }
        }
    }

    /// Advance every explosion by `delta_time` seconds
    pub fn update(&mut self, delta_time: f32) {
        self.particles.update(delta_time);
    }

    /// Underlying particle pool
    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    /// Render data for every live particle
    pub fn instances(&self) -> Vec<ParticleInstance> {
        self.particles.instances()
    }

    /// Settings the system was built with
    pub fn config(&self) -> &ExplosionConfig {
        &self.config
    }

    /// Regular sprite sheet from `lookup`
    pub fn default_texture<L: TextureLookup>(&self, lookup: &L) -> Option<L::Texture> {
        let sprites = &self.config.sprites;
        lookup.lookup(&sprites.texture_category, &sprites.texture)
    }

    /// Debug sprite sheet from `lookup`
    pub fn debug_texture<L: TextureLookup>(&self, lookup: &L) -> Option<L::Texture> {
        let sprites = &self.config.sprites;
        lookup.lookup(&sprites.texture_category, &sprites.debug_texture)
    }
}
