//! Particle emitters
//!
//! Every emitter shares an [`EmitterCore`]: the emission schedule plus the
//! ranges that initial particle properties are drawn from. The variants only
//! differ in where particles appear and how they start moving.

use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;

use super::particle::{EffectorMask, Particle, SpriteRect};
use super::{check_lifetime, check_range, ParticleError};
use crate::foundation::math::{constants::TAU, Vec3, Vec4};

/// Uniform draw from `[min, max]`; collapses to `min` for empty ranges
pub(crate) fn random_between<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    if max > min {
        rng.gen_range(min..=max)
    } else {
        min
    }
}

fn random_vec3<R: Rng + ?Sized>(rng: &mut R, min: &Vec3, max: &Vec3) -> Vec3 {
    Vec3::new(
        random_between(rng, min.x, max.x),
        random_between(rng, min.y, max.y),
        random_between(rng, min.z, max.z),
    )
}

fn random_vec4<R: Rng + ?Sized>(rng: &mut R, min: &Vec4, max: &Vec4) -> Vec4 {
    Vec4::new(
        random_between(rng, min.x, max.x),
        random_between(rng, min.y, max.y),
        random_between(rng, min.z, max.z),
        random_between(rng, min.w, max.w),
    )
}

/// Uniformly distributed unit vector
fn random_unit_sphere<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    let z = random_between(rng, -1.0, 1.0);
    let phi = rng.gen_range(0.0..TAU);
    let r = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(r * phi.cos(), r * phi.sin(), z)
}

/// Uniformly distributed unit vector in the XY plane
fn random_unit_circle<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    let theta = rng.gen_range(0.0..TAU);
    Vec3::new(theta.cos(), theta.sin(), 0.0)
}

fn check_vec_range(name: &'static str, min: &[f32], max: &[f32]) -> Result<(), ParticleError> {
    min.iter()
        .zip(max)
        .try_for_each(|(&lo, &hi)| check_range(name, lo, hi))
}

/// Emission schedule and initial particle property ranges
#[derive(Debug, Clone)]
pub struct EmitterCore {
    /// Sprite rectangles; each particle picks one at random
    pub sprite_rectangles: Vec<SpriteRect>,

    /// Smallest batch per emission
    pub particles_per_emission_min: u32,

    /// Largest batch per emission
    pub particles_per_emission_max: u32,

    /// Shortest wait between emissions in seconds
    pub emission_interval_min: f32,

    /// Longest wait between emissions in seconds
    pub emission_interval_max: f32,

    /// Bursts left before the emitter goes quiet; `None` emits forever
    pub total_emissions_left: Option<u32>,

    /// Lifetime of spawned particles in seconds
    pub life: f32,

    /// Euler orientation range (radians)
    pub orientation_min: Vec3,
    /// Euler orientation range (radians)
    pub orientation_max: Vec3,

    /// Angular velocity range (radians per second)
    pub angular_velocity_min: Vec3,
    /// Angular velocity range (radians per second)
    pub angular_velocity_max: Vec3,

    /// Speed range along the emission direction
    pub velocity_magnitude_min: f32,
    /// Speed range along the emission direction
    pub velocity_magnitude_max: f32,

    /// RGBA color range, drawn per component
    pub color_component_min: Vec4,
    /// RGBA color range, drawn per component
    pub color_component_max: Vec4,

    /// Per-axis scale of spawned particles
    pub component_scale: Vec3,

    /// Uniform scale of spawned particles
    pub master_scale: f32,

    /// Mask handed to every spawned particle
    pub effector_mask: EffectorMask,

    timer: f32,
    next_interval: Option<f32>,
}

impl Default for EmitterCore {
    fn default() -> Self {
        Self {
            sprite_rectangles: vec![SpriteRect::full()],
            particles_per_emission_min: 1,
            particles_per_emission_max: 1,
            emission_interval_min: 1.0,
            emission_interval_max: 1.0,
            total_emissions_left: None,
            life: 1.0,
            orientation_min: Vec3::zeros(),
            orientation_max: Vec3::zeros(),
            angular_velocity_min: Vec3::zeros(),
            angular_velocity_max: Vec3::zeros(),
            velocity_magnitude_min: 1.0,
            velocity_magnitude_max: 1.0,
            color_component_min: Vec4::new(1.0, 1.0, 1.0, 1.0),
            color_component_max: Vec4::new(1.0, 1.0, 1.0, 1.0),
            component_scale: Vec3::new(1.0, 1.0, 1.0),
            master_scale: 1.0,
            effector_mask: EffectorMask::ALL,
            timer: 0.0,
            next_interval: None,
        }
    }
}

impl EmitterCore {
    /// Use a fixed batch size
    pub fn set_particles_per_emission(&mut self, count: u32) {
        self.particles_per_emission_min = count;
        self.particles_per_emission_max = count;
    }

    /// Arm the emitter for `bursts` more emissions, restarting its timer
    pub fn arm(&mut self, bursts: u32) {
        self.total_emissions_left = Some(bursts);
        self.timer = 0.0;
        self.next_interval = None;
    }

    /// True while the emitter still has bursts to fire
    pub fn is_active(&self) -> bool {
        self.total_emissions_left != Some(0)
    }

    /// Check every range and the lifetime
    pub fn validate(&self) -> Result<(), ParticleError> {
        if self.sprite_rectangles.is_empty() {
            return Err(ParticleError::EmptySpriteList);
        }
        check_lifetime(self.life)?;
        check_range(
            "particles per emission",
            self.particles_per_emission_min as f32,
            self.particles_per_emission_max as f32,
        )?;
        check_range("emission interval", self.emission_interval_min, self.emission_interval_max)?;
        if self.emission_interval_min < 0.0 {
            return Err(ParticleError::InvalidRange {
                name: "emission interval",
                min: self.emission_interval_min,
                max: self.emission_interval_max,
            });
        }
        check_range("velocity magnitude", self.velocity_magnitude_min, self.velocity_magnitude_max)?;
        check_vec_range("orientation", self.orientation_min.as_slice(), self.orientation_max.as_slice())?;
        check_vec_range(
            "angular velocity",
            self.angular_velocity_min.as_slice(),
            self.angular_velocity_max.as_slice(),
        )?;
        check_vec_range(
            "color component",
            self.color_component_min.as_slice(),
            self.color_component_max.as_slice(),
        )
    }

    /// Advance the schedule by `delta_time` and return how many bursts fire
    ///
    /// An unlimited emitter whose interval is zero fires once per call.
    pub fn advance<R: Rng + ?Sized>(&mut self, delta_time: f32, rng: &mut R) -> u32 {
        if !self.is_active() {
            return 0;
        }

        self.timer += delta_time;
        let mut bursts = 0;

        while self.is_active() {
            let interval = match self.next_interval {
                Some(interval) => interval,
                None => {
                    let drawn = self.draw_interval(rng);
                    self.next_interval = Some(drawn);
                    drawn
                }
            };
            if self.timer < interval {
                break;
            }

            bursts += 1;
            self.timer -= interval;
            self.next_interval = Some(self.draw_interval(rng));

            match self.total_emissions_left.as_mut() {
                Some(left) => *left -= 1,
                None if interval <= 0.0 => {
                    self.timer = 0.0;
                    break;
                }
                None => {}
            }
        }

        bursts
    }

    /// Random batch size for one burst
    pub fn draw_batch_size<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        if self.particles_per_emission_max > self.particles_per_emission_min {
            rng.gen_range(self.particles_per_emission_min..=self.particles_per_emission_max)
        } else {
            self.particles_per_emission_min
        }
    }

    fn draw_interval<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        random_between(rng, self.emission_interval_min, self.emission_interval_max).max(0.0)
    }

    /// Particle with every core property drawn; position and velocity left at zero
    pub fn spawn_base<R: Rng + ?Sized>(&self, rng: &mut R) -> Particle {
        let sprite = self
            .sprite_rectangles
            .choose(rng)
            .copied()
            .unwrap_or_else(SpriteRect::full);

        Particle {
            orientation: random_vec3(rng, &self.orientation_min, &self.orientation_max),
            angular_velocity: random_vec3(rng, &self.angular_velocity_min, &self.angular_velocity_max),
            life: self.life,
            age: 0.0,
            sprite,
            color: random_vec4(rng, &self.color_component_min, &self.color_component_max),
            master_scale: self.master_scale,
            base_master_scale: self.master_scale,
            component_scale: self.component_scale,
            effector_mask: self.effector_mask,
            ..Particle::default()
        }
    }

    fn draw_speed<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        random_between(rng, self.velocity_magnitude_min, self.velocity_magnitude_max)
    }
}

/// Direction distribution of a [`RadialEmitter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RadialSpread {
    /// Directions in the XY plane
    Planar,
    /// Directions over the whole unit sphere
    #[default]
    Spherical,
}

/// Emits particles outward from a center point
#[derive(Debug, Clone, Default)]
pub struct RadialEmitter {
    /// Shared schedule and property ranges
    pub core: EmitterCore,

    /// Emission center
    pub center: Vec3,

    /// Fixed distance added to every spawn radius
    pub radius_offset: f32,

    /// Random spawn radius range
    pub r_min: f32,
    /// Random spawn radius range
    pub r_max: f32,

    /// Direction distribution
    pub spread: RadialSpread,

    /// Rotate particles around Z to face away from the center
    pub orient_away_from_center_z: bool,
}

impl RadialEmitter {
    /// Radial emitter around `center`
    pub fn new(center: Vec3) -> Self {
        Self {
            center,
            ..Self::default()
        }
    }

    fn spawn<R: Rng + ?Sized>(&self, rng: &mut R) -> Particle {
        let direction = match self.spread {
            RadialSpread::Planar => random_unit_circle(rng),
            RadialSpread::Spherical => random_unit_sphere(rng),
        };
        let radius = self.radius_offset + random_between(rng, self.r_min, self.r_max);

        let mut particle = self.core.spawn_base(rng);
        particle.position = self.center + direction * radius;
        particle.velocity = direction * self.core.draw_speed(rng);
        if self.orient_away_from_center_z {
            particle.orientation.z = direction.y.atan2(direction.x);
        }
        particle
    }
}

/// Source of spawn positions for a [`FieldEmitter`]
pub trait FieldGenerator: fmt::Debug {
    /// Draw one spawn position
    fn generate(&self, rng: &mut dyn rand::RngCore) -> Vec3;

    /// Clone into a box
    fn box_clone(&self) -> Box<dyn FieldGenerator>;
}

impl Clone for Box<dyn FieldGenerator> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

/// Uniform points inside a sphere
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereGenerator {
    /// Sphere center
    pub center: Vec3,
    /// Sphere radius
    pub radius: f32,
}

impl SphereGenerator {
    /// Sphere of `radius` around `center`
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }
}

impl Default for SphereGenerator {
    fn default() -> Self {
        Self::new(Vec3::zeros(), 1.0)
    }
}

impl FieldGenerator for SphereGenerator {
    fn generate(&self, rng: &mut dyn rand::RngCore) -> Vec3 {
        // cube root keeps the density uniform over the volume
        let distance = self.radius * random_between(rng, 0.0, 1.0).cbrt();
        self.center + random_unit_sphere(rng) * distance
    }

    fn box_clone(&self) -> Box<dyn FieldGenerator> {
        Box::new(*self)
    }
}

/// Uniform points inside an axis-aligned box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxGenerator {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl BoxGenerator {
    /// Box spanning `min` to `max`
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box of `size` centered on `center`
    pub fn centered(center: Vec3, size: Vec3) -> Self {
        let half = size * 0.5;
        Self::new(center - half, center + half)
    }
}

impl FieldGenerator for BoxGenerator {
    fn generate(&self, rng: &mut dyn rand::RngCore) -> Vec3 {
        random_vec3(rng, &self.min, &self.max)
    }

    fn box_clone(&self) -> Box<dyn FieldGenerator> {
        Box::new(*self)
    }
}

/// Emits particles at positions drawn from a [`FieldGenerator`]
#[derive(Debug, Clone)]
pub struct FieldEmitter {
    /// Shared schedule and property ranges
    pub core: EmitterCore,

    /// Spawn position source
    pub generator: Box<dyn FieldGenerator>,

    /// Initial velocity of every particle
    pub velocity: Vec3,
}

impl FieldEmitter {
    /// Field emitter over `generator`
    pub fn new(generator: impl FieldGenerator + 'static) -> Self {
        Self {
            core: EmitterCore::default(),
            generator: Box::new(generator),
            velocity: Vec3::zeros(),
        }
    }

    /// Replace the spawn position source
    pub fn set_generator(&mut self, generator: impl FieldGenerator + 'static) {
        self.generator = Box::new(generator);
    }

    fn spawn<R: Rng>(&self, rng: &mut R) -> Particle {
        let mut particle = self.core.spawn_base(rng);
        particle.position = self.generator.generate(rng);
        particle.velocity = self.velocity;
        particle
    }
}

/// Any emitter the particle system can run
#[derive(Debug, Clone)]
pub enum Emitter {
    /// Outward from a center point
    Radial(RadialEmitter),
    /// Inside a generated field
    Field(FieldEmitter),
}

impl Emitter {
    /// Shared emitter state
    pub fn core(&self) -> &EmitterCore {
        match self {
            Self::Radial(emitter) => &emitter.core,
            Self::Field(emitter) => &emitter.core,
        }
    }

    /// Shared emitter state
    pub fn core_mut(&mut self) -> &mut EmitterCore {
        match self {
            Self::Radial(emitter) => &mut emitter.core,
            Self::Field(emitter) => &mut emitter.core,
        }
    }

    /// Check the emitter's settings
    pub fn validate(&self) -> Result<(), ParticleError> {
        self.core().validate()?;
        if let Self::Radial(emitter) = self {
            check_range("spawn radius", emitter.r_min, emitter.r_max)?;
        }
        Ok(())
    }

    /// One random particle from this emitter
    pub fn spawn<R: Rng>(&self, rng: &mut R) -> Particle {
        match self {
            Self::Radial(emitter) => emitter.spawn(rng),
            Self::Field(emitter) => emitter.spawn(rng),
        }
    }

    /// Step the schedule and append whatever it emits to `out`
    ///
    /// Returns the number of particles spawned.
    pub fn emit<R: Rng>(&mut self, delta_time: f32, rng: &mut R, out: &mut Vec<Particle>) -> usize {
        let bursts = self.core_mut().advance(delta_time, rng);
        let before = out.len();
        for _ in 0..bursts {
            let batch = self.core().draw_batch_size(rng);
            out.extend((0..batch).map(|_| self.spawn(rng)));
        }
        out.len() - before
    }
}

impl From<RadialEmitter> for Emitter {
    fn from(emitter: RadialEmitter) -> Self {
        Self::Radial(emitter)
    }
}

impl From<FieldEmitter> for Emitter {
    fn from(emitter: FieldEmitter) -> Self {
        Self::Field(emitter)
    }
}
