//! Particle state and per-particle render data

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::foundation::math::{Vec3, Vec4};

/// Component mask tagging which effectors may touch a particle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct EffectorMask(pub u16);

impl EffectorMask {
    /// Mask matching nothing
    pub const NONE: Self = Self(0);

    /// Mask matching everything
    pub const ALL: Self = Self(u16::MAX);

    /// True if the two masks share at least one bit
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl From<u16> for EffectorMask {
    fn from(bits: u16) -> Self {
        Self(bits)
    }
}

/// Sub-rectangle of a sprite sheet in normalized texture coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SpriteRect {
    /// Left edge (0..1)
    pub x: f32,
    /// Top edge (0..1)
    pub y: f32,
    /// Width (0..1)
    pub w: f32,
    /// Height (0..1)
    pub h: f32,
}

impl SpriteRect {
    /// Create a sprite rectangle
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Whole texture
    pub const fn full() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }
}

/// A single live particle
#[derive(Debug, Clone)]
pub struct Particle {
    /// World position
    pub position: Vec3,

    /// Euler XYZ orientation in radians
    pub orientation: Vec3,

    /// Linear velocity in units per second
    pub velocity: Vec3,

    /// Euler XYZ angular velocity in radians per second
    pub angular_velocity: Vec3,

    /// Total lifetime in seconds
    pub life: f32,

    /// Seconds since spawn
    pub age: f32,

    /// Sprite sheet region
    pub sprite: SpriteRect,

    /// RGBA color
    pub color: Vec4,

    /// Uniform scale applied on top of `component_scale`
    pub master_scale: f32,

    /// Master scale at spawn; scale effectors multiply this
    pub base_master_scale: f32,

    /// Per-axis scale
    pub component_scale: Vec3,

    /// Effector mask copied from the emitter
    pub effector_mask: EffectorMask,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            orientation: Vec3::zeros(),
            velocity: Vec3::zeros(),
            angular_velocity: Vec3::zeros(),
            life: 1.0,
            age: 0.0,
            sprite: SpriteRect::full(),
            color: Vec4::new(1.0, 1.0, 1.0, 1.0),
            master_scale: 1.0,
            base_master_scale: 1.0,
            component_scale: Vec3::new(1.0, 1.0, 1.0),
            effector_mask: EffectorMask::ALL,
        }
    }
}

impl Particle {
    /// Advance age by `delta_time`
    pub fn age_by(&mut self, delta_time: f32) {
        self.age += delta_time;
    }

    /// True once the particle has outlived its lifetime
    pub fn is_expired(&self) -> bool {
        self.age > self.life
    }

    /// Integrate position and orientation
    pub fn integrate(&mut self, delta_time: f32) {
        self.position += self.velocity * delta_time;
        self.orientation += self.angular_velocity * delta_time;
    }

    /// Final per-axis scale
    pub fn world_scale(&self) -> Vec3 {
        self.component_scale * self.master_scale
    }

    /// Pack into GPU instance data
    pub fn to_instance(&self) -> ParticleInstance {
        let scale = self.world_scale();
        ParticleInstance {
            position: self.position.into(),
            rotation_z: self.orientation.z,
            scale: scale.into(),
            age_ratio: if self.life > 0.0 {
                (self.age / self.life).clamp(0.0, 1.0)
            } else {
                1.0
            },
            color: self.color.into(),
            sprite_rect: [self.sprite.x, self.sprite.y, self.sprite.w, self.sprite.h],
        }
    }
}

/// Per-particle instance data for billboard rendering
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ParticleInstance {
    /// World position
    pub position: [f32; 3],
    /// Billboard rotation around the view axis
    pub rotation_z: f32,
    /// Per-axis world scale
    pub scale: [f32; 3],
    /// age / life, clamped to 0..1
    pub age_ratio: f32,
    /// RGBA color
    pub color: [f32; 4],
    /// Sprite sheet region (x, y, w, h)
    pub sprite_rect: [f32; 4],
}
