//! Keyframe effectors
//!
//! An effector animates one particle property over the particle's life. The
//! keyframe times are seconds of a reference lifetime (`particle_lifetime`);
//! a particle's own age is mapped onto that timeline by its life fraction, so
//! shorter and longer lived particles still run through the whole animation.

use super::particle::{EffectorMask, Particle};
use super::{check_lifetime, ParticleError};
use crate::foundation::math::{utils, Vec4};

/// Values that can be linearly interpolated
pub trait Lerp: Copy {
    /// Blend from `self` towards `other` by `t` in [0, 1]
    fn lerp(&self, other: &Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        utils::lerp(*self, *other, t)
    }
}

impl Lerp for Vec4 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

/// Time-sorted keyframe track
#[derive(Debug, Clone, PartialEq)]
pub struct Keyframes<T> {
    frames: Vec<(f32, T)>,
}

impl<T> Default for Keyframes<T> {
    fn default() -> Self {
        Self { frames: Vec::new() }
    }
}

impl<T: Lerp> Keyframes<T> {
    /// Empty track
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a keyframe, replacing any existing one at the same time
    pub fn insert(&mut self, time: f32, value: T) {
        let index = self.frames.partition_point(|(t, _)| *t < time);
        match self.frames.get_mut(index) {
            Some(frame) if frame.0 == time => frame.1 = value,
            _ => self.frames.insert(index, (time, value)),
        }
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with(mut self, time: f32, value: T) -> Self {
        self.insert(time, value);
        self
    }

    /// Number of keyframes
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True if the track has no keyframes
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Keyframes in time order
    pub fn frames(&self) -> &[(f32, T)] {
        &self.frames
    }

    /// Interpolated value at `time`, clamped to the end keyframes
    ///
    /// A NaN time samples the first keyframe.
    pub fn sample(&self, time: f32) -> Option<T> {
        let (first, last) = (self.frames.first()?, self.frames.last()?);
        if time.is_nan() || time <= first.0 {
            return Some(first.1);
        }
        if time >= last.0 {
            return Some(last.1);
        }

        let upper = self.frames.partition_point(|(t, _)| *t <= time).max(1);
        let (t0, v0) = self.frames[upper - 1];
        let (t1, v1) = self.frames[upper];
        let span = t1 - t0;
        let t = if span > 0.0 { (time - t0) / span } else { 0.0 };
        Some(v0.lerp(&v1, t))
    }
}

impl<T: Lerp> FromIterator<(f32, T)> for Keyframes<T> {
    fn from_iter<I: IntoIterator<Item = (f32, T)>>(iter: I) -> Self {
        let mut keyframes = Self::new();
        for (time, value) in iter {
            keyframes.insert(time, value);
        }
        keyframes
    }
}

/// Map a particle's age onto a keyframe timeline of `particle_lifetime` seconds
fn timeline_position(particle: &Particle, particle_lifetime: f32) -> f32 {
    if particle.life > 0.0 {
        particle.age / particle.life * particle_lifetime
    } else {
        particle.age
    }
}

/// Animates particle color, tinted by a fixed color mask
#[derive(Debug, Clone)]
pub struct ColorKeyframesEffector {
    /// RGBA keyframes
    pub keyframes: Keyframes<Vec4>,

    /// Multiplied component-wise into every sampled color
    pub color_mask: Vec4,

    /// Reference lifetime of the keyframe timeline
    pub particle_lifetime: f32,

    /// Particles this effector may touch
    pub effector_mask: EffectorMask,
}

impl Default for ColorKeyframesEffector {
    fn default() -> Self {
        Self {
            keyframes: Keyframes::new(),
            color_mask: Vec4::new(1.0, 1.0, 1.0, 1.0),
            particle_lifetime: 1.0,
            effector_mask: EffectorMask::ALL,
        }
    }
}

impl ColorKeyframesEffector {
    fn apply(&self, particle: &mut Particle) {
        let time = timeline_position(particle, self.particle_lifetime);
        if let Some(color) = self.keyframes.sample(time) {
            particle.color = color.component_mul(&self.color_mask);
        }
    }
}

/// Animates particle master scale relative to its spawn scale
#[derive(Debug, Clone)]
pub struct MasterScaleKeyframesEffector {
    /// Scale factor keyframes
    pub keyframes: Keyframes<f32>,

    /// Reference lifetime of the keyframe timeline
    pub particle_lifetime: f32,

    /// Particles this effector may touch
    pub effector_mask: EffectorMask,
}

impl Default for MasterScaleKeyframesEffector {
    fn default() -> Self {
        Self {
            keyframes: Keyframes::new(),
            particle_lifetime: 1.0,
            effector_mask: EffectorMask::ALL,
        }
    }
}

impl MasterScaleKeyframesEffector {
    fn apply(&self, particle: &mut Particle) {
        let time = timeline_position(particle, self.particle_lifetime);
        if let Some(scale) = self.keyframes.sample(time) {
            particle.master_scale = particle.base_master_scale * scale;
        }
    }
}

/// Any effector the particle system can run
#[derive(Debug, Clone)]
pub enum Effector {
    /// Color over life
    Color(ColorKeyframesEffector),
    /// Master scale over life
    MasterScale(MasterScaleKeyframesEffector),
}

impl Effector {
    /// Particles this effector may touch
    pub fn effector_mask(&self) -> EffectorMask {
        match self {
            Self::Color(effector) => effector.effector_mask,
            Self::MasterScale(effector) => effector.effector_mask,
        }
    }

    /// Change which particles this effector may touch
    pub fn set_effector_mask(&mut self, mask: EffectorMask) {
        match self {
            Self::Color(effector) => effector.effector_mask = mask,
            Self::MasterScale(effector) => effector.effector_mask = mask,
        }
    }

    /// Check the reference lifetime
    pub fn validate(&self) -> Result<(), ParticleError> {
        match self {
            Self::Color(effector) => check_lifetime(effector.particle_lifetime),
            Self::MasterScale(effector) => check_lifetime(effector.particle_lifetime),
        }
    }

    /// Update `particle` if the masks intersect
    pub fn apply(&self, particle: &mut Particle) {
        if !self.effector_mask().intersects(particle.effector_mask) {
            return;
        }
        match self {
            Self::Color(effector) => effector.apply(particle),
            Self::MasterScale(effector) => effector.apply(particle),
        }
    }
}

impl From<ColorKeyframesEffector> for Effector {
    fn from(effector: ColorKeyframesEffector) -> Self {
        Self::Color(effector)
    }
}

impl From<MasterScaleKeyframesEffector> for Effector {
    fn from(effector: MasterScaleKeyframesEffector) -> Self {
        Self::MasterScale(effector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_keyframes_interpolate_and_clamp() {
        let keyframes = Keyframes::new().with(0.0, 0.0_f32).with(1.0, 1.0);

        assert_relative_eq!(keyframes.sample(0.25).unwrap(), 0.25);
        assert_relative_eq!(keyframes.sample(-1.0).unwrap(), 0.0);
        assert_relative_eq!(keyframes.sample(2.0).unwrap(), 1.0);
    }

    #[test]
    fn test_keyframes_non_finite_time() {
        let keyframes = Keyframes::new().with(0.0, 0.0_f32).with(1.0, 1.0);

        assert_relative_eq!(keyframes.sample(f32::NAN).unwrap(), 0.0);
        assert_relative_eq!(keyframes.sample(f32::INFINITY).unwrap(), 1.0);
        assert_relative_eq!(keyframes.sample(f32::NEG_INFINITY).unwrap(), 0.0);

        let effector = Effector::from(MasterScaleKeyframesEffector {
            keyframes: Keyframes::new().with(0.0, 2.0).with(1.0, 4.0),
            particle_lifetime: 1.0,
            effector_mask: EffectorMask::ALL,
        });
        let mut particle = Particle {
            age: f32::NAN,
            ..Particle::default()
        };
        effector.apply(&mut particle);
        assert_relative_eq!(particle.master_scale, 2.0);
    }

    #[test]
    fn test_keyframes_stay_sorted() {
        let keyframes: Keyframes<f32> = [(2.0, 20.0), (0.0, 0.0), (1.0, 10.0)].into_iter().collect();

        let times: Vec<f32> = keyframes.frames().iter().map(|(t, _)| *t).collect();
        assert_eq!(times, vec![0.0, 1.0, 2.0]);
        assert_relative_eq!(keyframes.sample(1.5).unwrap(), 15.0);
    }

    #[test]
    fn test_keyframe_replaced_at_same_time() {
        let mut keyframes = Keyframes::new().with(1.0, 1.0_f32);
        keyframes.insert(1.0, 5.0);

        assert_eq!(keyframes.len(), 1);
        assert_relative_eq!(keyframes.sample(1.0).unwrap(), 5.0);
    }

    #[test]
    fn test_empty_track_samples_nothing() {
        let keyframes: Keyframes<Vec4> = Keyframes::new();
        assert!(keyframes.sample(0.5).is_none());
    }

    #[test]
    fn test_color_effector_applies_mask() {
        let effector = Effector::from(ColorKeyframesEffector {
            keyframes: Keyframes::new()
                .with(0.0, Vec4::new(1.0, 1.0, 1.0, 1.0))
                .with(2.0, Vec4::new(0.0, 0.0, 0.0, 0.0)),
            color_mask: Vec4::new(1.0, 0.5, 0.0, 1.0),
            particle_lifetime: 2.0,
            effector_mask: EffectorMask(0x1),
        });

        let mut particle = Particle {
            life: 2.0,
            age: 1.0,
            effector_mask: EffectorMask(0x1),
            ..Particle::default()
        };
        effector.apply(&mut particle);

        assert_relative_eq!(particle.color, Vec4::new(0.5, 0.25, 0.0, 0.5), epsilon = 1e-6);
    }

    #[test]
    fn test_scale_effector_uses_life_fraction() {
        let effector = Effector::from(MasterScaleKeyframesEffector {
            keyframes: Keyframes::new().with(0.0, 1.0).with(4.0, 3.0),
            particle_lifetime: 4.0,
            effector_mask: EffectorMask::ALL,
        });

        // half of a 1 second life lands halfway along the 4 second timeline
        let mut particle = Particle {
            life: 1.0,
            age: 0.5,
            master_scale: 2.0,
            base_master_scale: 2.0,
            ..Particle::default()
        };
        effector.apply(&mut particle);

        assert_relative_eq!(particle.master_scale, 4.0);
    }

    #[test]
    fn test_disjoint_masks_not_affected() {
        let effector = Effector::from(MasterScaleKeyframesEffector {
            keyframes: Keyframes::new().with(0.0, 5.0),
            particle_lifetime: 1.0,
            effector_mask: EffectorMask(0x1),
        });

        let mut flame = Particle {
            effector_mask: EffectorMask(0x1),
            ..Particle::default()
        };
        let mut flash = Particle {
            effector_mask: EffectorMask(0x2),
            ..Particle::default()
        };
        effector.apply(&mut flame);
        effector.apply(&mut flash);

        assert_relative_eq!(flame.master_scale, 5.0);
        assert_relative_eq!(flash.master_scale, 1.0);
    }

    #[test]
    fn test_validation() {
        let mut effector = Effector::from(ColorKeyframesEffector::default());
        assert!(effector.validate().is_ok());

        if let Effector::Color(color) = &mut effector {
            color.particle_lifetime = -1.0;
        }
        assert_eq!(effector.validate(), Err(ParticleError::InvalidLifetime(-1.0)));
    }
}
