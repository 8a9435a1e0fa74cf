//! Light descriptors consumed by the shadow calculations

use crate::foundation::math::Vec3;

/// Light types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightType {
    /// Directional light (like sunlight)
    Directional,
    /// Point light (like a lightbulb)
    Point,
    /// Spot light (like a flashlight)
    Spot,
}

/// Light source
#[derive(Debug, Clone)]
pub struct Light {
    /// Light type
    pub light_type: LightType,
    /// Light position (for point/spot lights)
    pub position: Vec3,
    /// Light direction (for directional/spot lights), pointing from the light into the scene
    pub direction: Vec3,
    /// Light color
    pub color: Vec3,
    /// Light intensity
    pub intensity: f32,
    /// Light range (for point/spot lights)
    pub range: f32,
}

impl Light {
    /// Create a directional light
    pub fn directional(direction: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            light_type: LightType::Directional,
            position: Vec3::zeros(),
            direction,
            color,
            intensity,
            range: 0.0,
        }
    }

    /// Create a point light
    pub fn point(position: Vec3, color: Vec3, intensity: f32, range: f32) -> Self {
        Self {
            light_type: LightType::Point,
            position,
            direction: Vec3::zeros(),
            color,
            intensity,
            range,
        }
    }

    /// Create a spot light
    pub fn spot(position: Vec3, direction: Vec3, color: Vec3, intensity: f32, range: f32) -> Self {
        Self {
            light_type: LightType::Spot,
            position,
            direction,
            color,
            intensity,
            range,
        }
    }

    /// Whether this light can drive the orthographic shadow projections
    pub fn casts_parallel_shadows(&self) -> bool {
        self.light_type == LightType::Directional
    }
}

impl Default for Light {
    /// Outdoor sun slightly off vertical
    fn default() -> Self {
        Self::directional(Vec3::new(-0.2, -1.0, -0.3), Vec3::new(1.0, 1.0, 0.9), 1.0)
    }
}
