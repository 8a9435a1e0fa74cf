//! # Scene FX
//!
//! Rendering-adjacent effects for a 3D scene framework.
//!
//! ## Features
//!
//! - **Shadow Projections**: orthographic light view/projection fitted to
//!   the visible part of the camera frustum and trimmed to shadow casters
//! - **Cascaded Shadows**: practical split scheme over the camera depth
//!   range, packed into quadrants of one shadow atlas
//! - **Particles**: scheduled emitters, keyframed color and scale effectors
//! - **Explosions**: a composed flame/smoke, flash and flying spark effect
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_fx::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let light = Light::directional(Vec3::new(-0.3, -1.0, -0.2), Vec3::new(1.0, 1.0, 1.0), 1.0);
//!     let camera = SplitCamera {
//!         view: Mat4::look_at(Vec3::new(0.0, 5.0, 10.0), Vec3::zeros(), Vec3::y()),
//!         fov_y: 60.0_f32.to_radians(),
//!         aspect: 16.0 / 9.0,
//!         near: 0.1,
//!         far: 200.0,
//!     };
//!     let objects = vec![SceneObject::new(Vec3::zeros(), 1.0)];
//!     let cascades = parallel_split_projections(&objects, &light, &camera, &ShadowConfig::default())?;
//!     let _uniforms = cascades.to_uniforms();
//!
//!     let mut explosions = ExplosionSystem::new(1000, ExplosionConfig::default())?;
//!     explosions.show_explosion(Vec3::zeros(), 1.0);
//!     explosions.update(1.0 / 60.0);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod particles;
pub mod render;
pub mod scene;

/// Common imports for crate users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError},
        foundation::math::{Mat4, Mat4Ext, Vec3, Vec4},
        particles::{
            EffectorMask, ExplosionConfig, ExplosionSystem, Particle, ParticleError,
            ParticleInstance, ParticleSystem, TextureLookup,
        },
        render::{
            shadow::{
                parallel_split_projections, shadow_projection, CascadeUniforms, ShadowCascades,
                ShadowConfig, ShadowError, ShadowProjection, SplitCamera,
            },
            FrustumCuller, Light, LightType,
        },
        scene::{SceneObject, ShadowCaster},
    };
}
