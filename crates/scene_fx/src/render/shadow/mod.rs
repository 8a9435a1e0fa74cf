//! Directional light shadow projections
//!
//! Two layers:
//! - [`projection`] fits one orthographic light view/projection around the
//!   visible part of a camera frustum, trimmed to the objects that can cast
//!   or receive shadows inside it.
//! - [`cascade`] splits the camera depth range with the practical split
//!   scheme (blend of logarithmic and uniform splits), fits a projection per
//!   split and packs the results into quadrants of one shadow atlas.
//!
//! Everything here is stateless: inputs in, matrices out, recomputed per frame.

pub mod cascade;
pub mod config;
pub mod projection;

use thiserror::Error;

use crate::render::frustum::FrustumError;
use crate::render::lighting::LightType;

pub use cascade::{
    crop_matrix, parallel_split_projections, split_depths, CascadeUniforms, ShadowCascades,
    ShadowSplit, SplitCamera, MAX_CASCADES,
};
pub use config::ShadowConfig;
pub use projection::{
    frustum_shadow_projection, shadow_projection, LightBasis, LightBounds, ShadowProjection,
};

/// Shadow calculation errors
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ShadowError {
    /// Only directional lights produce parallel shadow projections
    #[error("unsupported light type for shadow projection: {0:?}")]
    UnsupportedLightType(LightType),

    /// The light direction has no usable length
    #[error("light direction is zero or not finite")]
    DegenerateLightDirection,

    /// The crop table only has room for a fixed number of splits
    #[error("split count {count} outside supported range 1..={max}")]
    InvalidSplitCount {
        /// Requested split count
        count: usize,
        /// Largest supported split count
        max: usize,
    },

    /// Camera clip range cannot be split
    #[error("invalid camera depth range: near {near}, far {far}")]
    InvalidDepthRange {
        /// Camera near plane distance
        near: f32,
        /// Camera far plane distance
        far: f32,
    },

    /// Frustum corner extraction failed
    #[error(transparent)]
    Frustum(#[from] FrustumError),
}
