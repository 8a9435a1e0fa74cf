//! Rendering-side calculations
//!
//! Nothing in here talks to a GPU. The modules produce matrices and plain
//! data blocks that a renderer uploads and consumes:
//!
//! - [`frustum`]: frustum corners and plane culling
//! - [`lighting`]: light descriptors
//! - [`shadow`]: directional light shadow projections and cascades

pub mod frustum;
pub mod lighting;
pub mod shadow;

pub use frustum::{frustum_corners, FrustumCuller, FrustumError, Plane};
pub use lighting::{Light, LightType};
