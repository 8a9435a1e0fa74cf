//! Scene-side inputs for the shadow calculations
//!
//! The shadow code only needs a read-only view of each object: where it is,
//! how big its bounding sphere is, and whether it is currently rendered.
//! [`ShadowCaster`] captures that view so any scene representation can feed
//! the calculator; [`SceneObject`] is a plain implementation of it.

mod scene_object;

pub use scene_object::{RenderState, SceneObject, ShadowCaster};
