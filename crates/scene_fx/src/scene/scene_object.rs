//! Read-only scene object view used by shadow casting

use crate::foundation::math::Vec3;

/// Render-state flags shared by scene objects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderState {
    /// Whether this object is visible
    pub visible: bool,

    /// Object is scheduled for removal and must be ignored
    pub to_be_deleted: bool,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            visible: true,
            to_be_deleted: false,
        }
    }
}

/// Anything that can cast or receive shadows
pub trait ShadowCaster {
    /// World-space position of the bounding sphere center
    fn position(&self) -> Vec3;

    /// Bounding sphere radius with the object's scale applied
    fn scaled_radius(&self) -> f32;

    /// Whether the object has a bounding sphere at all
    fn has_bounding_sphere(&self) -> bool;

    /// Current render-state flags
    fn render_state(&self) -> RenderState;

    /// Objects that are deleted or hidden never take part in shadow fitting
    fn is_shadow_relevant(&self) -> bool {
        let state = self.render_state();
        state.visible && !state.to_be_deleted && self.has_bounding_sphere()
    }
}

impl<T: ShadowCaster + ?Sized> ShadowCaster for &T {
    fn position(&self) -> Vec3 {
        (**self).position()
    }

    fn scaled_radius(&self) -> f32 {
        (**self).scaled_radius()
    }

    fn has_bounding_sphere(&self) -> bool {
        (**self).has_bounding_sphere()
    }

    fn render_state(&self) -> RenderState {
        (**self).render_state()
    }
}

impl<T: ShadowCaster + ?Sized> ShadowCaster for Box<T> {
    fn position(&self) -> Vec3 {
        (**self).position()
    }

    fn scaled_radius(&self) -> f32 {
        (**self).scaled_radius()
    }

    fn has_bounding_sphere(&self) -> bool {
        (**self).has_bounding_sphere()
    }

    fn render_state(&self) -> RenderState {
        (**self).render_state()
    }
}

/// Minimal scene object carrying just what shadow fitting reads
#[derive(Debug, Clone)]
pub struct SceneObject {
    /// World position
    pub position: Vec3,

    /// Unscaled bounding sphere radius, `None` when the object has no bounds
    pub bounding_radius: Option<f32>,

    /// Uniform scale applied to the bounding radius
    pub scale: f32,

    /// Render-state flags
    pub render_state: RenderState,
}

impl SceneObject {
    /// Create a visible object with a bounding sphere
    pub fn new(position: Vec3, bounding_radius: f32) -> Self {
        Self {
            position,
            bounding_radius: Some(bounding_radius),
            scale: 1.0,
            render_state: RenderState::default(),
        }
    }

    /// Set uniform scale
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Set visibility
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.render_state.visible = visible;
        self
    }

    /// Mark the object as pending deletion
    pub fn marked_for_deletion(mut self) -> Self {
        self.render_state.to_be_deleted = true;
        self
    }

    /// Drop the bounding sphere
    pub fn without_bounds(mut self) -> Self {
        self.bounding_radius = None;
        self
    }
}

impl ShadowCaster for SceneObject {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn scaled_radius(&self) -> f32 {
        self.bounding_radius.unwrap_or(0.0) * self.scale
    }

    fn has_bounding_sphere(&self) -> bool {
        self.bounding_radius.is_some()
    }

    fn render_state(&self) -> RenderState {
        self.render_state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_radius() {
        let object = SceneObject::new(Vec3::zeros(), 2.0).with_scale(1.5);
        assert_eq!(object.scaled_radius(), 3.0);
    }

    #[test]
    fn test_shadow_relevance_flags() {
        let visible = SceneObject::new(Vec3::zeros(), 1.0);
        assert!(visible.is_shadow_relevant());
        assert!(!visible.clone().with_visible(false).is_shadow_relevant());
        assert!(!visible.clone().marked_for_deletion().is_shadow_relevant());
        assert!(!visible.without_bounds().is_shadow_relevant());
    }
}
