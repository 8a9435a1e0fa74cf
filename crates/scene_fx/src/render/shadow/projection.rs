//! Single orthographic shadow projection for a directional light
//!
//! The light box starts as the camera frustum's bounding box in light-aligned
//! space and is then trimmed in x, y and max-z to the objects visible to both
//! the camera and the light. Min-z is never trimmed: anything between the
//! light and the receivers still has to land in the shadow map.

use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};
use crate::render::frustum::{frustum_corners, FrustumCuller};
use crate::render::lighting::Light;
use crate::scene::ShadowCaster;

use super::ShadowError;

/// Distance of the orthographic near plane from the light eye
const NEAR_PLANE_OFFSET: f32 = 1.0;

/// Orthonormal frame aligned with a directional light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightBasis {
    /// First perpendicular axis
    pub x: Vec3,
    /// Second perpendicular axis, used as the light view's up vector
    pub y: Vec3,
    /// Light forward direction
    pub z: Vec3,
}

impl LightBasis {
    /// Build the basis for a directional light
    pub fn from_light(light: &Light) -> Result<Self, ShadowError> {
        if !light.casts_parallel_shadows() {
            return Err(ShadowError::UnsupportedLightType(light.light_type));
        }
        Self::from_direction(&light.direction)
    }

    /// Build the basis from a raw light direction
    pub fn from_direction(direction: &Vec3) -> Result<Self, ShadowError> {
        let length = direction.norm();
        if length <= f32::EPSILON || !length.is_finite() {
            return Err(ShadowError::DegenerateLightDirection);
        }

        let z = direction / length;
        let (x, y) = utils::two_perpendicular_axes(&z);
        Ok(Self { x, y, z })
    }

    /// World space to light-aligned space
    pub fn to_light_space(&self, world: &Vec3) -> Vec3 {
        Vec3::new(self.x.dot(world), self.y.dot(world), self.z.dot(world))
    }

    /// Light-aligned space back to world space
    pub fn to_world_space(&self, aligned: &Vec3) -> Vec3 {
        self.x * aligned.x + self.y * aligned.y + self.z * aligned.z
    }

    /// View matrix looking along the light at the center of `bounds`
    ///
    /// The eye sits one unit in front of the box's min-z face so the
    /// orthographic near plane at distance 1 coincides with that face.
    pub fn view_for(&self, bounds: &LightBounds) -> Mat4 {
        let center = bounds.center();
        let target = self.to_world_space(&center);
        let far_enough = (center.z - bounds.min.z) + NEAR_PLANE_OFFSET;
        let eye = target - self.z * far_enough;
        Mat4::look_at(eye, target, self.y)
    }
}

/// Axis-aligned box in light-aligned space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightBounds {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl LightBounds {
    /// A box that contains nothing; growing it by any point yields that point
    pub fn empty() -> Self {
        Self {
            min: Vec3::repeat(f32::INFINITY),
            max: Vec3::repeat(f32::NEG_INFINITY),
        }
    }

    /// Whether nothing has been added yet
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Grow to contain `point`
    pub fn include_point(&mut self, point: &Vec3) {
        self.min = utils::component_min(&self.min, point);
        self.max = utils::component_max(&self.max, point);
    }

    /// Grow to contain a cube of half-size `radius` around `center`
    pub fn include_sphere(&mut self, center: &Vec3, radius: f32) {
        let extent = Vec3::repeat(radius);
        self.min = utils::component_min(&self.min, &(center - extent));
        self.max = utils::component_max(&self.max, &(center + extent));
    }

    /// Shrink x/y on both sides and z on the far side to `other`
    pub fn trim_to(&mut self, other: &LightBounds) {
        self.min.x = self.min.x.max(other.min.x);
        self.min.y = self.min.y.max(other.min.y);
        self.max.x = self.max.x.min(other.max.x);
        self.max.y = self.max.y.min(other.max.y);
        self.max.z = self.max.z.min(other.max.z);
    }

    /// Box center
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Full size along each axis
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Orthographic projection covering the box as seen from [`LightBasis::view_for`]
    pub fn orthographic(&self) -> Mat4 {
        let size = self.size();
        Mat4::orthographic(size.x, size.y, NEAR_PLANE_OFFSET, NEAR_PLANE_OFFSET + size.z)
    }
}

/// Result of a shadow projection fit
#[derive(Debug, Clone)]
pub struct ShadowProjection {
    /// Light view matrix
    pub view: Mat4,
    /// Orthographic light projection matrix
    pub projection: Mat4,
    /// Final light-aligned box the matrices were built from
    pub bounds: LightBounds,
    /// Number of objects the box was trimmed to (0 = untrimmed frustum box)
    pub caster_count: usize,
}

impl ShadowProjection {
    /// Combined light view-projection (`projection * view`)
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    fn from_bounds(basis: &LightBasis, bounds: LightBounds, caster_count: usize) -> Self {
        Self {
            view: basis.view_for(&bounds),
            projection: bounds.orthographic(),
            bounds,
            caster_count,
        }
    }
}

/// Light-aligned bounding box of the camera frustum
fn camera_frustum_bounds(basis: &LightBasis, camera_view_proj: &Mat4) -> Result<LightBounds, ShadowError> {
    let mut bounds = LightBounds::empty();
    for corner in frustum_corners(camera_view_proj)? {
        bounds.include_point(&basis.to_light_space(&corner));
    }
    Ok(bounds)
}

/// Fit a shadow projection around the whole camera frustum, ignoring scene content
pub fn frustum_shadow_projection(
    light: &Light,
    camera_view: &Mat4,
    camera_proj: &Mat4,
) -> Result<ShadowProjection, ShadowError> {
    let basis = LightBasis::from_light(light)?;
    let bounds = camera_frustum_bounds(&basis, &(camera_proj * camera_view))?;
    Ok(ShadowProjection::from_bounds(&basis, bounds, 0))
}

/// Fit a shadow projection to the camera frustum, trimmed to visible casters
///
/// Objects are considered when they are visible, not pending deletion, have
/// a bounding sphere, and that sphere touches both the camera frustum and the
/// untrimmed light frustum. With no such objects the untrimmed frustum box is
/// used.
pub fn shadow_projection<C: ShadowCaster>(
    objects: &[C],
    light: &Light,
    camera_view: &Mat4,
    camera_proj: &Mat4,
) -> Result<ShadowProjection, ShadowError> {
    let basis = LightBasis::from_light(light)?;
    let camera_view_proj = camera_proj * camera_view;
    let mut bounds = camera_frustum_bounds(&basis, &camera_view_proj)?;

    // Provisional light frustum, only used for culling
    let provisional_view = basis.view_for(&bounds);
    let provisional_proj = bounds.orthographic();
    let light_frustum = FrustumCuller::from_view_proj(&(provisional_proj * provisional_view));
    let camera_frustum = FrustumCuller::from_view_proj(&camera_view_proj);

    let mut object_bounds = LightBounds::empty();
    let mut caster_count = 0;
    for object in objects.iter().filter(|object| object.is_shadow_relevant()) {
        let position = object.position();
        let radius = object.scaled_radius();
        if camera_frustum.contains_sphere(&position, radius)
            && light_frustum.contains_sphere(&position, radius)
        {
            object_bounds.include_sphere(&basis.to_light_space(&position), radius);
            caster_count += 1;
        }
    }

    if caster_count > 0 {
        bounds.trim_to(&object_bounds);
        log::trace!(
            "Shadow box trimmed to {} casters: min {:?} max {:?}",
            caster_count, bounds.min, bounds.max
        );
    } else {
        log::trace!("No shadow casters in view, using untrimmed frustum box");
    }

    Ok(ShadowProjection::from_bounds(&basis, bounds, caster_count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::lighting::LightType;
    use crate::scene::SceneObject;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-3;

    fn camera() -> (Mat4, Mat4) {
        let view = Mat4::look_at(Vec3::new(0.0, 5.0, 20.0), Vec3::zeros(), Vec3::y());
        let proj = Mat4::perspective(utils::deg_to_rad(60.0), 16.0 / 9.0, 1.0, 50.0);
        (view, proj)
    }

    fn sun() -> Light {
        Light::directional(Vec3::new(0.0, -1.0, 0.0), Vec3::repeat(1.0), 1.0)
    }

    fn assert_ordered(bounds: &LightBounds) {
        assert!(bounds.min.x <= bounds.max.x);
        assert!(bounds.min.y <= bounds.max.y);
        assert!(bounds.min.z <= bounds.max.z);
    }

    #[test]
    fn test_non_directional_light_rejected() {
        let (view, proj) = camera();
        let light = Light::point(Vec3::zeros(), Vec3::repeat(1.0), 1.0, 10.0);
        let objects: [SceneObject; 0] = [];

        let result = shadow_projection(&objects, &light, &view, &proj);
        assert_eq!(result.unwrap_err(), ShadowError::UnsupportedLightType(LightType::Point));
    }

    #[test]
    fn test_zero_light_direction_rejected() {
        let (view, proj) = camera();
        let light = Light::directional(Vec3::zeros(), Vec3::repeat(1.0), 1.0);
        let result = frustum_shadow_projection(&light, &view, &proj);
        assert_eq!(result.unwrap_err(), ShadowError::DegenerateLightDirection);
    }

    #[test]
    fn test_empty_scene_uses_frustum_box() {
        let (view, proj) = camera();
        let objects: Vec<SceneObject> = Vec::new();

        let fitted = shadow_projection(&objects, &sun(), &view, &proj).unwrap();
        let untrimmed = frustum_shadow_projection(&sun(), &view, &proj).unwrap();

        assert_eq!(fitted.caster_count, 0);
        assert_eq!(fitted.bounds, untrimmed.bounds);
        assert_ordered(&fitted.bounds);
    }

    #[test]
    fn test_hidden_objects_do_not_trim() {
        let (view, proj) = camera();
        let visible = SceneObject::new(Vec3::zeros(), 1.0);
        let hidden = SceneObject::new(Vec3::new(5.0, 0.0, -10.0), 1.0).with_visible(false);
        let deleted = SceneObject::new(Vec3::new(-6.0, 0.0, -12.0), 1.0).marked_for_deletion();
        let unbounded = SceneObject::new(Vec3::new(3.0, 1.0, -4.0), 1.0).without_bounds();

        let only_visible = shadow_projection(&[visible.clone()], &sun(), &view, &proj).unwrap();
        let mixed = shadow_projection(&[visible, hidden, deleted, unbounded], &sun(), &view, &proj).unwrap();

        assert_eq!(mixed.caster_count, 1);
        assert_eq!(mixed.bounds, only_visible.bounds);
        assert_ordered(&mixed.bounds);

        // Trimmed to the unit sphere at the origin in light x/y
        let size = mixed.bounds.size();
        assert_relative_eq!(size.x, 2.0, epsilon = EPSILON);
        assert_relative_eq!(size.y, 2.0, epsilon = EPSILON);
    }

    #[test]
    fn test_visible_objects_widen_trimmed_box() {
        let (view, proj) = camera();
        let objects = [
            SceneObject::new(Vec3::zeros(), 1.0),
            SceneObject::new(Vec3::new(5.0, 0.0, -10.0), 1.0),
        ];

        let fitted = shadow_projection(&objects, &sun(), &view, &proj).unwrap();
        assert_eq!(fitted.caster_count, 2);
        assert!(fitted.bounds.size().x > 2.0 || fitted.bounds.size().y > 2.0);
        assert_ordered(&fitted.bounds);
    }

    #[test]
    fn test_min_z_never_trimmed() {
        let (view, proj) = camera();
        let objects = [SceneObject::new(Vec3::zeros(), 1.0)];

        let fitted = shadow_projection(&objects, &sun(), &view, &proj).unwrap();
        let untrimmed = frustum_shadow_projection(&sun(), &view, &proj).unwrap();
        let basis = LightBasis::from_light(&sun()).unwrap();

        assert_eq!(fitted.bounds.min.z, untrimmed.bounds.min.z);
        let object_far_z = basis.to_light_space(&Vec3::zeros()).z + 1.0;
        assert_relative_eq!(fitted.bounds.max.z, object_far_z.min(untrimmed.bounds.max.z), epsilon = EPSILON);
    }

    #[test]
    fn test_caster_projects_inside_clip_volume() {
        let (view, proj) = camera();
        let objects = [SceneObject::new(Vec3::new(1.0, 0.5, -2.0), 0.5)];

        let fitted = shadow_projection(&objects, &sun(), &view, &proj).unwrap();
        let clip = fitted.view_projection().project_point(&Vec3::new(1.0, 0.5, -2.0));

        assert!(clip.x.abs() <= 1.0 + EPSILON);
        assert!(clip.y.abs() <= 1.0 + EPSILON);
        assert!(clip.z.abs() <= 1.0 + EPSILON);
    }

    #[test]
    fn test_basis_round_trip() {
        let basis = LightBasis::from_direction(&Vec3::new(-0.3, -1.0, -0.5)).unwrap();
        let point = Vec3::new(3.0, -2.0, 7.5);
        let back = basis.to_world_space(&basis.to_light_space(&point));
        assert_relative_eq!(back, point, epsilon = 1e-4);
    }

    #[test]
    fn test_trim_keeps_order_for_overlapping_boxes() {
        let mut bounds = LightBounds { min: Vec3::new(-5.0, -5.0, -5.0), max: Vec3::new(5.0, 5.0, 5.0) };
        let objects = LightBounds { min: Vec3::new(-1.0, 2.0, -9.0), max: Vec3::new(8.0, 3.0, 1.0) };
        bounds.trim_to(&objects);

        assert_eq!(bounds.min, Vec3::new(-1.0, 2.0, -5.0));
        assert_eq!(bounds.max, Vec3::new(5.0, 3.0, 1.0));
    }
}
