//! Parallel-split (cascaded) shadow maps
//!
//! Based on GPU Gems 3, chapter 10: split the camera depth range with the
//! practical split scheme, fit one light projection per split, and place
//! each split's output in one quadrant of a shared shadow atlas.
//!
//! # Practical split scheme
//!
//! For split `i` of `n`, with `ratio = (i + 1) / n`:
//! - logarithmic: `near * (far / near)^ratio`
//! - uniform: `near + (far - near) * ratio`
//! - split far edge: `blend * logarithmic + (1 - blend) * uniform`
//!
//! Each split starts where the previous one ended.

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::{Mat4, Mat4Ext};
use crate::render::lighting::Light;
use crate::scene::ShadowCaster;

use super::config::ShadowConfig;
use super::projection::{frustum_shadow_projection, shadow_projection, LightBounds};
use super::ShadowError;

/// Maximum supported cascade count (one per atlas quadrant)
pub const MAX_CASCADES: usize = 4;

/// Atlas quadrant offsets in NDC, indexed by split
const CROP_OFFSETS: [(f32, f32); MAX_CASCADES] = [
    (-0.5, -0.5),
    (0.5, -0.5),
    (-0.5, 0.5),
    (0.5, 0.5),
];

/// Crop transform scaling NDC x/y by half and moving it into quadrant `index`
///
/// Returns `None` past the end of the quadrant table.
pub fn crop_matrix(index: usize) -> Option<Mat4> {
    let (offset_x, offset_y) = *CROP_OFFSETS.get(index)?;
    Some(Mat4::new(
        0.5, 0.0, 0.0, offset_x,
        0.0, 0.5, 0.0, offset_y,
        0.0, 0.0, 1.0, 0.0,
        0.0, 0.0, 0.0, 1.0,
    ))
}

/// Camera parameters the splits are derived from
#[derive(Debug, Clone)]
pub struct SplitCamera {
    /// Camera view matrix
    pub view: Mat4,
    /// Vertical field of view in radians
    pub fov_y: f32,
    /// Aspect ratio (width / height)
    pub aspect: f32,
    /// Near plane distance
    pub near: f32,
    /// Far plane distance
    pub far: f32,
}

impl SplitCamera {
    /// Perspective projection limited to `[near, far)`
    pub fn projection_for(&self, near: f32, far: f32) -> Mat4 {
        Mat4::perspective(self.fov_y, self.aspect, near, far)
    }
}

/// Compute the far edge of every split
///
/// The last edge is exactly `far`, so consecutive `[previous, edge)` ranges
/// starting at `near` cover the whole camera range.
pub fn split_depths(near: f32, far: f32, count: usize, blend: f32) -> Result<Vec<f32>, ShadowError> {
    if count == 0 || count > MAX_CASCADES {
        return Err(ShadowError::InvalidSplitCount { count, max: MAX_CASCADES });
    }
    if !(near > 0.0 && far > near && far.is_finite()) {
        return Err(ShadowError::InvalidDepthRange { near, far });
    }

    let blend = if (0.0..=1.0).contains(&blend) {
        blend
    } else {
        log::warn!("Split blend {} outside [0, 1], clamping", blend);
        blend.clamp(0.0, 1.0)
    };

    let mut depths: Vec<f32> = (0..count)
        .map(|i| {
            let ratio = (i + 1) as f32 / count as f32;
            let logarithmic = near * (far / near).powf(ratio);
            let uniform = near + (far - near) * ratio;
            blend * logarithmic + (1.0 - blend) * uniform
        })
        .collect();

    if let Some(last) = depths.last_mut() {
        *last = far;
    }
    Ok(depths)
}

/// One cascade's depth range and light matrices
#[derive(Debug, Clone)]
pub struct ShadowSplit {
    /// Near edge of the split in camera depth
    pub near: f32,
    /// Far edge of the split in camera depth
    pub far: f32,
    /// Light view matrix
    pub view: Mat4,
    /// Light orthographic projection
    pub projection: Mat4,
    /// Atlas crop applied after the projection
    pub crop: Mat4,
    /// Light-aligned box the projection was fit to
    pub bounds: LightBounds,
    /// Objects the box was trimmed to
    pub caster_count: usize,
}

impl ShadowSplit {
    /// `crop * projection * view`, ready for the shadow pass and shader lookup
    pub fn view_proj_crop(&self) -> Mat4 {
        self.crop * self.projection * self.view
    }
}

/// Result of a cascade computation
#[derive(Debug, Clone, Default)]
pub struct ShadowCascades {
    /// Splits ordered from nearest to farthest
    pub splits: Vec<ShadowSplit>,
}

impl ShadowCascades {
    /// Number of splits
    pub fn len(&self) -> usize {
        self.splits.len()
    }

    /// Whether there are no splits
    pub fn is_empty(&self) -> bool {
        self.splits.is_empty()
    }

    /// Far edge of every split, as exported to shaders
    pub fn split_depths(&self) -> Vec<f32> {
        self.splits.iter().map(|split| split.far).collect()
    }

    /// Combined `crop * projection * view` of every split
    pub fn view_proj_crops(&self) -> Vec<Mat4> {
        self.splits.iter().map(ShadowSplit::view_proj_crop).collect()
    }

    /// Split index for a camera depth, mirroring the shader-side selection
    ///
    /// Depths past the last split map to the last split.
    pub fn cascade_for_depth(&self, depth: f32) -> Option<usize> {
        if self.splits.is_empty() {
            return None;
        }
        let index = self
            .splits
            .iter()
            .position(|split| depth < split.far)
            .unwrap_or(self.splits.len() - 1);
        Some(index)
    }

    /// Pack matrices and split depths into a GPU uniform block
    pub fn to_uniforms(&self) -> CascadeUniforms {
        let mut uniforms = CascadeUniforms::zeroed();
        for (index, split) in self.splits.iter().take(MAX_CASCADES).enumerate() {
            uniforms.view_proj_crop[index] = split.view_proj_crop().into();
            uniforms.split_depths[index] = split.far;
        }
        uniforms.split_count = self.splits.len().min(MAX_CASCADES) as u32;
        uniforms
    }
}

/// Shadow cascade uniform data
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CascadeUniforms {
    /// Column-major `crop * projection * view` per split
    pub view_proj_crop: [[[f32; 4]; 4]; MAX_CASCADES],
    /// Far edge of each split in camera depth
    pub split_depths: [f32; MAX_CASCADES],
    /// Number of valid splits
    pub split_count: u32,
    /// Padding for alignment
    pub _padding: [u32; 3],
}

/// Compute one trimmed shadow projection per camera depth split
///
/// Split `i` covers `[far_{i-1}, far_i)` with `far_{-1} = camera.near`.
pub fn parallel_split_projections<C: ShadowCaster>(
    objects: &[C],
    light: &Light,
    camera: &SplitCamera,
    config: &ShadowConfig,
) -> Result<ShadowCascades, ShadowError> {
    let depths = split_depths(camera.near, camera.far, config.split_count, config.split_blend)?;

    let mut splits = Vec::with_capacity(depths.len());
    let mut near = camera.near;
    for (index, &far) in depths.iter().enumerate() {
        let camera_proj = camera.projection_for(near, far);
        let fitted = if config.fit_to_casters {
            shadow_projection(objects, light, &camera.view, &camera_proj)?
        } else {
            frustum_shadow_projection(light, &camera.view, &camera_proj)?
        };
        let crop = crop_matrix(index).ok_or(ShadowError::InvalidSplitCount {
            count: depths.len(),
            max: MAX_CASCADES,
        })?;

        log::trace!(
            "Shadow split {}: [{:.3}, {:.3}) with {} casters",
            index, near, far, fitted.caster_count
        );

        splits.push(ShadowSplit {
            near,
            far,
            view: fitted.view,
            projection: fitted.projection,
            crop,
            bounds: fitted.bounds,
            caster_count: fitted.caster_count,
        });
        near = far;
    }

    Ok(ShadowCascades { splits })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{utils, Vec3};
    use crate::render::lighting::LightType;
    use crate::scene::SceneObject;
    use approx::assert_relative_eq;

    fn camera() -> SplitCamera {
        SplitCamera {
            view: Mat4::look_at(Vec3::new(0.0, 10.0, 30.0), Vec3::zeros(), Vec3::y()),
            fov_y: utils::deg_to_rad(60.0),
            aspect: 16.0 / 9.0,
            near: 0.5,
            far: 200.0,
        }
    }

    fn scene() -> Vec<SceneObject> {
        vec![
            SceneObject::new(Vec3::zeros(), 2.0),
            SceneObject::new(Vec3::new(10.0, 0.0, -20.0), 3.0),
            SceneObject::new(Vec3::new(-15.0, 1.0, -80.0), 4.0),
            SceneObject::new(Vec3::new(0.0, 0.0, -150.0), 5.0).with_visible(false),
        ]
    }

    #[test]
    fn test_split_depths_cover_range() {
        for count in 1..=MAX_CASCADES {
            let depths = split_depths(0.5, 200.0, count, 0.992).unwrap();
            assert_eq!(depths.len(), count);
            assert_eq!(*depths.last().unwrap(), 200.0);

            let mut previous = 0.5;
            for depth in &depths {
                assert!(*depth > previous, "split depths must increase: {:?}", depths);
                previous = *depth;
            }
        }
    }

    #[test]
    fn test_split_blend_extremes() {
        let uniform = split_depths(1.0, 100.0, 4, 0.0).unwrap();
        assert_relative_eq!(uniform[0], 25.75, epsilon = 1e-4);
        assert_relative_eq!(uniform[1], 50.5, epsilon = 1e-4);

        let logarithmic = split_depths(1.0, 100.0, 2, 1.0).unwrap();
        assert_relative_eq!(logarithmic[0], 10.0, epsilon = 1e-4);
        assert_eq!(logarithmic[1], 100.0);
    }

    #[test]
    fn test_invalid_split_requests() {
        assert_eq!(
            split_depths(0.5, 200.0, 0, 0.5),
            Err(ShadowError::InvalidSplitCount { count: 0, max: MAX_CASCADES })
        );
        assert_eq!(
            split_depths(0.5, 200.0, 5, 0.5),
            Err(ShadowError::InvalidSplitCount { count: 5, max: MAX_CASCADES })
        );
        assert!(matches!(
            split_depths(0.0, 200.0, 2, 0.5),
            Err(ShadowError::InvalidDepthRange { .. })
        ));
        assert!(matches!(
            split_depths(10.0, 5.0, 2, 0.5),
            Err(ShadowError::InvalidDepthRange { .. })
        ));
    }

    #[test]
    fn test_cascades_are_contiguous() {
        let cascades = parallel_split_projections(&scene(), &Light::default(), &camera(), &ShadowConfig::default()).unwrap();
        assert_eq!(cascades.len(), MAX_CASCADES);
        assert_eq!(cascades.splits[0].near, 0.5);
        assert_eq!(cascades.splits.last().unwrap().far, 200.0);

        for pair in cascades.splits.windows(2) {
            assert_eq!(pair[0].far, pair[1].near);
            assert!(pair[0].far < pair[1].far);
        }
        for split in &cascades.splits {
            assert!(split.bounds.min.x <= split.bounds.max.x);
            assert!(split.bounds.min.y <= split.bounds.max.y);
            assert!(split.bounds.min.z <= split.bounds.max.z);
        }
    }

    #[test]
    fn test_split_matrix_composition() {
        let cascades = parallel_split_projections(&scene(), &Light::default(), &camera(), &ShadowConfig::default()).unwrap();
        let matrices = cascades.view_proj_crops();

        for (index, split) in cascades.splits.iter().enumerate() {
            let expected = crop_matrix(index).unwrap() * split.projection * split.view;
            assert_relative_eq!(matrices[index], expected, epsilon = 1e-5);
        }
        assert_eq!(cascades.split_depths(), cascades.splits.iter().map(|s| s.far).collect::<Vec<_>>());
    }

    #[test]
    fn test_untrimmed_config_ignores_objects() {
        let config = ShadowConfig { fit_to_casters: false, ..ShadowConfig::default() };
        let cascades = parallel_split_projections(&scene(), &Light::default(), &camera(), &config).unwrap();
        assert!(cascades.splits.iter().all(|split| split.caster_count == 0));
    }

    #[test]
    fn test_non_directional_light_fails_cascade() {
        let light = Light::spot(Vec3::zeros(), Vec3::new(0.0, -1.0, 0.0), Vec3::repeat(1.0), 1.0, 10.0);
        let result = parallel_split_projections(&scene(), &light, &camera(), &ShadowConfig::default());
        assert_eq!(result.unwrap_err(), ShadowError::UnsupportedLightType(LightType::Spot));
    }

    #[test]
    fn test_crop_matrices_map_to_quadrants() {
        let quadrants: [((f32, f32), (f32, f32)); MAX_CASCADES] = [
            ((-1.0, -1.0), (0.0, 0.0)),
            ((0.0, -1.0), (1.0, 0.0)),
            ((-1.0, 0.0), (0.0, 1.0)),
            ((0.0, 0.0), (1.0, 1.0)),
        ];

        for (index, (low, high)) in quadrants.iter().enumerate() {
            let crop = crop_matrix(index).unwrap();
            let min = crop.project_point(&Vec3::new(-1.0, -1.0, 0.25));
            let max = crop.project_point(&Vec3::new(1.0, 1.0, 0.25));
            assert_relative_eq!(min.x, low.0);
            assert_relative_eq!(min.y, low.1);
            assert_relative_eq!(max.x, high.0);
            assert_relative_eq!(max.y, high.1);
            assert_relative_eq!(max.z, 0.25);
        }
        assert!(crop_matrix(MAX_CASCADES).is_none());
    }

    #[test]
    fn test_cascade_for_depth() {
        let cascades = parallel_split_projections(&scene(), &Light::default(), &camera(), &ShadowConfig::default()).unwrap();
        let depths = cascades.split_depths();

        assert_eq!(cascades.cascade_for_depth(0.6), Some(0));
        assert_eq!(cascades.cascade_for_depth(depths[0]), Some(1));
        assert_eq!(cascades.cascade_for_depth(depths[2] - 0.01), Some(2));
        assert_eq!(cascades.cascade_for_depth(1000.0), Some(3));
        assert_eq!(ShadowCascades::default().cascade_for_depth(1.0), None);
    }

    #[test]
    fn test_uniform_packing() {
        let config = ShadowConfig { split_count: 3, ..ShadowConfig::default() };
        let cascades = parallel_split_projections(&scene(), &Light::default(), &camera(), &config).unwrap();
        let uniforms = cascades.to_uniforms();

        assert_eq!(uniforms.split_count, 3);
        assert_eq!(uniforms.split_depths[2], 200.0);
        assert_eq!(uniforms.split_depths[3], 0.0);
        let first: [[f32; 4]; 4] = cascades.splits[0].view_proj_crop().into();
        assert_eq!(uniforms.view_proj_crop[0], first);
        assert_eq!(bytemuck::bytes_of(&uniforms).len(), std::mem::size_of::<CascadeUniforms>());
    }
}
