//! Frustum geometry
//!
//! Corner extraction and plane-based culling for view frustums described by a
//! combined view-projection matrix (column-vector convention, `proj * view`).

use thiserror::Error;

use crate::foundation::math::{Mat4, Vec3, Vec4};

/// Clip-space cube corners: near face first, then far face, each as
/// (-,-), (-,+), (+,+), (+,-) in x/y.
const HOMOGENEOUS_CORNERS: [[f32; 4]; 8] = [
    [-1.0, -1.0, -1.0, 1.0],
    [-1.0, 1.0, -1.0, 1.0],
    [1.0, 1.0, -1.0, 1.0],
    [1.0, -1.0, -1.0, 1.0],
    [-1.0, -1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0, 1.0],
    [1.0, 1.0, 1.0, 1.0],
    [1.0, -1.0, 1.0, 1.0],
];

/// Frustum geometry errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrustumError {
    /// The view-projection matrix cannot be inverted
    #[error("view-projection matrix is singular")]
    SingularTransform,

    /// A corner unprojected to a point at infinity
    #[error("frustum corner {0} has a degenerate homogeneous w")]
    DegenerateCorner(usize),
}

/// Compute the eight world-space corners of the frustum described by `view_proj`
///
/// Corners come back near face first, then the far face, each ordered
/// (-x,-y), (-x,+y), (+x,+y), (+x,-y) in clip space.
pub fn frustum_corners(view_proj: &Mat4) -> Result<[Vec3; 8], FrustumError> {
    let inverse = view_proj.try_inverse().ok_or(FrustumError::SingularTransform)?;

    let mut corners = [Vec3::zeros(); 8];
    for (index, ndc) in HOMOGENEOUS_CORNERS.iter().enumerate() {
        let world = inverse * Vec4::from_column_slice(ndc);
        if world.w.abs() <= f32::EPSILON || !world.w.is_finite() {
            return Err(FrustumError::DegenerateCorner(index));
        }
        corners[index] = world.xyz() / world.w;
    }

    Ok(corners)
}

/// Plane defined by normal and distance from origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Normal vector (unit length, pointing into the frustum)
    pub normal: Vec3,
    /// Distance from origin along the normal
    pub distance: f32,
}

impl Plane {
    /// Create a plane from raw `ax + by + cz + d` coefficients, normalizing them
    fn from_coefficients(coefficients: Vec4) -> Self {
        let normal = coefficients.xyz();
        let inv_len = 1.0 / normal.norm().max(1e-6);
        Self {
            normal: normal * inv_len,
            distance: coefficients.w * inv_len,
        }
    }

    /// Calculate signed distance from plane to point
    pub fn distance_to_point(&self, point: &Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }
}

/// Six-plane frustum used for sphere visibility tests
#[derive(Debug, Clone)]
pub struct FrustumCuller {
    /// Six planes defining the frustum (left, right, bottom, top, near, far)
    pub planes: [Plane; 6],
}

impl FrustumCuller {
    /// Extract frustum planes from a view-projection matrix (Gribb-Hartmann)
    pub fn from_view_proj(view_proj: &Mat4) -> Self {
        let row = |i: usize| -> Vec4 { view_proj.row(i).transpose() };
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));

        Self {
            planes: [
                Plane::from_coefficients(r3 + r0),
                Plane::from_coefficients(r3 - r0),
                Plane::from_coefficients(r3 + r1),
                Plane::from_coefficients(r3 - r1),
                Plane::from_coefficients(r3 + r2),
                Plane::from_coefficients(r3 - r2),
            ],
        }
    }

    /// A sphere is visible unless it lies entirely behind some plane
    pub fn contains_sphere(&self, center: &Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.distance_to_point(center) >= -radius)
    }

    /// Check if a point is inside the frustum
    pub fn contains_point(&self, point: &Vec3) -> bool {
        self.contains_sphere(point, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Mat4Ext, utils};
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-4;

    #[test]
    fn test_orthographic_corners_match_box() {
        // Looking down -Z from the origin: x in [-2, 2], y in [-1, 1], z in [-1, -9]
        let proj = Mat4::orthographic(4.0, 2.0, 1.0, 9.0);
        let corners = frustum_corners(&proj).unwrap();

        let expected = [
            Vec3::new(-2.0, -1.0, -1.0),
            Vec3::new(-2.0, 1.0, -1.0),
            Vec3::new(2.0, 1.0, -1.0),
            Vec3::new(2.0, -1.0, -1.0),
            Vec3::new(-2.0, -1.0, -9.0),
            Vec3::new(-2.0, 1.0, -9.0),
            Vec3::new(2.0, 1.0, -9.0),
            Vec3::new(2.0, -1.0, -9.0),
        ];
        for (corner, want) in corners.iter().zip(expected.iter()) {
            assert_relative_eq!(*corner, *want, epsilon = EPSILON);
        }
    }

    #[test]
    fn test_perspective_corners_depths() {
        let proj = Mat4::perspective(utils::deg_to_rad(90.0), 1.0, 1.0, 10.0);
        let corners = frustum_corners(&proj).unwrap();

        for corner in &corners[..4] {
            assert_relative_eq!(corner.z, -1.0, epsilon = EPSILON);
            assert_relative_eq!(corner.x.abs(), 1.0, epsilon = EPSILON);
        }
        for corner in &corners[4..] {
            assert_relative_eq!(corner.z, -10.0, epsilon = 1e-2);
            assert_relative_eq!(corner.y.abs(), 10.0, epsilon = 1e-2);
        }
    }

    #[test]
    fn test_singular_transform_reported() {
        let result = frustum_corners(&Mat4::zeros());
        assert_eq!(result, Err(FrustumError::SingularTransform));
    }

    #[test]
    fn test_degenerate_corner_reported() {
        // Invertible, but the inverse's last row is (0, 0, 1, 1): the near
        // face unprojects with w = 0
        let mut view_proj = Mat4::identity();
        view_proj[(3, 2)] = -1.0;

        let result = frustum_corners(&view_proj);
        assert_eq!(result, Err(FrustumError::DegenerateCorner(0)));
    }

    #[test]
    fn test_sphere_containment() {
        let view = Mat4::look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::zeros(), Vec3::y());
        let proj = Mat4::perspective(utils::deg_to_rad(60.0), 1.0, 0.5, 50.0);
        let culler = FrustumCuller::from_view_proj(&(proj * view));

        assert!(culler.contains_point(&Vec3::zeros()));
        assert!(culler.contains_sphere(&Vec3::new(0.0, 0.0, -30.0), 1.0));
        // Behind the camera
        assert!(!culler.contains_sphere(&Vec3::new(0.0, 0.0, 10.0), 1.0));
        // Past the far plane, but the radius reaches back inside
        assert!(!culler.contains_point(&Vec3::new(0.0, 0.0, -46.0)));
        assert!(culler.contains_sphere(&Vec3::new(0.0, 0.0, -46.0), 2.0));
        // Far off to the side
        assert!(!culler.contains_sphere(&Vec3::new(100.0, 0.0, 0.0), 1.0));
    }

    #[test]
    fn test_orthographic_planes_are_axis_aligned() {
        let culler = FrustumCuller::from_view_proj(&Mat4::orthographic(4.0, 2.0, 1.0, 9.0));

        assert!(culler.contains_sphere(&Vec3::new(2.5, 0.0, -5.0), 0.6));
        assert!(!culler.contains_sphere(&Vec3::new(2.5, 0.0, -5.0), 0.4));
        assert!(!culler.contains_sphere(&Vec3::new(0.0, 0.0, -0.5), 0.4));
    }
}
