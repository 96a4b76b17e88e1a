//! View frustum implementation for culling.

use super::{Aabb, Matrix4, Plane, Sphere, Vector3};
use serde::{Deserialize, Serialize};

/// A view frustum defined by 6 inward-facing planes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frustum {
    /// The six planes of the frustum.
    /// Order: left, right, bottom, top, near, far
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Create a new frustum from 6 planes.
    #[inline]
    pub const fn new(planes: [Plane; 6]) -> Self {
        Self { planes }
    }

    /// View-space frustum for full fields of view in degrees. The camera looks down +Z.
    pub fn from_perspective(fov_x: f64, fov_y: f64, near: f64, far: f64) -> Self {
        let fx = 1.0 / (fov_x.to_radians() * 0.5).tan();
        let fy = 1.0 / (fov_y.to_radians() * 0.5).tan();
        let side = |nx: f64, ny: f64| Plane::new(Vector3::new(nx, ny, 1.0).normalized(), 0.0);
        Self {
            planes: [
                side(fx, 0.0),
                side(-fx, 0.0),
                side(0.0, fy),
                side(0.0, -fy),
                Plane::new(Vector3::UNIT_Z, -near),
                Plane::new(-Vector3::UNIT_Z, far),
            ],
        }
    }

    /// Move every plane by an affine matrix (e.g. view space to world space).
    pub fn transformed(&self, m: &Matrix4) -> Self {
        let normal_matrix = m.inverse().transposed();
        let planes = self.planes.map(|p| {
            let point = m.transform_point(&(p.normal * -p.constant));
            let normal = normal_matrix.transform_direction(&p.normal);
            Plane::from_normal_and_point(normal, &point)
        });
        Self { planes }
    }

    /// Check if a point is inside the frustum.
    pub fn contains_point(&self, point: &Vector3) -> bool {
        self.planes.iter().all(|p| p.distance_to_point(point) >= 0.0)
    }

    /// Check if a sphere intersects the frustum. May over-include near corners.
    pub fn intersects_sphere(&self, sphere: &Sphere) -> bool {
        self.planes
            .iter()
            .all(|p| p.distance_to_point(&sphere.center) >= -sphere.radius)
    }

    /// Check if a box intersects the frustum.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        self.planes.iter().all(|plane| {
            // Corner furthest along the plane normal.
            let p = Vector3::new(
                if plane.normal.x > 0.0 { aabb.max.x } else { aabb.min.x },
                if plane.normal.y > 0.0 { aabb.max.y } else { aabb.min.y },
                if plane.normal.z > 0.0 { aabb.max.z } else { aabb.min.z },
            );
            plane.distance_to_point(&p) >= 0.0
        })
    }

    /// Get the near plane.
    #[inline]
    pub fn near(&self) -> &Plane {
        &self.planes[4]
    }

    /// Get the far plane.
    #[inline]
    pub fn far(&self) -> &Plane {
        &self.planes[5]
    }
}
