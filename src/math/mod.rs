//! # Math Module
//!
//! 3D mathematics for the renderer: 64-bit vectors, matrices, quaternions
//! and the bounding volumes used for culling, picking and spatial indexing.
//!
//! The coordinate system is left-handed: +X right, +Y up, +Z forward.
//! Conversions to and from `glam`'s double-precision types are provided.

mod vector3;
mod matrix4;
mod quaternion;
mod euler;
mod color;
mod ray;
mod plane;
mod sphere;
mod aabb;
mod obb;
mod frustum;
mod triangle;

pub use vector3::Vector3;
pub use matrix4::Matrix4;
pub use quaternion::Quaternion;
pub use euler::Euler;
pub use color::{Color, Rgb};
pub use ray::{Ray, TriangleHit, RAY_EPSILON};
pub use plane::Plane;
pub use sphere::Sphere;
pub use aabb::Aabb;
pub use obb::Obb;
pub use frustum::Frustum;
pub use triangle::Triangle;

/// Common math constants.
pub mod consts {
    /// Pi constant.
    pub const PI: f64 = std::f64::consts::PI;
    /// Degrees to radians conversion factor.
    pub const DEG2RAD: f64 = PI / 180.0;
    /// Radians to degrees conversion factor.
    pub const RAD2DEG: f64 = 180.0 / PI;
    /// Small epsilon for floating point comparisons.
    pub const EPSILON: f64 = 1e-9;
}

/// Clamp a value between min and max.
#[inline]
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

/// Linear interpolation between two values.
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Quadratic ease-in-out on `t` in [0, 1].
#[inline]
pub fn ease_in_out_quad(t: f64) -> f64 {
    let t = clamp(t, 0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ease_endpoints_and_midpoint() {
        assert_eq!(ease_in_out_quad(0.0), 0.0);
        assert_eq!(ease_in_out_quad(1.0), 1.0);
        assert!((ease_in_out_quad(0.5) - 0.5).abs() < 1e-12);
        assert!((ease_in_out_quad(0.25) - 0.125).abs() < 1e-12);
    }
}
