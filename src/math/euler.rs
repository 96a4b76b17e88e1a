//! Euler angles.

use super::{Matrix4, Quaternion};
use serde::{Deserialize, Serialize};
use std::ops::{Add, Neg};

/// Rotation as pitch (X), yaw (Y) and roll (Z) in radians.
///
/// Applied as `Ry(yaw) * Rx(pitch) * Rz(roll)`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Euler {
    /// Rotation around X axis in radians.
    pub pitch: f64,
    /// Rotation around Y axis in radians.
    pub yaw: f64,
    /// Rotation around Z axis in radians.
    pub roll: f64,
}

impl Euler {
    /// Zero rotation.
    pub const ZERO: Self = Self { pitch: 0.0, yaw: 0.0, roll: 0.0 };

    /// Create new Euler angles.
    #[inline]
    pub const fn new(pitch: f64, yaw: f64, roll: f64) -> Self {
        Self { pitch, yaw, roll }
    }

    /// Create from degrees.
    pub fn from_degrees(pitch: f64, yaw: f64, roll: f64) -> Self {
        Self::new(pitch.to_radians(), yaw.to_radians(), roll.to_radians())
    }

    /// Rotation matrix for these angles.
    #[inline]
    pub fn to_matrix4(&self) -> Matrix4 {
        Matrix4::from_euler(self)
    }

    /// Quaternion for these angles.
    #[inline]
    pub fn to_quaternion(&self) -> Quaternion {
        Quaternion::from_euler(self)
    }

    /// Check if approximately equal.
    #[inline]
    pub fn approx_eq(&self, other: &Euler, epsilon: f64) -> bool {
        (self.pitch - other.pitch).abs() < epsilon
            && (self.yaw - other.yaw).abs() < epsilon
            && (self.roll - other.roll).abs() < epsilon
    }
}

impl Add for Euler {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.pitch + rhs.pitch, self.yaw + rhs.yaw, self.roll + rhs.roll)
    }
}

impl Neg for Euler {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.pitch, -self.yaw, -self.roll)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vector3;

    #[test]
    fn test_degrees() {
        let e = Euler::from_degrees(90.0, 0.0, 0.0);
        assert!((e.pitch - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_matrix_and_quaternion_agree() {
        let e = Euler::new(0.3, -1.1, 0.7);
        let v = Vector3::new(0.2, 1.0, -3.0);
        let a = e.to_matrix4().transform_direction(&v);
        let b = e.to_quaternion().rotate_vector(&v);
        assert!(a.approx_eq(&b, 1e-9));
    }
}
