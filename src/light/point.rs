//! Point light (omni-directional).

use crate::math::{Color, Vector3};
use serde::{Deserialize, Serialize};

/// Point light emitting in all directions from a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    /// Light position.
    pub position: Vector3,
    /// Light color.
    pub color: Color,
    /// Light intensity.
    pub intensity: f64,
    /// Disabled lights contribute nothing.
    pub enabled: bool,
}

impl Default for PointLight {
    fn default() -> Self {
        Self::new(Vector3::ZERO, Color::WHITE, 1.0)
    }
}

impl PointLight {
    /// Create a new enabled point light.
    pub fn new(position: Vector3, color: Color, intensity: f64) -> Self {
        Self {
            position,
            color,
            intensity,
            enabled: true,
        }
    }

    /// Set the light position.
    pub fn set_position(&mut self, position: Vector3) {
        self.position = position;
    }
}
