//! Phong-style material parameters.

use crate::math::Rgb;
use serde::{Deserialize, Serialize};

/// Surface description consumed by the lighting system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Base color.
    pub diffuse: Rgb,
    /// Highlight color.
    pub specular: Rgb,
    /// Specular exponent.
    pub shininess: f64,
    /// Scale applied to the specular term.
    pub specular_strength: f64,
    /// Scale applied to the ambient term.
    pub ambient_strength: f64,
    /// Draw edges only.
    pub wireframe: bool,
    /// Edge color in wireframe mode.
    pub wireframe_color: Rgb,
    /// Shade back faces with the flipped normal instead of culling them.
    pub double_sided: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            diffuse: Rgb::new(200, 200, 200),
            specular: Rgb::WHITE,
            shininess: 32.0,
            specular_strength: 0.5,
            ambient_strength: 0.2,
            wireframe: false,
            wireframe_color: Rgb::WHITE,
            double_sided: false,
        }
    }
}

impl Material {
    /// Default material with a diffuse color.
    pub fn new(diffuse: Rgb) -> Self {
        Self {
            diffuse,
            ..Self::default()
        }
    }

    /// Set specular color and exponent.
    pub fn with_specular(mut self, specular: Rgb, shininess: f64) -> Self {
        self.specular = specular;
        self.shininess = shininess;
        self
    }

    /// Set specular strength.
    pub fn with_specular_strength(mut self, strength: f64) -> Self {
        self.specular_strength = strength;
        self
    }

    /// Set ambient strength.
    pub fn with_ambient_strength(mut self, strength: f64) -> Self {
        self.ambient_strength = strength;
        self
    }

    /// Enable wireframe drawing with an edge color.
    pub fn with_wireframe(mut self, color: Rgb) -> Self {
        self.wireframe = true;
        self.wireframe_color = color;
        self
    }

    /// Make the material double-sided.
    pub fn with_double_sided(mut self, double_sided: bool) -> Self {
        self.double_sided = double_sided;
        self
    }
}
