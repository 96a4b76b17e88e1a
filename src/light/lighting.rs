//! Per-triangle Phong / Blinn-Phong shading.

use super::PointLight;
use crate::material::Material;
use crate::math::{Color, Rgb, Vector3};

/// Brightness ramp, darkest first.
pub const GLYPH_RAMP: [char; 9] = ['.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Glyph used for every covered cell in color mode.
pub const SOLID_GLYPH: char = '█';

/// Glyph of an uncovered cell.
pub const BACKGROUND_GLYPH: char = ' ';

/// Ambient occlusion factor for surfaces facing straight down.
pub const AO_MIN: f64 = 0.5;

/// Ambient occlusion factor for surfaces facing straight up.
pub const AO_MAX: f64 = 1.0;

/// Ramp glyph for a brightness in 0.0-1.0.
pub fn glyph_for_brightness(brightness: f64) -> char {
    let b = if brightness.is_finite() { brightness.clamp(0.0, 1.0) } else { 0.0 };
    GLYPH_RAMP[(b * (GLYPH_RAMP.len() - 1) as f64).round() as usize]
}

/// Position of a glyph on the ramp.
pub fn ramp_level(glyph: char) -> Option<usize> {
    GLYPH_RAMP.iter().position(|&g| g == glyph)
}

/// Result of shading one triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shade {
    /// Final 8-bit color.
    pub color: Rgb,
    /// Fill glyph.
    pub glyph: char,
    /// Luminance of the final color.
    pub brightness: f64,
}

/// Lights, ambient term and viewer position used to shade surfaces.
#[derive(Debug, Clone)]
pub struct LightingSystem {
    lights: Vec<PointLight>,
    /// Global ambient color.
    pub ambient_color: Color,
    /// Global ambient intensity.
    pub ambient_intensity: f64,
    /// Viewer position used for view vectors and culling.
    pub camera_position: Vector3,
    /// Use the halfway vector for highlights instead of the reflection vector.
    pub blinn_phong: bool,
    /// Constant, linear and quadratic attenuation terms.
    pub attenuation: (f64, f64, f64),
}

impl Default for LightingSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl LightingSystem {
    /// No lights, white ambient at full intensity, Blinn-Phong highlights.
    pub fn new() -> Self {
        Self {
            lights: Vec::new(),
            ambient_color: Color::WHITE,
            ambient_intensity: 1.0,
            camera_position: Vector3::ZERO,
            blinn_phong: true,
            attenuation: (1.0, 0.09, 0.032),
        }
    }

    /// Add a light and return its index.
    pub fn add_light(&mut self, light: PointLight) -> usize {
        self.lights.push(light);
        self.lights.len() - 1
    }

    /// All lights.
    #[inline]
    pub fn lights(&self) -> &[PointLight] {
        &self.lights
    }

    /// All lights, mutable.
    #[inline]
    pub fn lights_mut(&mut self) -> &mut [PointLight] {
        &mut self.lights
    }

    /// Remove every light.
    pub fn clear_lights(&mut self) {
        self.lights.clear();
    }

    /// Set the ambient term.
    pub fn set_ambient(&mut self, color: Color, intensity: f64) {
        self.ambient_color = color;
        self.ambient_intensity = intensity;
    }

    /// `1 / (c + l·d + q·d²)`.
    #[inline]
    pub fn attenuate(&self, distance: f64) -> f64 {
        let (c, l, q) = self.attenuation;
        let denom = c + l * distance + q * distance * distance;
        if denom > 0.0 { 1.0 / denom } else { 1.0 }
    }

    /// Normal as seen from the camera: `None` when the surface faces away and
    /// the material is single-sided, flipped when double-sided.
    pub fn facing_normal(&self, normal: Vector3, point: &Vector3, material: &Material) -> Option<Vector3> {
        let view_dir = (self.camera_position - *point).normalized();
        if normal.dot(&view_dir) >= 0.0 {
            Some(normal)
        } else if material.double_sided {
            Some(-normal)
        } else {
            None
        }
    }

    /// Linear surface color at `point` for a camera-facing unit `normal`, clamped to 1.
    pub fn illuminate(&self, point: &Vector3, normal: &Vector3, material: &Material) -> Color {
        let base = Color::from(material.diffuse);
        let specular_color = Color::from(material.specular);

        // Map n·up from [-1, 1] to [AO_MIN, AO_MAX].
        let ao = AO_MIN + (normal.dot(&Vector3::UP) + 1.0) * 0.5 * (AO_MAX - AO_MIN);
        let mut color = base * self.ambient_color * (self.ambient_intensity * material.ambient_strength * ao);

        let view_dir = (self.camera_position - *point).normalized();
        for light in self.lights.iter().filter(|l| l.enabled) {
            let to_light = light.position - *point;
            let distance = to_light.length();
            let l = to_light.normalized();
            let n_dot_l = normal.dot(&l);
            if n_dot_l <= 0.0 {
                continue;
            }
            let radiance = light.color * (light.intensity * self.attenuate(distance));
            let diffuse = base * radiance * n_dot_l;

            let spec_angle = if self.blinn_phong {
                normal.dot(&(l + view_dir).normalized())
            } else {
                (-l).reflect(normal).dot(&view_dir)
            };
            let spec = spec_angle.max(0.0).powf(material.shininess) * material.specular_strength;
            let specular = specular_color * radiance * spec;

            color += diffuse + specular;
        }
        color.clamp()
    }

    /// Shade a world-space triangle once at its centroid.
    ///
    /// Returns `None` when it is back-facing on a single-sided material.
    pub fn shade(
        &self,
        vertices: &[Vector3; 3],
        normal: Vector3,
        material: &Material,
        glyph: Option<char>,
        use_color: bool,
    ) -> Option<Shade> {
        let centroid = (vertices[0] + vertices[1] + vertices[2]) / 3.0;
        let normal = self.facing_normal(normal, &centroid, material)?;
        let lit = self.illuminate(&centroid, &normal, material);
        let color = lit.to_rgb();
        let brightness = lit.luminance();
        let glyph = glyph.unwrap_or(if use_color {
            SOLID_GLYPH
        } else {
            glyph_for_brightness(brightness)
        });
        Some(Shade { color, glyph, brightness })
    }
}
