//! Lighting: point lights and the shading model used by the rasterizer.

mod lighting;
mod point;

pub use lighting::{
    glyph_for_brightness, ramp_level, LightingSystem, Shade, AO_MAX, AO_MIN, BACKGROUND_GLYPH,
    GLYPH_RAMP, SOLID_GLYPH,
};
pub use point::PointLight;
