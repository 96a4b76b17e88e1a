//! Line segment primitive.

use crate::math::{Aabb, Rgb, Vector3};

/// A line segment drawn with a single glyph and color.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    /// First endpoint.
    pub start: Vector3,
    /// Second endpoint.
    pub end: Vector3,
    /// Stroke color.
    pub color: Rgb,
    /// Stroke glyph; picked from the slope when unset.
    pub glyph: Option<char>,
}

impl Line {
    /// Create a line.
    pub fn new(start: Vector3, end: Vector3, color: Rgb) -> Self {
        Self {
            start,
            end,
            color,
            glyph: None,
        }
    }

    /// Set a fixed glyph.
    pub fn with_glyph(mut self, glyph: char) -> Self {
        self.glyph = Some(glyph);
        self
    }

    /// Bounding box of the endpoints.
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(&[self.start, self.end])
    }

    /// Segment length.
    pub fn length(&self) -> f64 {
        self.start.distance_to(&self.end)
    }
}
