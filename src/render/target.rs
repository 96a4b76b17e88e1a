//! Write targets shared by the rasterizer and the framebuffers.

use crate::math::Rgb;

/// Glyph and color stored per framebuffer cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    /// Character shown in the cell.
    pub glyph: char,
    /// Foreground color.
    pub color: Rgb,
}

impl Cell {
    /// Uncovered cell.
    pub const BLANK: Self = Self {
        glyph: ' ',
        color: Rgb::BLACK,
    };

    /// Create a cell.
    #[inline]
    pub const fn new(glyph: char, color: Rgb) -> Self {
        Self { glyph, color }
    }

    /// Whether nothing has been drawn into the cell.
    #[inline]
    pub fn is_blank(&self) -> bool {
        *self == Self::BLANK
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::BLANK
    }
}

/// Pixel rectangle with exclusive maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ClipRect {
    /// First column.
    pub min_x: usize,
    /// First row.
    pub min_y: usize,
    /// One past the last column.
    pub max_x: usize,
    /// One past the last row.
    pub max_y: usize,
}

impl ClipRect {
    /// Create a rectangle.
    #[inline]
    pub const fn new(min_x: usize, min_y: usize, max_x: usize, max_y: usize) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Rectangle covering a whole `width` x `height` surface.
    #[inline]
    pub const fn full(width: usize, height: usize) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Columns covered.
    #[inline]
    pub fn width(&self) -> usize {
        self.max_x.saturating_sub(self.min_x)
    }

    /// Rows covered.
    #[inline]
    pub fn height(&self) -> usize {
        self.max_y.saturating_sub(self.min_y)
    }

    /// Whether the rectangle covers no pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Whether a pixel lies inside.
    #[inline]
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.min_x && x < self.max_x && y >= self.min_y && y < self.max_y
    }

    /// Overlap of two rectangles, possibly empty.
    pub fn intersect(&self, other: &ClipRect) -> ClipRect {
        let min_x = self.min_x.max(other.min_x);
        let min_y = self.min_y.max(other.min_y);
        ClipRect {
            min_x,
            min_y,
            max_x: self.max_x.min(other.max_x).max(min_x),
            max_y: self.max_y.min(other.max_y).max(min_y),
        }
    }

    /// Whether a floating-point pixel box `[min, max]` touches this rectangle.
    pub fn overlaps(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> bool {
        max_x >= self.min_x as f64
            && min_x < self.max_x as f64
            && max_y >= self.min_y as f64
            && min_y < self.max_y as f64
    }
}

const BAYER_4X4: [[u8; 4]; 4] = [[0, 8, 2, 10], [12, 4, 14, 6], [3, 11, 1, 9], [15, 7, 13, 5]];

/// Ordered-dither threshold in (0, 1) for a pixel.
#[inline]
pub fn bayer_threshold(x: usize, y: usize) -> f64 {
    (BAYER_4X4[y % 4][x % 4] as f64 + 0.5) / 16.0
}

/// How a fragment combines with what is already in the cell.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum FragmentMode {
    /// Replace the cell.
    #[default]
    Opaque,
    /// Mix colors with this coverage. Depth is tested but never written, so
    /// every blended layer over the same solid surface shows through.
    Blend(f64),
    /// Replace the cell where the Bayer threshold is below `alpha`
    /// (or at or above it when `invert` is set).
    Dither {
        /// Coverage.
        alpha: f64,
        /// Use the complementary pattern.
        invert: bool,
    },
}

/// What a primitive writes into each covered cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fragment {
    /// Fill glyph.
    pub glyph: char,
    /// Fill color.
    pub color: Rgb,
    /// Combination rule.
    pub mode: FragmentMode,
    /// Submission order of the primitive's node. Breaks depth ties when
    /// per-worker buffers are merged.
    pub order: usize,
}

impl Fragment {
    /// Opaque fragment.
    #[inline]
    pub fn opaque(glyph: char, color: Rgb, order: usize) -> Self {
        Self {
            glyph,
            color,
            mode: FragmentMode::Opaque,
            order,
        }
    }

    /// Copy with a different mode.
    #[inline]
    pub fn with_mode(mut self, mode: FragmentMode) -> Self {
        self.mode = mode;
        self
    }

    /// Whether the dither pattern lets this fragment touch pixel (`x`, `y`).
    #[inline]
    pub fn covers(&self, x: usize, y: usize) -> bool {
        match self.mode {
            FragmentMode::Dither { alpha, invert } => (bayer_threshold(x, y) < alpha) != invert,
            _ => true,
        }
    }
}

impl FragmentMode {
    /// Whether fragments in this mode mix with the cell instead of replacing it.
    #[inline]
    pub fn is_translucent(&self) -> bool {
        matches!(self, FragmentMode::Blend(_))
    }
}

/// Resolve one fragment against a cell and its depth with a strict less-than
/// test. Returns whether anything changed.
pub fn write_cell(cell: &mut Cell, stored: &mut f64, depth: f64, fragment: &Fragment) -> bool {
    if !(depth.is_finite() && depth > 0.0 && depth < *stored) {
        return false;
    }
    match fragment.mode {
        FragmentMode::Blend(alpha) => {
            let alpha = alpha.clamp(0.0, 1.0);
            if alpha <= 0.0 {
                return false;
            }
            let color = fragment.color.blend(&cell.color, alpha);
            let glyph = if alpha >= 0.5 || cell.is_blank() {
                fragment.glyph
            } else {
                cell.glyph
            };
            *cell = Cell::new(glyph, color);
        }
        FragmentMode::Opaque | FragmentMode::Dither { .. } => {
            *cell = Cell::new(fragment.glyph, fragment.color);
            *stored = depth;
        }
    }
    true
}

/// Anything the rasterizer can draw into.
///
/// Coordinates are always in the full surface's pixel space; a target may
/// only own part of it and rejects writes outside [`RenderTarget::clip`].
pub trait RenderTarget {
    /// Size of the full surface, used for projection.
    fn size(&self) -> (usize, usize);

    /// Writable region.
    fn clip(&self) -> ClipRect;

    /// Depth-tested write of one fragment. Returns whether the cell changed.
    fn plot(&mut self, x: usize, y: usize, depth: f64, fragment: &Fragment) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_intersect() {
        let a = ClipRect::new(0, 0, 10, 10);
        let b = ClipRect::new(5, 8, 20, 20);
        assert_eq!(a.intersect(&b), ClipRect::new(5, 8, 10, 10));
        let c = ClipRect::new(30, 30, 40, 40);
        assert!(a.intersect(&c).is_empty());
    }

    #[test]
    fn test_depth_test_is_strict() {
        let mut cell = Cell::BLANK;
        let mut depth = f64::INFINITY;
        let a = Fragment::opaque('a', Rgb::WHITE, 0);
        let b = Fragment::opaque('b', Rgb::WHITE, 1);
        assert!(write_cell(&mut cell, &mut depth, 2.0, &a));
        assert!(!write_cell(&mut cell, &mut depth, 2.0, &b));
        assert_eq!(cell.glyph, 'a');
        assert!(write_cell(&mut cell, &mut depth, 1.0, &b));
        assert_eq!((cell.glyph, depth), ('b', 1.0));
        assert!(!write_cell(&mut cell, &mut depth, f64::NAN, &a));
        assert!(!write_cell(&mut cell, &mut depth, -1.0, &a));
    }

    #[test]
    fn test_blend_never_writes_depth() {
        let mut cell = Cell::new('x', Rgb::BLACK);
        let mut depth = 5.0;
        let faint = Fragment::opaque('y', Rgb::WHITE, 0).with_mode(FragmentMode::Blend(0.25));
        assert!(write_cell(&mut cell, &mut depth, 2.0, &faint));
        assert_eq!((cell.glyph, depth), ('x', 5.0));
        let strong = faint.with_mode(FragmentMode::Blend(0.75));
        assert!(write_cell(&mut cell, &mut depth, 2.0, &strong));
        assert_eq!((cell.glyph, depth), ('y', 5.0));
        // Still hidden behind nearer solid surfaces.
        assert!(!write_cell(&mut cell, &mut depth, 6.0, &strong));
    }

    #[test]
    fn test_coplanar_blend_layers_both_show() {
        let (red, green, blue) = (Rgb::new(255, 0, 0), Rgb::new(0, 255, 0), Rgb::new(0, 0, 255));
        let mut cell = Cell::BLANK;
        let mut depth = f64::INFINITY;
        write_cell(&mut cell, &mut depth, 5.0, &Fragment::opaque('b', blue, 0));
        let outgoing = Fragment::opaque('r', red, 1).with_mode(FragmentMode::Blend(0.82));
        let incoming = Fragment::opaque('g', green, 1).with_mode(FragmentMode::Blend(0.18));
        assert!(write_cell(&mut cell, &mut depth, 2.0, &outgoing));
        assert!(write_cell(&mut cell, &mut depth, 2.0, &incoming));
        assert!(cell.color.g > 0);
        assert!(cell.color.r > cell.color.g);
        assert_eq!(depth, 5.0);
    }

    #[test]
    fn test_translucent_modes() {
        assert!(FragmentMode::Blend(0.3).is_translucent());
        assert!(!FragmentMode::Opaque.is_translucent());
        assert!(!FragmentMode::Dither { alpha: 0.3, invert: false }.is_translucent());
    }

    #[test]
    fn test_dither_patterns_are_complementary() {
        let f = Fragment::opaque('#', Rgb::WHITE, 0);
        let on = f.with_mode(FragmentMode::Dither { alpha: 0.4, invert: false });
        let off = f.with_mode(FragmentMode::Dither { alpha: 0.4, invert: true });
        let mut drawn = 0;
        for y in 0..4 {
            for x in 0..4 {
                assert_ne!(on.covers(x, y), off.covers(x, y));
                drawn += on.covers(x, y) as usize;
            }
        }
        // Thresholds below 0.4: values 0..=5 of 16.
        assert_eq!(drawn, 6);
    }
}
