//! Terminal framebuffer: glyph/color grid plus z-buffer.

use super::target::{write_cell, Cell, ClipRect, Fragment, RenderTarget};
use crate::math::Rgb;

/// Grid of cells with a parallel depth buffer initialized to +∞.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
    depth: Vec<f64>,
    clip: ClipRect,
}

impl FrameBuffer {
    /// Create a cleared framebuffer.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::BLANK; width * height],
            depth: vec![f64::INFINITY; width * height],
            clip: ClipRect::full(width, height),
        }
    }

    /// Width in cells.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in cells.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Reset every cell and depth. The clip rectangle is kept.
    pub fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
        self.depth.fill(f64::INFINITY);
    }

    /// Restrict subsequent writes. The rectangle is clamped to the surface.
    pub fn set_clip(&mut self, clip: ClipRect) {
        self.clip = clip.intersect(&ClipRect::full(self.width, self.height));
    }

    /// Allow writes everywhere again.
    pub fn reset_clip(&mut self) {
        self.clip = ClipRect::full(self.width, self.height);
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    /// Cell at a position.
    pub fn cell(&self, x: usize, y: usize) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    /// Stored depth at a position.
    pub fn depth_at(&self, x: usize, y: usize) -> Option<f64> {
        self.index(x, y).map(|i| self.depth[i])
    }

    /// Overwrite a cell and its depth without testing.
    pub fn set(&mut self, x: usize, y: usize, cell: Cell, depth: f64) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = cell;
            self.depth[i] = depth;
        }
    }

    /// All cells, row-major.
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// All depths, row-major.
    #[inline]
    pub fn depths(&self) -> &[f64] {
        &self.depth
    }

    /// Whether the cell at `i` holds something. Blended cells over nothing
    /// have no depth but are still drawn.
    #[inline]
    fn is_covered(&self, i: usize) -> bool {
        self.depth[i].is_finite() || !self.cells[i].is_blank()
    }

    /// Whether the cell at a position holds something.
    pub fn covered_at(&self, x: usize, y: usize) -> bool {
        self.index(x, y).is_some_and(|i| self.is_covered(i))
    }

    /// Number of cells that hold something.
    pub fn covered(&self) -> usize {
        (0..self.cells.len()).filter(|&i| self.is_covered(i)).count()
    }

    /// Glyphs only, rows joined by `\n`.
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for (y, row) in self.cells.chunks(self.width.max(1)).enumerate() {
            if y > 0 {
                out.push('\n');
            }
            out.extend(row.iter().map(|c| c.glyph));
        }
        out
    }

    /// Terminal bytes for the frame: cursor home, rows separated by `\n`,
    /// 24-bit SGR colors in color mode with a reset at the end of each row,
    /// and an optional debug line below the last row.
    pub fn encode(&self, use_color: bool, debug_line: Option<&str>) -> String {
        let mut out = String::with_capacity((self.width * if use_color { 20 } else { 1 } + 8) * self.height + 8);
        out.push_str("\x1b[H");
        for (y, row) in self.cells.chunks(self.width.max(1)).enumerate() {
            if y > 0 {
                out.push('\n');
            }
            if use_color {
                let mut current = None;
                for cell in row {
                    if !cell.is_blank() && current != Some(cell.color) {
                        push_sgr(&mut out, cell.color);
                        current = Some(cell.color);
                    }
                    out.push(cell.glyph);
                }
                out.push_str("\x1b[0m");
            } else {
                out.extend(row.iter().map(|c| c.glyph));
            }
        }
        if let Some(line) = debug_line {
            out.push('\n');
            out.push_str(line);
            out.push_str("\x1b[K");
        }
        out
    }

    /// Split into disjoint `tile_size` x `tile_size` views, row-major by tile.
    /// Each view's clip is its own rectangle intersected with the current clip.
    pub fn split_tiles(&mut self, tile_size: usize) -> Vec<TileView<'_>> {
        let tile_size = tile_size.max(1);
        let (width, height, clip) = (self.width, self.height, self.clip);
        if width == 0 || height == 0 {
            return Vec::new();
        }
        let tiles_x = width.div_ceil(tile_size);
        let tiles_y = height.div_ceil(tile_size);

        let mut tiles: Vec<TileView<'_>> = Vec::with_capacity(tiles_x * tiles_y);
        for ty in 0..tiles_y {
            for tx in 0..tiles_x {
                let rect = ClipRect::new(
                    tx * tile_size,
                    ty * tile_size,
                    ((tx + 1) * tile_size).min(width),
                    ((ty + 1) * tile_size).min(height),
                );
                tiles.push(TileView {
                    rect,
                    clip: rect.intersect(&clip),
                    surface: (width, height),
                    rows: Vec::with_capacity(rect.height()),
                });
            }
        }

        let rows = self.cells.chunks_mut(width).zip(self.depth.chunks_mut(width));
        for (y, (cells, depth)) in rows.enumerate() {
            let base = (y / tile_size) * tiles_x;
            let spans = cells.chunks_mut(tile_size).zip(depth.chunks_mut(tile_size));
            for (tx, span) in spans.enumerate() {
                tiles[base + tx].rows.push(span);
            }
        }
        tiles
    }
}

/// Append a 24-bit foreground color sequence.
#[inline]
fn push_sgr(out: &mut String, c: Rgb) {
    out.push_str(&format!("\x1b[38;2;{};{};{}m", c.r, c.g, c.b));
}

impl RenderTarget for FrameBuffer {
    #[inline]
    fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    #[inline]
    fn clip(&self) -> ClipRect {
        self.clip
    }

    fn plot(&mut self, x: usize, y: usize, depth: f64, fragment: &Fragment) -> bool {
        if !self.clip.contains(x, y) {
            return false;
        }
        let i = y * self.width + x;
        write_cell(&mut self.cells[i], &mut self.depth[i], depth, fragment)
    }
}

/// Mutable window onto one tile of a [`FrameBuffer`].
///
/// Holds only its own rows' slices, so tiles can be handed to different
/// threads without locking.
#[derive(Debug)]
pub struct TileView<'a> {
    rect: ClipRect,
    clip: ClipRect,
    surface: (usize, usize),
    rows: Vec<(&'a mut [Cell], &'a mut [f64])>,
}

impl TileView<'_> {
    /// Pixels owned by this tile.
    #[inline]
    pub fn rect(&self) -> ClipRect {
        self.rect
    }
}

impl RenderTarget for TileView<'_> {
    #[inline]
    fn size(&self) -> (usize, usize) {
        self.surface
    }

    #[inline]
    fn clip(&self) -> ClipRect {
        self.clip
    }

    fn plot(&mut self, x: usize, y: usize, depth: f64, fragment: &Fragment) -> bool {
        if !self.clip.contains(x, y) {
            return false;
        }
        let (cells, depths) = &mut self.rows[y - self.rect.min_y];
        let i = x - self.rect.min_x;
        write_cell(&mut cells[i], &mut depths[i], depth, fragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::FragmentMode;

    #[test]
    fn test_new_is_cleared() {
        let fb = FrameBuffer::new(4, 3);
        assert_eq!(fb.cells().len(), 12);
        assert!(fb.depths().iter().all(|d| *d == f64::INFINITY));
        assert_eq!(fb.covered(), 0);
        assert_eq!(fb.to_text(), "    \n    \n    ");
    }

    #[test]
    fn test_clip_blocks_writes() {
        let mut fb = FrameBuffer::new(4, 4);
        fb.set_clip(ClipRect::new(2, 2, 10, 10));
        let f = Fragment::opaque('#', Rgb::WHITE, 0);
        assert!(!fb.plot(0, 0, 1.0, &f));
        assert!(fb.plot(3, 3, 1.0, &f));
        assert_eq!(fb.clip(), ClipRect::new(2, 2, 4, 4));
    }

    #[test]
    fn test_encode_plain_and_color() {
        let mut fb = FrameBuffer::new(2, 2);
        let red = Fragment::opaque('@', Rgb::new(255, 0, 0), 0);
        fb.plot(0, 0, 1.0, &red);
        fb.plot(1, 0, 1.0, &red);
        assert_eq!(fb.encode(false, None), "\x1b[H@@\n  ");
        let colored = fb.encode(true, Some("dbg"));
        assert_eq!(
            colored,
            "\x1b[H\x1b[38;2;255;0;0m@@\x1b[0m\n  \x1b[0m\ndbg\x1b[K"
        );
    }

    #[test]
    fn test_blend_over_nothing_counts_as_covered() {
        let mut fb = FrameBuffer::new(2, 1);
        let faint = Fragment::opaque('+', Rgb::WHITE, 0).with_mode(FragmentMode::Blend(0.3));
        assert!(fb.plot(1, 0, 2.0, &faint));
        assert_eq!(fb.depth_at(1, 0), Some(f64::INFINITY));
        assert!(fb.covered_at(1, 0));
        assert!(!fb.covered_at(0, 0));
        assert_eq!(fb.covered(), 1);
    }

    #[test]
    fn test_tiles_cover_surface_once() {
        let mut fb = FrameBuffer::new(10, 7);
        let f = Fragment::opaque('x', Rgb::WHITE, 0);
        {
            let mut tiles = fb.split_tiles(4);
            assert_eq!(tiles.len(), 3 * 2);
            for tile in tiles.iter_mut() {
                let r = tile.rect();
                for y in 0..7 {
                    for x in 0..10 {
                        let inside = r.contains(x, y);
                        assert_eq!(tile.plot(x, y, 1.0, &f), inside);
                    }
                }
            }
        }
        assert_eq!(fb.covered(), 70);
    }
}
