//! Per-worker scratch surfaces for job-parallel rendering.

use super::framebuffer::FrameBuffer;
use super::target::{write_cell, Cell, ClipRect, Fragment, RenderTarget};

/// Full-size private surface for one worker.
///
/// Besides depth it remembers which draw order wrote each cell, so that
/// merging several scratch buffers picks the same winner a sequential render
/// would: the closest fragment, and among equal depths the earliest one.
/// Only solid fragments belong here; blends need the merged frame behind
/// them and are drawn after [`ScratchBuffer::resolve_into`].
#[derive(Debug, Clone)]
pub struct ScratchBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
    depth: Vec<f64>,
    order: Vec<usize>,
    clip: ClipRect,
}

impl ScratchBuffer {
    /// Create a cleared scratch buffer.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::BLANK; width * height],
            depth: vec![f64::INFINITY; width * height],
            order: vec![usize::MAX; width * height],
            clip: ClipRect::full(width, height),
        }
    }

    /// Restrict writes, mirroring the target framebuffer's clip.
    pub fn set_clip(&mut self, clip: ClipRect) {
        self.clip = clip.intersect(&ClipRect::full(self.width, self.height));
    }

    /// Reset to empty.
    pub fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
        self.depth.fill(f64::INFINITY);
        self.order.fill(usize::MAX);
    }

    #[inline]
    fn wins(depth: f64, order: usize, cur_depth: f64, cur_order: usize) -> bool {
        depth < cur_depth || (depth == cur_depth && order < cur_order)
    }

    /// Fold another scratch buffer into this one, cell by cell.
    pub fn merge_from(&mut self, other: &ScratchBuffer) {
        let cells = self.cells.iter_mut().zip(other.cells.iter());
        let depth = self.depth.iter_mut().zip(other.depth.iter());
        let order = self.order.iter_mut().zip(other.order.iter());
        for (((cell, src_cell), (d, src_d)), (o, src_o)) in cells.zip(depth).zip(order) {
            if src_d.is_finite() && Self::wins(*src_d, *src_o, *d, *o) {
                *cell = *src_cell;
                *d = *src_d;
                *o = *src_o;
            }
        }
    }

    /// Write every covered cell into `fb` through its depth test.
    /// Returns the number of cells written.
    pub fn resolve_into(&self, fb: &mut FrameBuffer) -> usize {
        let mut written = 0;
        for y in 0..self.height.min(fb.height()) {
            for x in 0..self.width.min(fb.width()) {
                let i = y * self.width + x;
                let d = self.depth[i];
                if d.is_finite() && fb.depth_at(x, y).is_some_and(|cur| d < cur) {
                    fb.set(x, y, self.cells[i], d);
                    written += 1;
                }
            }
        }
        written
    }
}

impl RenderTarget for ScratchBuffer {
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
        // Earlier draws win depth ties regardless of which worker saw them first.
        let tie = depth == self.depth[i] && fragment.order < self.order[i];
        let mut stored = if tie { f64::INFINITY } else { self.depth[i] };
        let changed = write_cell(&mut self.cells[i], &mut stored, depth, fragment);
        if changed && stored == depth {
            self.depth[i] = depth;
            self.order[i] = fragment.order;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Rgb;

    #[test]
    fn test_merge_prefers_depth_then_order() {
        let mut a = ScratchBuffer::new(2, 1);
        let mut b = ScratchBuffer::new(2, 1);
        a.plot(0, 0, 3.0, &Fragment::opaque('a', Rgb::WHITE, 0));
        b.plot(0, 0, 2.0, &Fragment::opaque('b', Rgb::WHITE, 1));
        a.plot(1, 0, 2.0, &Fragment::opaque('c', Rgb::WHITE, 5));
        b.plot(1, 0, 2.0, &Fragment::opaque('d', Rgb::WHITE, 4));

        let mut merged = ScratchBuffer::new(2, 1);
        merged.merge_from(&a);
        merged.merge_from(&b);

        let mut fb = FrameBuffer::new(2, 1);
        assert_eq!(merged.resolve_into(&mut fb), 2);
        assert_eq!(fb.to_text(), "bd");
        assert_eq!(fb.depth_at(0, 0), Some(2.0));
    }

    #[test]
    fn test_tie_within_one_worker() {
        let mut s = ScratchBuffer::new(1, 1);
        s.plot(0, 0, 1.0, &Fragment::opaque('l', Rgb::WHITE, 7));
        s.plot(0, 0, 1.0, &Fragment::opaque('e', Rgb::WHITE, 2));
        let mut fb = FrameBuffer::new(1, 1);
        s.resolve_into(&mut fb);
        assert_eq!(fb.to_text(), "e");
    }
}
