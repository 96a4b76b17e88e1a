//! Scan-line triangle fill and line drawing with perspective-correct depth.

use super::target::{Fragment, RenderTarget};

/// Projected vertex: pixel coordinates plus view-space depth.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenVertex {
    /// Horizontal pixel coordinate.
    pub x: f64,
    /// Vertical pixel coordinate.
    pub y: f64,
    /// View-space depth.
    pub z: f64,
}

impl ScreenVertex {
    /// Create a screen vertex.
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[inline]
    fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite() && self.z > 0.0
    }
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// First and last pixel index whose center lies in `[lo, hi]`.
#[inline]
fn center_range(lo: f64, hi: f64) -> (i64, i64) {
    ((lo - 0.5).ceil() as i64, (hi - 0.5).floor() as i64)
}

/// Fill a triangle into `target`. Pixels are sampled at their centers; depth
/// is interpolated linearly in 1/z and inverted per pixel.
///
/// Spans are computed in full-surface coordinates and only then clamped to
/// the target's clip rectangle, so a tile renders exactly the pixels a whole
/// surface would. Returns the number of cells written.
pub fn rasterize_triangle<T: RenderTarget + ?Sized>(
    target: &mut T,
    vertices: [ScreenVertex; 3],
    fragment: &Fragment,
) -> usize {
    if !vertices.iter().all(ScreenVertex::is_valid) {
        return 0;
    }
    let mut v = vertices;
    v.sort_by(|a, b| a.y.total_cmp(&b.y));
    let [v0, v1, v2] = v;

    let height = v2.y - v0.y;
    if height <= 0.0 {
        return 0;
    }

    let clip = target.clip();
    if clip.is_empty() {
        return 0;
    }
    let (row_start, row_end) = center_range(v0.y, v2.y);
    let row_start = row_start.max(clip.min_y as i64);
    let row_end = row_end.min(clip.max_y as i64 - 1);

    let (iz0, iz1, iz2) = (1.0 / v0.z, 1.0 / v1.z, 1.0 / v2.z);
    let mut written = 0;

    for py in row_start..=row_end {
        let sy = py as f64 + 0.5;

        let alpha = ((sy - v0.y) / height).clamp(0.0, 1.0);
        let (mut xa, mut iza) = (lerp(v0.x, v2.x, alpha), lerp(iz0, iz2, alpha));

        let (mut xb, mut izb) = if sy < v1.y {
            let h = v1.y - v0.y;
            let beta = if h > 0.0 { ((sy - v0.y) / h).clamp(0.0, 1.0) } else { 1.0 };
            (lerp(v0.x, v1.x, beta), lerp(iz0, iz1, beta))
        } else {
            let h = v2.y - v1.y;
            let beta = if h > 0.0 { ((sy - v1.y) / h).clamp(0.0, 1.0) } else { 0.0 };
            (lerp(v1.x, v2.x, beta), lerp(iz1, iz2, beta))
        };

        if xa > xb {
            std::mem::swap(&mut xa, &mut xb);
            std::mem::swap(&mut iza, &mut izb);
        }

        let (mut col_start, mut col_end) = center_range(xa, xb);
        if col_start > col_end {
            // Span narrower than a pixel: draw the pixel it falls in.
            let px = ((xa + xb) * 0.5).floor() as i64;
            col_start = px;
            col_end = px;
        }
        let span = xb - xa;
        let col_start = col_start.max(clip.min_x as i64);
        let col_end = col_end.min(clip.max_x as i64 - 1);

        for px in col_start..=col_end {
            let (x, y) = (px as usize, py as usize);
            if !fragment.covers(x, y) {
                continue;
            }
            let t = if span > 0.0 {
                ((px as f64 + 0.5 - xa) / span).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let z = 1.0 / lerp(iza, izb, t);
            if !(z.is_finite() && z > 0.0) {
                continue;
            }
            if target.plot(x, y, z, fragment) {
                written += 1;
            }
        }
    }
    written
}

/// Draw a line with a DDA walk, interpolating depth in 1/z.
/// Returns the number of cells written.
pub fn rasterize_line<T: RenderTarget + ?Sized>(
    target: &mut T,
    a: ScreenVertex,
    b: ScreenVertex,
    fragment: &Fragment,
) -> usize {
    if !(a.is_valid() && b.is_valid()) {
        return 0;
    }
    let clip = target.clip();
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;
    let (iza, izb) = (1.0 / a.z, 1.0 / b.z);

    let mut written = 0;
    let mut last = None;
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        let (x, y) = (a.x + dx * t, a.y + dy * t);
        if x < 0.0 || y < 0.0 {
            continue;
        }
        let (px, py) = (x.floor() as usize, y.floor() as usize);
        if last == Some((px, py)) || !clip.contains(px, py) || !fragment.covers(px, py) {
            continue;
        }
        last = Some((px, py));
        let z = 1.0 / lerp(iza, izb, t);
        if z.is_finite() && z > 0.0 && target.plot(px, py, z, fragment) {
            written += 1;
        }
    }
    written
}
