//! Supersample resolve and FXAA for the terminal framebuffer.

use super::framebuffer::FrameBuffer;
use super::target::Cell;
use crate::core::AaMode;
use crate::light::{glyph_for_brightness, ramp_level, GLYPH_RAMP};
use crate::math::{Color, Rgb};

/// Relative luma contrast below which FXAA leaves a cell alone.
const FXAA_EDGE_THRESHOLD: f64 = 0.125;
/// Absolute luma contrast below which FXAA leaves a cell alone.
const FXAA_EDGE_THRESHOLD_MIN: f64 = 0.0312;

/// Size of the surface to rasterize into for a display size and mode.
pub fn raster_size(mode: AaMode, width: usize, height: usize) -> (usize, usize) {
    let (sx, sy) = mode.sample_grid();
    (width * sx, height * sy)
}

/// Box-filter a supersampled buffer down into `dst`.
///
/// Colors average over every sample with black for uncovered ones. Ramp
/// glyphs average their level weighted by coverage; any other glyph comes
/// from the closest sample. Depth is the closest sample's; blended samples
/// over nothing count as covered but carry no depth.
pub fn resolve_box(src: &FrameBuffer, dst: &mut FrameBuffer) {
    let (w, h) = (dst.width(), dst.height());
    if w == 0 || h == 0 {
        return;
    }
    let sx = src.width() / w;
    let sy = src.height() / h;
    if sx == 0 || sy == 0 {
        return;
    }
    let samples = (sx * sy) as f64;

    for y in 0..h {
        for x in 0..w {
            let mut sum = Color::BLACK;
            let mut covered = 0usize;
            let mut level_sum = 0usize;
            let mut all_ramp = true;
            let mut closest: Option<(f64, Cell)> = None;

            for j in 0..sy {
                for i in 0..sx {
                    let (px, py) = (x * sx + i, y * sy + j);
                    let (Some(cell), Some(depth)) = (src.cell(px, py), src.depth_at(px, py)) else {
                        continue;
                    };
                    if !src.covered_at(px, py) {
                        continue;
                    }
                    covered += 1;
                    sum += Color::from(cell.color);
                    match ramp_level(cell.glyph) {
                        Some(level) => level_sum += level,
                        None => all_ramp = false,
                    }
                    if closest.map_or(true, |(d, _)| depth < d) {
                        closest = Some((depth, *cell));
                    }
                }
            }

            let Some((depth, nearest)) = closest else {
                dst.set(x, y, Cell::BLANK, f64::INFINITY);
                continue;
            };
            let color = (sum * (1.0 / samples)).to_rgb();
            let glyph = if all_ramp {
                let coverage = covered as f64 / samples;
                let level = level_sum as f64 / covered as f64 * coverage;
                GLYPH_RAMP[(level.round() as usize).min(GLYPH_RAMP.len() - 1)]
            } else {
                nearest.glyph
            };
            dst.set(x, y, Cell::new(glyph, color), depth);
        }
    }
}

#[inline]
fn luma(c: &Rgb) -> f64 {
    c.luminance()
}

/// Luma-edge antialiasing on covered cells. Cells whose neighborhood contrast
/// exceeds the threshold are blended halfway towards their neighbors' mean.
/// Ramp glyphs are re-picked from the new brightness.
pub fn fxaa(fb: &mut FrameBuffer) {
    let (w, h) = (fb.width(), fb.height());
    let source = fb.clone();
    let color_at = |x: usize, y: usize| source.cell(x, y).map(|c| c.color).unwrap_or(Rgb::BLACK);

    for y in 0..h {
        for x in 0..w {
            let (Some(cell), Some(depth)) = (source.cell(x, y), source.depth_at(x, y)) else {
                continue;
            };
            if !source.covered_at(x, y) {
                continue;
            }
            let neighbors = [
                color_at(x, y.saturating_sub(1)),
                color_at(x, (y + 1).min(h - 1)),
                color_at(x.saturating_sub(1), y),
                color_at((x + 1).min(w - 1), y),
            ];
            let center = luma(&cell.color);
            let (mut lo, mut hi) = (center, center);
            for n in &neighbors {
                let l = luma(n);
                lo = lo.min(l);
                hi = hi.max(l);
            }
            let range = hi - lo;
            if range < FXAA_EDGE_THRESHOLD_MIN.max(hi * FXAA_EDGE_THRESHOLD) {
                continue;
            }
            let mean = neighbors
                .iter()
                .fold(Color::BLACK, |acc, n| acc + Color::from(*n))
                * 0.25;
            let blended = Color::from(cell.color).lerp(&mean, 0.5);
            let glyph = if ramp_level(cell.glyph).is_some() {
                glyph_for_brightness(blended.luminance())
            } else {
                cell.glyph
            };
            fb.set(x, y, Cell::new(glyph, blended.to_rgb()), depth);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_size() {
        assert_eq!(raster_size(AaMode::None, 80, 40), (80, 40));
        assert_eq!(raster_size(AaMode::Msaa2x, 80, 40), (160, 40));
        assert_eq!(raster_size(AaMode::Ssaa, 80, 40), (160, 80));
    }

    #[test]
    fn test_resolve_partial_coverage() {
        let mut src = FrameBuffer::new(2, 2);
        src.set(0, 0, Cell::new('@', Rgb::WHITE), 3.0);
        src.set(1, 0, Cell::new('@', Rgb::WHITE), 2.0);
        let mut dst = FrameBuffer::new(1, 1);
        resolve_box(&src, &mut dst);
        let cell = dst.cell(0, 0).copied().unwrap();
        // Half the samples covered at level 8.
        assert_eq!(cell.glyph, GLYPH_RAMP[4]);
        assert_eq!(cell.color, Rgb::new(128, 128, 128));
        assert_eq!(dst.depth_at(0, 0), Some(2.0));
    }

    #[test]
    fn test_resolve_solid_glyph_uses_closest() {
        let mut src = FrameBuffer::new(2, 1);
        src.set(0, 0, Cell::new('█', Rgb::WHITE), 3.0);
        src.set(1, 0, Cell::new('x', Rgb::WHITE), 2.0);
        let mut dst = FrameBuffer::new(1, 1);
        resolve_box(&src, &mut dst);
        assert_eq!(dst.cell(0, 0).map(|c| c.glyph), Some('x'));
    }

    #[test]
    fn test_resolve_empty_stays_blank() {
        let src = FrameBuffer::new(4, 4);
        let mut dst = FrameBuffer::new(2, 2);
        resolve_box(&src, &mut dst);
        assert_eq!(dst.covered(), 0);
    }

    #[test]
    fn test_fxaa_softens_edges_only() {
        let mut fb = FrameBuffer::new(3, 1);
        fb.set(0, 0, Cell::new('@', Rgb::WHITE), 1.0);
        fb.set(1, 0, Cell::new('@', Rgb::WHITE), 1.0);
        fb.set(2, 0, Cell::new('.', Rgb::BLACK), 1.0);
        fxaa(&mut fb);
        assert_eq!(fb.cell(0, 0).map(|c| c.color), Some(Rgb::WHITE));
        let edge = fb.cell(1, 0).copied().unwrap();
        assert!(edge.color.r < 255);
    }
}
