//! Multi-threaded frame rendering.
//!
//! Tiles: the framebuffer is split into disjoint [`TileView`]s, each visible
//! item is binned into every tile its projected bounds touch, and workers
//! pull `(tile, bin)` pairs from a channel. A tile is only ever written by
//! the worker holding it.
//!
//! Jobs: items are grouped into batches that workers pull from a channel and
//! draw their solid parts into private [`ScratchBuffer`]s, which are merged
//! by depth and draw order once every worker has finished. Translucent parts
//! are then drawn over the merged frame in submission order.

use super::framebuffer::{FrameBuffer, TileView};
use super::pipeline::{DrawItem, FrameContext, Pass, Worker};
use super::scratch::ScratchBuffer;
use super::target::{ClipRect, RenderTarget};
use crate::math::Aabb;
use crossbeam_channel::unbounded;
use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Pixels added around projected bounds before binning.
const BIN_MARGIN: f64 = 1.0;

/// Projected pixel box `(min_x, min_y, max_x, max_y)` of world bounds, grown
/// by [`BIN_MARGIN`]. `None` when a corner is at or behind the near plane,
/// in which case the bounds may cover any pixel.
pub fn screen_bounds(ctx: &FrameContext<'_>, bounds: &Aabb, width: usize, height: usize) -> Option<(f64, f64, f64, f64)> {
    let near = ctx.camera.near();
    let mut out = (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
    for corner in bounds.corners() {
        let v = ctx.view.transform_point(&corner);
        if !(v.z > near) {
            return None;
        }
        let (x, y) = ctx.camera.screen_position(&v, width, height);
        out = (out.0.min(x), out.1.min(y), out.2.max(x), out.3.max(y));
    }
    Some((out.0 - BIN_MARGIN, out.1 - BIN_MARGIN, out.2 + BIN_MARGIN, out.3 + BIN_MARGIN))
}

/// Item indices per tile, each list in submission order.
pub fn bin_items(
    ctx: &FrameContext<'_>,
    items: &[DrawItem<'_>],
    tiles: &[ClipRect],
    width: usize,
    height: usize,
) -> Vec<Vec<usize>> {
    let mut bins = vec![Vec::new(); tiles.len()];
    for (i, item) in items.iter().enumerate() {
        if item.bounds.is_empty() {
            continue;
        }
        match screen_bounds(ctx, &item.bounds, width, height) {
            Some((x0, y0, x1, y1)) => {
                for (bin, rect) in bins.iter_mut().zip(tiles) {
                    if rect.overlaps(x0, y0, x1, y1) {
                        bin.push(i);
                    }
                }
            }
            None => bins.iter_mut().for_each(|bin| bin.push(i)),
        }
    }
    bins
}

/// What a tiled render did.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TileReport {
    /// Tiles the surface was split into.
    pub tiles: usize,
    /// Tiles with at least one item binned.
    pub busy: usize,
    /// Time spent binning.
    pub bin_time: Duration,
}

/// Render `items` tile by tile over `workers.len()` threads.
pub fn render_tiles(
    ctx: &FrameContext<'_>,
    items: &[DrawItem<'_>],
    fb: &mut FrameBuffer,
    tile_size: usize,
    workers: &mut [Worker],
    quit: &AtomicBool,
) -> TileReport {
    let started = Instant::now();
    let (width, height) = fb.size();
    let tiles = fb.split_tiles(tile_size);
    let rects: Vec<ClipRect> = tiles.iter().map(TileView::rect).collect();
    let bins = bin_items(ctx, items, &rects, width, height);
    debug!(
        "binned {} items into {} tiles ({} references)",
        items.len(),
        rects.len(),
        bins.iter().map(Vec::len).sum::<usize>()
    );

    let jobs: Vec<(TileView<'_>, Vec<usize>)> = tiles.into_iter().zip(bins).filter(|(_, bin)| !bin.is_empty()).collect();
    let report = TileReport {
        tiles: rects.len(),
        busy: jobs.len(),
        bin_time: started.elapsed(),
    };

    if let [worker] = workers {
        for (mut tile, bin) in jobs {
            if quit.load(Ordering::Relaxed) {
                break;
            }
            worker.draw_all(ctx, bin.iter().map(|&i| &items[i]), &mut tile);
        }
        return report;
    }

    let (tx, rx) = unbounded();
    for job in jobs {
        tx.send(job).ok();
    }
    drop(tx);

    thread::scope(|scope| {
        for worker in workers.iter_mut() {
            let rx = rx.clone();
            scope.spawn(move || {
                while let Ok((mut tile, bin)) = rx.recv() {
                    // Keep receiving so the queue drains, but stop drawing.
                    if quit.load(Ordering::Relaxed) {
                        continue;
                    }
                    worker.draw_all(ctx, bin.iter().map(|&i| &items[i]), &mut tile);
                }
            });
        }
    });
    report
}

/// Render the solid parts of `items` in batches of `batch_size` into
/// per-worker scratch buffers. `scratch` must hold one buffer per worker,
/// sized like the target; combine them afterwards with [`merge_scratch`]
/// and finish with [`draw_translucent`].
pub fn render_jobs(
    ctx: &FrameContext<'_>,
    items: &[DrawItem<'_>],
    clip: ClipRect,
    batch_size: usize,
    workers: &mut [Worker],
    scratch: &mut [ScratchBuffer],
    quit: &AtomicBool,
) {
    for buffer in scratch.iter_mut() {
        buffer.clear();
        buffer.set_clip(clip);
    }

    let (tx, rx) = unbounded();
    for batch in items.chunks(batch_size.max(1)) {
        tx.send(batch).ok();
    }
    drop(tx);
    debug!("queued {} items in batches of {}", items.len(), batch_size.max(1));

    thread::scope(|scope| {
        for (worker, buffer) in workers.iter_mut().zip(scratch.iter_mut()) {
            let rx = rx.clone();
            scope.spawn(move || {
                while let Ok(batch) = rx.recv() {
                    if quit.load(Ordering::Relaxed) {
                        continue;
                    }
                    for item in batch {
                        worker.draw_pass(ctx, item, Pass::Solid, buffer);
                    }
                }
            });
        }
    });
}

/// Fold every scratch buffer into the first and write the result into `fb`.
pub fn merge_scratch(scratch: &mut [ScratchBuffer], fb: &mut FrameBuffer) -> usize {
    let Some((first, rest)) = scratch.split_first_mut() else {
        return 0;
    };
    for other in rest.iter() {
        first.merge_from(other);
    }
    first.resolve_into(fb)
}

/// Draw the translucent parts of `items` over a merged frame, in submission
/// order. Blends read what is behind them, so this runs on one worker.
pub fn draw_translucent(
    ctx: &FrameContext<'_>,
    items: &[DrawItem<'_>],
    worker: &mut Worker,
    fb: &mut FrameBuffer,
    quit: &AtomicBool,
) {
    if quit.load(Ordering::Relaxed) {
        return;
    }
    for item in items.iter().filter(|item| item.has_translucent()) {
        worker.draw_pass(ctx, item, Pass::Translucent, fb);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::core::IdGenerator;
    use crate::geometry::{Mesh, Quad, Triangle};
    use crate::light::LightingSystem;
    use crate::lod::{LodGroup, LodLevel, TransitionMode};
    use crate::material::Material;
    use crate::math::{Matrix4, Rgb, Vector3};
    use crate::scene::Payload;
    use std::sync::Arc;

    fn camera() -> Camera {
        Camera::new(90.0, 90.0, 0.1, 100.0)
            .unwrap()
            .looking_at(Vector3::new(0.0, 0.0, -5.0), Vector3::ZERO)
    }

    fn payloads() -> Vec<Payload> {
        let material = Arc::new(Material::default().with_double_sided(true));
        (0..6)
            .map(|i| {
                let o = i as f64 * 0.4 - 1.0;
                Payload::Triangle(Triangle::new(
                    Vector3::new(o - 1.0, -1.0, i as f64 * 0.3),
                    Vector3::new(o, 1.2, 0.5),
                    Vector3::new(o + 1.0, -0.8, 1.0 - i as f64 * 0.2),
                    material.clone(),
                ))
            })
            .collect()
    }

    fn items(payloads: &[Payload]) -> Vec<DrawItem<'_>> {
        let ids = IdGenerator::new();
        payloads
            .iter()
            .enumerate()
            .filter_map(|(i, p)| DrawItem::from_payload(i, ids.next_id(), Matrix4::IDENTITY, p))
            .collect()
    }

    fn sequential(ctx: &FrameContext<'_>, items: &[DrawItem<'_>]) -> FrameBuffer {
        let mut fb = FrameBuffer::new(48, 32);
        Worker::new(64).draw_all(ctx, items, &mut fb);
        fb
    }

    #[test]
    fn test_bins_only_overlapping_tiles() {
        let cam = camera();
        let mut light = LightingSystem::new();
        light.camera_position = cam.position();
        let ctx = FrameContext::new(&cam, &light, false);
        let payloads = payloads();
        let items = items(&payloads);
        let tiles = [ClipRect::new(0, 0, 4, 4), ClipRect::new(20, 12, 28, 20)];
        let bins = bin_items(&ctx, &items, &tiles, 48, 32);
        assert!(bins[0].is_empty());
        assert_eq!(bins[1], (0..items.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_straddling_bounds_go_everywhere() {
        let cam = camera();
        let light = LightingSystem::new();
        let ctx = FrameContext::new(&cam, &light, false);
        let bounds = Aabb::new(Vector3::new(-1.0, -1.0, -6.0), Vector3::new(1.0, 1.0, 0.0));
        assert!(screen_bounds(&ctx, &bounds, 48, 32).is_none());
    }

    #[test]
    fn test_tiles_match_sequential() {
        let cam = camera();
        let mut light = LightingSystem::new();
        light.camera_position = cam.position();
        let ctx = FrameContext::new(&cam, &light, false);
        let payloads = payloads();
        let items = items(&payloads);
        let expected = sequential(&ctx, &items);
        let quit = AtomicBool::new(false);
        for n in [1, 3] {
            let mut fb = FrameBuffer::new(48, 32);
            let mut workers: Vec<Worker> = (0..n).map(|_| Worker::new(64)).collect();
            let report = render_tiles(&ctx, &items, &mut fb, 8, &mut workers, &quit);
            assert_eq!(report.tiles, 24);
            assert_eq!(fb, expected);
        }
    }

    #[test]
    fn test_jobs_match_sequential() {
        let cam = camera();
        let mut light = LightingSystem::new();
        light.camera_position = cam.position();
        let ctx = FrameContext::new(&cam, &light, false);
        let payloads = payloads();
        let items = items(&payloads);
        let expected = sequential(&ctx, &items);
        let quit = AtomicBool::new(false);
        for batch in [1, 4] {
            let mut fb = FrameBuffer::new(48, 32);
            let mut workers: Vec<Worker> = (0..3).map(|_| Worker::new(64)).collect();
            let mut scratch: Vec<ScratchBuffer> = (0..3).map(|_| ScratchBuffer::new(48, 32)).collect();
            render_jobs(&ctx, &items, fb.clip(), batch, &mut workers, &mut scratch, &quit);
            merge_scratch(&mut scratch, &mut fb);
            draw_translucent(&ctx, &items, &mut workers[0], &mut fb, &quit);
            assert_eq!(fb.cells(), expected.cells());
        }
    }

    fn transitioning(mode: TransitionMode) -> Vec<Payload> {
        let red = Arc::new(Material::new(Rgb::new(255, 0, 0)));
        let green = Arc::new(Material::new(Rgb::new(0, 255, 0)));
        let mut group = LodGroup::new(vec![
            LodLevel::new(Mesh::cube(5.0, red), 1.0, 0.0),
            LodLevel::new(Mesh::cube(1.5, green), 100.0, 0.0),
        ])
        .with_transition(mode, 1.0);
        group.select_by_distance(0.5);
        group.select_by_distance(5.0);
        group.update(0.3);

        let blue = Material::new(Rgb::new(0, 0, 255)).with_double_sided(true);
        let corners = [
            Vector3::new(-30.0, -30.0, 4.0),
            Vector3::new(30.0, -30.0, 4.0),
            Vector3::new(30.0, 30.0, 4.0),
            Vector3::new(-30.0, 30.0, 4.0),
        ];
        vec![Payload::Quad(Quad::new(corners, Arc::new(blue))), Payload::Lod(group)]
    }

    #[test]
    fn test_lod_transitions_match_sequential() {
        let cam = camera();
        let mut light = LightingSystem::new();
        light.camera_position = cam.position();
        let ctx = FrameContext::new(&cam, &light, true);
        let quit = AtomicBool::new(false);
        for mode in [TransitionMode::Fade, TransitionMode::CrossFade, TransitionMode::Morph] {
            let payloads = transitioning(mode);
            let items = items(&payloads);
            let expected = sequential(&ctx, &items);

            for n in [2, 3, 4] {
                let mut fb = FrameBuffer::new(48, 32);
                let mut workers: Vec<Worker> = (0..n).map(|_| Worker::new(64)).collect();
                render_tiles(&ctx, &items, &mut fb, 4, &mut workers, &quit);
                assert_eq!(fb, expected, "{:?} tiles, {} workers", mode, n);

                // Repeat so a worker-dependent result shows up.
                for _ in 0..10 {
                    let mut fb = FrameBuffer::new(48, 32);
                    let mut scratch: Vec<ScratchBuffer> = (0..n).map(|_| ScratchBuffer::new(48, 32)).collect();
                    render_jobs(&ctx, &items, fb.clip(), 1, &mut workers, &mut scratch, &quit);
                    merge_scratch(&mut scratch, &mut fb);
                    draw_translucent(&ctx, &items, &mut workers[0], &mut fb, &quit);
                    assert_eq!(fb.cells(), expected.cells(), "{:?} jobs, {} workers", mode, n);
                }
            }
        }
    }

    #[test]
    fn test_quit_skips_drawing() {
        let cam = camera();
        let light = LightingSystem::new();
        let ctx = FrameContext::new(&cam, &light, false);
        let payloads = payloads();
        let items = items(&payloads);
        let quit = AtomicBool::new(true);
        let mut fb = FrameBuffer::new(48, 32);
        let mut workers: Vec<Worker> = (0..2).map(|_| Worker::new(64)).collect();
        render_tiles(&ctx, &items, &mut fb, 8, &mut workers, &quit);
        assert_eq!(fb.covered(), 0);
    }
}
