//! Renderer contract and the software implementation behind it.

use super::antialias::{fxaa, raster_size, resolve_box};
use super::framebuffer::FrameBuffer;
use super::parallel::{draw_translucent, merge_scratch, render_jobs, render_tiles};
use super::pipeline::{DrawItem, FrameContext, Primitive, Worker};
use super::scratch::ScratchBuffer;
use super::target::{ClipRect, FragmentMode, RenderTarget};
use crate::camera::Camera;
use crate::core::{AaMode, DropReason, EngineConfig, NodeId, Phase, Profiler, RenderError, RenderMode};
use crate::geometry::{Mesh, Triangle};
use crate::light::LightingSystem;
use crate::lod::LodMetric;
use crate::math::{Frustum, Matrix4, Sphere};
use crate::scene::{Payload, Scene};
use log::{info, warn};
use std::borrow::Cow;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Escape sequence written on initialize: hide cursor, clear screen.
const TERMINAL_ENTER: &str = "\x1b[?25l\x1b[2J";
/// Escape sequence written on shutdown: reset attributes, show cursor.
const TERMINAL_LEAVE: &str = "\x1b[0m\x1b[?25h\n";

/// Handles to the state a frame is rendered with.
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    /// Camera of the last rendered scene.
    pub camera: &'a Camera,
    /// Lights and ambient term.
    pub lighting: &'a LightingSystem,
    /// World-space view frustum of `camera`.
    pub frustum: Frustum,
}

/// Operations every output sink provides.
///
/// Only [`Renderer::initialize`] can fail. Frame operations on a sink that
/// is not initialized do nothing.
pub trait Renderer {
    /// Open the sink and allocate per-worker state. Calling it again is a no-op.
    fn initialize(&mut self) -> Result<(), RenderError>;

    /// Release the sink.
    fn shutdown(&mut self);

    /// Clear buffers and start timing a frame.
    fn begin_frame(&mut self);

    /// Resolve antialiasing and collect worker counters.
    fn end_frame(&mut self);

    /// Write the finished frame out.
    fn present(&mut self);

    /// Draw one triangle with a local-to-world transform.
    fn render_triangle(&mut self, triangle: &Triangle, world: &Matrix4, camera: &Camera);

    /// Draw one mesh with a local-to-world transform.
    fn render_mesh(&mut self, mesh: &Mesh, world: &Matrix4, camera: &Camera);

    /// Propagate transforms, pick LOD levels, cull and draw a whole scene.
    fn render_scene(&mut self, scene: &mut Scene);

    /// Restrict subsequent writes to `[min, max)` in display cells.
    fn set_clip_bounds(&mut self, min_x: usize, min_y: usize, max_x: usize, max_y: usize);

    /// Display size in cells.
    fn dimensions(&self) -> (usize, usize);

    /// Camera, lighting and frustum in use.
    fn render_context(&self) -> RenderContext<'_>;
}

/// CPU rasterizer writing ANSI frames to a byte sink.
pub struct SoftwareRenderer {
    config: EngineConfig,
    initialized: bool,
    frame: FrameBuffer,
    samples: Option<FrameBuffer>,
    clip: ClipRect,
    lighting: LightingSystem,
    camera: Camera,
    workers: Vec<Worker>,
    scratch: Vec<ScratchBuffer>,
    profiler: Profiler,
    output: Box<dyn Write + Send>,
    quit: Arc<AtomicBool>,
    direct_order: usize,
}

impl std::fmt::Debug for SoftwareRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoftwareRenderer")
            .field("config", &self.config)
            .field("initialized", &self.initialized)
            .field("workers", &self.workers.len())
            .finish_non_exhaustive()
    }
}

impl SoftwareRenderer {
    /// Renderer writing to stdout. The configuration is validated here;
    /// buffers are allocated by [`Renderer::initialize`].
    pub fn new(config: EngineConfig) -> Result<Self, RenderError> {
        config.validate()?;
        let (width, height) = (config.width, config.height);
        Ok(Self {
            frame: FrameBuffer::new(width, height),
            samples: None,
            clip: ClipRect::full(width, height),
            lighting: LightingSystem::new(),
            camera: Camera::default(),
            workers: Vec::new(),
            scratch: Vec::new(),
            profiler: Profiler::default(),
            output: Box::new(io::stdout()),
            quit: Arc::new(AtomicBool::new(false)),
            initialized: false,
            direct_order: 0,
            config,
        })
    }

    /// Renderer that discards its output. Useful for tests and benchmarks.
    pub fn headless(config: EngineConfig) -> Result<Self, RenderError> {
        Ok(Self::new(config)?.with_output(io::sink()))
    }

    /// Replace the output sink.
    pub fn with_output(mut self, output: impl Write + Send + 'static) -> Self {
        self.output = Box::new(output);
        self
    }

    /// Configuration in use.
    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Whether [`Renderer::initialize`] has run.
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Lighting used for every frame.
    #[inline]
    pub fn lighting(&self) -> &LightingSystem {
        &self.lighting
    }

    /// Mutable lighting.
    #[inline]
    pub fn lighting_mut(&mut self) -> &mut LightingSystem {
        &mut self.lighting
    }

    /// Display framebuffer, valid after [`Renderer::end_frame`].
    #[inline]
    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.frame
    }

    /// Timings and counters.
    #[inline]
    pub fn profiler(&self) -> &Profiler {
        &self.profiler
    }

    /// Flag that stops workers from picking up more tiles or jobs.
    pub fn quit_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.quit)
    }

    /// Ask workers to stop after their current tile or job.
    pub fn request_quit(&self) {
        self.quit.store(true, Ordering::Relaxed);
    }

    /// Whether a quit was requested through any handle.
    pub fn quit_requested(&self) -> bool {
        self.quit.load(Ordering::Relaxed)
    }

    /// Clip rectangle in raster (possibly supersampled) cells.
    fn raster_clip(&self) -> ClipRect {
        let (sx, sy) = self.config.aa_mode.sample_grid();
        ClipRect::new(self.clip.min_x * sx, self.clip.min_y * sy, self.clip.max_x * sx, self.clip.max_y * sy)
    }

    fn next_order(&mut self) -> usize {
        self.direct_order += 1;
        self.direct_order - 1
    }

    /// Draw one free-standing item on the first worker.
    fn render_direct(&mut self, item: &DrawItem<'_>, camera: &Camera) {
        if !self.initialized {
            return;
        }
        self.camera = camera.clone();
        self.lighting.camera_position = camera.position();
        let ctx = FrameContext::new(camera, &self.lighting, self.config.use_color);
        let target = self.samples.as_mut().unwrap_or(&mut self.frame);
        if let Some(worker) = self.workers.first_mut() {
            worker.draw(&ctx, item, target);
        }
    }

    /// Cull against the camera and update LOD selections. Returns the ids
    /// that survive, in tree order.
    fn cull(&mut self, scene: &mut Scene) -> Vec<NodeId> {
        let camera = &scene.camera;
        let eye = camera.position();
        let mut visible = Vec::new();
        let mut lod = Vec::new();
        for id in scene.get_renderable_nodes() {
            let Some(bounds) = scene.world_bounds(id) else {
                continue;
            };
            if bounds.is_empty() {
                continue;
            }
            let sphere = Sphere::from_aabb(&bounds);
            if !camera.sphere_in_frustum(&sphere) {
                self.profiler.stats_mut().record_drop(DropReason::OutsideFrustum);
                continue;
            }
            if matches!(scene.node(id).and_then(|n| n.payload.as_ref()), Some(Payload::Lod(_))) {
                let metric = (eye.distance_to(&sphere.center), camera.screen_coverage(&sphere.center, sphere.radius));
                lod.push((id, metric));
            }
            visible.push(id);
        }
        for (id, (distance, coverage)) in lod {
            if let Some(Payload::Lod(group)) = scene.node_mut(id).and_then(|n| n.payload.as_mut()) {
                match group.metric {
                    LodMetric::Distance => group.select_by_distance(distance),
                    LodMetric::ScreenCoverage => group.select_by_coverage(coverage),
                };
            }
        }
        visible
    }
}

impl Renderer for SoftwareRenderer {
    fn initialize(&mut self) -> Result<(), RenderError> {
        if self.initialized {
            return Ok(());
        }
        let (width, height) = (self.config.width, self.config.height);
        let (rw, rh) = raster_size(self.config.aa_mode, width, height);
        self.samples = ((rw, rh) != (width, height)).then(|| FrameBuffer::new(rw, rh));

        let workers = self.config.effective_workers();
        self.workers = (0..workers).map(|_| Worker::new(self.config.pool_capacity)).collect();
        self.scratch = match self.config.render_mode {
            RenderMode::ParallelJobs | RenderMode::ParallelBatched => {
                (0..workers).map(|_| ScratchBuffer::new(rw, rh)).collect()
            }
            RenderMode::Single | RenderMode::ParallelTiles => Vec::new(),
        };

        self.output
            .write_all(TERMINAL_ENTER.as_bytes())
            .and_then(|_| self.output.flush())
            .map_err(|e| RenderError::BackendInitialization(e.to_string()))?;

        self.set_clip_bounds(self.clip.min_x, self.clip.min_y, self.clip.max_x, self.clip.max_y);
        self.initialized = true;
        info!(
            "software renderer initialized: {}x{} cells, raster {}x{}, {:?} with {} worker(s)",
            width, height, rw, rh, self.config.render_mode, workers
        );
        Ok(())
    }

    fn shutdown(&mut self) {
        if !self.initialized {
            return;
        }
        if let Err(e) = self.output.write_all(TERMINAL_LEAVE.as_bytes()).and_then(|_| self.output.flush()) {
            warn!("failed to restore terminal: {}", e);
        }
        self.workers.clear();
        self.scratch.clear();
        self.samples = None;
        self.initialized = false;
        info!("software renderer shut down after {} frames", self.profiler.frames());
    }

    fn begin_frame(&mut self) {
        if !self.initialized {
            return;
        }
        self.profiler.begin_frame();
        self.direct_order = 0;
        self.frame.clear();
        if let Some(samples) = self.samples.as_mut() {
            samples.clear();
        }
    }

    fn end_frame(&mut self) {
        if !self.initialized {
            return;
        }
        let started = Instant::now();
        if let Some(samples) = &self.samples {
            resolve_box(samples, &mut self.frame);
        }
        if self.config.aa_mode == AaMode::Fxaa {
            fxaa(&mut self.frame);
        }
        self.profiler.record(Phase::Resolve, started.elapsed());

        for worker in &mut self.workers {
            let stats = worker.finish_frame();
            self.profiler.stats_mut().merge(&stats);
        }
        let overflows = self.profiler.stats().pool_overflows;
        if self.config.profiling && overflows > 0 {
            warn!(
                "frame pool overflowed {} time(s); consider raising pool_capacity above {}",
                overflows, self.config.pool_capacity
            );
        }
    }

    fn present(&mut self) {
        if !self.initialized {
            return;
        }
        let started = Instant::now();
        let debug_line = self.config.show_debug.then(|| self.profiler.summary_line());
        let bytes = self.frame.encode(self.config.use_color, debug_line.as_deref());
        if let Err(e) = self.output.write_all(bytes.as_bytes()).and_then(|_| self.output.flush()) {
            warn!("failed to present frame: {}", e);
        }
        self.profiler.record(Phase::Present, started.elapsed());
        self.profiler.end_frame();
    }

    fn render_triangle(&mut self, triangle: &Triangle, world: &Matrix4, camera: &Camera) {
        let item = DrawItem {
            order: self.next_order(),
            node: NodeId::default(),
            world: *world,
            bounds: triangle.bounds().apply_matrix4(world),
            parts: vec![(Primitive::Triangle(triangle), FragmentMode::Opaque)],
        };
        self.render_direct(&item, camera);
    }

    fn render_mesh(&mut self, mesh: &Mesh, world: &Matrix4, camera: &Camera) {
        let item = DrawItem {
            order: self.next_order(),
            node: NodeId::default(),
            world: *world,
            bounds: mesh.bounds().apply_matrix4(world),
            parts: vec![(Primitive::Mesh(Cow::Borrowed(mesh)), FragmentMode::Opaque)],
        };
        self.render_direct(&item, camera);
    }

    fn render_scene(&mut self, scene: &mut Scene) {
        if !self.initialized {
            return;
        }
        let started = Instant::now();
        scene.update_transforms();
        self.profiler.record(Phase::Update, started.elapsed());

        let started = Instant::now();
        let visible = self.cull(scene);
        self.profiler.record(Phase::Cull, started.elapsed());

        let scene: &Scene = scene;
        let base = self.direct_order;
        let items: Vec<DrawItem<'_>> = visible
            .iter()
            .filter_map(|&id| Some((id, scene.world_matrix(id)?, scene.node(id)?.payload.as_ref()?)))
            .enumerate()
            .filter_map(|(i, (id, world, payload))| DrawItem::from_payload(base + i, id, world, payload))
            .collect();
        self.profiler.stats_mut().nodes_visible += items.len() as u64;
        self.direct_order += items.len();

        self.camera = scene.camera.clone();
        self.lighting.camera_position = self.camera.position();
        let ctx = FrameContext::new(&self.camera, &self.lighting, self.config.use_color);
        let target = match self.samples.as_mut() {
            Some(samples) => samples,
            None => &mut self.frame,
        };

        let started = Instant::now();
        match self.config.render_mode {
            RenderMode::Single => {
                if let Some(worker) = self.workers.first_mut() {
                    worker.draw_all(&ctx, &items, target);
                }
            }
            RenderMode::ParallelTiles => {
                let report = render_tiles(&ctx, &items, target, self.config.tile_size, &mut self.workers, &self.quit);
                self.profiler.record(Phase::Bin, report.bin_time);
                self.profiler.record(Phase::Raster, started.elapsed().saturating_sub(report.bin_time));
                return;
            }
            RenderMode::ParallelJobs | RenderMode::ParallelBatched => {
                let batch = match self.config.render_mode {
                    RenderMode::ParallelBatched => self.config.batch_size,
                    _ => 1,
                };
                let clip = target.clip();
                render_jobs(&ctx, &items, clip, batch, &mut self.workers, &mut self.scratch, &self.quit);
                self.profiler.record(Phase::Raster, started.elapsed());
                let started = Instant::now();
                merge_scratch(&mut self.scratch, target);
                if let Some(worker) = self.workers.first_mut() {
                    draw_translucent(&ctx, &items, worker, target, &self.quit);
                }
                self.profiler.record(Phase::Merge, started.elapsed());
                return;
            }
        }
        self.profiler.record(Phase::Raster, started.elapsed());
    }

    fn set_clip_bounds(&mut self, min_x: usize, min_y: usize, max_x: usize, max_y: usize) {
        let full = ClipRect::full(self.config.width, self.config.height);
        self.clip = ClipRect::new(min_x, min_y, max_x, max_y).intersect(&full);
        self.frame.set_clip(self.clip);
        let raster = self.raster_clip();
        if let Some(samples) = self.samples.as_mut() {
            samples.set_clip(raster);
        }
    }

    fn dimensions(&self) -> (usize, usize) {
        (self.config.width, self.config.height)
    }

    fn render_context(&self) -> RenderContext<'_> {
        RenderContext {
            camera: &self.camera,
            lighting: &self.lighting,
            frustum: self.camera.frustum(),
        }
    }
}

impl Drop for SoftwareRenderer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
