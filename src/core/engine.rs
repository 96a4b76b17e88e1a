//! Main engine entry point.

use super::{Clock, EngineConfig, FrameLimiter, RenderError};
use crate::render::{Renderer, SoftwareRenderer};
use crate::scene::Scene;
use log::info;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// The main engine.
/// Owns the scene and the renderer and drives the per-frame loop.
#[derive(Debug)]
pub struct Engine {
    /// The scene being rendered.
    pub scene: Scene,
    /// The renderer.
    pub renderer: SoftwareRenderer,
    /// The clock for timing.
    pub clock: Clock,
    limiter: FrameLimiter,
    quit: Arc<AtomicBool>,
}

impl Engine {
    /// Create an engine drawing to stdout and initialize its renderer.
    pub fn new(config: EngineConfig) -> Result<Self, RenderError> {
        Self::with_renderer(SoftwareRenderer::new(config)?, Scene::new())
    }

    /// Create an engine around an existing renderer and scene.
    pub fn with_renderer(mut renderer: SoftwareRenderer, scene: Scene) -> Result<Self, RenderError> {
        renderer.initialize()?;
        let limiter = FrameLimiter::new(renderer.config().target_fps);
        let quit = renderer.quit_handle();
        Ok(Self {
            scene,
            renderer,
            clock: Clock::new(),
            limiter,
            quit,
        })
    }

    /// Display size in cells.
    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        self.renderer.dimensions()
    }

    /// Seconds since the first tick.
    pub fn elapsed_time(&self) -> f64 {
        self.clock.elapsed_time()
    }

    /// Frames presented so far.
    pub fn frames(&self) -> u64 {
        self.renderer.profiler().frames()
    }

    /// Run one frame with an explicit delta in seconds.
    pub fn step(&mut self, dt: f64) {
        self.scene.update(dt);
        self.renderer.begin_frame();
        self.renderer.render_scene(&mut self.scene);
        self.renderer.end_frame();
        self.renderer.present();
    }

    /// Run one frame timed by the engine clock.
    pub fn tick(&mut self) {
        let dt = self.clock.get_delta();
        self.step(dt);
    }

    /// Tick at the configured rate until quit is requested, then shut the
    /// renderer down.
    pub fn run(&mut self) {
        info!("engine loop started at {:.1} fps target", self.renderer.config().target_fps);
        while !self.quit_requested() {
            let started = Instant::now();
            self.tick();
            self.limiter.wait(started);
        }
        self.renderer.shutdown();
        info!("engine loop stopped after {} frames", self.frames());
    }

    /// Flag that stops [`Engine::run`] and any in-flight parallel frame.
    /// Safe to set from another thread.
    pub fn quit_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.quit)
    }

    /// Request the loop to stop after the current frame.
    pub fn request_quit(&self) {
        self.quit.store(true, Ordering::Relaxed);
    }

    /// Whether quit was requested.
    #[inline]
    pub fn quit_requested(&self) -> bool {
        self.quit.load(Ordering::Relaxed)
    }
}

/// Builder for configuring the engine.
#[derive(Default)]
pub struct EngineBuilder {
    config: EngineConfig,
    scene: Option<Scene>,
    output: Option<Box<dyn Write + Send>>,
}

impl EngineBuilder {
    /// Create a new engine builder with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the display size in cells.
    pub fn size(mut self, width: usize, height: usize) -> Self {
        self.config.width = width;
        self.config.height = height;
        self
    }

    /// Set the target frame rate.
    pub fn target_fps(mut self, fps: f64) -> Self {
        self.config.target_fps = fps;
        self
    }

    /// Set ANSI color output.
    pub fn color(mut self, enabled: bool) -> Self {
        self.config.use_color = enabled;
        self
    }

    /// Set the debug row.
    pub fn debug(mut self, enabled: bool) -> Self {
        self.config.show_debug = enabled;
        self
    }

    /// Set the scene to render.
    pub fn scene(mut self, scene: Scene) -> Self {
        self.scene = Some(scene);
        self
    }

    /// Set the byte sink frames are written to. Defaults to stdout.
    pub fn output(mut self, output: impl Write + Send + 'static) -> Self {
        self.output = Some(Box::new(output));
        self
    }

    /// Build and initialize the engine.
    pub fn build(self) -> Result<Engine, RenderError> {
        let renderer = SoftwareRenderer::new(self.config)?;
        let renderer = match self.output {
            Some(output) => renderer.with_output(output),
            None => renderer,
        };
        Engine::with_renderer(renderer, self.scene.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ConfigError, RenderMode};
    use crate::scene::SceneNode;
    use std::io;
    use std::thread;
    use std::time::Duration;

    fn headless(config: EngineConfig) -> EngineBuilder {
        EngineBuilder::new().config(config).output(io::sink())
    }

    #[test]
    fn test_build_validates() {
        let err = headless(EngineConfig::new(4, 4).with_workers(0)).build().unwrap_err();
        assert!(matches!(err, RenderError::InvalidConfig(ConfigError::ZeroWorkers)));
    }

    #[test]
    fn test_step_runs_updates_and_counts_frames() {
        let mut scene = Scene::new();
        let node = SceneNode::new("spinner").with_update(|node, dt| node.transform.translate(&crate::math::Vector3::new(dt, 0.0, 0.0)));
        let id = scene.add_node(node, None).unwrap();
        let mut engine = headless(EngineConfig::new(8, 4)).scene(scene).build().unwrap();
        engine.step(0.5);
        engine.step(0.25);
        assert_eq!(engine.frames(), 2);
        let x = engine.scene.node(id).unwrap().transform.position().x;
        assert!((x - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_run_stops_on_quit() {
        let config = EngineConfig::new(8, 4).with_target_fps(200.0).with_render_mode(RenderMode::ParallelTiles);
        let mut engine = headless(config).build().unwrap();
        let quit = engine.quit_handle();
        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            quit.store(true, Ordering::Relaxed);
        });
        engine.run();
        stopper.join().unwrap();
        assert!(engine.quit_requested());
        assert!(!engine.renderer.is_initialized());
    }

    #[test]
    fn test_quit_before_run() {
        let mut engine = headless(EngineConfig::new(8, 4)).build().unwrap();
        engine.request_quit();
        engine.run();
        assert_eq!(engine.frames(), 0);
        assert_eq!(engine.dimensions(), (8, 4));
    }
}
