//! # Core Module
//!
//! Engine configuration, error types, frame timing, per-frame pools and
//! profiling, plus the [`Engine`] driver that ties a scene to a renderer.

mod engine;
mod error;
mod clock;
mod id;
mod pool;
mod profiler;

pub use engine::{Engine, EngineBuilder};
pub use error::{CameraError, ConfigError, DropReason, RenderError, SceneError};
pub use clock::{Clock, FrameLimiter};
pub use id::{IdGenerator, NodeId};
pub use pool::{FramePool, PoolMark};
pub use profiler::{FrameStats, Phase, Profiler};

use serde::{Deserialize, Serialize};

/// How a frame is distributed over workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RenderMode {
    /// Everything on the calling thread.
    #[default]
    Single,
    /// Screen split into tiles; each tile owns its pixels.
    ParallelTiles,
    /// One job per node, per-worker scratch buffers merged by depth.
    ParallelJobs,
    /// Like `ParallelJobs`, with `batch_size` nodes per job.
    ParallelBatched,
}

/// Antialiasing applied by the terminal sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AaMode {
    /// No antialiasing.
    #[default]
    None,
    /// Luminance-edge blur on the color buffer.
    Fxaa,
    /// Two horizontal samples per cell.
    Msaa2x,
    /// 2x2 samples per cell.
    Msaa4x,
    /// 2x2 supersampling.
    Ssaa,
}

impl AaMode {
    /// Samples per cell along x and y.
    pub const fn sample_grid(self) -> (usize, usize) {
        match self {
            AaMode::None | AaMode::Fxaa => (1, 1),
            AaMode::Msaa2x => (2, 1),
            AaMode::Msaa4x | AaMode::Ssaa => (2, 2),
        }
    }
}

/// Renderer and engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Viewport width in cells.
    pub width: usize,
    /// Viewport height in cells.
    pub height: usize,
    /// Frame rate cap for the engine loop.
    pub target_fps: f64,
    /// Emit 24-bit color instead of the glyph ramp.
    pub use_color: bool,
    /// Append the profiler summary below the frame.
    pub show_debug: bool,
    /// Work distribution strategy.
    pub render_mode: RenderMode,
    /// Worker threads for the parallel modes.
    pub num_workers: usize,
    /// Tile edge in cells for [`RenderMode::ParallelTiles`].
    pub tile_size: usize,
    /// Nodes per job for [`RenderMode::ParallelBatched`].
    pub batch_size: usize,
    /// Antialiasing mode.
    pub aa_mode: AaMode,
    /// Collect phase timings and warn on pool overflow.
    pub profiling: bool,
    /// Preallocated triangles per worker pool.
    pub pool_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: 80,
            height: 40,
            target_fps: 30.0,
            use_color: false,
            show_debug: false,
            render_mode: RenderMode::Single,
            num_workers: 4,
            tile_size: 16,
            batch_size: 8,
            aa_mode: AaMode::None,
            profiling: false,
            pool_capacity: 1024,
        }
    }
}

impl EngineConfig {
    /// Default config with the given viewport.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Set target fps.
    pub fn with_target_fps(mut self, fps: f64) -> Self {
        self.target_fps = fps;
        self
    }

    /// Enable or disable color output.
    pub fn with_color(mut self, enabled: bool) -> Self {
        self.use_color = enabled;
        self
    }

    /// Enable or disable the debug row.
    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.show_debug = enabled;
        self
    }

    /// Set render mode.
    pub fn with_render_mode(mut self, mode: RenderMode) -> Self {
        self.render_mode = mode;
        self
    }

    /// Set worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.num_workers = workers;
        self
    }

    /// Set tile size.
    pub fn with_tile_size(mut self, tile_size: usize) -> Self {
        self.tile_size = tile_size;
        self
    }

    /// Set batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set antialiasing mode.
    pub fn with_aa(mut self, mode: AaMode) -> Self {
        self.aa_mode = mode;
        self
    }

    /// Enable or disable profiling.
    pub fn with_profiling(mut self, enabled: bool) -> Self {
        self.profiling = enabled;
        self
    }

    /// Set pool capacity.
    pub fn with_pool_capacity(mut self, capacity: usize) -> Self {
        self.pool_capacity = capacity;
        self
    }

    /// Check every field against its documented range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::ZeroDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.num_workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if self.tile_size == 0 {
            return Err(ConfigError::ZeroTileSize);
        }
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if !(self.target_fps > 0.0 && self.target_fps.is_finite()) {
            return Err(ConfigError::InvalidFps(self.target_fps));
        }
        Ok(())
    }

    /// Workers actually used by the configured mode.
    pub fn effective_workers(&self) -> usize {
        match self.render_mode {
            RenderMode::Single => 1,
            _ => self.num_workers.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(EngineConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects() {
        assert!(matches!(
            EngineConfig::new(0, 10).validate(),
            Err(ConfigError::ZeroDimensions { width: 0, height: 10 })
        ));
        assert_eq!(EngineConfig::default().with_workers(0).validate(), Err(ConfigError::ZeroWorkers));
        assert_eq!(EngineConfig::default().with_tile_size(0).validate(), Err(ConfigError::ZeroTileSize));
        assert!(matches!(
            EngineConfig::default().with_target_fps(f64::NAN).validate(),
            Err(ConfigError::InvalidFps(_))
        ));
    }

    #[test]
    fn test_sample_grid() {
        assert_eq!(AaMode::Msaa2x.sample_grid(), (2, 1));
        assert_eq!(AaMode::Ssaa.sample_grid(), (2, 2));
        assert_eq!(AaMode::Fxaa.sample_grid(), (1, 1));
    }

    #[test]
    fn test_single_mode_uses_one_worker() {
        let config = EngineConfig::default().with_workers(8);
        assert_eq!(config.effective_workers(), 1);
        assert_eq!(config.with_render_mode(RenderMode::ParallelTiles).effective_workers(), 8);
    }
}
