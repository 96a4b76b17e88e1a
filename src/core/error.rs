//! Error types.
//!
//! Only setup and scene mutation can fail. Per-frame rendering never returns an
//! error; dropped primitives are classified with [`DropReason`] and counted.

use super::NodeId;
use thiserror::Error;

/// Invalid [`EngineConfig`](super::EngineConfig) values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Width or height is zero.
    #[error("viewport must be non-empty, got {width}x{height}")]
    ZeroDimensions {
        /// Requested width.
        width: usize,
        /// Requested height.
        height: usize,
    },

    /// Worker count is zero.
    #[error("worker pool needs at least one worker")]
    ZeroWorkers,

    /// Tile size is zero.
    #[error("tile size must be at least 1")]
    ZeroTileSize,

    /// Batch size is zero.
    #[error("batch size must be at least 1")]
    ZeroBatchSize,

    /// Target FPS is not a positive finite number.
    #[error("target fps must be positive and finite, got {0}")]
    InvalidFps(f64),
}

/// Errors surfaced by renderer setup.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The output sink could not be opened or written.
    #[error("failed to initialize render backend: {0}")]
    BackendInitialization(String),

    /// The configuration was rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// A frame operation was attempted before `initialize`.
    #[error("renderer is not initialized")]
    NotInitialized,
}

/// Errors from scene graph mutation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// Another node already uses this name.
    #[error("a node named `{0}` already exists")]
    DuplicateName(String),

    /// The node id does not belong to this scene.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// Reparenting would make a node its own ancestor.
    #[error("attaching {node} under {parent} would create a cycle")]
    CycleDetected {
        /// Node being moved.
        node: NodeId,
        /// Requested parent.
        parent: NodeId,
    },

    /// The root node cannot be removed or reparented.
    #[error("the root node cannot be removed or reparented")]
    RootImmutable,
}

/// Invalid camera parameters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CameraError {
    /// Near and far must satisfy `0 < near < far`.
    #[error("clip planes must satisfy 0 < near < far, got near={near} far={far}")]
    InvalidClipPlanes {
        /// Near plane distance.
        near: f64,
        /// Far plane distance.
        far: f64,
    },

    /// Field of view outside (0, 180) degrees.
    #[error("field of view must be in (0, 180) degrees, got {fov_x}x{fov_y}")]
    InvalidFov {
        /// Horizontal field of view.
        fov_x: f64,
        /// Vertical field of view.
        fov_y: f64,
    },
}

/// Why a primitive was skipped during a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropReason {
    /// Degenerate triangle, non-finite vertex, or out-of-range mesh index.
    InvalidGeometry,
    /// Entirely at or behind the near plane.
    BehindCamera,
    /// Facing away from the camera on a single-sided material.
    Backface,
    /// Bounds outside the view frustum.
    OutsideFrustum,
}

impl DropReason {
    /// All reasons, in counter order.
    pub const ALL: [DropReason; 4] = [
        DropReason::InvalidGeometry,
        DropReason::BehindCamera,
        DropReason::Backface,
        DropReason::OutsideFrustum,
    ];

    /// Counter slot for this reason.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Short label used in the debug line.
    pub const fn label(self) -> &'static str {
        match self {
            DropReason::InvalidGeometry => "invalid",
            DropReason::BehindCamera => "behind",
            DropReason::Backface => "backface",
            DropReason::OutsideFrustum => "culled",
        }
    }
}
