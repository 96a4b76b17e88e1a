//! # termray - Software 3D Rendering Core
//!
//! termray renders a hierarchical scene on the CPU into a character
//! framebuffer and writes it to a terminal as ANSI text.
//!
//! ## Features
//!
//! - **Math**: f64 vectors, matrices, quaternions, planes, rays, bounding volumes
//! - **Scene**: node arena with parent/child transforms, tags and update callbacks
//! - **Render**: near-plane clipping, scan-line rasterization with a z-buffer,
//!   tiled and job-based parallel rendering, SSAA/MSAA/FXAA
//! - **Spatial**: octree and SAH-built BVH for frustum and ray queries
//! - **LOD**: distance or screen-coverage level selection with fade and dither transitions
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use termray::prelude::*;
//!
//! let mut scene = Scene::new().with_camera(
//!     Camera::new(90.0, 60.0, 0.1, 100.0)?.looking_at(Vector3::new(0.0, 0.0, -5.0), Vector3::ZERO),
//! );
//! let material = Arc::new(Material::new(Rgb::WHITE));
//! let triangle = Triangle::new(
//!     Vector3::new(-1.0, -1.0, 0.0),
//!     Vector3::new(1.0, -1.0, 0.0),
//!     Vector3::new(0.0, 1.0, 0.0),
//!     material,
//! );
//! scene.add_node(SceneNode::new("triangle").with_payload(triangle), None)?;
//!
//! let mut engine = EngineBuilder::new().size(80, 40).scene(scene).build()?;
//! engine.run();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]

pub mod camera;
pub mod core;
pub mod geometry;
pub mod light;
pub mod lod;
pub mod material;
pub mod math;
pub mod render;
pub mod scene;
pub mod spatial;

// Re-export commonly used types
pub mod prelude {
    //! Convenient re-exports of commonly used types.

    pub use crate::camera::{Camera, Projection};
    pub use crate::core::{
        AaMode, DropReason, Engine, EngineBuilder, EngineConfig, FrameStats, NodeId, Phase, Profiler, RenderError,
        RenderMode, SceneError,
    };
    pub use crate::geometry::{Circle, Line, Mesh, Quad, Triangle};
    pub use crate::light::{LightingSystem, PointLight};
    pub use crate::lod::{LodGroup, LodLevel, LodMetric, LodTransition, TransitionMode};
    pub use crate::material::Material;
    pub use crate::math::{Aabb, Color, Euler, Matrix4, Obb, Quaternion, Ray, Rgb, Sphere, Vector3};
    pub use crate::render::{FrameBuffer, RenderContext, Renderer, SoftwareRenderer};
    pub use crate::scene::{Payload, RaycastHit, Scene, SceneNode, Transform};
    pub use crate::spatial::{Bvh, Octree, SpatialEntry, SpatialIndex};
}

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = "termray";
