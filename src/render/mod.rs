//! # Render Module
//!
//! The software pipeline: near-plane clipping, scan-line rasterization into
//! a character framebuffer with a z-buffer, antialiasing resolves, and
//! tiled or job-based parallel rendering.

mod antialias;
mod clip;
mod framebuffer;
mod parallel;
mod pipeline;
mod raster;
mod renderer;
mod scratch;
mod target;

pub use antialias::{fxaa, raster_size, resolve_box};
pub use clip::{clip_face, clip_line, clip_triangle, ClipOutput, ClipVertex};
pub use framebuffer::{FrameBuffer, TileView};
pub use parallel::{bin_items, draw_translucent, merge_scratch, render_jobs, render_tiles, screen_bounds, TileReport};
pub use pipeline::{slope_glyph, DrawItem, FrameContext, Pass, Primitive, Worker};
pub use raster::{rasterize_line, rasterize_triangle, ScreenVertex};
pub use renderer::{RenderContext, Renderer, SoftwareRenderer};
pub use scratch::ScratchBuffer;
pub use target::{bayer_threshold, write_cell, Cell, ClipRect, Fragment, FragmentMode, RenderTarget};
