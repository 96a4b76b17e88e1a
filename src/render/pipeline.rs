//! Per-primitive geometry pipeline: world transform, shading, view
//! transform, near clipping, projection and rasterization.

use super::clip::{clip_line, clip_triangle, ClipVertex};
use super::raster::{rasterize_line, rasterize_triangle, ScreenVertex};
use super::target::{Fragment, FragmentMode, RenderTarget};
use crate::camera::Camera;
use crate::core::{DropReason, FramePool, FrameStats, NodeId};
use crate::geometry::{Circle, Line, Mesh, Quad, Triangle};
use crate::light::{glyph_for_brightness, LightingSystem, SOLID_GLYPH};
use crate::lod::LodDraw;
use crate::math::{Aabb, Matrix4, Rgb, Vector3};
use crate::scene::Payload;
use std::borrow::Cow;

/// Twice-area below which a world-space triangle counts as degenerate.
const DEGENERATE_AREA: f64 = 1e-12;

/// Read-only state shared by every worker during a frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameContext<'a> {
    /// Active camera.
    pub camera: &'a Camera,
    /// World to view transform, computed once per frame.
    pub view: Matrix4,
    /// Lights and ambient term.
    pub lighting: &'a LightingSystem,
    /// Emit solid colored cells instead of ramp glyphs.
    pub use_color: bool,
}

impl<'a> FrameContext<'a> {
    /// Context for a camera and lighting setup.
    pub fn new(camera: &'a Camera, lighting: &'a LightingSystem, use_color: bool) -> Self {
        Self {
            camera,
            view: camera.view_matrix(),
            lighting,
            use_color,
        }
    }
}

/// Which parts of a [`DrawItem`] a pass draws.
///
/// A frame draws every solid part first, then every translucent part in
/// submission order, so blends always mix with the finished solid surface
/// behind them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// Opaque and dithered parts. These test and write depth.
    Solid,
    /// Blended parts. These test depth without writing it.
    Translucent,
}

impl Pass {
    /// Whether parts drawn with `mode` belong to this pass.
    #[inline]
    pub fn includes(self, mode: FragmentMode) -> bool {
        mode.is_translucent() == (self == Pass::Translucent)
    }
}

/// Borrowed geometry of one node.
#[derive(Debug, Clone)]
pub enum Primitive<'a> {
    /// Single triangle.
    Triangle(&'a Triangle),
    /// Quad, drawn as two triangles.
    Quad(&'a Quad),
    /// Line segment.
    Line(&'a Line),
    /// Disc, drawn as a fan.
    Circle(&'a Circle),
    /// Indexed mesh, possibly a blended LOD level.
    Mesh(Cow<'a, Mesh>),
}

/// One visible node, ready to draw.
#[derive(Debug, Clone)]
pub struct DrawItem<'a> {
    /// Position in the frame's node order. Breaks depth ties on merge.
    pub order: usize,
    /// Source node.
    pub node: NodeId,
    /// Local to world transform.
    pub world: Matrix4,
    /// World-space bounds used for binning.
    pub bounds: Aabb,
    /// Geometry with the blend mode it is drawn with.
    pub parts: Vec<(Primitive<'a>, FragmentMode)>,
}

impl<'a> DrawItem<'a> {
    /// Build the draw list for a payload. LOD groups contribute the meshes
    /// their current transition calls for.
    pub fn from_payload(order: usize, node: NodeId, world: Matrix4, payload: &'a Payload) -> Option<Self> {
        let opaque = FragmentMode::Opaque;
        let parts = match payload {
            Payload::Triangle(t) => vec![(Primitive::Triangle(t), opaque)],
            Payload::Quad(q) => vec![(Primitive::Quad(q), opaque)],
            Payload::Line(l) => vec![(Primitive::Line(l), opaque)],
            Payload::Circle(c) => vec![(Primitive::Circle(c), opaque)],
            Payload::Mesh(m) => vec![(Primitive::Mesh(Cow::Borrowed(m)), opaque)],
            Payload::Lod(group) => match group.draw()? {
                LodDraw::Single(m) => vec![(Primitive::Mesh(Cow::Borrowed(m)), opaque)],
                LodDraw::Fade { from, to, alpha } => vec![
                    (Primitive::Mesh(Cow::Borrowed(from)), FragmentMode::Blend(1.0 - alpha)),
                    (Primitive::Mesh(Cow::Borrowed(to)), FragmentMode::Blend(alpha)),
                ],
                LodDraw::CrossFade { from, to, alpha } => vec![
                    (Primitive::Mesh(Cow::Borrowed(from)), FragmentMode::Dither { alpha, invert: true }),
                    (Primitive::Mesh(Cow::Borrowed(to)), FragmentMode::Dither { alpha, invert: false }),
                ],
                LodDraw::Morph(mesh) => vec![(Primitive::Mesh(mesh), opaque)],
            },
        };
        Some(Self {
            order,
            node,
            world,
            bounds: payload.local_bounds().apply_matrix4(&world),
            parts,
        })
    }

    /// Whether any part is drawn in the translucent pass.
    pub fn has_translucent(&self) -> bool {
        self.parts.iter().any(|(_, mode)| mode.is_translucent())
    }
}

/// Stroke glyph following a segment's on-screen slope.
pub fn slope_glyph(dx: f64, dy: f64) -> char {
    let (ax, ay) = (dx.abs(), dy.abs());
    if ax >= ay * 2.0 {
        '-'
    } else if ay >= ax * 2.0 {
        '|'
    } else if (dx > 0.0) == (dy > 0.0) {
        '\\'
    } else {
        '/'
    }
}

/// Inverse transpose of the upper 3x3, for carrying normals into world space.
fn normal_matrix(world: &Matrix4) -> Matrix4 {
    world.try_inverse().map_or(*world, |inv| inv.transposed())
}

/// Per-thread rendering state: a triangle pool and frame counters.
///
/// Workers never share anything mutable; every frame each one draws into
/// the target it is handed and reports its counters at the end.
#[derive(Debug)]
pub struct Worker {
    pool: FramePool<[ScreenVertex; 3]>,
    stats: FrameStats,
}

impl Worker {
    /// Worker with `pool_capacity` preallocated screen triangles.
    pub fn new(pool_capacity: usize) -> Self {
        Self {
            pool: FramePool::with_capacity(pool_capacity),
            stats: FrameStats::default(),
        }
    }

    /// Counters of the frame in progress.
    #[inline]
    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Close the frame: reset the pool and hand back the counters.
    pub fn finish_frame(&mut self) -> FrameStats {
        self.stats.pool_overflows += self.pool.reset() as u64;
        std::mem::take(&mut self.stats)
    }

    /// Draw every part of a node.
    pub fn draw<T: RenderTarget + ?Sized>(&mut self, ctx: &FrameContext<'_>, item: &DrawItem<'_>, target: &mut T) {
        self.draw_all(ctx, std::iter::once(item), target);
    }

    /// Draw a sequence of items: the solid pass over all of them, then the
    /// translucent pass in the same order.
    pub fn draw_all<'i, 'a: 'i, I, T>(&mut self, ctx: &FrameContext<'_>, items: I, target: &mut T)
    where
        I: IntoIterator<Item = &'i DrawItem<'a>>,
        I::IntoIter: Clone,
        T: RenderTarget + ?Sized,
    {
        let items = items.into_iter();
        for item in items.clone() {
            self.draw_pass(ctx, item, Pass::Solid, target);
        }
        for item in items.filter(|item| item.has_translucent()) {
            self.draw_pass(ctx, item, Pass::Translucent, target);
        }
    }

    /// Draw the parts of a node that belong to `pass`.
    pub fn draw_pass<T: RenderTarget + ?Sized>(
        &mut self,
        ctx: &FrameContext<'_>,
        item: &DrawItem<'_>,
        pass: Pass,
        target: &mut T,
    ) {
        let normals = normal_matrix(&item.world);
        for (primitive, mode) in item.parts.iter().filter(|(_, mode)| pass.includes(*mode)) {
            match primitive {
                Primitive::Triangle(t) => {
                    self.draw_triangle(ctx, t, &item.world, &normals, *mode, item.order, target);
                }
                Primitive::Quad(q) => {
                    for t in &q.triangles() {
                        self.draw_triangle(ctx, t, &item.world, &normals, *mode, item.order, target);
                    }
                }
                Primitive::Circle(c) => {
                    for t in &c.triangles() {
                        self.draw_triangle(ctx, t, &item.world, &normals, *mode, item.order, target);
                    }
                }
                Primitive::Mesh(m) => self.draw_mesh(ctx, m, &item.world, &normals, *mode, item.order, target),
                Primitive::Line(l) => {
                    let a = item.world.transform_point(&l.start);
                    let b = item.world.transform_point(&l.end);
                    let fragment = Fragment::opaque(l.glyph.unwrap_or(' '), l.color, item.order).with_mode(*mode);
                    self.draw_segment(ctx, &a, &b, &fragment, l.glyph.is_none(), target);
                }
            }
        }
    }

    /// Draw all faces of a mesh. Faces with out-of-range indices are skipped.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_mesh<T: RenderTarget + ?Sized>(
        &mut self,
        ctx: &FrameContext<'_>,
        mesh: &Mesh,
        world: &Matrix4,
        normals: &Matrix4,
        mode: FragmentMode,
        order: usize,
        target: &mut T,
    ) {
        for face in mesh.faces() {
            match face {
                Some(t) => self.draw_triangle(ctx, &t, world, normals, mode, order, target),
                None => {
                    self.stats.triangles_submitted += 1;
                    self.stats.record_drop(DropReason::InvalidGeometry);
                }
            }
        }
    }

    /// Run one local-space triangle through the whole pipeline.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_triangle<T: RenderTarget + ?Sized>(
        &mut self,
        ctx: &FrameContext<'_>,
        triangle: &Triangle,
        world: &Matrix4,
        normals: &Matrix4,
        mode: FragmentMode,
        order: usize,
        target: &mut T,
    ) {
        self.stats.triangles_submitted += 1;
        let w = triangle.vertices.map(|v| world.transform_point(&v));
        let raw_normal = (w[1] - w[0]).cross(&(w[2] - w[0]));
        if !w.iter().all(Vector3::is_finite) || !(raw_normal.length() > DEGENERATE_AREA) {
            self.stats.record_drop(DropReason::InvalidGeometry);
            return;
        }
        let normal = match triangle.normal {
            Some(n) => normals.transform_direction(&n).normalized(),
            None => raw_normal.normalized(),
        };

        let material = &triangle.material;
        if material.wireframe {
            self.draw_wireframe(ctx, &w, material.wireframe_color, mode, order, target);
            return;
        }

        let Some(shade) = ctx.lighting.shade(&w, normal, material, triangle.glyph, ctx.use_color) else {
            self.stats.record_drop(DropReason::Backface);
            return;
        };

        let view = w.map(|v| ClipVertex::new(ctx.view.transform_point(&v)));
        let clipped = clip_triangle(view, ctx.camera.near());
        if clipped.is_empty() {
            self.stats.record_drop(DropReason::BehindCamera);
            return;
        }

        let (width, height) = target.size();
        let mark = self.pool.mark();
        for tri in clipped.as_slice() {
            let projected = tri.map(|v| {
                let (x, y) = ctx.camera.screen_position(&v.position, width, height);
                ScreenVertex::new(x, y, v.position.z)
            });
            self.pool.alloc(projected);
        }

        let fragment = Fragment::opaque(shade.glyph, shade.color, order).with_mode(mode);
        for screen in self.pool.since(mark) {
            self.stats.triangles_drawn += 1;
            self.stats.pixels_written += rasterize_triangle(target, *screen, &fragment) as u64;
        }
    }

    fn draw_wireframe<T: RenderTarget + ?Sized>(
        &mut self,
        ctx: &FrameContext<'_>,
        world: &[Vector3; 3],
        color: Rgb,
        mode: FragmentMode,
        order: usize,
        target: &mut T,
    ) {
        let glyph = if ctx.use_color {
            SOLID_GLYPH
        } else {
            glyph_for_brightness(color.luminance())
        };
        let fragment = Fragment::opaque(glyph, color, order).with_mode(mode);
        let mut visible = false;
        for i in 0..3 {
            visible |= self.draw_segment(ctx, &world[i], &world[(i + 1) % 3], &fragment, false, target);
        }
        if visible {
            self.stats.triangles_drawn += 1;
        } else {
            self.stats.record_drop(DropReason::BehindCamera);
        }
    }

    /// Clip and draw a world-space segment. With `slope` set the glyph is
    /// picked from the projected direction. Returns whether any part of it
    /// survived clipping.
    fn draw_segment<T: RenderTarget + ?Sized>(
        &mut self,
        ctx: &FrameContext<'_>,
        a: &Vector3,
        b: &Vector3,
        fragment: &Fragment,
        slope: bool,
        target: &mut T,
    ) -> bool {
        if !(a.is_finite() && b.is_finite()) {
            self.stats.record_drop(DropReason::InvalidGeometry);
            return false;
        }
        let near = ctx.camera.near();
        let Some((va, vb)) = clip_line(ctx.view.transform_point(a), ctx.view.transform_point(b), near) else {
            if slope {
                self.stats.record_drop(DropReason::BehindCamera);
            }
            return false;
        };
        let (width, height) = target.size();
        let project = |v: &Vector3| {
            let (x, y) = ctx.camera.screen_position(v, width, height);
            ScreenVertex::new(x, y, v.z)
        };
        let (sa, sb) = (project(&va), project(&vb));
        let mut fragment = *fragment;
        if slope {
            fragment.glyph = slope_glyph(sb.x - sa.x, sb.y - sa.y);
        }
        self.stats.lines_drawn += 1;
        self.stats.pixels_written += rasterize_line(target, sa, sb, &fragment) as u64;
        true
    }
}
