//! Perspective camera.

use crate::core::CameraError;
use crate::math::{Frustum, Matrix4, Ray, Sphere, Vector3};
use crate::scene::Transform;

/// Result of projecting a view-space point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// On the near side of the camera; `x`/`y` are pixel coordinates and
    /// `depth` is view-space z.
    Visible {
        /// Horizontal pixel coordinate.
        x: f64,
        /// Vertical pixel coordinate, growing downwards.
        y: f64,
        /// View-space depth.
        depth: f64,
    },
    /// At or behind the near plane.
    BehindCamera,
}

impl Projection {
    /// Pixel position and depth, if visible.
    #[inline]
    pub fn visible(&self) -> Option<(f64, f64, f64)> {
        match *self {
            Projection::Visible { x, y, depth } => Some((x, y, depth)),
            Projection::BehindCamera => None,
        }
    }
}

/// A perspective camera looking down its local +Z axis.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera placement. Only position and rotation are meaningful.
    pub transform: Transform,
    fov_x: f64,
    fov_y: f64,
    near: f64,
    far: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            transform: Transform::new(),
            fov_x: 90.0,
            fov_y: 60.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Camera {
    /// Create a camera. Fields of view are full angles in degrees.
    pub fn new(fov_x: f64, fov_y: f64, near: f64, far: f64) -> Result<Self, CameraError> {
        Self::check(fov_x, fov_y, near, far)?;
        Ok(Self {
            transform: Transform::new(),
            fov_x,
            fov_y,
            near,
            far,
        })
    }

    fn check(fov_x: f64, fov_y: f64, near: f64, far: f64) -> Result<(), CameraError> {
        // Written so NaN fails too.
        if !(near > 0.0 && far > near) {
            return Err(CameraError::InvalidClipPlanes { near, far });
        }
        let fov_ok = |f: f64| f > 0.0 && f < 180.0;
        if !(fov_ok(fov_x) && fov_ok(fov_y)) {
            return Err(CameraError::InvalidFov { fov_x, fov_y });
        }
        Ok(())
    }

    /// Place the camera at `position` looking at `target`.
    pub fn looking_at(mut self, position: Vector3, target: Vector3) -> Self {
        self.transform.set_position(position);
        self.transform.look_at(&target);
        self
    }

    /// Change the lens parameters.
    pub fn set_lens(&mut self, fov_x: f64, fov_y: f64, near: f64, far: f64) -> Result<(), CameraError> {
        Self::check(fov_x, fov_y, near, far)?;
        self.fov_x = fov_x;
        self.fov_y = fov_y;
        self.near = near;
        self.far = far;
        Ok(())
    }

    /// Horizontal field of view in degrees.
    #[inline]
    pub fn fov_x(&self) -> f64 {
        self.fov_x
    }

    /// Vertical field of view in degrees.
    #[inline]
    pub fn fov_y(&self) -> f64 {
        self.fov_y
    }

    /// Near plane distance.
    #[inline]
    pub fn near(&self) -> f64 {
        self.near
    }

    /// Far plane distance.
    #[inline]
    pub fn far(&self) -> f64 {
        self.far
    }

    /// `1 / tan(fov_x / 2)`.
    #[inline]
    pub fn scale_x(&self) -> f64 {
        1.0 / (self.fov_x.to_radians() * 0.5).tan()
    }

    /// `1 / tan(fov_y / 2)`.
    #[inline]
    pub fn scale_y(&self) -> f64 {
        1.0 / (self.fov_y.to_radians() * 0.5).tan()
    }

    /// Camera-to-world matrix.
    pub fn world_matrix(&self) -> Matrix4 {
        self.transform.parent_world().multiply(&self.transform.local_matrix())
    }

    /// World-to-view matrix. Identity if the camera transform is singular.
    pub fn view_matrix(&self) -> Matrix4 {
        self.world_matrix().try_inverse().unwrap_or(Matrix4::IDENTITY)
    }

    /// Clip-space projection for this lens. Its NDC x/y match
    /// [`Camera::screen_position`].
    pub fn projection_matrix(&self) -> Matrix4 {
        let fov_y = self.fov_y.to_radians();
        Matrix4::perspective_lh(fov_y, self.scale_y() / self.scale_x(), self.near, self.far)
    }

    /// World-space camera position.
    pub fn position(&self) -> Vector3 {
        self.world_matrix().get_position()
    }

    /// World-space viewing direction.
    pub fn direction(&self) -> Vector3 {
        self.world_matrix().transform_direction(&Vector3::FORWARD).normalized()
    }

    /// Project a view-space point to pixel coordinates of a `width` x `height` target.
    pub fn project_view(&self, v: &Vector3, width: usize, height: usize) -> Projection {
        if !(v.z > self.near) {
            return Projection::BehindCamera;
        }
        let (x, y) = self.screen_position(v, width, height);
        Projection::Visible { x, y, depth: v.z }
    }

    /// Pixel coordinates of a view-space point without the near-plane check.
    /// Meant for clipper output, whose new vertices sit exactly on `near`.
    #[inline]
    pub fn screen_position(&self, v: &Vector3, width: usize, height: usize) -> (f64, f64) {
        let ndc_x = v.x * self.scale_x() / v.z;
        let ndc_y = v.y * self.scale_y() / v.z;
        ((ndc_x + 1.0) * width as f64 * 0.5, (1.0 - ndc_y) * height as f64 * 0.5)
    }

    /// Project a world-space point.
    pub fn project_point(&self, p: &Vector3, width: usize, height: usize) -> Projection {
        self.project_view(&self.view_matrix().transform_point(p), width, height)
    }

    /// View-space frustum.
    pub fn view_frustum(&self) -> Frustum {
        Frustum::from_perspective(self.fov_x, self.fov_y, self.near, self.far)
    }

    /// World-space frustum.
    pub fn frustum(&self) -> Frustum {
        self.view_frustum().transformed(&self.world_matrix())
    }

    /// Conservative visibility test for a world-space sphere.
    pub fn sphere_in_frustum(&self, sphere: &Sphere) -> bool {
        let center = self.view_matrix().transform_point(&sphere.center);
        if center.z + sphere.radius < self.near || center.z - sphere.radius > self.far {
            return false;
        }
        self.view_frustum()
            .intersects_sphere(&Sphere::new(center, sphere.radius))
    }

    /// World-space ray through pixel coordinate (`px`, `py`). Pixel centers
    /// sit at half-integer coordinates.
    pub fn screen_ray(&self, px: f64, py: f64, width: usize, height: usize) -> Ray {
        let ndc_x = px / width as f64 * 2.0 - 1.0;
        let ndc_y = 1.0 - py / height as f64 * 2.0;
        let dir = Vector3::new(ndc_x / self.scale_x(), ndc_y / self.scale_y(), 1.0);
        let world = self.world_matrix();
        Ray::new(world.get_position(), world.transform_direction(&dir))
    }

    /// Angular size of a sphere as a fraction of the horizontal field of view.
    pub fn screen_coverage(&self, center: &Vector3, radius: f64) -> f64 {
        let distance = self.position().distance_to(center);
        if distance <= radius {
            return f64::INFINITY;
        }
        (2.0 * (radius / distance).atan()).to_degrees() / self.fov_x
    }
}
