//! Camera

use crate::geometry::*;
use crate::pbrt::*;

/// Camera ray with the screen position it was generated for.
#[derive(Copy, Clone, Debug)]
pub struct CameraRay {
    /// Ray origin.
    pub origin: Point3f,

    /// Unit ray direction.
    pub dir: Vector3f,

    /// Screen position in [-1, 1]².
    pub screen_pos: Point2f,
}

/// Pinhole perspective camera.
#[derive(Clone, Debug)]
pub struct PinholeCamera {
    /// Camera position.
    position: Point3f,

    /// Unit viewing direction.
    forward: Vector3f,

    /// Unit screen x-axis scaled by the half width of the view plane.
    right: Vector3f,

    /// Unit screen y-axis scaled by the half height of the view plane.
    up: Vector3f,

    /// Image width in pixels.
    width: usize,

    /// Image height in pixels.
    height: usize,

    /// Tangent of half the horizontal field of view.
    tan_half_fov: Float,
}

impl PinholeCamera {
    /// Create a new `PinholeCamera`.
    ///
    /// * `position` - Camera position.
    /// * `look_at`  - Point the camera looks at.
    /// * `up`       - Approximate up direction.
    /// * `fov`      - Horizontal field of view in degrees.
    /// * `width`    - Image width in pixels.
    /// * `height`   - Image height in pixels.
    pub fn new(position: Point3f, look_at: Point3f, up: Vector3f, fov: Float, width: usize, height: usize) -> Self {
        let forward = (look_at - position).normalize();
        let right = forward.cross(&up).normalize();
        let up = right.cross(&forward);
        let tan_half_fov = (fov.to_radians() * 0.5).tan();
        let aspect = width as Float / height.max(1) as Float;
        Self {
            position,
            forward,
            right: right * tan_half_fov,
            up: up * (tan_half_fov / aspect),
            width,
            height,
            tan_half_fov,
        }
    }

    /// Returns the world-space size of a pixel at unit distance.
    pub fn world_resolution(&self) -> Float {
        2.0 * self.tan_half_fov / self.width.max(1) as Float
    }

    /// Returns the image width and height in pixels.
    pub fn resolution(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Returns the image width over height.
    pub fn aspect_ratio(&self) -> Float {
        self.width as Float / self.height.max(1) as Float
    }

    /// Generate the ray through a raster position.
    ///
    /// * `x` - Raster x-coordinate.
    /// * `y` - Raster y-coordinate.
    pub fn generate_ray(&self, x: Float, y: Float) -> CameraRay {
        let sx = 2.0 * x / self.width as Float - 1.0;
        let sy = 1.0 - 2.0 * y / self.height as Float;
        CameraRay {
            origin: self.position,
            dir: (self.forward + self.right * sx + self.up * sy).normalize(),
            screen_pos: Point2f::new(sx, sy),
        }
    }
}
