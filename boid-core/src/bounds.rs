use boid_shared::{CameraSettings, SurfaceSize};

use crate::error::FlockError;
use crate::vector::{Vector, Vector2D, Vector3D};

/// Axis-aligned region the agents are confined to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds<V> {
    pub min: V,
    pub max: V,
}

impl<V: Vector> Bounds<V> {
    /// Every axis must have a finite, strictly positive extent.
    pub fn new(min: V, max: V) -> Result<Self, FlockError> {
        for axis in 0..V::AXES {
            let extent = max.axis(axis) - min.axis(axis);
            if !extent.is_finite() || extent <= 0.0 {
                return Err(FlockError::InvalidBounds { axis, extent });
            }
        }
        Ok(Self { min, max })
    }

    /// Symmetric region `[-half, +half]` on every axis
    pub fn symmetric(half: V) -> Result<Self, FlockError> {
        Self::new(half * -1.0, half)
    }

    pub fn extent(&self) -> V {
        self.max - self.min
    }

    pub fn contains(&self, point: &V, epsilon: f32) -> bool {
        (0..V::AXES).all(|axis| {
            let value = point.axis(axis);
            value >= self.min.axis(axis) - epsilon && value <= self.max.axis(axis) + epsilon
        })
    }
}

impl Bounds<Vector2D> {
    /// Pixel bounds of a 2D drawing surface
    pub fn surface(size: SurfaceSize) -> Result<Self, FlockError> {
        Self::new(Vector2D::zero(), Vector2D::new(size.width, size.height))
    }
}

impl Bounds<Vector3D> {
    /// Visible volume in front of a perspective camera, shrunk by the camera margin
    pub fn from_camera(camera: &CameraSettings, size: SurfaceSize) -> Result<Self, FlockError> {
        if camera.margin.is_nan() || camera.margin <= 0.0 {
            return Err(FlockError::InvalidSetting("camera.margin"));
        }
        let half_fov = camera.fov_degrees.to_radians() / 2.0;
        let visible_height = 2.0 * half_fov.tan() * camera.distance;
        let visible_width = visible_height * size.aspect();

        Self::symmetric(Vector3D::new(
            visible_width / camera.margin,
            visible_height / camera.margin,
            camera.depth,
        ))
    }
}
