use core::ops::{Add, AddAssign, Div, Mul, Sub};

/// Per-axis access shared by the 2D and 3D vectors so one update rule serves both
pub trait Vector:
    Copy
    + core::fmt::Debug
    + PartialEq
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<f32, Output = Self>
    + Div<f32, Output = Self>
    + AddAssign
{
    const AXES: usize;

    fn zero() -> Self;

    /// Component `i`; panics if `i >= AXES`
    fn axis(&self, i: usize) -> f32;

    fn axis_mut(&mut self, i: usize) -> &mut f32;

    fn dot(&self, other: &Self) -> f32 {
        (0..Self::AXES).map(|i| self.axis(i) * other.axis(i)).sum()
    }

    fn magnitude(&self) -> f32 {
        self.dot(self).sqrt()
    }

    fn normalize(&self) -> Self {
        let mag = self.magnitude();
        if mag > 0.0 {
            *self / mag
        } else {
            Self::zero()
        }
    }

    /// Rescale to exactly `max` when longer, preserving direction
    fn limit(&self, max: f32) -> Self {
        if self.magnitude() > max {
            self.normalize() * max
        } else {
            *self
        }
    }

    fn distance(&self, other: &Self) -> f32 {
        (*self - *other).magnitude()
    }

    fn components(&self) -> Vec<f32> {
        (0..Self::AXES).map(|i| self.axis(i)).collect()
    }
}

/// A 2D vector used for canvas positions and velocities
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2D {
    pub x: f32,
    pub y: f32,
}

impl Vector2D {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A 3D vector used for the instanced flock
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3D {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3D {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn cross(&self, other: &Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }
}

impl Vector for Vector2D {
    const AXES: usize = 2;

    fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    fn axis(&self, i: usize) -> f32 {
        match i {
            0 => self.x,
            1 => self.y,
            _ => panic!("axis {i} out of range for Vector2D"),
        }
    }

    fn axis_mut(&mut self, i: usize) -> &mut f32 {
        match i {
            0 => &mut self.x,
            1 => &mut self.y,
            _ => panic!("axis {i} out of range for Vector2D"),
        }
    }
}

impl Vector for Vector3D {
    const AXES: usize = 3;

    fn zero() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    fn axis(&self, i: usize) -> f32 {
        match i {
            0 => self.x,
            1 => self.y,
            2 => self.z,
            _ => panic!("axis {i} out of range for Vector3D"),
        }
    }

    fn axis_mut(&mut self, i: usize) -> &mut f32 {
        match i {
            0 => &mut self.x,
            1 => &mut self.y,
            2 => &mut self.z,
            _ => panic!("axis {i} out of range for Vector3D"),
        }
    }
}

impl Add for Vector2D {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl Sub for Vector2D {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl Mul<f32> for Vector2D {
    type Output = Self;

    fn mul(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }
}

impl Div<f32> for Vector2D {
    type Output = Self;

    fn div(self, scalar: f32) -> Self {
        Self {
            x: self.x / scalar,
            y: self.y / scalar,
        }
    }
}

impl AddAssign for Vector2D {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl Add for Vector3D {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl Sub for Vector3D {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl Mul<f32> for Vector3D {
    type Output = Self;

    fn mul(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
            z: self.z * scalar,
        }
    }
}

impl Div<f32> for Vector3D {
    type Output = Self;

    fn div(self, scalar: f32) -> Self {
        Self {
            x: self.x / scalar,
            y: self.y / scalar,
            z: self.z / scalar,
        }
    }
}

impl AddAssign for Vector3D {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
        self.z += other.z;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector2d_magnitude() {
        let v = Vector2D::new(3.0, 4.0);
        assert_eq!(v.magnitude(), 5.0);
    }

    #[test]
    fn test_normalize_zero_stays_zero() {
        assert_eq!(Vector3D::zero().normalize(), Vector3D::zero());
    }

    #[test]
    fn test_limit_rescales_to_exact_max() {
        let v = Vector2D::new(6.0, 8.0).limit(5.0);
        assert!(v.distance(&Vector2D::new(3.0, 4.0)) < 1e-6);
        assert!((v.magnitude() - 5.0).abs() < 1e-6);

        let short = Vector2D::new(0.3, 0.4);
        assert_eq!(short.limit(5.0), short);
    }

    #[test]
    fn test_vector3d_operations() {
        let v1 = Vector3D::new(1.0, 2.0, 3.0);
        let v2 = Vector3D::new(3.0, 4.0, 5.0);

        assert_eq!(v1 + v2, Vector3D::new(4.0, 6.0, 8.0));
        assert_eq!(v2 - v1, Vector3D::new(2.0, 2.0, 2.0));
        assert_eq!(v1 * 2.0, Vector3D::new(2.0, 4.0, 6.0));
        assert_eq!(v1.dot(&v2), 26.0);
    }

    #[test]
    fn test_cross_follows_right_hand_rule() {
        let x = Vector3D::new(1.0, 0.0, 0.0);
        let y = Vector3D::new(0.0, 1.0, 0.0);
        assert_eq!(x.cross(&y), Vector3D::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_axis_view_matches_fields() {
        let mut v = Vector3D::new(1.0, 2.0, 3.0);
        *v.axis_mut(2) = -7.0;
        assert_eq!(v.axis(0), 1.0);
        assert_eq!(v.z, -7.0);
        assert_eq!(v.components(), vec![1.0, 2.0, -7.0]);
    }
}
