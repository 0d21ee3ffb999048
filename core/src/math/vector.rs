use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// Cartesian vector in the local east/north/up frame (metres or m/s).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn norm(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Length of the east/north component only.
    pub fn horizontal_norm(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Linear interpolation, `t` in `[0, 1]`.
    pub fn lerp(self, other: Vec3, t: f64) -> Vec3 {
        self + (other - self) * t
    }

    /// Heading of the horizontal component in radians, `None` when stationary.
    pub fn heading(self) -> Option<f64> {
        if self.horizontal_norm() < f64::EPSILON {
            None
        } else {
            Some(self.x.atan2(self.y))
        }
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f64) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn norms_split_horizontal_and_vertical() {
        let v = Vec3::new(3.0, 4.0, 12.0);
        assert_eq!(v.horizontal_norm(), 5.0);
        assert_eq!(v.norm(), 13.0);
    }

    #[test]
    fn heading_is_clockwise_from_north() {
        let east = Vec3::new(10.0, 0.0, 0.0).heading().unwrap();
        assert!((east - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert!(Vec3::new(0.0, 0.0, 5.0).heading().is_none());
    }
}
