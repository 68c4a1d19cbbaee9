//! Ray representation.

use solidkit_math::{Dir3, Point3, Vec3};

/// A half-line defined by origin and unit direction.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Origin point of the ray.
    pub origin: Point3,
    /// Unit direction of the ray.
    pub direction: Dir3,
}

impl Ray {
    /// Create a ray; `direction` is normalized.
    ///
    /// Returns `None` for a zero-length direction.
    pub fn new(origin: Point3, direction: Vec3) -> Option<Self> {
        Dir3::try_new(direction, 1e-300).map(|direction| Self { origin, direction })
    }

    /// Create a ray from an already normalized direction.
    pub fn from_unit(origin: Point3, direction: Dir3) -> Self {
        Self { origin, direction }
    }

    /// Evaluate the ray at parameter `t`: `origin + t * direction`.
    #[inline]
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + t * self.direction.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Point3::origin(), Vec3::new(2.0, 0.0, 0.0)).unwrap();
        let p = ray.at(5.0);
        assert!((p.x - 5.0).abs() < 1e-12);
        assert!(p.y.abs() < 1e-12);
        assert!(p.z.abs() < 1e-12);
    }

    #[test]
    fn test_zero_direction_rejected() {
        assert!(Ray::new(Point3::origin(), Vec3::zeros()).is_none());
    }
}
