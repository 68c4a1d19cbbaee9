//! Sphere surface.

use solidkit_math::{Bounds, Point3, Vec3};

use crate::error::{Result, SurfaceError};
use crate::intersect::{forward, quadratic_roots};
use crate::{Ray, Sense, Surface, SurfaceKind};

/// A sphere; the negative side is the enclosed ball.
#[derive(Debug, Clone, PartialEq)]
pub struct Sphere {
    /// Centre point.
    pub centre: Point3,
    /// Radius (always positive).
    pub radius: f64,
}

impl Sphere {
    /// Sphere about `centre` with the given radius.
    pub fn new(centre: Point3, radius: f64) -> Result<Self> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(SurfaceError::InvalidRadius(radius));
        }
        Ok(Self { centre, radius })
    }
}

impl Surface for Sphere {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Sphere
    }

    fn signed_distance(&self, p: &Point3) -> f64 {
        (p - self.centre).norm() - self.radius
    }

    fn normal_at(&self, p: &Point3) -> Vec3 {
        let v = p - self.centre;
        let n = v.norm();
        if n < f64::EPSILON {
            // Any direction is normal at the centre.
            Vec3::z()
        } else {
            v / n
        }
    }

    fn intersect(&self, ray: &Ray) -> Vec<f64> {
        let oc = ray.origin - self.centre;
        let d = ray.direction.as_ref();

        // |oc + t*d|^2 = r^2
        let a = d.dot(d);
        let b = 2.0 * oc.dot(d);
        let c = oc.dot(&oc) - self.radius * self.radius;
        forward(quadratic_roots(a, b, c))
    }

    fn refine_bounds(&self, bounds: &mut Bounds, sense: Sense) {
        if sense == Sense::Negative {
            let r = Vec3::repeat(self.radius);
            *bounds = bounds.intersect(&Bounds::new(self.centre - r, self.centre + r));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Side;

    #[test]
    fn test_invalid_radius() {
        assert_eq!(
            Sphere::new(Point3::origin(), 0.0).unwrap_err(),
            SurfaceError::InvalidRadius(0.0)
        );
        assert!(Sphere::new(Point3::origin(), -1.0).is_err());
        assert!(Sphere::new(Point3::origin(), f64::NAN).is_err());
    }

    #[test]
    fn test_ray_through_centre() {
        let s = Sphere::new(Point3::origin(), 4.1).unwrap();
        let ray = Ray::new(Point3::new(-10.0, 0.0, 0.0), Vec3::x()).unwrap();
        let hits = s.intersect(&ray);
        assert_eq!(hits.len(), 2);
        assert!((hits[0] - 5.9).abs() < 1e-10);
        assert!((hits[1] - 14.1).abs() < 1e-10);
    }

    #[test]
    fn test_ray_from_inside() {
        let s = Sphere::new(Point3::new(1.0, 1.0, 1.0), 2.0).unwrap();
        let ray = Ray::new(Point3::new(1.0, 1.0, 1.0), Vec3::y()).unwrap();
        let hits = s.intersect(&ray);
        assert_eq!(hits.len(), 1);
        assert!((hits[0] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_ray_misses() {
        let s = Sphere::new(Point3::origin(), 1.0).unwrap();
        let ray = Ray::new(Point3::new(-5.0, 2.0, 0.0), Vec3::x()).unwrap();
        assert!(s.intersect(&ray).is_empty());
    }

    #[test]
    fn test_normal_points_outward() {
        let s = Sphere::new(Point3::new(0.0, 0.0, 1.0), 3.0).unwrap();
        let n = s.normal_at(&Point3::new(0.0, 3.0, 1.0));
        assert!((n - Vec3::y()).norm() < 1e-12);
        assert_eq!(s.side(&Point3::new(0.0, 0.0, 3.9)), Side::Negative);
    }

    #[test]
    fn test_bounds_only_for_interior() {
        let s = Sphere::new(Point3::new(1.0, 0.0, 0.0), 2.0).unwrap();
        let mut b = Bounds::symmetric(1e10);
        s.refine_bounds(&mut b, Sense::Negative);
        assert_eq!(b.min, Point3::new(-1.0, -2.0, -2.0));
        assert_eq!(b.max, Point3::new(3.0, 2.0, 2.0));

        let mut outside = Bounds::symmetric(1e10);
        s.refine_bounds(&mut outside, Sense::Positive);
        assert_eq!(outside, Bounds::symmetric(1e10));
    }
}
