//! Infinite double-napped circular cone.

use std::f64::consts::FRAC_PI_2;

use solidkit_math::{Dir3, Point3, Vec3};

use crate::error::{Result, SurfaceError};
use crate::intersect::{forward, quadratic_roots, DEGENERATE};
use crate::{Ray, Surface, SurfaceKind};

/// A cone with both nappes; the negative side is the region within
/// `half_angle` of the axis line through the apex.
///
/// Finite cones are built by intersecting with capping planes.
#[derive(Debug, Clone, PartialEq)]
pub struct Cone {
    /// Apex point.
    pub apex: Point3,
    /// Axis direction.
    pub axis: Dir3,
    /// Half-angle between axis and surface, in radians.
    pub half_angle: f64,
}

impl Cone {
    /// Cone with apex, axis and half-angle in `(0, pi/2)`.
    pub fn new(apex: Point3, axis: Vec3, half_angle: f64) -> Result<Self> {
        if !(half_angle > 0.0 && half_angle < FRAC_PI_2) {
            return Err(SurfaceError::InvalidHalfAngle(half_angle));
        }
        let axis = Dir3::try_new(axis, DEGENERATE).ok_or(SurfaceError::ZeroVector("cone axis"))?;
        Ok(Self {
            apex,
            axis,
            half_angle,
        })
    }

    /// Axial coordinate and radial vector of `p` relative to the apex.
    fn decompose(&self, p: &Point3) -> (f64, Vec3) {
        let v = p - self.apex;
        let a = self.axis.as_ref();
        let h = v.dot(a);
        (h, v - h * a)
    }
}

impl Surface for Cone {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Cone
    }

    fn signed_distance(&self, p: &Point3) -> f64 {
        let (h, radial) = self.decompose(p);
        let (s, c) = self.half_angle.sin_cos();
        radial.norm() * c - h.abs() * s
    }

    fn normal_at(&self, p: &Point3) -> Vec3 {
        let (h, radial) = self.decompose(p);
        let a = self.axis.into_inner();
        let rho = radial.norm();
        let axial = if h < 0.0 { -a } else { a };
        if rho < f64::EPSILON {
            return if h.abs() < f64::EPSILON { a } else { -axial };
        }
        let (s, c) = self.half_angle.sin_cos();
        c * radial / rho - s * axial
    }

    fn intersect(&self, ray: &Ray) -> Vec<f64> {
        let axis = self.axis.as_ref();
        let d = ray.direction.as_ref();
        let co = ray.origin - self.apex;
        let cos2 = self.half_angle.cos().powi(2);

        // (P.A)^2 = cos^2 |P|^2 along P = co + t*d, both nappes.
        let da = d.dot(axis);
        let ca = co.dot(axis);
        let a = da * da - cos2;
        let b = 2.0 * (da * ca - cos2 * d.dot(&co));
        let c = ca * ca - cos2 * co.dot(&co);
        forward(quadratic_roots(a, b, c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Side;
    use std::f64::consts::FRAC_PI_4;

    fn cone45() -> Cone {
        Cone::new(Point3::origin(), Vec3::z(), FRAC_PI_4).unwrap()
    }

    #[test]
    fn test_rejects_bad_half_angle() {
        assert_eq!(
            Cone::new(Point3::origin(), Vec3::z(), 0.0).unwrap_err(),
            SurfaceError::InvalidHalfAngle(0.0)
        );
        assert!(Cone::new(Point3::origin(), Vec3::z(), FRAC_PI_2).is_err());
        assert!(Cone::new(Point3::origin(), Vec3::zeros(), 0.3).is_err());
    }

    #[test]
    fn test_sides_on_both_nappes() {
        let c = cone45();
        assert_eq!(c.side(&Point3::new(0.0, 0.0, 1.0)), Side::Negative);
        assert_eq!(c.side(&Point3::new(0.0, 0.0, -1.0)), Side::Negative);
        assert_eq!(c.side(&Point3::new(1.0, 0.0, 1.0)), Side::On);
        assert_eq!(c.side(&Point3::new(2.0, 0.0, 1.0)), Side::Positive);
    }

    #[test]
    fn test_ray_across_nappe() {
        let c = cone45();
        let ray = Ray::new(Point3::new(-5.0, 0.0, 1.0), Vec3::x()).unwrap();
        let hits = c.intersect(&ray);
        assert_eq!(hits.len(), 2);
        assert!((hits[0] - 4.0).abs() < 1e-10);
        assert!((hits[1] - 6.0).abs() < 1e-10);
    }

    #[test]
    fn test_ray_along_axis_through_apex() {
        let c = cone45();
        let ray = Ray::new(Point3::new(0.0, 0.0, -3.0), Vec3::z()).unwrap();
        // Grazes only the apex.
        let hits = c.intersect(&ray);
        assert!(hits.iter().all(|t| (t - 3.0).abs() < 1e-9));
    }

    #[test]
    fn test_normal_is_unit_and_outward() {
        let c = cone45();
        let p = Point3::new(1.0, 0.0, 1.0);
        let n = c.normal_at(&p);
        assert!((n.norm() - 1.0).abs() < 1e-12);
        let outside = p + 0.1 * n;
        assert_eq!(c.side(&outside), Side::Positive);
    }
}
