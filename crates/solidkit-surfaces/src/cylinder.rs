//! Infinite circular cylinder.

use solidkit_math::{Bounds, Dir3, Point3, Vec3};

use crate::error::{Result, SurfaceError};
use crate::intersect::{forward, quadratic_roots, DEGENERATE};
use crate::{Ray, Sense, Surface, SurfaceKind};

/// An infinite cylinder around an axis line; the negative side is the
/// region within `radius` of the axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Cylinder {
    /// A point on the axis.
    pub centre: Point3,
    /// Axis direction.
    pub axis: Dir3,
    /// Radius (always positive).
    pub radius: f64,
}

impl Cylinder {
    /// Cylinder through `centre` along `axis`.
    pub fn new(centre: Point3, axis: Vec3, radius: f64) -> Result<Self> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(SurfaceError::InvalidRadius(radius));
        }
        let axis = Dir3::try_new(axis, DEGENERATE).ok_or(SurfaceError::ZeroVector("cylinder axis"))?;
        Ok(Self {
            centre,
            axis,
            radius,
        })
    }

    /// Component of `p - centre` perpendicular to the axis.
    fn radial(&self, p: &Point3) -> Vec3 {
        let v = p - self.centre;
        let a = self.axis.as_ref();
        v - v.dot(a) * a
    }
}

impl Surface for Cylinder {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Cylinder
    }

    fn signed_distance(&self, p: &Point3) -> f64 {
        self.radial(p).norm() - self.radius
    }

    fn normal_at(&self, p: &Point3) -> Vec3 {
        let r = self.radial(p);
        let n = r.norm();
        if n < f64::EPSILON {
            // On the axis: pick any direction perpendicular to it.
            let a = self.axis.as_ref();
            let helper = if a.x.abs() < 0.9 { Vec3::x() } else { Vec3::y() };
            a.cross(&helper).normalize()
        } else {
            r / n
        }
    }

    fn intersect(&self, ray: &Ray) -> Vec<f64> {
        let axis = self.axis.as_ref();
        let d = ray.direction.as_ref();
        let oc = ray.origin - self.centre;

        // Project onto the plane perpendicular to the axis: |oc_perp + t*d_perp|^2 = r^2
        let d_perp = d - d.dot(axis) * axis;
        let oc_perp = oc - oc.dot(axis) * axis;
        let a = d_perp.dot(&d_perp);
        if a < DEGENERATE {
            // Parallel to the axis.
            return Vec::new();
        }
        let b = 2.0 * oc_perp.dot(&d_perp);
        let c = oc_perp.dot(&oc_perp) - self.radius * self.radius;
        forward(quadratic_roots(a, b, c))
    }

    fn refine_bounds(&self, bounds: &mut Bounds, sense: Sense) {
        if sense != Sense::Negative {
            return;
        }
        // Only axes perpendicular to the cylinder axis are limited.
        for i in 0..3 {
            if self.axis[i].abs() < DEGENERATE {
                bounds.min[i] = bounds.min[i].max(self.centre[i] - self.radius);
                bounds.max[i] = bounds.max[i].min(self.centre[i] + self.radius);
            }
        }
    }
}
