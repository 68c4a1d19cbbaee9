//! Infinite plane `n . p = d`.

use solidkit_math::{Bounds, Dir3, Point3, Vec3};

use crate::error::{Result, SurfaceError};
use crate::intersect::DEGENERATE;
use crate::{Ray, Sense, Surface, SurfaceKind};

/// An infinite plane; the positive side is the one the normal points into.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    /// Unit normal.
    pub normal: Dir3,
    /// Signed distance of the plane from the origin along `normal`.
    pub distance: f64,
}

impl Plane {
    /// Plane with the given normal at signed `distance` from the origin.
    pub fn new(normal: Vec3, distance: f64) -> Result<Self> {
        let normal = Dir3::try_new(normal, DEGENERATE).ok_or(SurfaceError::ZeroVector("plane normal"))?;
        Ok(Self { normal, distance })
    }

    /// Plane through `point` with the given normal.
    pub fn from_point_normal(point: &Point3, normal: Vec3) -> Result<Self> {
        let normal = Dir3::try_new(normal, DEGENERATE).ok_or(SurfaceError::ZeroVector("plane normal"))?;
        let distance = normal.dot(&point.coords);
        Ok(Self { normal, distance })
    }

    /// Index of the coordinate axis this plane is perpendicular to, if any.
    fn aligned_axis(&self) -> Option<usize> {
        (0..3).find(|&i| (self.normal[i].abs() - 1.0).abs() < 1e-12)
    }
}

impl Surface for Plane {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Plane
    }

    fn signed_distance(&self, p: &Point3) -> f64 {
        self.normal.dot(&p.coords) - self.distance
    }

    fn normal_at(&self, _p: &Point3) -> Vec3 {
        self.normal.into_inner()
    }

    fn intersect(&self, ray: &Ray) -> Vec<f64> {
        let denom = self.normal.dot(ray.direction.as_ref());
        if denom.abs() < DEGENERATE {
            return Vec::new();
        }
        let t = (self.distance - self.normal.dot(&ray.origin.coords)) / denom;
        if t >= 0.0 {
            vec![t]
        } else {
            Vec::new()
        }
    }

    fn refine_bounds(&self, bounds: &mut Bounds, sense: Sense) {
        if let Some(axis) = self.aligned_axis() {
            // Exact clamp: the plane is x_axis = s * d with s the normal sign.
            let s = self.normal[axis].signum();
            let coord = s * self.distance;
            let keeps_upper = (s > 0.0) == (sense == Sense::Positive);
            if keeps_upper {
                bounds.min[axis] = bounds.min[axis].max(coord);
            } else {
                bounds.max[axis] = bounds.max[axis].min(coord);
            }
            return;
        }

        // Clip the box against the half-space: kept corners plus edge crossings.
        let corners = bounds.corners();
        let dist: Vec<f64> = corners.iter().map(|c| self.signed_distance(c)).collect();
        let mut kept: Vec<Point3> = corners
            .iter()
            .zip(&dist)
            .filter(|(c, _)| sense.accepts(self.side(c)))
            .map(|(c, _)| *c)
            .collect();
        for (i, j) in Bounds::EDGES {
            let (di, dj) = (dist[i], dist[j]);
            if (di < 0.0 && dj > 0.0) || (di > 0.0 && dj < 0.0) {
                let t = di / (di - dj);
                kept.push(corners[i] + t * (corners[j] - corners[i]));
            }
        }
        if let Some(clipped) = Bounds::enclosing(&kept) {
            *bounds = clipped;
        }
    }
}
