//! The contract shared by CSG and mesh shapes.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::RngCore;
use solidkit_math::{Point3, Vec3};

use crate::bbox::BoundingBox;
use crate::error::Result;
use crate::material::Material;
use crate::settings::SolidAngleParams;
use crate::track::Track;

/// Principal-axis probe directions used when searching for an interior point.
const PROBE_DIRECTIONS: [[f64; 3]; 6] = [
    [1.0, 0.0, 0.0],
    [-1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, -1.0, 0.0],
    [0.0, 0.0, 1.0],
    [0.0, 0.0, -1.0],
];

/// Identity of a shape, recorded on the track segments it produces.
///
/// Clones of a shape keep its identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(u64);

impl ShapeId {
    /// A fresh identity, distinct from every other in this process.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ShapeId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shape#{}", self.0)
    }
}

/// Geometric queries every solid answers.
pub trait Shape: Send + Sync + fmt::Debug {
    /// Identity recorded on track segments.
    fn id(&self) -> ShapeId;

    /// Caller-assigned name.
    fn name(&self) -> &str;

    /// Material the shape is made of.
    fn material(&self) -> &Material;

    /// True when the shape describes a usable closed solid.
    fn has_valid_shape(&self) -> bool;

    /// True if `p` is inside the shape or on its boundary.
    fn is_valid(&self, p: &Point3) -> bool;

    /// True if `p` lies on the boundary.
    fn is_on_side(&self, p: &Point3) -> bool;

    /// Add the segments where the track passes through the shape.
    ///
    /// Returns the number of segments added. Intercepting the same shape
    /// twice on one track is not supported.
    fn intercept_surface(&self, track: &mut Track) -> usize;

    /// Distance from the track start to the nearest boundary crossing.
    fn distance(&self, track: &Track) -> Result<f64>;

    /// Solid angle subtended at the observer, in steradians.
    fn solid_angle(&self, params: &SolidAngleParams) -> f64;

    /// Solid angle of the shape with its geometry scaled component-wise by
    /// `scale` about the origin.
    fn solid_angle_scaled(&self, params: &SolidAngleParams, scale: &Vec3) -> f64;

    /// Enclosed volume.
    fn volume(&self) -> f64;

    /// Bounding box, computed on first use and cached.
    fn bounding_box(&self) -> BoundingBox;

    /// Some point inside the shape, found deterministically.
    fn point_in_object(&self) -> Option<Point3>;

    /// A uniformly distributed random point inside the shape.
    fn generate_point_in_object(&self, rng: &mut dyn RngCore, max_attempts: usize) -> Option<Point3>;

    /// A random point inside both the shape and `region`.
    fn generate_point_in_region(
        &self,
        rng: &mut dyn RngCore,
        region: &BoundingBox,
        max_attempts: usize,
    ) -> Option<Point3>;
}

/// Look for an interior point starting from `start`.
///
/// Returns `start` itself if it is inside, else the midpoint of the first
/// segment found along a principal-axis ray from it.
pub fn search_for_point<S: Shape + ?Sized>(shape: &S, start: &Point3) -> Option<Point3> {
    if shape.is_valid(start) {
        return Some(*start);
    }
    PROBE_DIRECTIONS.iter().find_map(|d| {
        let mut track = Track::new(*start, Vec3::from(*d)).ok()?;
        if shape.intercept_surface(&mut track) == 0 {
            return None;
        }
        let link = track.front()?;
        Some(nalgebra::center(&link.entry_point, &link.exit_point))
    })
}

/// The origin, a probe from it, or a probe from the bounding-box centre.
pub fn find_point_in_object<S: Shape + ?Sized>(shape: &S) -> Option<Point3> {
    if let Some(p) = search_for_point(shape, &Point3::origin()) {
        return Some(p);
    }
    let bbox = shape.bounding_box();
    if bbox.is_null() {
        return None;
    }
    search_for_point(shape, &bbox.centre_point())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_distinct() {
        let a = ShapeId::next();
        let b = ShapeId::next();
        assert_ne!(a, b);
        assert!(b.get() > a.get());
        assert!(a.to_string().starts_with("shape#"));
    }
}
