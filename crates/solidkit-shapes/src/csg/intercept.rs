//! Ray tracks and boundary tests for CSG solids.

use solidkit_math::{Point3, Tolerance, Vec3};
use solidkit_surfaces::Ray;

use super::CsgObject;
use crate::error::{Result, ShapeError};
use crate::shape::Shape;
use crate::track::{Track, TrackDirection};

/// Step past the last crossing when classifying it.
const TAIL_STEP: f64 = 1.0;

impl CsgObject {
    /// Sorted forward distances where `ray` crosses any surface, with
    /// near-duplicates merged.
    fn crossings(&self, ray: &Ray) -> Vec<f64> {
        let mut distances: Vec<f64> = self
            .surfaces
            .iter()
            .flat_map(|(_, s)| s.intersect(ray))
            .filter(|t| t.is_finite())
            .collect();
        distances.sort_by(f64::total_cmp);
        let tol = Tolerance::DEFAULT.linear;
        distances.dedup_by(|b, a| (*b - *a).abs() < tol);
        distances
    }

    /// Classify a crossing by testing the midpoints to its neighbours.
    ///
    /// Tangent and coincident hits have the same state on both sides and
    /// are rejected.
    fn classify(&self, ray: &Ray, before: f64, at: f64, after: f64) -> Option<TrackDirection> {
        let pre = self.is_valid(&ray.at(0.5 * (before + at)));
        let next = self.is_valid(&ray.at(0.5 * (at + after)));
        match (pre, next) {
            (true, false) => Some(TrackDirection::Leaving),
            (false, true) => Some(TrackDirection::Entering),
            _ => None,
        }
    }

    pub(super) fn intercept(&self, track: &mut Track) -> usize {
        let original = track.count();
        let ray = track.ray();
        let distances = self.crossings(&ray);
        for (i, &d) in distances.iter().enumerate() {
            if d <= 0.0 {
                continue;
            }
            let before = if i == 0 { 0.0 } else { distances[i - 1] };
            let after = distances.get(i + 1).copied().unwrap_or(d + TAIL_STEP);
            if let Some(flag) = self.classify(&ray, before, d, after) {
                track.add_point(flag, ray.at(d), self.id);
            }
        }
        track.build_link();
        let added = track.count() - original;
        log::trace!(
            "{} crossings, {added} segments for {}",
            distances.len(),
            self.id
        );
        added
    }

    /// Smallest distance from the track start to a surface crossing, in
    /// either direction along the line.
    pub(super) fn nearest_crossing(&self, track: &Track) -> Result<f64> {
        let forward = track.ray();
        let backward = Ray::from_unit(track.start_point(), -track.direction());
        self.crossings(&forward)
            .into_iter()
            .chain(self.crossings(&backward))
            .map(f64::abs)
            .min_by(f64::total_cmp)
            .ok_or(ShapeError::NoIntersection)
    }

    /// True if a step either way along `normal` changes membership.
    fn straddles(&self, p: &Point3, normal: &Vec3) -> bool {
        let step = normal * (5.0 * Tolerance::DEFAULT.linear);
        self.is_valid(&(p + step)) != self.is_valid(&(p - step))
    }

    pub(super) fn on_side(&self, p: &Point3) -> bool {
        let mut normals = Vec::new();
        for (_, surface) in &self.surfaces {
            if surface.on_surface(p) {
                let n = surface.normal_at(p);
                if self.straddles(p, &n) {
                    return true;
                }
                normals.push(n);
            }
        }
        // Edges and apexes: try the sums and bisectors of the normals.
        let mut sum = Vec3::zeros();
        for (i, a) in normals.iter().enumerate() {
            sum += a;
            if let Some(dir) = sum.try_normalize(f64::EPSILON) {
                if self.straddles(p, &dir) {
                    return true;
                }
            }
            for b in &normals[i + 1..] {
                if let Some(dir) = (a + b).try_normalize(f64::EPSILON) {
                    if self.straddles(p, &dir) {
                        return true;
                    }
                }
            }
        }
        false
    }
}
