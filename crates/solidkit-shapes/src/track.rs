//! Ray tracks: where a ray enters and leaves one or more shapes.
//!
//! Shapes append raw crossing points with [`Track::add_point`] and then
//! call [`Track::build_link`], which pairs entering and leaving points into
//! [`Link`]s kept in order of distance from the track start.

use solidkit_math::{Dir3, Point3, Tolerance, Vec3};
use solidkit_surfaces::Ray;

use crate::error::{Result, ShapeError};
use crate::shape::ShapeId;

/// Whether a crossing point takes the ray into or out of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackDirection {
    /// The ray passes from outside to inside.
    Entering,
    /// The ray passes from inside to outside.
    Leaving,
}

/// A single crossing of a shape boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionPoint {
    /// Entering or leaving.
    pub direction: TrackDirection,
    /// Crossing point.
    pub point: Point3,
    /// Distance from the track start.
    pub distance_from_start: f64,
    /// Shape crossed.
    pub object: ShapeId,
}

/// A segment of the track inside one shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Link {
    /// Where the segment starts.
    pub entry_point: Point3,
    /// Where the segment ends.
    pub exit_point: Point3,
    /// Distance from the track start to `exit_point`.
    pub distance_from_start: f64,
    /// Length of the segment.
    pub distance_inside_object: f64,
    /// Shape the segment lies in.
    pub object: ShapeId,
}

/// A ray with the crossings and segments found along it.
#[derive(Debug, Clone)]
pub struct Track {
    start: Point3,
    direction: Dir3,
    links: Vec<Link>,
    points: Vec<IntersectionPoint>,
}

impl Track {
    /// A track from `start` along `direction` (normalized here).
    pub fn new(start: Point3, direction: Vec3) -> Result<Self> {
        let direction = Dir3::try_new(direction, 1e-300)
            .ok_or_else(|| ShapeError::InvalidArgument("track direction has zero length".into()))?;
        Ok(Self {
            start,
            direction,
            links: Vec::new(),
            points: Vec::new(),
        })
    }

    /// A track from an already normalized direction.
    pub fn from_unit(start: Point3, direction: Dir3) -> Self {
        Self {
            start,
            direction,
            links: Vec::new(),
            points: Vec::new(),
        }
    }

    /// Move the track to a new ray. Existing results are kept.
    pub fn reset(&mut self, start: Point3, direction: Dir3) {
        self.start = start;
        self.direction = direction;
    }

    /// Drop all links and pending crossing points.
    pub fn clear_intersection_results(&mut self) {
        self.links.clear();
        self.points.clear();
    }

    /// Start of the track.
    pub fn start_point(&self) -> Point3 {
        self.start
    }

    /// Unit direction of the track.
    pub fn direction(&self) -> Dir3 {
        self.direction
    }

    /// The track as a ray.
    pub fn ray(&self) -> Ray {
        Ray::from_unit(self.start, self.direction)
    }

    /// Record a crossing point, kept sorted by distance from the start.
    pub fn add_point(&mut self, direction: TrackDirection, point: Point3, object: ShapeId) {
        let distance_from_start = (point - self.start).norm();
        let at = self
            .points
            .partition_point(|p| p.distance_from_start <= distance_from_start);
        self.points.insert(
            at,
            IntersectionPoint {
                direction,
                point,
                distance_from_start,
                object,
            },
        );
    }

    /// Insert a segment, kept sorted by `distance_from_start`, returning
    /// its index.
    pub fn add_link(
        &mut self,
        entry_point: Point3,
        exit_point: Point3,
        distance_from_start: f64,
        object: ShapeId,
    ) -> usize {
        let link = Link {
            entry_point,
            exit_point,
            distance_from_start,
            distance_inside_object: (exit_point - entry_point).norm(),
            object,
        };
        let at = self
            .links
            .partition_point(|l| l.distance_from_start <= distance_from_start);
        self.links.insert(at, link);
        at
    }

    /// Turn the pending crossing points into links and clear them.
    ///
    /// Leaving points before the first entering point open a link from the
    /// track start. Each later entering/leaving pair becomes a link;
    /// other points (glancing hits, unmatched crossings) are skipped.
    pub fn build_link(&mut self) {
        let points = std::mem::take(&mut self.points);
        if points.is_empty() {
            return;
        }
        let tol = Tolerance::DEFAULT.linear;

        // Leading leaving points: the track starts inside a shape.
        let mut work = self.start;
        let mut a = 0;
        while a < points.len() && points[a].direction != TrackDirection::Entering {
            let p = &points[a];
            self.add_link(work, p.point, p.distance_from_start, p.object);
            work = p.point;
            a += 1;
        }
        if a == points.len() {
            return;
        }

        work = points[a].point;
        while a + 1 < points.len() {
            let (ac, bc) = (&points[a], &points[a + 1]);
            if ac.direction == TrackDirection::Entering && bc.direction == TrackDirection::Leaving {
                if (ac.distance_from_start - bc.distance_from_start).abs() > tol {
                    self.add_link(ac.point, bc.point, bc.distance_from_start, ac.object);
                } else {
                    // Touching surfaces: close the gap from the last exit.
                    self.add_link(work, ac.point, ac.distance_from_start, ac.object);
                }
                work = bc.point;
                a += 2;
            } else {
                a += 1;
            }
        }
    }

    /// The segments found so far, ordered by distance.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Iterate over the segments.
    pub fn iter(&self) -> std::slice::Iter<'_, Link> {
        self.links.iter()
    }

    /// Crossing points not yet turned into links.
    pub fn surface_points(&self) -> &[IntersectionPoint] {
        &self.points
    }

    /// Number of segments.
    pub fn count(&self) -> usize {
        self.links.len()
    }

    /// True when no segment has been found.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Nearest segment.
    pub fn front(&self) -> Option<&Link> {
        self.links.first()
    }

    /// Furthest segment.
    pub fn back(&self) -> Option<&Link> {
        self.links.last()
    }

    /// Total length of the track inside shapes.
    pub fn total_distance_inside_object(&self) -> f64 {
        self.links.iter().map(|l| l.distance_inside_object).sum()
    }

    /// Merge consecutive segments of the same shape that touch end to start.
    pub fn remove_cojoins(&mut self) {
        let tol = Tolerance::DEFAULT.linear;
        let mut merged: Vec<Link> = Vec::with_capacity(self.links.len());
        for link in self.links.drain(..) {
            match merged.last_mut() {
                Some(prev)
                    if prev.object == link.object
                        && (prev.exit_point - link.entry_point).norm() < tol =>
                {
                    prev.exit_point = link.exit_point;
                    prev.distance_from_start = link.distance_from_start;
                    prev.distance_inside_object = (prev.exit_point - prev.entry_point).norm();
                }
                _ => merged.push(link),
            }
        }
        self.links = merged;
    }

    /// Index of the first segment not joined to its predecessor, or `None`
    /// for a gap-free track.
    ///
    /// With two or more segments, index 0 means the first segment does not
    /// begin at the track start.
    pub fn non_complete(&self) -> Option<usize> {
        if self.links.len() < 2 {
            return None;
        }
        let tol = Tolerance::DEFAULT.linear;
        if (self.links[0].entry_point - self.start).norm() > tol {
            return Some(0);
        }
        self.links
            .windows(2)
            .position(|w| (w[0].exit_point - w[1].entry_point).norm() > tol)
            .map(|i| i + 1)
    }
}

impl<'a> IntoIterator for &'a Track {
    type Item = &'a Link;
    type IntoIter = std::slice::Iter<'a, Link>;

    fn into_iter(self) -> Self::IntoIter {
        self.links.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x_track() -> Track {
        Track::new(Point3::new(-10.0, 0.0, 0.0), Vec3::x()).unwrap()
    }

    #[test]
    fn test_zero_direction_rejected() {
        assert!(Track::new(Point3::origin(), Vec3::zeros()).is_err());
    }

    #[test]
    fn test_points_kept_sorted() {
        let id = ShapeId::next();
        let mut t = x_track();
        t.add_point(TrackDirection::Leaving, Point3::new(1.0, 0.0, 0.0), id);
        t.add_point(TrackDirection::Entering, Point3::new(-1.0, 0.0, 0.0), id);
        let d: Vec<f64> = t.surface_points().iter().map(|p| p.distance_from_start).collect();
        assert_eq!(d, vec![9.0, 11.0]);
    }

    #[test]
    fn test_build_single_link() {
        let id = ShapeId::next();
        let mut t = x_track();
        t.add_point(TrackDirection::Entering, Point3::new(-0.5, 0.0, 0.0), id);
        t.add_point(TrackDirection::Leaving, Point3::new(0.5, 0.0, 0.0), id);
        t.build_link();
        assert_eq!(t.count(), 1);
        assert!(t.surface_points().is_empty());
        let link = t.front().unwrap();
        assert_eq!(link.entry_point, Point3::new(-0.5, 0.0, 0.0));
        assert_eq!(link.exit_point, Point3::new(0.5, 0.0, 0.0));
        assert_eq!(link.distance_from_start, 10.5);
        assert_eq!(link.distance_inside_object, 1.0);
        assert_eq!(link.object, id);
    }

    #[test]
    fn test_build_link_from_inside() {
        let id = ShapeId::next();
        let mut t = Track::new(Point3::origin(), Vec3::x()).unwrap();
        t.add_point(TrackDirection::Leaving, Point3::new(2.0, 0.0, 0.0), id);
        t.build_link();
        assert_eq!(t.count(), 1);
        assert_eq!(t.front().unwrap().entry_point, Point3::origin());
        assert_eq!(t.total_distance_inside_object(), 2.0);
    }

    #[test]
    fn test_build_link_skips_glancing_points() {
        let id = ShapeId::next();
        let mut t = x_track();
        t.add_point(TrackDirection::Entering, Point3::new(-3.0, 0.0, 0.0), id);
        t.add_point(TrackDirection::Entering, Point3::new(-2.0, 0.0, 0.0), id);
        t.add_point(TrackDirection::Leaving, Point3::new(2.0, 0.0, 0.0), id);
        t.build_link();
        assert_eq!(t.count(), 1);
        assert_eq!(t.front().unwrap().entry_point, Point3::new(-2.0, 0.0, 0.0));
    }

    #[test]
    fn test_two_shapes_share_a_track() {
        let (a, b) = (ShapeId::next(), ShapeId::next());
        let mut t = x_track();
        t.add_point(TrackDirection::Entering, Point3::new(3.0, 0.0, 0.0), b);
        t.add_point(TrackDirection::Leaving, Point3::new(4.0, 0.0, 0.0), b);
        t.build_link();
        t.add_point(TrackDirection::Entering, Point3::new(-1.0, 0.0, 0.0), a);
        t.add_point(TrackDirection::Leaving, Point3::new(1.0, 0.0, 0.0), a);
        t.build_link();
        assert_eq!(t.count(), 2);
        assert_eq!(t.front().unwrap().object, a);
        assert_eq!(t.back().unwrap().object, b);
        assert_eq!(t.total_distance_inside_object(), 3.0);
        assert_eq!(t.non_complete(), Some(0));
    }

    #[test]
    fn test_remove_cojoins_and_non_complete() {
        let id = ShapeId::next();
        let other = ShapeId::next();
        let mut t = Track::new(Point3::origin(), Vec3::x()).unwrap();
        t.add_link(Point3::origin(), Point3::new(1.0, 0.0, 0.0), 1.0, id);
        t.add_link(Point3::new(1.0, 0.0, 0.0), Point3::new(3.0, 0.0, 0.0), 3.0, id);
        t.add_link(Point3::new(3.0, 0.0, 0.0), Point3::new(4.0, 0.0, 0.0), 4.0, other);
        t.add_link(Point3::new(5.0, 0.0, 0.0), Point3::new(6.0, 0.0, 0.0), 6.0, other);
        assert_eq!(t.non_complete(), Some(3));

        t.remove_cojoins();
        assert_eq!(t.count(), 3);
        let first = t.front().unwrap();
        assert_eq!(first.exit_point, Point3::new(3.0, 0.0, 0.0));
        assert_eq!(first.distance_inside_object, 3.0);
        assert_eq!(first.distance_from_start, 3.0);
    }

    #[test]
    fn test_clear_and_reset() {
        let id = ShapeId::next();
        let mut t = x_track();
        t.add_link(Point3::origin(), Point3::new(1.0, 0.0, 0.0), 11.0, id);
        t.clear_intersection_results();
        assert!(t.is_empty());
        t.reset(Point3::origin(), Dir3::new_normalize(Vec3::y()));
        assert_eq!(t.start_point(), Point3::origin());
        assert_eq!(t.direction().into_inner(), Vec3::y());
    }
}
