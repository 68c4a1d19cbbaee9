//! Bounding boxes cached by shapes.
//!
//! A box is either axis-aligned or, after [`BoundingBox::realign`], aligned
//! to an orthonormal [`Frame`]. Limits are always stored in the box's own
//! coordinates; containment, line tests and point generation convert
//! world points into that frame first.

use serde::{Deserialize, Serialize};
use solidkit_math::{Bounds, Point3, Tolerance, Vec3};

use crate::error::{Result, ShapeError};

/// An orthonormal coordinate frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Frame origin in world coordinates.
    pub origin: Point3,
    /// Orthonormal basis vectors in world coordinates.
    pub axes: [Vec3; 3],
}

impl Frame {
    /// Build a frame, checking that `axes` are orthonormal.
    pub fn new(origin: Point3, axes: [Vec3; 3]) -> Result<Self> {
        let tol = 1e-9;
        for (i, a) in axes.iter().enumerate() {
            if (a.norm() - 1.0).abs() > tol {
                return Err(ShapeError::InvalidArgument(format!(
                    "frame axis {i} is not unit length"
                )));
            }
            for b in &axes[i + 1..] {
                if a.dot(b).abs() > tol {
                    return Err(ShapeError::InvalidArgument(
                        "frame axes are not orthogonal".into(),
                    ));
                }
            }
        }
        Ok(Self { origin, axes })
    }

    /// World point expressed in frame coordinates.
    pub fn to_local(&self, p: &Point3) -> Point3 {
        let v = p - self.origin;
        Point3::new(v.dot(&self.axes[0]), v.dot(&self.axes[1]), v.dot(&self.axes[2]))
    }

    /// World vector expressed in frame coordinates.
    pub fn vec_to_local(&self, v: &Vec3) -> Vec3 {
        Vec3::new(v.dot(&self.axes[0]), v.dot(&self.axes[1]), v.dot(&self.axes[2]))
    }

    /// Frame point expressed in world coordinates.
    pub fn to_world(&self, p: &Point3) -> Point3 {
        self.origin + p.x * self.axes[0] + p.y * self.axes[1] + p.z * self.axes[2]
    }
}

/// A box bounding a shape, possibly null (not yet computed).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    min: Point3,
    max: Point3,
    null: bool,
    frame: Option<Frame>,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::null()
    }
}

impl BoundingBox {
    /// Axis-aligned box from two corners.
    ///
    /// Fails with [`ShapeError::InvalidBounds`] if `max < min` on any axis.
    pub fn new(min: Point3, max: Point3) -> Result<Self> {
        Self::check_valid(&min, &max)?;
        Ok(Self {
            min,
            max,
            null: false,
            frame: None,
        })
    }

    /// The null box: contains nothing and is replaced by the first `grow`.
    pub fn null() -> Self {
        Self {
            min: Point3::origin(),
            max: Point3::origin(),
            null: true,
            frame: None,
        }
    }

    /// Validate a pair of corners without building a box.
    pub fn check_valid(min: &Point3, max: &Point3) -> Result<()> {
        for (i, axis) in ["x", "y", "z"].into_iter().enumerate() {
            if !(max[i] >= min[i]) {
                return Err(ShapeError::InvalidBounds {
                    axis,
                    min: min[i],
                    max: max[i],
                });
            }
        }
        Ok(())
    }

    /// Box from raw limits, if they are ordered and finite.
    pub fn from_bounds(bounds: &Bounds) -> Option<Self> {
        if bounds.is_finite() && bounds.is_ordered() {
            Self::new(bounds.min, bounds.max).ok()
        } else {
            None
        }
    }

    /// True for the null box.
    pub fn is_null(&self) -> bool {
        self.null
    }

    /// True unless the box was realigned to a frame.
    pub fn is_axis_aligned(&self) -> bool {
        self.frame.is_none()
    }

    /// Minimum corner in the box's own coordinates.
    pub fn min(&self) -> Point3 {
        self.min
    }

    /// Maximum corner in the box's own coordinates.
    pub fn max(&self) -> Point3 {
        self.max
    }

    /// The frame set by [`BoundingBox::realign`], if any.
    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    fn to_local(&self, p: &Point3) -> Point3 {
        match &self.frame {
            Some(f) => f.to_local(p),
            None => *p,
        }
    }

    fn to_world(&self, p: &Point3) -> Point3 {
        match &self.frame {
            Some(f) => f.to_world(p),
            None => *p,
        }
    }

    /// Extent along each of the box's axes.
    pub fn width(&self) -> Vec3 {
        if self.null {
            return Vec3::zeros();
        }
        self.max - self.min
    }

    /// Centre of the box in world coordinates.
    pub fn centre_point(&self) -> Point3 {
        self.to_world(&nalgebra::center(&self.min, &self.max))
    }

    /// Enclosed volume; zero for the null box.
    pub fn volume(&self) -> f64 {
        let w = self.width();
        w.x * w.y * w.z
    }

    /// The eight corners in world coordinates, x varying fastest.
    pub fn corners(&self) -> [Point3; 8] {
        Bounds::new(self.min, self.max)
            .corners()
            .map(|c| self.to_world(&c))
    }

    /// Axis-aligned world limits enclosing the box.
    pub fn world_bounds(&self) -> Bounds {
        match self.frame {
            None => Bounds::new(self.min, self.max),
            Some(_) => Bounds::enclosing(self.corners().iter()).unwrap_or_else(Bounds::empty),
        }
    }

    /// Inclusive containment within the default linear tolerance.
    ///
    /// Always false for the null box.
    pub fn is_point_inside(&self, p: &Point3) -> bool {
        if self.null {
            return false;
        }
        let local = self.to_local(p);
        let tol = Tolerance::DEFAULT.linear;
        (0..3).all(|i| local[i] >= self.min[i] - tol && local[i] <= self.max[i] + tol)
    }

    /// Whether the ray from `start` along `direction` meets the box.
    ///
    /// Slab test; axes where the direction vanishes only pass if `start`
    /// already lies within that slab.
    pub fn does_line_intersect(&self, start: &Point3, direction: &Vec3) -> bool {
        if self.null {
            return false;
        }
        let (origin, dir) = match &self.frame {
            Some(f) => (f.to_local(start), f.vec_to_local(direction)),
            None => (*start, *direction),
        };
        let tol = Tolerance::DEFAULT.linear;
        let mut t_min = 0.0_f64;
        let mut t_max = f64::INFINITY;
        for i in 0..3 {
            let (lo, hi) = (self.min[i] - tol, self.max[i] + tol);
            if dir[i].abs() < f64::EPSILON {
                if origin[i] < lo || origin[i] > hi {
                    return false;
                }
                continue;
            }
            let inv = 1.0 / dir[i];
            let (mut t0, mut t1) = ((lo - origin[i]) * inv, (hi - origin[i]) * inv);
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return false;
            }
        }
        true
    }

    /// Largest angle between the direction to the box centre and the
    /// direction to any corner, as seen from `observer`.
    ///
    /// Returns `pi` when the observer sits at the centre.
    pub fn angular_width(&self, observer: &Point3) -> f64 {
        let centre = self.centre_point() - observer;
        let centre_norm = centre.norm();
        if centre_norm < f64::EPSILON {
            return std::f64::consts::PI;
        }
        self.corners()
            .iter()
            .map(|c| {
                let v = c - observer;
                let n = v.norm();
                if n < f64::EPSILON {
                    std::f64::consts::FRAC_PI_2
                } else {
                    (v.dot(&centre) / (n * centre_norm)).clamp(-1.0, 1.0).acos()
                }
            })
            .fold(0.0, f64::max)
    }

    /// Map three uniform `[0, 1)` numbers linearly onto the box.
    pub fn generate_point_inside(&self, r1: f64, r2: f64, r3: f64) -> Point3 {
        let local = Point3::new(
            self.min.x + r1 * (self.max.x - self.min.x),
            self.min.y + r2 * (self.max.y - self.min.y),
            self.min.z + r3 * (self.max.z - self.min.z),
        );
        self.to_world(&local)
    }

    /// Expand to the envelope of `self` and `other`.
    ///
    /// Growing a null box copies `other`. Boxes with a frame are grown by
    /// their axis-aligned world envelopes and the result is axis-aligned.
    pub fn grow(&mut self, other: &BoundingBox) {
        if other.null {
            return;
        }
        if self.null {
            *self = *other;
            return;
        }
        if self.frame.is_none() && other.frame.is_none() {
            let b = Bounds::new(self.min, self.max).union(&Bounds::new(other.min, other.max));
            self.min = b.min;
            self.max = b.max;
            return;
        }
        let b = self.world_bounds().union(&other.world_bounds());
        *self = Self {
            min: b.min,
            max: b.max,
            null: false,
            frame: None,
        };
    }

    /// Shift the box by `offset`.
    pub fn translate(&mut self, offset: &Vec3) {
        if self.null {
            return;
        }
        match &mut self.frame {
            Some(f) => f.origin += *offset,
            None => {
                self.min += *offset;
                self.max += *offset;
            }
        }
    }

    /// Re-express the box in the frame `(origin, axes)`, enlarging it to
    /// enclose the current box.
    pub fn realign(&mut self, origin: Point3, axes: [Vec3; 3]) -> Result<()> {
        let frame = Frame::new(origin, axes)?;
        if self.null {
            return Err(ShapeError::NullBoundingBox);
        }
        let local: Vec<Point3> = self.corners().iter().map(|c| frame.to_local(c)).collect();
        let b = Bounds::enclosing(local.iter()).ok_or(ShapeError::NullBoundingBox)?;
        self.min = b.min;
        self.max = b.max;
        self.frame = Some(frame);
        Ok(())
    }

    /// Whether two boxes share any point (touching counts).
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        if self.null || other.null {
            return false;
        }
        let (a, b) = (self.world_bounds(), other.world_bounds());
        a.intersect(&b).is_ordered()
    }

    /// The common part of two boxes, if any.
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        if !self.overlaps(other) {
            return None;
        }
        let b = self.world_bounds().intersect(&other.world_bounds());
        BoundingBox::new(b.min, b.max).ok()
    }
}
