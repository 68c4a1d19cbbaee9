#![warn(missing_docs)]

//! Math types for the solidkit geometry kernel.
//!
//! Thin wrappers around nalgebra: points, vectors, unit directions,
//! affine transforms for mesh vertices, tolerance constants, and the raw
//! min/max [`Bounds`] that rule trees refine while deriving a bounding box.

use nalgebra::{Matrix3, Matrix4, Unit, Vector3, Vector4};
use serde::{Deserialize, Serialize};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// A 3x3 matrix, used for vertex rotations.
pub type Mat3 = Matrix3<f64>;

/// Component-wise product of two vectors.
#[inline]
pub fn scale_components(v: &Vec3, scale: &Vec3) -> Vec3 {
    v.component_mul(scale)
}

/// A 4x4 affine transformation matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// The underlying 4x4 matrix.
    pub matrix: Matrix4<f64>,
}

impl Transform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Translation by `v`.
    pub fn translation(v: &Vec3) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 3)] = v.x;
        m[(1, 3)] = v.y;
        m[(2, 3)] = v.z;
        Self { matrix: m }
    }

    /// Uniform scale about the origin.
    pub fn uniform_scale(s: f64) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 0)] = s;
        m[(1, 1)] = s;
        m[(2, 2)] = s;
        Self { matrix: m }
    }

    /// Embed a 3x3 linear map (rotation, shear, scale) with no translation.
    pub fn from_linear(linear: &Mat3) -> Self {
        let mut m = Matrix4::identity();
        m.fixed_view_mut::<3, 3>(0, 0).copy_from(linear);
        Self { matrix: m }
    }

    /// Rotation about an axis through the origin by `angle` radians.
    ///
    /// Rodrigues' formula.
    pub fn rotation_about_axis(axis: &Dir3, angle: f64) -> Self {
        Self::from_linear(&rotation_matrix(axis, angle))
    }

    /// `self` applied after `other`.
    pub fn then(&self, other: &Transform) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Transform a point.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        let v = self.matrix * Vector4::new(p.x, p.y, p.z, 1.0);
        Point3::new(v.x, v.y, v.z)
    }

    /// Transform a direction vector (translation ignored).
    pub fn apply_vec(&self, v: &Vec3) -> Vec3 {
        let r = self.matrix * Vector4::new(v.x, v.y, v.z, 0.0);
        Vec3::new(r.x, r.y, r.z)
    }

    /// Inverse of this transform, if it exists.
    pub fn inverse(&self) -> Option<Self> {
        self.matrix.try_inverse().map(|matrix| Self { matrix })
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Two unit vectors `(u, v)` perpendicular to the unit `axis`, with
/// `u x v = axis`.
pub fn orthonormal_basis(axis: &Vec3) -> (Vec3, Vec3) {
    let helper = if axis.x.abs() < 0.9 { Vec3::x() } else { Vec3::y() };
    let u = (helper - helper.dot(axis) * axis).normalize();
    let v = axis.cross(&u);
    (u, v)
}

/// Rotation matrix about `axis` by `angle` radians.
pub fn rotation_matrix(axis: &Dir3, angle: f64) -> Mat3 {
    let (s, c) = angle.sin_cos();
    let t = 1.0 - c;
    let (x, y, z) = (axis.x, axis.y, axis.z);
    Mat3::new(
        t * x * x + c,
        t * x * y - s * z,
        t * x * z + s * y,
        t * x * y + s * z,
        t * y * y + c,
        t * y * z - s * x,
        t * x * z - s * y,
        t * y * z + s * x,
        t * z * z + c,
    )
}

/// Tolerance constants for geometric comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    /// Linear distance tolerance.
    pub linear: f64,
    /// Angular tolerance in radians.
    pub angular: f64,
}

impl Tolerance {
    /// Default tolerances (1e-6 linear, 1e-9 rad angular).
    pub const DEFAULT: Self = Self {
        linear: 1e-6,
        angular: 1e-9,
    };

    /// Check if two points are coincident within tolerance.
    pub fn points_equal(&self, a: &Point3, b: &Point3) -> bool {
        (a - b).norm() < self.linear
    }

    /// Check if a scalar distance is effectively zero.
    pub fn is_zero(&self, d: f64) -> bool {
        d.abs() < self.linear
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Raw axis-aligned limits, free to be inverted or unbounded.
///
/// Rule trees narrow a huge initial box surface by surface; only the
/// caller decides whether the result is a usable bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Bounds {
    /// Limits from two corners.
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// A cube of half-width `extent` around the origin.
    pub fn symmetric(extent: f64) -> Self {
        Self {
            min: Point3::new(-extent, -extent, -extent),
            max: Point3::new(extent, extent, extent),
        }
    }

    /// An inverted box that any included point will replace.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Envelope of a set of points; `None` for an empty set.
    pub fn enclosing<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Option<Self> {
        let mut b = Self::empty();
        let mut any = false;
        for p in points {
            b.include_point(p);
            any = true;
        }
        any.then_some(b)
    }

    /// Grow to include a point.
    pub fn include_point(&mut self, p: &Point3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Intersection of two limit boxes (may come out inverted).
    pub fn intersect(&self, other: &Bounds) -> Bounds {
        Bounds {
            min: Point3::new(
                self.min.x.max(other.min.x),
                self.min.y.max(other.min.y),
                self.min.z.max(other.min.z),
            ),
            max: Point3::new(
                self.max.x.min(other.max.x),
                self.max.y.min(other.max.y),
                self.max.z.min(other.max.z),
            ),
        }
    }

    /// Union envelope of two limit boxes.
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min: Point3::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            max: Point3::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        }
    }

    /// Inclusive containment test.
    pub fn contains(&self, p: &Point3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// True when `min <= max` on all three axes.
    pub fn is_ordered(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// True when every limit is finite.
    pub fn is_finite(&self) -> bool {
        self.min.coords.iter().chain(self.max.coords.iter()).all(|v| v.is_finite())
    }

    /// The eight corners, x varying fastest.
    pub fn corners(&self) -> [Point3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Point3::new(lo.x, lo.y, lo.z),
            Point3::new(hi.x, lo.y, lo.z),
            Point3::new(lo.x, hi.y, lo.z),
            Point3::new(hi.x, hi.y, lo.z),
            Point3::new(lo.x, lo.y, hi.z),
            Point3::new(hi.x, lo.y, hi.z),
            Point3::new(lo.x, hi.y, hi.z),
            Point3::new(hi.x, hi.y, hi.z),
        ]
    }

    /// The twelve edges as corner-index pairs into [`Bounds::corners`].
    pub const EDGES: [(usize, usize); 12] = [
        (0, 1),
        (2, 3),
        (4, 5),
        (6, 7),
        (0, 2),
        (1, 3),
        (4, 6),
        (5, 7),
        (0, 4),
        (1, 5),
        (2, 6),
        (3, 7),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_translation_is_exactly_reversible() {
        let v = Vec3::new(0.1, -2.7, 3.3);
        let p = Point3::new(1.25, 2.5, -0.75);
        let there = Transform::translation(&v).apply_point(&p);
        let back = Transform::translation(&-v).apply_point(&there);
        assert_eq!(back, p);
    }

    #[test]
    fn test_rotation_matrix_z_quarter_turn() {
        let axis = Dir3::new_normalize(Vec3::z());
        let r = rotation_matrix(&axis, PI / 2.0);
        let v = r * Vec3::new(1.0, 0.0, 0.0);
        assert!(v.x.abs() < 1e-12);
        assert!((v.y - 1.0).abs() < 1e-12);
        assert!(v.z.abs() < 1e-12);
    }

    #[test]
    fn test_rotation_about_diagonal_half_turn() {
        let axis = Dir3::new_normalize(Vec3::new(1.0, 1.0, 0.0));
        let t = Transform::rotation_about_axis(&axis, PI);
        let r = t.apply_point(&Point3::new(1.0, 0.0, 0.0));
        assert!(r.x.abs() < 1e-12);
        assert!((r.y - 1.0).abs() < 1e-12);
        assert!(r.z.abs() < 1e-12);
    }

    #[test]
    fn test_compose_applies_right_operand_first() {
        let shift = Transform::translation(&Vec3::new(1.0, 0.0, 0.0));
        let double = Transform::uniform_scale(2.0);
        let p = double.then(&shift).apply_point(&Point3::origin());
        assert!((p.x - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_inverse_round_trip() {
        let t = Transform::rotation_about_axis(&Dir3::new_normalize(Vec3::new(0.3, 1.0, -0.2)), 0.7)
            .then(&Transform::translation(&Vec3::new(4.0, 5.0, 6.0)));
        let inv = t.inverse().unwrap();
        let p = Point3::new(5.0, 6.0, 7.0);
        let q = inv.apply_point(&t.apply_point(&p));
        assert!((q - p).norm() < 1e-12);
    }

    #[test]
    fn test_apply_vec_ignores_translation() {
        let t = Transform::translation(&Vec3::new(9.0, 9.0, 9.0));
        assert_eq!(t.apply_vec(&Vec3::x()), Vec3::x());
    }

    #[test]
    fn test_orthonormal_basis_is_right_handed() {
        let axis = Vec3::new(1.0, 2.0, -2.0).normalize();
        let (u, v) = orthonormal_basis(&axis);
        assert!(u.dot(&axis).abs() < 1e-12);
        assert!(v.dot(&axis).abs() < 1e-12);
        assert!((u.norm() - 1.0).abs() < 1e-12);
        assert!((u.cross(&v) - axis).norm() < 1e-12);
    }

    #[test]
    fn test_tolerance_points_equal() {
        let tol = Tolerance::DEFAULT;
        let a = Point3::new(1.0, 2.0, 3.0);
        assert!(tol.points_equal(&a, &Point3::new(1.0 + 1e-7, 2.0, 3.0)));
        assert!(!tol.points_equal(&a, &Point3::new(1.001, 2.0, 3.0)));
    }

    #[test]
    fn test_bounds_intersect_and_union() {
        let a = Bounds::new(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 2.0, 2.0));
        let b = Bounds::new(Point3::new(1.0, -1.0, 1.0), Point3::new(3.0, 1.0, 3.0));
        let i = a.intersect(&b);
        assert_eq!(i.min, Point3::new(1.0, 0.0, 1.0));
        assert_eq!(i.max, Point3::new(2.0, 1.0, 2.0));
        let u = a.union(&b);
        assert_eq!(u.min, Point3::new(0.0, -1.0, 0.0));
        assert_eq!(u.max, Point3::new(3.0, 2.0, 3.0));
    }

    #[test]
    fn test_bounds_enclosing_and_order() {
        let pts = [Point3::new(1.0, -2.0, 0.5), Point3::new(-1.0, 4.0, 0.0)];
        let b = Bounds::enclosing(&pts).unwrap();
        assert!(b.is_ordered());
        assert!(b.contains(&Point3::new(0.0, 0.0, 0.25)));
        assert!(Bounds::enclosing(&[]).is_none());
        assert!(!Bounds::empty().is_ordered());
        assert!(!Bounds::symmetric(f64::INFINITY).is_finite());
    }

    #[test]
    fn test_bounds_edges_connect_adjacent_corners() {
        let b = Bounds::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        let c = b.corners();
        for (i, j) in Bounds::EDGES {
            assert!(((c[i] - c[j]).norm() - 1.0).abs() < 1e-12);
        }
    }
}
