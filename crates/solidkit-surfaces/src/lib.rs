#![warn(missing_docs)]

//! Analytic quadric surfaces for the solidkit kernel.
//!
//! A [`Surface`] splits space into a negative side, a positive side and the
//! surface itself. CSG rule trees combine surfaces by asking which side a
//! point lies on; ray tracks ask where a line crosses them.
//!
//! # Architecture
//!
//! - [`Ray`] - half-line with origin and unit direction
//! - [`Plane`], [`Sphere`], [`Cylinder`], [`Cone`] - concrete quadrics
//! - [`intersect`] - quadratic root helpers shared by the intersectors
//! - [`SurfaceMap`] - keyed collection handed to CSG objects by a shape parser

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use solidkit_math::{Bounds, Point3, Tolerance, Vec3};

mod cone;
mod cylinder;
mod error;
pub mod intersect;
mod plane;
mod ray;
mod sphere;

pub use cone::Cone;
pub use cylinder::Cylinder;
pub use error::{Result, SurfaceError};
pub use plane::Plane;
pub use ray::Ray;
pub use sphere::Sphere;

/// The kind of a surface (for match-based dispatch and display).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    /// Infinite plane.
    Plane,
    /// Sphere.
    Sphere,
    /// Infinite circular cylinder.
    Cylinder,
    /// Infinite double-napped circular cone.
    Cone,
}

/// Where a point lies relative to a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Strictly on the negative side (inside a closed quadric).
    Negative,
    /// Within tolerance of the surface.
    On,
    /// Strictly on the positive side (outside a closed quadric).
    Positive,
}

/// The side of a surface a rule leaf selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sense {
    /// Negative side, written `-N` in rule text.
    Negative,
    /// Positive side, written `N` in rule text.
    Positive,
}

impl Sense {
    /// Split a signed surface reference (`-3`, `7`) into key and sense.
    pub fn split_signed(signed: i32) -> (i32, Sense) {
        if signed < 0 {
            (-signed, Sense::Negative)
        } else {
            (signed, Sense::Positive)
        }
    }

    /// Whether a point on `side` satisfies this sense. Points on the
    /// surface satisfy both senses.
    pub fn accepts(self, side: Side) -> bool {
        match (self, side) {
            (_, Side::On) => true,
            (Sense::Negative, Side::Negative) => true,
            (Sense::Positive, Side::Positive) => true,
            _ => false,
        }
    }

    /// The opposite sense.
    pub fn flipped(self) -> Sense {
        match self {
            Sense::Negative => Sense::Positive,
            Sense::Positive => Sense::Negative,
        }
    }

    /// `-1.0` or `1.0`.
    pub fn sign(self) -> f64 {
        match self {
            Sense::Negative => -1.0,
            Sense::Positive => 1.0,
        }
    }
}

/// A primitive analytic boundary.
pub trait Surface: Send + Sync + fmt::Debug {
    /// The kind of this surface.
    fn kind(&self) -> SurfaceKind;

    /// Signed distance-like value: negative inside, positive outside,
    /// magnitude equal (or close) to the Euclidean distance.
    fn signed_distance(&self, p: &Point3) -> f64;

    /// Unit normal at (or nearest to) `p`, pointing to the positive side.
    fn normal_at(&self, p: &Point3) -> Vec3;

    /// Forward ray parameters (`t >= 0`) where the ray crosses the surface,
    /// sorted ascending. Tangent hits may appear once or twice.
    fn intersect(&self, ray: &Ray) -> Vec<f64>;

    /// Narrow `bounds` to the part of space on `sense`'s side of the surface.
    ///
    /// Surfaces that cannot express their side as a box leave the limits
    /// untouched.
    fn refine_bounds(&self, _bounds: &mut Bounds, _sense: Sense) {}

    /// Side of the surface `p` lies on, with the default linear tolerance.
    fn side(&self, p: &Point3) -> Side {
        let d = self.signed_distance(p);
        if d.abs() < Tolerance::DEFAULT.linear {
            Side::On
        } else if d < 0.0 {
            Side::Negative
        } else {
            Side::Positive
        }
    }

    /// True when `p` is within tolerance of the surface.
    fn on_surface(&self, p: &Point3) -> bool {
        self.side(p) == Side::On
    }

    /// Unsigned distance from `p` to the surface.
    fn distance(&self, p: &Point3) -> f64 {
        self.signed_distance(p).abs()
    }
}

/// Surfaces keyed by the integers used in rule text.
pub type SurfaceMap = BTreeMap<i32, Arc<dyn Surface>>;
