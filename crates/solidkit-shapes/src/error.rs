//! Error types for shape construction and queries.

use solidkit_surfaces::SurfaceError;
use thiserror::Error;

/// Errors raised by shapes, rule trees and bounding boxes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShapeError {
    /// A bounding box was given a maximum below its minimum on some axis.
    #[error("invalid bounds on {axis} axis: min {min} > max {max}")]
    InvalidBounds {
        /// Axis name.
        axis: &'static str,
        /// Minimum supplied.
        min: f64,
        /// Maximum supplied.
        max: f64,
    },

    /// A caller-supplied argument violated a construction precondition.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Shape parameters describe a degenerate solid.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// Rule text could not be reduced to a single tree.
    #[error("rule syntax error at offset {offset}: {message}")]
    RuleSyntax {
        /// Byte offset into the rule text.
        offset: usize,
        /// What went wrong.
        message: String,
    },

    /// A rule references a surface key missing from the surface map.
    #[error("surface {0} not found in surface map")]
    SurfaceNotFound(i32),

    /// The rule tree has no root.
    #[error("rule tree is empty")]
    EmptyRuleTree,

    /// A rule leaf has not been bound to a surface.
    #[error("surface {0} has not been populated")]
    UnresolvedSurface(i32),

    /// The track's ray never crosses the object.
    #[error("track does not intersect the object")]
    NoIntersection,

    /// An operation needs a non-null bounding box.
    #[error("bounding box is null")]
    NullBoundingBox,

    /// A surface failed to build.
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

/// Result type for shape operations.
pub type Result<T> = std::result::Result<T, ShapeError>;
