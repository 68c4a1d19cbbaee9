//! Error types for surface construction.

use thiserror::Error;

/// Errors raised when a surface is built from degenerate parameters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SurfaceError {
    /// Radius was zero, negative or not finite.
    #[error("radius must be positive and finite, got {0}")]
    InvalidRadius(f64),

    /// A normal or axis vector had (near) zero length.
    #[error("{0} vector has zero length")]
    ZeroVector(&'static str),

    /// Cone half-angle outside the open interval (0, pi/2).
    #[error("cone half-angle must lie strictly between 0 and pi/2, got {0}")]
    InvalidHalfAngle(f64),
}

/// Result type for surface operations.
pub type Result<T> = std::result::Result<T, SurfaceError>;
