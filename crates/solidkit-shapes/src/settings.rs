//! Tunable parameters for the numerical algorithms.

use serde::{Deserialize, Serialize};
use solidkit_math::Point3;

/// Triangulated solid angle is only used below this many triangles.
pub const MAX_TRIANGLES_FOR_SOLID_ANGLE: usize = 30_000;

/// Ray-trace solid angle resolution when the shape has a bounding box.
pub const RAY_TRACE_RESOLUTION_WITH_BOX: usize = 100;

/// Ray-trace solid angle resolution without a usable bounding box.
pub const RAY_TRACE_RESOLUTION_WITHOUT_BOX: usize = 200;

/// Minimum number of azimuthal steps in the ray-trace solid angle.
pub const RAY_TRACE_MIN_PHI_STEPS: usize = 10;

/// Monte-Carlo volume estimation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloSettings {
    /// Base seed; each sample stream is derived from it.
    pub seed: u64,
    /// Points per batch.
    pub batch_size: usize,
    /// Stop once the relative standard error falls below this.
    pub relative_tolerance: f64,
    /// Batches always run before checking convergence.
    pub min_batches: usize,
    /// Hard cap on batches.
    pub max_batches: usize,
}

impl Default for MonteCarloSettings {
    fn default() -> Self {
        Self {
            seed: 93726,
            batch_size: 10_000,
            relative_tolerance: 1e-3,
            min_batches: 2,
            max_batches: 2_000,
        }
    }
}

/// Solid angle query parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolidAngleParams {
    /// Viewing position.
    pub observer: Point3,
    /// Segments used when triangulating a cylinder's curved side.
    pub cylinder_slices: usize,
}

impl SolidAngleParams {
    /// Default parameters for an observer.
    pub fn new(observer: Point3) -> Self {
        Self {
            observer,
            cylinder_slices: 10,
        }
    }

    /// Same observer, different slice count.
    pub fn with_cylinder_slices(mut self, slices: usize) -> Self {
        self.cylinder_slices = slices.max(3);
        self
    }
}

/// Segment counts for the derived triangulation of canonical shapes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TessellationParams {
    /// Segments around circular features.
    pub circle_segments: u32,
    /// Latitude bands for spheres.
    pub latitude_segments: u32,
}

impl Default for TessellationParams {
    fn default() -> Self {
        Self {
            circle_segments: 24,
            latitude_segments: 12,
        }
    }
}

impl TessellationParams {
    /// Create params from a segment count hint.
    pub fn from_segments(segments: u32) -> Self {
        Self {
            circle_segments: segments.max(3),
            latitude_segments: (segments / 2).max(2),
        }
    }
}
