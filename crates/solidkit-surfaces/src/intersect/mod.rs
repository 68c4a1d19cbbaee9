//! Root finding shared by the quadric intersectors.
//!
//! Every quadric reduces a ray crossing to `a t^2 + b t + c = 0`; the
//! helpers here solve it and keep only forward roots.

/// Coefficients below this are treated as zero.
pub const DEGENERATE: f64 = 1e-12;

/// Real roots of `a t^2 + b t + c = 0`, ascending.
///
/// Falls back to the linear equation when `a` vanishes. A double root is
/// reported once.
pub fn quadratic_roots(a: f64, b: f64, c: f64) -> Vec<f64> {
    if a.abs() < DEGENERATE {
        if b.abs() < DEGENERATE {
            return Vec::new();
        }
        return vec![-c / b];
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return Vec::new();
    }
    if disc == 0.0 {
        return vec![-b / (2.0 * a)];
    }
    // Avoid cancellation between -b and sqrt(disc).
    let sqrt_disc = disc.sqrt();
    let q = -0.5 * (b + b.signum() * sqrt_disc);
    let (t1, t2) = if q == 0.0 {
        let r = sqrt_disc / (2.0 * a);
        (-r, r)
    } else {
        (q / a, c / q)
    };
    if t1 <= t2 {
        vec![t1, t2]
    } else {
        vec![t2, t1]
    }
}

/// Keep roots with `t >= 0`, preserving order.
pub fn forward(roots: Vec<f64>) -> Vec<f64> {
    roots.into_iter().filter(|t| *t >= 0.0).collect()
}
