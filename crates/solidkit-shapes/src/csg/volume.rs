//! Volume of CSG solids.
//!
//! Cuboids, spheres and (hollow) cylinders use their closed forms. Every
//! other solid is measured by Monte-Carlo integration over its bounding
//! box. Each chunk of samples reseeds its own generator and jumps to the
//! chunk's offset in the stream, so the estimate does not depend on how
//! rayon splits the work.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use rayon::prelude::*;

use super::CsgObject;
use crate::error::{Result, ShapeError};
use crate::settings::MonteCarloSettings;
use crate::shape::Shape;

/// Samples drawn by one rayon task.
const SAMPLES_PER_CHUNK: usize = 1_000;

/// Random numbers consumed per sample.
const DRAWS_PER_SAMPLE: u128 = 3;

/// Running mean and standard error of per-batch estimates (Welford).
#[derive(Debug, Default)]
struct Accumulator {
    n: usize,
    mean: f64,
    m2: f64,
}

impl Accumulator {
    fn push(&mut self, x: f64) {
        self.n += 1;
        let delta = x - self.mean;
        self.mean += delta / self.n as f64;
        self.m2 += delta * (x - self.mean);
    }

    fn standard_error(&self) -> f64 {
        if self.n < 2 {
            return f64::INFINITY;
        }
        (self.m2 / (self.n - 1) as f64 / self.n as f64).sqrt()
    }
}

impl CsgObject {
    pub(super) fn enclosed_volume(&self) -> f64 {
        if let Some(v) = self.shape_info.as_ref().and_then(|i| i.exact_volume()) {
            return v;
        }
        match self.monte_carlo_volume(&self.mc_settings) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("{}: volume unavailable: {e}", self.id);
                0.0
            }
        }
    }

    /// Count samples inside the solid for the samples numbered
    /// `first..first + count` of the stream.
    fn count_hits(&self, settings: &MonteCarloSettings, first: usize, count: usize) -> usize {
        let bbox = self.bounding_box();
        let chunks = count.div_ceil(SAMPLES_PER_CHUNK);
        (0..chunks)
            .into_par_iter()
            .map(|c| {
                let start = first + c * SAMPLES_PER_CHUNK;
                let len = SAMPLES_PER_CHUNK.min(first + count - start);
                let mut rng = Pcg64::seed_from_u64(settings.seed);
                rng.advance(start as u128 * DRAWS_PER_SAMPLE);
                (0..len)
                    .filter(|_| {
                        let (r1, r2, r3): (f64, f64, f64) = (rng.gen(), rng.gen(), rng.gen());
                        self.is_valid(&bbox.generate_point_inside(r1, r2, r3))
                    })
                    .count()
            })
            .sum()
    }

    /// Monte-Carlo estimate of the volume.
    ///
    /// Batches of `batch_size` points are drawn uniformly in the bounding
    /// box until the relative standard error of the batch mean falls below
    /// `relative_tolerance` (after at least `min_batches`), or
    /// `max_batches` is reached.
    pub fn monte_carlo_volume(&self, settings: &MonteCarloSettings) -> Result<f64> {
        let bbox = self.bounding_box();
        if bbox.is_null() {
            return Err(ShapeError::NullBoundingBox);
        }
        if settings.batch_size == 0 || settings.max_batches == 0 {
            return Err(ShapeError::InvalidArgument(
                "Monte-Carlo batch size and batch count must be positive".into(),
            ));
        }
        let box_volume = bbox.volume();
        let mut acc = Accumulator::default();
        for batch in 0..settings.max_batches {
            let hits = self.count_hits(settings, batch * settings.batch_size, settings.batch_size);
            acc.push(box_volume * hits as f64 / settings.batch_size as f64);

            if acc.n < settings.min_batches.max(2) {
                continue;
            }
            if acc.mean == 0.0 {
                log::debug!("{}: no Monte-Carlo hits after {} batches", self.id, acc.n);
                return Ok(0.0);
            }
            let relative = acc.standard_error() / acc.mean;
            if relative < settings.relative_tolerance {
                log::debug!(
                    "{}: Monte-Carlo volume {} after {} batches (relative error {relative:.2e})",
                    self.id,
                    acc.mean,
                    acc.n
                );
                return Ok(acc.mean);
            }
        }
        log::warn!(
            "{}: Monte-Carlo volume not converged after {} batches (relative error {:.2e})",
            self.id,
            acc.n,
            acc.standard_error() / acc.mean
        );
        Ok(acc.mean)
    }
}
