//! Contention-avoiding random picks.
//!
//! Picking "the" newest open game or order would put every caller on the
//! same row. The sampler instead reads a bounded window of eligible rows and
//! chooses one uniformly at random on the client, so concurrent callers
//! spread over the window. The window size trades contention against
//! fairness.

use gamecore_types::Result;
use rand::Rng;
use rand::seq::SliceRandom;

/// Uniform pick from a bounded candidate window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentionSampler {
    window: usize,
}

impl ContentionSampler {
    /// `window` must be non-zero; configuration validation guarantees this.
    #[must_use]
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    #[must_use]
    pub fn window(&self) -> usize {
        self.window
    }

    /// Run `query` with the window as its row limit and pick one row.
    ///
    /// Returns `Ok(None)` when the query yields no rows.
    pub fn sample<T, R, Q>(&self, rng: &mut R, query: Q) -> Result<Option<T>>
    where
        R: Rng + ?Sized,
        Q: FnOnce(usize) -> Result<Vec<T>>,
    {
        let mut candidates = query(self.window)?;
        if candidates.is_empty() {
            return Ok(None);
        }
        let pick = rng.gen_range(0..candidates.len());
        tracing::trace!(candidates = candidates.len(), pick, "sampled candidate");
        Ok(Some(candidates.swap_remove(pick)))
    }

    /// Pick up to `count` distinct rows from `candidates`.
    pub fn choose_many<T: Clone, R: Rng + ?Sized>(rng: &mut R, candidates: &[T], count: usize) -> Vec<T> {
        candidates.choose_multiple(rng, count).cloned().collect()
    }
}
