//! Memoisation table for reference trajectories.
//!
//! Simulating the exact numerics of a problem instance is by far the most
//! expensive step of an analysis. The table is keyed by the physics
//! fingerprint of the (transformed) parameters and the recorded step list,
//! so every distinct key is simulated at most once and the resulting
//! [`Trajectory`] is shared between bundles.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use spinsep_data::FermiHubbardParameters;
use spinsep_sim::{Progress, Trajectory, compute_trajectory};

use crate::error::AnalysisResult;

/// Cache key: physics fingerprint plus sorted, deduplicated steps.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    fingerprint: String,
    steps: Vec<usize>,
}

impl CacheKey {
    /// Build the key for `params` at `steps`.
    pub fn new(params: &FermiHubbardParameters, steps: &[usize]) -> AnalysisResult<Self> {
        let mut steps = steps.to_vec();
        steps.sort_unstable();
        steps.dedup();
        Ok(Self {
            fingerprint: params.fingerprint()?,
            steps,
        })
    }

    /// Steps covered by this key.
    pub fn steps(&self) -> &[usize] {
        &self.steps
    }
}

/// Explicit memoisation table of reference trajectories.
#[derive(Debug, Default)]
pub struct NumericsCache {
    entries: FxHashMap<CacheKey, Arc<Trajectory>>,
    computations: usize,
}

impl NumericsCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached trajectory or simulate and store it.
    ///
    /// `progress` is only invoked when a simulation actually runs. A failed
    /// simulation leaves the cache untouched.
    pub fn get_or_compute(
        &mut self,
        params: &FermiHubbardParameters,
        steps: &[usize],
        progress: Option<&mut dyn FnMut(Progress)>,
    ) -> AnalysisResult<Arc<Trajectory>> {
        let key = CacheKey::new(params, steps)?;
        if let Some(trajectory) = self.entries.get(&key) {
            debug!(steps = key.steps.len(), "exact numerics cache hit");
            return Ok(Arc::clone(trajectory));
        }

        let trajectory = Arc::new(compute_trajectory(params, key.steps(), progress)?);
        self.computations += 1;
        self.entries.insert(key, Arc::clone(&trajectory));
        Ok(trajectory)
    }

    /// Number of cached trajectories.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of simulations run since creation.
    pub fn computations(&self) -> usize {
        self.computations
    }

    /// Drop every cached trajectory. Shared handles stay valid.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spinsep_data::{ChainInitialState, Hamiltonian, IndependentChainsInitialState, Layout};

    fn params(layout: Layout) -> FermiHubbardParameters {
        FermiHubbardParameters::new(
            Hamiltonian::new(3, 1.0, 2.0),
            IndependentChainsInitialState::new(
                ChainInitialState::FixedSingleParticle { site: 0 },
                ChainInitialState::FixedSingleParticle { site: 2 },
            ),
            layout,
            0.3,
        )
    }

    #[test]
    fn test_second_request_is_a_hit() {
        let mut cache = NumericsCache::new();
        let p = params(Layout::line(3, [0, 0]));
        let a = cache.get_or_compute(&p, &[0, 1, 2], None).unwrap();
        let mut calls = 0;
        let mut count = |_: Progress| calls += 1;
        let b = cache.get_or_compute(&p, &[2, 1, 0], Some(&mut count)).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls, 0);
        assert_eq!(cache.computations(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_layout_does_not_split_entries() {
        let mut cache = NumericsCache::new();
        cache
            .get_or_compute(&params(Layout::line(3, [0, 0])), &[0, 1], None)
            .unwrap();
        cache
            .get_or_compute(&params(Layout::zigzag(3, [1, 1])), &[0, 1], None)
            .unwrap();
        assert_eq!(cache.computations(), 1);
    }

    #[test]
    fn test_distinct_steps_are_distinct_entries() {
        let mut cache = NumericsCache::new();
        let p = params(Layout::line(3, [0, 0]));
        cache.get_or_compute(&p, &[0, 1], None).unwrap();
        cache.get_or_compute(&p, &[0, 1, 2], None).unwrap();
        assert_eq!(cache.len(), 2);
        // Unsorted steps hit the same entry.
        cache.get_or_compute(&p, &[1, 0, 1], None).unwrap();
        assert_eq!(cache.computations(), 2);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.computations(), 2);
    }
}
