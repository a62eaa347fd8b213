//! Shared stochastic primitives for the evolution algorithm.
//!
//! Fractional counts (target sizes, elite sizes, offspring splits) are
//! discretized with stochastic rounding so that no species systematically
//! wins or loses the fractional part. Parent and species selection use
//! discrete probability distributions over fitness weights. Fitness ranking
//! uses a sort that randomizes the relative order of exactly-equal elements,
//! so elitism over a prefix of the sorted list does not favour insertion
//! order.

// Count discretization uses intentional float -> integer casts
#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use rand::Rng;
use rand::seq::SliceRandom;
use std::cmp::Ordering;

/// Round a non-negative real value to an integer, rounding up with
/// probability equal to the fractional part.
///
/// Over many calls the expected value of the result equals `value`, which
/// avoids the systematic bias a plain `floor` or `round` would introduce
/// when allocating many small fractional counts.
pub fn stochastic_round<R: Rng + ?Sized>(value: f64, rng: &mut R) -> usize {
    debug_assert!(value >= 0.0, "stochastic_round requires a non-negative value");
    let floor = value.floor();
    let frac = value - floor;
    let round_up = frac > 0.0 && rng.gen_range(0.0..1.0) < frac;
    floor as usize + usize::from(round_up)
}

/// Return the indices `0..len` in uniformly random order.
#[must_use]
pub fn shuffled_indices<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..len).collect();
    indices.shuffle(rng);
    indices
}

/// Sort `items` into descending order, randomizing the relative order of
/// elements that compare equal.
///
/// Implemented as a stable descending sort followed by a shuffle of each
/// run of equal elements; the distribution of orderings among tied elements
/// is uniform.
pub fn sort_desc_random_ties<T, F, R>(items: &mut [T], compare: F, rng: &mut R)
where
    F: Fn(&T, &T) -> Ordering,
    R: Rng + ?Sized,
{
    items.sort_by(|a, b| compare(b, a));

    let mut start = 0;
    while start < items.len() {
        let mut end = start + 1;
        while end < items.len() && compare(&items[start], &items[end]) == Ordering::Equal {
            end += 1;
        }
        if end - start > 1 {
            items[start..end].shuffle(rng);
        }
        start = end;
    }
}

/// A discrete probability distribution over a fixed set of outcome labels.
///
/// Outcomes are identified by the labels supplied at construction time
/// (initially `0..weights.len()`); [`DiscreteDistribution::remove`] drops an
/// outcome while preserving the remaining labels, so samples can always be
/// used as indexes into the original collection.
#[derive(Debug, Clone)]
pub struct DiscreteDistribution {
    labels: Vec<usize>,
    probs: Vec<f64>,
}

impl DiscreteDistribution {
    /// Create a distribution with outcome labels `0..weights.len()` and
    /// selection probabilities proportional to `weights`.
    ///
    /// If every weight is zero the distribution is uniform; zero-weight
    /// outcomes among non-zero weights are never sampled.
    ///
    /// # Panics
    ///
    /// Panics if `weights` is empty or contains a negative or non-finite
    /// value.
    #[must_use]
    pub fn new(weights: &[f64]) -> Self {
        assert!(!weights.is_empty(), "empty outcome set");
        assert!(
            weights.iter().all(|w| w.is_finite() && *w >= 0.0),
            "selection weights must be finite and non-negative"
        );
        let labels = (0..weights.len()).collect();
        Self {
            labels,
            probs: normalize(weights),
        }
    }

    /// Create a distribution with a single outcome, label `0`.
    #[must_use]
    pub fn single() -> Self {
        Self {
            labels: vec![0],
            probs: vec![1.0],
        }
    }

    /// The number of outcomes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// True if the distribution has no outcomes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Sample an outcome label.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let mut r = rng.gen_range(0.0..1.0);
        let mut last_viable = None;
        for (i, &p) in self.probs.iter().enumerate() {
            if p > 0.0 {
                if r < p {
                    return self.labels[i];
                }
                last_viable = Some(self.labels[i]);
            }
            r -= p;
        }
        // Floating point accumulation can leave a sliver of probability mass
        // unassigned; attribute it to the last viable outcome.
        last_viable.unwrap_or(self.labels[0])
    }

    /// Create a copy of this distribution with the outcome `label` removed
    /// and the remaining probabilities renormalized.
    ///
    /// # Panics
    ///
    /// Panics if `label` is not an outcome of this distribution.
    #[must_use]
    pub fn remove(&self, label: usize) -> Self {
        let pos = self
            .labels
            .iter()
            .position(|&l| l == label)
            .expect("label is not an outcome of this distribution");

        let mut labels = self.labels.clone();
        let mut weights = self.probs.clone();
        labels.remove(pos);
        weights.remove(pos);

        Self {
            probs: normalize(&weights),
            labels,
        }
    }
}

/// Normalize weights into probabilities; a zero-sum weight set yields a
/// uniform distribution.
fn normalize(weights: &[f64]) -> Vec<f64> {
    let sum: f64 = weights.iter().sum();
    if sum <= 0.0 {
        let p = 1.0 / weights.len() as f64;
        return vec![p; weights.len()];
    }
    weights.iter().map(|w| w / sum).collect()
}
