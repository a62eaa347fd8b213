//! Population-level statistics.

use std::collections::VecDeque;

/// A bounded history of sampled values with a running mean, used for
/// moving-average trend detection (e.g. by complexity regulation).
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    values: VecDeque<f64>,
    capacity: usize,
}

impl HistoryBuffer {
    /// Create a buffer retaining the most recent `capacity` samples.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "history capacity must be >= 1");
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest if at capacity.
    pub fn push(&mut self, value: f64) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    /// Arithmetic mean of the retained samples (0.0 when empty).
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // sample counts fit f64 exactly
    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    /// The number of retained samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if no samples are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Drop all samples and retain at most `capacity` future samples.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn reset_capacity(&mut self, capacity: usize) {
        assert!(capacity > 0, "history capacity must be >= 1");
        self.values.clear();
        self.capacity = capacity;
    }
}

/// Statistics over the whole population, refreshed once per generation.
#[derive(Debug, Clone)]
pub struct PopulationStats {
    /// Index of the best genome in the population genome list.
    pub best_genome_index: usize,
    /// Primary fitness of the best genome.
    pub best_fitness: f64,
    /// Mean primary fitness over all genomes.
    pub mean_fitness: f64,
    /// Complexity of the best genome.
    pub best_complexity: f64,
    /// Mean genome complexity.
    pub mean_complexity: f64,
    /// Maximum genome complexity.
    pub max_complexity: f64,
    /// Sum of the per-species mean fitnesses; the denominator of the
    /// fitness-sharing allocation.
    pub sum_species_mean_fitness: f64,
    /// Index of the species holding the best genome.
    pub best_genome_species_index: usize,
    /// Moving history of best fitness per generation.
    pub best_fitness_history: HistoryBuffer,
    /// Moving history of mean complexity per generation.
    pub mean_complexity_history: HistoryBuffer,
}

impl PopulationStats {
    /// Create zeroed statistics with the given history capacity.
    #[must_use]
    pub fn new(history_capacity: usize) -> Self {
        Self {
            best_genome_index: 0,
            best_fitness: 0.0,
            mean_fitness: 0.0,
            best_complexity: 0.0,
            mean_complexity: 0.0,
            max_complexity: 0.0,
            sum_species_mean_fitness: 0.0,
            best_genome_species_index: 0,
            best_fitness_history: HistoryBuffer::new(history_capacity),
            mean_complexity_history: HistoryBuffer::new(history_capacity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_buffer_evicts_oldest() {
        let mut history = HistoryBuffer::new(2);
        history.push(1.0);
        history.push(2.0);
        history.push(3.0);
        assert_eq!(history.len(), 2);
        assert!((history.mean() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_history_buffer_empty_mean_is_zero() {
        let history = HistoryBuffer::new(4);
        assert!(history.mean().abs() < f64::EPSILON);
    }
}
