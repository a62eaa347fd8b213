//! Evolution algorithm settings.

use serde::{Deserialize, Serialize};

/// Plain validated settings for the evolution algorithm, read once per
/// run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EvolutionSettings {
    /// The number of species to partition the population into.
    pub species_count: usize,
    /// Proportion of each species preserved unchanged into the next
    /// generation.
    pub elitism_proportion: f64,
    /// Proportion of each species' fittest genomes eligible as parents.
    pub selection_proportion: f64,
    /// Proportion of offspring produced by asexual reproduction.
    pub offspring_asexual_proportion: f64,
    /// Proportion of offspring produced by recombination.
    pub offspring_recombination_proportion: f64,
    /// Proportion of recombination offspring produced from parents of
    /// different species.
    pub interspecies_mating_proportion: f64,
    /// Capacity of the statistics moving-average history buffers.
    pub statistics_history_length: usize,
}

impl Default for EvolutionSettings {
    fn default() -> Self {
        Self {
            species_count: 10,
            elitism_proportion: 0.2,
            selection_proportion: 0.2,
            offspring_asexual_proportion: 0.5,
            offspring_recombination_proportion: 0.5,
            interspecies_mating_proportion: 0.01,
            statistics_history_length: 100,
        }
    }
}

impl EvolutionSettings {
    /// A copy of these settings adjusted for simplifying mode: all
    /// offspring are produced asexually, so pruning mutations dominate.
    #[must_use]
    pub fn simplifying(&self) -> Self {
        Self {
            offspring_asexual_proportion: 1.0,
            offspring_recombination_proportion: 0.0,
            ..*self
        }
    }

    /// Validate the settings.
    ///
    /// # Panics
    ///
    /// Panics on the first violated constraint: a zero species count or
    /// history length, a proportion outside `[0, 1]`, or asexual and
    /// recombination proportions that do not sum to 1.
    pub fn validate(&self) {
        fn is_proportion(p: f64) -> bool {
            (0.0..=1.0).contains(&p)
        }

        assert!(self.species_count >= 1, "species_count must be >= 1");
        assert!(
            is_proportion(self.elitism_proportion),
            "elitism_proportion must be in [0, 1]"
        );
        assert!(
            is_proportion(self.selection_proportion),
            "selection_proportion must be in [0, 1]"
        );
        assert!(
            is_proportion(self.offspring_asexual_proportion),
            "offspring_asexual_proportion must be in [0, 1]"
        );
        assert!(
            is_proportion(self.offspring_recombination_proportion),
            "offspring_recombination_proportion must be in [0, 1]"
        );
        assert!(
            is_proportion(self.interspecies_mating_proportion),
            "interspecies_mating_proportion must be in [0, 1]"
        );
        assert!(
            self.statistics_history_length >= 1,
            "statistics_history_length must be >= 1"
        );
        assert!(
            (self.offspring_asexual_proportion + self.offspring_recombination_proportion - 1.0)
                .abs()
                <= 1e-6,
            "offspring_asexual_proportion and offspring_recombination_proportion must sum to 1"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        EvolutionSettings::default().validate();
    }

    #[test]
    fn test_simplifying_settings_force_asexual_reproduction() {
        let settings = EvolutionSettings::default().simplifying();
        settings.validate();
        assert!((settings.offspring_asexual_proportion - 1.0).abs() < f64::EPSILON);
        assert!(settings.offspring_recombination_proportion.abs() < f64::EPSILON);
        // Everything else is carried over.
        assert_eq!(settings.species_count, 10);
    }

    #[test]
    #[should_panic(expected = "sum to 1")]
    fn test_mismatched_offspring_proportions_rejected() {
        let settings = EvolutionSettings {
            offspring_asexual_proportion: 0.8,
            offspring_recombination_proportion: 0.5,
            ..EvolutionSettings::default()
        };
        settings.validate();
    }

    #[test]
    #[should_panic(expected = "elitism_proportion")]
    fn test_out_of_range_proportion_rejected() {
        let settings = EvolutionSettings {
            elitism_proportion: 1.5,
            ..EvolutionSettings::default()
        };
        settings.validate();
    }
}
