//! Complexity regulation: alternating pressure between growing and
//! pruning network structure.
//!
//! The engine asks the active strategy once per generation whether to
//! remain in complexifying mode or switch to simplifying mode (which
//! forces all offspring through asexual reproduction to bias toward
//! pruning mutations).

use crate::evolution::EvolutionStats;
use crate::population::PopulationStats;
use std::fmt::Debug;

/// The two complexity regulation modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComplexityMode {
    /// Structure is allowed to grow.
    Complexifying,
    /// Evolution is biased toward pruning structure.
    Simplifying,
}

/// Decides the complexity regulation mode each generation.
pub trait ComplexityRegulation: Debug + Send {
    /// The mode currently in force.
    fn current_mode(&self) -> ComplexityMode;

    /// Re-evaluate the mode for the coming generation.
    fn update_mode(
        &mut self,
        evolution_stats: &EvolutionStats,
        population_stats: &PopulationStats,
    ) -> ComplexityMode;
}

/// Regulation that never simplifies.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullComplexityRegulation;

impl ComplexityRegulation for NullComplexityRegulation {
    fn current_mode(&self) -> ComplexityMode {
        ComplexityMode::Complexifying
    }

    fn update_mode(
        &mut self,
        _evolution_stats: &EvolutionStats,
        _population_stats: &PopulationStats,
    ) -> ComplexityMode {
        ComplexityMode::Complexifying
    }
}

/// Regulation against a fixed mean-complexity ceiling.
///
/// Switches to simplifying when mean complexity exceeds the ceiling, and
/// back to complexifying once simplification has been given a minimum
/// number of generations, mean complexity is back under the ceiling, and
/// the mean-complexity moving average has stopped falling.
#[derive(Debug, Clone, Copy)]
pub struct AbsoluteComplexityRegulation {
    ceiling: f64,
    min_simplify_generations: u32,
    mode: ComplexityMode,
    last_transition_generation: u32,
    prev_complexity_moving_average: f64,
}

impl AbsoluteComplexityRegulation {
    /// Create a strategy with a fixed `ceiling` on mean complexity.
    ///
    /// # Panics
    ///
    /// Panics if `ceiling` is less than 1 or `min_simplify_generations` is
    /// zero.
    #[must_use]
    pub fn new(ceiling: f64, min_simplify_generations: u32) -> Self {
        assert!(ceiling >= 1.0, "ceiling must be >= 1");
        assert!(
            min_simplify_generations > 0,
            "min_simplify_generations must be >= 1"
        );
        Self {
            ceiling,
            min_simplify_generations,
            mode: ComplexityMode::Complexifying,
            last_transition_generation: 0,
            prev_complexity_moving_average: 0.0,
        }
    }
}

impl ComplexityRegulation for AbsoluteComplexityRegulation {
    fn current_mode(&self) -> ComplexityMode {
        self.mode
    }

    fn update_mode(
        &mut self,
        evolution_stats: &EvolutionStats,
        population_stats: &PopulationStats,
    ) -> ComplexityMode {
        match self.mode {
            ComplexityMode::Complexifying => {
                if population_stats.mean_complexity > self.ceiling {
                    self.mode = ComplexityMode::Simplifying;
                    self.last_transition_generation = evolution_stats.generation;
                    self.prev_complexity_moving_average =
                        population_stats.mean_complexity_history.mean();
                }
            }
            ComplexityMode::Simplifying => {
                let moving_average = population_stats.mean_complexity_history.mean();
                if evolution_stats.generation - self.last_transition_generation
                    > self.min_simplify_generations
                    && population_stats.mean_complexity < self.ceiling
                    && moving_average - self.prev_complexity_moving_average >= 0.0
                {
                    self.mode = ComplexityMode::Complexifying;
                    self.last_transition_generation = evolution_stats.generation;
                }
                self.prev_complexity_moving_average = moving_average;
            }
        }
        self.mode
    }
}

/// Regulation against a moving ceiling set relative to the population's
/// mean complexity.
///
/// The ceiling is re-based to `mean complexity + margin` while
/// simplifying, so each complexify/simplify cycle allows structure to grow
/// by the margin before pruning pressure returns.
#[derive(Debug, Clone, Copy)]
pub struct RelativeComplexityRegulation {
    margin: f64,
    min_simplify_generations: u32,
    ceiling: f64,
    mode: ComplexityMode,
    last_transition_generation: u32,
    prev_complexity_moving_average: f64,
}

impl RelativeComplexityRegulation {
    /// Create a strategy allowing mean complexity to exceed its value at
    /// the last transition by `margin`.
    ///
    /// # Panics
    ///
    /// Panics if `margin` is less than 1 or `min_simplify_generations` is
    /// zero.
    #[must_use]
    pub fn new(margin: f64, min_simplify_generations: u32) -> Self {
        assert!(margin >= 1.0, "margin must be >= 1");
        assert!(
            min_simplify_generations > 0,
            "min_simplify_generations must be >= 1"
        );
        Self {
            margin,
            min_simplify_generations,
            ceiling: margin,
            mode: ComplexityMode::Complexifying,
            last_transition_generation: 0,
            prev_complexity_moving_average: 0.0,
        }
    }
}

impl ComplexityRegulation for RelativeComplexityRegulation {
    fn current_mode(&self) -> ComplexityMode {
        self.mode
    }

    fn update_mode(
        &mut self,
        evolution_stats: &EvolutionStats,
        population_stats: &PopulationStats,
    ) -> ComplexityMode {
        match self.mode {
            ComplexityMode::Complexifying => {
                if population_stats.mean_complexity > self.ceiling {
                    self.mode = ComplexityMode::Simplifying;
                    self.last_transition_generation = evolution_stats.generation;
                    self.prev_complexity_moving_average =
                        population_stats.mean_complexity_history.mean();
                }
            }
            ComplexityMode::Simplifying => {
                let moving_average = population_stats.mean_complexity_history.mean();
                if evolution_stats.generation - self.last_transition_generation
                    > self.min_simplify_generations
                    && population_stats.mean_complexity < self.ceiling
                    && moving_average - self.prev_complexity_moving_average >= 0.0
                {
                    self.mode = ComplexityMode::Complexifying;
                    self.last_transition_generation = evolution_stats.generation;
                    self.prev_complexity_moving_average = 0.0;
                } else {
                    self.prev_complexity_moving_average = moving_average;
                }
                // Re-base the ceiling on the current population mean.
                self.ceiling = population_stats.mean_complexity + self.margin;
            }
        }
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats_with_complexity(generation: u32, mean_complexity: f64) -> (EvolutionStats, PopulationStats) {
        let evolution_stats = EvolutionStats {
            generation,
            ..EvolutionStats::default()
        };
        let mut population_stats = PopulationStats::new(10);
        population_stats.mean_complexity = mean_complexity;
        population_stats.mean_complexity_history.push(mean_complexity);
        (evolution_stats, population_stats)
    }

    #[test]
    fn test_null_regulation_never_simplifies() {
        let mut regulation = NullComplexityRegulation;
        let (evolution_stats, population_stats) = stats_with_complexity(5, 1e9);
        assert_eq!(
            regulation.update_mode(&evolution_stats, &population_stats),
            ComplexityMode::Complexifying
        );
    }

    #[test]
    fn test_absolute_regulation_switches_at_ceiling() {
        let mut regulation = AbsoluteComplexityRegulation::new(10.0, 2);
        let (evolution_stats, population_stats) = stats_with_complexity(1, 5.0);
        assert_eq!(
            regulation.update_mode(&evolution_stats, &population_stats),
            ComplexityMode::Complexifying
        );

        let (evolution_stats, population_stats) = stats_with_complexity(2, 11.0);
        assert_eq!(
            regulation.update_mode(&evolution_stats, &population_stats),
            ComplexityMode::Simplifying
        );
    }

    #[test]
    fn test_absolute_regulation_returns_after_stall() {
        let mut regulation = AbsoluteComplexityRegulation::new(10.0, 2);
        let (evolution_stats, population_stats) = stats_with_complexity(1, 11.0);
        regulation.update_mode(&evolution_stats, &population_stats);
        assert_eq!(regulation.current_mode(), ComplexityMode::Simplifying);

        // Too soon to leave simplifying mode.
        let (evolution_stats, population_stats) = stats_with_complexity(2, 8.0);
        assert_eq!(
            regulation.update_mode(&evolution_stats, &population_stats),
            ComplexityMode::Simplifying
        );

        // Past the minimum generations, below ceiling, trend no longer
        // falling: switch back.
        let (evolution_stats, population_stats) = stats_with_complexity(5, 8.0);
        assert_eq!(
            regulation.update_mode(&evolution_stats, &population_stats),
            ComplexityMode::Complexifying
        );
    }

    #[test]
    fn test_relative_regulation_rebases_ceiling() {
        let mut regulation = RelativeComplexityRegulation::new(10.0, 1);
        // Mean complexity 12 exceeds the initial ceiling of 10.
        let (evolution_stats, population_stats) = stats_with_complexity(1, 12.0);
        assert_eq!(
            regulation.update_mode(&evolution_stats, &population_stats),
            ComplexityMode::Simplifying
        );

        // While simplifying at mean 6, the ceiling re-bases to 16, so a
        // later climb to 15 does not trigger simplification again.
        let (evolution_stats, population_stats) = stats_with_complexity(3, 6.0);
        regulation.update_mode(&evolution_stats, &population_stats);
        let (evolution_stats, population_stats) = stats_with_complexity(5, 6.0);
        assert_eq!(
            regulation.update_mode(&evolution_stats, &population_stats),
            ComplexityMode::Complexifying
        );

        let (evolution_stats, population_stats) = stats_with_complexity(6, 15.0);
        assert_eq!(
            regulation.update_mode(&evolution_stats, &population_stats),
            ComplexityMode::Complexifying
        );
    }
}
