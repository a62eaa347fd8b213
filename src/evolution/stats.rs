//! Cumulative evolution algorithm statistics.

/// Statistics accumulated across a run, updated once per generation.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvolutionStats {
    /// The current generation number (0 before the first generation).
    pub generation: u32,
    /// True once the evaluator has reported its stop condition satisfied.
    pub stop_condition_satisfied: bool,
    /// Total number of genome evaluations performed.
    pub total_evaluation_count: u64,
    /// Evaluations per second over the most recent sampling window.
    pub evaluations_per_sec: f64,
    /// Total offspring created.
    pub total_offspring_count: u64,
    /// Offspring created by asexual reproduction.
    pub total_offspring_asexual_count: u64,
    /// Offspring created by recombination.
    pub total_offspring_recombination_count: u64,
    /// Recombination offspring with parents from different species.
    pub total_offspring_interspecies_count: u64,
}
