//! The generational evolution engine.

// Statistics use intentional casts between count and rate types
#![allow(clippy::cast_precision_loss)]

use crate::complexity::{ComplexityMode, ComplexityRegulation};
use crate::evaluation::{EvaluationError, FitnessEvaluator};
use crate::evolution::offspring::{Offspring, OffspringBuilder};
use crate::evolution::settings::EvolutionSettings;
use crate::evolution::stats::EvolutionStats;
use crate::evolution::update_species_allocation;
use crate::population::Population;
use crate::reproduction::{AsexualReproduction, SexualReproduction};
use crate::scalar::Scalar;
use crate::speciation::SpeciationStrategy;
use crate::stochastic::sort_desc_random_ties;
use rand::rngs::SmallRng;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Orchestrates one generation at a time over a population and its
/// collaborator strategies.
///
/// The engine is strictly sequential: each phase of a generation depends
/// on the previous phase's completed output, and the population is owned
/// exclusively by the engine for the run's duration. The fitness evaluator
/// and speciation strategy may parallelize internally over read-only
/// genome views.
///
/// Lifecycle: construct, call [`EvolutionEngine::initialise`] once, then
/// call [`EvolutionEngine::perform_one_generation`] repeatedly until the
/// caller decides to stop (typically when
/// [`EvolutionStats::stop_condition_satisfied`] turns true). The engine
/// itself has no terminal state.
pub struct EvolutionEngine<W: Scalar> {
    settings_current: EvolutionSettings,
    settings_complexifying: EvolutionSettings,
    settings_simplifying: EvolutionSettings,
    evaluator: Box<dyn FitnessEvaluator<W>>,
    speciation: Box<dyn SpeciationStrategy<W>>,
    complexity: Box<dyn ComplexityRegulation>,
    asexual: Box<dyn AsexualReproduction<W>>,
    sexual: Box<dyn SexualReproduction<W>>,
    offspring_builder: OffspringBuilder,
    population: Population<W>,
    rng: SmallRng,
    stats: EvolutionStats,
    initialised: bool,
    eval_count_prev: u64,
    eval_rate_sample_time: Option<Instant>,
}

impl<W: Scalar> EvolutionEngine<W> {
    /// Construct an engine over a population and its collaborators.
    ///
    /// # Panics
    ///
    /// Panics if the settings fail validation or the species count exceeds
    /// the population size.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        settings: EvolutionSettings,
        evaluator: Box<dyn FitnessEvaluator<W>>,
        speciation: Box<dyn SpeciationStrategy<W>>,
        complexity: Box<dyn ComplexityRegulation>,
        asexual: Box<dyn AsexualReproduction<W>>,
        sexual: Box<dyn SexualReproduction<W>>,
        mut population: Population<W>,
        rng: SmallRng,
    ) -> Self {
        settings.validate();
        assert!(
            settings.species_count <= population.genomes().len(),
            "species count is higher than the population size"
        );

        population
            .stats_mut()
            .best_fitness_history
            .reset_capacity(settings.statistics_history_length);
        population
            .stats_mut()
            .mean_complexity_history
            .reset_capacity(settings.statistics_history_length);

        let offspring_builder = OffspringBuilder::new(settings.interspecies_mating_proportion);

        Self {
            settings_current: settings,
            settings_complexifying: settings,
            settings_simplifying: settings.simplifying(),
            evaluator,
            speciation,
            complexity,
            asexual,
            sexual,
            offspring_builder,
            population,
            rng,
            stats: EvolutionStats::default(),
            initialised: false,
            eval_count_prev: 0,
            eval_rate_sample_time: None,
        }
    }

    /// The population under evolution.
    #[must_use]
    pub fn population(&self) -> &Population<W> {
        &self.population
    }

    /// Cumulative run statistics.
    #[must_use]
    pub fn stats(&self) -> &EvolutionStats {
        &self.stats
    }

    /// The complexity regulation mode currently in force.
    #[must_use]
    pub fn complexity_mode(&self) -> ComplexityMode {
        self.complexity.current_mode()
    }

    /// Evaluate the starting population, cluster it into species, and
    /// record the starting statistics.
    ///
    /// # Errors
    ///
    /// Propagates any evaluator error unmodified.
    ///
    /// # Panics
    ///
    /// Panics if the speciation strategy violates its contract.
    pub fn initialise(&mut self) -> Result<(), EvaluationError> {
        self.evaluator.evaluate(self.population.genomes())?;

        let evaluator = &*self.evaluator;
        self.population.initialise_species(
            &*self.speciation,
            self.settings_current.species_count,
            &|a, b| evaluator.compare_fitness(a, b),
            &mut self.rng,
        );

        let evaluation_count = self.population.genomes().len() as u64;
        self.update_stats(evaluation_count, 0, 0, 0);
        self.initialised = true;
        Ok(())
    }

    /// Perform one generation of the evolution algorithm.
    ///
    /// Creates offspring from the current species, trims every species to
    /// its elite prefix, rebuilds the population genome list, evaluates
    /// (offspring only, when the evaluator is deterministic), re-integrates
    /// the offspring into species, refreshes statistics and allocations,
    /// and updates the complexity regulation mode.
    ///
    /// # Errors
    ///
    /// Propagates any evaluator error unmodified; no phase is retried.
    ///
    /// # Panics
    ///
    /// Panics if called before [`EvolutionEngine::initialise`], or if a
    /// collaborator violates its contract (e.g. speciation leaves an empty
    /// species).
    pub fn perform_one_generation(&mut self) -> Result<(), EvaluationError> {
        assert!(self.initialised, "the engine is not initialised");

        // 1. Create offspring from the current species.
        let offspring = self.create_offspring();

        // 2. Trim every species back to its elite prefix. The genome lists
        // are sorted best-first, so truncation keeps the fittest. A species
        // trimmed to zero elites has gone extinct.
        let mut extinct_species = false;
        for sp in self
            .population
            .species_mut()
            .expect("initialised population has species")
        {
            sp.genomes.truncate(sp.stats.elite_size);
            if sp.stats.elite_size == 0 {
                extinct_species = true;
            }
        }

        // 3. Rebuild the flat genome list from the surviving elites, and
        // 4. append the new offspring. (Offspring are appended before
        // evaluation because a non-deterministic evaluator re-scores the
        // elites too.)
        let survivors: Vec<_> = self
            .population
            .species()
            .expect("initialised population has species")
            .iter()
            .flat_map(|sp| sp.genomes.iter().cloned())
            .collect();
        let genomes = self.population.genomes_mut();
        *genomes = survivors;
        genomes.extend(offspring.genomes.iter().cloned());

        // 5. Evaluate. A deterministic evaluator only needs to score the
        // offspring; the elites keep their scores from earlier generations.
        let evaluation_count = if self.evaluator.is_deterministic() {
            self.evaluator.evaluate(&offspring.genomes)?;
            offspring.genomes.len()
        } else {
            self.evaluator.evaluate(self.population.genomes())?;
            self.population.genomes().len()
        };

        // 6. Integrate the offspring into the species.
        self.integrate_offspring(&offspring, extinct_species);

        // 7. Update statistics and next-generation allocations.
        self.update_stats(
            evaluation_count as u64,
            offspring.asexual_count,
            offspring.recombination_count,
            offspring.interspecies_count,
        );

        // 8. Complexity regulation.
        self.update_complexity_mode();

        Ok(())
    }

    fn create_offspring(&mut self) -> Offspring<W> {
        self.offspring_builder.create_offspring(
            self.population
                .species()
                .expect("initialised population has species"),
            &*self.asexual,
            &*self.sexual,
            &*self.evaluator,
            &mut self.rng,
        )
    }

    /// Add the offspring to the species partition.
    ///
    /// If any species went extinct this generation, species membership is
    /// recomputed from scratch to redistribute all genomes evenly.
    /// Otherwise offspring are assigned incrementally to existing species,
    /// and every species is re-sorted best-first with randomized ties —
    /// both paths end with freshly sorted species.
    fn integrate_offspring(&mut self, offspring: &Offspring<W>, extinct_species: bool) {
        let evaluator = &*self.evaluator;
        if extinct_species {
            self.population.clear_all_species();
            self.population.initialise_species(
                &*self.speciation,
                self.settings_current.species_count,
                &|a, b| evaluator.compare_fitness(a, b),
                &mut self.rng,
            );
        } else {
            let species = self
                .population
                .species_mut()
                .expect("initialised population has species");
            self.speciation
                .speciate_add(&offspring.genomes, species, &mut self.rng);
            for sp in &mut **species {
                sort_desc_random_ties(
                    &mut sp.genomes,
                    |a, b| evaluator.compare_fitness(a.fitness(), b.fitness()),
                    &mut self.rng,
                );
            }
        }

        assert!(
            !self.population.contains_empty_species(),
            "speciation resulted in one or more empty species"
        );
    }

    fn update_stats(
        &mut self,
        evaluation_count_delta: u64,
        offspring_asexual_count: usize,
        offspring_recombination_count: usize,
        offspring_interspecies_count: usize,
    ) {
        let evaluator = &*self.evaluator;
        self.population
            .update_stats(&|a, b| evaluator.compare_fitness(a, b), &mut self.rng);

        // Record the current generation number, and advance the sequence.
        let generation_seq = Arc::clone(self.population.generation_seq());
        self.stats.generation = generation_seq.peek();
        let _ = generation_seq.next_id();

        self.stats.stop_condition_satisfied = self
            .evaluator
            .stop_condition_met(self.population.stats().best_fitness);

        self.stats.total_evaluation_count += evaluation_count_delta;
        self.update_evaluations_per_sec();

        self.stats.total_offspring_count +=
            (offspring_asexual_count + offspring_recombination_count) as u64;
        self.stats.total_offspring_asexual_count += offspring_asexual_count as u64;
        self.stats.total_offspring_recombination_count += offspring_recombination_count as u64;
        self.stats.total_offspring_interspecies_count += offspring_interspecies_count as u64;

        update_species_allocation(&mut self.population, &self.settings_current, &mut self.rng);
    }

    /// Refresh the evaluations-per-second figure over windows of at least
    /// one second; shorter windows give unrepresentative rates.
    fn update_evaluations_per_sec(&mut self) {
        let now = Instant::now();
        match self.eval_rate_sample_time {
            None => {
                self.eval_count_prev = self.stats.total_evaluation_count;
                self.eval_rate_sample_time = Some(now);
            }
            Some(prev) => {
                let elapsed = now.duration_since(prev);
                if elapsed > Duration::from_secs(1) {
                    let delta = self.stats.total_evaluation_count - self.eval_count_prev;
                    self.stats.evaluations_per_sec = delta as f64 / elapsed.as_secs_f64();
                    self.eval_count_prev = self.stats.total_evaluation_count;
                    self.eval_rate_sample_time = Some(now);
                }
            }
        }
    }

    fn update_complexity_mode(&mut self) {
        let previous_mode = self.complexity.current_mode();
        let mode = self
            .complexity
            .update_mode(&self.stats, self.population.stats());
        if mode == previous_mode {
            return;
        }

        self.asexual.notify_complexity_mode(mode);
        self.settings_current = match mode {
            ComplexityMode::Complexifying => self.settings_complexifying,
            ComplexityMode::Simplifying => self.settings_simplifying,
        };
    }
}

impl<W: Scalar> fmt::Debug for EvolutionEngine<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvolutionEngine")
            .field("initialised", &self.initialised)
            .field("stats", &self.stats)
            .field("population", &self.population)
            .finish_non_exhaustive()
    }
}
