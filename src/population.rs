//! Population state: genomes, species partition, shared id sequences and
//! statistics.

mod factory;
mod stats;

pub use factory::create_seed_population;
pub use stats::{HistoryBuffer, PopulationStats};

use crate::genome::{Genome, GenomeBuilder, GenomeMetadata};
use crate::innovation::{AddedNodeBuffer, IdSequence};
use crate::scalar::Scalar;
use crate::speciation::{SpeciationStrategy, Species};
use crate::stochastic::sort_desc_random_ties;
use rand::{Rng, RngCore};
use std::cmp::Ordering;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Default capacity of the added-node innovation history buffer.
const ADDED_NODE_BUFFER_CAPACITY: usize = 0x20000;

/// Default capacity for the statistics history buffers.
const STATS_HISTORY_CAPACITY: usize = 100;

/// A population of genomes, together with its species partition and the
/// shared id sequences and innovation history that reproduction operators
/// draw from.
///
/// Constructed once per run and mutated in place every generation: the
/// species array is replaced on re-speciation and the genome list is
/// rebuilt from surviving elites plus offspring. The population is owned
/// exclusively by the evolution engine for the duration of a run.
pub struct Population<W: Scalar> {
    metadata: Arc<GenomeMetadata>,
    builder: Arc<dyn GenomeBuilder<W>>,
    genomes: Vec<Arc<Genome<W>>>,
    species: Option<Vec<Species<W>>>,
    target_size: usize,
    genome_id_seq: Arc<IdSequence>,
    innovation_id_seq: Arc<IdSequence>,
    generation_seq: Arc<IdSequence>,
    added_node_buffer: Arc<Mutex<AddedNodeBuffer>>,
    stats: PopulationStats,
}

impl<W: Scalar> Population<W> {
    /// Construct a population over the given genomes, deriving fresh id
    /// sequences from the highest ids observed in the genomes.
    ///
    /// # Panics
    ///
    /// Panics if `genomes` is empty.
    #[must_use]
    pub fn new(
        metadata: Arc<GenomeMetadata>,
        builder: Arc<dyn GenomeBuilder<W>>,
        genomes: Vec<Arc<Genome<W>>>,
    ) -> Self {
        let (max_genome_id, max_node_id) = max_observed_ids(&genomes, metadata.io_count());
        let genome_id_seq = Arc::new(IdSequence::new(max_genome_id + 1));
        let innovation_id_seq = Arc::new(IdSequence::new(max_node_id + 1));
        Self::with_sequences(
            metadata,
            builder,
            genomes,
            genome_id_seq,
            innovation_id_seq,
            ADDED_NODE_BUFFER_CAPACITY,
        )
    }

    /// Construct a population with explicitly provided id sequences, e.g.
    /// when resuming a run from a checkpoint.
    ///
    /// # Panics
    ///
    /// Panics if `genomes` is empty, or (in debug builds) if either
    /// sequence has already issued an id used by the genomes.
    #[must_use]
    pub fn with_sequences(
        metadata: Arc<GenomeMetadata>,
        builder: Arc<dyn GenomeBuilder<W>>,
        genomes: Vec<Arc<Genome<W>>>,
        genome_id_seq: Arc<IdSequence>,
        innovation_id_seq: Arc<IdSequence>,
        added_node_buffer_capacity: usize,
    ) -> Self {
        assert!(!genomes.is_empty(), "population requires at least one genome");

        #[cfg(debug_assertions)]
        {
            let (max_genome_id, max_node_id) = max_observed_ids(&genomes, metadata.io_count());
            debug_assert!(genome_id_seq.peek() > max_genome_id);
            debug_assert!(innovation_id_seq.peek() > max_node_id);
        }

        let target_size = genomes.len();
        Self {
            metadata,
            builder,
            genomes,
            species: None,
            target_size,
            genome_id_seq,
            innovation_id_seq,
            generation_seq: Arc::new(IdSequence::new(0)),
            added_node_buffer: Arc::new(Mutex::new(AddedNodeBuffer::new(
                added_node_buffer_capacity,
            ))),
            stats: PopulationStats::new(STATS_HISTORY_CAPACITY),
        }
    }

    /// The run-wide genome metadata.
    #[must_use]
    pub fn metadata(&self) -> &Arc<GenomeMetadata> {
        &self.metadata
    }

    /// The genome builder all genomes of the run are built through.
    #[must_use]
    pub fn builder(&self) -> &Arc<dyn GenomeBuilder<W>> {
        &self.builder
    }

    /// The flat genome list.
    #[must_use]
    pub fn genomes(&self) -> &[Arc<Genome<W>>] {
        &self.genomes
    }

    /// Mutable access to the flat genome list.
    #[must_use]
    pub fn genomes_mut(&mut self) -> &mut Vec<Arc<Genome<W>>> {
        &mut self.genomes
    }

    /// The species partition, if speciation has run.
    #[must_use]
    pub fn species(&self) -> Option<&[Species<W>]> {
        self.species.as_deref()
    }

    /// Mutable access to the species partition.
    #[must_use]
    pub fn species_mut(&mut self) -> Option<&mut Vec<Species<W>>> {
        self.species.as_mut()
    }

    /// The population size the allocation maintains.
    #[must_use]
    pub fn target_size(&self) -> usize {
        self.target_size
    }

    /// Sequence for minting genome ids.
    #[must_use]
    pub fn genome_id_seq(&self) -> &Arc<IdSequence> {
        &self.genome_id_seq
    }

    /// Sequence for minting node (innovation) ids.
    #[must_use]
    pub fn innovation_id_seq(&self) -> &Arc<IdSequence> {
        &self.innovation_id_seq
    }

    /// Sequence tracking the current generation number, shared with
    /// reproduction operators so child genomes record their birth
    /// generation.
    #[must_use]
    pub fn generation_seq(&self) -> &Arc<IdSequence> {
        &self.generation_seq
    }

    /// The added-node innovation history, shared with structural mutation
    /// operators.
    #[must_use]
    pub fn added_node_buffer(&self) -> &Arc<Mutex<AddedNodeBuffer>> {
        &self.added_node_buffer
    }

    /// Population statistics.
    #[must_use]
    pub fn stats(&self) -> &PopulationStats {
        &self.stats
    }

    /// Mutable access to the population statistics.
    #[must_use]
    pub fn stats_mut(&mut self) -> &mut PopulationStats {
        &mut self.stats
    }

    /// Initialise (or re-initialise) the species partition.
    ///
    /// Delegates clustering to the speciation strategy, then sorts each
    /// species' genome list by descending fitness with randomized ordering
    /// of fitness ties, so the elite/selection prefixes taken later do not
    /// favour insertion order.
    ///
    /// # Panics
    ///
    /// Panics if the strategy does not return exactly `species_count`
    /// species exhaustively partitioning the genome list.
    pub fn initialise_species(
        &mut self,
        strategy: &dyn SpeciationStrategy<W>,
        species_count: usize,
        comparer: &dyn Fn(f64, f64) -> Ordering,
        rng: &mut dyn RngCore,
    ) {
        let mut species = strategy.speciate_all(&self.genomes, species_count, rng);
        assert_eq!(
            species.len(),
            species_count,
            "speciation strategy returned the wrong number of species"
        );
        let partitioned: usize = species.iter().map(|sp| sp.genomes.len()).sum();
        assert_eq!(
            partitioned,
            self.genomes.len(),
            "speciation strategy did not partition the full genome list"
        );

        for sp in &mut species {
            sort_desc_random_ties(
                &mut sp.genomes,
                |a, b| comparer(a.fitness(), b.fitness()),
                rng,
            );
        }
        self.species = Some(species);
    }

    /// Recompute population and species statistics.
    ///
    /// Computes population-wide fitness/complexity aggregates, per-species
    /// mean fitness, and identifies the population-best genome. Candidate
    /// best species are all species whose top genome ties the best fitness;
    /// one is chosen uniformly at random among ties (species lists are
    /// sorted with randomized ties, so the top genome of a species is
    /// itself a fair draw from that species' tied best genomes).
    ///
    /// # Panics
    ///
    /// Panics if speciation has not run or any species is empty.
    pub fn update_stats(&mut self, comparer: &dyn Fn(f64, f64) -> Ordering, rng: &mut dyn RngCore) {
        let species = self
            .species
            .as_mut()
            .expect("update_stats requires an initialised species partition");

        // Population-wide aggregates.
        let mut fitness_sum = 0.0;
        let mut complexity_sum = 0.0;
        let mut max_complexity = 0.0f64;
        for genome in &self.genomes {
            fitness_sum += genome.fitness();
            let complexity = genome.complexity();
            complexity_sum += complexity;
            max_complexity = max_complexity.max(complexity);
        }

        // Species mean fitnesses and the candidate best species.
        let mut sum_species_mean_fitness = 0.0;
        for sp in &mut **species {
            assert!(!sp.genomes.is_empty(), "species has an empty genome list");
            // Genome counts stay well within f64's exact integer range
            #[allow(clippy::cast_precision_loss)]
            let mean = sp.genomes.iter().map(|g| g.fitness()).sum::<f64>()
                / sp.genomes.len() as f64;
            sp.stats.mean_fitness = mean;
            sum_species_mean_fitness += mean;
        }

        let mut candidate_indices = vec![0usize];
        let mut best_fitness = species[0].genomes[0].fitness();
        for (i, sp) in species.iter().enumerate().skip(1) {
            let species_best = sp.genomes[0].fitness();
            match comparer(species_best, best_fitness) {
                Ordering::Greater => {
                    candidate_indices.clear();
                    candidate_indices.push(i);
                    best_fitness = species_best;
                }
                Ordering::Equal => candidate_indices.push(i),
                Ordering::Less => {}
            }
        }
        let best_species_index = if candidate_indices.len() == 1 {
            candidate_indices[0]
        } else {
            candidate_indices[rng.gen_range(0..candidate_indices.len())]
        };

        let best_genome = Arc::clone(&species[best_species_index].genomes[0]);
        let best_genome_index = self
            .genomes
            .iter()
            .position(|g| Arc::ptr_eq(g, &best_genome))
            .expect("best genome is present in the population genome list");

        // Genome counts stay well within f64's exact integer range
        #[allow(clippy::cast_precision_loss)]
        let genome_count = self.genomes.len() as f64;
        let mean_complexity = complexity_sum / genome_count;

        self.stats.best_genome_index = best_genome_index;
        self.stats.best_fitness = best_genome.fitness();
        self.stats.mean_fitness = fitness_sum / genome_count;
        self.stats.best_complexity = best_genome.complexity();
        self.stats.mean_complexity = mean_complexity;
        self.stats.max_complexity = max_complexity;
        self.stats.sum_species_mean_fitness = sum_species_mean_fitness;
        self.stats.best_genome_species_index = best_species_index;
        self.stats.best_fitness_history.push(best_genome.fitness());
        self.stats.mean_complexity_history.push(mean_complexity);
    }

    /// Empty every species' genome list. The flat genome list is untouched.
    ///
    /// # Panics
    ///
    /// Panics if speciation has not run.
    pub fn clear_all_species(&mut self) {
        for sp in self.species.as_mut().expect("species initialised") {
            sp.genomes.clear();
        }
    }

    /// True if any species has an empty genome list.
    #[must_use]
    pub fn contains_empty_species(&self) -> bool {
        self.species
            .as_ref()
            .is_some_and(|species| species.iter().any(|sp| sp.genomes.is_empty()))
    }
}

impl<W: Scalar> fmt::Debug for Population<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Population")
            .field("genome_count", &self.genomes.len())
            .field("target_size", &self.target_size)
            .field(
                "species_count",
                &self.species.as_ref().map_or(0, Vec::len),
            )
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

/// The highest genome id and node id observed across the genomes.
///
/// The io node ids are always considered observed, so a connectionless
/// corner case still primes the innovation sequence past them.
fn max_observed_ids<W: Scalar>(genomes: &[Arc<Genome<W>>], io_count: usize) -> (u32, u32) {
    let mut max_genome_id = 0;
    let mut max_node_id = u32::try_from(io_count.saturating_sub(1)).expect("io count in u32 range");
    for genome in genomes {
        max_genome_id = max_genome_id.max(genome.id());
        for &id in genome
            .connections()
            .source_ids()
            .iter()
            .chain(genome.connections().target_ids())
        {
            max_node_id = max_node_id.max(id);
        }
    }
    (max_genome_id, max_node_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::{Activation, ConnectionSet, CyclicGenomeBuilder};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn cmp(a: f64, b: f64) -> std::cmp::Ordering {
        a.total_cmp(&b)
    }

    fn small_population(weights: &[f64]) -> Population<f64> {
        let metadata = Arc::new(GenomeMetadata::cyclic(1, 1, Activation::Tanh, 10.0, 1));
        let builder: Arc<dyn GenomeBuilder<f64>> =
            Arc::new(CyclicGenomeBuilder::new(Arc::clone(&metadata)));
        let genomes = weights
            .iter()
            .enumerate()
            .map(|(i, &w)| {
                let connections = ConnectionSet::from_arrays(vec![0], vec![1], vec![w]);
                Arc::new(builder.create(
                    u32::try_from(i).expect("small count"),
                    0,
                    connections,
                ))
            })
            .collect();
        Population::new(metadata, builder, genomes)
    }

    /// Splits genomes round-robin; good enough to exercise the population
    /// bookkeeping without a full clustering pass.
    #[derive(Debug)]
    struct RoundRobinSpeciation;

    impl SpeciationStrategy<f64> for RoundRobinSpeciation {
        fn speciate_all(
            &self,
            genomes: &[Arc<Genome<f64>>],
            species_count: usize,
            _rng: &mut dyn RngCore,
        ) -> Vec<Species<f64>> {
            let mut species: Vec<Species<f64>> = (0..species_count)
                .map(|i| Species::new(u32::try_from(i).expect("small count"), Vec::new()))
                .collect();
            for (i, genome) in genomes.iter().enumerate() {
                species[i % species_count].genomes.push(Arc::clone(genome));
            }
            species
        }

        fn speciate_add(
            &self,
            offspring: &[Arc<Genome<f64>>],
            species: &mut [Species<f64>],
            _rng: &mut dyn RngCore,
        ) {
            for (i, genome) in offspring.iter().enumerate() {
                species[i % species.len()].genomes.push(Arc::clone(genome));
            }
        }
    }

    #[test]
    fn test_id_sequences_start_past_observed_ids() {
        let population = small_population(&[0.1, 0.2, 0.3]);
        assert_eq!(population.genome_id_seq().peek(), 3);
        // io nodes 0 and 1 are the only node ids in play.
        assert_eq!(population.innovation_id_seq().peek(), 2);
    }

    #[test]
    fn test_initialise_species_sorts_descending() {
        let mut population = small_population(&[0.1, 0.2, 0.3, 0.4]);
        for (i, genome) in population.genomes().iter().enumerate() {
            // Genome counts stay well within f64's exact integer range
            #[allow(clippy::cast_precision_loss)]
            genome.set_fitness(i as f64);
        }
        let mut rng = SmallRng::seed_from_u64(2);
        population.initialise_species(&RoundRobinSpeciation, 2, &cmp, &mut rng);

        let species = population.species().expect("species initialised");
        assert_eq!(species.len(), 2);
        for sp in species {
            for pair in sp.genomes.windows(2) {
                assert!(pair[0].fitness() >= pair[1].fitness());
            }
        }
    }

    #[test]
    fn test_update_stats_finds_best_genome() {
        let mut population = small_population(&[0.1, 0.2, 0.3, 0.4]);
        let fitnesses = [1.0, 7.0, 3.0, 5.0];
        for (genome, &f) in population.genomes().iter().zip(&fitnesses) {
            genome.set_fitness(f);
        }
        let mut rng = SmallRng::seed_from_u64(4);
        population.initialise_species(&RoundRobinSpeciation, 2, &cmp, &mut rng);
        population.update_stats(&cmp, &mut rng);

        let stats = population.stats();
        assert!((stats.best_fitness - 7.0).abs() < f64::EPSILON);
        assert_eq!(stats.best_genome_index, 1);
        assert!((stats.mean_fitness - 4.0).abs() < f64::EPSILON);
        // Species means: {1, 3} -> 2 and {7, 5} -> 6.
        assert!((stats.sum_species_mean_fitness - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clear_and_contains_empty_species() {
        let mut population = small_population(&[0.1, 0.2]);
        let mut rng = SmallRng::seed_from_u64(6);
        population.initialise_species(&RoundRobinSpeciation, 2, &cmp, &mut rng);
        assert!(!population.contains_empty_species());
        population.clear_all_species();
        assert!(population.contains_empty_species());
        assert_eq!(population.genomes().len(), 2);
    }
}
