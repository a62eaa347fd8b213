//! Seed population construction.

use crate::genome::{ConnectionSet, Genome, GenomeBuilder, GenomeMetadata};
use crate::innovation::IdSequence;
use crate::population::Population;
use crate::scalar::Scalar;
use crate::stochastic::{shuffled_indices, stochastic_round};
use rand::Rng;
use std::sync::Arc;

/// Create a randomly initialised seed population.
///
/// Input and output nodes take the fixed ids `0..io_count` (inputs first).
/// Each genome receives a random subset of the possible input→output
/// connections — `connectivity` as a proportion of the fully-connected
/// count, stochastically rounded, and at least one — with weights drawn
/// uniformly within the metadata's magnitude limit. The population's
/// innovation id sequence starts just past the io node ids, so hidden
/// nodes added later mint fresh ids.
///
/// # Panics
///
/// Panics if `population_size` is zero or `connectivity` is outside
/// `(0, 1]`.
pub fn create_seed_population<W, R>(
    metadata: Arc<GenomeMetadata>,
    builder: Arc<dyn GenomeBuilder<W>>,
    population_size: usize,
    connectivity: f64,
    rng: &mut R,
) -> Population<W>
where
    W: Scalar,
    R: Rng + ?Sized,
{
    assert!(population_size > 0, "population_size must be >= 1");
    assert!(
        connectivity > 0.0 && connectivity <= 1.0,
        "connectivity must be in (0, 1]"
    );

    let input_count = metadata.input_count();
    let output_count = metadata.output_count();
    let io_count = metadata.io_count();

    // All possible input -> output connections, in (source, target) order.
    let mut all_pairs = Vec::with_capacity(input_count * output_count);
    for src in 0..input_count {
        for tgt in input_count..io_count {
            all_pairs.push((
                u32::try_from(src).expect("node count in u32 range"),
                u32::try_from(tgt).expect("node count in u32 range"),
            ));
        }
    }

    let genome_id_seq = Arc::new(IdSequence::new(0));
    let innovation_id_seq = Arc::new(IdSequence::new(
        u32::try_from(io_count).expect("node count in u32 range"),
    ));

    let max_weight = metadata.max_weight_magnitude();
    // Fully-connected pair counts stay well within f64's exact integer range
    #[allow(clippy::cast_precision_loss)]
    let target_connections = all_pairs.len() as f64 * connectivity;

    let genomes = (0..population_size)
        .map(|_| {
            let connection_count = stochastic_round(target_connections, rng).max(1);

            // A random sample of the possible connections, restored to
            // (source, target) order.
            let mut sample = shuffled_indices(all_pairs.len(), rng);
            sample.truncate(connection_count);
            sample.sort_unstable();

            let mut connections = ConnectionSet::with_capacity(connection_count);
            for pair_idx in sample {
                let (src, tgt) = all_pairs[pair_idx];
                let weight = W::from_f64(rng.gen_range(-max_weight..=max_weight));
                connections.push(src, tgt, weight);
            }

            Arc::new(builder.create(genome_id_seq.next_id(), 0, connections))
        })
        .collect::<Vec<Arc<Genome<W>>>>();

    Population::with_sequences(
        metadata,
        builder,
        genomes,
        genome_id_seq,
        innovation_id_seq,
        super::ADDED_NODE_BUFFER_CAPACITY,
    )
}
