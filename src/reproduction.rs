//! Reproduction operator contracts and the bundled weight-perturbation
//! operator.
//!
//! Structural mutation (add node, add connection, delete connection) and
//! crossover are pluggable collaborators; the engine only depends on the
//! traits here. The bundled asexual operator mutates weights only, which
//! lets it reuse the parent's entire topology — node map, graph and
//! reorder map — instead of rebuilding them, the hot path the genome
//! builder's precomputed-parts overload exists for.

use crate::complexity::ComplexityMode;
use crate::genome::{Genome, GenomeBuilder};
use crate::innovation::IdSequence;
use crate::scalar::Scalar;
use rand::{Rng, RngCore};
use std::fmt::Debug;
use std::sync::Arc;

/// Creates a child genome from a single parent.
pub trait AsexualReproduction<W: Scalar>: Debug + Send + Sync {
    /// Spawn a child genome from `parent`.
    fn create_child(&self, parent: &Genome<W>, rng: &mut dyn RngCore) -> Genome<W>;

    /// Notification that the engine switched complexity regulation mode.
    ///
    /// Operators that balance growing against pruning mutations adjust
    /// their behavior here; the default ignores the change.
    fn notify_complexity_mode(&self, mode: ComplexityMode) {
        let _ = mode;
    }
}

/// Creates a child genome by recombining two parents.
///
/// The engine always passes the fitter parent as `primary`.
pub trait SexualReproduction<W: Scalar>: Debug + Send + Sync {
    /// Spawn a child genome from the two parents.
    fn create_child(
        &self,
        primary: &Genome<W>,
        secondary: &Genome<W>,
        rng: &mut dyn RngCore,
    ) -> Genome<W>;
}

/// Asexual reproduction by weight perturbation.
///
/// Each connection weight is, with the configured probability, displaced
/// by a uniform delta and clamped to the metadata's magnitude limit. The
/// child shares the parent's topology, so the genome is built through the
/// precomputed-parts path without re-running graph analysis.
#[derive(Debug)]
pub struct WeightPerturbReproduction<W: Scalar> {
    builder: Arc<dyn GenomeBuilder<W>>,
    genome_id_seq: Arc<IdSequence>,
    generation_seq: Arc<IdSequence>,
    perturb_probability: f64,
    perturb_magnitude: f64,
}

impl<W: Scalar> WeightPerturbReproduction<W> {
    /// Create the operator.
    ///
    /// `perturb_probability` is the per-weight chance of perturbation;
    /// `perturb_magnitude` bounds the uniform delta applied to a perturbed
    /// weight. The id sequences are shared with the owning population and
    /// engine.
    ///
    /// # Panics
    ///
    /// Panics if `perturb_probability` is outside `[0, 1]` or
    /// `perturb_magnitude` is not positive and finite.
    #[must_use]
    pub fn new(
        builder: Arc<dyn GenomeBuilder<W>>,
        genome_id_seq: Arc<IdSequence>,
        generation_seq: Arc<IdSequence>,
        perturb_probability: f64,
        perturb_magnitude: f64,
    ) -> Self {
        assert!(
            (0.0..=1.0).contains(&perturb_probability),
            "perturb_probability must be in [0, 1]"
        );
        assert!(
            perturb_magnitude.is_finite() && perturb_magnitude > 0.0,
            "perturb_magnitude must be positive and finite"
        );
        Self {
            builder,
            genome_id_seq,
            generation_seq,
            perturb_probability,
            perturb_magnitude,
        }
    }
}

impl<W: Scalar> AsexualReproduction<W> for WeightPerturbReproduction<W> {
    fn create_child(&self, parent: &Genome<W>, rng: &mut dyn RngCore) -> Genome<W> {
        let max_weight = parent.metadata().max_weight_magnitude();
        let mut connections = parent.connections().clone();

        for i in 0..connections.len() {
            if rng.gen_range(0.0..1.0) < self.perturb_probability {
                let delta = rng.gen_range(-self.perturb_magnitude..=self.perturb_magnitude);
                let weight = (connections.weights()[i].to_f64() + delta)
                    .clamp(-max_weight, max_weight);
                connections.set_weight(i, W::from_f64(weight));
            }
        }

        // Topology is unchanged; reuse every derived structure from the
        // parent.
        self.builder.create_from_parts(
            self.genome_id_seq.next_id(),
            self.generation_seq.peek(),
            connections,
            Arc::clone(parent.hidden_node_ids()),
            Arc::clone(parent.node_map()),
            parent.graph().clone(),
            parent.reorder_map().cloned(),
        )
    }
}

/// Recombination by uniform weight crossover.
///
/// The child inherits the primary (fitter) parent's topology. For each
/// connection also present in the secondary parent, the weight is taken
/// from either parent with equal probability; connections only the
/// primary parent has keep its weight. Because the topology is the
/// primary parent's, the child reuses its derived structures.
#[derive(Debug)]
pub struct UniformWeightCrossover<W: Scalar> {
    builder: Arc<dyn GenomeBuilder<W>>,
    genome_id_seq: Arc<IdSequence>,
    generation_seq: Arc<IdSequence>,
}

impl<W: Scalar> UniformWeightCrossover<W> {
    /// Create the operator. The id sequences are shared with the owning
    /// population and engine.
    #[must_use]
    pub fn new(
        builder: Arc<dyn GenomeBuilder<W>>,
        genome_id_seq: Arc<IdSequence>,
        generation_seq: Arc<IdSequence>,
    ) -> Self {
        Self {
            builder,
            genome_id_seq,
            generation_seq,
        }
    }
}

impl<W: Scalar> SexualReproduction<W> for UniformWeightCrossover<W> {
    fn create_child(
        &self,
        primary: &Genome<W>,
        secondary: &Genome<W>,
        rng: &mut dyn RngCore,
    ) -> Genome<W> {
        let mut connections = primary.connections().clone();
        let other = secondary.connections();

        // Both parents' connection sets are sorted by (source, target), so
        // matching genes are found with a single merge walk.
        let mut j = 0;
        for i in 0..connections.len() {
            let (src, tgt, _) = connections.get(i);
            while j < other.len() && (other.source_ids()[j], other.target_ids()[j]) < (src, tgt) {
                j += 1;
            }
            if j < other.len()
                && (other.source_ids()[j], other.target_ids()[j]) == (src, tgt)
                && rng.gen_range(0.0..1.0) < 0.5
            {
                connections.set_weight(i, other.weights()[j]);
            }
        }

        self.builder.create_from_parts(
            self.genome_id_seq.next_id(),
            self.generation_seq.peek(),
            connections,
            Arc::clone(primary.hidden_node_ids()),
            Arc::clone(primary.node_map()),
            primary.graph().clone(),
            primary.reorder_map().cloned(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::{
        AcyclicGenomeBuilder, Activation, ConnectionSet, GenomeGraph, GenomeMetadata,
    };
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn parent_and_operator() -> (Genome<f64>, WeightPerturbReproduction<f64>) {
        let metadata = Arc::new(GenomeMetadata::acyclic(2, 1, Activation::ReLU, 5.0));
        let builder: Arc<dyn GenomeBuilder<f64>> =
            Arc::new(AcyclicGenomeBuilder::new(metadata, true));
        let connections =
            ConnectionSet::from_arrays(vec![0, 1], vec![2, 2], vec![1.0, -1.0]);
        let parent = builder.create(0, 0, connections);
        let operator = WeightPerturbReproduction::new(
            builder,
            Arc::new(IdSequence::new(1)),
            Arc::new(IdSequence::new(3)),
            1.0,
            0.5,
        );
        (parent, operator)
    }

    #[test]
    fn test_child_shares_parent_topology() {
        let (parent, operator) = parent_and_operator();
        let mut rng = SmallRng::seed_from_u64(8);
        let child = operator.create_child(&parent, &mut rng);

        assert_eq!(child.id(), 1);
        assert_eq!(child.birth_generation(), 3);
        let (GenomeGraph::Acyclic(parent_graph), GenomeGraph::Acyclic(child_graph)) =
            (parent.graph(), child.graph())
        else {
            panic!("expected acyclic graphs");
        };
        assert!(Arc::ptr_eq(parent_graph, child_graph));
        assert_eq!(
            child.connections().source_ids(),
            parent.connections().source_ids()
        );
    }

    #[test]
    fn test_crossover_mixes_only_shared_genes() {
        let metadata = Arc::new(GenomeMetadata::acyclic(2, 1, Activation::ReLU, 5.0));
        let builder: Arc<dyn GenomeBuilder<f64>> =
            Arc::new(AcyclicGenomeBuilder::new(metadata, true));

        // Primary has genes (0,2) and (1,2); secondary only (1,2).
        let primary = builder.create(
            0,
            0,
            ConnectionSet::from_arrays(vec![0, 1], vec![2, 2], vec![1.0, 2.0]),
        );
        let secondary = builder.create(
            1,
            0,
            ConnectionSet::from_arrays(vec![1], vec![2], vec![-2.0]),
        );

        let crossover = UniformWeightCrossover::new(
            Arc::clone(&builder),
            Arc::new(IdSequence::new(2)),
            Arc::new(IdSequence::new(1)),
        );

        let mut rng = SmallRng::seed_from_u64(31);
        for _ in 0..50 {
            let child = crossover.create_child(&primary, &secondary, &mut rng);
            // Topology always comes from the primary parent.
            assert_eq!(child.connections().source_ids(), &[0, 1]);
            // The unshared gene keeps the primary weight; the shared gene is
            // one of the two parent weights.
            assert!((child.connections().weights()[0] - 1.0).abs() < f64::EPSILON);
            let shared = child.connections().weights()[1];
            assert!((shared - 2.0).abs() < f64::EPSILON || (shared + 2.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_weights_perturbed_within_bounds() {
        let (parent, operator) = parent_and_operator();
        let mut rng = SmallRng::seed_from_u64(12);
        let child = operator.create_child(&parent, &mut rng);

        let changed = child
            .connections()
            .weights()
            .iter()
            .zip(parent.connections().weights())
            .any(|(c, p)| (c - p).abs() > f64::EPSILON);
        assert!(changed, "probability 1.0 must perturb every weight");
        assert!(child.connections().weights().iter().all(|w| w.abs() <= 5.0));
        // The parent's own weights are untouched.
        assert!((parent.connections().weights()[0] - 1.0).abs() < f64::EPSILON);
    }
}
