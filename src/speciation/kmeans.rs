//! Genetic k-means speciation.
//!
//! Clusters genomes by the Euclidean distance between their sparse
//! connection-weight vectors (keyed by (source, target) id pair; absent
//! connections contribute zero). Centroids are seeded from randomly chosen
//! genomes and refined with a fixed number of Lloyd iterations; a cluster
//! emptied by reassignment steals the farthest genome from the largest
//! cluster, so the partition always spans the requested species count.

use crate::genome::Genome;
use crate::scalar::Scalar;
use crate::speciation::{SpeciationStrategy, Species};
use crate::stochastic::shuffled_indices;
use rand::RngCore;
use std::collections::HashMap;
use std::sync::Arc;

/// Sparse connection-weight vector, keyed by connection id pair.
type WeightVector = HashMap<(u32, u32), f64>;

/// K-means clustering over genome connection-weight space.
#[derive(Debug, Clone, Copy)]
pub struct KMeansSpeciation {
    iterations: usize,
}

impl KMeansSpeciation {
    /// Create a strategy running `iterations` refinement passes.
    ///
    /// # Panics
    ///
    /// Panics if `iterations` is zero.
    #[must_use]
    pub fn new(iterations: usize) -> Self {
        assert!(iterations > 0, "iterations must be >= 1");
        Self { iterations }
    }
}

impl Default for KMeansSpeciation {
    fn default() -> Self {
        Self::new(4)
    }
}

impl<W: Scalar> SpeciationStrategy<W> for KMeansSpeciation {
    fn speciate_all(
        &self,
        genomes: &[Arc<Genome<W>>],
        species_count: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<Species<W>> {
        assert!(species_count > 0, "species_count must be >= 1");
        assert!(
            species_count <= genomes.len(),
            "species_count exceeds genome count"
        );

        let vectors: Vec<WeightVector> = genomes.iter().map(|g| weight_vector(g)).collect();

        // Seed centroids from distinct randomly chosen genomes.
        let seed_order = shuffled_indices(genomes.len(), rng);
        let mut centroids: Vec<WeightVector> = seed_order[..species_count]
            .iter()
            .map(|&i| vectors[i].clone())
            .collect();

        let mut clusters: Vec<Vec<usize>> = Vec::new();
        for _ in 0..self.iterations {
            clusters = assign_clusters(&vectors, &centroids, species_count);
            repair_empty_clusters(&mut clusters, &vectors, &centroids);
            for (centroid, members) in centroids.iter_mut().zip(&clusters) {
                *centroid = mean_vector(members.iter().map(|&i| &vectors[i]));
            }
        }

        clusters
            .into_iter()
            .enumerate()
            .map(|(id, members)| {
                Species::new(
                    u32::try_from(id).expect("species count exceeds u32 range"),
                    members.into_iter().map(|i| Arc::clone(&genomes[i])).collect(),
                )
            })
            .collect()
    }

    fn speciate_add(
        &self,
        offspring: &[Arc<Genome<W>>],
        species: &mut [Species<W>],
        _rng: &mut dyn RngCore,
    ) {
        // Assign each new genome to the nearest current centroid; existing
        // memberships are left untouched.
        let centroids: Vec<WeightVector> = species
            .iter()
            .map(|sp| {
                let vectors: Vec<WeightVector> =
                    sp.genomes.iter().map(|g| weight_vector(g)).collect();
                mean_vector(vectors.iter())
            })
            .collect();

        for genome in offspring {
            let vector = weight_vector(genome);
            let nearest = nearest_centroid(&vector, &centroids);
            species[nearest].genomes.push(Arc::clone(genome));
        }
    }
}

/// A genome's connections as a sparse weight vector.
fn weight_vector<W: Scalar>(genome: &Genome<W>) -> WeightVector {
    let connections = genome.connections();
    (0..connections.len())
        .map(|i| {
            let (src, tgt, weight) = connections.get(i);
            ((src, tgt), weight.to_f64())
        })
        .collect()
}

/// Squared Euclidean distance over the union of connection keys.
fn distance_sq(a: &WeightVector, b: &WeightVector) -> f64 {
    let mut total = 0.0;
    for (key, &av) in a {
        let bv = b.get(key).copied().unwrap_or(0.0);
        total += (av - bv) * (av - bv);
    }
    for (key, &bv) in b {
        if !a.contains_key(key) {
            total += bv * bv;
        }
    }
    total
}

/// Element-wise mean of a set of sparse vectors (absent entries are zero).
fn mean_vector<'a, I>(vectors: I) -> WeightVector
where
    I: Iterator<Item = &'a WeightVector>,
{
    let mut sum: WeightVector = HashMap::new();
    let mut count = 0usize;
    for vector in vectors {
        count += 1;
        for (&key, &value) in vector {
            *sum.entry(key).or_insert(0.0) += value;
        }
    }
    if count > 0 {
        // Genome counts stay well within f64's exact integer range
        #[allow(clippy::cast_precision_loss)]
        let divisor = count as f64;
        for value in sum.values_mut() {
            *value /= divisor;
        }
    }
    sum
}

fn nearest_centroid(vector: &WeightVector, centroids: &[WeightVector]) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (i, centroid) in centroids.iter().enumerate() {
        let d = distance_sq(vector, centroid);
        if d < best_distance {
            best_distance = d;
            best = i;
        }
    }
    best
}

fn assign_clusters(
    vectors: &[WeightVector],
    centroids: &[WeightVector],
    species_count: usize,
) -> Vec<Vec<usize>> {
    let mut clusters: Vec<Vec<usize>> = vec![Vec::new(); species_count];
    for (i, vector) in vectors.iter().enumerate() {
        clusters[nearest_centroid(vector, centroids)].push(i);
    }
    clusters
}

/// Give every empty cluster the genome farthest from the centroid of the
/// currently largest cluster.
fn repair_empty_clusters(
    clusters: &mut [Vec<usize>],
    vectors: &[WeightVector],
    centroids: &[WeightVector],
) {
    for empty_idx in 0..clusters.len() {
        if !clusters[empty_idx].is_empty() {
            continue;
        }

        let donor_idx = clusters
            .iter()
            .enumerate()
            .max_by_key(|(_, members)| members.len())
            .map(|(i, _)| i)
            .expect("at least one cluster exists");
        // The donor has at least two members whenever a repair is possible:
        // species_count <= genome count, so some cluster holds a surplus.
        let farthest_pos = clusters[donor_idx]
            .iter()
            .enumerate()
            .max_by(|&(_, &a), &(_, &b)| {
                distance_sq(&vectors[a], &centroids[donor_idx])
                    .total_cmp(&distance_sq(&vectors[b], &centroids[donor_idx]))
            })
            .map(|(pos, _)| pos)
            .expect("donor cluster is non-empty");
        let moved = clusters[donor_idx].swap_remove(farthest_pos);
        clusters[empty_idx].push(moved);
    }
}
