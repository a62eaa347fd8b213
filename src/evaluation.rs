//! Fitness evaluation contract and function-based adapters.
//!
//! The engine never computes fitness itself; an evaluator scores genome
//! lists and supplies the total order used for ranking, selection and tie
//! resolution. The adapters here lift a plain per-genome fitness function
//! into the contract, either strictly serially or fanned out with rayon.

use crate::genome::Genome;
use crate::scalar::Scalar;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::error::Error;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// An error surfaced by a fitness evaluator.
///
/// Wraps whatever the underlying evaluation failed with; the engine
/// propagates it unmodified and never retries.
#[derive(Debug)]
pub struct EvaluationError {
    source: Box<dyn Error + Send + Sync>,
}

impl EvaluationError {
    /// Wrap an underlying evaluation failure.
    #[must_use]
    pub fn new(source: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

impl fmt::Display for EvaluationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fitness evaluation failed: {}", self.source)
    }
}

impl Error for EvaluationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.source.as_ref())
    }
}

/// Scores genomes and defines the fitness order.
///
/// `evaluate` assigns each genome's fitness as a side effect; genomes are
/// otherwise read-only during evaluation, so an implementation is free to
/// parallelize internally over disjoint subsets. Fitness values must be
/// finite and non-negative: fitness sharing and fitness-proportionate
/// parent selection both treat fitness as a probability weight.
pub trait FitnessEvaluator<W: Scalar>: Send + Sync {
    /// Evaluate every genome in the list, assigning each its fitness.
    ///
    /// # Errors
    ///
    /// Returns any error raised by the underlying evaluation; the engine
    /// propagates it to the caller unmodified.
    fn evaluate(&self, genomes: &[Arc<Genome<W>>]) -> Result<(), EvaluationError>;

    /// True if re-evaluating a genome always yields the same fitness.
    ///
    /// When true, the engine evaluates only newly created offspring each
    /// generation; elite genomes keep their scores.
    fn is_deterministic(&self) -> bool;

    /// Total order over primary fitness values.
    fn compare_fitness(&self, a: f64, b: f64) -> Ordering {
        a.total_cmp(&b)
    }

    /// Test if `best_fitness` is good enough to stop the run.
    fn stop_condition_met(&self, best_fitness: f64) -> bool {
        let _ = best_fitness;
        false
    }
}

/// Evaluates genomes by applying a fitness function across a rayon thread
/// pool.
pub struct ParallelFunctionEvaluator<W, F> {
    fitness_fn: F,
    deterministic: bool,
    stop_threshold: Option<f64>,
    _weight: PhantomData<W>,
}

impl<W, F> ParallelFunctionEvaluator<W, F>
where
    W: Scalar,
    F: Fn(&Genome<W>) -> f64 + Send + Sync,
{
    /// Create an evaluator around `fitness_fn`.
    ///
    /// `deterministic` must reflect whether the function is a pure function
    /// of the genome.
    #[must_use]
    pub fn new(fitness_fn: F, deterministic: bool) -> Self {
        Self {
            fitness_fn,
            deterministic,
            stop_threshold: None,
            _weight: PhantomData,
        }
    }

    /// Stop the run once the best fitness reaches `threshold`.
    #[must_use]
    pub fn with_stop_threshold(mut self, threshold: f64) -> Self {
        self.stop_threshold = Some(threshold);
        self
    }
}

impl<W, F> FitnessEvaluator<W> for ParallelFunctionEvaluator<W, F>
where
    W: Scalar,
    F: Fn(&Genome<W>) -> f64 + Send + Sync,
{
    fn evaluate(&self, genomes: &[Arc<Genome<W>>]) -> Result<(), EvaluationError> {
        genomes
            .par_iter()
            .for_each(|genome| genome.set_fitness((self.fitness_fn)(genome)));
        Ok(())
    }

    fn is_deterministic(&self) -> bool {
        self.deterministic
    }

    fn stop_condition_met(&self, best_fitness: f64) -> bool {
        self.stop_threshold.is_some_and(|t| best_fitness >= t)
    }
}

impl<W, F> fmt::Debug for ParallelFunctionEvaluator<W, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParallelFunctionEvaluator")
            .field("deterministic", &self.deterministic)
            .field("stop_threshold", &self.stop_threshold)
            .finish_non_exhaustive()
    }
}

/// Evaluates genomes strictly serially on the calling thread.
///
/// Use when run-to-run determinism must not depend on thread scheduling.
pub struct SerialFunctionEvaluator<W, F> {
    fitness_fn: F,
    deterministic: bool,
    stop_threshold: Option<f64>,
    _weight: PhantomData<W>,
}

impl<W, F> SerialFunctionEvaluator<W, F>
where
    W: Scalar,
    F: Fn(&Genome<W>) -> f64 + Send + Sync,
{
    /// Create an evaluator around `fitness_fn`.
    #[must_use]
    pub fn new(fitness_fn: F, deterministic: bool) -> Self {
        Self {
            fitness_fn,
            deterministic,
            stop_threshold: None,
            _weight: PhantomData,
        }
    }

    /// Stop the run once the best fitness reaches `threshold`.
    #[must_use]
    pub fn with_stop_threshold(mut self, threshold: f64) -> Self {
        self.stop_threshold = Some(threshold);
        self
    }
}

impl<W, F> FitnessEvaluator<W> for SerialFunctionEvaluator<W, F>
where
    W: Scalar,
    F: Fn(&Genome<W>) -> f64 + Send + Sync,
{
    fn evaluate(&self, genomes: &[Arc<Genome<W>>]) -> Result<(), EvaluationError> {
        for genome in genomes {
            genome.set_fitness((self.fitness_fn)(genome));
        }
        Ok(())
    }

    fn is_deterministic(&self) -> bool {
        self.deterministic
    }

    fn stop_condition_met(&self, best_fitness: f64) -> bool {
        self.stop_threshold.is_some_and(|t| best_fitness >= t)
    }
}

impl<W, F> fmt::Debug for SerialFunctionEvaluator<W, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialFunctionEvaluator")
            .field("deterministic", &self.deterministic)
            .field("stop_threshold", &self.stop_threshold)
            .finish_non_exhaustive()
    }
}
