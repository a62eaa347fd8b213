//! Run-wide genome metadata.

use serde::{Deserialize, Serialize};

/// Identifier for the activation function a decoded network will apply at
/// its hidden and output nodes.
///
/// The engine never evaluates activation functions; the identifier travels
/// with the metadata so a downstream decoder knows what to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    /// Rectified linear unit.
    ReLU,
    /// Leaky rectified linear unit.
    LeakyReLU,
    /// Logistic sigmoid.
    Logistic,
    /// Hyperbolic tangent.
    Tanh,
}

/// Immutable metadata shared by every genome of a run.
///
/// One instance is created per run and shared by reference; genomes never
/// carry their own copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_copy_implementations)]
pub struct GenomeMetadata {
    input_count: usize,
    output_count: usize,
    acyclic: bool,
    activation: Activation,
    max_weight_magnitude: f64,
    cycles_per_activation: usize,
}

impl GenomeMetadata {
    /// Metadata for evolving acyclic (feed-forward) networks.
    ///
    /// # Panics
    ///
    /// Panics if either node count is zero or the weight magnitude is not a
    /// positive finite value.
    #[must_use]
    pub fn acyclic(
        input_count: usize,
        output_count: usize,
        activation: Activation,
        max_weight_magnitude: f64,
    ) -> Self {
        Self::new(
            input_count,
            output_count,
            true,
            activation,
            max_weight_magnitude,
            1,
        )
    }

    /// Metadata for evolving cyclic (recurrent) networks.
    ///
    /// `cycles_per_activation` is the number of times a decoded network
    /// propagates signals per activation.
    ///
    /// # Panics
    ///
    /// Panics if either node count or `cycles_per_activation` is zero, or
    /// the weight magnitude is not a positive finite value.
    #[must_use]
    pub fn cyclic(
        input_count: usize,
        output_count: usize,
        activation: Activation,
        max_weight_magnitude: f64,
        cycles_per_activation: usize,
    ) -> Self {
        assert!(cycles_per_activation > 0, "cycles_per_activation must be >= 1");
        Self::new(
            input_count,
            output_count,
            false,
            activation,
            max_weight_magnitude,
            cycles_per_activation,
        )
    }

    fn new(
        input_count: usize,
        output_count: usize,
        acyclic: bool,
        activation: Activation,
        max_weight_magnitude: f64,
        cycles_per_activation: usize,
    ) -> Self {
        assert!(input_count > 0, "input_count must be >= 1");
        assert!(output_count > 0, "output_count must be >= 1");
        assert!(
            max_weight_magnitude.is_finite() && max_weight_magnitude > 0.0,
            "max_weight_magnitude must be positive and finite"
        );
        Self {
            input_count,
            output_count,
            acyclic,
            activation,
            max_weight_magnitude,
            cycles_per_activation,
        }
    }

    /// The number of input nodes.
    #[must_use]
    pub fn input_count(&self) -> usize {
        self.input_count
    }

    /// The number of output nodes.
    #[must_use]
    pub fn output_count(&self) -> usize {
        self.output_count
    }

    /// The combined input and output node count. Input and output nodes are
    /// assigned the fixed ids `0..io_count`; hidden node ids start above.
    #[must_use]
    pub fn io_count(&self) -> usize {
        self.input_count + self.output_count
    }

    /// True if genomes must describe acyclic graphs.
    #[must_use]
    pub fn is_acyclic(&self) -> bool {
        self.acyclic
    }

    /// The activation function a decoder should apply.
    #[must_use]
    pub fn activation(&self) -> Activation {
        self.activation
    }

    /// The maximum absolute connection weight.
    #[must_use]
    pub fn max_weight_magnitude(&self) -> f64 {
        self.max_weight_magnitude
    }

    /// Signal propagation cycles per activation (cyclic networks only).
    #[must_use]
    pub fn cycles_per_activation(&self) -> usize {
        self.cycles_per_activation
    }
}
