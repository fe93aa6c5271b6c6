//! # Two-Layer Perceptron
//!
//! `Affine -> Sigmoid -> Affine`, with parameters drawn once from an
//! [`Initializer`] and owned by the layers thereafter.

use super::{Affine, CachePolicy, Layer, Sequential, Sigmoid};
use crate::config::{check_sizes, ConfigError, NetworkConfig};
use crate::tensor::{Initializer, Matrix, TensorData, TensorError};
use log::debug;
use ndarray::{ArrayViewD, ArrayViewMutD};

/// Two-layer perceptron `Affine(W1, b1) -> Sigmoid -> Affine(W2, b2)`.
///
/// The layer sequence is fixed at construction. Parameters and gradients
/// live in the layers; the network only hands out borrowed views of them.
#[derive(Debug)]
pub struct Network {
    input_size: usize,
    hidden_size: usize,
    output_size: usize,
    layers: Sequential,
}

impl Network {
    /// Builds `Affine(W1, b1) -> Sigmoid -> Affine(W2, b2)` with
    /// `W1: (input, hidden)`, `b1: (hidden,)`, `W2: (hidden, output)`, `b2: (output,)`.
    pub fn new<I>(
        input_size: usize,
        hidden_size: usize,
        output_size: usize,
        init: &mut I,
    ) -> Result<Self, ConfigError>
    where
        I: Initializer + ?Sized,
    {
        Self::with_policy(
            input_size,
            hidden_size,
            output_size,
            init,
            CachePolicy::default(),
        )
    }

    /// Like [`Network::new`], with an explicit cache policy for every layer.
    pub fn with_policy<I>(
        input_size: usize,
        hidden_size: usize,
        output_size: usize,
        init: &mut I,
        policy: CachePolicy,
    ) -> Result<Self, ConfigError>
    where
        I: Initializer + ?Sized,
    {
        check_sizes(input_size, hidden_size, output_size)?;

        let w1 = init.matrix(input_size, hidden_size);
        let b1 = init.vector(hidden_size);
        let w2 = init.matrix(hidden_size, output_size);
        let b2 = init.vector(output_size);

        let mut layers = Sequential::new()
            .with(Affine::new(w1, b1)?)?
            .with(Sigmoid::new())?
            .with(Affine::new(w2, b2)?)?;
        layers.set_cache_policy(policy);

        debug!(
            "built network {input_size} -> {hidden_size} -> {output_size} ({policy:?} cache)"
        );
        Ok(Network {
            input_size,
            hidden_size,
            output_size,
            layers,
        })
    }

    /// Builds the network described by a validated configuration.
    pub fn from_config(config: &NetworkConfig) -> Result<Self, ConfigError> {
        let mut init = config.init.build()?;
        Self::with_policy(
            config.input_size,
            config.hidden_size,
            config.output_size,
            init.as_mut(),
            config.cache_policy,
        )
    }

    /// Runs `x: (N, input_size)` through every layer and returns `(N, output_size)`.
    ///
    /// Every layer is left primed, so a [`Network::backward`] may follow.
    pub fn predict(&mut self, x: &Matrix) -> Result<Matrix, TensorError> {
        self.layers.forward(x)
    }

    /// Propagates `dL/d(out)` back through the layers in reverse order,
    /// writing every layer's gradients, and returns `dL/dx`.
    pub fn backward(&mut self, dout: &Matrix) -> Result<Matrix, TensorError> {
        self.layers.backward(dout)
    }

    /// `[W1, b1, W2, b2]`, borrowed from the layers.
    pub fn params(&self) -> Vec<ArrayViewD<'_, TensorData>> {
        self.layers.params()
    }

    /// Gradients in the same order as [`Network::params`].
    pub fn grads(&self) -> Vec<ArrayViewD<'_, TensorData>> {
        self.layers.grads()
    }

    pub fn params_mut(&mut self) -> Vec<ArrayViewMutD<'_, TensorData>> {
        self.layers.params_mut()
    }

    /// Parameters paired with their gradients, for an optimizer step.
    ///
    /// The views must not outlive the network; they borrow its storage.
    pub fn params_and_grads_mut(
        &mut self,
    ) -> Vec<(ArrayViewMutD<'_, TensorData>, ArrayViewD<'_, TensorData>)> {
        self.layers.params_and_grads_mut()
    }

    pub fn zero_grads(&mut self) {
        self.layers.zero_grads();
    }

    pub fn layers(&self) -> &[Box<dyn Layer>] {
        self.layers.layers()
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    pub fn output_size(&self) -> usize {
        self.output_size
    }
}
