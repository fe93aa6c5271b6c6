//! # Neural Network Module (`nn`)
//!
//! Layers with explicit forward and backward passes, the [`Sequential`]
//! container that chains them, and the two-layer perceptron [`Network`].

use crate::tensor::{Matrix, TensorData, TensorError};
use log::trace;
use ndarray::{ArrayViewD, ArrayViewMutD};
use std::fmt::Debug;

// --- Submodules ---
pub mod cache;
pub mod functional;
pub mod modules;
pub mod network;

// Re-export common items
pub use cache::{CachePolicy, ForwardCache};
pub use modules::*;
pub use network::Network;

// --- Core Trait: Layer ---

/// A unit with a forward transform and the matching gradient transform.
///
/// `forward` caches what `backward` needs; `backward` consumes that cache,
/// overwrites the layer's gradient slots, and returns the gradient with
/// respect to the layer input. Calls must come in forward/backward pairs
/// on the same batch.
///
/// Parameter and gradient views are reported in the same fixed order, so
/// index `i` of [`Layer::params`] pairs with index `i` of [`Layer::grads`].
/// Views borrow the layer's storage; writes through
/// [`Layer::params_mut`] land in the layer itself.
pub trait Layer: Debug {
    /// Short type name used in errors and logs.
    fn name(&self) -> &'static str;

    /// Computes the output for a `(batch, features)` input and primes the cache.
    fn forward(&mut self, x: &Matrix) -> Result<Matrix, TensorError>;

    /// Given `dL/d(out)`, writes parameter gradients and returns `dL/dx`.
    ///
    /// # Errors
    /// * [`TensorError::UninitializedState`] if no forward pass is cached.
    /// * [`TensorError::ShapeMismatch`] if `dout` does not match the cached batch.
    ///   The cache stays primed so the call can be retried.
    fn backward(&mut self, dout: &Matrix) -> Result<Matrix, TensorError>;

    /// Borrowed views of the learnable parameters in their fixed order.
    /// Empty for parameter-free layers.
    fn params(&self) -> Vec<ArrayViewD<'_, TensorData>> {
        Vec::new()
    }

    /// Latest gradients, index-aligned with [`Layer::params`] and of the same shapes.
    fn grads(&self) -> Vec<ArrayViewD<'_, TensorData>> {
        Vec::new()
    }

    /// Mutable views of the parameters; writes land in the layer's own storage.
    fn params_mut(&mut self) -> Vec<ArrayViewMutD<'_, TensorData>> {
        Vec::new()
    }

    /// Each parameter paired with its latest gradient, for an external optimizer.
    fn params_and_grads_mut(
        &mut self,
    ) -> Vec<(ArrayViewMutD<'_, TensorData>, ArrayViewD<'_, TensorData>)> {
        Vec::new()
    }

    /// Resets every gradient slot to zero.
    fn zero_grads(&mut self) {}

    /// Expected input features, or `None` if the layer preserves shape.
    fn input_dim(&self) -> Option<usize> {
        None
    }

    /// Produced output features, or `None` if the layer preserves shape.
    fn output_dim(&self) -> Option<usize> {
        None
    }

    /// Whether a forward pass is cached and waiting for its backward.
    fn is_primed(&self) -> bool;

    fn set_cache_policy(&mut self, policy: CachePolicy);
}

// --- Sequential container ---

/// Layers applied in order on the forward pass and in reverse on the backward pass.
#[derive(Debug, Default)]
pub struct Sequential {
    layers: Vec<Box<dyn Layer>>,
}

impl Sequential {
    /// Creates a new empty Sequential container.
    pub fn new() -> Self {
        Sequential { layers: Vec::new() }
    }

    /// Appends a layer after checking that it composes with the current tail.
    ///
    /// Shape-preserving layers are skipped when looking for the tail's
    /// output width.
    pub fn push(&mut self, layer: Box<dyn Layer>) -> Result<(), TensorError> {
        if let (Some(prev), Some(next)) = (self.output_dim(), layer.input_dim()) {
            if prev != next {
                return Err(TensorError::shape("Sequential::push", &[prev], &[next]));
            }
        }
        self.layers.push(layer);
        Ok(())
    }

    /// Builder-style [`Sequential::push`].
    pub fn with(mut self, layer: impl Layer + 'static) -> Result<Self, TensorError> {
        self.push(Box::new(layer))?;
        Ok(self)
    }

    pub fn layers(&self) -> &[Box<dyn Layer>] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl Layer for Sequential {
    fn name(&self) -> &'static str {
        "Sequential"
    }

    fn forward(&mut self, x: &Matrix) -> Result<Matrix, TensorError> {
        let mut current = x.clone();
        for layer in &mut self.layers {
            current = layer.forward(&current)?;
        }
        Ok(current)
    }

    fn backward(&mut self, dout: &Matrix) -> Result<Matrix, TensorError> {
        let mut grad = dout.clone();
        for layer in self.layers.iter_mut().rev() {
            grad = layer.backward(&grad)?;
            trace!("{} passed gradient {:?} upstream", layer.name(), grad.dim());
        }
        Ok(grad)
    }

    fn params(&self) -> Vec<ArrayViewD<'_, TensorData>> {
        self.layers.iter().flat_map(|l| l.params()).collect()
    }

    fn grads(&self) -> Vec<ArrayViewD<'_, TensorData>> {
        self.layers.iter().flat_map(|l| l.grads()).collect()
    }

    fn params_mut(&mut self) -> Vec<ArrayViewMutD<'_, TensorData>> {
        self.layers.iter_mut().flat_map(|l| l.params_mut()).collect()
    }

    fn params_and_grads_mut(
        &mut self,
    ) -> Vec<(ArrayViewMutD<'_, TensorData>, ArrayViewD<'_, TensorData>)> {
        self.layers
            .iter_mut()
            .flat_map(|l| l.params_and_grads_mut())
            .collect()
    }

    fn zero_grads(&mut self) {
        for layer in &mut self.layers {
            layer.zero_grads();
        }
    }

    fn input_dim(&self) -> Option<usize> {
        self.layers.iter().find_map(|l| l.input_dim())
    }

    fn output_dim(&self) -> Option<usize> {
        self.layers.iter().rev().find_map(|l| l.output_dim())
    }

    fn is_primed(&self) -> bool {
        self.layers.iter().any(|l| l.is_primed())
    }

    fn set_cache_policy(&mut self, policy: CachePolicy) {
        for layer in &mut self.layers {
            layer.set_cache_policy(policy);
        }
    }
}
