//! # Activation Function Modules

use crate::nn::functional as F;
use crate::nn::{CachePolicy, ForwardCache, Layer};
use crate::tensor::{Matrix, TensorError};
use log::trace;

/// Applies the Sigmoid function element-wise.
/// `Sigmoid(x) = 1 / (1 + exp(-x))`
///
/// No parameters. Caches its own output, which is all backward needs.
#[derive(Debug, Clone)]
pub struct Sigmoid {
    out: ForwardCache<Matrix>,
}

impl Sigmoid {
    pub fn new() -> Self {
        Sigmoid {
            out: ForwardCache::new("Sigmoid", CachePolicy::default()),
        }
    }

    /// Builder-style cache policy override.
    pub fn with_policy(mut self, policy: CachePolicy) -> Self {
        self.out.set_policy(policy);
        self
    }
}

impl Default for Sigmoid {
    fn default() -> Self {
        Self::new()
    }
}

impl Layer for Sigmoid {
    fn name(&self) -> &'static str {
        "Sigmoid"
    }

    fn forward(&mut self, x: &Matrix) -> Result<Matrix, TensorError> {
        self.out.check_forward()?;
        let out = F::sigmoid(x);
        trace!("Sigmoid forward {:?}", out.dim());
        self.out.prime(out.clone());
        Ok(out)
    }

    fn backward(&mut self, dout: &Matrix) -> Result<Matrix, TensorError> {
        let dx = F::sigmoid_backward(self.out.get()?, dout)?;
        trace!("Sigmoid backward {:?}", dx.dim());
        self.out.clear();
        Ok(dx)
    }

    fn is_primed(&self) -> bool {
        self.out.is_primed()
    }

    fn set_cache_policy(&mut self, policy: CachePolicy) {
        self.out.set_policy(policy);
    }
}
