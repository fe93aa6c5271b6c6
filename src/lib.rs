//! # layernet
//!
//! Explicit forward/backward layer units on top of `ndarray`: [`nn::Affine`],
//! [`nn::MatMul`] and [`nn::Sigmoid`], chained by [`nn::Sequential`] and
//! assembled into the two-layer perceptron [`nn::Network`].
//!
//! Gradients are computed layer by layer with the chain rule and written in
//! place into each layer's gradient slots. Updating parameters from those
//! gradients, computing a loss, and loading data are left to the caller.
//!
//! ```
//! use layernet::nn::Network;
//! use layernet::tensor::{Matrix, StandardNormal};
//!
//! let mut net = Network::new(2, 4, 3, &mut StandardNormal::seeded(7)).unwrap();
//! let out = net.predict(&Matrix::zeros((10, 2))).unwrap();
//! assert_eq!(out.dim(), (10, 3));
//! assert_eq!(net.params().len(), 4);
//! ```

pub mod config;
pub mod nn;
pub mod tensor;

pub use config::{load_config, ConfigError, InitConfig, NetworkConfig};
pub use nn::{Affine, CachePolicy, Layer, MatMul, Network, Sequential, Sigmoid};
pub use tensor::{Matrix, TensorData, TensorError, Vector};
