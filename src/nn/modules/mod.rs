//! # Neural Network Layer Modules
//!
//! Concrete [`Layer`](crate::nn::Layer) implementations.

pub mod linear;
pub use linear::{Affine, MatMul};

pub mod activation;
pub use activation::Sigmoid;
