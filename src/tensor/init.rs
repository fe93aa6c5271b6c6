//! # Parameter Initialization
//!
//! Pluggable sources of initial parameter values. Layers never depend on a
//! particular distribution; the [`Network`](crate::nn::Network) asks an
//! [`Initializer`] for arrays of the exact shapes it needs.

use super::{Matrix, TensorData, Vector};
use crate::config::ConfigError;
use ndarray_rand::rand_distr::{StandardNormal as Normal01, Uniform as UniformDist};
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// A source of initial parameter arrays.
pub trait Initializer {
    /// A `(rows, cols)` weight matrix.
    fn matrix(&mut self, rows: usize, cols: usize) -> Matrix;

    /// A bias vector of length `len`.
    fn vector(&mut self, len: usize) -> Vector;
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Draws every entry from `N(0, 1)`.
#[derive(Debug, Clone)]
pub struct StandardNormal {
    rng: StdRng,
}

impl StandardNormal {
    /// Seeded from OS entropy.
    pub fn new() -> Self {
        StandardNormal { rng: make_rng(None) }
    }

    /// Reproducible draws for a fixed `seed`.
    pub fn seeded(seed: u64) -> Self {
        StandardNormal {
            rng: make_rng(Some(seed)),
        }
    }

    pub(crate) fn from_seed(seed: Option<u64>) -> Self {
        StandardNormal { rng: make_rng(seed) }
    }
}

impl Default for StandardNormal {
    fn default() -> Self {
        Self::new()
    }
}

impl Initializer for StandardNormal {
    fn matrix(&mut self, rows: usize, cols: usize) -> Matrix {
        Matrix::random_using((rows, cols), Normal01, &mut self.rng)
    }

    fn vector(&mut self, len: usize) -> Vector {
        Vector::random_using(len, Normal01, &mut self.rng)
    }
}

/// Draws every entry uniformly from `[low, high)`.
#[derive(Debug, Clone)]
pub struct Uniform {
    dist: UniformDist<TensorData>,
    rng: StdRng,
}

impl Uniform {
    /// Fails unless both bounds are finite, `low < high`, and the width
    /// `high - low` is itself finite.
    pub fn new(low: TensorData, high: TensorData, seed: Option<u64>) -> Result<Self, ConfigError> {
        if !low.is_finite() || !high.is_finite() || low >= high || !(high - low).is_finite() {
            return Err(ConfigError::InvalidInit(format!(
                "uniform bounds must be finite with low < high, got [{low}, {high})"
            )));
        }
        Ok(Uniform {
            dist: UniformDist::new(low, high),
            rng: make_rng(seed),
        })
    }
}

impl Initializer for Uniform {
    fn matrix(&mut self, rows: usize, cols: usize) -> Matrix {
        Matrix::random_using((rows, cols), &self.dist, &mut self.rng)
    }

    fn vector(&mut self, len: usize) -> Vector {
        Vector::random_using(len, &self.dist, &mut self.rng)
    }
}

/// Fills every parameter with the same value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constant(pub TensorData);

impl Initializer for Constant {
    fn matrix(&mut self, rows: usize, cols: usize) -> Matrix {
        Matrix::from_elem((rows, cols), self.0)
    }

    fn vector(&mut self, len: usize) -> Vector {
        Vector::from_elem(len, self.0)
    }
}
