//! Network configuration
//!
//! Describes a [`Network`](crate::nn::Network) (layer sizes, initialization
//! policy, cache policy) and loads it from JSON.
//!
//! # Example
//!
//! ```json
//! {
//!   "input_size": 2,
//!   "hidden_size": 4,
//!   "output_size": 3,
//!   "init": { "kind": "uniform", "low": -0.1, "high": 0.1, "seed": 7 },
//!   "cache_policy": "strict"
//! }
//! ```

use crate::nn::CachePolicy;
use crate::tensor::{Constant, Initializer, StandardNormal, TensorData, TensorError, Uniform};
use log::debug;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0} must be at least 1")]
    InvalidDimension(&'static str),
    #[error("Invalid initializer: {0}")]
    InvalidInit(String),
    #[error(transparent)]
    Layer(#[from] TensorError),
}

/// Where initial parameter values come from.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InitConfig {
    StandardNormal {
        #[serde(default)]
        seed: Option<u64>,
    },
    Uniform {
        low: TensorData,
        high: TensorData,
        #[serde(default)]
        seed: Option<u64>,
    },
    Constant {
        value: TensorData,
    },
}

impl Default for InitConfig {
    fn default() -> Self {
        InitConfig::StandardNormal { seed: None }
    }
}

impl InitConfig {
    pub fn build(&self) -> Result<Box<dyn Initializer>, ConfigError> {
        let init: Box<dyn Initializer> = match *self {
            InitConfig::StandardNormal { seed } => Box::new(StandardNormal::from_seed(seed)),
            InitConfig::Uniform { low, high, seed } => Box::new(Uniform::new(low, high, seed)?),
            InitConfig::Constant { value } => {
                if !value.is_finite() {
                    return Err(ConfigError::InvalidInit(format!(
                        "constant must be finite, got {value}"
                    )));
                }
                Box::new(Constant(value))
            }
        };
        Ok(init)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NetworkConfig {
    pub input_size: usize,
    pub hidden_size: usize,
    pub output_size: usize,
    #[serde(default)]
    pub init: InitConfig,
    #[serde(default)]
    pub cache_policy: CachePolicy,
}

impl NetworkConfig {
    pub fn new(input_size: usize, hidden_size: usize, output_size: usize) -> Self {
        NetworkConfig {
            input_size,
            hidden_size,
            output_size,
            init: InitConfig::default(),
            cache_policy: CachePolicy::default(),
        }
    }

    /// Parses and validates a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: NetworkConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks sizes and initializer parameters without building a network.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_sizes(self.input_size, self.hidden_size, self.output_size)?;
        self.init.build().map(|_| ())
    }
}

/// Fails with [`ConfigError::InvalidDimension`] naming the first zero size.
pub(crate) fn check_sizes(
    input_size: usize,
    hidden_size: usize,
    output_size: usize,
) -> Result<(), ConfigError> {
    for (name, size) in [
        ("input_size", input_size),
        ("hidden_size", hidden_size),
        ("output_size", output_size),
    ] {
        if size == 0 {
            return Err(ConfigError::InvalidDimension(name));
        }
    }
    Ok(())
}

/// Loads a network configuration from a JSON file.
pub fn load_config(path: impl AsRef<Path>) -> Result<NetworkConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let config = NetworkConfig::from_json(&contents)?;
    debug!("loaded network config from {}: {:?}", path.display(), config);
    Ok(config)
}
