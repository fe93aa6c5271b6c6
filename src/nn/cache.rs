//! # Forward Cache
//!
//! Holds whatever a layer saved during `forward` for use by the matching
//! `backward`. A layer is *clean* until it runs forward, *primed* afterwards,
//! and clean again once backward has consumed the cache.

use crate::tensor::TensorError;
use log::debug;
use serde::Deserialize;

/// What `forward` does when the previous batch was never consumed by `backward`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
    /// Replace the stale batch. Repeated inference calls rely on this.
    #[default]
    Overwrite,
    /// Refuse with [`TensorError::StaleState`].
    Strict,
}

#[derive(Debug, Clone)]
pub struct ForwardCache<T> {
    layer: &'static str,
    policy: CachePolicy,
    slot: Option<T>,
}

impl<T> ForwardCache<T> {
    pub fn new(layer: &'static str, policy: CachePolicy) -> Self {
        ForwardCache {
            layer,
            policy,
            slot: None,
        }
    }

    pub fn set_policy(&mut self, policy: CachePolicy) {
        self.policy = policy;
    }

    pub fn is_primed(&self) -> bool {
        self.slot.is_some()
    }

    /// Checks that a new forward pass may start. Call before doing any work so
    /// a refused forward leaves the cache untouched.
    pub fn check_forward(&self) -> Result<(), TensorError> {
        if self.slot.is_none() {
            return Ok(());
        }
        match self.policy {
            CachePolicy::Strict => Err(TensorError::StaleState { layer: self.layer }),
            CachePolicy::Overwrite => Ok(()),
        }
    }

    /// Stores the batch for the next backward, replacing any stale one.
    pub fn prime(&mut self, value: T) {
        if self.slot.is_some() {
            debug!("{}: forward replaced a batch that backward never consumed", self.layer);
        }
        self.slot = Some(value);
    }

    /// Borrows the cached batch, or fails if forward has not run.
    pub fn get(&self) -> Result<&T, TensorError> {
        self.slot
            .as_ref()
            .ok_or(TensorError::UninitializedState { layer: self.layer })
    }

    /// Marks the cached batch as consumed.
    pub fn clear(&mut self) {
        self.slot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_cache_refuses_reads() {
        let cache: ForwardCache<u8> = ForwardCache::new("Probe", CachePolicy::Overwrite);
        assert!(!cache.is_primed());
        assert_eq!(
            cache.get(),
            Err(TensorError::UninitializedState { layer: "Probe" })
        );
    }

    #[test]
    fn overwrite_policy_replaces() {
        let mut cache = ForwardCache::new("Probe", CachePolicy::Overwrite);
        cache.prime(1);
        assert!(cache.check_forward().is_ok());
        cache.prime(2);
        assert_eq!(cache.get(), Ok(&2));
    }

    #[test]
    fn strict_policy_refuses_stale_batch() {
        let mut cache = ForwardCache::new("Probe", CachePolicy::Strict);
        assert!(cache.check_forward().is_ok());
        cache.prime(1);
        assert_eq!(
            cache.check_forward(),
            Err(TensorError::StaleState { layer: "Probe" })
        );
        cache.clear();
        assert!(cache.check_forward().is_ok());
    }

    #[test]
    fn policy_deserializes_from_snake_case() {
        let policy: CachePolicy = serde_json::from_str("\"strict\"").unwrap();
        assert_eq!(policy, CachePolicy::Strict);
    }
}
