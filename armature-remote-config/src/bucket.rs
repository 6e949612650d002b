//! Percentile bucketing for percent conditions.
//!
//! The hash is part of the public contract: changing it reassigns clients
//! to different rollout buckets. The input is `"{seed}.{randomization_id}"`
//! (just the id when there is no seed), hashed with SHA-256; the first eight
//! digest bytes are read as a big-endian `u64` and reduced modulo
//! [`MICRO_PERCENT_MAX`].

use crate::template::MICRO_PERCENT_MAX;
use sha2::{Digest, Sha256};

/// Deterministic hash of a randomization id into `[0, 100_000_000)`
#[derive(Debug, Clone, Copy, Default)]
pub struct PercentileBucketer;

impl PercentileBucketer {
    /// Compute the micro-percentile bucket for a client.
    ///
    /// An empty seed is treated like no seed.
    ///
    /// # Examples
    ///
    /// ```
    /// use armature_remote_config::PercentileBucketer;
    ///
    /// let a = PercentileBucketer::bucket(Some("exp-1"), "device-42");
    /// let b = PercentileBucketer::bucket(Some("exp-1"), "device-42");
    /// assert_eq!(a, b);
    /// assert!(a < 100_000_000);
    /// ```
    pub fn bucket(seed: Option<&str>, randomization_id: &str) -> u64 {
        let mut hasher = Sha256::new();
        if let Some(seed) = seed.filter(|s| !s.is_empty()) {
            hasher.update(seed.as_bytes());
            hasher.update(b".");
        }
        hasher.update(randomization_id.as_bytes());
        let digest = hasher.finalize();

        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        u64::from_be_bytes(prefix) % MICRO_PERCENT_MAX
    }
}
