//! Deterministic keyed random draws
//!
//! Every draw is a pure function of `(seed, stream key, additional key, row
//! key)`: the fields are fed length-prefixed into SHA-256 and the first eight
//! digest bytes are mapped onto `[0, 1)`. Nothing advances shared state, so
//! the draws a noise type sees do not depend on which other noise types ran
//! before it, and two different additional keys give independent streams over
//! the same rows.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::table::RowKey;
use crate::{NoiseError, Result};

// ----------------------------------------------------------------------------
// Seed
// ----------------------------------------------------------------------------

/// Caller-supplied seed, an integer or free-form string
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Seed(String);

impl Seed {
    pub fn new<T: Into<String>>(seed: T) -> Self {
        Self(seed.into())
    }

    /// Seed for one shard of a multi-file dataset
    ///
    /// Shards have overlapping row keys, so each needs its own seed or the
    /// Nth row of every shard would receive identical noise.
    pub fn for_shard(&self, shard_index: usize) -> Self {
        Self(format!("{}_{}", self.0, shard_index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Seed {
    fn from(seed: &str) -> Self {
        Self(seed.into())
    }
}

impl From<String> for Seed {
    fn from(seed: String) -> Self {
        Self(seed)
    }
}

impl From<u64> for Seed {
    fn from(seed: u64) -> Self {
        Self(seed.to_string())
    }
}

impl From<i64> for Seed {
    fn from(seed: i64) -> Self {
        Self(seed.to_string())
    }
}

impl From<u32> for Seed {
    fn from(seed: u32) -> Self {
        Self(seed.to_string())
    }
}

impl From<i32> for Seed {
    fn from(seed: i32) -> Self {
        Self(seed.to_string())
    }
}

// ----------------------------------------------------------------------------
// Hash-to-uniform helpers
// ----------------------------------------------------------------------------

fn update_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}

/// Map the leading 64 bits of a digest onto `[0, 1)` with 53 bits of precision
fn unit_interval(digest: &[u8]) -> f64 {
    let mut word = [0u8; 8];
    word.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(word) >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
}

/// Cumulative distribution over `count` options
///
/// Uniform when `weights` is `None`. Degenerate or mismatched weights are a
/// configuration error rather than a source of NaN choices.
pub fn cumulative_distribution(count: usize, weights: Option<&[f64]>) -> Result<Vec<f64>> {
    if count == 0 {
        return Err(NoiseError::config_error("cannot choose from an empty option list"));
    }
    let weights: Vec<f64> = match weights {
        None => vec![1.0; count],
        Some(weights) => {
            if weights.len() != count {
                return Err(NoiseError::config_error(format!(
                    "{} weights provided for {} options",
                    weights.len(),
                    count
                )));
            }
            if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
                return Err(NoiseError::config_error(
                    "choice weights must be finite and non-negative",
                ));
            }
            weights.to_vec()
        }
    };
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Err(NoiseError::config_error("choice weights sum to zero"));
    }
    let mut running = 0.0;
    Ok(weights
        .iter()
        .map(|w| {
            running += w / total;
            running
        })
        .collect())
}

/// Index of the option selected by `draw`, by CDF inversion
pub fn invert_cdf(cdf: &[f64], draw: f64) -> usize {
    // Right-sided search: count of cumulative values <= draw.
    cdf.partition_point(|&c| c <= draw).min(cdf.len().saturating_sub(1))
}

// ----------------------------------------------------------------------------
// Randomness Stream
// ----------------------------------------------------------------------------

/// Keyed source of reproducible per-row draws for one dataset and seed
#[derive(Debug, Clone)]
pub struct RandomnessStream {
    key: String,
    seed: Seed,
}

impl RandomnessStream {
    /// Create a stream; `key` is normally the dataset name
    pub fn new<K: Into<String>>(key: K, seed: Seed) -> Self {
        Self {
            key: key.into(),
            seed,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn seed(&self) -> &Seed {
        &self.seed
    }

    fn keyed_hasher(&self, additional_key: &str) -> Sha256 {
        let mut hasher = Sha256::new();
        update_field(&mut hasher, self.seed.as_str().as_bytes());
        update_field(&mut hasher, self.key.as_bytes());
        update_field(&mut hasher, additional_key.as_bytes());
        hasher
    }

    /// One uniform draw in `[0, 1)` per row key
    pub fn get_draw(&self, index: &[RowKey], additional_key: &str) -> Vec<f64> {
        let prefix = self.keyed_hasher(additional_key);
        index
            .iter()
            .map(|row| {
                let mut hasher = prefix.clone();
                hasher.update(row.to_be_bytes());
                unit_interval(&hasher.finalize())
            })
            .collect()
    }

    /// One weighted choice per row key; uniform when `weights` is `None`
    pub fn choice<'a, T>(
        &self,
        index: &[RowKey],
        options: &'a [T],
        weights: Option<&[f64]>,
        additional_key: &str,
    ) -> Result<Vec<&'a T>> {
        let cdf = cumulative_distribution(options.len(), weights)?;
        Ok(self
            .get_draw(index, additional_key)
            .into_iter()
            .map(|draw| &options[invert_cdf(&cdf, draw)])
            .collect())
    }

    /// Sequential draws for one row, for algorithms that need a variable
    /// number of draws per value
    pub fn row_draws(&self, row: RowKey, additional_key: &str) -> RowDraws {
        let mut hasher = self.keyed_hasher(additional_key);
        hasher.update(row.to_be_bytes());
        RowDraws { hasher, counter: 0 }
    }
}

// ----------------------------------------------------------------------------
// Per-row draw sequence
// ----------------------------------------------------------------------------

/// Counter-mode draws bound to a single row and key
#[derive(Debug, Clone)]
pub struct RowDraws {
    hasher: Sha256,
    counter: u64,
}

impl RowDraws {
    /// Next uniform draw in `[0, 1)`
    pub fn next_uniform(&mut self) -> f64 {
        let mut hasher = self.hasher.clone();
        hasher.update(self.counter.to_be_bytes());
        self.counter += 1;
        unit_interval(&hasher.finalize())
    }

    /// Uniformly chosen element, `None` for an empty slice
    pub fn choose<'a, T>(&mut self, options: &'a [T]) -> Option<&'a T> {
        if options.is_empty() {
            return None;
        }
        let position = (self.next_uniform() * options.len() as f64) as usize;
        options.get(position.min(options.len() - 1))
    }
}
