//! Tree configuration
//!
//! [`TreeConfig`] names everything that fixes the values of a tree: the root
//! seed and the hash algorithm. Two roots built from equal configs produce
//! identical trees. It is serde-enabled so an embedding application can keep
//! it alongside its own settings.

use serde::{Deserialize, Serialize};

use crate::errors::{Result, TreeError};
use crate::hash::HashAlgorithm;
use crate::key::Key;
use crate::node::Node;

/// Seed and algorithm for a tree root
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Key that seeds the root hash context
    pub seed: Key,
    /// Algorithm chaining the keys
    pub hash_algorithm: HashAlgorithm,
}

impl TreeConfig {
    /// Config with the given seed and the default algorithm
    pub fn new(seed: impl Into<Key>) -> Self {
        Self {
            seed: seed.into(),
            hash_algorithm: HashAlgorithm::default(),
        }
    }

    /// Set the seed
    pub fn with_seed(mut self, seed: impl Into<Key>) -> Self {
        self.seed = seed.into();
        self
    }

    /// Set the hash algorithm
    pub fn with_hash_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.hash_algorithm = algorithm;
        self
    }

    /// Set the hash algorithm by name (`"sha1"`, `"sha256"`, ...)
    pub fn with_hash_name(self, name: &str) -> Result<Self> {
        Ok(self.with_hash_algorithm(name.parse()?))
    }

    /// Check that the seed can be canonicalized
    ///
    /// Maps are rejected anywhere in the seed: their entries bypass
    /// normalization, so a seed that contains one may hash differently from
    /// an equal-looking seed written with other number widths.
    pub fn validate(&self) -> Result<()> {
        if contains_map(&self.seed) {
            return Err(TreeError::invalid_config(
                "seed must not contain a map; use a list of tuples instead",
            ));
        }
        Ok(())
    }

    /// Validate and build the root node
    pub fn build_root(&self) -> Result<Node> {
        self.validate()?;
        Ok(Node::root(self.seed.clone(), self.hash_algorithm))
    }
}

fn contains_map(key: &Key) -> bool {
    match key {
        Key::Map(_) => true,
        Key::List(items) | Key::Tuple(items) => items.iter().any(contains_map),
        _ => false,
    }
}
