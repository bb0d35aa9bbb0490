//! Hash contexts that carry a node's path
//!
//! A [`HashContext`] is an incremental hasher for one of the supported
//! algorithms. Nodes clone and extend it; sequences finalize clones of it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};

use crate::errors::TreeError;

/// Domain-separation tag for seeding a root node
pub const ROOT_TAG: &[u8] = b"treeprng:v1:root";
/// Domain-separation tag for extending a path by one key
pub const PATH_TAG: &[u8] = b"treeprng:v1:path";
/// Domain-separation tag for turning a node into a sequence
pub const SEQUENCE_TAG: &[u8] = b"treeprng:v1:sequence";
/// Domain-separation tag for each block of sequence output
pub const BLOCK_TAG: &[u8] = b"treeprng:v1:block";

/// Hash algorithm used to chain keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-1, 160-bit blocks
    #[default]
    Sha1,
    /// SHA-256, 256-bit blocks
    Sha256,
    /// SHA-512, 512-bit blocks
    Sha512,
    /// BLAKE3, 256-bit blocks
    Blake3,
}

impl HashAlgorithm {
    /// All supported algorithms
    pub const ALL: [HashAlgorithm; 4] = [
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha512,
        HashAlgorithm::Blake3,
    ];

    /// Lowercase name, as accepted by [`FromStr`]
    pub fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha512 => "sha512",
            HashAlgorithm::Blake3 => "blake3",
        }
    }

    /// Width of one digest in bits
    pub fn digest_bits(self) -> usize {
        match self {
            HashAlgorithm::Sha1 => 160,
            HashAlgorithm::Sha256 | HashAlgorithm::Blake3 => 256,
            HashAlgorithm::Sha512 => 512,
        }
    }

    /// Fresh, empty context for this algorithm
    pub fn new_context(self) -> HashContext {
        match self {
            HashAlgorithm::Sha1 => HashContext::Sha1(Sha1::new()),
            HashAlgorithm::Sha256 => HashContext::Sha256(Sha256::new()),
            HashAlgorithm::Sha512 => HashContext::Sha512(Sha512::new()),
            HashAlgorithm::Blake3 => HashContext::Blake3(Box::new(blake3::Hasher::new())),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|algorithm| algorithm.name() == lowered)
            .ok_or_else(|| {
                TreeError::invalid_config(format!(
                    "unknown hash algorithm '{s}', expected one of sha1, sha256, sha512, blake3"
                ))
            })
    }
}

/// Incremental hash state for one algorithm
#[derive(Clone)]
pub enum HashContext {
    /// SHA-1 state
    Sha1(Sha1),
    /// SHA-256 state
    Sha256(Sha256),
    /// SHA-512 state
    Sha512(Sha512),
    /// BLAKE3 state (boxed, the hasher is large)
    Blake3(Box<blake3::Hasher>),
}

impl HashContext {
    /// Algorithm behind this context
    pub fn algorithm(&self) -> HashAlgorithm {
        match self {
            HashContext::Sha1(_) => HashAlgorithm::Sha1,
            HashContext::Sha256(_) => HashAlgorithm::Sha256,
            HashContext::Sha512(_) => HashAlgorithm::Sha512,
            HashContext::Blake3(_) => HashAlgorithm::Blake3,
        }
    }

    /// Absorb bytes
    pub fn update(&mut self, data: &[u8]) {
        match self {
            HashContext::Sha1(hasher) => Digest::update(hasher, data),
            HashContext::Sha256(hasher) => Digest::update(hasher, data),
            HashContext::Sha512(hasher) => Digest::update(hasher, data),
            HashContext::Blake3(hasher) => {
                hasher.update(data);
            }
        }
    }

    /// Absorb a domain-separation tag followed by a payload
    pub fn update_tagged(&mut self, tag: &[u8], payload: &[u8]) {
        self.update(tag);
        self.update(payload);
    }

    /// Consume the context and return its digest
    pub fn finalize(self) -> Vec<u8> {
        match self {
            HashContext::Sha1(hasher) => hasher.finalize().to_vec(),
            HashContext::Sha256(hasher) => hasher.finalize().to_vec(),
            HashContext::Sha512(hasher) => hasher.finalize().to_vec(),
            HashContext::Blake3(hasher) => hasher.finalize().as_bytes().to_vec(),
        }
    }
}

impl fmt::Debug for HashContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HashContext")
            .field(&self.algorithm())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_width_matches_algorithm() {
        for algorithm in HashAlgorithm::ALL {
            let digest = algorithm.new_context().finalize();
            assert_eq!(digest.len() * 8, algorithm.digest_bits(), "{algorithm}");
        }
    }

    #[test]
    fn test_known_sha1_digest() {
        let mut ctx = HashAlgorithm::Sha1.new_context();
        ctx.update(b"abc");
        let digest = ctx.finalize();
        assert_eq!(
            digest,
            vec![
                0xa9, 0x99, 0x3e, 0x36, 0x47, 0x06, 0x81, 0x6a, 0xba, 0x3e, 0x25, 0x71, 0x78,
                0x50, 0xc2, 0x6c, 0x9c, 0xd0, 0xd8, 0x9d
            ]
        );
    }

    #[test]
    fn test_clone_is_independent() {
        let mut parent = HashAlgorithm::Sha256.new_context();
        parent.update(b"hobbits");
        let mut child = parent.clone();
        child.update(b"frodo");
        assert_ne!(parent.finalize(), child.finalize());
    }

    #[test]
    fn test_tags_are_distinct() {
        let tags = [ROOT_TAG, PATH_TAG, SEQUENCE_TAG, BLOCK_TAG];
        for (i, a) in tags.iter().enumerate() {
            for b in &tags[i + 1..] {
                assert_ne!(a, b);
                assert!(!a.starts_with(b) && !b.starts_with(a));
            }
        }
    }

    #[test]
    fn test_algorithm_names_parse() {
        assert_eq!("sha1".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha1);
        assert_eq!(" SHA256 ".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert_eq!("blake3".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Blake3);
        assert!(matches!(
            "md5".parse::<HashAlgorithm>(),
            Err(TreeError::InvalidConfig { .. })
        ));
    }
}
