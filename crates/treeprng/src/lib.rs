//! treeprng: repeatable virtual trees of pseudorandom numbers
//!
//! Values are addressed by a path of keys from a seeded root instead of by
//! their position in one linear stream. Visiting
//! `root → "hobbits" → "frodo" → "height"` yields the same number on every
//! run, no matter what else the program drew first.
//!
//! ## Core Components
//!
//! - **Node**: addressable point in the tree with an
//!   `Uncommitted → Dict | Spent` lifecycle that catches address reuse
//! - **Canonical keys**: normalization and a versioned byte layout so equal
//!   keys (`3`, `3.0`, a big integer `3`) hash identically
//! - **Sequence**: hash-chained bit stream behind every draw
//!
//! ```
//! use treeprng::{HashAlgorithm, Node};
//!
//! let root = Node::root("T", HashAlgorithm::Sha1);
//! let hobbits = root.index("hobbits")?;
//! let height = hobbits.index("frodo")?.index("height")?.uniform_float()?;
//!
//! let again = Node::root("T", HashAlgorithm::Sha1)
//!     .path(["hobbits", "frodo", "height"])?
//!     .uniform_float()?;
//! assert_eq!(height, again);
//! # Ok::<(), treeprng::TreeError>(())
//! ```

/// Canonical key normalization and encoding
pub mod canonical;
/// Tree configuration
pub mod config;
/// Unified error handling
pub mod errors;
/// Hash algorithms, contexts and domain-separation tags
pub mod hash;
/// Key values
pub mod key;
/// Tree nodes and their lifecycle
pub mod node;
/// Hash-chained bit sequences
pub mod sequence;

pub use canonical::{canonical_bytes, canonicalize, ENCODING_VERSION};
pub use config::TreeConfig;
pub use errors::{Result, TreeError};
pub use hash::{HashAlgorithm, HashContext};
pub use key::Key;
pub use node::{Node, NodeState};
pub use sequence::Sequence;
