//! Addressable nodes of the virtual tree
//!
//! Every node starts [`NodeState::Uncommitted`]. Indexing commits it to
//! [`NodeState::Dict`], after which it can keep producing children but never
//! random values. Drawing (or detaching a sequence) commits it to
//! [`NodeState::Spent`] and hands its hash context to a [`Sequence`]; a spent
//! node accepts nothing further.
//!
//! ```text
//! Uncommitted --index--> Dict --index--> Dict
//! Uncommitted --draw/detach--> Spent
//! Dict  --draw/detach--> UsedAsDictAfterCommit
//! Spent --anything-----> UsedAfterSpent
//! ```
//!
//! The only way to replay a value is to rebuild the same root and walk the
//! same keys again; nodes cannot be cloned, reseeded or rewound.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use num_bigint::BigUint;
use tracing::{debug, trace, warn};

use crate::canonical::canonical_bytes;
use crate::errors::{Result, TreeError};
use crate::hash::{HashAlgorithm, HashContext, PATH_TAG, ROOT_TAG};
use crate::key::Key;
use crate::sequence::{
    check_below, check_inclusive_range, check_range, check_rate, check_sample, check_sigma,
    Sequence,
};

/// Lifecycle state of a [`Node`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeState {
    /// Neither indexed nor drawn from
    Uncommitted,
    /// Indexed at least once; drawing is no longer allowed
    Dict,
    /// Drawn from or detached; the hash context is gone
    Spent,
}

/// A point in the tree, addressed by the keys leading to it from the root
///
/// `index` takes `&self`, so one committed parent can be shared between
/// threads that each derive their own children. Spending takes `&mut self`.
pub struct Node {
    // None iff spent
    context: Option<HashContext>,
    indexed: AtomicBool,
    algorithm: HashAlgorithm,
    depth: usize,
}

impl Node {
    /// Root of a tree seeded with `seed`
    pub fn root(seed: impl Into<Key>, algorithm: HashAlgorithm) -> Self {
        let seed = seed.into();
        let mut context = algorithm.new_context();
        context.update_tagged(ROOT_TAG, &canonical_bytes(&seed));
        debug!(%algorithm, seed_kind = seed.kind(), "Created tree root");
        Self::uncommitted(context, algorithm, 0)
    }

    /// Root of a tree seeded with `seed`, using the default algorithm
    pub fn with_seed(seed: impl Into<Key>) -> Self {
        Self::root(seed, HashAlgorithm::default())
    }

    fn uncommitted(context: HashContext, algorithm: HashAlgorithm, depth: usize) -> Self {
        Self {
            context: Some(context),
            indexed: AtomicBool::new(false),
            algorithm,
            depth,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> NodeState {
        match (&self.context, self.indexed.load(Ordering::Relaxed)) {
            (None, _) => NodeState::Spent,
            (Some(_), true) => NodeState::Dict,
            (Some(_), false) => NodeState::Uncommitted,
        }
    }

    /// Algorithm chaining this node's path
    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Number of keys between the root and this node
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Child addressed by `key`
    ///
    /// Commits this node to [`NodeState::Dict`]. Indexing the same key twice
    /// returns two independent nodes with the same address, so they produce
    /// the same values.
    pub fn index(&self, key: impl Into<Key>) -> Result<Node> {
        let context = match (self.state(), self.context.as_ref()) {
            (NodeState::Uncommitted | NodeState::Dict, Some(context)) => context,
            _ => return Err(self.violation(TreeError::used_after_spent("index"))),
        };
        self.indexed.store(true, Ordering::Relaxed);

        let key = key.into();
        let mut child = context.clone();
        child.update_tagged(PATH_TAG, &canonical_bytes(&key));

        trace!(depth = self.depth + 1, key_kind = key.kind(), "Extended node path");
        Ok(Self::uncommitted(child, self.algorithm, self.depth + 1))
    }

    /// Walk several keys at once
    ///
    /// Every node along the way, this one included, is committed to
    /// [`NodeState::Dict`]. An empty path is an error since it would alias
    /// this node.
    pub fn path<I>(&self, keys: I) -> Result<Node>
    where
        I: IntoIterator,
        I::Item: Into<Key>,
    {
        let mut keys = keys.into_iter();
        let first = keys
            .next()
            .ok_or_else(|| TreeError::invalid_argument("path needs at least one key"))?;
        let mut node = self.index(first)?;
        for key in keys {
            node = node.index(key)?;
        }
        Ok(node)
    }

    fn spend(&mut self, operation: &str) -> Result<Sequence> {
        match self.state() {
            NodeState::Uncommitted => {}
            NodeState::Dict => {
                return Err(self.violation(TreeError::used_as_dict_after_commit(operation)))
            }
            NodeState::Spent => return Err(self.violation(TreeError::used_after_spent(operation))),
        }
        let context = self
            .context
            .take()
            .ok_or_else(|| TreeError::used_after_spent(operation))?;

        debug!(
            algorithm = %self.algorithm,
            depth = self.depth,
            operation,
            "Node spent"
        );
        Ok(Sequence::from_context(context))
    }

    fn violation(&self, err: TreeError) -> TreeError {
        warn!(depth = self.depth, error = %err, "Node lifecycle violation");
        err
    }

    /// Spend this node and run one operation on its sequence
    ///
    /// The sequence is dropped afterwards; use [`Node::detach_sequence`] to
    /// keep drawing from it.
    pub fn draw<T>(&mut self, operation: impl FnOnce(&mut Sequence) -> T) -> Result<T> {
        let mut sequence = self.spend("draw")?;
        Ok(operation(&mut sequence))
    }

    /// Spend this node and keep its sequence
    pub fn detach_sequence(&mut self) -> Result<Sequence> {
        self.spend("detach a sequence from")
    }

    /// See [`Sequence::draw_bits`]
    pub fn draw_bits(&mut self, k: usize) -> Result<BigUint> {
        self.draw(|seq| seq.draw_bits(k))
    }

    /// See [`Sequence::uniform_float`]
    pub fn uniform_float(&mut self) -> Result<f64> {
        self.draw(Sequence::uniform_float)
    }

    /// See [`Sequence::uniform`]
    pub fn uniform(&mut self, a: f64, b: f64) -> Result<f64> {
        self.draw(|seq| seq.uniform(a, b))
    }

    /// See [`Sequence::below`]; a rejected `n` leaves the node unspent
    pub fn below(&mut self, n: u64) -> Result<u64> {
        check_below(n)?;
        self.draw(|seq| seq.below(n))?
    }

    /// See [`Sequence::randrange`]; an empty range leaves the node unspent
    pub fn randrange(&mut self, start: i64, stop: i64) -> Result<i64> {
        check_range(start, stop)?;
        self.draw(|seq| seq.randrange(start, stop))?
    }

    /// See [`Sequence::randint`]; an empty range leaves the node unspent
    pub fn randint(&mut self, low: i64, high: i64) -> Result<i64> {
        check_inclusive_range(low, high)?;
        self.draw(|seq| seq.randint(low, high))?
    }

    /// See [`Sequence::bernoulli`]
    pub fn bernoulli(&mut self, p: f64) -> Result<bool> {
        self.draw(|seq| seq.bernoulli(p))
    }

    /// See [`Sequence::choice`]
    pub fn choice<'a, T>(&mut self, options: &'a [T]) -> Result<Option<&'a T>> {
        self.draw(|seq| seq.choice(options))
    }

    /// See [`Sequence::shuffle`]
    pub fn shuffle<T>(&mut self, items: &mut [T]) -> Result<()> {
        self.draw(|seq| seq.shuffle(items))
    }

    /// See [`Sequence::sample`]; an oversized `k` leaves the node unspent
    pub fn sample<T: Clone>(&mut self, population: &[T], k: usize) -> Result<Vec<T>> {
        check_sample(population.len(), k)?;
        self.draw(|seq| seq.sample(population, k))?
    }

    /// See [`Sequence::normal`]; a negative `sigma` leaves the node unspent
    pub fn normal(&mut self, mu: f64, sigma: f64) -> Result<f64> {
        check_sigma(sigma)?;
        self.draw(|seq| seq.normal(mu, sigma))?
    }

    /// See [`Sequence::exponential`]; a non-positive rate leaves the node unspent
    pub fn exponential(&mut self, lambda: f64) -> Result<f64> {
        check_rate(lambda)?;
        self.draw(|seq| seq.exponential(lambda))?
    }

    /// See [`Sequence::fill_bytes`]
    pub fn fill_bytes(&mut self, dest: &mut [u8]) -> Result<()> {
        self.draw(|seq| seq.fill_bytes(dest))
    }

    /// Disabled: the address is the seed
    pub fn reseed(&mut self, _seed: impl Into<Key>) -> Result<()> {
        Err(self.disabled(
            "reseed",
            "build a new root with the seed, or index this node with it",
        ))
    }

    /// Disabled: streams are separated by address, not by offset
    pub fn jump_ahead(&mut self, _blocks: u64) -> Result<()> {
        Err(self.disabled(
            "jump_ahead",
            "index the parent with a distinct key for each independent stream",
        ))
    }

    /// Disabled: there is no state beyond the key path
    pub fn get_state(&self) -> Result<Vec<u8>> {
        Err(self.disabled(
            "get_state",
            "record the key path and re-walk it from an identical root",
        ))
    }

    /// Disabled: there is no state beyond the key path
    pub fn set_state(&mut self, _state: &[u8]) -> Result<()> {
        Err(self.disabled(
            "set_state",
            "re-walk the recorded key path from an identical root",
        ))
    }

    fn disabled(&self, operation: &str, hint: &str) -> TreeError {
        let err = TreeError::unsupported(operation, hint);
        warn!(depth = self.depth, error = %err, "Unsupported node operation");
        err
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("state", &self.state())
            .field("algorithm", &self.algorithm)
            .field("depth", &self.depth)
            .finish()
    }
}
