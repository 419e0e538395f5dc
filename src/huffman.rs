//! Build optimal prefix-code trees from symbol frequencies.
//!
//! The tree is built once per session and never mutated afterwards. Its root
//! is always an internal node: when the input has a single distinct symbol
//! the builder adds a synthetic root whose left child is that symbol and
//! whose right child is absent, so the symbol still gets a one-bit code.
//!
//! Trees are never embedded in compressed payloads. They can be persisted
//! separately as JSON to decode later.

use std::cmp::Ordering;
use std::collections::{BTreeSet, BinaryHeap};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::frequency::FrequencyTable;
use crate::symbol::Symbol;

/// A node below the root of a code tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "S: Symbol", rename_all = "snake_case")]
pub enum Node<S> {
    Leaf {
        weight: u64,
        symbol: S,
    },
    Internal {
        weight: u64,
        left: Box<Node<S>>,
        right: Box<Node<S>>,
    },
}

impl<S: Symbol> Node<S> {
    /// Cumulative frequency of every leaf under this node.
    pub fn weight(&self) -> u64 {
        match self {
            Node::Leaf { weight, .. } | Node::Internal { weight, .. } => *weight,
        }
    }

    /// The symbol carried by a leaf, `None` for internal nodes.
    pub fn symbol(&self) -> Option<S> {
        match self {
            Node::Leaf { symbol, .. } => Some(*symbol),
            Node::Internal { .. } => None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    fn merge(left: Self, right: Self) -> Self {
        Node::Internal {
            weight: left.weight() + right.weight(),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn leaf_count(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Internal { left, right, .. } => left.leaf_count() + right.leaf_count(),
        }
    }

    fn depth(&self) -> usize {
        match self {
            Node::Leaf { .. } => 0,
            Node::Internal { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    fn collect_symbols(&self, out: &mut Vec<S>) {
        match self {
            Node::Leaf { symbol, .. } => out.push(*symbol),
            Node::Internal { left, right, .. } => {
                left.collect_symbols(out);
                right.collect_symbols(out);
            }
        }
    }

    fn validate(&self, seen: &mut BTreeSet<S>) -> Result<()> {
        match self {
            Node::Leaf { weight, symbol } => {
                if *weight == 0 {
                    return Err(Error::InvalidTree(format!("leaf {symbol:?} has zero weight")));
                }
                if !seen.insert(*symbol) {
                    return Err(Error::InvalidTree(format!("symbol {symbol:?} occurs twice")));
                }
                Ok(())
            }
            Node::Internal {
                weight,
                left,
                right,
            } => {
                left.validate(seen)?;
                right.validate(seen)?;
                check_sum(*weight, left.weight(), right.weight())
            }
        }
    }
}

fn check_sum(weight: u64, left: u64, right: u64) -> Result<()> {
    match left.checked_add(right) {
        Some(sum) if sum == weight => Ok(()),
        _ => Err(Error::InvalidTree(format!(
            "internal weight {weight} is not the sum of {left} and {right}"
        ))),
    }
}

/// A tree whose leaves are the symbols of an alphabet.
///
/// The path from the root to a leaf is that symbol's code word, with a left
/// edge read as `0` and a right edge as `1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "S: Symbol")]
pub struct CodeTree<S> {
    weight: u64,
    left: Box<Node<S>>,
    right: Option<Box<Node<S>>>,
}

/// A tree waiting in the merge queue.
///
/// Ordered so that `BinaryHeap` pops the lightest tree first and, among
/// equal weights, the one that entered the queue first.
struct Pending<S> {
    weight: u64,
    order: u64,
    node: Node<S>,
}

impl<S> PartialEq for Pending<S> {
    fn eq(&self, other: &Self) -> bool {
        self.weight == other.weight && self.order == other.order
    }
}

impl<S> Eq for Pending<S> {}

impl<S> PartialOrd for Pending<S> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<S> Ord for Pending<S> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .weight
            .cmp(&self.weight)
            .then_with(|| other.order.cmp(&self.order))
    }
}

impl<S: Symbol> CodeTree<S> {
    /// Build the tree with the greedy Huffman merge.
    ///
    /// Leaves enter the queue in ascending symbol order and each merged tree
    /// gets the next sequence number, so equal weights are resolved first in
    /// first out. Fails with [`Error::EmptyInput`] for an empty table.
    pub fn build(frequencies: &FrequencyTable<S>) -> Result<Self> {
        let mut queue = BinaryHeap::with_capacity(frequencies.len());
        let mut order = 0u64;
        for (symbol, weight) in frequencies.iter() {
            queue.push(Pending {
                weight,
                order,
                node: Node::Leaf { weight, symbol },
            });
            order += 1;
        }

        while queue.len() > 1 {
            let (Some(first), Some(second)) = (queue.pop(), queue.pop()) else {
                unreachable!("queue holds at least two trees");
            };
            let node = Node::merge(first.node, second.node);
            queue.push(Pending {
                weight: node.weight(),
                order,
                node,
            });
            order += 1;
        }

        let tree = match queue.pop().map(|pending| pending.node) {
            None => return Err(Error::EmptyInput),
            Some(Node::Internal {
                weight,
                left,
                right,
            }) => Self {
                weight,
                left,
                right: Some(right),
            },
            Some(leaf @ Node::Leaf { .. }) => Self {
                weight: leaf.weight(),
                left: Box::new(leaf),
                right: None,
            },
        };

        debug!(
            leaves = tree.leaf_count(),
            depth = tree.depth(),
            weight = tree.weight,
            "built code tree"
        );
        Ok(tree)
    }

    /// Total weight, equal to the length of the sequence the tree was built from.
    pub fn weight(&self) -> u64 {
        self.weight
    }

    /// Child reached by a `0` bit from the root.
    pub fn left(&self) -> &Node<S> {
        &self.left
    }

    /// Child reached by a `1` bit from the root; absent for single-symbol trees.
    pub fn right(&self) -> Option<&Node<S>> {
        self.right.as_deref()
    }

    /// Child of the root selected by `bit`.
    pub fn child(&self, bit: bool) -> Option<&Node<S>> {
        if bit {
            self.right()
        } else {
            Some(self.left())
        }
    }

    /// Number of leaves, equal to the number of distinct symbols.
    pub fn leaf_count(&self) -> usize {
        self.left.leaf_count() + self.right().map_or(0, Node::leaf_count)
    }

    /// Length of the longest code word.
    pub fn depth(&self) -> usize {
        1 + self
            .left
            .depth()
            .max(self.right().map_or(0, Node::depth))
    }

    /// Every symbol in the tree, left to right.
    pub fn symbols(&self) -> Vec<S> {
        let mut out = Vec::with_capacity(self.leaf_count());
        self.left.collect_symbols(&mut out);
        if let Some(right) = self.right() {
            right.collect_symbols(&mut out);
        }
        out
    }

    /// Check the structural invariants of a tree that did not come from
    /// [`CodeTree::build`].
    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        self.left.validate(&mut seen)?;
        match self.right() {
            Some(right) => {
                right.validate(&mut seen)?;
                check_sum(self.weight, self.left.weight(), right.weight())
            }
            None if self.left.is_leaf() => check_sum(self.weight, self.left.weight(), 0),
            None => Err(Error::InvalidTree(
                "root without a right child must have a single leaf".to_string(),
            )),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse and validate a tree from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let tree: Self = serde_json::from_str(json)?;
        tree.validate()?;
        Ok(tree)
    }

    /// Persist the tree as JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| Error::resource("create tree file", path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, self)?;
        writer
            .flush()
            .map_err(|e| Error::resource("write tree file", path, e))
    }

    /// Load and validate a tree persisted with [`CodeTree::save`].
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::resource("open tree file", path, e))?;
        let tree: Self = serde_json::from_reader(BufReader::new(file))?;
        tree.validate()?;
        Ok(tree)
    }
}
