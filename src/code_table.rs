//! Derive code words from a code tree.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, trace};

use crate::frequency::FrequencyTable;
use crate::huffman::{CodeTree, Node};
use crate::symbol::Symbol;

/// A code word: the root-to-leaf path of a symbol, `false` = 0 = left.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Code {
    bits: Vec<bool>,
}

impl Code {
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Whether `self` is a prefix of `other` (a code is a prefix of itself).
    pub fn is_prefix_of(&self, other: &Code) -> bool {
        other.bits.starts_with(&self.bits)
    }
}

impl From<&[bool]> for Code {
    fn from(bits: &[bool]) -> Self {
        Self {
            bits: bits.to_vec(),
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.bits
            .iter()
            .try_for_each(|&bit| f.write_str(if bit { "1" } else { "0" }))
    }
}

/// Mapping from symbol to code word, prefix-free by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeTable<S> {
    codes: BTreeMap<S, Code>,
}

impl<S: Symbol> CodeTable<S> {
    /// Walk the tree depth first and record the path to every leaf.
    pub fn from_tree(tree: &CodeTree<S>) -> Self {
        let mut codes = BTreeMap::new();
        let mut path = Vec::with_capacity(tree.depth());

        for (bit, child) in [(false, Some(tree.left())), (true, tree.right())] {
            if let Some(child) = child {
                path.push(bit);
                collect_codes(child, &mut path, &mut codes);
                path.pop();
            }
        }

        let table = Self { codes };
        debug!(
            symbols = table.len(),
            longest = table.max_len(),
            "derived code table"
        );
        table
    }

    pub fn get(&self, symbol: &S) -> Option<&Code> {
        self.codes.get(symbol)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Length of the longest code word.
    pub fn max_len(&self) -> usize {
        self.codes.values().map(Code::len).max().unwrap_or(0)
    }

    /// Iterate `(symbol, code)` pairs in ascending symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (S, &Code)> + '_ {
        self.codes.iter().map(|(&s, code)| (s, code))
    }

    /// Exact number of bits needed to encode a sequence with these counts.
    ///
    /// Returns `None` if a counted symbol has no code word.
    pub fn encoded_bits(&self, frequencies: &FrequencyTable<S>) -> Option<u64> {
        frequencies.iter().try_fold(0u64, |acc, (symbol, count)| {
            let code = self.get(&symbol)?;
            Some(acc + count * code.len() as u64)
        })
    }
}

fn collect_codes<S: Symbol>(node: &Node<S>, path: &mut Vec<bool>, codes: &mut BTreeMap<S, Code>) {
    match node {
        Node::Leaf { symbol, .. } => {
            let code = Code::from(path.as_slice());
            trace!(symbol = ?symbol, code = %code, "assigned code word");
            codes.insert(*symbol, code);
        }
        Node::Internal { left, right, .. } => {
            path.push(false);
            collect_codes(left, path, codes);
            path.pop();

            path.push(true);
            collect_codes(right, path, codes);
            path.pop();
        }
    }
}
