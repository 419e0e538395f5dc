//! Symbol frequency analysis.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::Result;
use crate::symbol::{Symbol, SymbolSource};

/// Occurrence counts per symbol.
///
/// Backed by an ordered map so iteration is always in ascending symbol
/// order, which keeps tree construction reproducible. Every stored count is
/// at least one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable<S: Symbol> {
    counts: BTreeMap<S, u64>,
}

impl<S: Symbol> Default for FrequencyTable<S> {
    fn default() -> Self {
        Self {
            counts: BTreeMap::new(),
        }
    }
}

impl<S: Symbol> FrequencyTable<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count an in-memory symbol sequence.
    pub fn from_symbols<I: IntoIterator<Item = S>>(symbols: I) -> Self {
        let mut table = Self::new();
        symbols.into_iter().for_each(|s| table.add(s));
        table
    }

    /// Count every symbol a source produces, draining it.
    pub fn from_source<Src>(source: &mut Src) -> Result<Self>
    where
        Src: SymbolSource<Symbol = S>,
    {
        let mut table = Self::new();
        while let Some(symbol) = source.next_symbol()? {
            table.add(symbol);
        }
        debug!(
            distinct = table.len(),
            total = table.total(),
            "counted symbol frequencies"
        );
        Ok(table)
    }

    /// Record one occurrence of `symbol`.
    pub fn add(&mut self, symbol: S) {
        *self.counts.entry(symbol).or_insert(0) += 1;
    }

    /// Count for `symbol`, zero when it never occurred.
    pub fn get(&self, symbol: &S) -> u64 {
        self.counts.get(symbol).copied().unwrap_or(0)
    }

    /// Number of distinct symbols.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts, i.e. the length of the counted sequence.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Iterate `(symbol, count)` pairs in ascending symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (S, u64)> + '_ {
        self.counts.iter().map(|(&s, &c)| (s, c))
    }
}

impl<S: Symbol> FromIterator<S> for FrequencyTable<S> {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::from_symbols(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::SliceSource;

    #[test]
    fn test_empty_input_yields_empty_table() {
        let table = FrequencyTable::<char>::from_symbols("".chars());
        assert!(table.is_empty());
        assert_eq!(table.total(), 0);
    }

    #[test]
    fn test_counts_exact_occurrences() {
        let table: FrequencyTable<char> = "abracadabra".chars().collect();
        assert_eq!(table.len(), 5);
        assert_eq!(table.get(&'a'), 5);
        assert_eq!(table.get(&'b'), 2);
        assert_eq!(table.get(&'r'), 2);
        assert_eq!(table.get(&'c'), 1);
        assert_eq!(table.get(&'d'), 1);
        assert_eq!(table.get(&'z'), 0);
        assert_eq!(table.total(), 11);
    }

    #[test]
    fn test_iteration_is_in_symbol_order() {
        let table = FrequencyTable::from_symbols(vec![9u8, 3, 200, 3, 0]);
        let symbols: Vec<u8> = table.iter().map(|(s, _)| s).collect();
        assert_eq!(symbols, vec![0, 3, 9, 200]);
    }

    #[test]
    fn test_from_source_matches_from_symbols() {
        let data = b"mississippi";
        let mut source = SliceSource::new(&data[..]);
        let from_source = FrequencyTable::from_source(&mut source).unwrap();
        assert_eq!(from_source, FrequencyTable::from_symbols(data.iter().copied()));
    }
}
