//! Transcode between symbol sequences and bit streams.
//!
//! Encoding looks every symbol up in a [`CodeTable`] and appends its code
//! word. Decoding walks the [`CodeTree`] one bit at a time: start at the
//! root, go left on `0` and right on `1`, emit the symbol at a leaf and start
//! over. A stream that runs out while the walk is below the root is
//! malformed and never silently truncated.

use tracing::trace;

use crate::bit_stream::{BitReader, BitSink, BitSource, BitWriter};
use crate::code_table::CodeTable;
use crate::error::{Error, Result};
use crate::frequency::FrequencyTable;
use crate::huffman::{CodeTree, Node};
use crate::symbol::{SliceSource, Symbol, SymbolSink, SymbolSource};

/// Encode every symbol of `source` into `sink` and finish the sink.
///
/// Returns the number of meaningful bits written.
pub fn encode<Src, B>(table: &CodeTable<Src::Symbol>, source: &mut Src, sink: &mut B) -> Result<u64>
where
    Src: SymbolSource,
    B: BitSink,
{
    while let Some(symbol) = source.next_symbol()? {
        let code = table.get(&symbol).ok_or_else(|| Error::UnresolvedSymbol {
            symbol: format!("{symbol:?}"),
        })?;
        for &bit in code.bits() {
            sink.write_bit(bit)?;
        }
    }
    sink.finish()
}

/// Decode every bit of `bits` into `sink` and finish the sink.
///
/// Returns the number of symbols written.
pub fn decode<B, K>(tree: &CodeTree<K::Symbol>, bits: &mut B, sink: &mut K) -> Result<usize>
where
    B: BitSource,
    K: SymbolSink,
{
    let mut decoder = Decoder::new(tree);
    let mut emitted = 0;
    while bits.has_next() {
        let Some(bit) = bits.read_bit() else {
            break;
        };
        if let Some(symbol) = decoder.push_bit(bit)? {
            sink.write_symbol(symbol)?;
            emitted += 1;
        }
    }
    decoder.finish()?;
    sink.finish()?;
    Ok(emitted)
}

#[derive(Debug, Clone, Copy)]
enum State<'t, S> {
    AtRoot,
    Descending {
        left: &'t Node<S>,
        right: &'t Node<S>,
    },
}

/// Bit-at-a-time decoding state machine.
#[derive(Debug)]
pub struct Decoder<'t, S> {
    tree: &'t CodeTree<S>,
    state: State<'t, S>,
    consumed: u64,
}

impl<'t, S: Symbol> Decoder<'t, S> {
    pub fn new(tree: &'t CodeTree<S>) -> Self {
        Self {
            tree,
            state: State::AtRoot,
            consumed: 0,
        }
    }

    /// Feed one bit. Returns the symbol when the bit completes a code word.
    pub fn push_bit(&mut self, bit: bool) -> Result<Option<S>> {
        let index = self.consumed;
        self.consumed += 1;

        let next = match self.state {
            State::AtRoot => self
                .tree
                .child(bit)
                .ok_or_else(|| Error::malformed(index, "no code word starts with this bit"))?,
            State::Descending { left, right } => {
                if bit {
                    right
                } else {
                    left
                }
            }
        };

        match next {
            Node::Leaf { symbol, .. } => {
                self.state = State::AtRoot;
                trace!(bit = index, symbol = ?symbol, "decoded symbol");
                Ok(Some(*symbol))
            }
            Node::Internal { left, right, .. } => {
                self.state = State::Descending {
                    left: left.as_ref(),
                    right: right.as_ref(),
                };
                Ok(None)
            }
        }
    }

    /// Whether the decoder sits between code words.
    pub fn is_at_root(&self) -> bool {
        matches!(self.state, State::AtRoot)
    }

    /// Number of bits fed so far.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Check that the stream ended on a code word boundary.
    pub fn finish(&self) -> Result<()> {
        if self.is_at_root() {
            Ok(())
        } else {
            Err(Error::malformed(
                self.consumed,
                "stream ended inside a code word",
            ))
        }
    }
}

/// A code tree together with the code table derived from it.
#[derive(Debug, Clone)]
pub struct HuffmanCodec<S> {
    tree: CodeTree<S>,
    table: CodeTable<S>,
}

impl<S: Symbol> HuffmanCodec<S> {
    pub fn new(tree: CodeTree<S>) -> Self {
        let table = CodeTable::from_tree(&tree);
        Self { tree, table }
    }

    pub fn from_frequencies(frequencies: &FrequencyTable<S>) -> Result<Self> {
        Ok(Self::new(CodeTree::build(frequencies)?))
    }

    /// Build a codec fitted to `symbols`. Fails with [`Error::EmptyInput`]
    /// when there are none.
    pub fn from_symbols(symbols: &[S]) -> Result<Self> {
        Self::from_frequencies(&FrequencyTable::from_symbols(symbols.iter().copied()))
    }

    pub fn tree(&self) -> &CodeTree<S> {
        &self.tree
    }

    pub fn table(&self) -> &CodeTable<S> {
        &self.table
    }

    pub fn into_tree(self) -> CodeTree<S> {
        self.tree
    }

    /// Encode to unframed bits.
    pub fn encode_bits(&self, symbols: &[S]) -> Result<Vec<bool>> {
        let mut bits = Vec::new();
        encode(&self.table, &mut SliceSource::new(symbols), &mut bits)?;
        Ok(bits)
    }

    /// Encode to a framed byte payload.
    pub fn encode_to_vec(&self, symbols: &[S]) -> Result<Vec<u8>> {
        let mut writer = BitWriter::new(Vec::new(), "<memory>");
        encode(&self.table, &mut SliceSource::new(symbols), &mut writer)?;
        Ok(writer.into_inner())
    }

    /// Decode a framed byte payload.
    pub fn decode_slice(&self, data: &[u8]) -> Result<Vec<S>> {
        let mut reader = BitReader::new(data)?;
        let mut symbols = Vec::new();
        decode(&self.tree, &mut reader, &mut symbols)?;
        Ok(symbols)
    }
}

/// Compress an in-memory sequence.
///
/// Empty input is a no-op: no tree and an empty payload.
pub fn compress<S: Symbol>(symbols: &[S]) -> Result<(Option<CodeTree<S>>, Vec<u8>)> {
    match HuffmanCodec::from_symbols(symbols) {
        Ok(codec) => {
            let data = codec.encode_to_vec(symbols)?;
            Ok((Some(codec.into_tree()), data))
        }
        Err(Error::EmptyInput) => Ok((None, Vec::new())),
        Err(e) => Err(e),
    }
}

/// Decompress a payload produced by [`compress`].
///
/// An empty payload decodes to an empty sequence with or without a tree.
pub fn decompress<S: Symbol>(data: &[u8], tree: Option<&CodeTree<S>>) -> Result<Vec<S>> {
    let mut reader = BitReader::new(data)?;
    if reader.bit_len() == 0 {
        return Ok(Vec::new());
    }
    let tree = tree.ok_or(Error::MissingTree)?;
    let mut symbols = Vec::new();
    decode(tree, &mut reader, &mut symbols)?;
    Ok(symbols)
}
