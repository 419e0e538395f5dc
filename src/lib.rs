//! # Huffman coding in Rust
//! This project is a small, self-contained Huffman codec: it counts symbol frequencies,
//! builds an optimal prefix-code tree with the greedy merge, derives the code words and
//! transcodes between symbols and a bit-packed stream.
//! The code tree is not stored in the compressed payload; keep it alongside (see
//! [`CodeTree::save`]) to decompress later.
pub mod bit_stream;

pub mod code_table;

pub mod codec;

pub mod config;

pub mod error;

pub mod frequency;

pub mod huffman;

pub mod session;

pub mod symbol;

pub use code_table::{Code, CodeTable};
pub use codec::{compress, decompress, HuffmanCodec};
pub use config::{Alphabet, SessionConfig};
pub use error::{Error, Result};
pub use frequency::FrequencyTable;
pub use huffman::{CodeTree, Node};
pub use session::Session;
pub use symbol::Symbol;
