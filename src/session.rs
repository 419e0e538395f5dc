//! File-level compression sessions.
//!
//! A session wires file paths to the codec. Each operation opens its files
//! on entry and drops them on every exit path; output written before an
//! error is left in place.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use tracing::{debug, info};

use crate::bit_stream::{BitReader, BitWriter};
use crate::code_table::CodeTable;
use crate::codec::{decode, encode};
use crate::config::{SessionConfig, DEFAULT_BUFFER_CAPACITY};
use crate::error::{Error, Result};
use crate::frequency::FrequencyTable;
use crate::huffman::CodeTree;
use crate::symbol::{read_to_vec, Symbol, SymbolReader, SymbolSink, SymbolWriter};

/// Compresses and decompresses files with a fixed I/O buffer size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    capacity: usize,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

impl From<&SessionConfig> for Session {
    fn from(config: &SessionConfig) -> Self {
        Self {
            capacity: config.buffer_capacity.max(1),
        }
    }
}

impl Session {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
        }
    }

    /// Count how often each symbol occurs in a file.
    pub fn count_frequencies<S: Symbol>(&self, path: &Path) -> Result<FrequencyTable<S>> {
        let mut source = SymbolReader::<_, S>::open(path, self.capacity)?;
        FrequencyTable::from_source(&mut source)
    }

    /// Encode `path` with `codes` into `compressed_path`.
    ///
    /// Returns the number of meaningful bits written.
    pub fn compress_file<S: Symbol>(
        &self,
        codes: &CodeTable<S>,
        path: &Path,
        compressed_path: &Path,
    ) -> Result<u64> {
        let mut source = SymbolReader::<_, S>::open(path, self.capacity)?;
        let file = File::create(compressed_path)
            .map_err(|e| Error::resource("create compressed output", compressed_path, e))?;
        let mut sink = BitWriter::new(BufWriter::with_capacity(self.capacity, file), compressed_path);

        let bits = encode(codes, &mut source, &mut sink)?;
        info!(
            input = %path.display(),
            output = %compressed_path.display(),
            bits,
            "compressed file"
        );
        Ok(bits)
    }

    /// Decode `compressed_path` with `tree` into `decompressed_path`.
    ///
    /// Returns the number of symbols written.
    pub fn decompress_file<S: Symbol>(
        &self,
        compressed_path: &Path,
        decompressed_path: &Path,
        tree: &CodeTree<S>,
    ) -> Result<usize> {
        let data = read_compressed(compressed_path)?;
        let mut source = BitReader::new(&data).map_err(|e| e.in_file(compressed_path))?;
        let mut sink = SymbolWriter::<_, S>::create(decompressed_path, self.capacity)?;

        let symbols =
            decode(tree, &mut source, &mut sink).map_err(|e| e.in_file(compressed_path))?;
        info!(
            input = %compressed_path.display(),
            output = %decompressed_path.display(),
            bits = source.bit_len(),
            symbols,
            "decompressed file"
        );
        Ok(symbols)
    }

    /// Count, build and compress in one go.
    ///
    /// An empty input is a no-op: the compressed file is created empty and
    /// no tree is returned.
    pub fn compress_path<S: Symbol>(
        &self,
        path: &Path,
        compressed_path: &Path,
    ) -> Result<Option<CodeTree<S>>> {
        let frequencies = self.count_frequencies::<S>(path)?;
        let tree = match CodeTree::build(&frequencies) {
            Ok(tree) => tree,
            Err(Error::EmptyInput) => {
                debug!(input = %path.display(), "input is empty, writing empty output");
                File::create(compressed_path)
                    .map_err(|e| Error::resource("create compressed output", compressed_path, e))?;
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        let codes = CodeTable::from_tree(&tree);
        self.compress_file(&codes, path, compressed_path)?;
        Ok(Some(tree))
    }

    /// Decompress a file produced by [`Session::compress_path`].
    ///
    /// An empty compressed file yields an empty output whether or not a tree
    /// is given.
    pub fn decompress_path<S: Symbol>(
        &self,
        compressed_path: &Path,
        decompressed_path: &Path,
        tree: Option<&CodeTree<S>>,
    ) -> Result<usize> {
        match tree {
            Some(tree) => self.decompress_file(compressed_path, decompressed_path, tree),
            None => {
                let data = read_compressed(compressed_path)?;
                let reader = BitReader::new(&data).map_err(|e| e.in_file(compressed_path))?;
                if reader.bit_len() > 0 {
                    return Err(Error::MissingTree);
                }
                SymbolWriter::<_, S>::create(decompressed_path, self.capacity)?.finish()?;
                Ok(0)
            }
        }
    }
}

fn read_compressed(path: &Path) -> Result<Vec<u8>> {
    let file = File::open(path).map_err(|e| Error::resource("open compressed input", path, e))?;
    read_to_vec(file, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_input_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");
        let err = Session::default()
            .count_frequencies::<char>(&missing)
            .unwrap_err();
        match err {
            Error::Resource { op, path, .. } => {
                assert_eq!(op, "open input");
                assert_eq!(path, missing);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_small_buffer_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.txt");
        let packed = dir.path().join("in.huff");
        let output = dir.path().join("out.txt");
        fs::write(&input, "a tiny buffer still works, één twee drie").unwrap();

        let session = Session::with_capacity(1);
        let tree = session.compress_path::<char>(&input, &packed).unwrap().unwrap();
        session.decompress_path(&packed, &output, Some(&tree)).unwrap();
        assert_eq!(fs::read(&input).unwrap(), fs::read(&output).unwrap());
    }

    #[test]
    fn test_zero_capacity_config_still_reads_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.txt");
        let packed = dir.path().join("in.huff");
        let output = dir.path().join("out.txt");
        fs::write(&input, "hello world").unwrap();

        let config = SessionConfig {
            buffer_capacity: 0,
            ..SessionConfig::default()
        };
        let session = Session::from(&config);
        assert_eq!(session, Session::with_capacity(1));

        let tree = session
            .compress_path::<char>(&input, &packed)
            .unwrap()
            .expect("non-empty input yields a tree");
        assert_eq!(tree.weight(), 11);
        assert!(!fs::read(&packed).unwrap().is_empty());
        session.decompress_path(&packed, &output, Some(&tree)).unwrap();
        assert_eq!(fs::read(&output).unwrap(), b"hello world");
    }

    #[test]
    fn test_bad_trailer_names_compressed_file() {
        let dir = tempfile::tempdir().unwrap();
        let packed = dir.path().join("bad.huff");
        fs::write(&packed, [0xAB, 0]).unwrap();

        let err = Session::default()
            .decompress_path::<u8>(&packed, &dir.path().join("bad.out"), None)
            .unwrap_err();
        match &err {
            Error::MalformedStream { path, .. } => {
                assert_eq!(path.as_deref(), Some(packed.as_path()))
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("bad.huff"));
    }
}
