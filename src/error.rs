//! Error types for the Huffman codec.
//!
//! Every fallible operation in the crate returns [`Result`]. Structural edge
//! cases of tree construction (one distinct symbol) are handled by the
//! builder itself and never surface here.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building codes or transcoding data.
#[derive(Error, Debug)]
pub enum Error {
    /// Frequency analysis produced no symbols.
    ///
    /// Callers that treat empty input as a no-op should match on this
    /// variant rather than on an empty output.
    #[error("input contains no symbols")]
    EmptyInput,

    /// A symbol to encode has no code word in the table.
    #[error("symbol {symbol} has no code word")]
    UnresolvedSymbol { symbol: String },

    /// The bit stream does not decode cleanly against the tree.
    ///
    /// `path` is filled in when the stream was read from a file.
    #[error("malformed stream{} at bit {bit}: {reason}", located(.path))]
    MalformedStream {
        bit: u64,
        reason: &'static str,
        path: Option<PathBuf>,
    },

    /// A non-empty payload was given without a tree to decode it.
    #[error("compressed payload is not empty but no code tree was supplied")]
    MissingTree,

    /// A persisted tree violates the code tree invariants.
    #[error("invalid code tree: {0}")]
    InvalidTree(String),

    /// A persisted tree could not be parsed or written.
    #[error("tree format error: {0}")]
    TreeFormat(#[from] serde_json::Error),

    /// Configuration could not be loaded or failed validation.
    #[error("configuration error: {0}")]
    Config(String),

    /// An underlying source or sink failed.
    #[error("{op} failed for {}: {source}", path.display())]
    Resource {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Wrap an I/O error with the operation and path it came from.
    pub fn resource(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Resource {
            op,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(bit: u64, reason: &'static str) -> Self {
        Error::MalformedStream {
            bit,
            reason,
            path: None,
        }
    }

    /// Attach the file a malformed stream was read from. Other errors pass
    /// through unchanged.
    pub(crate) fn in_file(self, file: &Path) -> Self {
        match self {
            Error::MalformedStream { bit, reason, .. } => Error::MalformedStream {
                bit,
                reason,
                path: Some(file.to_path_buf()),
            },
            other => other,
        }
    }
}

fn located(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" in {}", p.display()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_error_mentions_op_and_path() {
        let err = Error::resource(
            "open input",
            "/tmp/missing.txt",
            io::Error::new(io::ErrorKind::NotFound, "no such file"),
        );
        let msg = err.to_string();
        assert!(msg.contains("open input"));
        assert!(msg.contains("/tmp/missing.txt"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_malformed_stream_message() {
        let err = Error::malformed(17, "stream ended inside a code word");
        assert_eq!(
            err.to_string(),
            "malformed stream at bit 17: stream ended inside a code word"
        );
    }

    #[test]
    fn test_malformed_stream_names_its_file() {
        let err = Error::malformed(21, "stream ended inside a code word")
            .in_file(Path::new("/tmp/corrupt.huff"));
        assert_eq!(
            err.to_string(),
            "malformed stream in /tmp/corrupt.huff at bit 21: stream ended inside a code word"
        );
        assert!(matches!(
            Error::MissingTree.in_file(Path::new("x")),
            Error::MissingTree
        ));
    }
}
