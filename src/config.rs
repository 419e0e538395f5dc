//! Session configuration.
//!
//! Values come from, in increasing priority: built-in defaults, a JSON
//! config file, and command-line overrides applied by the driver.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default I/O buffer size in bytes.
pub const DEFAULT_BUFFER_CAPACITY: usize = 8 * 1024;

/// Which symbols a session reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alphabet {
    /// Raw bytes.
    Bytes,
    /// Unicode characters stored as UTF-8.
    #[default]
    Text,
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Alphabet::Bytes => "bytes",
            Alphabet::Text => "text",
        })
    }
}

impl FromStr for Alphabet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "bytes" | "byte" => Ok(Alphabet::Bytes),
            "text" | "chars" | "char" => Ok(Alphabet::Text),
            other => Err(Error::Config(format!("unknown alphabet '{other}'"))),
        }
    }
}

fn default_buffer_capacity() -> usize {
    DEFAULT_BUFFER_CAPACITY
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Settings for one compression or decompression run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Symbol alphabet.
    pub alphabet: Alphabet,

    /// I/O buffer size in bytes.
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,

    /// Log filter directive, e.g. `info` or `huffman_toy=debug`.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Where the code tree is saved or loaded.
    pub tree_path: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            alphabet: Alphabet::default(),
            buffer_capacity: default_buffer_capacity(),
            log_level: default_log_level(),
            tree_path: None,
        }
    }
}

impl SessionConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let json =
            fs::read_to_string(path).map_err(|e| Error::resource("read config file", path, e))?;
        Self::from_json(&json)
    }

    /// Check the values make sense together.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        if self.buffer_capacity == 0 {
            errors.push("buffer_capacity must be greater than zero");
        }
        if self.log_level.trim().is_empty() {
            errors.push("log_level must not be empty");
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Config(errors.join("; ")))
        }
    }
}
