//! Symbols and the sequential sources and sinks that carry them.
//!
//! Two alphabets are supported: raw bytes (`u8`) and Unicode scalar values
//! (`char`, stored as UTF-8). A source yields symbols one at a time and
//! reports the end of input as `Ok(None)`, never as a symbol.

use std::fmt::Debug;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, ErrorKind, Read, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};

/// An atomic unit of the input alphabet.
pub trait Symbol: Copy + Ord + Debug + Serialize + DeserializeOwned {
    /// Read one symbol. Returns `Ok(None)` at end of input.
    fn read_from<R: BufRead>(reader: &mut R) -> io::Result<Option<Self>>;

    /// Write one symbol.
    fn write_to<W: Write>(self, writer: &mut W) -> io::Result<()>;
}

impl Symbol for u8 {
    fn read_from<R: BufRead>(reader: &mut R) -> io::Result<Option<Self>> {
        let byte = loop {
            match reader.fill_buf() {
                Ok(buf) => break buf.first().copied(),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        };
        if byte.is_some() {
            reader.consume(1);
        }
        Ok(byte)
    }

    fn write_to<W: Write>(self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&[self])
    }
}

/// Length of a UTF-8 sequence, judged by its leading byte.
fn utf8_width(lead: u8) -> Option<usize> {
    match lead {
        0x00..=0x7F => Some(1),
        0xC0..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF7 => Some(4),
        _ => None,
    }
}

fn invalid_utf8() -> io::Error {
    io::Error::new(ErrorKind::InvalidData, "stream did not contain valid UTF-8")
}

impl Symbol for char {
    fn read_from<R: BufRead>(reader: &mut R) -> io::Result<Option<Self>> {
        let Some(lead) = u8::read_from(reader)? else {
            return Ok(None);
        };
        let width = utf8_width(lead).ok_or_else(invalid_utf8)?;

        let mut buf = [lead, 0, 0, 0];
        reader.read_exact(&mut buf[1..width]).map_err(|e| {
            if e.kind() == ErrorKind::UnexpectedEof {
                invalid_utf8()
            } else {
                e
            }
        })?;

        let text = std::str::from_utf8(&buf[..width]).map_err(|_| invalid_utf8())?;
        Ok(text.chars().next())
    }

    fn write_to<W: Write>(self, writer: &mut W) -> io::Result<()> {
        let mut buf = [0; 4];
        writer.write_all(self.encode_utf8(&mut buf).as_bytes())
    }
}

/// Produces a finite, ordered sequence of symbols.
pub trait SymbolSource {
    type Symbol: Symbol;

    /// Next symbol, or `Ok(None)` once the sequence is exhausted.
    fn next_symbol(&mut self) -> Result<Option<Self::Symbol>>;
}

/// Accepts symbols one at a time, in order.
pub trait SymbolSink {
    type Symbol: Symbol;

    fn write_symbol(&mut self, symbol: Self::Symbol) -> Result<()>;

    /// Commit everything written so far.
    fn finish(&mut self) -> Result<()>;
}

/// A source over an in-memory slice.
#[derive(Debug, Clone)]
pub struct SliceSource<'a, S> {
    symbols: std::slice::Iter<'a, S>,
}

impl<'a, S: Symbol> SliceSource<'a, S> {
    pub fn new(symbols: &'a [S]) -> Self {
        Self {
            symbols: symbols.iter(),
        }
    }
}

impl<S: Symbol> SymbolSource for SliceSource<'_, S> {
    type Symbol = S;

    fn next_symbol(&mut self) -> Result<Option<S>> {
        Ok(self.symbols.next().copied())
    }
}

impl<S: Symbol> SymbolSink for Vec<S> {
    type Symbol = S;

    fn write_symbol(&mut self, symbol: S) -> Result<()> {
        self.push(symbol);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Reads symbols from a buffered reader.
///
/// The path is only used to give errors some context; in-memory readers can
/// pass any descriptive label.
#[derive(Debug)]
pub struct SymbolReader<R, S> {
    reader: R,
    path: PathBuf,
    _symbol: PhantomData<S>,
}

impl<R: BufRead, S: Symbol> SymbolReader<R, S> {
    pub fn new(reader: R, path: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            path: path.into(),
            _symbol: PhantomData,
        }
    }
}

impl<S: Symbol> SymbolReader<BufReader<File>, S> {
    /// Open a file for sequential symbol reads.
    pub fn open(path: &Path, capacity: usize) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::resource("open input", path, e))?;
        Ok(Self::new(BufReader::with_capacity(capacity, file), path))
    }
}

impl<R: BufRead, S: Symbol> SymbolSource for SymbolReader<R, S> {
    type Symbol = S;

    fn next_symbol(&mut self) -> Result<Option<S>> {
        S::read_from(&mut self.reader).map_err(|e| Error::resource("read input", &self.path, e))
    }
}

/// Writes symbols to a buffered writer.
#[derive(Debug)]
pub struct SymbolWriter<W: Write, S> {
    writer: BufWriter<W>,
    path: PathBuf,
    _symbol: PhantomData<S>,
}

impl<W: Write, S: Symbol> SymbolWriter<W, S> {
    pub fn new(writer: W, path: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            writer: BufWriter::with_capacity(capacity, writer),
            path: path.into(),
            _symbol: PhantomData,
        }
    }
}

impl<S: Symbol> SymbolWriter<File, S> {
    /// Create (or truncate) a file for sequential symbol writes.
    pub fn create(path: &Path, capacity: usize) -> Result<Self> {
        let file = File::create(path).map_err(|e| Error::resource("create output", path, e))?;
        Ok(Self::new(file, path, capacity))
    }
}

impl<W: Write, S: Symbol> SymbolSink for SymbolWriter<W, S> {
    type Symbol = S;

    fn write_symbol(&mut self, symbol: S) -> Result<()> {
        symbol
            .write_to(&mut self.writer)
            .map_err(|e| Error::resource("write output", &self.path, e))
    }

    fn finish(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| Error::resource("flush output", &self.path, e))
    }
}

/// Drain a source into a vector.
pub fn read_all<Src: SymbolSource>(source: &mut Src) -> Result<Vec<Src::Symbol>> {
    let mut symbols = Vec::new();
    while let Some(symbol) = source.next_symbol()? {
        symbols.push(symbol);
    }
    Ok(symbols)
}

/// Read every byte of a reader, mapping failures to a resource error.
pub(crate) fn read_to_vec<R: Read>(mut reader: R, path: &Path) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    reader
        .read_to_end(&mut data)
        .map_err(|e| Error::resource("read input", path, e))?;
    Ok(data)
}
