//! A module that provides bit-granular readers and writers over bytes.
//!
//! Bits are packed most significant bit first. A non-empty stream ends with
//! one trailer byte giving the number of meaningful bits (1..=8) in the last
//! data byte, so zero padding is never mistaken for data. A stream that
//! carries no bits is zero bytes long.
use std::io::Write;
use std::path::PathBuf;
use std::{default, ops};

use crate::error::{Error, Result};

/// A struct representing the position of a bit in a byte array.
/// The position is represented by the byte index and the bit index within the byte,
/// counted from the most significant bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BitPosition {
    pub byte_index: usize,
    pub bit_index: usize,
}

/// The number of bits in a byte.
const BITS_PER_BYTE: usize = 8;

impl BitPosition {
    /// Create a new BitPosition at the beginning of the byte array.
    fn new() -> Self {
        Self {
            byte_index: 0,
            bit_index: 0,
        }
    }

    /// Try to add the given number of bits to the current position.
    fn try_add_bits(&self, bits: usize) -> Option<Self> {
        let byte_added = bits / BITS_PER_BYTE;
        let bit_rem = bits % BITS_PER_BYTE;

        let byte_index = self.byte_index.checked_add(byte_added)?;
        let bit_index = self.bit_index + bit_rem;

        if bit_index >= BITS_PER_BYTE {
            Some(Self {
                byte_index: byte_index.checked_add(1)?,
                bit_index: bit_index - BITS_PER_BYTE,
            })
        } else {
            Some(Self {
                byte_index,
                bit_index,
            })
        }
    }

    /// Absolute bit offset from the start of the data.
    fn as_bits(&self) -> u64 {
        self.byte_index as u64 * BITS_PER_BYTE as u64 + self.bit_index as u64
    }
}

impl default::Default for BitPosition {
    fn default() -> Self {
        Self::new()
    }
}

impl ops::Add<usize> for BitPosition {
    type Output = Option<Self>;
    fn add(self, bits: usize) -> Option<Self> {
        self.try_add_bits(bits)
    }
}

/// Produces one bit at a time.
pub trait BitSource {
    /// Whether at least one more meaningful bit is available.
    fn has_next(&self) -> bool;

    /// Read the next bit, or `None` once the stream is exhausted.
    fn read_bit(&mut self) -> Option<bool>;
}

/// Accepts one bit at a time.
pub trait BitSink {
    fn write_bit(&mut self, bit: bool) -> Result<()>;

    /// Flush buffered bits and return the number of meaningful bits written.
    fn finish(&mut self) -> Result<u64>;
}

impl BitSink for Vec<bool> {
    fn write_bit(&mut self, bit: bool) -> Result<()> {
        self.push(bit);
        Ok(())
    }

    fn finish(&mut self) -> Result<u64> {
        Ok(self.len() as u64)
    }
}

/// A struct that reads bits from a framed byte array.
#[derive(Debug)]
pub struct BitReader<'a> {
    data: &'a [u8],
    position: BitPosition,
    bit_len: u64,
}

impl<'a> BitReader<'a> {
    /// Create a new BitReader over a framed payload.
    ///
    /// Fails when the trailer byte is missing or out of range.
    pub fn new(framed: &'a [u8]) -> Result<Self> {
        let (data, bit_len) = match framed {
            [] => (framed, 0),
            [_] => return Err(Error::malformed(0, "payload has a trailer but no data")),
            [data @ .., trailer] => {
                let last_bits = *trailer as u64;
                if !(1..=BITS_PER_BYTE as u64).contains(&last_bits) {
                    return Err(Error::malformed(0, "trailer byte out of range"));
                }
                let full_bytes = (data.len() - 1) as u64;
                (data, full_bytes * BITS_PER_BYTE as u64 + last_bits)
            }
        };
        Ok(Self {
            data,
            position: BitPosition::new(),
            bit_len,
        })
    }

    /// Number of meaningful bits in the stream.
    pub fn bit_len(&self) -> u64 {
        self.bit_len
    }

    /// Number of bits already consumed.
    pub fn consumed(&self) -> u64 {
        self.position.as_bits()
    }

    /// Check if the reader has reached the end of the meaningful bits.
    pub fn eof(&self) -> bool {
        self.consumed() >= self.bit_len
    }

    /// Peek bits with given bit length without advancing the position.
    /// The first bit read ends up as the most significant bit of the result.
    pub fn try_peek_bits(&self, n_bits: usize) -> Option<u64> {
        if n_bits > u64::BITS as usize || self.consumed() + n_bits as u64 > self.bit_len {
            return None;
        }

        let mut result = 0u64;
        let mut n_bits_rem = n_bits;
        let mut cur_pos = self.position;

        while n_bits_rem > 0 {
            let cur_byte = self.data[cur_pos.byte_index];
            // Max is the remaining bits in the current byte or the bits to read.
            let bits_to_read = n_bits_rem.min(BITS_PER_BYTE - cur_pos.bit_index);

            // Bits are taken from the top of the byte downwards.
            let shift = BITS_PER_BYTE - cur_pos.bit_index - bits_to_read;
            let mask = (1u64 << bits_to_read) - 1;
            let read_bits = (cur_byte as u64 >> shift) & mask;

            result = (result << bits_to_read) | read_bits;

            n_bits_rem -= bits_to_read;
            cur_pos = (cur_pos + bits_to_read)?;
        }
        Some(result)
    }

    /// Try to read the given number of bits and advance the position.
    pub fn try_read_bits(&mut self, n_bits: usize) -> Option<u64> {
        let result = self.try_peek_bits(n_bits)?;
        self.position = (self.position + n_bits)?;
        Some(result)
    }
}

impl BitSource for BitReader<'_> {
    fn has_next(&self) -> bool {
        !self.eof()
    }

    fn read_bit(&mut self) -> Option<bool> {
        self.try_read_bits(1).map(|bit| bit == 1)
    }
}

/// A struct that packs bits into bytes and frames them on `finish`.
#[derive(Debug)]
pub struct BitWriter<W: Write> {
    writer: W,
    path: PathBuf,
    current: u8,
    bits_in_current: usize,
    written: u64,
    finished: bool,
}

impl<W: Write> BitWriter<W> {
    /// Create a new BitWriter. The path only labels errors.
    pub fn new(writer: W, path: impl Into<PathBuf>) -> Self {
        Self {
            writer,
            path: path.into(),
            current: 0,
            bits_in_current: 0,
            written: 0,
            finished: false,
        }
    }

    /// Number of meaningful bits accepted so far.
    pub fn bits_written(&self) -> u64 {
        self.written
    }

    /// Consume the writer and hand back the underlying sink.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn emit(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer
            .write_all(bytes)
            .map_err(|e| Error::resource("write compressed output", &self.path, e))
    }
}

impl<W: Write> BitSink for BitWriter<W> {
    fn write_bit(&mut self, bit: bool) -> Result<()> {
        if bit {
            self.current |= 1 << (BITS_PER_BYTE - 1 - self.bits_in_current);
        }
        self.bits_in_current += 1;
        self.written += 1;

        if self.bits_in_current == BITS_PER_BYTE {
            let byte = self.current;
            self.current = 0;
            self.bits_in_current = 0;
            self.emit(&[byte])?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<u64> {
        if self.finished {
            return Ok(self.written);
        }
        self.finished = true;

        if self.written > 0 {
            // A full final byte was already emitted; it holds 8 meaningful bits.
            let trailer = if self.bits_in_current == 0 {
                BITS_PER_BYTE as u8
            } else {
                let byte = self.current;
                self.emit(&[byte])?;
                self.bits_in_current as u8
            };
            self.emit(&[trailer])?;
        }
        self.writer
            .flush()
            .map_err(|e| Error::resource("flush compressed output", &self.path, e))?;
        Ok(self.written)
    }
}

/// Pack a slice of bits into a framed byte vector.
pub fn pack_bits(bits: &[bool]) -> Result<Vec<u8>> {
    let mut writer = BitWriter::new(Vec::new(), "<memory>");
    for &bit in bits {
        writer.write_bit(bit)?;
    }
    writer.finish()?;
    Ok(writer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_position_new() {
        let pos = BitPosition::new();
        assert_eq!(pos.byte_index, 0);
        assert_eq!(pos.bit_index, 0);
    }

    #[test]
    fn test_bit_position_add_bits() {
        let pos = (BitPosition::new() + 10).unwrap();
        assert_eq!(pos.byte_index, 1);
        assert_eq!(pos.bit_index, 2);
        assert_eq!(pos.as_bits(), 10);
    }

    #[test]
    fn test_bit_position_try_add_bits_overflow() {
        let pos = BitPosition {
            byte_index: usize::MAX,
            bit_index: 7,
        };
        assert!(pos.try_add_bits(2).is_none());
    }

    #[test]
    fn test_empty_payload_has_no_bits() {
        let reader = BitReader::new(&[]).unwrap();
        assert_eq!(reader.bit_len(), 0);
        assert!(!reader.has_next());
    }

    #[test]
    fn test_lone_trailer_is_malformed() {
        assert!(matches!(
            BitReader::new(&[3]),
            Err(Error::MalformedStream { .. })
        ));
    }

    #[test]
    fn test_trailer_out_of_range_is_malformed() {
        assert!(BitReader::new(&[0xFF, 0]).is_err());
        assert!(BitReader::new(&[0xFF, 9]).is_err());
    }

    #[test]
    fn test_bit_reader_reads_msb_first() {
        let data = [0b1010_1100, 0b0101_0101, 8];
        let mut reader = BitReader::new(&data).unwrap();
        assert_eq!(reader.bit_len(), 16);
        assert_eq!(reader.try_peek_bits(4), Some(0b1010));
        assert_eq!(reader.try_read_bits(4), Some(0b1010));
        assert_eq!(reader.try_read_bits(4), Some(0b1100));
        assert_eq!(reader.try_read_bits(8), Some(0b0101_0101));
        assert!(reader.eof());
        assert_eq!(reader.read_bit(), None);
    }

    #[test]
    fn test_bit_reader_read_bits_across_bytes() {
        let data = [0b1010_1100, 0b0101_0101, 8];
        let mut reader = BitReader::new(&data).unwrap();
        assert_eq!(reader.try_read_bits(12), Some(0b1010_1100_0101));
    }

    #[test]
    fn test_bit_reader_stops_at_trailer_count() {
        // Only the top three bits of the last byte are meaningful.
        let data = [0b1110_0000, 3];
        let mut reader = BitReader::new(&data).unwrap();
        assert_eq!(reader.try_read_bits(4), None);
        assert_eq!(reader.read_bit(), Some(true));
        assert_eq!(reader.read_bit(), Some(true));
        assert!(reader.has_next());
        assert_eq!(reader.read_bit(), Some(true));
        assert!(!reader.has_next());
        assert_eq!(reader.read_bit(), None);
    }

    #[test]
    fn test_bit_reader_rejects_too_wide_peek() {
        let mut data = [0xFF; 10];
        data[9] = 8;
        let reader = BitReader::new(&data).unwrap();
        assert_eq!(reader.bit_len(), 72);
        assert_eq!(reader.try_peek_bits(65), None);
        assert_eq!(reader.try_peek_bits(64), Some(u64::MAX));
    }

    #[test]
    fn test_writer_emits_nothing_without_bits() {
        assert!(pack_bits(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_writer_pads_and_frames_partial_byte() {
        let packed = pack_bits(&[true, false, true, true]).unwrap();
        assert_eq!(packed, vec![0b1011_0000, 4]);
    }

    #[test]
    fn test_writer_frames_full_byte() {
        let bits = [true, true, false, false, true, false, true, false];
        assert_eq!(pack_bits(&bits).unwrap(), vec![0b1100_1010, 8]);
    }

    #[test]
    fn test_writer_finish_is_idempotent() {
        let mut writer = BitWriter::new(Vec::new(), "<memory>");
        writer.write_bit(true).unwrap();
        assert_eq!(writer.bits_written(), 1);
        assert_eq!(writer.finish().unwrap(), 1);
        assert_eq!(writer.finish().unwrap(), 1);
        assert_eq!(writer.into_inner(), vec![0b1000_0000, 1]);
    }

    #[test]
    fn test_reader_recovers_written_bits() {
        let bits: Vec<bool> = (0..21).map(|i| i % 3 == 0).collect();
        let packed = pack_bits(&bits).unwrap();
        let mut reader = BitReader::new(&packed).unwrap();
        let mut read = Vec::new();
        while let Some(bit) = reader.read_bit() {
            read.push(bit);
        }
        assert_eq!(read, bits);
    }
}
