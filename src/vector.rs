//! The compressed, random-access integer vector.
//!
//! `FibVec` packs signed 64-bit values into a `BitBuffer` as Fibonacci
//! codewords and maintains sampled rank/select arrays so that `get` and
//! `get_values` locate and decode an entry in near-constant time instead of
//! scanning from the start.

use log::{debug, warn};

use crate::bitbuf::BitBuffer;
use crate::decoder;
use crate::encoder;
use crate::error::FibVecError;
use crate::fibonacci::MAX_M;
use crate::select::{popcount11, select11_64, word_ends_in_11};

/// Rank sampling period, in bits.
pub const SR: usize = 512;
/// Select sampling period, in `11` pairs.
pub const SS: usize = 640;

/// Largest encodable magnitude. Derived from the encoder's 63-position
/// Fibonacci budget: `i64` inputs are sign-magnitude remapped (zigzag) into
/// a `u64` magnitude space bounded by `MAX_M - 2`.
pub const MAX_VALUE: i64 = ((MAX_M - 2) / 2) as i64;
/// Smallest encodable value.
pub const MIN_VALUE: i64 = -MAX_VALUE;

fn zigzag_encode(v: i64) -> u64 {
    ((v << 1) ^ (v >> 63)) as u64
}

fn zigzag_decode(u: u64) -> i64 {
    ((u >> 1) as i64) ^ -((u & 1) as i64)
}

/// Compressed, random-access vector of signed integers.
#[derive(Clone)]
pub struct FibVec {
    bits: BitBuffer,
    ranks: Vec<u64>,
    indices: Vec<u64>,
    popcount: u64,
    length: usize,
    initialized: bool,
}

impl Default for FibVec {
    fn default() -> Self {
        Self::new()
    }
}

impl FibVec {
    /// Empty vector with the floating terminator installed.
    pub fn new() -> Self {
        let mut bits = BitBuffer::new();
        // Permanent 3-bit sentinel `011`, decodes to value 0 and is
        // discarded by the `dec > 1` guard.
        bits.push_bits(0, 1);
        bits.push_bits(1, 1);
        bits.push_bits(1, 1);
        Self {
            bits,
            ranks: vec![0],
            indices: vec![0],
            popcount: 0,
            length: 0,
            initialized: true,
        }
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Total bytes retained: the bit buffer plus both sample arrays.
    pub fn size(&self) -> usize {
        self.bits.size_bytes()
            + self.ranks.len() * std::mem::size_of::<u64>()
            + self.indices.len() * std::mem::size_of::<u64>()
    }

    /// Append `v`, rejecting values outside `[MIN_VALUE, MAX_VALUE]`.
    pub fn add(&mut self, v: i64) -> Result<(), FibVecError> {
        if !(MIN_VALUE..=MAX_VALUE).contains(&v) {
            warn!("add rejected out-of-range value {v} (max magnitude {MAX_VALUE})");
            return Err(FibVecError::OutOfRange { value: v, max: MAX_VALUE });
        }

        let u = zigzag_encode(v);
        let m = u + 2;
        let cw = encoder::encode(m);

        // Insert just before the floating terminator.
        let idx = self.bits.len_bits() - 3;
        self.bits.insert_bits(idx, cw.bits, cw.len);

        if (self.bits.len_bits() - 1) % 64 == 62 {
            self.bits.push_bits(0b11, 2);
        }

        self.popcount += 1;
        self.length += 1;

        // Maintain rank samples.
        while self.bits.len_bits() as u64 > (self.ranks.len() as u64) * SR as u64 {
            let boundary = (self.ranks.len() as u64) * SR as u64;
            let overflow = self.bits.len_bits() as u64 - boundary;
            let mut sample = self.popcount;
            if (cw.len as u64) <= overflow {
                sample -= 1;
            }
            self.ranks.push(sample);
            debug!("rank sample {} added, value {sample}", self.ranks.len() - 1);
        }

        // Maintain select samples.
        while self.popcount > (self.indices.len() as u64) * SS as u64 {
            let anchor = (idx as u64) & !63u64;
            self.indices.push(anchor);
            debug!("select sample {} added, anchor bit {anchor}", self.indices.len() - 1);
        }

        Ok(())
    }

    /// Error on out-of-range `i`.
    pub fn get(&self, i: usize) -> Result<i64, FibVecError> {
        if i >= self.length {
            return Err(FibVecError::IndexOutOfBounds { index: i, len: self.length });
        }
        let bit = self.codeword_start(i);
        let values = self.decode_window(bit, 1);
        Ok(values[0])
    }

    /// Returns the slice `[start, end)`.
    pub fn get_values(&self, start: usize, end: usize) -> Result<Vec<i64>, FibVecError> {
        if start >= end || end > self.length {
            return Err(FibVecError::InvalidRange { start, end, len: self.length });
        }
        let bit = self.codeword_start(start);
        Ok(self.decode_window(bit, end - start))
    }

    /// Bit index to hand `decode_window` in order to land on codeword `i`
    /// (0-indexed). Codeword 0 starts at bit 0 directly. For `i >= 1`,
    /// `select11(i)` returns the first bit of codeword `i - 1`'s own
    /// closing `11` pair; decoding from there parses those two bits as a
    /// spurious one-digit codeword (value 1, discarded by the `m > 1`
    /// guard) and then resumes exactly at the start of codeword `i`. This
    /// is cheaper than tracking codeword start offsets directly and falls
    /// out naturally from the `11`-pair rank/select index.
    fn codeword_start(&self, i: usize) -> usize {
        if i == 0 {
            0
        } else {
            self.select11(i as u64)
        }
    }

    /// Decode up to `count` values starting exactly at bit `start_bit`
    /// (either bit 0, or the start of an `11` pair immediately preceding
    /// the target codeword — see `codeword_start`). Values that decode to
    /// <= 1 after the `-2` offset are discarded by `decoder::decode`
    /// (padding / the floating terminator / the spurious pair consumed
    /// while resyncing).
    ///
    /// The live `BitBuffer` is never read bit-by-bit directly: a scratch
    /// copy of the remaining bytes is taken via `bits_from` and handed to
    /// the byte-table-driven decoder, so this (and therefore `get` /
    /// `get_values`) only ever touches `&self`.
    fn decode_window(&self, start_bit: usize, count: usize) -> Vec<i64> {
        let total = self.bits.len_bits();
        let remaining_bits = total.saturating_sub(start_bit);
        let num_bytes = remaining_bits.div_ceil(8).max(1);
        let window = self.bits.bits_from(start_bit, num_bytes);
        decoder::decode(&window, count)
            .into_iter()
            .map(|m| zigzag_decode(m - 2))
            .collect()
    }

    /// Bit index of the first bit of the `i`-th (1-indexed) `11` pair.
    fn select11(&self, i: u64) -> usize {
        debug_assert!(i >= 1);
        let j = ((i - 1) / SS as u64) as usize;
        let anchor = self.indices[j];
        let q = (anchor / SR as u64) as usize;

        let mut k = 0usize;
        while q + k + 1 < self.ranks.len() && self.ranks[q + k + 1] < i {
            k += 1;
        }
        let block = q + k;

        let mut rank = self.ranks[block];
        let mut word_idx = (block * SR) / 64;

        loop {
            let w = self.bits.word(word_idx);
            let mut wc = popcount11(w) as u64;
            if word_ends_in_11(w) {
                let next = self.bits.word(word_idx + 1);
                if next & 1 == 1 {
                    wc -= 1;
                }
            }
            if rank + wc >= i {
                let needed = (i - rank) as u32;
                let bit_in_word = select11_64(w, needed);
                return word_idx * 64 + bit_in_word;
            }
            rank += wc;
            word_idx += 1;
        }
    }

    /// Bulk-encode `bits`, `ranks`, `indices`, `popcount`, `length`, and
    /// `initialized` into a length-prefixed little-endian blob.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        write_bytes_field(&mut out, &self.bits.as_bytes());
        write_u64_vec_field(&mut out, &self.ranks);
        write_u64_vec_field(&mut out, &self.indices);
        out.extend_from_slice(&self.popcount.to_le_bytes());
        out.extend_from_slice(&(self.length as u64).to_le_bytes());
        out.push(self.initialized as u8);
        out
    }

    /// Decode a vector previously produced by `encode`.
    pub fn decode(bytes: &[u8]) -> Result<FibVec, FibVecError> {
        let mut pos = 0usize;
        let raw_bits = read_bytes_field(bytes, &mut pos)?;
        let ranks = read_u64_vec_field(bytes, &mut pos)?;
        let indices = read_u64_vec_field(bytes, &mut pos)?;
        let popcount = read_u64(bytes, &mut pos)?;
        let length = read_u64(bytes, &mut pos)? as usize;
        let initialized = read_u8(bytes, &mut pos)? != 0;

        let mut bits = BitBuffer::new();
        // Rebuild the word array from the little-endian byte view; the
        // buffer is always a whole number of 8-byte words by construction.
        if raw_bits.len() % 8 != 0 {
            warn!("decode given a bit buffer byte length not a multiple of 8");
            return Err(FibVecError::Deserialize(
                "bit buffer byte length is not a multiple of 8".to_string(),
            ));
        }
        let mut total_bits = 0usize;
        for chunk in raw_bits.chunks_exact(8) {
            let w = u64::from_le_bytes(chunk.try_into().unwrap());
            bits.push_bits(w, 64);
            total_bits += 64;
        }
        // push_bits always appends whole words here, so len_bits is exact.
        debug_assert_eq!(bits.len_bits(), total_bits);

        Ok(FibVec { bits, ranks, indices, popcount, length, initialized })
    }
}

fn write_bytes_field(out: &mut Vec<u8>, data: &[u8]) {
    out.extend_from_slice(&(data.len() as u64).to_le_bytes());
    out.extend_from_slice(data);
}

fn write_u64_vec_field(out: &mut Vec<u8>, data: &[u64]) {
    out.extend_from_slice(&(data.len() as u64).to_le_bytes());
    for v in data {
        out.extend_from_slice(&v.to_le_bytes());
    }
}

fn read_u64(bytes: &[u8], pos: &mut usize) -> Result<u64, FibVecError> {
    if *pos + 8 > bytes.len() {
        return Err(FibVecError::Deserialize("truncated while reading u64".to_string()));
    }
    let v = u64::from_le_bytes(bytes[*pos..*pos + 8].try_into().unwrap());
    *pos += 8;
    Ok(v)
}

fn read_u8(bytes: &[u8], pos: &mut usize) -> Result<u8, FibVecError> {
    if *pos + 1 > bytes.len() {
        return Err(FibVecError::Deserialize("truncated while reading u8".to_string()));
    }
    let v = bytes[*pos];
    *pos += 1;
    Ok(v)
}

fn read_bytes_field(bytes: &[u8], pos: &mut usize) -> Result<Vec<u8>, FibVecError> {
    let len = read_u64(bytes, pos)? as usize;
    if *pos + len > bytes.len() {
        return Err(FibVecError::Deserialize("truncated byte field".to_string()));
    }
    let v = bytes[*pos..*pos + len].to_vec();
    *pos += len;
    Ok(v)
}

fn read_u64_vec_field(bytes: &[u8], pos: &mut usize) -> Result<Vec<u64>, FibVecError> {
    let len = read_u64(bytes, pos)? as usize;
    let available = bytes.len().saturating_sub(*pos) / 8;
    if len > available {
        return Err(FibVecError::Deserialize(
            "length prefix exceeds remaining input".to_string(),
        ));
    }
    let mut out = Vec::with_capacity(len);
    for _ in 0..len {
        out.push(read_u64(bytes, pos)?);
    }
    Ok(out)
}
