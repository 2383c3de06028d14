//! Byte-at-a-time Fibonacci decoder built on the [`crate::decoder_tables`]
//! transition tables.
//!
//! Instead of scanning bit by bit, the decoder consumes one byte at a time,
//! looks up how that byte advances the state machine in `T0`/`T1`, and uses
//! the Fibonacci left-shift identity (`shift_up`) to fold a byte's leftover
//! open tail into the next byte's contribution. This keeps per-value work to
//! a handful of table lookups and additions regardless of codeword length.

use crate::decoder_tables::{t0, t1};
use crate::fibonacci::shift_up;

/// Decode up to `count` Zeckendorf-coded values (still offset by the `+2`
/// terminator bias, i.e. the raw `m` values) from `bytes`, skipping any
/// leading boundary pads (digit-sum `<= 1`, see `FibVec::add`).
///
/// `bytes` must start exactly at a codeword boundary's byte, i.e. bit 0 of
/// `bytes[0]` must be digit position 1 of the first codeword (or of a pad).
/// Stops early once `count` values have been produced; if the input runs out
/// first, returns however many were found.
pub fn decode(bytes: &[u8], count: usize) -> Vec<u64> {
    let mut out = Vec::with_capacity(count);
    if count == 0 {
        return out;
    }

    let mut open_value: u64 = 0;
    let mut open_bits: u64 = 0;
    let mut prev_bit_carried = false;

    for &b in bytes {
        if out.len() >= count {
            break;
        }
        let rec = if prev_bit_carried { &t1()[b as usize] } else { &t0()[b as usize] };

        for &frag in &rec.closures {
            let contribution =
                if open_bits == 0 { frag as u64 } else { shift_up(frag as u64, open_bits) };
            let m = open_value + contribution;
            open_value = 0;
            open_bits = 0;
            if m > 1 {
                out.push(m);
                if out.len() >= count {
                    // Any remaining bits of this byte belong to the next
                    // codeword, but the caller doesn't need it.
                    prev_bit_carried = false;
                    break;
                }
            }
        }
        if out.len() >= count {
            break;
        }

        if rec.shift > 0 {
            let contribution = if open_bits == 0 {
                rec.tail_value as u64
            } else {
                shift_up(rec.tail_value as u64, open_bits)
            };
            open_value += contribution;
            open_bits += rec.shift as u64;
        }

        prev_bit_carried = (b >> 7) & 1 == 1;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Bit-by-bit reference scanner mirroring the original implementation,
    /// kept only to cross-check the table-driven decoder above.
    fn reference_decode(bytes: &[u8], count: usize) -> Vec<u64> {
        use crate::fibonacci::F;
        let mut out = Vec::with_capacity(count);
        let mut pos = 1usize;
        let mut sum = 0u64;
        let mut prev_bit = false;

        'outer: for &b in bytes {
            for i in 0..8u8 {
                if out.len() >= count {
                    break 'outer;
                }
                let bit = (b >> i) & 1 == 1;
                if prev_bit && bit {
                    if sum > 1 {
                        out.push(sum);
                    }
                    sum = 0;
                    pos = 1;
                    prev_bit = false;
                    continue;
                }
                if bit {
                    sum += F[pos];
                }
                pos += 1;
                prev_bit = bit;
            }
        }
        out
    }

    fn pack_bits(bits: &[bool]) -> Vec<u8> {
        let mut bytes = vec![0u8; bits.len().div_ceil(8).max(1)];
        for (i, &bit) in bits.iter().enumerate() {
            if bit {
                bytes[i / 8] |= 1 << (i % 8);
            }
        }
        bytes
    }

    fn codeword_bits(m: u64) -> Vec<bool> {
        use crate::fibonacci::{F, MAX_POSITION};
        let mut remainder = m;
        let mut digits = vec![false; MAX_POSITION + 1];
        for pos in (1..=MAX_POSITION).rev() {
            if F[pos] <= remainder {
                digits[pos] = true;
                remainder -= F[pos];
            }
        }
        let highest = (1..=MAX_POSITION).rev().find(|&p| digits[p]).unwrap_or(1);
        let mut bits: Vec<bool> = (1..=highest).map(|p| digits[p]).collect();
        bits.push(true);
        bits
    }

    #[test]
    fn decodes_single_small_value() {
        let bytes = pack_bits(&codeword_bits(2));
        assert_eq!(decode(&bytes, 1), vec![2]);
    }

    #[test]
    fn decodes_several_values_across_bytes() {
        let values = [2u64, 5, 20, 67, 200, 3, 4];
        let mut bits = Vec::new();
        for &v in &values {
            bits.extend(codeword_bits(v));
        }
        let bytes = pack_bits(&bits);
        assert_eq!(decode(&bytes, values.len()), values.to_vec());
    }

    #[test]
    fn stops_after_requested_count() {
        let values = [2u64, 3, 4, 5];
        let mut bits = Vec::new();
        for &v in &values {
            bits.extend(codeword_bits(v));
        }
        let bytes = pack_bits(&bits);
        assert_eq!(decode(&bytes, 2), vec![2, 3]);
    }

    #[test]
    fn skips_leading_boundary_pad() {
        // `FibVec::add`'s boundary pad is two raw `1` bits spliced in with
        // no preceding digit: decoded alone that closes immediately with
        // digit-sum 1, which the `m > 1` filter discards.
        let mut bits = vec![true, true];
        bits.extend(codeword_bits(5));
        let bytes = pack_bits(&bits);
        assert_eq!(decode(&bytes, 1), vec![5]);
    }

    #[test]
    fn matches_reference_scanner_across_many_random_sequences() {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let n = rng.gen_range(1..20);
            let values: Vec<u64> = (0..n).map(|_| rng.gen_range(2..5000)).collect();
            let mut bits = Vec::new();
            for &v in &values {
                bits.extend(codeword_bits(v));
            }
            let bytes = pack_bits(&bits);
            assert_eq!(decode(&bytes, values.len()), reference_decode(&bytes, values.len()));
            assert_eq!(decode(&bytes, values.len()), values);
        }
    }
}
