// lzw.rs
//
// Copyright (c) 2020-2025  Douglas Lau
//
//! Lempel-Ziv-Welch compression for GIF
use std::io::{self, Write};

/// Maximum code bits allowed for GIF
const MAX_BITS: u8 = 12;

/// Code space limit (one past the highest code)
const MAX_MAX_CODE: Code = 1 << MAX_BITS;

/// Hash table size (prime, about 80% occupancy)
const HASH_SZ: usize = 5003;

/// Shift for hashing a byte with a prefix code
const HASH_SHIFT: u32 = hash_shift();

/// Maximum data bytes in one sub-block
const SUB_BLOCK_SZ: usize = 254;

/// Code type
type Code = u16;

/// Compute hash shift from the table size
const fn hash_shift() -> u32 {
    let mut shift = 0;
    let mut fcode = HASH_SZ;
    while fcode < 65536 {
        shift += 1;
        fcode *= 2;
    }
    8 - shift
}

/// Highest code for a number of bits
fn max_code(bits: u8) -> Code {
    (1 << bits) - 1
}

/// Dictionary slot: (prefix, byte) key and assigned code
#[derive(Clone, Copy, Debug)]
struct Slot {
    key: u32,
    code: Code,
}

/// LZW Data Compressor
///
/// Codes are packed least-significant bit first, and written as
/// length-prefixed sub-blocks.
pub struct Compressor {
    /// Initial code bits
    init_bits: u8,
    /// Current code bits
    code_bits: u8,
    /// Highest code for current code bits
    max_code: Code,
    /// Next code to assign
    free_code: Code,
    /// Clear code was just emitted
    clear_flag: bool,
    /// Open-addressed dictionary
    table: Vec<Option<Slot>>,
    /// Bit accumulator
    accum: u32,
    /// Number of bits in accumulator
    n_bits: u8,
    /// Pending sub-block
    block: Vec<u8>,
}

impl Compressor {
    /// Create a new compressor.
    ///
    /// * `min_code_bits` Bits needed for the palette (at least 2).
    pub fn new(min_code_bits: u8) -> Self {
        let init_bits = min_code_bits.clamp(2, MAX_BITS - 1) + 1;
        Compressor {
            init_bits,
            code_bits: init_bits,
            max_code: max_code(init_bits),
            free_code: 0,
            clear_flag: false,
            table: vec![None; HASH_SZ],
            accum: 0,
            n_bits: 0,
            block: Vec::with_capacity(SUB_BLOCK_SZ),
        }
    }

    /// Get the LZW minimum code size
    pub fn min_code_size(&self) -> u8 {
        self.init_bits - 1
    }

    /// Get the clear code
    fn clear_code(&self) -> Code {
        1 << (self.init_bits - 1)
    }

    /// Get the end code
    fn end_code(&self) -> Code {
        self.clear_code() + 1
    }

    /// Reset state at the start of a compression
    fn reset(&mut self) {
        self.code_bits = self.init_bits;
        self.max_code = max_code(self.init_bits);
        self.free_code = self.end_code() + 1;
        self.clear_flag = false;
        self.clear_table();
        self.accum = 0;
        self.n_bits = 0;
        self.block.clear();
    }

    /// Clear the dictionary
    fn clear_table(&mut self) {
        self.table.iter_mut().for_each(|s| *s = None);
    }

    /// Look up a key, starting at slot `i`.
    ///
    /// Returns the slot where the search stopped, and the code if found.
    fn lookup(&self, key: u32, mut i: usize) -> (usize, Option<Code>) {
        let step = if i == 0 { 1 } else { HASH_SZ - i };
        while let Some(slot) = self.table[i] {
            if slot.key == key {
                return (i, Some(slot.code));
            }
            i = if i >= step { i - step } else { i + HASH_SZ - step };
        }
        (i, None)
    }

    /// Compress indexed bytes, writing sub-blocks (without terminator)
    pub fn compress<W: Write>(
        &mut self,
        bytes: &[u8],
        w: &mut W,
    ) -> io::Result<()> {
        self.reset();
        self.output(self.clear_code(), w)?;
        let mut bytes = bytes.iter();
        let mut ent = match bytes.next() {
            Some(b) => Code::from(*b),
            None => return self.output(self.end_code(), w),
        };
        for byte in bytes {
            let c = Code::from(*byte);
            let key = (u32::from(c) << MAX_BITS) + u32::from(ent);
            let i = (usize::from(c) << HASH_SHIFT) ^ usize::from(ent);
            let (i, code) = self.lookup(key, i);
            if let Some(code) = code {
                ent = code;
                continue;
            }
            self.output(ent, w)?;
            ent = c;
            if self.free_code < MAX_MAX_CODE {
                self.table[i] = Some(Slot {
                    key,
                    code: self.free_code,
                });
                self.free_code += 1;
            } else {
                self.clear_block(w)?;
            }
        }
        self.output(ent, w)?;
        self.output(self.end_code(), w)
    }

    /// Clear the dictionary and emit a clear code
    fn clear_block<W: Write>(&mut self, w: &mut W) -> io::Result<()> {
        self.clear_table();
        self.free_code = self.end_code() + 1;
        self.clear_flag = true;
        self.output(self.clear_code(), w)
    }

    /// Pack one code
    fn output<W: Write>(&mut self, code: Code, w: &mut W) -> io::Result<()> {
        self.accum |= u32::from(code) << self.n_bits;
        self.n_bits += self.code_bits;
        while self.n_bits >= 8 {
            self.push_byte(self.accum as u8, w)?;
            self.accum >>= 8;
            self.n_bits -= 8;
        }
        if self.clear_flag {
            self.code_bits = self.init_bits;
            self.max_code = max_code(self.init_bits);
            self.clear_flag = false;
        } else if self.free_code > self.max_code {
            self.code_bits += 1;
            self.max_code = if self.code_bits == MAX_BITS {
                MAX_MAX_CODE
            } else {
                max_code(self.code_bits)
            };
        }
        if code == self.end_code() {
            while self.n_bits > 0 {
                self.push_byte(self.accum as u8, w)?;
                self.accum >>= 8;
                self.n_bits = self.n_bits.saturating_sub(8);
            }
            self.flush_block(w)?;
        }
        Ok(())
    }

    /// Add a byte to the pending sub-block
    fn push_byte<W: Write>(&mut self, byte: u8, w: &mut W) -> io::Result<()> {
        self.block.push(byte);
        if self.block.len() >= SUB_BLOCK_SZ {
            self.flush_block(w)?;
        }
        Ok(())
    }

    /// Write the pending sub-block
    fn flush_block<W: Write>(&mut self, w: &mut W) -> io::Result<()> {
        if !self.block.is_empty() {
            w.write_all(&[self.block.len() as u8])?;
            w.write_all(&self.block)?;
            self.block.clear();
        }
        Ok(())
    }

    /// Get the current code bits
    #[cfg(test)]
    fn code_bits(&self) -> u8 {
        self.code_bits
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// Join sub-blocks into one data buffer
    fn join_sub_blocks(mut blocks: &[u8]) -> Vec<u8> {
        let mut data = vec![];
        while let Some((len, rest)) = blocks.split_first() {
            let len = usize::from(*len);
            assert!(len > 0 && len <= SUB_BLOCK_SZ);
            data.extend_from_slice(&rest[..len]);
            blocks = &rest[len..];
        }
        data
    }

    fn decompress(min_code_size: u8, blocks: &[u8]) -> Vec<u8> {
        let data = join_sub_blocks(blocks);
        let mut dec =
            ::lzw::Decoder::new(::lzw::LsbReader::new(), min_code_size);
        let mut out = vec![];
        let mut buf = &data[..];
        while !buf.is_empty() {
            let (consumed, bytes) = dec.decode_bytes(buf).unwrap();
            if consumed == 0 && bytes.is_empty() {
                break;
            }
            out.extend_from_slice(bytes);
            buf = &buf[consumed..];
        }
        out
    }

    fn compress(min_code_bits: u8, bytes: &[u8]) -> Vec<u8> {
        let mut out = vec![];
        Compressor::new(min_code_bits)
            .compress(bytes, &mut out)
            .unwrap();
        out
    }

    fn noise(len: usize, mask: u8) -> Vec<u8> {
        let mut v = 0xdead_beef_u32;
        (0..len)
            .map(|_| {
                v ^= v << 13;
                v ^= v >> 17;
                v ^= v << 5;
                (v >> 11) as u8 & mask
            })
            .collect()
    }

    #[test]
    fn shift() {
        assert_eq!(HASH_SHIFT, 4);
    }

    #[test]
    fn codes() {
        let c = Compressor::new(8);
        assert_eq!(c.min_code_size(), 8);
        assert_eq!(c.clear_code(), 256);
        assert_eq!(c.end_code(), 257);
        let c = Compressor::new(1);
        assert_eq!(c.min_code_size(), 2);
        assert_eq!(c.clear_code(), 4);
    }

    #[test]
    fn single_pixel() {
        // clear (4), 0, end (5) at 3 bits each
        assert_eq!(compress(2, &[0]), [0x02, 0x44, 0x01]);
    }

    #[test]
    fn empty() {
        // clear (256), end (257) at 9 bits each
        assert_eq!(compress(8, &[]), [0x03, 0x00, 0x03, 0x02]);
    }

    #[test]
    fn round_trip_small() {
        let bytes = [1, 0, 0, 1, 0, 1, 1, 0, 0, 1, 1, 0, 1, 0, 0, 1];
        assert_eq!(decompress(2, &compress(2, &bytes)), bytes);
    }

    #[test]
    fn round_trip_narrow() {
        // several 3-bit codes share each byte
        let bytes = noise(300_000, 0x03);
        assert_eq!(decompress(2, &compress(2, &bytes)), bytes);
        for len in [1, 2, 254, 255, 4095, 4096, 8191] {
            let bytes = noise(len, 0x03);
            assert_eq!(decompress(2, &compress(2, &bytes)), bytes);
        }
    }

    #[test]
    fn round_trip_noise() {
        let bytes = noise(100_000, 0xFF);
        assert_eq!(decompress(8, &compress(8, &bytes)), bytes);
        let bytes = noise(50_000, 0x0F);
        assert_eq!(decompress(8, &compress(8, &bytes)), bytes);
    }

    #[test]
    fn round_trip_runs() {
        let mut bytes = vec![7; 20_000];
        bytes.extend(noise(20_000, 0x03));
        bytes.extend(vec![255; 5_000]);
        assert_eq!(decompress(8, &compress(8, &bytes)), bytes);
    }

    #[test]
    fn sub_blocks() {
        let out = compress(8, &noise(10_000, 0xFF));
        let mut blocks = &out[..];
        let mut lens = vec![];
        while let Some((len, rest)) = blocks.split_first() {
            lens.push(usize::from(*len));
            blocks = &rest[usize::from(*len)..];
        }
        let (last, full) = lens.split_last().unwrap();
        assert!(full.iter().all(|len| *len == SUB_BLOCK_SZ));
        assert!(*last > 0 && *last <= SUB_BLOCK_SZ);
    }

    #[test]
    fn width_limit() {
        let mut c = Compressor::new(8);
        let mut out = vec![];
        c.compress(&noise(200_000, 0xFF), &mut out).unwrap();
        assert!(c.code_bits() <= MAX_BITS);
    }

    #[test]
    fn reusable() {
        let bytes = noise(30_000, 0x3F);
        let mut c = Compressor::new(8);
        let mut a = vec![];
        c.compress(&bytes, &mut a).unwrap();
        let mut b = vec![];
        c.compress(&bytes, &mut b).unwrap();
        assert_eq!(a, b);
    }
}
