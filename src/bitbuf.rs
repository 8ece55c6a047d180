//! This module contains the growable bit sequence underlying every codec in
//! this crate.
//!
//! A `BitBuffer` is an ordered sequence of bits addressed "low bit index
//! first": bit 0 is the least significant bit of byte 0 of the raw storage,
//! which is exactly the byte image the host's word-oriented serializers read
//! and write. Codewords are assembled by appending at the high end and
//! merged into streams by prepending at the low end; nothing ever shrinks
//! the buffer, logical consumption is tracked by the reader's cursor. This
//! module is PURE RUST, panic-free except for the documented index
//! contracts, and has no dependencies beyond `bitvec`.

use bitvec::prelude::*;

use crate::error::TesseraError;

/// A growable ordered sequence of bits with indexed access, sub-range
/// extraction, and packed-integer read/write.
///
/// Out-of-range access is a programming error, not a runtime condition:
/// the indexed operations panic, mirroring slice indexing. Operations that
/// cross a data boundary owned by the caller (reconstructing a buffer from
/// host bytes) return `Result` instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitBuffer {
    bits: BitVec<u8, Lsb0>,
}

impl BitBuffer {
    /// Creates a new, empty bit buffer.
    pub fn new() -> Self {
        Self { bits: BitVec::new() }
    }

    /// Creates an empty buffer with room for `bits` bits before the first
    /// reallocation.
    pub fn with_capacity(bits: usize) -> Self {
        Self {
            bits: BitVec::with_capacity(bits),
        }
    }

    /// Wraps an existing bit sequence (decode mode).
    pub fn from_bitvec(bits: BitVec<u8, Lsb0>) -> Self {
        Self { bits }
    }

    /// Reconstructs a buffer from the host's byte image plus the exact bit
    /// length it persisted alongside.
    ///
    /// The byte image alone is ambiguous (the last byte may be partial), so
    /// `bit_len` is required. Fails with [`TesseraError::BitLengthMismatch`]
    /// if `bit_len` asks for more bits than `bytes` holds.
    pub fn from_bytes(bytes: &[u8], bit_len: usize) -> Result<Self, TesseraError> {
        let available = bytes.len() * 8;
        if bit_len > available {
            return Err(TesseraError::BitLengthMismatch(bit_len, available));
        }
        let mut bits = BitVec::<u8, Lsb0>::from_slice(bytes);
        bits.truncate(bit_len);
        Ok(Self { bits })
    }

    /// The number of bits stored. After a sequence of codeword appends this
    /// is always the sum of the appended codeword lengths.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// True when no bits are stored.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Reads the bit at `index`.
    ///
    /// # Panics
    /// Panics if `index >= len()`.
    pub fn get(&self, index: usize) -> bool {
        self.bits[index]
    }

    /// Overwrites the bit at `index`.
    ///
    /// # Panics
    /// Panics if `index >= len()`.
    pub fn set(&mut self, index: usize, bit: bool) {
        self.bits.set(index, bit);
    }

    /// Appends one bit at the high end.
    pub fn push(&mut self, bit: bool) {
        self.bits.push(bit);
    }

    /// Appends `count` copies of `bit` at the high end. Used for the unary
    /// quotient of Golomb codewords.
    pub fn push_repeated(&mut self, bit: bool, count: usize) {
        let new_len = self.bits.len() + count;
        self.bits.resize(new_len, bit);
    }

    /// Appends the low `width` bits of `value` at the high end, least
    /// significant bit first.
    ///
    /// # Panics
    /// Panics if `width > 64` or if `value` has significant bits above
    /// `width`.
    pub fn push_packed(&mut self, value: u64, width: usize) {
        assert!(width <= 64, "packed width {} exceeds 64 bits", width);
        debug_assert!(
            width == 64 || value >> width == 0,
            "value {} does not fit in {} bits",
            value,
            width
        );
        self.bits
            .extend_from_bitslice(&value.view_bits::<Lsb0>()[..width]);
    }

    /// Copies `len` bits starting at `begin` into a fresh buffer.
    ///
    /// # Panics
    /// Panics if `begin + len > len()`.
    pub fn sub_range(&self, begin: usize, len: usize) -> BitBuffer {
        assert!(
            begin + len <= self.bits.len(),
            "sub-range [{}, {}) out of bounds for {} bits",
            begin,
            begin + len,
            self.bits.len()
        );
        let mut out = BitVec::with_capacity(len);
        out.extend_from_bitslice(&self.bits[begin..begin + len]);
        Self { bits: out }
    }

    /// Reads `width` bits starting at `offset` as an unsigned integer,
    /// least significant bit first.
    ///
    /// # Panics
    /// Panics if `width > 64` or `offset + width > len()`.
    pub fn get_packed_int(&self, offset: usize, width: usize) -> u64 {
        assert!(width <= 64, "packed width {} exceeds 64 bits", width);
        assert!(
            offset + width <= self.bits.len(),
            "packed read [{}, {}) out of bounds for {} bits",
            offset,
            offset + width,
            self.bits.len()
        );
        // Reconstruct the integer bit by bit; the buffer is Lsb0 so bit i of
        // the range is bit i of the value.
        let mut value = 0u64;
        for (i, bit) in self.bits[offset..offset + width].iter().by_vals().enumerate() {
            if bit {
                value |= 1 << i;
            }
        }
        value
    }

    /// Overwrites `width` bits starting at `offset` with the low bits of
    /// `value`, least significant bit first.
    ///
    /// # Panics
    /// Panics if `width > 64` or `offset + width > len()`.
    pub fn set_packed_int(&mut self, offset: usize, value: u64, width: usize) {
        assert!(width <= 64, "packed width {} exceeds 64 bits", width);
        assert!(
            offset + width <= self.bits.len(),
            "packed write [{}, {}) out of bounds for {} bits",
            offset,
            offset + width,
            self.bits.len()
        );
        for (i, bit) in value.view_bits::<Lsb0>()[..width].iter().by_vals().enumerate() {
            self.bits.set(offset + i, bit);
        }
    }

    /// Inserts all of `other` below index 0, shifting the current contents
    /// up by `other.len()`.
    ///
    /// This is the primitive behind `GrStream::append`: the newest codeword
    /// always sits at the low indices so that a top-down reader replays
    /// codewords in append order. Costs O(`len()` + `other.len()`) because
    /// the existing bits are rewritten.
    pub fn prepend(&mut self, other: &BitBuffer) {
        if other.is_empty() {
            return;
        }
        let mut merged = BitVec::with_capacity(other.bits.len() + self.bits.len());
        merged.extend_from_bitslice(&other.bits);
        merged.extend_from_bitslice(&self.bits);
        self.bits = merged;
    }

    /// Borrows the bits as a slice for scanning.
    pub fn as_bits(&self) -> &BitSlice<u8, Lsb0> {
        self.bits.as_bitslice()
    }

    /// The underlying byte image, little-endian bit packing within each
    /// byte. Bits past `len()` in the final byte are padding; the host must
    /// persist `len()` alongside to reconstruct losslessly.
    pub fn as_raw_bytes(&self) -> &[u8] {
        self.bits.as_raw_slice()
    }

    /// Unwraps into the backing bit vector.
    pub fn into_bitvec(self) -> BitVec<u8, Lsb0> {
        self.bits
    }
}

//==================================================================================
// Unit Tests
//==================================================================================
