//! This module contains the pure, stateless kernels for Golomb-Rice integer
//! coding, plus the streaming wrapper that accumulates codewords into one
//! [`BitBuffer`].
//!
//! This is the final (entropy) stage of the Rice-Runs pipeline. A codeword
//! for `n` under divisor `m` is, at increasing bit indices:
//!
//! ```text
//! [remainder bits][separator bit = 0][quotient bits = q x '1']
//! remainder width:
//!   Rice (m = 2^k):      exactly k bits, value = r
//!   Golomb (m not 2^k):  floor(log2 m) bits if r < c, else ceil(log2 m)
//!                        bits storing r + c, where c = 2^ceil(log2 m) - m
//! ```
//!
//! with `q = n / m` and `r = n % m`, remainder packed least significant bit
//! first. The codeword is self-delimiting when scanned from the high end:
//! the unary quotient run terminates at the separator zero. This module is
//! PURE RUST and panic-free; malformed codewords surface as errors.

use crate::bitbuf::BitBuffer;
use crate::config::CodecParams;
use crate::error::TesseraError;

//==================================================================================
// 1. Private Core Logic
//==================================================================================

/// `floor(log2(m))` for `m >= 1`.
fn floor_log2(m: u64) -> usize {
    (63 - m.leading_zeros()) as usize
}

/// `ceil(log2(m))` for `m >= 1`.
fn ceil_log2(m: u64) -> usize {
    floor_log2(m) + usize::from(!m.is_power_of_two())
}

/// The truncated-binary threshold `c = 2^hi_width - m`. For `hi_width == 64`
/// the subtraction is performed modulo 2^64, which is exact because
/// `m > 2^63` there.
fn truncation_cutoff(m: u64, hi_width: usize) -> u64 {
    if hi_width == 64 {
        m.wrapping_neg()
    } else {
        (1u64 << hi_width) - m
    }
}

//==================================================================================
// 2. Public API for Single-Value Operations
//==================================================================================

/// Encodes a single unsigned integer into one Golomb-Rice codeword.
///
/// Requires `params.divisor >= 1` and the `GolombRice` algorithm tag;
/// anything else fails at this call (`InvalidDivisor` /
/// `UnsupportedAlgorithm`).
pub fn encode_one(value: u64, params: &CodecParams) -> Result<BitBuffer, TesseraError> {
    params.validate()?;
    let m = params.divisor;
    let quotient = value / m;
    let remainder = value % m;

    let mut codeword = BitBuffer::with_capacity(encoded_len(value, m));
    let hi_width = ceil_log2(m);
    if m.is_power_of_two() {
        codeword.push_packed(remainder, hi_width);
    } else {
        let cutoff = truncation_cutoff(m, hi_width);
        if remainder < cutoff {
            codeword.push_packed(remainder, hi_width - 1);
        } else {
            codeword.push_packed(remainder + cutoff, hi_width);
        }
    }
    codeword.push(false);
    codeword.push_repeated(true, quotient as usize);
    Ok(codeword)
}

/// Decodes a single codeword produced by [`encode_one`] with the same
/// parameters.
///
/// Scans from the high end for the run of one-bits terminated by a zero
/// (the quotient), takes the bits below the separator as the remainder
/// field, and applies the truncated-binary adjustment: a stored remainder
/// `R >= c` decodes as `R - c`. For a Rice divisor `c` is zero and the
/// adjustment vanishes.
pub fn decode_one(codeword: &BitBuffer, params: &CodecParams) -> Result<u64, TesseraError> {
    params.validate()?;
    let m = params.divisor;

    let mut idx = codeword.len();
    let mut quotient: u64 = 0;
    while idx > 0 && codeword.get(idx - 1) {
        quotient += 1;
        idx -= 1;
    }
    if idx == 0 {
        return Err(TesseraError::CodewordDecodeError(
            "no separator zero terminates the quotient run".to_string(),
        ));
    }
    let width = idx - 1;

    let hi_width = ceil_log2(m);
    let lo_width = if m.is_power_of_two() {
        hi_width
    } else {
        hi_width - 1
    };
    if width != lo_width && width != hi_width {
        return Err(TesseraError::CodewordDecodeError(format!(
            "remainder width {} is inconsistent with divisor {}",
            width, m
        )));
    }

    let stored = codeword.get_packed_int(0, width);
    let cutoff = truncation_cutoff(m, hi_width);
    let remainder = if stored >= cutoff {
        stored - cutoff
    } else {
        stored
    };

    m.checked_mul(quotient)
        .and_then(|v| v.checked_add(remainder))
        .ok_or_else(|| {
            TesseraError::CodewordDecodeError("decoded value overflows u64".to_string())
        })
}

/// The length in bits of the codeword [`encode_one`] would produce, without
/// materializing it. `divisor` must be at least 1.
pub fn encoded_len(value: u64, divisor: u64) -> usize {
    debug_assert!(divisor >= 1, "encoded_len requires a positive divisor");
    let quotient = (value / divisor) as usize;
    let remainder = value % divisor;
    let hi_width = ceil_log2(divisor);
    let width = if divisor.is_power_of_two() {
        hi_width
    } else if remainder < truncation_cutoff(divisor, hi_width) {
        hi_width - 1
    } else {
        hi_width
    };
    width + 1 + quotient
}

//==================================================================================
// 3. Streaming Wrapper
//==================================================================================

/// A stateful Golomb-Rice codeword stream over one owned [`BitBuffer`].
///
/// `append` prepends each new codeword at the low indices, shifting the
/// existing contents up; `next` decodes walking downward from the high end.
/// Because the newest codeword always sits at the bottom and the reader
/// starts at the top, codewords are replayed in exactly the order they were
/// appended (FIFO), which is the contract the run codecs depend on.
///
/// Known cost: each `append` is O(current buffer length) because of the
/// shift. That is acceptable for the sequence sizes this codec targets and
/// is inherent to the wire image: with the `[remainder][0][ones]` codeword
/// layout, only the high end of the buffer delimits codewords, so new data
/// must enter at the bottom for replay to stay first-in-first-out.
#[derive(Debug, Clone)]
pub struct GrStream {
    params: CodecParams,
    bits: BitBuffer,
    /// Count of unconsumed bits; the read cursor sits at `remaining - 1`.
    remaining: usize,
}

impl GrStream {
    /// An empty stream for encoding. Parameters are validated here, so a
    /// bad divisor or an unsupported algorithm fails before any append.
    pub fn new(params: CodecParams) -> Result<Self, TesseraError> {
        params.validate()?;
        Ok(Self {
            params,
            bits: BitBuffer::new(),
            remaining: 0,
        })
    }

    /// Wraps an existing wire image for decoding; the cursor starts at the
    /// top.
    pub fn from_bits(bits: BitBuffer, params: CodecParams) -> Result<Self, TesseraError> {
        params.validate()?;
        let remaining = bits.len();
        Ok(Self {
            params,
            bits,
            remaining,
        })
    }

    /// The parameters this stream was constructed with.
    pub fn params(&self) -> &CodecParams {
        &self.params
    }

    /// Total bits accumulated so far (independent of the read cursor).
    pub fn bit_len(&self) -> usize {
        self.bits.len()
    }

    /// Borrows the accumulated wire image.
    pub fn bits(&self) -> &BitBuffer {
        &self.bits
    }

    /// Unwraps the accumulated wire image.
    pub fn into_bits(self) -> BitBuffer {
        self.bits
    }

    /// Encodes `value` and inserts the codeword at the low-index end,
    /// shifting all previously stored codewords to higher indices. O(bit_len).
    pub fn append(&mut self, value: u64) -> Result<(), TesseraError> {
        let codeword = encode_one(value, &self.params)?;
        self.bits.prepend(&codeword);
        self.remaining += codeword.len();
        Ok(())
    }

    /// True while the cursor has codewords left to replay.
    pub fn has_more(&self) -> bool {
        self.remaining > 0
    }

    /// Resets the cursor to the top of the buffer, replaying the stream
    /// from the first appended codeword.
    pub fn restart(&mut self) {
        self.remaining = self.bits.len();
    }

    /// Decodes exactly one codeword at the cursor, moving the cursor down
    /// by that codeword's length.
    ///
    /// For a non-power-of-two divisor the remainder width is not fixed, so
    /// the decoder reads the `floor(log2 m)` bits below the separator as a
    /// most-significant-first prefix: a prefix below the truncated-binary
    /// threshold is already the whole remainder; otherwise the field is one
    /// bit wider and carries `r + c`.
    pub fn next(&mut self) -> Result<u64, TesseraError> {
        if self.remaining == 0 {
            return Err(TesseraError::TruncatedStream(
                "next() called on an exhausted stream".to_string(),
            ));
        }
        let m = self.params.divisor;

        let mut idx = self.remaining;
        let mut quotient: u64 = 0;
        while idx > 0 && self.bits.get(idx - 1) {
            quotient += 1;
            idx -= 1;
        }
        if idx == 0 {
            return Err(TesseraError::TruncatedStream(
                "ran out of bits scanning for the quotient separator".to_string(),
            ));
        }
        idx -= 1; // consume the separator; `idx` now bounds the remainder field

        let hi_width = ceil_log2(m);
        let remainder;
        if m.is_power_of_two() {
            if idx < hi_width {
                return Err(TesseraError::TruncatedStream(format!(
                    "codeword needs {} remainder bits but only {} remain",
                    hi_width, idx
                )));
            }
            idx -= hi_width;
            remainder = self.bits.get_packed_int(idx, hi_width);
        } else {
            let lo_width = hi_width - 1;
            let cutoff = truncation_cutoff(m, hi_width);
            if idx < lo_width {
                return Err(TesseraError::TruncatedStream(format!(
                    "codeword needs {} remainder bits but only {} remain",
                    lo_width, idx
                )));
            }
            // Top lo_width bits of the field, read most significant first.
            let prefix = self.bits.get_packed_int(idx - lo_width, lo_width);
            if prefix < cutoff {
                idx -= lo_width;
                remainder = prefix;
            } else {
                if idx < hi_width {
                    return Err(TesseraError::TruncatedStream(format!(
                        "codeword needs {} remainder bits but only {} remain",
                        hi_width, idx
                    )));
                }
                idx -= hi_width;
                remainder = self.bits.get_packed_int(idx, hi_width) - cutoff;
            }
        }

        let value = m
            .checked_mul(quotient)
            .and_then(|v| v.checked_add(remainder))
            .ok_or_else(|| {
                TesseraError::CodewordDecodeError("decoded value overflows u64".to_string())
            })?;
        self.remaining = idx;
        Ok(value)
    }
}

//==================================================================================
// 4. Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodingAlgorithm;

    #[test]
    fn test_rice_codeword_layout_m4() {
        // n = 5, m = 4: r = 1 in 2 bits, separator, q = 1.
        let params = CodecParams::rice(2).unwrap();
        let codeword = encode_one(5, &params).unwrap();
        assert_eq!(codeword.len(), 4);
        let bits: Vec<bool> = (0..4).map(|i| codeword.get(i)).collect();
        assert_eq!(bits, vec![true, false, false, true]);
        assert_eq!(decode_one(&codeword, &params).unwrap(), 5);
    }

    #[test]
    fn test_unary_degenerate_case_m1() {
        // m = 1 is 2^0: zero remainder bits, the codeword is pure unary.
        let params = CodecParams::golomb(1);
        let codeword = encode_one(3, &params).unwrap();
        assert_eq!(codeword.len(), 4);
        assert!(!codeword.get(0));
        assert!(codeword.get(1) && codeword.get(2) && codeword.get(3));
        assert_eq!(decode_one(&codeword, &params).unwrap(), 3);

        let zero = encode_one(0, &params).unwrap();
        assert_eq!(zero.len(), 1);
        assert_eq!(decode_one(&zero, &params).unwrap(), 0);
    }

    #[test]
    fn test_truncated_binary_split_m5() {
        // m = 5: c = 2^3 - 5 = 3. r < 3 takes 2 bits, r >= 3 takes 3 bits
        // storing r + 3.
        let params = CodecParams::golomb(5);

        // n = 7: q = 1, r = 2 < c.
        let short = encode_one(7, &params).unwrap();
        assert_eq!(short.len(), 2 + 1 + 1);
        assert_eq!(short.get_packed_int(0, 2), 2);
        assert_eq!(decode_one(&short, &params).unwrap(), 7);

        // n = 8: q = 1, r = 3 >= c, stored as 6 in 3 bits.
        let long = encode_one(8, &params).unwrap();
        assert_eq!(long.len(), 3 + 1 + 1);
        assert_eq!(long.get_packed_int(0, 3), 6);
        assert_eq!(decode_one(&long, &params).unwrap(), 8);
    }

    #[test]
    fn test_rice_and_golomb_agree_on_powers_of_two() {
        // At m = 2^k the truncated-binary cutoff is zero, so the general
        // Golomb rule must collapse to the fixed-width Rice layout.
        let params = CodecParams::golomb(8);
        for n in [0u64, 1, 6, 7, 8, 9, 63, 64, 1000] {
            let codeword = encode_one(n, &params).unwrap();
            let q = (n / 8) as usize;
            let r = n % 8;
            assert_eq!(codeword.len(), 3 + 1 + q);
            assert_eq!(codeword.get_packed_int(0, 3), r);
            assert!(!codeword.get(3));
            assert_eq!(decode_one(&codeword, &params).unwrap(), n);
        }
    }

    #[test]
    fn test_encoded_len_matches_encode() {
        for m in [1u64, 2, 3, 4, 5, 7, 8, 13, 64, 100] {
            let params = CodecParams::golomb(m);
            for n in [0u64, 1, 2, 3, 4, 5, 12, 13, 255, 256, 100_000] {
                let codeword = encode_one(n, &params).unwrap();
                assert_eq!(
                    codeword.len(),
                    encoded_len(n, m),
                    "length mismatch for n={} m={}",
                    n,
                    m
                );
            }
        }
    }

    #[test]
    fn test_roundtrip_across_divisors() {
        for m in [1u64, 2, 3, 4, 5, 6, 7, 8, 9, 16, 21, 255, 256, 1000] {
            let params = CodecParams::golomb(m);
            for n in [0u64, 1, 2, 3, 5, 8, 13, 21, 100, 4096, u16::MAX as u64] {
                let codeword = encode_one(n, &params).unwrap();
                assert_eq!(
                    decode_one(&codeword, &params).unwrap(),
                    n,
                    "roundtrip failed for n={} m={}",
                    n,
                    m
                );
            }
        }
    }

    #[test]
    fn test_zero_divisor_is_rejected() {
        let params = CodecParams::golomb(0);
        assert!(matches!(
            encode_one(1, &params),
            Err(TesseraError::InvalidDivisor(_))
        ));
    }

    #[test]
    fn test_exponential_golomb_is_unsupported() {
        let params = CodecParams {
            algorithm: CodingAlgorithm::ExponentialGolomb,
            divisor: 4,
        };
        assert!(matches!(
            encode_one(1, &params),
            Err(TesseraError::UnsupportedAlgorithm(_))
        ));
        assert!(matches!(
            GrStream::new(params),
            Err(TesseraError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn test_decode_without_separator_fails() {
        let params = CodecParams::rice(2).unwrap();
        let mut all_ones = BitBuffer::new();
        all_ones.push_repeated(true, 5);
        assert!(matches!(
            decode_one(&all_ones, &params),
            Err(TesseraError::CodewordDecodeError(_))
        ));
        assert!(matches!(
            decode_one(&BitBuffer::new(), &params),
            Err(TesseraError::CodewordDecodeError(_))
        ));
    }

    #[test]
    fn test_decode_inconsistent_width_fails() {
        // A 6-bit codeword with q = 1 leaves a 4-bit remainder field, which
        // no m = 4 codeword can have.
        let params = CodecParams::rice(2).unwrap();
        let mut codeword = BitBuffer::new();
        codeword.push_packed(0b1010, 4);
        codeword.push(false);
        codeword.push(true);
        assert!(matches!(
            decode_one(&codeword, &params),
            Err(TesseraError::CodewordDecodeError(_))
        ));
    }

    #[test]
    fn test_stream_replays_in_append_order() {
        let mut stream = GrStream::new(CodecParams::rice(2).unwrap()).unwrap();
        for value in [5u64, 0, 9, 2, 17] {
            stream.append(value).unwrap();
        }

        let mut replay = Vec::new();
        while stream.has_more() {
            replay.push(stream.next().unwrap());
        }
        assert_eq!(replay, vec![5, 0, 9, 2, 17]);

        stream.restart();
        assert!(stream.has_more());
        assert_eq!(stream.next().unwrap(), 5);
    }

    #[test]
    fn test_stream_roundtrip_with_truncated_binary_divisor() {
        // Values straddling the width split: r < c and r >= c both occur.
        let params = CodecParams::golomb(5);
        let mut stream = GrStream::new(params).unwrap();
        let values = [7u64, 8, 9, 3, 0, 14, 4];
        for &value in &values {
            stream.append(value).unwrap();
        }

        let image = stream.into_bits();
        let mut reader = GrStream::from_bits(image, params).unwrap();
        let mut replay = Vec::new();
        while reader.has_more() {
            replay.push(reader.next().unwrap());
        }
        assert_eq!(replay, values.to_vec());
    }

    #[test]
    fn test_stream_wire_image_is_newest_first() {
        // Append 5 then 3 under m = 4: the codeword for 3 ([1,1,0]) must sit
        // below the codeword for 5 ([1,0,0,1]).
        let mut stream = GrStream::new(CodecParams::rice(2).unwrap()).unwrap();
        stream.append(5).unwrap();
        stream.append(3).unwrap();
        let bits = stream.bits();
        assert_eq!(bits.len(), 7);
        assert_eq!(bits.get_packed_int(0, 3), 0b011);
        assert_eq!(bits.get_packed_int(3, 4), 0b1001);
    }

    #[test]
    fn test_stream_truncated_mid_codeword() {
        let params = CodecParams::rice(2).unwrap();
        let codeword = encode_one(5, &params).unwrap();
        // Keep only the top two bits: the quotient run and separator survive
        // but the remainder field is gone.
        let cut = codeword.sub_range(2, 2);
        let mut reader = GrStream::from_bits(cut, params).unwrap();
        assert!(matches!(
            reader.next(),
            Err(TesseraError::TruncatedStream(_))
        ));
    }

    #[test]
    fn test_next_on_exhausted_stream_is_an_error() {
        let mut stream = GrStream::new(CodecParams::rice(3).unwrap()).unwrap();
        stream.append(1).unwrap();
        stream.next().unwrap();
        assert!(!stream.has_more());
        assert!(matches!(
            stream.next(),
            Err(TesseraError::TruncatedStream(_))
        ));
    }
}
