//! This module contains the Rice-Runs sequence codec: the run-grouping
//! layer and the end-to-end pipeline that composes it with the `delta` and
//! `golomb` kernels.
//!
//! Every token on the wire is one Golomb-Rice codeword. Data magnitudes are
//! always 2 or more (guaranteed by the delta remap), which frees the two
//! smallest codewords for structure:
//!
//! ```text
//! 0  NEGATIVE_FLAG    the next magnitude is negative
//! 1  REPETITION_FLAG  a group follows: [0?][magnitude][count]
//! ```
//!
//! A difference repeated fewer than `RLE_THRESHOLD` times is written as
//! literals, `[0?][magnitude]` per repetition; at the threshold and above
//! it collapses to one group carrying the repetition count.

use num_traits::{PrimInt, ToPrimitive, Unsigned};

use crate::bitbuf::BitBuffer;
use crate::config::CodecParams;
use crate::error::TesseraError;
use crate::kernels::delta;
use crate::kernels::golomb::GrStream;
use crate::log_metric;

/// Marker codeword: the magnitude that follows is negative.
pub const NEGATIVE_FLAG: u64 = 0;
/// Marker codeword: a `[0?][magnitude][count]` group follows.
pub const REPETITION_FLAG: u64 = 1;
/// Minimum run length worth collapsing into a group. Below this, literals
/// are never longer than the grouped form.
pub const RLE_THRESHOLD: u64 = 3;

//==================================================================================
// 1. Run Encoder
//==================================================================================

/// Accumulates transformed differences, collapsing runs of equal values
/// into repetition groups on an owned [`GrStream`].
#[derive(Debug)]
pub struct RunEncoder {
    stream: GrStream,
    /// The open run: the last token seen and how many times in a row.
    current: Option<(i64, u64)>,
}

impl RunEncoder {
    pub fn new(params: CodecParams) -> Result<Self, TesseraError> {
        Ok(Self {
            stream: GrStream::new(params)?,
            current: None,
        })
    }

    /// Feeds one transformed difference. Equal consecutive tokens extend
    /// the open run; a different token flushes it first.
    pub fn push(&mut self, token: i64) -> Result<(), TesseraError> {
        match &mut self.current {
            Some((value, count)) if *value == token => {
                *count += 1;
            }
            _ => {
                if let Some((value, count)) = self.current.take() {
                    self.write_run(value, count)?;
                }
                self.current = Some((token, 1));
            }
        }
        Ok(())
    }

    /// Flushes the open run and hands back the underlying stream.
    pub fn finish(mut self) -> Result<GrStream, TesseraError> {
        if let Some((value, count)) = self.current.take() {
            self.write_run(value, count)?;
        }
        Ok(self.stream)
    }

    fn write_run(&mut self, token: i64, count: u64) -> Result<(), TesseraError> {
        let magnitude = token.unsigned_abs();
        if magnitude < 2 {
            // The delta remap guarantees this never happens for pipeline
            // input; seeing it means a caller bypassed the remap.
            return Err(TesseraError::InternalError(format!(
                "token {} inside the reserved band reached the run writer",
                token
            )));
        }
        let negative = token < 0;
        log::trace!("run flush: token {} x{}", token, count);

        if count >= RLE_THRESHOLD {
            self.stream.append(REPETITION_FLAG)?;
            if negative {
                self.stream.append(NEGATIVE_FLAG)?;
            }
            self.stream.append(magnitude)?;
            self.stream.append(count)?;
        } else {
            for _ in 0..count {
                if negative {
                    self.stream.append(NEGATIVE_FLAG)?;
                }
                self.stream.append(magnitude)?;
            }
        }
        Ok(())
    }
}

//==================================================================================
// 2. Run Decoder
//==================================================================================

/// Replays a [`GrStream`] one run at a time, re-expanding repetition
/// groups.
#[derive(Debug)]
pub struct RunDecoder {
    stream: GrStream,
}

impl RunDecoder {
    pub fn new(stream: GrStream) -> Self {
        Self { stream }
    }

    /// The next `(token, count)` run, or `None` once the stream is fully
    /// consumed. Structural damage (a group cut short, a magnitude that
    /// collides with the markers, a count below 2) is fatal.
    pub fn next_run(&mut self) -> Result<Option<(i64, u64)>, TesseraError> {
        if !self.stream.has_more() {
            return Ok(None);
        }
        let lead = self.stream.next()?;
        match lead {
            REPETITION_FLAG => {
                let second = self.expect_token("repetition group body")?;
                let (negative, magnitude) = if second == NEGATIVE_FLAG {
                    (true, self.expect_token("negative group magnitude")?)
                } else {
                    (false, second)
                };
                let token = Self::data_token(negative, magnitude)?;
                let count = self.expect_token("repetition count")?;
                if count < 2 {
                    return Err(TesseraError::RunDecodeError(format!(
                        "repetition group with a count of {}",
                        count
                    )));
                }
                Ok(Some((token, count)))
            }
            NEGATIVE_FLAG => {
                let magnitude = self.expect_token("negative literal magnitude")?;
                Ok(Some((Self::data_token(true, magnitude)?, 1)))
            }
            magnitude => Ok(Some((Self::data_token(false, magnitude)?, 1))),
        }
    }

    fn expect_token(&mut self, context: &str) -> Result<u64, TesseraError> {
        if !self.stream.has_more() {
            return Err(TesseraError::TruncatedStream(format!(
                "stream ended before the {}",
                context
            )));
        }
        self.stream.next()
    }

    /// Applies the sign flag to a raw magnitude, rejecting magnitudes that
    /// a well-formed encoder cannot have placed in a data position.
    fn data_token(negative: bool, magnitude: u64) -> Result<i64, TesseraError> {
        if magnitude < 2 {
            return Err(TesseraError::RunDecodeError(format!(
                "magnitude {} in a data position collides with the reserved markers",
                magnitude
            )));
        }
        if negative {
            if magnitude > i64::MIN.unsigned_abs() {
                return Err(TesseraError::ValueOverflow(format!("-{}", magnitude)));
            }
            Ok(magnitude.wrapping_neg() as i64)
        } else {
            i64::try_from(magnitude)
                .map_err(|_| TesseraError::ValueOverflow(magnitude.to_string()))
        }
    }
}

//==================================================================================
// 3. Pipeline Entry Points
//==================================================================================

/// Compresses an unsigned sequence into one Rice-Runs bit stream using
/// the Rice divisor `2^shift`.
pub fn encode<T>(values: &[T], shift: usize) -> Result<BitBuffer, TesseraError>
where
    T: PrimInt + Unsigned + ToPrimitive,
{
    let params = CodecParams::rice(shift)?;
    let tokens = delta::to_relative(values)?;

    let mut encoder = RunEncoder::new(params)?;
    for &token in &tokens {
        encoder.push(token)?;
    }
    let bits = encoder.finish()?.into_bits();

    log::debug!(
        "rice_runs: encoded {} values into {} wire bits (shift {})",
        values.len(),
        bits.len(),
        shift
    );
    log_metric!(
        "event" = "rice_runs_encode",
        "num_values" = values.len(),
        "input_bits" = values.len() * std::mem::size_of::<T>() * 8,
        "wire_bits" = bits.len(),
    );
    Ok(bits)
}

/// Decompresses a Rice-Runs bit stream produced by [`encode`] with the
/// same `shift`. The stream is consumed to exhaustion; any structural
/// damage aborts the whole decode.
pub fn decode<T>(bits: &BitBuffer, shift: usize) -> Result<Vec<T>, TesseraError>
where
    T: PrimInt + Unsigned + TryFrom<u64>,
    <T as TryFrom<u64>>::Error: std::fmt::Debug,
{
    let params = CodecParams::rice(shift)?;
    let stream = GrStream::from_bits(bits.clone(), params)?;
    let mut decoder = RunDecoder::new(stream);

    let mut tokens: Vec<i64> = Vec::new();
    while let Some((token, count)) = decoder.next_run()? {
        let count = usize::try_from(count).map_err(|_| {
            TesseraError::RunDecodeError(format!(
                "repetition count {} exceeds the addressable length",
                count
            ))
        })?;
        tokens.extend(std::iter::repeat(token).take(count));
    }

    let values = delta::from_relative(&tokens)?;
    log::debug!(
        "rice_runs: decoded {} wire bits into {} values (shift {})",
        bits.len(),
        values.len(),
        shift
    );
    Ok(values)
}

//==================================================================================
// 4. Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Replays every raw codeword on a wire image, ignoring run structure.
    fn raw_tokens(bits: &BitBuffer, shift: usize) -> Vec<u64> {
        let params = CodecParams::rice(shift).unwrap();
        let mut stream = GrStream::from_bits(bits.clone(), params).unwrap();
        let mut out = Vec::new();
        while stream.has_more() {
            out.push(stream.next().unwrap());
        }
        out
    }

    fn tokens_to_bits(tokens: &[u64], shift: usize) -> BitBuffer {
        let params = CodecParams::rice(shift).unwrap();
        let mut stream = GrStream::new(params).unwrap();
        for &token in tokens {
            stream.append(token).unwrap();
        }
        stream.into_bits()
    }

    #[test]
    fn test_run_of_two_stays_literal() {
        let params = CodecParams::rice(2).unwrap();
        let mut encoder = RunEncoder::new(params).unwrap();
        encoder.push(4).unwrap();
        encoder.push(4).unwrap();
        let bits = encoder.finish().unwrap().into_bits();
        assert_eq!(raw_tokens(&bits, 2), vec![4, 4]);
    }

    #[test]
    fn test_run_of_three_becomes_a_group() {
        let params = CodecParams::rice(2).unwrap();
        let mut encoder = RunEncoder::new(params).unwrap();
        for _ in 0..3 {
            encoder.push(4).unwrap();
        }
        let bits = encoder.finish().unwrap().into_bits();
        assert_eq!(raw_tokens(&bits, 2), vec![REPETITION_FLAG, 4, 3]);
    }

    #[test]
    fn test_negative_runs_carry_the_sign_marker() {
        let params = CodecParams::rice(2).unwrap();

        let mut encoder = RunEncoder::new(params).unwrap();
        encoder.push(-5).unwrap();
        let bits = encoder.finish().unwrap().into_bits();
        assert_eq!(raw_tokens(&bits, 2), vec![NEGATIVE_FLAG, 5]);

        let mut encoder = RunEncoder::new(params).unwrap();
        for _ in 0..4 {
            encoder.push(-5).unwrap();
        }
        let bits = encoder.finish().unwrap().into_bits();
        assert_eq!(
            raw_tokens(&bits, 2),
            vec![REPETITION_FLAG, NEGATIVE_FLAG, 5, 4]
        );
    }

    #[test]
    fn test_reserved_band_token_is_an_internal_error() {
        let params = CodecParams::rice(2).unwrap();
        let mut encoder = RunEncoder::new(params).unwrap();
        encoder.push(1).unwrap();
        assert!(matches!(
            encoder.finish(),
            Err(TesseraError::InternalError(_))
        ));
    }

    #[test]
    fn test_decoder_reexpands_groups() {
        let params = CodecParams::rice(2).unwrap();
        let mut encoder = RunEncoder::new(params).unwrap();
        for token in [7i64, -3, -3, -3, -3, 7, 2, 2, 2] {
            encoder.push(token).unwrap();
        }
        let mut decoder = RunDecoder::new(encoder.finish().unwrap());
        let mut runs = Vec::new();
        while let Some(run) = decoder.next_run().unwrap() {
            runs.push(run);
        }
        assert_eq!(runs, vec![(7, 1), (-3, 4), (7, 1), (2, 3)]);
    }

    #[test]
    fn test_pipeline_worked_sequence() {
        // Differences: 1, 2, 0, 3, -1, -5, 0, 5 remapped to
        // 3, 4, 2, 5, -3, -7, 2, 7. No run reaches the threshold, so the
        // wire is all literals with sign markers before the negatives.
        let values: Vec<u32> = vec![1, 3, 3, 6, 5, 0, 0, 5];
        let bits = encode(&values, 2).unwrap();
        assert_eq!(
            raw_tokens(&bits, 2),
            vec![3, 4, 2, 5, NEGATIVE_FLAG, 3, NEGATIVE_FLAG, 7, 2, 7]
        );
        let back: Vec<u32> = decode(&bits, 2).unwrap();
        assert_eq!(back, values);
    }

    #[test]
    fn test_pipeline_ascending_run() {
        // 0..=9 differences are a single 1-run: one literal for the first
        // element, then one group of nine.
        let values: Vec<u32> = (0..=9).collect();
        let bits = encode(&values, 2).unwrap();
        assert_eq!(raw_tokens(&bits, 2), vec![2, REPETITION_FLAG, 3, 9]);
        let back: Vec<u32> = decode(&bits, 2).unwrap();
        assert_eq!(back, values);
    }

    #[test]
    fn test_pipeline_descending_run() {
        let values: Vec<u32> = (0..=9).rev().collect();
        let bits = encode(&values, 2).unwrap();
        assert_eq!(
            raw_tokens(&bits, 2),
            vec![11, REPETITION_FLAG, NEGATIVE_FLAG, 3, 9]
        );
        let back: Vec<u32> = decode(&bits, 2).unwrap();
        assert_eq!(back, values);
    }

    #[test]
    fn test_pipeline_constant_run_compresses() {
        let values = vec![7u32; 1000];
        let bits = encode(&values, 2).unwrap();
        // One literal for the leading 7, then a single group for the 999
        // zero-differences.
        assert_eq!(raw_tokens(&bits, 2), vec![9, REPETITION_FLAG, 2, 999]);
        assert!(bits.len() < values.len() * 32 / 100);
        let back: Vec<u32> = decode(&bits, 2).unwrap();
        assert_eq!(back, values);
    }

    #[test]
    fn test_pipeline_empty_input() {
        let values: Vec<u32> = Vec::new();
        let bits = encode(&values, 2).unwrap();
        assert!(bits.is_empty());
        let back: Vec<u32> = decode(&bits, 2).unwrap();
        assert!(back.is_empty());
    }

    #[test]
    fn test_pipeline_unary_divisor() {
        // shift 0 degenerates every codeword to pure unary and must still
        // roundtrip, negative differences included.
        let values: Vec<u8> = vec![0, 1, 3, 3, 3, 3, 1];
        let bits = encode(&values, 0).unwrap();
        let back: Vec<u8> = decode(&bits, 0).unwrap();
        assert_eq!(back, values);
    }

    #[test]
    fn test_pipeline_distinct_steps_stay_literal() {
        let values: Vec<u64> = vec![10, 25, 31, 4];
        let bits = encode(&values, 3).unwrap();
        let back: Vec<u64> = decode(&bits, 3).unwrap();
        assert_eq!(back, values);
    }

    #[test]
    fn test_decode_rejects_marker_magnitude_in_group() {
        // [1][1]: a group whose magnitude collides with REPETITION_FLAG.
        let bits = tokens_to_bits(&[REPETITION_FLAG, 1], 2);
        let result: Result<Vec<u32>, _> = decode(&bits, 2);
        assert!(matches!(result, Err(TesseraError::RunDecodeError(_))));
    }

    #[test]
    fn test_decode_rejects_truncated_group() {
        let bits = tokens_to_bits(&[REPETITION_FLAG], 2);
        let result: Result<Vec<u32>, _> = decode(&bits, 2);
        assert!(matches!(result, Err(TesseraError::TruncatedStream(_))));

        let bits = tokens_to_bits(&[REPETITION_FLAG, NEGATIVE_FLAG, 5], 2);
        let result: Result<Vec<u32>, _> = decode(&bits, 2);
        assert!(matches!(result, Err(TesseraError::TruncatedStream(_))));
    }

    #[test]
    fn test_decode_rejects_dangling_sign_marker() {
        let bits = tokens_to_bits(&[NEGATIVE_FLAG], 2);
        let result: Result<Vec<u32>, _> = decode(&bits, 2);
        assert!(matches!(result, Err(TesseraError::TruncatedStream(_))));
    }

    #[test]
    fn test_decode_rejects_degenerate_counts() {
        for count in [0u64, 1] {
            let bits = tokens_to_bits(&[REPETITION_FLAG, 4, count], 2);
            let result: Result<Vec<u32>, _> = decode(&bits, 2);
            assert!(matches!(result, Err(TesseraError::RunDecodeError(_))));
        }
    }

    #[test]
    fn test_decode_accepts_subthreshold_count_group() {
        // An encoder never emits a count below the threshold, but the
        // grouped form is still well defined and decodes.
        let bits = tokens_to_bits(&[REPETITION_FLAG, 4, 2], 2);
        let back: Vec<u32> = decode(&bits, 2).unwrap();
        // Two tokens of 4 recover to two differences of 2.
        assert_eq!(back, vec![2, 4]);
    }
}
