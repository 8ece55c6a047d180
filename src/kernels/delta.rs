//! This module contains the value-reduction kernel for the Rice-Runs
//! pipeline: delta encoding composed with a zero-avoiding remap.
//!
//! Sequences are unsigned; their consecutive differences are signed and
//! live in `i64` regardless of the caller's element type. Each difference
//! is shifted away from zero by two:
//!
//! ```text
//! transform(d) = d + 2   (d >= 0)        recover(t) = t - 2   (t >= 2)
//!              = d - 2   (d <  0)                   = t + 2   (t <= -3)
//! ```
//!
//! The band `{-2, -1, 0, 1}` is therefore unreachable, which keeps every
//! transformed magnitude at 2 or above. The run layer reserves magnitudes
//! 0 and 1 as structural markers, so the remap is what lets markers and
//! data share one codeword stream without escaping. The first element of a
//! sequence is taken relative to an implicit 0.
//!
//! Differences that escape the `i64` range and reconstructions that escape
//! the `u64` range are reported, not wrapped.

use num_traits::{PrimInt, ToPrimitive, Unsigned};

use crate::error::TesseraError;

//==================================================================================
// 1. Single-Value Remap
//==================================================================================

/// Shifts a difference out of the reserved band.
pub fn transform(delta: i64) -> Result<i64, TesseraError> {
    let shifted = if delta >= 0 {
        delta.checked_add(2)
    } else {
        delta.checked_sub(2)
    };
    shifted.ok_or_else(|| {
        TesseraError::DeltaOverflow(format!(
            "difference {} cannot be shifted out of the reserved band within i64",
            delta
        ))
    })
}

/// Undoes [`transform`]. Tokens inside the reserved band `{-2, -1, 0, 1}`
/// cannot have been produced by a well-formed encoder and are rejected.
pub fn recover(token: i64) -> Result<i64, TesseraError> {
    if token >= 2 {
        Ok(token - 2)
    } else if token <= -3 {
        Ok(token + 2)
    } else {
        Err(TesseraError::RunDecodeError(format!(
            "transformed difference {} falls in the reserved band",
            token
        )))
    }
}

/// The signed difference `current - prev`, or `None` when it falls outside
/// the `i64` range.
fn checked_diff(current: u64, prev: u64) -> Option<i64> {
    if current >= prev {
        i64::try_from(current - prev).ok()
    } else {
        let magnitude = prev - current;
        (magnitude <= 1u64 << 63).then(|| magnitude.wrapping_neg() as i64)
    }
}

//==================================================================================
// 2. Sequence Transforms
//==================================================================================

/// Maps an unsigned sequence to its transformed consecutive differences.
///
/// The output is empty iff the input is. Differences are computed in
/// `i64`; a difference that does not fit (possible when consecutive values
/// are more than `2^63` apart) fails with `DeltaOverflow`.
pub fn to_relative<T>(values: &[T]) -> Result<Vec<i64>, TesseraError>
where
    T: PrimInt + Unsigned + ToPrimitive,
{
    let mut out = Vec::with_capacity(values.len());
    let mut prev: u64 = 0;
    for value in values {
        let current = value.to_u64().ok_or_else(|| {
            TesseraError::InternalError(
                "unsigned input does not fit the u64 working range".to_string(),
            )
        })?;
        let delta = checked_diff(current, prev).ok_or_else(|| {
            TesseraError::DeltaOverflow(format!(
                "difference {} - {} does not fit i64",
                current, prev
            ))
        })?;
        out.push(transform(delta)?);
        prev = current;
    }
    Ok(out)
}

/// Reconstructs the original sequence from transformed differences.
///
/// Inverse of [`to_relative`]. Fails with `RunDecodeError` on reserved-band
/// tokens and on a running sum that leaves the `u64` value range (a
/// negative difference larger than everything before it, or overflow past
/// `u64::MAX`), and with `ValueOverflow` if a reconstructed value does not
/// fit `T`.
pub fn from_relative<T>(tokens: &[i64]) -> Result<Vec<T>, TesseraError>
where
    T: PrimInt + Unsigned + TryFrom<u64>,
    <T as TryFrom<u64>>::Error: std::fmt::Debug,
{
    let mut out = Vec::with_capacity(tokens.len());
    let mut prev: u64 = 0;
    for &token in tokens {
        let delta = recover(token)?;
        let current = if delta >= 0 {
            prev.checked_add(delta as u64)
        } else {
            prev.checked_sub(delta.unsigned_abs())
        }
        .ok_or_else(|| {
            TesseraError::RunDecodeError(format!(
                "running sum {} {:+} escapes the u64 value range",
                prev, delta
            ))
        })?;
        let narrowed =
            T::try_from(current).map_err(|_| TesseraError::ValueOverflow(current.to_string()))?;
        out.push(narrowed);
        prev = current;
    }
    Ok(out)
}

//==================================================================================
// 3. Unit Tests
//==================================================================================
