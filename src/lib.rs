//! # tessera-core
//!
//! The core Rust engine of the tessera matrix-serialization toolkit:
//! Golomb-Rice entropy coding and the Rice-Runs pipeline for compressing
//! signed integer sequences with repetitive structure.
//!
//! The crate is layered:
//!
//! - [`bitbuf::BitBuffer`]: a growable bit vector, the only wire currency.
//! - [`kernels::golomb`]: single-codeword Golomb-Rice coding and the
//!   [`GrStream`] codeword stream.
//! - [`kernels::delta`] and [`kernels::rice_runs`]: the sequence pipeline
//!   (difference remap, run grouping, entropy coding).
//!
//! Most callers only need the stateless entry points below:
//!
//! ```
//! use tessera_codec::{rice_runs_decode, rice_runs_encode};
//!
//! let samples: Vec<u32> = vec![10, 10, 10, 10, 12, 9];
//! let wire = rice_runs_encode(&samples, 2)?;
//! let back: Vec<u32> = rice_runs_decode(&wire, 2)?;
//! assert_eq!(back, samples);
//! # Ok::<(), tessera_codec::TesseraError>(())
//! ```

use num_traits::{PrimInt, ToPrimitive, Unsigned};

pub mod bitbuf;
pub mod config;
pub mod error;
pub mod kernels;
pub mod observability;
pub mod utils;

pub use bitbuf::BitBuffer;
pub use config::{CodecParams, CodingAlgorithm};
pub use error::TesseraError;
pub use kernels::golomb::GrStream;

/// The version of this crate, from the build manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//==================================================================================
// 1. Stateless Convenience API
//==================================================================================

/// Encodes one unsigned integer as a Golomb-Rice codeword under `divisor`.
///
/// Power-of-two divisors take the fixed-width Rice layout; all others take
/// the truncated-binary Golomb layout. Fails on a zero divisor.
pub fn gr_encode(value: u64, divisor: u64) -> Result<BitBuffer, TesseraError> {
    kernels::golomb::encode_one(value, &CodecParams::golomb(divisor))
}

/// Decodes a single codeword produced by [`gr_encode`] with the same
/// `divisor`.
pub fn gr_decode(codeword: &BitBuffer, divisor: u64) -> Result<u64, TesseraError> {
    kernels::golomb::decode_one(codeword, &CodecParams::golomb(divisor))
}

/// Compresses an unsigned sequence with the full Rice-Runs pipeline,
/// using the Rice divisor `2^shift`.
pub fn rice_runs_encode<T>(values: &[T], shift: usize) -> Result<BitBuffer, TesseraError>
where
    T: PrimInt + Unsigned + ToPrimitive,
{
    kernels::rice_runs::encode(values, shift)
}

/// Decompresses a bit stream produced by [`rice_runs_encode`] with the
/// same `shift`. Decoding is all-or-nothing: any structural damage in the
/// stream fails the whole call.
pub fn rice_runs_decode<T>(bits: &BitBuffer, shift: usize) -> Result<Vec<T>, TesseraError>
where
    T: PrimInt + Unsigned + TryFrom<u64>,
    <T as TryFrom<u64>>::Error: std::fmt::Debug,
{
    kernels::rice_runs::decode(bits, shift)
}
