// In: src/error.rs

//! This module defines the single, unified error type for the entire tessera
//! codec core. It uses the `thiserror` crate to provide ergonomic,
//! context-aware error handling.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TesseraError {
    // =========================================================================
    // === Invalid-parameter errors (rejected at the call that receives them)
    // =========================================================================
    #[error("Invalid Golomb divisor: {0}")]
    InvalidDivisor(String),

    #[error("Unsupported coding algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Delta out of range: {0}")]
    DeltaOverflow(String),

    // =========================================================================
    // === Malformed/truncated input (fatal, all-or-nothing decode)
    // =========================================================================
    #[error("Golomb codeword decode failed: {0}")]
    CodewordDecodeError(String),

    #[error("Compressed stream ended mid-token: {0}")]
    TruncatedStream(String),

    #[error("Run reconstruction failed: {0}")]
    RunDecodeError(String),

    #[error("Decoded value {0} does not fit the requested output type")]
    ValueOverflow(String),

    #[error("Bit length {0} exceeds the {1} bits available in the byte buffer")]
    BitLengthMismatch(usize, usize),

    // =========================================================================
    // === Internal invariant violations (a bug in this library, not bad input)
    // =========================================================================
    #[error("Internal invariant violation (library bug): {0}")]
    InternalError(String),

    // =========================================================================
    // === External Error Wrappers
    // =========================================================================
    /// An error from the Serde JSON library, raised by the `CodecParams`
    /// persistence helpers.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// An error from a safe byte-casting operation failing.
    #[error("Byte slice casting error: {0}")]
    PodCast(String), // Manual `From` impl below; bytemuck::PodCastError doesn't impl Error
}

// =============================================================================
// === Manual `From` Implementations ===
// =============================================================================

impl From<bytemuck::PodCastError> for TesseraError {
    fn from(err: bytemuck::PodCastError) -> Self {
        TesseraError::PodCast(err.to_string())
    }
}
