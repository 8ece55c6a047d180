// In: src/config.rs

//! The single source of truth for codec parameterization.
//!
//! This module defines `CodecParams`, the immutable parameter set a caller
//! supplies when constructing a Golomb-Rice coder. The struct is created once
//! at the boundary (by the host serializer, from its container metadata) and
//! then passed by reference through the codec; nothing in this crate mutates
//! it after construction.
//!
//! The divisor is never learned or adapted here: choosing `m` (or the Rice
//! shift `k`) is the caller's job, which keeps every operation in this crate
//! deterministic for a given input.

use serde::{Deserialize, Serialize};

use crate::error::TesseraError;

//==================================================================================
// I. Core Configuration Enums & Structs
//==================================================================================

/// Selects the integer code used for single values and token streams.
///
/// Only `GolombRice` is implemented. `ExponentialGolomb` is declared so that
/// host metadata naming it can be deserialized and rejected with a clear
/// error instead of a parse failure; every operation receiving it returns
/// [`TesseraError::UnsupportedAlgorithm`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CodingAlgorithm {
    /// **Default:** quotient/remainder coding with a unary quotient and a
    /// truncated-binary remainder; collapses to Rice coding (fixed-width
    /// remainder) when the divisor is a power of two.
    #[default]
    GolombRice,

    /// Declared but intentionally unimplemented. Selecting it is an
    /// explicit "unsupported algorithm" failure, never a silent fallback.
    ExponentialGolomb,
}

/// The immutable parameter set for one codec instance.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct CodecParams {
    /// The coding algorithm tag.
    #[serde(default)]
    pub algorithm: CodingAlgorithm,

    /// The Golomb divisor `m`. Must be at least 1; a power of two selects
    /// the Rice special case.
    #[serde(default = "default_divisor")]
    pub divisor: u64,
}

impl Default for CodecParams {
    fn default() -> Self {
        Self {
            algorithm: CodingAlgorithm::default(),
            divisor: default_divisor(),
        }
    }
}

/// Helper for `serde` to provide a default divisor (Rice with `k = 4`).
fn default_divisor() -> u64 {
    16
}

//==================================================================================
// II. Constructors, Validation & Persistence
//==================================================================================

impl CodecParams {
    /// Golomb-Rice parameters with an arbitrary divisor `m`.
    pub fn golomb(divisor: u64) -> Self {
        Self {
            algorithm: CodingAlgorithm::GolombRice,
            divisor,
        }
    }

    /// Rice parameters from a shift: `m = 2^shift`.
    ///
    /// Fails with [`TesseraError::InvalidDivisor`] if the shift does not fit
    /// the 64-bit divisor (`shift >= 64`).
    pub fn rice(shift: usize) -> Result<Self, TesseraError> {
        if shift >= 64 {
            return Err(TesseraError::InvalidDivisor(format!(
                "Rice shift {} overflows the 64-bit divisor",
                shift
            )));
        }
        Ok(Self::golomb(1u64 << shift))
    }

    /// Checks that these parameters describe an operation this crate can
    /// actually perform. Every encode/decode entry point calls this first,
    /// so a bad parameter fails at the call that receives it.
    pub fn validate(&self) -> Result<(), TesseraError> {
        match self.algorithm {
            CodingAlgorithm::GolombRice => {}
            CodingAlgorithm::ExponentialGolomb => {
                return Err(TesseraError::UnsupportedAlgorithm(
                    "exponential_golomb is declared but not implemented".to_string(),
                ));
            }
        }
        if self.divisor == 0 {
            return Err(TesseraError::InvalidDivisor(
                "the divisor must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// True when the divisor selects the Rice special case.
    pub fn is_rice(&self) -> bool {
        self.divisor.is_power_of_two()
    }

    /// Serializes the parameters to a JSON string for host container
    /// metadata.
    pub fn to_json(&self) -> Result<String, TesseraError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Reconstructs parameters from host container metadata. The result is
    /// not validated here; callers hit `validate()` on first use.
    pub fn from_json(json: &str) -> Result<Self, TesseraError> {
        Ok(serde_json::from_str(json)?)
    }
}

//==================================================================================
// III. Unit Tests
//==================================================================================
