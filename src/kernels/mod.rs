//! This module is the single home for all pure, stateless compression
//! kernels. Each kernel is a self-contained transformation; the `rice_runs`
//! kernel composes the other two into the full sequence pipeline.
//!
//! The pipeline stages, in encode order:
//!
//! - **Stage 1 (Value Reduction):** `delta` turns a signed sequence into
//!   consecutive differences, remapped away from the reserved band.
//! - **Stage 2 (Run Grouping):** `rice_runs` collapses repeated differences
//!   into `[marker][magnitude][count]` groups.
//! - **Stage 3 (Entropy Coding):** `golomb` packs every token into
//!   variable-length Golomb-Rice codewords on one bit stream.

pub mod delta;
pub mod golomb;
pub mod rice_runs;
