//! This module provides the shared byte/word conversion helpers the host
//! serializers use to hand integer sequences to this codec.
//!
//! The surrounding toolkit stores matrices as flat word streams; these
//! functions are its only gateway between raw bytes and the typed slices the
//! kernels consume. All `unsafe` reinterpretation is delegated to `bytemuck`,
//! which validates length and alignment before producing a view.

use crate::error::TesseraError;

/// Safely reinterprets a byte slice as a slice of a primitive integer type.
///
/// This is a zero-copy view; the bytes are not duplicated.
///
/// # Errors
/// Returns [`TesseraError::PodCast`] if the slice length is not a multiple
/// of `size_of::<T>()` or the pointer is misaligned for `T`.
pub fn safe_bytes_to_typed_slice<T>(bytes: &[u8]) -> Result<&[T], TesseraError>
where
    T: bytemuck::Pod,
{
    Ok(bytemuck::try_cast_slice(bytes)?)
}

/// Copies a slice of primitive integers into an owned byte vector,
/// respecting the native (little-endian on all supported hosts) byte order.
pub fn typed_slice_to_bytes<T: bytemuck::Pod>(data: &[T]) -> Vec<u8> {
    bytemuck::cast_slice(data).to_vec()
}

//==================================================================================
// Unit Tests
//==================================================================================
