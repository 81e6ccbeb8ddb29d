//! Vector <-> bytes codec for embedding storage.
//!
//! Vectors are stored as row-major little-endian f32. Decoding validates the
//! byte length against the declared dimensionality so a truncated or
//! mismatched blob surfaces as an error instead of a silently wrong vector.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("embedding blob is {actual} bytes, expected {expected} for dim {dim}")]
    LengthMismatch {
        actual: usize,
        expected: usize,
        dim: usize,
    },
}

/// Serialize a vector to raw little-endian f32 bytes.
pub fn vector_to_bytes(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Deserialize raw bytes back into a vector of `dim` f32 values.
///
/// Fails if `bytes.len() != dim * 4`.
pub fn vector_from_bytes(bytes: &[u8], dim: usize) -> Result<Vec<f32>, CodecError> {
    let expected = dim * std::mem::size_of::<f32>();
    if bytes.len() != expected {
        return Err(CodecError::LengthMismatch {
            actual: bytes.len(),
            expected,
            dim,
        });
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| {
            let arr: [u8; 4] = chunk.try_into().expect("chunks_exact guarantees 4 bytes");
            f32::from_le_bytes(arr)
        })
        .collect())
}
