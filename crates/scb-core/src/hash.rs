//! Content hashes of serializable values.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::errors::BenchError;
use crate::serde::to_canonical_json_bytes;

/// SHA-256 of the canonical JSON encoding, as lowercase hex.
///
/// Object keys are sorted before hashing, so two equal sweeps hash equally
/// whatever order their plans listed fields in.
pub fn stable_hash_string<T: Serialize>(value: &T) -> Result<String, BenchError> {
    let mut hasher = Sha256::new();
    hasher.update(to_canonical_json_bytes(value)?);
    Ok(hasher
        .finalize()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect())
}
