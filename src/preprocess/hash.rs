use serde::Serialize;
use sha2::{Digest, Sha256};

/// Hex sha256 of the JSON encoding of `value`
///
/// Maps are `BTreeMap`s throughout, so the encoding and the hash are stable
/// across passes for identical content.
pub fn config_hash(value: &impl Serialize) -> Result<String, serde_json::Error> {
    let bytes = serde_json::to_vec(value)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}
