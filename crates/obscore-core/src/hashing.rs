// crates/obscore-core/src/hashing.rs
// ============================================================================
// Module: Canonical Hasher
// Description: RFC 8785 JSON canonicalization and SHA-256 content hashing.
// Purpose: Give every agent a deterministic `inputs_hash` for its DecisionEvent,
//          independent of field order, process, or language.
// Dependencies: serde, serde_jcs, sha2
// ============================================================================

//! ## Overview
//! Every analyzed request is hashed under RFC 8785 (JCS) canonical JSON
//! before SHA-256 is applied, so object key order never affects the digest.
//! A configurable set of top-level field names may be excluded before
//! canonicalization (defaulting to `metadata`, `attributes`, `events`) so the
//! hash reflects substantive content rather than caller-supplied context.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

/// Supported hash algorithms. SHA-256 is the only member today; the type
/// exists so a future algorithm can be added without breaking the wire shape
/// of [`HashDigest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// SHA-256 hashing.
    Sha256,
}

/// Default hash algorithm.
pub const DEFAULT_HASH_ALGORITHM: HashAlgorithm = HashAlgorithm::Sha256;

/// The top-level fields excluded from canonicalization by default.
pub const DEFAULT_EXCLUSIONS: &[&str] = &["metadata", "attributes", "events"];

/// A deterministic content hash: 64 lowercase hex characters for SHA-256.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashDigest {
    /// Hash algorithm identifier.
    pub algorithm: HashAlgorithm,
    /// Lowercase hex-encoded digest bytes.
    pub value: String,
}

impl HashDigest {
    /// Creates a digest from raw bytes.
    #[must_use]
    pub fn new(algorithm: HashAlgorithm, bytes: &[u8]) -> Self {
        Self {
            algorithm,
            value: hex_encode(bytes),
        }
    }
}

/// Errors raised while computing canonical hashes.
#[derive(Debug, Error)]
pub enum HashError {
    /// JSON canonicalization or serialization failed.
    #[error("failed to canonicalize json: {0}")]
    Canonicalization(String),
}

/// Returns canonical JSON bytes for a serializable value, per RFC 8785, with
/// no field exclusions applied.
///
/// # Errors
/// Returns [`HashError::Canonicalization`] when serialization fails.
pub fn canonical_json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, HashError> {
    serde_jcs::to_vec(value).map_err(|err| HashError::Canonicalization(err.to_string()))
}

/// Removes the named top-level object fields from `value` before
/// canonicalization. No-op if `value` is not a JSON object.
fn apply_exclusions(value: &Value, exclusions: &[&str]) -> Value {
    match value {
        Value::Object(map) => {
            let mut filtered = map.clone();
            for field in exclusions {
                filtered.remove(*field);
            }
            Value::Object(filtered)
        }
        other => other.clone(),
    }
}

/// Hashes `value` under the default algorithm, excluding
/// [`DEFAULT_EXCLUSIONS`] from a top-level object before canonicalization.
///
/// # Errors
/// Returns [`HashError::Canonicalization`] when serialization fails.
pub fn hash(value: &Value) -> Result<HashDigest, HashError> {
    hash_with_exclusions(value, DEFAULT_EXCLUSIONS)
}

/// Hashes `value` under the default algorithm, excluding the named top-level
/// fields before canonicalization.
///
/// # Errors
/// Returns [`HashError::Canonicalization`] when serialization fails.
pub fn hash_with_exclusions(value: &Value, exclusions: &[&str]) -> Result<HashDigest, HashError> {
    let filtered = apply_exclusions(value, exclusions);
    hash_canonical_json(DEFAULT_HASH_ALGORITHM, &filtered)
}

/// Hashes a sequence of values individually, then hashes the concatenation
/// of their hex digests in order. Order is significant: `hash_many([a, b])`
/// differs from `hash_many([b, a])` whenever `a != b`.
///
/// # Errors
/// Returns [`HashError::Canonicalization`] if any element fails to hash.
pub fn hash_many(values: &[Value], exclusions: &[&str]) -> Result<HashDigest, HashError> {
    let mut concatenated = String::new();
    for value in values {
        concatenated.push_str(&hash_with_exclusions(value, exclusions)?.value);
    }
    Ok(hash_bytes(DEFAULT_HASH_ALGORITHM, concatenated.as_bytes()))
}

/// Hashes canonical JSON using the provided algorithm.
///
/// # Errors
/// Returns [`HashError::Canonicalization`] when serialization fails.
pub fn hash_canonical_json<T: Serialize + ?Sized>(
    algorithm: HashAlgorithm,
    value: &T,
) -> Result<HashDigest, HashError> {
    let bytes = canonical_json_bytes(value)?;
    Ok(hash_bytes(algorithm, &bytes))
}

/// Hashes raw bytes using the provided algorithm.
#[must_use]
pub fn hash_bytes(algorithm: HashAlgorithm, bytes: &[u8]) -> HashDigest {
    match algorithm {
        HashAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            hasher.update(bytes);
            let digest = hasher.finalize();
            HashDigest::new(HashAlgorithm::Sha256, &digest)
        }
    }
}

/// Encodes bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}

#[cfg(test)]
mod tests {
    //! Test-only lint relaxations for panic-based assertions and debug output.
    #![allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::use_debug,
        clippy::dbg_macro,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
        reason = "Test-only output and panic-based assertions are permitted."
    )]

    use serde_json::json;

    use super::hash;
    use super::hash_many;

    #[test]
    fn digest_is_64_lowercase_hex_chars() {
        let digest = hash(&json!({"a": 1})).expect("hashes");
        assert_eq!(digest.value.len(), 64);
        assert!(digest.value.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));
    }

    #[test]
    fn key_order_does_not_affect_hash() {
        let a = hash(&json!({"span_id": "s1", "provider": "openai"})).expect("hashes");
        let b = hash(&json!({"provider": "openai", "span_id": "s1"})).expect("hashes");
        assert_eq!(a, b);
    }

    #[test]
    fn array_order_does_affect_hash() {
        let a = hash(&json!({"events": [], "tags": ["x", "y"]})).expect("hashes");
        let b = hash(&json!({"events": [], "tags": ["y", "x"]})).expect("hashes");
        assert_ne!(a, b);
    }

    #[test]
    fn differing_span_id_changes_hash() {
        let a = hash(&json!({"span_id": "s1"})).expect("hashes");
        let b = hash(&json!({"span_id": "other"})).expect("hashes");
        assert_ne!(a, b);
    }

    #[test]
    fn excluded_fields_do_not_affect_hash() {
        let a = hash(&json!({"span_id": "s1", "metadata": {"user_id": "u1"}})).expect("hashes");
        let b = hash(&json!({"span_id": "s1", "metadata": {"user_id": "u2"}})).expect("hashes");
        assert_eq!(a, b);
    }

    #[test]
    fn hash_many_is_order_sensitive() {
        let a = json!({"x": 1});
        let b = json!({"x": 2});
        let forward = hash_many(&[a.clone(), b.clone()], &[]).expect("hashes");
        let backward = hash_many(&[b, a], &[]).expect("hashes");
        assert_ne!(forward, backward);
    }
}
