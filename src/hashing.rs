//! Hashing System - SHA-256 for Conversion Manifests
//!
//! Identical transcript, art and configuration always hash the same, so a
//! printed document can be traced back to exactly what produced it.

use serde::Serialize;
use serde_json::{to_string, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Canonical JSON: object keys in byte order at every depth, no whitespace.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let mut value = serde_json::to_value(value)?;
    canonicalize(&mut value);
    to_string(&value)
}

fn canonicalize(value: &mut Value) {
    match value {
        Value::Object(map) => {
            let mut entries: BTreeMap<String, Value> = std::mem::take(map).into_iter().collect();
            entries.values_mut().for_each(canonicalize);
            map.extend(entries);
        }
        Value::Array(items) => items.iter_mut().for_each(canonicalize),
        _ => {}
    }
}

/// Hash of a whole converted record
pub fn compute_manifest_hash<T: Serialize>(manifest: &T) -> Result<String, serde_json::Error> {
    let canonical = canonical_json(manifest)?;
    Ok(sha256_hex(canonical.as_bytes()))
}

/// job_hash = sha256(canonical_config : canonical_request : engine_version)
pub fn compute_job_hash(
    config: &impl Serialize,
    request: &impl Serialize,
    engine_version: &str,
) -> Result<String, serde_json::Error> {
    let combined = format!(
        "{}:{}:{}",
        canonical_json(config)?,
        canonical_json(request)?,
        engine_version
    );
    Ok(sha256_hex(combined.as_bytes()))
}
