// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Canonical Hashing
//!
//! Deterministic serialization and hashing of structured data, used to
//! produce the tamper-evident `contract_hash` over a policy's locked terms.
//!
//! Two structurally equal values must produce byte-identical canonical
//! serializations, and therefore identical digests, regardless of the order
//! in which their fields were constructed. Object keys are sorted
//! lexicographically (ASCII) at every nesting level before joining.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Serialize a JSON value into its canonical textual form.
///
/// - `null` serializes as the literal `null`
/// - booleans, numbers, and strings use standard JSON encoding
/// - arrays keep element order: `[e1,e2,...]`
/// - objects sort keys lexicographically: `{"a":1,"b":2}`
pub fn canonical_serialize(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) | Value::Number(_) | Value::String(_) => value.to_string(),
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(canonical_serialize).collect();
            format!("[{}]", inner.join(","))
        }
        Value::Object(map) => {
            // serde_json's default Map preserves insertion order, so sort
            // keys here rather than relying on map iteration order.
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let inner: Vec<String> = keys
                .into_iter()
                .map(|key| {
                    format!(
                        "{}:{}",
                        Value::String(key.clone()),
                        canonical_serialize(&map[key])
                    )
                })
                .collect();
            format!("{{{}}}", inner.join(","))
        }
    }
}

/// Hash a JSON value: SHA-256 over the UTF-8 canonical serialization,
/// rendered as `0x` followed by 64 lowercase hex characters.
pub fn canonical_hash(value: &Value) -> String {
    let canonical = canonical_serialize(value);
    let digest = Sha256::digest(canonical.as_bytes());
    format!("0x{}", hex::encode(digest))
}
