//! Bounded, checksum-able JSON serialization for the debug bridge.
//! `serde_json::Value` trees built from `AtomValue`-bound types can't
//! actually contain reference cycles (they
//! are owned, already-serialized data, not a live object graph), so the
//! "circular reference" guard below and the depth guard are the same
//! mechanism: a hard recursion-depth ceiling that also catches the
//! pathological case of a hand-rolled `Serialize` impl that recurses
//! into itself.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

pub struct SerializerConfig {
    pub max_depth: usize,
    pub max_size_bytes: usize,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        SerializerConfig { max_depth: 16, max_size_bytes: 1_000_000 }
    }
}

const TRUNCATED_DEPTH: &str = "[Truncated: max depth exceeded]";
const TRUNCATED_SIZE: &str = "[Truncated: max size exceeded]";

/// Clamp `value` to `config`'s depth and size limits, replacing anything
/// over the line with a placeholder string rather than failing outright.
pub fn bound(value: &serde_json::Value, config: &SerializerConfig) -> serde_json::Value {
    let mut budget = config.max_size_bytes;
    bound_inner(value, config.max_depth, &mut budget)
}

fn bound_inner(value: &serde_json::Value, depth_remaining: usize, size_budget: &mut usize) -> serde_json::Value {
    if depth_remaining == 0 {
        return serde_json::Value::String(TRUNCATED_DEPTH.to_string());
    }
    let approx_size = value.to_string().len();
    if approx_size > *size_budget {
        return serde_json::Value::String(TRUNCATED_SIZE.to_string());
    }
    match value {
        serde_json::Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                *size_budget = size_budget.saturating_sub(item.to_string().len());
                out.push(bound_inner(item, depth_remaining - 1, size_budget));
            }
            serde_json::Value::Array(out)
        }
        serde_json::Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                *size_budget = size_budget.saturating_sub(v.to_string().len());
                out.insert(k.clone(), bound_inner(v, depth_remaining - 1, size_budget));
            }
            serde_json::Value::Object(out)
        }
        leaf => leaf.clone(),
    }
}

/// A polynomial rolling hash (base 31, matching the familiar Java/Redux
/// `hashCode` family) over the canonical JSON encoding, base64-encoded
/// so it travels as plain text in a devtools `IMPORT_STATE` payload.
/// Truncated to its low 6 bytes (48 bits) before encoding so the result
/// is always exactly 8 base64 characters, not 12.
pub fn checksum(value: &serde_json::Value) -> String {
    let encoded = value.to_string();
    let mut hash: u64 = 0;
    for byte in encoded.bytes() {
        hash = hash.wrapping_mul(31).wrapping_add(byte as u64);
    }
    let bytes = hash.to_be_bytes();
    BASE64.encode(&bytes[2..])
}

pub fn verify_checksum(value: &serde_json::Value, expected: &str) -> bool {
    checksum(value) == expected
}
