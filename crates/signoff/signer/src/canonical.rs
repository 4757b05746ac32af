//! Canonical JSON serialization of a record set.
//!
//! The output is a deterministic function of the set of live records and the
//! timestamp:
//! - tombstones are skipped,
//! - records are sorted by id,
//! - object keys are sorted, no insignificant whitespace is emitted,
//! - integral floats are written as integers, other numbers use the shortest
//!   round-trip representation.

use serde_json::Value;
use signoff_types::{Record, Timestamp};

/// Domain separator prepended to the canonical payload before signing
pub const SIGNATURE_PREFIX: &[u8] = b"Content-Signature:\x00";

/// Canonical JSON document `{"data": [...], "last_modified": "<ts>"}`
pub fn canonical_value(records: &[Record], timestamp: Timestamp) -> Value {
    let mut live: Vec<&Record> = records.iter().filter(|r| !r.is_tombstone()).collect();
    live.sort_by(|a, b| a.id.cmp(&b.id));

    serde_json::json!({
        "data": live.iter().map(|r| r.to_value()).collect::<Vec<_>>(),
        "last_modified": timestamp.to_string(),
    })
}

/// Canonical byte serialization of `records` at `timestamp`
pub fn canonical_json(records: &[Record], timestamp: Timestamp) -> Vec<u8> {
    let mut out = String::new();
    write_canonical(&canonical_value(records, timestamp), &mut out);
    out.into_bytes()
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => write_number(n, out),
        Value::String(s) => write_string(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(key, out);
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
    }
}

fn write_number(n: &serde_json::Number, out: &mut String) {
    if let Some(i) = n.as_i64() {
        out.push_str(&i.to_string());
    } else if let Some(u) = n.as_u64() {
        out.push_str(&u.to_string());
    } else if let Some(f) = n.as_f64() {
        // 2^53: beyond it integral floats lose precision anyway
        if f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0 {
            out.push_str(&(f as i64).to_string());
        } else {
            out.push_str(&n.to_string());
        }
    }
}

fn write_string(s: &str, out: &mut String) {
    // serde_json escapes quotes, backslashes and control characters only.
    match serde_json::to_string(s) {
        Ok(escaped) => out.push_str(&escaped),
        Err(_) => {
            out.push('"');
            out.push_str(s);
            out.push('"');
        }
    }
}
