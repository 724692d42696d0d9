//! Response normalisation.
//!
//! RouterOS answers the same kind of query with a bare list, a `{"ret": ...}`
//! wrapper or a scalar depending on the endpoint variant. Everything here
//! degrades to an empty or zero result plus a diagnostic; nothing fails.

use crate::diagnostics::DiagnosticSink;
use serde_json::{Map, Value};

/// One record as returned by the device, field order preserved.
pub type Record = Map<String, Value>;

/// Key some endpoints wrap their payload in.
pub const WRAPPER_KEY: &str = "ret";

const CONTEXT: &str = "normalize";

/// What the caller expects the response to contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect {
    Records,
    Count,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Records(Vec<Record>),
    Count(u64),
    Empty,
}

impl Normalized {
    pub fn into_records(self) -> Vec<Record> {
        match self {
            Normalized::Records(records) => records,
            Normalized::Count(_) | Normalized::Empty => Vec::new(),
        }
    }
}

pub fn normalize(response: Value, expect: Expect, sink: &dyn DiagnosticSink) -> Normalized {
    match expect {
        Expect::Records => normalize_records(response, sink),
        Expect::Count => Normalized::Count(normalize_count(response, sink)),
    }
}

pub fn normalize_records(response: Value, sink: &dyn DiagnosticSink) -> Normalized {
    match response {
        Value::Array(items) => Normalized::Records(collect_records(items, sink)),
        Value::Object(mut map) => match map.remove(WRAPPER_KEY) {
            Some(Value::Array(items)) => Normalized::Records(collect_records(items, sink)),
            Some(other) => {
                sink.warning(
                    CONTEXT,
                    format!(
                        "Unexpected '{}' payload type: {}",
                        WRAPPER_KEY,
                        type_name(&other)
                    ),
                );
                Normalized::Empty
            }
            None => {
                sink.note(
                    CONTEXT,
                    format!("Received dict response: {}", Value::Object(map)),
                );
                Normalized::Empty
            }
        },
        other => {
            sink.warning(
                CONTEXT,
                format!("Unexpected response type: {}", type_name(&other)),
            );
            Normalized::Empty
        }
    }
}

pub fn normalize_count(response: Value, sink: &dyn DiagnosticSink) -> u64 {
    match response {
        Value::String(text) => match text.trim().parse::<u64>() {
            Ok(count) => count,
            Err(_) => {
                sink.warning(
                    CONTEXT,
                    format!("Count-only response is not a valid number: {}", text),
                );
                0
            }
        },
        Value::Number(number) => match number_to_count(&number) {
            Some(count) => count,
            None => {
                sink.warning(
                    CONTEXT,
                    format!("Count-only response is not a valid count: {}", number),
                );
                0
            }
        },
        Value::Object(mut map) if map.contains_key(WRAPPER_KEY) => {
            let inner = map.remove(WRAPPER_KEY).unwrap_or(Value::Null);
            normalize_count(inner, sink)
        }
        other => {
            sink.warning(
                CONTEXT,
                format!("Unexpected count-only response type: {}", type_name(&other)),
            );
            0
        }
    }
}

fn number_to_count(number: &serde_json::Number) -> Option<u64> {
    if let Some(count) = number.as_u64() {
        return Some(count);
    }
    match number.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Some(f as u64),
        _ => None,
    }
}

fn collect_records(items: Vec<Value>, sink: &dyn DiagnosticSink) -> Vec<Record> {
    let total = items.len();
    let records: Vec<Record> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(record) => Some(record),
            _ => None,
        })
        .collect();

    let skipped = total - records.len();
    if skipped > 0 {
        sink.warning(
            CONTEXT,
            format!("Skipped {} non-object entries out of {}", skipped, total),
        );
    }
    records
}

pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}
