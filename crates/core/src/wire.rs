//! Wire values: what the Python worker returns.
//!
//! The worker harness encodes its result as plain JSON plus two tagged
//! object forms: `{"$date": "<iso-8601>"}` for date/datetime values and
//! `{"$opaque": "<type name>"}` for anything it cannot express (dicts,
//! sets, arbitrary objects). [`ScriptValue::from_wire`] decodes that
//! envelope; the outward codec rules then run entirely on this type.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

/// A value as returned by the worker, before outward conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptValue {
    /// Python `None`, or no result at all.
    None,
    /// Python `bool`.
    Bool(bool),
    /// Python `int` or `float`.
    Number(f64),
    /// Python `str`.
    Text(String),
    /// Python `datetime.date` / `datetime.datetime` (tagged on the wire).
    Date(NaiveDateTime),
    /// Python `list`, possibly nested.
    List(Vec<ScriptValue>),
    /// Anything the harness could not express; carries the Python type
    /// name for error messages.
    Opaque(String),
}

impl ScriptValue {
    /// Decode a JSON wire value into a `ScriptValue`.
    pub fn from_wire(value: &serde_json::Value) -> ScriptValue {
        use serde_json::Value;
        match value {
            Value::Null => ScriptValue::None,
            Value::Bool(b) => ScriptValue::Bool(*b),
            Value::Number(n) => match n.as_f64() {
                Some(f) => ScriptValue::Number(f),
                None => ScriptValue::Opaque("number".to_string()),
            },
            Value::String(s) => ScriptValue::Text(s.clone()),
            Value::Array(items) => {
                ScriptValue::List(items.iter().map(ScriptValue::from_wire).collect())
            }
            Value::Object(map) => {
                if let Some(Value::String(iso)) = map.get("$date") {
                    match parse_wire_date(iso) {
                        Some(dt) => ScriptValue::Date(dt),
                        None => ScriptValue::Opaque("datetime".to_string()),
                    }
                } else if let Some(Value::String(name)) = map.get("$opaque") {
                    ScriptValue::Opaque(name.clone())
                } else {
                    ScriptValue::Opaque("object".to_string())
                }
            }
        }
    }
}

/// Parse the ISO-8601 forms `datetime.isoformat()` can produce: a bare
/// date, a naive datetime (with or without fractional seconds), or an
/// offset-aware datetime (normalized to UTC).
fn parse_wire_date(iso: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(iso) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = iso.parse::<NaiveDateTime>() {
        return Some(dt);
    }
    if let Ok(d) = iso.parse::<NaiveDate>() {
        return Some(d.and_time(NaiveTime::MIN));
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
