// fleur-storefront/src/remote/normalize.rs

//! Helpers for pulling canonical fields out of loosely shaped JSON bodies.

use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// Envelope keys a remote system may nest its payload under.
const ENVELOPES: [&str; 2] = ["data", "result"];

const MAX_BODY_IN_MESSAGE: usize = 200;

/// First non-null value for any of `keys`, looked up at the top level and
/// then one level down inside a `data` or `result` envelope.
pub fn pick<'a>(body: &'a Value, keys: &[&str]) -> Option<&'a Value> {
  find_in(body, keys).or_else(|| {
    ENVELOPES
      .iter()
      .filter_map(|env| body.get(env))
      .find_map(|inner| find_in(inner, keys))
  })
}

fn find_in<'a>(obj: &'a Value, keys: &[&str]) -> Option<&'a Value> {
  keys.iter().filter_map(|k| obj.get(k)).find(|v| !v.is_null())
}

/// Non-empty string or number rendered as a string.
pub fn as_id(value: &Value) -> Option<String> {
  match value {
    Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    _ => None,
  }
}

pub fn as_decimal(value: &Value) -> Option<Decimal> {
  let text = match value {
    Value::Number(n) => n.to_string(),
    Value::String(s) => s.trim().to_string(),
    _ => return None,
  };
  Decimal::from_str(&text).or_else(|_| Decimal::from_scientific(&text)).ok()
}

pub fn pick_id(body: &Value, keys: &[&str]) -> Option<String> {
  pick(body, keys).and_then(as_id)
}

pub fn pick_decimal(body: &Value, keys: &[&str]) -> Option<Decimal> {
  pick(body, keys).and_then(as_decimal)
}

pub fn pick_string(body: &Value, keys: &[&str]) -> Option<String> {
  pick(body, keys).and_then(|v| v.as_str()).map(str::to_string)
}

/// Pulls a list out of whichever envelope the backend chose: `data`,
/// `orders`, `result`, `data.orders`, or a bare array.
pub fn list_envelope(body: &Value) -> Option<&Vec<Value>> {
  if let Some(items) = body.as_array() {
    return Some(items);
  }
  for key in ["data", "orders", "result"] {
    match body.get(key) {
      Some(Value::Array(items)) => return Some(items),
      Some(inner @ Value::Object(_)) => {
        if let Some(items) = inner.get("orders").and_then(Value::as_array) {
          return Some(items);
        }
      }
      _ => {}
    }
  }
  None
}

/// Best-effort human message from an error body.
pub fn error_message(body: &str) -> Option<String> {
  let trimmed = body.trim();
  if trimmed.is_empty() {
    return None;
  }
  if let Ok(json) = serde_json::from_str::<Value>(trimmed) {
    if let Some(msg) = message_from_json(&json) {
      return Some(msg);
    }
  }
  Some(truncate(trimmed, MAX_BODY_IN_MESSAGE))
}

fn message_from_json(json: &Value) -> Option<String> {
  let text = |v: Option<&Value>| v.and_then(Value::as_str).filter(|s| !s.is_empty()).map(str::to_string);

  text(json.get("message"))
    .or_else(|| text(json.get("error")))
    .or_else(|| text(json.get("error").and_then(|e| e.get("message"))))
    .or_else(|| text(json.get("detail")))
    .or_else(|| {
      let first = json.get("errors")?.as_array()?.first()?;
      first
        .as_str()
        .map(str::to_string)
        .or_else(|| text(first.get("message")))
    })
}

fn truncate(s: &str, max_chars: usize) -> String {
  match s.char_indices().nth(max_chars) {
    Some((idx, _)) => format!("{}…", &s[..idx]),
    None => s.to_string(),
  }
}
