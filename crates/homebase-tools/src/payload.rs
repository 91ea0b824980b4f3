//! Extraction of structured data from loosely framed service responses.
//!
//! The database service does not return clean JSON. Its text wraps a JSON
//! array literal, with every quote backslash-escaped, between
//! `<untrusted-data-ID>` and `</untrusted-data-ID>` markers and surrounds it
//! with prose:
//!
//! ```text
//! Below is the result of the SQL query. ... within the below <untrusted-data-9f2c> boundaries.
//!
//! <untrusted-data-9f2c>
//! [{\"HOME_ID\":7,\"SALE PRICE\":\"850000\"}]
//! </untrusted-data-9f2c>
//! ```
//!
//! Everything here is pure and never panics on malformed input; every
//! failure is a [`PayloadError`] carrying an excerpt of the offending text.

use serde_json::{Map, Value};

/// Opening marker prefix.
pub const OPEN_MARKER: &str = "<untrusted-data-";

/// Closing marker prefix.
pub const CLOSE_MARKER: &str = "</untrusted-data-";

/// Number of characters of raw text kept on a [`PayloadError`].
pub const EXCERPT_CHARS: usize = 200;

/// Reason when no marked region exists.
pub const NO_DATA: &str = "No data found in response";

/// Reason when the marked region holds no array literal.
pub const NO_JSON: &str = "No JSON data found";

/// Reason when the decoded value has the wrong shape.
pub const INVALID_FORMAT: &str = "Invalid data format";

/// Reason when a query matched nothing.
pub const NO_MATCHES: &str = "No data found for the specified criteria";

/// A service response that could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct PayloadError {
    /// Human-readable reason.
    pub reason: String,
    /// The first [`EXCERPT_CHARS`] characters of the raw text.
    pub raw_excerpt: String,
}

impl PayloadError {
    /// Create an error for `raw_text`, keeping only an excerpt of it.
    pub fn new(reason: impl Into<String>, raw_text: &str) -> Self {
        Self {
            reason: reason.into(),
            raw_excerpt: excerpt(raw_text),
        }
    }
}

/// The first [`EXCERPT_CHARS`] characters of `text`.
pub fn excerpt(text: &str) -> String {
    text.chars().take(EXCERPT_CHARS).collect()
}

/// Extract the array of rows from a marked, escaped response.
///
/// Takes the first `[` and the last `]` between the first opening marker
/// and the first closing marker. Nested arrays are not expected.
pub fn extract_rows(text: &str) -> Result<Vec<Value>, PayloadError> {
    let region = match (text.find(OPEN_MARKER), text.find(CLOSE_MARKER)) {
        (Some(start), Some(end)) if start < end => &text[start..end],
        _ => return Err(PayloadError::new(NO_DATA, text)),
    };

    let literal = match (region.find('['), region.rfind(']')) {
        (Some(open), Some(close)) if open < close => &region[open..=close],
        _ => return Err(PayloadError::new(NO_JSON, text)),
    };

    let json = literal.replace("\\\"", "\"");
    let value: Value = serde_json::from_str(&json)
        .map_err(|e| PayloadError::new(format!("Failed to parse results: {}", e), text))?;

    match value {
        Value::Array(rows) => Ok(rows),
        _ => Err(PayloadError::new(INVALID_FORMAT, text)),
    }
}

/// Parse a response whose whole text is a JSON object.
pub fn parse_object(text: &str) -> Result<Map<String, Value>, PayloadError> {
    let value: Value = serde_json::from_str(text.trim())
        .map_err(|e| PayloadError::new(format!("Failed to parse results: {}", e), text))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(PayloadError::new(INVALID_FORMAT, text)),
    }
}

/// Parse a response whose whole text is one number.
pub fn parse_number(text: &str) -> Result<f64, PayloadError> {
    let trimmed = text.trim().trim_matches('"');
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(PayloadError::new(
            "Failed to parse results: expected a number",
            text,
        )),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Defensive field access
// ─────────────────────────────────────────────────────────────────────────────

/// A field as text. Missing or null is empty; scalars are stringified.
pub fn field_str(row: &Value, key: &str) -> String {
    match row.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// A field as a float. Numeric strings are coerced; anything else is `0.0`.
pub fn field_f64(row: &Value, key: &str) -> f64 {
    let n = match row.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|n| n.is_finite()).unwrap_or(0.0)
}

/// A field as an integer. Numeric strings and floats are truncated; anything else is `0`.
pub fn field_i64(row: &Value, key: &str) -> i64 {
    match row.get(key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite())
                        .map(|f| f as i64)
                })
                .unwrap_or(0)
        }
        _ => 0,
    }
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A price field: coerced to a float and rounded to cents.
pub fn price(row: &Value, key: &str) -> f64 {
    round2(field_f64(row, key))
}

/// Similarity for a vector-search row: `1 - distance`, missing distance counting as 1.
pub fn similarity(row: &Value) -> f64 {
    let distance = match row.get("distance") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    1.0 - distance.filter(|d| d.is_finite()).unwrap_or(1.0)
}
