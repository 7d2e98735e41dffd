//! Lenient numeric coercion for values read from the document store.
//!
//! Profile fields such as CGPA and backlog count were historically written
//! either as numbers or as strings, and some records omit them entirely.
//! Every eligibility comparison goes through [`to_canonical_number`]; values
//! that cannot be read as a finite number fall back to the caller's default.

use serde::{Deserialize, Deserializer, Serialize};

/// A numeric field exactly as it was stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    /// Stored as a JSON number.
    Number(f64),
    /// Stored as text, e.g. `"8.2"`.
    Text(String),
    /// Stored as null, or absent from the document.
    #[default]
    Missing,
    /// Anything else (booleans, arrays, objects).
    Other(serde_json::Value),
}

impl From<f64> for RawNumber {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<u32> for RawNumber {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for RawNumber {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Coerce a stored value to `f64`, returning `default` when it is missing,
/// non-finite or unparseable.
pub fn to_canonical_number(value: &RawNumber, default: f64) -> f64 {
    let parsed = match value {
        RawNumber::Number(n) => Some(*n),
        RawNumber::Text(s) => s.trim().parse::<f64>().ok(),
        RawNumber::Missing | RawNumber::Other(_) => None,
    };
    match parsed {
        Some(n) if n.is_finite() => n,
        _ => default,
    }
}

/// Coerce a stored value to a non-negative count. Fractions are truncated;
/// negative values take `default`.
pub fn to_canonical_count(value: &RawNumber, default: u32) -> u32 {
    let n = to_canonical_number(value, f64::from(default));
    if n < 0.0 {
        default
    } else if n >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        n.trunc() as u32
    }
}

/// serde helper: read any representation and coerce it to `f64` (default 0).
pub fn deserialize_lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = RawNumber::deserialize(deserializer)?;
    Ok(to_canonical_number(&raw, 0.0))
}

/// serde helper: read any representation and coerce it to `u32` (default 0).
pub fn deserialize_lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = RawNumber::deserialize(deserializer)?;
    Ok(to_canonical_count(&raw, 0))
}
