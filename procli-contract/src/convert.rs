//! Conversion of raw command-line tokens into typed values

use crate::model::{InputContract, LiteralKind, ValueKind};
use crate::validate::conforms;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// A flag value as collected by the argument parser, before typing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawFlagValue {
    /// Flag present with no value (`--force`)
    Switch,
    Single(String),
    Many(Vec<String>),
}

impl RawFlagValue {
    /// All tokens carried by this value
    pub fn tokens(&self) -> Vec<&str> {
        match self {
            RawFlagValue::Switch => Vec::new(),
            RawFlagValue::Single(value) => vec![value.as_str()],
            RawFlagValue::Many(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

/// Parse a token as a finite number
///
/// Accepts surrounding whitespace and exponents; rejects the empty string and
/// the spelled-out infinities.
pub fn parse_number(token: &str) -> Option<f64> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return None;
    }
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
    {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Build a JSON number, preferring an integer representation for whole values
pub fn number_value(number: f64) -> Value {
    const MAX_SAFE: f64 = 9_007_199_254_740_991.0;
    if number.fract() == 0.0 && number.abs() <= MAX_SAFE {
        return Value::Number(Number::from(number as i64));
    }
    Number::from_f64(number)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Convert one positional token using the kinds the contract accepts
///
/// Booleans win for `true`/`false`, then numbers for numeric tokens. When the
/// converted value does not satisfy the contract but strings are accepted,
/// the raw token is kept.
pub fn convert_positional(contract: &InputContract, token: &str) -> Value {
    let kinds = contract.literal_kinds();
    let raw = Value::String(token.to_string());

    let mut converted = raw.clone();
    if kinds.contains(&LiteralKind::Boolean) && (token == "true" || token == "false") {
        converted = Value::Bool(token == "true");
    } else if kinds.contains(&LiteralKind::Number) {
        if let Some(number) = parse_number(token) {
            converted = number_value(number);
        }
    }

    if !conforms(contract, &converted) && kinds.contains(&LiteralKind::String) {
        return raw;
    }
    converted
}

/// Convert a single flag token according to the flag's value kind
pub fn convert_flag_token(kind: ValueKind, token: &str) -> Value {
    match kind {
        ValueKind::Number => parse_number(token)
            .map(number_value)
            .unwrap_or_else(|| Value::String(token.to_string())),
        ValueKind::Boolean => match token {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(token.to_string()),
        },
        ValueKind::Object => serde_json::from_str::<Value>(token)
            .unwrap_or_else(|_| Value::String(token.to_string())),
        ValueKind::String | ValueKind::Array | ValueKind::Any => Value::String(token.to_string()),
    }
}
