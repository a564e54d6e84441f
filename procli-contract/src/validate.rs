//! Structural conformance check
//!
//! Walks a value alongside its [`InputContract`] and reports every place the
//! value does not fit. Messages follow the wording users already see from
//! schema validators ("Required", "Expected number, received string").
//!
//! JSON has no "undefined", so `null` and an absent value are treated alike
//! unless the contract is nullable.

use crate::model::{InputContract, LiteralKind, LiteralShape, Shape};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// One step into a value: an object key or a list index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

impl std::fmt::Display for PathSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathSegment::Index(index) => write!(f, "{}", index),
            PathSegment::Key(key) => f.write_str(key),
        }
    }
}

/// A single conformance failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub path: Vec<PathSegment>,
    pub message: String,
}

impl Issue {
    pub fn new(path: Vec<PathSegment>, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }
}

/// Check `value` against `contract`, returning every issue found
pub fn check(contract: &InputContract, value: &Value) -> Vec<Issue> {
    let mut issues = Vec::new();
    check_at(contract, Some(value), &mut Vec::new(), &mut issues);
    issues
}

/// Whether `value` satisfies `contract`
pub fn conforms(contract: &InputContract, value: &Value) -> bool {
    check(contract, value).is_empty()
}

fn received(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn check_at(
    contract: &InputContract,
    value: Option<&Value>,
    path: &mut Vec<PathSegment>,
    issues: &mut Vec<Issue>,
) {
    let value = match value {
        None | Some(Value::Null) => {
            let is_null = value.is_some();
            if (is_null && contract.nullable) || contract.may_be_absent() {
                return;
            }
            if matches!(contract.shape, Shape::Empty) {
                return;
            }
            issues.push(Issue::new(path.clone(), "Required"));
            return;
        }
        Some(value) => value,
    };

    match &contract.shape {
        Shape::Empty => {
            issues.push(Issue::new(
                path.clone(),
                format!("Expected nothing, received {}", received(value)),
            ));
        }
        Shape::Literal(literal) => check_literal(literal, value, path, issues),
        Shape::Object(object) => {
            let Value::Object(map) = value else {
                issues.push(Issue::new(
                    path.clone(),
                    format!("Expected object, received {}", received(value)),
                ));
                return;
            };
            for (name, property) in &object.properties {
                path.push(PathSegment::Key(name.clone()));
                check_at(property, map.get(name), path, issues);
                path.pop();
            }
        }
        Shape::Tuple(tuple) => {
            let Value::Array(items) = value else {
                issues.push(Issue::new(
                    path.clone(),
                    format!("Expected array, received {}", received(value)),
                ));
                return;
            };
            if items.len() > tuple.items.len() {
                issues.push(Issue::new(
                    path.clone(),
                    format!(
                        "Array must contain at most {} element(s)",
                        tuple.items.len()
                    ),
                ));
                return;
            }
            for (index, item) in tuple.items.iter().enumerate() {
                path.push(PathSegment::Index(index));
                check_at(item, items.get(index), path, issues);
                path.pop();
            }
        }
        Shape::Array(array) => {
            let Value::Array(items) = value else {
                issues.push(Issue::new(
                    path.clone(),
                    format!("Expected array, received {}", received(value)),
                ));
                return;
            };
            for (index, item) in items.iter().enumerate() {
                path.push(PathSegment::Index(index));
                check_at(&array.element, Some(item), path, issues);
                path.pop();
            }
        }
        Shape::Union(union) => {
            let matched = union
                .variants
                .iter()
                .any(|variant| check(variant, value).is_empty());
            if !matched {
                issues.push(Issue::new(path.clone(), "Invalid input"));
            }
        }
    }
}

fn check_literal(
    literal: &LiteralShape,
    value: &Value,
    path: &[PathSegment],
    issues: &mut Vec<Issue>,
) {
    let kind_matches = match (literal.kind, value) {
        (LiteralKind::String, Value::String(_)) => true,
        (LiteralKind::Number, Value::Number(_)) => true,
        (LiteralKind::Boolean, Value::Bool(_)) => true,
        _ => false,
    };

    if let Some(options) = &literal.one_of {
        if options.iter().any(|option| option == value) {
            return;
        }
        let message = match options.as_slice() {
            [single] => format!("Invalid literal value, expected {}", single),
            _ if kind_matches => format!(
                "Invalid enum value. Expected {}, received {}",
                options
                    .iter()
                    .map(quote_option)
                    .collect::<Vec<_>>()
                    .join(" | "),
                quote_option(value)
            ),
            _ => format!(
                "Expected {}, received {}",
                literal.kind.as_str(),
                received(value)
            ),
        };
        issues.push(Issue::new(path.to_vec(), message));
        return;
    }

    if !kind_matches {
        issues.push(Issue::new(
            path.to_vec(),
            format!(
                "Expected {}, received {}",
                literal.kind.as_str(),
                received(value)
            ),
        ));
        return;
    }

    if literal.integer {
        if let Some(number) = value.as_f64() {
            if number.fract() != 0.0 {
                issues.push(Issue::new(
                    path.to_vec(),
                    "Expected integer, received float",
                ));
            }
        }
    }

    if let (Some(pattern), Value::String(text)) = (&literal.pattern, value) {
        match Regex::new(pattern) {
            Ok(regex) if regex.is_match(text) => {}
            Ok(_) => issues.push(Issue::new(path.to_vec(), "Invalid")),
            Err(e) => {
                warn!("Ignoring invalid contract pattern {:?}: {}", pattern, e);
            }
        }
    }
}

fn quote_option(value: &Value) -> String {
    match value {
        Value::String(text) => format!("'{}'", text),
        other => other.to_string(),
    }
}
