//! Error normalizer
//!
//! Turns executor errors into short diagnostics the user can act on. Errors
//! that are not the user's fault are raised unchanged instead.

use crate::error::CliError;
use crate::parser::ParseFailure;
use procli_common::{ErrorSeverity, Severity};
use procli_contract::{ExecutorError, Issue, PathSegment};
use serde::Deserialize;
use std::error::Error;
use std::fmt;

type BoxedSource = Box<dyn Error + Send + Sync>;

/// A user-facing failure, reported without ending an interactive session
#[derive(Debug)]
pub struct Diagnostic {
    pub message: String,
    /// Print the command help after the message
    pub show_help: bool,
    cause: Option<BoxedSource>,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>, show_help: bool) -> Self {
        Self {
            message: message.into(),
            show_help,
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: BoxedSource) -> Self {
        self.cause = Some(cause);
        self
    }

    /// Raise the diagnostic, or its cause when there is one
    pub fn into_cli_error(self) -> CliError {
        match self.cause {
            Some(cause) => CliError::new(cause.to_string(), crate::exit_codes::EXIT_ERROR)
                .with_source(cause),
            None => CliError::new(self.message, crate::exit_codes::EXIT_ERROR),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for Diagnostic {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &(dyn Error + 'static))
    }
}

impl Severity for Diagnostic {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Error
    }
}

impl From<ParseFailure> for Diagnostic {
    fn from(failure: ParseFailure) -> Self {
        Diagnostic::new(failure.to_string(), failure.show_help()).with_cause(Box::new(failure))
    }
}

#[derive(Debug, Deserialize)]
struct TransportIssue {
    message: Option<String>,
    #[serde(default)]
    path: Vec<serde_json::Value>,
}

/// Route an executor error to a diagnostic, or raise it
///
/// # Arguments
///
/// * `error` - The error returned by the executor
/// * `verbose` - Raise every error unchanged
///
/// # Returns
///
/// `Ok` with a diagnostic to report, or `Err` with the error to raise
pub fn normalize(error: ExecutorError, verbose: bool) -> Result<Diagnostic, CliError> {
    if verbose {
        return Err(CliError::raised(error));
    }

    match error {
        ExecutorError::VersionMismatch { ref message } => {
            let actionable = format!(
                "The executor uses a different calling convention than this CLI ({}). Upgrade both to matching versions.",
                message
            );
            Err(CliError::new(actionable, crate::exit_codes::EXIT_ERROR).with_source(Box::new(error)))
        }
        ExecutorError::Validation(ref validation) => {
            let message = render_issues(&validation.with_flag_paths());
            Ok(Diagnostic::new(message, true).with_cause(Box::new(error)))
        }
        ExecutorError::Internal { .. } => Err(CliError::raised(error)),
        ExecutorError::BadInput { ref message, .. } => {
            Ok(Diagnostic::new(message.clone(), true).with_cause(Box::new(error)))
        }
        ExecutorError::Transport { ref message } => match transport_issues(message) {
            Some(rendered) => Ok(Diagnostic::new(rendered, true).with_cause(Box::new(error))),
            None => Err(CliError::raised(error)),
        },
        ExecutorError::Other(_) => Err(CliError::raised(error)),
    }
}

/// Bulleted rendering of an issue list
pub fn render_issues(issues: &[Issue]) -> String {
    let lines: Vec<String> = issues
        .iter()
        .map(|issue| format!("{}{}", issue.message, location(&issue.path)))
        .collect();
    format!("Validation error\n  - {}", lines.join("\n  - "))
}

fn location(path: &[PathSegment]) -> String {
    match path {
        [] => String::new(),
        [PathSegment::Index(index)] => format!(" at index {}", index),
        segments => {
            let mut rendered = String::new();
            for segment in segments {
                match segment {
                    PathSegment::Index(index) => rendered.push_str(&format!("[{}]", index)),
                    PathSegment::Key(key) if rendered.is_empty() => rendered.push_str(key),
                    PathSegment::Key(key) => {
                        rendered.push('.');
                        rendered.push_str(key);
                    }
                }
            }
            format!(" at \"{}\"", rendered)
        }
    }
}

fn transport_issues(message: &str) -> Option<String> {
    let issues: Vec<TransportIssue> = serde_json::from_str(message).ok()?;
    if issues.is_empty() {
        return None;
    }
    let lines: Vec<String> = issues
        .iter()
        .map(|issue| {
            let text = issue.message.clone().unwrap_or_else(|| "Invalid input".to_string());
            match issue.path.first() {
                Some(serde_json::Value::String(key)) => format!("{} at index {}", text, key),
                Some(index) => format!("{} at index {}", text, index),
                None => text,
            }
        })
        .collect();
    Some(format!("Validation error\n  - {}", lines.join("\n  - ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use procli_contract::ValidationError;

    fn validation(issues: Vec<Issue>) -> ExecutorError {
        ExecutorError::Validation(ValidationError::new(issues))
    }

    #[test]
    fn test_positional_type_error() {
        let diagnostic = normalize(
            validation(vec![Issue::new(vec![], "Expected number, received string")]),
            false,
        )
        .unwrap();
        assert_eq!(
            diagnostic.message,
            "Validation error\n  - Expected number, received string"
        );
        assert!(diagnostic.show_help);
    }

    #[test]
    fn test_flag_paths_and_indexes() {
        let diagnostic = normalize(
            validation(vec![
                Issue::new(vec![PathSegment::Key("numerator".into())], "Required"),
                Issue::new(vec![PathSegment::Index(1)], "Expected number, received string"),
                Issue::new(
                    vec![
                        PathSegment::Key("items".into()),
                        PathSegment::Index(0),
                        PathSegment::Key("name".into()),
                    ],
                    "Required",
                ),
            ]),
            false,
        )
        .unwrap();
        assert_eq!(
            diagnostic.message,
            "Validation error\n  - Required at \"--numerator\"\n  - Expected number, received string at index 1\n  - Required at \"--items[0].name\""
        );
    }

    #[test]
    fn test_bad_input_is_reported() {
        let diagnostic = normalize(ExecutorError::bad_input("Cannot divide by zero"), false).unwrap();
        assert_eq!(diagnostic.message, "Cannot divide by zero");
        assert!(diagnostic.show_help);
    }

    #[test]
    fn test_internal_is_raised_unchanged() {
        let error = normalize(ExecutorError::internal("database exploded"), false).unwrap_err();
        assert_eq!(error.message, "database exploded");
        assert!(error.source.is_some());
    }

    #[test]
    fn test_version_mismatch_is_actionable() {
        let error = normalize(
            ExecutorError::VersionMismatch {
                message: "expected v11".into(),
            },
            false,
        )
        .unwrap_err();
        assert!(error.message.contains("expected v11"));
        assert!(error.message.contains("matching versions"));
    }

    #[test]
    fn test_transport_issue_list() {
        let diagnostic = normalize(
            ExecutorError::transport(r#"[{"message": "Expected string", "path": [0]}, {"message": "Required"}]"#),
            false,
        )
        .unwrap();
        assert_eq!(
            diagnostic.message,
            "Validation error\n  - Expected string at index 0\n  - Required"
        );
    }

    #[test]
    fn test_unparseable_transport_is_raised() {
        assert!(normalize(ExecutorError::transport("connection reset"), false).is_err());
        assert!(normalize(ExecutorError::transport("[]"), false).is_err());
    }

    #[test]
    fn test_verbose_raises_everything() {
        let error = normalize(ExecutorError::bad_input("nope"), true).unwrap_err();
        assert_eq!(error.message, "nope");
        let error = normalize(validation(vec![Issue::new(vec![], "Required")]), true).unwrap_err();
        assert!(error.source.is_some());
    }

    #[test]
    fn test_same_error_same_diagnostic() {
        let make = || validation(vec![Issue::new(vec![PathSegment::Key("a".into())], "Required")]);
        assert_eq!(
            normalize(make(), false).unwrap().message,
            normalize(make(), false).unwrap().message
        );
    }
}
