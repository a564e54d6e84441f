//! Severity classification for procli errors
//!
//! Every error type in the workspace implements [`Severity`] so the process
//! boundary can decide how loudly to report a failure and whether the
//! interactive session may keep running.

/// Severity levels for error classification
///
/// - **Warning**: something was skipped but the run continues, for example an
///   operation whose contract could not be turned into a command.
/// - **Error**: the current invocation failed but the process may keep serving
///   further invocations (the interactive session re-prompts).
/// - **Critical**: the failure cannot be reported as a diagnostic and must be
///   raised to the process boundary.
///
/// # Examples
///
/// ```rust
/// use procli_common::ErrorSeverity;
///
/// let skipped = ErrorSeverity::Warning;
/// assert!(skipped < ErrorSeverity::Critical);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    /// Potential issue but operation can proceed
    Warning,

    /// Invocation failed but the process can continue
    Error,

    /// Failure must be raised, not reported
    Critical,
}

impl ErrorSeverity {
    /// Whether an error of this severity ends the process
    pub fn is_fatal(self) -> bool {
        matches!(self, ErrorSeverity::Critical)
    }
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ErrorSeverity::Warning => "warning",
            ErrorSeverity::Error => "error",
            ErrorSeverity::Critical => "critical",
        };
        f.write_str(label)
    }
}

/// Trait for error types that have severity levels
///
/// # Example
///
/// ```rust
/// use procli_common::{ErrorSeverity, Severity};
///
/// #[derive(Debug)]
/// enum LookupError {
///     Missing,
///     Corrupt,
/// }
///
/// impl Severity for LookupError {
///     fn severity(&self) -> ErrorSeverity {
///         match self {
///             LookupError::Missing => ErrorSeverity::Error,
///             LookupError::Corrupt => ErrorSeverity::Critical,
///         }
///     }
/// }
///
/// assert_eq!(LookupError::Corrupt.severity(), ErrorSeverity::Critical);
/// ```
pub trait Severity {
    /// Get the severity level of this error
    fn severity(&self) -> ErrorSeverity;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(ErrorSeverity::Warning < ErrorSeverity::Error);
        assert!(ErrorSeverity::Error < ErrorSeverity::Critical);
    }

    #[test]
    fn test_only_critical_is_fatal() {
        assert!(!ErrorSeverity::Warning.is_fatal());
        assert!(!ErrorSeverity::Error.is_fatal());
        assert!(ErrorSeverity::Critical.is_fatal());
    }

    #[test]
    fn test_display() {
        assert_eq!(ErrorSeverity::Warning.to_string(), "warning");
        assert_eq!(ErrorSeverity::Critical.to_string(), "critical");
    }
}
