//! Operation executor seam
//!
//! The command layer never runs an operation itself. It hands the operation
//! name, kind and structured input to an [`OperationExecutor`], which may call
//! an in-process handler or forward the request elsewhere.

use crate::model::OperationKind;
use crate::validate::{Issue, PathSegment};
use async_trait::async_trait;
use procli_common::{ErrorSeverity, Severity};
use serde_json::Value;
use thiserror::Error;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Structured input failed its contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub issues: Vec<Issue>,
}

impl ValidationError {
    pub fn new(issues: Vec<Issue>) -> Self {
        Self { issues }
    }

    /// Copy of the issues with the first key segment rewritten as a flag name
    pub fn with_flag_paths(&self) -> Vec<Issue> {
        self.issues
            .iter()
            .map(|issue| {
                let mut path = issue.path.clone();
                if let Some(PathSegment::Key(key)) = path.first_mut() {
                    *key = format!("--{}", key);
                }
                Issue::new(path, issue.message.clone())
            })
            .collect()
    }
}

/// Renders as the JSON issue list, the form remote transports carry
impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match serde_json::to_string_pretty(&self.issues) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{:?}", self.issues),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors raised while executing an operation
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The executor and the command layer disagree on their calling convention
    #[error("{message}")]
    VersionMismatch { message: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The operation rejected its input
    #[error("{message}")]
    BadInput {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// The operation failed on its own terms
    #[error("{message}")]
    Internal {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// The call never reached the operation, or came back in a raw form
    #[error("{message}")]
    Transport { message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ExecutorError {
    pub fn bad_input(message: impl Into<String>) -> Self {
        Self::BadInput {
            message: message.into(),
            source: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}

impl Severity for ExecutorError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            ExecutorError::VersionMismatch { .. } => ErrorSeverity::Critical,
            ExecutorError::Validation(_) => ErrorSeverity::Error,
            ExecutorError::BadInput { .. } => ErrorSeverity::Error,
            ExecutorError::Internal { .. } => ErrorSeverity::Critical,
            ExecutorError::Transport { .. } => ErrorSeverity::Error,
            ExecutorError::Other(_) => ErrorSeverity::Critical,
        }
    }
}

/// Executes operations on behalf of the command layer
///
/// # Returns
///
/// `Ok(None)` when the operation produced no value
#[async_trait]
pub trait OperationExecutor: Send + Sync {
    async fn invoke(
        &self,
        operation: &str,
        kind: OperationKind,
        input: Value,
    ) -> Result<Option<Value>, ExecutorError>;
}
