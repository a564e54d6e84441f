//! Operation registry
//!
//! Operations are registered once at start-up and never change afterwards.
//! Registration order is kept so command listings are stable.

use async_trait::async_trait;
use indexmap::IndexMap;
use procli_common::{ErrorSeverity, Severity};
use procli_contract::Operation;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors a handler may return
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The input was well-formed but not acceptable
    #[error("{message}")]
    BadRequest { message: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl HandlerError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }
}

impl Severity for HandlerError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            HandlerError::BadRequest { .. } => ErrorSeverity::Error,
            HandlerError::Internal(_) => ErrorSeverity::Critical,
        }
    }
}

/// Business logic behind an operation
#[async_trait]
pub trait OperationHandler: Send + Sync {
    /// Handle already-validated input
    async fn handle(&self, input: Value) -> Result<Option<Value>, HandlerError>;
}

/// Handler backed by a synchronous closure
pub struct FnHandler<F> {
    f: F,
}

#[async_trait]
impl<F> OperationHandler for FnHandler<F>
where
    F: Fn(Value) -> Result<Option<Value>, HandlerError> + Send + Sync,
{
    async fn handle(&self, input: Value) -> Result<Option<Value>, HandlerError> {
        (self.f)(input)
    }
}

/// Wrap a closure as an [`OperationHandler`]
pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: Fn(Value) -> Result<Option<Value>, HandlerError> + Send + Sync,
{
    FnHandler { f }
}

struct Entry {
    operation: Operation,
    handler: Arc<dyn OperationHandler>,
}

/// Registry of operations and their handlers, keyed by operation name
#[derive(Default)]
pub struct OperationRegistry {
    entries: IndexMap<String, Entry>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an operation; a later registration with the same name replaces the earlier one
    pub fn register<H: OperationHandler + 'static>(&mut self, operation: Operation, handler: H) {
        debug!("Registering operation {} ({})", operation.name, operation.kind);
        let name = operation.name.clone();
        self.entries.insert(
            name,
            Entry {
                operation,
                handler: Arc::new(handler),
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&Operation> {
        self.entries.get(name).map(|entry| &entry.operation)
    }

    pub fn handler(&self, name: &str) -> Option<Arc<dyn OperationHandler>> {
        self.entries.get(name).map(|entry| Arc::clone(&entry.handler))
    }

    /// All operations in registration order
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.entries.values().map(|entry| &entry.operation)
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use procli_contract::OperationKind;
    use serde_json::json;

    fn echo() -> FnHandler<impl Fn(Value) -> Result<Option<Value>, HandlerError>> {
        handler_fn(|input| Ok(Some(input)))
    }

    #[test]
    fn test_registry_creation() {
        let registry = OperationRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_registration_keeps_order() {
        let mut registry = OperationRegistry::new();
        registry.register(Operation::new("b.second", OperationKind::Read), echo());
        registry.register(Operation::new("a.first", OperationKind::Write), echo());

        assert_eq!(registry.names(), vec!["b.second", "a.first"]);
        assert_eq!(registry.get("a.first").unwrap().kind, OperationKind::Write);
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_reregistration_replaces() {
        let mut registry = OperationRegistry::new();
        registry.register(Operation::new("x", OperationKind::Read), echo());
        registry.register(Operation::new("x", OperationKind::Write), echo());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("x").unwrap().kind, OperationKind::Write);
    }

    #[tokio::test]
    async fn test_handler_execution() {
        let mut registry = OperationRegistry::new();
        registry.register(Operation::new("echo", OperationKind::Read), echo());
        let handler = registry.handler("echo").unwrap();
        assert_eq!(handler.handle(json!([1])).await.unwrap(), Some(json!([1])));
    }
}
