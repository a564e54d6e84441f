//! In-process operation executor

use crate::registry::{HandlerError, OperationRegistry};
use async_trait::async_trait;
use procli_contract::{
    check, ExecutorError, OperationExecutor, OperationKind, ValidationError,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, trace};

/// Executes operations from an [`OperationRegistry`] in the current process
///
/// Input is checked against every contract in the operation's chain before
/// the handler runs.
#[derive(Clone)]
pub struct LocalExecutor {
    registry: Arc<OperationRegistry>,
}

impl LocalExecutor {
    pub fn new(registry: Arc<OperationRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }
}

#[async_trait]
impl OperationExecutor for LocalExecutor {
    async fn invoke(
        &self,
        operation: &str,
        kind: OperationKind,
        input: Value,
    ) -> Result<Option<Value>, ExecutorError> {
        let style = kind.call_style();
        let not_found = || {
            ExecutorError::transport(format!(
                "No \"{}\"-procedure on path \"{}\"",
                style.as_str(),
                operation
            ))
        };

        let declared = self.registry.get(operation).ok_or_else(not_found)?;
        if declared.kind.call_style() != style {
            return Err(not_found());
        }
        let handler = self.registry.handler(operation).ok_or_else(not_found)?;

        let issues: Vec<_> = declared
            .contracts
            .iter()
            .flat_map(|contract| check(contract, &input))
            .collect();
        if !issues.is_empty() {
            debug!("{} rejected input with {} issue(s)", operation, issues.len());
            return Err(ValidationError::new(issues).into());
        }

        trace!("Invoking {} as {}", operation, style.as_str());
        handler.handle(input).await.map_err(|error| match error {
            HandlerError::BadRequest { message } => ExecutorError::bad_input(message),
            HandlerError::Internal(source) => ExecutorError::Internal {
                message: source.to_string(),
                source: Some(source.into()),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::handler_fn;
    use procli_contract::{InputContract, Operation, PathSegment};
    use serde_json::json;

    fn executor() -> LocalExecutor {
        let mut registry = OperationRegistry::new();
        registry.register(
            Operation::new("math.add", OperationKind::Read).input(InputContract::tuple(vec![
                InputContract::number(),
                InputContract::number(),
            ])),
            handler_fn(|input| {
                let sum: f64 = input
                    .as_array()
                    .map(|items| items.iter().filter_map(Value::as_f64).sum())
                    .unwrap_or_default();
                Ok(Some(procli_contract::number_value(sum)))
            }),
        );
        registry.register(
            Operation::new("fail.bad", OperationKind::Write),
            handler_fn(|_| Err(HandlerError::bad_request("not today"))),
        );
        registry.register(
            Operation::new("fail.internal", OperationKind::Write),
            handler_fn(|_| Err(anyhow::anyhow!("disk on fire").into())),
        );
        LocalExecutor::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn test_invokes_handler() {
        let result = executor()
            .invoke("math.add", OperationKind::Read, json!([1, 2]))
            .await
            .unwrap();
        assert_eq!(result, Some(json!(3)));
    }

    #[tokio::test]
    async fn test_unknown_operation_is_transport_error() {
        let error = executor()
            .invoke("nope", OperationKind::Read, json!({}))
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "No \"query\"-procedure on path \"nope\"");
    }

    #[tokio::test]
    async fn test_call_style_mismatch() {
        let error = executor()
            .invoke("math.add", OperationKind::Write, json!([1, 2]))
            .await
            .unwrap_err();
        assert!(matches!(error, ExecutorError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_validation_failure() {
        let error = executor()
            .invoke("math.add", OperationKind::Read, json!(["bad", 2]))
            .await
            .unwrap_err();
        let ExecutorError::Validation(validation) = error else {
            panic!("expected validation error");
        };
        assert_eq!(validation.issues[0].path, vec![PathSegment::Index(0)]);
        assert_eq!(
            validation.issues[0].message,
            "Expected number, received string"
        );
    }

    #[tokio::test]
    async fn test_handler_errors_are_mapped() {
        let bad = executor()
            .invoke("fail.bad", OperationKind::Write, json!({}))
            .await
            .unwrap_err();
        assert!(matches!(bad, ExecutorError::BadInput { .. }));

        let internal = executor()
            .invoke("fail.internal", OperationKind::Write, json!({}))
            .await
            .unwrap_err();
        assert!(matches!(internal, ExecutorError::Internal { .. }));
        assert_eq!(internal.to_string(), "disk on fire");
    }
}
