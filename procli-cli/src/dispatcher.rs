//! Dispatcher
//!
//! Runs a parsed invocation: checks flag compatibility, rebuilds the
//! structured input, invokes the executor and reports the outcome.

use crate::error::CliResult;
use crate::exit_codes::{EXIT_DIAGNOSTIC, EXIT_SUCCESS};
use crate::normalizer::{normalize, Diagnostic};
use crate::output::Logger;
use crate::parser::ParsedInvocation;
use crate::surface::Surface;
use procli_common::Pretty;
use procli_contract::{CompiledCommand, OperationExecutor};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// What the caller should do after a dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitSignal {
    Exit(i32),
    /// Keep reading input (interactive mode)
    Continue,
}

/// Executes invocations against an executor
#[derive(Clone)]
pub struct Dispatcher {
    surface: Arc<Surface>,
    executor: Arc<dyn OperationExecutor>,
    logger: Arc<dyn Logger>,
}

impl Dispatcher {
    pub fn new(
        surface: Arc<Surface>,
        executor: Arc<dyn OperationExecutor>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            surface,
            executor,
            logger,
        }
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn logger(&self) -> &dyn Logger {
        self.logger.as_ref()
    }

    /// Run one invocation
    ///
    /// # Returns
    ///
    /// The exit signal, or an error to raise past the diagnostic layer
    pub async fn dispatch(&self, invocation: &ParsedInvocation) -> CliResult<ExitSignal> {
        let command = invocation
            .command
            .as_deref()
            .or_else(|| self.surface.default_command())
            .and_then(|name| self.surface.command(name));
        let Some(command) = command else {
            let diagnostic = Diagnostic::new("No command specified.", true);
            return self.report(diagnostic, invocation, None);
        };

        let input = match &invocation.call_expression {
            Some(expression) => match call_input(&command.name, expression) {
                Ok(input) => input,
                Err(diagnostic) => return self.report(diagnostic, invocation, Some(command)),
            },
            None => {
                let conflicts = conflicting_flags(command, invocation);
                if !conflicts.is_empty() {
                    let diagnostic = Diagnostic::new(conflicts.join("\n"), true);
                    return self.report(diagnostic, invocation, Some(command));
                }
                command.extract(&invocation.positionals, &invocation.flags)
            }
        };

        debug!("Invoking {} with input:\n{}", command.name, Pretty(&input));
        match self.executor.invoke(&command.name, command.kind, input).await {
            Ok(result) => {
                if let Some(value) = result {
                    self.logger.info(&value);
                }
                Ok(if invocation.interactive {
                    ExitSignal::Continue
                } else {
                    ExitSignal::Exit(EXIT_SUCCESS)
                })
            }
            Err(error) => {
                let diagnostic = normalize(error, invocation.verbose_errors)?;
                self.report(diagnostic, invocation, Some(command))
            }
        }
    }

    /// Print a diagnostic, followed by help when it asks for it
    ///
    /// In verbose mode the diagnostic is raised instead.
    pub fn report(
        &self,
        diagnostic: Diagnostic,
        invocation: &ParsedInvocation,
        command: Option<&CompiledCommand>,
    ) -> CliResult<ExitSignal> {
        if invocation.verbose_errors {
            return Err(diagnostic.into_cli_error());
        }

        self.logger.error(&Value::String(diagnostic.message.clone()));
        if diagnostic.show_help {
            let help = command
                .and_then(|command| self.surface.command_help(&command.name))
                .unwrap_or_else(|| self.surface.root_help());
            self.logger.info(&Value::String(help));
        }

        Ok(if invocation.interactive {
            ExitSignal::Continue
        } else {
            ExitSignal::Exit(EXIT_DIAGNOSTIC)
        })
    }
}

/// One message per incompatible pair where both flags were given
fn conflicting_flags(command: &CompiledCommand, invocation: &ParsedInvocation) -> Vec<String> {
    command
        .incompatible_pairs
        .iter()
        .filter(|(a, b)| invocation.flags.contains_key(a) && invocation.flags.contains_key(b))
        .map(|(a, b)| {
            format!(
                "--{} and --{} are incompatible and cannot be used together",
                long_name(command, a),
                long_name(command, b)
            )
        })
        .collect()
}

fn long_name<'a>(command: &'a CompiledCommand, name: &'a str) -> &'a str {
    command
        .flags
        .get(name)
        .map(|flag| flag.long.as_str())
        .unwrap_or(name)
}

/// Structured input written directly as `name(<json>)`
///
/// Empty parentheses mean no input.
fn call_input(name: &str, expression: &str) -> Result<Value, Diagnostic> {
    let arguments = expression
        .strip_prefix(name)
        .and_then(|rest| rest.strip_prefix('('))
        .and_then(|rest| rest.rfind(')').map(|end| &rest[..end]))
        .ok_or_else(|| Diagnostic::new(format!("Invalid call expression: {}", expression), false))?;

    if arguments.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(arguments).map_err(|e| {
        Diagnostic::new(format!("Invalid call expression {}: {}", expression, e), false)
            .with_cause(Box::new(e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{LineByLineLogger, MemorySink};
    use crate::parser::parse;
    use crate::surface::SurfaceBuilder;
    use async_trait::async_trait;
    use procli_contract::{ExecutorError, InputContract, Operation, OperationKind};
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(String, OperationKind, Value)>>,
    }

    #[async_trait]
    impl OperationExecutor for Recorder {
        async fn invoke(
            &self,
            operation: &str,
            kind: OperationKind,
            input: Value,
        ) -> Result<Option<Value>, ExecutorError> {
            self.calls
                .lock()
                .unwrap()
                .push((operation.to_string(), kind, input.clone()));
            match operation {
                "add" => {
                    let sum = input
                        .as_array()
                        .map(|items| items.iter().filter_map(Value::as_f64).sum::<f64>())
                        .unwrap_or_default();
                    Ok(Some(json!(sum as i64)))
                }
                "fail" => Err(ExecutorError::bad_input("Nope")),
                "boom" => Err(ExecutorError::internal("Boom")),
                _ => Ok(None),
            }
        }
    }

    struct Harness {
        dispatcher: Dispatcher,
        recorder: Arc<Recorder>,
        sink: Arc<MemorySink>,
    }

    fn harness() -> Harness {
        let add = Operation::new("add", OperationKind::Write)
            .input(InputContract::tuple(vec![InputContract::number(), InputContract::number()]));
        let exclusive = Operation::new("exclusive", OperationKind::Write).input(InputContract::union(vec![
            InputContract::object([("fromFile", InputContract::string())]),
            InputContract::object([("inline", InputContract::string())]),
        ]));
        let fail = Operation::new("fail", OperationKind::Read);
        let boom = Operation::new("boom", OperationKind::Read);
        let surface = SurfaceBuilder::new("procli")
            .build([&add, &exclusive, &fail, &boom])
            .unwrap();
        let recorder = Arc::new(Recorder::default());
        let sink = Arc::new(MemorySink::new());
        let dispatcher = Dispatcher::new(
            Arc::new(surface),
            recorder.clone(),
            Arc::new(LineByLineLogger::new(sink.clone())),
        );
        Harness {
            dispatcher,
            recorder,
            sink,
        }
    }

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    async fn run(harness: &Harness, items: &[&str]) -> CliResult<ExitSignal> {
        let invocation = parse(&argv(items), harness.dispatcher.surface()).unwrap();
        harness.dispatcher.dispatch(&invocation).await
    }

    #[test_log::test(tokio::test)]
    async fn test_tuple_invocation_logs_result() {
        let harness = harness();
        let signal = run(&harness, &["add", "1", "2"]).await.unwrap();
        assert_eq!(signal, ExitSignal::Exit(EXIT_SUCCESS));
        assert_eq!(
            harness.recorder.calls.lock().unwrap()[0],
            ("add".to_string(), OperationKind::Write, json!([1, 2]))
        );
        assert_eq!(harness.sink.out_lines(), vec!["3"]);
    }

    #[tokio::test]
    async fn test_incompatible_flags_are_rejected() {
        let harness = harness();
        let signal = run(&harness, &["exclusive", "--from-file", "a", "--inline", "b"])
            .await
            .unwrap();
        assert_eq!(signal, ExitSignal::Exit(EXIT_DIAGNOSTIC));
        assert!(harness.recorder.calls.lock().unwrap().is_empty());
        assert_eq!(
            harness.sink.err_lines(),
            vec!["--from-file and --inline are incompatible and cannot be used together"]
        );
    }

    #[tokio::test]
    async fn test_literal_call_bypasses_compatibility() {
        let harness = harness();
        let signal = run(&harness, &[r#"exclusive({"fromFile":"a","inline":"b"})"#])
            .await
            .unwrap();
        assert_eq!(signal, ExitSignal::Exit(EXIT_SUCCESS));
        assert_eq!(
            harness.recorder.calls.lock().unwrap()[0].2,
            json!({"fromFile": "a", "inline": "b"})
        );
    }

    #[tokio::test]
    async fn test_invalid_call_expression_is_reported_without_help() {
        let harness = harness();
        let signal = run(&harness, &["add(1,"]).await.unwrap();
        assert_eq!(signal, ExitSignal::Exit(EXIT_DIAGNOSTIC));
        assert_eq!(harness.sink.out_lines().len(), 0);
        assert!(harness.sink.err_lines()[0].starts_with("Invalid call expression"));
    }

    #[tokio::test]
    async fn test_bad_input_prints_message_and_help() {
        let harness = harness();
        let signal = run(&harness, &["fail"]).await.unwrap();
        assert_eq!(signal, ExitSignal::Exit(EXIT_DIAGNOSTIC));
        assert_eq!(harness.sink.err_lines(), vec!["Nope"]);
        assert!(harness.sink.out_lines()[0].contains("Usage:"));
    }

    #[tokio::test]
    async fn test_interactive_continues_after_failure() {
        let harness = harness();
        let signal = run(&harness, &["--interactive", "fail"]).await.unwrap();
        assert_eq!(signal, ExitSignal::Continue);
    }

    #[tokio::test]
    async fn test_internal_error_is_raised() {
        let harness = harness();
        let error = run(&harness, &["boom"]).await.unwrap_err();
        assert_eq!(error.message, "Boom");
    }

    #[tokio::test]
    async fn test_verbose_raises_bad_input() {
        let harness = harness();
        let error = run(&harness, &["fail", "--verbose-errors"]).await.unwrap_err();
        assert_eq!(error.message, "Nope");
        assert!(harness.sink.err_lines().is_empty());
    }

    #[tokio::test]
    async fn test_same_argv_same_input() {
        let harness = harness();
        run(&harness, &["add", "4", "5"]).await.unwrap();
        run(&harness, &["add", "4", "5"]).await.unwrap();
        let calls = harness.recorder.calls.lock().unwrap();
        assert_eq!(calls[0], calls[1]);
    }
}
