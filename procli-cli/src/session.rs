//! Interactive session
//!
//! Reads one line at a time, dispatches it, and prompts again. Failures are
//! reported as diagnostics and never end the session; closing the input does.

use crate::argv::split_line;
use crate::dispatcher::Dispatcher;
use crate::error::CliResult;
use crate::exit_codes::EXIT_SUCCESS;
use crate::normalizer::Diagnostic;
use crate::parser::{parse, verbose_override, ParsedInvocation};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Prompting,
    Executing,
}

/// Read-dispatch loop over an input stream
pub struct InteractiveSession<'a> {
    dispatcher: &'a Dispatcher,
    prompt: String,
    verbose_errors: bool,
    state: SessionState,
}

impl<'a> InteractiveSession<'a> {
    pub fn new(dispatcher: &'a Dispatcher, prompt: impl Into<String>, verbose_errors: bool) -> Self {
        Self {
            dispatcher,
            prompt: prompt.into(),
            verbose_errors,
            state: SessionState::Prompting,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run until the input closes
    ///
    /// # Returns
    ///
    /// The exit code once input is closed, or the error raised in verbose mode
    pub async fn run<R, W>(&mut self, mut input: R, output: &mut W) -> CliResult<i32>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        loop {
            self.state = SessionState::Prompting;
            output.write_all(self.prompt.as_bytes()).await?;
            output.flush().await?;

            let mut line = String::new();
            if input.read_line(&mut line).await? == 0 {
                debug!("Input closed, leaving interactive mode");
                return Ok(EXIT_SUCCESS);
            }
            if line.trim().is_empty() {
                continue;
            }

            self.state = SessionState::Executing;
            trace!("Interactive line: {}", line.trim_end());
            self.execute(&split_line(&line)).await?;
        }
    }

    async fn execute(&self, tokens: &[String]) -> CliResult<()> {
        let verbose = verbose_override(tokens).unwrap_or(self.verbose_errors);
        let context = ParsedInvocation {
            interactive: true,
            verbose_errors: verbose,
            ..Default::default()
        };

        let mut invocation = match parse(tokens, self.dispatcher.surface()) {
            Ok(invocation) => invocation,
            Err(failure) => {
                let mut diagnostic = Diagnostic::from(failure);
                diagnostic.show_help = false;
                self.dispatcher.report(diagnostic, &context, None)?;
                return Ok(());
            }
        };
        invocation.interactive = true;
        invocation.verbose_errors = verbose;

        if invocation.help {
            let surface = self.dispatcher.surface();
            let help = invocation
                .command
                .as_deref()
                .and_then(|name| surface.command_help(name))
                .unwrap_or_else(|| surface.root_help());
            self.dispatcher.logger().info(&Value::String(help));
            return Ok(());
        }
        if invocation.command.is_none() {
            return Ok(());
        }

        match self.dispatcher.dispatch(&invocation).await {
            Ok(_) => Ok(()),
            Err(error) if verbose => Err(error),
            Err(error) => {
                self.dispatcher
                    .report(Diagnostic::new(error.full_chain(), false), &context, None)?;
                Ok(())
            }
        }
    }
}
