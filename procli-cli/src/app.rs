//! Application entry
//!
//! Ties argv parsing, help, the dispatcher and the interactive session
//! together and reduces every outcome to a process exit code.

use crate::dispatcher::{Dispatcher, ExitSignal};
use crate::error::CliResult;
use crate::exit_codes::EXIT_SUCCESS;
use crate::normalizer::Diagnostic;
use crate::output::Logger;
use crate::parser::{parse, verbose_override, ParsedInvocation};
use crate::session::InteractiveSession;
use crate::surface::Surface;
use procli_config::CliConfig;
use procli_contract::OperationExecutor;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncWrite};
use tracing::debug;

pub struct App {
    dispatcher: Dispatcher,
    config: CliConfig,
}

impl App {
    pub fn new(
        surface: Arc<Surface>,
        executor: Arc<dyn OperationExecutor>,
        logger: Arc<dyn Logger>,
        config: CliConfig,
    ) -> Self {
        Self {
            dispatcher: Dispatcher::new(surface, executor, logger),
            config,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Run one command line
    ///
    /// # Arguments
    ///
    /// * `argv` - Arguments after the program name
    /// * `input` - Line source for interactive mode
    /// * `output` - Prompt destination for interactive mode
    ///
    /// # Returns
    ///
    /// The process exit code, or an error raised past the diagnostic layer
    pub async fn run<R, W>(&self, argv: &[String], input: R, mut output: W) -> CliResult<i32>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let verbose = verbose_override(argv).unwrap_or(self.config.verbose_errors);
        let mut invocation = match parse(argv, self.dispatcher.surface()) {
            Ok(invocation) => invocation,
            Err(failure) => {
                let context = ParsedInvocation {
                    verbose_errors: verbose,
                    ..Default::default()
                };
                let surface = self.dispatcher.surface();
                let command = failure.command().and_then(|name| surface.command(name));
                let signal = self
                    .dispatcher
                    .report(Diagnostic::from(failure), &context, command)?;
                return Ok(exit_code(signal));
            }
        };
        invocation.verbose_errors = verbose;
        debug!(
            "Parsed invocation of {:?} (interactive: {}, help: {})",
            invocation.command, invocation.interactive, invocation.help
        );

        if invocation.help && !invocation.interactive {
            let surface = self.dispatcher.surface();
            let help = invocation
                .command
                .as_deref()
                .and_then(|name| surface.command_help(name))
                .unwrap_or_else(|| surface.root_help());
            self.dispatcher.logger().info(&Value::String(help));
            return Ok(EXIT_SUCCESS);
        }

        if invocation.interactive {
            if invocation.command.is_some() {
                self.dispatcher.dispatch(&invocation).await?;
            }
            let mut session = InteractiveSession::new(&self.dispatcher, &self.config.prompt, verbose);
            return session.run(input, &mut output).await;
        }

        let signal = self.dispatcher.dispatch(&invocation).await?;
        Ok(exit_code(signal))
    }
}

fn exit_code(signal: ExitSignal) -> i32 {
    match signal {
        ExitSignal::Exit(code) => code,
        ExitSignal::Continue => EXIT_SUCCESS,
    }
}
