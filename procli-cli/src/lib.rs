//! # Procli CLI
//!
//! Command-line front end generated from declared operations. Each operation's
//! input contract is compiled into positionals and flags, argv is parsed back
//! into structured input, and the result of the executor is printed.
//!
//! - [`surface`] - Command table and help rendering
//! - [`parser`] - Argv to [`parser::ParsedInvocation`]
//! - [`shorthand`] - `receiver.method(args)` call syntax
//! - [`dispatcher`] - Invocation to executor call
//! - [`normalizer`] - Executor errors to diagnostics
//! - [`session`] - Interactive read-dispatch loop
//! - [`app`] - Top-level run returning an exit code

pub mod app;
pub mod argv;
pub mod demo;
pub mod dispatcher;
pub mod error;
pub mod exit_codes;
pub mod normalizer;
pub mod output;
pub mod parser;
pub mod session;
pub mod shorthand;
pub mod surface;

pub use app::App;
pub use dispatcher::{Dispatcher, ExitSignal};
pub use error::{handle_cli_result, CliError, CliResult};
pub use normalizer::{normalize, Diagnostic};
pub use output::{ConsoleSink, LineByLineLogger, Logger, MemorySink, Sink};
pub use parser::{parse, ParseFailure, ParsedInvocation};
pub use session::InteractiveSession;
pub use surface::{
    alias_fn, AliasContext, AliasPolicy, ConfiguredAliases, Surface, SurfaceBuilder, SurfaceError,
};
