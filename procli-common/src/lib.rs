//! # Procli Common
//!
//! Foundational types shared by every procli crate.
//!
//! ## Modules
//!
//! - [`error`] - Severity classification implemented by all procli error types
//! - [`logging`] - Helpers for rendering structured values in `tracing` output

pub mod error;
pub mod logging;

pub use error::{ErrorSeverity, Severity};
pub use logging::Pretty;
