//! # Procli Router
//!
//! An in-process home for operations: the [`OperationRegistry`] owns each
//! [`Operation`](procli_contract::Operation) together with its handler, and
//! the [`LocalExecutor`] runs them on behalf of the command layer.
//!
//! ```rust
//! use procli_contract::{InputContract, Operation, OperationKind};
//! use procli_router::{handler_fn, OperationRegistry};
//! use serde_json::json;
//!
//! let mut registry = OperationRegistry::new();
//! registry.register(
//!     Operation::new("greet", OperationKind::Read).input(InputContract::string()),
//!     handler_fn(|input| Ok(Some(json!(format!("hello {}", input.as_str().unwrap_or("?")))))),
//! );
//! assert_eq!(registry.len(), 1);
//! ```

pub mod executor;
pub mod registry;

pub use executor::LocalExecutor;
pub use registry::{handler_fn, FnHandler, HandlerError, OperationHandler, OperationRegistry};
