//! # Procli Contract
//!
//! Input contracts and their compilation into command-line surfaces.
//!
//! - [`model`] - The contract tree, operations and their metadata
//! - [`compiler`] - Contract chain to [`CompiledCommand`]
//! - [`convert`] - Raw token to typed value conversion
//! - [`validate`] - Structural conformance check of a value against a contract
//! - [`executor`] - The seam through which operations are executed

pub mod compiler;
pub mod convert;
pub mod executor;
pub mod model;
pub mod validate;

pub use compiler::{
    compile, kebab_case, CompileError, CompiledCommand, FlagDefinition, PositionalParameter,
    RawFlags,
};
pub use convert::{number_value, parse_number, RawFlagValue};
pub use executor::{ExecutorError, OperationExecutor, ValidationError};
pub use model::{
    CallStyle, InputContract, LiteralKind, Operation, OperationKind, OperationMeta, Shape,
    ValueKind,
};
pub use validate::{check, conforms, Issue, PathSegment};
