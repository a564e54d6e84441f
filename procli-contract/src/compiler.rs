//! Contract compiler
//!
//! Turns the input contract chain of an [`Operation`] into a [`CompiledCommand`]:
//! the positional parameters, the flags, the pairs of flags that can never be
//! combined, and the rule that rebuilds structured input from raw tokens.
//!
//! Rules, in priority order:
//!
//! 1. No contracts: no positionals, no flags, input is `{}`.
//! 2. A contract accepting only literals: one positional.
//! 3. A tuple: one positional per leading literal (or literal list) item; an
//!    object-accepting last item contributes flags.
//! 4. A list of literals: every positional token, converted by element.
//! 5. An object-accepting contract: its properties become flags.
//! 6. Several contracts: each must accept objects; their flags are merged.
//!
//! A union of object variants additionally yields incompatible flag pairs.

use crate::convert::{convert_flag_token, convert_positional, RawFlagValue};
use crate::model::{InputContract, Operation, OperationKind, OperationMeta, Shape, ValueKind};
use indexmap::{IndexMap, IndexSet};
use procli_common::{ErrorSeverity, Severity};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, trace};

/// Raw flag values keyed by property name
pub type RawFlags = IndexMap<String, RawFlagValue>;

/// Why an operation could not be turned into a command
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("Invalid input type {types}. Positional parameters must be strings, numbers or booleans.")]
    InvalidPositional { types: String },

    #[error("Invalid input type {types}. The last type must accept object inputs.")]
    TrailingNotObject { types: String },

    #[error("Invalid input type {types}. Only the last positional parameter may be a list.")]
    ListNotLast { types: String },

    #[error("Invalid input type {type_name}. Nullable arrays are not supported.")]
    NullableArray { type_name: String },

    #[error("Invalid input type {type_name}, expected object or tuple")]
    NotObject { type_name: String },

    #[error("Invalid multi-input type {types}. All inputs must accept object inputs.")]
    MultiInput { types: String },
}

impl Severity for CompileError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Warning
    }
}

/// A positional parameter of a compiled command
#[derive(Debug, Clone, PartialEq)]
pub struct PositionalParameter {
    /// Bare name: the item description or `parameter N`
    pub name: String,
    pub required: bool,
    /// Collects every remaining positional token
    pub list: bool,
}

impl PositionalParameter {
    /// Help rendering: `<name>`, `[name]` or `[name...]`
    pub fn display(&self) -> String {
        if self.list {
            format!("[{}...]", self.name)
        } else if self.required {
            format!("<{}>", self.name)
        } else {
            format!("[{}]", self.name)
        }
    }
}

/// A flag of a compiled command
#[derive(Debug, Clone, PartialEq)]
pub struct FlagDefinition {
    /// Property name; key of the structured input
    pub name: String,
    /// Long option spelling, kebab-cased
    pub long: String,
    pub value_kind: ValueKind,
    pub multiple: bool,
    pub alias: Option<char>,
    pub default: Option<Value>,
    pub description: Option<String>,
    pub required: bool,
    contract: InputContract,
}

impl FlagDefinition {
    fn new(name: &str, contract: &InputContract, required: bool) -> Self {
        let value_kind = contract.value_kind();
        let multiple = value_kind == ValueKind::Array;
        Self {
            name: name.to_string(),
            long: kebab_case(name),
            value_kind,
            multiple,
            alias: None,
            default: contract.default.clone(),
            description: flag_description(contract, required),
            required,
            contract: contract.clone(),
        }
    }

    /// Whether the flag is a switch that takes no value token
    pub fn is_switch(&self) -> bool {
        self.value_kind == ValueKind::Boolean
    }

    pub fn contract(&self) -> &InputContract {
        &self.contract
    }

    /// Whether `spelling` (without leading dashes) names this flag
    pub fn matches_long(&self, spelling: &str) -> bool {
        spelling == self.long || spelling == self.name
    }

    /// Convert the raw value collected for this flag
    pub fn convert(&self, raw: &RawFlagValue) -> Value {
        if self.multiple {
            let element = match &self.contract.shape {
                Shape::Array(array) => Some(array.element.as_ref()),
                _ => None,
            };
            let items = raw
                .tokens()
                .into_iter()
                .map(|token| match element {
                    Some(element) if element.is_literal_only() => {
                        convert_positional(element, token)
                    }
                    Some(element) => convert_flag_token(element.value_kind(), token),
                    None => Value::String(token.to_string()),
                })
                .collect();
            return Value::Array(items);
        }

        match raw {
            RawFlagValue::Switch => Value::Bool(true),
            RawFlagValue::Single(token) => convert_flag_token(self.value_kind, token),
            RawFlagValue::Many(tokens) => match tokens.last() {
                Some(token) => convert_flag_token(self.value_kind, token),
                None => Value::Bool(true),
            },
        }
    }
}

/// How structured input is rebuilt from raw tokens
#[derive(Debug, Clone, PartialEq)]
enum InputExtractor {
    /// No contracts: always `{}`
    Empty,
    /// A contract that accepts nothing: always `null`
    Nothing,
    Literal(InputContract),
    List(InputContract),
    Tuple {
        positionals: Vec<InputContract>,
        trailing_flags: bool,
    },
    Flags,
}

/// The command-line surface derived from one operation
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledCommand {
    pub name: String,
    pub kind: OperationKind,
    pub meta: OperationMeta,
    pub parameters: Vec<PositionalParameter>,
    pub flags: IndexMap<String, FlagDefinition>,
    pub incompatible_pairs: Vec<(String, String)>,
    extractor: InputExtractor,
}

impl CompiledCommand {
    fn new(operation: &Operation, extractor: InputExtractor) -> Self {
        Self {
            name: operation.name.clone(),
            kind: operation.kind,
            meta: operation.meta.clone(),
            parameters: Vec::new(),
            flags: IndexMap::new(),
            incompatible_pairs: Vec::new(),
            extractor,
        }
    }

    /// Look up a flag by long spelling (kebab-case or property name)
    pub fn flag_by_long(&self, spelling: &str) -> Option<&FlagDefinition> {
        self.flags.values().find(|flag| flag.matches_long(spelling))
    }

    pub fn flag_by_alias(&self, alias: char) -> Option<&FlagDefinition> {
        self.flags.values().find(|flag| flag.alias == Some(alias))
    }

    /// Set the single-character alias of a flag
    pub fn assign_alias(&mut self, flag: &str, alias: char) {
        if let Some(definition) = self.flags.get_mut(flag) {
            definition.alias = Some(alias);
        }
    }

    /// Rebuild the structured input for this command
    ///
    /// # Arguments
    ///
    /// * `positionals` - Positional tokens following the command name
    /// * `flags` - Raw flag values keyed by property name
    ///
    /// # Returns
    ///
    /// The value passed to the operation executor
    pub fn extract(&self, positionals: &[String], flags: &RawFlags) -> Value {
        match &self.extractor {
            InputExtractor::Empty => Value::Object(Map::new()),
            InputExtractor::Nothing => Value::Null,
            InputExtractor::Literal(contract) => positionals
                .first()
                .map(|token| convert_positional(contract, token))
                .unwrap_or(Value::Null),
            InputExtractor::List(element) => Value::Array(
                positionals
                    .iter()
                    .map(|token| convert_positional(element, token))
                    .collect(),
            ),
            InputExtractor::Tuple {
                positionals: items,
                trailing_flags,
            } => {
                let mut values = Vec::with_capacity(items.len() + 1);
                for (index, item) in items.iter().enumerate() {
                    match item.literal_list_element() {
                        Some(element) => values.push(Value::Array(
                            positionals
                                .iter()
                                .skip(index)
                                .map(|token| convert_positional(element, token))
                                .collect(),
                        )),
                        None => values.push(
                            positionals
                                .get(index)
                                .map(|token| convert_positional(item, token))
                                .unwrap_or(Value::Null),
                        ),
                    }
                }
                if positionals.len() > items.len() && !items.iter().any(|i| i.literal_list_element().is_some()) {
                    debug!(
                        "Ignoring {} surplus positional token(s) for {}",
                        positionals.len() - items.len(),
                        self.name
                    );
                }
                if *trailing_flags {
                    values.push(self.flag_values(flags));
                }
                Value::Array(values)
            }
            InputExtractor::Flags => self.flag_values(flags),
        }
    }

    fn flag_values(&self, flags: &RawFlags) -> Value {
        let mut object = Map::new();
        for (name, definition) in &self.flags {
            match flags.get(name) {
                Some(raw) => {
                    object.insert(name.clone(), definition.convert(raw));
                }
                None => {
                    if let Some(default) = &definition.default {
                        object.insert(name.clone(), default.clone());
                    }
                }
            }
        }
        Value::Object(object)
    }
}

/// Compile an operation's contract chain into a command
pub fn compile(operation: &Operation) -> Result<CompiledCommand, CompileError> {
    trace!("Compiling operation {}", operation.name);
    let contracts = &operation.contracts;

    let command = match contracts.as_slice() {
        [] => CompiledCommand::new(operation, InputExtractor::Empty),
        [single] => compile_single(operation, single)?,
        many => compile_chain(operation, many)?,
    };

    debug!(
        "Compiled {}: {} positional(s), {} flag(s), {} incompatible pair(s)",
        command.name,
        command.parameters.len(),
        command.flags.len(),
        command.incompatible_pairs.len()
    );
    Ok(command)
}

fn compile_single(
    operation: &Operation,
    contract: &InputContract,
) -> Result<CompiledCommand, CompileError> {
    if contract.is_literal_only() {
        let mut command = CompiledCommand::new(operation, InputExtractor::Literal(contract.clone()));
        command.parameters.push(PositionalParameter {
            name: contract
                .description
                .clone()
                .unwrap_or_else(|| "value".to_string()),
            required: !contract.may_be_absent(),
            list: false,
        });
        return Ok(command);
    }

    match &contract.shape {
        Shape::Empty => Ok(CompiledCommand::new(operation, InputExtractor::Nothing)),
        Shape::Tuple(tuple) => compile_tuple(operation, &tuple.items),
        Shape::Array(array) if array.element.is_literal_only() => {
            if array.element.nullable {
                return Err(CompileError::NullableArray {
                    type_name: contract.type_name(),
                });
            }
            Ok(CompiledCommand::new(
                operation,
                InputExtractor::List((*array.element).clone()),
            ))
        }
        _ if contract.accepts_object() => {
            let mut command = CompiledCommand::new(operation, InputExtractor::Flags);
            add_flags(&mut command, contract);
            Ok(command)
        }
        _ => Err(CompileError::NotObject {
            type_name: contract.type_name(),
        }),
    }
}

fn compile_tuple(
    operation: &Operation,
    items: &[InputContract],
) -> Result<CompiledCommand, CompileError> {
    let types = format!(
        "[{}]",
        items
            .iter()
            .map(InputContract::type_name)
            .collect::<Vec<_>>()
            .join(", ")
    );

    let is_positional =
        |item: &InputContract| item.is_literal_only() || item.literal_list_element().is_some();
    let non_positional = items.iter().position(|item| !is_positional(item));

    if let Some(index) = non_positional {
        if index != items.len() - 1 {
            return Err(CompileError::InvalidPositional { types });
        }
    }

    let positionals = match non_positional {
        Some(index) => &items[..index],
        None => items,
    };

    for (index, item) in positionals.iter().enumerate() {
        if let Some(element) = item.literal_list_element() {
            if element.nullable {
                return Err(CompileError::NullableArray {
                    type_name: item.type_name(),
                });
            }
            if index != positionals.len() - 1 {
                return Err(CompileError::ListNotLast { types });
            }
        }
    }

    let trailing = non_positional.map(|index| &items[index]);
    if let Some(last) = trailing {
        if !last.accepts_object() {
            return Err(CompileError::TrailingNotObject { types });
        }
    }

    let mut command = CompiledCommand::new(
        operation,
        InputExtractor::Tuple {
            positionals: positionals.to_vec(),
            trailing_flags: trailing.is_some(),
        },
    );
    command.parameters = positionals
        .iter()
        .enumerate()
        .map(|(index, item)| parameter_for(item, index + 1))
        .collect();
    if let Some(last) = trailing {
        add_flags(&mut command, last);
    }
    Ok(command)
}

fn compile_chain(
    operation: &Operation,
    contracts: &[InputContract],
) -> Result<CompiledCommand, CompileError> {
    if !contracts.iter().all(InputContract::accepts_object) {
        return Err(CompileError::MultiInput {
            types: contracts
                .iter()
                .map(InputContract::type_name)
                .collect::<Vec<_>>()
                .join(", "),
        });
    }

    let mut command = CompiledCommand::new(operation, InputExtractor::Flags);
    for contract in contracts {
        for (name, (property, required)) in flattened_properties(contract) {
            command
                .flags
                .insert(name.clone(), FlagDefinition::new(&name, &property, required));
        }
    }
    Ok(command)
}

fn parameter_for(item: &InputContract, position: usize) -> PositionalParameter {
    let named = |contract: &InputContract| {
        contract
            .description
            .clone()
            .unwrap_or_else(|| format!("parameter {}", position))
    };
    match item.literal_list_element() {
        Some(element) => PositionalParameter {
            name: item.description.clone().unwrap_or_else(|| named(element)),
            required: false,
            list: true,
        },
        None => PositionalParameter {
            name: named(item),
            required: !item.may_be_absent(),
            list: false,
        },
    }
}

fn add_flags(command: &mut CompiledCommand, contract: &InputContract) {
    for (name, (property, required)) in flattened_properties(contract) {
        command
            .flags
            .insert(name.clone(), FlagDefinition::new(&name, &property, required));
    }
    command.incompatible_pairs = incompatible_pairs(contract);
}

/// Properties reachable through objects and unions, with requiredness
///
/// Properties contributed by union variants are never required on the
/// command line. A key seen twice keeps its first position and its last
/// definition.
pub fn flattened_properties(contract: &InputContract) -> IndexMap<String, (InputContract, bool)> {
    let mut properties = IndexMap::new();
    match &contract.shape {
        Shape::Object(object) => {
            for (name, property) in &object.properties {
                properties.insert(name.clone(), (property.clone(), !property.may_be_absent()));
            }
        }
        Shape::Union(union) => {
            for variant in &union.variants {
                for (name, (property, _)) in flattened_properties(variant) {
                    properties.insert(name, (property, false));
                }
            }
        }
        _ => {}
    }
    properties
}

/// Pairs of keys that never appear together in any union variant
///
/// Each pair is ordered so that the first key sorts before the second.
pub fn incompatible_pairs(contract: &InputContract) -> Vec<(String, String)> {
    let Shape::Union(union) = &contract.shape else {
        return Vec::new();
    };

    let variant_keys: Vec<IndexSet<String>> = union
        .variants
        .iter()
        .map(|variant| flattened_properties(variant).into_keys().collect())
        .collect();

    let all_keys: IndexSet<&String> = variant_keys.iter().flatten().collect();

    let mut pairs = Vec::new();
    for keys in &variant_keys {
        for key in keys {
            let compatible: IndexSet<&String> = variant_keys
                .iter()
                .filter(|other| other.contains(key))
                .flatten()
                .collect();
            for other in &all_keys {
                if key < *other && !compatible.contains(*other) {
                    let pair = (key.clone(), (*other).clone());
                    if !pairs.contains(&pair) {
                        pairs.push(pair);
                    }
                }
            }
        }
    }
    pairs
}

/// Convert a camelCase or snake_case property name to kebab-case
pub fn kebab_case(name: &str) -> String {
    let mut kebab = String::with_capacity(name.len() + 4);
    for (index, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if index > 0 {
                kebab.push('-');
            }
            kebab.push(c.to_ascii_lowercase());
        } else if c == '_' {
            kebab.push('-');
        } else {
            kebab.push(c);
        }
    }
    kebab
}

fn flag_description(contract: &InputContract, required: bool) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(description) = &contract.description {
        parts.push(description.clone());
    }
    match &contract.shape {
        Shape::Literal(literal) => {
            if let Some(options) = &literal.one_of {
                let rendered: Vec<String> = options
                    .iter()
                    .map(|option| match option {
                        Value::String(text) => text.clone(),
                        other => other.to_string(),
                    })
                    .collect();
                parts.push(format!("One of: {}", rendered.join(", ")));
            }
            if let Some(pattern) = &literal.pattern {
                parts.push(format!("Pattern: {}", pattern));
            }
        }
        Shape::Object(_) => parts.push("Object (JSON formatted)".to_string()),
        Shape::Array(_) => parts.push("(array)".to_string()),
        _ => {}
    }

    let mut description = parts.join("; ");
    if !required {
        description = format!("{} (optional)", description).trim().to_string();
    }
    if description.is_empty() {
        None
    } else {
        Some(description)
    }
}
