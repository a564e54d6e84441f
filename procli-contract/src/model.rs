//! Contract model
//!
//! An [`InputContract`] is a tagged tree describing the values an operation
//! accepts. Every node carries the same annotations (description, optional,
//! nullable, default) while the [`Shape`] carries the structure.
//!
//! Contracts serialize with a `type` tag so registries can be declared as data:
//!
//! ```rust
//! use procli_contract::{InputContract, Shape};
//!
//! let contract: InputContract = serde_json::from_value(serde_json::json!({
//!     "type": "object",
//!     "properties": {
//!         "name": { "type": "literal", "kind": "string", "description": "Who to greet" }
//!     }
//! }))
//! .unwrap();
//! assert!(matches!(contract.shape, Shape::Object(_)));
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

fn is_false(value: &bool) -> bool {
    !*value
}

/// Structural description of a value accepted by an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputContract {
    #[serde(flatten)]
    pub shape: Shape,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// The structural part of a contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    /// Accepts no input at all
    Empty,
    Literal(LiteralShape),
    Object(ObjectShape),
    Tuple(TupleShape),
    Array(ArrayShape),
    Union(UnionShape),
}

/// Primitive kinds a literal contract can accept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiteralKind {
    String,
    Number,
    Boolean,
}

impl LiteralKind {
    /// Lowercase name used in validation messages
    pub fn as_str(self) -> &'static str {
        match self {
            LiteralKind::String => "string",
            LiteralKind::Number => "number",
            LiteralKind::Boolean => "boolean",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiteralShape {
    pub kind: LiteralKind,
    /// Only whole numbers are accepted (number kind only)
    #[serde(default, skip_serializing_if = "is_false")]
    pub integer: bool,
    /// Closed set of accepted values; a single entry is a literal constant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<Value>>,
    /// Regular expression string values must match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectShape {
    #[serde(default)]
    pub properties: IndexMap<String, InputContract>,
}

/// Fixed-length positional list. Leading items are literals or lists of
/// literals; an object-accepting item may only appear last.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TupleShape {
    pub items: Vec<InputContract>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayShape {
    pub element: Box<InputContract>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnionShape {
    pub variants: Vec<InputContract>,
}

/// Value kind of a single object property, as seen by the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    String,
    Number,
    Boolean,
    Array,
    Object,
    /// Mixed or unknown kind; the raw token is passed through unchanged
    Any,
}

impl InputContract {
    fn from_shape(shape: Shape) -> Self {
        Self {
            shape,
            description: None,
            optional: false,
            nullable: false,
            default: None,
        }
    }

    pub fn empty() -> Self {
        Self::from_shape(Shape::Empty)
    }

    pub fn literal(kind: LiteralKind) -> Self {
        Self::from_shape(Shape::Literal(LiteralShape {
            kind,
            integer: false,
            one_of: None,
            pattern: None,
        }))
    }

    pub fn string() -> Self {
        Self::literal(LiteralKind::String)
    }

    pub fn number() -> Self {
        Self::literal(LiteralKind::Number)
    }

    pub fn integer() -> Self {
        let mut contract = Self::number();
        if let Shape::Literal(literal) = &mut contract.shape {
            literal.integer = true;
        }
        contract
    }

    pub fn boolean() -> Self {
        Self::literal(LiteralKind::Boolean)
    }

    /// A contract accepting exactly one constant value
    ///
    /// Returns an empty contract when the value is not a primitive.
    pub fn constant(value: Value) -> Self {
        let kind = match &value {
            Value::String(_) => LiteralKind::String,
            Value::Number(_) => LiteralKind::Number,
            Value::Bool(_) => LiteralKind::Boolean,
            _ => return Self::empty(),
        };
        Self::from_shape(Shape::Literal(LiteralShape {
            kind,
            integer: false,
            one_of: Some(vec![value]),
            pattern: None,
        }))
    }

    /// A string contract restricted to the given options
    pub fn enumeration<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_shape(Shape::Literal(LiteralShape {
            kind: LiteralKind::String,
            integer: false,
            one_of: Some(
                options
                    .into_iter()
                    .map(|option| Value::String(option.into()))
                    .collect(),
            ),
            pattern: None,
        }))
    }

    pub fn object<I, S>(properties: I) -> Self
    where
        I: IntoIterator<Item = (S, InputContract)>,
        S: Into<String>,
    {
        Self::from_shape(Shape::Object(ObjectShape {
            properties: properties
                .into_iter()
                .map(|(name, contract)| (name.into(), contract))
                .collect(),
        }))
    }

    pub fn tuple(items: Vec<InputContract>) -> Self {
        Self::from_shape(Shape::Tuple(TupleShape { items }))
    }

    pub fn array(element: InputContract) -> Self {
        Self::from_shape(Shape::Array(ArrayShape {
            element: Box::new(element),
        }))
    }

    pub fn union(variants: Vec<InputContract>) -> Self {
        Self::from_shape(Shape::Union(UnionShape { variants }))
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Restrict string values to a regular expression. Ignored for non-literals.
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        if let Shape::Literal(literal) = &mut self.shape {
            literal.pattern = Some(pattern.into());
        }
        self
    }

    /// Whether an absent value is acceptable
    pub fn may_be_absent(&self) -> bool {
        self.optional || self.default.is_some()
    }

    /// Literal kinds this contract accepts, in boolean, number, string order
    pub fn literal_kinds(&self) -> Vec<LiteralKind> {
        [LiteralKind::Boolean, LiteralKind::Number, LiteralKind::String]
            .into_iter()
            .filter(|kind| self.accepts_kind(*kind))
            .collect()
    }

    /// Whether some value of the given primitive kind satisfies this contract
    pub fn accepts_kind(&self, kind: LiteralKind) -> bool {
        match &self.shape {
            Shape::Literal(literal) => literal.kind == kind,
            Shape::Union(union) => union.variants.iter().any(|v| v.accepts_kind(kind)),
            _ => false,
        }
    }

    /// Whether some object value satisfies this contract
    pub fn accepts_object(&self) -> bool {
        match &self.shape {
            Shape::Object(_) => true,
            Shape::Union(union) => union.variants.iter().any(InputContract::accepts_object),
            _ => false,
        }
    }

    /// Whether every accepted value is a primitive
    pub fn is_literal_only(&self) -> bool {
        match &self.shape {
            Shape::Literal(_) => true,
            Shape::Union(union) => {
                !union.variants.is_empty()
                    && union.variants.iter().all(InputContract::is_literal_only)
            }
            _ => false,
        }
    }

    /// Element contract when this is a list of primitives
    pub fn literal_list_element(&self) -> Option<&InputContract> {
        match &self.shape {
            Shape::Array(array) if array.element.is_literal_only() => Some(&array.element),
            _ => None,
        }
    }

    /// Short structural name used in compile error messages
    pub fn type_name(&self) -> String {
        let base = match &self.shape {
            Shape::Empty => "Empty".to_string(),
            Shape::Literal(literal) => match &literal.one_of {
                Some(values) if values.len() == 1 => "Literal".to_string(),
                Some(_) => "Enum".to_string(),
                None => match literal.kind {
                    LiteralKind::String => "String".to_string(),
                    LiteralKind::Number => "Number".to_string(),
                    LiteralKind::Boolean => "Boolean".to_string(),
                },
            },
            Shape::Object(_) => "Object".to_string(),
            Shape::Tuple(_) => "Tuple".to_string(),
            Shape::Array(array) => format!("{}[]", array.element.type_name()),
            Shape::Union(_) => "Union".to_string(),
        };
        if self.nullable {
            format!("Nullable<{}>", base)
        } else {
            base
        }
    }

    /// Command-line value kind for a property with this contract
    pub fn value_kind(&self) -> ValueKind {
        match &self.shape {
            Shape::Literal(literal) => match literal.kind {
                LiteralKind::String => ValueKind::String,
                LiteralKind::Number => ValueKind::Number,
                LiteralKind::Boolean => ValueKind::Boolean,
            },
            Shape::Array(_) | Shape::Tuple(_) => ValueKind::Array,
            Shape::Object(_) => ValueKind::Object,
            Shape::Union(_) => {
                let kinds = self.literal_kinds();
                if kinds.len() == 1 && !self.accepts_object() {
                    match kinds[0] {
                        LiteralKind::String => ValueKind::String,
                        LiteralKind::Number => ValueKind::Number,
                        LiteralKind::Boolean => ValueKind::Boolean,
                    }
                } else {
                    ValueKind::Any
                }
            }
            Shape::Empty => ValueKind::Any,
        }
    }
}

/// How an operation behaves with respect to state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Read,
    Write,
    Stream,
}

/// Call shape an executor uses for an operation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallStyle {
    Query,
    Mutation,
}

impl CallStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            CallStyle::Query => "query",
            CallStyle::Mutation => "mutation",
        }
    }
}

impl OperationKind {
    /// Read operations are queries; everything else is a mutation
    pub fn call_style(self) -> CallStyle {
        match self {
            OperationKind::Read => CallStyle::Query,
            OperationKind::Write | OperationKind::Stream => CallStyle::Mutation,
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            OperationKind::Read => "Read",
            OperationKind::Write => "Write",
            OperationKind::Stream => "Stream",
        };
        f.write_str(label)
    }
}

/// Help metadata attached to an operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

/// A declared operation: name, input contract chain, kind and help metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub name: String,
    #[serde(default)]
    pub contracts: Vec<InputContract>,
    pub kind: OperationKind,
    #[serde(default)]
    pub meta: OperationMeta,
}

impl Operation {
    pub fn new(name: impl Into<String>, kind: OperationKind) -> Self {
        Self {
            name: name.into(),
            contracts: Vec::new(),
            kind,
            meta: OperationMeta::default(),
        }
    }

    /// Append a contract to the input chain
    pub fn input(mut self, contract: InputContract) -> Self {
        self.contracts.push(contract);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.meta.description = Some(description.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.meta.version = Some(version.into());
        self
    }

    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.meta.usage = Some(usage.into());
        self
    }

    pub fn example(mut self, example: impl Into<String>) -> Self {
        self.meta.examples.push(example.into());
        self
    }
}
