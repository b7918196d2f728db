//! Core types used throughout the CRM console
//!
//! This module contains the fundamental types shared by the schema model,
//! the form renderers and the command-line front end.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::error::ConsoleError;

// ============================================================================
// Records
// ============================================================================

/// A mapping from field name to value, in document order
pub type Record = Map<String, Value>;

/// Identifying key assumed when a schema does not name one
pub const DEFAULT_PRIMARY_KEY: &str = "_id";

/// Render a value the way a table cell or text input shows it
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

// ============================================================================
// Operation Mode
// ============================================================================

/// What a form is being built for
///
/// The mode picks the display-hint order a group uses and the policy for
/// aggregating child values into a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OperationMode {
    /// New record: empty values are omitted
    #[default]
    Create,
    /// Existing record: only changed values are sent
    Update,
    /// Query builder: empty values are omitted, nothing is required
    Search,
}

impl OperationMode {
    /// Key of the display hint holding this mode's child order
    pub fn hint_key(&self) -> &'static str {
        match self {
            OperationMode::Create => "create",
            OperationMode::Update => "update",
            OperationMode::Search => "search",
        }
    }
}

impl std::fmt::Display for OperationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hint_key())
    }
}

impl FromStr for OperationMode {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" | "insert" => Ok(OperationMode::Create),
            "update" => Ok(OperationMode::Update),
            "search" => Ok(OperationMode::Search),
            other => Err(ConsoleError::InvalidConfig(format!(
                "unknown operation mode '{}'",
                other
            ))),
        }
    }
}

// ============================================================================
// Semantic Types
// ============================================================================

/// Semantic type tags a leaf node may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    /// Anything at all
    Any,
    /// Base64 encoded text
    Base64,
    /// true/false
    Bool,
    /// Calendar date, `YYYY-MM-DD`
    Date,
    /// Date and time, `YYYY-MM-DD HH:MM:SS`
    Datetime,
    /// Arbitrary precision number
    Decimal,
    /// Floating point number
    Float,
    /// Signed integer
    Int,
    /// Dotted IPv4 address
    Ip,
    /// JSON encoded text
    Json,
    /// MD5 hex digest
    Md5,
    /// Currency amount, at most two decimal places
    Price,
    /// Free text
    String,
    /// Clock time, `HH:MM:SS`
    Time,
    /// Unix timestamp
    Timestamp,
    /// Unsigned integer
    Uint,
    /// Any UUID
    Uuid,
    /// Version 4 UUID
    Uuid4,
}

/// Broad family a semantic type belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeFamily {
    Text,
    Numeric,
    Boolean,
    Temporal,
}

impl SemanticType {
    /// Tag as written in schema documents
    pub fn tag(&self) -> &'static str {
        match self {
            SemanticType::Any => "any",
            SemanticType::Base64 => "base64",
            SemanticType::Bool => "bool",
            SemanticType::Date => "date",
            SemanticType::Datetime => "datetime",
            SemanticType::Decimal => "decimal",
            SemanticType::Float => "float",
            SemanticType::Int => "int",
            SemanticType::Ip => "ip",
            SemanticType::Json => "json",
            SemanticType::Md5 => "md5",
            SemanticType::Price => "price",
            SemanticType::String => "string",
            SemanticType::Time => "time",
            SemanticType::Timestamp => "timestamp",
            SemanticType::Uint => "uint",
            SemanticType::Uuid => "uuid",
            SemanticType::Uuid4 => "uuid4",
        }
    }

    /// Get the family of this type
    pub fn family(&self) -> TypeFamily {
        match self {
            SemanticType::Any
            | SemanticType::Base64
            | SemanticType::Ip
            | SemanticType::Json
            | SemanticType::Md5
            | SemanticType::String
            | SemanticType::Uuid
            | SemanticType::Uuid4 => TypeFamily::Text,
            SemanticType::Decimal
            | SemanticType::Float
            | SemanticType::Int
            | SemanticType::Price
            | SemanticType::Timestamp
            | SemanticType::Uint => TypeFamily::Numeric,
            SemanticType::Bool => TypeFamily::Boolean,
            SemanticType::Date | SemanticType::Datetime | SemanticType::Time => {
                TypeFamily::Temporal
            }
        }
    }

    /// Check if values of this type must be whole numbers
    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            SemanticType::Int | SemanticType::Uint | SemanticType::Timestamp
        )
    }

    /// Get all semantic types
    pub fn all() -> &'static [SemanticType] {
        &[
            SemanticType::Any,
            SemanticType::Base64,
            SemanticType::Bool,
            SemanticType::Date,
            SemanticType::Datetime,
            SemanticType::Decimal,
            SemanticType::Float,
            SemanticType::Int,
            SemanticType::Ip,
            SemanticType::Json,
            SemanticType::Md5,
            SemanticType::Price,
            SemanticType::String,
            SemanticType::Time,
            SemanticType::Timestamp,
            SemanticType::Uint,
            SemanticType::Uuid,
            SemanticType::Uuid4,
        ]
    }
}

impl std::fmt::Display for SemanticType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl FromStr for SemanticType {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SemanticType::all()
            .iter()
            .copied()
            .find(|t| t.tag() == s)
            .ok_or_else(|| ConsoleError::unknown_type("", s))
    }
}

// ============================================================================
// Select Options
// ============================================================================

/// One entry of a select control: stored value and shown label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    /// Create a new option
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    /// Option whose label is its value
    pub fn same(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
        }
    }

    /// The leading empty option of an optional select
    pub fn blank() -> Self {
        Self::new("", "")
    }

    /// Check if this is the blank option
    pub fn is_blank(&self) -> bool {
        self.value.is_empty()
    }
}

impl From<(String, String)> for SelectOption {
    fn from((value, label): (String, String)) -> Self {
        Self { value, label }
    }
}

impl From<SelectOption> for (String, String) {
    fn from(opt: SelectOption) -> Self {
        (opt.value, opt.label)
    }
}

// ============================================================================
// Tests
// ============================================================================
