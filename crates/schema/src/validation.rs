//! Record validation
//!
//! Leaf checks live on `LeafNode`; this module walks whole records against a
//! schema tree and runs record-level rules on top. Results carry one error
//! per offending dotted path and convert into an `ErrorTree` for routing
//! back to field renderers.

use crate::error_tree::ErrorTree;
use crate::node::{GroupNode, SchemaNode, join_path};
use crate::tree::SchemaTree;
use crm_core::{ConsoleError, ConsoleResult, Record, value_text};
use serde_json::Value;

// ============================================================================
// ValidationResult
// ============================================================================

/// Result of validating a record
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    /// Whether the record passed
    pub valid: bool,

    /// Errors, one per offending path
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    /// Create a passing result
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    /// Create a failing result with one error
    pub fn error(error: ValidationError) -> Self {
        Self {
            valid: false,
            errors: vec![error],
        }
    }

    /// Add an error
    pub fn add_error(&mut self, error: ValidationError) {
        self.valid = false;
        self.errors.push(error);
    }

    /// Merge another result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        if !other.valid {
            self.valid = false;
        }
        self.errors.extend(other.errors);
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Error for a path, if any
    pub fn error_at(&self, path: &str) -> Option<&ValidationError> {
        self.errors.iter().find(|e| e.path == path)
    }

    /// Errors nested by path
    pub fn to_error_tree(&self) -> ErrorTree {
        ErrorTree::from_pairs(self.errors.iter().map(|e| (e.path.as_str(), e.message.clone())))
    }

    /// Convert to a `ConsoleResult` (fails if any errors)
    pub fn to_result(self) -> ConsoleResult<()> {
        if self.valid {
            Ok(())
        } else {
            let msg = self
                .errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            Err(ConsoleError::with_context("Record validation failed", msg))
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::ok()
    }
}

// ============================================================================
// ValidationError
// ============================================================================

/// A validation error at a dotted path
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error code for programmatic handling
    pub code: ValidationErrorCode,

    /// Human-readable message
    pub message: String,

    /// Dotted path to the offending value
    pub path: String,
}

impl ValidationError {
    /// Create an error with the code's default message
    pub fn new(code: ValidationErrorCode, path: impl Into<String>) -> Self {
        Self {
            code,
            message: code.message().to_string(),
            path: path.into(),
        }
    }

    /// Replace the message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.path, self.message)
    }
}

// ============================================================================
// ValidationErrorCode
// ============================================================================

/// Why a value was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorCode {
    /// Required value is null or absent
    Missing,
    /// Value does not fit the semantic type
    Invalid,
    /// Value is below the minimum
    BelowMinimum,
    /// Value is above the maximum
    AboveMaximum,
    /// Value is not one of the options
    NotAnOption,
    /// Text does not match the pattern
    PatternMismatch,
    /// Record has a key the schema does not declare
    UnknownField,
    /// Two values that must agree do not
    Mismatch,
}

impl ValidationErrorCode {
    /// Default message for this code
    pub fn message(&self) -> &'static str {
        match self {
            ValidationErrorCode::Missing => "missing",
            ValidationErrorCode::Invalid => "invalid",
            ValidationErrorCode::BelowMinimum => "below minimum",
            ValidationErrorCode::AboveMaximum => "above maximum",
            ValidationErrorCode::NotAnOption => "not a valid option",
            ValidationErrorCode::PatternMismatch => "does not match pattern",
            ValidationErrorCode::UnknownField => "not a valid field",
            ValidationErrorCode::Mismatch => "does not match",
        }
    }
}

impl std::fmt::Display for ValidationErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

// ============================================================================
// Strictness
// ============================================================================

/// How much of a record must be present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    /// Every required leaf must be present (create)
    #[default]
    Full,
    /// Only present values are checked (update, search)
    Partial,
}

// ============================================================================
// RecordRule Trait
// ============================================================================

/// A check run over a whole record
pub trait RecordRule: Send + Sync {
    /// Get the rule name
    fn name(&self) -> &'static str;

    /// Get the rule description
    fn description(&self) -> &'static str;

    /// Validate a record and return the result
    fn validate(&self, tree: &SchemaTree, record: &Record, strictness: Strictness)
    -> ValidationResult;
}

// ============================================================================
// RecordValidator
// ============================================================================

/// Runs a list of record rules
#[derive(Default)]
pub struct RecordValidator {
    rules: Vec<Box<dyn RecordRule>>,
}

impl RecordValidator {
    /// Create a validator with no rules
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Create a validator with the structural rule
    pub fn with_default_rules() -> Self {
        let mut validator = Self::new();
        validator.add_rule(Box::new(StructureRule));
        validator
    }

    /// Add a rule
    pub fn add_rule(&mut self, rule: Box<dyn RecordRule>) {
        self.rules.push(rule);
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Validate a record with all rules
    pub fn validate(
        &self,
        tree: &SchemaTree,
        record: &Record,
        strictness: Strictness,
    ) -> ValidationResult {
        let mut result = ValidationResult::ok();
        for rule in &self.rules {
            result.merge(rule.validate(tree, record, strictness));
        }
        result
    }
}

impl std::fmt::Debug for RecordValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|r| r.name()))
            .finish()
    }
}

// ============================================================================
// Built-in Rules
// ============================================================================

/// Rule: every value fits its leaf, no undeclared keys, required leaves present
pub struct StructureRule;

impl RecordRule for StructureRule {
    fn name(&self) -> &'static str {
        "structure"
    }

    fn description(&self) -> &'static str {
        "Checks each value against the schema leaf it belongs to"
    }

    fn validate(
        &self,
        tree: &SchemaTree,
        record: &Record,
        strictness: Strictness,
    ) -> ValidationResult {
        let mut result = ValidationResult::ok();
        let primary = tree.primary_key();
        let skip = tree.root().child(primary).is_none().then_some(primary);
        check_group(tree.root(), record, "", strictness, skip, &mut result);
        result
    }
}

fn check_group(
    group: &GroupNode,
    record: &Record,
    prefix: &str,
    strictness: Strictness,
    skip: Option<&str>,
    result: &mut ValidationResult,
) {
    for key in record.keys() {
        if group.child(key).is_none() && Some(key.as_str()) != skip {
            result.add_error(ValidationError::new(
                ValidationErrorCode::UnknownField,
                join_path(prefix, key),
            ));
        }
    }

    let empty = Record::new();
    for (name, node) in group.children() {
        let path = join_path(prefix, name);
        match (node, record.get(name)) {
            (SchemaNode::Leaf(leaf), Some(value)) => {
                if let Err(code) = leaf.check(value) {
                    result.add_error(ValidationError::new(code, path));
                }
            }
            (SchemaNode::Leaf(leaf), None) => {
                if strictness == Strictness::Full && !leaf.optional {
                    result.add_error(ValidationError::new(ValidationErrorCode::Missing, path));
                }
            }
            (SchemaNode::Group(child), Some(Value::Object(nested))) => {
                check_group(child, nested, &path, strictness, None, result);
            }
            (SchemaNode::Group(child), None | Some(Value::Null)) => {
                if strictness == Strictness::Full {
                    check_group(child, &empty, &path, strictness, None, result);
                }
            }
            (SchemaNode::Group(_), Some(_)) => {
                result.add_error(ValidationError::new(ValidationErrorCode::Invalid, path));
            }
        }
    }
}

/// Rule: two fields must hold the same value, e.g. a password confirmation
pub struct MatchingFieldsRule {
    field: String,
    confirm: String,
}

impl MatchingFieldsRule {
    /// Require `confirm` to equal `field` (both dotted paths)
    pub fn new(field: impl Into<String>, confirm: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            confirm: confirm.into(),
        }
    }
}

impl RecordRule for MatchingFieldsRule {
    fn name(&self) -> &'static str {
        "matching_fields"
    }

    fn description(&self) -> &'static str {
        "Checks that a confirmation field repeats its original"
    }

    fn validate(&self, _tree: &SchemaTree, record: &Record, _: Strictness) -> ValidationResult {
        let original = lookup(record, &self.field);
        let confirm = lookup(record, &self.confirm);
        if original.is_none() && confirm.is_none() {
            return ValidationResult::ok();
        }

        let same = match (original, confirm) {
            (Some(a), Some(b)) => a == b || value_text(a) == value_text(b),
            _ => false,
        };
        if same {
            ValidationResult::ok()
        } else {
            ValidationResult::error(
                ValidationError::new(ValidationErrorCode::Mismatch, self.confirm.clone())
                    .with_message(format!("does not match {}", self.field)),
            )
        }
    }
}

/// Look up a value by dotted path
pub fn lookup<'a>(record: &'a Record, path: &str) -> Option<&'a Value> {
    match path.split_once('.') {
        None => record.get(path),
        Some((head, rest)) => lookup(record.get(head)?.as_object()?, rest),
    }
}

// ============================================================================
// Tests
// ============================================================================
