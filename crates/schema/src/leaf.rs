//! Leaf node definitions
//!
//! A leaf describes one scalar value: its semantic type, whether it may be
//! empty, optional bounds, an optional fixed option list and an optional
//! regular expression. `LeafNode::check` is the single source of truth for
//! whether a value fits the leaf; both per-keystroke field validation and
//! whole-record validation go through it. A `__ui__.regex` hint, once
//! compiled, replaces the leaf's own pattern in that check.

use crate::hints::{DisplayHints, Widget};
use crate::validation::ValidationErrorCode;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use crm_core::{
    ConsoleError, ConsoleResult, SelectOption, SemanticType, TypeFamily, Validatable, value_text,
};
use regex::Regex;
use serde_json::Value;
use std::net::Ipv4Addr;
use std::sync::LazyLock;

static BASE64_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z0-9+/]{4})*(?:[A-Za-z0-9+/]{2}==|[A-Za-z0-9+/]{3}=)?$").ok()
});

static MD5_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^[a-fA-F0-9]{32}$").ok());

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const TIME_FORMAT: &str = "%H:%M:%S";

// ============================================================================
// Bound
// ============================================================================

/// A minimum or maximum constraint
///
/// Numeric leaves bound the value, text leaves bound the character count,
/// temporal leaves bound the canonical text lexicographically.
#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    Number(f64),
    Text(String),
}

impl Bound {
    /// Parse a bound for a leaf of the given type
    pub fn from_json(field: &str, semantic_type: SemanticType, value: &Value) -> ConsoleResult<Self> {
        let invalid = || {
            ConsoleError::invalid_schema(
                field,
                format!("bound {} does not fit type '{}'", value, semantic_type),
            )
        };

        match semantic_type.family() {
            TypeFamily::Numeric | TypeFamily::Text => match value {
                Value::Number(n) => n.as_f64().map(Bound::Number).ok_or_else(invalid),
                Value::String(s) => s.trim().parse().map(Bound::Number).map_err(|_| invalid()),
                _ => Err(invalid()),
            },
            TypeFamily::Temporal => match value {
                Value::String(s) => Ok(Bound::Text(s.clone())),
                _ => Err(invalid()),
            },
            TypeFamily::Boolean => Err(invalid()),
        }
    }

    /// Get the numeric bound, if this is one
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Bound::Number(n) => Some(*n),
            Bound::Text(_) => None,
        }
    }

    /// Convert back to a JSON value
    pub fn to_json(&self) -> Value {
        match self {
            Bound::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Bound::Text(s) => Value::String(s.clone()),
        }
    }
}

impl std::fmt::Display for Bound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Bound::Number(n) => write!(f, "{}", n),
            Bound::Text(s) => write!(f, "{}", s),
        }
    }
}

// ============================================================================
// Pattern
// ============================================================================

/// A compiled regular expression constraint
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
}

impl Pattern {
    /// Compile a pattern for the named field
    pub fn new(field: &str, source: &str) -> ConsoleResult<Self> {
        Regex::new(source)
            .map(|regex| Self { regex })
            .map_err(|e| ConsoleError::InvalidPattern {
                field: field.to_string(),
                message: e.to_string(),
            })
    }

    /// Check if the text matches
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Source of the pattern
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

// ============================================================================
// LeafNode
// ============================================================================

/// Describes a single scalar value of a record
#[derive(Debug, Clone, PartialEq)]
pub struct LeafNode {
    /// Semantic type tag
    pub semantic_type: SemanticType,

    /// Whether null is an acceptable value
    pub optional: bool,

    /// Lower bound
    pub minimum: Option<Bound>,

    /// Upper bound
    pub maximum: Option<Bound>,

    /// Fixed set of acceptable values
    pub options: Option<Vec<Value>>,

    /// Labels given alongside `options` as `[value, label]` pairs
    pub option_labels: Option<Vec<SelectOption>>,

    /// Regular expression text values must match
    pub pattern: Option<Pattern>,

    /// Compiled `hints.regex`, preferred over `pattern`
    pub hint_pattern: Option<Pattern>,

    /// Presentation hints
    pub hints: DisplayHints,
}

impl LeafNode {
    /// Create a required leaf of the given type
    pub fn new(semantic_type: SemanticType) -> Self {
        Self {
            semantic_type,
            optional: false,
            minimum: None,
            maximum: None,
            options: None,
            option_labels: None,
            pattern: None,
            hint_pattern: None,
            hints: DisplayHints::default(),
        }
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Allow null values
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Set the lower bound
    pub fn with_minimum(mut self, bound: Bound) -> Self {
        self.minimum = Some(bound);
        self
    }

    /// Set the upper bound
    pub fn with_maximum(mut self, bound: Bound) -> Self {
        self.maximum = Some(bound);
        self
    }

    /// Restrict values to a fixed list
    pub fn with_options<V: Into<Value>>(mut self, options: impl IntoIterator<Item = V>) -> Self {
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    /// Restrict values to a fixed list of `(value, label)` pairs
    pub fn with_labelled_options<V: Into<Value>, L: Into<String>>(
        mut self,
        options: impl IntoIterator<Item = (V, L)>,
    ) -> Self {
        let (values, labels): (Vec<Value>, Vec<SelectOption>) = options
            .into_iter()
            .map(|(value, label)| {
                let value = value.into();
                let option = SelectOption::new(value_text(&value), label);
                (value, option)
            })
            .unzip();
        self.options = Some(values);
        self.option_labels = Some(labels);
        self
    }

    /// Set the pattern
    pub fn with_pattern(mut self, pattern: Pattern) -> Self {
        self.pattern = Some(pattern);
        self
    }

    /// Set the display hints
    pub fn with_hints(mut self, hints: DisplayHints) -> Self {
        self.hints = hints;
        self
    }

    /// Compile the regex hint, if any, for the field at `path`
    pub fn compile_hints(mut self, path: &str) -> ConsoleResult<Self> {
        self.hint_pattern = self
            .hints
            .regex
            .as_deref()
            .map(|source| Pattern::new(path, source))
            .transpose()?;
        Ok(self)
    }

    /// Pattern text values are checked against
    pub fn effective_pattern(&self) -> Option<&Pattern> {
        self.hint_pattern.as_ref().or(self.pattern.as_ref())
    }

    // ========================================================================
    // Presentation
    // ========================================================================

    /// Resolve the widget this leaf renders as
    ///
    /// An explicit hint wins, then an option list forces a select, then the
    /// semantic type decides.
    pub fn widget(&self, field: &str) -> ConsoleResult<Widget> {
        if let Some(name) = &self.hints.widget {
            return Widget::from_hint(field, name);
        }
        if self.options.is_some() {
            return Ok(Widget::Select);
        }
        Ok(Widget::for_type(self.semantic_type))
    }

    /// Label for this leaf, falling back to the field name
    pub fn title<'a>(&'a self, name: &'a str) -> &'a str {
        self.hints.title.as_deref().unwrap_or(name)
    }

    /// Options a select shows: hint labels, then labels given with the
    /// options, else the raw option values
    pub fn option_list(&self) -> Vec<SelectOption> {
        if let Some(options) = self.hints.options.as_ref().or(self.option_labels.as_ref()) {
            return options.clone();
        }
        self.options
            .as_ref()
            .map(|opts| opts.iter().map(|o| SelectOption::same(value_text(o))).collect())
            .unwrap_or_default()
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Check a value against every constraint of this leaf
    pub fn check(&self, value: &Value) -> Result<(), ValidationErrorCode> {
        if value.is_null() {
            return if self.optional {
                Ok(())
            } else {
                Err(ValidationErrorCode::Missing)
            };
        }

        match self.semantic_type.family() {
            TypeFamily::Text => self.check_text(value)?,
            TypeFamily::Numeric => self.check_number(value)?,
            TypeFamily::Boolean => check_bool(value)?,
            TypeFamily::Temporal => self.check_temporal(value)?,
        }

        if let Some(options) = &self.options {
            if !options.iter().any(|opt| same_option(opt, value)) {
                return Err(ValidationErrorCode::NotAnOption);
            }
        }

        Ok(())
    }

    /// Check if a value fits this leaf
    pub fn is_valid_value(&self, value: &Value) -> bool {
        self.check(value).is_ok()
    }

    fn check_text(&self, value: &Value) -> Result<(), ValidationErrorCode> {
        if self.semantic_type == SemanticType::Any {
            return Ok(());
        }

        let Value::String(text) = value else {
            return Err(ValidationErrorCode::Invalid);
        };

        let well_formed = match self.semantic_type {
            SemanticType::Base64 => matches_static(&BASE64_RE, text),
            SemanticType::Md5 => matches_static(&MD5_RE, text),
            SemanticType::Ip => text.parse::<Ipv4Addr>().is_ok(),
            SemanticType::Json => serde_json::from_str::<Value>(text).is_ok(),
            SemanticType::Uuid => text.len() == 36 && uuid::Uuid::parse_str(text).is_ok(),
            SemanticType::Uuid4 => {
                text.len() == 36
                    && uuid::Uuid::parse_str(text)
                        .map(|u| u.get_version_num() == 4)
                        .unwrap_or(false)
            }
            _ => true,
        };
        if !well_formed {
            return Err(ValidationErrorCode::Invalid);
        }

        if let Some(pattern) = self.effective_pattern() {
            if !pattern.is_match(text) {
                return Err(ValidationErrorCode::PatternMismatch);
            }
        }

        if self.semantic_type == SemanticType::String {
            self.check_numeric_bounds(text.chars().count() as f64)?;
        }

        Ok(())
    }

    fn check_number(&self, value: &Value) -> Result<(), ValidationErrorCode> {
        let number = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|n| n.is_finite())
        .ok_or(ValidationErrorCode::Invalid)?;

        if self.semantic_type.is_integral() && number.fract() != 0.0 {
            return Err(ValidationErrorCode::Invalid);
        }

        if matches!(
            self.semantic_type,
            SemanticType::Uint | SemanticType::Timestamp
        ) && number < 0.0
        {
            return Err(ValidationErrorCode::Invalid);
        }

        if self.semantic_type == SemanticType::Price {
            let cents = number * 100.0;
            if (cents - cents.round()).abs() > 1e-6 {
                return Err(ValidationErrorCode::Invalid);
            }
        }

        self.check_numeric_bounds(number)
    }

    fn check_numeric_bounds(&self, number: f64) -> Result<(), ValidationErrorCode> {
        if let Some(min) = self.minimum.as_ref().and_then(Bound::as_number) {
            if number < min {
                return Err(ValidationErrorCode::BelowMinimum);
            }
        }
        if let Some(max) = self.maximum.as_ref().and_then(Bound::as_number) {
            if number > max {
                return Err(ValidationErrorCode::AboveMaximum);
            }
        }
        Ok(())
    }

    fn check_temporal(&self, value: &Value) -> Result<(), ValidationErrorCode> {
        let Value::String(text) = value else {
            return Err(ValidationErrorCode::Invalid);
        };

        let parsed = match self.semantic_type {
            SemanticType::Date => NaiveDate::parse_from_str(text, DATE_FORMAT).is_ok(),
            SemanticType::Datetime => {
                NaiveDateTime::parse_from_str(text, DATETIME_FORMAT).is_ok()
            }
            _ => NaiveTime::parse_from_str(text, TIME_FORMAT).is_ok(),
        };
        if !parsed {
            return Err(ValidationErrorCode::Invalid);
        }

        if let Some(Bound::Text(min)) = &self.minimum {
            if text.as_str() < min.as_str() {
                return Err(ValidationErrorCode::BelowMinimum);
            }
        }
        if let Some(Bound::Text(max)) = &self.maximum {
            if text.as_str() > max.as_str() {
                return Err(ValidationErrorCode::AboveMaximum);
            }
        }

        Ok(())
    }
}

impl Validatable for LeafNode {
    fn validate(&self) -> ConsoleResult<()> {
        if let (Some(Bound::Number(min)), Some(Bound::Number(max))) = (&self.minimum, &self.maximum)
        {
            if min > max {
                return Err(ConsoleError::invalid_schema(
                    self.semantic_type.tag(),
                    format!("minimum {} is above maximum {}", min, max),
                ));
            }
        }
        if let (Some(Bound::Text(min)), Some(Bound::Text(max))) = (&self.minimum, &self.maximum) {
            if min > max {
                return Err(ConsoleError::invalid_schema(
                    self.semantic_type.tag(),
                    format!("minimum {} is above maximum {}", min, max),
                ));
            }
        }
        if let Some(options) = &self.options {
            if options.is_empty() {
                return Err(ConsoleError::invalid_schema(
                    self.semantic_type.tag(),
                    "option list is empty",
                ));
            }
        }
        Ok(())
    }
}

fn check_bool(value: &Value) -> Result<(), ValidationErrorCode> {
    match value {
        Value::Bool(_) => Ok(()),
        Value::Number(n) if n.as_u64() == Some(0) || n.as_u64() == Some(1) => Ok(()),
        _ => Err(ValidationErrorCode::Invalid),
    }
}

fn matches_static(re: &LazyLock<Option<Regex>>, text: &str) -> bool {
    re.as_ref().is_some_and(|re| re.is_match(text))
}

fn same_option(option: &Value, value: &Value) -> bool {
    option == value || value_text(option) == value_text(value)
}

// ============================================================================
// Tests
// ============================================================================
