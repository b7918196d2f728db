//! Field renderer
//!
//! A `FieldRenderer` owns the editable state of one leaf: the current value,
//! the value it was seeded with, and the error it displays. User edits come
//! in as [`FieldInput`] events, are normalized to the leaf's semantic type
//! and validated on the spot. Invalid input is never an `Err`; it becomes
//! the field's displayed error while the entered value is kept.

use crate::control::FormControl;
use crate::view::Control;
use crm_core::{ConsoleResult, SelectOption, TypeFamily, value_text};
use crm_schema::{LeafNode, Widget};
use serde_json::{Number, Value};
use std::sync::Arc;

// ============================================================================
// FieldInput
// ============================================================================

/// A raw edit event from an input widget
#[derive(Debug, Clone, PartialEq)]
pub enum FieldInput {
    /// Text typed or chosen (text, number, select, date, time, datetime-local)
    Text(String),
    /// Checkbox state
    Toggle(bool),
    /// Separate date and time pickers
    DateTime { date: String, time: String },
}

impl From<&str> for FieldInput {
    fn from(text: &str) -> Self {
        FieldInput::Text(text.to_string())
    }
}

impl From<bool> for FieldInput {
    fn from(checked: bool) -> Self {
        FieldInput::Toggle(checked)
    }
}

// ============================================================================
// FieldRenderer
// ============================================================================

/// Editable state of a single leaf
#[derive(Debug, Clone)]
pub struct FieldRenderer {
    name: String,
    path: String,
    leaf: Arc<LeafNode>,
    widget: Widget,
    value: Value,
    original: Value,
    error: Option<String>,
}

impl FieldRenderer {
    /// Create a renderer for `leaf`, seeded with `initial`
    ///
    /// Fails when the leaf's hints name an unknown widget.
    pub fn new(
        name: impl Into<String>,
        leaf: Arc<LeafNode>,
        initial: Option<Value>,
        path: impl Into<String>,
    ) -> ConsoleResult<Self> {
        let name = name.into();
        let path = path.into();
        let widget = leaf.widget(&path)?;
        let value = initial.unwrap_or(Value::Null);

        Ok(Self {
            name,
            path,
            leaf,
            widget,
            original: value.clone(),
            value,
            error: None,
        })
    }

    /// The leaf this field edits
    pub fn leaf(&self) -> &Arc<LeafNode> {
        &self.leaf
    }

    /// Resolved widget
    pub fn widget(&self) -> Widget {
        self.widget
    }

    /// Label text
    pub fn title(&self) -> &str {
        self.leaf.title(&self.name)
    }

    /// Current value
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Value the field was seeded with
    pub fn original(&self) -> &Value {
        &self.original
    }

    /// Displayed error, if any
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Overwrite the value and clear the error
    pub fn set_value(&mut self, value: Value) {
        self.value = value;
        self.error = None;
    }

    /// Display an error without re-validating
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    /// Check if the value differs from the seed
    pub fn is_changed(&self) -> bool {
        !same_value(&self.value, &self.original)
    }

    /// Handle an edit: normalize, store, validate
    pub fn input(&mut self, input: FieldInput) {
        let checkbox = matches!(input, FieldInput::Toggle(_)) || self.widget == Widget::Bool;
        self.value = self.normalize(input);

        if checkbox {
            self.error = None;
            return;
        }

        self.error = self
            .leaf
            .check(&self.value)
            .err()
            .map(|_| self.widget.invalid_message().to_string());
    }

    fn normalize(&self, input: FieldInput) -> Value {
        match input {
            FieldInput::Toggle(checked) => Value::Bool(checked),
            FieldInput::DateTime { date, time } => {
                let (date, time) = (date.trim(), time.trim());
                if date.is_empty() && time.is_empty() {
                    Value::Null
                } else {
                    Value::String(format!("{} {}", date, with_seconds(time)))
                }
            }
            FieldInput::Text(text) => {
                if self.widget == Widget::Bool {
                    return Value::Bool(matches!(text.trim(), "true" | "1" | "on"));
                }
                let text = text.trim();
                if text.is_empty() {
                    return Value::Null;
                }
                match self.widget {
                    Widget::DateTime => Value::String(with_seconds(&text.replacen('T', " ", 1))),
                    Widget::Time => Value::String(with_seconds(text)),
                    _ if self.leaf.semantic_type.family() == TypeFamily::Numeric => {
                        parse_number(text)
                    }
                    _ => Value::String(text.to_string()),
                }
            }
        }
    }

    /// Build the control view model
    ///
    /// `options` replaces the select options the schema declares.
    pub fn render(&self, options: Option<Vec<SelectOption>>) -> Control {
        let options = if self.widget == Widget::Select {
            let mut list = options.unwrap_or_else(|| self.leaf.option_list());
            if self.leaf.optional && !list.first().is_some_and(SelectOption::is_blank) {
                list.insert(0, SelectOption::blank());
            }
            list
        } else {
            Vec::new()
        };

        Control {
            name: self.name.clone(),
            path: self.path.clone(),
            title: self.title().to_string(),
            widget: self.widget,
            input_type: self.widget.html_input_type(),
            value: value_text(&self.value),
            checked: self.value.as_bool().unwrap_or(false)
                || self.value.as_u64() == Some(1),
            error: self.error.clone(),
            required: !self.leaf.optional,
            minimum: self.leaf.minimum.as_ref().map(ToString::to_string),
            maximum: self.leaf.maximum.as_ref().map(ToString::to_string),
            options,
        }
    }
}

impl FormControl for FieldRenderer {
    fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn current_value(&self) -> Value {
        self.value.clone()
    }

    fn assign(&mut self, value: &Value) {
        self.set_value(value.clone());
    }

    fn clear_errors(&mut self) {
        self.error = None;
    }

    fn has_errors(&self) -> bool {
        self.error.is_some()
    }

    fn reseed(&mut self) {
        self.original = self.value.clone();
    }
}

/// Append `:00` seconds to an `HH:MM` clock or a `YYYY-MM-DD HH:MM` stamp
fn with_seconds(text: &str) -> String {
    let clock = text.rsplit(' ').next().unwrap_or(text);
    if clock.len() == 5 && clock.as_bytes().get(2) == Some(&b':') {
        format!("{}:00", text)
    } else {
        text.to_string()
    }
}

/// Parse numeric text to an integer or float, keeping unparsable text as is
fn parse_number(text: &str) -> Value {
    if let Ok(n) = text.parse::<i64>() {
        return Value::Number(n.into());
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(text.to_string()))
}

/// Value equality that treats `5` and `5.0` as the same number
pub(crate) fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crm_core::SemanticType;
    use crm_schema::{Bound, DisplayHints, Pattern};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn field(leaf: LeafNode) -> FieldRenderer {
        FieldRenderer::new("f", Arc::new(leaf), None, "f").unwrap()
    }

    #[test]
    fn test_numeric_within_bounds() {
        let mut f = field(
            LeafNode::new(SemanticType::Uint)
                .with_minimum(Bound::Number(1.0))
                .with_maximum(Bound::Number(10.0)),
        );
        f.set_value(json!(5));
        assert_eq!(f.value(), &json!(5));
        assert!(f.error().is_none());
    }

    #[test]
    fn test_numeric_out_of_bounds_keeps_value() {
        let mut f = field(LeafNode::new(SemanticType::Uint).with_maximum(Bound::Number(10.0)));
        f.input("11".into());
        assert_eq!(f.value(), &json!(11));
        assert_eq!(f.error(), Some("Invalid Value"));
    }

    #[test]
    fn test_price_below_minimum() {
        let mut f = field(LeafNode::new(SemanticType::Price).with_minimum(Bound::Number(0.0)));
        f.input("-5".into());
        assert_eq!(f.error(), Some("Invalid Value"));
        assert_eq!(f.value(), &json!(-5));

        f.input("12.50".into());
        assert_eq!(f.value(), &json!(12.5));
        assert!(f.error().is_none());
    }

    #[test]
    fn test_unparsable_number_kept_as_text() {
        let mut f = field(LeafNode::new(SemanticType::Int));
        f.input("twelve".into());
        assert_eq!(f.value(), &json!("twelve"));
        assert_eq!(f.error(), Some("Invalid Value"));
    }

    #[test]
    fn test_empty_text_becomes_null() {
        let mut f = field(LeafNode::new(SemanticType::String).optional());
        f.input("  ".into());
        assert_eq!(f.value(), &Value::Null);
        assert!(f.error().is_none());

        let mut required = field(LeafNode::new(SemanticType::String));
        required.input("".into());
        assert_eq!(required.error(), Some("Invalid Value"));
    }

    #[test]
    fn test_datetime_local_normalized() {
        let mut f = field(LeafNode::new(SemanticType::Datetime));
        f.input("2020-04-10T13:45".into());
        assert_eq!(f.value(), &json!("2020-04-10 13:45:00"));
        assert!(f.error().is_none());

        f.input("2020-13-10T13:45".into());
        assert_eq!(f.error(), Some("Invalid Date/Time"));
    }

    #[test]
    fn test_datetime_from_separate_pickers() {
        let mut f = field(LeafNode::new(SemanticType::Datetime));
        f.input(FieldInput::DateTime {
            date: "2021-01-02".into(),
            time: "08:30".into(),
        });
        assert_eq!(f.value(), &json!("2021-01-02 08:30:00"));
        assert!(f.error().is_none());
    }

    #[test]
    fn test_time_gets_seconds() {
        let mut f = field(LeafNode::new(SemanticType::Time));
        f.input("09:15".into());
        assert_eq!(f.value(), &json!("09:15:00"));

        f.input("25:00".into());
        assert_eq!(f.error(), Some("Invalid Time"));
    }

    #[test]
    fn test_date_error_message() {
        let mut f = field(LeafNode::new(SemanticType::Date));
        f.input("2021-02-30".into());
        assert_eq!(f.error(), Some("Invalid Date"));
        assert_eq!(f.value(), &json!("2021-02-30"));
    }

    #[test]
    fn test_bool_never_invalid() {
        let mut f = field(LeafNode::new(SemanticType::Bool));
        f.input(true.into());
        assert_eq!(f.value(), &json!(true));
        assert!(f.error().is_none());
        assert!(f.render(None).checked);
    }

    #[test]
    fn test_select_without_blank_when_required() {
        let leaf = LeafNode::new(SemanticType::String)
            .with_options(["US", "CA"])
            .with_hints(DisplayHints::new().with_options(vec![
                SelectOption::new("US", "United States"),
                SelectOption::new("CA", "Canada"),
            ]));
        let mut f = field(leaf);

        let control = f.render(None);
        assert_eq!(control.widget, Widget::Select);
        assert_eq!(control.options.len(), 2);
        assert!(!control.options[0].is_blank());

        f.input("US".into());
        assert_eq!(f.value(), &json!("US"));
        assert!(f.error().is_none());

        f.input("MX".into());
        assert_eq!(f.error(), Some("Invalid Selection"));
    }

    #[test]
    fn test_optional_select_has_blank() {
        let f = field(LeafNode::new(SemanticType::String).optional().with_options(["a", "b"]));
        let control = f.render(None);
        assert_eq!(control.options.len(), 3);
        assert!(control.options[0].is_blank());

        let overridden = f.render(Some(vec![SelectOption::same("z")]));
        assert_eq!(overridden.options, vec![SelectOption::blank(), SelectOption::same("z")]);
    }

    #[test]
    fn test_hint_regex_overrides_node_pattern() {
        let leaf = Arc::new(
            LeafNode::new(SemanticType::String)
                .with_pattern(Pattern::new("zip", r"^\d{5}$").unwrap())
                .with_hints(DisplayHints {
                    regex: Some(r"^[A-Z]\d[A-Z] \d[A-Z]\d$".into()),
                    ..DisplayHints::default()
                })
                .compile_hints("zip")
                .unwrap(),
        );
        let mut canadian = FieldRenderer::new("zip", leaf.clone(), None, "zip").unwrap();
        canadian.input("K1A 0B1".into());
        assert!(canadian.error().is_none());
        canadian.input("90210".into());
        assert_eq!(canadian.error(), Some("Invalid Value"));

        assert!(leaf.check(&json!("K1A 0B1")).is_ok());
        assert_eq!(leaf.pattern.as_ref().unwrap().as_str(), r"^\d{5}$");
    }

    #[test]
    fn test_unknown_widget_fails_construction() {
        let leaf = LeafNode::new(SemanticType::String).with_hints(DisplayHints {
            widget: Some("slider".into()),
            ..DisplayHints::default()
        });
        let err = FieldRenderer::new("volume", Arc::new(leaf), None, "volume").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_set_error_and_set_value() {
        let mut f = field(LeafNode::new(SemanticType::String));
        f.set_error("Email already in use");
        assert!(f.has_errors());
        assert_eq!(f.render(None).error.as_deref(), Some("Email already in use"));

        f.set_value(json!("x@y.z"));
        assert!(!f.has_errors());
    }

    #[test]
    fn test_change_tracking() {
        let leaf = Arc::new(LeafNode::new(SemanticType::Float));
        let mut f = FieldRenderer::new("rate", leaf, Some(json!(5.0)), "rate").unwrap();
        f.input("5".into());
        assert!(!f.is_changed());

        f.input("6".into());
        assert!(f.is_changed());
        f.reseed();
        assert!(!f.is_changed());
    }

    #[test]
    fn test_render_control() {
        let leaf = LeafNode::new(SemanticType::String)
            .with_maximum(Bound::Number(20.0))
            .with_hints(DisplayHints::new().with_title("First Name"));
        let f = FieldRenderer::new("first_name", Arc::new(leaf), Some(json!("Ada")), "first_name")
            .unwrap();

        let control = f.render(None);
        assert_eq!(control.title, "First Name");
        assert_eq!(control.value, "Ada");
        assert_eq!(control.input_type, "text");
        assert_eq!(control.maximum.as_deref(), Some("20"));
        assert!(control.required);
        assert!(control.options.is_empty());
    }

    #[test]
    fn test_with_seconds() {
        assert_eq!(with_seconds("10:30"), "10:30:00");
        assert_eq!(with_seconds("10:30:15"), "10:30:15");
        assert_eq!(with_seconds("2020-01-01 10:30"), "2020-01-01 10:30:00");
    }
}
