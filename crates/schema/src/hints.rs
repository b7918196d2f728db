//! Display hints and widget selection
//!
//! Display hints live in the `__ui__` namespace of a schema document. They
//! never change what a value means, only how it is presented: titles, widget
//! overrides, option labels and child orders.

use crm_core::{ConsoleError, ConsoleResult, OperationMode, SelectOption, SemanticType, TypeFamily};
use serde::{Deserialize, Serialize};

// ============================================================================
// DisplayHints
// ============================================================================

/// Presentation hints attached to a leaf or group node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayHints {
    /// Label shown for a field, or section title for a group
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Widget override (`text`, `password`, `number`, `bool`, `date`,
    /// `datetime`, `time`, `select`)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub widget: Option<String>,

    /// Option list shown by a select, as `[value, label]` pairs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<SelectOption>>,

    /// Regular expression replacing the node's own for one renderer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,

    /// Generic child order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<Vec<String>>,

    /// Child order for create forms
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create: Option<Vec<String>>,

    /// Child order for update forms
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update: Option<Vec<String>>,

    /// Child order for search panels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<Vec<String>>,

    /// Column order for result tables
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<String>>,

    /// Identifying key of the record (root only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<String>,
}

impl DisplayHints {
    /// Create empty hints
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the widget override
    pub fn with_widget(mut self, widget: Widget) -> Self {
        self.widget = Some(widget.hint_name().to_string());
        self
    }

    /// Set the option list
    pub fn with_options(mut self, options: Vec<SelectOption>) -> Self {
        self.options = Some(options);
        self
    }

    /// Set the generic child order
    pub fn with_order<S: Into<String>>(mut self, order: impl IntoIterator<Item = S>) -> Self {
        self.order = Some(order.into_iter().map(Into::into).collect());
        self
    }

    /// Explicit child order for a mode, falling back to the generic order
    pub fn order_for(&self, mode: OperationMode) -> Option<&[String]> {
        let specific = match mode {
            OperationMode::Create => self.create.as_deref(),
            OperationMode::Update => self.update.as_deref(),
            OperationMode::Search => self.search.as_deref(),
        };
        specific.or(self.order.as_deref())
    }

    /// Explicit column order for result tables, falling back to the generic order
    pub fn results_order(&self) -> Option<&[String]> {
        self.results.as_deref().or(self.order.as_deref())
    }

    /// Every explicit order list with the hint key it came from
    pub fn all_orders(&self) -> impl Iterator<Item = (&'static str, &[String])> {
        [
            ("order", self.order.as_deref()),
            ("create", self.create.as_deref()),
            ("update", self.update.as_deref()),
            ("search", self.search.as_deref()),
            ("results", self.results.as_deref()),
        ]
        .into_iter()
        .filter_map(|(key, order)| order.map(|o| (key, o)))
    }

    /// Check if no hint is set
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// ============================================================================
// Widget
// ============================================================================

/// The closed set of controls a field can be rendered as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Widget {
    /// Single-line text input
    Text,
    /// Masked text input
    Password,
    /// Numeric input
    Number,
    /// Checkbox
    Bool,
    /// Date picker
    Date,
    /// Date and time picker
    DateTime,
    /// Time picker
    Time,
    /// Dropdown select
    Select,
}

impl Widget {
    /// Get the default widget for a semantic type
    pub fn for_type(semantic_type: SemanticType) -> Self {
        match semantic_type.family() {
            TypeFamily::Text => Widget::Text,
            TypeFamily::Numeric => Widget::Number,
            TypeFamily::Boolean => Widget::Bool,
            TypeFamily::Temporal => match semantic_type {
                SemanticType::Date => Widget::Date,
                SemanticType::Time => Widget::Time,
                _ => Widget::DateTime,
            },
        }
    }

    /// Parse a widget named in display hints
    pub fn from_hint(field: &str, name: &str) -> ConsoleResult<Self> {
        match name {
            "text" => Ok(Widget::Text),
            "password" => Ok(Widget::Password),
            "number" => Ok(Widget::Number),
            "bool" => Ok(Widget::Bool),
            "date" => Ok(Widget::Date),
            "datetime" => Ok(Widget::DateTime),
            "time" => Ok(Widget::Time),
            "select" => Ok(Widget::Select),
            other => Err(ConsoleError::unknown_widget(field, other)),
        }
    }

    /// Name used for this widget in display hints
    pub fn hint_name(&self) -> &'static str {
        match self {
            Widget::Text => "text",
            Widget::Password => "password",
            Widget::Number => "number",
            Widget::Bool => "bool",
            Widget::Date => "date",
            Widget::DateTime => "datetime",
            Widget::Time => "time",
            Widget::Select => "select",
        }
    }

    /// Get the HTML input type attribute
    pub fn html_input_type(&self) -> &'static str {
        match self {
            Widget::Text => "text",
            Widget::Password => "password",
            Widget::Number => "number",
            Widget::Bool => "checkbox",
            Widget::Date => "date",
            Widget::DateTime => "datetime-local",
            Widget::Time => "time",
            Widget::Select => "select",
        }
    }

    /// Message shown when input for this widget fails validation
    pub fn invalid_message(&self) -> &'static str {
        match self {
            Widget::Date => "Invalid Date",
            Widget::DateTime => "Invalid Date/Time",
            Widget::Time => "Invalid Time",
            Widget::Select => "Invalid Selection",
            Widget::Text | Widget::Password | Widget::Number | Widget::Bool => "Invalid Value",
        }
    }
}

impl std::fmt::Display for Widget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hint_name())
    }
}

// ============================================================================
// Tests
// ============================================================================
