//! Render output
//!
//! Renderers do not draw anything. They produce plain view models that a
//! front end (terminal, web, desktop) turns into widgets.

use crm_core::SelectOption;
use crm_schema::Widget;
use serde::Serialize;

/// One input control
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Control {
    /// Field name within its group
    pub name: String,

    /// Dotted path from the form root
    pub path: String,

    /// Label text
    pub title: String,

    /// Widget kind
    pub widget: Widget,

    /// HTML input type attribute
    pub input_type: &'static str,

    /// Value as the input shows it
    pub value: String,

    /// Checkbox state
    pub checked: bool,

    /// Error message (shows error state)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Whether a value is required
    pub required: bool,

    /// Lower bound, as the input's `min`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<String>,

    /// Upper bound, as the input's `max`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<String>,

    /// Options of a select
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
}

/// A rendered group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub name: String,

    pub path: String,

    /// Heading, when the group's hints give one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    pub items: Vec<Item>,
}

/// A child of a section
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Item {
    Control(Control),
    Section(Section),
}

impl Section {
    /// Every control of this section and its subsections, in render order
    pub fn controls(&self) -> Vec<&Control> {
        let mut out = Vec::new();
        for item in &self.items {
            match item {
                Item::Control(control) => out.push(control),
                Item::Section(section) => out.extend(section.controls()),
            }
        }
        out
    }

    /// Find a control by dotted path
    pub fn control(&self, path: &str) -> Option<&Control> {
        self.controls().into_iter().find(|c| c.path == path)
    }
}

/// A rendered record form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormView {
    /// "Create customer" or "Update customer"
    pub title: String,

    /// "Create" or "Save"
    pub submit_label: &'static str,

    /// Whether a submission is in flight
    pub busy: bool,

    pub section: Section,
}

/// A rendered results table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    pub headers: Vec<Header>,
    pub rows: Vec<RowView>,
}

/// A column header
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Header {
    pub key: String,
    pub title: String,

    /// Set on the column the rows are sorted by
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sorted: Option<SortDirection>,
}

/// Sort direction of a results table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// The opposite direction
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// One table cell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "lowercase")]
pub enum Cell {
    /// Marker standing in for the identifying key
    Key(String),
    Text(String),
}

impl Cell {
    pub fn text(&self) -> &str {
        match self {
            Cell::Key(s) | Cell::Text(s) => s,
        }
    }
}

/// A rendered row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowView {
    /// Identifying value of the row
    pub key: String,

    pub cells: Vec<Cell>,

    /// Open update form, when the row is being edited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editor: Option<FormView>,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn control(path: &str) -> Control {
        Control {
            name: path.rsplit('.').next().unwrap_or(path).to_string(),
            path: path.to_string(),
            title: path.to_string(),
            widget: Widget::Text,
            input_type: "text",
            value: String::new(),
            checked: false,
            error: None,
            required: true,
            minimum: None,
            maximum: None,
            options: Vec::new(),
        }
    }

    #[test]
    fn test_section_controls_flatten() {
        let section = Section {
            name: "customer".into(),
            path: String::new(),
            title: None,
            items: vec![
                Item::Control(control("email")),
                Item::Section(Section {
                    name: "address".into(),
                    path: "address".into(),
                    title: Some("Address".into()),
                    items: vec![Item::Control(control("address.city"))],
                }),
            ],
        };

        let paths: Vec<_> = section.controls().iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["email", "address.city"]);
        assert_eq!(section.control("address.city").unwrap().name, "city");
    }

    #[test]
    fn test_item_serializes_with_kind() {
        let value = serde_json::to_value(Item::Control(control("email"))).unwrap();
        assert_eq!(value["kind"], json!("control"));
        assert_eq!(value["widget"], json!("text"));
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_sort_direction_toggle() {
        assert_eq!(SortDirection::Asc.toggled(), SortDirection::Desc);
        assert_eq!(SortDirection::default().toggled().toggled(), SortDirection::Asc);
    }
}
