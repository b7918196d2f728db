//! Result table
//!
//! Shows a list of records in sortable columns. Each row can open an update
//! form in place and, when enabled, be removed through the service.

use crate::control::RenderContext;
use crate::controller::{RecordForm, SubmitOutcome};
use crate::notify::NotificationBus;
use crate::service::{
    ErrorAction, ErrorMessages, RemoteService, Target, report_error, report_warning,
};
use crate::view::{Cell, Header, RowView, SortDirection, TableView};
use crm_core::{ConsoleError, ConsoleResult, Named, Record, value_text};
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Message published when a row key is handed out for copying
pub const KEY_COPIED_MESSAGE: &str = "Record key copied to clipboard";

/// A table column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub key: String,
    pub title: String,
}

/// Sortable list of records
#[derive(Debug)]
pub struct ResultTable {
    tree: crm_schema::SchemaTree,
    target: Target,
    columns: Vec<Column>,
    rows: Vec<Record>,
    order_by: String,
    direction: SortDirection,
    removable: bool,
    messages: ErrorMessages,
    context: RenderContext,
    editors: Vec<(String, RecordForm)>,
}

impl ResultTable {
    /// Create a table sorted ascending by `order_by`
    ///
    /// Columns come from the `results` hint, then `order`, then the schema's
    /// own keys.
    pub fn new(
        tree: &crm_schema::SchemaTree,
        target: Target,
        rows: Vec<Record>,
        order_by: impl Into<String>,
    ) -> Self {
        let root = tree.root();
        let columns = root
            .results_order()
            .into_iter()
            .map(|key| Column {
                key: key.to_string(),
                title: root
                    .child(key)
                    .map(|node| node.title(key))
                    .unwrap_or(key)
                    .to_string(),
            })
            .collect();

        Self {
            tree: tree.clone(),
            target,
            columns,
            rows,
            order_by: order_by.into(),
            direction: SortDirection::Asc,
            removable: false,
            messages: ErrorMessages::new(),
            context: RenderContext::default(),
            editors: Vec::new(),
        }
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Allow rows to be removed
    pub fn with_remove(mut self, removable: bool) -> Self {
        self.removable = removable;
        self
    }

    /// Start with the given direction
    pub fn with_direction(mut self, direction: SortDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Message table for the row editors
    pub fn error_messages(mut self, messages: ErrorMessages) -> Self {
        self.messages = messages;
        self
    }

    /// Render collaborators for the row editors
    pub fn with_context(mut self, context: RenderContext) -> Self {
        self.context = context;
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn order_by(&self) -> &str {
        &self.order_by
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Identifying value of a row as text
    fn row_key(&self, row: &Record) -> Option<String> {
        self.tree.primary_value(row).map(value_text)
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.rows
            .iter()
            .position(|row| self.row_key(row).as_deref() == Some(key))
    }

    /// Row with the given identifying value
    pub fn row(&self, key: &str) -> Option<&Record> {
        self.position(key).map(|i| &self.rows[i])
    }

    // ========================================================================
    // Sorting
    // ========================================================================

    /// Switch the sort column, or flip the direction when it already is
    pub fn order_change(&mut self, key: &str) {
        if self.order_by == key {
            self.direction = self.direction.toggled();
        } else {
            self.order_by = key.to_string();
        }
    }

    /// Rows in display order
    pub fn rows(&self) -> Vec<&Record> {
        let mut rows: Vec<&Record> = self.rows.iter().collect();
        let key = self.order_by.as_str();
        rows.sort_by(|a, b| {
            let ord = compare_values(a.get(key), b.get(key));
            match self.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });
        rows
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Build the table view model
    pub fn render(&self) -> TableView {
        let primary = self.tree.primary_key();
        let headers = self
            .columns
            .iter()
            .map(|column| Header {
                key: column.key.clone(),
                title: column.title.clone(),
                sorted: (column.key == self.order_by).then_some(self.direction),
            })
            .collect();

        let rows = self
            .rows()
            .into_iter()
            .map(|row| {
                let key = self.row_key(row).unwrap_or_default();
                let cells = self
                    .columns
                    .iter()
                    .map(|column| {
                        let text = row.get(&column.key).map(value_text).unwrap_or_default();
                        if column.key == primary {
                            Cell::Key(text)
                        } else {
                            Cell::Text(text)
                        }
                    })
                    .collect();
                let editor = self.editor(&key).map(RecordForm::render);
                RowView { key, cells, editor }
            })
            .collect();

        TableView { headers, rows }
    }

    /// Hand out a row key for the clipboard
    pub fn copy_key(&self, key: &str, bus: &NotificationBus) -> Option<String> {
        let row = self.row(key)?;
        let text = self.row_key(row)?;
        bus.success(KEY_COPIED_MESSAGE);
        Some(text)
    }

    // ========================================================================
    // Editing
    // ========================================================================

    /// Open editor for a row
    pub fn editor(&self, key: &str) -> Option<&RecordForm> {
        self.editors.iter().find(|(k, _)| k == key).map(|(_, f)| f)
    }

    /// Mutable open editor for a row
    pub fn editor_mut(&mut self, key: &str) -> Option<&mut RecordForm> {
        self.editors
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, f)| f)
    }

    /// Open or close the update form of a row; returns whether it is now open
    pub fn toggle_edit(&mut self, key: &str) -> ConsoleResult<bool> {
        if let Some(i) = self.editors.iter().position(|(k, _)| k == key) {
            self.editors.remove(i);
            return Ok(false);
        }

        let row = self
            .row(key)
            .ok_or_else(|| ConsoleError::RecordNotFound(key.to_string()))?;
        let form = RecordForm::new(&self.tree, self.target.clone(), row, self.context.clone())?
            .error_messages(self.messages.clone());
        self.editors.push((key.to_string(), form));
        Ok(true)
    }

    /// Save the open editor of a row, merging the result into the row
    pub async fn submit_edit<S: RemoteService>(
        &mut self,
        key: &str,
        service: &S,
        bus: &NotificationBus,
    ) -> ConsoleResult<SubmitOutcome> {
        let i = self
            .editors
            .iter()
            .position(|(k, _)| k == key)
            .ok_or_else(|| ConsoleError::RecordNotFound(key.to_string()))?;

        let mut changes = self.editors[i].1.group().value();
        let outcome = self.editors[i].1.submit(service, bus).await;
        if outcome.is_saved() || outcome == SubmitOutcome::Unchanged {
            self.editors.remove(i);
            if let SubmitOutcome::Saved(Value::Object(returned)) = &outcome {
                changes.extend(returned.clone());
            }
            if let Some(row) = self.position(key).map(|p| &mut self.rows[p]) {
                merge(row, changes);
            }
        }
        Ok(outcome)
    }

    /// Delete a row through the service; returns whether it was removed
    pub async fn remove<S: RemoteService>(
        &mut self,
        key: &str,
        service: &S,
        bus: &NotificationBus,
    ) -> ConsoleResult<bool> {
        if !self.removable {
            return Err(ConsoleError::InvalidConfig(format!(
                "removal is not enabled for {}",
                self.tree.name()
            )));
        }
        let index = self
            .position(key)
            .ok_or_else(|| ConsoleError::RecordNotFound(key.to_string()))?;

        let primary = self.tree.primary_key().to_string();
        let mut payload = Map::new();
        if let Some(value) = self.rows[index].get(&primary) {
            payload.insert(primary, value.clone());
        }

        tracing::info!(endpoint = %self.target, key, "removing record");
        let response = match service
            .delete(&self.target.service, &self.target.noun, &Value::Object(payload))
            .await
        {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(endpoint = %self.target, error = %err, "delete failed");
                bus.error(err.to_string());
                return Ok(false);
            }
        };

        if let Some(error) = &response.error {
            // No form to route into
            if let ErrorAction::FieldErrors(tree) = report_error(error, &self.messages, bus) {
                bus.error(tree.to_json().to_string());
            }
            report_warning(&response, bus);
            return Ok(false);
        }
        report_warning(&response, bus);

        if response.result().is_none() {
            return Ok(false);
        }

        self.rows
            .retain(|row| self.tree.primary_value(row).map(value_text).as_deref() != Some(key));
        self.editors.retain(|(k, _)| k != key);
        Ok(true)
    }
}

/// Merge `changes` into `row`, recursing into nested records
fn merge(row: &mut Record, changes: Record) {
    for (key, value) in changes {
        match (row.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(nested)) => merge(existing, nested),
            (_, value) => {
                row.insert(key, value);
            }
        }
    }
}

/// Ascending order of cell values
///
/// Missing and null sort first, then booleans, numbers (numerically),
/// strings (lexicographically) and anything else by its JSON text.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(_) => 4,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) if rank(a) == 4 && rank(b) == 4 => x.to_string().cmp(&y.to_string()),
        _ => rank(a).cmp(&rank(b)),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{Notification, drain};
    use crate::service::Response;
    use crate::service::testing::MockService;
    use crate::service::Verb;
    use crm_schema::{SchemaTree, tree_from_value};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tokio_test::block_on;

    fn tree() -> SchemaTree {
        tree_from_value(&json!({
            "__name__": "customer",
            "__ui__": {"results": ["_id", "last_name", "age"]},
            "_id": {"__type__": "string"},
            "last_name": {"__type__": "string", "__ui__": {"title": "Last Name"}},
            "age": {"__type__": "uint", "__optional__": true}
        }))
        .unwrap()
    }

    fn rows() -> Vec<Record> {
        [
            json!({"_id": "a", "last_name": "Smith", "age": 40}),
            json!({"_id": "b", "last_name": "Jones", "age": 9}),
            json!({"_id": "c", "last_name": "Brown"}),
            json!({"_id": "d", "last_name": "Adams", "age": 40}),
        ]
        .into_iter()
        .filter_map(|v| v.as_object().cloned())
        .collect()
    }

    fn table() -> ResultTable {
        ResultTable::new(&tree(), Target::new("monolith", "customer"), rows(), "age")
    }

    fn keys(table: &ResultTable) -> Vec<String> {
        table
            .rows()
            .iter()
            .map(|r| value_text(&r["_id"]))
            .collect()
    }

    #[test]
    fn test_columns_from_results_hint() {
        let t = table();
        let titles: Vec<_> = t.columns().iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["_id", "Last Name", "age"]);
    }

    #[test]
    fn test_ascending_sort_null_first_stable() {
        assert_eq!(keys(&table()), vec!["c", "b", "a", "d"]);
    }

    #[test]
    fn test_order_change_toggles_and_switches() {
        let mut t = table();
        t.order_change("age");
        assert_eq!(t.direction(), SortDirection::Desc);
        assert_eq!(keys(&t), vec!["a", "d", "b", "c"]);

        t.order_change("last_name");
        assert_eq!(t.order_by(), "last_name");
        assert_eq!(t.direction(), SortDirection::Desc);
        assert_eq!(keys(&t), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_compare_values_numbers_numerically() {
        assert_eq!(compare_values(Some(&json!(9)), Some(&json!(10))), Ordering::Less);
        assert_eq!(compare_values(Some(&json!("9")), Some(&json!("10"))), Ordering::Greater);
        assert_eq!(compare_values(None, Some(&json!(0))), Ordering::Less);
    }

    #[test]
    fn test_render_marks_key_column() {
        let view = table().render();
        assert_eq!(view.headers[2].sorted, Some(SortDirection::Asc));
        assert_eq!(view.rows[0].cells[0], Cell::Key("c".into()));
        assert_eq!(view.rows[0].cells[2], Cell::Text(String::new()));
        assert!(view.rows[0].editor.is_none());
    }

    #[test]
    fn test_toggle_edit_opens_update_form() {
        let mut t = table();
        assert!(t.toggle_edit("b").unwrap());
        assert_eq!(
            t.editor("b").unwrap().mode(),
            crm_core::OperationMode::Update
        );
        assert!(t.render().rows.iter().any(|r| r.key == "b" && r.editor.is_some()));

        assert!(!t.toggle_edit("b").unwrap());
        assert!(t.editor("b").is_none());
        assert!(t.toggle_edit("zzz").is_err());
    }

    #[test]
    fn test_submit_edit_merges_row() {
        let service = MockService::new().respond(Response::ok(true));
        let bus = NotificationBus::new();
        let mut t = table();
        t.toggle_edit("b").unwrap();
        t.editor_mut("b").unwrap().input("last_name", "Jonas".into()).unwrap();

        let outcome = block_on(t.submit_edit("b", &service, &bus)).unwrap();
        assert!(outcome.is_saved());
        assert_eq!(t.row("b").unwrap()["last_name"], json!("Jonas"));
        assert!(t.editor("b").is_none());
        assert_eq!(service.calls()[0].data, json!({"last_name": "Jonas", "_id": "b"}));
    }

    #[test]
    fn test_submit_edit_leaves_absent_keys_absent() {
        let service = MockService::new().respond(Response::ok(json!({"updated": 1})));
        let bus = NotificationBus::new();
        let mut t = table();
        t.toggle_edit("c").unwrap();
        t.editor_mut("c").unwrap().input("last_name", "Browne".into()).unwrap();

        assert!(block_on(t.submit_edit("c", &service, &bus)).unwrap().is_saved());
        let row = t.row("c").unwrap();
        assert_eq!(
            Value::Object(row.clone()),
            json!({"_id": "c", "last_name": "Browne", "updated": 1})
        );
        assert!(!row.contains_key("age"));
    }

    #[test]
    fn test_remove_requires_enabled() {
        let service = MockService::new();
        let bus = NotificationBus::new();
        let mut t = table();
        assert!(block_on(t.remove("a", &service, &bus)).is_err());
        assert!(service.calls().is_empty());
    }

    #[test]
    fn test_remove_deletes_row() {
        let service = MockService::new().respond(Response::ok(true));
        let bus = NotificationBus::new();
        let mut t = table().with_remove(true);

        assert!(block_on(t.remove("a", &service, &bus)).unwrap());
        assert_eq!(t.len(), 3);
        assert!(t.row("a").is_none());

        let call = &service.calls()[0];
        assert_eq!(call.verb, Verb::Delete);
        assert_eq!(call.data, json!({"_id": "a"}));
    }

    #[test]
    fn test_remove_rejected_keeps_row() {
        let service = MockService::new().respond(Response::error(1000, Value::Null));
        let bus = NotificationBus::new();
        let mut rx = bus.subscribe();
        let mut t = table().with_remove(true);

        assert!(!block_on(t.remove("a", &service, &bus)).unwrap());
        assert_eq!(t.len(), 4);
        assert_eq!(
            drain(&mut rx),
            vec![Notification::Error(
                "You lack the necessary rights to do the requested action".into()
            )]
        );
    }

    #[test]
    fn test_copy_key() {
        let bus = NotificationBus::new();
        let mut rx = bus.subscribe();
        assert_eq!(table().copy_key("d", &bus).as_deref(), Some("d"));
        assert_eq!(drain(&mut rx), vec![Notification::Success(KEY_COPIED_MESSAGE.into())]);
        assert!(table().copy_key("nope", &bus).is_none());
    }
}
