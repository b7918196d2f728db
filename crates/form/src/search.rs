//! Search panel
//!
//! A search-mode group renderer whose non-empty values become the query of
//! a `read` call. Nothing is required and no value is validated before the
//! query is sent; the service decides what matches.

use crate::control::{FormControl, RenderContext};
use crate::field::FieldInput;
use crate::group::GroupRenderer;
use crate::notify::NotificationBus;
use crate::service::{ErrorAction, ErrorMessages, RemoteService, Target, report_error, report_warning};
use crate::view::Section;
use crm_core::{ConsoleResult, Named, OperationMode, Record};
use crm_schema::SchemaTree;
use serde_json::Value;

/// Query builder over a schema
#[derive(Debug)]
pub struct SearchPanel {
    target: Target,
    group: GroupRenderer,
    messages: ErrorMessages,
}

impl SearchPanel {
    /// Build an empty search panel
    pub fn new(tree: &SchemaTree, target: Target, context: RenderContext) -> ConsoleResult<Self> {
        let group = GroupRenderer::with_context(
            tree.name(),
            tree.root().clone(),
            &Record::new(),
            OperationMode::Search,
            context,
        )?;
        Ok(Self {
            target,
            group,
            messages: ErrorMessages::new(),
        })
    }

    /// Set the code to friendly message table
    pub fn error_messages(mut self, messages: ErrorMessages) -> Self {
        self.messages = messages;
        self
    }

    pub fn group(&self) -> &GroupRenderer {
        &self.group
    }

    /// Deliver an edit event to the field at a dotted path
    pub fn input(&mut self, path: &str, input: FieldInput) -> ConsoleResult<()> {
        self.group.input(path, input)
    }

    /// Overwrite query values
    pub fn set_value(&mut self, record: &Record) {
        self.group.set_value(record);
    }

    /// Non-empty values as query parameters
    pub fn query(&self) -> Record {
        self.group.value()
    }

    pub fn render(&self) -> Section {
        self.group.render()
    }

    /// Run the query; returns the matching records
    ///
    /// Errors and warnings are published on the bus and yield no records.
    pub async fn search<S: RemoteService>(
        &mut self,
        service: &S,
        bus: &NotificationBus,
    ) -> Vec<Record> {
        let query = Value::Object(self.query());
        tracing::info!(endpoint = %self.target, "searching");

        let response = match service
            .read(&self.target.service, &self.target.noun, &query)
            .await
        {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(endpoint = %self.target, error = %err, "search failed");
                bus.error(err.to_string());
                return Vec::new();
            }
        };

        self.group.clear_errors();
        if let Some(error) = &response.error {
            if let ErrorAction::FieldErrors(tree) = report_error(error, &self.messages, bus) {
                for unrouted in self.group.set_errors(&tree) {
                    bus.error(unrouted.to_string());
                }
            }
            report_warning(&response, bus);
            return Vec::new();
        }
        report_warning(&response, bus);

        let records = match response.data {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(record) => Some(record),
                    _ => None,
                })
                .collect(),
            Some(Value::Object(record)) => vec![record],
            _ => Vec::new(),
        };
        tracing::debug!(endpoint = %self.target, found = records.len(), "search finished");
        records
    }
}

impl Named for SearchPanel {
    fn name(&self) -> &str {
        FormControl::name(&self.group)
    }
}

// ============================================================================
// Tests
// ============================================================================
