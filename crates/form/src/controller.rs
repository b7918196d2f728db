//! Record form controller
//!
//! A `RecordForm` binds a group renderer to a create or update call on a
//! remote service. Submitting reads the aggregate record, validates it
//! against the schema, sends it, and reconciles the response back into the
//! renderers and the notification bus.

use crate::control::{FormControl, RenderContext};
use crate::field::FieldInput;
use crate::group::GroupRenderer;
use crate::notify::NotificationBus;
use crate::service::{
    ErrorAction, ErrorMessages, RemoteService, Target, Verb, report_error, report_warning,
};
use crate::view::FormView;
use crm_core::{ConsoleResult, Named, OperationMode, Record};
use crm_schema::{ErrorTree, RecordRule, RecordValidator, SchemaTree, Strictness};
use serde_json::Value;

/// Message published when a record fails local validation
pub const INVALID_DATA_MESSAGE: &str = "Please fix invalid data";

/// Callback invoked with the data of a successful save
pub type SuccessCallback = Box<dyn FnMut(&Value) + Send>;

// ============================================================================
// State
// ============================================================================

/// Whether a submission is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormState {
    #[default]
    Idle,
    Submitting,
}

/// How a submission ended
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The service stored the record and returned this data
    Saved(Value),
    /// Update with nothing changed; no request was sent
    Unchanged,
    /// Local validation failed; no request was sent
    Invalid,
    /// The service answered with an error or without data
    Rejected,
    /// The request never got an answer
    Failed,
}

impl SubmitOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SubmitOutcome::Saved(_))
    }
}

// ============================================================================
// RecordForm
// ============================================================================

/// A form that creates or updates one record
pub struct RecordForm {
    tree: SchemaTree,
    target: Target,
    name: String,
    mode: OperationMode,
    group: GroupRenderer,
    messages: ErrorMessages,
    rules: RecordValidator,
    on_success: Option<SuccessCallback>,
    state: FormState,
}

impl RecordForm {
    /// Build a form for `initial`
    ///
    /// The form updates when `initial` carries the schema's identifying key
    /// and creates otherwise.
    pub fn new(
        tree: &SchemaTree,
        target: Target,
        initial: &Record,
        context: RenderContext,
    ) -> ConsoleResult<Self> {
        Self::with_mode(tree, target, initial, tree.mode_for(initial), context)
    }

    /// Build a form in an explicit mode
    pub fn with_mode(
        tree: &SchemaTree,
        target: Target,
        initial: &Record,
        mode: OperationMode,
        context: RenderContext,
    ) -> ConsoleResult<Self> {
        let group = GroupRenderer::with_context(
            tree.name(),
            tree.root().clone(),
            initial,
            mode,
            context,
        )?
        .with_primary_key(tree.primary_key(), initial);

        Ok(Self {
            tree: tree.clone(),
            target,
            name: tree.title().to_string(),
            mode,
            group,
            messages: ErrorMessages::new(),
            rules: RecordValidator::with_default_rules(),
            on_success: None,
            state: FormState::Idle,
        })
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Set the code to friendly message table
    pub fn error_messages(mut self, messages: ErrorMessages) -> Self {
        self.messages = messages;
        self
    }

    /// Set the callback run with the data of a successful save
    pub fn on_success(mut self, callback: impl FnMut(&Value) + Send + 'static) -> Self {
        self.on_success = Some(Box::new(callback));
        self
    }

    /// Add a record-level validation rule
    pub fn with_rule(mut self, rule: Box<dyn RecordRule>) -> Self {
        self.rules.add_rule(rule);
        self
    }

    /// Name used in success messages and the form title
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn mode(&self) -> OperationMode {
        self.mode
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn is_submitting(&self) -> bool {
        self.state == FormState::Submitting
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn group(&self) -> &GroupRenderer {
        &self.group
    }

    pub fn group_mut(&mut self) -> &mut GroupRenderer {
        &mut self.group
    }

    /// Deliver an edit event to the field at a dotted path
    pub fn input(&mut self, path: &str, input: FieldInput) -> ConsoleResult<()> {
        self.group.input(path, input)
    }

    /// Heading of the form
    pub fn title(&self) -> String {
        match self.mode {
            OperationMode::Update => format!("Update {}", self.name),
            OperationMode::Create | OperationMode::Search => format!("Create {}", self.name),
        }
    }

    /// Build the form view model
    pub fn render(&self) -> FormView {
        FormView {
            title: self.title(),
            submit_label: match self.mode {
                OperationMode::Update => "Save",
                OperationMode::Create | OperationMode::Search => "Create",
            },
            busy: self.is_submitting(),
            section: self.group.render(),
        }
    }

    // ========================================================================
    // Submission
    // ========================================================================

    /// Validate and send the record
    pub async fn submit<S: RemoteService>(
        &mut self,
        service: &S,
        bus: &NotificationBus,
    ) -> SubmitOutcome {
        let record = self.group.value();

        if self.mode == OperationMode::Update && !self.group.has_changes() {
            tracing::info!(endpoint = %self.target, "nothing changed, skipping update");
            return SubmitOutcome::Unchanged;
        }

        let strictness = match self.mode {
            OperationMode::Create => Strictness::Full,
            OperationMode::Update | OperationMode::Search => Strictness::Partial,
        };
        let result = self.rules.validate(&self.tree, &record, strictness);
        if !result.valid {
            tracing::warn!(
                endpoint = %self.target,
                errors = result.errors.len(),
                "record failed validation"
            );
            bus.error(INVALID_DATA_MESSAGE);
            self.group.clear_errors();
            self.route_errors(&result.to_error_tree(), bus);
            return SubmitOutcome::Invalid;
        }

        let verb = match self.mode {
            OperationMode::Update => Verb::Update,
            OperationMode::Create | OperationMode::Search => Verb::Create,
        };
        let payload = Value::Object(record);

        tracing::info!(endpoint = %self.target, %verb, "submitting record");
        self.state = FormState::Submitting;
        let response = service
            .request(verb, &self.target.service, &self.target.noun, &payload)
            .await;
        self.state = FormState::Idle;

        let response = match response {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(endpoint = %self.target, error = %err, "request failed");
                bus.error(err.to_string());
                return SubmitOutcome::Failed;
            }
        };

        let mut rejected = false;
        if let Some(error) = &response.error {
            rejected = true;
            tracing::warn!(endpoint = %self.target, code = error.code, "service rejected record");
            if let ErrorAction::FieldErrors(tree) = report_error(error, &self.messages, bus) {
                self.group.clear_errors();
                self.route_errors(&tree, bus);
            }
        }

        report_warning(&response, bus);

        match response.result() {
            Some(data) if !rejected => {
                let data = data.clone();
                bus.success(match self.mode {
                    OperationMode::Update => format!("Saved {}", self.name),
                    OperationMode::Create | OperationMode::Search => {
                        format!("Created new {}", self.name)
                    }
                });
                if let Some(callback) = self.on_success.as_mut() {
                    callback(&data);
                }
                if self.mode == OperationMode::Update {
                    self.group.reseed();
                }
                tracing::info!(endpoint = %self.target, "record saved");
                SubmitOutcome::Saved(data)
            }
            _ => SubmitOutcome::Rejected,
        }
    }

    fn route_errors(&mut self, errors: &ErrorTree, bus: &NotificationBus) {
        for unrouted in self.group.set_errors(errors) {
            bus.error(unrouted.to_string());
        }
    }
}

impl std::fmt::Debug for RecordForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordForm")
            .field("target", &self.target)
            .field("mode", &self.mode)
            .field("state", &self.state)
            .field("group", &self.group)
            .finish_non_exhaustive()
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
    use crm_schema::{MatchingFieldsRule, tree_from_value};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use tokio_test::block_on;

    fn customer_tree() -> SchemaTree {
        tree_from_value(&json!({
            "__name__": "customer",
            "email": {"__type__": "string"},
            "first_name": {"__type__": "string"},
            "age": {"__type__": "uint", "__optional__": true},
            "address": {
                "city": {"__type__": "string"}
            }
        }))
        .unwrap()
    }

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap_or_default()
    }

    fn target() -> Target {
        Target::new("monolith", "customer")
    }

    fn create_form() -> RecordForm {
        RecordForm::new(&customer_tree(), target(), &Record::new(), RenderContext::new()).unwrap()
    }

    fn fill(form: &mut RecordForm) {
        form.input("email", "ada@example.com".into()).unwrap();
        form.input("first_name", "Ada".into()).unwrap();
        form.input("address.city", "London".into()).unwrap();
    }

    #[test]
    fn test_mode_follows_primary_key() {
        assert_eq!(create_form().mode(), OperationMode::Create);

        let form = RecordForm::new(
            &customer_tree(),
            target(),
            &record(json!({"_id": "c1", "email": "a@b.c"})),
            RenderContext::new(),
        )
        .unwrap();
        assert_eq!(form.mode(), OperationMode::Update);
        assert_eq!(form.title(), "Update customer");
        assert_eq!(form.render().submit_label, "Save");

        let forced = RecordForm::with_mode(
            &customer_tree(),
            target(),
            &Record::new(),
            OperationMode::Update,
            RenderContext::new(),
        )
        .unwrap();
        assert_eq!(forced.title(), "Update customer");
    }

    #[test]
    fn test_required_field_empty_blocks_submit() {
        let service = MockService::new();
        let bus = NotificationBus::new();
        let mut rx = bus.subscribe();
        let mut form = create_form();
        form.input("email", "ada@example.com".into()).unwrap();

        let outcome = block_on(form.submit(&service, &bus));

        assert_eq!(outcome, SubmitOutcome::Invalid);
        assert!(service.calls().is_empty());
        assert_eq!(
            drain(&mut rx),
            vec![Notification::Error(INVALID_DATA_MESSAGE.into())]
        );
        assert_eq!(
            form.group().field("first_name").unwrap().error(),
            Some("missing")
        );
        assert_eq!(
            form.group().field("address.city").unwrap().error(),
            Some("missing")
        );
    }

    #[test]
    fn test_create_success() {
        let service = MockService::new().respond(Response::ok(json!("c9")));
        let bus = NotificationBus::new();
        let mut rx = bus.subscribe();
        let saved = Arc::new(Mutex::new(None));
        let sink = saved.clone();

        let mut form = create_form().on_success(move |data| {
            *sink.lock().unwrap() = Some(data.clone());
        });
        fill(&mut form);

        let outcome = block_on(form.submit(&service, &bus));

        assert_eq!(outcome, SubmitOutcome::Saved(json!("c9")));
        assert_eq!(*saved.lock().unwrap(), Some(json!("c9")));
        assert_eq!(
            drain(&mut rx),
            vec![Notification::Success("Created new customer".into())]
        );

        let calls = service.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].verb, Verb::Create);
        assert_eq!(calls[0].noun, "customer");
        assert_eq!(
            calls[0].data,
            json!({"email": "ada@example.com", "first_name": "Ada", "address": {"city": "London"}})
        );
        assert_eq!(form.state(), FormState::Idle);
    }

    #[test]
    fn test_update_unchanged_skips_request() {
        let service = MockService::new();
        let bus = NotificationBus::new();
        let mut form = RecordForm::new(
            &customer_tree(),
            target(),
            &record(json!({"_id": "c1", "email": "a@b.c"})),
            RenderContext::new(),
        )
        .unwrap();

        assert_eq!(block_on(form.submit(&service, &bus)), SubmitOutcome::Unchanged);
        assert!(service.calls().is_empty());
    }

    #[test]
    fn test_update_sends_diff_and_reseeds() {
        let service = MockService::new().respond(Response::ok(true));
        let bus = NotificationBus::new();
        let mut rx = bus.subscribe();
        let mut form = RecordForm::new(
            &customer_tree(),
            target(),
            &record(json!({"_id": "c1", "email": "a@b.c", "first_name": "Ada"})),
            RenderContext::new(),
        )
        .unwrap();
        form.input("first_name", "Augusta".into()).unwrap();

        assert!(block_on(form.submit(&service, &bus)).is_saved());
        let calls = service.calls();
        assert_eq!(calls[0].verb, Verb::Update);
        assert_eq!(calls[0].data, json!({"first_name": "Augusta", "_id": "c1"}));
        assert_eq!(drain(&mut rx), vec![Notification::Success("Saved customer".into())]);

        assert_eq!(block_on(form.submit(&service, &bus)), SubmitOutcome::Unchanged);
    }

    #[test]
    fn test_field_errors_from_service() {
        let service = MockService::new().respond(Response::error(
            1001,
            json!([["email", "Email already in use"], ["address.city", "unknown city"], ["phone", "bad"]]),
        ));
        let bus = NotificationBus::new();
        let mut rx = bus.subscribe();
        let mut form = create_form();
        fill(&mut form);

        assert_eq!(block_on(form.submit(&service, &bus)), SubmitOutcome::Rejected);
        assert_eq!(
            form.group().field("email").unwrap().error(),
            Some("Email already in use")
        );
        assert_eq!(
            form.group().field("address.city").unwrap().error(),
            Some("unknown city")
        );
        assert_eq!(
            drain(&mut rx),
            vec![Notification::Error("Field not found error: bad (phone)".into())]
        );
    }

    #[test]
    fn test_mapped_error_and_warning() {
        let service = MockService::new()
            .respond(Response::error(1200, "ada@example.com").with_warning("duplicate check slow"));
        let bus = NotificationBus::new();
        let mut rx = bus.subscribe();
        let mut form = create_form().error_messages(ErrorMessages::from([(
            1200,
            "Email already in use".to_string(),
        )]));
        fill(&mut form);

        assert_eq!(block_on(form.submit(&service, &bus)), SubmitOutcome::Rejected);
        assert_eq!(
            drain(&mut rx),
            vec![
                Notification::Error("Email already in use".into()),
                Notification::Warning("\"duplicate check slow\"".into()),
            ]
        );
    }

    #[test]
    fn test_transport_failure() {
        let service = MockService::new().fail("connection refused");
        let bus = NotificationBus::new();
        let mut rx = bus.subscribe();
        let mut form = create_form();
        fill(&mut form);

        assert_eq!(block_on(form.submit(&service, &bus)), SubmitOutcome::Failed);
        assert!(!form.is_submitting());
        assert_eq!(
            drain(&mut rx),
            vec![Notification::Error("Transport error: connection refused".into())]
        );
    }

    #[test]
    fn test_signed_out_code() {
        let service = MockService::new().respond(Response::error(102, "expired"));
        let bus = NotificationBus::new();
        let mut rx = bus.subscribe();
        let mut form = create_form();
        fill(&mut form);

        assert_eq!(block_on(form.submit(&service, &bus)), SubmitOutcome::Rejected);
        assert_eq!(drain(&mut rx), vec![Notification::SignedOut]);
    }

    #[test]
    fn test_record_rule_blocks_submit() {
        let service = MockService::new();
        let bus = NotificationBus::new();
        let mut form = create_form().with_rule(Box::new(MatchingFieldsRule::new(
            "first_name",
            "address.city",
        )));
        fill(&mut form);

        assert_eq!(block_on(form.submit(&service, &bus)), SubmitOutcome::Invalid);
        assert_eq!(
            form.group().field("address.city").unwrap().error(),
            Some("does not match first_name")
        );
    }

    fn postcode_tree(node_regex: &str, hint_regex: &str) -> SchemaTree {
        tree_from_value(&json!({
            "__name__": "address",
            "zip": {
                "__type__": "string",
                "__regex__": node_regex,
                "__ui__": {"regex": hint_regex}
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_hint_regex_rejection_blocks_submit() {
        let service = MockService::new().respond(Response::ok(json!("id1")));
        let bus = NotificationBus::new();
        let tree = postcode_tree(".*", r"^\d{5}$");
        let mut form = RecordForm::new(&tree, target(), &Record::new(), RenderContext::new())
            .unwrap();

        form.input("zip", "abc".into()).unwrap();
        assert_eq!(form.group().field("zip").unwrap().error(), Some("Invalid Value"));

        assert_eq!(block_on(form.submit(&service, &bus)), SubmitOutcome::Invalid);
        assert!(service.calls().is_empty());
        assert_eq!(
            form.group().field("zip").unwrap().error(),
            Some("does not match pattern")
        );
    }

    #[test]
    fn test_hint_regex_acceptance_allows_submit() {
        let service = MockService::new().respond(Response::ok(json!("id1")));
        let bus = NotificationBus::new();
        let tree = postcode_tree(r"^\d{5}$", r"^[A-Z]\d[A-Z] \d[A-Z]\d$");
        let mut form = RecordForm::new(&tree, target(), &Record::new(), RenderContext::new())
            .unwrap();

        form.input("zip", "K1A 0B1".into()).unwrap();
        assert!(form.group().field("zip").unwrap().error().is_none());

        assert_eq!(
            block_on(form.submit(&service, &bus)),
            SubmitOutcome::Saved(json!("id1"))
        );
        assert_eq!(service.calls()[0].data, json!({"zip": "K1A 0B1"}));
    }

    #[test]
    fn test_labelled_options_submit_values() {
        let service = MockService::new().respond(Response::ok(json!("c2")));
        let bus = NotificationBus::new();
        let tree = tree_from_value(&json!({
            "__name__": "customer",
            "country": {
                "__type__": "string",
                "__options__": [["US", "United States"], ["CA", "Canada"]]
            }
        }))
        .unwrap();
        let mut form = RecordForm::new(&tree, target(), &Record::new(), RenderContext::new())
            .unwrap();

        let view = form.render();
        let country = view.section.control("country").unwrap();
        assert_eq!(country.options[1].label, "Canada");

        form.input("country", "US".into()).unwrap();
        assert!(form.group().field("country").unwrap().error().is_none());

        assert!(block_on(form.submit(&service, &bus)).is_saved());
        assert_eq!(service.calls()[0].data, json!({"country": "US"}));
    }

    #[test]
    fn test_render_create_form() {
        let view = create_form().with_name("Customer").render();
        assert_eq!(view.title, "Create Customer");
        assert_eq!(view.submit_label, "Create");
        assert!(!view.busy);
        assert_eq!(view.section.controls().len(), 4);
    }
}
