//! Group renderer
//!
//! A `GroupRenderer` composes field and nested group renderers in the order
//! the display hints pick for the operation mode, and aggregates their
//! state into a record. Create and search forms send every non-empty value;
//! update forms send only what changed since the last seed, plus the
//! identifying key.

use crate::control::{FormControl, RenderContext, UnroutedError};
use crate::field::{FieldInput, FieldRenderer};
use crate::view::{Item, Section};
use crm_core::{ConsoleError, ConsoleResult, DEFAULT_PRIMARY_KEY, OperationMode, Record};
use crm_schema::{ErrorEntry, ErrorTree, GroupNode, SchemaNode, join_path};
use serde_json::Value;
use std::sync::Arc;

// ============================================================================
// Child
// ============================================================================

/// A renderer owned by a group
#[derive(Debug, Clone)]
pub enum ChildRenderer {
    Field(FieldRenderer),
    Group(GroupRenderer),
}

impl ChildRenderer {
    fn control(&self) -> &dyn FormControl {
        match self {
            ChildRenderer::Field(field) => field,
            ChildRenderer::Group(group) => group,
        }
    }

    fn control_mut(&mut self) -> &mut dyn FormControl {
        match self {
            ChildRenderer::Field(field) => field,
            ChildRenderer::Group(group) => group,
        }
    }
}

// ============================================================================
// GroupRenderer
// ============================================================================

/// Editable state of a group of fields
#[derive(Debug, Clone)]
pub struct GroupRenderer {
    name: String,
    path: String,
    node: Arc<GroupNode>,
    mode: OperationMode,
    children: Vec<(String, ChildRenderer)>,
    primary_key: Option<String>,
    primary: Option<Value>,
    context: RenderContext,
}

impl GroupRenderer {
    /// Build a root group renderer seeded with `initial`
    pub fn new(
        name: impl Into<String>,
        node: Arc<GroupNode>,
        initial: &Record,
        mode: OperationMode,
    ) -> ConsoleResult<Self> {
        Self::with_context(name, node, initial, mode, RenderContext::default())
    }

    /// Build a root group renderer with render collaborators
    pub fn with_context(
        name: impl Into<String>,
        node: Arc<GroupNode>,
        initial: &Record,
        mode: OperationMode,
        context: RenderContext,
    ) -> ConsoleResult<Self> {
        let mut group = Self::build(name.into(), String::new(), node, initial, mode, context)?;
        group.set_primary_key(DEFAULT_PRIMARY_KEY, initial);
        Ok(group)
    }

    /// Use `key` as the identifying key instead of the default
    pub fn with_primary_key(mut self, key: impl Into<String>, initial: &Record) -> Self {
        self.set_primary_key(key, initial);
        self
    }

    fn set_primary_key(&mut self, key: impl Into<String>, initial: &Record) {
        let key = key.into();
        self.primary = initial.get(&key).filter(|v| !v.is_null()).cloned();
        self.primary_key = Some(key);
    }

    fn build(
        name: String,
        path: String,
        node: Arc<GroupNode>,
        initial: &Record,
        mode: OperationMode,
        context: RenderContext,
    ) -> ConsoleResult<Self> {
        if let Some(order) = node.hints.order_for(mode) {
            if let Some(missing) = order.iter().find(|key| node.child(key).is_none()) {
                return Err(ConsoleError::UnknownChild {
                    group: if path.is_empty() { name.clone() } else { path.clone() },
                    child: missing.clone(),
                });
            }
        }

        let empty = Record::new();
        let mut children = Vec::new();
        for key in node.resolve_order(mode) {
            let child_path = join_path(&path, key);
            let child = match node.child(key) {
                Some(SchemaNode::Leaf(leaf)) => ChildRenderer::Field(FieldRenderer::new(
                    key,
                    leaf.clone(),
                    initial.get(key).cloned(),
                    child_path,
                )?),
                Some(SchemaNode::Group(group)) => {
                    let seed = initial.get(key).and_then(Value::as_object).unwrap_or(&empty);
                    ChildRenderer::Group(Self::build(
                        key.to_string(),
                        child_path,
                        group.clone(),
                        seed,
                        mode,
                        context.clone(),
                    )?)
                }
                None => continue,
            };
            children.push((key.to_string(), child));
        }

        Ok(Self {
            name,
            path,
            node,
            mode,
            children,
            primary_key: None,
            primary: None,
            context,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Operation mode the group was built for
    pub fn mode(&self) -> OperationMode {
        self.mode
    }

    /// Schema of this group
    pub fn node(&self) -> &Arc<GroupNode> {
        &self.node
    }

    /// Child names in render order
    pub fn keys(&self) -> Vec<&str> {
        self.children.iter().map(|(k, _)| k.as_str()).collect()
    }

    /// Direct child by name
    pub fn child(&self, key: &str) -> Option<&ChildRenderer> {
        self.children.iter().find(|(k, _)| k == key).map(|(_, c)| c)
    }

    fn child_mut(&mut self, key: &str) -> Option<&mut ChildRenderer> {
        self.children
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, c)| c)
    }

    /// Field at a dotted path
    pub fn field(&self, path: &str) -> Option<&FieldRenderer> {
        match (path.split_once('.'), self.child(path)) {
            (None, Some(ChildRenderer::Field(field))) => Some(field),
            (Some((head, rest)), _) => match self.child(head)? {
                ChildRenderer::Group(group) => group.field(rest),
                ChildRenderer::Field(_) => None,
            },
            _ => None,
        }
    }

    /// Mutable field at a dotted path
    pub fn field_mut(&mut self, path: &str) -> Option<&mut FieldRenderer> {
        match path.split_once('.') {
            None => match self.child_mut(path)? {
                ChildRenderer::Field(field) => Some(field),
                ChildRenderer::Group(_) => None,
            },
            Some((head, rest)) => match self.child_mut(head)? {
                ChildRenderer::Group(group) => group.field_mut(rest),
                ChildRenderer::Field(_) => None,
            },
        }
    }

    // ========================================================================
    // Values
    // ========================================================================

    /// Aggregate the children into a record according to the mode
    pub fn value(&self) -> Record {
        let mut record = self.collect();
        if self.mode == OperationMode::Update {
            if let (Some(key), Some(primary)) = (&self.primary_key, &self.primary) {
                record
                    .entry(key.clone())
                    .or_insert_with(|| primary.clone());
            }
        }
        record
    }

    fn collect(&self) -> Record {
        let mut record = Record::new();
        for (key, child) in &self.children {
            match child {
                ChildRenderer::Field(field) => {
                    let include = match self.mode {
                        OperationMode::Update => field.is_changed(),
                        OperationMode::Create | OperationMode::Search => !field.value().is_null(),
                    };
                    if include {
                        record.insert(key.clone(), field.value().clone());
                    }
                }
                ChildRenderer::Group(group) => {
                    let nested = group.collect();
                    if !nested.is_empty() {
                        record.insert(key.clone(), Value::Object(nested));
                    }
                }
            }
        }
        record
    }

    /// Every child value including empty ones
    pub fn snapshot(&self) -> Record {
        self.children
            .iter()
            .map(|(key, child)| {
                let value = match child {
                    ChildRenderer::Field(field) => field.value().clone(),
                    ChildRenderer::Group(group) => Value::Object(group.snapshot()),
                };
                (key.clone(), value)
            })
            .collect()
    }

    /// Check if the aggregate carries anything besides the identifying key
    pub fn has_changes(&self) -> bool {
        !self.collect().is_empty()
    }

    /// Identifying value the group was seeded with
    pub fn primary_value(&self) -> Option<&Value> {
        self.primary.as_ref()
    }

    /// Route values to the matching children; unknown keys are ignored
    pub fn set_value(&mut self, record: &Record) {
        for (key, value) in record {
            let is_primary = self.primary_key.as_deref() == Some(key.as_str());
            match self.child_mut(key) {
                Some(child) => child.control_mut().assign(value),
                None if is_primary => {
                    self.primary = Some(value.clone()).filter(|v| !v.is_null());
                }
                None => {
                    tracing::debug!(
                        field = %join_path(&self.path, key),
                        "ignoring value for unknown field"
                    );
                }
            }
        }
    }

    /// Deliver an edit event to the field at a dotted path
    pub fn input(&mut self, path: &str, input: FieldInput) -> ConsoleResult<()> {
        let field = self
            .field_mut(path)
            .ok_or_else(|| ConsoleError::FieldNotFound(path.to_string()))?;
        field.input(input);
        Ok(())
    }

    // ========================================================================
    // Errors
    // ========================================================================

    /// Route an error tree to the children
    ///
    /// Messages for keys that are not children, or whose shape does not match
    /// the child (a message for a group, a nested tree for a field), are
    /// returned instead.
    pub fn set_errors(&mut self, errors: &ErrorTree) -> Vec<UnroutedError> {
        let mut unrouted = Vec::new();
        let path = self.path.clone();

        for (key, entry) in errors.iter() {
            let child_path = join_path(&path, key);
            match (self.child_mut(key), entry) {
                (Some(ChildRenderer::Field(field)), ErrorEntry::Message(msg)) => {
                    field.set_error(msg.clone());
                }
                (Some(ChildRenderer::Group(group)), ErrorEntry::Nested(tree)) => {
                    unrouted.extend(group.set_errors(tree));
                }
                (_, ErrorEntry::Message(msg)) => {
                    unrouted.push(UnroutedError::new(child_path, msg.clone()));
                }
                (_, ErrorEntry::Nested(tree)) => {
                    unrouted.push(UnroutedError::new(child_path, tree.to_json().to_string()));
                }
            }
        }

        for err in &unrouted {
            tracing::warn!(field = %err.path, message = %err.message, "error for unknown field");
        }
        unrouted
    }

    /// Errors currently displayed, keyed by path relative to this group
    pub fn errors(&self) -> ErrorTree {
        let mut tree = ErrorTree::new();
        self.gather_errors("", &mut tree);
        tree
    }

    fn gather_errors(&self, prefix: &str, tree: &mut ErrorTree) {
        for (key, child) in &self.children {
            let path = join_path(prefix, key);
            match child {
                ChildRenderer::Field(field) => {
                    if let Some(msg) = field.error() {
                        tree.insert(&path, msg);
                    }
                }
                ChildRenderer::Group(group) => group.gather_errors(&path, tree),
            }
        }
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Build the section view model, resolving dynamic select options
    pub fn render(&self) -> Section {
        let record = self.snapshot();
        let items = self
            .children
            .iter()
            .map(|(_, child)| match child {
                ChildRenderer::Field(field) => {
                    let path = FormControl::path(field);
                    Item::Control(field.render(self.context.resolve_options(path, &record)))
                }
                ChildRenderer::Group(group) => Item::Section(group.render()),
            })
            .collect();

        Section {
            name: self.name.clone(),
            path: self.path.clone(),
            title: self.node.hints.title.clone(),
            items,
        }
    }
}

impl FormControl for GroupRenderer {
    fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn current_value(&self) -> Value {
        Value::Object(self.value())
    }

    fn assign(&mut self, value: &Value) {
        match value {
            Value::Object(record) => {
                self.clear_errors();
                self.set_value(record);
            }
            other => tracing::debug!(
                field = %self.path,
                value = %other,
                "ignoring non-object value for group"
            ),
        }
    }

    fn clear_errors(&mut self) {
        for (_, child) in &mut self.children {
            child.control_mut().clear_errors();
        }
    }

    fn has_errors(&self) -> bool {
        self.children.iter().any(|(_, c)| c.control().has_errors())
    }

    fn reseed(&mut self) {
        for (_, child) in &mut self.children {
            child.control_mut().reseed();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
