//! Schema trees
//!
//! A `SchemaTree` is a named root group plus the record-level facts derived
//! from it: the primary key, the operation mode a record implies, and
//! whole-record validation.

use crate::node::GroupNode;
use crate::validation::{RecordValidator, Strictness, ValidationResult};
use crm_core::{
    ConsoleResult, DEFAULT_PRIMARY_KEY, Named, OperationMode, Record, Validatable,
};
use std::sync::Arc;

/// A validated schema with a name and a root group
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaTree {
    name: String,
    root: Arc<GroupNode>,
}

impl SchemaTree {
    /// Create a tree, checking the schema for configuration defects
    pub fn new(name: impl Into<String>, root: GroupNode) -> ConsoleResult<Self> {
        root.validate()?;
        Ok(Self {
            name: name.into(),
            root: Arc::new(root),
        })
    }

    /// Root group
    pub fn root(&self) -> &Arc<GroupNode> {
        &self.root
    }

    /// Human readable name: the root title if set, else the tree name
    pub fn title(&self) -> &str {
        self.root.hints.title.as_deref().unwrap_or(&self.name)
    }

    /// Identifying key of records of this schema
    pub fn primary_key(&self) -> &str {
        self.root
            .hints
            .primary
            .as_deref()
            .unwrap_or(DEFAULT_PRIMARY_KEY)
    }

    /// Use `key` as the identifying key unless the schema names its own
    pub fn with_default_primary(mut self, key: &str) -> Self {
        if self.root.hints.primary.is_none() {
            Arc::make_mut(&mut self.root).hints.primary = Some(key.to_string());
        }
        self
    }

    /// Identifying value of a record, if it has one
    pub fn primary_value<'a>(&self, record: &'a Record) -> Option<&'a serde_json::Value> {
        record.get(self.primary_key()).filter(|v| !v.is_null())
    }

    /// Mode a record implies: update when it carries its primary key
    pub fn mode_for(&self, record: &Record) -> OperationMode {
        if self.primary_value(record).is_some() {
            OperationMode::Update
        } else {
            OperationMode::Create
        }
    }

    /// Validate a record with the structural rule only
    pub fn validate_record(&self, record: &Record, strictness: Strictness) -> ValidationResult {
        RecordValidator::with_default_rules().validate(self, record, strictness)
    }
}

impl Named for SchemaTree {
    fn name(&self) -> &str {
        &self.name
    }
}

// ============================================================================
// Tests
// ============================================================================
