//! Shared renderer behaviour
//!
//! Groups own their children through [`FormControl`] so that value reads,
//! writes and error handling recurse the same way for fields and nested
//! groups. [`RenderContext`] carries the collaborators a renderer consults
//! at render time, currently just the option resolver.

use crm_core::{Record, SelectOption};
use crm_schema::ErrorTree;
use serde_json::Value;
use std::sync::Arc;

// ============================================================================
// FormControl Trait
// ============================================================================

/// Behaviour common to field and group renderers
pub trait FormControl {
    /// Field name within the parent group
    fn name(&self) -> &str;

    /// Dotted path from the form root
    fn path(&self) -> &str;

    /// Current value as the record would carry it
    fn current_value(&self) -> Value;

    /// Overwrite the current value and clear displayed errors
    fn assign(&mut self, value: &Value);

    /// Drop every displayed error
    fn clear_errors(&mut self);

    /// Check if any error is displayed
    fn has_errors(&self) -> bool;

    /// Make the current value the baseline for update diffs
    fn reseed(&mut self);
}

// ============================================================================
// Option Resolver
// ============================================================================

/// Supplies select options that depend on other values of the record
///
/// `path` is the dotted path of the select being rendered, `record` the
/// current values of the group that contains it. Returning `None` keeps the
/// options declared by the schema.
pub trait OptionResolver: Send + Sync {
    fn options(&self, path: &str, record: &Record) -> Option<Vec<SelectOption>>;
}

impl<F> OptionResolver for F
where
    F: Fn(&str, &Record) -> Option<Vec<SelectOption>> + Send + Sync,
{
    fn options(&self, path: &str, record: &Record) -> Option<Vec<SelectOption>> {
        self(path, record)
    }
}

// ============================================================================
// RenderContext
// ============================================================================

/// Collaborators available to renderers
#[derive(Clone, Default)]
pub struct RenderContext {
    resolver: Option<Arc<dyn OptionResolver>>,
}

impl RenderContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the option resolver
    pub fn with_resolver(mut self, resolver: impl OptionResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Ask the resolver for options, if one is set
    pub fn resolve_options(&self, path: &str, record: &Record) -> Option<Vec<SelectOption>> {
        self.resolver.as_ref()?.options(path, record)
    }
}

impl std::fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderContext")
            .field("resolver", &self.resolver.is_some())
            .finish()
    }
}

// ============================================================================
// UnroutedError
// ============================================================================

/// An error message whose path matches no field of the form
#[derive(Debug, Clone, PartialEq)]
pub struct UnroutedError {
    /// Dotted path the message was addressed to
    pub path: String,

    /// The message, or the JSON of a nested error tree
    pub message: String,
}

impl UnroutedError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Gather unrouted errors back into a tree
    pub fn to_tree(errors: &[UnroutedError]) -> ErrorTree {
        ErrorTree::from_pairs(errors.iter().map(|e| (e.path.as_str(), e.message.clone())))
    }
}

impl std::fmt::Display for UnroutedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Field not found error: {} ({})", self.message, self.path)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_without_resolver() {
        let ctx = RenderContext::new();
        assert!(ctx.resolve_options("state", &Record::new()).is_none());
    }

    #[test]
    fn test_closure_resolver() {
        let ctx = RenderContext::new().with_resolver(|path: &str, record: &Record| {
            if path != "division" {
                return None;
            }
            match record.get("country").and_then(Value::as_str) {
                Some("CA") => Some(vec![SelectOption::new("ON", "Ontario")]),
                _ => Some(vec![]),
            }
        });

        let mut record = Record::new();
        record.insert("country".into(), Value::String("CA".into()));
        assert_eq!(
            ctx.resolve_options("division", &record).unwrap()[0].label,
            "Ontario"
        );
        assert!(ctx.resolve_options("city", &record).is_none());
        assert_eq!(format!("{:?}", ctx), "RenderContext { resolver: true }");
    }

    #[test]
    fn test_unrouted_error_display() {
        let err = UnroutedError::new("address.unit", "required");
        assert_eq!(err.to_string(), "Field not found error: required (address.unit)");
        assert_eq!(
            UnroutedError::to_tree(&[err]).message_at("address.unit"),
            Some("required")
        );
    }
}
