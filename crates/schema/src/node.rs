//! Schema nodes
//!
//! A schema is a tree: groups hold named children in document order, leaves
//! describe scalar values. Nodes are immutable once built and shared through
//! `Arc`, so every renderer built from a schema reads the same definition.

use crate::hints::DisplayHints;
use crate::leaf::{LeafNode, Pattern};
use crm_core::{ConsoleError, ConsoleResult, OperationMode, Validatable};
use std::sync::Arc;

// ============================================================================
// SchemaNode
// ============================================================================

/// Either a leaf or a group
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    Leaf(Arc<LeafNode>),
    Group(Arc<GroupNode>),
}

impl SchemaNode {
    /// Get the leaf, if this is one
    pub fn as_leaf(&self) -> Option<&Arc<LeafNode>> {
        match self {
            SchemaNode::Leaf(leaf) => Some(leaf),
            SchemaNode::Group(_) => None,
        }
    }

    /// Get the group, if this is one
    pub fn as_group(&self) -> Option<&Arc<GroupNode>> {
        match self {
            SchemaNode::Group(group) => Some(group),
            SchemaNode::Leaf(_) => None,
        }
    }

    /// Check if this is a leaf
    pub fn is_leaf(&self) -> bool {
        matches!(self, SchemaNode::Leaf(_))
    }

    /// Display hints of the node
    pub fn hints(&self) -> &DisplayHints {
        match self {
            SchemaNode::Leaf(leaf) => &leaf.hints,
            SchemaNode::Group(group) => &group.hints,
        }
    }

    /// Label for the node, falling back to its name
    pub fn title<'a>(&'a self, name: &'a str) -> &'a str {
        self.hints().title.as_deref().unwrap_or(name)
    }
}

impl From<LeafNode> for SchemaNode {
    fn from(leaf: LeafNode) -> Self {
        SchemaNode::Leaf(Arc::new(leaf))
    }
}

impl From<GroupNode> for SchemaNode {
    fn from(group: GroupNode) -> Self {
        SchemaNode::Group(Arc::new(group))
    }
}

// ============================================================================
// GroupNode
// ============================================================================

/// A named collection of child nodes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupNode {
    children: Vec<(String, SchemaNode)>,

    /// Presentation hints (title, orders, primary key at the root)
    pub hints: DisplayHints,
}

impl GroupNode {
    /// Create an empty group
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a child, builder style
    pub fn with_child(mut self, name: impl Into<String>, node: impl Into<SchemaNode>) -> Self {
        self.add_child(name, node);
        self
    }

    /// Set the display hints
    pub fn with_hints(mut self, hints: DisplayHints) -> Self {
        self.hints = hints;
        self
    }

    /// Add a child, replacing any child of the same name in place
    pub fn add_child(&mut self, name: impl Into<String>, node: impl Into<SchemaNode>) {
        let name = name.into();
        let node = node.into();
        match self.children.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = node,
            None => self.children.push((name, node)),
        }
    }

    /// Look up a direct child
    pub fn child(&self, name: &str) -> Option<&SchemaNode> {
        self.children
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, node)| node)
    }

    /// Look up a descendant by dotted path
    pub fn find(&self, path: &str) -> Option<&SchemaNode> {
        match path.split_once('.') {
            None => self.child(path),
            Some((head, rest)) => self.child(head)?.as_group()?.find(rest),
        }
    }

    /// Children in document order
    pub fn children(&self) -> impl Iterator<Item = (&str, &SchemaNode)> {
        self.children.iter().map(|(n, node)| (n.as_str(), node))
    }

    /// Child names in document order
    pub fn keys(&self) -> Vec<&str> {
        self.children.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Number of direct children
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Check if the group has no children
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Child names to render for a mode
    ///
    /// The mode's own order wins, then the generic order, then document
    /// order. Names that are not children are skipped.
    pub fn resolve_order(&self, mode: OperationMode) -> Vec<&str> {
        match self.hints.order_for(mode) {
            Some(order) => self.existing(order),
            None => self.keys(),
        }
    }

    /// Column names for result tables
    pub fn results_order(&self) -> Vec<&str> {
        match self.hints.results_order() {
            Some(order) => self.existing(order),
            None => self.keys(),
        }
    }

    /// Dotted paths of every leaf below this group
    pub fn leaf_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        for (name, node) in self.children() {
            match node {
                SchemaNode::Leaf(_) => paths.push(name.to_string()),
                SchemaNode::Group(group) => paths.extend(
                    group
                        .leaf_paths()
                        .into_iter()
                        .map(|p| format!("{}.{}", name, p)),
                ),
            }
        }
        paths
    }

    fn existing<'a>(&'a self, order: &'a [String]) -> Vec<&'a str> {
        order
            .iter()
            .map(String::as_str)
            .filter(|name| self.child(name).is_some())
            .collect()
    }

    /// Check this group and everything below it, naming errors by path
    pub(crate) fn validate_at(&self, path: &str) -> ConsoleResult<()> {
        for (key, order) in self.hints.all_orders() {
            if let Some(missing) = order.iter().find(|name| self.child(name).is_none()) {
                return Err(ConsoleError::UnknownChild {
                    group: if path.is_empty() {
                        format!("<root> ({})", key)
                    } else {
                        format!("{} ({})", path, key)
                    },
                    child: missing.clone(),
                });
            }
        }

        for (name, node) in self.children() {
            let child_path = join_path(path, name);
            match node {
                SchemaNode::Leaf(leaf) => {
                    leaf.validate().map_err(|e| match e {
                        ConsoleError::InvalidSchema { message, .. } => {
                            ConsoleError::invalid_schema(&child_path, message)
                        }
                        other => other,
                    })?;
                    leaf.widget(&child_path)?;
                    if let Some(regex) = &leaf.hints.regex {
                        let compiled = Pattern::new(&child_path, regex)?;
                        if leaf.hint_pattern.as_ref() != Some(&compiled) {
                            return Err(ConsoleError::invalid_schema(
                                &child_path,
                                "regex hint is not compiled",
                            ));
                        }
                    }
                }
                SchemaNode::Group(group) => group.validate_at(&child_path)?,
            }
        }

        Ok(())
    }
}

impl Validatable for GroupNode {
    fn validate(&self) -> ConsoleResult<()> {
        self.validate_at("")
    }
}

/// Join a parent path and a child name with a dot
pub fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hints::Widget;
    use crate::leaf::Bound;
    use crm_core::SemanticType;
    use pretty_assertions::assert_eq;

    fn address() -> GroupNode {
        GroupNode::new()
            .with_child("line1", LeafNode::new(SemanticType::String))
            .with_child("city", LeafNode::new(SemanticType::String))
            .with_child("zip", LeafNode::new(SemanticType::String).optional())
    }

    fn customer() -> GroupNode {
        GroupNode::new()
            .with_child("first_name", LeafNode::new(SemanticType::String))
            .with_child("last_name", LeafNode::new(SemanticType::String))
            .with_child("address", address())
    }

    #[test]
    fn test_children_keep_document_order() {
        assert_eq!(customer().keys(), vec!["first_name", "last_name", "address"]);
    }

    #[test]
    fn test_add_child_replaces_in_place() {
        let mut group = customer();
        group.add_child("first_name", LeafNode::new(SemanticType::Uint));
        assert_eq!(group.len(), 3);
        assert_eq!(
            group.child("first_name").unwrap().as_leaf().unwrap().semantic_type,
            SemanticType::Uint
        );
    }

    #[test]
    fn test_find_by_dotted_path() {
        let group = customer();
        assert!(group.find("address.city").unwrap().is_leaf());
        assert!(group.find("address.country").is_none());
        assert!(group.find("first_name.x").is_none());
    }

    #[test]
    fn test_resolve_order_per_mode() {
        let hints = DisplayHints {
            update: Some(vec!["last_name".into(), "first_name".into()]),
            ..DisplayHints::default()
        };
        let group = customer().with_hints(hints);

        assert_eq!(
            group.resolve_order(OperationMode::Update),
            vec!["last_name", "first_name"]
        );
        assert_eq!(
            group.resolve_order(OperationMode::Create),
            vec!["first_name", "last_name", "address"]
        );
    }

    #[test]
    fn test_results_order() {
        let group = customer().with_hints(DisplayHints {
            results: Some(vec!["last_name".into()]),
            ..DisplayHints::default()
        });
        assert_eq!(group.results_order(), vec!["last_name"]);
        assert_eq!(customer().results_order().len(), 3);
    }

    #[test]
    fn test_leaf_paths() {
        assert_eq!(
            customer().leaf_paths(),
            vec!["first_name", "last_name", "address.line1", "address.city", "address.zip"]
        );
    }

    #[test]
    fn test_validate_rejects_unknown_order_name() {
        let group = customer().with_hints(DisplayHints::new().with_order(["first_name", "middle"]));
        let err = group.validate().unwrap_err();
        assert!(matches!(err, ConsoleError::UnknownChild { ref child, .. } if child == "middle"));
    }

    #[test]
    fn test_validate_reports_nested_paths() {
        let bad = LeafNode::new(SemanticType::Uint)
            .with_minimum(Bound::Number(5.0))
            .with_maximum(Bound::Number(1.0));
        let group = GroupNode::new().with_child("address", address().with_child("unit", bad));

        match group.validate().unwrap_err() {
            ConsoleError::InvalidSchema { path, .. } => assert_eq!(path, "address.unit"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_validate_rejects_bad_hint_regex() {
        let leaf = LeafNode::new(SemanticType::String).with_hints(DisplayHints {
            regex: Some("[".into()),
            ..DisplayHints::default()
        });
        let group = GroupNode::new().with_child("zip", leaf);
        assert!(group.validate().unwrap_err().is_configuration());
    }

    #[test]
    fn test_validate_requires_compiled_hint_regex() {
        let leaf = LeafNode::new(SemanticType::String).with_hints(DisplayHints {
            regex: Some(r"^\d{5}$".into()),
            ..DisplayHints::default()
        });
        let raw = GroupNode::new().with_child("zip", leaf.clone());
        assert!(matches!(
            raw.validate().unwrap_err(),
            ConsoleError::InvalidSchema { ref path, .. } if path == "zip"
        ));

        let compiled = GroupNode::new().with_child("zip", leaf.compile_hints("zip").unwrap());
        assert!(compiled.validate().is_ok());
    }

    #[test]
    fn test_node_title_falls_back_to_name() {
        let node: SchemaNode = LeafNode::new(SemanticType::String)
            .with_hints(DisplayHints::new().with_title("First Name"))
            .into();
        assert_eq!(node.title("first_name"), "First Name");

        let plain: SchemaNode = LeafNode::new(SemanticType::Bool)
            .with_hints(DisplayHints::new().with_widget(Widget::Bool))
            .into();
        assert_eq!(plain.title("active"), "active");
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("", "name"), "name");
        assert_eq!(join_path("address", "zip"), "address.zip");
    }
}
