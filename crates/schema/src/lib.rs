//! # CRM Schema
//!
//! The schema model a CRM console builds its forms from.
//!
//! ## Core Concepts
//!
//! - **LeafNode**: a scalar value with a semantic type, bounds, options and pattern
//! - **GroupNode**: named children in document order, plus display hints
//! - **SchemaTree**: a named root group with a primary key
//! - **DisplayHints**: titles, widget overrides and child orders from `__ui__`
//! - **ErrorTree**: field errors nested by dotted path
//!

pub mod error_tree;
pub mod hints;
pub mod leaf;
pub mod node;
pub mod serialization;
pub mod tree;
pub mod validation;

pub use error_tree::{ErrorEntry, ErrorTree};
pub use hints::{DisplayHints, Widget};
pub use leaf::{Bound, DATE_FORMAT, DATETIME_FORMAT, LeafNode, Pattern, TIME_FORMAT};
pub use node::{GroupNode, SchemaNode, join_path};
pub use serialization::{load_tree, node_from_value, tree_from_str, tree_from_value};
pub use tree::SchemaTree;
pub use validation::{
    MatchingFieldsRule, RecordRule, RecordValidator, StructureRule, Strictness, ValidationError,
    ValidationErrorCode, ValidationResult, lookup,
};

// Re-export core types that are commonly used with schemas
pub use crm_core::{
    ConsoleError, ConsoleResult, OperationMode, Record, SelectOption, SemanticType,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
