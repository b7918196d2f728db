//! # CRM Core
//!
//! Core types, traits, and error handling for the CRM console.
//!
//! This crate provides the foundational building blocks used throughout
//! the workspace, including:
//!
//! - **Types**: records, operation modes, semantic type tags, select options
//! - **Traits**: `Validatable` and `Named`
//! - **Errors**: unified error handling with `ConsoleError` and `ConsoleResult`
//!

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use error::{ConsoleError, ConsoleResult};
pub use traits::{Named, Validatable};
pub use types::{
    DEFAULT_PRIMARY_KEY, OperationMode, Record, SelectOption, SemanticType, TypeFamily,
    value_text,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
