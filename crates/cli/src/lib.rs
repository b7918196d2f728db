//! # CRM CLI
//!
//! Command-line front end for the CRM console form engine.
//!
//! Drives the form engine offline against schema and record files, so
//! schemas can be checked without the admin console.
//!
//! ## Commands
//!
//! - `layout` - Print the form a schema renders to
//! - `validate` - Validate a record against a schema
//! - `table` - Print records as a sorted results table
//!

pub mod commands;
pub mod config;
pub mod output;

pub use commands::{Cli, Command, Report, execute, run};
pub use config::{ConsoleConfig, DEFAULT_CONFIG_FILE};

// Re-export dependencies for use in main.rs
pub use crm_core;
pub use crm_form;
pub use crm_schema;

/// CLI version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// CLI name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert_eq!(NAME, "crm_cli");
    }
}
