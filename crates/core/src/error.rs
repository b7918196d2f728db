//! Error types for the CRM console
//!
//! This module provides unified error handling across the workspace:
//! schema configuration errors, field routing errors, remote service
//! failures, IO, serialization and configuration-file errors.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the CRM console
#[derive(Debug, Error)]
pub enum ConsoleError {
    // ========================================================================
    // Schema / Configuration Errors
    // ========================================================================
    /// A leaf node names a type the engine does not know
    #[error("Unknown schema type '{type_name}' for field '{field}'")]
    UnknownType { field: String, type_name: String },

    /// A display hint asks for a widget the engine does not know
    #[error("Unknown widget '{widget}' for field '{field}'")]
    UnknownWidget { field: String, widget: String },

    /// A display-hint order names a child the group does not have
    #[error("Group '{group}' has no child named '{child}'")]
    UnknownChild { group: String, child: String },

    /// The schema document is structurally invalid
    #[error("Invalid schema at '{path}': {message}")]
    InvalidSchema { path: String, message: String },

    /// A regular expression in the schema or display hints does not compile
    #[error("Invalid pattern for field '{field}': {message}")]
    InvalidPattern { field: String, message: String },

    /// No field exists at the given dotted path
    #[error("Field not found: {0}")]
    FieldNotFound(String),

    // ========================================================================
    // Remote Service Errors
    // ========================================================================
    /// The request never produced a response
    #[error("Transport error: {0}")]
    Transport(String),

    /// The service answered with something that is not a response envelope
    #[error("Malformed response from '{service}': {message}")]
    MalformedResponse { service: String, message: String },

    /// No loaded record has the given identifying value
    #[error("Record not found: {0}")]
    RecordNotFound(String),

    // ========================================================================
    // IO Errors
    // ========================================================================
    /// File IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File read error
    #[error("Failed to read file '{path}': {message}")]
    FileRead { path: PathBuf, message: String },

    // ========================================================================
    // Serialization Errors
    // ========================================================================
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // ========================================================================
    // Configuration File Errors
    // ========================================================================
    /// The configuration file could not be parsed
    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// A configuration value is out of range or inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// Generic error with context
    #[error("{context}: {message}")]
    WithContext { context: String, message: String },
}

impl ConsoleError {
    /// Create an invalid schema error
    pub fn invalid_schema(path: impl Into<String>, msg: impl Into<String>) -> Self {
        ConsoleError::InvalidSchema {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create an unknown type error
    pub fn unknown_type(field: impl Into<String>, type_name: impl Into<String>) -> Self {
        ConsoleError::UnknownType {
            field: field.into(),
            type_name: type_name.into(),
        }
    }

    /// Create an unknown widget error
    pub fn unknown_widget(field: impl Into<String>, widget: impl Into<String>) -> Self {
        ConsoleError::UnknownWidget {
            field: field.into(),
            widget: widget.into(),
        }
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        ConsoleError::Transport(msg.into())
    }

    /// Create an error with context
    pub fn with_context(context: impl Into<String>, msg: impl Into<String>) -> Self {
        ConsoleError::WithContext {
            context: context.into(),
            message: msg.into(),
        }
    }

    /// Check if this error is a program/schema defect rather than bad input
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ConsoleError::UnknownType { .. }
                | ConsoleError::UnknownWidget { .. }
                | ConsoleError::UnknownChild { .. }
                | ConsoleError::InvalidSchema { .. }
                | ConsoleError::InvalidPattern { .. }
                | ConsoleError::Config(_)
                | ConsoleError::InvalidConfig(_)
        )
    }

    /// Check if this error came from the remote service layer
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ConsoleError::Transport(_) | ConsoleError::MalformedResponse { .. }
        )
    }

    /// Check if this error is an IO error
    pub fn is_io(&self) -> bool {
        matches!(self, ConsoleError::Io(_) | ConsoleError::FileRead { .. })
    }
}

/// Result type alias using ConsoleError
pub type ConsoleResult<T> = Result<T, ConsoleError>;

// ============================================================================
// Tests
// ============================================================================
