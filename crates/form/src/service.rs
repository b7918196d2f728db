//! Remote service seam
//!
//! Forms talk to the CRM back end through [`RemoteService`]: four verbs, each
//! taking a service name, a noun and a JSON payload, each answering with a
//! [`Response`] envelope. An `Err` from the trait is a transport failure; an
//! error inside the envelope is data the caller interprets.

use crate::notify::{Notification, NotificationBus};
use crm_core::{ConsoleError, ConsoleResult, value_text};
use crm_schema::ErrorTree;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;

/// Well-known service error codes
pub mod codes {
    /// The session is gone
    pub const NO_SESSION: i64 = 102;
    /// A downstream service call failed
    pub const SERVICE_FAILED: i64 = 207;
    /// The user lacks the right for the action
    pub const INSUFFICIENT_RIGHTS: i64 = 1000;
    /// Field-level validation failed; `msg` lists `[path, message]` pairs
    pub const INVALID_FIELDS: i64 = 1001;
}

/// Code to friendly message table
pub type ErrorMessages = BTreeMap<i64, String>;

// ============================================================================
// Verb
// ============================================================================

/// Operation requested from a service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    Create,
    Read,
    Update,
    Delete,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Create => "create",
            Verb::Read => "read",
            Verb::Update => "update",
            Verb::Delete => "delete",
        }
    }
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Response
// ============================================================================

/// Error part of a response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceError {
    pub code: i64,
    #[serde(default)]
    pub msg: Value,
}

impl ServiceError {
    pub fn new(code: i64, msg: impl Into<Value>) -> Self {
        Self {
            code,
            msg: msg.into(),
        }
    }
}

/// Response envelope of every service call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ServiceError>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<Value>,
}

impl Response {
    /// Successful response carrying `data`
    pub fn ok(data: impl Into<Value>) -> Self {
        Self {
            data: Some(data.into()),
            ..Self::default()
        }
    }

    /// Failed response
    pub fn error(code: i64, msg: impl Into<Value>) -> Self {
        Self {
            error: Some(ServiceError::new(code, msg)),
            ..Self::default()
        }
    }

    /// Attach a warning
    pub fn with_warning(mut self, warning: impl Into<Value>) -> Self {
        self.warning = Some(warning.into());
        self
    }

    /// Parse an envelope received from `service`
    pub fn from_json(service: &str, value: Value) -> ConsoleResult<Self> {
        serde_json::from_value(value).map_err(|e| ConsoleError::MalformedResponse {
            service: service.to_string(),
            message: e.to_string(),
        })
    }

    /// Data that counts as a result: present and not null, false, 0 or ""
    pub fn result(&self) -> Option<&Value> {
        self.data.as_ref().filter(|data| is_truthy(data))
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

// ============================================================================
// RemoteService Trait
// ============================================================================

/// A back end the forms read from and write to
pub trait RemoteService {
    /// Send one request
    fn request(
        &self,
        verb: Verb,
        service: &str,
        noun: &str,
        data: &Value,
    ) -> impl Future<Output = ConsoleResult<Response>> + Send;

    fn create(
        &self,
        service: &str,
        noun: &str,
        data: &Value,
    ) -> impl Future<Output = ConsoleResult<Response>> + Send {
        self.request(Verb::Create, service, noun, data)
    }

    fn read(
        &self,
        service: &str,
        noun: &str,
        data: &Value,
    ) -> impl Future<Output = ConsoleResult<Response>> + Send {
        self.request(Verb::Read, service, noun, data)
    }

    fn update(
        &self,
        service: &str,
        noun: &str,
        data: &Value,
    ) -> impl Future<Output = ConsoleResult<Response>> + Send {
        self.request(Verb::Update, service, noun, data)
    }

    fn delete(
        &self,
        service: &str,
        noun: &str,
        data: &Value,
    ) -> impl Future<Output = ConsoleResult<Response>> + Send {
        self.request(Verb::Delete, service, noun, data)
    }
}

/// Service and noun a form sends its record to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub service: String,
    pub noun: String,
}

impl Target {
    pub fn new(service: impl Into<String>, noun: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            noun: noun.into(),
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.service, self.noun)
    }
}

// ============================================================================
// Error Interpretation
// ============================================================================

/// What is left for the caller after a service error was reported
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorAction {
    /// A notification was published, nothing else to do
    Handled,
    /// Field errors the caller should route into its renderers
    FieldErrors(ErrorTree),
}

/// Publish the notification a service error calls for
///
/// Session, service-failure and rights codes are handled the same way by
/// every form; `messages` maps the remaining codes to friendly text and
/// anything else is reported as the raw error JSON.
pub fn report_error(
    error: &ServiceError,
    messages: &ErrorMessages,
    bus: &NotificationBus,
) -> ErrorAction {
    match error.code {
        codes::NO_SESSION => {
            bus.publish(Notification::SignedOut);
            return ErrorAction::Handled;
        }
        codes::SERVICE_FAILED => {
            bus.error(format!(
                "Request to {} failed. Please contact support",
                value_text(&error.msg)
            ));
            return ErrorAction::Handled;
        }
        codes::INSUFFICIENT_RIGHTS => {
            bus.error("You lack the necessary rights to do the requested action");
            return ErrorAction::Handled;
        }
        codes::INVALID_FIELDS => {
            if let Some(tree) = ErrorTree::from_response(&error.msg) {
                return ErrorAction::FieldErrors(tree);
            }
        }
        _ => {}
    }

    match messages.get(&error.code) {
        Some(message) => bus.error(message.clone()),
        None => bus.error(serde_json::to_string(error).unwrap_or_else(|_| error.code.to_string())),
    }
    ErrorAction::Handled
}

/// Publish a response warning, if any
pub fn report_warning(response: &Response, bus: &NotificationBus) {
    if let Some(warning) = &response.warning {
        bus.warning(warning.to_string());
    }
}

// ============================================================================
// Test Support
// ============================================================================


// ============================================================================
// Tests
// ============================================================================
