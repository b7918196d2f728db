//! # CRM Form
//!
//! Schema-driven forms for the CRM console.
//!
//! This crate turns a [`crm_schema::SchemaTree`] into editable state and
//! plain view models:
//!
//! - **FieldRenderer**: one leaf, with input normalization and local validation
//! - **GroupRenderer**: ordered children and per-mode record aggregation
//! - **RecordForm**: create/update submission against a [`RemoteService`]
//! - **ResultTable**: sortable record list with in-place editing
//! - **SearchPanel**: query builder over a `read` call
//! - **NotificationBus**: broadcast of user-facing events
//!

pub mod control;
pub mod controller;
pub mod field;
pub mod group;
pub mod notify;
pub mod results;
pub mod search;
pub mod service;
pub mod view;

pub use control::{FormControl, OptionResolver, RenderContext, UnroutedError};
pub use controller::{FormState, INVALID_DATA_MESSAGE, RecordForm, SubmitOutcome};
pub use field::{FieldInput, FieldRenderer};
pub use group::{ChildRenderer, GroupRenderer};
pub use notify::{Notification, NotificationBus};
pub use results::{Column, ResultTable, compare_values};
pub use search::SearchPanel;
pub use service::{ErrorMessages, RemoteService, Response, ServiceError, Target, Verb};
pub use view::{Cell, Control, FormView, Header, Item, RowView, Section, SortDirection, TableView};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
