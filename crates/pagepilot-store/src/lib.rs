//! Persistence for PagePilot.
//!
//! Macros, form templates, and workflows are stored as opaque JSON
//! payloads in SQLite, keyed by `(user, name)`.  The engine crates treat
//! this as a key-value service: they serialize their own record types and
//! never share Rust types with the store.
//!
//! All operations are async; SQLite work runs on the blocking thread pool
//! via [`Database::execute`].

pub mod db;
pub mod error;
pub mod macro_store;
pub mod template_store;
pub mod workflow_store;

pub use db::Database;
pub use error::{StoreError, StoreResult};
pub use macro_store::{MacroStore, StoredMacro};
pub use template_store::TemplateStore;
pub use workflow_store::WorkflowStore;
