//! The PagePilot automation engine.
//!
//! Everything that touches a page lives here: the [`Action`] vocabulary,
//! the [`PageDriver`] seam to real browser backends, the macro recorder
//! and player, the workflow parser/executor, and the [`Engine`]
//! dispatcher that turns classified operator intents into page effects.
//!
//! The crate deliberately does not know how intents are classified
//! (`pagepilot-intent`) or how records are persisted (`pagepilot-store`)
//! beyond their public surfaces.

pub mod action;
pub mod dispatch;
pub mod error;
pub mod history;
pub mod page;
pub mod player;
pub mod profile;
pub mod recorder;
mod runner;
pub mod workflow;

pub use action::{Action, FillValue, ScrollDirection};
pub use dispatch::{Engine, Reply};
pub use error::{EngineError, Result};
pub use history::{ActionHistory, HistoryEntry};
pub use page::{MockPage, PageDriver};
pub use player::{PlaybackReport, StepOutcome, play_macro};
pub use profile::Profile;
pub use recorder::{Macro, Recorder, RecorderState};
pub use workflow::{
    StepResult, Workflow, WorkflowExecutor, WorkflowParser, WorkflowRunResult, WorkflowStep,
};
