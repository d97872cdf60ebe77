//! Macro recorder: a two-state machine observing operator actions.
//!
//! One `Recorder` exists per engine and owns all recording state, so
//! concurrent recordings are impossible by construction.  While active,
//! fills are deduplicated per field label (last write wins, so a typo
//! correction does not produce conflicting steps); clicks are appended
//! unconditionally.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::action::{Action, FillValue};
use crate::error::{EngineError, Result};

/// The recorder's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
}

/// A named, persisted action sequence captured from real operator
/// behavior.  `trigger` is the normalized name used for spoken/typed
/// lookup; `site` records where the macro was captured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Macro {
    pub name: String,
    pub trigger: String,
    pub actions: Vec<Action>,
    pub site: String,
}

/// The recorder itself.  All mutation goes through `start`/`record`/`stop`.
#[derive(Debug)]
pub struct Recorder {
    state: RecorderState,
    buffer: Vec<Action>,
    /// Counter behind generated names for unnamed recordings.
    auto_names: u32,
}

impl Recorder {
    pub fn new() -> Self {
        Self {
            state: RecorderState::Idle,
            buffer: Vec::new(),
            auto_names: 0,
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecorderState::Recording
    }

    /// Number of actions currently buffered.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Begin recording.  Restarting while already recording discards the
    /// current buffer and starts fresh.
    pub fn start(&mut self) {
        if self.is_recording() {
            debug!(discarded = self.buffer.len(), "recording restarted");
        }
        self.buffer.clear();
        self.state = RecorderState::Recording;
        info!("recording started");
    }

    /// Capture an action.  Ignored while idle.
    ///
    /// A `Fill` on a label that is already buffered overwrites the
    /// buffered value in place; every other action is appended.
    pub fn record(&mut self, action: Action) {
        if !self.is_recording() {
            return;
        }

        if let Action::Fill { field, value } = &action {
            let existing = self.buffer.iter_mut().find(|a| {
                matches!(a, Action::Fill { field: f, .. } if f.eq_ignore_ascii_case(field))
            });
            if let Some(Action::Fill { value: slot, .. }) = existing {
                debug!(field = %field, "buffered fill overwritten");
                *slot = value.clone();
                return;
            }
        }

        debug!(action = %action.describe(), "action captured");
        self.buffer.push(action);
    }

    /// Stop recording and build a macro from the buffer.
    ///
    /// Always returns to `Idle`.  Fails with [`EngineError::EmptyRecording`]
    /// when nothing was captured; the buffer is cleared either way.
    pub fn stop(&mut self, name: Option<String>, site: String) -> Result<Macro> {
        self.state = RecorderState::Idle;

        if self.buffer.is_empty() {
            return Err(EngineError::EmptyRecording);
        }

        let name = name.unwrap_or_else(|| {
            self.auto_names += 1;
            format!("macro-{}", self.auto_names)
        });
        let trigger = name.trim().to_lowercase();
        let actions = std::mem::take(&mut self.buffer);

        info!(name = %name, actions = actions.len(), "recording saved");
        Ok(Macro {
            name,
            trigger,
            actions,
            site,
        })
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
