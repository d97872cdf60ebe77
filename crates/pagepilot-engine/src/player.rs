//! Macro playback.
//!
//! Playback is best-effort: a failing step is reported and the run
//! moves on, because recorded macros routinely replay against pages
//! that have drifted since recording.  Contrast with workflows, which
//! abort on failure unless told otherwise.

use serde::Serialize;
use tracing::{info, warn};

use crate::page::PageDriver;
use crate::profile::Profile;
use crate::recorder::Macro;
use crate::runner::run_action;

/// Outcome of one replayed step.
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub index: usize,
    pub action: String,
    pub ok: bool,
    pub detail: String,
}

/// Outcome of a full macro replay.
#[derive(Debug, Clone, Serialize)]
pub struct PlaybackReport {
    pub macro_name: String,
    pub outcomes: Vec<StepOutcome>,
}

impl PlaybackReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.ok).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn summary(&self) -> String {
        format!(
            "played \"{}\": {}/{} steps ok",
            self.macro_name,
            self.succeeded(),
            self.outcomes.len()
        )
    }
}

/// Replay every action in the macro against the page.
///
/// Profile references are resolved step by step at replay time, and
/// each step is followed by its settle delay so the page can catch up
/// before the next one.
pub async fn play_macro(mac: &Macro, page: &dyn PageDriver, profile: &Profile) -> PlaybackReport {
    info!(name = %mac.name, steps = mac.actions.len(), "playing macro");

    let mut outcomes = Vec::with_capacity(mac.actions.len());
    for (index, action) in mac.actions.iter().enumerate() {
        let outcome = match run_action(action, page, profile).await {
            Ok(detail) => StepOutcome {
                index,
                action: action.describe(),
                ok: true,
                detail,
            },
            Err(err) => {
                warn!(name = %mac.name, step = index, error = %err, "macro step failed");
                StepOutcome {
                    index,
                    action: action.describe(),
                    ok: false,
                    detail: err.to_string(),
                }
            }
        };
        outcomes.push(outcome);

        tokio::time::sleep(action.settle_delay()).await;
    }

    PlaybackReport {
        macro_name: mac.name.clone(),
        outcomes,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
