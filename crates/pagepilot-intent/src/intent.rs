//! The intent vocabulary.

use serde::{Deserialize, Serialize};

/// Direction for scroll intents and actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollDirection {
    Up,
    Down,
    Top,
    Bottom,
}

impl ScrollDirection {
    /// Parse a direction word; `None` for anything unrecognized.
    pub fn parse(word: &str) -> Option<Self> {
        match word.trim().to_lowercase().as_str() {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "top" => Some(Self::Top),
            "bottom" => Some(Self::Bottom),
            _ => None,
        }
    }
}

/// Structured representation of operator intent, derived from one line of
/// text.  Produced by [`crate::Classifier::classify`]; consumed by the
/// engine's dispatcher with exhaustive matching, so adding a variant is a
/// compile-time-checked change everywhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Intent {
    /// Fill the field whose label matches `label` with `value`.
    FillByLabel { label: String, value: String },
    /// Fill the nth field on the page (1-based) with `value`.
    FillByIndex { index: usize, value: String },
    /// Fill the field inferred from a profile key with the profile value.
    FillProfileField { key: String },
    /// Click the control whose text matches `target`.
    Click { target: String },
    /// Scroll the page.
    Scroll { dir: ScrollDirection },
    /// Navigate to a URL or well-known site name.
    Navigate { url_or_site: String },
    /// Run a web search.
    Search { query: String },
    /// List the fillable fields on the current page.
    ListFields,
    /// Show the operator profile.
    ShowProfile,
    /// Clear all fields on the current page.
    Clear,
    /// Fill every field that matches a profile key.
    SmartFill,
    /// Begin capturing operator actions.
    StartRecording,
    /// Stop capturing and save under `name` (generated when `None`).
    StopRecording { name: Option<String> },
    /// Replay a saved macro by name or trigger.
    PlayMacro { name: String },
    /// List saved macros.
    ListMacros,
    /// Snapshot the current form values as a template.
    SaveTemplate { name: Option<String> },
    /// Re-apply a saved template to the current page.
    ApplyTemplate { name: String },
    /// List saved templates.
    ListTemplates,
    /// Parse and execute a comma-separated workflow step list.
    RunWorkflow { text: String },
    /// Persist the most recently run workflow under `name`.
    SaveWorkflow { name: String },
    /// List saved workflows.
    ListWorkflows,
    /// Show the command vocabulary.
    Help,
    /// Nothing matched; `suggestions` holds up to 3 ranked verb guesses.
    Unrecognized {
        input: String,
        suggestions: Vec<String>,
    },
}
