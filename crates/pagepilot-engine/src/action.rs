//! The Action vocabulary, the common currency between the macro and
//! workflow engines.
//!
//! The wire format is one JSON object per step, tagged by `type`:
//!
//! ```json
//! {"type": "fill", "field": "email", "value": "a@b.com"}
//! {"type": "fill", "field": "email", "value": {"profile_key": "email"}}
//! {"type": "wait", "ms": 2000}
//! {"type": "click", "target": "submit"}
//! ```
//!
//! Profile-linked fills are structural (`FillValue::ProfileRef`), not a
//! string-prefix convention, so they survive serialization and are
//! resolved against the operator profile at playback time.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use pagepilot_intent::ScrollDirection;

/// The value a fill action writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FillValue {
    /// A reference into the operator profile, resolved at playback time.
    ProfileRef {
        /// The profile key (e.g. `email`, `phone`).
        profile_key: String,
    },
    /// A literal string captured or typed by the operator.
    Literal(String),
}

impl FillValue {
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    pub fn profile(key: impl Into<String>) -> Self {
        Self::ProfileRef {
            profile_key: key.into(),
        }
    }
}

/// One atomic automation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Pause for the given number of milliseconds.
    Wait { ms: u64 },
    /// Fill the field matching `field` with `value`.
    Fill { field: String, value: FillValue },
    /// Click the control matching `target`.
    Click { target: String },
    /// Scroll the page.
    Scroll { dir: ScrollDirection },
    /// Navigate to a URL.
    Navigate { url: String },
    /// Run a web search for `query`.
    Search { query: String },
    /// Fill every field that matches a profile key.
    Autofill,
    /// Reload the current page.
    Refresh,
    /// Browser history back.
    Back,
    /// Browser history forward.
    Forward,
    /// Find text on the page.
    Find { text: String },
}

impl Action {
    /// Minimum post-execution delay before the next step, letting page
    /// state settle after the action.
    pub fn settle_delay(&self) -> Duration {
        let ms = match self {
            Self::Navigate { .. } | Self::Search { .. } => 2000,
            Self::Refresh => 1500,
            Self::Autofill => 1000,
            Self::Scroll { .. } | Self::Click { .. } => 600,
            Self::Fill { .. } => 500,
            Self::Wait { .. } | Self::Back | Self::Forward | Self::Find { .. } => 800,
        };
        Duration::from_millis(ms)
    }

    /// Short human-readable description for logs and step results.
    pub fn describe(&self) -> String {
        match self {
            Self::Wait { ms } => format!("wait {ms}ms"),
            Self::Fill { field, value } => match value {
                FillValue::Literal(v) => format!("fill \"{field}\" with \"{v}\""),
                FillValue::ProfileRef { profile_key } => {
                    format!("fill \"{field}\" from profile \"{profile_key}\"")
                }
            },
            Self::Click { target } => format!("click \"{target}\""),
            Self::Scroll { dir } => format!("scroll {dir:?}").to_lowercase(),
            Self::Navigate { url } => format!("navigate to {url}"),
            Self::Search { query } => format!("search for \"{query}\""),
            Self::Autofill => "autofill from profile".into(),
            Self::Refresh => "refresh".into(),
            Self::Back => "back".into(),
            Self::Forward => "forward".into(),
            Self::Find { text } => format!("find \"{text}\""),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
