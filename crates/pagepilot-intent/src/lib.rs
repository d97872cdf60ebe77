//! Intent classification for PagePilot.
//!
//! Maps one line of operator text (typed or transcribed) to a structured
//! [`Intent`] via an ordered pattern registry, falling back to entity
//! heuristics and fuzzy verb suggestion.  Stateless apart from the
//! registry itself; the recorder flag is passed in per call.

pub mod classifier;
pub mod intent;

pub use classifier::Classifier;
pub use intent::{Intent, ScrollDirection};
