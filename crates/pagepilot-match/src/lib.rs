//! Approximate string matching and field resolution for PagePilot.
//!
//! This crate provides:
//!
//! - **Similarity utility**: edit distance, normalized similarity, and
//!   fuzzy candidate ranking via [`similarity`].
//! - **Field matcher**: the cascading strategy set that resolves a text
//!   hint to a page-element descriptor via [`matcher::match_field`].
//!
//! Everything here is pure and synchronous; page scanning and action
//! execution live in `pagepilot-engine`.

pub mod matcher;
pub mod similarity;

pub use matcher::{
    FieldDescriptor, FieldSuggestion, MatchResult, MatchStrategy, match_field,
    suggest_similar_fields,
};
pub use similarity::{FuzzyCandidate, edit_distance, fuzzy_match, similarity};
