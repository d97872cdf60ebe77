//! Cascading field matcher.
//!
//! Resolves a free-text hint (e.g. "email", "first name") to a page
//! element descriptor using a fixed cascade of strategies, tried in
//! order of decreasing specificity:
//!
//! | Level | Strategy | Confidence |
//! |-------|------------------|------------|
//! | 1 | Exact label match | 1.0 |
//! | 2 | Type keyword | 0.85 |
//! | 3 | Substring | 0.7 |
//! | 4 | Fuzzy (distance ≤ 2) | similarity score |
//! | 5 | Word overlap | token ratio (> 0.3) |
//!
//! The first strategy that produces a hit wins.  Callers are expected to
//! re-scan the live page before every call; descriptors must never be
//! cached across navigations.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::similarity::{fuzzy_match, similarity};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A page element as observed by the live-page scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Visible label text (associated `<label>`, placeholder, or aria-label).
    pub label: String,
    /// The element's `name` attribute, if any.
    pub name: String,
    /// The element's type attribute (e.g. `email`, `tel`, `password`, `text`).
    pub field_type: String,
    /// Whether the element is currently visible.
    pub visible: bool,
    /// Opaque reference used by the page driver to address the element.
    pub element_ref: String,
    /// Current value of the element, when the scan captures it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Which cascade level produced a match.
///
/// Confidence is monotone with specificity: `Exact` (1.0) > `TypeKeyword`
/// (0.85) > `Substring` (0.7) > `Fuzzy`/`WordOverlap` (both clamped below
/// 0.85, each derived on its own scale: edit distance vs token ratio).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Case-insensitive label equality.
    Exact,
    /// The field's type maps to a keyword set containing the hint.
    TypeKeyword,
    /// Label contains hint or hint contains label.
    Substring,
    /// Edit distance to the label within 2.
    Fuzzy,
    /// Whitespace-token overlap ratio above 0.3.
    WordOverlap,
}

/// The outcome of a successful cascade run.  Ephemeral: valid only until
/// the next navigation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    /// The matched descriptor (cloned out of the scanned set).
    pub descriptor: FieldDescriptor,
    /// The strategy that produced the match.
    pub strategy: MatchStrategy,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
}

/// A near-miss offered to the operator when no strategy succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSuggestion {
    /// The suggested descriptor.
    pub descriptor: FieldDescriptor,
    /// Human-readable explanation of why it was suggested.
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Keyword tables
// ---------------------------------------------------------------------------

/// Field type → hint keywords for the TypeKeyword strategy.
const TYPE_KEYWORDS: &[(&str, &[&str])] = &[
    ("email", &["email", "e-mail"]),
    ("tel", &["phone", "telephone", "mobile", "cell"]),
    ("password", &["password", "pwd", "pass"]),
    ("text", &["name", "username", "user"]),
];

/// Hint keyword → field type for suggestion-time type inference.
const INFERRED_TYPES: &[(&str, &[&str])] = &[
    ("email", &["email", "e-mail", "mail"]),
    ("tel", &["phone", "telephone", "mobile", "cell"]),
    ("password", &["password", "pwd", "pass"]),
    ("search", &["search", "query"]),
    ("date", &["date", "birthday", "dob"]),
    ("number", &["number", "amount", "quantity", "age"]),
];

/// Maximum edit distance for the cascade's Fuzzy level.
const FUZZY_MAX_DISTANCE: usize = 2;

/// Maximum edit distance for the softer suggestion pass.
const SUGGEST_MAX_DISTANCE: usize = 5;

/// Minimum token-overlap ratio the WordOverlap level accepts.
const WORD_OVERLAP_THRESHOLD: f64 = 0.3;

/// Ceiling on Fuzzy and WordOverlap confidence.  Both are approximate
/// guesses and must rank strictly below the TypeKeyword tier (0.85),
/// even when their raw score would be higher (a perfect token-reorder
/// overlap scores 1.0 on its own scale).
const APPROX_CONFIDENCE_CAP: f64 = 0.84;

// ---------------------------------------------------------------------------
// Cascade
// ---------------------------------------------------------------------------

/// Resolve `hint` against `fields`, trying each strategy in fixed order.
///
/// Returns `None` when all five strategies are exhausted.
pub fn match_field(hint: &str, fields: &[FieldDescriptor]) -> Option<MatchResult> {
    let hint = hint.trim().to_lowercase();
    if hint.is_empty() || fields.is_empty() {
        return None;
    }

    let result = exact_match(&hint, fields)
        .or_else(|| type_keyword_match(&hint, fields))
        .or_else(|| substring_match(&hint, fields))
        .or_else(|| fuzzy_label_match(&hint, fields))
        .or_else(|| word_overlap_match(&hint, fields));

    match &result {
        Some(m) => debug!(
            hint = %hint,
            label = %m.descriptor.label,
            strategy = ?m.strategy,
            confidence = m.confidence,
            "field matched"
        ),
        None => debug!(hint = %hint, fields = fields.len(), "no field matched"),
    }

    result
}

/// Level 1: case-insensitive label equality.
fn exact_match(hint: &str, fields: &[FieldDescriptor]) -> Option<MatchResult> {
    fields
        .iter()
        .find(|f| f.label.to_lowercase() == hint)
        .map(|f| MatchResult {
            descriptor: f.clone(),
            strategy: MatchStrategy::Exact,
            confidence: 1.0,
        })
}

/// Level 2: the field's type has a keyword set and the hint contains one
/// of its keywords.
fn type_keyword_match(hint: &str, fields: &[FieldDescriptor]) -> Option<MatchResult> {
    fields
        .iter()
        .find(|f| {
            TYPE_KEYWORDS
                .iter()
                .find(|(ty, _)| *ty == f.field_type.to_lowercase())
                .is_some_and(|(_, keywords)| keywords.iter().any(|kw| hint.contains(kw)))
        })
        .map(|f| MatchResult {
            descriptor: f.clone(),
            strategy: MatchStrategy::TypeKeyword,
            confidence: 0.85,
        })
}

/// Level 3: label contains hint, or hint contains label.
fn substring_match(hint: &str, fields: &[FieldDescriptor]) -> Option<MatchResult> {
    fields
        .iter()
        .find(|f| {
            let label = f.label.to_lowercase();
            !label.is_empty() && (label.contains(hint) || hint.contains(&label))
        })
        .map(|f| MatchResult {
            descriptor: f.clone(),
            strategy: MatchStrategy::Substring,
            confidence: 0.7,
        })
}

/// Level 4: closest label within edit distance 2; confidence is the
/// normalized similarity between hint and label.
fn fuzzy_label_match(hint: &str, fields: &[FieldDescriptor]) -> Option<MatchResult> {
    let labels: Vec<&str> = fields.iter().map(|f| f.label.as_str()).collect();
    let ranked = fuzzy_match(hint, &labels, FUZZY_MAX_DISTANCE);
    let best = ranked.first()?;
    let field = &fields[best.index];

    Some(MatchResult {
        descriptor: field.clone(),
        strategy: MatchStrategy::Fuzzy,
        confidence: similarity(hint, &field.label.to_lowercase()).min(APPROX_CONFIDENCE_CAP),
    })
}

/// Level 5: whitespace-token overlap.  A hint token matches a label token
/// if either contains the other.  Accepted only above the 0.3 threshold.
fn word_overlap_match(hint: &str, fields: &[FieldDescriptor]) -> Option<MatchResult> {
    let hint_tokens: Vec<&str> = hint.split_whitespace().collect();
    if hint_tokens.is_empty() {
        return None;
    }

    let mut best: Option<(usize, f64)> = None;

    for (i, field) in fields.iter().enumerate() {
        let label = field.label.to_lowercase();
        let label_tokens: Vec<&str> = label.split_whitespace().collect();
        if label_tokens.is_empty() {
            continue;
        }

        let overlap = hint_tokens
            .iter()
            .filter(|ht| label_tokens.iter().any(|lt| ht.contains(lt) || lt.contains(*ht)))
            .count();
        let ratio = overlap as f64 / hint_tokens.len().max(label_tokens.len()) as f64;

        if ratio > WORD_OVERLAP_THRESHOLD
            && best.is_none_or(|(_, best_ratio)| ratio > best_ratio)
        {
            best = Some((i, ratio));
        }
    }

    best.map(|(i, ratio)| MatchResult {
        descriptor: fields[i].clone(),
        strategy: MatchStrategy::WordOverlap,
        confidence: ratio.min(APPROX_CONFIDENCE_CAP),
    })
}

// ---------------------------------------------------------------------------
// Suggestions
// ---------------------------------------------------------------------------

/// Softer companion to [`match_field`] for operator feedback.
///
/// Collects labels within edit distance 5, plus any field whose type
/// equals the type inferred from the hint.  Each suggestion carries a
/// reason string; duplicates (by `element_ref`) are dropped.
pub fn suggest_similar_fields(hint: &str, fields: &[FieldDescriptor]) -> Vec<FieldSuggestion> {
    let hint = hint.trim().to_lowercase();
    let mut suggestions: Vec<FieldSuggestion> = Vec::new();
    let mut seen: Vec<&str> = Vec::new();

    let labels: Vec<&str> = fields.iter().map(|f| f.label.as_str()).collect();
    for candidate in fuzzy_match(&hint, &labels, SUGGEST_MAX_DISTANCE) {
        let field = &fields[candidate.index];
        if seen.contains(&field.element_ref.as_str()) {
            continue;
        }
        seen.push(&field.element_ref);
        suggestions.push(FieldSuggestion {
            descriptor: field.clone(),
            reason: format!("label \"{}\" is close to \"{hint}\"", field.label),
        });
    }

    if let Some(inferred) = infer_type_from_hint(&hint) {
        for field in fields.iter().filter(|f| f.field_type.to_lowercase() == inferred) {
            if seen.contains(&field.element_ref.as_str()) {
                continue;
            }
            seen.push(&field.element_ref);
            suggestions.push(FieldSuggestion {
                descriptor: field.clone(),
                reason: format!("field type \"{inferred}\" matches \"{hint}\""),
            });
        }
    }

    suggestions
}

/// Infer a field type from the hint via the suggestion keyword table.
fn infer_type_from_hint(hint: &str) -> Option<&'static str> {
    INFERRED_TYPES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| hint.contains(kw)))
        .map(|(ty, _)| *ty)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
