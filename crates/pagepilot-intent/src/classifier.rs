//! Ordered-pattern intent classifier.
//!
//! Resolution runs in four stages, cheapest first:
//!
//! 1. **Recorder pre-checks**: bare "stop"/"record" phrases, handled
//!    before the registry because their meaning depends on recorder state.
//! 2. **Pattern registry**: an explicit list of (regex, priority,
//!    constructor) rules evaluated first-match-wins in ascending priority.
//!    Priority is a field, not incidental array order, so the rule table
//!    reads as documentation: "fill field #3 with X" strictly precedes the
//!    generic "fill X with Y".
//! 3. **Entity heuristics**: embedded emails, phone numbers, and URLs.
//! 4. **Fuzzy verb suggestion**: the input's first word ranked against
//!    the verb vocabulary; up to 3 suggestions ride along on
//!    [`Intent::Unrecognized`].

use regex::{Captures, Regex};
use tracing::debug;

use pagepilot_match::fuzzy_match;

use crate::intent::{Intent, ScrollDirection};

// ---------------------------------------------------------------------------
// Rule table
// ---------------------------------------------------------------------------

/// One registry entry.  Lower priority values are tried first.
struct Rule {
    priority: u32,
    pattern: Regex,
    /// Short identifier for trace output.
    name: &'static str,
    build: fn(&Captures) -> Intent,
}

/// Verbs the suggestion fallback ranks against.
const VERB_VOCABULARY: &[&str] = &[
    "fill", "enter", "type", "click", "press", "tap", "scroll", "go", "open", "navigate",
    "search", "find", "record", "stop", "play", "run", "save", "apply", "use", "list",
    "show", "clear", "autofill", "workflow", "help",
];

/// Maximum edit distance for verb suggestions.
const SUGGEST_DISTANCE: usize = 2;

/// Maximum number of suggestions attached to an unrecognized intent.
const MAX_SUGGESTIONS: usize = 3;

fn capture(caps: &Captures, i: usize) -> String {
    caps.get(i).map(|m| m.as_str().trim().to_string()).unwrap_or_default()
}

/// The classifier.  Build once, reuse for every line of input; the only
/// per-call state is the recorder flag.
pub struct Classifier {
    rules: Vec<Rule>,
    email: Regex,
    phone: Regex,
    url: Regex,
}

impl Classifier {
    /// Build the classifier with the full rule table compiled.
    pub fn new() -> Self {
        let mut rules = rule_table();
        // Ascending priority; sort_by_key is stable, so rules sharing a
        // priority keep their table order.
        rules.sort_by_key(|r| r.priority);

        Self {
            rules,
            email: Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap(),
            phone: Regex::new(r"\+?\d[\d\s().-]{6,}\d").unwrap(),
            url: Regex::new(
                r"(?i)(?:https?://\S+|www\.\S+|\b[a-z0-9-]+\.(?:com|org|net|io|dev|app)\b)",
            )
            .unwrap(),
        }
    }

    /// Classify one line of text.
    ///
    /// `recording` is the current recorder state: a bare "stop" only means
    /// StopRecording while a recording is active; otherwise it falls
    /// through to normal classification.
    pub fn classify(&self, text: &str, recording: bool) -> Intent {
        let trimmed = text.trim();
        let lowered = trimmed.to_lowercase();

        // Stage 1: recorder pre-checks.
        if matches!(lowered.as_str(), "stop" | "stop recording") && recording {
            return Intent::StopRecording { name: None };
        }
        if matches!(lowered.as_str(), "record" | "start recording" | "rec") {
            return Intent::StartRecording;
        }

        // Stage 2: the pattern registry, first match wins.  Rules are
        // case-insensitive but run against the original text so captured
        // values keep their casing.
        for rule in &self.rules {
            if let Some(caps) = rule.pattern.captures(trimmed) {
                debug!(rule = rule.name, priority = rule.priority, "intent rule matched");
                return (rule.build)(&caps);
            }
        }

        // Stage 3: entity heuristics.
        if let Some(intent) = self.extract_entities(trimmed, &lowered) {
            debug!(intent = ?intent, "intent inferred from embedded entity");
            return intent;
        }

        // Stage 4: fuzzy verb suggestion.
        let suggestions = self.suggest_verbs(&lowered);
        debug!(input = %trimmed, suggestions = suggestions.len(), "intent unrecognized");
        Intent::Unrecognized {
            input: trimmed.to_string(),
            suggestions,
        }
    }

    /// Number of rules in the registry (diagnostics).
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    // -- Private helpers ----------------------------------------------------

    /// Detect embedded emails, phone numbers, and URLs, and infer an
    /// intent from the surrounding phrasing.
    fn extract_entities(&self, original: &str, lowered: &str) -> Option<Intent> {
        if let Some(email) = self.email.find(original) {
            // "my email is x@y.com" describes the profile, not the page.
            if lowered.contains("my email") || lowered.contains("my e-mail") {
                return Some(Intent::FillProfileField { key: "email".into() });
            }
            return Some(Intent::FillByLabel {
                label: "email".into(),
                value: email.as_str().to_string(),
            });
        }

        // Match on the original text: URL paths can be case-sensitive.
        if let Some(url) = self.url.find(original) {
            return Some(Intent::Navigate {
                url_or_site: url.as_str().to_string(),
            });
        }

        if let Some(phone) = self.phone.find(original) {
            if lowered.contains("my phone") || lowered.contains("my number") {
                return Some(Intent::FillProfileField { key: "phone".into() });
            }
            return Some(Intent::FillByLabel {
                label: "phone".into(),
                value: phone.as_str().trim().to_string(),
            });
        }

        None
    }

    /// Rank the input's first word against the verb vocabulary.
    fn suggest_verbs(&self, lowered: &str) -> Vec<String> {
        let first = match lowered.split_whitespace().next() {
            Some(w) => w,
            None => return Vec::new(),
        };

        fuzzy_match(first, VERB_VOCABULARY, SUGGEST_DISTANCE)
            .into_iter()
            .take(MAX_SUGGESTIONS)
            .map(|c| c.text)
            .collect()
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// The rules
// ---------------------------------------------------------------------------

/// Build the full rule table.  Priorities group related rules; within a
/// priority the table order is preserved.
fn rule_table() -> Vec<Rule> {
    fn rule(priority: u32, name: &'static str, pattern: &str, build: fn(&Captures) -> Intent) -> Rule {
        Rule {
            priority,
            name,
            // Patterns are authored in this file and anchored; a failure to
            // compile is a programming error caught by the rule-table test.
            pattern: Regex::new(&format!("(?i){pattern}")).expect("rule pattern must compile"),
            build,
        }
    }

    vec![
        // Workflow surface comes first: its step text may itself contain
        // fill/click phrasing that must not be consumed by later rules.
        rule(5, "run_workflow", r"^(?:workflow|flow):\s*(.+)$", |c| Intent::RunWorkflow {
            text: capture(c, 1),
        }),
        rule(8, "save_workflow", r"^save workflow(?:\s+as)?\s+(.+)$", |c| {
            Intent::SaveWorkflow { name: capture(c, 1) }
        }),
        rule(8, "list_workflows", r"^(?:list|show) workflows$", |_| Intent::ListWorkflows),
        // Named stop precedes the fill rules so that "stop recording as
        // checkout flow" is not misread.
        rule(10, "stop_recording_named", r"^stop(?:\s+recording)?\s+as\s+(.+)$", |c| {
            Intent::StopRecording { name: Some(capture(c, 1)) }
        }),
        // Index fill strictly precedes label fill.
        rule(
            12,
            "fill_by_index",
            r"^(?:fill|enter|type)\s+(?:field\s+)?#?(\d+)\s+with\s+(.+)$",
            |c| Intent::FillByIndex {
                index: capture(c, 1).parse().unwrap_or(0),
                value: capture(c, 2),
            },
        ),
        // "fill my email" targets the profile; "fill my email with john"
        // carries an explicit value and is an ordinary label fill.  The
        // lazy key group stops before a "with" clause.
        rule(
            15,
            "fill_my_field",
            r"^(?:use|fill(?:\s+in)?)\s+my\s+([a-z][a-z ]*?)(?:\s+with\s+(.+))?$",
            |c| match c.get(2) {
                Some(_) => Intent::FillByLabel {
                    label: capture(c, 1).to_lowercase(),
                    value: capture(c, 2),
                },
                None => Intent::FillProfileField { key: capture(c, 1).to_lowercase() },
            },
        ),
        rule(
            20,
            "fill_by_label",
            r"^(?:fill|enter|type)(?:\s+in)?\s+(.+?)\s+with\s+(.+)$",
            |c| Intent::FillByLabel {
                label: capture(c, 1),
                value: capture(c, 2),
            },
        ),
        rule(25, "click", r"^(?:click|press|tap)(?:\s+on)?(?:\s+the)?\s+(.+)$", |c| {
            Intent::Click { target: capture(c, 1) }
        }),
        rule(25, "scroll", r"^scroll(?:\s+to)?(?:\s+(up|down|top|bottom))?$", |c| Intent::Scroll {
            dir: ScrollDirection::parse(&capture(c, 1)).unwrap_or(ScrollDirection::Down),
        }),
        rule(30, "search", r"^search(?:\s+for)?\s+(.+)$", |c| Intent::Search {
            query: capture(c, 1),
        }),
        rule(30, "navigate", r"^(?:go to|navigate(?:\s+to)?|open)\s+(.+)$", |c| {
            Intent::Navigate { url_or_site: capture(c, 1) }
        }),
        rule(35, "list_fields", r"^(?:(?:list|show)(?:\s+(?:the|all))?|what)\s+fields(?:\s+are\s+there)?\??$", |_| {
            Intent::ListFields
        }),
        rule(35, "show_profile", r"^show(?:\s+my)?\s+profile$", |_| Intent::ShowProfile),
        rule(35, "clear", r"^clear(?:\s+(?:all|the)?\s*(?:form|fields))?$", |_| Intent::Clear),
        rule(35, "smart_fill", r"^(?:autofill|auto fill|smart fill|fill (?:the )?form)$", |_| {
            Intent::SmartFill
        }),
        rule(40, "list_macros", r"^(?:list|show) macros$", |_| Intent::ListMacros),
        rule(40, "play_macro", r"^(?:play|run|replay)(?:\s+macro)?\s+(.+)$", |c| {
            Intent::PlayMacro { name: capture(c, 1) }
        }),
        rule(45, "save_template", r"^save(?:\s+form)?\s+(?:as\s+)?template(?:\s+(?:as\s+)?(.+))?$", |c| {
            let name = capture(c, 1);
            Intent::SaveTemplate {
                name: (!name.is_empty()).then_some(name),
            }
        }),
        rule(45, "apply_template", r"^(?:apply|load)\s+template\s+(.+)$", |c| {
            Intent::ApplyTemplate { name: capture(c, 1) }
        }),
        rule(45, "list_templates", r"^(?:list|show) templates$", |_| Intent::ListTemplates),
        rule(50, "help", r"^(?:help|what can you do\??)$", |_| Intent::Help),
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
