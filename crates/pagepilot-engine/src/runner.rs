//! Single-action execution.
//!
//! Shared by the macro player and the workflow executor: every `Action`
//! funnels through [`run_action`], which resolves field hints via the
//! matching cascade, resolves profile references, and calls into the
//! page driver.  Field descriptors are re-scanned on every call; they
//! are never cached across actions.

use std::time::Duration;

use tracing::debug;

use pagepilot_match::{FieldDescriptor, match_field, suggest_similar_fields};

use crate::action::{Action, FillValue};
use crate::error::{EngineError, Result};
use crate::page::PageDriver;
use crate::profile::Profile;

/// Minimum match confidence for an autofill profile-key hit.
const AUTOFILL_THRESHOLD: f64 = 0.6;

/// How many near-miss labels ride along on a NoMatch error.
const MAX_NO_MATCH_SUGGESTIONS: usize = 3;

/// Execute one action against the page, returning a human-readable
/// outcome message.
pub(crate) async fn run_action(
    action: &Action,
    page: &dyn PageDriver,
    profile: &Profile,
) -> Result<String> {
    debug!(action = %action.describe(), "executing action");

    match action {
        Action::Wait { ms } => {
            tokio::time::sleep(Duration::from_millis(*ms)).await;
            Ok(format!("waited {ms}ms"))
        }
        Action::Fill { field, value } => {
            let resolved = resolve_fill_value(value, profile)?;
            fill_by_hint(field, &resolved, page).await
        }
        Action::Click { target } => click_by_hint(target, page).await,
        Action::Scroll { dir } => {
            page.scroll(*dir).await?;
            Ok(format!("scrolled {dir:?}").to_lowercase())
        }
        Action::Navigate { url } => {
            let url = normalize_url(url);
            page.navigate(&url).await?;
            Ok(format!("navigated to {url}"))
        }
        Action::Search { query } => {
            let url = search_url(query);
            page.navigate(&url).await?;
            Ok(format!("searched for \"{query}\""))
        }
        Action::Autofill => autofill(page, profile).await,
        Action::Refresh => {
            page.refresh().await?;
            Ok("refreshed".into())
        }
        Action::Back => {
            page.back().await?;
            Ok("went back".into())
        }
        Action::Forward => {
            page.forward().await?;
            Ok("went forward".into())
        }
        Action::Find { text } => {
            if page.find_in_page(text).await? {
                Ok(format!("found \"{text}\" on the page"))
            } else {
                Err(EngineError::PageAction {
                    action: "find",
                    reason: format!("\"{text}\" not found on the page"),
                })
            }
        }
    }
}

/// Resolve a fill value, consulting the profile for `ProfileRef`s.
///
/// Resolution happens at execution time, so profile-linked
/// macros stay correct when the profile changes after recording.
fn resolve_fill_value(value: &FillValue, profile: &Profile) -> Result<String> {
    match value {
        FillValue::Literal(text) => Ok(text.clone()),
        FillValue::ProfileRef { profile_key } => profile
            .get(profile_key)
            .map(String::from)
            .ok_or_else(|| EngineError::ProfileKeyMissing {
                key: profile_key.clone(),
            }),
    }
}

/// Match `hint` against a fresh field scan and fill the winner.
pub(crate) async fn fill_by_hint(hint: &str, value: &str, page: &dyn PageDriver) -> Result<String> {
    let fields = page.scan_fields().await?;
    match match_field(hint, &fields) {
        Some(m) => {
            page.fill_field(&m.descriptor.element_ref, value).await?;
            Ok(format!(
                "filled \"{}\" (strategy {:?}, confidence {:.2})",
                m.descriptor.label, m.strategy, m.confidence
            ))
        }
        None => Err(no_match(hint, &fields)),
    }
}

/// Match `target` against the clickable scan and click the winner,
/// falling back to the driver's text lookup.
pub(crate) async fn click_by_hint(target: &str, page: &dyn PageDriver) -> Result<String> {
    let clickables = page.scan_clickables().await?;
    if let Some(m) = match_field(target, &clickables) {
        page.click(&m.descriptor.element_ref).await?;
        return Ok(format!(
            "clicked \"{}\" (strategy {:?}, confidence {:.2})",
            m.descriptor.label, m.strategy, m.confidence
        ));
    }

    // The scan can miss controls without labels; let the driver try a
    // raw text lookup before giving up.
    match page.click_text(target).await {
        Ok(()) => Ok(format!("clicked \"{target}\"")),
        Err(_) => Err(no_match(target, &clickables)),
    }
}

/// Fill every field that matches a profile key with good confidence.
async fn autofill(page: &dyn PageDriver, profile: &Profile) -> Result<String> {
    let fields = page.scan_fields().await?;
    let mut filled = 0usize;

    for field in &fields {
        let single = std::slice::from_ref(field);
        let best = profile
            .entries()
            .filter_map(|(key, value)| {
                match_field(key, single)
                    .filter(|m| m.confidence >= AUTOFILL_THRESHOLD)
                    .map(|m| (m.confidence, value))
            })
            .max_by(|a, b| a.0.total_cmp(&b.0));

        if let Some((_, value)) = best {
            page.fill_field(&field.element_ref, value).await?;
            filled += 1;
        }
    }

    Ok(format!("autofilled {filled} of {} fields", fields.len()))
}

fn no_match(hint: &str, fields: &[FieldDescriptor]) -> EngineError {
    let suggestions = suggest_similar_fields(hint, fields)
        .into_iter()
        .take(MAX_NO_MATCH_SUGGESTIONS)
        .map(|s| s.descriptor.label)
        .collect();
    EngineError::NoMatch {
        hint: hint.to_string(),
        suggestions,
    }
}

/// Make a bare hostname or site name navigable.
fn normalize_url(url: &str) -> String {
    let url = url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else if url.contains('.') {
        format!("https://{url}")
    } else {
        // Bare site name, e.g. "go to github".
        format!("https://www.{url}.com")
    }
}

fn search_url(query: &str) -> String {
    format!(
        "https://www.google.com/search?q={}",
        query.trim().replace(' ', "+")
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::MockPage;

    #[tokio::test]
    async fn fill_resolves_hint_through_cascade() {
        let page = MockPage::new();
        let profile = Profile::new();
        let action = Action::Fill {
            field: "email".into(),
            value: FillValue::literal("a@b.com"),
        };

        let msg = run_action(&action, &page, &profile).await.unwrap();
        assert!(msg.contains("Email Address"));
        assert_eq!(page.field_value("#email"), Some("a@b.com".into()));
    }

    #[tokio::test]
    async fn fill_unknown_hint_reports_no_match_with_suggestions() {
        let page = MockPage::new();
        let action = Action::Fill {
            field: "emale addr".into(),
            value: FillValue::literal("x"),
        };

        let err = run_action(&action, &page, &Profile::new()).await.unwrap_err();
        match err {
            EngineError::NoMatch { hint, suggestions } => {
                assert_eq!(hint, "emale addr");
                assert!(suggestions.len() <= 3);
            }
            other => panic!("expected NoMatch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn profile_ref_resolves_at_execution_time() {
        let page = MockPage::new();
        let mut profile = Profile::new();
        profile.set("email", "new@example.com");

        let action = Action::Fill {
            field: "email".into(),
            value: FillValue::profile("email"),
        };
        run_action(&action, &page, &profile).await.unwrap();
        assert_eq!(page.field_value("#email"), Some("new@example.com".into()));
    }

    #[tokio::test]
    async fn missing_profile_key_is_an_error() {
        let page = MockPage::new();
        let action = Action::Fill {
            field: "email".into(),
            value: FillValue::profile("email"),
        };

        let err = run_action(&action, &page, &Profile::new()).await.unwrap_err();
        assert!(matches!(err, EngineError::ProfileKeyMissing { .. }));
    }

    #[tokio::test]
    async fn click_falls_back_to_text_lookup() {
        let page = MockPage::new();
        let msg = click_by_hint("submit", &page).await.unwrap();
        assert!(msg.contains("clicked"));
    }

    #[tokio::test]
    async fn autofill_fills_matching_fields_only() {
        let page = MockPage::new();
        let mut profile = Profile::new();
        profile.set("email", "a@b.com");
        profile.set("phone", "555-1234");

        let msg = run_action(&Action::Autofill, &page, &profile).await.unwrap();
        assert!(msg.starts_with("autofilled 2"));
        assert_eq!(page.field_value("#email"), Some("a@b.com".into()));
        assert_eq!(page.field_value("#phone"), Some("555-1234".into()));
        assert_eq!(page.field_value("#password"), None);
    }

    #[tokio::test]
    async fn navigation_normalizes_urls() {
        assert_eq!(normalize_url("https://a.com/x"), "https://a.com/x");
        assert_eq!(normalize_url("docs.rs"), "https://docs.rs");
        assert_eq!(normalize_url("github"), "https://www.github.com");
    }

    #[tokio::test]
    async fn find_miss_is_a_step_failure() {
        let page = MockPage::new();
        page.set_page_text("Welcome back");

        let found = run_action(
            &Action::Find { text: "welcome".into() },
            &page,
            &Profile::new(),
        )
        .await;
        assert!(found.is_ok());

        let missing = run_action(
            &Action::Find { text: "goodbye".into() },
            &page,
            &Profile::new(),
        )
        .await;
        assert!(matches!(missing, Err(EngineError::PageAction { action: "find", .. })));
    }
}
