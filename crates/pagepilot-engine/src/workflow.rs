//! Workflow parsing and execution.
//!
//! A workflow is an ordered list of steps parsed from free text such as
//! `"wait 2s, fill email with a@b.com, click submit"`.  Segments the
//! parser recognizes become concrete [`Action`] steps; anything else is
//! kept verbatim as a raw step and routed through the intent classifier
//! when the workflow runs.
//!
//! Unlike macro playback, workflow execution aborts at the first failed
//! step unless `continue_on_error` is set.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use pagepilot_intent::{Classifier, Intent};

use crate::action::{Action, FillValue, ScrollDirection};
use crate::error::{EngineError, Result};
use crate::page::PageDriver;
use crate::profile::Profile;
use crate::runner::run_action;

/// How often the executor re-checks the pause flag while paused.
const PAUSE_POLL_INTERVAL: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// Data model
// ---------------------------------------------------------------------------

/// One workflow step.
///
/// Actions always carry a `type` tag on the wire, so the untagged
/// representation is unambiguous: raw steps serialize as
/// `{"raw": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorkflowStep {
    Action(Action),
    Raw { raw: String },
}

impl WorkflowStep {
    pub fn describe(&self) -> String {
        match self {
            Self::Action(action) => action.describe(),
            Self::Raw { raw } => format!("\"{raw}\""),
        }
    }
}

/// A named, persistable workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: Uuid,
    pub name: String,
    pub steps: Vec<WorkflowStep>,
    /// Keep running past failed steps instead of aborting.
    #[serde(default)]
    pub continue_on_error: bool,
}

/// Outcome of one executed workflow step.
#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    pub index: usize,
    pub step: String,
    pub ok: bool,
    pub detail: String,
}

/// Outcome of a full workflow run.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowRunResult {
    pub workflow_id: Uuid,
    pub success: bool,
    pub step_results: Vec<StepResult>,
    /// Index of the step the run aborted at, if it aborted.
    pub halted_at: Option<usize>,
}

impl WorkflowRunResult {
    pub fn summary(&self) -> String {
        let ok = self.step_results.iter().filter(|r| r.ok).count();
        match self.halted_at {
            Some(index) => format!(
                "workflow halted at step {} ({ok}/{} steps ok)",
                index + 1,
                self.step_results.len()
            ),
            None => format!("workflow finished ({ok}/{} steps ok)", self.step_results.len()),
        }
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Splits free text into segments and lowers each to a step.
pub struct WorkflowParser {
    wait: Regex,
    fill: Regex,
    click: Regex,
    scroll: Regex,
    navigate: Regex,
    search: Regex,
    refresh: Regex,
}

impl WorkflowParser {
    pub fn new() -> Self {
        Self {
            wait: Regex::new(r"(?i)^wait\s+(\d+)\s*(s|sec|secs|seconds|ms)?$").unwrap(),
            fill: Regex::new(r"(?i)^(?:fill|enter|type)\s+(?:in\s+)?(.+?)(?:\s+with\s+(.+))?$")
                .unwrap(),
            click: Regex::new(r"(?i)^(?:click|press|tap)(?:\s+on)?\s+(.+)$").unwrap(),
            scroll: Regex::new(r"(?i)^scroll(?:\s+(?:to\s+)?(top|bottom|up|down))?$").unwrap(),
            navigate: Regex::new(r"(?i)^(?:go\s+to|navigate(?:\s+to)?|open)\s+(.+)$").unwrap(),
            search: Regex::new(r"(?i)^search(?:\s+for)?\s+(.+)$").unwrap(),
            refresh: Regex::new(r"(?i)^(?:refresh|reload)(?:\s+the\s+page)?$").unwrap(),
        }
    }

    /// Parse free text into an unnamed workflow.
    pub fn parse(&self, text: &str) -> Result<Workflow> {
        let steps: Vec<WorkflowStep> = split_segments(text)
            .into_iter()
            .map(|segment| self.parse_segment(segment))
            .collect();

        if steps.is_empty() {
            return Err(EngineError::EmptyWorkflow);
        }

        Ok(Workflow {
            id: Uuid::now_v7(),
            name: String::new(),
            steps,
            continue_on_error: false,
        })
    }

    fn parse_segment(&self, segment: &str) -> WorkflowStep {
        if let Some(caps) = self.wait.captures(segment) {
            let amount: u64 = caps[1].parse().unwrap_or(0);
            // A bare number is milliseconds; second suffixes scale.
            let ms = match caps.get(2).map(|m| m.as_str().to_lowercase()) {
                Some(unit) if unit != "ms" => amount.saturating_mul(1000),
                _ => amount,
            };
            return WorkflowStep::Action(Action::Wait { ms });
        }
        if let Some(caps) = self.fill.captures(segment) {
            let field = caps[1].trim().to_string();
            // "fill email" with no value is a prompt placeholder the
            // operator resolves at run time through the profile.
            let value = match caps.get(2) {
                Some(m) => FillValue::literal(m.as_str().trim()),
                None => FillValue::profile(field.to_lowercase()),
            };
            return WorkflowStep::Action(Action::Fill { field, value });
        }
        if let Some(caps) = self.click.captures(segment) {
            return WorkflowStep::Action(Action::Click {
                target: caps[1].trim().to_string(),
            });
        }
        if let Some(caps) = self.scroll.captures(segment) {
            let dir = caps
                .get(1)
                .and_then(|m| ScrollDirection::parse(m.as_str()))
                .unwrap_or(ScrollDirection::Down);
            return WorkflowStep::Action(Action::Scroll { dir });
        }
        if let Some(caps) = self.navigate.captures(segment) {
            return WorkflowStep::Action(Action::Navigate {
                url: caps[1].trim().to_string(),
            });
        }
        if let Some(caps) = self.search.captures(segment) {
            return WorkflowStep::Action(Action::Search {
                query: caps[1].trim().to_string(),
            });
        }
        if self.refresh.is_match(segment) {
            return WorkflowStep::Action(Action::Refresh);
        }

        debug!(segment, "segment not recognized, keeping raw");
        WorkflowStep::Raw {
            raw: segment.to_string(),
        }
    }
}

impl Default for WorkflowParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Split on commas, semicolons, newlines and the word "then".
fn split_segments(text: &str) -> Vec<&str> {
    text.split(|c| c == ',' || c == ';' || c == '\n')
        .flat_map(|part| part.split(" then "))
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("then"))
        .collect()
}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

/// Runs workflows step by step, honoring the shared pause flag.
pub struct WorkflowExecutor {
    pause: Arc<AtomicBool>,
}

impl WorkflowExecutor {
    pub fn new() -> Self {
        Self {
            pause: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The shared pause flag.  Set it to true to suspend execution at
    /// the next step boundary; clear it to resume.
    pub fn pause_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.pause)
    }

    /// Execute every step in order.
    ///
    /// A failed step aborts the run unless the workflow opts into
    /// `continue_on_error`; the failed step itself is always included
    /// in the results.
    pub async fn execute(
        &self,
        workflow: &Workflow,
        page: &dyn PageDriver,
        profile: &Profile,
        classifier: &Classifier,
    ) -> Result<WorkflowRunResult> {
        if workflow.steps.is_empty() {
            return Err(EngineError::EmptyWorkflow);
        }

        info!(id = %workflow.id, steps = workflow.steps.len(), "running workflow");

        let mut step_results = Vec::with_capacity(workflow.steps.len());
        let mut halted_at = None;

        for (index, step) in workflow.steps.iter().enumerate() {
            while self.pause.load(Ordering::SeqCst) {
                tokio::time::sleep(PAUSE_POLL_INTERVAL).await;
            }

            let outcome = self.run_step(step, page, profile, classifier).await;
            let ok = outcome.is_ok();
            step_results.push(StepResult {
                index,
                step: step.describe(),
                ok,
                detail: match outcome {
                    Ok(detail) => detail,
                    Err(err) => err.to_string(),
                },
            });

            if !ok {
                warn!(id = %workflow.id, step = index, "workflow step failed");
                if !workflow.continue_on_error {
                    halted_at = Some(index);
                    break;
                }
            }
        }

        let success = halted_at.is_none() && step_results.iter().all(|r| r.ok);
        Ok(WorkflowRunResult {
            workflow_id: workflow.id,
            success,
            step_results,
            halted_at,
        })
    }

    async fn run_step(
        &self,
        step: &WorkflowStep,
        page: &dyn PageDriver,
        profile: &Profile,
        classifier: &Classifier,
    ) -> Result<String> {
        match step {
            WorkflowStep::Action(action) => run_action(action, page, profile).await,
            WorkflowStep::Raw { raw } => {
                let intent = classifier.classify(raw, false);
                match intent_to_action(intent) {
                    Some(action) => run_action(&action, page, profile).await,
                    None => Err(EngineError::PageAction {
                        action: "workflow",
                        reason: format!("\"{raw}\" is not executable inside a workflow"),
                    }),
                }
            }
        }
    }
}

impl Default for WorkflowExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Lower a classified intent to a page action, where one exists.
/// Session-level intents (recording control, listings, persistence)
/// have no action form and make the raw step fail.
fn intent_to_action(intent: Intent) -> Option<Action> {
    match intent {
        Intent::FillByLabel { label, value } => Some(Action::Fill {
            field: label,
            value: FillValue::literal(value),
        }),
        Intent::FillProfileField { key } => Some(Action::Fill {
            field: key.clone(),
            value: FillValue::profile(key),
        }),
        Intent::Click { target } => Some(Action::Click { target }),
        Intent::Scroll { dir } => Some(Action::Scroll { dir }),
        Intent::Navigate { url_or_site } => Some(Action::Navigate { url: url_or_site }),
        Intent::Search { query } => Some(Action::Search { query }),
        Intent::SmartFill => Some(Action::Autofill),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::MockPage;

    fn parse(text: &str) -> Workflow {
        WorkflowParser::new().parse(text).unwrap()
    }

    #[test]
    fn parses_the_canonical_three_step_line() {
        let wf = parse("wait 2s, fill email with a@b.com, click submit");
        assert_eq!(
            wf.steps,
            vec![
                WorkflowStep::Action(Action::Wait { ms: 2000 }),
                WorkflowStep::Action(Action::Fill {
                    field: "email".into(),
                    value: FillValue::literal("a@b.com"),
                }),
                WorkflowStep::Action(Action::Click {
                    target: "submit".into(),
                }),
            ]
        );
    }

    #[test]
    fn wait_units_default_to_milliseconds() {
        let wf = parse("wait 500, wait 3s, wait 250ms, wait 2 seconds");
        let expected = [500u64, 3000, 250, 2000];
        for (step, ms) in wf.steps.iter().zip(expected) {
            assert_eq!(step, &WorkflowStep::Action(Action::Wait { ms }));
        }
    }

    #[test]
    fn absurd_wait_saturates_instead_of_overflowing() {
        let wf = parse(&format!("wait {}s", u64::MAX));
        assert_eq!(wf.steps, vec![WorkflowStep::Action(Action::Wait { ms: u64::MAX })]);
    }

    #[test]
    fn then_separator_and_scroll_default() {
        let wf = parse("go to docs.rs then scroll then click feedback");
        assert_eq!(
            wf.steps,
            vec![
                WorkflowStep::Action(Action::Navigate {
                    url: "docs.rs".into()
                }),
                WorkflowStep::Action(Action::Scroll {
                    dir: ScrollDirection::Down
                }),
                WorkflowStep::Action(Action::Click {
                    target: "feedback".into()
                }),
            ]
        );
    }

    #[test]
    fn fill_without_value_references_the_profile() {
        let wf = parse("fill Email");
        assert_eq!(
            wf.steps,
            vec![WorkflowStep::Action(Action::Fill {
                field: "Email".into(),
                value: FillValue::profile("email"),
            })]
        );
    }

    #[test]
    fn unrecognized_segments_stay_raw() {
        let wf = parse("click submit, do a barrel roll");
        assert_eq!(
            wf.steps[1],
            WorkflowStep::Raw {
                raw: "do a barrel roll".into()
            }
        );
    }

    #[test]
    fn empty_text_is_rejected() {
        let err = WorkflowParser::new().parse("  ,  ,  ").unwrap_err();
        assert!(matches!(err, EngineError::EmptyWorkflow));
    }

    #[test]
    fn raw_steps_serialize_without_a_type_tag() {
        let step = WorkflowStep::Raw {
            raw: "do the thing".into(),
        };
        let wire = serde_json::to_value(&step).unwrap();
        assert_eq!(wire, serde_json::json!({"raw": "do the thing"}));

        let back: WorkflowStep = serde_json::from_value(wire).unwrap();
        assert_eq!(back, step);
    }

    #[tokio::test(start_paused = true)]
    async fn first_failure_halts_by_default() {
        let page = MockPage::new();
        page.fail_on("#email");
        let wf = parse("fill email with a@b.com, fill phone with 555, click submit");

        let result = WorkflowExecutor::new()
            .execute(&wf, &page, &Profile::new(), &Classifier::new())
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.halted_at, Some(0));
        assert_eq!(result.step_results.len(), 1);
        assert!(!result.step_results[0].ok);
        assert_eq!(page.field_value("#phone"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn continue_on_error_runs_to_the_end() {
        let page = MockPage::new();
        page.fail_on("#email");
        let mut wf = parse("fill email with a@b.com, fill phone with 555");
        wf.continue_on_error = true;

        let result = WorkflowExecutor::new()
            .execute(&wf, &page, &Profile::new(), &Classifier::new())
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.halted_at, None);
        assert_eq!(result.step_results.len(), 2);
        assert_eq!(page.field_value("#phone"), Some("555".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn raw_steps_execute_through_the_classifier() {
        let page = MockPage::new();
        let wf = Workflow {
            id: Uuid::now_v7(),
            name: String::new(),
            steps: vec![WorkflowStep::Raw {
                raw: "put a@b.com in email".into(),
            }],
            continue_on_error: false,
        };

        let result = WorkflowExecutor::new()
            .execute(&wf, &page, &Profile::new(), &Classifier::new())
            .await
            .unwrap();

        assert!(result.success, "{:?}", result.step_results);
        assert_eq!(page.field_value("#email"), Some("a@b.com".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn pause_flag_suspends_between_steps() {
        let page = MockPage::new();
        let wf = parse("fill email with a@b.com, fill phone with 555");
        let executor = WorkflowExecutor::new();
        let pause = executor.pause_flag();

        pause.store(true, Ordering::SeqCst);
        let profile = Profile::new();
        let classifier = Classifier::new();
        let run = executor.execute(&wf, &page, &profile, &classifier);
        tokio::pin!(run);

        // Paused before the first step; nothing should run yet.
        assert!(
            tokio::time::timeout(Duration::from_secs(1), run.as_mut())
                .await
                .is_err()
        );
        assert_eq!(page.field_value("#email"), None);

        pause.store(false, Ordering::SeqCst);
        let result = run.await.unwrap();
        assert!(result.success);
        assert_eq!(page.field_value("#phone"), Some("555".into()));
    }
}
