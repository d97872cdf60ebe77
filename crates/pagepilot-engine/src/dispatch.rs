//! The command dispatcher.
//!
//! [`Engine`] owns the whole session: the page driver, the intent
//! classifier, recorder state, the operator profile, action history,
//! and the persistence stores.  One line of operator text goes in,
//! one [`Reply`] comes out.
//!
//! While a recording is active, every page action performed through the
//! dispatcher is also captured into the recorder buffer, including the
//! structural profile reference when the operator says "use my email",
//! so the macro replays against the profile of the moment rather than
//! a frozen value.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use tracing::{info, instrument, warn};

use pagepilot_intent::{Classifier, Intent};
use pagepilot_store::{Database, MacroStore, TemplateStore, WorkflowStore};

use crate::action::{Action, FillValue};
use crate::error::{EngineError, Result};
use crate::history::ActionHistory;
use crate::page::PageDriver;
use crate::player::play_macro;
use crate::profile::Profile;
use crate::recorder::{Macro, Recorder};
use crate::runner::{fill_by_hint, run_action};
use crate::workflow::{Workflow, WorkflowExecutor, WorkflowParser};

/// What the dispatcher says back to the operator.
#[derive(Debug, Clone)]
pub struct Reply {
    pub ok: bool,
    pub message: String,
}

impl Reply {
    fn done(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// The session engine.
pub struct Engine {
    page: Arc<dyn PageDriver>,
    classifier: Classifier,
    parser: WorkflowParser,
    executor: WorkflowExecutor,
    recorder: Recorder,
    profile: Profile,
    history: ActionHistory,
    macros: MacroStore,
    templates: TemplateStore,
    workflows: WorkflowStore,
    user: String,
    /// The most recently run workflow, eligible for `save workflow`.
    last_workflow: Option<Workflow>,
}

impl Engine {
    pub fn new(page: Arc<dyn PageDriver>, db: Database, user: impl Into<String>) -> Self {
        Self {
            page,
            classifier: Classifier::new(),
            parser: WorkflowParser::new(),
            executor: WorkflowExecutor::new(),
            recorder: Recorder::new(),
            profile: Profile::new(),
            history: ActionHistory::new(),
            macros: MacroStore::new(db.clone()),
            templates: TemplateStore::new(db.clone()),
            workflows: WorkflowStore::new(db),
            user: user.into(),
            last_workflow: None,
        }
    }

    /// The operator profile, for seeding and inspection.
    pub fn profile_mut(&mut self) -> &mut Profile {
        &mut self.profile
    }

    /// Action history, most recent last.
    pub fn history(&self) -> &ActionHistory {
        &self.history
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    /// Shared flag that pauses workflow execution at step boundaries.
    pub fn pause_flag(&self) -> Arc<AtomicBool> {
        self.executor.pause_flag()
    }

    /// Handle one line of operator input.
    #[instrument(skip(self), fields(user = %self.user))]
    pub async fn handle(&mut self, text: &str) -> Reply {
        let intent = self.classifier.classify(text, self.recorder.is_recording());
        info!(intent = ?intent, "dispatching intent");

        match self.dispatch(intent).await {
            Ok(message) => Reply::done(message),
            Err(err) => {
                warn!(error = %err, "command failed");
                Reply::failed(describe_error(err))
            }
        }
    }

    async fn dispatch(&mut self, intent: Intent) -> Result<String> {
        match intent {
            Intent::FillByLabel { label, value } => {
                self.perform(Action::Fill {
                    field: label,
                    value: FillValue::literal(value),
                })
                .await
            }
            Intent::FillByIndex { index, value } => self.fill_by_index(index, &value).await,
            Intent::FillProfileField { key } => {
                // The structural reference is what gets recorded, so the
                // value is re-resolved on every replay.
                self.perform(Action::Fill {
                    field: key.clone(),
                    value: FillValue::profile(key),
                })
                .await
            }
            Intent::Click { target } => self.perform(Action::Click { target }).await,
            Intent::Scroll { dir } => self.perform(Action::Scroll { dir }).await,
            Intent::Navigate { url_or_site } => {
                self.perform(Action::Navigate { url: url_or_site }).await
            }
            Intent::Search { query } => self.perform(Action::Search { query }).await,
            Intent::SmartFill => self.perform(Action::Autofill).await,

            Intent::ListFields => self.list_fields().await,
            Intent::ShowProfile => Ok(self.show_profile()),
            Intent::Clear => {
                self.page.clear_fields().await?;
                self.history.record("cleared all fields", true);
                Ok("cleared all fields".into())
            }

            Intent::StartRecording => {
                self.recorder.start();
                Ok("recording; say \"stop\" or \"stop as <name>\" when done".into())
            }
            Intent::StopRecording { name } => self.stop_recording(name).await,
            Intent::PlayMacro { name } => self.play_stored_macro(&name).await,
            Intent::ListMacros => self.list_macros().await,

            Intent::SaveTemplate { name } => self.save_template(name).await,
            Intent::ApplyTemplate { name } => self.apply_template(&name).await,
            Intent::ListTemplates => {
                let names = self.templates.list(&self.user).await?;
                Ok(listing("templates", &names))
            }

            Intent::RunWorkflow { text } => self.run_workflow(&text).await,
            Intent::SaveWorkflow { name } => self.save_workflow(&name).await,
            Intent::ListWorkflows => {
                let names = self.workflows.list(&self.user).await?;
                Ok(listing("workflows", &names))
            }

            Intent::Help => Ok(help_text()),
            Intent::Unrecognized { input, suggestions } => {
                Err(EngineError::NoMatch {
                    hint: input,
                    suggestions,
                })
            }
        }
    }

    // -- Page actions -------------------------------------------------------

    /// Run one page action, capture it into an active recording, and log
    /// it to history.
    async fn perform(&mut self, action: Action) -> Result<String> {
        let description = action.describe();
        let outcome = run_action(&action, self.page.as_ref(), &self.profile).await;

        self.history.record(&description, outcome.is_ok());
        if outcome.is_ok() && self.recorder.is_recording() {
            self.recorder.record(action);
        }

        outcome
    }

    async fn fill_by_index(&mut self, index: usize, value: &str) -> Result<String> {
        let fields = self.page.scan_fields().await?;
        // Operator-facing indexes are 1-based, matching `list fields`.
        let field = index
            .checked_sub(1)
            .and_then(|i| fields.get(i))
            .ok_or_else(|| EngineError::NoMatch {
                hint: format!("field #{index}"),
                suggestions: fields.iter().map(|f| f.label.clone()).collect(),
            })?
            .clone();

        self.page.fill_field(&field.element_ref, value).await?;

        let action = Action::Fill {
            field: field.label.clone(),
            value: FillValue::literal(value),
        };
        self.history.record(action.describe(), true);
        if self.recorder.is_recording() {
            self.recorder.record(action);
        }

        Ok(format!("filled #{index} \"{}\"", field.label))
    }

    async fn list_fields(&self) -> Result<String> {
        let fields = self.page.scan_fields().await?;
        if fields.is_empty() {
            return Ok("no fillable fields on this page".into());
        }

        let lines: Vec<String> = fields
            .iter()
            .enumerate()
            .map(|(i, f)| format!("  #{} {} ({})", i + 1, f.label, f.field_type))
            .collect();
        Ok(format!("{} fields:\n{}", fields.len(), lines.join("\n")))
    }

    fn show_profile(&self) -> String {
        if self.profile.is_empty() {
            return "profile is empty".into();
        }
        let lines: Vec<String> = self
            .profile
            .keys()
            .into_iter()
            .map(|k| format!("  {k}: {}", self.profile.get(k).unwrap_or("")))
            .collect();
        format!("profile:\n{}", lines.join("\n"))
    }

    // -- Macros -------------------------------------------------------------

    async fn stop_recording(&mut self, name: Option<String>) -> Result<String> {
        let site = self.page.current_url().await.unwrap_or_default();
        let mac = self.recorder.stop(name, site)?;

        let steps = mac.actions.len();
        let payload = serde_json::to_value(&mac)?;
        self.macros
            .save(&self.user, &mac.name, &mac.trigger, payload)
            .await?;

        info!(name = %mac.name, steps, "macro saved");
        Ok(format!("saved macro \"{}\" with {steps} steps", mac.name))
    }

    async fn play_stored_macro(&mut self, name: &str) -> Result<String> {
        let stored = self
            .macros
            .get(&self.user, name)
            .await?
            .ok_or_else(|| EngineError::MacroNotFound {
                name: name.to_string(),
            })?;

        let mac: Macro = serde_json::from_value(stored.payload)?;
        let report = play_macro(&mac, self.page.as_ref(), &self.profile).await;

        self.history.record(report.summary(), report.failed() == 0);
        Ok(report.summary())
    }

    async fn list_macros(&self) -> Result<String> {
        let names: Vec<String> = self
            .macros
            .list(&self.user)
            .await?
            .into_iter()
            .map(|m| m.name)
            .collect();
        Ok(listing("macros", &names))
    }

    // -- Templates ----------------------------------------------------------

    /// Snapshot every currently filled field under a name.
    async fn save_template(&mut self, name: Option<String>) -> Result<String> {
        let fields = self.page.scan_fields().await?;
        let entries: Vec<serde_json::Value> = fields
            .iter()
            .filter_map(|f| {
                f.value
                    .as_deref()
                    .filter(|v| !v.is_empty())
                    .map(|v| serde_json::json!({"label": f.label, "value": v}))
            })
            .collect();

        if entries.is_empty() {
            return Err(EngineError::NothingToSave("no filled fields to capture"));
        }

        let name = name.unwrap_or_else(|| {
            format!("template-{}", chrono::Utc::now().format("%Y%m%d-%H%M%S"))
        });
        let count = entries.len();
        self.templates
            .save(&self.user, &name, serde_json::json!({ "fields": entries }))
            .await?;

        Ok(format!("saved template \"{name}\" with {count} fields"))
    }

    async fn apply_template(&mut self, name: &str) -> Result<String> {
        let payload = self
            .templates
            .get(&self.user, name)
            .await?
            .ok_or_else(|| EngineError::TemplateNotFound {
                name: name.to_string(),
            })?;

        let entries = payload
            .get("fields")
            .and_then(|f| f.as_array())
            .cloned()
            .unwrap_or_default();

        let mut filled = 0usize;
        for entry in &entries {
            let (Some(label), Some(value)) = (
                entry.get("label").and_then(|v| v.as_str()),
                entry.get("value").and_then(|v| v.as_str()),
            ) else {
                continue;
            };
            // Matching is per-label, so a template recorded on one form
            // can land on a structurally similar one.
            if fill_by_hint(label, value, self.page.as_ref()).await.is_ok() {
                filled += 1;
            }
        }

        self.history
            .record(format!("applied template \"{name}\""), filled > 0);
        Ok(format!(
            "applied template \"{name}\": {filled}/{} fields",
            entries.len()
        ))
    }

    // -- Workflows ----------------------------------------------------------

    async fn run_workflow(&mut self, text: &str) -> Result<String> {
        let workflow = self.parser.parse(text)?;
        let result = self
            .executor
            .execute(&workflow, self.page.as_ref(), &self.profile, &self.classifier)
            .await?;

        self.history.record(result.summary(), result.success);
        self.last_workflow = Some(workflow);
        Ok(result.summary())
    }

    async fn save_workflow(&mut self, name: &str) -> Result<String> {
        let mut workflow = self
            .last_workflow
            .clone()
            .ok_or(EngineError::NothingToSave("no workflow has been run yet"))?;
        workflow.name = name.to_string();

        let steps = workflow.steps.len();
        self.workflows
            .save(&self.user, name, serde_json::to_value(&workflow)?)
            .await?;
        Ok(format!("saved workflow \"{name}\" with {steps} steps"))
    }
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

fn listing(kind: &str, names: &[String]) -> String {
    if names.is_empty() {
        format!("no saved {kind}")
    } else {
        format!("{kind}: {}", names.join(", "))
    }
}

fn describe_error(err: EngineError) -> String {
    match err {
        EngineError::NoMatch { hint, suggestions } if !suggestions.is_empty() => {
            format!("no match for \"{hint}\"; did you mean: {}?", suggestions.join(", "))
        }
        other => other.to_string(),
    }
}

fn help_text() -> String {
    [
        "commands:",
        "  fill <label> with <value>    fill #<n> with <value>",
        "  use my <key>                 autofill",
        "  click <target>               scroll [up|down|top|bottom]",
        "  go to <site>                 search for <query>",
        "  list fields                  clear",
        "  record / stop [as <name>]    play <macro>      list macros",
        "  save template [as <name>]    apply template <name>",
        "  workflow: <steps>            save workflow <name>",
    ]
    .join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
