//! The page-driver boundary.
//!
//! [`PageDriver`] is the engine's only page-action I/O surface: everything
//! the engine does to a live page goes through this trait, and every
//! method can suspend and fail independently.  Production drivers speak a
//! browser protocol; [`MockPage`] is an in-memory simulation used by the
//! test suites and offline demos.
//!
//! Drivers must rebuild descriptors from the live page on every scan;
//! the engine never caches them across navigations.

use async_trait::async_trait;

use pagepilot_match::FieldDescriptor;

use crate::action::ScrollDirection;
use crate::error::Result;

/// Uniform interface to the live page.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Scan the page for fillable fields (inputs, textareas, selects).
    async fn scan_fields(&self) -> Result<Vec<FieldDescriptor>>;

    /// Scan the page for clickable controls (buttons, links).
    async fn scan_clickables(&self) -> Result<Vec<FieldDescriptor>>;

    /// Write `value` into the element addressed by `element_ref`.
    async fn fill_field(&self, element_ref: &str, value: &str) -> Result<()>;

    /// Click the element addressed by `element_ref`.
    async fn click(&self, element_ref: &str) -> Result<()>;

    /// Click the first control whose visible text matches `target`.
    /// Fallback for when no scanned descriptor matched.
    async fn click_text(&self, target: &str) -> Result<()>;

    /// Scroll the page.
    async fn scroll(&self, dir: ScrollDirection) -> Result<()>;

    /// Navigate to `url`.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Reload the current page.
    async fn refresh(&self) -> Result<()>;

    /// Browser history back.
    async fn back(&self) -> Result<()>;

    /// Browser history forward.
    async fn forward(&self) -> Result<()>;

    /// Search the page text for `text`.
    async fn find_in_page(&self, text: &str) -> Result<bool>;

    /// Clear every fillable field.
    async fn clear_fields(&self) -> Result<()>;

    /// The page's current URL.
    async fn current_url(&self) -> Result<String>;
}

// ---------------------------------------------------------------------------
// In-memory driver
// ---------------------------------------------------------------------------

use std::sync::Mutex;

use crate::error::EngineError;

/// In-memory page simulation.
///
/// Holds a form-like set of fields and clickables, records every
/// operation in an inspection log, and can be told to fail specific click
/// targets so failure paths are testable.
pub struct MockPage {
    state: Mutex<MockState>,
}

struct MockState {
    url: String,
    fields: Vec<FieldDescriptor>,
    clickables: Vec<FieldDescriptor>,
    page_text: String,
    failing_refs: Vec<String>,
    log: Vec<String>,
}

impl MockPage {
    /// A page with a typical signup form.
    pub fn new() -> Self {
        let fields = vec![
            Self::field("Email Address", "email", "#email"),
            Self::field("Phone", "tel", "#phone"),
            Self::field("Full Name", "text", "#name"),
            Self::field("Password", "password", "#password"),
        ];
        let clickables = vec![
            Self::field("Submit", "button", "#submit"),
            Self::field("Next", "button", "#next"),
            Self::field("Cancel", "button", "#cancel"),
        ];

        Self {
            state: Mutex::new(MockState {
                url: "https://example.com/signup".into(),
                fields,
                clickables,
                page_text: "Create your account".into(),
                failing_refs: Vec::new(),
                log: Vec::new(),
            }),
        }
    }

    /// A page with the given fields and no clickables.
    pub fn with_fields(fields: Vec<FieldDescriptor>) -> Self {
        let page = Self::new();
        {
            let mut state = page.state.lock().unwrap();
            state.fields = fields;
            state.clickables = Vec::new();
        }
        page
    }

    /// Make operations on `element_ref` fail, for failure-path tests.
    pub fn fail_on(&self, element_ref: &str) {
        self.state.lock().unwrap().failing_refs.push(element_ref.into());
    }

    /// Set the searchable page text.
    pub fn set_page_text(&self, text: &str) {
        self.state.lock().unwrap().page_text = text.into();
    }

    /// Snapshot of the operation log, in execution order.
    pub fn operations(&self) -> Vec<String> {
        self.state.lock().unwrap().log.clone()
    }

    /// Current value of the field addressed by `element_ref`.
    pub fn field_value(&self, element_ref: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .fields
            .iter()
            .find(|f| f.element_ref == element_ref)
            .and_then(|f| f.value.clone())
    }

    fn field(label: &str, field_type: &str, element_ref: &str) -> FieldDescriptor {
        FieldDescriptor {
            label: label.into(),
            name: label.to_lowercase().replace(' ', "_"),
            field_type: field_type.into(),
            visible: true,
            element_ref: element_ref.into(),
            value: None,
        }
    }

    fn check_failing(state: &MockState, element_ref: &str, action: &'static str) -> Result<()> {
        if state.failing_refs.iter().any(|r| r == element_ref) {
            return Err(EngineError::PageAction {
                action,
                reason: format!("element {element_ref} is not interactable"),
            });
        }
        Ok(())
    }
}

impl Default for MockPage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageDriver for MockPage {
    async fn scan_fields(&self) -> Result<Vec<FieldDescriptor>> {
        Ok(self.state.lock().unwrap().fields.clone())
    }

    async fn scan_clickables(&self) -> Result<Vec<FieldDescriptor>> {
        Ok(self.state.lock().unwrap().clickables.clone())
    }

    async fn fill_field(&self, element_ref: &str, value: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        Self::check_failing(&state, element_ref, "fill")?;

        let field = state
            .fields
            .iter_mut()
            .find(|f| f.element_ref == element_ref)
            .ok_or_else(|| EngineError::PageAction {
                action: "fill",
                reason: format!("no element {element_ref}"),
            })?;
        field.value = Some(value.to_string());

        state.log.push(format!("fill {element_ref}={value}"));
        Ok(())
    }

    async fn click(&self, element_ref: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        Self::check_failing(&state, element_ref, "click")?;

        if !state.clickables.iter().any(|c| c.element_ref == element_ref) {
            return Err(EngineError::PageAction {
                action: "click",
                reason: format!("no element {element_ref}"),
            });
        }
        state.log.push(format!("click {element_ref}"));
        Ok(())
    }

    async fn click_text(&self, target: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let lowered = target.to_lowercase();

        let found = state
            .clickables
            .iter()
            .find(|c| c.label.to_lowercase().contains(&lowered))
            .map(|c| c.element_ref.clone());

        match found {
            Some(element_ref) => {
                Self::check_failing(&state, &element_ref, "click")?;
                state.log.push(format!("click {element_ref}"));
                Ok(())
            }
            None => Err(EngineError::PageAction {
                action: "click",
                reason: format!("no control with text \"{target}\""),
            }),
        }
    }

    async fn scroll(&self, dir: ScrollDirection) -> Result<()> {
        self.state.lock().unwrap().log.push(format!("scroll {dir:?}").to_lowercase());
        Ok(())
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.url = url.to_string();
        state.log.push(format!("navigate {url}"));
        Ok(())
    }

    async fn refresh(&self) -> Result<()> {
        self.state.lock().unwrap().log.push("refresh".into());
        Ok(())
    }

    async fn back(&self) -> Result<()> {
        self.state.lock().unwrap().log.push("back".into());
        Ok(())
    }

    async fn forward(&self) -> Result<()> {
        self.state.lock().unwrap().log.push("forward".into());
        Ok(())
    }

    async fn find_in_page(&self, text: &str) -> Result<bool> {
        let state = self.state.lock().unwrap();
        Ok(state
            .page_text
            .to_lowercase()
            .contains(&text.to_lowercase()))
    }

    async fn clear_fields(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        for field in &mut state.fields {
            field.value = None;
        }
        state.log.push("clear".into());
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.state.lock().unwrap().url.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
