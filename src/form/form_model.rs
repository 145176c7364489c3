use std::fmt;

use serde::Serialize;
use sha1::{Digest, Sha1};

/// Options kept per select/radio field. Bounds AI prompt size; a form with
/// more valid options than this may be answered from the truncated list.
pub const MAX_OPTIONS: usize = 10;

pub const REASON_APPLIED: &str = "applied";
pub const REASON_FINISHED: &str = "Application finished";
pub const REASON_STUCK: &str = "Form stuck";
pub const REASON_NO_NEXT: &str = "No next button";
pub const REASON_STEP_LIMIT: &str = "Step limit reached";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Select,
    Radio,
    Combobox,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldOption {
    pub label: String,
    pub locator: Option<String>,
    pub value: Option<String>,
    pub is_selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormField {
    pub kind: FieldKind,
    pub label: String,
    pub locator: String,
    pub value: String,
    pub options: Vec<FieldOption>,
    pub error: Option<String>,
}

impl FormField {
    pub fn has_error(&self) -> bool {
        self.error.as_deref().is_some_and(|e| !e.is_empty())
    }

    pub fn selected_option(&self) -> Option<&FieldOption> {
        self.options.iter().find(|o| o.is_selected)
    }
}

/// One captured form step. Never mutated after capture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormSnapshot {
    pub step_id: String,
    pub header: String,
    pub progress: Option<String>,
    pub fields: Vec<FormField>,
}

/// Stable digest of a snapshot, used only to compare consecutive steps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Serialize)]
struct FingerprintView<'a> {
    id: &'a str,
    header: &'a str,
    progress: &'a str,
    fields: Vec<(&'a str, &'a str, &'a str)>,
}

impl FormSnapshot {
    pub fn fingerprint(&self) -> Fingerprint {
        let view = FingerprintView {
            id: &self.step_id,
            header: &self.header,
            progress: self.progress.as_deref().unwrap_or(""),
            fields: self
                .fields
                .iter()
                .map(|f| {
                    (
                        f.label.as_str(),
                        f.error.as_deref().unwrap_or(""),
                        f.value.as_str(),
                    )
                })
                .collect(),
        };

        // Serializing borrowed strings and tuples cannot fail
        let serialized = serde_json::to_string(&view).unwrap_or_default();

        let mut hasher = Sha1::new();
        hasher.update(serialized.as_bytes());
        Fingerprint(format!("{:x}", hasher.finalize()))
    }

    pub fn has_errors(&self) -> bool {
        self.fields.iter().any(FormField::has_error)
    }

    pub fn errored_count(&self) -> usize {
        self.fields.iter().filter(|f| f.has_error()).count()
    }
}

// ============================================================================
// Step controls
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonRole {
    Advance,
    Back,
    Save,
    Discard,
    Close,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepButton {
    pub label: String,
    pub locator: String,
    pub role: ButtonRole,
    /// Disabled when read; the filler may enable it before the click
    pub disabled: bool,
}

/// Buttons of one step, at most one per named role.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StepControls {
    pub advance: Option<StepButton>,
    pub back: Option<StepButton>,
    pub close: Option<StepButton>,
    pub save: Option<StepButton>,
    pub discard: Option<StepButton>,
    pub others: Vec<StepButton>,
}

// ============================================================================
// Engine states and outcome
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FormState {
    AwaitingStep,
    Extracting,
    Filling,
    Advancing,
    Dismissed,
    Applied,
    Stuck,
    Aborted,
}

/// Result of one application attempt. The reason is diagnostic text only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyOutcome {
    pub success: bool,
    pub reason: String,
}

impl ApplyOutcome {
    pub fn applied(reason: impl Into<String>) -> Self {
        ApplyOutcome {
            success: true,
            reason: reason.into(),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        ApplyOutcome {
            success: false,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ApplyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.success { "applied" } else { "not applied" };
        write!(f, "{}: {}", status, self.reason)
    }
}
