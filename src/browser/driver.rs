use serde::{Deserialize, Serialize};

use crate::error::ApplyError;

/// Version of the typed query set a driver must answer. Sent to the browser
/// server on launch so a mismatched script fails fast instead of returning
/// records in a shape this crate cannot read.
pub const QUERY_SET_VERSION: u32 = 1;

/// Opaque reference to a live element: the CSS selector the driver resolved it to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle(pub String);

impl ElementHandle {
    pub fn new(selector: impl Into<String>) -> Self {
        ElementHandle(selector.into())
    }

    pub fn selector(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Typed query records (one per control kind)
// ============================================================================

/// Title area of a form step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawStepInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub header: String,
    #[serde(default)]
    pub progress: Option<String>,
}

/// Label text candidates for a control, most specific first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLabel {
    /// Visible-only text of the associated `<label>` / `<legend>` (aria-hidden span)
    #[serde(default)]
    pub visible: Option<String>,
    /// Full inner text of the associated `<label>` / `<legend>`
    #[serde(default)]
    pub text: Option<String>,
    /// Accessible-name fallback (aria-label)
    #[serde(default)]
    pub aria: Option<String>,
}

/// Inline validation messages found near a control.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawErrors {
    /// Message referenced through `aria-describedby`
    #[serde(default)]
    pub described: Option<String>,
    /// Message found inside the nearest field-group ancestor
    #[serde(default)]
    pub group: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOption {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub selector: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub selected: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTextInput {
    pub selector: String,
    #[serde(default)]
    pub label: RawLabel,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub errors: RawErrors,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSelect {
    pub selector: String,
    #[serde(default)]
    pub label: RawLabel,
    #[serde(default)]
    pub options: Vec<RawOption>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub errors: RawErrors,
}

/// A fieldset of radio (or checkbox) inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawChoiceGroup {
    pub selector: String,
    #[serde(default)]
    pub label: RawLabel,
    #[serde(default)]
    pub options: Vec<RawOption>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub errors: RawErrors,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCombobox {
    pub selector: String,
    #[serde(default)]
    pub label: RawLabel,
    #[serde(default)]
    pub value: String,
    /// `aria-controls` / `aria-owns` target id, when declared
    #[serde(default)]
    pub listbox_id: Option<String>,
    /// Options of the resolved listbox; `None` when the listbox could not be found
    #[serde(default)]
    pub listbox: Option<Vec<RawOption>>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub errors: RawErrors,
}

/// One input-like control in DOM order, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RawControl {
    Text(RawTextInput),
    Select(RawSelect),
    RadioGroup(RawChoiceGroup),
    Combobox(RawCombobox),
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawButton {
    pub selector: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub aria_label: Option<String>,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub disabled: bool,
}

// ============================================================================
// PageDriver - capability interface over the live page
// ============================================================================

/// Everything the form core needs from a browser page. Reads go through the
/// typed queries; writes are plain element interactions addressed by selector.
pub trait PageDriver {
    fn navigate(&mut self, url: &str) -> Result<(), ApplyError>;

    /// Wait up to `timeout_ms` for `selector` to be attached and visible.
    /// A timeout is `Ok(None)`, not an error.
    fn wait_for(&mut self, selector: &str, timeout_ms: u64)
        -> Result<Option<ElementHandle>, ApplyError>;

    /// All elements matching `selector`, optionally scoped to `scope`.
    fn find_all(
        &mut self,
        scope: Option<&ElementHandle>,
        selector: &str,
    ) -> Result<Vec<ElementHandle>, ApplyError>;

    fn step_info(&mut self, container: &ElementHandle) -> Result<RawStepInfo, ApplyError>;

    fn form_controls(&mut self, container: &ElementHandle) -> Result<Vec<RawControl>, ApplyError>;

    fn buttons(&mut self, container: &ElementHandle) -> Result<Vec<RawButton>, ApplyError>;

    fn click(&mut self, locator: &str, timeout_ms: u64) -> Result<(), ApplyError>;

    fn check(&mut self, locator: &str, timeout_ms: u64) -> Result<(), ApplyError>;

    fn fill(&mut self, locator: &str, text: &str) -> Result<(), ApplyError>;

    fn type_text(&mut self, locator: &str, text: &str, per_char_delay_ms: u64)
        -> Result<(), ApplyError>;

    fn select_option(&mut self, locator: &str, value: &str, timeout_ms: u64)
        -> Result<(), ApplyError>;

    fn scroll_into_view(&mut self, locator: &str) -> Result<(), ApplyError>;

    /// Fixed settle delay while the page reacts.
    fn pause(&mut self, ms: u64);
}
