use tracing::warn;

use crate::browser::driver::{ElementHandle, PageDriver, RawButton};
use crate::form::form_model::{ButtonRole, StepButton, StepControls};

const ADVANCE_KEYWORDS: &[&str] = &["next", "review", "submit", "continue", "done"];
const BACK_KEYWORDS: &[&str] = &["back", "previous"];
const SAVE_KEYWORDS: &[&str] = &["save"];
const DISCARD_KEYWORDS: &[&str] = &["discard"];
const CLOSE_KEYWORDS: &[&str] = &["close", "dismiss", "cancel"];

/// Classify the buttons of `container`. Driver failures yield empty controls.
pub fn extract_step_controls(
    driver: &mut dyn PageDriver,
    container: &ElementHandle,
) -> StepControls {
    match driver.buttons(container) {
        Ok(buttons) => build_controls(&buttons),
        Err(e) => {
            warn!("could not read buttons of {}: {}", container.selector(), e);
            StepControls::default()
        }
    }
}

/// First button per role wins; later duplicates and unclassified buttons land
/// in `others`. Disabled buttons keep their role.
pub fn build_controls(buttons: &[RawButton]) -> StepControls {
    let mut controls = StepControls::default();

    for raw in buttons {
        let role = classify_button(&raw.text, raw.aria_label.as_deref(), raw.class_name.as_deref());

        let button = StepButton {
            label: button_label(raw, role),
            locator: raw.selector.clone(),
            role,
            disabled: raw.disabled,
        };

        let slot = match role {
            ButtonRole::Advance => &mut controls.advance,
            ButtonRole::Back => &mut controls.back,
            ButtonRole::Save => &mut controls.save,
            ButtonRole::Discard => &mut controls.discard,
            ButtonRole::Close => &mut controls.close,
            ButtonRole::Other => {
                controls.others.push(button);
                continue;
            }
        };

        if slot.is_none() {
            *slot = Some(button);
        } else {
            controls.others.push(button);
        }
    }

    controls
}

/// Case-insensitive substring match in priority order:
/// advance > back > save > discard > close.
pub fn classify_button(text: &str, aria_label: Option<&str>, class_name: Option<&str>) -> ButtonRole {
    let text = text.trim().to_lowercase();
    let aria = aria_label.unwrap_or("").trim().to_lowercase();
    let class = class_name.unwrap_or("").to_lowercase();

    // Icon-only buttons carry their meaning in aria-label
    let label = if text.is_empty() { aria.as_str() } else { text.as_str() };

    if contains_any(label, ADVANCE_KEYWORDS) {
        ButtonRole::Advance
    } else if contains_any(label, BACK_KEYWORDS) {
        ButtonRole::Back
    } else if contains_any(label, SAVE_KEYWORDS) {
        ButtonRole::Save
    } else if contains_any(label, DISCARD_KEYWORDS) {
        ButtonRole::Discard
    } else if contains_any(&text, CLOSE_KEYWORDS)
        || contains_any(&aria, CLOSE_KEYWORDS)
        || contains_any(&class, CLOSE_KEYWORDS)
    {
        ButtonRole::Close
    } else {
        ButtonRole::Other
    }
}

fn contains_any(haystack: &str, keywords: &[&str]) -> bool {
    !haystack.is_empty() && keywords.iter().any(|k| haystack.contains(k))
}

fn button_label(raw: &RawButton, role: ButtonRole) -> String {
    let text = raw.text.trim();
    let aria = raw.aria_label.as_deref().unwrap_or("").trim();

    if role == ButtonRole::Close && !aria.is_empty() {
        return aria.to_string();
    }
    if text.is_empty() {
        aria.to_string()
    } else {
        text.to_string()
    }
}
