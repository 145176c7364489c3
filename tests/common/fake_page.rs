use std::collections::HashSet;

use job_applier::browser::driver::{
    ElementHandle, PageDriver, RawButton, RawChoiceGroup, RawControl, RawErrors, RawLabel,
    RawOption, RawSelect, RawStepInfo, RawTextInput,
};
use job_applier::error::ApplyError;
use job_applier::form::form_config::FormConfig;

pub const CONTAINER: &str = "#modal";
pub const CONFIRMATION: &str = "#confirm";
pub const APPLY_BUTTON: &str = "#apply";

/// One scripted form step.
#[derive(Debug, Clone, Default)]
pub struct FakeStep {
    pub info: RawStepInfo,
    pub controls: Vec<RawControl>,
    pub buttons: Vec<RawButton>,
    /// Clicking the advance button does nothing (form rejected the step)
    pub stays: bool,
}

impl FakeStep {
    pub fn new(header: &str) -> Self {
        FakeStep {
            info: RawStepInfo {
                id: format!("step-{}", header.to_lowercase().replace(' ', "-")),
                header: header.to_string(),
                progress: None,
            },
            controls: vec![],
            buttons: vec![button("#next", "Next"), close_button()],
            stays: false,
        }
    }

    pub fn with_progress(mut self, progress: &str) -> Self {
        self.info.progress = Some(progress.to_string());
        self
    }

    pub fn with_control(mut self, control: RawControl) -> Self {
        self.controls.push(control);
        self
    }

    pub fn with_buttons(mut self, buttons: Vec<RawButton>) -> Self {
        self.buttons = buttons;
        self
    }

    pub fn stuck(mut self) -> Self {
        self.stays = true;
        self
    }
}

/// In-memory page that plays back a scripted multi-step dialog and records
/// every interaction.
#[derive(Debug, Default)]
pub struct FakePage {
    pub steps: Vec<FakeStep>,
    pub current: usize,
    pub form_open: bool,
    pub has_apply_button: bool,
    /// Buttons of the discard confirmation shown after closing; `None` means
    /// closing needs no confirmation
    pub confirmation: Option<Vec<RawButton>>,
    pub confirmation_open: bool,
    /// Options that appear under a combobox after typing
    pub suggestions: Vec<String>,
    /// Locators whose interactions fail with a page-level error
    pub failing: HashSet<String>,
    /// Every query fails with a transport error
    pub broken: bool,
    pub actions: Vec<String>,
}

impl FakePage {
    /// Dialog already open on its first step.
    pub fn with_steps(steps: Vec<FakeStep>) -> Self {
        FakePage {
            steps,
            form_open: true,
            ..FakePage::default()
        }
    }

    /// Job page showing an apply button that opens the dialog.
    pub fn job_page(steps: Vec<FakeStep>) -> Self {
        FakePage {
            steps,
            has_apply_button: true,
            ..FakePage::default()
        }
    }

    pub fn with_confirmation(mut self) -> Self {
        self.confirmation = Some(vec![
            button("#confirm-save", "Save"),
            button("#confirm-discard", "Discard"),
        ]);
        self
    }

    pub fn failing_on(mut self, locator: &str) -> Self {
        self.failing.insert(locator.to_string());
        self
    }

    pub fn clicks(&self) -> Vec<&str> {
        self.actions
            .iter()
            .filter_map(|a| a.strip_prefix("click:"))
            .collect()
    }

    pub fn count(&self, action: &str) -> usize {
        self.actions.iter().filter(|a| *a == action).count()
    }

    fn step(&self) -> Option<&FakeStep> {
        if self.form_open {
            self.steps.get(self.current)
        } else {
            None
        }
    }

    fn transport(&self) -> Result<(), ApplyError> {
        if self.broken {
            Err(ApplyError::SessionIO("browser server went away".into()))
        } else {
            Ok(())
        }
    }

    fn interact(&mut self, action: &str, locator: &str, detail: Option<&str>) -> Result<(), ApplyError> {
        self.transport()?;
        let entry = match detail {
            Some(d) => format!("{}:{}={}", action, locator, d),
            None => format!("{}:{}", action, locator),
        };
        self.actions.push(entry);

        if self.failing.contains(locator) {
            return Err(ApplyError::Interaction {
                action: action.to_string(),
                locator: locator.to_string(),
                error: "element is not visible".into(),
            });
        }
        Ok(())
    }
}

impl PageDriver for FakePage {
    fn navigate(&mut self, url: &str) -> Result<(), ApplyError> {
        self.transport()?;
        self.actions.push(format!("navigate:{}", url));
        Ok(())
    }

    fn wait_for(&mut self, selector: &str, _timeout_ms: u64) -> Result<Option<ElementHandle>, ApplyError> {
        self.transport()?;
        let visible = match selector {
            CONTAINER => self.step().is_some(),
            CONFIRMATION => self.confirmation_open,
            APPLY_BUTTON => self.has_apply_button,
            "[role=\"option\"]" => !self.suggestions.is_empty(),
            _ => false,
        };
        Ok(visible.then(|| ElementHandle::new(selector)))
    }

    fn find_all(&mut self, _scope: Option<&ElementHandle>, selector: &str) -> Result<Vec<ElementHandle>, ApplyError> {
        self.transport()?;
        Ok(match selector {
            CONTAINER if self.step().is_some() => vec![ElementHandle::new(CONTAINER)],
            "[role=\"option\"]" => (0..self.suggestions.len())
                .map(|i| ElementHandle::new(format!("#suggestion-{}", i)))
                .collect(),
            _ => vec![],
        })
    }

    fn step_info(&mut self, _container: &ElementHandle) -> Result<RawStepInfo, ApplyError> {
        self.transport()?;
        Ok(self.step().map(|s| s.info.clone()).unwrap_or_default())
    }

    fn form_controls(&mut self, _container: &ElementHandle) -> Result<Vec<RawControl>, ApplyError> {
        self.transport()?;
        Ok(self.step().map(|s| s.controls.clone()).unwrap_or_default())
    }

    fn buttons(&mut self, container: &ElementHandle) -> Result<Vec<RawButton>, ApplyError> {
        self.transport()?;
        if container.selector() == CONFIRMATION {
            return Ok(self.confirmation.clone().unwrap_or_default());
        }
        Ok(self.step().map(|s| s.buttons.clone()).unwrap_or_default())
    }

    fn click(&mut self, locator: &str, _timeout_ms: u64) -> Result<(), ApplyError> {
        self.interact("click", locator, None)?;

        if locator == APPLY_BUTTON {
            self.form_open = true;
            return Ok(());
        }
        if self.confirmation_open && locator.starts_with("#confirm-") {
            self.confirmation_open = false;
            return Ok(());
        }

        let Some(step) = self.step() else {
            return Ok(());
        };
        let is_close = step.buttons.iter().any(|b| {
            b.selector == locator && b.aria_label.as_deref() == Some("Dismiss")
        });
        let stays = step.stays;

        if is_close {
            self.form_open = false;
            self.confirmation_open = self.confirmation.is_some();
        } else if locator == "#next" && !stays {
            self.current += 1;
        }
        Ok(())
    }

    fn check(&mut self, locator: &str, _timeout_ms: u64) -> Result<(), ApplyError> {
        self.interact("check", locator, None)
    }

    fn fill(&mut self, locator: &str, text: &str) -> Result<(), ApplyError> {
        self.interact("fill", locator, Some(text))
    }

    fn type_text(&mut self, locator: &str, text: &str, _per_char_delay_ms: u64) -> Result<(), ApplyError> {
        self.interact("type", locator, Some(text))
    }

    fn select_option(&mut self, locator: &str, value: &str, _timeout_ms: u64) -> Result<(), ApplyError> {
        self.interact("select", locator, Some(value))
    }

    fn scroll_into_view(&mut self, locator: &str) -> Result<(), ApplyError> {
        self.transport()?;
        self.actions.push(format!("scroll:{}", locator));
        Ok(())
    }

    fn pause(&mut self, _ms: u64) {}
}

// ============================================================================
// Builders
// ============================================================================

/// Form config wired to the fake page's selectors.
pub fn fake_config() -> FormConfig {
    FormConfig {
        container_selector: CONTAINER.to_string(),
        confirmation_selector: CONFIRMATION.to_string(),
        apply_button_selector: APPLY_BUTTON.to_string(),
        ..FormConfig::default()
    }
}

pub fn button(selector: &str, text: &str) -> RawButton {
    RawButton {
        selector: selector.to_string(),
        text: text.to_string(),
        ..RawButton::default()
    }
}

pub fn close_button() -> RawButton {
    RawButton {
        selector: "#close".to_string(),
        text: String::new(),
        aria_label: Some("Dismiss".to_string()),
        class_name: Some("artdeco-modal__dismiss".to_string()),
        disabled: false,
    }
}

pub fn label(text: &str) -> RawLabel {
    RawLabel {
        visible: Some(text.to_string()),
        ..RawLabel::default()
    }
}

pub fn error(message: &str) -> RawErrors {
    RawErrors {
        described: Some(message.to_string()),
        group: None,
    }
}

pub fn text_input(selector: &str, text: &str, value: &str) -> RawTextInput {
    RawTextInput {
        selector: selector.to_string(),
        label: label(text),
        value: value.to_string(),
        ..RawTextInput::default()
    }
}

pub fn text_control(selector: &str, text: &str, value: &str) -> RawControl {
    RawControl::Text(text_input(selector, text, value))
}

pub fn errored_text_control(selector: &str, text: &str, value: &str, message: &str) -> RawControl {
    RawControl::Text(RawTextInput {
        errors: error(message),
        ..text_input(selector, text, value)
    })
}

pub fn option(label: &str, value: &str, selected: bool) -> RawOption {
    RawOption {
        label: Some(label.to_string()),
        selector: None,
        value: Some(value.to_string()),
        selected,
    }
}

pub fn select_control(selector: &str, text: &str, options: &[(&str, &str)], selected: Option<&str>) -> RawControl {
    RawControl::Select(RawSelect {
        selector: selector.to_string(),
        label: label(text),
        options: options
            .iter()
            .map(|(l, v)| option(l, v, selected == Some(*v)))
            .collect(),
        ..RawSelect::default()
    })
}

pub fn radio_control(selector: &str, text: &str, options: &[(&str, &str)]) -> RawControl {
    RawControl::RadioGroup(RawChoiceGroup {
        selector: selector.to_string(),
        label: label(text),
        options: options
            .iter()
            .map(|(l, id)| RawOption {
                label: Some(l.to_string()),
                selector: Some(format!("#{}", id)),
                value: Some(l.to_string()),
                selected: false,
            })
            .collect(),
        ..RawChoiceGroup::default()
    })
}
