use tracing::debug;

use crate::browser::driver::{
    ElementHandle, PageDriver, RawChoiceGroup, RawCombobox, RawControl, RawErrors, RawLabel,
    RawOption, RawSelect, RawStepInfo, RawTextInput,
};
use crate::error::ApplyError;
use crate::form::form_model::{FieldKind, FieldOption, FormField, FormSnapshot, MAX_OPTIONS};

/// Capture the current step of the form inside `container`. Read-only.
pub fn extract_snapshot(
    driver: &mut dyn PageDriver,
    container: &ElementHandle,
) -> Result<FormSnapshot, ApplyError> {
    let info = driver.step_info(container)?;
    let controls = driver.form_controls(container)?;
    Ok(build_snapshot(info, controls))
}

/// Assemble a snapshot from raw query records. Hidden and unsupported
/// controls are dropped; everything else keeps DOM order.
pub fn build_snapshot(info: RawStepInfo, controls: Vec<RawControl>) -> FormSnapshot {
    let fields = controls
        .into_iter()
        .filter_map(|control| match control {
            RawControl::Text(raw) => text_field(raw),
            RawControl::Select(raw) => select_field(raw),
            RawControl::RadioGroup(raw) => radio_field(raw),
            RawControl::Combobox(raw) => combobox_field(raw),
            RawControl::Unsupported => {
                debug!("skipping unsupported control");
                None
            }
        })
        .collect();

    FormSnapshot {
        step_id: info.id.trim().to_string(),
        header: info.header.trim().to_string(),
        progress: clean(info.progress.as_deref()),
        fields,
    }
}

pub fn text_field(raw: RawTextInput) -> Option<FormField> {
    if raw.hidden {
        return None;
    }

    Some(FormField {
        kind: FieldKind::Text,
        label: resolve_label(&raw.label),
        locator: raw.selector,
        value: raw.value,
        options: vec![],
        error: resolve_error(&raw.errors),
    })
}

pub fn select_field(raw: RawSelect) -> Option<FormField> {
    if raw.hidden {
        return None;
    }

    let options: Vec<FieldOption> = raw
        .options
        .into_iter()
        .map(|opt| FieldOption {
            label: clean(opt.label.as_deref()).unwrap_or_default(),
            locator: opt.selector,
            value: opt.value,
            is_selected: opt.selected,
        })
        .collect();

    // Taken before truncation so a selection past the cap still counts
    let value = selected_value(&options);

    Some(FormField {
        kind: FieldKind::Select,
        label: resolve_label(&raw.label),
        locator: raw.selector,
        value,
        options: truncate(options),
        error: resolve_error(&raw.errors),
    })
}

pub fn radio_field(raw: RawChoiceGroup) -> Option<FormField> {
    if raw.hidden {
        return None;
    }

    let options: Vec<FieldOption> = raw
        .options
        .into_iter()
        .enumerate()
        .map(|(idx, opt)| FieldOption {
            label: radio_option_label(&opt, idx),
            locator: opt.selector,
            value: opt.value,
            is_selected: opt.selected,
        })
        .collect();

    let value = selected_value(&options);

    Some(FormField {
        kind: FieldKind::Radio,
        label: resolve_label(&raw.label),
        locator: raw.selector,
        value,
        options: truncate(options),
        error: resolve_error(&raw.errors),
    })
}

pub fn combobox_field(raw: RawCombobox) -> Option<FormField> {
    if raw.hidden {
        return None;
    }

    // An unresolvable listbox is an empty candidate list
    let options = raw
        .listbox
        .unwrap_or_default()
        .into_iter()
        .map(|opt| FieldOption {
            label: clean(opt.label.as_deref()).unwrap_or_default(),
            locator: opt.selector,
            value: opt.value,
            is_selected: opt.selected,
        })
        .collect();

    Some(FormField {
        kind: FieldKind::Combobox,
        label: resolve_label(&raw.label),
        locator: raw.selector,
        value: raw.value,
        options,
        error: resolve_error(&raw.errors),
    })
}

/// Explicit label text wins over the accessible-name fallback.
pub fn resolve_label(label: &RawLabel) -> String {
    clean(label.visible.as_deref())
        .or_else(|| clean(label.text.as_deref()))
        .or_else(|| clean(label.aria.as_deref()))
        .unwrap_or_default()
}

/// ARIA-linked message first, then the field-group message.
pub fn resolve_error(errors: &RawErrors) -> Option<String> {
    clean(errors.described.as_deref()).or_else(|| clean(errors.group.as_deref()))
}

fn radio_option_label(opt: &RawOption, idx: usize) -> String {
    clean(opt.label.as_deref())
        .or_else(|| clean(opt.value.as_deref()))
        .unwrap_or_else(|| format!("Option {}", idx + 1))
}

fn selected_value(options: &[FieldOption]) -> String {
    options
        .iter()
        .find(|o| o.is_selected)
        .and_then(|o| o.value.clone())
        .unwrap_or_default()
}

fn truncate(mut options: Vec<FieldOption>) -> Vec<FieldOption> {
    options.truncate(MAX_OPTIONS);
    options
}

fn clean(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
}
