use tracing::{debug, info, warn};

use crate::answer::resolver::AnswerResolver;
use crate::browser::driver::PageDriver;
use crate::error::ApplyError;
use crate::form::form_config::FormConfig;
use crate::form::form_model::{FieldKind, FieldOption, FormField};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOutcome {
    /// New value written to the page
    Filled,
    /// Page already holds the resolved answer, or there is nothing to write
    Unchanged,
    /// Not attempted this iteration
    Skipped,
    /// Every interaction attempt failed; field left as is
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillReport {
    pub attempted: usize,
    pub filled: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl FillReport {
    fn record(&mut self, outcome: FieldOutcome) {
        self.attempted += 1;
        match outcome {
            FieldOutcome::Filled => self.filled += 1,
            FieldOutcome::Unchanged => self.unchanged += 1,
            FieldOutcome::Skipped => self.skipped += 1,
            FieldOutcome::Failed => self.failed += 1,
        }
    }
}

/// Fill every field, or only the errored ones after a rejected advance.
///
/// Interaction failures are contained per field. Answer-source and driver
/// transport errors propagate.
pub fn fill_fields(
    driver: &mut dyn PageDriver,
    resolver: &mut AnswerResolver,
    config: &FormConfig,
    fields: &[FormField],
    only_errored: bool,
) -> Result<FillReport, ApplyError> {
    if only_errored {
        info!("filling only fields with validation errors");
    }

    let mut report = FillReport::default();
    for field in fields.iter().filter(|f| !only_errored || f.has_error()) {
        let outcome = match field.kind {
            FieldKind::Text => fill_text(driver, resolver, config, field)?,
            FieldKind::Select | FieldKind::Radio => fill_choice(driver, resolver, config, field)?,
            FieldKind::Combobox => fill_combobox(driver, resolver, config, field)?,
        };
        debug!(label = %field.label, ?outcome, "field processed");
        report.record(outcome);
    }

    Ok(report)
}

pub fn fill_text(
    driver: &mut dyn PageDriver,
    resolver: &mut AnswerResolver,
    config: &FormConfig,
    field: &FormField,
) -> Result<FieldOutcome, ApplyError> {
    if field.has_error() && field.value.is_empty() {
        info!(
            "'{}' has error '{}' but no value to retry with, skipping",
            field.label,
            field.error.as_deref().unwrap_or("")
        );
        return Ok(FieldOutcome::Skipped);
    }

    let answer = resolver.resolve_text(&field.label, field.error.as_deref())?;
    if answer.is_empty() || answer == field.value {
        return Ok(FieldOutcome::Unchanged);
    }

    let typed = replace_text(driver, config, field, &answer);
    contained(typed, field)
}

fn replace_text(
    driver: &mut dyn PageDriver,
    config: &FormConfig,
    field: &FormField,
    answer: &str,
) -> Result<(), ApplyError> {
    let t = &config.timeouts;
    if !field.value.is_empty() {
        driver.fill(&field.locator, "")?;
        driver.pause(t.clear_pause_ms);
    }
    driver.type_text(&field.locator, answer, t.type_delay_ms)?;
    driver.pause(t.settle_ms);
    Ok(())
}

pub fn fill_choice(
    driver: &mut dyn PageDriver,
    resolver: &mut AnswerResolver,
    config: &FormConfig,
    field: &FormField,
) -> Result<FieldOutcome, ApplyError> {
    if field.options.is_empty() {
        warn!("no options available for '{}'", field.label);
        return Ok(FieldOutcome::Skipped);
    }

    let candidates: Vec<String> = field
        .options
        .iter()
        .filter(|o| !config.is_placeholder(&o.label))
        .map(|o| o.label.clone())
        .collect();

    let answer = resolver.resolve_choice(&field.label, &candidates)?;

    if field
        .selected_option()
        .is_some_and(|o| !config.is_placeholder(&o.label) && same_label(&o.label, &answer))
    {
        return Ok(FieldOutcome::Unchanged);
    }

    let Some(option) = choose_option(config, &field.options, &answer) else {
        return Ok(FieldOutcome::Skipped);
    };
    info!("selecting '{}' for '{}'", option.label, field.label);

    match select_with_fallback(driver, field, option, config.timeouts.click_ms) {
        Some(strategy) => {
            debug!(?strategy, "option selected");
            driver.pause(config.timeouts.settle_ms);
            Ok(FieldOutcome::Filled)
        }
        None => {
            warn!("every selection strategy failed for '{}'", field.label);
            Ok(FieldOutcome::Failed)
        }
    }
}

/// Exact (case-insensitive) label match, else the first real option.
pub fn choose_option<'f>(
    config: &FormConfig,
    options: &'f [FieldOption],
    answer: &str,
) -> Option<&'f FieldOption> {
    options
        .iter()
        .find(|o| same_label(&o.label, answer))
        .or_else(|| options.iter().find(|o| !config.is_placeholder(&o.label)))
        .or_else(|| options.first())
}

pub fn fill_combobox(
    driver: &mut dyn PageDriver,
    resolver: &mut AnswerResolver,
    config: &FormConfig,
    field: &FormField,
) -> Result<FieldOutcome, ApplyError> {
    let answer = resolver.resolve_text(&field.label, None)?;
    if answer.is_empty() || answer == field.value {
        return Ok(FieldOutcome::Unchanged);
    }

    match type_and_pick_first(driver, config, field, &answer) {
        Ok(true) => Ok(FieldOutcome::Filled),
        Ok(false) => {
            warn!("no combobox candidates for '{}'", field.label);
            Ok(FieldOutcome::Failed)
        }
        Err(e) => contained(Err(e), field),
    }
}

/// Type into the combobox and click the first suggestion. `Ok(false)` when
/// no suggestion appeared.
fn type_and_pick_first(
    driver: &mut dyn PageDriver,
    config: &FormConfig,
    field: &FormField,
    answer: &str,
) -> Result<bool, ApplyError> {
    let t = &config.timeouts;
    driver.fill(&field.locator, "")?;
    driver.type_text(&field.locator, answer, t.combobox_type_delay_ms)?;
    driver.pause(t.combobox_populate_ms);

    if driver
        .wait_for(&config.option_list_selector, t.option_wait_ms)?
        .is_none()
    {
        return Ok(false);
    }
    let candidates = driver.find_all(None, &config.option_list_selector)?;
    let Some(first) = candidates.first() else {
        return Ok(false);
    };

    driver.click(first.selector(), t.click_ms)?;
    driver.pause(t.settle_ms);
    Ok(true)
}

// ============================================================================
// Layered option selection
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectStrategy {
    /// `<select>` value selection
    NativeSelect,
    /// Check the radio/checkbox input
    Check,
    /// Click the option element
    ClickOption,
    /// Click the `<label for=...>` of the option
    ClickLabel,
}

pub const SELECT_STRATEGIES: [SelectStrategy; 4] = [
    SelectStrategy::NativeSelect,
    SelectStrategy::Check,
    SelectStrategy::ClickOption,
    SelectStrategy::ClickLabel,
];

impl SelectStrategy {
    /// Target of this strategy, or `None` when it cannot apply.
    fn target(self, field: &FormField, option: &FieldOption) -> Option<String> {
        match self {
            SelectStrategy::NativeSelect => option
                .value
                .as_ref()
                .filter(|_| field.kind == FieldKind::Select)
                .map(|_| field.locator.clone()),
            SelectStrategy::Check | SelectStrategy::ClickOption => option.locator.clone(),
            SelectStrategy::ClickLabel => option
                .locator
                .as_deref()
                .and_then(|l| l.strip_prefix('#'))
                .map(|id| format!(r#"label[for="{}"]"#, id)),
        }
    }

    fn attempt(
        self,
        driver: &mut dyn PageDriver,
        target: &str,
        option: &FieldOption,
        timeout_ms: u64,
    ) -> Result<(), ApplyError> {
        match self {
            SelectStrategy::NativeSelect => {
                driver.select_option(target, option.value.as_deref().unwrap_or(""), timeout_ms)
            }
            SelectStrategy::Check => driver.check(target, timeout_ms),
            SelectStrategy::ClickOption | SelectStrategy::ClickLabel => {
                driver.click(target, timeout_ms)
            }
        }
    }
}

/// Try each strategy in order until one succeeds. Returns the strategy that
/// worked, or `None` when all failed.
pub fn select_with_fallback(
    driver: &mut dyn PageDriver,
    field: &FormField,
    option: &FieldOption,
    timeout_ms: u64,
) -> Option<SelectStrategy> {
    for strategy in SELECT_STRATEGIES {
        let Some(target) = strategy.target(field, option) else {
            continue;
        };

        match strategy.attempt(driver, &target, option, timeout_ms) {
            Ok(()) => return Some(strategy),
            Err(e) => debug!(?strategy, "selection attempt on {} failed: {}", target, e),
        }
    }
    None
}

fn same_label(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Keep page-level interaction failures inside the field; anything else
/// (transport, protocol) still aborts the attempt.
fn contained(result: Result<(), ApplyError>, field: &FormField) -> Result<FieldOutcome, ApplyError> {
    match result {
        Ok(()) => Ok(FieldOutcome::Filled),
        Err(e @ ApplyError::Interaction { .. }) => {
            warn!("could not fill '{}': {}", field.label, e);
            Ok(FieldOutcome::Failed)
        }
        Err(e) => Err(e),
    }
}
