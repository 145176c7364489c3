use tracing::{debug, info, warn};

use crate::{
    answer::resolver::AnswerResolver,
    browser::driver::{ElementHandle, PageDriver},
    error::ApplyError,
    form::{
        controls::extract_step_controls,
        extractor::extract_snapshot,
        filler::fill_fields,
        form_config::FormConfig,
        form_model::{
            ApplyOutcome, Fingerprint, FormState, REASON_APPLIED, REASON_FINISHED,
            REASON_NO_NEXT, REASON_STEP_LIMIT, REASON_STUCK, StepControls,
        },
    },
    trace::{logger::TraceLogger, trace::StepTraceEvent},
};

/// Drives one multi-step application form to a terminal state.
///
/// Each iteration waits for the step container, snapshots it, compares the
/// snapshot fingerprint with the previous iteration's, fills fields and
/// clicks the advance control. Only the previous fingerprint survives
/// between iterations.
pub struct FormEngine<'c> {
    pub state: FormState,
    /// Number of advance clicks performed so far
    pub step: u32,
    config: &'c FormConfig,
    tracer: &'c TraceLogger,
    job: Option<String>,
    previous: Option<Fingerprint>,
}

impl<'c> FormEngine<'c> {
    pub fn new(config: &'c FormConfig, tracer: &'c TraceLogger) -> Self {
        FormEngine {
            state: FormState::AwaitingStep,
            step: 0,
            config,
            tracer,
            job: None,
            previous: None,
        }
    }

    pub fn with_job(mut self, job: &str) -> Self {
        self.job = Some(job.to_string());
        self
    }

    /// Run until APPLIED, DISMISSED, STUCK or ABORTED.
    ///
    /// Structural dead ends come back as a failed `ApplyOutcome` after the
    /// dialog was dismissed. Driver and answer-source errors are returned
    /// as `Err` and left to the caller.
    pub fn run(
        &mut self,
        driver: &mut dyn PageDriver,
        resolver: &mut AnswerResolver,
    ) -> Result<ApplyOutcome, ApplyError> {
        let config = self.config;
        let t = &config.timeouts;

        loop {
            self.state = FormState::AwaitingStep;
            let Some(container) = driver.wait_for(&config.container_selector, t.step_wait_ms)?
            else {
                // The modal closing after the last step is the normal success signal
                return Ok(self.finish(FormState::Applied, ApplyOutcome::applied(REASON_FINISHED)));
            };

            self.state = FormState::Extracting;
            let snapshot = extract_snapshot(driver, &container)?;
            let controls = extract_step_controls(driver, &container);
            let fingerprint = snapshot.fingerprint();
            info!(
                "step {}: header '{}', progress {}, {} fields",
                self.step,
                snapshot.header,
                snapshot.progress.as_deref().unwrap_or("-"),
                snapshot.fields.len()
            );
            self.trace(
                StepTraceEvent::now(self.step, self.state)
                    .with_snapshot(&snapshot)
                    .with_decision("extracted"),
            );

            if config.is_terminal_header(&snapshot.header) {
                close_dialog(driver, config, &controls);
                return Ok(self.finish(FormState::Applied, ApplyOutcome::applied(REASON_APPLIED)));
            }

            if self.previous.as_ref() == Some(&fingerprint) {
                warn!("form state unchanged since previous step, dismissing");
                dismiss(driver, config, Some(&container), Some(&controls));
                return Ok(self.finish(FormState::Stuck, ApplyOutcome::failed(REASON_STUCK)));
            }

            if config.max_steps.is_some_and(|max| self.step >= max) {
                warn!("step limit of {} reached, dismissing", self.step);
                dismiss(driver, config, Some(&container), Some(&controls));
                return Ok(self.finish(FormState::Aborted, ApplyOutcome::failed(REASON_STEP_LIMIT)));
            }

            self.state = FormState::Filling;
            let only_errored = snapshot.has_errors();
            let report = fill_fields(driver, resolver, config, &snapshot.fields, only_errored)?;
            self.trace(
                StepTraceEvent::now(self.step, self.state).with_decision(format!(
                    "filled {} of {} (failed {})",
                    report.filled, report.attempted, report.failed
                )),
            );

            self.state = FormState::Advancing;
            let Some(advance) = &controls.advance else {
                warn!("no advance control on this step, dismissing");
                dismiss(driver, config, Some(&container), Some(&controls));
                return Ok(self.finish(FormState::Dismissed, ApplyOutcome::failed(REASON_NO_NEXT)));
            };

            if advance.disabled {
                debug!("'{}' was disabled before filling, clicking anyway", advance.label);
            }
            driver.pause(t.pre_advance_ms);
            if let Err(e) = driver.scroll_into_view(&advance.locator) {
                debug!("could not scroll '{}' into view: {}", advance.label, e);
            }
            driver.pause(t.settle_ms);
            info!("clicking '{}'", advance.label);
            driver.click(&advance.locator, t.click_ms)?;
            driver.pause(t.settle_ms);

            self.trace(
                StepTraceEvent::now(self.step, self.state).with_decision(format!("clicked {}", advance.label)),
            );
            self.previous = Some(fingerprint);
            self.step += 1;
        }
    }

    fn finish(&mut self, state: FormState, outcome: ApplyOutcome) -> ApplyOutcome {
        self.state = state;
        info!("application form ended in {:?}: {}", state, outcome.reason);
        self.trace(
            StepTraceEvent::now(self.step, state)
                .with_decision(if outcome.success { "success" } else { "failure" })
                .with_reason(&outcome.reason),
        );
        outcome
    }

    fn trace(&self, event: StepTraceEvent) {
        self.tracer.log(&event.with_job(self.job.as_deref()));
    }
}

/// Run one application form with a fresh engine.
pub fn run_application_form(
    driver: &mut dyn PageDriver,
    resolver: &mut AnswerResolver,
    config: &FormConfig,
    tracer: &TraceLogger,
) -> Result<ApplyOutcome, ApplyError> {
    FormEngine::new(config, tracer).run(driver, resolver)
}

// ============================================================================
// Dismiss sub-protocol
// ============================================================================

/// Close the dialog, confirming the discard prompt if one appears.
///
/// Never fails: a missing close control or a failed click is logged and the
/// caller moves on. Controls are re-read from `container` when not given.
pub fn dismiss(
    driver: &mut dyn PageDriver,
    config: &FormConfig,
    container: Option<&ElementHandle>,
    controls: Option<&StepControls>,
) {
    let t = &config.timeouts;

    let fetched;
    let controls = match (controls, container) {
        (Some(c), _) => c,
        (None, Some(container)) => {
            fetched = extract_step_controls(driver, container);
            &fetched
        }
        (None, None) => {
            warn!("no dialog to dismiss");
            return;
        }
    };

    let Some(close) = &controls.close else {
        warn!("no close control found, leaving dialog as is");
        return;
    };

    if let Err(e) = driver.click(&close.locator, t.click_ms) {
        warn!("could not click '{}': {}", close.label, e);
        return;
    }

    match driver.wait_for(&config.confirmation_selector, t.confirm_wait_ms) {
        Ok(Some(dialog)) => {
            let confirmation = extract_step_controls(driver, &dialog);
            match confirmation.discard.as_ref().or(confirmation.close.as_ref()) {
                Some(button) => {
                    if let Err(e) = driver.click(&button.locator, t.click_ms) {
                        warn!("could not confirm dismissal via '{}': {}", button.label, e);
                    }
                }
                None => warn!("confirmation dialog has no discard or close control"),
            }
        }
        Ok(None) => debug!("no confirmation dialog appeared"),
        Err(e) => warn!("confirmation dialog check failed: {}", e),
    }
}

/// Close the success dialog after the final step. Best effort.
fn close_dialog(driver: &mut dyn PageDriver, config: &FormConfig, controls: &StepControls) {
    if let Some(close) = &controls.close {
        if let Err(e) = driver.click(&close.locator, config.timeouts.click_ms) {
            debug!("could not close success dialog: {}", e);
        }
    }
}
