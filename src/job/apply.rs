use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::{
    answer::resolver::AnswerResolver,
    browser::driver::PageDriver,
    error::ApplyError,
    form::{
        engine::{FormEngine, dismiss},
        form_config::FormConfig,
        form_model::ApplyOutcome,
    },
    job::run_log::{RunLog, RunMeta},
    trace::logger::TraceLogger,
};

pub const REASON_NO_APPLY_BUTTON: &str = "Easy Apply button not found";

/// One job posting to apply to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobTarget {
    pub url: String,
}

impl JobTarget {
    pub fn new(url: impl Into<String>) -> Self {
        JobTarget { url: url.into() }
    }
}

/// Job URLs from a text file, one per line. Blank lines and `#` comments are
/// ignored.
pub fn load_job_file(path: &Path) -> Result<Vec<JobTarget>, ApplyError> {
    let content = fs::read_to_string(path).map_err(|e| ApplyError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(JobTarget::new)
        .collect())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub applied: usize,
    pub failed: usize,
}

/// Open the quick-apply dialog for `job` and run the form to completion.
///
/// Never returns an error: anything that escapes the form engine is turned
/// into a failed outcome carrying the error text, after the dialog (if still
/// open) has been dismissed.
pub fn apply_to_job(
    driver: &mut dyn PageDriver,
    resolver: &mut AnswerResolver,
    config: &FormConfig,
    tracer: &TraceLogger,
    job: &JobTarget,
) -> ApplyOutcome {
    match try_apply(driver, resolver, config, tracer, job) {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!("application to {} aborted: {}", job.url, e);
            let container = driver
                .find_all(None, &config.container_selector)
                .ok()
                .and_then(|found| found.into_iter().next());
            if container.is_some() {
                dismiss(driver, config, container.as_ref(), None);
            }
            ApplyOutcome::failed(e.to_string())
        }
    }
}

fn try_apply(
    driver: &mut dyn PageDriver,
    resolver: &mut AnswerResolver,
    config: &FormConfig,
    tracer: &TraceLogger,
    job: &JobTarget,
) -> Result<ApplyOutcome, ApplyError> {
    let t = &config.timeouts;

    driver.navigate(&job.url)?;
    let Some(button) = driver.wait_for(&config.apply_button_selector, t.step_wait_ms)? else {
        info!("no quick-apply button on {}", job.url);
        return Ok(ApplyOutcome::failed(REASON_NO_APPLY_BUTTON));
    };

    driver.click(button.selector(), t.click_ms)?;
    driver.pause(t.settle_ms);

    FormEngine::new(config, tracer)
        .with_job(&job.url)
        .run(driver, resolver)
}

/// Apply to every job in order, recording each outcome in `run_log`.
pub fn apply_to_jobs(
    driver: &mut dyn PageDriver,
    resolver: &mut AnswerResolver,
    config: &FormConfig,
    tracer: &TraceLogger,
    jobs: &[JobTarget],
    run: &RunMeta,
    run_log: &mut RunLog,
) -> RunSummary {
    let mut summary = RunSummary::default();

    for (i, job) in jobs.iter().enumerate() {
        info!("[{}/{}] applying to {}", i + 1, jobs.len(), job.url);
        let outcome = apply_to_job(driver, resolver, config, tracer, job);
        info!("[{}/{}] {}", i + 1, jobs.len(), outcome);

        summary.total += 1;
        if outcome.success {
            summary.applied += 1;
        } else {
            summary.failed += 1;
        }
        run_log.record(run, &outcome);
    }

    summary
}
