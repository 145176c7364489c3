use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::form::form_model::{FormSnapshot, FormState};

#[derive(Debug, Serialize)]
pub struct StepTraceEvent {
    pub timestamp_ms: u128,
    pub job: Option<String>,
    pub step: u32,

    pub state: FormState,

    pub header: Option<String>,
    pub progress: Option<String>,
    pub fingerprint: Option<String>,
    pub field_count: Option<usize>,
    pub errored_fields: Option<usize>,

    pub decision: Option<String>,
    pub reason: Option<String>,
}

impl StepTraceEvent {
    pub fn now(step: u32, state: FormState) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            job: None,
            step,
            state,
            header: None,
            progress: None,
            fingerprint: None,
            field_count: None,
            errored_fields: None,
            decision: None,
            reason: None,
        }
    }

    pub fn with_job(mut self, job: Option<&str>) -> Self {
        self.job = job.map(|j| j.to_string());
        self
    }

    pub fn with_snapshot(mut self, snapshot: &FormSnapshot) -> Self {
        self.header = Some(snapshot.header.clone());
        self.progress = snapshot.progress.clone();
        self.fingerprint = Some(snapshot.fingerprint().to_string());
        self.field_count = Some(snapshot.fields.len());
        self.errored_fields = Some(snapshot.errored_count());
        self
    }

    pub fn with_decision(mut self, decision: impl ToString) -> Self {
        self.decision = Some(decision.to_string());
        self
    }

    pub fn with_reason(mut self, reason: impl ToString) -> Self {
        self.reason = Some(reason.to_string());
        self
    }
}
