use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ApplyError;
use crate::form::form_model::ApplyOutcome;

/// Runs older than this are dropped when the log is loaded.
pub const MAX_RUNS: usize = 10;

/// Identity of one batch of applications.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunMeta {
    pub id: String,
    pub keywords: String,
    pub location: String,
}

impl RunMeta {
    /// Run id derived from the search terms, so repeated searches share an entry.
    pub fn new(keywords: &str, location: &str) -> Self {
        RunMeta {
            id: format!("{}@{}", keywords.trim(), location.trim()),
            keywords: keywords.trim().to_string(),
            location: location.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RunEntry {
    pub id: String,
    #[serde(default)]
    pub keywords: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub started_at: u64,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub applied: u32,
    #[serde(default)]
    pub skipped: u32,
    #[serde(default)]
    pub last_status: String,
    #[serde(default)]
    pub last_applied_at: Option<u64>,
    /// Failure reasons, bucketed
    #[serde(default)]
    pub status_counts: BTreeMap<String, u32>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RunData {
    #[serde(default)]
    job_applications: Vec<RunEntry>,
}

/// Per-run application counters, persisted as JSON.
#[derive(Debug, Default)]
pub struct RunLog {
    path: Option<PathBuf>,
    data: RunData,
}

impl RunLog {
    pub fn in_memory() -> Self {
        RunLog::default()
    }

    /// Load the log at `path`, keeping only the most recent runs.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let mut data = match load_data(&path) {
            Ok(data) => data,
            Err(e) => {
                warn!("failed to load run log: {}", e);
                RunData::default()
            }
        };
        data.job_applications.truncate(MAX_RUNS);
        debug!("run log loaded with {} runs", data.job_applications.len());

        RunLog {
            path: Some(path),
            data,
        }
    }

    pub fn runs(&self) -> &[RunEntry] {
        &self.data.job_applications
    }

    pub fn run(&self, id: &str) -> Option<&RunEntry> {
        self.data.job_applications.iter().find(|r| r.id == id)
    }

    /// Count one application outcome against `run`, creating the entry at
    /// the front if it is new. Persist failures are logged only.
    pub fn record(&mut self, run: &RunMeta, outcome: &ApplyOutcome) {
        let now = now_ms();
        let runs = &mut self.data.job_applications;

        let idx = match runs.iter().position(|r| r.id == run.id) {
            Some(idx) => idx,
            None => {
                runs.insert(
                    0,
                    RunEntry {
                        id: run.id.clone(),
                        keywords: run.keywords.clone(),
                        location: run.location.clone(),
                        started_at: now,
                        ..RunEntry::default()
                    },
                );
                0
            }
        };

        let entry = &mut runs[idx];
        entry.total += 1;
        if outcome.success {
            entry.applied += 1;
            entry.last_applied_at = Some(now);
        } else {
            entry.skipped += 1;
            *entry
                .status_counts
                .entry(status_bucket(&outcome.reason))
                .or_insert(0) += 1;
        }
        entry.last_status = outcome.reason.clone();

        if let Err(e) = self.save() {
            warn!("failed to save run log: {}", e);
        }
    }

    fn save(&self) -> Result<(), ApplyError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let json = serde_json::to_string_pretty(&self.data).map_err(|e| {
            ApplyError::JsonSerialize {
                context: "run log".into(),
                source: e,
            }
        })?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ApplyError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        fs::write(path, json).map_err(|e| ApplyError::Io {
            path: path.clone(),
            source: e,
        })
    }
}

/// Tally key for a failure reason. Timeouts and errors share one bucket so
/// that free-form error text does not explode the tally.
pub fn status_bucket(reason: &str) -> String {
    let lower = reason.to_lowercase();
    if lower.contains("timeout") || lower.contains("timed out") || lower.contains("error") {
        "Error".to_string()
    } else if reason.trim().is_empty() {
        "Unknown".to_string()
    } else {
        reason.trim().to_string()
    }
}

fn load_data(path: &Path) -> Result<RunData, ApplyError> {
    if !path.exists() {
        return Ok(RunData::default());
    }

    let content = fs::read_to_string(path).map_err(|e| ApplyError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    serde_json::from_str(&content).map_err(|e| ApplyError::JsonParse {
        context: format!("run log {}", path.display()),
        source: e,
    })
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
