use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ApplyError;

#[derive(Debug, Serialize, Deserialize)]
struct LedgerEntry {
    question: String,
    answer: String,
}

/// Record of every answer the AI has given, newest first, one entry per
/// question, persisted as a JSON array. Rendered back into prompts as
/// `question: answer` lines so later answers stay consistent with earlier
/// ones.
#[derive(Debug)]
pub struct AnswerLedger {
    path: PathBuf,
    entries: Vec<(String, String)>,
}

impl AnswerLedger {
    /// Load the ledger at `path`; a missing or malformed file starts empty.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match load_entries(&path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("failed to load answer ledger: {}", e);
                vec![]
            }
        };
        AnswerLedger { path, entries }
    }

    /// Record an answer, replacing any older answer to the same question.
    pub fn record(&mut self, question: &str, answer: &str) {
        let question = single_line(question);
        if question.is_empty() {
            return;
        }

        self.entries.retain(|(q, _)| *q != question);
        self.entries.insert(0, (question, single_line(answer)));

        if let Err(e) = self.save() {
            warn!("failed to save answer ledger: {}", e);
        }
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Ledger rendered as prompt context.
    pub fn as_context(&self) -> String {
        self.entries
            .iter()
            .map(|(q, a)| format!("{}: {}\n", q, a))
            .collect()
    }

    fn save(&self) -> Result<(), ApplyError> {
        let stored: Vec<LedgerEntry> = self
            .entries
            .iter()
            .map(|(q, a)| LedgerEntry {
                question: q.clone(),
                answer: a.clone(),
            })
            .collect();

        let json = serde_json::to_string_pretty(&stored).map_err(|e| ApplyError::JsonSerialize {
            context: "answer ledger".into(),
            source: e,
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ApplyError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        fs::write(&self.path, json).map_err(|e| ApplyError::Io {
            path: self.path.clone(),
            source: e,
        })
    }
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn load_entries(path: &Path) -> Result<Vec<(String, String)>, ApplyError> {
    if !path.exists() {
        return Ok(vec![]);
    }

    let content = fs::read_to_string(path).map_err(|e| ApplyError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let stored: Vec<LedgerEntry> = serde_json::from_str(&content).map_err(|e| ApplyError::JsonParse {
        context: format!("answer ledger {}", path.display()),
        source: e,
    })?;

    Ok(stored.into_iter().map(|e| (e.question, e.answer)).collect())
}
