use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::ApplyError;

/// Cache key for a free-text question, disambiguated by the validation hint.
pub fn text_key(question: &str, validation: Option<&str>) -> String {
    let hint = validation
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| format!("(Validation: {})", v))
        .unwrap_or_default();
    format!("text::{}{}", question.trim(), hint)
}

/// Cache key for a choice question, disambiguated by its option list.
pub fn choice_key(question: &str, options: &[String]) -> String {
    let options = serde_json::to_string(options).unwrap_or_default();
    format!("select::{}::{}", question.trim(), options)
}

/// Question → answer memo, persisted as a JSON object.
///
/// Constructed once per process and passed by reference to whoever resolves
/// answers. An empty-string answer is a real entry ("no answer known"), and
/// those entries are written first so they are easy to fill in by hand.
/// Read/write failures are logged and degrade to an in-memory cache.
#[derive(Debug, Default)]
pub struct AnswerCache {
    path: Option<PathBuf>,
    entries: Map<String, Value>,
}

impl AnswerCache {
    pub fn in_memory() -> Self {
        AnswerCache::default()
    }

    /// Load the cache at `path`; a missing or unreadable file starts empty.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match load_entries(&path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("failed to load answer cache: {}", e);
                Map::new()
            }
        };
        debug!("answer cache loaded with {} entries", entries.len());

        AnswerCache {
            path: Some(path),
            entries,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(Value::as_str)
    }

    /// Store an answer and persist. Persist failures are logged only.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), Value::String(value.into()));
        if let Err(e) = self.save() {
            warn!("failed to save answer cache: {}", e);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys whose cached answer is the empty string.
    pub fn pending(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, v)| v.as_str() == Some(""))
            .map(|(k, _)| k.as_str())
            .collect()
    }

    fn save(&self) -> Result<(), ApplyError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let (empty, answered): (Vec<_>, Vec<_>) = self
            .entries
            .iter()
            .partition(|(_, v)| v.as_str() == Some(""));
        let ordered: Map<String, Value> = empty
            .into_iter()
            .chain(answered)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let json = serde_json::to_string_pretty(&ordered).map_err(|e| {
            ApplyError::JsonSerialize {
                context: "answer cache".into(),
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

fn load_entries(path: &Path) -> Result<Map<String, Value>, ApplyError> {
    if !path.exists() {
        return Ok(Map::new());
    }

    let content = fs::read_to_string(path).map_err(|e| ApplyError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    serde_json::from_str(&content).map_err(|e| ApplyError::JsonParse {
        context: format!("answer cache {}", path.display()),
        source: e,
    })
}
