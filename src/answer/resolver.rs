use tracing::{debug, info};

use crate::answer::cache::{AnswerCache, choice_key, text_key};
use crate::answer::ledger::AnswerLedger;
use crate::answer::source::{AnswerSource, NO_ANSWER};
use crate::error::ApplyError;

/// Labels whose answers depend on the job and are never cached.
pub const DEFAULT_NON_CACHEABLE: &[&str] = &["Summary", "Cover letter"];

/// Strip whitespace and turn the no-answer literal into an empty answer.
pub fn normalize_answer(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == NO_ANSWER {
        String::new()
    } else {
        trimmed.to_string()
    }
}

/// Cache-first answer lookup. The AI source is asked only on a miss, and an
/// empty cached answer is still a hit.
pub struct AnswerResolver<'a> {
    cache: &'a mut AnswerCache,
    source: &'a dyn AnswerSource,
    ledger: Option<&'a mut AnswerLedger>,
    non_cacheable: Vec<String>,
}

impl<'a> AnswerResolver<'a> {
    pub fn new(cache: &'a mut AnswerCache, source: &'a dyn AnswerSource) -> Self {
        AnswerResolver {
            cache,
            source,
            ledger: None,
            non_cacheable: DEFAULT_NON_CACHEABLE.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_ledger(mut self, ledger: &'a mut AnswerLedger) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn with_non_cacheable(mut self, labels: Vec<String>) -> Self {
        self.non_cacheable = labels;
        self
    }

    pub fn resolve_text(
        &mut self,
        label: &str,
        validation: Option<&str>,
    ) -> Result<String, ApplyError> {
        let key = text_key(label, validation);
        if let Some(hit) = self.cache.get(&key) {
            debug!(key = %key, "answer cache hit");
            return Ok(hit.to_string());
        }

        let raw = self.source.ask_free_text(label, validation)?;
        let answer = normalize_answer(&raw);
        info!("answered '{}' with '{}'", label.trim(), answer);

        self.remember(label, key, &answer);
        Ok(answer)
    }

    pub fn resolve_choice(&mut self, label: &str, options: &[String]) -> Result<String, ApplyError> {
        let key = choice_key(label, options);
        if let Some(hit) = self.cache.get(&key) {
            debug!(key = %key, "answer cache hit");
            return Ok(hit.to_string());
        }

        let raw = self.source.ask_choice(label, options)?;
        let answer = normalize_answer(&raw);
        info!("chose '{}' for '{}'", answer, label.trim());

        self.remember(label, key, &answer);
        Ok(answer)
    }

    pub fn is_cacheable(&self, label: &str) -> bool {
        let label = label.trim();
        !self
            .non_cacheable
            .iter()
            .any(|n| n.trim().eq_ignore_ascii_case(label))
    }

    fn remember(&mut self, label: &str, key: String, answer: &str) {
        if !self.is_cacheable(label) {
            debug!("not caching context-dependent answer for '{}'", label.trim());
            return;
        }

        self.cache.put(key, answer);
        if let Some(ledger) = self.ledger.as_deref_mut() {
            ledger.record(label, answer);
        }
    }
}
