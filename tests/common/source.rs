use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use job_applier::answer::source::AnswerSource;
use job_applier::error::ApplyError;

/// Answer source with canned replies that counts how often it was asked.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    /// question → raw reply
    pub replies: HashMap<String, String>,
    /// Reply for questions not in `replies`
    pub fallback: Option<String>,
    pub fail: bool,
    pub calls: Cell<usize>,
    pub asked: RefCell<Vec<String>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        ScriptedSource::default()
    }

    pub fn reply(mut self, question: &str, answer: &str) -> Self {
        self.replies.insert(question.to_string(), answer.to_string());
        self
    }

    pub fn otherwise(mut self, answer: &str) -> Self {
        self.fallback = Some(answer.to_string());
        self
    }

    pub fn failing() -> Self {
        ScriptedSource {
            fail: true,
            ..ScriptedSource::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    fn answer(&self, question: &str) -> Result<String, ApplyError> {
        self.calls.set(self.calls.get() + 1);
        self.asked.borrow_mut().push(question.to_string());

        if self.fail {
            return Err(ApplyError::AnswerSource("model unavailable".into()));
        }
        Ok(self
            .replies
            .get(question)
            .or(self.fallback.as_ref())
            .cloned()
            .unwrap_or_else(|| "''".to_string()))
    }
}

impl AnswerSource for ScriptedSource {
    fn ask_free_text(&self, question: &str, _validation: Option<&str>) -> Result<String, ApplyError> {
        self.answer(question)
    }

    fn ask_choice(&self, question: &str, options: &[String]) -> Result<String, ApplyError> {
        let answer = self.answer(question)?;
        if answer == "''" {
            return Ok(options.first().cloned().unwrap_or(answer));
        }
        Ok(answer)
    }
}
