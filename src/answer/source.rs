use std::collections::BTreeMap;

use crate::error::ApplyError;

/// Literal the model is told to reply with when it has no answer.
pub const NO_ANSWER: &str = "''";

/// External source of answers for form questions. Calls may take seconds;
/// an `Err` is fatal for the current job attempt.
pub trait AnswerSource {
    fn ask_free_text(&self, question: &str, validation: Option<&str>) -> Result<String, ApplyError>;

    fn ask_choice(&self, question: &str, options: &[String]) -> Result<String, ApplyError>;
}

/// Applicant context shared by every prompt.
#[derive(Debug, Clone, Default)]
pub struct PromptContext {
    /// Free-form applicant profile (resume summary, preferences)
    pub profile: String,
    /// Previously given answers, `question: answer` per line
    pub known_answers: String,
}

impl PromptContext {
    fn render(&self) -> String {
        let mut out = String::new();
        if !self.profile.trim().is_empty() {
            out.push_str("APPLICANT PROFILE:\n");
            out.push_str(self.profile.trim());
            out.push_str("\n\n");
        }
        if !self.known_answers.trim().is_empty() {
            out.push_str("PREVIOUS ANSWERS:\n");
            out.push_str(self.known_answers.trim());
            out.push_str("\n\n");
        }
        out
    }
}

pub fn text_prompt(context: &PromptContext, question: &str, validation: Option<&str>) -> String {
    let validation = validation
        .map(|v| format!("\nThe form rejected the previous answer with: {}\n", v.trim()))
        .unwrap_or_default();

    format!(
r#"You are filling in a job application form on behalf of the applicant.

{}QUESTION: {}
{}
Reply with ONLY the value to type into the field, no explanation.
If the applicant's information does not answer the question, reply with exactly {}."#,
        context.render(),
        question.trim(),
        validation,
        NO_ANSWER
    )
}

pub fn choice_prompt(context: &PromptContext, question: &str, options: &[String]) -> String {
    let listed = options
        .iter()
        .map(|o| format!("- {}", o))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
r#"You are filling in a job application form on behalf of the applicant.

{}QUESTION: {}
OPTIONS:
{}

Reply with ONLY the exact text of the best option, no explanation.
If none applies, reply with exactly {}."#,
        context.render(),
        question.trim(),
        listed,
        NO_ANSWER
    )
}

// ============================================================================
// Static source (offline, no model)
// ============================================================================

/// Answers from a fixed `label substring → answer` table. Free-text questions
/// without a match get the no-answer literal; choice questions fall back to
/// the first option.
#[derive(Debug, Clone, Default)]
pub struct StaticAnswerSource {
    answers: BTreeMap<String, String>,
}

impl StaticAnswerSource {
    pub fn new(answers: BTreeMap<String, String>) -> Self {
        let answers = answers
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();
        StaticAnswerSource { answers }
    }

    fn lookup(&self, question: &str) -> Option<&str> {
        let question = question.to_lowercase();
        self.answers
            .iter()
            .find(|(needle, _)| question.contains(needle.as_str()))
            .map(|(_, answer)| answer.as_str())
    }
}

impl AnswerSource for StaticAnswerSource {
    fn ask_free_text(&self, question: &str, _validation: Option<&str>) -> Result<String, ApplyError> {
        Ok(self.lookup(question).unwrap_or(NO_ANSWER).to_string())
    }

    fn ask_choice(&self, question: &str, options: &[String]) -> Result<String, ApplyError> {
        if let Some(answer) = self.lookup(question) {
            if let Some(opt) = options.iter().find(|o| o.eq_ignore_ascii_case(answer)) {
                return Ok(opt.clone());
            }
        }
        Ok(options.first().cloned().unwrap_or_else(|| NO_ANSWER.to_string()))
    }
}
