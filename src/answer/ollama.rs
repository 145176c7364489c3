use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::answer::source::{AnswerSource, PromptContext, choice_prompt, text_prompt};
use crate::error::ApplyError;

pub struct OllamaAnswerSource {
    pub endpoint: String,
    pub model: String,
    pub context: PromptContext,
    client: reqwest::blocking::Client,
}

impl Default for OllamaAnswerSource {
    fn default() -> Self {
        Self::new("http://localhost:11434/api/generate", "qwen2.5:1.5b")
    }
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

impl OllamaAnswerSource {
    pub fn new(endpoint: &str, model: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            context: PromptContext::default(),
            client: reqwest::blocking::Client::new(),
        }
    }

    pub fn with_context(mut self, context: PromptContext) -> Self {
        self.context = context;
        self
    }

    fn generate(&self, prompt: String) -> Result<String, ApplyError> {
        debug!(model = %self.model, "asking ollama");

        let request = OllamaRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()?
            .error_for_status()?;

        let body: OllamaResponse = response.json()?;
        Ok(body.response.trim().to_string())
    }
}

impl AnswerSource for OllamaAnswerSource {
    fn ask_free_text(&self, question: &str, validation: Option<&str>) -> Result<String, ApplyError> {
        self.generate(text_prompt(&self.context, question, validation))
    }

    fn ask_choice(&self, question: &str, options: &[String]) -> Result<String, ApplyError> {
        self.generate(choice_prompt(&self.context, question, options))
    }
}
