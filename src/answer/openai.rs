use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::answer::source::{AnswerSource, PromptContext, choice_prompt, text_prompt};
use crate::error::ApplyError;

pub const OPENAI_RESPONSES_ENDPOINT: &str = "https://api.openai.com/v1/responses";

/// Answer source backed by the OpenAI Responses API.
pub struct OpenAiAnswerSource {
    pub endpoint: String,
    pub model: String,
    pub context: PromptContext,
    api_key: String,
    client: reqwest::blocking::Client,
}

#[derive(Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: String,
}

#[derive(Deserialize)]
struct ResponsesReply {
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Deserialize)]
struct ContentPart {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// API key from `OPENAI_API_KEY`, else the first line of `key_file`.
pub fn resolve_api_key(key_file: Option<&Path>) -> Result<String, ApplyError> {
    if let Ok(key) = std::env::var("OPENAI_API_KEY") {
        if !key.trim().is_empty() {
            return Ok(key.trim().to_string());
        }
    }

    let path = key_file.ok_or_else(|| {
        ApplyError::Config("OPENAI_API_KEY not set and no openai.key_file configured".into())
    })?;
    let key = fs::read_to_string(path).map_err(|e| ApplyError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let key = key.trim();
    if key.is_empty() {
        return Err(ApplyError::Config(format!(
            "OpenAI key file {} is empty",
            path.display()
        )));
    }
    Ok(key.to_string())
}

impl OpenAiAnswerSource {
    pub fn new(endpoint: &str, model: &str, api_key: String) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            context: PromptContext::default(),
            api_key,
            client: reqwest::blocking::Client::new(),
        }
    }

    pub fn with_context(mut self, context: PromptContext) -> Self {
        self.context = context;
        self
    }

    fn respond(&self, input: String) -> Result<String, ApplyError> {
        debug!(model = %self.model, "asking openai");

        let request = ResponsesRequest {
            model: &self.model,
            input,
        };

        let reply: ResponsesReply = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()?
            .error_for_status()?
            .json()?;

        output_text(&reply)
            .ok_or_else(|| ApplyError::AnswerSource("OpenAI reply had no output_text".into()))
    }
}

fn output_text(reply: &ResponsesReply) -> Option<String> {
    let text: String = reply
        .output
        .iter()
        .flat_map(|item| item.content.iter())
        .filter(|part| part.kind == "output_text")
        .filter_map(|part| part.text.as_deref())
        .collect();

    if text.is_empty() {
        None
    } else {
        Some(text.trim().to_string())
    }
}

impl AnswerSource for OpenAiAnswerSource {
    fn ask_free_text(&self, question: &str, validation: Option<&str>) -> Result<String, ApplyError> {
        self.respond(text_prompt(&self.context, question, validation))
    }

    fn ask_choice(&self, question: &str, options: &[String]) -> Result<String, ApplyError> {
        self.respond(choice_prompt(&self.context, question, options))
    }
}
