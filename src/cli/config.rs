use std::collections::BTreeMap;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::answer::resolver::DEFAULT_NON_CACHEABLE;
use crate::browser::session::SessionOptions;
use crate::form::form_config::FormConfig;

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "job-applier",
    version,
    about = "Fills and submits multi-step quick-apply job forms"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: job-applier.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply to one or more job postings
    Apply {
        /// Job posting URL (repeatable)
        #[arg(long = "job-url")]
        job_urls: Vec<String>,

        /// File with one job URL per line
        #[arg(long)]
        jobs_file: Option<String>,

        /// Search keywords this run belongs to (run log only)
        #[arg(long, default_value = "")]
        keywords: String,

        /// Search location this run belongs to (run log only)
        #[arg(long, default_value = "")]
        location: String,

        /// Answer provider: ollama, openai or static
        #[arg(long)]
        provider: Option<String>,

        /// Run the browser with a visible window
        #[arg(long)]
        headed: bool,
    },

    /// Resolve a single question through the answer cache
    Ask {
        #[arg(long)]
        question: String,

        /// Candidate option; makes this a choice question (repeatable)
        #[arg(long = "option")]
        options: Vec<String>,

        /// Validation message shown by the form
        #[arg(long)]
        hint: Option<String>,

        /// Answer provider: ollama, openai or static
        #[arg(long)]
        provider: Option<String>,
    },

    /// Inspect the answer cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// List cached questions that still have no answer
    Pending,
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `job-applier.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub form: FormConfig,
    #[serde(default)]
    pub answers: AnswersConfig,
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub run: RunConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_server_script")]
    pub server_script: String,

    #[serde(default = "default_true")]
    pub headless: bool,

    /// Saved login state (cookies, local storage) to load into the page
    pub storage_state: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            server_script: default_server_script(),
            headless: true,
            storage_state: None,
        }
    }
}

impl BrowserConfig {
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            server_script: self.server_script.clone(),
            headless: self.headless,
            storage_state: self.storage_state.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswersConfig {
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_cache_file")]
    pub cache_file: String,

    #[serde(default = "default_ledger_file")]
    pub ledger_file: String,

    /// Applicant profile text embedded in every prompt
    pub profile_file: Option<String>,

    #[serde(default = "default_non_cacheable")]
    pub non_cacheable: Vec<String>,

    /// `label substring → answer` table for the static provider
    #[serde(default)]
    pub static_answers: BTreeMap<String, String>,
}

impl Default for AnswersConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            cache_file: default_cache_file(),
            ledger_file: default_ledger_file(),
            profile_file: None,
            non_cacheable: default_non_cacheable(),
            static_answers: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OllamaConfig {
    pub endpoint: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OpenAiConfig {
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub key_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_run_data_file")]
    pub run_data_file: String,

    /// JSONL step trace; tracing is off when absent
    pub trace_file: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            run_data_file: default_run_data_file(),
            trace_file: None,
        }
    }
}

// Serde default helpers
fn default_true() -> bool { true }
fn default_server_script() -> String { "node/browser-server/server.js".to_string() }
fn default_provider() -> String { "ollama".to_string() }
fn default_cache_file() -> String { "sys_data/answer_cache.json".to_string() }
fn default_ledger_file() -> String { "sys_data/trained_answers.json".to_string() }
fn default_run_data_file() -> String { "sys_data/run_data.json".to_string() }
fn default_non_cacheable() -> Vec<String> {
    DEFAULT_NON_CACHEABLE.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// Config File Loading
// ============================================================================

pub const DEFAULT_CONFIG_FILE: &str = "job-applier.yaml";

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_FILE);
    match std::fs::read_to_string(config_path) {
        Ok(content) => match serde_yaml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("ignoring malformed config {}: {}", config_path, e);
                AppConfig::default()
            }
        },
        Err(_) => AppConfig::default(),
    }
}
