use std::path::Path;

use tracing::{info, warn};

use crate::answer::cache::AnswerCache;
use crate::answer::ledger::AnswerLedger;
use crate::answer::ollama::OllamaAnswerSource;
use crate::answer::openai::{OPENAI_RESPONSES_ENDPOINT, OpenAiAnswerSource, resolve_api_key};
use crate::answer::resolver::AnswerResolver;
use crate::answer::source::{AnswerSource, PromptContext, StaticAnswerSource};
use crate::browser::session::BrowserSession;
use crate::cli::config::AppConfig;
use crate::error::ApplyError;
use crate::job::apply::{JobTarget, RunSummary, apply_to_jobs, load_job_file};
use crate::job::run_log::{RunLog, RunMeta};
use crate::trace::logger::TraceLogger;

// ============================================================================
// apply subcommand
// ============================================================================

pub fn cmd_apply(
    config: &AppConfig,
    job_urls: &[String],
    jobs_file: Option<&str>,
    keywords: &str,
    location: &str,
    provider: Option<&str>,
    headed: bool,
) -> Result<RunSummary, Box<dyn std::error::Error>> {
    let mut jobs: Vec<JobTarget> = job_urls.iter().map(JobTarget::new).collect();
    if let Some(file) = jobs_file {
        jobs.extend(load_job_file(Path::new(file))?);
    }

    if jobs.is_empty() {
        eprintln!("No jobs given (use --job-url or --jobs-file)");
        return Ok(RunSummary::default());
    }

    let mut ledger = AnswerLedger::open(&config.answers.ledger_file);
    let source = build_answer_source(config, provider, prompt_context(config, &ledger))?;
    let mut cache = AnswerCache::open(&config.answers.cache_file);
    let mut resolver = AnswerResolver::new(&mut cache, source.as_ref())
        .with_ledger(&mut ledger)
        .with_non_cacheable(config.answers.non_cacheable.clone());

    let tracer = match &config.run.trace_file {
        Some(path) => TraceLogger::new(path),
        None => TraceLogger::disabled(),
    };
    let mut run_log = RunLog::open(&config.run.run_data_file);
    let run = RunMeta::new(keywords, location);

    let mut options = config.browser.session_options();
    if headed {
        options.headless = false;
    }
    info!("launching browser ({} jobs queued)", jobs.len());
    let mut session = BrowserSession::launch(&options)?;

    let summary = apply_to_jobs(
        &mut session,
        &mut resolver,
        &config.form,
        &tracer,
        &jobs,
        &run,
        &mut run_log,
    );
    session.quit()?;

    println!(
        "Applied to {} of {} jobs ({} failed)",
        summary.applied, summary.total, summary.failed
    );
    Ok(summary)
}

// ============================================================================
// ask subcommand
// ============================================================================

/// Resolve one question through the cache-backed resolver and print it.
pub fn cmd_ask(
    config: &AppConfig,
    question: &str,
    options: &[String],
    hint: Option<&str>,
    provider: Option<&str>,
) -> Result<String, Box<dyn std::error::Error>> {
    let mut ledger = AnswerLedger::open(&config.answers.ledger_file);
    let source = build_answer_source(config, provider, prompt_context(config, &ledger))?;
    let mut cache = AnswerCache::open(&config.answers.cache_file);
    let mut resolver = AnswerResolver::new(&mut cache, source.as_ref())
        .with_ledger(&mut ledger)
        .with_non_cacheable(config.answers.non_cacheable.clone());

    let answer = if options.is_empty() {
        resolver.resolve_text(question, hint)?
    } else {
        resolver.resolve_choice(question, options)?
    };

    if answer.is_empty() {
        println!("(no answer)");
    } else {
        println!("{}", answer);
    }
    Ok(answer)
}

// ============================================================================
// cache subcommand
// ============================================================================

/// Print cached questions with an empty answer, for filling in by hand.
pub fn cmd_cache_pending(config: &AppConfig) -> Vec<String> {
    let cache = AnswerCache::open(&config.answers.cache_file);
    let pending: Vec<String> = cache.pending().into_iter().map(str::to_string).collect();

    if pending.is_empty() {
        println!("No unanswered questions in {}", config.answers.cache_file);
    } else {
        println!("{} unanswered questions:", pending.len());
        for key in &pending {
            println!("  {}", key);
        }
    }
    pending
}

// ============================================================================
// Helpers
// ============================================================================

/// Build the answer source named by `provider` (CLI) or `answers.provider`.
pub fn build_answer_source(
    config: &AppConfig,
    provider: Option<&str>,
    context: PromptContext,
) -> Result<Box<dyn AnswerSource>, ApplyError> {
    let name = provider.unwrap_or(&config.answers.provider);
    match name {
        "ollama" => {
            let mut source = OllamaAnswerSource::default();
            if let Some(endpoint) = &config.ollama.endpoint {
                source.endpoint = endpoint.clone();
            }
            if let Some(model) = &config.ollama.model {
                source.model = model.clone();
            }
            Ok(Box::new(source.with_context(context)))
        }
        "openai" => {
            let key = resolve_api_key(config.openai.key_file.as_deref().map(Path::new))?;
            let endpoint = config
                .openai
                .endpoint
                .as_deref()
                .unwrap_or(OPENAI_RESPONSES_ENDPOINT);
            let model = config.openai.model.as_deref().unwrap_or("gpt-4o-mini");
            Ok(Box::new(
                OpenAiAnswerSource::new(endpoint, model, key).with_context(context),
            ))
        }
        "static" => Ok(Box::new(StaticAnswerSource::new(
            config.answers.static_answers.clone(),
        ))),
        other => Err(ApplyError::Config(format!(
            "unknown answer provider '{}' (expected ollama, openai or static)",
            other
        ))),
    }
}

/// Applicant profile plus previously given answers.
pub fn prompt_context(config: &AppConfig, ledger: &AnswerLedger) -> PromptContext {
    let profile = match &config.answers.profile_file {
        Some(path) => std::fs::read_to_string(path).unwrap_or_else(|e| {
            warn!("could not read profile {}: {}", path, e);
            String::new()
        }),
        None => String::new(),
    };

    PromptContext {
        profile,
        known_answers: ledger.as_context(),
    }
}
