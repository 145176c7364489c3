use clap::Parser;
use job_applier::cli::commands::{cmd_apply, cmd_ask, cmd_cache_pending};
use job_applier::cli::config::{CacheAction, Cli, Commands, load_config};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // RUST_LOG wins over -v
    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.config.as_deref());

    match cli.command {
        Commands::Apply {
            job_urls,
            jobs_file,
            keywords,
            location,
            provider,
            headed,
        } => {
            let summary = cmd_apply(
                &config,
                &job_urls,
                jobs_file.as_deref(),
                &keywords,
                &location,
                provider.as_deref(),
                headed,
            )?;
            if summary.total > 0 && summary.applied == 0 {
                std::process::exit(1);
            }
        }
        Commands::Ask {
            question,
            options,
            hint,
            provider,
        } => {
            cmd_ask(&config, &question, &options, hint.as_deref(), provider.as_deref())?;
        }
        Commands::Cache { action } => match action {
            CacheAction::Pending => {
                cmd_cache_pending(&config);
            }
        },
    }

    Ok(())
}
