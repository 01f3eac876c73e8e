mod age;
mod config;
mod constants;
mod duration;
mod filter;
mod first_upload;
mod hydrate;
mod input;
mod pipeline;
mod render;
mod search;
#[cfg(test)]
mod testing;
mod youtube;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use config::{Config, log_dir};
use constants::constants;
use filter::FilterCriteria;
use input::{SearchArgs, parse_keywords};
use pipeline::{Pipeline, PipelineOptions, RunWarning};
use render::{progress_line, render_report};
use youtube::YouTubeClient;

// --- CLI ---

/// Find recent videos that are doing unusually well for the size of their channel.
#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
  #[command(flatten)]
  search: SearchArgs,

  /// Data API key
  #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true)]
  api_key: Option<String>,

  /// Override the Data API base URL (e.g. a local mock server)
  #[arg(long, value_name = "URL")]
  api_base_url: Option<String>,

  /// Search hits requested per keyword (1-50)
  #[arg(long, value_parser = clap::value_parser!(u32).range(1..=50))]
  max_results: Option<u32>,

  /// Keywords processed in parallel
  #[arg(short = 'j', long)]
  concurrency: Option<usize>,

  /// Per-request timeout in seconds
  #[arg(long, value_name = "SECS")]
  timeout: Option<u64>,

  /// Print the report as JSON
  #[arg(long)]
  json: bool,

  /// Store the effective filter settings as future defaults
  #[arg(long)]
  save_config: bool,

  /// Print shell completions and exit
  #[arg(long, value_name = "SHELL")]
  completions: Option<Shell>,
}

// --- Logging ---

/// Log to a daily rolling file so stdout stays clean for results.
/// Falls back to stderr when no data directory is available.
fn init_logging() -> Option<WorkerGuard> {
  let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tubescout=info"));

  if let Some(dir) = log_dir()
    && std::fs::create_dir_all(&dir).is_ok()
  {
    let appender = tracing_appender::rolling::daily(dir, &constants().log_file_prefix);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt().with_env_filter(filter()).with_writer(writer).with_ansi(false).init();
    return Some(guard);
  }

  tracing_subscriber::fmt().with_env_filter(filter()).with_writer(std::io::stderr).init();
  None
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  if let Some(shell) = args.completions {
    clap_complete::generate(shell, &mut Args::command(), env!("CARGO_PKG_NAME"), &mut std::io::stdout());
    return Ok(());
  }

  let _log_guard = init_logging();
  run(args).await
}

/// Resolve criteria and keywords. With `--save-config` the criteria are folded
/// into `config` whether or not any keywords were given.
fn resolve_inputs(args: &Args, config: &mut Config) -> Result<(FilterCriteria, Vec<String>)> {
  let criteria = args.search.criteria(config)?;
  if args.save_config {
    config.remember(&criteria);
  }
  let keywords = parse_keywords(&args.search.keyword_text()?);
  Ok((criteria, keywords))
}

async fn run(args: Args) -> Result<()> {
  let c = constants();
  let mut config = Config::load();
  let (criteria, keywords) = resolve_inputs(&args, &mut config)?;

  if args.save_config {
    let path = config.save()?;
    eprintln!("Saved defaults to {}", path.display());
  }

  if keywords.is_empty() {
    eprintln!("warning: {}", RunWarning::EmptyInput);
    return Ok(());
  }

  let api_key = args
    .api_key
    .or_else(|| config.api_key.clone())
    .filter(|k| !k.trim().is_empty())
    .context("No API key: pass --api-key, set YOUTUBE_API_KEY, or add api_key to config.toml")?;
  let base_url = args.api_base_url.or_else(|| config.api_base_url.clone()).unwrap_or_else(|| c.api_base_url.clone());
  let timeout = Duration::from_secs(args.timeout.or(config.request_timeout_secs).unwrap_or(c.request_timeout_secs));
  let client = YouTubeClient::new(api_key, base_url, timeout)?;

  let options = PipelineOptions {
    search_max_results: args.max_results.or(config.search_max_results).unwrap_or(c.search_max_results),
    keyword_concurrency: args.concurrency.or(config.keyword_concurrency).unwrap_or(c.keyword_concurrency),
  };
  info!(?criteria, ?options, keywords = keywords.len(), "run configured");
  let pipeline = Pipeline::new(client, criteria, options);

  let (tx, mut rx) = mpsc::unbounded_channel();
  let show_progress = !args.json;
  let progress = async move {
    while let Some(event) = rx.recv().await {
      if show_progress {
        eprintln!("{}", progress_line(&event));
      }
    }
  };
  let (report, ()) = tokio::join!(pipeline.run(&keywords, Utc::now(), Some(tx)), progress);

  if args.json {
    println!("{}", serde_json::to_string_pretty(&report).context("Failed to serialize report")?);
  } else {
    print!("{}", render_report(&report));
  }
  Ok(())
}
