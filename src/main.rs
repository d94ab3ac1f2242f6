mod action;
mod config;
mod llm;
mod pipeline;
mod pr;
mod prompt;
mod summary;

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use crate::config::{Config, Inputs, Secret};
use crate::llm::OpenAiClient;
use crate::pipeline::Pipeline;
use crate::pr::GitHubClient;

/// PR Describer: CI step that asks an LLM to describe a GitHub Pull Request
/// and writes the answer back as the PR description.
#[derive(Parser, Debug)]
#[command(name = "pr-describer", version, about)]
struct Cli {
    /// API key for the model endpoint
    #[arg(long, env = "INPUT_OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<Secret>,

    /// Template placed before the pull request JSON in the prompt
    #[arg(long, env = "INPUT_PROMPT")]
    prompt: Option<String>,

    /// Token for the GitHub API
    #[arg(long, env = "INPUT_GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<Secret>,

    /// Optional config file with endpoint overrides
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Generate the description without writing it to the pull request
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<pipeline::RunError>() {
                Some(run_err) => error!(stage = %run_err.stage(), error = %err, "run failed"),
                None => error!(error = %err, "run failed before the pipeline started"),
            }
            action::set_failed(&err.to_string());
            ExitCode::FAILURE
        }
    }
}

/// RUST_LOG wins; otherwise follow the runner's debug logging switch.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let runner_debug = std::env::var("RUNNER_DEBUG").is_ok_and(|v| v == "1");
        EnvFilter::new(if runner_debug { "debug" } else { "info" })
    })
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let inputs = Inputs::new(cli.openai_api_key, cli.prompt, cli.github_token)?;
    action::add_mask(inputs.openai_api_key.expose());
    action::add_mask(inputs.github_token.expose());

    info!("loading configuration");
    let config = Config::load(&cli.config)?;
    debug!(github = config.github_api_url(), openai = config.openai_base_url(), "endpoints");

    let ctx = action::EventContext::from_env()?;
    debug!(event = %ctx.event_name, sha = %ctx.sha, git_ref = %ctx.git_ref, "event context");

    let host = GitHubClient::new(config.github_api_url(), inputs.github_token.clone())?;
    let model = OpenAiClient::new(config.openai_base_url(), inputs.openai_api_key.clone())?;

    let outcome = Pipeline::new(&host, &model, &inputs.prompt)
        .dry_run(cli.dry_run)
        .run(&ctx)
        .await?;

    action::set_output("description", &outcome.description)?;
    summary::print(&outcome);
    info!(pr = %outcome.pull, updated = outcome.updated, "done");

    Ok(())
}
