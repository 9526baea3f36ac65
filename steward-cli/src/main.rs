// steward-cli/src/main.rs
mod approval;
mod models {
    pub mod cli;
}
mod rendering;
mod tools;

use anyhow::{anyhow, Context, Result};
use colored::*;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use rustyline::error::ReadlineError;
use rustyline::{Config, DefaultEditor};
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::{
    fmt::{self, time::LocalTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use steward_core::{
    utils::truncate_string, Agent, AgentConfig, AgentOutput, AutoApprove, ProviderRegistry,
    RunOutcome, ToolExecutionStatus, DEFAULT_MAX_ITERATIONS,
};

use crate::approval::{ConsoleApproval, SpinnerSlot};
use crate::models::cli::Cli;
use crate::rendering::print_formatted;
use crate::tools::build_tool_set;

const CONFIG_FILENAME: &str = "Steward.toml";
const LOG_FILE_NAME: &str = "steward-app.log";
const HISTORY_FILE_NAME: &str = "cli_history.txt";
const RESULT_PREVIEW_CHARS: usize = 150;

/// Nearest `Steward.toml` in `start` or one of its ancestors.
fn find_config_file(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILENAME))
        .find(|candidate| candidate.is_file())
}

fn load_cli_config(start: &Path) -> Result<AgentConfig> {
    match find_config_file(start) {
        Some(config_path) => {
            info!("Found configuration file at: {:?}", config_path);
            AgentConfig::from_file(&config_path)
        }
        None => {
            info!(
                "No {} found from {:?} upwards; using built-in OpenAI defaults.",
                CONFIG_FILENAME, start
            );
            Ok(AgentConfig::openai_default())
        }
    }
}

/// Applies the `--provider` and `--model` overrides. The returned config has
/// the chosen provider as its default.
fn apply_cli_overrides(mut config: AgentConfig, cli: &Cli) -> Result<AgentConfig> {
    if let Some(provider_id) = &cli.provider {
        config.provider(provider_id).with_context(|| {
            let mut known: Vec<&str> = config.providers.keys().map(String::as_str).collect();
            known.sort_unstable();
            format!("Unknown provider. Configured providers: {}", known.join(", "))
        })?;
        config.default_provider = provider_id.clone();
    }
    if let Some(model) = &cli.model {
        let provider_id = config.default_provider.clone();
        let provider_conf = config
            .providers
            .get_mut(&provider_id)
            .ok_or_else(|| anyhow!("Provider '{}' is not configured.", provider_id))?;
        info!(provider_id = %provider_id, model = %model, "Overriding model name.");
        provider_conf.model_config.model_name = model.clone();
    }
    if let Some(max_iterations) = cli.max_iterations {
        config.max_iterations = Some(max_iterations);
    }
    Ok(config)
}

struct Session {
    agent: Agent,
    spinner: SpinnerSlot,
    provider_id: String,
}

fn build_session(config: &AgentConfig, auto_approve: bool, working_dir: PathBuf) -> Result<Session> {
    let registry = ProviderRegistry::from_config(config, &Client::new())
        .context("Failed to set up providers")?;
    let provider_id = registry.default_provider_id().to_string();
    let provider = registry.default()?;
    let max_iterations = config.max_iterations.unwrap_or(DEFAULT_MAX_ITERATIONS);

    let spinner: SpinnerSlot = Arc::new(Mutex::new(None));
    let builder = Agent::builder(provider)
        .system_prompt(config.system_prompt())
        .tools(build_tool_set(working_dir))
        .max_iterations(max_iterations);
    let builder = if auto_approve {
        warn!("Auto-approving all tool calls (--yes).");
        builder.approval_gate(AutoApprove)
    } else {
        builder.approval_gate(ConsoleApproval::new(spinner.clone()))
    };
    let agent = builder.build().context("Failed to create agent")?;

    info!(
        provider_id = %provider_id,
        model = %agent.provider_name(),
        max_iterations,
        "Agent ready."
    );
    Ok(Session {
        agent,
        spinner,
        provider_id,
    })
}

fn set_spinner(slot: &SpinnerSlot, spinner: Option<ProgressBar>) {
    match slot.lock() {
        Ok(mut current) => *current = spinner,
        Err(e) => warn!(error = %e, "Spinner slot lock poisoned."),
    }
}

fn print_tool_activity(output: &AgentOutput) {
    for result in &output.applied_tool_results {
        println!(
            "{} {}({})",
            "[TOOL CALL]".magenta().bold(),
            result.tool_name.cyan(),
            result.input
        );
        let preview = truncate_string(&result.output, RESULT_PREVIEW_CHARS);
        match result.status {
            ToolExecutionStatus::Success => println!("{} {}", "[RESULT]".green(), preview),
            _ => println!("{} {}", "[RESULT]".red(), preview),
        }
    }
}

/// Runs one user prompt through the agent behind a spinner.
async fn run_turn(session: &mut Session, prompt: &str) -> Result<AgentOutput> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")?
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "-"]),
    );
    pb.set_message("Thinking...");
    pb.enable_steady_tick(Duration::from_millis(100));
    set_spinner(&session.spinner, Some(pb.clone()));

    let result = session.agent.run(prompt).await;

    set_spinner(&session.spinner, None);
    pb.finish_and_clear();

    let output = result?;
    info!(
        iterations = output.iterations,
        tool_calls = output.applied_tool_results.len(),
        completed = output.outcome.is_completed(),
        "Agent run finished."
    );
    print_tool_activity(&output);
    Ok(output)
}

/// Answers `prompt` and prints the raw answer. Returns whether the model
/// finished within the iteration limit.
async fn run_single_turn(session: &mut Session, prompt: &str) -> Result<bool> {
    info!(task = %prompt, "Running non-interactive turn.");
    let output = run_turn(session, prompt).await?;
    println!("{}", output.text());
    Ok(output.outcome.is_completed())
}

fn print_welcome_message(session: &Session) {
    println!("\n{}", "Steward - AI Assistant".cyan().bold());
    println!(
        "{}: {} ({})",
        "Provider".cyan(),
        session.provider_id,
        session.agent.provider_name()
    );
    println!(
        "{}\n{}",
        "Type 'quit', 'exit', 'q' or press Ctrl-D to leave.".dimmed(),
        "Type 'reset' to start a fresh conversation.".dimmed()
    );
    println!();
}

fn history_file_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("steward").join(HISTORY_FILE_NAME))
}

async fn run_interactive(session: &mut Session) -> Result<()> {
    print_welcome_message(session);

    let rl_config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .build();
    let mut rl = DefaultEditor::with_config(rl_config).context("Failed to initialize line editor")?;
    let history_path = history_file_path();
    if let Some(path) = &history_path {
        if let Err(e) = rl.load_history(path) {
            debug!(path = %path.display(), error = %e, "No readline history loaded.");
        }
    }

    loop {
        let line = match rl.readline(&format!("{} ", ">".cyan().bold())) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                error!("Error reading input: {}", e);
                return Err(anyhow!(e)).context("Error reading input");
            }
        };

        let input = line.trim();
        match input.to_lowercase().as_str() {
            "" => continue,
            "quit" | "exit" | "q" => break,
            "reset" => {
                session.agent.reset();
                println!("{}", "[Conversation reset]".yellow());
                continue;
            }
            _ => {}
        }

        match run_turn(session, input).await {
            Ok(output) => {
                println!();
                match &output.outcome {
                    RunOutcome::Completed(answer) => {
                        if let Err(e) = print_formatted(answer) {
                            warn!(error = %e, "Markdown rendering failed; printing raw text.");
                            println!("{}", answer);
                        }
                    }
                    RunOutcome::MaxIterationsReached => println!("{}", output.text().red()),
                }
                println!();
            }
            Err(e) => {
                error!(error = ?e, "Agent run failed.");
                eprintln!("{} {:#}", "Error:".red(), e);
            }
        }
    }

    if let Some(path) = &history_path {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!(error = %e, "Failed to create history directory.");
            }
        }
        if let Err(e) = rl.save_history(path) {
            warn!(path = %path.display(), error = %e, "Failed to save readline history.");
        }
    }
    println!("Goodbye!");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    colored::control::set_override(true);
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(default_level.into()));

    let log_dir = dirs::cache_dir()
        .or_else(dirs::runtime_dir)
        .unwrap_or_else(env::temp_dir)
        .join("steward");
    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!("{} Failed to create log directory {}: {}", "Error:".red(), log_dir.display(), e);
        return ExitCode::FAILURE;
    }
    let log_path = log_dir.join(LOG_FILE_NAME);

    let file_appender = tracing_appender::rolling::never(&log_dir, LOG_FILE_NAME);
    let (non_blocking_writer, _guard) = tracing_appender::non_blocking(file_appender);

    let local_timer = LocalTime::new(time::macros::format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
    ));
    let file_layer = fmt::layer()
        .with_writer(non_blocking_writer)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .with_timer(local_timer.clone());
    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_timer(local_timer)
        .with_target(false)
        .with_level(true);

    if let Err(e) = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
    {
        eprintln!("{} Failed to initialize logging: {}", "Error:".red(), e);
        return ExitCode::FAILURE;
    }
    colored::control::unset_override();

    info!(
        "Logging initialized. Level determined by RUST_LOG or -v flags (default: {}). Logging to stderr and {}",
        default_level,
        log_path.display()
    );

    let result = async {
        let working_dir = env::current_dir().context("Failed to get current directory")?;
        let config = load_cli_config(&working_dir)
            .and_then(|config| apply_cli_overrides(config, &cli))
            .context("Failed to load configuration")?;
        let mut session = build_session(&config, cli.yes, working_dir)?;

        match &cli.task {
            Some(task) => run_single_turn(&mut session, task).await,
            None => run_interactive(&mut session).await.map(|_| true),
        }
    }
    .await;

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("Operation failed: {:?}", e);
            eprintln!("{} {:#}", "Error:".red(), e);
            ExitCode::FAILURE
        }
    }
}
