// steward-cli/src/models/cli.rs
use clap::{ArgAction, Parser};

/// Steward: a terminal assistant that can call tools.
/// Starts an interactive session by default, or answers a single task non-interactively.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase message verbosity.
    ///
    /// Specify multiple times for more verbose output:
    ///  -v:  INFO level
    ///  -vv: DEBUG level
    ///  -vvv: TRACE level (most verbose)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Run a single task non-interactively.
    #[arg(short, long)]
    pub task: Option<String>,

    /// Provider id from Steward.toml to use instead of the default one.
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Override the model name of the selected provider.
    #[arg(short, long)]
    pub model: Option<String>,

    /// Maximum completion requests per task.
    #[arg(long)]
    pub max_iterations: Option<usize>,

    /// Approve every tool call without asking.
    #[arg(short = 'y', long)]
    pub yes: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "steward", "-vv", "-t", "What time is it?", "-p", "claude", "-m", "claude-3-5-haiku-latest",
            "--max-iterations", "4", "-y",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.task.as_deref(), Some("What time is it?"));
        assert_eq!(cli.provider.as_deref(), Some("claude"));
        assert_eq!(cli.model.as_deref(), Some("claude-3-5-haiku-latest"));
        assert_eq!(cli.max_iterations, Some(4));
        assert!(cli.yes);

        let defaults = Cli::try_parse_from(["steward"]).unwrap();
        assert_eq!(defaults.verbose, 0);
        assert!(defaults.task.is_none());
        assert!(!defaults.yes);
    }
}
