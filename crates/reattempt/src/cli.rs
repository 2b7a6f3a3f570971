//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand, ValueEnum};
use reattempt_core::types::BackoffStrategy;

/// reattempt - retry with backoff
#[derive(Parser, Debug)]
#[command(name = "reattempt")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to reattempt.yaml config file
    #[arg(short, long, global = true)]
    pub config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay the reference retry scenarios
    Demo(DemoArgs),

    /// Print the delay schedule of a backoff strategy
    Schedule(ScheduleArgs),

    /// Run a command until it exits successfully
    Exec(ExecArgs),
}

#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Delay unit for every strategy, in seconds
    #[arg(long, default_value_t = 1.0)]
    pub base_delay: f64,

    /// Delay ceiling for the growing strategies, in seconds
    #[arg(long, default_value_t = 30.0)]
    pub max_delay: f64,

    /// Attempts for the bounded scenarios
    #[arg(long, default_value_t = 4)]
    pub attempts: u32,
}

#[derive(Args, Debug)]
pub struct ScheduleArgs {
    /// Backoff strategy
    #[arg(short, long, value_enum, default_value_t = StrategyArg::Constant)]
    pub strategy: StrategyArg,

    /// Delay unit in seconds
    #[arg(short, long, default_value_t = 1.0)]
    pub base: f64,

    /// Delay ceiling in seconds
    #[arg(short, long, default_value_t = 30.0)]
    pub max: f64,

    /// Number of delays to print
    #[arg(short = 'n', long, default_value_t = 6)]
    pub count: u32,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ExecArgs {
    /// Named retry policy from the config file
    #[arg(short, long, default_value = "exec")]
    pub policy: String,

    /// Override the policy's maximum number of attempts
    #[arg(short, long)]
    pub attempts: Option<u32>,

    /// Command to run, followed by its arguments
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyArg {
    Constant,
    Linear,
    Quadratic,
    Exponential,
}

impl From<StrategyArg> for BackoffStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Constant => BackoffStrategy::Constant,
            StrategyArg::Linear => BackoffStrategy::Linear,
            StrategyArg::Quadratic => BackoffStrategy::Quadratic,
            StrategyArg::Exponential => BackoffStrategy::Exponential,
        }
    }
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
    fn test_parse_schedule() {
        let cli = Cli::try_parse_from([
            "reattempt", "schedule", "--strategy", "exponential", "--base", "0.5", "-n", "3", "--json",
        ])
        .unwrap();

        match cli.command {
            Commands::Schedule(args) => {
                assert_eq!(args.strategy, StrategyArg::Exponential);
                assert_eq!(args.base, 0.5);
                assert_eq!(args.count, 3);
                assert!(args.json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_exec_keeps_command_flags() {
        let cli = Cli::try_parse_from([
            "reattempt", "-vv", "exec", "--attempts", "5", "--", "curl", "-fsS", "http://localhost",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Exec(args) => {
                assert_eq!(args.policy, "exec");
                assert_eq!(args.attempts, Some(5));
                assert_eq!(args.command, vec!["curl", "-fsS", "http://localhost"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_exec_requires_command() {
        assert!(Cli::try_parse_from(["reattempt", "exec"]).is_err());
    }

    #[test]
    fn test_strategy_conversion() {
        assert_eq!(
            BackoffStrategy::from(StrategyArg::Quadratic),
            BackoffStrategy::Quadratic
        );
    }
}
