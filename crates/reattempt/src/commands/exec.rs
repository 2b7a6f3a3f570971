//! Exec command

use anyhow::{anyhow, Context, Result};
use camino::Utf8Path;
use reattempt_core::retry::{RetryExecutorBuilder, TracingObserver};
use reattempt_core::{Operation, RetryConfig};
use tokio::process::Command;

use crate::cli::ExecArgs;
use crate::output;

pub async fn run(args: ExecArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    let config = RetryConfig::load(config_path).context("Failed to load configuration")?;

    let mut policy = config.policy_for(&args.policy).clone();
    if let Some(attempts) = args.attempts {
        policy.max_attempts = attempts;
    }

    let (program, program_args) = args
        .command
        .split_first()
        .ok_or_else(|| anyhow!("no command given"))?;

    tracing::debug!(
        policy = %args.policy,
        max_attempts = policy.max_attempts,
        strategy = policy.backoff.to_backoff().name(),
        "running command"
    );

    let executor = RetryExecutorBuilder::new()
        .with_policy(&policy)
        .with_observer(TracingObserver::new(program.clone()))
        .build();

    let operation = Operation::deferred(|| run_once(program, program_args));

    match executor.execute(operation).await {
        Ok(()) => {
            output::success(&format!("`{}` succeeded", args.command.join(" ")));
            Ok(())
        }
        Err(err) => {
            for (index, failure) in err.nested().iter().enumerate() {
                output::kv(&format!("attempt {}", index + 1), &failure.message());
            }
            Err(err).context(format!("`{}` did not succeed", args.command.join(" ")))
        }
    }
}

async fn run_once(program: &str, args: &[String]) -> Result<()> {
    let status = Command::new(program)
        .args(args)
        .status()
        .await
        .with_context(|| format!("Failed to start `{}`", program))?;

    if status.success() {
        Ok(())
    } else {
        Err(anyhow!("`{}` exited with {}", program, status))
    }
}
