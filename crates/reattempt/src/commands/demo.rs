//! Demo command
//!
//! Runs a fixed set of scenarios concurrently: futures that are already in
//! flight and callables that are retried, each against every backoff
//! strategy.

use anyhow::Result;
use futures::future::{join_all, BoxFuture, FutureExt};
use reattempt_core::retry::{Classify, RetryExecutorBuilder, TracingObserver};
use reattempt_core::{Backoff, Operation, RetryError};
use std::fmt::Display;

use crate::cli::DemoArgs;
use crate::output;

type Outcome = (String, Result<String, RetryError>);

pub async fn run(args: DemoArgs) -> Result<()> {
    let base = super::secs("base-delay", args.base_delay)?;
    let max = super::secs("max-delay", args.max_delay)?.max(base);

    let strategies = [
        ("Constant", Backoff::constant(base)),
        ("Linear", Backoff::linear(base, max)),
        ("Quadratic", Backoff::quadratic(base, max)),
        ("Exponential", Backoff::exponential(base, max)),
    ];

    let mut scenarios: Vec<BoxFuture<'static, Outcome>> = vec![
        scenario(
            "Resolved future",
            Operation::in_flight(async { Ok::<_, &str>("resolved") }),
            1,
            Backoff::constant(base),
        ),
        scenario(
            "Succeeding callable",
            Operation::deferred(|| async { Ok::<_, &str>("success") }),
            1,
            Backoff::constant(base),
        ),
        scenario(
            "Rejected future (default)",
            Operation::in_flight(async { Err::<&str, _>("rejected") }),
            1,
            Backoff::constant(base),
        ),
        scenario(
            "Failing callable (default)",
            Operation::deferred(|| async { Err::<&str, _>("failed") }),
            1,
            Backoff::constant(base),
        ),
    ];

    for (name, backoff) in strategies {
        scenarios.push(scenario(
            format!("Rejected future ({})", name),
            Operation::in_flight(async { Err::<&str, _>("rejected") }),
            args.attempts,
            backoff,
        ));
        scenarios.push(scenario(
            format!("Failing callable ({})", name),
            Operation::deferred(|| async { Err::<&str, _>("failed") }),
            args.attempts,
            backoff,
        ));
    }

    output::header("Retry scenarios");
    for (label, outcome) in join_all(scenarios).await {
        match outcome {
            Ok(value) => output::success(&format!("{}: {}", label, value)),
            Err(err) => {
                output::error(&format!("{}: {}", label, err));
                output::kv("attempts", &err.attempts().to_string());
                output::kv("duration", &format!("{} ms", err.duration_ms()));
            }
        }
    }

    Ok(())
}

fn scenario<T, E>(
    label: impl Into<String>,
    operation: Operation<'static, T, E>,
    max_attempts: u32,
    backoff: Backoff,
) -> BoxFuture<'static, Outcome>
where
    T: Display + Send + 'static,
    E: Classify + Send + 'static,
{
    let label = label.into();
    async move {
        let executor = RetryExecutorBuilder::new()
            .with_max_attempts(max_attempts)
            .with_backoff(backoff)
            .with_observer(TracingObserver::new(label.clone()))
            .build();

        let outcome = executor.execute(operation).await.map(|value| value.to_string());
        (label, outcome)
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scenario_reports_success() {
        let (label, outcome) = scenario(
            "ok",
            Operation::deferred(|| async { Ok::<_, &str>(7) }),
            3,
            Backoff::constant(std::time::Duration::ZERO),
        )
        .await;

        assert_eq!(label, "ok");
        assert_eq!(outcome.unwrap(), "7");
    }

    #[tokio::test]
    async fn test_scenario_reports_exhaustion() {
        let (_, outcome) = scenario(
            "failing",
            Operation::deferred(|| async { Err::<i32, _>("nope") }),
            3,
            Backoff::constant(std::time::Duration::ZERO),
        )
        .await;

        let err = outcome.unwrap_err();
        assert_eq!(err.to_string(), "Exceeded 3 retry attempts");
        assert_eq!(err.attempts(), 3);
    }
}
