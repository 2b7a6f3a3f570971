//! Schedule command

use anyhow::{bail, Result};
use reattempt_core::types::{BackoffConfig, BackoffStrategy};
use serde::Serialize;

use crate::cli::ScheduleArgs;
use crate::output;

#[derive(Debug, Serialize)]
struct ScheduleEntry {
    /// 1-based attempt the delay follows
    after_attempt: u32,
    delay_ms: u64,
}

pub fn run(args: ScheduleArgs) -> Result<()> {
    let base = super::secs("base", args.base)?;
    let max = super::secs("max", args.max)?;
    let strategy = BackoffStrategy::from(args.strategy);

    if strategy != BackoffStrategy::Constant && max < base {
        bail!("--max ({}s) is below --base ({}s)", args.max, args.base);
    }

    let backoff = BackoffConfig {
        strategy,
        base_delay_secs: base.as_secs_f64(),
        max_delay_secs: max.as_secs_f64(),
    }
    .to_backoff();

    let entries = entries(&backoff.schedule(args.count));

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    output::header(&format!("{} backoff", backoff.name()));
    for entry in &entries {
        output::kv(
            &format!("after attempt {}", entry.after_attempt),
            &format!("{} ms", entry.delay_ms),
        );
    }

    Ok(())
}

fn entries(delays: &[std::time::Duration]) -> Vec<ScheduleEntry> {
    delays
        .iter()
        .zip(1u32..)
        .map(|(delay, after_attempt)| ScheduleEntry {
            after_attempt,
            delay_ms: delay.as_millis() as u64,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reattempt_core::Backoff;
    use std::time::Duration;

    #[test]
    fn test_entries_number_attempts_from_one() {
        let backoff = Backoff::linear(Duration::from_millis(100), Duration::from_secs(1));
        let entries = entries(&backoff.schedule(3));

        let pairs: Vec<(u32, u64)> = entries
            .iter()
            .map(|e| (e.after_attempt, e.delay_ms))
            .collect();
        assert_eq!(pairs, vec![(1, 0), (2, 100), (3, 200)]);
    }

    #[test]
    fn test_entries_serialize() {
        let entries = entries(&[Duration::from_millis(250)]);
        let json = serde_json::to_value(&entries).unwrap();
        assert_eq!(json, serde_json::json!([{ "after_attempt": 1, "delay_ms": 250 }]));
    }
}
