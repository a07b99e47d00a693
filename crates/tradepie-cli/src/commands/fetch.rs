use std::time::{Duration, Instant};

use serde::Serialize;
use tradepie_core::{decide_frequency, PollingFrequency, Snapshot};

use crate::error::CliError;

use super::{CommandResult, Context};

#[derive(Debug, Serialize)]
struct FetchResponseData {
    frequency: PollingFrequency,
    interval_ms: u64,
    max_change_pct: Option<f64>,
    snapshot: Snapshot,
}

pub async fn run(context: &Context) -> Result<CommandResult, CliError> {
    let started = Instant::now();
    let snapshot = context.data_source.fetch_snapshot().await?;
    let latency_ms = millis(started.elapsed());

    context.data_source.save_snapshot(&snapshot);

    let polling = &context.config.polling;
    let frequency = decide_frequency(&snapshot, polling);
    let empty = snapshot.is_empty();
    let data = serde_json::to_value(FetchResponseData {
        frequency,
        interval_ms: millis(frequency.period(polling)),
        max_change_pct: snapshot.max_change_pct(),
        snapshot,
    })?;

    let mut result = CommandResult::ok(data)
        .with_latency(latency_ms)
        .with_cache_hit(false);
    if empty {
        result = result.with_warning("endpoint returned no records");
    }
    Ok(result)
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
