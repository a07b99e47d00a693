use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tradepie_core::{decide_frequency, PollingFrequency, Snapshot};

use crate::cli::DecideArgs;
use crate::error::CliError;

use super::{CommandResult, Context};

#[derive(Debug, Serialize)]
struct DecideResponseData {
    source: String,
    records: usize,
    max_change_pct: Option<f64>,
    change_threshold_pct: f64,
    frequency: PollingFrequency,
    interval_ms: u64,
}

pub fn run(args: &DecideArgs, context: &Context) -> Result<CommandResult, CliError> {
    let (snapshot, source, cache_hit) = match &args.file {
        Some(path) => (read_snapshot(path)?, path.display().to_string(), false),
        None => (
            context.cached_snapshot()?,
            String::from(context.data_source.cache().key()),
            true,
        ),
    };

    let polling = &context.config.polling;
    let frequency = decide_frequency(&snapshot, polling);
    let data = serde_json::to_value(DecideResponseData {
        source,
        records: snapshot.len(),
        max_change_pct: snapshot.max_change_pct(),
        change_threshold_pct: polling.change_threshold_pct(),
        frequency,
        interval_ms: u64::try_from(frequency.period(polling).as_millis()).unwrap_or(u64::MAX),
    })?;

    Ok(CommandResult::ok(data).with_cache_hit(cache_hit))
}

/// Accepts either a bare record array or a fetch body (`{"data": [...]}`).
fn read_snapshot(path: &Path) -> Result<Snapshot, CliError> {
    let raw = fs::read_to_string(path)?;
    let payload = match serde_json::from_str::<Value>(&raw)? {
        Value::Object(mut body) => body.remove("data").unwrap_or(Value::Null),
        other => other,
    };
    Ok(serde_json::from_value(payload)?)
}
