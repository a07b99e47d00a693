use serde::Serialize;
use tradepie_core::Snapshot;

use crate::error::CliError;

use super::{CommandResult, Context};

#[derive(Debug, Serialize)]
struct CacheShowData {
    key: String,
    path: Option<String>,
    snapshot: Option<Snapshot>,
}

#[derive(Debug, Serialize)]
struct CacheClearData {
    cleared: &'static str,
    home: Option<String>,
}

pub fn show(context: &Context) -> Result<CommandResult, CliError> {
    let key = context.data_source.cache().key();
    let snapshot = context.data_source.load_cached_snapshot();
    let hit = snapshot.is_some();

    let data = serde_json::to_value(CacheShowData {
        key: String::from(key),
        path: context
            .store
            .as_ref()
            .map(|store| store.path_for(key).display().to_string()),
        snapshot,
    })?;

    let mut result = CommandResult::ok(data).with_cache_hit(hit);
    if !hit {
        result = result.with_warning("no cached snapshot");
    }
    Ok(result)
}

pub fn clear(context: &Context) -> Result<CommandResult, CliError> {
    context.data_source.clear_snapshot();
    cleared(context, "snapshot")
}

pub fn clear_all(context: &Context) -> Result<CommandResult, CliError> {
    context.data_source.clear_all();
    cleared(context, "all")
}

fn cleared(context: &Context, scope: &'static str) -> Result<CommandResult, CliError> {
    let data = serde_json::to_value(CacheClearData {
        cleared: scope,
        home: context
            .store
            .as_ref()
            .map(|store| store.root().display().to_string()),
    })?;
    Ok(CommandResult::ok(data).with_cache_hit(false))
}
