mod cache;
mod chart;
mod decide;
mod fetch;
mod watch;

use std::sync::Arc;

use serde_json::Value;
use tradepie_core::{
    AppConfig, DataSource, FileStore, HttpSnapshotSource, MockSnapshotSource, Snapshot,
    SnapshotCache, SnapshotSource,
};

use crate::cli::{CacheCommand, Cli, Command};
use crate::error::CliError;
use crate::metadata::{Envelope, Metadata};

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
    pub latency_ms: u64,
    pub cache_hit: bool,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            warnings: Vec::new(),
            latency_ms: 0,
            cache_hit: true,
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn with_cache_hit(mut self, cache_hit: bool) -> Self {
        self.cache_hit = cache_hit;
        self
    }
}

/// Resolved configuration plus the data source every command works against.
pub struct Context {
    pub config: AppConfig,
    /// `None` in mock mode, where the cache lives only in memory.
    pub store: Option<FileStore>,
    pub data_source: DataSource,
}

impl Context {
    /// Environment first, then command-line overrides.
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let mut config = AppConfig::from_env().map_err(CliError::Config)?;
        if let Some(endpoint) = &cli.endpoint {
            config.endpoint = endpoint.clone();
        }
        if let Some(home) = &cli.home {
            config.home = home.clone();
        }

        let source: Arc<dyn SnapshotSource> = if cli.mock {
            Arc::new(MockSnapshotSource::default())
        } else {
            Arc::new(
                HttpSnapshotSource::new(config.endpoint.as_str())?
                    .with_timeout_ms(cli.timeout_ms),
            )
        };

        let (store, cache) = snapshot_cache(&config, cli.mock);
        tracing::debug!(
            endpoint = %config.endpoint,
            home = %config.home.display(),
            mock = cli.mock,
            "context resolved"
        );

        Ok(Self {
            config,
            store,
            data_source: DataSource::new(source, cache),
        })
    }

    pub fn cached_snapshot(&self) -> Result<Snapshot, CliError> {
        self.data_source.load_cached_snapshot().ok_or_else(|| {
            CliError::Command(String::from(
                "no cached snapshot; run `tradepie fetch` first",
            ))
        })
    }
}

/// Mock snapshots never reach the on-disk cache.
fn snapshot_cache(config: &AppConfig, mock: bool) -> (Option<FileStore>, SnapshotCache) {
    if mock {
        return (None, SnapshotCache::in_memory());
    }
    let store = FileStore::new(config.home.clone());
    let cache = SnapshotCache::with_key(Arc::new(store.clone()), config.storage_key.as_str());
    (Some(store), cache)
}

pub async fn run(cli: &Cli) -> Result<Envelope, CliError> {
    let context = Context::from_cli(cli)?;

    let command_result = match &cli.command {
        Command::Watch(args) => watch::run(args, &context, cli.format).await?,
        Command::Fetch => fetch::run(&context).await?,
        Command::Decide(args) => decide::run(args, &context)?,
        Command::Chart(args) => chart::run(args, &context)?,
        Command::Cache(args) => match args.command {
            CacheCommand::Show => cache::show(&context)?,
            CacheCommand::Clear => cache::clear(&context)?,
            CacheCommand::ClearAll => cache::clear_all(&context)?,
        },
    };

    let CommandResult {
        data,
        warnings,
        latency_ms,
        cache_hit,
    } = command_result;

    let mut meta = Metadata::new(latency_ms, cache_hit)?;
    for warning in warnings {
        meta.push_warning(warning);
    }

    Ok(Envelope { meta, data })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use clap::Parser;

    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("tradepie").chain(args.iter().copied()))
            .expect("arguments should parse")
    }

    #[tokio::test]
    async fn mock_fetch_leaves_home_untouched() {
        let home = tempfile::tempdir().expect("tempdir");
        let home_arg = home.path().to_str().expect("utf-8 path");
        let context = Context::from_cli(&cli(&["--mock", "--home", home_arg, "fetch"]))
            .expect("context");

        fetch::run(&context).await.expect("mock fetch");

        assert!(context.store.is_none());
        assert!(context.data_source.load_cached_snapshot().is_some());
        let entries = fs::read_dir(home.path()).expect("home").count();
        assert_eq!(entries, 0);
    }

    #[tokio::test]
    async fn real_context_persists_under_home() {
        let home = tempfile::tempdir().expect("tempdir");
        let home_arg = home.path().to_str().expect("utf-8 path");
        let context = Context::from_cli(&cli(&["--home", home_arg, "cache", "show"]))
            .expect("context");

        let store = context.store.as_ref().expect("file store");
        assert_eq!(store.root(), home.path());
        context.data_source.save_snapshot(&Snapshot::default());
        assert!(store.path_for(context.data_source.cache().key()).exists());
    }
}
