//! CLI argument definitions for tradepie.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `watch` | Poll the endpoint and render every snapshot |
//! | `fetch` | Fetch one snapshot and persist it |
//! | `decide` | Polling frequency for a snapshot |
//! | `chart` | Write the cached snapshot as an SVG pie chart |
//! | `cache` | Inspect or clear persisted state |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--endpoint` | `$TRADEPIE_ENDPOINT` | Snapshot endpoint URL |
//! | `--home` | `$TRADEPIE_HOME` | State directory |
//! | `--mock` | `false` | Use the offline source (cache kept in memory) |
//! | `--format` | `json` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--timeout-ms` | none | Request timeout in ms |
//!
//! # Examples
//!
//! ```bash
//! tradepie watch --svg /tmp/pie.svg --format table
//! tradepie fetch --pretty
//! tradepie --mock watch --max-updates 3
//! tradepie cache clear-all
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Adaptive trading dashboard for the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "tradepie",
    author,
    version,
    about = "Adaptive trading dashboard",
    long_about = "tradepie polls a trading snapshot endpoint, polling faster while any \
instrument moves by more than the change threshold, and renders each snapshot as a \
table or SVG pie chart. The last snapshot is kept on disk and shown immediately on \
the next start."
)]
pub struct Cli {
    /// Snapshot endpoint URL (overrides TRADEPIE_ENDPOINT).
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Directory holding persisted state (overrides TRADEPIE_HOME).
    #[arg(long, global = true)]
    pub home: Option<PathBuf>,

    /// Serve snapshots from the offline random-walk source. The on-disk cache is
    /// left untouched.
    #[arg(long, global = true, default_value_t = false)]
    pub mock: bool,

    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Request timeout in milliseconds. Requests never time out when unset.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table.
    Table,
    /// Single JSON object.
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll the endpoint until Ctrl-C and render every snapshot.
    ///
    /// Each update is written to stderr (one JSON line per snapshot with
    /// `--format json`); stdout receives only the final summary.
    ///
    /// # Examples
    ///
    ///   tradepie watch
    ///   tradepie watch --svg dashboard.svg --max-updates 10
    Watch(WatchArgs),

    /// Fetch one snapshot, persist it and report its polling frequency.
    Fetch,

    /// Report the polling frequency the cached snapshot (or a file) would select.
    Decide(DecideArgs),

    /// Write the cached snapshot as an SVG pie chart.
    Chart(ChartArgs),

    /// Persisted state commands.
    Cache(CacheArgs),
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Rewrite this SVG file on every render.
    #[arg(long)]
    pub svg: Option<PathBuf>,

    /// Stop after this many renders.
    #[arg(long)]
    pub max_updates: Option<usize>,

    /// Make a single initial fetch attempt instead of retrying.
    #[arg(long, default_value_t = false)]
    pub no_retry: bool,
}

#[derive(Debug, Args)]
pub struct DecideArgs {
    /// JSON file holding a record array or a `{"data": [...]}` payload.
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ChartArgs {
    /// Destination SVG file.
    #[arg(long)]
    pub output: PathBuf,

    #[arg(long, default_value_t = 540)]
    pub width: u32,

    #[arg(long, default_value_t = 540)]
    pub height: u32,
}

#[derive(Debug, Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// Print the cached snapshot.
    Show,
    /// Remove the cached snapshot.
    Clear,
    /// Remove every persisted entry.
    ClearAll,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "tradepie",
            "watch",
            "--max-updates",
            "3",
            "--mock",
            "--format",
            "table",
        ])
        .expect("parses");

        assert!(cli.mock);
        assert_eq!(cli.format, OutputFormat::Table);
        assert_eq!(cli.timeout_ms, None);
        match cli.command {
            Command::Watch(args) => {
                assert_eq!(args.max_updates, Some(3));
                assert!(!args.no_retry);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cache_subcommands_use_kebab_case() {
        let cli = Cli::try_parse_from(["tradepie", "cache", "clear-all"]).expect("parses");
        assert!(matches!(
            cli.command,
            Command::Cache(CacheArgs {
                command: CacheCommand::ClearAll
            })
        ));
    }

    #[test]
    fn chart_requires_output() {
        assert!(Cli::try_parse_from(["tradepie", "chart"]).is_err());
    }
}
