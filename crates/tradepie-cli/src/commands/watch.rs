//! Long-running dashboard: the polling controller wired to terminal and SVG output.
//!
//! Per-render updates go to stderr so stdout carries only the final summary
//! envelope.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::sync::Notify;
use tradepie_core::{
    render_svg, ChartDimensions, ErrorHandler, LoggingErrorHandler, PieLayout, PollingController,
    PollingFrequency, PollingPhase, Renderer, RetryConfig, Snapshot, TransportError,
};

use crate::cli::{OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output::snapshot_table;

use super::{CommandResult, Context};

#[derive(Debug, Serialize)]
struct WatchSummaryData {
    renders: usize,
    snapshots_applied: u64,
    stale_discarded: u64,
    fetch_failures: u64,
    timers_armed: u64,
    last_frequency: PollingFrequency,
}

/// Prints each snapshot and optionally rewrites an SVG chart.
struct WatchRenderer<W> {
    out: Mutex<W>,
    format: OutputFormat,
    svg: Option<PathBuf>,
    renders: AtomicUsize,
    max_updates: Option<usize>,
    done: Arc<Notify>,
}

impl<W: Write> WatchRenderer<W> {
    fn print(&self, count: usize, snapshot: &Snapshot) -> io::Result<()> {
        let mut out = self.out.lock().expect("watch output lock is not poisoned");
        match self.format {
            OutputFormat::Table => {
                writeln!(out, "update #{count}")?;
                writeln!(out, "{}", snapshot_table(snapshot))?;
            }
            OutputFormat::Json => {
                serde_json::to_writer(&mut *out, snapshot)?;
                writeln!(out)?;
            }
        }
        out.flush()
    }

    fn write_svg(&self, path: &Path, snapshot: &Snapshot) {
        let layout = PieLayout::from_snapshot(snapshot, ChartDimensions::default());
        if let Err(error) = fs::write(path, render_svg(&layout)) {
            tracing::warn!(path = %path.display(), %error, "failed to write chart");
        }
    }
}

impl<W: Write + Send> Renderer for WatchRenderer<W> {
    fn render(&self, snapshot: &Snapshot) {
        let count = self.renders.fetch_add(1, Ordering::SeqCst) + 1;

        if let Err(error) = self.print(count, snapshot) {
            tracing::warn!(%error, "failed to print snapshot");
        }

        if let Some(path) = &self.svg {
            self.write_svg(path, snapshot);
        }

        if self.max_updates.is_some_and(|max| count >= max) {
            self.done.notify_one();
        }
    }
}

/// Logs every failure and keeps the most recent one for the exit status.
#[derive(Default)]
struct LastError {
    last: Mutex<Option<TransportError>>,
}

impl LastError {
    fn take(&self) -> Option<TransportError> {
        self.last
            .lock()
            .expect("last error lock is not poisoned")
            .take()
    }
}

impl ErrorHandler for LastError {
    fn handle_error(&self, error: &TransportError) {
        LoggingErrorHandler.handle_error(error);
        *self.last.lock().expect("last error lock is not poisoned") = Some(error.clone());
    }
}

pub async fn run(
    args: &WatchArgs,
    context: &Context,
    format: OutputFormat,
) -> Result<CommandResult, CliError> {
    let done = Arc::new(Notify::new());
    let renderer = Arc::new(WatchRenderer {
        out: Mutex::new(io::stderr()),
        format,
        svg: args.svg.clone(),
        renders: AtomicUsize::new(0),
        max_updates: args.max_updates,
        done: Arc::clone(&done),
    });
    let errors = Arc::new(LastError::default());
    let retry = if args.no_retry {
        RetryConfig::no_retry()
    } else {
        RetryConfig::default()
    };

    let controller = PollingController::builder(context.data_source.clone(), renderer.clone())
        .config(context.config.polling)
        .retry(retry)
        .error_handler(errors.clone())
        .build();

    let phase = controller.start().await;
    if phase == PollingPhase::Idle {
        return Err(match errors.take() {
            Some(error) => CliError::Transport(error),
            None => CliError::Command(String::from("polling did not start")),
        });
    }
    tracing::info!(%phase, "watching, press Ctrl-C to stop");

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("interrupted");
        }
        () = done.notified() => {
            tracing::debug!("update limit reached");
        }
    }
    controller.stop();

    let status = controller.status();
    let data = serde_json::to_value(WatchSummaryData {
        renders: renderer.renders.load(Ordering::SeqCst),
        snapshots_applied: status.snapshots_applied,
        stale_discarded: status.stale_discarded,
        fetch_failures: status.fetch_failures,
        timers_armed: status.timers_armed,
        last_frequency: status.current_frequency,
    })?;

    let mut result = CommandResult::ok(data).with_cache_hit(false);
    if status.fetch_failures > 0 {
        result = result.with_warning(format!(
            "{} fetch(es) failed while watching",
            status.fetch_failures
        ));
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradepie_core::{Symbol, TradeRecord};

    fn snapshot() -> Snapshot {
        Snapshot::new(vec![TradeRecord::new(
            Symbol::parse("AAA").expect("symbol"),
            10.0,
            "USD",
            1.0,
        )
        .expect("record")])
    }

    #[tokio::test]
    async fn renderer_rewrites_svg_and_signals_limit() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("pie.svg");
        let done = Arc::new(Notify::new());
        let renderer = WatchRenderer {
            out: Mutex::new(Vec::new()),
            format: OutputFormat::Json,
            svg: Some(path.clone()),
            renders: AtomicUsize::new(0),
            max_updates: Some(2),
            done: Arc::clone(&done),
        };

        renderer.render(&snapshot());
        fs::remove_file(&path).expect("first render wrote chart");
        renderer.render(&snapshot());

        assert_eq!(renderer.renders.load(Ordering::SeqCst), 2);
        let svg = fs::read_to_string(&path).expect("second render wrote chart");
        assert!(svg.contains("<title>10 USD</title>"));
        tokio::time::timeout(std::time::Duration::from_secs(1), done.notified())
            .await
            .expect("limit signalled");
    }

    #[test]
    fn renderer_writes_one_json_line_per_update() {
        let renderer = WatchRenderer {
            out: Mutex::new(Vec::new()),
            format: OutputFormat::Json,
            svg: None,
            renders: AtomicUsize::new(0),
            max_updates: None,
            done: Arc::new(Notify::new()),
        };

        renderer.render(&snapshot());
        renderer.render(&Snapshot::default());

        let out = renderer.out.into_inner().expect("watch output lock is not poisoned");
        let text = String::from_utf8(out).expect("utf-8 output");
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: Snapshot = serde_json::from_str(lines[0]).expect("json line");
        assert_eq!(first, snapshot());
        assert_eq!(lines[1], "[]");
    }

    #[test]
    fn renderer_numbers_table_updates() {
        let renderer = WatchRenderer {
            out: Mutex::new(Vec::new()),
            format: OutputFormat::Table,
            svg: None,
            renders: AtomicUsize::new(0),
            max_updates: None,
            done: Arc::new(Notify::new()),
        };

        renderer.render(&snapshot());

        let out = renderer.out.into_inner().expect("watch output lock is not poisoned");
        let text = String::from_utf8(out).expect("utf-8 output");
        assert!(text.starts_with("update #1\nSYMBOL"));
        assert!(text.contains("AAA"));
    }

    #[test]
    fn last_error_keeps_most_recent_failure() {
        let errors = LastError::default();
        errors.handle_error(&TransportError::network("refused"));
        errors.handle_error(&TransportError::status(503));

        assert_eq!(errors.take(), Some(TransportError::status(503)));
        assert_eq!(errors.take(), None);
    }
}
