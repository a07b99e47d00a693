//! Test doubles shared by the behavior suites.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tradepie_core::{
    Snapshot, SnapshotFuture, SnapshotSource, Symbol, TradeRecord, TransportError,
};

pub fn record(symbol: &str, price: f64, change_pct: f64) -> TradeRecord {
    TradeRecord::new(
        Symbol::parse(symbol).expect("valid symbol"),
        price,
        "USD",
        change_pct,
    )
    .expect("valid record")
}

/// Every change at or below the default 3% threshold.
pub fn calm_snapshot() -> Snapshot {
    Snapshot::new(vec![record("AAA", 10.0, 1.0), record("DDD", 20.0, -2.0)])
}

/// One record above the default 3% threshold.
pub fn volatile_snapshot() -> Snapshot {
    Snapshot::new(vec![record("BBB", 5.0, 4.0), record("EEE", 7.5, 0.2)])
}

pub enum Step {
    Ok(Snapshot),
    Fail(TransportError),
    Delayed(Duration, Snapshot),
}

/// Replays a fixed script of fetch outcomes; fails once the script runs out.
#[derive(Default)]
pub struct ScriptedSource {
    script: Mutex<VecDeque<Step>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(steps.into()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SnapshotSource for ScriptedSource {
    fn fetch_snapshot(&self) -> SnapshotFuture<'_> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .script
            .lock()
            .expect("script lock should not be poisoned")
            .pop_front();

        Box::pin(async move {
            match step {
                Some(Step::Ok(snapshot)) => Ok(snapshot),
                Some(Step::Fail(error)) => Err(error),
                Some(Step::Delayed(delay, snapshot)) => {
                    tokio::time::sleep(delay).await;
                    Ok(snapshot)
                }
                None => Err(TransportError::network("script exhausted")),
            }
        })
    }
}

/// Collects every rendered snapshot.
#[derive(Default, Clone)]
pub struct RenderLog {
    renders: Arc<Mutex<Vec<Snapshot>>>,
}

impl RenderLog {
    pub fn renderer(&self) -> Arc<dyn tradepie_core::Renderer> {
        let renders = Arc::clone(&self.renders);
        Arc::new(move |snapshot: &Snapshot| {
            renders
                .lock()
                .expect("render log should not be poisoned")
                .push(snapshot.clone());
        })
    }

    pub fn renders(&self) -> Vec<Snapshot> {
        self.renders
            .lock()
            .expect("render log should not be poisoned")
            .clone()
    }

    pub fn count(&self) -> usize {
        self.renders().len()
    }
}

/// Counts error handler invocations.
#[derive(Default, Clone)]
pub struct ErrorLog {
    errors: Arc<Mutex<Vec<TransportError>>>,
}

impl ErrorLog {
    pub fn handler(&self) -> Arc<dyn tradepie_core::ErrorHandler> {
        let errors = Arc::clone(&self.errors);
        Arc::new(move |error: &TransportError| {
            errors
                .lock()
                .expect("error log should not be poisoned")
                .push(error.clone());
        })
    }

    pub fn count(&self) -> usize {
        self.errors
            .lock()
            .expect("error log should not be poisoned")
            .len()
    }
}
