//! # Tradepie Core
//!
//! Adaptive polling of a trading snapshot endpoint, with the last snapshot
//! persisted across runs and every new snapshot handed to a renderer.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`chart`] | Pie layout and SVG output |
//! | [`config`] | Environment-driven configuration |
//! | [`data_source`] | Snapshot sources, transport errors, the `DataSource` facade |
//! | [`domain`] | `Symbol`, `TradeRecord`, `Snapshot` |
//! | [`error`] | Core error types |
//! | [`frequency`] | Polling constants and the volatility rule |
//! | [`http_client`] | HTTP client abstraction |
//! | [`mock`] | Deterministic offline source |
//! | [`polling`] | The polling controller |
//! | [`retry`] | Bounded retry for the initial load |
//! | [`store`] | Key/value storage and the snapshot cache |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tradepie_core::{
//!     DataSource, FileStore, HttpSnapshotSource, PollingController, Snapshot, SnapshotCache,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = HttpSnapshotSource::new("https://example.test/api/trading")?;
//!     let cache = SnapshotCache::new(Arc::new(FileStore::new("/tmp/tradepie")));
//!     let data_source = DataSource::new(Arc::new(source), cache);
//!
//!     let controller = PollingController::builder(
//!         data_source,
//!         Arc::new(|snapshot: &Snapshot| println!("{} records", snapshot.len())),
//!     )
//!     .build();
//!
//!     controller.start().await;
//!     tokio::signal::ctrl_c().await?;
//!     controller.stop();
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────┐  render   ┌─────────────┐
//! │ PollingController │──────────▶│  Renderer   │
//! └─────────┬─────────┘           └─────────────┘
//!           │ fetch / save / load
//!           ▼
//! ┌───────────────────┐     ┌────────────────┐
//! │    DataSource     │────▶│ SnapshotSource │──▶ HttpClient
//! │                   │────▶│ SnapshotCache  │──▶ KeyValueStore
//! └───────────────────┘     └────────────────┘
//! ```

pub mod chart;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod frequency;
pub mod http_client;
pub mod mock;
pub mod polling;
pub mod retry;
pub mod store;

pub use chart::{render_svg, ChartDimensions, PieLayout, PieSlice, PALETTE};

pub use config::{resolve_tradepie_home, AppConfig, DEFAULT_ENDPOINT};

pub use data_source::{
    decode_trading_payload, DataSource, HttpSnapshotSource, SnapshotFuture, SnapshotSource,
    TransportError, TransportErrorKind,
};

pub use domain::{validate_currency_code, Snapshot, Symbol, TradeRecord};

pub use error::{CoreError, ValidationError};

pub use frequency::{decide_frequency, PollingConfig, PollingFrequency};

pub use http_client::{
    HttpClient, HttpError, HttpErrorKind, HttpFuture, HttpRequest, HttpResponse, ReqwestHttpClient,
};

pub use mock::MockSnapshotSource;

pub use polling::{
    ControllerStatus, ErrorHandler, LoggingErrorHandler, PollingController,
    PollingControllerBuilder, PollingPhase, Renderer,
};

pub use retry::{Backoff, RetryConfig};

pub use store::{FileStore, KeyValueStore, MemoryStore, SnapshotCache, DEFAULT_STORAGE_KEY};
