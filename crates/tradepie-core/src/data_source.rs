//! Snapshot fetching and the [`DataSource`] facade.
//!
//! A [`DataSource`] pairs one [`SnapshotSource`] (the network side) with one
//! [`SnapshotCache`] (the persisted last-seen snapshot). The polling controller
//! only ever talks to this facade.
//!
//! # Error taxonomy
//!
//! Fetching fails with [`TransportError`] only. Persistence never fails: a
//! missing or unreadable cache is "no cached data".

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::store::SnapshotCache;
use crate::{Snapshot, ValidationError};

/// Transport failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connection, DNS, timeout or body read failure.
    Network,
    /// Endpoint answered with a non-2xx status.
    Status,
    /// Body was not a valid trading payload.
    Decode,
}

/// Failure surfaced by [`SnapshotSource::fetch_snapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    kind: TransportErrorKind,
    message: String,
    status: Option<u16>,
}

impl TransportError {
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Network,
            message: message.into(),
            status: None,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            kind: TransportErrorKind::Status,
            message: format!("endpoint returned status {status}"),
            status: Some(status),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Decode,
            message: message.into(),
            status: None,
        }
    }

    pub const fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP status for [`TransportErrorKind::Status`] failures.
    pub const fn http_status(&self) -> Option<u16> {
        self.status
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            TransportErrorKind::Network => "transport.network",
            TransportErrorKind::Status => "transport.status",
            TransportErrorKind::Decode => "transport.decode",
        }
    }
}

impl Display for TransportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for TransportError {}

/// Boxed future returned by [`SnapshotSource::fetch_snapshot`].
pub type SnapshotFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Snapshot, TransportError>> + Send + 'a>>;

/// Producer of fresh snapshots.
///
/// Implementations perform exactly one attempt per call: no retry, no implicit
/// timeout. Callers decide what to do with a failure.
pub trait SnapshotSource: Send + Sync {
    fn fetch_snapshot(&self) -> SnapshotFuture<'_>;
}

#[derive(Debug, Deserialize)]
struct TradingPayload {
    data: Snapshot,
}

/// Decode a trading endpoint body of the form `{"data": [...]}`.
pub fn decode_trading_payload(body: &str) -> Result<Snapshot, TransportError> {
    serde_json::from_str::<TradingPayload>(body)
        .map(|payload| payload.data)
        .map_err(|error| TransportError::decode(format!("malformed trading payload: {error}")))
}

/// Snapshot source reading one fixed HTTP endpoint.
#[derive(Clone)]
pub struct HttpSnapshotSource {
    endpoint: String,
    timeout_ms: Option<u64>,
    http_client: Arc<dyn HttpClient>,
}

impl HttpSnapshotSource {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, ValidationError> {
        Self::with_http_client(endpoint, Arc::new(ReqwestHttpClient::default()))
    }

    pub fn with_http_client(
        endpoint: impl Into<String>,
        http_client: Arc<dyn HttpClient>,
    ) -> Result<Self, ValidationError> {
        let endpoint = endpoint.into();
        let trimmed = endpoint.trim();
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(ValidationError::InvalidEndpoint { value: endpoint });
        }

        Ok(Self {
            endpoint: trimmed.to_owned(),
            timeout_ms: None,
            http_client,
        })
    }

    pub fn with_timeout_ms(mut self, timeout_ms: Option<u64>) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl SnapshotSource for HttpSnapshotSource {
    fn fetch_snapshot(&self) -> SnapshotFuture<'_> {
        Box::pin(async move {
            let request = HttpRequest::get(&self.endpoint)
                .with_timeout(self.timeout_ms.map(Duration::from_millis));

            let response = self
                .http_client
                .send(request)
                .await
                .map_err(|error| TransportError::network(error.to_string()))?;

            if !response.is_success() {
                return Err(TransportError::status(response.status));
            }

            decode_trading_payload(&response.body)
        })
    }
}

/// Fetch-and-remember facade consumed by the polling controller.
#[derive(Clone)]
pub struct DataSource {
    source: Arc<dyn SnapshotSource>,
    cache: SnapshotCache,
}

impl DataSource {
    pub fn new(source: Arc<dyn SnapshotSource>, cache: SnapshotCache) -> Self {
        Self { source, cache }
    }

    /// One network attempt; failures are returned as-is.
    pub fn fetch_snapshot(&self) -> SnapshotFuture<'_> {
        self.source.fetch_snapshot()
    }

    pub fn load_cached_snapshot(&self) -> Option<Snapshot> {
        self.cache.load_cached_snapshot()
    }

    pub fn save_snapshot(&self, snapshot: &Snapshot) {
        self.cache.save_snapshot(snapshot);
    }

    pub fn clear_snapshot(&self) {
        self.cache.clear_snapshot();
    }

    pub fn clear_all(&self) {
        self.cache.clear_all();
    }

    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::{HttpError, HttpFuture, HttpResponse};
    use std::sync::Mutex;

    #[derive(Debug)]
    struct RecordingHttpClient {
        response: Result<HttpResponse, HttpError>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl RecordingHttpClient {
        fn new(response: Result<HttpResponse, HttpError>) -> Self {
            Self {
                response,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn recorded_requests(&self) -> Vec<HttpRequest> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .clone()
        }
    }

    impl HttpClient for RecordingHttpClient {
        fn send(&self, request: HttpRequest) -> HttpFuture<'_> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .push(request);
            let response = self.response.clone();
            Box::pin(async move { response })
        }
    }

    fn source_with(
        response: Result<HttpResponse, HttpError>,
    ) -> (HttpSnapshotSource, Arc<RecordingHttpClient>) {
        let client = Arc::new(RecordingHttpClient::new(response));
        let source =
            HttpSnapshotSource::with_http_client("https://example.test/trading", client.clone())
                .expect("valid endpoint");
        (source, client)
    }

    #[tokio::test]
    async fn decodes_data_field_in_order() {
        let (source, client) = source_with(Ok(HttpResponse::ok_json(
            r#"{"data":[
                {"symbol":"BBB","price":5,"currency":"USD","change_pct":4},
                {"symbol":"AAA","price":10,"currency":"USD","change_pct":1}
            ],"extra":true}"#,
        )));

        let snapshot = source.fetch_snapshot().await.expect("payload should decode");
        let symbols: Vec<_> = snapshot.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["BBB", "AAA"]);

        let requests = client.recorded_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "https://example.test/trading");
        assert_eq!(requests[0].accept, "application/json");
        assert_eq!(requests[0].timeout, None);
    }

    #[test]
    fn decodes_index_tickers_and_full_precision_prices() {
        let snapshot = decode_trading_payload(
            r#"{"data":[
                {"symbol":"^GSPC","price":9229.550667678897,"currency":"usd","change_pct":-0.4},
                {"symbol":"BRK B","price":412.3,"currency":"USD","change_pct":0.1}
            ]}"#,
        )
        .expect("index tickers should decode");

        let first = &snapshot.records()[0];
        assert_eq!(first.symbol.as_str(), "^GSPC");
        assert_eq!(first.currency, "usd");
        assert_eq!(first.price.to_bits(), 9229.550667678897_f64.to_bits());
        assert_eq!(snapshot.records()[1].symbol.as_str(), "BRK B");
    }

    #[tokio::test]
    async fn non_success_status_is_status_error() {
        let (source, _) = source_with(Ok(HttpResponse::with_status(502, "bad gateway")));

        let error = source.fetch_snapshot().await.expect_err("must fail");
        assert_eq!(error.kind(), TransportErrorKind::Status);
        assert_eq!(error.http_status(), Some(502));
        assert_eq!(error.code(), "transport.status");
    }

    #[tokio::test]
    async fn transport_failure_is_network_error() {
        let (source, _) = source_with(Err(HttpError::connect("refused")));

        let error = source.fetch_snapshot().await.expect_err("must fail");
        assert_eq!(error.kind(), TransportErrorKind::Network);
        assert!(error.message().contains("refused"));
    }

    #[tokio::test]
    async fn missing_data_field_is_decode_error() {
        let (source, _) = source_with(Ok(HttpResponse::ok_json(r#"{"items":[]}"#)));

        let error = source.fetch_snapshot().await.expect_err("must fail");
        assert_eq!(error.kind(), TransportErrorKind::Decode);
    }

    #[tokio::test]
    async fn invalid_record_is_decode_error() {
        let (source, _) = source_with(Ok(HttpResponse::ok_json(
            r#"{"data":[{"symbol":"AAA","price":-1,"currency":"USD","change_pct":0}]}"#,
        )));

        let error = source.fetch_snapshot().await.expect_err("must fail");
        assert_eq!(error.kind(), TransportErrorKind::Decode);
    }

    #[test]
    fn rejects_non_http_endpoint() {
        let client = Arc::new(RecordingHttpClient::new(Ok(HttpResponse::ok_json("{}"))));
        let result = HttpSnapshotSource::with_http_client("ftp://example.test", client);
        assert!(matches!(
            result,
            Err(ValidationError::InvalidEndpoint { .. })
        ));
    }
}
