//! Per-connection search bridge.
//!
//! A [`SearchBridge`] sits between one search socket and one
//! [`SearchService`]. Incoming text frames are decoded into
//! [`SearchRequest`]s and forwarded to the service; the batches the
//! service publishes are relayed to a [`ResultsCallback`] in the order
//! they were produced, with empty batches dropped.
//!
//! The bridge is owned by exactly one connection. Dropping it stops the
//! relay task and the search worker, so nothing outlives the socket.

use marquee_content::{MovieContent, SearchService, SearchUpdate};
use marquee_types::{Movie, SearchRequest};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Receiver of the results relayed by a [`SearchBridge`].
pub trait ResultsCallback: Send + 'static {
    /// Called once per non-empty result batch, in production order.
    fn on_results(&mut self, movies: &[Movie]);

    /// Called when the content service failed to produce a batch.
    fn on_error(&mut self, message: &str);
}

/// Errors returned by [`SearchBridge::submit`].
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The message is not a valid search request.
    #[error("Malformed search request: {0}")]
    MalformedRequest(#[from] serde_json::Error),
}

/// Adapter from socket messages to an incremental search session.
#[derive(Debug)]
pub struct SearchBridge {
    service: SearchService,
    relay: JoinHandle<()>,
}

impl SearchBridge {
    /// Start a search session over `content` that reports to `callback`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new<C: ResultsCallback>(content: MovieContent, page_size: u32, callback: C) -> Self {
        let (publisher, updates) = mpsc::unbounded_channel();
        let service = SearchService::spawn(content, page_size, publisher);
        let relay = tokio::spawn(relay_updates(updates, callback));
        Self { service, relay }
    }

    /// Decode one socket message and forward it to the search session.
    ///
    /// A `nextPage` request advances the current query; anything else
    /// starts a new query. Results arrive later through the callback.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::MalformedRequest`] if `message` does not
    /// decode. The search session is left untouched in that case.
    pub fn submit(&self, message: &str) -> Result<SearchRequest, BridgeError> {
        let request = SearchRequest::decode(message)?;
        debug!(query = %request.query, next_page = request.next_page, "Search request");
        if request.next_page {
            self.service.next_page();
        } else {
            self.service.handle_query(request.query.as_str());
        }
        Ok(request)
    }
}

impl Drop for SearchBridge {
    fn drop(&mut self) {
        self.relay.abort();
    }
}

async fn relay_updates<C: ResultsCallback>(
    mut updates: mpsc::UnboundedReceiver<SearchUpdate>,
    mut callback: C,
) {
    while let Some(update) = updates.recv().await {
        match update {
            SearchUpdate::Results(movies) if movies.is_empty() => {
                debug!("Suppressing empty result batch");
            }
            SearchUpdate::Results(movies) => callback.on_results(&movies),
            SearchUpdate::Failed(message) => callback.on_error(&message),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::time::Duration;

    use marquee_content::{Catalog, CatalogEntry, ContentConnector};
    use marquee_types::{AuthSettings, MovieId};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[derive(Debug)]
    enum Delivered {
        Results(Vec<MovieId>),
        Error(String),
    }

    struct ChannelCallback(mpsc::UnboundedSender<Delivered>);

    impl ResultsCallback for ChannelCallback {
        fn on_results(&mut self, movies: &[Movie]) {
            let _ = self
                .0
                .send(Delivered::Results(movies.iter().map(|m| m.id).collect()));
        }

        fn on_error(&mut self, message: &str) {
            let _ = self.0.send(Delivered::Error(message.to_owned()));
        }
    }

    fn content() -> MovieContent {
        let titles = [
            (1, "The Matrix"),
            (2, "The Matrix Reloaded"),
            (3, "The Matrix Revolutions"),
            (4, "The Matrix Resurrections"),
            (20, "Heat"),
            (21, "Heathers"),
        ];
        MovieContent::catalog(Catalog::new(titles.into_iter().map(|(id, title)| {
            CatalogEntry {
                movie: Movie::new(id, title),
                genres: Vec::new(),
            }
        })))
    }

    fn bridge() -> (SearchBridge, mpsc::UnboundedReceiver<Delivered>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (SearchBridge::new(content(), 2, ChannelCallback(tx)), rx)
    }

    async fn next(rx: &mut mpsc::UnboundedReceiver<Delivered>) -> Vec<MovieId> {
        match tokio::time::timeout(Duration::from_secs(5), rx.recv()).await {
            Ok(Some(Delivered::Results(ids))) => ids,
            other => panic!("expected results, got {other:?}"),
        }
    }

    async fn assert_quiet(rx: &mut mpsc::UnboundedReceiver<Delivered>) {
        let waited = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await;
        assert!(waited.is_err(), "unexpected delivery: {waited:?}");
    }

    #[tokio::test]
    async fn query_and_next_page_are_relayed_in_order() {
        let (bridge, mut rx) = bridge();

        bridge.submit(r#"{"query":"matrix","nextPage":false}"#).unwrap();
        assert_eq!(next(&mut rx).await, vec![1, 2]);

        bridge.submit(r#"{"query":"","nextPage":true}"#).unwrap();
        assert_eq!(next(&mut rx).await, vec![3, 4]);
    }

    #[tokio::test]
    async fn new_query_after_paging_starts_at_page_one() {
        let (bridge, mut rx) = bridge();

        bridge.submit(r#"{"query":"matrix","nextPage":false}"#).unwrap();
        bridge.submit(r#"{"query":"","nextPage":true}"#).unwrap();
        assert_eq!(next(&mut rx).await, vec![1, 2]);
        assert_eq!(next(&mut rx).await, vec![3, 4]);

        bridge.submit(r#"{"query":"heat","nextPage":false}"#).unwrap();
        assert_eq!(next(&mut rx).await, vec![20, 21]);
    }

    #[tokio::test]
    async fn empty_batches_are_never_delivered() {
        let (bridge, mut rx) = bridge();

        bridge.submit(r#"{"query":"no such movie","nextPage":false}"#).unwrap();
        bridge.submit(r#"{"query":"","nextPage":true}"#).unwrap();
        assert_quiet(&mut rx).await;

        bridge.submit(r#"{"query":"heat","nextPage":false}"#).unwrap();
        assert_eq!(next(&mut rx).await, vec![20, 21]);
        bridge.submit(r#"{"query":"","nextPage":true}"#).unwrap();
        assert_quiet(&mut rx).await;
    }

    #[tokio::test]
    async fn malformed_message_leaves_the_session_alone() {
        let (bridge, mut rx) = bridge();

        bridge.submit(r#"{"query":"matrix","nextPage":false}"#).unwrap();
        assert_eq!(next(&mut rx).await, vec![1, 2]);

        let err = bridge.submit(r#"{"query":"heat"}"#).unwrap_err();
        assert!(err.to_string().starts_with("Malformed search request:"));
        assert!(bridge.submit("matrix").is_err());
        assert_quiet(&mut rx).await;

        bridge.submit(r#"{"query":"","nextPage":true}"#).unwrap();
        assert_eq!(next(&mut rx).await, vec![3, 4]);
    }

    #[tokio::test]
    async fn dropping_the_bridge_stops_delivery() {
        let (bridge, mut rx) = bridge();
        drop(bridge);

        let closed = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await;
        assert!(matches!(closed, Ok(None)));
    }

    /// Db2 backend whose first search job answers 500.
    async fn failing_once_db2() -> (MockServer, MovieContent) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/auth"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "token": "tok" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/services/execsql"))
            .respond_with(ResponseTemplate::new(500).set_body_string("SQL0204N"))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/services/execsql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "resultSet": [ { "ID": 20, "TITLE": "Heat" } ]
            })))
            .mount(&server)
            .await;

        let addr = server.address();
        let settings = AuthSettings {
            hostname: addr.ip().to_string(),
            database: String::from("movies"),
            db_port: 50000,
            rest_port: addr.port(),
            ssl: false,
            password: String::from("pw"),
            username: String::from("db2inst1"),
            expiry_time: String::from("1h"),
        };
        let content = ContentConnector::Db2.connect(&settings).await.unwrap();
        (server, content)
    }

    #[tokio::test]
    async fn backend_failure_reaches_the_error_callback() {
        let (_server, content) = failing_once_db2().await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let bridge = SearchBridge::new(content, 2, ChannelCallback(tx));

        bridge.submit(r#"{"query":"heat","nextPage":false}"#).unwrap();
        match tokio::time::timeout(Duration::from_secs(5), rx.recv()).await {
            Ok(Some(Delivered::Error(message))) => {
                assert!(message.starts_with("Couldn't search movies! Error:"), "{message}");
            }
            other => panic!("expected error, got {other:?}"),
        }

        bridge.submit(r#"{"query":"","nextPage":true}"#).unwrap();
        assert_eq!(next(&mut rx).await, vec![20]);
    }
}
