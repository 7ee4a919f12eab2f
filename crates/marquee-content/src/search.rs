//! Incremental search sessions.
//!
//! A [`SearchService`] is a stateful search over one [`MovieContent`]
//! handle. It remembers the current query and its pagination cursor, and
//! every request (a new query or a "next page" advance) produces exactly
//! one [`SearchUpdate`] on the publisher channel it was spawned with.
//!
//! # Architecture
//!
//! Requests are queued on an unbounded command channel and served by a
//! single worker task that owns the cursor. Backend calls therefore run
//! one at a time and updates are published in request order. Dropping
//! the service aborts the worker, so a closed connection never leaves a
//! search task running.

use marquee_types::Movie;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::content::MovieContent;

/// One publication from a search session.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchUpdate {
    /// A page of results. May be empty (no matches, or past the last page).
    Results(Vec<Movie>),
    /// The backend call for this request failed.
    Failed(String),
}

#[derive(Debug)]
enum SearchCommand {
    Query(String),
    NextPage,
}

/// Current query and the last page successfully published for it.
///
/// `page` is `None` until the first page of `query` has been fetched, so
/// a failed first fetch is retried from page 0.
#[derive(Debug, Default)]
struct SearchCursor {
    query: Option<String>,
    page: Option<u32>,
}

/// Handle to a running incremental search session.
#[derive(Debug)]
pub struct SearchService {
    commands: mpsc::UnboundedSender<SearchCommand>,
    worker: JoinHandle<()>,
}

impl SearchService {
    /// Spawn a search session over `content`.
    ///
    /// Each request publishes one [`SearchUpdate`] on `publisher`. The
    /// worker stops on its own once the publisher's receiver is dropped.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(
        content: MovieContent,
        page_size: u32,
        publisher: mpsc::UnboundedSender<SearchUpdate>,
    ) -> Self {
        let (commands, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(content, page_size.max(1), rx, publisher));
        Self { commands, worker }
    }

    /// Start a brand-new query, discarding the previous query's cursor.
    pub fn handle_query(&self, query: impl Into<String>) {
        self.send(SearchCommand::Query(query.into()));
    }

    /// Advance the current query to its next page.
    ///
    /// Only the new page is published; earlier pages are not re-sent.
    pub fn next_page(&self) {
        self.send(SearchCommand::NextPage);
    }

    fn send(&self, command: SearchCommand) {
        if self.commands.send(command).is_err() {
            debug!("Search worker already stopped, dropping request");
        }
    }
}

impl Drop for SearchService {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

async fn run_worker(
    content: MovieContent,
    page_size: u32,
    mut commands: mpsc::UnboundedReceiver<SearchCommand>,
    publisher: mpsc::UnboundedSender<SearchUpdate>,
) {
    let mut cursor = SearchCursor::default();

    while let Some(command) = commands.recv().await {
        let update = match command {
            SearchCommand::Query(query) => {
                let query = query.trim().to_owned();
                cursor = SearchCursor::default();
                if query.is_empty() {
                    SearchUpdate::Results(Vec::new())
                } else {
                    let update = fetch(&content, &query, 0, page_size).await;
                    if matches!(update, SearchUpdate::Results(_)) {
                        cursor.page = Some(0);
                    }
                    cursor.query = Some(query);
                    update
                }
            }
            SearchCommand::NextPage => match cursor.query.as_deref() {
                None => SearchUpdate::Results(Vec::new()),
                Some(query) => {
                    let next = cursor.page.map_or(0, |page| page.saturating_add(1));
                    let update = fetch(&content, query, next, page_size).await;
                    if matches!(update, SearchUpdate::Results(_)) {
                        cursor.page = Some(next);
                    }
                    update
                }
            },
        };

        if publisher.send(update).is_err() {
            debug!("Search subscriber gone, stopping worker");
            return;
        }
    }
}

async fn fetch(content: &MovieContent, query: &str, page: u32, page_size: u32) -> SearchUpdate {
    match content.search(query, page, page_size).await {
        Ok(movies) => {
            debug!(query, page, results = movies.len(), "Search page fetched");
            SearchUpdate::Results(movies)
        }
        Err(e) => {
            warn!(query, page, error = %e, "Search page failed");
            SearchUpdate::Failed(format!("Couldn't search movies! Error: {e}"))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, clippy::indexing_slicing)]
mod tests {
    use std::time::Duration;

    use marquee_types::{AuthSettings, MovieId};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::catalog::{Catalog, CatalogEntry};
    use crate::db2::Db2Handler;

    fn catalog() -> MovieContent {
        let titles = [
            (1, "Matrix A"),
            (2, "Matrix B"),
            (3, "Matrix C"),
            (4, "Matrix D"),
            (5, "Matrix E"),
            (10, "Alien"),
            (11, "Aliens"),
            (12, "Alien 3"),
        ];
        MovieContent::catalog(Catalog::new(titles.into_iter().map(|(id, title)| {
            CatalogEntry {
                movie: Movie::new(id, title),
                genres: Vec::new(),
            }
        })))
    }

    async fn next_ids(rx: &mut mpsc::UnboundedReceiver<SearchUpdate>) -> Vec<MovieId> {
        let update = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        match update {
            SearchUpdate::Results(movies) => movies.iter().map(|m| m.id).collect(),
            SearchUpdate::Failed(e) => panic!("search failed: {e}"),
        }
    }

    #[tokio::test]
    async fn query_then_next_page_walks_the_same_query() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let service = SearchService::spawn(catalog(), 2, tx);

        service.handle_query("matrix");
        assert_eq!(next_ids(&mut rx).await, vec![1, 2]);

        service.next_page();
        assert_eq!(next_ids(&mut rx).await, vec![3, 4]);

        service.next_page();
        assert_eq!(next_ids(&mut rx).await, vec![5]);

        service.next_page();
        assert!(next_ids(&mut rx).await.is_empty());
    }

    #[tokio::test]
    async fn new_query_resets_pagination() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let service = SearchService::spawn(catalog(), 2, tx);

        service.handle_query("matrix");
        service.next_page();
        service.next_page();
        let _ = next_ids(&mut rx).await;
        let _ = next_ids(&mut rx).await;
        let _ = next_ids(&mut rx).await;

        service.handle_query("alien");
        assert_eq!(next_ids(&mut rx).await, vec![10, 11]);

        service.next_page();
        assert_eq!(next_ids(&mut rx).await, vec![12]);
    }

    #[tokio::test]
    async fn next_page_without_query_publishes_nothing_useful() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let service = SearchService::spawn(catalog(), 2, tx);

        service.next_page();
        assert!(next_ids(&mut rx).await.is_empty());
    }

    #[tokio::test]
    async fn blank_query_clears_the_cursor() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let service = SearchService::spawn(catalog(), 2, tx);

        service.handle_query("matrix");
        let _ = next_ids(&mut rx).await;

        service.handle_query("   ");
        assert!(next_ids(&mut rx).await.is_empty());

        service.next_page();
        assert!(next_ids(&mut rx).await.is_empty());
    }

    #[tokio::test]
    async fn worker_stops_when_subscriber_is_dropped() {
        let (tx, rx) = mpsc::unbounded_channel();
        let service = SearchService::spawn(catalog(), 2, tx);
        drop(rx);

        service.handle_query("matrix");
        tokio::time::timeout(Duration::from_secs(5), async {
            while !service.worker.is_finished() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
    }

    /// Db2 backend whose first `failures` search jobs answer 500 and the
    /// rest answer one row.
    async fn flaky_db2(failures: u64) -> (MockServer, MovieContent) {
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
            .up_to_n_times(failures)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/services/execsql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "resultSet": [ { "ID": 603, "TITLE": "The Matrix" } ]
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
        let content = MovieContent::db2(Db2Handler::connect(&settings).await.unwrap());
        (server, content)
    }

    /// `OFFSET` of every search job the server received, in order.
    async fn requested_offsets(server: &MockServer) -> Vec<u64> {
        server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|request| request.url.path() == "/v1/services/execsql")
            .map(|request| {
                let body: serde_json::Value = request.body_json().unwrap();
                body["parameters"]["3"].as_u64().unwrap()
            })
            .collect()
    }

    async fn next_update(rx: &mut mpsc::UnboundedReceiver<SearchUpdate>) -> SearchUpdate {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn backend_failure_is_published_as_message() {
        let (_server, content) = flaky_db2(1).await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let service = SearchService::spawn(content, 2, tx);

        service.handle_query("matrix");
        match next_update(&mut rx).await {
            SearchUpdate::Failed(message) => {
                assert!(message.starts_with("Couldn't search movies! Error:"), "{message}");
                assert!(message.contains("500"), "{message}");
            }
            SearchUpdate::Results(movies) => panic!("expected failure, got {movies:?}"),
        }

        // The session keeps serving after a failure.
        service.handle_query("matrix");
        assert_eq!(next_ids(&mut rx).await, vec![603]);
    }

    #[tokio::test]
    async fn failed_first_page_is_retried_by_next_page() {
        let (server, content) = flaky_db2(1).await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let service = SearchService::spawn(content, 2, tx);

        service.handle_query("matrix");
        assert!(matches!(next_update(&mut rx).await, SearchUpdate::Failed(_)));

        service.next_page();
        assert_eq!(next_ids(&mut rx).await, vec![603]);

        service.next_page();
        assert_eq!(next_ids(&mut rx).await, vec![603]);

        assert_eq!(requested_offsets(&server).await, vec![0, 0, 2]);
    }

    #[tokio::test]
    async fn failed_next_page_does_not_advance_the_cursor() {
        let (server, content) = flaky_db2(0).await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let service = SearchService::spawn(content, 2, tx);

        service.handle_query("matrix");
        assert_eq!(next_ids(&mut rx).await, vec![603]);

        // From here the next job fails, then the query runs out of rows.
        server.reset().await;
        Mock::given(method("POST"))
            .and(path("/v1/services/execsql"))
            .respond_with(ResponseTemplate::new(500).set_body_string("SQL0204N"))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/services/execsql"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "resultSet": [] })),
            )
            .mount(&server)
            .await;

        service.next_page();
        assert!(matches!(next_update(&mut rx).await, SearchUpdate::Failed(_)));
        service.next_page();
        assert!(next_ids(&mut rx).await.is_empty());

        // `reset` cleared the earlier requests: both advances asked for page 1.
        assert_eq!(requested_offsets(&server).await, vec![2, 2]);
    }
}
