//! Customer search.
//!
//! Validates the term, asks the backend for matching sheet rows and maps them
//! into [`CustomerRecord`]s. Each search takes a sequence token; a reply
//! whose token has been superseded by a newer search is dropped.

use std::sync::atomic::{AtomicU64, Ordering};

use little_sun_core::CustomerRecord;
use thiserror::Error;
use tracing::instrument;

use crate::api::{ApiError, SheetsApi};
use crate::signal::Signal;

/// Inline message for an empty search term.
pub const EMPTY_TERM_MESSAGE: &str = "Please enter a search term";

/// Inline message when a search matched nothing.
pub const NO_RESULTS_MESSAGE: &str = "No results found";

/// Errors from a search.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The term was empty after trimming.
    #[error("empty search term")]
    EmptyTerm,

    /// The backend request failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// What a completed search produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Matching records, in backend order.
    Results(Vec<CustomerRecord>),
    /// The search succeeded but matched nothing.
    NoResults,
    /// A newer search was issued before this one completed; the reply was
    /// discarded.
    Stale,
}

/// What the search surface shows besides the rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchStatus {
    /// A search is in flight.
    pub loading: bool,
    /// Inline error text, if the last search failed.
    pub error: Option<String>,
    /// The last search matched nothing.
    pub no_results: bool,
}

/// Dispatches customer searches to the backend.
pub struct SearchDispatcher<A> {
    api: A,
    sequence: AtomicU64,
    status: Signal<SearchStatus>,
    results: Signal<Vec<CustomerRecord>>,
}

impl<A: SheetsApi> SearchDispatcher<A> {
    /// Create a dispatcher over `api`.
    #[must_use]
    pub fn new(api: A) -> Self {
        Self {
            api,
            sequence: AtomicU64::new(0),
            status: Signal::default(),
            results: Signal::default(),
        }
    }

    /// Search for `term`.
    ///
    /// An empty term fails validation without contacting the backend. A
    /// failed request leaves the previously published records untouched.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::EmptyTerm`] for a blank term and
    /// [`SearchError::Api`] when the latest request fails.
    #[instrument(skip(self), fields(sequence = tracing::field::Empty))]
    pub async fn search(&self, term: &str) -> Result<SearchOutcome, SearchError> {
        let term = term.trim();
        if term.is_empty() {
            tracing::debug!("Rejected empty search term");
            self.status.set(SearchStatus {
                error: Some(EMPTY_TERM_MESSAGE.to_string()),
                ..self.status.get()
            });
            return Err(SearchError::EmptyTerm);
        }

        let token = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::Span::current().record("sequence", token);
        self.status.set(SearchStatus {
            loading: true,
            ..self.status.get()
        });

        let reply = self.api.search_customers(term).await;

        if !self.is_latest(token) {
            tracing::debug!(
                latest = self.sequence.load(Ordering::SeqCst),
                "Discarding stale search response"
            );
            return Ok(SearchOutcome::Stale);
        }

        match reply {
            Ok(rows) => {
                let records: Vec<CustomerRecord> = rows
                    .iter()
                    .map(|row| CustomerRecord::from_sheet_row(row))
                    .collect();
                tracing::info!(term = %term, rows = records.len(), "Search completed");

                let no_results = records.is_empty();
                self.results.set(records.clone());
                self.status.set(SearchStatus {
                    loading: false,
                    error: None,
                    no_results,
                });

                Ok(if no_results {
                    SearchOutcome::NoResults
                } else {
                    SearchOutcome::Results(records)
                })
            }
            Err(e) => {
                tracing::error!(term = %term, error = %e, "Search failed");
                self.status.set(SearchStatus {
                    loading: false,
                    error: Some(format!("Error: {e}")),
                    no_results: false,
                });
                Err(e.into())
            }
        }
    }

    /// Records published by the latest successful search.
    #[must_use]
    pub fn results(&self) -> Vec<CustomerRecord> {
        self.results.get()
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> SearchStatus {
        self.status.get()
    }

    fn is_latest(&self, token: u64) -> bool {
        self.sequence.load(Ordering::SeqCst) == token
    }
}

impl<A> std::fmt::Debug for SearchDispatcher<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchDispatcher")
            .field("sequence", &self.sequence.load(Ordering::SeqCst))
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;
    use std::future::Future;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    use rust_decimal::Decimal;
    use serde_json::{Value, json};
    use tokio::sync::oneshot;

    use super::*;

    type Reply = Result<Vec<Vec<Value>>, ApiError>;

    /// Answers each call with the next scripted reply, delivered through a
    /// channel so the test controls when it arrives.
    #[derive(Default)]
    struct ScriptedSheets {
        replies: Mutex<VecDeque<oneshot::Receiver<Reply>>>,
        terms: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    impl ScriptedSheets {
        fn reply_with(&self) -> oneshot::Sender<Reply> {
            let (tx, rx) = oneshot::channel();
            self.replies.lock().unwrap().push_back(rx);
            tx
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl SheetsApi for &ScriptedSheets {
        fn search_customers(&self, term: &str) -> impl Future<Output = Reply> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.terms.lock().unwrap().push(term.to_string());
            let rx = self.replies.lock().unwrap().pop_front();
            async move {
                match rx {
                    Some(rx) => rx.await.unwrap_or_else(|_| Ok(Vec::new())),
                    None => Ok(Vec::new()),
                }
            }
        }
    }

    fn row(name: &str, total: i64) -> Vec<Value> {
        vec![
            json!("2024-03-01"),
            json!(name),
            json!("1990-01-01"),
            json!("S-1"),
            json!("Treatment"),
        ]
        .into_iter()
        .chain(std::iter::repeat_n(json!(""), 5))
        .chain([json!(total), json!("12")])
        .collect()
    }

    #[tokio::test]
    async fn test_empty_term_makes_no_call() {
        let api = ScriptedSheets::default();
        let dispatcher = SearchDispatcher::new(&api);

        for term in ["", "   ", "\t\n"] {
            assert!(matches!(
                dispatcher.search(term).await,
                Err(SearchError::EmptyTerm)
            ));
        }

        assert_eq!(api.calls(), 0);
        assert_eq!(
            dispatcher.status().error.as_deref(),
            Some(EMPTY_TERM_MESSAGE)
        );
    }

    #[tokio::test]
    async fn test_maps_every_row() {
        let api = ScriptedSheets::default();
        api.reply_with()
            .send(Ok(vec![row("Lin", 5), vec![json!("2024-03-02")], row("Chen", 1)]))
            .unwrap();
        let dispatcher = SearchDispatcher::new(&api);

        let SearchOutcome::Results(records) = dispatcher.search("  Lin ").await.unwrap() else {
            panic!("expected results");
        };

        assert_eq!(records.len(), 3);
        assert_eq!(records.first().unwrap().customer_name, "Lin");
        assert_eq!(records.first().unwrap().total, Decimal::from(5));
        // Short row: missing cells default
        let short = records.get(1).unwrap();
        assert_eq!(short.customer_name, "");
        assert_eq!(short.total, Decimal::ZERO);
        assert_eq!(short.revenue, Decimal::ZERO);

        assert_eq!(api.terms.lock().unwrap().as_slice(), ["Lin"]);
        assert_eq!(dispatcher.results().len(), 3);
        assert_eq!(dispatcher.status(), SearchStatus::default());
    }

    #[tokio::test]
    async fn test_empty_result_is_not_an_error() {
        let api = ScriptedSheets::default();
        api.reply_with().send(Ok(vec![row("Lin", 5)])).unwrap();
        api.reply_with().send(Ok(Vec::new())).unwrap();
        let dispatcher = SearchDispatcher::new(&api);

        dispatcher.search("Lin").await.unwrap();
        assert_eq!(
            dispatcher.search("Nobody").await.unwrap(),
            SearchOutcome::NoResults
        );

        let status = dispatcher.status();
        assert!(status.no_results);
        assert_eq!(status.error, None);
        // Published as empty
        assert!(dispatcher.results().is_empty());
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_results() {
        let api = ScriptedSheets::default();
        api.reply_with().send(Ok(vec![row("Lin", 5)])).unwrap();
        api.reply_with()
            .send(Err(ApiError::Status {
                status: 500,
                message: "sheet unavailable".to_string(),
            }))
            .unwrap();
        let dispatcher = SearchDispatcher::new(&api);

        dispatcher.search("Lin").await.unwrap();
        let err = dispatcher.search("Chen").await.unwrap_err();

        assert!(matches!(err, SearchError::Api(_)));
        assert_eq!(dispatcher.results().len(), 1);
        assert_eq!(
            dispatcher.status().error.as_deref(),
            Some("Error: request failed (500): sheet unavailable")
        );
    }

    #[tokio::test]
    async fn test_success_clears_prior_error() {
        let api = ScriptedSheets::default();
        api.reply_with().send(Ok(vec![row("Lin", 5)])).unwrap();
        let dispatcher = SearchDispatcher::new(&api);

        let _ = dispatcher.search(" ").await;
        assert!(dispatcher.status().error.is_some());

        dispatcher.search("Lin").await.unwrap();
        assert_eq!(dispatcher.status().error, None);
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let api = ScriptedSheets::default();
        let first = api.reply_with();
        let second = api.reply_with();
        second.send(Ok(vec![row("Chen", 1)])).unwrap();
        let dispatcher = SearchDispatcher::new(&api);

        let (older, newer, ()) = tokio::join!(
            dispatcher.search("Lin"),
            dispatcher.search("Chen"),
            async {
                // Deliver the older reply after the newer one
                tokio::task::yield_now().await;
                first.send(Ok(vec![row("Lin", 5), row("Lin", 3)])).unwrap();
            }
        );

        assert_eq!(older.unwrap(), SearchOutcome::Stale);
        assert!(matches!(newer.unwrap(), SearchOutcome::Results(r) if r.len() == 1));
        let results = dispatcher.results();
        assert_eq!(results.len(), 1);
        assert_eq!(results.first().unwrap().customer_name, "Chen");
        assert!(!dispatcher.status().loading);
    }

    #[tokio::test]
    async fn test_stale_failure_is_discarded() {
        let api = ScriptedSheets::default();
        let first = api.reply_with();
        let second = api.reply_with();
        second.send(Ok(vec![row("Chen", 1)])).unwrap();
        let dispatcher = SearchDispatcher::new(&api);

        let (older, newer, ()) = tokio::join!(
            dispatcher.search("Lin"),
            dispatcher.search("Chen"),
            async {
                tokio::task::yield_now().await;
                first
                    .send(Err(ApiError::Parse("late failure".to_string())))
                    .unwrap();
            }
        );

        assert_eq!(older.unwrap(), SearchOutcome::Stale);
        assert!(newer.is_ok());
        assert_eq!(dispatcher.status().error, None);
    }
}
