//! Tabular view pipeline.
//!
//! Owns the current record collection plus the sort and page parameters, and
//! republishes the visible rows whenever any of the three changes. The rows
//! themselves are computed by [`little_sun_core::visible_rows`].

use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};

use little_sun_core::{CustomerRecord, PageSpec, SortSpec, visible_rows};
use tokio::sync::broadcast;

/// Capacity of the visible-rows channel.
const ROWS_CHANNEL_CAPACITY: usize = 16;

/// Table state behind the view.
struct TableState {
    records: Vec<CustomerRecord>,
    sort: SortSpec,
    page: PageSpec,
    // None once the view is disconnected
    tx: Option<broadcast::Sender<Vec<CustomerRecord>>>,
}

impl TableState {
    fn visible(&self) -> Vec<CustomerRecord> {
        visible_rows(&self.records, &self.sort, &self.page)
    }

    fn publish(&self) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(self.visible());
        }
    }
}

/// The customer table's view state.
pub struct TableView {
    state: Mutex<TableState>,
}

impl TableView {
    /// Create an empty, unsorted view showing the first page of `page_size`
    /// rows.
    #[must_use]
    pub fn new(page_size: NonZeroUsize) -> Self {
        let (tx, _) = broadcast::channel(ROWS_CHANNEL_CAPACITY);
        Self {
            state: Mutex::new(TableState {
                records: Vec::new(),
                sort: SortSpec::UNSORTED,
                page: PageSpec::first(page_size),
                tx: Some(tx),
            }),
        }
    }

    /// Replace the record collection.
    ///
    /// Resets the page index to the first page.
    pub fn set_data(&self, records: Vec<CustomerRecord>) {
        let mut state = self.lock();
        tracing::debug!(records = records.len(), "Table data replaced");
        state.records = records;
        state.page = state.page.with_index(0);
        state.publish();
    }

    /// Change the sort.
    pub fn set_sort(&self, sort: SortSpec) {
        let mut state = self.lock();
        state.sort = sort;
        state.publish();
    }

    /// Change the page.
    pub fn set_page(&self, page: PageSpec) {
        let mut state = self.lock();
        state.page = page;
        state.publish();
    }

    /// Move to page `index`, keeping the page size.
    pub fn set_page_index(&self, index: usize) {
        let mut state = self.lock();
        state.page = state.page.with_index(index);
        state.publish();
    }

    /// Change the page size, keeping the first row of the current page in
    /// view.
    pub fn set_page_size(&self, size: NonZeroUsize) {
        let mut state = self.lock();
        let index = state.page.offset() / size.get();
        state.page = PageSpec::first(size).with_index(index);
        state.publish();
    }

    /// Rows currently visible.
    #[must_use]
    pub fn visible_rows(&self) -> Vec<CustomerRecord> {
        self.lock().visible()
    }

    /// Current sort.
    #[must_use]
    pub fn sort(&self) -> SortSpec {
        self.lock().sort
    }

    /// Current page.
    #[must_use]
    pub fn page(&self) -> PageSpec {
        self.lock().page
    }

    /// Number of records in the collection.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of pages at the current page size.
    #[must_use]
    pub fn page_count(&self) -> usize {
        let state = self.lock();
        state.page.page_count(state.records.len())
    }

    /// Subscribe to visible-row updates.
    ///
    /// Returns `None` once the view has been disconnected.
    #[must_use]
    pub fn subscribe(&self) -> Option<broadcast::Receiver<Vec<CustomerRecord>>> {
        self.lock().tx.as_ref().map(broadcast::Sender::subscribe)
    }

    /// Release the publishing channel.
    ///
    /// Subscribers see the channel close and nothing is published afterwards.
    /// The view still answers [`TableView::visible_rows`].
    pub fn disconnect(&self) {
        if self.lock().tx.take().is_some() {
            tracing::debug!("Table view disconnected");
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TableState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for TableView {
    fn default() -> Self {
        Self::new(PageSpec::DEFAULT_SIZE)
    }
}

impl std::fmt::Debug for TableView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("TableView")
            .field("records", &state.records.len())
            .field("sort", &state.sort)
            .field("page", &state.page)
            .field("connected", &state.tx.is_some())
            .finish()
    }
}
