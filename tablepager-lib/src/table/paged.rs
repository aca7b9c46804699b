//! Async table driver.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use log::trace;
use tokio::time::Instant;

use crate::fetch::PageFetcher;
use crate::model::FilterDescriptor;
use crate::model::PageSize;
use crate::model::Row;
use crate::observer::ListenerId;
use crate::observer::Listeners;
use crate::observer::TableEvent;
use crate::paging::NavRejected;
use crate::store::SelectionUpdate;

use super::FetchRequest;
use super::NextPage;
use super::Settled;
use super::TableSnapshot;
use super::TableState;

/// Outcome of [`PagedTable::next_page`].
#[derive(Debug, Clone, PartialEq)]
pub enum Navigation {
    /// Moved onto an already cached page.
    Moved(usize),
    /// The next page was fetched; see how it settled.
    Fetched(Settled),
    /// The move was refused.
    Rejected(NavRejected),
}

/// A [`TableState`] wired to a [`PageFetcher`].
///
/// Runs the fetches the state asks for and settles them. The state lock is
/// never held across an `.await`, so clones of one table can be driven
/// concurrently and the single-flight rules of [`TableState`] apply.
///
/// Cheap to clone; clones share state, fetcher and listeners.
///
/// # Example
///
/// ```ignore
/// let fetcher: HttpFetcher<Product> = HttpFetcher::new("http://127.0.0.1:3000")?;
/// let table = PagedTable::new(TableState::new("products", TableConfig::default()), fetcher);
///
/// table.load().await;
/// while let Navigation::Fetched(_) | Navigation::Moved(_) = table.next_page().await {
///     println!("{} rows", table.snapshot().rows.len());
/// }
/// ```
pub struct PagedTable<R, F> {
    state: Arc<Mutex<TableState<R>>>,
    fetcher: Arc<F>,
    listeners: Listeners,
}

impl<R, F> Clone for PagedTable<R, F> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            fetcher: Arc::clone(&self.fetcher),
            listeners: self.listeners.clone(),
        }
    }
}

impl<R, F> PagedTable<R, F>
where
    R: Row,
    F: PageFetcher<R>,
{
    /// Wraps `state` and drives it with `fetcher`.
    pub fn new(mut state: TableState<R>, fetcher: F) -> Self {
        state.defer_events();
        let listeners = state.listeners().clone();
        Self {
            state: Arc::new(Mutex::new(state)),
            fetcher: Arc::new(fetcher),
            listeners,
        }
    }

    /// Runs `f` on the state, then emits the events it produced.
    ///
    /// Listeners run after the lock is released and may call back into the
    /// table.
    fn with_state<T>(&self, f: impl FnOnce(&mut TableState<R>) -> T) -> T {
        let (out, events) = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            let out = f(&mut state);
            (out, state.take_events())
        };
        for event in &events {
            self.listeners.emit(event);
        }
        out
    }

    /// Reads the state.
    pub fn inspect<T>(&self, f: impl FnOnce(&TableState<R>) -> T) -> T {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    /// Performs `request` and any follow-ups it leads to.
    async fn run(&self, mut request: FetchRequest) -> Settled {
        loop {
            trace!("[table] awaiting fetch #{}", request.ticket());
            let result = self.fetcher.fetch(&request.query()).await;
            match self.with_state(|state| state.settle(&request, result)) {
                Settled::FollowUp(next) => request = next,
                settled => return settled,
            }
        }
    }

    async fn run_opt(&self, request: Option<FetchRequest>) -> Option<Settled> {
        match request {
            Some(request) => Some(self.run(request).await),
            None => None,
        }
    }

    /// Fetches the first page if nothing is cached yet.
    pub async fn load(&self) -> Option<Settled> {
        let request = self.with_state(TableState::begin_initial);
        self.run_opt(request).await
    }

    /// Moves to the next page, fetching it if needed.
    pub async fn next_page(&self) -> Navigation {
        match self.with_state(TableState::next_page) {
            NextPage::Navigated(index) => Navigation::Moved(index),
            NextPage::Fetch(request) => Navigation::Fetched(self.run(request).await),
            NextPage::Rejected(reason) => Navigation::Rejected(reason),
        }
    }

    /// Moves to the previous page.
    pub fn previous_page(&self) -> Result<usize, NavRejected> {
        self.with_state(TableState::previous_page)
    }

    /// Re-fetches what the table shows.
    pub async fn refetch_current(&self) -> Option<Settled> {
        let request = self.with_state(TableState::refetch_current);
        self.run_opt(request).await
    }

    /// Changes the page size and loads the first page for it.
    pub async fn set_page_size(&self, page_size: PageSize) -> Option<Settled> {
        let request = self.with_state(|state| state.set_page_size(page_size));
        self.run_opt(request).await
    }

    /// Edits a filter. Call [`apply_filters`](Self::apply_filters) to let it
    /// take effect.
    pub fn set_filter(&self, column: &str, filter: FilterDescriptor) -> bool {
        self.with_state(|state| state.set_filter(column, filter, Instant::now()))
    }

    /// Edits the text of a registered text filter.
    pub fn set_text(&self, column: &str, value: &str) -> bool {
        self.with_state(|state| state.set_text(column, value, Instant::now()))
    }

    /// Removes a filter.
    pub fn remove_filter(&self, column: &str) -> bool {
        self.with_state(|state| state.remove_filter(column, Instant::now()))
    }

    /// Waits for pending filter edits to settle, then loads the first page
    /// of the new query if the identity changed.
    ///
    /// Edits made while waiting push the deadline out.
    pub async fn apply_filters(&self) -> Option<Settled> {
        loop {
            let deadline = self.inspect(TableState::filter_deadline);
            if let Some(deadline) = deadline {
                tokio::time::sleep_until(deadline).await;
            }

            let (request, pending) = self.with_state(|state| {
                let request = state.poll_filters(Instant::now());
                (request, state.filter_deadline().is_some())
            });
            if request.is_some() || !pending {
                return self.run_opt(request).await;
            }
        }
    }

    /// Settles filter edits immediately.
    pub async fn flush_filters(&self) -> Option<Settled> {
        let request = self.with_state(TableState::flush_filters);
        self.run_opt(request).await
    }

    /// Toggles selection of a visible row.
    pub fn toggle_row_selected(&self, id: &str) -> bool {
        self.with_state(|state| state.toggle_row_selected(id))
    }

    /// Applies a selection update.
    pub fn set_selection(&self, update: SelectionUpdate) -> bool {
        self.with_state(|state| state.set_selection(update))
    }

    /// Selects all visible rows, or clears the selection.
    pub fn toggle_all_rows_selected(&self) -> bool {
        self.with_state(TableState::toggle_all_rows_selected)
    }

    /// Resizes a column.
    pub fn resize_column(&self, column: &str, width: u32) -> bool {
        self.with_state(|state| state.resize_column(column, width))
    }

    /// Returns `true` while a fetch is in flight.
    pub fn is_fetching(&self) -> bool {
        self.inspect(TableState::is_fetching)
    }

    /// Builds a rendering snapshot.
    pub fn snapshot(&self) -> TableSnapshot<R> {
        self.inspect(TableState::snapshot)
    }

    /// Registers a listener.
    pub fn subscribe<L>(&self, listener: L) -> ListenerId
    where
        L: Fn(&TableEvent) + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    /// Removes a listener.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }
}

impl<R, F> std::fmt::Debug for PagedTable<R, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagedTable")
            .field("listeners", &self.listeners)
            .finish_non_exhaustive()
    }
}
