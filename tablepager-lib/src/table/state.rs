//! Synchronous table core.

use std::collections::HashSet;

use log::debug;
use log::info;
use log::warn;
use tokio::time::Instant;

use crate::config::TableConfig;
use crate::error::FetchError;
use crate::error::TableError;
use crate::fetch::FetchResponse;
use crate::model::Cursor;
use crate::model::FilterDescriptor;
use crate::model::FilterSet;
use crate::model::PageSize;
use crate::model::QueryIdentity;
use crate::model::Row;
use crate::observer::ListenerId;
use crate::observer::Listeners;
use crate::observer::TableEvent;
use crate::paging::Advance;
use crate::paging::Bounds;
use crate::paging::NavRejected;
use crate::paging::Page;
use crate::paging::PageCache;
use crate::paging::Step;
use crate::paging::ViewIndex;
use crate::store::ColumnDef;
use crate::store::Columns;
use crate::store::FilterStore;
use crate::store::Selection;
use crate::store::SelectionUpdate;

use super::FetchKind;
use super::FetchRequest;
use super::NextPage;
use super::Settled;
use super::TableSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dispatch {
    Immediate,
    Deferred,
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    ticket: u64,
    kind: FetchKind,
}

#[derive(Debug, Clone)]
struct LastError {
    message: String,
    kind: FetchKind,
    cursor: Cursor,
}

/// Pages collected by a full refetch before they replace the cache.
#[derive(Debug)]
struct Staging<R> {
    cursors: Vec<Cursor>,
    pages: Vec<Page<R>>,
}

/// Paging, filter, selection and column state for one table.
///
/// `TableState` performs no I/O. Operations that need data return a
/// [`FetchRequest`]; the caller runs it and hands the result to
/// [`settle`](TableState::settle). At most one request is in flight at a time.
///
/// Every state change is published as a [`TableEvent`] to the registered
/// listeners.
///
/// # Example
///
/// ```
/// use serde_json::{json, Value};
/// use tablepager_lib::config::TableConfig;
/// use tablepager_lib::fetch::FetchResponse;
/// use tablepager_lib::table::{Settled, TableState};
///
/// let mut table: TableState<Value> = TableState::new("products", TableConfig::default());
/// let request = table.begin_initial().unwrap();
///
/// let rows = (1..=5).map(|id| json!({ "id": id })).collect();
/// let settled = table.settle(&request, Ok(FetchResponse::new(rows)));
/// assert_eq!(settled, Settled::Appended { index: 0 });
/// assert_eq!(table.snapshot().rows.len(), 5);
/// ```
#[derive(Debug)]
pub struct TableState<R> {
    resource: String,
    config: TableConfig,
    base_cursor: Cursor,
    filters: FilterStore,
    cache: PageCache<R>,
    view: ViewIndex,
    selection: Selection,
    columns: Columns,
    /// Identity the cache currently belongs to.
    observed: QueryIdentity,
    /// Bumped on every cache reset.
    epoch: u64,
    next_ticket: u64,
    in_flight: Option<InFlight>,
    last_error: Option<LastError>,
    staging: Option<Staging<R>>,
    dispatch: Dispatch,
    pending: Vec<TableEvent>,
    listeners: Listeners,
}

impl<R: Row> TableState<R> {
    /// Creates an empty table over `resource`.
    pub fn new(resource: impl Into<String>, config: TableConfig) -> Self {
        let resource = resource.into();
        let base_cursor = Cursor::first(config.page_size);
        let filters = FilterStore::new(config.filter_mode, FilterSet::new(), config.debounce);
        let observed = QueryIdentity::new(resource.clone(), base_cursor, filters.remote_filters());

        Self {
            resource,
            base_cursor,
            selection: Selection::new(config.selection_mode),
            filters,
            cache: PageCache::new(),
            view: ViewIndex::new(),
            columns: Columns::default(),
            observed,
            epoch: 0,
            next_ticket: 0,
            in_flight: None,
            last_error: None,
            staging: None,
            dispatch: Dispatch::Immediate,
            pending: Vec::new(),
            listeners: Listeners::new(),
            config,
        }
    }

    /// Sets the columns.
    pub fn with_columns(mut self, columns: Vec<ColumnDef>) -> Self {
        self.columns = Columns::new(columns);
        self
    }

    /// Registers the filterable columns and their initial descriptors.
    ///
    /// Meant for construction, before the first fetch.
    pub fn with_filters(mut self, filters: FilterSet) -> Self {
        self.filters = FilterStore::new(self.config.filter_mode, filters, self.config.debounce);
        self.observed = self.identity();
        self
    }

    // =========================================================================
    // Events
    // =========================================================================

    fn publish(&mut self, event: TableEvent) {
        match self.dispatch {
            Dispatch::Immediate => self.listeners.emit(&event),
            Dispatch::Deferred => self.pending.push(event),
        }
    }

    /// Queues events instead of emitting them; see [`take_events`](Self::take_events).
    pub(crate) fn defer_events(&mut self) {
        self.dispatch = Dispatch::Deferred;
    }

    /// Drains queued events.
    pub(crate) fn take_events(&mut self) -> Vec<TableEvent> {
        std::mem::take(&mut self.pending)
    }

    /// Returns the listener list.
    pub fn listeners(&self) -> &Listeners {
        &self.listeners
    }

    /// Registers a listener.
    pub fn subscribe<F>(&self, f: F) -> ListenerId
    where
        F: Fn(&TableEvent) + Send + Sync + 'static,
    {
        self.listeners.subscribe(f)
    }

    /// Removes a listener.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    // =========================================================================
    // Fetch lifecycle
    // =========================================================================

    /// Builds the identity from the current inputs.
    pub fn identity(&self) -> QueryIdentity {
        QueryIdentity::new(self.resource.clone(), self.base_cursor, self.filters.remote_filters())
    }

    /// Returns `true` while a fetch is in flight.
    pub fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    fn bounds(&self) -> Bounds {
        Bounds {
            cache_len: self.cache.len(),
            fetching: self.is_fetching(),
            exhausted: self.cache.is_exhausted(),
            last_empty: self.cache.last().is_some_and(Page::is_empty),
        }
    }

    fn issue(&mut self, kind: FetchKind, cursor: Cursor) -> FetchRequest {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.in_flight = Some(InFlight { ticket, kind });
        debug!("[table] fetch #{} {:?} at {}", ticket, kind, cursor);
        self.publish(TableEvent::FetchStarted {
            offset: cursor.offset,
        });

        FetchRequest {
            ticket,
            kind,
            cursor,
            identity: self.observed.clone(),
            epoch: self.epoch,
        }
    }

    /// Requests the first page if nothing is cached or in flight.
    pub fn begin_initial(&mut self) -> Option<FetchRequest> {
        if self.is_fetching() || !self.cache.is_empty() {
            return None;
        }
        Some(self.issue(FetchKind::Initial, self.base_cursor))
    }

    /// Applies the result of `request`.
    ///
    /// Results issued under another identity or reset epoch, or superseded by
    /// a newer request, are discarded without touching the cache.
    pub fn settle(&mut self, request: &FetchRequest, result: Result<FetchResponse<R>, FetchError>) -> Settled {
        let current = self
            .in_flight
            .is_some_and(|flight| flight.ticket == request.ticket);
        if !current || request.epoch != self.epoch || request.identity != self.observed {
            debug!("[table] fetch #{} dropped: {}", request.ticket, TableError::StaleFetch);
            return Settled::Stale;
        }
        self.in_flight = None;

        let response = match result {
            Ok(response) => response,
            Err(e) => return self.fail(request, e),
        };
        self.last_error = None;
        let page = Page::new(response.rows, request.cursor).with_has_more(response.has_more);

        match request.kind {
            FetchKind::Initial | FetchKind::Next => self.append(request.kind, page),
            FetchKind::Refetch { slot } => self.stage(slot, page),
        }
    }

    fn fail(&mut self, request: &FetchRequest, error: FetchError) -> Settled {
        let message = error.to_string();
        warn!("[table] fetch #{} at {} failed: {}", request.ticket, request.cursor, message);

        if matches!(request.kind, FetchKind::Refetch { .. }) {
            self.staging = None;
        }
        self.last_error = Some(LastError {
            message: message.clone(),
            kind: request.kind,
            cursor: request.cursor,
        });
        self.publish(TableEvent::FetchFailed {
            message: message.clone(),
        });
        Settled::Failed(message)
    }

    fn append(&mut self, kind: FetchKind, page: Page<R>) -> Settled {
        let rows = page.len();
        let index = match self.cache.append(page) {
            Ok(index) => index,
            Err(e) => return Settled::Dropped(e),
        };
        self.publish(TableEvent::PageAppended { index, rows });

        // An empty page past the first only marks the end; the view stays put.
        if kind == FetchKind::Next && rows > 0 && self.view.follow_append(index) {
            self.clear_selection();
            self.publish(TableEvent::ViewChanged { index });
        }

        if self.cache.is_exhausted() {
            debug!("[table] {} exhausted after {} pages", self.observed, self.cache.len());
            self.publish(TableEvent::Exhausted);
        }

        Settled::Appended { index }
    }

    fn stage(&mut self, slot: usize, page: Page<R>) -> Settled {
        let Some(staging) = self.staging.as_mut() else {
            return Settled::Stale;
        };

        let terminal = page.is_terminal();
        staging.pages.push(page);

        let next = slot + 1;
        if !terminal && let Some(&cursor) = staging.cursors.get(next) {
            return Settled::FollowUp(self.issue(FetchKind::Refetch { slot: next }, cursor));
        }

        let pages = self.staging.take().map(|s| s.pages).unwrap_or_default();
        let count = pages.len();
        let before = self.view.get();
        self.cache.replace_all(pages);
        self.view.clamp(count);
        info!("[table] refreshed {} pages for {}", count, self.observed);

        self.publish(TableEvent::PagesRefreshed { pages: count });
        if self.view.get() != before {
            self.publish(TableEvent::ViewChanged {
                index: self.view.get(),
            });
        }
        if self.cache.is_exhausted() {
            self.publish(TableEvent::Exhausted);
        }

        Settled::Refreshed { pages: count }
    }

    /// Re-fetches what the table shows.
    ///
    /// With nothing cached this is the initial fetch. After a failed
    /// next-page fetch it retries that page. Otherwise every cached page is
    /// fetched again, one request at a time, and the cache is replaced once
    /// the last one lands. Selection is cleared up front.
    pub fn refetch_current(&mut self) -> Option<FetchRequest> {
        if self.is_fetching() {
            self.reject(NavRejected::Fetching);
            return None;
        }
        self.clear_selection();

        if self.cache.is_empty() {
            return Some(self.issue(FetchKind::Initial, self.base_cursor));
        }

        if let Some(failed) = self.last_error.as_ref()
            && failed.kind == FetchKind::Next
        {
            let cursor = failed.cursor;
            return Some(self.issue(FetchKind::Next, cursor));
        }

        let cursors: Vec<Cursor> = self.cache.pages().iter().map(Page::cursor).collect();
        let first = *cursors.first()?;
        self.staging = Some(Staging {
            cursors,
            pages: Vec::new(),
        });
        Some(self.issue(FetchKind::Refetch { slot: 0 }, first))
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    fn reject(&mut self, reason: NavRejected) -> NavRejected {
        debug!("[table] navigation rejected: {}", reason);
        self.publish(TableEvent::NavigationRejected(reason));
        reason
    }

    /// Moves to the next page, fetching it if it is not cached yet.
    pub fn next_page(&mut self) -> NextPage {
        let bounds = self.bounds();
        match self.view.increment(bounds) {
            Ok(Step::Cached) => {
                let index = self.view.get();
                self.clear_selection();
                self.publish(TableEvent::ViewChanged { index });
                NextPage::Navigated(index)
            }
            Ok(Step::NeedsFetch) => match self.cache.next() {
                Some(Advance::Next(cursor)) => NextPage::Fetch(self.issue(FetchKind::Next, cursor)),
                Some(Advance::Exhausted) => NextPage::Rejected(self.reject(NavRejected::Exhausted)),
                None => NextPage::Rejected(self.reject(NavRejected::Empty)),
            },
            Err(reason) => NextPage::Rejected(self.reject(reason)),
        }
    }

    /// Moves to the previous cached page.
    pub fn previous_page(&mut self) -> Result<usize, NavRejected> {
        match self.view.decrement(self.is_fetching()) {
            Ok(index) => {
                self.clear_selection();
                self.publish(TableEvent::ViewChanged { index });
                Ok(index)
            }
            Err(reason) => Err(self.reject(reason)),
        }
    }

    /// Changes the page size.
    ///
    /// The base cursor is part of the identity, so this resets the table and
    /// returns the new initial fetch.
    pub fn set_page_size(&mut self, page_size: PageSize) -> Option<FetchRequest> {
        self.config.page_size = page_size;
        self.base_cursor = Cursor::first(page_size);
        self.sync_identity()
    }

    // =========================================================================
    // Filters
    // =========================================================================

    /// Replaces the live descriptor for `column`.
    ///
    /// The change takes effect through [`poll_filters`](Self::poll_filters)
    /// once the debounce delay has passed.
    pub fn set_filter(&mut self, column: &str, filter: FilterDescriptor, now: Instant) -> bool {
        let changed = self.filters.set_filter(column, filter, now);
        if changed {
            self.publish(TableEvent::FiltersChanged);
        }
        changed
    }

    /// Sets the text of a registered text filter.
    pub fn set_text(&mut self, column: &str, value: &str, now: Instant) -> bool {
        let changed = self.filters.set_text(column, value, now);
        if changed {
            self.publish(TableEvent::FiltersChanged);
        }
        changed
    }

    /// Removes the filter on `column`.
    pub fn remove_filter(&mut self, column: &str, now: Instant) -> bool {
        let changed = self.filters.remove_filter(column, now);
        if changed {
            self.publish(TableEvent::FiltersChanged);
        }
        changed
    }

    /// Returns when pending filter edits settle.
    pub fn filter_deadline(&self) -> Option<Instant> {
        self.filters.deadline()
    }

    /// Settles filter edits whose debounce is over and reacts to the result.
    ///
    /// Returns the initial fetch for the new identity if it changed.
    pub fn poll_filters(&mut self, now: Instant) -> Option<FetchRequest> {
        if self.filters.poll(now) {
            self.publish(TableEvent::FiltersChanged);
        }
        self.sync_identity()
    }

    /// Settles all filter edits now.
    pub fn flush_filters(&mut self) -> Option<FetchRequest> {
        if self.filters.flush() {
            self.publish(TableEvent::FiltersChanged);
        }
        self.sync_identity()
    }

    fn sync_identity(&mut self) -> Option<FetchRequest> {
        let identity = self.identity();
        if identity == self.observed {
            return None;
        }
        info!("[table] query changed: {}", identity);

        self.observed = identity.clone();
        self.cache.reset();
        self.view.reset();
        self.clear_selection();
        self.epoch += 1;
        self.in_flight = None;
        self.staging = None;
        self.last_error = None;
        self.publish(TableEvent::QueryChanged(identity));

        Some(self.issue(FetchKind::Initial, self.base_cursor))
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Rows on the displayed page that pass the local filters.
    fn visible(&self) -> impl Iterator<Item = &R> {
        self.cache
            .get(self.view.get())
            .into_iter()
            .flat_map(|page| page.rows())
            .filter(|row| self.filters.accepts(*row))
    }

    fn clear_selection(&mut self) {
        if self.selection.clear() {
            self.publish(TableEvent::SelectionChanged);
        }
    }

    /// Toggles selection of a visible row.
    ///
    /// Returns `false` if no visible row has that id or the mode forbids it.
    pub fn toggle_row_selected(&mut self, id: &str) -> bool {
        if !self.visible().any(|row| row.id() == id) {
            return false;
        }
        let changed = self.selection.toggle(id);
        if changed {
            self.publish(TableEvent::SelectionChanged);
        }
        changed
    }

    /// Applies a selection update.
    ///
    /// Ids that are not on the displayed page, or are hidden by a local
    /// filter, are dropped.
    pub fn set_selection(&mut self, update: SelectionUpdate) -> bool {
        let visible: HashSet<String> = self.visible().map(Row::id).collect();
        let changed = self.selection.apply(update, |id| visible.contains(id));
        if changed {
            self.publish(TableEvent::SelectionChanged);
        }
        changed
    }

    /// Selects every visible row, or clears the selection if all are selected.
    pub fn toggle_all_rows_selected(&mut self) -> bool {
        let update = if self.is_all_rows_selected() {
            SelectionUpdate::Replace(HashSet::new())
        } else {
            SelectionUpdate::Replace(self.visible().map(Row::id).collect())
        };
        self.set_selection(update)
    }

    /// Returns `true` if there are visible rows and all of them are selected.
    pub fn is_all_rows_selected(&self) -> bool {
        let mut visible = self.visible().peekable();
        visible.peek().is_some() && visible.all(|row| self.selection.is_selected(&row.id()))
    }

    /// Returns `true` if some, but not all, visible rows are selected.
    pub fn is_some_rows_selected(&self) -> bool {
        self.visible().any(|row| self.selection.is_selected(&row.id())) && !self.is_all_rows_selected()
    }

    // =========================================================================
    // Columns
    // =========================================================================

    /// Resizes a column. Returns `false` for an unknown column.
    pub fn resize_column(&mut self, column: &str, width: u32) -> bool {
        if !self.columns.resize(column, width) {
            return false;
        }
        if let Some(def) = self.columns.get(column) {
            let width = def.width;
            self.publish(TableEvent::ColumnResized {
                column: column.to_string(),
                width,
            });
        }
        true
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Builds a rendering snapshot.
    pub fn snapshot(&self) -> TableSnapshot<R> {
        let bounds = self.bounds();
        TableSnapshot {
            rows: self.visible().cloned().collect(),
            columns: self.columns.as_slice().to_vec(),
            filters: self.filters.live().clone(),
            selected: self.selection.ids().clone(),
            page: self.view.get() + 1,
            pages_cached: self.cache.len(),
            fetched_at: self.cache.get(self.view.get()).map(Page::fetched_at),
            can_next: self.view.plan_increment(bounds).is_ok(),
            can_previous: !bounds.fetching && self.view.get() > 0,
            can_refetch: !bounds.fetching,
            is_fetching: bounds.fetching,
            is_exhausted: bounds.exhausted,
            last_error: self.last_error.as_ref().map(|e| e.message.clone()),
        }
    }

    /// Returns the resource name.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Returns the config.
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Returns the identity the cache belongs to.
    pub fn observed_identity(&self) -> &QueryIdentity {
        &self.observed
    }

    /// Returns the reset epoch.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Returns the displayed page index.
    pub fn view_index(&self) -> usize {
        self.view.get()
    }

    /// Returns the displayed page.
    pub fn current_page(&self) -> Option<&Page<R>> {
        self.cache.get(self.view.get())
    }

    /// Returns the page cache.
    pub fn cache(&self) -> &PageCache<R> {
        &self.cache
    }

    /// Returns the selection.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Returns the filter store.
    pub fn filters(&self) -> &FilterStore {
        &self.filters
    }

    /// Returns the columns.
    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    /// Returns the message of the last failed fetch.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_ref().map(|e| e.message.as_str())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::time::Duration;

    use serde_json::Value;
    use serde_json::json;

    use super::*;
    use crate::model::NumberMatch;
    use crate::store::FilterMode;
    use crate::store::SelectionMode;

    fn catalog(n: usize) -> Vec<Value> {
        (1..=n)
            .map(|i| json!({ "id": i, "title": format!("Item {}", i), "price": i as f64 }))
            .collect()
    }

    fn respond(rows: &[Value], request: &FetchRequest) -> Result<FetchResponse<Value>, FetchError> {
        let query = request.query();
        let page = rows
            .iter()
            .filter(|row| query.filters.matches(*row))
            .skip(query.cursor.offset)
            .take(query.cursor.limit.get())
            .cloned()
            .collect();
        Ok(FetchResponse::new(page))
    }

    fn table() -> TableState<Value> {
        TableState::new("products", TableConfig::default())
            .with_filters(FilterSet::new().with("title", FilterDescriptor::empty_text()))
    }

    fn loaded(rows: &[Value]) -> TableState<Value> {
        let mut table = table();
        let request = table.begin_initial().unwrap();
        table.settle(&request, respond(rows, &request));
        table
    }

    fn fetch_next(table: &mut TableState<Value>, rows: &[Value]) -> Settled {
        match table.next_page() {
            NextPage::Fetch(request) => table.settle(&request, respond(rows, &request)),
            other => panic!("expected a fetch, got {:?}", other),
        }
    }

    #[test]
    fn test_twelve_rows_page_five_five_two() {
        let rows = catalog(12);
        let mut table = loaded(&rows);
        assert_eq!(table.snapshot().rows.len(), 5);

        assert_eq!(fetch_next(&mut table, &rows), Settled::Appended { index: 1 });
        assert_eq!(table.snapshot().rows.len(), 5);
        assert_eq!(fetch_next(&mut table, &rows), Settled::Appended { index: 2 });

        let snapshot = table.snapshot();
        assert_eq!(snapshot.rows.len(), 2);
        assert_eq!(snapshot.page, 3);
        assert!(snapshot.is_exhausted);
        assert!(!snapshot.can_next);

        assert_eq!(table.next_page(), NextPage::Rejected(NavRejected::Exhausted));
        assert_eq!(table.cache().len(), 3);
        assert_eq!(table.view_index(), 2);
    }

    #[test]
    fn test_second_next_while_fetching_is_rejected() {
        let rows = catalog(12);
        let mut table = loaded(&rows);

        let NextPage::Fetch(request) = table.next_page() else {
            panic!("expected a fetch");
        };
        assert!(table.is_fetching());
        assert_eq!(table.next_page(), NextPage::Rejected(NavRejected::Fetching));
        assert_eq!(table.previous_page(), Err(NavRejected::Fetching));

        table.settle(&request, respond(&rows, &request));
        assert_eq!(table.cache().len(), 2);
        assert_eq!(table.view_index(), 1);
    }

    #[test]
    fn test_cached_pages_navigate_without_fetch() {
        let rows = catalog(12);
        let mut table = loaded(&rows);
        fetch_next(&mut table, &rows);

        assert_eq!(table.previous_page(), Ok(0));
        assert_eq!(table.next_page(), NextPage::Navigated(1));
        assert!(!table.is_fetching());
    }

    #[test]
    fn test_previous_at_start_is_noop() {
        let mut table = loaded(&catalog(12));
        assert_eq!(table.previous_page(), Err(NavRejected::AtStart));
        assert_eq!(table.view_index(), 0);
        assert_eq!(table.cache().len(), 1);
    }

    #[test]
    fn test_selection_cleared_on_next_page() {
        let rows = catalog(12);
        let mut table = loaded(&rows);

        assert!(table.toggle_row_selected("1"));
        assert!(table.toggle_row_selected("2"));
        assert!(table.is_some_rows_selected());

        fetch_next(&mut table, &rows);
        assert!(table.selection().is_empty());
        assert!(!table.is_some_rows_selected());

        // Rows of the old page are not selectable any more.
        assert!(!table.toggle_row_selected("1"));
        assert!(table.toggle_row_selected("6"));
    }

    #[test]
    fn test_toggle_all_rows() {
        let mut table = loaded(&catalog(3));
        assert!(table.toggle_all_rows_selected());
        assert!(table.is_all_rows_selected());
        assert!(!table.is_some_rows_selected());
        assert!(table.toggle_all_rows_selected());
        assert!(table.selection().is_empty());
    }

    #[test]
    fn test_filter_change_resets_everything() {
        let rows = catalog(12);
        let mut table = loaded(&rows);
        fetch_next(&mut table, &rows);
        table.toggle_row_selected("6");

        let t0 = Instant::now();
        assert!(table.set_text("title", "Item 1", t0));
        assert!(table.poll_filters(t0 + Duration::from_millis(100)).is_none());
        assert_eq!(table.cache().len(), 2);

        let request = table.poll_filters(t0 + Duration::from_millis(500)).unwrap();
        assert_eq!(request.kind(), FetchKind::Initial);
        assert_eq!(request.cursor(), Cursor::first(PageSize::Five));
        assert!(table.cache().is_empty());
        assert_eq!(table.view_index(), 0);
        assert!(table.selection().is_empty());
        assert_eq!(table.epoch(), 1);

        table.settle(&request, respond(&rows, &request));
        let titles: Vec<_> = table
            .snapshot()
            .rows
            .iter()
            .map(|row| row["title"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(titles, ["Item 1", "Item 10", "Item 11", "Item 12"]);
    }

    #[test]
    fn test_stale_settle_is_discarded() {
        let rows = catalog(12);
        let mut table = loaded(&rows);
        let NextPage::Fetch(stale) = table.next_page() else {
            panic!("expected a fetch");
        };

        table.set_text("title", "Item 2", Instant::now());
        let fresh = table.flush_filters().unwrap();

        assert_eq!(table.settle(&stale, respond(&rows, &stale)), Settled::Stale);
        assert!(table.cache().is_empty());
        assert!(table.is_fetching());

        assert_eq!(table.settle(&fresh, respond(&rows, &fresh)), Settled::Appended { index: 0 });
        assert_eq!(table.snapshot().rows.len(), 1);
    }

    #[test]
    fn test_epoch_catches_filter_round_trip() {
        let rows = catalog(12);
        let mut table = table();
        let original = table.begin_initial().unwrap();

        table.set_text("title", "Item 3", Instant::now());
        table.flush_filters().unwrap();
        table.set_text("title", "", Instant::now());
        let latest = table.flush_filters().unwrap();

        // Same identity as the first request, but issued before two resets.
        assert_eq!(original.identity(), table.observed_identity());
        assert_eq!(table.settle(&original, respond(&rows, &original)), Settled::Stale);
        assert_eq!(table.settle(&latest, respond(&rows, &latest)), Settled::Appended { index: 0 });
    }

    #[test]
    fn test_empty_trailing_page_keeps_view() {
        let rows = catalog(10);
        let mut table = loaded(&rows);
        fetch_next(&mut table, &rows);

        assert_eq!(fetch_next(&mut table, &rows), Settled::Appended { index: 2 });
        assert_eq!(table.view_index(), 1);
        assert!(table.cache().is_exhausted());
        assert_eq!(table.next_page(), NextPage::Rejected(NavRejected::EmptyTrailingPage));
        assert!(!table.snapshot().can_next);
    }

    #[test]
    fn test_failed_fetch_keeps_pages_and_retries() {
        let rows = catalog(12);
        let mut table = loaded(&rows);
        let NextPage::Fetch(request) = table.next_page() else {
            panic!("expected a fetch");
        };

        let settled = table.settle(&request, Err(FetchError::http(503, "down")));
        assert!(matches!(settled, Settled::Failed(_)));
        assert_eq!(table.cache().len(), 1);
        assert_eq!(table.view_index(), 0);
        assert_eq!(table.snapshot().last_error.as_deref(), Some("HTTP 503: down"));

        let retry = table.refetch_current().unwrap();
        assert_eq!(retry.kind(), FetchKind::Next);
        assert_eq!(retry.cursor(), request.cursor());
        table.settle(&retry, respond(&rows, &retry));
        assert_eq!(table.view_index(), 1);
        assert!(table.last_error().is_none());
    }

    #[test]
    fn test_refetch_replaces_cached_pages() {
        let mut rows = catalog(12);
        let mut table = loaded(&rows);
        fetch_next(&mut table, &rows);
        table.toggle_row_selected("7");
        let loaded_at = table.snapshot().fetched_at.unwrap();

        rows[6]["title"] = json!("Renamed");
        let mut request = table.refetch_current().unwrap();
        assert!(table.selection().is_empty());

        let mut follow_ups = 0;
        let refreshed = loop {
            match table.settle(&request, respond(&rows, &request)) {
                Settled::FollowUp(next) => {
                    follow_ups += 1;
                    request = next;
                }
                other => break other,
            }
        };

        assert_eq!(follow_ups, 1);
        assert_eq!(refreshed, Settled::Refreshed { pages: 2 });
        assert!(table.snapshot().fetched_at >= Some(loaded_at));
        assert_eq!(table.view_index(), 1);
        assert_eq!(table.snapshot().rows[1]["title"], json!("Renamed"));
    }

    #[test]
    fn test_exhaustion_survives_refetch() {
        let mut rows = catalog(7);
        let mut table = loaded(&rows);
        fetch_next(&mut table, &rows);
        assert!(table.cache().is_exhausted());
        let identity = table.observed_identity().clone();

        rows.extend(catalog(12).into_iter().skip(7));
        let mut request = table.refetch_current().unwrap();
        let refreshed = loop {
            match table.settle(&request, respond(&rows, &request)) {
                Settled::FollowUp(next) => request = next,
                other => break other,
            }
        };

        assert_eq!(refreshed, Settled::Refreshed { pages: 2 });
        assert_eq!(table.observed_identity(), &identity);
        assert_eq!(table.snapshot().rows.len(), 5);
        assert!(table.cache().is_exhausted());
        assert_eq!(table.next_page(), NextPage::Rejected(NavRejected::Exhausted));
    }

    #[test]
    fn test_set_selection_keeps_visible_rows_only() {
        let rows = catalog(12);
        let mut table = loaded(&rows);

        let ids: HashSet<String> = ["2", "999"].map(String::from).into();
        assert!(table.set_selection(SelectionUpdate::Replace(ids)));
        assert_eq!(table.snapshot().selected, HashSet::from(["2".to_string()]));

        let add_hidden = SelectionUpdate::with(|prev| {
            let mut next = prev.clone();
            next.insert("6".to_string());
            next
        });
        assert!(!table.set_selection(add_hidden));
        assert_eq!(table.selection().len(), 1);
        assert!(table.selection().is_selected("2"));
    }

    #[test]
    fn test_nan_filter_settles_once() {
        let config = TableConfig::default().with_debounce(Duration::ZERO);
        let rows = catalog(12);
        let mut table: TableState<Value> = TableState::new("products", config);
        let request = table.begin_initial().unwrap();
        table.settle(&request, respond(&rows, &request));

        let nan = FilterDescriptor::number(NumberMatch::GreaterThan, f64::NAN);
        table.set_filter("price", nan, Instant::now());
        let request = table.flush_filters().unwrap();
        assert_eq!(table.epoch(), 1);

        assert!(table.poll_filters(Instant::now()).is_none());
        assert!(table.poll_filters(Instant::now()).is_none());
        assert_eq!(table.epoch(), 1);
        assert!(table.is_fetching());
        assert_eq!(table.settle(&request, respond(&rows, &request)), Settled::Appended { index: 0 });
    }

    #[test]
    fn test_local_mode_filters_without_fetch() {
        let config = TableConfig::default().with_filter_mode(FilterMode::Local);
        let rows = catalog(5);
        let mut table: TableState<Value> = TableState::new("products", config)
            .with_filters(FilterSet::new().with("title", FilterDescriptor::empty_text()));
        let request = table.begin_initial().unwrap();
        table.settle(&request, respond(&rows, &request));

        table.set_text("title", "item 4", Instant::now());
        assert!(table.flush_filters().is_none());
        assert!(!table.is_fetching());
        assert_eq!(table.snapshot().rows, vec![rows[3].clone()]);
    }

    #[test]
    fn test_page_size_change_resets() {
        let rows = catalog(12);
        let mut table = loaded(&rows);
        let request = table.set_page_size(PageSize::Ten).unwrap();
        assert_eq!(request.cursor(), Cursor::first(PageSize::Ten));
        table.settle(&request, respond(&rows, &request));
        assert_eq!(table.snapshot().rows.len(), 10);
        assert!(table.set_page_size(PageSize::Ten).is_none());
    }

    #[test]
    fn test_selection_mode_none() {
        let config = TableConfig::default().with_selection_mode(SelectionMode::None);
        let rows = catalog(5);
        let mut table: TableState<Value> = TableState::new("products", config);
        let request = table.begin_initial().unwrap();
        table.settle(&request, respond(&rows, &request));
        assert!(!table.toggle_row_selected("1"));
        assert!(!table.toggle_all_rows_selected());
    }

    #[test]
    fn test_resize_column_publishes() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut table: TableState<Value> = TableState::new("products", TableConfig::default())
            .with_columns(vec![ColumnDef::new("title", "Title").max_width(300)]);
        let sink = Arc::clone(&events);
        table.subscribe(move |event| sink.lock().unwrap().push(event.clone()));

        assert!(table.resize_column("title", 500));
        assert!(!table.resize_column("missing", 80));
        assert_eq!(
            *events.lock().unwrap(),
            vec![TableEvent::ColumnResized {
                column: "title".to_string(),
                width: 300
            }]
        );
    }

    #[test]
    fn test_events_follow_the_fetch_lifecycle() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let rows = catalog(7);
        let mut table = table();
        let sink = Arc::clone(&events);
        table.subscribe(move |event| sink.lock().unwrap().push(event.clone()));

        let request = table.begin_initial().unwrap();
        table.settle(&request, respond(&rows, &request));
        fetch_next(&mut table, &rows);

        assert_eq!(
            *events.lock().unwrap(),
            vec![
                TableEvent::FetchStarted { offset: 0 },
                TableEvent::PageAppended { index: 0, rows: 5 },
                TableEvent::FetchStarted { offset: 5 },
                TableEvent::PageAppended { index: 1, rows: 2 },
                TableEvent::ViewChanged { index: 1 },
                TableEvent::Exhausted,
            ]
        );
    }
}
