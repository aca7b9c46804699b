//! Table change notifications.
//!
//! The table publishes a [`TableEvent`] for every state change a renderer
//! might care about. Listeners are plain closures registered on a
//! [`Listeners`] list; they receive events in the order changes happened.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use crate::model::QueryIdentity;
use crate::paging::NavRejected;

/// A state change published by the table.
#[derive(Debug, Clone, PartialEq)]
pub enum TableEvent {
    /// The query identity changed; cache, view and selection were reset.
    QueryChanged(QueryIdentity),
    /// A fetch started.
    FetchStarted {
        /// Offset being fetched.
        offset: usize,
    },
    /// A page was appended at `index`.
    PageAppended {
        /// Cache index of the new page.
        index: usize,
        /// Rows in the new page.
        rows: usize,
    },
    /// A full refetch replaced the cached pages.
    PagesRefreshed {
        /// Number of pages now cached.
        pages: usize,
    },
    /// The displayed page changed.
    ViewChanged {
        /// New view index.
        index: usize,
    },
    /// No further pages exist for the current query.
    Exhausted,
    /// A fetch failed; cached pages are unchanged.
    FetchFailed {
        /// Error message.
        message: String,
    },
    /// A navigation request was refused.
    NavigationRejected(NavRejected),
    /// The selection changed.
    SelectionChanged,
    /// Live or settled filters changed.
    FiltersChanged,
    /// A column was resized.
    ColumnResized {
        /// Column id.
        column: String,
        /// New width.
        width: u32,
    },
}

/// Identifies a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

type Callback = Arc<dyn Fn(&TableEvent) + Send + Sync>;

/// A shared list of event listeners.
///
/// Cheap to clone; clones share the same list.
#[derive(Clone, Default)]
pub struct Listeners {
    inner: Arc<Mutex<Vec<(ListenerId, Callback)>>>,
}

impl Listeners {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener.
    pub fn subscribe<F>(&self, f: F) -> ListenerId
    where
        F: Fn(&TableEvent) + Send + Sync + 'static,
    {
        let id = ListenerId::next();
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(f)));
        id
    }

    /// Removes a listener. Returns `true` if it was registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let before = guard.len();
        guard.retain(|(existing, _)| *existing != id);
        guard.len() != before
    }

    /// Delivers `event` to every listener.
    ///
    /// The list is snapshotted first, so a listener may subscribe or
    /// unsubscribe without deadlocking.
    pub fn emit(&self, event: &TableEvent) {
        let callbacks: Vec<Callback> = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();

        for callback in callbacks {
            callback(event);
        }
    }

    /// Returns the number of listeners.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns `true` if nobody is listening.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners").field("len", &self.len()).finish()
    }
}
