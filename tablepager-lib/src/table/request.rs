//! Fetch requests and their outcomes.

use crate::error::TableError;
use crate::fetch::PageQuery;
use crate::model::Cursor;
use crate::model::QueryIdentity;
use crate::paging::NavRejected;

/// Why a fetch was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// First page of the current identity.
    Initial,
    /// Page after the last cached one.
    Next,
    /// Re-fetch of cached page `slot` during a full refetch.
    Refetch {
        /// Cache index being refreshed.
        slot: usize,
    },
}

/// A fetch the table wants performed.
///
/// Carries the identity and reset epoch it was issued under so the result can
/// be matched against the state it lands in.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub(crate) ticket: u64,
    pub(crate) kind: FetchKind,
    pub(crate) cursor: Cursor,
    pub(crate) identity: QueryIdentity,
    pub(crate) epoch: u64,
}

impl FetchRequest {
    /// Returns the ticket id.
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    /// Returns the fetch kind.
    pub fn kind(&self) -> FetchKind {
        self.kind
    }

    /// Returns the cursor to fetch.
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Returns the identity the request was issued under.
    pub fn identity(&self) -> &QueryIdentity {
        &self.identity
    }

    /// Returns the reset epoch the request was issued under.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Builds the query handed to the fetcher.
    pub fn query(&self) -> PageQuery {
        PageQuery {
            resource: self.identity.resource().to_string(),
            cursor: self.cursor,
            filters: self.identity.filters().clone(),
        }
    }
}

/// Result of handing a fetch result back to the table.
#[derive(Debug, Clone, PartialEq)]
pub enum Settled {
    /// A page was appended at `index`.
    Appended {
        /// Cache index of the new page.
        index: usize,
    },
    /// A full refetch finished and replaced the cache.
    Refreshed {
        /// Number of pages now cached.
        pages: usize,
    },
    /// A full refetch needs the next page; perform this request too.
    FollowUp(FetchRequest),
    /// The fetch failed; cached pages are unchanged.
    Failed(String),
    /// The result belongs to an outdated query and was discarded.
    Stale,
    /// The page cache refused the page.
    Dropped(TableError),
}

/// Result of asking the table to move forward.
#[derive(Debug, Clone, PartialEq)]
pub enum NextPage {
    /// Moved onto an already cached page.
    Navigated(usize),
    /// The next page must be fetched; the view moves once it lands.
    Fetch(FetchRequest),
    /// The move was refused.
    Rejected(NavRejected),
}
