//! Index of the displayed page.

use std::fmt;

/// Why a navigation request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavRejected {
    /// A fetch is in flight.
    Fetching,
    /// Already at the first page.
    AtStart,
    /// No further pages exist.
    Exhausted,
    /// The only page ahead is an empty trailing page.
    EmptyTrailingPage,
    /// Nothing is cached and no fetch can start.
    Empty,
}

impl fmt::Display for NavRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Fetching => "fetch in flight",
            Self::AtStart => "already at first page",
            Self::Exhausted => "no more pages",
            Self::EmptyTrailingPage => "next page is empty",
            Self::Empty => "nothing cached",
        };
        f.write_str(reason)
    }
}

/// What the paging state looks like from the view's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    /// Number of cached pages.
    pub cache_len: usize,
    /// Whether a fetch is in flight.
    pub fetching: bool,
    /// Whether the cache is exhausted.
    pub exhausted: bool,
    /// Whether the last cached page is empty.
    pub last_empty: bool,
}

/// Forward step decided by [`ViewIndex::plan_increment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The next page is cached; move onto it.
    Cached,
    /// The next page must be fetched first.
    NeedsFetch,
}

/// Index of the displayed page within the cache.
///
/// Stays in `0..cache_len`, or at `0` while the cache is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewIndex(usize);

impl ViewIndex {
    /// Creates an index on the first page.
    pub fn new() -> Self {
        Self(0)
    }

    /// Returns the raw index.
    pub fn get(self) -> usize {
        self.0
    }

    /// Decides whether moving forward is allowed and how.
    pub fn plan_increment(self, bounds: Bounds) -> Result<Step, NavRejected> {
        if bounds.fetching {
            return Err(NavRejected::Fetching);
        }

        let next = self.0 + 1;

        // View one behind an empty last page: that page only marks the end.
        if bounds.last_empty && bounds.cache_len >= 2 && next == bounds.cache_len - 1 {
            return Err(NavRejected::EmptyTrailingPage);
        }

        if next < bounds.cache_len {
            return Ok(Step::Cached);
        }

        if bounds.cache_len == 0 {
            return Err(NavRejected::Empty);
        }

        if bounds.exhausted {
            return Err(NavRejected::Exhausted);
        }

        Ok(Step::NeedsFetch)
    }

    /// Moves forward if the next page is cached.
    ///
    /// Returns [`Step::NeedsFetch`] without moving when the next page has to
    /// be fetched first; the caller moves with
    /// [`follow_append`](ViewIndex::follow_append) once it lands.
    pub fn increment(&mut self, bounds: Bounds) -> Result<Step, NavRejected> {
        let step = self.plan_increment(bounds)?;
        if step == Step::Cached {
            self.0 += 1;
        }
        Ok(step)
    }

    /// Moves onto the page a next-page fetch just appended at `index`.
    ///
    /// Only valid when `index` is directly after the current page.
    pub fn follow_append(&mut self, index: usize) -> bool {
        if index == self.0 + 1 {
            self.0 = index;
            true
        } else {
            false
        }
    }

    /// Moves back one page.
    pub fn decrement(&mut self, fetching: bool) -> Result<usize, NavRejected> {
        if fetching {
            return Err(NavRejected::Fetching);
        }
        if self.0 == 0 {
            return Err(NavRejected::AtStart);
        }
        self.0 -= 1;
        Ok(self.0)
    }

    /// Pulls the index back inside `0..cache_len` after the cache shrank.
    pub fn clamp(&mut self, cache_len: usize) {
        self.0 = self.0.min(cache_len.saturating_sub(1));
    }

    /// Forces the index to the first page. Not a navigation; no guards apply.
    pub fn reset(&mut self) {
        self.0 = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(cache_len: usize) -> Bounds {
        Bounds {
            cache_len,
            fetching: false,
            exhausted: false,
            last_empty: false,
        }
    }

    #[test]
    fn test_increment_within_cache() {
        let mut view = ViewIndex::new();
        assert_eq!(view.increment(bounds(3)), Ok(Step::Cached));
        assert_eq!(view.increment(bounds(3)), Ok(Step::Cached));
        assert_eq!(view.get(), 2);
        assert_eq!(view.increment(bounds(3)), Ok(Step::NeedsFetch));
        assert_eq!(view.get(), 2);
    }

    #[test]
    fn test_increment_rejected_while_fetching() {
        let mut view = ViewIndex::new();
        let b = Bounds {
            fetching: true,
            ..bounds(3)
        };
        assert_eq!(view.increment(b), Err(NavRejected::Fetching));
        assert_eq!(view.get(), 0);
    }

    #[test]
    fn test_increment_at_exhausted_end() {
        let view = ViewIndex(1);
        let b = Bounds {
            exhausted: true,
            ..bounds(2)
        };
        assert_eq!(view.plan_increment(b), Err(NavRejected::Exhausted));
    }

    #[test]
    fn test_empty_trailing_page_blocks() {
        let view = ViewIndex(1);
        let b = Bounds {
            exhausted: true,
            last_empty: true,
            ..bounds(3)
        };
        assert_eq!(view.plan_increment(b), Err(NavRejected::EmptyTrailingPage));

        // Further back, the cached pages in between are still reachable.
        let view = ViewIndex(0);
        assert_eq!(view.plan_increment(b), Ok(Step::Cached));
    }

    #[test]
    fn test_decrement() {
        let mut view = ViewIndex(2);
        assert_eq!(view.decrement(true), Err(NavRejected::Fetching));
        assert_eq!(view.decrement(false), Ok(1));
        assert_eq!(view.decrement(false), Ok(0));
        assert_eq!(view.decrement(false), Err(NavRejected::AtStart));
    }

    #[test]
    fn test_follow_append_only_next() {
        let mut view = ViewIndex(1);
        assert!(!view.follow_append(3));
        assert!(view.follow_append(2));
        assert_eq!(view.get(), 2);
    }

    #[test]
    fn test_clamp_and_reset() {
        let mut view = ViewIndex(4);
        view.clamp(2);
        assert_eq!(view.get(), 1);
        view.clamp(0);
        assert_eq!(view.get(), 0);
        view = ViewIndex(3);
        view.reset();
        assert_eq!(view.get(), 0);
    }
}
