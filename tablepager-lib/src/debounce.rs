//! Value debouncing.

use std::time::Duration;

use tokio::time::Instant;

/// A value whose changes only propagate after a quiet period.
///
/// [`set`](Debounced::set) records the live value and restarts the timer;
/// [`poll`](Debounced::poll) promotes it to the settled value once `delay` has
/// passed without another change. A zero delay settles immediately.
///
/// Time is passed in explicitly so the caller decides which clock drives it.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tokio::time::Instant;
/// use tablepager_lib::debounce::Debounced;
///
/// let start = Instant::now();
/// let mut query = Debounced::new(String::new(), Duration::from_millis(300));
///
/// query.set("sh".to_string(), start);
/// query.set("shirt".to_string(), start + Duration::from_millis(100));
/// assert_eq!(query.poll(start + Duration::from_millis(200)), None);
/// assert_eq!(query.poll(start + Duration::from_millis(400)).map(String::as_str), Some("shirt"));
/// ```
#[derive(Debug, Clone)]
pub struct Debounced<T> {
    value: T,
    settled: T,
    delay: Duration,
    deadline: Option<Instant>,
}

impl<T: Clone> Debounced<T> {
    /// Creates a debounced value; live and settled start equal.
    pub fn new(initial: T, delay: Duration) -> Self {
        Self {
            value: initial.clone(),
            settled: initial,
            delay,
            deadline: None,
        }
    }

    /// Sets the live value and restarts the quiet period.
    pub fn set(&mut self, value: T, now: Instant) {
        self.value = value;
        self.arm(now);
    }

    /// Edits the live value in place and restarts the quiet period.
    pub fn update<F: FnOnce(&mut T)>(&mut self, f: F, now: Instant) {
        f(&mut self.value);
        self.arm(now);
    }

    fn arm(&mut self, now: Instant) {
        if self.delay.is_zero() {
            self.settled = self.value.clone();
            self.deadline = None;
        } else {
            self.deadline = Some(now + self.delay);
        }
    }

    /// Promotes the live value if the quiet period is over.
    ///
    /// Returns the newly settled value, or `None` if nothing changed.
    pub fn poll(&mut self, now: Instant) -> Option<&T> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                self.settled = self.value.clone();
                Some(&self.settled)
            }
            _ => None,
        }
    }

    /// Settles the live value immediately.
    pub fn flush(&mut self) -> &T {
        self.deadline = None;
        self.settled = self.value.clone();
        &self.settled
    }

    /// Returns the live value.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Returns the settled value.
    pub fn settled(&self) -> &T {
        &self.settled
    }

    /// Returns when the pending change settles, if one is pending.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns `true` if a change is waiting for its quiet period.
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns the configured delay.
    pub fn delay(&self) -> Duration {
        self.delay
    }
}
