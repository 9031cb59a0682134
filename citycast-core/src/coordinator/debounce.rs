use std::time::Duration;
use tokio::time::Instant;

/// Trailing-edge debounce of search text.
///
/// Every edit cancels the pending query. Input long enough to search arms a
/// fresh deadline; the query fires once the deadline passes with no further
/// edits, carrying the latest text.
#[derive(Debug)]
pub struct Debouncer {
    interval: Duration,
    min_chars: usize,
    pending: Option<Pending>,
}

#[derive(Debug)]
struct Pending {
    query: String,
    deadline: Instant,
}

impl Debouncer {
    pub fn new(interval: Duration, min_chars: usize) -> Self {
        Self { interval, min_chars, pending: None }
    }

    /// Whether `raw` is long enough to be sent as a query.
    pub fn is_searchable(&self, raw: &str) -> bool {
        raw.chars().count() >= self.min_chars
    }

    pub fn text_changed(&mut self, raw: &str, now: Instant) {
        self.pending = self
            .is_searchable(raw)
            .then(|| Pending { query: raw.to_string(), deadline: now + self.interval });
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    /// Take the pending query if its quiet period has elapsed by `now`.
    pub fn fire(&mut self, now: Instant) -> Option<String> {
        match &self.pending {
            Some(p) if p.deadline <= now => self.pending.take().map(|p| p.query),
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
