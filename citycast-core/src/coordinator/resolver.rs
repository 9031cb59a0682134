use serde::Serialize;

use crate::model::LocationCandidate;

/// Search overlay as seen by the renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchState {
    pub open: bool,
    pub candidates: Vec<LocationCandidate>,
}

/// A location search to run against the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub seq: u64,
    pub query: String,
}

/// Tracks the search overlay and which query response is still wanted.
///
/// Responses are matched against `latest`; anything older is dropped.
#[derive(Debug, Default)]
pub struct LocationResolver {
    search: SearchState,
    latest: u64,
}

impl LocationResolver {
    pub fn state(&self) -> &SearchState {
        &self.search
    }

    /// Flip the overlay. Closing it drops candidates and any pending response.
    pub fn toggle(&mut self) {
        self.search.open = !self.search.open;
        if !self.search.open {
            self.invalidate();
            self.search.candidates.clear();
        }
    }

    /// A keystroke arrived: any response still in flight is now stale.
    ///
    /// `searchable` is false for input too short to query, in which case the
    /// current candidates are dropped as well.
    pub fn text_changed(&mut self, searchable: bool) {
        self.invalidate();
        if !searchable {
            self.search.candidates.clear();
        }
    }

    pub fn issue(&mut self, query: String) -> SearchRequest {
        self.latest += 1;
        SearchRequest { seq: self.latest, query }
    }

    /// Apply a provider response. Returns false when the response was stale.
    ///
    /// `None` stands for a failed search and leaves the candidates untouched.
    pub fn accept(&mut self, seq: u64, candidates: Option<Vec<LocationCandidate>>) -> bool {
        if seq != self.latest || !self.search.open {
            return false;
        }
        if let Some(candidates) = candidates {
            self.search.candidates = candidates;
        }
        true
    }

    /// Commit to `candidate`, ending this search session.
    pub fn select(&mut self, candidate: &LocationCandidate) -> String {
        self.invalidate();
        self.search.candidates.clear();
        self.search.open = false;
        candidate.name.clone()
    }

    fn invalidate(&mut self) {
        self.latest += 1;
    }
}
