use serde::Serialize;

use super::{
    resolver::{LocationResolver, SearchRequest, SearchState},
    session::{Completion, ForecastFetch, ForecastSession, LoadOrigin},
};
use crate::{
    error::CoordinatorError,
    model::{ForecastSnapshot, LocationCandidate},
};

/// Read-only snapshot handed to the renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViewState {
    pub loading: bool,
    pub search: SearchState,
    pub weather: Option<ForecastSnapshot>,
}

impl ViewState {
    /// Nothing loaded yet and nothing in flight.
    pub fn is_idle(&self) -> bool {
        !self.loading && self.weather.is_none()
    }
}

/// Inputs to the reducer: renderer events plus provider responses.
#[derive(Debug)]
pub enum Event {
    /// A keystroke or edit. `searchable` tells whether the text is long
    /// enough to be queried once the debounce settles.
    TextChanged { searchable: bool },
    QueryCommitted(String),
    SearchIconPressed,
    LocationChosen(LocationCandidate),
    LoadDefault,
    LoadCity { city: String, days: u8 },
    CandidatesLoaded {
        request: SearchRequest,
        result: Result<Vec<LocationCandidate>, CoordinatorError>,
    },
    ForecastLoaded {
        fetch: ForecastFetch,
        result: Result<ForecastSnapshot, CoordinatorError>,
    },
}

/// Side effects requested by the reducer, executed by the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SearchLocations(SearchRequest),
    FetchForecast(ForecastFetch),
    PersistCity(String),
}

/// Everything the coordinator owns besides the debouncer.
#[derive(Debug)]
pub struct CoreState {
    default_city: String,
    forecast_days: u8,
    resolver: LocationResolver,
    session: ForecastSession,
}

impl CoreState {
    pub fn new(default_city: impl Into<String>, forecast_days: u8) -> Self {
        Self {
            default_city: default_city.into(),
            forecast_days,
            resolver: LocationResolver::default(),
            session: ForecastSession::default(),
        }
    }

    pub fn view(&self) -> ViewState {
        ViewState {
            loading: self.session.is_loading(),
            search: self.resolver.state().clone(),
            weather: self.session.weather().cloned(),
        }
    }

    pub fn reduce(mut self, event: Event) -> (Self, Vec<Effect>) {
        let effects = self.apply(event);
        (self, effects)
    }

    fn apply(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::TextChanged { searchable } => {
                self.resolver.text_changed(searchable);
                Vec::new()
            }
            Event::QueryCommitted(query) => {
                if !self.resolver.state().open {
                    tracing::debug!(%query, "search closed, dropping committed query");
                    return Vec::new();
                }
                vec![Effect::SearchLocations(self.resolver.issue(query))]
            }
            Event::SearchIconPressed => {
                self.resolver.toggle();
                Vec::new()
            }
            Event::LocationChosen(candidate) => {
                let city = self.resolver.select(&candidate);
                let fetch = self.session.load_city(city, self.forecast_days, LoadOrigin::User);
                vec![Effect::FetchForecast(fetch)]
            }
            Event::LoadDefault => {
                let fetch = self.session.load_city(
                    self.default_city.clone(),
                    self.forecast_days,
                    LoadOrigin::Startup,
                );
                vec![Effect::FetchForecast(fetch)]
            }
            Event::LoadCity { city, days } => {
                let fetch = self.session.load_city(city, days, LoadOrigin::User);
                vec![Effect::FetchForecast(fetch)]
            }
            Event::CandidatesLoaded { request, result } => {
                let candidates = match result {
                    Ok(candidates) => Some(candidates),
                    Err(err) => {
                        tracing::warn!(seq = request.seq, "{err}");
                        None
                    }
                };
                if !self.resolver.accept(request.seq, candidates) {
                    tracing::debug!(
                        seq = request.seq,
                        query = %request.query,
                        "discarding stale search response"
                    );
                }
                Vec::new()
            }
            Event::ForecastLoaded { fetch, result } => {
                let snapshot = match result {
                    Ok(snapshot) => Some(snapshot),
                    Err(err) => {
                        tracing::warn!(seq = fetch.seq, "{err}");
                        None
                    }
                };
                match self.session.complete(&fetch, snapshot) {
                    Completion::Stale => {
                        tracing::debug!(
                            seq = fetch.seq,
                            city = %fetch.request.city,
                            "discarding stale forecast response"
                        );
                        Vec::new()
                    }
                    Completion::Failed => Vec::new(),
                    Completion::Loaded { persist } => {
                        tracing::info!(
                            city = %fetch.request.city,
                            days = fetch.request.days,
                            "forecast loaded"
                        );
                        persist.map(Effect::PersistCity).into_iter().collect()
                    }
                }
            }
        }
    }
}
