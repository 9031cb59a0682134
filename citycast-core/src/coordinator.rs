//! Location search and forecast loading coordinator.
//!
//! A single task owns all mutable state. Renderer events and provider
//! responses arrive on one inbox and are folded through [`CoreState::reduce`];
//! every resulting [`ViewState`] is published on a watch channel. Provider and
//! store calls run as spawned tasks that post their results back to the inbox,
//! so the only ordering rule needed is the sequence-number check the reducer
//! applies to each response.

use std::{sync::Arc, time::Duration};
use tokio::{
    sync::{mpsc, watch},
    task::{JoinHandle, JoinSet},
    time::Instant,
};

use crate::{
    Config,
    error::CoordinatorError,
    model::LocationCandidate,
    provider::{ForecastProvider, LocationSearchProvider},
    store::{KeyValueStore, LAST_CITY_KEY},
};

pub mod debounce;
pub mod resolver;
pub mod session;
pub mod state;

use debounce::Debouncer;
pub use resolver::SearchState;
pub use session::LoadOrigin;
pub use state::{CoreState, Effect, Event, ViewState};

/// Tunables for the coordinator. See [`Config::settings`].
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub debounce: Duration,
    pub min_query_chars: usize,
    pub default_city: String,
    pub forecast_days: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Config::default().settings()
    }
}

/// External services the coordinator talks to.
#[derive(Debug, Clone)]
pub struct Collaborators {
    pub search: Arc<dyn LocationSearchProvider>,
    pub forecast: Arc<dyn ForecastProvider>,
    pub store: Arc<dyn KeyValueStore>,
}

#[derive(Debug)]
enum Inbound {
    TextChanged(String),
    Event(Event),
}

/// Handle to a running coordinator.
///
/// The coordinator task ends once the handle is dropped; provider responses
/// still in flight at that point are discarded.
#[derive(Debug)]
pub struct Coordinator {
    inbox: mpsc::UnboundedSender<Inbound>,
    view: watch::Receiver<ViewState>,
    worker: JoinHandle<()>,
}

impl Coordinator {
    /// Start the coordinator task. Must be called from within a tokio runtime.
    pub fn spawn(settings: Settings, collaborators: Collaborators) -> Self {
        let state = CoreState::new(settings.default_city.clone(), settings.forecast_days);
        let (publish, view) = watch::channel(state.view());
        let (inbox, rx) = mpsc::unbounded_channel();

        let worker =
            tokio::spawn(run(state, settings, collaborators, inbox.downgrade(), rx, publish));

        Self { inbox, view, worker }
    }

    /// Search text was edited.
    pub fn text_changed(&self, raw: impl Into<String>) -> Result<(), CoordinatorError> {
        self.send(Inbound::TextChanged(raw.into()))
    }

    pub fn location_chosen(&self, candidate: LocationCandidate) -> Result<(), CoordinatorError> {
        self.send(Inbound::Event(Event::LocationChosen(candidate)))
    }

    /// Open or close the search overlay. Never touches forecast loading.
    pub fn search_icon_pressed(&self) -> Result<(), CoordinatorError> {
        self.send(Inbound::Event(Event::SearchIconPressed))
    }

    /// Load the startup city. The result is never persisted.
    pub fn load_default(&self) -> Result<(), CoordinatorError> {
        self.send(Inbound::Event(Event::LoadDefault))
    }

    /// Load `city` as an explicit user request; persisted on success.
    pub fn load_city(&self, city: impl Into<String>, days: u8) -> Result<(), CoordinatorError> {
        self.send(Inbound::Event(Event::LoadCity { city: city.into(), days }))
    }

    pub fn snapshot(&self) -> ViewState {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.view.clone()
    }

    /// Stop accepting events and wait for pending last-city writes to finish.
    pub async fn shutdown(self) {
        let Self { inbox, worker, .. } = self;
        drop(inbox);
        if let Err(err) = worker.await {
            tracing::warn!("coordinator task ended abnormally: {err}");
        }
    }

    fn send(&self, msg: Inbound) -> Result<(), CoordinatorError> {
        self.inbox.send(msg).map_err(|_| CoordinatorError::Closed)
    }
}

/// City to load on startup.
///
/// This is `default_city` unless `resume_last_city` is enabled and a city
/// was persisted earlier.
pub async fn startup_city(config: &Config, store: &dyn KeyValueStore) -> String {
    if config.resume_last_city {
        match store.get(LAST_CITY_KEY).await {
            Ok(Some(city)) if !city.trim().is_empty() => return city,
            Ok(_) => {}
            Err(err) => tracing::warn!("could not read last city: {err:#}"),
        }
    }
    config.default_city.clone()
}

async fn run(
    mut state: CoreState,
    settings: Settings,
    collaborators: Collaborators,
    outbox: mpsc::WeakUnboundedSender<Inbound>,
    mut inbox: mpsc::UnboundedReceiver<Inbound>,
    publish: watch::Sender<ViewState>,
) {
    let mut debouncer = Debouncer::new(settings.debounce, settings.min_query_chars);
    let mut writes = JoinSet::new();

    loop {
        let deadline = debouncer.deadline();
        let event = tokio::select! {
            msg = inbox.recv() => match msg {
                Some(Inbound::TextChanged(raw)) => {
                    debouncer.text_changed(&raw, Instant::now());
                    Event::TextChanged { searchable: debouncer.is_searchable(&raw) }
                }
                Some(Inbound::Event(event)) => event,
                None => break,
            },
            () = sleep_until(deadline) => match debouncer.fire(Instant::now()) {
                Some(query) => Event::QueryCommitted(query),
                None => continue,
            },
            Some(_) = writes.join_next(), if !writes.is_empty() => continue,
        };

        let (next, effects) = state.reduce(event);
        state = next;

        let view = state.view();
        if !view.search.open {
            debouncer.cancel();
        }
        publish.send_if_modified(|current| {
            if *current == view {
                return false;
            }
            *current = view;
            true
        });

        for effect in effects {
            execute(effect, &collaborators, &outbox, &mut writes);
        }
    }

    while writes.join_next().await.is_some() {}
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn execute(
    effect: Effect,
    collaborators: &Collaborators,
    outbox: &mpsc::WeakUnboundedSender<Inbound>,
    writes: &mut JoinSet<()>,
) {
    match effect {
        Effect::SearchLocations(request) => {
            let provider = Arc::clone(&collaborators.search);
            let outbox = outbox.clone();
            tokio::spawn(async move {
                tracing::debug!(seq = request.seq, query = %request.query, "searching locations");
                let result = provider.search(&request.query).await.map_err(|cause| {
                    CoordinatorError::SearchFailed { query: request.query.clone(), cause }
                });
                post(&outbox, Event::CandidatesLoaded { request, result });
            });
        }
        Effect::FetchForecast(fetch) => {
            let provider = Arc::clone(&collaborators.forecast);
            let outbox = outbox.clone();
            tokio::spawn(async move {
                tracing::debug!(
                    seq = fetch.seq,
                    city = %fetch.request.city,
                    days = fetch.request.days,
                    "fetching forecast"
                );
                let result = provider.forecast(&fetch.request).await.map_err(|cause| {
                    CoordinatorError::ForecastFailed { city: fetch.request.city.clone(), cause }
                });
                post(&outbox, Event::ForecastLoaded { fetch, result });
            });
        }
        Effect::PersistCity(city) => {
            let store = Arc::clone(&collaborators.store);
            writes.spawn(async move {
                if let Err(cause) = store.set(LAST_CITY_KEY, &city).await {
                    tracing::warn!("{}", CoordinatorError::PersistenceFailed { city, cause });
                }
            });
        }
    }
}

fn post(outbox: &mpsc::WeakUnboundedSender<Inbound>, event: Event) {
    let delivered = outbox.upgrade().is_some_and(|tx| tx.send(Inbound::Event(event)).is_ok());
    if !delivered {
        tracing::debug!("coordinator stopped before a provider response arrived");
    }
}
