use crate::model::{ForecastRequest, ForecastSnapshot};

/// Where a forecast load came from. Only user-initiated loads are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOrigin {
    Startup,
    User,
}

/// A forecast fetch to run against the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastFetch {
    pub seq: u64,
    pub request: ForecastRequest,
    pub origin: LoadOrigin,
}

/// What a completed fetch did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// A newer fetch superseded this one; nothing changed.
    Stale,
    /// Current fetch failed; loading cleared, previous snapshot kept.
    Failed,
    /// Snapshot stored. Carries the city to persist for user loads.
    Loaded { persist: Option<String> },
}

/// Owns the loading flag and the latest snapshot.
#[derive(Debug, Default)]
pub struct ForecastSession {
    loading: bool,
    weather: Option<ForecastSnapshot>,
    latest: u64,
}

impl ForecastSession {
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn weather(&self) -> Option<&ForecastSnapshot> {
        self.weather.as_ref()
    }

    /// Enter `Loading` and supersede any fetch still in flight.
    pub fn load_city(&mut self, city: String, days: u8, origin: LoadOrigin) -> ForecastFetch {
        self.loading = true;
        self.latest += 1;
        ForecastFetch { seq: self.latest, request: ForecastRequest::new(city, days.max(1)), origin }
    }

    /// Apply the outcome of `fetch`. `None` stands for a failed fetch.
    pub fn complete(
        &mut self,
        fetch: &ForecastFetch,
        result: Option<ForecastSnapshot>,
    ) -> Completion {
        if fetch.seq != self.latest {
            return Completion::Stale;
        }

        self.loading = false;
        match result {
            Some(snapshot) => {
                self.weather = Some(snapshot);
                let persist =
                    (fetch.origin == LoadOrigin::User).then(|| fetch.request.city.clone());
                Completion::Loaded { persist }
            }
            None => Completion::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CurrentConditions, PlaceName};

    fn snapshot(city: &str) -> ForecastSnapshot {
        ForecastSnapshot {
            current: CurrentConditions {
                temperature_c: 10.0,
                condition: "Clear".into(),
                wind_kph: 5.0,
                humidity_pct: 40,
                sunrise: None,
            },
            location: PlaceName { name: city.into(), country: "Nowhere".into() },
            daily: Vec::new(),
        }
    }

    #[test]
    fn load_sets_loading_immediately() {
        let mut s = ForecastSession::default();
        assert!(!s.is_loading());

        let fetch = s.load_city("Istanbul".into(), 7, LoadOrigin::Startup);

        assert!(s.is_loading());
        assert_eq!(fetch.request, ForecastRequest::new("Istanbul", 7));
    }

    #[test]
    fn startup_load_is_not_persisted() {
        let mut s = ForecastSession::default();
        let fetch = s.load_city("Istanbul".into(), 7, LoadOrigin::Startup);

        let done = s.complete(&fetch, Some(snapshot("Istanbul")));

        assert_eq!(done, Completion::Loaded { persist: None });
        assert!(!s.is_loading());
    }

    #[test]
    fn user_load_is_persisted() {
        let mut s = ForecastSession::default();
        let fetch = s.load_city("London".into(), 7, LoadOrigin::User);

        let done = s.complete(&fetch, Some(snapshot("London")));

        assert_eq!(done, Completion::Loaded { persist: Some("London".into()) });
    }

    #[test]
    fn earlier_response_cannot_clobber_later_one() {
        let mut s = ForecastSession::default();
        let paris = s.load_city("Paris".into(), 7, LoadOrigin::User);
        let london = s.load_city("London".into(), 7, LoadOrigin::User);

        s.complete(&london, Some(snapshot("London")));
        let late = s.complete(&paris, Some(snapshot("Paris")));

        assert_eq!(late, Completion::Stale);
        assert_eq!(s.weather().map(|w| w.location.name.as_str()), Some("London"));
    }

    #[test]
    fn stale_response_keeps_loading_for_current_fetch() {
        let mut s = ForecastSession::default();
        let paris = s.load_city("Paris".into(), 7, LoadOrigin::User);
        let _london = s.load_city("London".into(), 7, LoadOrigin::User);

        s.complete(&paris, Some(snapshot("Paris")));

        assert!(s.is_loading());
        assert!(s.weather().is_none());
    }

    #[test]
    fn failure_clears_loading_and_keeps_previous_snapshot() {
        let mut s = ForecastSession::default();
        let first = s.load_city("Istanbul".into(), 7, LoadOrigin::Startup);
        s.complete(&first, Some(snapshot("Istanbul")));

        let second = s.load_city("Atlantis".into(), 7, LoadOrigin::User);
        let done = s.complete(&second, None);

        assert_eq!(done, Completion::Failed);
        assert!(!s.is_loading());
        assert_eq!(s.weather().map(|w| w.location.name.as_str()), Some("Istanbul"));
    }
}
