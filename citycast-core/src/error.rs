/// Failures observed by the coordinator.
///
/// The first three are recovered locally and only logged; none of them is
/// ever reflected in the published view state.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error("location search for '{query}' failed: {cause:#}")]
    SearchFailed { query: String, cause: anyhow::Error },

    #[error("forecast for '{city}' failed: {cause:#}")]
    ForecastFailed { city: String, cause: anyhow::Error },

    #[error("persisting last city '{city}' failed: {cause:#}")]
    PersistenceFailed { city: String, cause: anyhow::Error },

    #[error("coordinator is no longer running")]
    Closed,
}
