use std::{sync::Arc, time::Duration};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{
    Password, Select, Text,
    error::{InquireError, InquireResult},
};
use tokio::sync::watch;

use citycast_core::{
    Collaborators, Config, Coordinator, FileStore, KeyValueStore, LocationSearchProvider,
    MemoryStore, Settings, ViewState, provider_from_config, startup_city, store::LAST_CITY_KEY,
};

use crate::render;

/// How long to wait for a forecast before giving up on the terminal side.
const LOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Extra time allowed for a search response after the debounce settles.
/// An empty or failed search is indistinguishable from a slow one until this runs out.
const SEARCH_GRACE: Duration = Duration::from_secs(5);

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "citycast", version, about = "City weather lookup")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the WeatherAPI.com key and the startup city.
    Configure,

    /// Show the forecast for a city, or for the startup city if omitted.
    Show {
        city: Option<String>,

        /// Number of forecast days.
        #[arg(long)]
        days: Option<u8>,

        /// Print the snapshot as JSON.
        #[arg(long)]
        json: bool,

        /// Do not remember the city.
        #[arg(long)]
        no_save: bool,
    },

    /// List locations matching a partial city name.
    Search {
        query: String,

        #[arg(long)]
        json: bool,
    },

    /// Search and pick cities interactively.
    Browse {
        #[arg(long)]
        no_save: bool,
    },

    /// Print the last chosen city.
    Last,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, days, json, no_save } => show(city, days, json, no_save).await,
            Command::Search { query, json } => search(&query, json).await,
            Command::Browse { no_save } => browse(no_save).await,
            Command::Last => last().await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut cfg = Config::load()?;

    let api_key = Password::new("WeatherAPI.com API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    if api_key.trim().is_empty() {
        bail!("API key must not be empty");
    }
    cfg.set_api_key(api_key.trim().to_string());

    cfg.default_city = Text::new("Startup city:")
        .with_default(&cfg.default_city)
        .prompt()
        .context("Failed to read startup city")?;

    cfg.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());

    Ok(())
}

fn open_store(no_save: bool) -> anyhow::Result<Arc<dyn KeyValueStore>> {
    if no_save {
        Ok(Arc::new(MemoryStore::new()))
    } else {
        Ok(Arc::new(FileStore::open_default()?))
    }
}

async fn start(
    config: &Config,
    store: Arc<dyn KeyValueStore>,
    days: Option<u8>,
) -> anyhow::Result<(Coordinator, Settings)> {
    let provider = Arc::new(provider_from_config(config)?);

    let mut settings = config.settings();
    settings.default_city = startup_city(config, store.as_ref()).await;
    if let Some(days) = days {
        settings.forecast_days = days.max(1);
    }

    tracing::debug!(
        city = %settings.default_city,
        days = settings.forecast_days,
        debounce = ?settings.debounce,
        "starting coordinator"
    );
    let coordinator = Coordinator::spawn(
        settings.clone(),
        Collaborators { search: provider.clone(), forecast: provider, store },
    );
    Ok((coordinator, settings))
}

async fn show(
    city: Option<String>,
    days: Option<u8>,
    json: bool,
    no_save: bool,
) -> anyhow::Result<()> {
    let config = Config::load()?;
    let (coordinator, settings) = start(&config, open_store(no_save)?, days).await?;
    let mut view = coordinator.subscribe();

    let target = match city {
        Some(city) => {
            coordinator.load_city(city.clone(), settings.forecast_days)?;
            city
        }
        None => {
            coordinator.load_default()?;
            settings.default_city
        }
    };

    let state = settled(&mut view).await?;
    let Some(weather) = state.weather else {
        tracing::debug!(city = %target, "load settled without a forecast");
        coordinator.shutdown().await;
        bail!("Could not load a forecast for '{target}'. Run with RUST_LOG=debug for details.");
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&weather)?);
    } else {
        print!("{}", render::forecast(&weather));
    }

    coordinator.shutdown().await;
    Ok(())
}

async fn search(query: &str, json: bool) -> anyhow::Result<()> {
    let config = Config::load()?;
    let provider = provider_from_config(&config)?;

    let candidates = provider.search(query).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&candidates)?);
    } else {
        println!("{}", render::candidates(&candidates));
    }

    Ok(())
}

async fn browse(no_save: bool) -> anyhow::Result<()> {
    let config = Config::load()?;
    let (coordinator, settings) = start(&config, open_store(no_save)?, None).await?;
    let mut view = coordinator.subscribe();

    coordinator.load_default()?;
    println!("{}", render::view(&settled(&mut view).await?));

    loop {
        let text =
            blocking(|| Text::new("Search city (empty to quit):").prompt_skippable()).await?;
        let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
            break;
        };
        if text.chars().count() < settings.min_query_chars {
            println!("Type at least {} characters.", settings.min_query_chars);
            continue;
        }

        if !coordinator.snapshot().search.open {
            coordinator.search_icon_pressed()?;
        }
        coordinator.text_changed(text)?;

        let listed = tokio::time::timeout(
            settings.debounce + SEARCH_GRACE,
            view.wait_for(|v| !v.search.candidates.is_empty()),
        )
        .await
        .ok()
        .and_then(Result::ok)
        .map(|state| state.search.candidates.clone());

        let Some(candidates) = listed else {
            tracing::debug!(grace = ?SEARCH_GRACE, "no candidates arrived");
            println!("{}", render::candidates(&[]));
            coordinator.search_icon_pressed()?;
            continue;
        };

        let labels: Vec<String> = candidates.iter().map(render::candidate).collect();
        let picked =
            blocking(move || skippable(Select::new("Choose a location:", labels).raw_prompt()))
                .await?;
        let Some(picked) = picked else {
            coordinator.search_icon_pressed()?;
            continue;
        };

        // Only changes caused by the selection should count as settling.
        drop(view.borrow_and_update());
        coordinator.location_chosen(candidates[picked.index].clone())?;
        println!("{}", render::view(&settled(&mut view).await?));
    }

    coordinator.shutdown().await;
    Ok(())
}

async fn last() -> anyhow::Result<()> {
    let store = FileStore::open_default()?;
    match store.get(LAST_CITY_KEY).await? {
        Some(city) => println!("{city}"),
        None => println!("No city chosen yet."),
    }
    Ok(())
}

/// Treat Esc and Ctrl-C in a prompt as "no answer".
fn skippable<T>(answer: InquireResult<T>) -> InquireResult<Option<T>> {
    match answer {
        Ok(answer) => Ok(Some(answer)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(err) => Err(err),
    }
}

/// Wait for the next published state that is not loading.
async fn settled(view: &mut watch::Receiver<ViewState>) -> anyhow::Result<ViewState> {
    tokio::time::timeout(LOAD_TIMEOUT, next_settled(view))
        .await
        .context("Timed out waiting for the forecast")?
}

async fn next_settled(view: &mut watch::Receiver<ViewState>) -> anyhow::Result<ViewState> {
    loop {
        view.changed().await.context("Coordinator stopped unexpectedly")?;
        let state = view.borrow_and_update().clone();
        tracing::debug!(loading = state.loading, "view changed");
        if !state.loading {
            return Ok(state);
        }
    }
}

/// Run an interactive prompt off the async worker threads.
async fn blocking<T, F>(prompt: F) -> anyhow::Result<T>
where
    F: FnOnce() -> InquireResult<T> + Send + 'static,
    T: Send + 'static,
{
    let result = tokio::task::spawn_blocking(prompt).await.context("Prompt task failed")?;
    Ok(result?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_prompt_is_no_answer() {
        assert_eq!(skippable(Ok(2)).unwrap(), Some(2));
        assert_eq!(skippable::<u8>(Err(InquireError::OperationCanceled)).unwrap(), None);
        assert_eq!(skippable::<u8>(Err(InquireError::OperationInterrupted)).unwrap(), None);
        assert!(skippable::<u8>(Err(InquireError::NotTTY)).is_err());
    }
}
