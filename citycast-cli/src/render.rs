use std::fmt::Write as _;

use citycast_core::{ForecastSnapshot, LocationCandidate, ViewState};

/// Plain-text rendering of a view snapshot.
pub fn view(state: &ViewState) -> String {
    if state.loading {
        return "Loading forecast...".to_string();
    }

    match &state.weather {
        Some(weather) => forecast(weather),
        None => "No forecast loaded.".to_string(),
    }
}

pub fn forecast(weather: &ForecastSnapshot) -> String {
    let mut out = String::new();
    let current = &weather.current;

    let _ = writeln!(out, "{}, {}", weather.location.name, weather.location.country);
    let _ = writeln!(out, "  {:.0}°C  {}", current.temperature_c, current.condition.trim());
    let _ = write!(out, "  wind {:.0} km/h  humidity {}%", current.wind_kph, current.humidity_pct);
    if let Some(sunrise) = current.sunrise {
        let _ = write!(out, "  sunrise {}", sunrise.format("%H:%M"));
    }
    out.push('\n');

    if !weather.daily.is_empty() {
        let _ = writeln!(out, "\nDaily forecast");
        for day in &weather.daily {
            let _ = writeln!(
                out,
                "  {:<10} {:>5.1}°C  {}",
                day.weekday(),
                day.avg_temperature_c,
                day.condition.trim()
            );
        }
    }

    out
}

pub fn candidates(list: &[LocationCandidate]) -> String {
    if list.is_empty() {
        return "No matching locations.".to_string();
    }

    list.iter().map(candidate).collect::<Vec<_>>().join("\n")
}

pub fn candidate(c: &LocationCandidate) -> String {
    if c.region.is_empty() || c.region == c.name {
        c.label()
    } else {
        format!("{} ({}), {}", c.name, c.region, c.country)
    }
}
