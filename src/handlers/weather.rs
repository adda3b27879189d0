use async_trait::async_trait;

use crate::error::Result;
use crate::models::{WeatherApiResponse, WeatherOutcome, WeatherReport};

/// Prepositions that introduce a place name in a weather question
const LOCATION_PREPOSITIONS: &[&str] = &[" in ", " at ", " for "];

/// Time words that trail a place name and mean nothing to the provider.
/// Multi-word entries come before their last word.
const TRAILING_TIME_WORDS: &[&str] = &[
    "right now",
    "now",
    "today",
    "tonight",
    "tomorrow",
    "yesterday",
    "later",
    "morning",
    "afternoon",
    "evening",
    "night",
    "weekend",
    "week",
    "noon",
    "midnight",
];

/// Words that qualify a time word ("this weekend", "the evening")
const TIME_QUALIFIERS: &[&str] = &["this", "next", "the"];

#[async_trait]
pub trait WeatherHandler {
    /// Look up current conditions for the place named in the query
    async fn handle_weather(&self, query: &str) -> Result<WeatherOutcome>;
}

#[async_trait]
impl WeatherHandler for super::Handlers {
    async fn handle_weather(&self, query: &str) -> Result<WeatherOutcome> {
        let location = location_term(query);
        tracing::info!("Fetching current weather for location: {}", location);

        let value = self.weather.current(&location).await?;
        let outcome = weather_outcome(value);

        if let WeatherOutcome::Unavailable { reason } = &outcome {
            tracing::warn!("Weather unavailable for '{}': {}", location, reason);
        }
        Ok(outcome)
    }
}

/// Extract the place name from a weather question.
///
/// Each location preposition opens a candidate that runs up to the next one.
/// Candidates are tried from last to first after trimming punctuation and
/// time phrases, so "weather in Paris at 5pm" gives "Paris". Falls back to
/// the whole trimmed query when no candidate has a place left in it.
pub fn location_term(query: &str) -> String {
    let trimmed = query.trim();
    // ASCII lowering keeps byte offsets aligned with `trimmed`
    let lower = trimmed.to_ascii_lowercase();

    let mut bounds: Vec<(usize, usize)> = LOCATION_PREPOSITIONS
        .iter()
        .flat_map(|p| lower.match_indices(*p).map(|(i, m)| (i, i + m.len())))
        .collect();
    bounds.sort_unstable();

    if bounds.is_empty() {
        let term = strip_time_phrases(trimmed);
        if term.is_empty() {
            return trimmed.to_string();
        }
        return term.to_string();
    }

    for (idx, &(_, start)) in bounds.iter().enumerate().rev() {
        let end = bounds
            .get(idx + 1)
            .map_or(trimmed.len(), |&(next, _)| next.max(start));
        let term = strip_time_phrases(&trimmed[start..end]);
        if !term.is_empty() {
            return term.to_string();
        }
    }
    trimmed.to_string()
}

/// Drop trailing punctuation and time phrases until neither is left
fn strip_time_phrases(text: &str) -> &str {
    let mut term = text.trim();
    loop {
        let stripped =
            term.trim_end_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace());
        match strip_time_suffix(stripped) {
            Some(shorter) => term = shorter.trim_end(),
            None => return stripped,
        }
    }
}

/// Remove one trailing time word or clock time, if the text ends in one
fn strip_time_suffix(term: &str) -> Option<&str> {
    let lowered = term.to_ascii_lowercase();

    if let Some(rest) = TRAILING_TIME_WORDS.iter().find_map(|w| {
        lowered
            .strip_suffix(*w)
            .filter(|rest| rest.is_empty() || rest.ends_with(' '))
    }) {
        let rest = rest.trim_end();
        let (head, last) = split_last_word(rest);
        if TIME_QUALIFIERS.contains(&last) {
            return Some(&term[..head]);
        }
        return Some(&term[..rest.len()]);
    }

    let (head, last) = split_last_word(&lowered);
    if last == "am" || last == "pm" {
        // "5 pm": the hour goes with the marker
        let before = lowered[..head].trim_end();
        let (hour_start, hour) = split_last_word(before);
        if is_clock_digits(hour) {
            return Some(&term[..hour_start]);
        }
        return Some(&term[..before.len()]);
    }
    if is_clock_time(last) {
        return Some(&term[..head]);
    }
    None
}

/// Byte offset where the last word starts, and the word itself
fn split_last_word(text: &str) -> (usize, &str) {
    match text.rfind(' ') {
        Some(i) => (i + 1, &text[i + 1..]),
        None => (0, text),
    }
}

fn is_clock_digits(word: &str) -> bool {
    word.starts_with(|c: char| c.is_ascii_digit())
        && word.chars().all(|c| c.is_ascii_digit() || c == ':')
}

/// "5pm", "5:30am", "17:00". A bare number is not a time; it may be a postcode.
fn is_clock_time(word: &str) -> bool {
    if let Some(hour) = word.strip_suffix("am").or_else(|| word.strip_suffix("pm")) {
        return is_clock_digits(hour);
    }
    word.contains(':') && is_clock_digits(word)
}

/// Map a provider response onto a report, or an unavailable marker when the
/// `current` section is missing or malformed. Never fails.
pub fn weather_outcome(value: serde_json::Value) -> WeatherOutcome {
    let response: WeatherApiResponse = match serde_json::from_value(value) {
        Ok(response) => response,
        Err(e) => {
            return WeatherOutcome::Unavailable {
                reason: format!("Unexpected weather response: {e}"),
            };
        }
    };

    match (response.current, response.location) {
        (Some(current), Some(location)) => WeatherOutcome::Report(WeatherReport {
            name: location.name,
            region: location.region,
            country: location.country,
            temp_c: current.temp_c,
            condition: current.condition.text,
            icon: current.condition.icon,
        }),
        (Some(_), None) => WeatherOutcome::Unavailable {
            reason: "Weather response has no location".to_string(),
        },
        (None, _) => WeatherOutcome::Unavailable {
            reason: response
                .error
                .map(|e| e.message)
                .unwrap_or_else(|| "Weather response has no current conditions".to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryRouterError;
    use crate::handlers::test_support::{handlers, idle_mocks};
    use mockall::predicate::eq;
    use serde_json::json;

    fn paris() -> serde_json::Value {
        json!({
            "location": {"name": "Paris", "region": "Ile-de-France", "country": "France"},
            "current": {"temp_c": 18, "condition": {"text": "Clear", "icon": "//x/icon.png"}}
        })
    }

    #[test]
    fn test_location_term_after_preposition() {
        assert_eq!(location_term("What's the weather in Paris?"), "Paris");
        assert_eq!(location_term("Will it rain in New York tomorrow?"), "New York");
        assert_eq!(location_term("temperature for 10001"), "10001");
        assert_eq!(location_term("weather at Lyon right now!"), "Lyon");
    }

    #[test]
    fn test_location_term_uses_last_preposition() {
        assert_eq!(
            location_term("Is it raining in the evening in Oslo"),
            "Oslo"
        );
    }

    #[test]
    fn test_location_term_skips_trailing_time_phrases() {
        assert_eq!(
            location_term("What's the temperature in Paris for today?"),
            "Paris"
        );
        assert_eq!(
            location_term("Will it rain in London this weekend?"),
            "London"
        );
        assert_eq!(
            location_term("Will it rain in Paris in the evening?"),
            "Paris"
        );
        assert_eq!(
            location_term("rain in Madrid tomorrow morning"),
            "Madrid"
        );
    }

    #[test]
    fn test_location_term_skips_clock_times() {
        assert_eq!(location_term("weather in Paris at 5pm"), "Paris");
        assert_eq!(location_term("weather in Berlin at 5 pm"), "Berlin");
        assert_eq!(location_term("temperature in Rome at 17:30?"), "Rome");
        assert_eq!(location_term("weather in Lisbon at 9:15am"), "Lisbon");
    }

    #[test]
    fn test_location_term_keeps_bare_numbers() {
        assert_eq!(location_term("weather for 90210"), "90210");
    }

    #[test]
    fn test_location_term_falls_back_to_query() {
        assert_eq!(location_term("  London weather "), "London weather");
        assert_eq!(location_term("rain"), "rain");
        assert_eq!(location_term("weather in ?"), "weather in ?");
        assert_eq!(location_term(""), "");
    }

    #[test]
    fn test_location_term_keeps_words_ending_in_time_suffix() {
        // "snow" ends in "now" but is not the word "now"
        assert_eq!(location_term("weather in Snow"), "Snow");
    }

    #[test]
    fn test_outcome_report() {
        let outcome = weather_outcome(paris());
        assert_eq!(
            outcome,
            WeatherOutcome::Report(WeatherReport {
                name: "Paris".into(),
                region: "Ile-de-France".into(),
                country: "France".into(),
                temp_c: 18.0,
                condition: "Clear".into(),
                icon: "//x/icon.png".into(),
            })
        );
    }

    #[test]
    fn test_outcome_without_current_is_unavailable() {
        let outcome = weather_outcome(json!({
            "error": {"code": 1006, "message": "No matching location found."}
        }));
        assert_eq!(
            outcome,
            WeatherOutcome::Unavailable {
                reason: "No matching location found.".into()
            }
        );

        assert!(matches!(
            weather_outcome(json!({"location": {"name": "Paris"}})),
            WeatherOutcome::Unavailable { .. }
        ));
    }

    #[test]
    fn test_outcome_malformed_shapes_are_unavailable() {
        for value in [
            json!([]),
            json!("text"),
            json!({"current": {"temp_c": "warm"}}),
            json!({"current": {"temp_c": 3, "condition": {"text": "Fog"}}}),
        ] {
            assert!(matches!(
                weather_outcome(value),
                WeatherOutcome::Unavailable { .. }
            ));
        }
    }

    #[tokio::test]
    async fn test_handle_weather_forwards_location() {
        let (mut weather, search, chat) = idle_mocks();
        weather
            .expect_current()
            .with(eq("Paris"))
            .times(1)
            .returning(|_| Ok(paris()));
        let h = handlers(weather, search, chat);

        let outcome = h.handle_weather("What's the weather in Paris?").await.unwrap();
        match outcome {
            WeatherOutcome::Report(report) => {
                assert_eq!(report.temp_c, 18.0);
                assert_eq!(report.condition, "Clear");
            }
            other => panic!("expected report, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_handle_weather_propagates_transport_error() {
        let (mut weather, search, chat) = idle_mocks();
        weather
            .expect_current()
            .returning(|_| Err(QueryRouterError::transport("weather provider", "timeout")));
        let h = handlers(weather, search, chat);

        assert!(matches!(
            h.handle_weather("weather in Rome").await,
            Err(QueryRouterError::Transport { .. })
        ));
    }
}
