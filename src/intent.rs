use crate::models::Intent;

/// Keywords that route a query to the weather provider. Checked first.
const WEATHER_KEYWORDS: &[&str] = &["weather", "rain", "temperature"];

/// Keywords that route a query to web search.
const SEARCH_KEYWORDS: &[&str] = &["search", "tell me about"];

pub trait IntentParser: Send + Sync {
    fn parse(&self, query: &str) -> Intent;
}

/// Case-insensitive substring classifier over fixed keyword tables
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordIntent;

impl IntentParser for KeywordIntent {
    fn parse(&self, query: &str) -> Intent {
        classify(query)
    }
}

/// Classify a query. Total: anything without a weather or search keyword is chat.
///
/// Weather keywords win over search keywords, so "search the weather" is a
/// weather query.
pub fn classify(query: &str) -> Intent {
    let lower = query.to_lowercase();

    let intent = if WEATHER_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Intent::Weather
    } else if SEARCH_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Intent::Search
    } else {
        Intent::Chat
    };

    tracing::debug!(%intent, "Classified query");
    intent
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weather_keywords() {
        assert_eq!(classify("What's the weather in Paris?"), Intent::Weather);
        assert_eq!(classify("Will it RAIN tomorrow"), Intent::Weather);
        assert_eq!(classify("temperature in Oslo"), Intent::Weather);
        // substring match, not word match
        assert_eq!(classify("Is Ukraine big?"), Intent::Weather);
    }

    #[test]
    fn test_search_keywords() {
        assert_eq!(classify("Tell me about the Eiffel Tower"), Intent::Search);
        assert_eq!(classify("search rust async runtimes"), Intent::Search);
        assert_eq!(classify("please SEARCH for crates"), Intent::Search);
    }

    #[test]
    fn test_weather_wins_over_search() {
        assert_eq!(classify("search the weather"), Intent::Weather);
        assert_eq!(
            classify("tell me about the temperature on Mars"),
            Intent::Weather
        );
    }

    #[test]
    fn test_chat_fallback() {
        assert_eq!(classify("How are you?"), Intent::Chat);
        assert_eq!(classify(""), Intent::Chat);
        assert_eq!(classify("   "), Intent::Chat);
        assert_eq!(classify("tell me a joke"), Intent::Chat);
    }

    #[test]
    fn test_keyword_parser_matches_classify() {
        let parser = KeywordIntent;
        for q in ["weather?", "tell me about cats", "hello", ""] {
            assert_eq!(parser.parse(q), classify(q));
        }
    }
}
