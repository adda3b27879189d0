use enumset::EnumSetType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classified purpose of a user query
#[derive(Debug, Hash, Serialize, Deserialize, EnumSetType)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Weather,
    Search,
    Chat,
}

impl Intent {
    pub fn label(&self) -> &'static str {
        match self {
            Intent::Weather => "weather",
            Intent::Search => "search",
            Intent::Chat => "chat",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Current conditions for a resolved location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub name: String,
    pub region: String,
    pub country: String,
    /// Degrees Celsius
    pub temp_c: f64,
    pub condition: String,
    /// Protocol-relative icon reference as returned by the provider
    pub icon: String,
}

impl WeatherReport {
    /// Absolute icon URL; the provider hands out `//host/path` references
    pub fn icon_url(&self) -> String {
        if self.icon.starts_with("//") {
            format!("http:{}", self.icon)
        } else {
            self.icon.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WeatherOutcome {
    Report(WeatherReport),
    /// The provider answered without a `current` section
    Unavailable { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSnippet {
    pub url: String,
    pub content: String,
}

/// Handler output, tagged by the intent that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum AgentResult {
    Weather(WeatherOutcome),
    Search(Vec<SearchSnippet>),
    Chat(String),
}

impl AgentResult {
    pub fn intent(&self) -> Intent {
        match self {
            AgentResult::Weather(_) => Intent::Weather,
            AgentResult::Search(_) => Intent::Search,
            AgentResult::Chat(_) => Intent::Chat,
        }
    }
}

/// Either a handler result or the marker for a failed provider call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Reply {
    Answered { result: AgentResult },
    Failed { message: String },
}

/// Outcome of one request cycle, handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dispatch {
    pub query: String,
    pub intent: Intent,
    pub reply: Reply,
}

// WeatherAPI current.json response format
#[derive(Debug, Deserialize)]
pub struct WeatherApiResponse {
    pub location: Option<WeatherLocation>,
    pub current: Option<CurrentWeather>,
    pub error: Option<ProviderError>,
}

#[derive(Debug, Deserialize)]
pub struct WeatherLocation {
    pub name: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub country: String,
}

#[derive(Debug, Deserialize)]
pub struct CurrentWeather {
    pub temp_c: f64,
    pub condition: WeatherCondition,
}

#[derive(Debug, Deserialize)]
pub struct WeatherCondition {
    pub text: String,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Deserialize)]
pub struct ProviderError {
    pub code: Option<i64>,
    pub message: String,
}

/// Result cap sent with every search
pub const SEARCH_MAX_RESULTS: u32 = 2;
pub const SEARCH_DEPTH: &str = "advanced";
pub const SEARCH_MAX_TOKENS: u32 = 1000;

/// Search parameters; the transport adds the credential
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SearchQuery {
    pub query: String,
    pub max_results: u32,
    pub search_depth: String,
    pub max_tokens: u32,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            max_results: SEARCH_MAX_RESULTS,
            search_depth: SEARCH_DEPTH.to_string(),
            max_tokens: SEARCH_MAX_TOKENS,
        }
    }
}

// Tavily search request format
#[derive(Debug, Serialize)]
pub struct TavilyRequest<'a> {
    pub api_key: &'a str,
    #[serde(flatten)]
    pub query: &'a SearchQuery,
}

// Tavily search response format
#[derive(Debug, Deserialize)]
pub struct TavilyResponse {
    #[serde(default)]
    pub results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
pub struct TavilyResult {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub content: String,
}

impl From<TavilyResult> for SearchSnippet {
    fn from(r: TavilyResult) -> Self {
        Self {
            url: r.url,
            content: r.content,
        }
    }
}

// Ollama chat message format
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

// Ollama /api/chat request format
#[derive(Debug, Serialize, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    pub options: ChatOptions,
}

#[derive(Debug, Serialize, Clone)]
pub struct ChatOptions {
    pub temperature: f32,
}

// Ollama /api/chat response format (non-streaming)
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub message: ChatMessage,
}
