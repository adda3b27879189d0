use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::error::{QueryRouterError, Result};

/// Main configuration structure for the query router
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub weather: WeatherConfig,
    pub search: SearchConfig,
    pub llm: LlmConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub name: String,
    pub bind: String,
    pub dispatcher: DispatcherKind,
}

/// Which dispatcher realization serves requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatcherKind {
    #[default]
    Graph,
    Direct,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub api_key: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub api_key: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Ollama server root, e.g. http://localhost:11434
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "query-router".to_string(),
            bind: "127.0.0.1:8501".to_string(),
            dispatcher: DispatcherKind::default(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "http://api.weatherapi.com/v1".to_string(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.tavily.com".to_string(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "gemma3:1b".to_string(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 60,
        }
    }
}

impl Config {
    /// Load configuration from .env, an optional YAML file and environment overrides.
    ///
    /// Fails when the file cannot be parsed or a required credential is missing;
    /// the caller must not serve any query in that case.
    pub fn load() -> Result<Self> {
        let env_paths = [".env", "../.env"];

        let mut env_loaded = false;
        for path in &env_paths {
            if dotenvy::from_path(path).is_ok() {
                tracing::info!("Loaded .env from: {}", path);
                env_loaded = true;
                break;
            }
        }

        if !env_loaded {
            tracing::warn!("No .env file found - continuing with env vars only");
        }

        let config_path =
            env::var("ROUTER_CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());

        let mut config = if Path::new(&config_path).exists() {
            let contents = fs::read_to_string(&config_path).map_err(|e| {
                QueryRouterError::Config(format!("Failed to read {config_path}: {e}"))
            })?;
            let config = Self::from_yaml_str(&contents).map_err(|e| {
                QueryRouterError::Config(format!("Failed to parse {config_path}: {e}"))
            })?;
            tracing::info!("Loaded configuration from {}", config_path);
            config
        } else {
            tracing::info!("Config file not found at {} - using defaults", config_path);
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    pub fn from_yaml_str(contents: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(contents)
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// Apply overrides from a key lookup (the process environment in production)
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // Credentials
        if let Some(key) = lookup("WEATHER_API_KEY") {
            self.weather.api_key = key;
        }
        if let Some(key) = lookup("TAVILY_API_KEY") {
            self.search.api_key = key;
        }

        // Provider endpoints
        if let Some(url) = lookup("WEATHER_BASE_URL") {
            self.weather.base_url = url;
        }
        if let Some(url) = lookup("TAVILY_BASE_URL") {
            self.search.base_url = url;
        }
        if let Some(url) = lookup("OLLAMA_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Some(model) = lookup("OLLAMA_MODEL") {
            self.llm.model = model;
        }

        // Server
        if let Some(bind) = lookup("ROUTER_HTTP_BIND") {
            self.server.bind = bind;
        }
        if let Some(kind) = lookup("ROUTER_DISPATCHER") {
            match kind.to_lowercase().as_str() {
                "graph" => self.server.dispatcher = DispatcherKind::Graph,
                "direct" => self.server.dispatcher = DispatcherKind::Direct,
                other => tracing::warn!(
                    "Unknown ROUTER_DISPATCHER '{}', keeping {:?}",
                    other,
                    self.server.dispatcher
                ),
            }
        }
        if let Some(timeout) = lookup("ROUTER_HTTP_TIMEOUT_SECONDS") {
            match timeout.trim().parse() {
                Ok(secs) => self.http.timeout_seconds = secs,
                Err(e) => tracing::warn!(
                    "Invalid ROUTER_HTTP_TIMEOUT_SECONDS '{}' ({}), keeping {}s",
                    timeout,
                    e,
                    self.http.timeout_seconds
                ),
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.weather.api_key.trim().is_empty() {
            return Err(QueryRouterError::MissingCredential("WEATHER_API_KEY"));
        }
        if self.search.api_key.trim().is_empty() {
            return Err(QueryRouterError::MissingCredential("TAVILY_API_KEY"));
        }
        if self.http.timeout_seconds == 0 {
            return Err(QueryRouterError::Config(
                "http.timeout_seconds cannot be 0".to_string(),
            ));
        }
        self.bind_addr()?;
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server.bind.parse().map_err(|e| {
            QueryRouterError::Config(format!(
                "Invalid bind address '{}' (expected host:port): {e}",
                self.server.bind
            ))
        })
    }

    /// Get the provider request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_seconds)
    }
}
