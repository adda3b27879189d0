use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;

use crate::error::{QueryRouterError, Result};
use crate::models::{
    ChatRequest, ChatResponse, SearchQuery, TavilyRequest, TavilyResponse, WeatherApiResponse,
};

#[cfg(test)]
use mockall::automock;

const WEATHER: &str = "weather provider";
const SEARCH: &str = "search provider";
const LLM: &str = "language model";

/// Current-conditions lookup. Returns the provider's JSON untouched; mapping
/// its shape is the weather handler's job.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WeatherTransport: Send + Sync {
    async fn current(&self, location: &str) -> Result<serde_json::Value>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait SearchTransport: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<TavilyResponse>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse>;
}

/// Build the HTTP client shared by all provider transports
pub fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| QueryRouterError::Config(format!("Failed to build HTTP client: {e}")))
}

fn trim_base(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Turn a non-2xx response into a transport error carrying the body text
async fn status_error(provider: &'static str, response: Response) -> QueryRouterError {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    QueryRouterError::transport(provider, format!("HTTP {status}: {body}"))
}

/// WeatherAPI.com `current.json` client
pub struct WeatherApiTransport {
    client: Client,
    base_url: String,
    api_key: String,
}

impl WeatherApiTransport {
    pub fn new(client: Client, base_url: &str, api_key: String) -> Self {
        Self {
            client,
            base_url: trim_base(base_url),
            api_key,
        }
    }
}

#[async_trait]
impl WeatherTransport for WeatherApiTransport {
    async fn current(&self, location: &str) -> Result<serde_json::Value> {
        let url = format!("{}/current.json", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("key", self.api_key.as_str()), ("q", location)])
            .send()
            .await
            .map_err(|e| QueryRouterError::transport(WEATHER, e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response.json().await.map_err(|e| {
                QueryRouterError::transport(WEATHER, format!("Failed to parse response: {e}"))
            });
        }

        // Bad keys and unknown locations come back as 4xx carrying WeatherAPI's
        // own error object; the handler reports those as unavailable.
        let body = response.text().await.unwrap_or_default();
        let provider_error = status.is_client_error()
            && serde_json::from_str::<WeatherApiResponse>(&body).is_ok_and(|r| r.error.is_some());
        if provider_error {
            tracing::warn!(%status, "Weather provider returned an error body");
            return serde_json::from_str(&body).map_err(QueryRouterError::from);
        }

        Err(QueryRouterError::transport(
            WEATHER,
            format!("HTTP {status}: {body}"),
        ))
    }
}

/// Tavily `/search` client
pub struct TavilyTransport {
    client: Client,
    base_url: String,
    api_key: String,
}

impl TavilyTransport {
    pub fn new(client: Client, base_url: &str, api_key: String) -> Self {
        Self {
            client,
            base_url: trim_base(base_url),
            api_key,
        }
    }
}

#[async_trait]
impl SearchTransport for TavilyTransport {
    async fn search(&self, query: &SearchQuery) -> Result<TavilyResponse> {
        let request = TavilyRequest {
            api_key: &self.api_key,
            query,
        };

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| QueryRouterError::transport(SEARCH, e.to_string()))?;

        if !response.status().is_success() {
            return Err(status_error(SEARCH, response).await);
        }

        response.json().await.map_err(|e| {
            QueryRouterError::transport(SEARCH, format!("Failed to parse response: {e}"))
        })
    }
}

/// Ollama `/api/chat` client
pub struct OllamaTransport {
    client: Client,
    base_url: String,
}

impl OllamaTransport {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: trim_base(base_url),
        }
    }
}

#[async_trait]
impl ChatTransport for OllamaTransport {
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse> {
        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .header("Content-Type", "application/json")
            .json(req)
            .send()
            .await
            .map_err(|e| QueryRouterError::transport(LLM, e.to_string()))?;

        if !response.status().is_success() {
            return Err(status_error(LLM, response).await);
        }

        response.json().await.map_err(|e| {
            QueryRouterError::transport(LLM, format!("Failed to parse response: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChatMessage, ChatOptions};
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> Client {
        http_client(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_weather_sends_key_and_location() {
        let server = MockServer::start().await;
        let body = json!({
            "location": {"name": "Paris", "region": "Ile-de-France", "country": "France"},
            "current": {"temp_c": 18, "condition": {"text": "Clear", "icon": "//x/icon.png"}}
        });
        Mock::given(method("GET"))
            .and(path("/v1/current.json"))
            .and(query_param("key", "wkey"))
            .and(query_param("q", "Paris"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .expect(1)
            .mount(&server)
            .await;

        let tx = WeatherApiTransport::new(client(), &format!("{}/v1/", server.uri()), "wkey".into());
        let value = tx.current("Paris").await.unwrap();
        assert_eq!(value, body);
    }

    #[tokio::test]
    async fn test_weather_error_body_is_returned_not_raised() {
        let server = MockServer::start().await;
        let body = json!({"error": {"code": 1006, "message": "No matching location found."}});
        Mock::given(method("GET"))
            .and(path("/current.json"))
            .respond_with(ResponseTemplate::new(400).set_body_json(&body))
            .mount(&server)
            .await;

        let tx = WeatherApiTransport::new(client(), &server.uri(), "wkey".into());
        assert_eq!(tx.current("Atlantis").await.unwrap(), body);
    }

    #[tokio::test]
    async fn test_weather_server_error_is_transport_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let tx = WeatherApiTransport::new(client(), &server.uri(), "wkey".into());
        let err = tx.current("Paris").await.unwrap_err();
        match err {
            QueryRouterError::Transport { provider, message } => {
                assert_eq!(provider, WEATHER);
                assert!(message.contains("502"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_weather_unavailable_with_json_body_is_transport_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(503).set_body_json(json!({"message": "upstream down"})),
            )
            .mount(&server)
            .await;

        let tx = WeatherApiTransport::new(client(), &server.uri(), "wkey".into());
        let err = tx.current("Paris").await.unwrap_err();
        match err {
            QueryRouterError::Transport { provider, message } => {
                assert_eq!(provider, WEATHER);
                assert!(message.contains("503"));
                assert!(message.contains("upstream down"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_weather_client_error_without_error_object_is_transport_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "no route"})))
            .mount(&server)
            .await;

        let tx = WeatherApiTransport::new(client(), &server.uri(), "wkey".into());
        assert!(matches!(
            tx.current("Paris").await,
            Err(QueryRouterError::Transport { provider: WEATHER, .. })
        ));
    }

    #[tokio::test]
    async fn test_tavily_request_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(body_json(json!({
                "api_key": "tkey",
                "query": "Tell me about the Eiffel Tower",
                "max_results": 2,
                "search_depth": "advanced",
                "max_tokens": 1000
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query": "Tell me about the Eiffel Tower",
                "results": [
                    {"title": "A", "url": "https://a", "content": "first", "score": 0.4},
                    {"title": "B", "url": "https://b", "content": "second", "score": 0.9}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tx = TavilyTransport::new(client(), &server.uri(), "tkey".into());
        let response = tx
            .search(&SearchQuery::new("Tell me about the Eiffel Tower"))
            .await
            .unwrap();
        let contents: Vec<_> = response.results.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(contents, ["first", "second"]);
    }

    #[tokio::test]
    async fn test_tavily_unauthorized_is_transport_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let tx = TavilyTransport::new(client(), &server.uri(), "bad".into());
        let err = tx.search(&SearchQuery::new("search x")).await.unwrap_err();
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_ollama_chat_request_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_json(json!({
                "model": "gemma3:1b",
                "messages": [{"role": "user", "content": "How are you?"}],
                "stream": false,
                "options": {"temperature": 0.0}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "gemma3:1b",
                "message": {"role": "assistant", "content": "Fine, thanks."},
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tx = OllamaTransport::new(client(), &server.uri());
        let req = ChatRequest {
            model: "gemma3:1b".into(),
            messages: vec![ChatMessage {
                role: "user".into(),
                content: "How are you?".into(),
            }],
            stream: false,
            options: ChatOptions { temperature: 0.0 },
        };
        let response = tx.chat(&req).await.unwrap();
        assert_eq!(response.message.content, "Fine, thanks.");
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_transport_failure() {
        // Port 9 (discard) is not listening in test environments
        let tx = OllamaTransport::new(client(), "http://127.0.0.1:9");
        let req = ChatRequest {
            model: "m".into(),
            messages: vec![],
            stream: false,
            options: ChatOptions { temperature: 0.0 },
        };
        assert!(matches!(
            tx.chat(&req).await,
            Err(QueryRouterError::Transport { provider: LLM, .. })
        ));
    }
}
