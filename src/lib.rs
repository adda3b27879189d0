pub mod config;
pub mod error;
pub mod graph;
pub mod handlers;
pub mod intent;
pub mod models;
pub mod render;
pub mod router;
pub mod server;
pub mod transport;

use std::sync::Arc;
use tracing::Instrument;

use crate::config::{Config, DispatcherKind};
use crate::error::Result;
use crate::graph::GraphDispatcher;
use crate::handlers::Handlers;
use crate::intent::{IntentParser, KeywordIntent};
use crate::models::Dispatch;
use crate::router::{DirectDispatcher, Dispatcher};
use crate::transport::{OllamaTransport, TavilyTransport, WeatherApiTransport, http_client};

pub struct RouterService {
    name: String,
    dispatcher: Arc<dyn Dispatcher>,
}

impl RouterService {
    /// Wire transports, handlers and the configured dispatcher
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = http_client(cfg.request_timeout())?;

        let handlers = Arc::new(Handlers::new(
            Arc::new(WeatherApiTransport::new(
                client.clone(),
                &cfg.weather.base_url,
                cfg.weather.api_key.clone(),
            )),
            Arc::new(TavilyTransport::new(
                client.clone(),
                &cfg.search.base_url,
                cfg.search.api_key.clone(),
            )),
            Arc::new(OllamaTransport::new(client, &cfg.llm.base_url)),
            cfg.llm.model.clone(),
        ));

        let parser: Arc<dyn IntentParser> = Arc::new(KeywordIntent);
        let dispatcher: Arc<dyn Dispatcher> = match cfg.server.dispatcher {
            DispatcherKind::Graph => Arc::new(GraphDispatcher::standard(parser, handlers)?),
            DispatcherKind::Direct => Arc::new(DirectDispatcher::new(parser, handlers)),
        };
        tracing::info!(
            dispatcher = ?cfg.server.dispatcher,
            model = %cfg.llm.model,
            "Router service initialized"
        );

        Ok(Self::with_dispatcher(&cfg.server.name, dispatcher))
    }

    pub fn with_dispatcher(name: &str, dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            name: name.to_string(),
            dispatcher,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handle one query in its own request span
    pub async fn answer(&self, query: &str) -> Dispatch {
        let span = tracing::info_span!("dispatch", request_id = %uuid::Uuid::new_v4());
        async {
            let dispatch = self.dispatcher.dispatch(query).await;
            tracing::info!(intent = %dispatch.intent, "Query handled");
            dispatch
        }
        .instrument(span)
        .await
    }
}
