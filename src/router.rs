use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::handlers::{ChatHandler, Handlers, SearchHandler, WeatherHandler};
use crate::intent::IntentParser;
use crate::models::{AgentResult, Dispatch, Intent, Reply};

/// Runs one request cycle: classify, run exactly one handler, tag the result
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, query: &str) -> Dispatch;
}

/// Single-step keyword router: classify, then call the matching handler
pub struct DirectDispatcher {
    parser: Arc<dyn IntentParser>,
    handlers: Arc<Handlers>,
}

impl DirectDispatcher {
    pub fn new(parser: Arc<dyn IntentParser>, handlers: Arc<Handlers>) -> Self {
        Self { parser, handlers }
    }
}

#[async_trait]
impl Dispatcher for DirectDispatcher {
    async fn dispatch(&self, query: &str) -> Dispatch {
        let intent = self.parser.parse(query);
        tracing::info!(%intent, "Routing query");

        let result = match intent {
            Intent::Weather => self
                .handlers
                .handle_weather(query)
                .await
                .map(AgentResult::Weather),
            Intent::Search => self
                .handlers
                .handle_search(query)
                .await
                .map(AgentResult::Search),
            Intent::Chat => self.handlers.handle_chat(query).await.map(AgentResult::Chat),
        };

        Dispatch {
            query: query.to_string(),
            intent,
            reply: into_reply(intent, result),
        }
    }
}

/// Convert a handler result into a reply, turning provider failures into the
/// `Failed` marker so the caller never sees an error
pub(crate) fn into_reply(intent: Intent, result: Result<AgentResult>) -> Reply {
    match result {
        Ok(result) => {
            debug_assert_eq!(result.intent(), intent);
            Reply::Answered { result }
        }
        Err(e) => {
            tracing::warn!(%intent, "Handler failed: {}", e);
            Reply::Failed {
                message: e.to_string(),
            }
        }
    }
}
