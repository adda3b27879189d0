use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ChatMessage, ChatOptions, ChatRequest};

#[async_trait]
pub trait ChatHandler {
    async fn handle_chat(&self, query: &str) -> Result<String>;
}

#[async_trait]
impl ChatHandler for super::Handlers {
    async fn handle_chat(&self, query: &str) -> Result<String> {
        tracing::info!("Sending query to {}", self.model);

        // Single turn: no system prompt, no history
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: query.to_string(),
            }],
            stream: false,
            options: ChatOptions { temperature: 0.0 },
        };

        let response = self.chat.chat(&request).await?;
        Ok(response.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryRouterError;
    use crate::handlers::test_support::{handlers, idle_mocks};
    use crate::models::ChatResponse;

    #[tokio::test]
    async fn test_handle_chat_is_single_turn_and_deterministic() {
        let (weather, search, mut chat) = idle_mocks();
        chat.expect_chat()
            .withf(|req| {
                req.model == "test-model"
                    && req.options.temperature == 0.0
                    && !req.stream
                    && req.messages.len() == 1
                    && req.messages[0].role == "user"
                    && req.messages[0].content == "How are you?"
            })
            .times(1)
            .returning(|_| {
                Ok(ChatResponse {
                    message: ChatMessage {
                        role: "assistant".to_string(),
                        content: "I'm doing well.".to_string(),
                    },
                })
            });
        let h = handlers(weather, search, chat);

        assert_eq!(h.handle_chat("How are you?").await.unwrap(), "I'm doing well.");
    }

    #[tokio::test]
    async fn test_handle_chat_error() {
        let (weather, search, mut chat) = idle_mocks();
        chat.expect_chat()
            .returning(|_| Err(QueryRouterError::transport("language model", "refused")));
        let h = handlers(weather, search, chat);

        let err = h.handle_chat("hi").await.unwrap_err();
        assert_eq!(err.to_string(), "language model request failed: refused");
    }
}
