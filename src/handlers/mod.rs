/// Handler modules, one per intent
pub mod chat;
pub mod search;
pub mod weather;

use crate::transport::{ChatTransport, SearchTransport, WeatherTransport};
use std::sync::Arc;

// One trait per intent, all implemented on `Handlers`
pub use chat::ChatHandler;
pub use search::SearchHandler;
pub use weather::WeatherHandler;

/// Shared state for the three intent handlers
pub struct Handlers {
    pub(crate) weather: Arc<dyn WeatherTransport>,
    pub(crate) search: Arc<dyn SearchTransport>,
    pub(crate) chat: Arc<dyn ChatTransport>,
    pub(crate) model: String,
}

impl Handlers {
    pub fn new(
        weather: Arc<dyn WeatherTransport>,
        search: Arc<dyn SearchTransport>,
        chat: Arc<dyn ChatTransport>,
        model: String,
    ) -> Self {
        Self {
            weather,
            search,
            chat,
            model,
        }
    }
}
