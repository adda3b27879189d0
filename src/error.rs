use thiserror::Error;

/// Errors produced by the query router
#[derive(Error, Debug)]
pub enum QueryRouterError {
    #[error("Missing required credential {0}: set it in the environment or .env file")]
    MissingCredential(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{provider} request failed: {message}")]
    Transport {
        provider: &'static str,
        message: String,
    },

    #[error("Invalid dispatch graph: {0}")]
    Graph(String),

    #[error("Template rendering error: {0}")]
    Template(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl QueryRouterError {
    pub fn transport(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Transport {
            provider,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, QueryRouterError>;
