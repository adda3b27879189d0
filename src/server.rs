use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::RouterService;
use crate::error::Result;
use crate::models::Dispatch;
use crate::render::Renderer;

const PAGE_TITLE: &str = "AI Agent: Weather, Search & Chat";

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

#[derive(Clone)]
struct AppState {
    service: Arc<RouterService>,
    renderer: Arc<Renderer>,
}

/// Web UI, JSON API and health check
pub fn app(service: Arc<RouterService>) -> Result<Router> {
    let state = AppState {
        service,
        renderer: Arc::new(Renderer::new()?),
    };

    Ok(Router::new()
        .route("/", get(index))
        .route("/api/query", post(api_query))
        .route("/health", get(|| async { "ok" }))
        .with_state(state))
}

async fn index(State(state): State<AppState>, Query(params): Query<PageParams>) -> Response {
    let query = params.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
    let dispatch: Option<Dispatch> = match query {
        Some(q) => Some(state.service.answer(q).await),
        None => None,
    };

    match state.renderer.page(PAGE_TITLE, dispatch.as_ref()) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Failed to render page: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
        }
    }
}

async fn api_query(State(state): State<AppState>, Json(req): Json<QueryRequest>) -> Response {
    let query = req.query.trim();
    if query.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "query must not be empty"})),
        )
            .into_response();
    }

    Json(state.service.answer(query).await).into_response()
}

/// Bind and serve until ctrl-c
pub async fn serve(service: Arc<RouterService>, bind: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(%bind, service = %service.name(), "Starting HTTP server");

    axum::serve(listener, app(service)?)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await?;

    tracing::info!("Server shut down");
    Ok(())
}
