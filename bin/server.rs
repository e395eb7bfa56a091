// Client Roster - Web Server
// JSON API over the client directory with Axum

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use client_roster::{list_loaded, AppConfig, ClientDirectory, FeedError, MemorySessionStore};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;

/// Shared application state
#[derive(Clone)]
struct AppState {
    directory: Arc<ClientDirectory>,
    /// Listing state for this server process's session
    session: Arc<Mutex<MemorySessionStore>>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

#[derive(Deserialize)]
struct ListQuery {
    search: Option<String>,
    page: Option<i64>,
}

/// Feed failures: the upstream spreadsheet is the bad gateway
fn feed_failure(context: &str, err: FeedError) -> Response {
    log::error!("{}: {}", context, err);
    (
        StatusCode::BAD_GATEWAY,
        Json(ApiResponse::<()>::err(err.to_string())),
    )
        .into_response()
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/clients?search=&page= - One page of the roster
async fn list_clients(State(state): State<AppState>, Query(query): Query<ListQuery>) -> Response {
    let clients = match state.directory.load_clients().await {
        Ok(clients) => clients,
        Err(e) => return feed_failure("Error loading clients", e),
    };

    let page = {
        let mut session = match state.session.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        list_loaded(clients, &mut *session, query.search.as_deref(), query.page)
    };

    (StatusCode::OK, Json(ApiResponse::ok(page))).into_response()
}

/// GET /api/clients/:id - Client with accounts and agency
async fn get_client(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.directory.get_client_detail(&id).await {
        Ok(Some(detail)) => (StatusCode::OK, Json(ApiResponse::ok(detail))).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<()>::err(format!("Client {} not found", id))),
        )
            .into_response(),
        Err(e) => feed_failure(&format!("Error loading client {}", id), e),
    }
}

/// GET /api/stats - Client and account counts
async fn get_stats(State(state): State<AppState>) -> Response {
    match state.directory.summary().await {
        Ok(summary) => (StatusCode::OK, Json(ApiResponse::ok(summary))).into_response(),
        Err(e) => feed_failure("Error getting stats", e),
    }
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = AppConfig::from_env()?;
    let directory = ClientDirectory::from_config(&config)?;
    log::info!("Clients feed: {}", config.clients_url);

    let state = AppState {
        directory: Arc::new(directory),
        session: Arc::new(Mutex::new(MemorySessionStore::new())),
    };

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/clients", get(list_clients))
        .route("/clients/:id", get(get_client))
        .route("/stats", get(get_stats))
        .with_state(state);

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    log::info!("Server running on http://{}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
