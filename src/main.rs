//! Director Backend
//!
//! A REST API, SSE and WebSocket server for the multi-agent director system.
//! Routes user requests through the master orchestrator and exposes the
//! supporting records (conversations, tasks, contacts, content, compliance).

use axum::{
    extract::Request,
    middleware::Next,
    response::Response,
    routing::{get, post, put},
    Json, Router,
};
use director_backend::config::Config;
use director_backend::state::AppState;
use director_backend::store::Store;
use director_backend::{api, gateway, websocket};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    message: String,
}

/// Request ID middleware - adds unique ID to each request for tracing
async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    let response = next.run(request).instrument(span).await;

    let duration = start.elapsed();
    info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %response.status().as_u16(),
        duration_ms = duration.as_millis(),
        "Request completed"
    );

    response
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load configuration
    let config = Config::from_env();
    info!("Configuration loaded: {:?}", config);

    let store = Arc::new(
        Store::new(&config.persistence.database_url)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to open database: {}", e))?,
    );
    let (llm, images) = gateway::from_config(&config.llm);

    // Initialize application state
    let app_state = AppState::new(
        store,
        llm,
        images,
        config.orchestrator_config(),
        config.orchestration.activity_capacity,
    );

    // Build our application with routes
    let app = Router::new()
        .route("/api/health", get(health_check))
        // Orchestration
        .route("/api/director/messages", post(api::director::send_message))
        .route("/api/director/stream", post(api::director::stream_message))
        .route("/api/activity", get(api::director::get_activity))
        // Conversations and tasks
        .route(
            "/api/conversations",
            get(api::conversations::list_conversations)
                .post(api::conversations::create_conversation),
        )
        .route(
            "/api/conversations/:id",
            get(api::conversations::get_conversation)
                .delete(api::conversations::delete_conversation),
        )
        .route(
            "/api/conversations/:id/title",
            put(api::conversations::update_conversation_title),
        )
        .route("/api/tasks", get(api::conversations::list_tasks))
        .route("/api/tasks/:id", get(api::conversations::get_task))
        // Roles
        .route("/api/roles", get(api::roles::list_roles))
        .route("/api/roles/match", post(api::roles::match_agents))
        .route("/api/roles/:name/execute", post(api::roles::execute_role))
        .route("/api/design/image", post(api::roles::generate_design_image))
        // CRM and content
        .route(
            "/api/contacts",
            get(api::crm::list_contacts).post(api::crm::create_contact),
        )
        .route(
            "/api/contacts/:id",
            put(api::crm::update_contact).delete(api::crm::delete_contact),
        )
        .route(
            "/api/content-calendar",
            get(api::crm::list_content).post(api::crm::create_content),
        )
        // Compliance
        .route(
            "/api/compliance/levels/:level",
            get(api::compliance::get_checklist),
        )
        .route(
            "/api/compliance/:user_id",
            get(api::compliance::get_profile).put(api::compliance::update_profile),
        )
        .route("/api/audit", get(api::compliance::list_audit))
        // Power-ups
        .route(
            "/api/powerups",
            get(api::powerups::list_powerups).post(api::powerups::create_powerup),
        )
        .route(
            "/api/powerups/:id/execute",
            post(api::powerups::execute_powerup),
        )
        // Settings
        .route(
            "/api/config",
            get(api::settings::get_config).post(api::settings::update_config),
        )
        // WebSocket for real-time updates
        .route("/ws", get(websocket::websocket_handler))
        // Middleware (order matters - request_id should be first)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(CorsLayer::permissive()) // Allow CORS for development
        .with_state(app_state);

    // Bind to address from config
    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid server address: {}", e))?;

    info!("🚀 Server running on http://{}", addr);
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    // Setup graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Handle graceful shutdown signals (Ctrl+C, SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        message: "Director backend is healthy".to_string(),
    })
}
