//! HTTP surface and listener: landing page, subscription descriptor, and the
//! WebSocket upgrade at the secret path.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::gate;
use crate::resolver::Resolver;
use crate::subscription;
use axum::extract::{State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

const LANDING_HTML: &str = "<html><body style='text-align:center;padding:50px;font-family:sans-serif;'>\
<h1>Protect Our Earth</h1><p>Node backend is running successfully!</p></body></html>";

/// Shared state threaded through the router. The config is immutable for the
/// process lifetime; the resolver holds one HTTP client for all sessions.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub resolver: Resolver,
    /// How long the gate waits for the header frame. Tests shrink this;
    /// production uses [`gate::FIRST_FRAME_TIMEOUT`].
    pub first_frame_timeout: std::time::Duration,
}

/// Build the router: landing page, subscription path, secret WebSocket path.
/// Any other path falls through to a plain 404, so a probe of the wrong path
/// never sees an upgrade.
pub fn router(state: AppState) -> Router {
    let sub_route = format!("/{}", state.config.sub_path);
    let ws_route = format!("/{}", state.config.ws_path);

    Router::new()
        .route("/", get(landing))
        .route(&sub_route, get(subscription_descriptor))
        .route(&ws_route, get(upgrade))
        .fallback(not_found)
        .with_state(state)
}

/// Bind and serve until the listener fails or the task is cancelled.
pub async fn run(config: ServerConfig) -> ServerResult<()> {
    let state = AppState {
        config: Arc::new(config),
        resolver: Resolver::new(),
        first_frame_timeout: gate::FIRST_FRAME_TIMEOUT,
    };

    let addr = format!("0.0.0.0:{}", state.config.port);
    let listener = TcpListener::bind(&addr).await.map_err(ServerError::Listener)?;

    info!(
        addr = %addr,
        sub_path = %state.config.sub_path,
        "veil-server ready"
    );

    axum::serve(listener, router(state))
        .await
        .map_err(ServerError::Listener)
}

async fn landing() -> Html<&'static str> {
    Html(LANDING_HTML)
}

async fn subscription_descriptor(State(state): State<AppState>) -> String {
    subscription::subscription_body(&state.config)
}

async fn upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| gate::accept(socket, state))
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found\n")
}
