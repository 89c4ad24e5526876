// routes.rs
use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use http::{header, HeaderValue, Method};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::handlers;
use crate::session::PollSession;

/// Shared handle to the one canonical session. Every transition runs under the lock.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Mutex<PollSession>>,
}

impl AppState {
    pub fn new(session: PollSession) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
        }
    }
}

pub fn create_routes(state: AppState, cors_allow_origin: Option<&str>) -> Router {
    let api = Router::new()
        .route("/session", get(handlers::get_session))
        .route("/role", post(handlers::select_role))
        .route("/students", post(handlers::join_student))
        .route("/students/{name}", delete(handlers::remove_student))
        .route("/polls", post(handlers::create_poll))
        .route("/polls/end", post(handlers::end_poll))
        .route("/polls/history", get(handlers::get_history))
        .route("/votes", post(handlers::submit_vote))
        .route("/results", get(handlers::get_results))
        .route("/results/show", post(handlers::show_results))
        .route("/results/hide", post(handlers::hide_results))
        .route("/timer", get(handlers::get_timer))
        .route("/timer/pause", post(handlers::pause_timer))
        .route("/timer/resume", post(handlers::resume_timer))
        .route("/timer/tick", post(handlers::tick));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api)
        .layer(cors_layer(cors_allow_origin))
        .with_state(state)
}

fn cors_layer(allow_origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    match allow_origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => layer.allow_origin(origin),
        Some(Err(_)) => {
            warn!(origin = ?allow_origin, "Ignoring invalid CORS origin, allowing any");
            layer.allow_origin(Any)
        }
        None => layer.allow_origin(Any),
    }
}
