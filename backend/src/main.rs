use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::Config;
use crate::games::backend_2048_game::{create_router as create_2048_game_router, Game2048State};
use crate::handlers::{
    best_score_handler, get_language_handler, get_sound_handler, set_language_handler,
    set_sound_handler,
};
use crate::services::store_service::GameStore;

mod config;
mod error;
mod games;
mod handlers;
mod logging;
mod services;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct AppState {
    store: GameStore,
}

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

fn build_app(state: AppState, game_state: Arc<Game2048State>) -> Router {
    let settings_routes = Router::new()
        .route("/language", get(get_language_handler).put(set_language_handler))
        .route("/sound", get(get_sound_handler).put(set_sound_handler));

    Router::new()
        .route("/api/health_check", get(health_check))
        .route("/api/best/:size", get(best_score_handler))
        .nest("/api/settings", settings_routes)
        .with_state(state)
        .nest("/api/2048", create_2048_game_router().with_state(game_state))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::from_path(".env").ok();
    logging::setup();

    let config = Arc::new(Config::from_env());
    let store = match &config.redis_url {
        Some(url) => GameStore::redis(url, config.store_timeout)?,
        None => {
            warn!("REDIS_URL not set, best scores and settings live in memory only");
            GameStore::memory()
        }
    };
    info!("Using {} store", store.backend_name());

    let game_state = Arc::new(Game2048State::new(store.clone(), config.clone()));

    // Idle sessions are also dropped lazily, this keeps abandoned ones from piling up
    let sweeper = game_state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = sweeper.sweep_expired().await;
            if removed > 0 {
                info!("Swept {} expired game sessions", removed);
            }
        }
    });

    let app = build_app(AppState { store }, game_state);

    let listener = TcpListener::bind(config.bind_addr).await?;
    info!("Listening on {}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
