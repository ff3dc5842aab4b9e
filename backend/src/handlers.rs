use axum::extract::{Path, State};
use axum::response::Json;
use merge2048_shared::constants::is_supported_size;
use merge2048_shared::settings::Language;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Error;
use crate::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct BestScoreResponse {
    pub size: usize,
    pub best_score: u32,
}

/// Handler to read the best score recorded for one board size
pub async fn best_score_handler(
    State(state): State<AppState>,
    Path(size): Path<usize>,
) -> Result<Json<BestScoreResponse>, Error> {
    if !is_supported_size(size) {
        return Err(Error::UnsupportedSize(size));
    }
    let best_score = state.store.get_best_score(size).await;
    Ok(Json(BestScoreResponse { size, best_score }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LanguagePayload {
    pub language: String,
}

pub async fn get_language_handler(State(state): State<AppState>) -> Json<LanguagePayload> {
    let language = state.store.get_language().await;
    Json(LanguagePayload {
        language: language.to_string(),
    })
}

pub async fn set_language_handler(
    State(state): State<AppState>,
    Json(payload): Json<LanguagePayload>,
) -> Result<Json<LanguagePayload>, Error> {
    let language: Language = payload.language.parse()?;
    state.store.set_language(language).await;
    info!("Language switched to {}", language);
    Ok(Json(LanguagePayload {
        language: language.to_string(),
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SoundPayload {
    pub enabled: bool,
}

pub async fn get_sound_handler(State(state): State<AppState>) -> Json<SoundPayload> {
    Json(SoundPayload {
        enabled: state.store.get_sound_enabled().await,
    })
}

pub async fn set_sound_handler(
    State(state): State<AppState>,
    Json(payload): Json<SoundPayload>,
) -> Json<SoundPayload> {
    state.store.set_sound_enabled(payload.enabled).await;
    Json(payload)
}
