use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Json, Query, State};
use axum::routing::{get, post};
use axum::Router;
use merge2048_shared::audio::{dispatch, CueRecorder, SoundEvent};
use merge2048_shared::constants::{is_supported_size, DEFAULT_BOARD_SIZE};
use merge2048_shared::{Direction, Game2048, PublicGame2048};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::Error;
use crate::services::store_service::GameStore;

pub struct Game2048Session {
    pub game: Game2048,
    rng: StdRng,
    /// Last time the session was created, moved or reset.
    pub touched_at: Instant,
    pub last_move_at: Option<Instant>,
}

impl Game2048Session {
    fn is_expired(&self, now: Instant, expiry: std::time::Duration) -> bool {
        now.duration_since(self.touched_at) >= expiry
    }
}

#[derive(Clone)]
pub struct Game2048State {
    pub sessions: Arc<Mutex<HashMap<String, Game2048Session>>>,
    pub store: GameStore,
    pub config: Arc<Config>,
}

impl Game2048State {
    pub fn new(store: GameStore, config: Arc<Config>) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            store,
            config,
        }
    }

    fn session_rng(&self) -> StdRng {
        match self.config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Drops every idle session and returns how many went.
    pub async fn sweep_expired(&self) -> usize {
        let expiry = self.config.session_expiry;
        let now = Instant::now();
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(now, expiry));
        before - sessions.len()
    }
}

fn default_size() -> usize {
    DEFAULT_BOARD_SIZE
}

#[derive(Debug, Deserialize)]
pub struct NewGameRequest {
    #[serde(default = "default_size")]
    pub size: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NewGame2048Response {
    pub session_id: String,
    pub game: PublicGame2048,
    pub best_score: u32,
}

async fn new_game(
    State(state): State<Arc<Game2048State>>,
    Json(request): Json<NewGameRequest>,
) -> Result<Json<NewGame2048Response>, Error> {
    if !is_supported_size(request.size) {
        return Err(Error::UnsupportedSize(request.size));
    }

    let best_score = state.store.get_best_score(request.size).await;
    let mut rng = state.session_rng();
    let game = Game2048::new(request.size, &mut rng)?;
    let public = game.to_public();
    let session_id = Uuid::new_v4().to_string();
    let now = Instant::now();

    let mut sessions = state.sessions.lock().await;
    if sessions.len() >= state.config.max_sessions {
        let expiry = state.config.session_expiry;
        sessions.retain(|_, session| !session.is_expired(now, expiry));
        if sessions.len() >= state.config.max_sessions {
            warn!("Refusing new game, {} sessions active", sessions.len());
            return Err(Error::TooManySessions);
        }
    }
    sessions.insert(
        session_id.clone(),
        Game2048Session {
            game,
            rng,
            touched_at: now,
            last_move_at: None,
        },
    );
    drop(sessions);

    info!("New {}x{} game {}", request.size, request.size, session_id);
    Ok(Json(NewGame2048Response {
        session_id,
        game: public,
        best_score,
    }))
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub session_id: String,
    pub direction: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MoveResponse {
    pub moved: bool,
    pub game: PublicGame2048,
    pub score_gained: u32,
    pub merged_values: Vec<u32>,
    pub just_won: bool,
    pub best_score: u32,
    /// Cues the client should play, empty when sound is switched off.
    pub sounds: Vec<SoundEvent>,
}

async fn process_move(
    State(state): State<Arc<Game2048State>>,
    Json(payload): Json<MoveRequest>,
) -> Result<Json<MoveResponse>, Error> {
    let direction: Direction = payload.direction.parse()?;

    let (outcome, public) = {
        let mut sessions = state.sessions.lock().await;
        let now = Instant::now();
        let session = sessions
            .get_mut(&payload.session_id)
            .ok_or(Error::SessionNotFound)?;

        if session.is_expired(now, state.config.session_expiry) {
            sessions.remove(&payload.session_id);
            return Err(Error::SessionExpired);
        }
        if let Some(last) = session.last_move_at {
            if now.duration_since(last) < state.config.move_cooldown {
                return Err(Error::MoveTooSoon);
            }
        }
        session.last_move_at = Some(now);
        session.touched_at = now;

        let outcome = session.game.make_move(direction, &mut session.rng);
        (outcome, session.game.to_public())
    };

    let best_score = if outcome.moved && public.score > 0 {
        state.store.record_best_score(public.size, public.score).await
    } else {
        state.store.get_best_score(public.size).await
    };

    if outcome.just_won {
        info!("Game {} reached the winning tile with {} points", payload.session_id, public.score);
    }
    if outcome.moved && outcome.game_over {
        info!("Game {} is over at {} points", payload.session_id, public.score);
    }

    let mut cues = CueRecorder::new(state.store.get_sound_enabled().await);
    dispatch(&mut cues, &outcome);

    Ok(Json(MoveResponse {
        moved: outcome.moved,
        game: public,
        score_gained: outcome.score_gained,
        merged_values: outcome.merged_values,
        just_won: outcome.just_won,
        best_score,
        sounds: cues.take(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GameResponse {
    pub game: PublicGame2048,
    pub best_score: u32,
}

async fn reset_game(
    State(state): State<Arc<Game2048State>>,
    Json(payload): Json<SessionRequest>,
) -> Result<Json<GameResponse>, Error> {
    let public = {
        let mut sessions = state.sessions.lock().await;
        let now = Instant::now();
        let session = sessions
            .get_mut(&payload.session_id)
            .ok_or(Error::SessionNotFound)?;
        if session.is_expired(now, state.config.session_expiry) {
            sessions.remove(&payload.session_id);
            return Err(Error::SessionExpired);
        }

        session.game.reset(&mut session.rng);
        session.touched_at = now;
        session.last_move_at = None;
        session.game.to_public()
    };

    let best_score = state.store.get_best_score(public.size).await;
    Ok(Json(GameResponse {
        game: public,
        best_score,
    }))
}

async fn refresh(
    State(state): State<Arc<Game2048State>>,
    Query(query): Query<SessionRequest>,
) -> Result<Json<GameResponse>, Error> {
    let public = {
        let mut sessions = state.sessions.lock().await;
        let session = sessions.get(&query.session_id).ok_or(Error::SessionNotFound)?;
        if session.is_expired(Instant::now(), state.config.session_expiry) {
            sessions.remove(&query.session_id);
            return Err(Error::SessionExpired);
        }
        session.game.to_public()
    };

    let best_score = state.store.get_best_score(public.size).await;
    Ok(Json(GameResponse {
        game: public,
        best_score,
    }))
}

pub fn create_router() -> Router<Arc<Game2048State>> {
    Router::new()
        .route("/new", post(new_game))
        .route("/move", post(process_move))
        .route("/reset", post(reset_game))
        .route("/state", get(refresh))
}
