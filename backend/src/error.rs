use std::fmt;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use merge2048_shared::GameError;
use serde_json::json;

#[derive(Debug)]
pub enum Error {
    Game(GameError),
    Storage(redis::RedisError),
    StorageTimeout(Duration),
    UnsupportedSize(usize),
    SessionNotFound,
    SessionExpired,
    MoveTooSoon,
    TooManySessions,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Game(e) => write!(f, "{}", e),
            Error::Storage(e) => write!(f, "storage error: {}", e),
            Error::StorageTimeout(limit) => {
                write!(f, "storage did not answer within {}ms", limit.as_millis())
            }
            Error::UnsupportedSize(size) => write!(f, "board size {} is not offered", size),
            Error::SessionNotFound => write!(f, "game session not found"),
            Error::SessionExpired => write!(f, "game session has expired"),
            Error::MoveTooSoon => write!(f, "moves are coming in too fast"),
            Error::TooManySessions => write!(f, "too many active game sessions"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Game(e) => Some(e),
            Error::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GameError> for Error {
    fn from(err: GameError) -> Self {
        Error::Game(err)
    }
}

impl From<redis::RedisError> for Error {
    fn from(err: redis::RedisError) -> Self {
        Error::Storage(err)
    }
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Game(_) | Error::UnsupportedSize(_) => StatusCode::BAD_REQUEST,
            Error::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::StorageTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Error::SessionNotFound => StatusCode::NOT_FOUND,
            Error::SessionExpired => StatusCode::GONE,
            Error::MoveTooSoon => StatusCode::TOO_MANY_REQUESTS,
            Error::TooManySessions => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Error::Storage(e) => {
                tracing::error!("Storage failure: {}", e);
                "Storage error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
