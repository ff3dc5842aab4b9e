//! Small key/value persistence for best scores and player settings.
//!
//! Every public call swallows storage failures: a broken store is logged and
//! the game carries on with defaults.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use merge2048_shared::constants::{best_score_key, LANGUAGE_KEY, SOUND_ENABLED_KEY};
use merge2048_shared::settings::{parse_sound_flag, Language};
use redis::Client as RedisClient;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::Error;

/// Raises the stored best score only when the new score beats it. Returns
/// the previous and the resulting best; non-numeric stored values count as
/// zero.
const RECORD_BEST_SCRIPT: &str = r#"
local current = tonumber(redis.call('GET', KEYS[1])) or 0
local score = tonumber(ARGV[1])
if score > current then
    redis.call('SET', KEYS[1], ARGV[1])
    return {current, score}
end
return {current, current}
"#;

/// Outcome of one atomic best-score update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BestScoreUpdate {
    pub previous: u32,
    pub best: u32,
}

impl BestScoreUpdate {
    pub fn raised(&self) -> bool {
        self.best > self.previous
    }
}

#[derive(Clone)]
pub enum GameStore {
    Redis {
        client: RedisClient,
        /// Bound on each round trip, connect included.
        timeout: Duration,
    },
    Memory(Arc<Mutex<HashMap<String, String>>>),
}

/// Runs one Redis round trip, giving up once `limit` has elapsed.
async fn bounded<T, F>(limit: Duration, round_trip: F) -> Result<T, Error>
where
    F: Future<Output = redis::RedisResult<T>>,
{
    match tokio::time::timeout(limit, round_trip).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(Error::StorageTimeout(limit)),
    }
}

fn clamp_score(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

impl GameStore {
    pub fn redis(url: &str, timeout: Duration) -> Result<Self, Error> {
        Ok(GameStore::Redis {
            client: RedisClient::open(url)?,
            timeout,
        })
    }

    pub fn memory() -> Self {
        GameStore::Memory(Arc::new(Mutex::new(HashMap::new())))
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            GameStore::Redis { .. } => "redis",
            GameStore::Memory(_) => "memory",
        }
    }

    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        match self {
            GameStore::Redis { client, timeout } => {
                bounded(*timeout, async {
                    let mut conn = client.get_async_connection().await?;
                    let value: Option<String> =
                        redis::cmd("GET").arg(key).query_async(&mut conn).await?;
                    Ok(value)
                })
                .await
            }
            GameStore::Memory(map) => Ok(map.lock().await.get(key).cloned()),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), Error> {
        match self {
            GameStore::Redis { client, timeout } => {
                bounded(*timeout, async {
                    let mut conn = client.get_async_connection().await?;
                    let _: () = redis::cmd("SET").arg(key).arg(value).query_async(&mut conn).await?;
                    Ok(())
                })
                .await
            }
            GameStore::Memory(map) => {
                map.lock().await.insert(key.to_string(), value);
                Ok(())
            }
        }
    }

    async fn try_record_best(&self, key: &str, score: u32) -> Result<BestScoreUpdate, Error> {
        match self {
            GameStore::Redis { client, timeout } => {
                let (previous, best): (i64, i64) = bounded(*timeout, async {
                    let mut conn = client.get_async_connection().await?;
                    let reply: (i64, i64) = redis::cmd("EVAL")
                        .arg(RECORD_BEST_SCRIPT)
                        .arg(1)
                        .arg(key)
                        .arg(score)
                        .query_async(&mut conn)
                        .await?;
                    Ok(reply)
                })
                .await?;
                Ok(BestScoreUpdate {
                    previous: clamp_score(previous),
                    best: clamp_score(best),
                })
            }
            GameStore::Memory(map) => {
                let mut map = map.lock().await;
                let previous = map
                    .get(key)
                    .and_then(|raw| raw.trim().parse::<u32>().ok())
                    .unwrap_or(0);
                if score > previous {
                    map.insert(key.to_string(), score.to_string());
                }
                Ok(BestScoreUpdate {
                    previous,
                    best: previous.max(score),
                })
            }
        }
    }

    /// Best score for a board size; `0` when nothing usable is stored.
    pub async fn get_best_score(&self, size: usize) -> u32 {
        match self.get(&best_score_key(size)).await {
            Ok(Some(raw)) => raw.trim().parse().unwrap_or_else(|_| {
                warn!("Stored best score for size {} is not a number: {:?}", size, raw);
                0
            }),
            Ok(None) => 0,
            Err(e) => {
                warn!("Failed to read best score for size {}: {}", size, e);
                0
            }
        }
    }

    pub async fn set_best_score(&self, size: usize, score: u32) {
        if let Err(e) = self.set(&best_score_key(size), score.to_string()).await {
            warn!("Failed to store best score for size {}: {}", size, e);
        }
    }

    /// Keeps the stored best at least `score` and returns the resulting best.
    /// The compare and the write happen atomically.
    pub async fn record_best_score(&self, size: usize, score: u32) -> u32 {
        match self.try_record_best(&best_score_key(size), score).await {
            Ok(update) => {
                if update.raised() {
                    debug!(
                        "Best score for size {} raised from {} to {}",
                        size, update.previous, update.best
                    );
                }
                update.best
            }
            Err(e) => {
                warn!("Failed to record best score for size {}: {}", size, e);
                score
            }
        }
    }

    /// Stored language, falling back to the default on anything unrecognised.
    pub async fn get_language(&self) -> Language {
        match self.get(LANGUAGE_KEY).await {
            Ok(Some(raw)) => raw.parse().unwrap_or_else(|_| {
                warn!("Ignoring unknown stored language {:?}", raw);
                Language::default()
            }),
            Ok(None) => Language::default(),
            Err(e) => {
                warn!("Failed to read language: {}", e);
                Language::default()
            }
        }
    }

    pub async fn set_language(&self, language: Language) {
        if let Err(e) = self.set(LANGUAGE_KEY, language.as_str().to_string()).await {
            warn!("Failed to store language: {}", e);
        }
    }

    pub async fn get_sound_enabled(&self) -> bool {
        match self.get(SOUND_ENABLED_KEY).await {
            Ok(raw) => parse_sound_flag(raw.as_deref()),
            Err(e) => {
                warn!("Failed to read sound setting: {}", e);
                true
            }
        }
    }

    pub async fn set_sound_enabled(&self, enabled: bool) {
        if let Err(e) = self.set(SOUND_ENABLED_KEY, enabled.to_string()).await {
            warn!("Failed to store sound setting: {}", e);
        }
    }
}
