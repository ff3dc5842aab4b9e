use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

const DEFAULT_SESSION_EXPIRY_SECONDS: u64 = 1800;
const DEFAULT_MOVE_COOLDOWN_MS: u64 = 100;
const DEFAULT_MAX_SESSIONS: usize = 10_000;
const DEFAULT_STORE_TIMEOUT_MS: u64 = 500;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// `None` keeps best scores and settings in process memory.
    pub redis_url: Option<String>,
    /// Upper bound on one store round trip before falling back to defaults.
    pub store_timeout: Duration,
    pub session_expiry: Duration,
    /// Minimum gap between two moves on the same session.
    pub move_cooldown: Duration,
    pub max_sessions: usize,
    /// Seeds every session's RNG, for reproducible runs.
    pub rng_seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            redis_url: None,
            store_timeout: Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
            session_expiry: Duration::from_secs(DEFAULT_SESSION_EXPIRY_SECONDS),
            move_cooldown: Duration::from_millis(DEFAULT_MOVE_COOLDOWN_MS),
            max_sessions: DEFAULT_MAX_SESSIONS,
            rng_seed: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let redis_url = lookup("REDIS_URL")
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        Self {
            bind_addr: parse_or(&lookup, "BIND_ADDR", Self::default().bind_addr),
            redis_url,
            store_timeout: Duration::from_millis(parse_or(
                &lookup,
                "STORE_TIMEOUT_MS",
                DEFAULT_STORE_TIMEOUT_MS,
            )),
            session_expiry: Duration::from_secs(parse_or(
                &lookup,
                "SESSION_EXPIRY_SECONDS",
                DEFAULT_SESSION_EXPIRY_SECONDS,
            )),
            move_cooldown: Duration::from_millis(parse_or(
                &lookup,
                "MOVE_COOLDOWN_MS",
                DEFAULT_MOVE_COOLDOWN_MS,
            )),
            max_sessions: parse_or(&lookup, "MAX_SESSIONS", DEFAULT_MAX_SESSIONS),
            rng_seed: lookup("RNG_SEED").and_then(|raw| match raw.trim().parse() {
                Ok(seed) => Some(seed),
                Err(_) => {
                    warn!("Ignoring invalid RNG_SEED={:?}", raw);
                    None
                }
            }),
        }
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid {}={:?}, using default", key, raw);
            default
        }),
        None => default,
    }
}
