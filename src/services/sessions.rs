//! Session-scoped state
//!
//! The visit counter of the home page lives here, keyed by session id. Two
//! stores are available: an in-process map and Redis.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use redis::{AsyncCommands, Client};
use tokio::sync::Mutex;

use crate::error::{AppError, AppResult};

/// Session key holding the number of home page visits
pub const NUM_VISITS: &str = "num_visits";

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Increment `key` in `session_id` and return the new value; a missing
    /// key counts as 0
    async fn increment(&self, session_id: &str, key: &str) -> AppResult<i64>;
}

/// Lifetime of a session after its last visit, unless configured
pub const DEFAULT_SESSION_TTL_SECONDS: i64 = 1_209_600;

#[derive(Debug)]
struct MemorySession {
    counters: HashMap<String, i64>,
    last_seen: DateTime<Utc>,
}

#[derive(Debug)]
struct MemorySessions {
    sessions: HashMap<String, MemorySession>,
    last_sweep: DateTime<Utc>,
}

/// In-process session store. Sessions idle for longer than the TTL are
/// dropped: the one being accessed on the spot, the others on a periodic
/// sweep.
#[derive(Debug)]
pub struct MemorySessionStore {
    ttl: Duration,
    state: Mutex<MemorySessions>,
}

impl MemorySessionStore {
    pub fn new(ttl_seconds: i64) -> Self {
        Self {
            ttl: Duration::try_seconds(ttl_seconds.max(0)).unwrap_or(Duration::MAX),
            state: Mutex::new(MemorySessions {
                sessions: HashMap::new(),
                last_sweep: Utc::now(),
            }),
        }
    }

    fn is_expired(&self, last_seen: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(last_seen) >= self.ttl
    }

    /// Count of live sessions
    pub async fn session_count(&self) -> usize {
        self.state.lock().await.sessions.len()
    }

    async fn increment_at(&self, session_id: &str, key: &str, now: DateTime<Utc>) -> i64 {
        let mut state = self.state.lock().await;

        if now.signed_duration_since(state.last_sweep) >= self.ttl.min(Duration::seconds(SWEEP_INTERVAL_SECONDS)) {
            let before = state.sessions.len();
            state.sessions.retain(|_, s| !self.is_expired(s.last_seen, now));
            state.last_sweep = now;
            let dropped = before - state.sessions.len();
            if dropped > 0 {
                tracing::debug!("Dropped {} expired sessions", dropped);
            }
        }

        let session = state
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| MemorySession {
                counters: HashMap::new(),
                last_seen: now,
            });
        if self.is_expired(session.last_seen, now) {
            session.counters.clear();
        }
        session.last_seen = now;

        let value = session.counters.entry(key.to_string()).or_insert(0);
        *value += 1;
        *value
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL_SECONDS)
    }
}

/// Upper bound between two sweeps of expired sessions
const SWEEP_INTERVAL_SECONDS: i64 = 60;

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn increment(&self, session_id: &str, key: &str) -> AppResult<i64> {
        Ok(self.increment_at(session_id, key, Utc::now()).await)
    }
}

#[derive(Clone)]
pub struct RedisSessionStore {
    client: Client,
    ttl_seconds: i64,
}

impl RedisSessionStore {
    /// Create a Redis session store
    pub async fn new(url: &str, ttl_seconds: i64) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Session(format!("Failed to create Redis client: {}", e)))?;

        // Test connection
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Session(format!("Failed to connect to Redis: {}", e)))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Session(format!("Redis connection test failed: {}", e)))?;

        Ok(Self { client, ttl_seconds })
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn increment(&self, session_id: &str, key: &str) -> AppResult<i64> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Session(format!("Failed to get Redis connection: {}", e)))?;

        let redis_key = format!("session:{}:{}", session_id, key);
        let value: i64 = conn
            .incr(&redis_key, 1)
            .await
            .map_err(|e| AppError::Session(format!("Failed to increment {}: {}", redis_key, e)))?;
        redis::cmd("EXPIRE")
            .arg(&redis_key)
            .arg(self.ttl_seconds)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| AppError::Session(format!("Failed to set expiry on {}: {}", redis_key, e)))?;

        Ok(value)
    }
}

#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn SessionStore>,
}

impl SessionService {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Count a visit of `session_id` and return its running total
    pub async fn visit_counter(&self, session_id: &str) -> AppResult<i64> {
        self.store.increment(session_id, NUM_VISITS).await
    }
}
