// ABOUTME: Redis message history cache using one native list per chat plus a presence marker
// ABOUTME: Conditional appends, removals, and rebuilds run as Lua scripts against a per-chat write generation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat

use super::{
    newest, AppendOutcome, CacheLookup, HistoryKey, MessageCacheProvider, RemoveOutcome,
};
use crate::config::{CacheConfig, RedisConnectionConfig};
use crate::constants::cache::CACHE_KEY_PREFIX;
use crate::errors::{AppError, AppResult};
use crate::models::{ChatId, Message, MessageId};
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, RedisError, Script};
use std::time::Duration;
use tracing::{error, info, warn};

/// Returns 0 when cold, -1 after evicting on an out-of-order append, 1 when appended
const APPEND_SCRIPT: &str = r"
redis.call('INCR', KEYS[3])
redis.call('EXPIRE', KEYS[3], ARGV[4])
if redis.call('EXISTS', KEYS[2]) == 0 then
    return 0
end
local tail = redis.call('LINDEX', KEYS[1], -1)
if tail then
    local ok, decoded = pcall(cjson.decode, tail)
    if (not ok) or tonumber(decoded['id']) >= tonumber(ARGV[2]) then
        redis.call('DEL', KEYS[1], KEYS[2])
        return -1
    end
end
redis.call('RPUSH', KEYS[1], ARGV[1])
redis.call('LTRIM', KEYS[1], -tonumber(ARGV[3]), -1)
redis.call('EXPIRE', KEYS[1], ARGV[4])
redis.call('EXPIRE', KEYS[2], ARGV[4])
return 1
";

/// Returns 1 when installed, 0 when a write moved the generation since it was read
const REPLACE_IF_CURRENT_SCRIPT: &str = r"
local current = redis.call('GET', KEYS[3]) or '0'
if current ~= ARGV[1] then
    return 0
end
redis.call('DEL', KEYS[1])
for i = 3, #ARGV do
    redis.call('RPUSH', KEYS[1], ARGV[i])
end
if #ARGV >= 3 then
    redis.call('EXPIRE', KEYS[1], ARGV[2])
end
redis.call('SET', KEYS[2], 1, 'EX', ARGV[2])
return 1
";

/// Returns 1 when removed, -1 after evicting a full window, 0 when absent
const REMOVE_SCRIPT: &str = r"
redis.call('INCR', KEYS[3])
redis.call('EXPIRE', KEYS[3], ARGV[3])
if redis.call('EXISTS', KEYS[2]) == 0 then
    return 0
end
local entries = redis.call('LRANGE', KEYS[1], 0, -1)
for _, entry in ipairs(entries) do
    local ok, decoded = pcall(cjson.decode, entry)
    if ok and tonumber(decoded['id']) == tonumber(ARGV[1]) then
        if #entries >= tonumber(ARGV[2]) then
            redis.call('DEL', KEYS[1], KEYS[2])
            return -1
        end
        redis.call('LREM', KEYS[1], 1, entry)
        return 1
    end
end
return 0
";

/// Redis message cache with connection pooling
///
/// Uses Redis `ConnectionManager` for automatic reconnection. The history of
/// a chat is a Redis list of JSON-encoded messages under
/// `matchbox:cache:{chat:<id>}:messages`, trimmed with `LTRIM` on every
/// append, next to a `...:warm` marker key. Both keys carry the same TTL.
/// The `...:gen` counter is incremented by every write and refreshed to the
/// same TTL, so it cannot lapse while a rebuild is in flight.
#[derive(Clone)]
pub struct RedisMessageCache {
    manager: ConnectionManager,
    append_script: Script,
    replace_script: Script,
    remove_script: Script,
    history_limit: usize,
    ttl_secs: u64,
}

impl RedisMessageCache {
    /// Create new Redis cache instance
    ///
    /// # Errors
    ///
    /// Returns an error if Redis connection fails
    async fn new_with_config(config: &CacheConfig) -> AppResult<Self> {
        let redis_url = config
            .redis_url
            .as_ref()
            .ok_or_else(|| AppError::config("Redis URL is required for Redis cache backend"))?;

        let conn_config = &config.redis_connection;

        info!(
            "Connecting to Redis at {} (timeout={}s, response_timeout={}s, retries={})",
            redis_url,
            conn_config.connection_timeout_secs,
            conn_config.response_timeout_secs,
            conn_config.initial_connection_retries
        );

        let client = redis::Client::open(redis_url.as_str())
            .map_err(|e| AppError::config(format!("Invalid REDIS_URL: {e}")))?;

        let manager = Self::connect_with_retry(&client, conn_config).await?;

        info!("Successfully connected to Redis");

        Ok(Self {
            manager,
            append_script: Script::new(APPEND_SCRIPT),
            replace_script: Script::new(REPLACE_IF_CURRENT_SCRIPT),
            remove_script: Script::new(REMOVE_SCRIPT),
            history_limit: config.history_limit.max(1),
            ttl_secs: config.history_ttl_secs.max(1),
        })
    }

    /// Connect to Redis with exponential backoff retry on failure
    async fn connect_with_retry(
        client: &redis::Client,
        conn_config: &RedisConnectionConfig,
    ) -> AppResult<ConnectionManager> {
        let manager_config = ConnectionManagerConfig::new()
            .set_connection_timeout(Duration::from_secs(conn_config.connection_timeout_secs))
            .set_response_timeout(Duration::from_secs(conn_config.response_timeout_secs))
            .set_number_of_retries(conn_config.reconnection_retries)
            .set_exponent_base(conn_config.retry_exponent_base)
            .set_max_delay(conn_config.max_retry_delay_ms);

        let max_retries = conn_config.initial_connection_retries;
        let max_delay_ms = conn_config.max_retry_delay_ms;

        let mut last_error = None;
        let mut delay_ms = conn_config.initial_retry_delay_ms;

        for attempt in 0..=max_retries {
            match ConnectionManager::new_with_config(client.clone(), manager_config.clone()).await {
                Ok(manager) => {
                    if attempt > 0 {
                        info!("Redis connection established after {} retries", attempt);
                    }
                    return Ok(manager);
                }
                Err(e) => {
                    if attempt < max_retries {
                        warn!(
                            "Redis connection attempt {}/{} failed, retrying in {}ms: {}",
                            attempt + 1,
                            max_retries + 1,
                            delay_ms,
                            e
                        );
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                        delay_ms = (delay_ms * 2).min(max_delay_ms);
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(AppError::cache(format!(
            "Failed to connect to Redis after {} attempts: {}",
            max_retries + 1,
            last_error.map_or_else(|| "unknown error".to_owned(), |e| e.to_string())
        )))
    }

    fn encode(message: &Message) -> AppResult<String> {
        serde_json::to_string(message)
            .map_err(|e| AppError::serialization(format!("Cache serialization failed: {e}")))
    }

    fn decode(raw: &str) -> AppResult<Message> {
        serde_json::from_str(raw)
            .map_err(|e| AppError::serialization(format!("Cache deserialization failed: {e}")))
    }

    fn ttl_arg(&self) -> i64 {
        i64::try_from(self.ttl_secs).unwrap_or(i64::MAX)
    }
}

/// Log a failed Redis command and convert it
fn redis_error(command: &'static str, e: RedisError) -> AppError {
    error!(command, error = %e, "Redis operation failed");
    AppError::from(e)
}

#[async_trait::async_trait]
impl MessageCacheProvider for RedisMessageCache {
    async fn new(config: CacheConfig) -> AppResult<Self>
    where
        Self: Sized,
    {
        Self::new_with_config(&config).await
    }

    fn history_limit(&self) -> usize {
        self.history_limit
    }

    async fn get(&self, chat_id: ChatId) -> AppResult<CacheLookup> {
        let key = HistoryKey::new(chat_id);
        let mut conn = self.manager.clone();

        let (warm, raw): (bool, Vec<String>) = redis::pipe()
            .atomic()
            .exists(key.marker_key())
            .lrange(key.messages_key(), 0, -1)
            .query_async(&mut conn)
            .await
            .map_err(|e| redis_error("LRANGE", e))?;

        if !warm {
            return Ok(CacheLookup::Miss);
        }
        let messages = raw
            .iter()
            .map(|entry| Self::decode(entry))
            .collect::<AppResult<Vec<_>>>()?;
        Ok(CacheLookup::Hit(messages))
    }

    async fn replace(&self, chat_id: ChatId, messages: &[Message]) -> AppResult<()> {
        let key = HistoryKey::new(chat_id);
        let encoded = newest(messages, self.history_limit)
            .iter()
            .map(Self::encode)
            .collect::<AppResult<Vec<_>>>()?;

        let mut pipe = redis::pipe();
        pipe.atomic().del(key.messages_key()).ignore();
        if !encoded.is_empty() {
            pipe.rpush(key.messages_key(), encoded)
                .ignore()
                .expire(key.messages_key(), self.ttl_arg())
                .ignore();
        }
        pipe.set_ex(key.marker_key(), 1, self.ttl_secs).ignore();

        let mut conn = self.manager.clone();
        let _: () = pipe
            .query_async(&mut conn)
            .await
            .map_err(|e| redis_error("MULTI replace", e))?;
        Ok(())
    }

    async fn generation(&self, chat_id: ChatId) -> AppResult<u64> {
        let key = HistoryKey::new(chat_id);
        let mut conn = self.manager.clone();

        let generation: Option<u64> = conn
            .get(key.generation_key())
            .await
            .map_err(|e| redis_error("GET", e))?;
        Ok(generation.unwrap_or(0))
    }

    async fn replace_if_current(
        &self,
        chat_id: ChatId,
        messages: &[Message],
        generation: u64,
    ) -> AppResult<bool> {
        let key = HistoryKey::new(chat_id);
        let encoded = newest(messages, self.history_limit)
            .iter()
            .map(Self::encode)
            .collect::<AppResult<Vec<_>>>()?;
        let mut conn = self.manager.clone();

        let mut invocation = self.replace_script.prepare_invoke();
        invocation
            .key(key.messages_key())
            .key(key.marker_key())
            .key(key.generation_key())
            .arg(generation)
            .arg(self.ttl_secs);
        for entry in &encoded {
            invocation.arg(entry);
        }

        let installed: i64 = invocation
            .invoke_async(&mut conn)
            .await
            .map_err(|e| redis_error("EVALSHA replace_if_current", e))?;
        Ok(installed == 1)
    }

    async fn append(&self, chat_id: ChatId, message: &Message) -> AppResult<AppendOutcome> {
        let key = HistoryKey::new(chat_id);
        let encoded = Self::encode(message)?;
        let mut conn = self.manager.clone();

        let outcome: i64 = self
            .append_script
            .key(key.messages_key())
            .key(key.marker_key())
            .key(key.generation_key())
            .arg(encoded)
            .arg(message.id.get())
            .arg(self.history_limit)
            .arg(self.ttl_secs)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| redis_error("EVALSHA append", e))?;

        Ok(match outcome {
            1 => AppendOutcome::Appended,
            -1 => AppendOutcome::Invalidated,
            _ => AppendOutcome::Skipped,
        })
    }

    async fn remove_one(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> AppResult<RemoveOutcome> {
        let key = HistoryKey::new(chat_id);
        let mut conn = self.manager.clone();

        let outcome: i64 = self
            .remove_script
            .key(key.messages_key())
            .key(key.marker_key())
            .key(key.generation_key())
            .arg(message_id.get())
            .arg(self.history_limit)
            .arg(self.ttl_secs)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| redis_error("EVALSHA remove_one", e))?;

        Ok(match outcome {
            1 => RemoveOutcome::Removed,
            -1 => RemoveOutcome::Invalidated,
            _ => RemoveOutcome::Absent,
        })
    }

    async fn invalidate(&self, chat_id: ChatId) -> AppResult<()> {
        let key = HistoryKey::new(chat_id);
        let mut conn = self.manager.clone();

        let _: () = redis::pipe()
            .atomic()
            .del(&[key.messages_key(), key.marker_key()])
            .ignore()
            .incr(key.generation_key(), 1)
            .ignore()
            .expire(key.generation_key(), self.ttl_arg())
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(|e| redis_error("MULTI invalidate", e))?;
        Ok(())
    }

    async fn health_check(&self) -> AppResult<()> {
        let mut conn = self.manager.clone();

        let response: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| redis_error("PING", e))?;

        if response == "PONG" {
            Ok(())
        } else {
            Err(AppError::cache(format!(
                "unexpected PING response '{response}'"
            )))
        }
    }

    async fn clear_all(&self) -> AppResult<()> {
        // Clear only keys with our namespace prefix (safe for shared Redis instances)
        let pattern = format!("{CACHE_KEY_PREFIX}*");

        let mut conn = self.manager.clone();
        let mut cursor = 0u64;

        loop {
            let (new_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await
                .map_err(|e| redis_error("SCAN", e))?;

            if !keys.is_empty() {
                let _: u64 = conn
                    .del(&keys)
                    .await
                    .map_err(|e| redis_error("DEL", e))?;
            }

            cursor = new_cursor;
            if cursor == 0 {
                break;
            }
        }

        Ok(())
    }
}
