//! Key-value backends.
//!
//! [`RedisBackend`] is used in production. [`MemoryBackend`] keeps the same
//! semantics (atomic counter, conditional hash write, TTLs) in process and is
//! used by tests and local runs without Redis.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};

/// Operations the feed store and resolve cache need from a backend.
#[async_trait]
pub trait KvBackend: Send + Sync {
    /// Atomically increment an integer key, creating it at 1.
    async fn incr(&self, key: &str) -> StorageResult<i64>;

    /// Write all `fields` into a new hash and set its expiry.
    ///
    /// Returns `false` without writing if `key` already exists.
    async fn hash_set_new(
        &self,
        key: &str,
        fields: &[(&str, String)],
        ttl: Duration,
    ) -> StorageResult<bool>;

    /// All fields of a hash; empty when the key is missing or expired.
    async fn hash_get_all(&self, key: &str) -> StorageResult<HashMap<String, String>>;

    /// Reset the expiry of an existing key.
    async fn expire(&self, key: &str, ttl: Duration) -> StorageResult<()>;

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> StorageResult<()>;

    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    async fn ping(&self) -> StorageResult<()>;
}

// ============================================================================
// Redis
// ============================================================================

/// Conditional hash write with expiry, executed atomically on the server.
///
/// KEYS[1] = row key, ARGV[1] = ttl in ms, ARGV[2..] = field/value pairs.
const HASH_SET_NEW_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 1 then
  return 0
end
redis.call('HSET', KEYS[1], unpack(ARGV, 2))
redis.call('PEXPIRE', KEYS[1], ARGV[1])
return 1
"#;

/// Redis backend over a multiplexed, auto-reconnecting connection.
#[derive(Clone)]
pub struct RedisBackend {
    conn: ConnectionManager,
    hash_set_new: redis::Script,
}

impl RedisBackend {
    pub async fn connect(redis_url: &str) -> StorageResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_connection_manager().await?;
        info!("Connected to Redis");

        Ok(Self {
            conn,
            hash_set_new: redis::Script::new(HASH_SET_NEW_SCRIPT),
        })
    }
}

fn ttl_millis(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX)
}

#[async_trait]
impl KvBackend for RedisBackend {
    async fn incr(&self, key: &str) -> StorageResult<i64> {
        let mut conn = self.conn.clone();
        let value: i64 = conn.incr(key, 1).await?;
        Ok(value)
    }

    async fn hash_set_new(
        &self,
        key: &str,
        fields: &[(&str, String)],
        ttl: Duration,
    ) -> StorageResult<bool> {
        let mut conn = self.conn.clone();
        let mut invocation = self.hash_set_new.key(key);
        invocation.arg(ttl_millis(ttl));
        for (field, value) in fields {
            invocation.arg(*field).arg(value);
        }

        let written: i64 = invocation.invoke_async(&mut conn).await?;
        Ok(written == 1)
    }

    async fn hash_get_all(&self, key: &str) -> StorageResult<HashMap<String, String>> {
        let mut conn = self.conn.clone();
        let row: HashMap<String, String> = conn.hgetall(key).await?;
        Ok(row)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> StorageResult<()> {
        let mut conn = self.conn.clone();
        conn.pexpire::<_, ()>(key, ttl_millis(ttl)).await?;
        Ok(())
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> StorageResult<()> {
        let mut conn = self.conn.clone();
        let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        conn.pset_ex::<_, _, ()>(key, value, millis).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn ping(&self) -> StorageResult<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

// ============================================================================
// In-memory
// ============================================================================

#[derive(Debug, Clone)]
enum Value {
    Str(String),
    Hash(HashMap<String, String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// In-process backend with lazy expiry.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, Entry>>,
    string_writes: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set_ex` calls served so far.
    pub fn string_writes(&self) -> usize {
        self.string_writes.load(Ordering::SeqCst)
    }

    fn with_entries<T>(&self, f: impl FnOnce(&mut HashMap<String, Entry>, Instant) -> T) -> T {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let now = Instant::now();
        entries.retain(|_, entry| entry.is_live(now));
        f(&mut entries, now)
    }
}

#[async_trait]
impl KvBackend for MemoryBackend {
    async fn incr(&self, key: &str) -> StorageResult<i64> {
        self.with_entries(|entries, _| {
            let entry = entries.entry(key.to_string()).or_insert(Entry {
                value: Value::Str("0".to_string()),
                expires_at: None,
            });

            let current = match &entry.value {
                Value::Str(s) => s
                    .parse::<i64>()
                    .map_err(|_| StorageError::backend(format!("{} is not an integer", key)))?,
                Value::Hash(_) => {
                    return Err(StorageError::backend(format!("{} holds a hash", key)))
                }
            };

            let next = current + 1;
            entry.value = Value::Str(next.to_string());
            Ok(next)
        })
    }

    async fn hash_set_new(
        &self,
        key: &str,
        fields: &[(&str, String)],
        ttl: Duration,
    ) -> StorageResult<bool> {
        self.with_entries(|entries, now| {
            if entries.contains_key(key) {
                return Ok(false);
            }

            let hash = fields
                .iter()
                .map(|(field, value)| (field.to_string(), value.clone()))
                .collect();
            entries.insert(
                key.to_string(),
                Entry {
                    value: Value::Hash(hash),
                    expires_at: Some(now + ttl),
                },
            );
            Ok(true)
        })
    }

    async fn hash_get_all(&self, key: &str) -> StorageResult<HashMap<String, String>> {
        self.with_entries(|entries, _| match entries.get(key) {
            Some(Entry {
                value: Value::Hash(hash),
                ..
            }) => Ok(hash.clone()),
            Some(_) => Err(StorageError::backend(format!("{} is not a hash", key))),
            None => Ok(HashMap::new()),
        })
    }

    async fn expire(&self, key: &str, ttl: Duration) -> StorageResult<()> {
        self.with_entries(|entries, now| {
            if let Some(entry) = entries.get_mut(key) {
                entry.expires_at = Some(now + ttl);
            }
        });
        Ok(())
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> StorageResult<()> {
        self.string_writes.fetch_add(1, Ordering::SeqCst);
        self.with_entries(|entries, now| {
            entries.insert(
                key.to_string(),
                Entry {
                    value: Value::Str(value.to_string()),
                    expires_at: Some(now + ttl),
                },
            );
        });
        debug!(key, "memory backend write");
        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.with_entries(|entries, _| match entries.get(key) {
            Some(Entry {
                value: Value::Str(s),
                ..
            }) => Ok(Some(s.clone())),
            Some(_) => Err(StorageError::backend(format!("{} is not a string", key))),
            None => Ok(None),
        })
    }

    async fn ping(&self) -> StorageResult<()> {
        Ok(())
    }
}
