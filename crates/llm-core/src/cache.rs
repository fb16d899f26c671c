//! Response Cache
//!
//! The cache backend is an external collaborator: anything that can get and
//! set strings by key with a lifetime. Implementations must be safe for
//! concurrent use, the decorator adds no locking of its own.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};

use crate::error::{LlmError, Result};
use crate::message::Message;

/// Cache duration callers can opt into when they have no better value
pub const DEFAULT_CACHE_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

/// Key-value store for memoized responses
pub trait Cache: Send + Sync {
    /// `Ok(None)` when the key is not set
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value; a `None` lifetime keeps it forever
    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;
}

/// Cache that never stores anything
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCache;

impl Cache for NoCache {
    fn get(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &str, _ttl: Option<Duration>) -> Result<()> {
        Ok(())
    }
}

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

/// In-memory cache (for development/testing)
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|e| LlmError::Cache(e.to_string()))?;
        Ok(entries
            .get(key)
            .filter(|entry| entry.expires_at.is_none_or(|at| Instant::now() < at))
            .map(|entry| entry.value.clone()))
    }

    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| LlmError::Cache(e.to_string()))?;
        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at.is_none_or(|at| now < at));
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: ttl.map(|ttl| now + ttl),
            },
        );
        Ok(())
    }
}

/// Deterministic key over the model name and the serialized conversation.
///
/// Options other than the conversation do not take part, so two calls that
/// differ only in e.g. `max_tokens` share an entry.
pub fn cache_key(model: &str, messages: &[Message]) -> Result<String> {
    let serialized = serde_json::to_vec(messages)?;
    let digest = Sha256::digest(&serialized);
    Ok(format!("{model}:{}", hex::encode(digest)))
}
