//! Models and the Invocation Decorator
//!
//! A [`Model`] binds a backend model name to exactly one [`Provider`].
//! Calls go through capability negotiation, then the cache/retry decorator:
//!
//! ```text
//! prompt ─▶ negotiate ─▶ cache hit? ──yes──▶ return cached text
//!                            │ no
//!                            ▼
//!                 ┌── attempt 1..=5 (1 with no_retry) ──┐
//!                 │  cancelled? ─▶ Cancelled            │
//!                 │  provider.prompt (tool loop)        │
//!                 └── ok ─▶ store in cache ─▶ return ───┘
//! ```
//!
//! [`ModelRegistry`] is the read-only name → model table built once at startup.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::cache::{Cache, NoCache, cache_key};
use crate::error::{LlmError, Result};
use crate::message::Message;
use crate::provider::{Mode, Options, Provider, TextStream};

/// Attempts per prompt when retrying is enabled
pub const MAX_ATTEMPTS: usize = 5;

/// A named backend model
#[derive(Clone)]
pub struct Model {
    name: String,
    provider: Arc<dyn Provider>,
    cache: Arc<dyn Cache>,
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name)
            .field("provider", &self.provider.name())
            .finish_non_exhaustive()
    }
}

impl Model {
    /// Create a model without a response cache
    pub fn new(name: impl Into<String>, provider: Arc<dyn Provider>) -> Self {
        Self {
            name: name.into(),
            provider,
            cache: Arc::new(NoCache),
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn provider(&self) -> &dyn Provider {
        self.provider.as_ref()
    }

    /// Send a conversation and return the terminal text reply
    pub async fn prompt(&self, messages: &[Message], options: Options) -> Result<String> {
        let options = options.negotiate(Mode::Prompt, self.provider.as_ref())?;

        let cache_slot = match options.cache_ttl() {
            Some(ttl) => match cache_key(&self.name, messages) {
                Ok(key) => Some((key, ttl)),
                Err(e) => {
                    tracing::warn!(model = %self.name, error = %e, "Could not derive cache key");
                    None
                }
            },
            None => None,
        };

        if let Some((key, _)) = &cache_slot {
            match self.cache.get(key) {
                Ok(Some(hit)) if !hit.is_empty() => {
                    tracing::debug!(model = %self.name, "Cache hit");
                    return Ok(hit);
                }
                Ok(_) => tracing::debug!(model = %self.name, "Cache miss"),
                Err(e) => tracing::debug!(model = %self.name, error = %e, "Cache read failed"),
            }
        }

        let attempts = if options.no_retry { 1 } else { MAX_ATTEMPTS };
        tracing::info!(model = %self.name, provider = self.provider.name(), "Sending prompt");

        let mut last_error = None;
        for attempt in 1..=attempts {
            if options.is_cancelled() {
                return Err(LlmError::Cancelled);
            }

            match self.provider.prompt(&self.name, messages, &options).await {
                Ok(reply) => {
                    if let Some((key, ttl)) = &cache_slot {
                        if let Err(e) = self.cache.set(key, &reply, Some(*ttl)) {
                            tracing::warn!(model = %self.name, error = %e, "Cache write failed");
                        }
                    }
                    return Ok(reply);
                }
                Err(e) if !e.consumes_attempt() => return Err(e),
                Err(e) => {
                    tracing::debug!(model = %self.name, attempt, attempts, error = %e, "Attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| LlmError::Other("no attempt was made".into())))
    }

    /// Prompt with a single user message
    pub async fn prompt_single(&self, message: impl Into<String>, options: Options) -> Result<String> {
        self.prompt(&[Message::user(message)], options).await
    }

    /// Stream the reply as text deltas. Not cached and not retried.
    pub async fn stream(&self, messages: &[Message], options: Options) -> Result<TextStream> {
        let options = options.negotiate(Mode::Stream, self.provider.as_ref())?;

        tracing::info!(model = %self.name, provider = self.provider.name(), "Sending stream prompt");
        self.provider.stream(&self.name, messages, &options).await
    }
}

/// Read-only lookup table of models, built once at startup
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: BTreeMap<String, Model>,
}

impl ModelRegistry {
    pub fn builder() -> ModelRegistryBuilder {
        ModelRegistryBuilder::new()
    }

    pub fn get(&self, name: &str) -> Option<&Model> {
        self.models.get(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.models.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// Builder for [`ModelRegistry`]
pub struct ModelRegistryBuilder {
    entries: Vec<(String, Arc<dyn Provider>)>,
    cache: Arc<dyn Cache>,
}

impl Default for ModelRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelRegistryBuilder {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            cache: Arc::new(NoCache),
        }
    }

    /// Cache shared by every registered model
    pub fn cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn register(mut self, name: impl Into<String>, provider: Arc<dyn Provider>) -> Self {
        self.entries.push((name.into(), provider));
        self
    }

    /// Fails when a name was registered twice
    pub fn build(self) -> Result<ModelRegistry> {
        let mut models = BTreeMap::new();
        for (name, provider) in self.entries {
            if models.contains_key(&name) {
                return Err(LlmError::Config(format!("model {name} registered twice")));
            }
            let model = Model::new(name.clone(), provider).with_cache(Arc::clone(&self.cache));
            models.insert(name, model);
        }
        Ok(ModelRegistry { models })
    }
}
