//! Completion Provider Abstraction
//!
//! Defines the CompletionProvider trait wrapping the language-completion
//! service. Every completion call produces an untrusted string; providers
//! parse and repair it at this boundary so only `serde_json::Value` objects
//! flow into the pipeline, never raw model text.

mod openai;

pub use openai::OpenAiProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::constants::network;
use crate::types::{PlannerError, Result};

/// Shared completion provider for concurrent use across handlers
pub type SharedProvider = Arc<dyn CompletionProvider + Send + Sync>;

/// Completion provider trait.
///
/// The schema is advisory for the model; the adapter still validates what
/// comes back.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Run one completion and return the parsed JSON object
    async fn complete(&self, prompt: &str, schema: &Value) -> Result<Value>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model name currently in use
    fn model(&self) -> &str;
}

/// Configuration for completion providers
///
/// API keys are never serialized to output and are redacted in debug output.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider type: "openai" (any Chat Completions compatible endpoint)
    pub provider: String,
    /// Model name (provider-specific)
    pub model: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Temperature for generation (0.0 = deterministic)
    pub temperature: f32,
    /// API key; never serialized to output
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// API base URL (for custom endpoints)
    #[serde(default)]
    pub api_base: Option<String>,
    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

fn default_max_tokens() -> usize {
    1024
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: None,
            timeout_secs: network::COMPLETION_TIMEOUT_SECS,
            temperature: 0.3,
            api_key: None,
            api_base: None,
            max_tokens: 1024,
        }
    }
}

/// Create a shared provider from configuration
pub fn create_provider(config: &ProviderConfig) -> Result<SharedProvider> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiProvider::new(config.clone())?)),
        other => Err(PlannerError::Config(format!(
            "Unknown completion provider: {other}. Supported: openai"
        ))),
    }
}
