//! Completion Adapter
//!
//! Everything that touches the language-completion service: the provider
//! trait and HTTP implementation, JSON extraction/repair, and the bounded
//! retry policy shared with the geocoding adapter.

pub mod provider;
pub mod retry;
pub mod validation;

pub use provider::{CompletionProvider, OpenAiProvider, ProviderConfig, SharedProvider};
pub use retry::{RetryPolicy, with_retries};
pub use validation::extract_json_from_response;
