//! Unified Error Type System
//!
//! Centralized error types for the planning pipeline.
//! Provides error classification for adapter retry decisions.
//!
//! ## Layers
//!
//! - Adapter errors (`LlmError` with `ErrorCategory`): transient failures are
//!   retried locally and never surface past the adapter boundary.
//! - Handler errors (`ExtractionError`, `GenerationError`, `ResolutionError`):
//!   typed results returned to the orchestrator, which maps them to
//!   user-facing text and keeps the last known-good conversation state.
//! - Classification never fails: unrecognized intents degrade to `Unknown`.

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// Error categories for adapter retry decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rate limited - wait then retry
    RateLimit,
    /// Authentication failed - fail fast, don't retry
    Auth,
    /// Network/connectivity issues - retry with backoff
    Network,
    /// Upstream service unavailable - retry, then surface
    Unavailable,
    /// Invalid request - don't retry, fix request
    BadRequest,
    /// Parsing upstream response failed - may retry with stricter prompt
    ParseError,
    /// Temporary server issues - retry
    Transient,
    /// Unknown error - conservative retry
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::Auth => write!(f, "AUTH"),
            Self::Network => write!(f, "NETWORK"),
            Self::Unavailable => write!(f, "UNAVAILABLE"),
            Self::BadRequest => write!(f, "BAD_REQUEST"),
            Self::ParseError => write!(f, "PARSE_ERROR"),
            Self::Transient => write!(f, "TRANSIENT"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl ErrorCategory {
    /// Check if this category is retryable against the same endpoint
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimit | Self::Network | Self::Transient | Self::Unavailable | Self::Unknown
        )
    }

    /// Get recommended retry delay for this category
    pub fn recommended_delay(&self) -> Duration {
        match self {
            Self::RateLimit => Duration::from_secs(10),
            Self::Network => Duration::from_secs(3),
            Self::Transient | Self::Unavailable => Duration::from_secs(2),
            Self::ParseError => Duration::from_secs(1),
            _ => Duration::from_millis(500),
        }
    }
}

// =============================================================================
// Adapter Error
// =============================================================================

/// Adapter-level error with category and retry hints
///
/// Covers both the completion service and the geocoding service; the
/// `service` field records which one produced it.
#[derive(Debug, Clone)]
pub struct LlmError {
    /// Error category for retry decisions
    pub category: ErrorCategory,
    /// Detailed error message
    pub message: String,
    /// Service that produced the error
    pub service: Option<String>,
    /// Suggested wait time before retry (if applicable)
    pub retry_after: Option<Duration>,
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(service) = &self.service {
            write!(f, "[{}:{}] {}", service, self.category, self.message)
        } else {
            write!(f, "[{}] {}", self.category, self.message)
        }
    }
}

impl std::error::Error for LlmError {}

impl LlmError {
    /// Create a new adapter error
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            service: None,
            retry_after: None,
        }
    }

    /// Create error with service context
    pub fn with_service(
        category: ErrorCategory,
        message: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            category,
            message: message.into(),
            service: Some(service.into()),
            retry_after: None,
        }
    }

    /// Add suggested retry delay
    pub fn retry_after(mut self, duration: Duration) -> Self {
        self.retry_after = Some(duration);
        self
    }

    /// Check if error is retryable against the same endpoint
    pub fn is_retryable(&self) -> bool {
        self.category.is_retryable()
    }

    /// Get recommended retry delay
    pub fn recommended_delay(&self) -> Duration {
        self.retry_after
            .unwrap_or_else(|| self.category.recommended_delay())
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Classifies raw upstream failures into retry categories
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify an error message from any upstream service
    pub fn classify(message: &str, service: &str) -> LlmError {
        let lower = message.to_lowercase();

        if lower.contains("rate limit")
            || lower.contains("429")
            || lower.contains("too many requests")
            || lower.contains("quota exceeded")
        {
            return LlmError::with_service(ErrorCategory::RateLimit, message, service)
                .retry_after(Duration::from_secs(10));
        }

        if lower.contains("auth")
            || lower.contains("401")
            || lower.contains("403")
            || lower.contains("api key")
            || lower.contains("access token")
            || lower.contains("unauthorized")
            || lower.contains("forbidden")
        {
            return LlmError::with_service(ErrorCategory::Auth, message, service);
        }

        if lower.contains("network")
            || lower.contains("connection")
            || lower.contains("dns")
            || lower.contains("timeout")
            || lower.contains("timed out")
            || lower.contains("unreachable")
        {
            return LlmError::with_service(ErrorCategory::Network, message, service)
                .retry_after(Duration::from_secs(3));
        }

        if lower.contains("503")
            || lower.contains("502")
            || lower.contains("504")
            || lower.contains("service unavailable")
            || lower.contains("server error")
            || lower.contains("500")
            || lower.contains("overloaded")
        {
            return LlmError::with_service(ErrorCategory::Unavailable, message, service);
        }

        if lower.contains("400") || lower.contains("bad request") || lower.contains("malformed") {
            return LlmError::with_service(ErrorCategory::BadRequest, message, service);
        }

        if lower.contains("parse")
            || lower.contains("json")
            || lower.contains("unexpected token")
        {
            return LlmError::with_service(ErrorCategory::ParseError, message, service)
                .retry_after(Duration::from_secs(1));
        }

        if lower.contains("retry") || lower.contains("temporary") {
            return LlmError::with_service(ErrorCategory::Transient, message, service)
                .retry_after(Duration::from_secs(2));
        }

        LlmError::with_service(ErrorCategory::Unknown, message, service)
    }

    /// Classify HTTP status code directly (more accurate than string matching)
    pub fn classify_http_status(status: u16, message: &str, service: &str) -> LlmError {
        match status {
            429 => LlmError::with_service(ErrorCategory::RateLimit, message, service)
                .retry_after(Duration::from_secs(10)),
            401 | 403 => LlmError::with_service(ErrorCategory::Auth, message, service),
            400 | 404 | 422 => LlmError::with_service(ErrorCategory::BadRequest, message, service),
            500 | 502 | 503 | 504 => {
                LlmError::with_service(ErrorCategory::Transient, message, service)
                    .retry_after(Duration::from_secs(2))
            }
            _ => LlmError::with_service(ErrorCategory::Unknown, message, service),
        }
    }
}

// =============================================================================
// Handler Error Taxonomies
// =============================================================================

/// Failures while extracting structured parameters from a trip request
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// The request names no destination; the handler never guesses one
    #[error("no destination found in trip request")]
    NoDestination,

    /// The completion response could not be coerced into the expected shape,
    /// even after one stricter retry
    #[error("completion response could not be parsed: {0}")]
    UnparseableResponse(String),
}

/// Failures while generating an itinerary
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// The completion service failed entirely; no partial itinerary is kept
    #[error("completion service unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Every geocoding call failed hard (typed misses do not count)
    #[error("geocoding failed for every candidate place")]
    AllCandidatesFailedGeocoding,
}

/// Failures while applying a modification intent
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// The selector resolved to no place; the itinerary is unchanged
    #[error("no place matches '{0}'")]
    NotFound(String),

    /// The requested change is empty or not applicable
    #[error("invalid change: {0}")]
    InvalidChange(String),
}

// =============================================================================
// Umbrella Error
// =============================================================================

#[derive(Debug, Error)]
pub enum PlannerError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Adapter Errors
    // -------------------------------------------------------------------------
    #[error("adapter error: {0}")]
    Llm(#[from] LlmError),

    // -------------------------------------------------------------------------
    // Handler Errors
    // -------------------------------------------------------------------------
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    // -------------------------------------------------------------------------
    // Infrastructure
    // -------------------------------------------------------------------------
    #[error("timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    #[error("config error: {0}")]
    Config(String),
}

impl PlannerError {
    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Map an error to the text surfaced to the user.
    ///
    /// Every turn gets a textual response, so this is total.
    pub fn user_message(&self) -> String {
        match self {
            Self::Extraction(ExtractionError::NoDestination) => {
                "I couldn't find a destination in your request. \
                 Where would you like to go?"
                    .to_string()
            }
            Self::Extraction(ExtractionError::UnparseableResponse(_)) => {
                "I had trouble understanding your trip request. \
                 Could you rephrase it?"
                    .to_string()
            }
            Self::Generation(GenerationError::UpstreamUnavailable(_)) | Self::Llm(_) => {
                "The planning service is unavailable right now. \
                 Please try again in a moment."
                    .to_string()
            }
            Self::Generation(GenerationError::AllCandidatesFailedGeocoding) => {
                "I found places for your trip but couldn't locate any of them \
                 on the map. Please try again."
                    .to_string()
            }
            Self::Resolution(ResolutionError::NotFound(target)) => {
                format!("I couldn't find \"{target}\" in your itinerary.")
            }
            Self::Resolution(ResolutionError::InvalidChange(_)) => {
                "I couldn't work out what to change. Could you be more specific?".to_string()
            }
            Self::Timeout { .. } => {
                "That took too long to process. Please try again.".to_string()
            }
            _ => "Something went wrong while planning. Please try again.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PlannerError>;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::RateLimit.to_string(), "RATE_LIMIT");
        assert_eq!(ErrorCategory::Auth.to_string(), "AUTH");
        assert_eq!(ErrorCategory::ParseError.to_string(), "PARSE_ERROR");
    }

    #[test]
    fn test_error_category_retryable() {
        assert!(ErrorCategory::RateLimit.is_retryable());
        assert!(ErrorCategory::Network.is_retryable());
        assert!(ErrorCategory::Transient.is_retryable());
        assert!(!ErrorCategory::Auth.is_retryable());
        assert!(!ErrorCategory::BadRequest.is_retryable());
        assert!(!ErrorCategory::ParseError.is_retryable());
    }

    #[test]
    fn test_classify_rate_limit() {
        let err = ErrorClassifier::classify("Rate limit exceeded, please retry", "completion");
        assert_eq!(err.category, ErrorCategory::RateLimit);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_classify_auth() {
        let err = ErrorClassifier::classify("Invalid API key provided", "completion");
        assert_eq!(err.category, ErrorCategory::Auth);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_classify_network() {
        let err = ErrorClassifier::classify("Connection timed out after 15s", "geocoder");
        assert_eq!(err.category, ErrorCategory::Network);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_classify_unknown() {
        let err = ErrorClassifier::classify("Something weird happened", "completion");
        assert_eq!(err.category, ErrorCategory::Unknown);
    }

    #[test]
    fn test_classify_http_status() {
        let rate_limit = ErrorClassifier::classify_http_status(429, "Rate limited", "geocoder");
        assert_eq!(rate_limit.category, ErrorCategory::RateLimit);

        let auth = ErrorClassifier::classify_http_status(401, "Unauthorized", "geocoder");
        assert_eq!(auth.category, ErrorCategory::Auth);

        let server = ErrorClassifier::classify_http_status(503, "Unavailable", "completion");
        assert_eq!(server.category, ErrorCategory::Transient);

        let bad = ErrorClassifier::classify_http_status(422, "Unprocessable", "geocoder");
        assert_eq!(bad.category, ErrorCategory::BadRequest);
    }

    #[test]
    fn test_recommended_delay_honors_retry_after() {
        let custom =
            LlmError::new(ErrorCategory::Unknown, "test").retry_after(Duration::from_secs(42));
        assert_eq!(custom.recommended_delay(), Duration::from_secs(42));
    }

    #[test]
    fn test_llm_error_display() {
        let err = LlmError::with_service(ErrorCategory::RateLimit, "Too many requests", "mapbox");
        assert_eq!(err.to_string(), "[mapbox:RATE_LIMIT] Too many requests");
    }

    #[test]
    fn test_user_message_is_total() {
        let errors: Vec<PlannerError> = vec![
            ExtractionError::NoDestination.into(),
            ExtractionError::UnparseableResponse("bad".into()).into(),
            GenerationError::UpstreamUnavailable("down".into()).into(),
            GenerationError::AllCandidatesFailedGeocoding.into(),
            ResolutionError::NotFound("the cafe".into()).into(),
            ResolutionError::InvalidChange("empty".into()).into(),
            PlannerError::Config("bad config".into()),
        ];
        for err in errors {
            assert!(!err.user_message().is_empty());
        }
    }

    #[test]
    fn test_not_found_message_names_target() {
        let err: PlannerError = ResolutionError::NotFound("the museum".into()).into();
        assert!(err.user_message().contains("the museum"));
    }
}
