//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Planning policy constants
pub mod planner {
    /// Candidate places requested per itinerary day (policy, not user-controlled)
    pub const PLACES_PER_DAY: usize = 3;

    /// Minimum candidate count regardless of day count
    pub const MIN_CANDIDATES: usize = 5;

    /// Maximum concurrent geocoding requests within one turn
    pub const GEOCODE_PARALLELISM: usize = 4;

    /// Default cap on itinerary days when the caller supplies none
    pub const DEFAULT_MAX_DAYS: u32 = 14;

    /// Note attached to places the geocoder could not resolve
    pub const UNMAPPED_NOTE: &str = "location not found";
}

/// Adapter retry constants
pub mod retry {
    /// Maximum attempts per adapter call (initial attempt included)
    pub const MAX_ATTEMPTS: u8 = 3;

    /// Base delay for exponential backoff (milliseconds)
    pub const BASE_DELAY_MS: u64 = 500;

    /// Maximum delay between retries (seconds)
    pub const MAX_DELAY_SECS: u64 = 15;

    /// Backoff multiplier
    pub const BACKOFF_FACTOR: f32 = 2.0;
}

/// Network constants
pub mod network {
    /// Default timeout for completion requests (seconds)
    pub const COMPLETION_TIMEOUT_SECS: u64 = 15;

    /// Default timeout for geocoding requests (seconds)
    pub const GEOCODE_TIMEOUT_SECS: u64 = 10;
}
