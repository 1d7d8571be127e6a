//! Geocoding Adapter
//!
//! Wraps the place-geocoding service behind a trait returning coordinates or
//! a typed miss. A miss (`Ok(None)`) is a normal outcome, not an error:
//! downstream code keeps unmappable places and annotates them instead of
//! dropping them.

mod mapbox;

pub use mapbox::MapboxGeocoder;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::constants::network;
use crate::types::{Coordinates, Result};

/// Shared geocoder for concurrent use within one turn
pub type SharedGeocoder = Arc<dyn Geocoder + Send + Sync>;

/// A successful geocoding resolution
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeHit {
    pub coordinates: Coordinates,
    /// Canonical address from the geocoder, used to backfill a missing
    /// address on the place
    pub canonical_address: Option<String>,
}

/// Geocoding service trait.
///
/// `locality` is the destination context; queries are resolved against it so
/// "the night market" in Hanoi does not land in another country.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve a free-text place description. `Ok(None)` is a typed miss.
    async fn geocode(&self, query: &str, locality: &str) -> Result<Option<GeocodeHit>>;

    /// Service name for logging
    fn name(&self) -> &str;
}

/// Configuration for the geocoding service
#[derive(Clone, Serialize, Deserialize)]
pub struct GeocoderConfig {
    /// API base URL
    #[serde(default)]
    pub api_base: Option<String>,
    /// Access token; never serialized to output
    #[serde(default, skip_serializing)]
    pub access_token: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl std::fmt::Debug for GeocoderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeocoderConfig")
            .field("api_base", &self.api_base)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            api_base: None,
            access_token: None,
            timeout_secs: network::GEOCODE_TIMEOUT_SECS,
        }
    }
}
