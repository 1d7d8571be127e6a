//! Mapbox Geocoding Provider
//!
//! Forward geocoding against the `mapbox.places` endpoint. The query is
//! built as "name, locality" so results stay anchored to the trip
//! destination; the first feature wins (`limit=1`).

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::{GeocodeHit, Geocoder, GeocoderConfig};
use crate::types::{Coordinates, ErrorClassifier, PlannerError, Result};

const DEFAULT_API_BASE: &str = "https://api.mapbox.com/geocoding/v5/mapbox.places";

/// Mapbox forward geocoder with secure token handling
pub struct MapboxGeocoder {
    access_token: SecretString,
    api_base: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for MapboxGeocoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapboxGeocoder")
            .field("access_token", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl MapboxGeocoder {
    pub fn new(config: GeocoderConfig) -> Result<Self> {
        let token = config
            .access_token
            .or_else(|| std::env::var("MAPBOX_ACCESS_TOKEN").ok())
            .ok_or_else(|| {
                PlannerError::Config(
                    "Mapbox access token not found. Set MAPBOX_ACCESS_TOKEN env var or provide \
                     in config"
                        .to_string(),
                )
            })?;

        let api_base = config
            .api_base
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PlannerError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            access_token: SecretString::from(token),
            api_base,
            client,
        })
    }

    fn build_url(&self, query: &str, locality: &str) -> Result<Url> {
        let full_query = if locality.is_empty() {
            query.to_string()
        } else {
            format!("{query}, {locality}")
        };

        // Url handles percent-encoding of the path segment
        let mut url = Url::parse(&format!("{}/{}.json", self.api_base, full_query))
            .map_err(|e| PlannerError::Config(format!("invalid geocoding URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("access_token", self.access_token.expose_secret())
            .append_pair("limit", "1");
        Ok(url)
    }
}

#[async_trait]
impl Geocoder for MapboxGeocoder {
    async fn geocode(&self, query: &str, locality: &str) -> Result<Option<GeocodeHit>> {
        let url = self.build_url(query, locality)?;
        debug!(query, locality, "Geocoding place");

        let response = self.client.get(url).send().await.map_err(|e| {
            PlannerError::Llm(ErrorClassifier::classify(
                &format!("geocoding request failed: {e}"),
                "mapbox",
            ))
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(PlannerError::Llm(ErrorClassifier::classify_http_status(
                status,
                &format!("geocoding API error: {body}"),
                "mapbox",
            )));
        }

        let body: GeocodeResponse = response.json().await.map_err(|e| {
            PlannerError::Llm(ErrorClassifier::classify(
                &format!("failed to decode geocoding response: {e}"),
                "mapbox",
            ))
        })?;

        match body.features.into_iter().next() {
            Some(feature) if feature.center.len() == 2 => {
                // Mapbox centers are [lon, lat]
                let hit = GeocodeHit {
                    coordinates: Coordinates {
                        lat: feature.center[1],
                        lon: feature.center[0],
                    },
                    canonical_address: feature.place_name,
                };
                debug!(query, lat = hit.coordinates.lat, lon = hit.coordinates.lon, "Geocode hit");
                Ok(Some(hit))
            }
            _ => {
                warn!(query, locality, "Geocode miss");
                Ok(None)
            }
        }
    }

    fn name(&self) -> &str {
        "mapbox"
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    features: Vec<GeocodeFeature>,
}

#[derive(Debug, Deserialize)]
struct GeocodeFeature {
    #[serde(default)]
    center: Vec<f64>,
    #[serde(default)]
    place_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geocoder() -> MapboxGeocoder {
        MapboxGeocoder::new(GeocoderConfig {
            access_token: Some("pk.test".into()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_build_url_includes_locality_and_token() {
        let url = geocoder().build_url("La Boqueria", "Barcelona").unwrap();
        let s = url.as_str();
        assert!(s.contains("La%20Boqueria,%20Barcelona.json") || s.contains("La%20Boqueria%2C%20Barcelona.json"));
        assert!(s.contains("access_token=pk.test"));
        assert!(s.contains("limit=1"));
    }

    #[test]
    fn test_build_url_without_locality() {
        let url = geocoder().build_url("Eiffel Tower", "").unwrap();
        assert!(url.path().contains("Eiffel%20Tower.json"));
    }

    #[test]
    fn test_center_order_is_lon_lat() {
        let body: GeocodeResponse = serde_json::from_str(
            r#"{"features": [{"center": [2.17, 41.38], "place_name": "La Boqueria, Barcelona"}]}"#,
        )
        .unwrap();
        let feature = &body.features[0];
        assert_eq!(feature.center[0], 2.17);
        assert_eq!(feature.center[1], 41.38);
    }

    #[test]
    fn test_empty_features_decodes() {
        let body: GeocodeResponse = serde_json::from_str(r#"{"features": []}"#).unwrap();
        assert!(body.features.is_empty());
    }

    #[test]
    fn test_debug_redacts_token() {
        let debug = format!("{:?}", geocoder());
        assert!(!debug.contains("pk.test"));
    }
}
