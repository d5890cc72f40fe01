//! Adapters for the third-party services the qualifier depends on.
//!
//! Each external system sits behind a small async trait so the qualification
//! workflow can be exercised with in-memory fakes.

pub mod census;
pub mod google_maps;
pub mod supabase;

pub use census::CensusClient;
pub use google_maps::GoogleMapsClient;
pub use supabase::SupabaseRules;

use crate::geo::Coordinates;
use crate::workflows::qualification::rules::{
    AutoRejectedState, KioskDensityRule, PopulationRule, ProximityRule,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// Geocoded view of a street address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodedAddress {
    pub formatted_address: String,
    pub location: Coordinates,
    pub zip_code: String,
    pub place_id: String,
    pub state_code: String,
    pub state_name: String,
}

/// Business metadata attached to a geocoded place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceDetails {
    pub name: String,
    pub types: Vec<String>,
    pub weekday_text: Option<Vec<String>>,
}

impl PlaceDetails {
    pub const UNKNOWN_NAME: &'static str = "Unknown Business";

    /// Stand-in used when place details cannot be fetched.
    pub fn placeholder() -> Self {
        Self {
            name: Self::UNKNOWN_NAME.to_string(),
            types: Vec::new(),
            weekday_text: None,
        }
    }
}

/// A kiosk listing returned by a nearby search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyKiosk {
    pub name: String,
    pub types: Vec<String>,
    pub location: Coordinates,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{provider} API key is not configured")]
    MissingApiKey { provider: &'static str },
    #[error("{provider} API key is invalid or restricted. Please check your API key configuration.")]
    InvalidApiKey { provider: &'static str },
    #[error("Address not found. Please enter a valid address.")]
    AddressNotFound,
    #[error("Could not determine ZIP code from address. Please include a ZIP code in your search.")]
    MissingPostalCode,
    #[error("Could not determine state from address.")]
    MissingState,
    #[error("invalid ZIP code '{0}'")]
    InvalidZip(String),
    #[error("{0}")]
    NoData(String),
    #[error("{provider} returned status {status}{}", status_detail(.message))]
    Status {
        provider: &'static str,
        status: String,
        message: Option<String>,
    },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("failed to read rule data: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

fn status_detail(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|message| format!(": {message}"))
        .unwrap_or_default()
}

impl ProviderError {
    /// True when the failure is caused by the caller's address rather than
    /// the upstream service.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            ProviderError::AddressNotFound
                | ProviderError::MissingPostalCode
                | ProviderError::MissingState
                | ProviderError::InvalidZip(_)
                | ProviderError::InvalidApiKey { .. }
                | ProviderError::NoData(_)
        )
    }
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<GeocodedAddress, ProviderError>;
}

#[async_trait]
pub trait PlaceDirectory: Send + Sync {
    async fn place_details(&self, place_id: &str) -> Result<PlaceDetails, ProviderError>;

    async fn nearby_kiosks(
        &self,
        center: Coordinates,
        radius_miles: f64,
    ) -> Result<Vec<NearbyKiosk>, ProviderError>;
}

#[async_trait]
pub trait CensusSource: Send + Sync {
    async fn zip_population(&self, zip_code: &str) -> Result<u64, ProviderError>;

    /// Land area in square metres, `None` when the boundary service has no
    /// record for the ZIP.
    async fn zip_land_area_sq_meters(&self, zip_code: &str)
        -> Result<Option<f64>, ProviderError>;
}

/// Read access to the qualification rule tables.
#[async_trait]
pub trait RulesSource: Send + Sync {
    async fn auto_rejected_states(
        &self,
    ) -> Result<HashMap<String, AutoRejectedState>, ProviderError>;

    async fn proximity_rule(&self, density: f64) -> Result<Option<ProximityRule>, ProviderError>;

    async fn kiosk_density_rule(
        &self,
        density: f64,
    ) -> Result<Option<KioskDensityRule>, ProviderError>;

    async fn population_rule(
        &self,
        state_code: &str,
    ) -> Result<Option<PopulationRule>, ProviderError>;

    async fn ignored_competitors(&self) -> Result<HashSet<String>, ProviderError>;
}

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("btm-qualifier/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(ProviderError::from)
}

pub(crate) fn validate_zip(zip_code: &str) -> Result<&str, ProviderError> {
    let trimmed = zip_code.trim();
    if trimmed.len() == 5 && trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
        Ok(trimmed)
    } else {
        Err(ProviderError::InvalidZip(zip_code.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zip_validation_accepts_five_digits_only() {
        assert_eq!(validate_zip(" 50309 ").expect("valid zip"), "50309");
        for raw in ["5030", "503091", "50a09", "50309' OR '1'='1"] {
            assert!(matches!(
                validate_zip(raw),
                Err(ProviderError::InvalidZip(_))
            ));
        }
    }

    #[test]
    fn status_errors_include_provider_message() {
        let err = ProviderError::Status {
            provider: "Google Maps",
            status: "OVER_QUERY_LIMIT".to_string(),
            message: Some("quota exceeded".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Google Maps returned status OVER_QUERY_LIMIT: quota exceeded"
        );

        let bare = ProviderError::Status {
            provider: "Census",
            status: "500".to_string(),
            message: None,
        };
        assert_eq!(bare.to_string(), "Census returned status 500");
    }

    #[test]
    fn placeholder_business_has_no_signals() {
        let placeholder = PlaceDetails::placeholder();
        assert_eq!(placeholder.name, "Unknown Business");
        assert!(placeholder.types.is_empty());
        assert!(placeholder.weekday_text.is_none());
    }
}
