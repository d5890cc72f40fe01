use super::{
    http_client, GeocodedAddress, Geocoder, NearbyKiosk, PlaceDetails, PlaceDirectory,
    ProviderError,
};
use crate::geo::{miles_to_meters, Coordinates};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const PROVIDER: &str = "Google Maps";
const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api";
const KIOSK_SEARCH_KEYWORD: &str = "bitcoin atm";

/// Geocoding and Places client.
pub struct GoogleMapsClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl GoogleMapsClient {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.api_key
            .as_deref()
            .ok_or(ProviderError::MissingApiKey { provider: PROVIDER })
    }
}

#[async_trait]
impl Geocoder for GoogleMapsClient {
    async fn geocode(&self, address: &str) -> Result<GeocodedAddress, ProviderError> {
        let key = self.api_key()?;
        let response: GeocodeResponse = self
            .client
            .get(format!("{}/geocode/json", self.base_url))
            .query(&[("address", address), ("key", key)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        geocode_from_response(response)
    }
}

#[async_trait]
impl PlaceDirectory for GoogleMapsClient {
    async fn place_details(&self, place_id: &str) -> Result<PlaceDetails, ProviderError> {
        let key = self.api_key()?;
        let response: PlaceDetailsResponse = self
            .client
            .get(format!("{}/place/details/json", self.base_url))
            .query(&[
                ("place_id", place_id),
                ("fields", "name,types,opening_hours"),
                ("key", key),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        place_details_from_response(response)
    }

    async fn nearby_kiosks(
        &self,
        center: Coordinates,
        radius_miles: f64,
    ) -> Result<Vec<NearbyKiosk>, ProviderError> {
        let key = self.api_key()?;
        let location = format!("{},{}", center.lat, center.lng);
        let radius = format!("{:.0}", miles_to_meters(radius_miles));
        let response: NearbySearchResponse = self
            .client
            .get(format!("{}/place/nearbysearch/json", self.base_url))
            .query(&[
                ("location", location.as_str()),
                ("radius", radius.as_str()),
                ("keyword", KIOSK_SEARCH_KEYWORD),
                ("key", key),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        nearby_from_response(response)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeCandidate>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeCandidate {
    formatted_address: String,
    geometry: Geometry,
    #[serde(default)]
    address_components: Vec<AddressComponent>,
    place_id: String,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct AddressComponent {
    long_name: String,
    short_name: String,
    #[serde(default)]
    types: Vec<String>,
}

impl AddressComponent {
    fn has_type(&self, kind: &str) -> bool {
        self.types.iter().any(|candidate| candidate == kind)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlaceDetailsResponse {
    status: String,
    #[serde(default)]
    result: Option<PlaceResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaceResult {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    types: Vec<String>,
    #[serde(default)]
    opening_hours: Option<OpeningHoursPayload>,
}

#[derive(Debug, Deserialize)]
struct OpeningHoursPayload {
    #[serde(default)]
    weekday_text: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NearbySearchResponse {
    status: String,
    #[serde(default)]
    results: Vec<NearbyPlace>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NearbyPlace {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    types: Vec<String>,
    #[serde(default)]
    geometry: Option<Geometry>,
}

fn status_error(status: String, message: Option<String>) -> ProviderError {
    if status == "REQUEST_DENIED" {
        ProviderError::InvalidApiKey { provider: PROVIDER }
    } else {
        ProviderError::Status {
            provider: PROVIDER,
            status,
            message,
        }
    }
}

pub(crate) fn geocode_from_response(
    response: GeocodeResponse,
) -> Result<GeocodedAddress, ProviderError> {
    if response.status == "REQUEST_DENIED" {
        return Err(status_error(response.status, response.error_message));
    }

    let candidate = match (response.status.as_str(), response.results.into_iter().next()) {
        ("OK", Some(candidate)) => candidate,
        _ => return Err(ProviderError::AddressNotFound),
    };

    let zip_code = candidate
        .address_components
        .iter()
        .find(|component| component.has_type("postal_code"))
        .map(|component| component.long_name.clone())
        .filter(|zip| !zip.is_empty())
        .ok_or(ProviderError::MissingPostalCode)?;

    let state = candidate
        .address_components
        .iter()
        .find(|component| component.has_type("administrative_area_level_1"))
        .filter(|component| !component.short_name.is_empty())
        .ok_or(ProviderError::MissingState)?;

    Ok(GeocodedAddress {
        formatted_address: candidate.formatted_address,
        location: Coordinates::new(candidate.geometry.location.lat, candidate.geometry.location.lng),
        zip_code,
        place_id: candidate.place_id,
        state_code: state.short_name.clone(),
        state_name: state.long_name.clone(),
    })
}

pub(crate) fn place_details_from_response(
    response: PlaceDetailsResponse,
) -> Result<PlaceDetails, ProviderError> {
    if response.status != "OK" {
        return Err(status_error(response.status, response.error_message));
    }

    let result = response.result.ok_or_else(|| ProviderError::Status {
        provider: PROVIDER,
        status: "OK".to_string(),
        message: Some("place details response had no result".to_string()),
    })?;

    Ok(PlaceDetails {
        name: result
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| PlaceDetails::UNKNOWN_NAME.to_string()),
        types: result.types,
        weekday_text: result.opening_hours.map(|hours| hours.weekday_text),
    })
}

pub(crate) fn nearby_from_response(
    response: NearbySearchResponse,
) -> Result<Vec<NearbyKiosk>, ProviderError> {
    match response.status.as_str() {
        "OK" => {}
        "ZERO_RESULTS" => return Ok(Vec::new()),
        _ => return Err(status_error(response.status, response.error_message)),
    }

    let mut kiosks = Vec::with_capacity(response.results.len());
    for place in response.results {
        let name = place.name.unwrap_or_default();
        match place.geometry {
            Some(geometry) => kiosks.push(NearbyKiosk {
                name,
                types: place.types,
                location: Coordinates::new(geometry.location.lat, geometry.location.lng),
            }),
            None => debug!(%name, "skipping nearby result without coordinates"),
        }
    }

    if kiosks.is_empty() {
        warn!("nearby search returned OK without usable results");
    }

    Ok(kiosks)
}
