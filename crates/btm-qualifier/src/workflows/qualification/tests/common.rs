use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::geo::Coordinates;
use crate::integrations::{
    CensusSource, GeocodedAddress, Geocoder, NearbyKiosk, PlaceDetails, PlaceDirectory,
    ProviderError, RulesSource,
};
use crate::settings::InMemorySettingsStore;
use crate::workflows::qualification::density::SQ_METERS_PER_SQ_MILE;
use crate::workflows::qualification::rules::{
    AutoRejectedState, KioskDensityRule, PopulationRule, ProximityRule, RuleBook,
};
use crate::workflows::qualification::{
    qualification_router, LandAreaTable, QualificationProviders, QualificationService,
};

pub(super) const DES_MOINES: Coordinates = Coordinates {
    lat: 41.5868,
    lng: -93.6250,
};

pub(super) fn des_moines_address() -> GeocodedAddress {
    GeocodedAddress {
        formatted_address: "1200 Grand Ave, Des Moines, IA 50309, USA".to_string(),
        location: DES_MOINES,
        zip_code: "50309".to_string(),
        place_id: "place-grand-ave".to_string(),
        state_code: "IA".to_string(),
        state_name: "Iowa".to_string(),
    }
}

pub(super) fn tempe_address() -> GeocodedAddress {
    GeocodedAddress {
        formatted_address: "700 S Mill Ave, Tempe, AZ 85281, USA".to_string(),
        location: Coordinates::new(33.4214, -111.9400),
        zip_code: "85281".to_string(),
        place_id: "place-mill-ave".to_string(),
        state_code: "AZ".to_string(),
        state_name: "Arizona".to_string(),
    }
}

pub(super) fn convenience_store() -> PlaceDetails {
    PlaceDetails {
        name: "Grand Avenue Quick Stop".to_string(),
        types: vec![
            "convenience_store".to_string(),
            "store".to_string(),
            "point_of_interest".to_string(),
        ],
        weekday_text: Some(
            [
                "Monday",
                "Tuesday",
                "Wednesday",
                "Thursday",
                "Friday",
                "Saturday",
                "Sunday",
            ]
            .iter()
            .map(|day| format!("{day}: Open 24 hours"))
            .collect(),
        ),
    }
}

/// Kiosk listing roughly `miles` due north of `origin`.
pub(super) fn kiosk_near(origin: Coordinates, name: &str, miles: f64) -> NearbyKiosk {
    NearbyKiosk {
        name: name.to_string(),
        types: vec!["atm".to_string(), "finance".to_string()],
        location: Coordinates::new(origin.lat + miles / 69.09, origin.lng),
    }
}

pub(super) fn upstream_failure() -> ProviderError {
    ProviderError::Status {
        provider: "Google Maps",
        status: "UNKNOWN_ERROR".to_string(),
        message: None,
    }
}

pub(super) fn missing_key() -> ProviderError {
    ProviderError::MissingApiKey {
        provider: "Google Maps",
    }
}

pub(super) fn invalid_key() -> ProviderError {
    ProviderError::InvalidApiKey {
        provider: "Google Maps",
    }
}

pub(super) fn address_not_found() -> ProviderError {
    ProviderError::AddressNotFound
}

pub(super) fn no_population() -> ProviderError {
    ProviderError::NoData("No population data found for ZIP code 50309".to_string())
}

pub(super) struct FakeGeocoder {
    response: Result<GeocodedAddress, fn() -> ProviderError>,
}

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn geocode(&self, _address: &str) -> Result<GeocodedAddress, ProviderError> {
        self.response.clone().map_err(|failure| failure())
    }
}

pub(super) struct FakePlaces {
    details: Result<PlaceDetails, fn() -> ProviderError>,
    kiosks: Result<Vec<NearbyKiosk>, fn() -> ProviderError>,
    searched_radius: Mutex<Option<f64>>,
}

impl FakePlaces {
    pub(super) fn searched_radius(&self) -> Option<f64> {
        *self.searched_radius.lock().expect("radius mutex")
    }
}

#[async_trait]
impl PlaceDirectory for FakePlaces {
    async fn place_details(&self, _place_id: &str) -> Result<PlaceDetails, ProviderError> {
        self.details.clone().map_err(|failure| failure())
    }

    async fn nearby_kiosks(
        &self,
        _center: Coordinates,
        radius_miles: f64,
    ) -> Result<Vec<NearbyKiosk>, ProviderError> {
        *self.searched_radius.lock().expect("radius mutex") = Some(radius_miles);
        self.kiosks.clone().map_err(|failure| failure())
    }
}

pub(super) struct FakeCensus {
    population: Result<u64, fn() -> ProviderError>,
    land_area_sq_miles: Option<f64>,
}

#[async_trait]
impl CensusSource for FakeCensus {
    async fn zip_population(&self, _zip_code: &str) -> Result<u64, ProviderError> {
        self.population.map_err(|failure| failure())
    }

    async fn zip_land_area_sq_meters(
        &self,
        _zip_code: &str,
    ) -> Result<Option<f64>, ProviderError> {
        Ok(self
            .land_area_sq_miles
            .map(|miles| miles * SQ_METERS_PER_SQ_MILE))
    }
}

/// Rule store whose every lookup fails.
pub(super) struct UnavailableRules;

#[async_trait]
impl RulesSource for UnavailableRules {
    async fn auto_rejected_states(
        &self,
    ) -> Result<HashMap<String, AutoRejectedState>, ProviderError> {
        Err(unavailable_rules())
    }

    async fn proximity_rule(&self, _density: f64) -> Result<Option<ProximityRule>, ProviderError> {
        Err(unavailable_rules())
    }

    async fn kiosk_density_rule(
        &self,
        _density: f64,
    ) -> Result<Option<KioskDensityRule>, ProviderError> {
        Err(unavailable_rules())
    }

    async fn population_rule(
        &self,
        _state_code: &str,
    ) -> Result<Option<PopulationRule>, ProviderError> {
        Err(unavailable_rules())
    }

    async fn ignored_competitors(&self) -> Result<HashSet<String>, ProviderError> {
        Err(unavailable_rules())
    }
}

fn unavailable_rules() -> ProviderError {
    ProviderError::Status {
        provider: "Supabase",
        status: "503".to_string(),
        message: Some("database offline".to_string()),
    }
}

/// Provider answers for one scenario; defaults describe a qualifying site.
pub(super) struct Fixture {
    pub geocoded: Result<GeocodedAddress, fn() -> ProviderError>,
    pub details: Result<PlaceDetails, fn() -> ProviderError>,
    pub kiosks: Result<Vec<NearbyKiosk>, fn() -> ProviderError>,
    pub population: Result<u64, fn() -> ProviderError>,
    pub land_area_sq_miles: Option<f64>,
    pub rules: Arc<dyn RulesSource>,
}

impl Fixture {
    /// 20,000 people over 8 sq mi: 2,500 per sq mi.
    pub(super) fn qualifying() -> Self {
        Self {
            geocoded: Ok(des_moines_address()),
            details: Ok(convenience_store()),
            kiosks: Ok(vec![
                kiosk_near(DES_MOINES, "Bitcoin Depot ATM", 4.0),
                kiosk_near(DES_MOINES, "CoinFlip Bitcoin ATM", 0.6),
            ]),
            population: Ok(20_000),
            land_area_sq_miles: Some(8.0),
            rules: Arc::new(RuleBook::standard()),
        }
    }

    pub(super) fn build(self) -> (QualificationService, Arc<FakePlaces>) {
        let places = Arc::new(FakePlaces {
            details: self.details,
            kiosks: self.kiosks,
            searched_radius: Mutex::new(None),
        });
        let providers = QualificationProviders {
            geocoder: Arc::new(FakeGeocoder {
                response: self.geocoded,
            }),
            places: places.clone(),
            census: Arc::new(FakeCensus {
                population: self.population,
                land_area_sq_miles: self.land_area_sq_miles,
            }),
            rules: self.rules,
        };
        let service = QualificationService::new(providers, Arc::new(LandAreaTable::new()));
        (service, places)
    }

    pub(super) fn service(self) -> QualificationService {
        self.build().0
    }

    pub(super) fn router(self) -> (axum::Router, Arc<InMemorySettingsStore>) {
        let settings = Arc::new(InMemorySettingsStore::default());
        let router = qualification_router(Arc::new(self.service()), settings.clone());
        (router, settings)
    }
}

pub(super) fn rule_book_rejecting(state_code: &str, reason: Option<&str>) -> RuleBook {
    RuleBook {
        auto_rejected_states: vec![AutoRejectedState {
            state_code: state_code.to_string(),
            state_name: None,
            reason: reason.map(str::to_string),
        }],
        ..RuleBook::standard()
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
