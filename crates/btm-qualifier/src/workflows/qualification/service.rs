use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, instrument, warn};

use super::business::evaluate_business;
use super::density::{DensityResolver, LandAreaTable};
use super::domain::QualificationResult;
use super::hours::parse_store_hours;
use super::policy::{
    density_threshold, evaluate_density, evaluate_state, summarize, CheckResults,
};
use super::proximity::{evaluate_proximity, ProximityInputs, COMPETITOR_RADIUS_MILES};
use crate::integrations::{
    CensusSource, Geocoder, PlaceDetails, PlaceDirectory, ProviderError, RulesSource,
};
use crate::settings::{Settings, SettingsError};

/// External collaborators the workflow talks to.
#[derive(Clone)]
pub struct QualificationProviders {
    pub geocoder: Arc<dyn Geocoder>,
    pub places: Arc<dyn PlaceDirectory>,
    pub census: Arc<dyn CensusSource>,
    pub rules: Arc<dyn RulesSource>,
}

/// Runs every location check for an address and assembles the result.
pub struct QualificationService {
    geocoder: Arc<dyn Geocoder>,
    places: Arc<dyn PlaceDirectory>,
    rules: Arc<dyn RulesSource>,
    density: DensityResolver,
}

impl QualificationService {
    pub fn new(providers: QualificationProviders, land_areas: Arc<LandAreaTable>) -> Self {
        Self {
            geocoder: providers.geocoder,
            places: providers.places,
            rules: providers.rules,
            density: DensityResolver::new(providers.census, land_areas),
        }
    }

    #[instrument(skip_all, fields(address = %address.trim()))]
    pub async fn qualify(
        &self,
        address: &str,
        settings: &Settings,
    ) -> Result<QualificationResult, QualificationError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(QualificationError::EmptyAddress);
        }
        settings.validate()?;

        let geocoded = self
            .geocoder
            .geocode(address)
            .await
            .map_err(QualificationError::Geocoding)?;
        let place = self.place_details(&geocoded.place_id).await?;

        let (zip_density, rejected_states, ignored_competitors, population_rule) = tokio::join!(
            self.density.resolve(&geocoded.zip_code),
            self.rules.auto_rejected_states(),
            self.rules.ignored_competitors(),
            self.rules.population_rule(&geocoded.state_code),
        );
        let zip_density = zip_density.map_err(|source| QualificationError::Population {
            zip_code: geocoded.zip_code.clone(),
            source,
        })?;
        let rejected_states = or_degrade(rejected_states, "auto-rejected states");
        let ignored_competitors = or_degrade(ignored_competitors, "ignored competitors");
        let population_rule = or_degrade(population_rule, "population rule");

        let threshold = density_threshold(
            settings,
            &geocoded.state_code,
            zip_density.population,
            population_rule.as_ref(),
        );
        let density_value = zip_density.density;
        let population_density = evaluate_density(zip_density, threshold);

        let (proximity_rule, kiosk_density_rule) = tokio::join!(
            self.rules.proximity_rule(density_value),
            self.rules.kiosk_density_rule(density_value),
        );
        let proximity_rule = or_degrade(proximity_rule, "proximity rule");
        let kiosk_density_rule = or_degrade(kiosk_density_rule, "kiosk density rule");

        let required_distance = proximity_rule
            .as_ref()
            .map(|rule| rule.required_distance_miles(&geocoded.state_code))
            .unwrap_or(settings.search_radius_miles);
        let search_radius = settings
            .search_radius_miles
            .max(required_distance)
            .max(COMPETITOR_RADIUS_MILES);

        let kiosks = match self
            .places
            .nearby_kiosks(geocoded.location, search_radius)
            .await
        {
            Ok(kiosks) => kiosks,
            Err(err) => {
                warn!(error = %err, search_radius, "nearby kiosk search failed, assuming none");
                Vec::new()
            }
        };

        let state_policy = evaluate_state(
            &geocoded.state_code,
            &geocoded.state_name,
            &rejected_states,
        );
        let btm_proximity = evaluate_proximity(&ProximityInputs {
            site: geocoded.location,
            store_name: &place.name,
            state_code: &geocoded.state_code,
            kiosks: &kiosks,
            ignored_competitors: &ignored_competitors,
            proximity_rule: proximity_rule.as_ref(),
            kiosk_density_rule: kiosk_density_rule.as_ref(),
            fallback_distance_miles: settings.search_radius_miles,
        });
        let business_type = evaluate_business(&place.name, &place.types);
        let store_hours = parse_store_hours(place.weekday_text.as_deref());

        let checks = CheckResults {
            state: &state_policy,
            density: &population_density,
            proximity: &btm_proximity,
            business: &business_type,
            hours: &store_hours,
        };
        let qualified = checks.all_pass();
        let reasons = checks.failure_reasons();
        let summary = summarize(
            qualified,
            business_type.tier,
            population_density.density,
            &reasons,
        );

        info!(
            qualified,
            zip_code = %population_density.zip_code,
            density = population_density.density,
            kiosks = kiosks.len(),
            "location evaluated"
        );

        Ok(QualificationResult {
            qualified,
            address: address.to_string(),
            formatted_address: geocoded.formatted_address,
            location: geocoded.location,
            state_code: geocoded.state_code,
            state_name: geocoded.state_name,
            state_policy,
            population_density,
            btm_proximity,
            business_type,
            store_hours,
            reasons,
            summary,
            timestamp: Utc::now(),
        })
    }

    /// Key problems are fatal; anything else falls back to an unnamed business.
    async fn place_details(&self, place_id: &str) -> Result<PlaceDetails, QualificationError> {
        match self.places.place_details(place_id).await {
            Ok(details) => Ok(details),
            Err(err @ (ProviderError::MissingApiKey { .. } | ProviderError::InvalidApiKey { .. })) => {
                Err(QualificationError::PlaceDetails(err))
            }
            Err(err) => {
                warn!(place_id, error = %err, "place details unavailable, using placeholder");
                Ok(PlaceDetails::placeholder())
            }
        }
    }
}

fn or_degrade<T: Default>(result: Result<T, ProviderError>, what: &'static str) -> T {
    result.unwrap_or_else(|err| {
        error!(error = %err, "failed to load {what}, continuing without it");
        T::default()
    })
}

/// Error raised by the qualification workflow.
#[derive(Debug, thiserror::Error)]
pub enum QualificationError {
    #[error("Address is required")]
    EmptyAddress,
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Geocoding(ProviderError),
    #[error(transparent)]
    PlaceDetails(ProviderError),
    #[error("{source}")]
    Population {
        zip_code: String,
        #[source]
        source: ProviderError,
    },
}

impl QualificationError {
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            QualificationError::Geocoding(err) | QualificationError::PlaceDetails(err) => Some(err),
            QualificationError::Population { source, .. } => Some(source),
            QualificationError::EmptyAddress | QualificationError::Settings(_) => None,
        }
    }
}
