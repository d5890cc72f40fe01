use super::{http_client, validate_zip, CensusSource, ProviderError};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const PROVIDER: &str = "Census";
const ACS_URL: &str = "https://api.census.gov/data/2021/acs/acs5";
const TIGERWEB_ZCTA_URL: &str =
    "https://tigerweb.geo.census.gov/arcgis/rest/services/TIGERweb/tigerWMS_ACS2021/MapServer/8/query";
const TOTAL_POPULATION_VARIABLE: &str = "B01003_001E";

/// ACS population and TIGERweb boundary client.
pub struct CensusClient {
    client: reqwest::Client,
    api_key: Option<String>,
    acs_url: String,
    tigerweb_url: String,
}

impl CensusClient {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key,
            acs_url: ACS_URL.to_string(),
            tigerweb_url: TIGERWEB_ZCTA_URL.to_string(),
        })
    }

    pub fn with_endpoints(
        mut self,
        acs_url: impl Into<String>,
        tigerweb_url: impl Into<String>,
    ) -> Self {
        self.acs_url = acs_url.into();
        self.tigerweb_url = tigerweb_url.into();
        self
    }
}

#[async_trait]
impl CensusSource for CensusClient {
    async fn zip_population(&self, zip_code: &str) -> Result<u64, ProviderError> {
        let zip_code = validate_zip(zip_code)?;
        let geography = format!("zip code tabulation area:{zip_code}");
        let mut query = vec![
            ("get", TOTAL_POPULATION_VARIABLE.to_string()),
            ("for", geography),
        ];
        if let Some(key) = &self.api_key {
            query.push(("key", key.clone()));
        }

        let response = self.client.get(&self.acs_url).query(&query).send().await?;
        let status = response.status();
        // The ACS API answers 204 with an empty body for unknown ZCTAs.
        if status == reqwest::StatusCode::NO_CONTENT {
            return Err(no_population(zip_code));
        }
        if !status.is_success() {
            return Err(ProviderError::Status {
                provider: PROVIDER,
                status: status.as_u16().to_string(),
                message: None,
            });
        }

        let rows: Vec<Vec<String>> = response.json().await?;
        population_from_rows(zip_code, &rows)
    }

    async fn zip_land_area_sq_meters(
        &self,
        zip_code: &str,
    ) -> Result<Option<f64>, ProviderError> {
        let zip_code = validate_zip(zip_code)?;
        let filter = format!("ZCTA5='{zip_code}'");
        let response: BoundaryResponse = self
            .client
            .get(&self.tigerweb_url)
            .query(&[
                ("where", filter.as_str()),
                ("outFields", "ALAND"),
                ("f", "json"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(land_area_from_response(response))
    }
}

fn no_population(zip_code: &str) -> ProviderError {
    ProviderError::NoData(format!("No population data found for ZIP code {zip_code}"))
}

pub(crate) fn population_from_rows(
    zip_code: &str,
    rows: &[Vec<String>],
) -> Result<u64, ProviderError> {
    let raw = rows
        .get(1)
        .and_then(|row| row.first())
        .ok_or_else(|| no_population(zip_code))?;

    // Negative sentinels mark suppressed estimates.
    let population = raw.trim().parse::<i64>().unwrap_or(0);
    if population <= 0 {
        return Err(ProviderError::NoData(format!(
            "Zero population for ZIP code {zip_code}"
        )));
    }

    Ok(population as u64)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct BoundaryResponse {
    #[serde(default)]
    features: Vec<BoundaryFeature>,
}

#[derive(Debug, Deserialize)]
struct BoundaryFeature {
    attributes: BoundaryAttributes,
}

#[derive(Debug, Deserialize)]
struct BoundaryAttributes {
    #[serde(rename = "ALAND", default)]
    aland: Option<f64>,
}

pub(crate) fn land_area_from_response(response: BoundaryResponse) -> Option<f64> {
    response
        .features
        .into_iter()
        .next()
        .and_then(|feature| feature.attributes.aland)
        .filter(|area| area.is_finite() && *area > 0.0)
}
