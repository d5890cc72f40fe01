use super::{http_client, ProviderError, RulesSource};
use crate::workflows::qualification::rules::{
    AutoRejectedState, KioskDensityRule, PopulationRule, ProximityRule,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::debug;

const PROVIDER: &str = "Supabase";

/// Reads rule tables through the Supabase PostgREST endpoint.
pub struct SupabaseRules {
    client: reqwest::Client,
    rest_url: String,
    api_key: String,
}

impl SupabaseRules {
    pub fn new(
        project_url: &str,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(timeout)?,
            rest_url: format!("{}/rest/v1", project_url.trim_end_matches('/')),
            api_key: api_key.into(),
        })
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
    ) -> Result<Vec<T>, ProviderError> {
        debug!(table, ?filters, "querying rule table");
        let response = self
            .client
            .get(format!("{}/{table}", self.rest_url))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .query(&[("select", "*")])
            .query(filters)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.ok().filter(|body| !body.is_empty());
            return Err(ProviderError::Status {
                provider: PROVIDER,
                status: status.as_u16().to_string(),
                message,
            });
        }

        Ok(response.json().await?)
    }

    async fn band_row<T: DeserializeOwned>(
        &self,
        table: &str,
        density: f64,
    ) -> Result<Option<T>, ProviderError> {
        let rows = self
            .select::<T>(table, &band_filters(density))
            .await?;
        Ok(rows.into_iter().next())
    }
}

pub(crate) fn band_filters(density: f64) -> Vec<(&'static str, String)> {
    vec![
        ("density_min", format!("lte.{density}")),
        ("density_max", format!("gte.{density}")),
        ("limit", "1".to_string()),
    ]
}

#[derive(Debug, Deserialize)]
struct IgnoredCompetitorRow {
    competitor_name: String,
}

#[async_trait]
impl RulesSource for SupabaseRules {
    async fn auto_rejected_states(
        &self,
    ) -> Result<HashMap<String, AutoRejectedState>, ProviderError> {
        let rows: Vec<AutoRejectedState> = self
            .select(
                "auto_rejected_states",
                &[("discontinued_date", "is.null".to_string())],
            )
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| (row.state_code.clone(), row))
            .collect())
    }

    async fn proximity_rule(&self, density: f64) -> Result<Option<ProximityRule>, ProviderError> {
        self.band_row("proximity_rules", density).await
    }

    async fn kiosk_density_rule(
        &self,
        density: f64,
    ) -> Result<Option<KioskDensityRule>, ProviderError> {
        self.band_row("kiosk_density_rules", density).await
    }

    async fn population_rule(
        &self,
        state_code: &str,
    ) -> Result<Option<PopulationRule>, ProviderError> {
        let state_rows: Vec<PopulationRule> = self
            .select(
                "population_minimum_rules",
                &[
                    ("state_code", format!("eq.{state_code}")),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        if let Some(row) = state_rows.into_iter().next() {
            return Ok(Some(row));
        }

        let default_rows: Vec<PopulationRule> = self
            .select(
                "population_minimum_rules",
                &[
                    ("state_code", "is.null".to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(default_rows.into_iter().next())
    }

    async fn ignored_competitors(&self) -> Result<HashSet<String>, ProviderError> {
        let rows: Vec<IgnoredCompetitorRow> = self
            .select("ignored_competitors", &[])
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| row.competitor_name.to_lowercase())
            .collect())
    }
}
