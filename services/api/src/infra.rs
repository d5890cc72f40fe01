use btm_qualifier::config::{AppConfig, RuleSourceConfig};
use btm_qualifier::error::AppError;
use btm_qualifier::integrations::{CensusClient, GoogleMapsClient, RulesSource, SupabaseRules};
use btm_qualifier::workflows::qualification::{
    LandAreaTable, QualificationProviders, QualificationService, RuleBook,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Wires the live provider clients, rule source and land-area table.
pub(crate) fn build_service(config: &AppConfig) -> Result<QualificationService, AppError> {
    let providers = &config.providers;
    if providers.google_maps_api_key.is_none() {
        warn!("GOOGLE_MAPS_API_KEY is not set; qualification requests will fail");
    }

    let maps = Arc::new(GoogleMapsClient::new(
        providers.google_maps_api_key.clone(),
        providers.http_timeout,
    )?);
    let census = Arc::new(CensusClient::new(
        providers.census_api_key.clone(),
        providers.http_timeout,
    )?);
    let rules = rule_source(&config.rules, providers.http_timeout)?;
    let land_areas = load_land_areas(providers.land_area_table.as_deref())?;

    Ok(QualificationService::new(
        QualificationProviders {
            geocoder: maps.clone(),
            places: maps,
            census,
            rules,
        },
        Arc::new(land_areas),
    ))
}

fn rule_source(
    config: &RuleSourceConfig,
    timeout: Duration,
) -> Result<Arc<dyn RulesSource>, AppError> {
    info!(source = ?config, "loading qualification rules");
    let source: Arc<dyn RulesSource> = match config {
        RuleSourceConfig::Supabase { url, api_key } => {
            Arc::new(SupabaseRules::new(url, api_key.clone(), timeout)?)
        }
        RuleSourceConfig::File(path) => Arc::new(RuleBook::from_path(path)?),
        RuleSourceConfig::Standard => Arc::new(RuleBook::standard()),
    };
    Ok(source)
}

fn load_land_areas(path: Option<&Path>) -> Result<LandAreaTable, AppError> {
    match path {
        Some(path) => {
            let table = LandAreaTable::from_path(path)?;
            info!(path = %path.display(), zips = table.len(), "loaded land area table");
            Ok(table)
        }
        None => Ok(LandAreaTable::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sample_data(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../../crates/btm-qualifier/data")
            .join(name)
    }

    #[tokio::test]
    async fn file_rule_source_reads_the_rule_book() {
        let rules = rule_source(
            &RuleSourceConfig::File(sample_data("rules.example.json")),
            Duration::from_secs(1),
        )
        .expect("rules load");

        let rejected = rules.auto_rejected_states().await.expect("states");
        assert!(rejected.contains_key("NY"));
    }

    #[test]
    fn missing_rule_file_is_an_error() {
        let result = rule_source(
            &RuleSourceConfig::File(PathBuf::from("/nonexistent/rules.json")),
            Duration::from_secs(1),
        );
        assert!(result.is_err());
    }

    #[test]
    fn land_area_table_is_optional() {
        let empty = load_land_areas(None).expect("empty table");
        assert!(empty.is_empty());

        let path = sample_data("land_area_sample.csv");
        let sample = load_land_areas(Some(path.as_path())).expect("table loads");
        assert_eq!(sample.get("50309"), Some(5_179_976.0));
    }
}
