//! Rule tables that parameterise the qualification checks.
//!
//! Rows are density-banded: a band matches when
//! `density_min <= density <= density_max`. Per-state overrides replace the
//! standard value for that band only.

use crate::integrations::{ProviderError, RulesSource};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Read;
use std::path::Path;

/// States whose ZIPs may use the reduced density minimum.
pub const LOWER_DENSITY_STATES: [&str; 2] = ["AZ", "WA"];
/// ZIP population required before the reduced density minimum applies.
pub const LOWER_DENSITY_POPULATION_FLOOR: u64 = 15_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProximityRule {
    pub density_min: f64,
    pub density_max: f64,
    pub standard_distance_miles: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub state_exceptions: BTreeMap<String, f64>,
}

impl ProximityRule {
    pub fn required_distance_miles(&self, state_code: &str) -> f64 {
        self.state_exceptions
            .get(state_code)
            .copied()
            .unwrap_or(self.standard_distance_miles)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KioskDensityRule {
    pub density_min: f64,
    pub density_max: f64,
    pub standard_kiosk_limit: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub state_exceptions: BTreeMap<String, u32>,
}

impl KioskDensityRule {
    pub fn max_kiosks(&self, state_code: &str) -> u32 {
        self.state_exceptions
            .get(state_code)
            .copied()
            .unwrap_or(self.standard_kiosk_limit)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationRule {
    #[serde(default)]
    pub state_code: Option<String>,
    pub population_minimum: u64,
    pub density_minimum: f64,
    #[serde(default)]
    pub special_conditions: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoRejectedState {
    pub state_code: String,
    #[serde(default)]
    pub state_name: Option<String>,
    #[serde(default, alias = "rejection_reason")]
    pub reason: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub(crate) fn density_in_band(density: f64, min: f64, max: f64) -> bool {
    min <= density && density <= max
}

pub fn can_use_lower_density_minimum(state_code: &str, zip_population: u64) -> bool {
    LOWER_DENSITY_STATES.contains(&state_code) && zip_population >= LOWER_DENSITY_POPULATION_FLOOR
}

/// Rule tables held in memory, loaded from JSON or the built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleBook {
    #[serde(default)]
    pub auto_rejected_states: Vec<AutoRejectedState>,
    #[serde(default)]
    pub proximity_rules: Vec<ProximityRule>,
    #[serde(default)]
    pub kiosk_density_rules: Vec<KioskDensityRule>,
    #[serde(default)]
    pub population_rules: Vec<PopulationRule>,
    #[serde(default)]
    pub ignored_competitors: Vec<String>,
}

impl RuleBook {
    /// Baseline bands used when no rules database is configured.
    pub fn standard() -> Self {
        let band_top = 1_000_000.0;
        Self {
            auto_rejected_states: Vec::new(),
            proximity_rules: vec![
                proximity(0.0, 499.0, 5.0),
                proximity(500.0, 1_999.0, 3.0),
                proximity(2_000.0, 4_999.0, 1.5),
                proximity(5_000.0, 9_999.0, 1.0),
                proximity(10_000.0, band_top, 0.5),
            ],
            kiosk_density_rules: vec![
                kiosk_limit(0.0, 999.0, 1),
                kiosk_limit(1_000.0, 4_999.0, 2),
                kiosk_limit(5_000.0, 9_999.0, 3),
                kiosk_limit(10_000.0, band_top, 5),
            ],
            population_rules: vec![
                PopulationRule {
                    state_code: None,
                    population_minimum: 0,
                    density_minimum: 1_000.0,
                    special_conditions: None,
                },
                PopulationRule {
                    state_code: Some("AZ".to_string()),
                    population_minimum: LOWER_DENSITY_POPULATION_FLOOR,
                    density_minimum: 500.0,
                    special_conditions: Some(
                        "reduced density minimum for ZIPs above the population floor".to_string(),
                    ),
                },
                PopulationRule {
                    state_code: Some("WA".to_string()),
                    population_minimum: LOWER_DENSITY_POPULATION_FLOOR,
                    density_minimum: 500.0,
                    special_conditions: Some(
                        "reduced density minimum for ZIPs above the population floor".to_string(),
                    ),
                },
            ],
            ignored_competitors: Vec::new(),
        }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ProviderError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ProviderError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn proximity_rule_for(&self, density: f64) -> Option<&ProximityRule> {
        self.proximity_rules
            .iter()
            .find(|rule| density_in_band(density, rule.density_min, rule.density_max))
    }

    pub fn kiosk_density_rule_for(&self, density: f64) -> Option<&KioskDensityRule> {
        self.kiosk_density_rules
            .iter()
            .find(|rule| density_in_band(density, rule.density_min, rule.density_max))
    }

    /// State row when present, otherwise the default row without a state.
    pub fn population_rule_for(&self, state_code: &str) -> Option<&PopulationRule> {
        self.population_rules
            .iter()
            .find(|rule| rule.state_code.as_deref() == Some(state_code))
            .or_else(|| {
                self.population_rules
                    .iter()
                    .find(|rule| rule.state_code.is_none())
            })
    }
}

fn proximity(density_min: f64, density_max: f64, miles: f64) -> ProximityRule {
    ProximityRule {
        density_min,
        density_max,
        standard_distance_miles: miles,
        state_exceptions: BTreeMap::new(),
    }
}

fn kiosk_limit(density_min: f64, density_max: f64, limit: u32) -> KioskDensityRule {
    KioskDensityRule {
        density_min,
        density_max,
        standard_kiosk_limit: limit,
        state_exceptions: BTreeMap::new(),
    }
}

#[async_trait]
impl RulesSource for RuleBook {
    async fn auto_rejected_states(
        &self,
    ) -> Result<HashMap<String, AutoRejectedState>, ProviderError> {
        Ok(self
            .auto_rejected_states
            .iter()
            .map(|state| (state.state_code.clone(), state.clone()))
            .collect())
    }

    async fn proximity_rule(&self, density: f64) -> Result<Option<ProximityRule>, ProviderError> {
        Ok(self.proximity_rule_for(density).cloned())
    }

    async fn kiosk_density_rule(
        &self,
        density: f64,
    ) -> Result<Option<KioskDensityRule>, ProviderError> {
        Ok(self.kiosk_density_rule_for(density).cloned())
    }

    async fn population_rule(
        &self,
        state_code: &str,
    ) -> Result<Option<PopulationRule>, ProviderError> {
        Ok(self.population_rule_for(state_code).cloned())
    }

    async fn ignored_competitors(&self) -> Result<HashSet<String>, ProviderError> {
        Ok(self
            .ignored_competitors
            .iter()
            .map(|name| name.to_lowercase())
            .collect())
    }
}
