//! Operator-tunable qualification settings.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

pub const MIN_SEARCH_RADIUS_MILES: f64 = 0.1;
pub const MAX_SEARCH_RADIUS_MILES: f64 = 10.0;

/// Thresholds an operator may adjust at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub minimum_population_density: f64,
    pub search_radius_miles: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            minimum_population_density: 1000.0,
            search_radius_miles: 1.0,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !self.minimum_population_density.is_finite() || self.minimum_population_density < 0.0
        {
            return Err(SettingsError::NegativeDensity(
                self.minimum_population_density,
            ));
        }

        if !(MIN_SEARCH_RADIUS_MILES..=MAX_SEARCH_RADIUS_MILES).contains(&self.search_radius_miles)
        {
            return Err(SettingsError::RadiusOutOfRange(self.search_radius_miles));
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SettingsError {
    #[error("minimum population density must be a non-negative number (got {0})")]
    NegativeDensity(f64),
    #[error("search radius must be between 0.1 and 10 miles (got {0})")]
    RadiusOutOfRange(f64),
    #[error("settings store unavailable: {0}")]
    Unavailable(String),
}

/// Storage abstraction for the single settings record.
pub trait SettingsStore: Send + Sync {
    fn get(&self) -> Result<Settings, SettingsError>;
    fn update(&self, settings: Settings) -> Result<Settings, SettingsError>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemorySettingsStore {
    settings: Arc<RwLock<Settings>>,
}

impl InMemorySettingsStore {
    pub fn new(initial: Settings) -> Self {
        Self {
            settings: Arc::new(RwLock::new(initial)),
        }
    }
}

impl SettingsStore for InMemorySettingsStore {
    fn get(&self) -> Result<Settings, SettingsError> {
        self.settings
            .read()
            .map(|guard| *guard)
            .map_err(|_| SettingsError::Unavailable("settings lock poisoned".to_string()))
    }

    fn update(&self, settings: Settings) -> Result<Settings, SettingsError> {
        settings.validate()?;
        let mut guard = self
            .settings
            .write()
            .map_err(|_| SettingsError::Unavailable("settings lock poisoned".to_string()))?;
        *guard = settings;
        Ok(*guard)
    }
}
