//! ZIP population density with a land-area fallback chain:
//! cached table, then the boundary service, then a fixed average.

use super::domain::LandAreaSource;
use crate::integrations::{CensusSource, ProviderError};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Ten square miles, used when no boundary data is available.
pub const AVERAGE_LAND_AREA_SQ_METERS: f64 = 25_899_881.1;
pub const SQ_METERS_PER_SQ_MILE: f64 = 2_589_988.11;

#[derive(Debug)]
pub enum LandAreaTableError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for LandAreaTableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LandAreaTableError::Io(err) => write!(f, "failed to read land area table: {}", err),
            LandAreaTableError::Csv(err) => write!(f, "invalid land area CSV data: {}", err),
        }
    }
}

impl std::error::Error for LandAreaTableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LandAreaTableError::Io(err) => Some(err),
            LandAreaTableError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for LandAreaTableError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for LandAreaTableError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

#[derive(Debug, Deserialize)]
struct LandAreaRow {
    #[serde(alias = "ZCTA5", alias = "zcta")]
    zip: String,
    #[serde(alias = "ALAND", alias = "aland")]
    land_area_sq_meters: f64,
}

/// ZIP → land area (m²) cache, seeded from CSV and filled by boundary lookups.
#[derive(Debug, Default)]
pub struct LandAreaTable {
    areas: RwLock<HashMap<String, f64>>,
}

impl LandAreaTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, LandAreaTableError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LandAreaTableError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut areas = HashMap::new();

        for record in csv_reader.deserialize::<LandAreaRow>() {
            let row = record?;
            if row.land_area_sq_meters.is_finite() && row.land_area_sq_meters > 0.0 {
                areas.insert(row.zip, row.land_area_sq_meters);
            }
        }

        Ok(Self {
            areas: RwLock::new(areas),
        })
    }

    pub fn get(&self, zip_code: &str) -> Option<f64> {
        self.areas
            .read()
            .ok()
            .and_then(|areas| areas.get(zip_code).copied())
    }

    pub fn insert(&self, zip_code: &str, land_area_sq_meters: f64) {
        if let Ok(mut areas) = self.areas.write() {
            areas.insert(zip_code.to_string(), land_area_sq_meters);
        }
    }

    pub fn len(&self) -> usize {
        self.areas.read().map(|areas| areas.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZipDensity {
    pub zip_code: String,
    pub population: u64,
    pub land_area_sq_miles: f64,
    pub land_area_source: LandAreaSource,
    pub density: f64,
}

/// People per square mile, rounded to a whole number.
pub fn density_per_sq_mile(population: u64, land_area_sq_meters: f64) -> f64 {
    let square_miles = land_area_sq_meters / SQ_METERS_PER_SQ_MILE;
    (population as f64 / square_miles).round()
}

pub struct DensityResolver {
    census: Arc<dyn CensusSource>,
    land_areas: Arc<LandAreaTable>,
}

impl DensityResolver {
    pub fn new(census: Arc<dyn CensusSource>, land_areas: Arc<LandAreaTable>) -> Self {
        Self { census, land_areas }
    }

    pub async fn resolve(&self, zip_code: &str) -> Result<ZipDensity, ProviderError> {
        let (population, (land_area, source)) = tokio::join!(
            self.census.zip_population(zip_code),
            self.land_area(zip_code)
        );
        let population = population?;
        let density = density_per_sq_mile(population, land_area);
        debug!(zip_code, population, density, ?source, "resolved population density");

        Ok(ZipDensity {
            zip_code: zip_code.to_string(),
            population,
            land_area_sq_miles: land_area / SQ_METERS_PER_SQ_MILE,
            land_area_source: source,
            density,
        })
    }

    async fn land_area(&self, zip_code: &str) -> (f64, LandAreaSource) {
        if let Some(area) = self.land_areas.get(zip_code) {
            return (area, LandAreaSource::Cached);
        }

        match self.census.zip_land_area_sq_meters(zip_code).await {
            Ok(Some(area)) if area.is_finite() && area > 0.0 => {
                self.land_areas.insert(zip_code, area);
                (area, LandAreaSource::BoundaryService)
            }
            Ok(_) => {
                warn!(zip_code, "no land area on record, using average");
                (AVERAGE_LAND_AREA_SQ_METERS, LandAreaSource::Average)
            }
            Err(err) => {
                warn!(zip_code, error = %err, "could not fetch land area, using average");
                (AVERAGE_LAND_AREA_SQ_METERS, LandAreaSource::Average)
            }
        }
    }
}
