use crate::geo::Coordinates;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Incoming request for a location check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualificationRequest {
    pub address: String,
}

/// Placement incentive tier for the host business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusinessTier {
    Tier1,
    Tier2,
    Unqualified,
}

impl BusinessTier {
    /// Dollar incentive paid to the host for this tier.
    pub fn incentive_amount(&self) -> Option<u32> {
        match self {
            BusinessTier::Tier1 => Some(300),
            BusinessTier::Tier2 => Some(200),
            BusinessTier::Unqualified => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BusinessTier::Tier1 => "Tier 1",
            BusinessTier::Tier2 => "Tier 2",
            BusinessTier::Unqualified => "Unqualified",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessType {
    pub name: String,
    pub category: String,
    pub tier: BusinessTier,
    pub tier_amount: Option<u32>,
    pub meets_requirement: bool,
    pub detected_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub day: String,
    pub hours: String,
    pub is_open: bool,
    pub hours_count: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreHours {
    pub days_open: u8,
    pub average_hours_per_day: f64,
    pub meets_requirements: bool,
    pub weekly_schedule: Vec<DaySchedule>,
}

/// Which link of the fallback chain supplied the ZIP land area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandAreaSource {
    Cached,
    BoundaryService,
    Average,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationDensity {
    pub zip_code: String,
    pub population: u64,
    pub land_area_sq_miles: f64,
    pub land_area_source: LandAreaSource,
    pub density: f64,
    pub threshold: f64,
    pub reduced_threshold_applied: bool,
    pub meets_requirement: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitorCount {
    pub name: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KioskProximity {
    pub bitcoin_depot_count: u32,
    pub nearest_bitcoin_depot_miles: Option<f64>,
    pub required_distance_miles: f64,
    pub competitors: Vec<CompetitorCount>,
    pub total_competitors: u32,
    pub competitors_within_one_mile: u32,
    pub max_competitors_within_one_mile: Option<u32>,
    pub same_store_competitor: bool,
    pub meets_requirement: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatePolicy {
    pub state_code: String,
    pub state_name: String,
    pub auto_rejected: bool,
    pub rejection_reason: Option<String>,
    pub meets_requirement: bool,
}

/// Complete pass/fail report for one address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualificationResult {
    pub qualified: bool,
    pub address: String,
    pub formatted_address: String,
    pub location: Coordinates,
    pub state_code: String,
    pub state_name: String,
    pub state_policy: StatePolicy,
    pub population_density: PopulationDensity,
    pub btm_proximity: KioskProximity,
    pub business_type: BusinessType,
    pub store_hours: StoreHours,
    pub reasons: Vec<String>,
    pub summary: String,
    pub timestamp: DateTime<Utc>,
}
