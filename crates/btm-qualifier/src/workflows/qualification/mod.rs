//! Location qualification workflow.
//!
//! [`QualificationService`] geocodes an address, gathers density, kiosk and
//! business data through the provider traits in [`crate::integrations`], and
//! combines five checks into a single [`QualificationResult`]:
//! state policy, population density, kiosk proximity, business tier and
//! store hours.

pub(crate) mod business;
pub mod density;
pub mod domain;
pub(crate) mod hours;
pub mod policy;
pub(crate) mod proximity;
pub mod report;
pub mod router;
pub mod rules;
pub mod service;

#[cfg(test)]
mod tests;

pub use density::{DensityResolver, LandAreaTable, LandAreaTableError, ZipDensity};
pub use domain::{
    BusinessTier, BusinessType, CompetitorCount, DaySchedule, KioskProximity, LandAreaSource,
    PopulationDensity, QualificationRequest, QualificationResult, StatePolicy, StoreHours,
};
pub use report::{render_report, Report};
pub use router::qualification_router;
pub use rules::{
    AutoRejectedState, KioskDensityRule, PopulationRule, ProximityRule, RuleBook,
};
pub use service::{QualificationError, QualificationProviders, QualificationService};
