//! Retail location qualification for Bitcoin ATM placement.
//!
//! An address is geocoded, enriched with Census population data and nearby
//! kiosk listings, then checked against state policy, density, proximity,
//! business tier and opening-hours rules.

pub mod config;
pub mod error;
pub mod geo;
pub mod integrations;
pub mod settings;
pub mod telemetry;
pub mod workflows;
