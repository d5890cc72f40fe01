use super::density::ZipDensity;
use super::domain::{
    BusinessTier, BusinessType, KioskProximity, PopulationDensity, StatePolicy, StoreHours,
};
use super::rules::{can_use_lower_density_minimum, AutoRejectedState, PopulationRule};
use crate::settings::Settings;
use std::collections::HashMap;

pub const DEFAULT_REJECTION_REASON: &str = "This state does not allow Bitcoin Depot kiosks";

pub(crate) fn evaluate_state(
    state_code: &str,
    state_name: &str,
    rejected: &HashMap<String, AutoRejectedState>,
) -> StatePolicy {
    match rejected.get(state_code) {
        Some(entry) => StatePolicy {
            state_code: state_code.to_string(),
            state_name: entry
                .state_name
                .clone()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| state_name.to_string()),
            auto_rejected: true,
            rejection_reason: Some(
                entry
                    .reason
                    .clone()
                    .filter(|reason| !reason.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_REJECTION_REASON.to_string()),
            ),
            meets_requirement: false,
        },
        None => StatePolicy {
            state_code: state_code.to_string(),
            state_name: state_name.to_string(),
            auto_rejected: false,
            rejection_reason: None,
            meets_requirement: true,
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct DensityThreshold {
    pub threshold: f64,
    pub reduced: bool,
}

/// The settings minimum, lowered to the state rule's minimum for qualifying
/// AZ/WA ZIPs.
pub(crate) fn density_threshold(
    settings: &Settings,
    state_code: &str,
    zip_population: u64,
    rule: Option<&PopulationRule>,
) -> DensityThreshold {
    let base = settings.minimum_population_density;
    match rule {
        Some(rule)
            if can_use_lower_density_minimum(state_code, zip_population)
                && rule.density_minimum < base =>
        {
            DensityThreshold {
                threshold: rule.density_minimum,
                reduced: true,
            }
        }
        _ => DensityThreshold {
            threshold: base,
            reduced: false,
        },
    }
}

pub(crate) fn evaluate_density(zip: ZipDensity, threshold: DensityThreshold) -> PopulationDensity {
    PopulationDensity {
        meets_requirement: zip.density >= threshold.threshold,
        zip_code: zip.zip_code,
        population: zip.population,
        land_area_sq_miles: zip.land_area_sq_miles,
        land_area_source: zip.land_area_source,
        density: zip.density,
        threshold: threshold.threshold,
        reduced_threshold_applied: threshold.reduced,
    }
}

pub(crate) struct CheckResults<'a> {
    pub state: &'a StatePolicy,
    pub density: &'a PopulationDensity,
    pub proximity: &'a KioskProximity,
    pub business: &'a BusinessType,
    pub hours: &'a StoreHours,
}

impl CheckResults<'_> {
    pub fn all_pass(&self) -> bool {
        self.state.meets_requirement
            && self.density.meets_requirement
            && self.proximity.meets_requirement
            && self.business.meets_requirement
            && self.hours.meets_requirements
    }

    /// One line per failing check, in evaluation order.
    pub fn failure_reasons(&self) -> Vec<String> {
        let mut reasons = Vec::new();

        if !self.state.meets_requirement {
            let reason = self
                .state
                .rejection_reason
                .as_deref()
                .unwrap_or(DEFAULT_REJECTION_REASON);
            reasons.push(format!("state not eligible ({reason})"));
        }

        if !self.density.meets_requirement {
            reasons.push(format!(
                "insufficient population density ({} people per sq mi, minimum {})",
                group_thousands(self.density.density),
                group_thousands(self.density.threshold)
            ));
        }

        let proximity = self.proximity;
        if let Some(nearest) = proximity.nearest_bitcoin_depot_miles {
            if nearest < proximity.required_distance_miles {
                reasons.push(format!(
                    "existing Bitcoin Depot ATM nearby ({nearest:.2} mi away, minimum {:.2} mi)",
                    proximity.required_distance_miles
                ));
            }
        }
        if proximity.same_store_competitor {
            reasons.push("competitor kiosk already installed at this store".to_string());
        }
        if let Some(cap) = proximity.max_competitors_within_one_mile {
            if proximity.competitors_within_one_mile > cap {
                reasons.push(format!(
                    "too many competitor kiosks within 1 mile ({}, maximum {cap})",
                    proximity.competitors_within_one_mile
                ));
            }
        }

        if !self.business.meets_requirement {
            reasons.push(format!(
                "business type not qualified ({})",
                self.business.category
            ));
        }

        if !self.hours.meets_requirements {
            reasons.push(format!(
                "inadequate store hours ({} days open, {:.1} average hours per day)",
                self.hours.days_open, self.hours.average_hours_per_day
            ));
        }

        reasons
    }
}

pub(crate) fn summarize(
    qualified: bool,
    tier: BusinessTier,
    density: f64,
    reasons: &[String],
) -> String {
    if qualified {
        format!(
            "This location meets all requirements for Bitcoin ATM placement. {} business with {} people per sq mi, no existing Bitcoin Depot ATMs nearby, and adequate operating hours.",
            tier.label(),
            group_thousands(density)
        )
    } else {
        format!(
            "This location does not qualify due to: {}.",
            reasons.join("; ")
        )
    }
}

/// `12345.6` -> `"12,346"`.
pub fn group_thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if rounded < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}
