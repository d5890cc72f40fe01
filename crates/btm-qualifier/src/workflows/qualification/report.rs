use std::fmt::{self, Write};

use super::domain::{LandAreaSource, QualificationResult};
use super::policy::group_thousands;

fn mark(passed: bool) -> &'static str {
    if passed {
        "PASS"
    } else {
        "FAIL"
    }
}

fn land_area_label(source: LandAreaSource) -> &'static str {
    match source {
        LandAreaSource::Cached => "land area table",
        LandAreaSource::BoundaryService => "Census boundary service",
        LandAreaSource::Average => "average ZIP area",
    }
}

/// Plain-text pass/fail report for terminal output.
pub struct Report<'a>(pub &'a QualificationResult);

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_report(f, self.0)
    }
}

pub fn render_report(result: &QualificationResult) -> String {
    Report(result).to_string()
}

fn write_report(out: &mut impl Write, result: &QualificationResult) -> fmt::Result {
    let verdict = if result.qualified {
        "QUALIFIED"
    } else {
        "NOT QUALIFIED"
    };
    writeln!(out, "{verdict}: {}", result.formatted_address)?;
    writeln!(
        out,
        "  location {:.5}, {:.5} ({}, {})",
        result.location.lat, result.location.lng, result.state_name, result.state_code
    )?;
    writeln!(out)?;

    let state = &result.state_policy;
    write!(out, "[{}] State policy", mark(state.meets_requirement))?;
    match state.rejection_reason.as_deref() {
        Some(reason) => writeln!(out, ": {reason}")?,
        None => writeln!(out, ": {} accepts kiosks", state.state_code)?,
    }

    let density = &result.population_density;
    writeln!(
        out,
        "[{}] Population density: {} people per sq mi in ZIP {} (minimum {}{})",
        mark(density.meets_requirement),
        group_thousands(density.density),
        density.zip_code,
        group_thousands(density.threshold),
        if density.reduced_threshold_applied {
            ", reduced state minimum"
        } else {
            ""
        }
    )?;
    writeln!(
        out,
        "       population {}, {:.2} sq mi from {}",
        group_thousands(density.population as f64),
        density.land_area_sq_miles,
        land_area_label(density.land_area_source)
    )?;

    let proximity = &result.btm_proximity;
    writeln!(
        out,
        "[{}] Kiosk proximity: {} Bitcoin Depot kiosk(s) nearby, {} competitor(s)",
        mark(proximity.meets_requirement),
        proximity.bitcoin_depot_count,
        proximity.total_competitors
    )?;
    if let Some(nearest) = proximity.nearest_bitcoin_depot_miles {
        writeln!(
            out,
            "       nearest Bitcoin Depot {nearest:.2} mi (required {:.2} mi)",
            proximity.required_distance_miles
        )?;
    }
    match proximity.max_competitors_within_one_mile {
        Some(cap) => writeln!(
            out,
            "       {} competitor(s) within 1 mi (maximum {cap})",
            proximity.competitors_within_one_mile
        )?,
        None => writeln!(
            out,
            "       {} competitor(s) within 1 mi",
            proximity.competitors_within_one_mile
        )?,
    }
    for competitor in &proximity.competitors {
        writeln!(out, "         - {}: {}", competitor.name, competitor.count)?;
    }
    if proximity.same_store_competitor {
        writeln!(out, "       competitor kiosk detected in this store")?;
    }

    let business = &result.business_type;
    write!(
        out,
        "[{}] Business: {} ({}, {})",
        mark(business.meets_requirement),
        business.name,
        business.category,
        business.tier.label()
    )?;
    match business.tier_amount {
        Some(amount) => writeln!(out, " ${amount} incentive")?,
        None => writeln!(out)?,
    }

    let hours = &result.store_hours;
    writeln!(
        out,
        "[{}] Store hours: {} days open, {:.1} hours per day on average",
        mark(hours.meets_requirements),
        hours.days_open,
        hours.average_hours_per_day
    )?;
    for day in &hours.weekly_schedule {
        writeln!(out, "       {}: {}", day.day, day.hours)?;
    }

    writeln!(out)?;
    writeln!(out, "{}", result.summary)
}
