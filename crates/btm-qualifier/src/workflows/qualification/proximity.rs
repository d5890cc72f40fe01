use super::domain::{CompetitorCount, KioskProximity};
use super::rules::{KioskDensityRule, ProximityRule};
use crate::geo::Coordinates;
use crate::integrations::{NearbyKiosk, PlaceDetails};
use std::collections::HashSet;

/// Radius for the competitor density cap.
pub const COMPETITOR_RADIUS_MILES: f64 = 1.0;
/// A kiosk this close to the site is treated as installed in the same store.
pub const SAME_STORE_RADIUS_MILES: f64 = 0.03;
/// A kiosk named after the store only counts as in-store within this radius;
/// farther out it belongs to another branch of the same chain.
pub const SAME_STORE_NAME_RADIUS_MILES: f64 = 0.5;

const BRAND_KEYWORDS: [&str; 2] = ["bitcoin depot", "bitcoindepot"];
const OTHER_OPERATOR: &str = "Other";

struct CompetitorBrand {
    name: &'static str,
    keywords: &'static [&'static str],
}

const COMPETITORS: [CompetitorBrand; 7] = [
    CompetitorBrand {
        name: "CoinFlip",
        keywords: &["coinflip", "coin flip"],
    },
    CompetitorBrand {
        name: "RockItCoin",
        keywords: &["rockitcoin", "rockit coin"],
    },
    CompetitorBrand {
        name: "CoinCloud",
        keywords: &["coincloud", "coin cloud"],
    },
    CompetitorBrand {
        name: "Athena Bitcoin",
        keywords: &["athena"],
    },
    CompetitorBrand {
        name: "Bitcoin of America",
        keywords: &["bitcoin of america", "boa"],
    },
    CompetitorBrand {
        name: "Byte Federal",
        keywords: &["byte federal", "bytefederal"],
    },
    CompetitorBrand {
        name: "LibertyX",
        keywords: &["libertyx", "liberty x"],
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Brand,
    Competitor(&'static str),
}

/// Short keywords such as "boa" only match whole words.
fn keyword_matches(name_lower: &str, keyword: &str) -> bool {
    if keyword.len() <= 3 {
        name_lower
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| word == keyword)
    } else {
        name_lower.contains(keyword)
    }
}

fn operator_of(name_lower: &str) -> Operator {
    if BRAND_KEYWORDS
        .iter()
        .any(|keyword| name_lower.contains(keyword))
    {
        return Operator::Brand;
    }

    COMPETITORS
        .iter()
        .find(|brand| {
            brand
                .keywords
                .iter()
                .any(|keyword| keyword_matches(name_lower, keyword))
        })
        .map(|brand| Operator::Competitor(brand.name))
        .unwrap_or(Operator::Competitor(OTHER_OPERATOR))
}

fn is_ignored(name_lower: &str, operator: &str, ignored: &HashSet<String>) -> bool {
    ignored.contains(&operator.to_lowercase())
        || ignored
            .iter()
            .any(|entry| !entry.is_empty() && name_lower.contains(entry.as_str()))
}

fn names_same_store(kiosk_lower: &str, store_name: &str) -> bool {
    let store_lower = store_name.trim().to_lowercase();
    !store_lower.is_empty()
        && store_name.trim() != PlaceDetails::UNKNOWN_NAME
        && kiosk_lower.contains(&store_lower)
}

pub(crate) struct ProximityInputs<'a> {
    pub site: Coordinates,
    pub store_name: &'a str,
    pub state_code: &'a str,
    pub kiosks: &'a [NearbyKiosk],
    pub ignored_competitors: &'a HashSet<String>,
    pub proximity_rule: Option<&'a ProximityRule>,
    pub kiosk_density_rule: Option<&'a KioskDensityRule>,
    /// Separation used when no proximity rule covers the density.
    pub fallback_distance_miles: f64,
}

pub(crate) fn evaluate_proximity(inputs: &ProximityInputs<'_>) -> KioskProximity {
    let required_distance_miles = inputs
        .proximity_rule
        .map(|rule| rule.required_distance_miles(inputs.state_code))
        .unwrap_or(inputs.fallback_distance_miles);
    let max_competitors_within_one_mile = inputs
        .kiosk_density_rule
        .map(|rule| rule.max_kiosks(inputs.state_code));

    let mut bitcoin_depot_count = 0u32;
    let mut nearest_bitcoin_depot_miles: Option<f64> = None;
    let mut counts: Vec<CompetitorCount> = COMPETITORS
        .iter()
        .map(|brand| brand.name)
        .chain(std::iter::once(OTHER_OPERATOR))
        .map(|name| CompetitorCount {
            name: name.to_string(),
            count: 0,
        })
        .collect();
    let mut competitors_within_one_mile = 0u32;
    let mut same_store_competitor = false;

    for kiosk in inputs.kiosks {
        let name_lower = kiosk.name.to_lowercase();
        let distance = inputs.site.distance_miles(&kiosk.location);

        match operator_of(&name_lower) {
            Operator::Brand => {
                bitcoin_depot_count += 1;
                nearest_bitcoin_depot_miles = Some(
                    nearest_bitcoin_depot_miles.map_or(distance, |nearest| nearest.min(distance)),
                );
            }
            Operator::Competitor(operator) => {
                if is_ignored(&name_lower, operator, inputs.ignored_competitors) {
                    continue;
                }
                if let Some(entry) = counts.iter_mut().find(|entry| entry.name == operator) {
                    entry.count += 1;
                }
                if distance <= COMPETITOR_RADIUS_MILES {
                    competitors_within_one_mile += 1;
                }
                if distance <= SAME_STORE_RADIUS_MILES
                    || (distance <= SAME_STORE_NAME_RADIUS_MILES
                        && names_same_store(&name_lower, inputs.store_name))
                {
                    same_store_competitor = true;
                }
            }
        }
    }

    counts.retain(|entry| entry.count > 0);
    let total_competitors = counts.iter().map(|entry| entry.count).sum();

    let brand_too_close = nearest_bitcoin_depot_miles
        .map(|nearest| nearest < required_distance_miles)
        .unwrap_or(false);
    let over_cap = max_competitors_within_one_mile
        .map(|cap| competitors_within_one_mile > cap)
        .unwrap_or(false);

    KioskProximity {
        bitcoin_depot_count,
        nearest_bitcoin_depot_miles,
        required_distance_miles,
        competitors: counts,
        total_competitors,
        competitors_within_one_mile,
        max_competitors_within_one_mile,
        same_store_competitor,
        meets_requirement: !brand_too_close && !same_store_competitor && !over_cap,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    const SITE: Coordinates = Coordinates {
        lat: 41.5868,
        lng: -93.6250,
    };

    /// Kiosk roughly `miles` due north of the site.
    fn kiosk(name: &str, miles: f64) -> NearbyKiosk {
        NearbyKiosk {
            name: name.to_string(),
            types: vec!["finance".to_string()],
            location: Coordinates::new(SITE.lat + miles / 69.09, SITE.lng),
        }
    }

    fn proximity_rule(miles: f64) -> ProximityRule {
        ProximityRule {
            density_min: 0.0,
            density_max: 100_000.0,
            standard_distance_miles: miles,
            state_exceptions: BTreeMap::new(),
        }
    }

    fn kiosk_rule(limit: u32) -> KioskDensityRule {
        KioskDensityRule {
            density_min: 0.0,
            density_max: 100_000.0,
            standard_kiosk_limit: limit,
            state_exceptions: BTreeMap::new(),
        }
    }

    fn evaluate(
        kiosks: &[NearbyKiosk],
        proximity: Option<&ProximityRule>,
        cap: Option<&KioskDensityRule>,
        ignored: &HashSet<String>,
    ) -> KioskProximity {
        evaluate_proximity(&ProximityInputs {
            site: SITE,
            store_name: "Quick Stop",
            state_code: "IA",
            kiosks,
            ignored_competitors: ignored,
            proximity_rule: proximity,
            kiosk_density_rule: cap,
            fallback_distance_miles: 1.0,
        })
    }

    #[test]
    fn empty_area_passes() {
        let result = evaluate(&[], None, None, &HashSet::new());
        assert!(result.meets_requirement);
        assert_eq!(result.bitcoin_depot_count, 0);
        assert!(result.competitors.is_empty());
        assert_eq!(result.required_distance_miles, 1.0);
    }

    #[test]
    fn same_brand_inside_required_distance_fails() {
        let kiosks = [kiosk("Bitcoin Depot ATM", 1.2)];
        let rule = proximity_rule(1.5);
        let result = evaluate(&kiosks, Some(&rule), None, &HashSet::new());
        assert_eq!(result.bitcoin_depot_count, 1);
        let nearest = result.nearest_bitcoin_depot_miles.expect("distance recorded");
        assert!((nearest - 1.2).abs() < 0.01, "got {nearest}");
        assert!(!result.meets_requirement);
    }

    #[test]
    fn same_brand_beyond_required_distance_passes() {
        let kiosks = [kiosk("BitcoinDepot Kiosk", 2.0)];
        let rule = proximity_rule(1.5);
        let result = evaluate(&kiosks, Some(&rule), None, &HashSet::new());
        assert_eq!(result.bitcoin_depot_count, 1);
        assert!(result.meets_requirement);
    }

    #[test]
    fn state_override_changes_required_distance() {
        let kiosks = [kiosk("Bitcoin Depot", 2.0)];
        let mut rule = proximity_rule(1.5);
        rule.state_exceptions.insert("IA".to_string(), 3.0);
        let result = evaluate(&kiosks, Some(&rule), None, &HashSet::new());
        assert_eq!(result.required_distance_miles, 3.0);
        assert!(!result.meets_requirement);
    }

    #[test]
    fn competitor_cap_counts_only_within_one_mile() {
        let kiosks = [
            kiosk("CoinFlip Bitcoin ATM", 0.4),
            kiosk("Athena Bitcoin ATM", 0.8),
            kiosk("RockItCoin Bitcoin ATM", 1.6),
        ];
        let cap = kiosk_rule(2);
        let result = evaluate(&kiosks, None, Some(&cap), &HashSet::new());
        assert_eq!(result.total_competitors, 3);
        assert_eq!(result.competitors_within_one_mile, 2);
        assert_eq!(result.max_competitors_within_one_mile, Some(2));
        assert!(result.meets_requirement);

        let tighter = kiosk_rule(1);
        let result = evaluate(&kiosks, None, Some(&tighter), &HashSet::new());
        assert!(!result.meets_requirement);
    }

    #[test]
    fn competitors_are_grouped_by_operator() {
        let kiosks = [
            kiosk("CoinFlip Bitcoin ATM", 0.4),
            kiosk("Coin Flip ATM", 0.5),
            kiosk("Bitcoin ATM Des Moines - Coinhub", 0.6),
        ];
        let result = evaluate(&kiosks, None, None, &HashSet::new());
        assert_eq!(
            result.competitors,
            vec![
                CompetitorCount {
                    name: "CoinFlip".to_string(),
                    count: 2
                },
                CompetitorCount {
                    name: "Other".to_string(),
                    count: 1
                },
            ]
        );
        assert_eq!(result.total_competitors, 3);
    }

    #[test]
    fn short_keywords_match_whole_words_only() {
        assert_eq!(
            operator_of("boa bitcoin atm"),
            Operator::Competitor("Bitcoin of America")
        );
        assert_eq!(
            operator_of("boardwalk bitcoin atm"),
            Operator::Competitor(OTHER_OPERATOR)
        );
    }

    #[test]
    fn ignored_competitors_are_not_counted() {
        let kiosks = [kiosk("LibertyX Bitcoin ATM", 0.2), kiosk("CoinFlip", 0.2)];
        let ignored: HashSet<String> = ["libertyx".to_string()].into_iter().collect();
        let cap = kiosk_rule(1);
        let result = evaluate(&kiosks, None, Some(&cap), &ignored);
        assert_eq!(result.total_competitors, 1);
        assert_eq!(result.competitors_within_one_mile, 1);
        assert!(result.meets_requirement);
    }

    #[test]
    fn competitor_inside_the_store_fails() {
        let kiosks = [kiosk("CoinFlip Bitcoin ATM", 0.01)];
        let result = evaluate(&kiosks, None, None, &HashSet::new());
        assert!(result.same_store_competitor);
        assert!(!result.meets_requirement);

        let named = [kiosk("Coinhub Bitcoin ATM - Quick Stop", 0.3)];
        let result = evaluate(&named, None, None, &HashSet::new());
        assert!(result.same_store_competitor);
    }

    #[test]
    fn same_chain_kiosk_at_another_branch_is_not_in_store() {
        let kiosks = [kiosk("CoinFlip Bitcoin ATM - Quick Stop", 6.0)];
        let result = evaluate(&kiosks, None, None, &HashSet::new());
        assert!(!result.same_store_competitor);
        assert!(result.meets_requirement);
        assert_eq!(result.total_competitors, 1);
        assert_eq!(result.competitors_within_one_mile, 0);
    }

    #[test]
    fn placeholder_store_name_never_matches() {
        assert!(!names_same_store("unknown business atm", "Unknown Business"));
        assert!(!names_same_store("any kiosk", "  "));
    }
}
