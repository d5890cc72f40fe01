use super::domain::{BusinessTier, BusinessType};

const TIER_1_TYPES: [&str; 4] = [
    "supermarket",
    "grocery_or_supermarket",
    "grocery",
    "convenience_store",
];

const TIER_2_TYPES: [&str; 21] = [
    "liquor_store",
    "store",
    "pharmacy",
    "drugstore",
    "casino",
    "hotel",
    "lodging",
    "jewelry_store",
    "shopping_mall",
    "restaurant",
    "cafe",
    "meal_takeaway",
    "meal_delivery",
    "laundry",
    "car_repair",
    "hardware_store",
    "sporting_goods_store",
    "clothing_store",
    "shoe_store",
    "electronics_store",
    "home_goods_store",
];

const TIER_2_KEYWORDS: [&str; 17] = [
    "smoke",
    "wireless",
    "cell phone",
    "check cashing",
    "money transfer",
    "pawn",
    "dollar",
    "discount",
    "gun",
    "fast food",
    "deli",
    "auto",
    "bowling",
    "thrift",
    "shipping",
    "sneaker",
    "bingo",
];

const MAX_DETECTED_TYPES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Classification {
    pub tier: BusinessTier,
    pub category: String,
}

/// First match wins: tier-1 types, then tier-2 name keywords, then tier-2 types.
pub(crate) fn classify(name: &str, types: &[String]) -> Classification {
    let name_lower = name.to_lowercase();
    let types_lower: Vec<String> = types.iter().map(|kind| kind.to_lowercase()).collect();
    let has_type = |wanted: &str| types_lower.iter().any(|kind| kind == wanted);

    if let Some(kind) = TIER_1_TYPES.iter().find(|kind| has_type(kind)) {
        return Classification {
            tier: BusinessTier::Tier1,
            category: format_category(kind),
        };
    }

    if let Some(keyword) = TIER_2_KEYWORDS
        .iter()
        .find(|keyword| name_lower.contains(*keyword))
    {
        return Classification {
            tier: BusinessTier::Tier2,
            category: format_category(keyword),
        };
    }

    if let Some(kind) = TIER_2_TYPES.iter().find(|kind| has_type(kind)) {
        return Classification {
            tier: BusinessTier::Tier2,
            category: format_category(kind),
        };
    }

    Classification {
        tier: BusinessTier::Unqualified,
        category: types
            .first()
            .map(|kind| format_category(kind))
            .unwrap_or_else(|| "Unknown".to_string()),
    }
}

pub(crate) fn evaluate_business(name: &str, types: &[String]) -> BusinessType {
    let Classification { tier, category } = classify(name, types);

    BusinessType {
        name: name.to_string(),
        category,
        tier,
        tier_amount: tier.incentive_amount(),
        meets_requirement: tier != BusinessTier::Unqualified,
        detected_types: types
            .iter()
            .take(MAX_DETECTED_TYPES)
            .map(|kind| format_category(kind))
            .collect(),
    }
}

/// `convenience_store` -> `Convenience Store`, `check cashing` -> `Check cashing`.
pub(crate) fn format_category(raw: &str) -> String {
    raw.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|kind| kind.to_string()).collect()
    }

    #[test]
    fn tier_one_types_win_over_everything() {
        let result = evaluate_business(
            "Smoke & Grocery Mart",
            &types(&["store", "convenience_store", "point_of_interest"]),
        );
        assert_eq!(result.tier, BusinessTier::Tier1);
        assert_eq!(result.category, "Convenience Store");
        assert_eq!(result.tier_amount, Some(300));
        assert!(result.meets_requirement);
    }

    #[test]
    fn name_keywords_outrank_tier_two_types() {
        let result = evaluate_business("Main Street Pawn", &types(&["store", "jewelry_store"]));
        assert_eq!(result.tier, BusinessTier::Tier2);
        assert_eq!(result.category, "Pawn");
        assert_eq!(result.tier_amount, Some(200));
    }

    #[test]
    fn keyword_matching_is_case_insensitive() {
        let classification = classify("FAMILY DOLLAR #1234", &[]);
        assert_eq!(classification.tier, BusinessTier::Tier2);
        assert_eq!(classification.category, "Dollar");
    }

    #[test]
    fn tier_two_types_follow_list_order() {
        let classification = classify("Corner Spot", &types(&["restaurant", "liquor_store"]));
        assert_eq!(classification.tier, BusinessTier::Tier2);
        assert_eq!(classification.category, "Liquor Store");
    }

    #[test]
    fn unmatched_business_is_unqualified_with_first_type_category() {
        let result = evaluate_business("City Library", &types(&["library", "point_of_interest"]));
        assert_eq!(result.tier, BusinessTier::Unqualified);
        assert_eq!(result.category, "Library");
        assert_eq!(result.tier_amount, None);
        assert!(!result.meets_requirement);
    }

    #[test]
    fn placeholder_business_is_unknown_category() {
        let result = evaluate_business("Unknown Business", &[]);
        assert_eq!(result.tier, BusinessTier::Unqualified);
        assert_eq!(result.category, "Unknown");
        assert!(result.detected_types.is_empty());
    }

    #[test]
    fn detected_types_are_capped_and_title_cased() {
        let result = evaluate_business(
            "Hy-Vee",
            &types(&[
                "grocery_or_supermarket",
                "supermarket",
                "pharmacy",
                "food",
                "store",
                "point_of_interest",
                "establishment",
            ]),
        );
        assert_eq!(result.detected_types.len(), 5);
        assert_eq!(result.detected_types[0], "Grocery Or Supermarket");
        // Tier-1 list order decides the category, not the place's type order.
        assert_eq!(result.category, "Supermarket");
    }
}
