use crate::CompanyType;

/// Industry/sector fragments that mark a company as manufacturing for
/// Z-score purposes. Matched case-insensitively as substrings, so "automot"
/// covers both "Automotive" and "Auto Motors".
const MANUFACTURING_KEYWORDS: &[&str] = &[
    "manufactur",
    "automot",
    "auto parts",
    "auto components",
    "chemical",
    "steel",
    "metal",
    "mining",
    "energy",
    "oil",
    "gas",
    "petroleum",
    "construction",
    "building",
    "machinery",
    "industrial",
    "aerospace",
    "defense",
    "semiconductor",
    "electronic",
    "hardware",
    "paper",
    "packaging",
    "textile",
    "apparel",
    "pharmaceutical",
    "food products",
    "beverage",
];

/// Classify a company from its industry/sector text. Pure: the same input
/// always yields the same classification. No keyword match defaults to
/// non-manufacturing, which selects the four-factor Z-score variant.
pub fn classify_company_type(sector: Option<&str>, industry: Option<&str>) -> CompanyType {
    let haystack = format!(
        "{} {}",
        sector.unwrap_or_default(),
        industry.unwrap_or_default()
    )
    .to_lowercase();

    if MANUFACTURING_KEYWORDS.iter().any(|kw| haystack.contains(kw)) {
        CompanyType::Manufacturing
    } else {
        CompanyType::NonManufacturing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manufacturing_industries() {
        assert_eq!(
            classify_company_type(Some("Consumer Cyclical"), Some("Auto Manufacturers")),
            CompanyType::Manufacturing
        );
        assert_eq!(
            classify_company_type(Some("Basic Materials"), Some("Specialty Chemicals")),
            CompanyType::Manufacturing
        );
        assert_eq!(
            classify_company_type(Some("Energy"), Some("Oil & Gas Integrated")),
            CompanyType::Manufacturing
        );
        assert_eq!(
            classify_company_type(None, Some("Steel")),
            CompanyType::Manufacturing
        );
    }

    #[test]
    fn test_non_manufacturing_default() {
        assert_eq!(
            classify_company_type(Some("Technology"), Some("Software - Application")),
            CompanyType::NonManufacturing
        );
        assert_eq!(
            classify_company_type(Some("Financial Services"), Some("Banks - Regional")),
            CompanyType::NonManufacturing
        );
        assert_eq!(classify_company_type(None, None), CompanyType::NonManufacturing);
    }

    #[test]
    fn test_classification_is_stable() {
        for _ in 0..3 {
            assert_eq!(
                classify_company_type(Some("Industrials"), Some("Aerospace & Defense")),
                CompanyType::Manufacturing
            );
        }
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(
            classify_company_type(Some("ENERGY"), None),
            CompanyType::Manufacturing
        );
        assert_eq!(
            classify_company_type(Some("energy"), None),
            CompanyType::Manufacturing
        );
    }
}
