use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProductClass {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
    pub pathway: &'static str,
    pub notes: &'static str,
}

const CLASSES: &[ProductClass] = &[
    ProductClass {
        name: "carotenoid",
        keywords: &[
            "carotene",
            "lycopene",
            "astaxanthin",
            "zeaxanthin",
            "lutein",
            "canthaxanthin",
            "phytoene",
        ],
        pathway: "path:map00906",
        notes: "C40 tetraterpenoid; GGPP-derived, needs crtE/crtB/crtI/crtY in yeast",
    },
    ProductClass {
        name: "isoprenoid_precursor",
        keywords: &["mevalonate", "geranylgeranyl", "farnesyl", "isoprenoid", "squalene"],
        pathway: "path:map00900",
        notes: "MVA/MEP route intermediate; native in S. cerevisiae",
    },
];

/// Normalized product keyword → KEGG compound id.
const KNOWN_COMPOUNDS: &[(&str, &str)] = &[
    ("beta-carotene", "cpd:C02094"),
    ("alpha-carotene", "cpd:C05433"),
    ("gamma-carotene", "cpd:C05435"),
    ("lycopene", "cpd:C05432"),
    ("astaxanthin", "cpd:C08580"),
    ("zeaxanthin", "cpd:C06098"),
    ("lutein", "cpd:C08601"),
    ("canthaxanthin", "cpd:C08583"),
    ("phytoene", "cpd:C05421"),
    ("15-cis-phytoene", "cpd:C05421"),
    ("geranylgeranyl-diphosphate", "cpd:C00353"),
    ("farnesyl-diphosphate", "cpd:C00448"),
    ("mevalonate", "cpd:C00418"),
    ("squalene", "cpd:C00751"),
];

/// First class whose keyword occurs in the product name.
pub fn classify(product: &str) -> Option<&'static ProductClass> {
    let product = product.to_lowercase();
    CLASSES
        .iter()
        .find(|class| class.keywords.iter().any(|kw| product.contains(kw)))
}

pub fn known_compound(product: &str) -> Option<&'static str> {
    let key = normalize_keyword(product);
    KNOWN_COMPOUNDS
        .iter()
        .find(|(kw, _)| *kw == key)
        .map(|(_, id)| *id)
}

/// "β-Carotene" / "beta carotene" / "Beta_Carotene" → "beta-carotene"
pub fn normalize_keyword(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .replace('β', "beta")
        .replace('α', "alpha")
        .replace('γ', "gamma")
        .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beta_carotene_is_carotenoid() {
        let class = classify("beta-carotene").unwrap();
        assert_eq!(class.name, "carotenoid");
        assert_eq!(class.pathway, "path:map00906");
    }

    #[test]
    fn classification_is_case_insensitive() {
        assert_eq!(classify("Astaxanthin").map(|c| c.name), Some("carotenoid"));
        assert_eq!(classify("SQUALENE").map(|c| c.name), Some("isoprenoid_precursor"));
    }

    #[test]
    fn unknown_product() {
        assert!(classify("ethanol").is_none());
    }

    #[test]
    fn keyword_normalization() {
        assert_eq!(normalize_keyword("β-Carotene"), "beta-carotene");
        assert_eq!(normalize_keyword("  beta  carotene "), "beta-carotene");
        assert_eq!(normalize_keyword("Beta_Carotene"), "beta-carotene");
    }

    #[test]
    fn known_compounds() {
        assert_eq!(known_compound("β-carotene"), Some("cpd:C02094"));
        assert_eq!(known_compound("Lycopene"), Some("cpd:C05432"));
        assert_eq!(known_compound("geranylgeranyl diphosphate"), Some("cpd:C00353"));
        assert_eq!(known_compound("vitamin c"), None);
    }
}
