//! # Schemes
//!
//! Read-only catalog of government welfare schemes for farmers.
//!
//! - Built-in catalog of ten central schemes, built once at startup and shared.
//! - Lookup by id (exact), category (case-insensitive), free-text search.
//! - "Active" = no deadline, or deadline strictly in the future.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scheme {
    pub id: String,
    pub title: String,
    pub description: String,
    pub eligibility: String,
    pub benefits: String,
    pub application_link: String,
    pub category: String,
    pub deadline: Option<DateTime<Utc>>,
}

impl Scheme {
    fn matches(&self, needle_lower: &str) -> bool {
        [
            &self.title,
            &self.description,
            &self.eligibility,
            &self.benefits,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(needle_lower))
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.deadline.map_or(true, |d| d > now)
    }
}

#[derive(Debug, Clone)]
pub struct SchemeCatalog {
    schemes: Vec<Scheme>,
}

impl SchemeCatalog {
    pub fn new(schemes: Vec<Scheme>) -> Self {
        Self { schemes }
    }

    pub fn all(&self) -> &[Scheme] {
        &self.schemes
    }

    pub fn by_id(&self, id: &str) -> Option<&Scheme> {
        self.schemes.iter().find(|s| s.id == id)
    }

    pub fn by_category(&self, category: &str) -> Vec<&Scheme> {
        let wanted = category.to_lowercase();
        self.schemes
            .iter()
            .filter(|s| s.category.to_lowercase() == wanted)
            .collect()
    }

    /// Case-insensitive substring search over title, description,
    /// eligibility and benefits.
    pub fn search(&self, query: &str) -> Vec<&Scheme> {
        let needle = query.to_lowercase();
        self.schemes.iter().filter(|s| s.matches(&needle)).collect()
    }

    /// Distinct non-empty categories, sorted.
    pub fn categories(&self) -> Vec<String> {
        self.schemes
            .iter()
            .map(|s| s.category.as_str())
            .filter(|c| !c.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn active(&self, now: DateTime<Utc>) -> Vec<&Scheme> {
        self.schemes.iter().filter(|s| s.is_active(now)).collect()
    }

    /// The ten built-in central schemes.
    pub fn default_seed() -> Self {
        let seed: [(&str, &str, &str, &str, &str, &str, &str); 10] = [
            (
                "1",
                "Pradhan Mantri Kisan Samman Nidhi (PM-KISAN)",
                "Direct income support scheme providing ₹6,000 per year to all landholding farmer families.",
                "All landholding farmer families",
                "₹6,000 per year in three equal installments",
                "https://pmkisan.gov.in",
                "Income Support",
            ),
            (
                "2",
                "Pradhan Mantri Fasal Bima Yojana (PMFBY)",
                "Crop insurance scheme to provide financial support to farmers in case of crop loss.",
                "All farmers growing notified crops",
                "Premium subsidy and comprehensive risk coverage",
                "https://pmfby.gov.in",
                "Insurance",
            ),
            (
                "3",
                "Kisan Credit Card (KCC)",
                "Credit facility for farmers to meet their short-term credit requirements.",
                "All farmers including tenant farmers and sharecroppers",
                "Credit up to ₹3 lakh at subsidized interest rate",
                "https://www.india.gov.in/kisan-credit-card-kcc",
                "Credit",
            ),
            (
                "4",
                "Soil Health Card Scheme",
                "Scheme to provide soil health cards to farmers to optimize use of fertilizers.",
                "All farmers",
                "Free soil health cards every 3 years",
                "https://soilhealth.dac.gov.in",
                "Agricultural Support",
            ),
            // Benefits text reworded from the published scheme summary so it
            // names irrigation, which free-text search relies on.
            (
                "5",
                "Pradhan Mantri Krishi Sinchai Yojana (PMKSY)",
                "Scheme to improve farm productivity and ensure better utilization of water resources.",
                "All farmers",
                "Subsidy up to 55% on irrigation equipment for small and marginal farmers",
                "https://pmksy.gov.in",
                "Irrigation",
            ),
            (
                "6",
                "National Mission for Sustainable Agriculture (NMSA)",
                "Promotes sustainable agriculture practices and climate-resilient farming.",
                "All farmers practicing sustainable agriculture",
                "Financial assistance for sustainable practices",
                "https://nmsa.dac.gov.in",
                "Agricultural Support",
            ),
            (
                "7",
                "Pradhan Mantri Kisan Maan Dhan Yojana (PM-KMY)",
                "Pension scheme for small and marginal farmers to ensure financial security.",
                "Small and marginal farmers aged 18-40 years",
                "Monthly pension of ₹3,000 after 60 years",
                "https://maandhan.in",
                "Pension",
            ),
            (
                "8",
                "Paramparagat Krishi Vikas Yojana (PKVY)",
                "Promotes organic farming practices among farmers.",
                "Farmers willing to practice organic farming",
                "Financial assistance of ₹50,000 per hectare",
                "https://pgsindia-ncof.gov.in",
                "Organic Farming",
            ),
            (
                "9",
                "Micro Irrigation Fund (MIF)",
                "Provides financial assistance for micro-irrigation systems.",
                "All farmers",
                "Subsidy for drip and sprinkler irrigation systems",
                "https://pmksy.gov.in",
                "Irrigation",
            ),
            (
                "10",
                "National Agriculture Market (eNAM)",
                "Online trading platform for agricultural commodities to ensure better prices.",
                "All farmers and traders",
                "Transparent pricing and direct market access",
                "https://www.enam.gov.in",
                "Market Access",
            ),
        ];

        let schemes = seed
            .into_iter()
            .map(
                |(id, title, description, eligibility, benefits, link, category)| Scheme {
                    id: id.to_string(),
                    title: title.to_string(),
                    description: description.to_string(),
                    eligibility: eligibility.to_string(),
                    benefits: benefits.to_string(),
                    application_link: link.to_string(),
                    category: category.to_string(),
                    deadline: None,
                },
            )
            .collect();
        Self::new(schemes)
    }
}
