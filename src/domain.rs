//! Business-domain classification from column names.

pub mod library;
pub mod matcher;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;

pub use library::{
    DomainPattern, EntityRecommendation, MatchThresholds, PatternLibrary, TieBreak,
};
pub use matcher::{DomainMatcher, PatternScore};

pub const UNKNOWN_DOMAIN: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainDetectionResult {
    pub primary_domain: String,
    /// Score of the primary domain, always within `[0, 1]`.
    pub confidence: f64,
    pub all_scores: BTreeMap<String, f64>,
    pub secondary_domains: Vec<String>,
    pub detected_entities: Vec<String>,
    pub recommendations: Vec<String>,
    pub row_count: usize,
    pub column_count: usize,
}

impl DomainDetectionResult {
    pub fn unknown(all_scores: BTreeMap<String, f64>, row_count: usize, column_count: usize) -> Self {
        Self {
            primary_domain: UNKNOWN_DOMAIN.to_string(),
            confidence: 0.0,
            all_scores,
            secondary_domains: Vec::new(),
            detected_entities: Vec::new(),
            recommendations: Vec::new(),
            row_count,
            column_count,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.primary_domain == UNKNOWN_DOMAIN
    }

    pub fn score(&self, domain: &str) -> Option<f64> {
        self.all_scores.get(domain).copied()
    }
}

/// Classifies a dataset against the built-in pattern library.
pub fn detect_domain(dataset: &Dataset) -> DomainDetectionResult {
    DomainMatcher::default().detect(dataset)
}
