//! Weighted keyword patterns describing business domains.
//!
//! A [`PatternLibrary`] is validated once when it is built (programmatically,
//! from YAML, or the built-in set) and is read-only afterwards. Keywords are
//! stored lowercase so matching never re-normalizes them.

use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::PatternConfigError;
use crate::yaml_provider;

/// Match ratio a pattern must exceed to receive the boost.
pub const DEFAULT_BOOST_RATIO: f64 = 0.5;
pub const DEFAULT_BOOST_MULTIPLIER: f64 = 1.2;
/// Minimum score for a non-primary pattern to be listed as secondary.
pub const DEFAULT_SECONDARY_THRESHOLD: f64 = 0.15;

/// Extra recommendation emitted when any detected entity contains one of
/// the listed keywords.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecommendation {
    pub keywords: Vec<String>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainPattern {
    pub name: String,
    pub keywords: Vec<String>,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entity_recommendations: Vec<EntityRecommendation>,
}

fn default_weight() -> f64 {
    1.0
}

impl DomainPattern {
    pub fn new<I, S>(name: impl Into<String>, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            keywords: keywords.into_iter().map(Into::into).collect(),
            weight: default_weight(),
            recommendations: Vec::new(),
            entity_recommendations: Vec::new(),
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_recommendations<I, S>(mut self, recommendations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.recommendations = recommendations.into_iter().map(Into::into).collect();
        self
    }

    pub fn when_entity(mut self, keywords: &[&str], text: impl Into<String>) -> Self {
        self.entity_recommendations.push(EntityRecommendation {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            text: text.into(),
        });
        self
    }

    /// First keyword contained in the lowercased column name.
    pub fn matching_keyword(&self, lowered_column: &str) -> Option<&str> {
        self.keywords
            .iter()
            .map(String::as_str)
            .find(|keyword| lowered_column.contains(keyword))
    }

    /// Static recommendations followed by those triggered by the entities.
    pub fn recommendations_for(&self, entities: &[String]) -> Vec<String> {
        let lowered = entities.iter().map(|e| e.to_lowercase()).collect::<Vec<_>>();
        let mut out = self.recommendations.clone();
        for extra in &self.entity_recommendations {
            let triggered = lowered.iter().any(|entity| {
                extra
                    .keywords
                    .iter()
                    .any(|keyword| entity.contains(&keyword.to_lowercase()))
            });
            if triggered {
                out.push(extra.text.clone());
            }
        }
        out
    }

    fn normalize(&mut self) {
        for keyword in &mut self.keywords {
            *keyword = keyword.trim().to_lowercase();
        }
        self.keywords.retain(|keyword| !keyword.is_empty());
        let mut seen = HashSet::new();
        self.keywords.retain(|keyword| seen.insert(keyword.clone()));
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchThresholds {
    pub boost_ratio: f64,
    pub boost_multiplier: f64,
    pub secondary_threshold: f64,
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self {
            boost_ratio: DEFAULT_BOOST_RATIO,
            boost_multiplier: DEFAULT_BOOST_MULTIPLIER,
            secondary_threshold: DEFAULT_SECONDARY_THRESHOLD,
        }
    }
}

impl MatchThresholds {
    fn validate(&self) -> Result<(), PatternConfigError> {
        let fields = [
            ("boost_ratio", self.boost_ratio),
            ("boost_multiplier", self.boost_multiplier),
            ("secondary_threshold", self.secondary_threshold),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(PatternConfigError::InvalidThreshold { field, value });
            }
        }
        Ok(())
    }
}

/// How the primary domain is chosen when several patterns share the top
/// score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    #[default]
    FirstDeclared,
    LastDeclared,
    Alphabetical,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct LibraryDocument {
    patterns: Vec<DomainPattern>,
    thresholds: MatchThresholds,
    tie_break: TieBreak,
}

/// Ordered, validated set of domain patterns. Deserializing runs the same
/// validation as [`PatternLibrary::new`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternLibrary {
    patterns: Vec<DomainPattern>,
    thresholds: MatchThresholds,
    tie_break: TieBreak,
}

impl<'de> Deserialize<'de> for PatternLibrary {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let document = LibraryDocument::deserialize(deserializer)?;
        PatternLibrary::new(document.patterns, document.thresholds, document.tie_break)
            .map_err(serde::de::Error::custom)
    }
}

impl PatternLibrary {
    pub fn new(
        mut patterns: Vec<DomainPattern>,
        thresholds: MatchThresholds,
        tie_break: TieBreak,
    ) -> Result<Self, PatternConfigError> {
        if patterns.is_empty() {
            return Err(PatternConfigError::NoPatterns);
        }
        thresholds.validate()?;
        let mut names = HashSet::new();
        for (index, pattern) in patterns.iter_mut().enumerate() {
            pattern.name = pattern.name.trim().to_string();
            if pattern.name.is_empty() {
                return Err(PatternConfigError::EmptyName { index });
            }
            if !names.insert(pattern.name.clone()) {
                return Err(PatternConfigError::DuplicateName {
                    name: pattern.name.clone(),
                });
            }
            if !pattern.weight.is_finite() || pattern.weight <= 0.0 {
                return Err(PatternConfigError::NonPositiveWeight {
                    name: pattern.name.clone(),
                    weight: pattern.weight,
                });
            }
            pattern.normalize();
            if pattern.keywords.is_empty() {
                return Err(PatternConfigError::EmptyKeywords {
                    name: pattern.name.clone(),
                });
            }
        }
        Ok(Self {
            patterns,
            thresholds,
            tie_break,
        })
    }

    /// The library shipped with the crate, built on first use.
    pub fn builtin() -> &'static PatternLibrary {
        static BUILTIN: OnceLock<PatternLibrary> = OnceLock::new();
        BUILTIN.get_or_init(|| {
            PatternLibrary::new(builtin_patterns(), MatchThresholds::default(), TieBreak::default())
                .expect("built-in domain patterns are valid")
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        yaml_provider::load_from_path(path)
            .with_context(|| format!("Loading domain patterns from {path:?}"))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        yaml_provider::save_to_path(path, self)
            .with_context(|| format!("Writing domain patterns to {path:?}"))
    }

    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    pub fn patterns(&self) -> &[DomainPattern] {
        &self.patterns
    }

    pub fn pattern(&self, name: &str) -> Option<&DomainPattern> {
        self.patterns.iter().find(|pattern| pattern.name == name)
    }

    pub fn thresholds(&self) -> &MatchThresholds {
        &self.thresholds
    }

    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }
}

fn builtin_patterns() -> Vec<DomainPattern> {
    vec![
        DomainPattern::new(
            "e-commerce",
            [
                "product", "item", "sku", "catalog", "inventory", "price", "cost", "retail",
                "wholesale", "discount", "category", "brand", "manufacturer", "model", "order",
                "cart", "checkout", "purchase", "transaction", "quantity", "qty", "amount",
                "total", "subtotal", "shipping", "delivery", "fulfillment", "customer", "buyer",
                "shopper", "user", "revenue", "sales", "conversion", "commission", "rating",
                "review", "asin", "link",
            ],
        )
        .with_recommendations([
            "Track conversion rates and cart abandonment",
            "Monitor pricing consistency across products",
            "Analyze shipping times and delivery performance",
            "Check for duplicate orders or fraudulent transactions",
            "Calculate customer lifetime value (CLV)",
        ])
        .when_entity(&["price"], "Validate all prices are positive and reasonable")
        .when_entity(&["inventory", "stock"], "Monitor inventory levels and stock-outs"),
        DomainPattern::new(
            "finance",
            [
                "transaction", "payment", "transfer", "withdrawal", "deposit", "balance",
                "amount", "debit", "credit", "account", "portfolio", "investment", "loan",
                "interest", "rate", "apr", "yield", "dividend", "bank", "branch", "routing",
                "swift", "iban", "checking", "savings", "statement", "revenue", "expense",
                "profit", "loss", "equity", "asset", "liability", "cash_flow",
            ],
        )
        .with_recommendations([
            "Ensure all transactions balance (debits = credits)",
            "Check for unusual transaction patterns (fraud detection)",
            "Calculate key financial ratios and metrics",
            "Analyze cash flow trends over time",
            "Verify decimal precision for monetary amounts",
        ])
        .when_entity(&["balance"], "Monitor account balances for anomalies")
        .when_entity(&["transaction"], "Flag suspicious transaction amounts or patterns"),
        DomainPattern::new(
            "crm",
            [
                "customer", "client", "contact", "prospect", "lead", "account", "company",
                "organization", "email", "phone", "mobile", "address", "communication", "call",
                "meeting", "appointment", "interaction", "opportunity", "deal", "pipeline",
                "stage", "funnel", "quote", "proposal", "contract", "close", "score", "rating",
                "status", "priority", "segment", "lifetime_value", "ltv", "churn", "retention",
            ],
        )
        .with_recommendations([
            "Validate email formats and phone numbers",
            "Calculate lead conversion rates by stage",
            "Track deal velocity through pipeline",
            "Segment customers by behavior and value",
            "Monitor customer churn and retention rates",
        ])
        .when_entity(&["email"], "Verify email format validity")
        .when_entity(&["score", "rating"], "Analyze score distributions and trends"),
        DomainPattern::new(
            "healthcare",
            [
                "patient", "medical", "health", "clinical", "diagnosis", "symptom", "condition",
                "disease", "prescription", "medication", "drug", "dosage", "treatment",
                "procedure", "surgery", "therapy", "doctor", "physician", "nurse", "provider",
                "specialist", "practitioner", "hospital", "clinic", "ward", "department",
                "admission", "discharge", "appointment", "visit", "record", "chart", "lab",
                "test", "result", "vital", "blood_pressure", "temperature",
            ],
        )
        .with_recommendations([
            "Ensure HIPAA compliance for patient data",
            "Validate medication dosages and interactions",
            "Track appointment no-show rates",
            "Monitor lab result turnaround times",
            "Analyze patient outcomes by treatment type",
            "CRITICAL: Ensure PHI (Protected Health Information) security",
        ]),
        DomainPattern::new(
            "hr",
            [
                "employee", "staff", "worker", "personnel", "hire", "termination", "onboard",
                "offboard", "salary", "wage", "compensation", "bonus", "benefits", "payroll",
                "pay", "hourly", "annual", "department", "division", "team", "manager",
                "supervisor", "position", "title", "role", "performance", "review",
                "evaluation", "rating", "goal", "objective", "feedback", "attendance", "leave",
                "vacation", "sick", "pto", "hours", "overtime", "timesheet",
            ],
        )
        .with_recommendations([
            "Analyze salary equity across departments",
            "Calculate employee turnover rates",
            "Monitor overtime and time-off patterns",
            "Track performance review completion",
            "Identify skills gaps and training needs",
        ])
        .when_entity(
            &["salary", "compensation"],
            "Check for salary data consistency and fairness",
        ),
        DomainPattern::new(
            "logistics",
            [
                "shipment", "shipping", "delivery", "freight", "tracking", "carrier", "courier",
                "warehouse", "inventory", "stock", "storage", "bin", "location", "facility",
                "vehicle", "truck", "route", "trip", "driver", "transport", "dispatch",
                "status", "eta", "arrival", "departure", "in_transit", "delivered", "pending",
                "origin", "destination", "address", "zip", "city", "state", "country",
            ],
        )
        .with_recommendations([
            "Track on-time delivery rates",
            "Optimize route efficiency and fuel costs",
            "Monitor warehouse utilization rates",
            "Calculate average delivery times by region",
            "Analyze shipping zones and costs",
        ])
        .when_entity(&["tracking"], "Validate tracking number formats"),
        DomainPattern::new(
            "marketing",
            [
                "campaign", "marketing", "promotion", "advertisement", "ad", "creative",
                "channel", "medium", "impression", "click", "conversion", "ctr", "roi",
                "engagement", "reach", "frequency", "bounce", "email", "social", "website",
                "landing_page", "seo", "sem", "ppc", "organic", "content", "post", "article",
                "blog", "video", "image", "banner", "newsletter", "audience", "segment",
                "target", "demographic", "behavior", "persona",
            ],
        )
        .with_recommendations([
            "Calculate ROI by campaign and channel",
            "Analyze conversion rates by segment",
            "Track engagement metrics over time",
            "Optimize cost per acquisition (CPA)",
            "Identify high-performing content types",
        ])
        .when_entity(&["click", "impression"], "Calculate click-through rates (CTR)"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_library_declares_seven_domains_in_order() {
        let names = PatternLibrary::builtin()
            .patterns()
            .iter()
            .map(|pattern| pattern.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec!["e-commerce", "finance", "crm", "healthcare", "hr", "logistics", "marketing"]
        );
        assert_eq!(PatternLibrary::builtin().tie_break(), TieBreak::FirstDeclared);
    }

    #[test]
    fn keywords_are_normalized() {
        let library = PatternLibrary::new(
            vec![DomainPattern::new("retail", [" SKU ", "sku", "", "Price"])],
            MatchThresholds::default(),
            TieBreak::default(),
        )
        .expect("valid library");
        assert_eq!(library.patterns()[0].keywords, vec!["sku", "price"]);
    }

    #[test]
    fn invalid_patterns_are_rejected() {
        let build = |patterns| {
            PatternLibrary::new(patterns, MatchThresholds::default(), TieBreak::default())
        };
        assert_eq!(build(Vec::new()), Err(PatternConfigError::NoPatterns));
        assert_eq!(
            build(vec![DomainPattern::new("a", ["x"]).with_weight(0.0)]),
            Err(PatternConfigError::NonPositiveWeight {
                name: "a".to_string(),
                weight: 0.0
            })
        );
        assert!(matches!(
            build(vec![DomainPattern::new("a", ["x"]).with_weight(f64::NAN)]),
            Err(PatternConfigError::NonPositiveWeight { .. })
        ));
        assert_eq!(
            build(vec![DomainPattern::new("a", Vec::<String>::new())]),
            Err(PatternConfigError::EmptyKeywords {
                name: "a".to_string()
            })
        );
        assert_eq!(
            build(vec![
                DomainPattern::new("a", ["x"]),
                DomainPattern::new("a", ["y"])
            ]),
            Err(PatternConfigError::DuplicateName {
                name: "a".to_string()
            })
        );
        assert_eq!(
            build(vec![DomainPattern::new("  ", ["x"])]),
            Err(PatternConfigError::EmptyName { index: 0 })
        );
    }

    #[test]
    fn negative_threshold_is_rejected() {
        let thresholds = MatchThresholds {
            secondary_threshold: -0.1,
            ..MatchThresholds::default()
        };
        let err = PatternLibrary::new(
            vec![DomainPattern::new("a", ["x"])],
            thresholds,
            TieBreak::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PatternConfigError::InvalidThreshold {
                field: "secondary_threshold",
                ..
            }
        ));
    }

    #[test]
    fn yaml_library_is_validated_on_load() {
        let yaml = "tie_break: alphabetical\npatterns:\n  - name: sports\n    keywords: [Team, score]\n";
        let library: PatternLibrary = serde_yaml::from_str(yaml).expect("parse library");
        assert_eq!(library.tie_break(), TieBreak::Alphabetical);
        assert_eq!(library.patterns()[0].weight, 1.0);
        assert_eq!(library.patterns()[0].keywords, vec!["team", "score"]);
        assert_eq!(library.thresholds(), &MatchThresholds::default());

        let bad = "patterns:\n  - name: sports\n    keywords: [team]\n    weight: -2\n";
        let err = serde_yaml::from_str::<PatternLibrary>(bad).unwrap_err();
        assert!(err.to_string().contains("non-positive weight"));
    }

    #[test]
    fn builtin_library_survives_a_yaml_round_trip() {
        let yaml = yaml_provider::to_string(PatternLibrary::builtin()).expect("serialize");
        let parsed: PatternLibrary = yaml_provider::from_str(&yaml).expect("parse");
        assert_eq!(&parsed, PatternLibrary::builtin());
    }

    #[test]
    fn entity_recommendations_follow_detected_columns() {
        let pattern = PatternLibrary::builtin().pattern("e-commerce").expect("pattern");
        let recommendations = pattern.recommendations_for(&["Unit_Price".to_string()]);
        assert_eq!(recommendations.len(), 6);
        assert_eq!(
            recommendations.last().map(String::as_str),
            Some("Validate all prices are positive and reasonable")
        );
    }
}
