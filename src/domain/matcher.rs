use std::collections::BTreeMap;

use log::{debug, info};

use super::library::{DomainPattern, PatternLibrary, TieBreak};
use super::DomainDetectionResult;
use crate::dataset::Dataset;

/// Score of one pattern against a set of column names.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternScore<'a> {
    pub pattern: &'a DomainPattern,
    pub score: f64,
    /// Original names of the columns that matched, in column order.
    pub matched: Vec<String>,
}

/// Scores column names against a borrowed pattern library.
#[derive(Debug, Clone, Copy)]
pub struct DomainMatcher<'a> {
    library: &'a PatternLibrary,
}

impl Default for DomainMatcher<'static> {
    fn default() -> Self {
        Self::new(PatternLibrary::builtin())
    }
}

impl<'a> DomainMatcher<'a> {
    pub fn new(library: &'a PatternLibrary) -> Self {
        Self { library }
    }

    pub fn library(&self) -> &'a PatternLibrary {
        self.library
    }

    pub fn detect(&self, dataset: &Dataset) -> DomainDetectionResult {
        let names = dataset.column_names();
        let mut result = self.detect_names(names.as_slice());
        result.row_count = dataset.row_count();
        result
    }

    /// Detection from column names alone. The row count of the result is 0.
    pub fn detect_names<S: AsRef<str>>(&self, columns: &[S]) -> DomainDetectionResult {
        let scores = self.score_all(columns);
        let all_scores = scores
            .iter()
            .map(|entry| (entry.pattern.name.clone(), entry.score))
            .collect::<BTreeMap<_, _>>();

        let Some(primary) = self.pick_primary(&scores) else {
            info!(
                "No domain keywords matched across {} column(s)",
                columns.len()
            );
            return DomainDetectionResult::unknown(all_scores, 0, columns.len());
        };

        let thresholds = self.library.thresholds();
        let secondary_domains = scores
            .iter()
            .filter(|entry| {
                entry.pattern.name != primary.pattern.name
                    && entry.score >= thresholds.secondary_threshold
            })
            .map(|entry| entry.pattern.name.clone())
            .collect::<Vec<_>>();
        info!(
            "Detected domain '{}' with confidence {:.3} ({} secondary)",
            primary.pattern.name,
            primary.score,
            secondary_domains.len()
        );

        DomainDetectionResult {
            primary_domain: primary.pattern.name.clone(),
            confidence: primary.score,
            all_scores,
            secondary_domains,
            recommendations: primary.pattern.recommendations_for(&primary.matched),
            detected_entities: primary.matched.clone(),
            row_count: 0,
            column_count: columns.len(),
        }
    }

    /// One entry per pattern, in declaration order.
    pub fn score_all<S: AsRef<str>>(&self, columns: &[S]) -> Vec<PatternScore<'a>> {
        let lowered = columns
            .iter()
            .map(|column| column.as_ref().to_lowercase())
            .collect::<Vec<_>>();
        self.library
            .patterns()
            .iter()
            .map(|pattern| {
                let matched = columns
                    .iter()
                    .zip(&lowered)
                    .filter(|(_, lower)| pattern.matching_keyword(lower).is_some())
                    .map(|(original, _)| original.as_ref().to_string())
                    .collect::<Vec<_>>();
                let score = self.score(pattern, matched.len(), columns.len());
                debug!(
                    "Pattern '{}' matched {}/{} column(s), score {:.3}",
                    pattern.name,
                    matched.len(),
                    columns.len(),
                    score
                );
                PatternScore {
                    pattern,
                    score,
                    matched,
                }
            })
            .collect()
    }

    fn score(&self, pattern: &DomainPattern, matched: usize, total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }
        let thresholds = self.library.thresholds();
        let ratio = matched as f64 / total as f64;
        let mut score = ratio;
        if ratio > thresholds.boost_ratio {
            score *= thresholds.boost_multiplier;
        }
        (score * pattern.weight).clamp(0.0, 1.0)
    }

    fn pick_primary<'s>(&self, scores: &'s [PatternScore<'a>]) -> Option<&'s PatternScore<'a>> {
        let best = scores.iter().map(|entry| entry.score).fold(0.0, f64::max);
        if best <= 0.0 {
            return None;
        }
        let mut tied = scores.iter().filter(|entry| entry.score == best);
        match self.library.tie_break() {
            TieBreak::FirstDeclared => tied.next(),
            TieBreak::LastDeclared => tied.last(),
            TieBreak::Alphabetical => tied.min_by(|a, b| a.pattern.name.cmp(&b.pattern.name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UNKNOWN_DOMAIN;
    use crate::domain::library::MatchThresholds;

    fn library(tie_break: TieBreak) -> PatternLibrary {
        PatternLibrary::new(
            vec![
                DomainPattern::new("zeta", ["alpha"]),
                DomainPattern::new("beta", ["bravo"]),
                DomainPattern::new("gamma", ["charlie"]).with_weight(0.5),
            ],
            MatchThresholds::default(),
            TieBreak::default(),
        )
        .expect("valid library")
        .with_tie_break(tie_break)
    }

    #[test]
    fn scoring_boosts_strong_matches_and_clamps() {
        let library = library(TieBreak::FirstDeclared);
        let matcher = DomainMatcher::new(&library);
        let scores = matcher.score_all(&["alpha_1", "alpha_2", "other"]);
        // 2/3 exceeds the boost ratio: 0.667 * 1.2 = 0.8
        assert!((scores[0].score - 0.8).abs() < 1e-12);
        assert_eq!(scores[0].matched, vec!["alpha_1", "alpha_2"]);

        let scores = matcher.score_all(&["alpha"]);
        assert_eq!(scores[0].score, 1.0);

        let scores = matcher.score_all(&["charlie", "x"]);
        // exactly half is not boosted, then halved by the weight
        assert_eq!(scores[2].score, 0.25);
    }

    #[test]
    fn column_counts_once_even_with_several_keywords() {
        let library = PatternLibrary::new(
            vec![DomainPattern::new("sales", ["order", "price"])],
            MatchThresholds::default(),
            TieBreak::default(),
        )
        .expect("valid library");
        let scores = DomainMatcher::new(&library).score_all(&["order_price", "note", "memo"]);
        assert_eq!(scores[0].matched.len(), 1);
        assert!((scores[0].score - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn tie_break_policy_is_configurable() {
        let columns = ["alpha", "bravo"];
        let first = library(TieBreak::FirstDeclared);
        assert_eq!(DomainMatcher::new(&first).detect_names(&columns).primary_domain, "zeta");
        let last = library(TieBreak::LastDeclared);
        assert_eq!(DomainMatcher::new(&last).detect_names(&columns).primary_domain, "beta");
        let alphabetical = library(TieBreak::Alphabetical);
        assert_eq!(
            DomainMatcher::new(&alphabetical).detect_names(&columns).primary_domain,
            "beta"
        );
    }

    #[test]
    fn secondary_domains_use_threshold_and_exclude_primary() {
        let library = library(TieBreak::FirstDeclared);
        let result = DomainMatcher::new(&library).detect_names(&[
            "alpha", "alpha_2", "alpha_3", "bravo", "x", "y", "z", "w",
        ]);
        assert_eq!(result.primary_domain, "zeta");
        assert_eq!(result.confidence, 3.0 / 8.0);
        assert_eq!(result.all_scores.get("beta"), Some(&0.125));
        assert!(result.secondary_domains.is_empty());

        let result = DomainMatcher::new(&library).detect_names(&["alpha", "alpha_2", "bravo", "x"]);
        assert_eq!(result.secondary_domains, vec!["beta"]);
    }

    #[test]
    fn no_match_returns_unknown() {
        let library = library(TieBreak::FirstDeclared);
        let result = DomainMatcher::new(&library).detect_names(&["foo", "bar"]);
        assert!(result.is_unknown());
        assert_eq!(result.primary_domain, UNKNOWN_DOMAIN);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.column_count, 2);
        assert_eq!(result.all_scores.len(), 3);
        assert!(result.all_scores.values().all(|score| *score == 0.0));
        assert!(result.detected_entities.is_empty());
        assert!(result.recommendations.is_empty());
    }
}
