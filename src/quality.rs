use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::profiler::DatasetProfile;

pub const MAX_SCORE: u32 = 100;
pub const ISSUE_PENALTY: u32 = 10;
pub const WARNING_PENALTY: u32 = 2;
/// Dataset-wide missing percentage above which an issue is raised.
pub const HIGH_OVERALL_MISSING_PCT: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityStatus {
    Good,
    NeedsAttention,
}

impl QualityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityStatus::Good => "GOOD",
            QualityStatus::NeedsAttention => "NEEDS_ATTENTION",
        }
    }
}

impl fmt::Display for QualityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityReport {
    pub score: u32,
    pub status: QualityStatus,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
}

/// Derives the quality report from a finished profile. Pure: the same
/// profile always produces the same report.
pub fn score_quality(profile: &DatasetProfile) -> QualityReport {
    let mut issues = Vec::new();
    if profile.total_missing_pct > HIGH_OVERALL_MISSING_PCT {
        issues.push(format!(
            "High overall missing data: {:.1}%",
            profile.total_missing_pct
        ));
    }

    let mut warnings = profile
        .columns
        .iter()
        .flat_map(|column| {
            column
                .quality_issues
                .iter()
                .map(move |issue| format!("{}: {issue}", column.name))
        })
        .collect::<Vec<_>>();
    let constant = profile.constant_columns();
    if !constant.is_empty() {
        warnings.push(format!(
            "Constant columns (no variation): {}",
            constant.join(", ")
        ));
    }

    let penalty = ISSUE_PENALTY
        .saturating_mul(count(&issues))
        .saturating_add(WARNING_PENALTY.saturating_mul(count(&warnings)));
    let score = MAX_SCORE.saturating_sub(penalty);
    let status = if issues.is_empty() {
        QualityStatus::Good
    } else {
        QualityStatus::NeedsAttention
    };
    debug!(
        "Quality score {score} ({status}): {} issue(s), {} warning(s)",
        issues.len(),
        warnings.len()
    );

    QualityReport {
        score,
        status,
        issues,
        warnings,
    }
}

fn count(items: &[String]) -> u32 {
    u32::try_from(items.len()).unwrap_or(u32::MAX)
}
