//! Combined analysis run: profile, quality score and domain detection.

use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    config::ProfilerConfig,
    dataset::Dataset,
    domain::{DomainDetectionResult, DomainMatcher, PatternLibrary},
    error::AnalysisError,
    profiler::{DatasetProfile, Profiler},
    quality::{self, QualityReport},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub profile: DatasetProfile,
    pub quality: QualityReport,
    pub domain: DomainDetectionResult,
}

/// Runs all three analyses with the defaults and the built-in library.
pub fn analyze(dataset: &Dataset) -> Result<AnalysisReport, AnalysisError> {
    analyze_with(dataset, &ProfilerConfig::default(), PatternLibrary::builtin())
}

/// Profiling and domain matching run concurrently; the quality score is
/// derived from the finished profile.
pub fn analyze_with(
    dataset: &Dataset,
    config: &ProfilerConfig,
    library: &PatternLibrary,
) -> Result<AnalysisReport, AnalysisError> {
    dataset.ensure_not_empty()?;
    let profiler = Profiler::new(config.clone());
    let matcher = DomainMatcher::new(library);
    let (profile, domain) = rayon::join(|| profiler.profile(dataset), || matcher.detect(dataset));
    let profile = profile?;
    let quality = quality::score_quality(&profile);
    info!(
        "Analysis complete: quality {} ({}), domain '{}'",
        quality.score, quality.status, domain.primary_domain
    );
    Ok(AnalysisReport {
        profile,
        quality,
        domain,
    })
}
