use std::path::Path;

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::{classify::ClassifierConfig, stats::StatisticsConfig, yaml_provider};

pub const DEFAULT_CORRELATION_THRESHOLD: f64 = 0.7;

/// Tunable thresholds for a profiling run. Every field falls back to the
/// built-in default when omitted from a YAML override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilerConfig {
    pub classifier: ClassifierConfig,
    pub statistics: StatisticsConfig,
    /// Absolute Pearson coefficient a pair must exceed to be reported.
    pub correlation_threshold: f64,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            statistics: StatisticsConfig::default(),
            correlation_threshold: DEFAULT_CORRELATION_THRESHOLD,
        }
    }
}

impl ProfilerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let config: Self = yaml_provider::load_from_path(path)
            .with_context(|| format!("Loading profiler config from {path:?}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let ratios = [
            (
                "classifier.identifier_unique_ratio",
                self.classifier.identifier_unique_ratio,
            ),
            (
                "classifier.categorical_unique_ratio",
                self.classifier.categorical_unique_ratio,
            ),
            ("correlation_threshold", self.correlation_threshold),
        ];
        for (field, value) in ratios {
            ensure!(
                (0.0..=1.0).contains(&value),
                "'{field}' must lie within [0, 1] (got {value})"
            );
        }
        ensure!(
            self.statistics.outlier_iqr_multiplier.is_finite()
                && self.statistics.outlier_iqr_multiplier > 0.0,
            "'statistics.outlier_iqr_multiplier' must be positive (got {})",
            self.statistics.outlier_iqr_multiplier
        );
        ensure!(
            self.statistics.moderate_missing_pct <= self.statistics.high_missing_pct,
            "'statistics.moderate_missing_pct' ({}) exceeds 'statistics.high_missing_pct' ({})",
            self.statistics.moderate_missing_pct,
            self.statistics.high_missing_pct
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let yaml = "classifier:\n  text_mean_length: 80\ncorrelation_threshold: 0.9\n";
        let config: ProfilerConfig = serde_yaml::from_str(yaml).expect("parse config");
        assert_eq!(config.classifier.text_mean_length, 80.0);
        assert_eq!(config.classifier.identifier_unique_ratio, 0.95);
        assert_eq!(config.correlation_threshold, 0.9);
        assert_eq!(config.statistics, StatisticsConfig::default());
        config.validate().expect("valid config");
    }

    #[test]
    fn out_of_range_ratio_is_rejected() {
        let config = ProfilerConfig {
            correlation_threshold: 1.5,
            ..ProfilerConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("correlation_threshold"));
    }
}
