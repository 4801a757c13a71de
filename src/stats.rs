use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDateTime;
use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    classify::{self, ClassifierConfig, SemanticType},
    data::{DistinctKey, Value},
    dataset::{Column, is_missing_cell},
    error::ProfileError,
};

/// Closed vocabulary of column-level quality tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityIssue {
    HighMissingData,
    ModerateMissingData,
    ManyOutliers,
    ConstantValue,
    HighCardinality,
    ProfileError,
}

impl QualityIssue {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityIssue::HighMissingData => "HIGH_MISSING_DATA",
            QualityIssue::ModerateMissingData => "MODERATE_MISSING_DATA",
            QualityIssue::ManyOutliers => "MANY_OUTLIERS",
            QualityIssue::ConstantValue => "CONSTANT_VALUE",
            QualityIssue::HighCardinality => "HIGH_CARDINALITY",
            QualityIssue::ProfileError => "PROFILE_ERROR",
        }
    }
}

impl fmt::Display for QualityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thresholds for statistics and issue tagging. Percentages are 0-100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsConfig {
    pub outlier_iqr_multiplier: f64,
    pub min_outlier_sample: usize,
    pub many_outliers_pct: f64,
    pub high_missing_pct: f64,
    pub moderate_missing_pct: f64,
    pub high_cardinality: usize,
    pub top_values: usize,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            outlier_iqr_multiplier: 1.5,
            min_outlier_sample: 4,
            many_outliers_pct: 5.0,
            high_missing_pct: 50.0,
            moderate_missing_pct: 20.0,
            high_cardinality: 100,
            top_values: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericStats {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std_dev: Option<f64>,
    pub zero_count: usize,
    pub negative_count: usize,
    pub outlier_count: usize,
    pub outlier_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueFrequency {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalStats {
    pub top_values: Vec<ValueFrequency>,
    pub most_common: Option<String>,
    pub most_common_freq: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatetimeStats {
    pub min_date: Option<NaiveDateTime>,
    pub max_date: Option<NaiveDateTime>,
    pub range_days: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStats {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub mean_length: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnStatistics {
    Numeric(NumericStats),
    Categorical(CategoricalStats),
    Datetime(DatetimeStats),
    Text(TextStats),
    CountOnly,
}

impl ColumnStatistics {
    pub fn outlier_pct(&self) -> f64 {
        match self {
            ColumnStatistics::Numeric(stats) => stats.outlier_pct,
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub semantic_type: SemanticType,
    pub count: usize,
    pub missing: usize,
    pub missing_pct: f64,
    pub unique: usize,
    pub unique_ratio: f64,
    pub statistics: ColumnStatistics,
    pub quality_issues: Vec<QualityIssue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ColumnProfile {
    /// Sentinel profile for a column whose statistics could not be computed.
    /// Counts are best-effort; rows the column does not cover count as missing.
    pub fn failed(
        column: &Column,
        row_count: usize,
        error: &ProfileError,
        config: &StatisticsConfig,
    ) -> Self {
        let covered = column.len().min(row_count);
        let missing = column.values()[..covered]
            .iter()
            .filter(|cell| is_missing_cell(cell))
            .count()
            + (row_count - covered);
        let unique = column.distinct_count();
        let missing_pct = percentage(missing, row_count);
        let mut quality_issues = base_issues(missing_pct, unique, config);
        quality_issues.push(QualityIssue::ProfileError);
        Self {
            name: column.name().to_string(),
            semantic_type: SemanticType::Unknown,
            count: row_count,
            missing,
            missing_pct,
            unique,
            unique_ratio: classify::unique_ratio(unique, row_count),
            statistics: ColumnStatistics::CountOnly,
            quality_issues,
            error: Some(error.to_string()),
        }
    }

    pub fn has_issue(&self, issue: QualityIssue) -> bool {
        self.quality_issues.contains(&issue)
    }
}

/// Classifies the column and computes its statistics and issue tags.
pub fn profile_column(
    column: &Column,
    row_count: usize,
    classifier: &ClassifierConfig,
    config: &StatisticsConfig,
) -> Result<ColumnProfile, ProfileError> {
    let unique = column.distinct_count();
    let semantic_type = classify::classify_counted(column, unique, row_count, classifier)?;
    let statistics = compute_statistics(column, semantic_type, config);

    let missing = column.missing_count();
    let missing_pct = percentage(missing, row_count);
    let mut quality_issues = base_issues(missing_pct, unique, config);
    if semantic_type == SemanticType::Numeric
        && statistics.outlier_pct() > config.many_outliers_pct
    {
        insert_ordered(&mut quality_issues, QualityIssue::ManyOutliers);
    }
    if semantic_type == SemanticType::Categorical && unique > config.high_cardinality {
        insert_ordered(&mut quality_issues, QualityIssue::HighCardinality);
    }
    debug!(
        "Profiled column '{}' as {} with issues {:?}",
        column.name(),
        semantic_type,
        quality_issues
    );

    Ok(ColumnProfile {
        name: column.name().to_string(),
        semantic_type,
        count: row_count,
        missing,
        missing_pct,
        unique,
        unique_ratio: classify::unique_ratio(unique, row_count),
        statistics,
        quality_issues,
        error: None,
    })
}

pub fn compute_statistics(
    column: &Column,
    semantic_type: SemanticType,
    config: &StatisticsConfig,
) -> ColumnStatistics {
    match semantic_type {
        SemanticType::Numeric => ColumnStatistics::Numeric(numeric_statistics(column, config)),
        SemanticType::Categorical => {
            ColumnStatistics::Categorical(categorical_statistics(column, config.top_values))
        }
        SemanticType::Datetime => ColumnStatistics::Datetime(datetime_statistics(column)),
        SemanticType::Text => ColumnStatistics::Text(text_statistics(column)),
        SemanticType::Boolean | SemanticType::Identifier | SemanticType::Unknown => {
            ColumnStatistics::CountOnly
        }
    }
}

/// Tags that apply regardless of semantic type.
fn base_issues(missing_pct: f64, unique: usize, config: &StatisticsConfig) -> Vec<QualityIssue> {
    let mut issues = Vec::new();
    if missing_pct > config.high_missing_pct {
        issues.push(QualityIssue::HighMissingData);
    } else if missing_pct > config.moderate_missing_pct {
        issues.push(QualityIssue::ModerateMissingData);
    }
    if unique == 1 {
        issues.push(QualityIssue::ConstantValue);
    }
    issues
}

fn insert_ordered(issues: &mut Vec<QualityIssue>, issue: QualityIssue) {
    let position = issues.partition_point(|existing| *existing < issue);
    issues.insert(position, issue);
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        (part as f64 / whole as f64) * 100.0
    }
}

/// Infinite values take part like any other number; `NaN` cells never reach
/// here because `non_null` treats them as missing.
fn numeric_statistics(column: &Column, config: &StatisticsConfig) -> NumericStats {
    let mut values = column.non_null().filter_map(Value::as_number).collect_vec();

    let zero_count = values.iter().filter(|value| **value == 0.0).count();
    let negative_count = values.iter().filter(|value| **value < 0.0).count();
    let mean = mean(&values);
    let std_dev = sample_std_dev(&values, mean);

    values.sort_by(f64::total_cmp);
    let outlier_count = count_outliers(&values, config);
    let outlier_pct = percentage(outlier_count, values.len());

    NumericStats {
        min: values.first().copied(),
        max: values.last().copied(),
        mean,
        median: quantile(&values, 0.5),
        std_dev,
        zero_count,
        negative_count,
        outlier_count,
        outlier_pct,
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn sample_std_dev(values: &[f64], mean: Option<f64>) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean?;
    let sum_squares = values
        .iter()
        .map(|value| (value - mean) * (value - mean))
        .sum::<f64>();
    Some((sum_squares / (values.len() as f64 - 1.0)).sqrt())
}

/// Linear interpolation between closest ranks over sorted input.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let position = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    if lower == upper {
        return Some(sorted[lower]);
    }
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Tukey's fences over sorted input. Needs a minimum sample and a
/// non-degenerate interquartile range.
fn count_outliers(sorted: &[f64], config: &StatisticsConfig) -> usize {
    if sorted.len() < config.min_outlier_sample {
        return 0;
    }
    let (Some(q1), Some(q3)) = (quantile(sorted, 0.25), quantile(sorted, 0.75)) else {
        return 0;
    };
    let iqr = q3 - q1;
    if !(iqr.is_finite() && iqr > 0.0) {
        return 0;
    }
    let lower = q1 - config.outlier_iqr_multiplier * iqr;
    let upper = q3 + config.outlier_iqr_multiplier * iqr;
    sorted
        .iter()
        .filter(|value| **value < lower || **value > upper)
        .count()
}

fn categorical_statistics(column: &Column, top: usize) -> CategoricalStats {
    let mut counts: HashMap<DistinctKey<'_>, (&Value, usize)> = HashMap::new();
    for value in column.non_null() {
        counts.entry(value.distinct_key()).or_insert((value, 0)).1 += 1;
    }
    let mut items = counts
        .into_values()
        .map(|(value, count)| ValueFrequency {
            value: value.as_display(),
            count,
        })
        .collect_vec();
    items.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    items.truncate(top);

    let (most_common, most_common_freq) = items
        .first()
        .map_or((None, 0), |first| (Some(first.value.clone()), first.count));
    CategoricalStats {
        top_values: items,
        most_common,
        most_common_freq,
    }
}

/// Values the lenient parser rejects are skipped rather than failing.
fn datetime_statistics(column: &Column) -> DatetimeStats {
    let parsed = column.non_null().filter_map(Value::as_datetime);
    match parsed.minmax().into_option() {
        Some((min, max)) => DatetimeStats {
            min_date: Some(min),
            max_date: Some(max),
            range_days: Some((max - min).num_days()),
        },
        None => DatetimeStats {
            min_date: None,
            max_date: None,
            range_days: None,
        },
    }
}

fn text_statistics(column: &Column) -> TextStats {
    let lengths = column.non_null().map(Value::char_len).collect_vec();
    let mean_length = if lengths.is_empty() {
        None
    } else {
        Some(lengths.iter().sum::<usize>() as f64 / lengths.len() as f64)
    };
    TextStats {
        min_length: lengths.iter().min().copied(),
        max_length: lengths.iter().max().copied(),
        mean_length,
    }
}
