//! Dataset-level aggregation of column profiles.
//!
//! Columns are profiled independently on the rayon pool; the fan-in keeps
//! dataset column order and downgrades any column that failed to an
//! `Unknown` profile tagged `PROFILE_ERROR`. Aggregates (missing cells,
//! memory estimate, type distribution, correlations) are computed once all
//! column results are in.

use std::collections::BTreeMap;
use std::fmt;

use itertools::Itertools;
use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    classify::SemanticType,
    config::ProfilerConfig,
    data::Value,
    dataset::{Column, Dataset},
    error::{AnalysisError, ProfileError},
    stats::{self, ColumnProfile},
};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
const PAIR_SEPARATOR: &str = " vs ";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub row_count: usize,
    pub column_count: usize,
    pub memory_bytes: usize,
    pub memory_mb: f64,
    pub total_missing: usize,
    pub total_missing_pct: f64,
    pub columns: Vec<ColumnProfile>,
    pub type_summary: BTreeMap<SemanticType, usize>,
    pub correlations: CorrelationMap,
}

impl DatasetProfile {
    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn constant_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|column| column.unique == 1)
            .map(|column| column.name.as_str())
            .collect()
    }
}

/// Unordered pair of column names. `(a, b)` and `(b, a)` are the same key;
/// names are stored in lexical order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnPair {
    first: String,
    second: String,
}

impl ColumnPair {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        let (a, b) = (a.into(), b.into());
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn second(&self) -> &str {
        &self.second
    }
}

impl fmt::Display for ColumnPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{PAIR_SEPARATOR}{}", self.first, self.second)
    }
}

impl Serialize for ColumnPair {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ColumnPair {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        let (a, b) = raw.split_once(PAIR_SEPARATOR).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "column pair '{raw}' must look like '<a>{PAIR_SEPARATOR}<b>'"
            ))
        })?;
        Ok(ColumnPair::new(a, b))
    }
}

/// Strongly correlated numeric column pairs with their Pearson coefficient.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationMap(BTreeMap<ColumnPair, f64>);

impl CorrelationMap {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        self.0.get(&ColumnPair::new(a, b)).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ColumnPair, f64)> + '_ {
        self.0.iter().map(|(pair, coefficient)| (pair, *coefficient))
    }

    fn insert(&mut self, pair: ColumnPair, coefficient: f64) {
        self.0.insert(pair, coefficient);
    }
}

#[derive(Debug, Clone, Default)]
pub struct Profiler {
    config: ProfilerConfig,
}

impl Profiler {
    pub fn new(config: ProfilerConfig) -> Self {
        Self { config }
    }

    pub fn profile(&self, dataset: &Dataset) -> Result<DatasetProfile, AnalysisError> {
        dataset.ensure_not_empty()?;
        let row_count = dataset.row_count();
        let column_count = dataset.column_count();
        info!("Profiling dataset: {row_count} row(s) x {column_count} column(s)");

        let outcomes: Vec<Result<ColumnProfile, ProfileError>> = dataset
            .columns()
            .par_iter()
            .map(|column| {
                stats::profile_column(
                    column,
                    row_count,
                    &self.config.classifier,
                    &self.config.statistics,
                )
            })
            .collect();
        let columns = outcomes
            .into_iter()
            .zip(dataset.columns())
            .map(|(outcome, column)| self.settle(outcome, column, row_count))
            .collect_vec();

        let total_missing = columns.iter().map(|column| column.missing).sum::<usize>();
        let total_cells = row_count * column_count;
        let total_missing_pct = (total_missing as f64 / total_cells as f64) * 100.0;
        let memory_bytes = dataset.columns().iter().map(Column::estimated_size).sum::<usize>();

        let mut type_summary = BTreeMap::new();
        for column in &columns {
            *type_summary.entry(column.semantic_type).or_insert(0) += 1;
        }

        let correlations = correlate(dataset, &columns, self.config.correlation_threshold);
        info!(
            "Profiled {} column(s): {:.1}% missing, {} strong correlation(s)",
            column_count,
            total_missing_pct,
            correlations.len()
        );

        Ok(DatasetProfile {
            row_count,
            column_count,
            memory_bytes,
            memory_mb: memory_bytes as f64 / BYTES_PER_MB,
            total_missing,
            total_missing_pct,
            columns,
            type_summary,
            correlations,
        })
    }

    fn settle(
        &self,
        outcome: Result<ColumnProfile, ProfileError>,
        column: &Column,
        row_count: usize,
    ) -> ColumnProfile {
        outcome.unwrap_or_else(|err| {
            warn!("Column '{}' downgraded to unknown: {err}", column.name());
            ColumnProfile::failed(column, row_count, &err, &self.config.statistics)
        })
    }
}

/// Profiles a dataset with the default thresholds.
pub fn profile(dataset: &Dataset) -> Result<DatasetProfile, AnalysisError> {
    Profiler::default().profile(dataset)
}

fn correlate(dataset: &Dataset, profiles: &[ColumnProfile], threshold: f64) -> CorrelationMap {
    let numeric = dataset
        .columns()
        .iter()
        .zip(profiles)
        .filter(|(_, profile)| profile.semantic_type == SemanticType::Numeric)
        .map(|(column, _)| column)
        .collect_vec();

    let mut correlations = CorrelationMap::default();
    for (left, right) in numeric.iter().tuple_combinations() {
        if let Some(coefficient) = pearson(left.values(), right.values())
            && coefficient.abs() > threshold
        {
            correlations.insert(ColumnPair::new(left.name(), right.name()), coefficient);
        }
    }
    correlations
}

/// Pearson coefficient over the rows where both cells hold finite numbers.
/// `None` when fewer than two such rows exist or either side is constant.
pub fn pearson(left: &[Option<Value>], right: &[Option<Value>]) -> Option<f64> {
    let pairs = left
        .iter()
        .zip(right)
        .filter_map(|(a, b)| {
            let x = a.as_ref()?.as_number()?;
            let y = b.as_ref()?.as_number()?;
            (x.is_finite() && y.is_finite()).then_some((x, y))
        })
        .collect_vec();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::QualityIssue;

    fn numbers(name: &str, values: impl IntoIterator<Item = f64>) -> Column {
        Column::from_values(name, values.into_iter().map(Some))
    }

    #[test]
    fn profile_aggregates_counts_and_types() {
        let dataset = Dataset::new(vec![
            numbers("id", (0..100).map(f64::from)),
            Column::from_values("category", (0..100).map(|i| Some(["A", "B", "C"][i % 3]))),
            numbers("value", (0..100).map(|i| f64::from(i % 7) * 1.5)),
            Column::from_values("flag", (0..100).map(|i| Some(i % 2 == 0))),
        ]);
        let profile = profile(&dataset).expect("profile");
        assert_eq!(profile.row_count, 100);
        assert_eq!(profile.column_count, 4);
        assert_eq!(profile.columns.len(), 4);
        assert_eq!(profile.type_summary.values().sum::<usize>(), 4);
        assert_eq!(profile.type_summary.get(&SemanticType::Boolean), Some(&1));
        assert_eq!(profile.type_summary.get(&SemanticType::Categorical), Some(&1));
        assert!(profile.memory_bytes > 0);
        assert!(profile.memory_mb > 0.0);
    }

    #[test]
    fn total_missing_is_a_share_of_all_cells() {
        let dataset = Dataset::new(vec![
            Column::from_values("a", [Some(1.5), None, Some(2.5), None]),
            numbers("b", [1.0, 2.0, 3.0, 4.0]),
        ]);
        let profile = profile(&dataset).expect("profile");
        assert_eq!(profile.total_missing, 2);
        assert_eq!(profile.total_missing_pct, 25.0);
    }

    #[test]
    fn perfectly_correlated_columns_are_reported() {
        let dataset = Dataset::new(vec![
            numbers("x", (0..50).map(|i| f64::from(i) + 2.0)),
            numbers("y", (0..50).map(|i| f64::from(i) * 3.0 + 7.0)),
            numbers("noise", (0..50).map(|i| f64::from((i * 37) % 11))),
        ]);
        let profile = profile(&dataset).expect("profile");
        let coefficient = profile.correlations.get("y", "x").expect("x/y pair");
        assert!(coefficient > 0.7);
        assert!((coefficient - 1.0).abs() < 1e-9);
        assert_eq!(profile.correlations.get("noise", "x"), None);
        assert_eq!(profile.correlations.len(), 1);
    }

    #[test]
    fn single_numeric_column_has_no_correlations() {
        let dataset = Dataset::new(vec![
            numbers("x", (0..20).map(f64::from)),
            Column::from_values("label", (0..20).map(|i| Some(format!("row {i}")))),
        ]);
        let profile = profile(&dataset).expect("profile");
        assert!(profile.correlations.is_empty());
    }

    #[test]
    fn failing_column_does_not_abort_the_batch() {
        let dataset = Dataset::with_row_count(
            4,
            vec![
                numbers("good", [3.0, 9.0, 4.0, 12.0]),
                numbers("short", [1.0, 2.0]),
                numbers("long", [1.0, 2.0, 3.0, 4.0, 5.0]),
            ],
        );
        let profile = profile(&dataset).expect("profile");
        assert_eq!(profile.columns.len(), 3);
        assert_eq!(profile.columns[0].semantic_type, SemanticType::Numeric);
        for name in ["short", "long"] {
            let column = profile.column(name).expect("column present");
            assert_eq!(column.semantic_type, SemanticType::Unknown);
            assert!(column.has_issue(QualityIssue::ProfileError));
        }
        assert_eq!(profile.type_summary.get(&SemanticType::Unknown), Some(&2));
    }

    #[test]
    fn non_finite_cells_keep_the_column_numeric() {
        let mut with_nan = (1..=20_i32).map(f64::from).collect_vec();
        with_nan[5] = f64::NAN;
        let mut with_inf = (1..=20_i32).map(f64::from).collect_vec();
        with_inf[9] = f64::INFINITY;
        let dataset = Dataset::new(vec![
            numbers("nan_cells", with_nan),
            numbers("inf_cells", with_inf),
        ]);
        let profile = profile(&dataset).expect("profile");

        let nan_cells = profile.column("nan_cells").expect("column present");
        assert_eq!(nan_cells.semantic_type, SemanticType::Numeric);
        assert_eq!(nan_cells.missing, 1);
        assert!(nan_cells.quality_issues.is_empty());

        let inf_cells = profile.column("inf_cells").expect("column present");
        assert_eq!(inf_cells.semantic_type, SemanticType::Numeric);
        assert!(!inf_cells.has_issue(QualityIssue::ProfileError));
        assert_eq!(profile.total_missing, 1);
        assert_eq!(crate::quality::score_quality(&profile).score, 100);
    }

    #[test]
    fn empty_dataset_is_fatal() {
        let err = profile(&Dataset::new(Vec::new())).unwrap_err();
        assert_eq!(err, AnalysisError::EmptyDataset { rows: 0, columns: 0 });
    }

    #[test]
    fn column_pair_is_unordered_and_serializes_as_text() {
        let pair = ColumnPair::new("b", "a");
        assert_eq!(pair, ColumnPair::new("a", "b"));
        assert_eq!((pair.first(), pair.second()), ("a", "b"));
        let mut map = CorrelationMap::default();
        map.insert(ColumnPair::new("price", "cost"), 0.93);
        let json = serde_json::to_string(&map).expect("serialize");
        assert_eq!(json, r#"{"cost vs price":0.93}"#);
        let back: CorrelationMap = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, map);
    }

    #[test]
    fn pearson_skips_incomplete_rows_and_constant_sides() {
        let left = vec![Some(Value::Number(1.0)), None, Some(Value::Number(3.0)), Some(Value::Number(5.0))];
        let right = vec![Some(Value::Number(2.0)), Some(Value::Number(9.0)), Some(Value::Number(6.0)), Some(Value::Number(10.0))];
        let r = pearson(&left, &right).expect("coefficient");
        assert!((r - 1.0).abs() < 1e-12);

        let flat = vec![Some(Value::Number(4.0)); 4];
        assert_eq!(pearson(&left, &flat), None);
    }
}
