//! Semantic type inference for a single column.
//!
//! The decision procedure is an ordered list of rules evaluated against the
//! storage kind of the column (which variants its non-null cells use) plus
//! a few column-level aggregates. The first rule that matches wins:
//!
//! 1. boolean-like values (`0`, `1`, native flags, `true`/`false` literals)
//! 2. numeric storage, identifier when nearly unique and named `*_id*`
//! 3. native dates, or text whose leading sample parses as dates
//! 4. nearly-unique text named like an id or key
//! 5. very low cardinality
//! 6. text split into long-form text or categorical by mean length
//!
//! The unique ratio always divides by the full row count, so missing cells
//! lower it even when no value repeats.

use std::fmt;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::data::Value;
use crate::dataset::Column;
use crate::error::ProfileError;

pub const DEFAULT_IDENTIFIER_UNIQUE_RATIO: f64 = 0.95;
pub const DEFAULT_CATEGORICAL_UNIQUE_RATIO: f64 = 0.05;
pub const DEFAULT_TEXT_MEAN_LENGTH: f64 = 50.0;
pub const DEFAULT_DATE_SAMPLE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    Numeric,
    Categorical,
    Datetime,
    Text,
    Boolean,
    Identifier,
    Unknown,
}

impl SemanticType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticType::Numeric => "numeric",
            SemanticType::Categorical => "categorical",
            SemanticType::Datetime => "datetime",
            SemanticType::Text => "text",
            SemanticType::Boolean => "boolean",
            SemanticType::Identifier => "identifier",
            SemanticType::Unknown => "unknown",
        }
    }

    pub fn variants() -> &'static [SemanticType] {
        &[
            SemanticType::Numeric,
            SemanticType::Categorical,
            SemanticType::Datetime,
            SemanticType::Text,
            SemanticType::Boolean,
            SemanticType::Identifier,
            SemanticType::Unknown,
        ]
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thresholds driving the decision procedure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Unique ratio above which a suitably named column is an identifier.
    pub identifier_unique_ratio: f64,
    /// Unique ratio below which any remaining column is categorical.
    pub categorical_unique_ratio: f64,
    /// Mean character length above which text is free-form.
    pub text_mean_length: f64,
    /// Leading non-null values that must all parse for text to count as dates.
    pub date_sample_size: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            identifier_unique_ratio: DEFAULT_IDENTIFIER_UNIQUE_RATIO,
            categorical_unique_ratio: DEFAULT_CATEGORICAL_UNIQUE_RATIO,
            text_mean_length: DEFAULT_TEXT_MEAN_LENGTH,
            date_sample_size: DEFAULT_DATE_SAMPLE_SIZE,
        }
    }
}

/// Which cell variants the non-null values of a column use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StorageKind {
    Empty,
    Boolean,
    Numeric,
    Datetime,
    Textual,
}

impl StorageKind {
    fn of(column: &Column) -> Self {
        let mut kind = StorageKind::Empty;
        for value in column.non_null() {
            let current = match value {
                Value::Boolean(_) => StorageKind::Boolean,
                Value::Number(_) => StorageKind::Numeric,
                Value::Date(_) => StorageKind::Datetime,
                Value::Text(_) => return StorageKind::Textual,
            };
            if kind == StorageKind::Empty {
                kind = current;
            } else if kind != current {
                return StorageKind::Textual;
            }
        }
        kind
    }
}

pub fn unique_ratio(distinct: usize, row_count: usize) -> f64 {
    if row_count == 0 {
        0.0
    } else {
        distinct as f64 / row_count as f64
    }
}

/// Classifies a column, falling back to [`SemanticType::Unknown`] when the
/// column cannot be inspected.
pub fn classify_column(column: &Column, row_count: usize, config: &ClassifierConfig) -> SemanticType {
    match try_classify(column, row_count, config) {
        Ok(semantic_type) => semantic_type,
        Err(err) => {
            warn!("Treating column '{}' as unknown: {err}", column.name());
            SemanticType::Unknown
        }
    }
}

pub fn try_classify(
    column: &Column,
    row_count: usize,
    config: &ClassifierConfig,
) -> Result<SemanticType, ProfileError> {
    classify_counted(column, column.distinct_count(), row_count, config)
}

/// Same as [`try_classify`] with the distinct count supplied by the caller.
pub(crate) fn classify_counted(
    column: &Column,
    distinct: usize,
    row_count: usize,
    config: &ClassifierConfig,
) -> Result<SemanticType, ProfileError> {
    if column.len() != row_count {
        return Err(ProfileError::LengthMismatch {
            column: column.name().to_string(),
            expected: row_count,
            actual: column.len(),
        });
    }

    let kind = StorageKind::of(column);
    let ratio = unique_ratio(distinct, row_count);
    let lowered = column.name().to_lowercase();
    debug!(
        "Column '{}': storage {:?}, unique ratio {:.4}",
        column.name(),
        kind,
        ratio
    );

    if kind == StorageKind::Boolean || column.non_null().all(Value::is_boolean_like) {
        return Ok(SemanticType::Boolean);
    }

    match kind {
        StorageKind::Numeric => {
            if ratio > config.identifier_unique_ratio && lowered.contains("_id") {
                return Ok(SemanticType::Identifier);
            }
            return Ok(SemanticType::Numeric);
        }
        StorageKind::Datetime => return Ok(SemanticType::Datetime),
        StorageKind::Empty | StorageKind::Boolean | StorageKind::Textual => {}
    }

    let text_like = kind == StorageKind::Textual;
    if text_like && sample_parses_as_dates(column, config.date_sample_size) {
        return Ok(SemanticType::Datetime);
    }

    if text_like
        && ratio > config.identifier_unique_ratio
        && (lowered.contains("id") || lowered.contains("key"))
    {
        return Ok(SemanticType::Identifier);
    }

    if ratio < config.categorical_unique_ratio {
        return Ok(SemanticType::Categorical);
    }

    if text_like {
        if mean_char_length(column) > config.text_mean_length {
            return Ok(SemanticType::Text);
        }
        return Ok(SemanticType::Categorical);
    }

    Ok(SemanticType::Unknown)
}

fn sample_parses_as_dates(column: &Column, sample_size: usize) -> bool {
    let mut sampled = 0usize;
    for value in column.non_null().take(sample_size) {
        if value.as_datetime().is_none() {
            return false;
        }
        sampled += 1;
    }
    sampled > 0
}

fn mean_char_length(column: &Column) -> f64 {
    let (count, total) = column
        .non_null()
        .fold((0usize, 0usize), |(count, total), value| {
            (count + 1, total + value.char_len())
        });
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn classify(column: &Column) -> SemanticType {
        classify_column(column, column.len(), &ClassifierConfig::default())
    }

    #[test]
    fn numeric_column_is_numeric() {
        let column = Column::from_values("test_col", [1, 2, 3, 4, 5].map(Some));
        assert_eq!(classify(&column), SemanticType::Numeric);
    }

    #[test]
    fn zero_one_numbers_are_boolean() {
        let column = Column::from_values("flag", [0, 1, 1, 0, 1].map(Some));
        assert_eq!(classify(&column), SemanticType::Boolean);
    }

    #[test]
    fn mixed_case_literals_are_boolean() {
        let column = Column::from_values("active", [Some("TRUE"), Some("false"), None, Some("True")]);
        assert_eq!(classify(&column), SemanticType::Boolean);
    }

    #[test]
    fn all_missing_column_is_vacuously_boolean() {
        let column = Column::new("empty", vec![None, None, None]);
        assert_eq!(classify(&column), SemanticType::Boolean);
    }

    #[test]
    fn unique_numeric_id_is_identifier() {
        let column = Column::from_values("customer_id", (0..200).map(Some));
        assert_eq!(classify(&column), SemanticType::Identifier);
    }

    #[test]
    fn unique_numeric_without_id_suffix_stays_numeric() {
        let column = Column::from_values("id", (0..200).map(Some));
        assert_eq!(classify(&column), SemanticType::Numeric);
    }

    #[test]
    fn missing_cells_lower_the_unique_ratio() {
        // 90 distinct values over 100 rows: ratio 0.9, below the identifier bar.
        let values = (0..100).map(|i| if i < 90 { Some(i + 10) } else { None });
        let column = Column::from_values("order_id", values);
        assert_eq!(classify(&column), SemanticType::Numeric);
    }

    #[test]
    fn native_dates_are_datetime() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let column = Column::from_values(
            "date",
            (0..100).map(|offset| Some(start + chrono::Days::new(offset))),
        );
        assert_eq!(classify(&column), SemanticType::Datetime);
    }

    #[test]
    fn date_strings_are_datetime() {
        let column = Column::from_values(
            "created",
            [Some("2024-01-05"), Some("2024-02-10 08:30:00"), None, Some("03/15/2024")],
        );
        assert_eq!(classify(&column), SemanticType::Datetime);
    }

    #[test]
    fn unique_strings_named_key_are_identifier() {
        let column = Column::from_values("lookup_key", (0..100).map(|i| Some(format!("K-{i}"))));
        assert_eq!(classify(&column), SemanticType::Identifier);
    }

    #[test]
    fn repeated_labels_are_categorical() {
        let labels = ["A", "B", "A", "C", "B"];
        let column = Column::from_values("category", (0..100).map(|i| Some(labels[i % 5])));
        assert_eq!(classify(&column), SemanticType::Categorical);
    }

    #[test]
    fn long_unique_strings_are_text() {
        let column = Column::from_values(
            "description",
            (0..100).map(|i| {
                Some(format!(
                    "This is a unique long text description with many words number {i} and lots of content"
                ))
            }),
        );
        assert_eq!(classify(&column), SemanticType::Text);
    }

    #[test]
    fn short_unique_strings_are_categorical() {
        let column = Column::from_values("city", (0..100).map(|i| Some(format!("city-{i}"))));
        assert_eq!(classify(&column), SemanticType::Categorical);
    }

    #[test]
    fn mixed_numbers_and_text_are_treated_as_text() {
        let values = (0..100).map(|i| {
            if i % 2 == 0 {
                Some(Value::Number(f64::from(i)))
            } else {
                Some(Value::Text(format!("code-{i}")))
            }
        });
        let column = Column::new("mixed", values.collect());
        assert_eq!(classify(&column), SemanticType::Categorical);
    }

    #[test]
    fn ragged_column_falls_back_to_unknown() {
        let column = Column::from_values("short", [1, 2, 3].map(Some));
        assert_eq!(
            classify_column(&column, 5, &ClassifierConfig::default()),
            SemanticType::Unknown
        );
        assert!(matches!(
            try_classify(&column, 5, &ClassifierConfig::default()),
            Err(ProfileError::LengthMismatch { expected: 5, actual: 3, .. })
        ));
    }

    #[test]
    fn thresholds_are_configurable() {
        let labels = ["A", "B", "C", "D"];
        let column = Column::from_values("grade", (0..40).map(|i| Some(labels[i % 4])));
        let strict = ClassifierConfig {
            categorical_unique_ratio: 0.2,
            ..ClassifierConfig::default()
        };
        assert_eq!(classify_column(&column, 40, &strict), SemanticType::Categorical);
        let long_text = ClassifierConfig {
            categorical_unique_ratio: 0.0,
            text_mean_length: 0.5,
            ..ClassifierConfig::default()
        };
        assert_eq!(classify_column(&column, 40, &long_text), SemanticType::Text);
    }
}
