//! CSV adapter producing a [`Dataset`].
//!
//! Cells are read as text, then every column picks one storage
//! representation: numbers when each present cell parses as a float,
//! booleans when each is a `true`/`false` literal, text otherwise. Missing
//! markers become null cells regardless of the column's storage. Dates stay
//! text; the classifier recognises them from their content.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info};

use crate::data::Value;
use crate::dataset::{Column, Dataset};
use crate::io_utils;

/// Tokens treated as missing cells (compared after trimming, case-sensitive).
pub const MISSING_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Storage {
    Number,
    Boolean,
    Text,
}

pub fn is_missing(raw: &str) -> bool {
    MISSING_TOKENS.contains(&raw.trim())
}

fn parse_boolean(raw: &str) -> Option<bool> {
    if raw.eq_ignore_ascii_case("true") {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

pub fn load_csv(path: &Path, delimiter: Option<u8>) -> Result<Dataset> {
    let delimiter = io_utils::resolve_input_delimiter(path, delimiter);
    info!(
        "Loading '{}' with delimiter '{}'",
        path.display(),
        crate::printable_delimiter(delimiter)
    );
    let reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
    read_dataset(reader).with_context(|| format!("Reading CSV from {path:?}"))
}

pub fn read_dataset<R: Read>(mut reader: csv::Reader<R>) -> Result<Dataset> {
    let headers = reader
        .headers()
        .context("Reading header row")?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for (index, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Reading data row {}", index + 1))?;
        for (column, field) in cells.iter_mut().zip(record.iter()) {
            column.push(field.to_string());
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, raw)| build_column(name, raw))
        .collect::<Vec<_>>();
    let dataset = Dataset::new(columns);
    info!(
        "Loaded {} row(s) x {} column(s)",
        dataset.row_count(),
        dataset.column_count()
    );
    Ok(dataset)
}

fn build_column(name: String, raw: Vec<String>) -> Column {
    let storage = sniff_storage(&raw);
    debug!("Column '{name}' stored as {storage:?}");
    let values = raw
        .into_iter()
        .map(|cell| {
            if is_missing(&cell) {
                return None;
            }
            let trimmed = cell.trim();
            match storage {
                Storage::Number => trimmed.parse::<f64>().ok().map(Value::Number),
                Storage::Boolean => parse_boolean(trimmed).map(Value::Boolean),
                Storage::Text => Some(Value::Text(cell)),
            }
        })
        .collect();
    Column::new(name, values)
}

fn sniff_storage(raw: &[String]) -> Storage {
    let present = raw.iter().filter(|cell| !is_missing(cell)).map(|cell| cell.trim());
    let mut all_numbers = true;
    let mut all_booleans = true;
    for cell in present {
        all_numbers &= cell.parse::<f64>().is_ok();
        all_booleans &= parse_boolean(cell).is_some();
        if !all_numbers && !all_booleans {
            return Storage::Text;
        }
    }
    // Entirely missing columns load as numbers.
    if all_numbers {
        Storage::Number
    } else if all_booleans {
        Storage::Boolean
    } else {
        Storage::Text
    }
}
