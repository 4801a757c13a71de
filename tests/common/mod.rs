#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tabular_profiler::{Column, Dataset};
use tempfile::{TempDir, tempdir};

/// Scratch directory removed on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        fs::write(&path, contents).expect("write temp file");
        path
    }
}

/// Product review table: unique integer ids, prices 1-500, ratings 1-5 and
/// review text averaging 80 characters.
pub fn product_reviews(rows: usize) -> Dataset {
    let review = |i: usize| {
        let base = format!("Review {i:04}: ");
        let filler = "great product, would happily buy again from this seller. ".repeat(2);
        let mut text = base + &filler;
        text.truncate(80);
        text
    };
    Dataset::new(vec![
        Column::from_values("product_id", (0..rows).map(|i| Some(i as i64 + 1000))),
        Column::from_values(
            "price",
            (0..rows).map(|i| Some(1.0 + ((i * 37) % 500) as f64)),
        ),
        Column::from_values("rating", (0..rows).map(|i| Some((1 + i % 5) as i64))),
        Column::from_values("review_text", (0..rows).map(|i| Some(review(i)))),
    ])
}

/// CSV rendering of [`product_reviews`] sized for CLI tests.
pub fn product_reviews_csv(rows: usize) -> String {
    let mut csv = String::from("product_id,price,rating,review_text\n");
    for i in 0..rows {
        csv.push_str(&format!(
            "{},{}.99,{},\"Review {i}: sturdy, well made and exactly as described by the seller\"\n",
            1000 + i,
            1 + (i * 37) % 500,
            1 + i % 5
        ));
    }
    csv
}
