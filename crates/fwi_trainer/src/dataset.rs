//! CSV dataset loading and splitting
//!
//! Columns are located by header name, so extra columns (region, class
//! labels) are ignored. Unreadable feature cells become NaN and are left to
//! the imputer; rows without a numeric target cannot be used and are skipped.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, warn};

use crate::deterministic::shuffled_indices;

/// Training dataset with named feature columns and a numeric target
#[derive(Clone, Debug)]
pub struct Dataset {
    pub feature_names: Vec<String>,
    pub features: Vec<Vec<f64>>,
    pub targets: Vec<f64>,
    /// Lines that could not be used (titles, repeated headers, no target)
    pub skipped_rows: usize,
}

fn parse_cell(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() || cell == "?" {
        return None;
    }
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}

impl Dataset {
    /// Load dataset from a CSV file with a header row
    pub fn from_csv<P: AsRef<Path>>(path: P, feature_names: &[String], target: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read CSV file {}", path.as_ref().display()))?;
        Self::from_csv_str(&content, feature_names, target)
    }

    /// Parse CSV text; the first non-empty line is the header
    pub fn from_csv_str(content: &str, feature_names: &[String], target: &str) -> Result<Self> {
        let mut lines = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty());

        let (_, header) = lines.next().context("CSV file has no header")?;
        let columns: Vec<&str> = header.split(',').map(|s| s.trim()).collect();
        let position = |name: &str| {
            columns
                .iter()
                .position(|col| *col == name)
                .with_context(|| format!("column {name} not found in header"))
        };

        let feature_idx = feature_names
            .iter()
            .map(|name| position(name.as_str()))
            .collect::<Result<Vec<_>>>()?;
        let target_idx = position(target)?;

        let mut features = Vec::new();
        let mut targets = Vec::new();
        let mut skipped_rows = 0;

        for (line_idx, line) in lines {
            let parts: Vec<&str> = line.split(',').collect();
            if parts.len() != columns.len() {
                debug!(
                    "Line {}: expected {} columns, got {}; skipping",
                    line_idx + 1,
                    columns.len(),
                    parts.len()
                );
                skipped_rows += 1;
                continue;
            }

            let Some(target_value) = parse_cell(parts[target_idx]) else {
                debug!("Line {}: no numeric target; skipping", line_idx + 1);
                skipped_rows += 1;
                continue;
            };

            let row = feature_idx
                .iter()
                .map(|&idx| parse_cell(parts[idx]).unwrap_or(f64::NAN))
                .collect();

            features.push(row);
            targets.push(target_value);
        }

        if features.is_empty() {
            anyhow::bail!("Dataset is empty");
        }
        if skipped_rows > 0 {
            warn!("Skipped {} unusable rows", skipped_rows);
        }

        Ok(Self {
            feature_names: feature_names.to_vec(),
            features,
            targets,
            skipped_rows,
        })
    }

    /// Get number of samples
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Check if dataset is empty
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn feature_count(&self) -> usize {
        self.feature_names.len()
    }

    /// Number of missing cells per feature column
    pub fn missing_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.feature_count()];
        for row in &self.features {
            for (count, value) in counts.iter_mut().zip(row) {
                if value.is_nan() {
                    *count += 1;
                }
            }
        }
        counts
    }

    /// Deterministic shuffled holdout split.
    ///
    /// The test share is rounded up, and at least one row always stays in
    /// the training part. A zero fraction yields an empty test set.
    pub fn split(&self, test_fraction: f64, seed: u64) -> (Dataset, Dataset) {
        let n = self.len();
        let n_test = if test_fraction <= 0.0 || n < 2 {
            0
        } else {
            ((n as f64 * test_fraction).ceil() as usize).min(n - 1)
        };

        let order = shuffled_indices(n, seed);
        let (test_idx, train_idx) = order.split_at(n_test);
        (self.subset(train_idx), self.subset(test_idx))
    }

    fn subset(&self, indices: &[usize]) -> Dataset {
        Dataset {
            feature_names: self.feature_names.clone(),
            features: indices.iter().map(|&i| self.features[i].clone()).collect(),
            targets: indices.iter().map(|&i| self.targets[i]).collect(),
            skipped_rows: 0,
        }
    }
}
