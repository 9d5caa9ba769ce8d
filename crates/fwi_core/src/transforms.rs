//! Fitted preprocessing stages and the linear regressor
//!
//! Each stage is a pure function of its fitted parameters: rows go in,
//! rows come out, nothing is mutated at serving time. Widths are checked
//! on every call since the stages carry no column names.

use crate::errors::{FwiError, Result, Stage};
use serde::{Deserialize, Serialize};

/// A fitted row transform with fixed input and output widths
pub trait Transform {
    /// Stage this transform occupies in the chain
    fn stage(&self) -> Stage;
    /// Number of columns accepted
    fn input_width(&self) -> usize;
    /// Number of columns produced
    fn output_width(&self) -> usize;
    /// Transform a single row
    fn transform(&self, row: &[f64]) -> Result<Vec<f64>>;
}

/// A fitted model mapping a row to a scalar
pub trait Regressor {
    fn input_width(&self) -> usize;
    fn predict(&self, row: &[f64]) -> Result<f64>;
}

fn check_width(stage: Stage, expected: usize, row: &[f64]) -> Result<()> {
    if row.len() != expected {
        return Err(FwiError::Transform {
            stage,
            expected,
            actual: row.len(),
        });
    }
    Ok(())
}

/// How missing values are filled
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputeStrategy {
    Mean,
    Median,
    Constant(f64),
}

/// Replaces NaN entries with a per-column statistic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleImputer {
    pub strategy: ImputeStrategy,
    pub statistics: Vec<f64>,
}

impl SimpleImputer {
    /// Learn per-column fill values, ignoring NaN entries.
    ///
    /// A column with no observed values falls back to 0.0.
    pub fn fit(rows: &[Vec<f64>], width: usize, strategy: ImputeStrategy) -> Self {
        let statistics = (0..width)
            .map(|col| {
                let mut observed: Vec<f64> = rows
                    .iter()
                    .filter_map(|row| row.get(col).copied())
                    .filter(|v| !v.is_nan())
                    .collect();

                match strategy {
                    ImputeStrategy::Constant(value) => value,
                    _ if observed.is_empty() => 0.0,
                    ImputeStrategy::Mean => observed.iter().sum::<f64>() / observed.len() as f64,
                    ImputeStrategy::Median => {
                        observed.sort_by(|a, b| a.total_cmp(b));
                        let mid = observed.len() / 2;
                        if observed.len() % 2 == 0 {
                            (observed[mid - 1] + observed[mid]) / 2.0
                        } else {
                            observed[mid]
                        }
                    }
                }
            })
            .collect();

        Self {
            strategy,
            statistics,
        }
    }
}

impl Transform for SimpleImputer {
    fn stage(&self) -> Stage {
        Stage::Imputer
    }

    fn input_width(&self) -> usize {
        self.statistics.len()
    }

    fn output_width(&self) -> usize {
        self.statistics.len()
    }

    fn transform(&self, row: &[f64]) -> Result<Vec<f64>> {
        check_width(self.stage(), self.input_width(), row)?;
        Ok(row
            .iter()
            .zip(&self.statistics)
            .map(|(&value, &fill)| if value.is_nan() { fill } else { value })
            .collect())
    }
}

/// Polynomial and interaction feature generator.
///
/// Output columns follow scikit-learn's ordering: the bias term (if any),
/// then for each degree every combination of input columns in
/// lexicographic order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolynomialFeatures {
    pub n_features_in: usize,
    pub degree: usize,
    pub include_bias: bool,
    #[serde(default)]
    pub interaction_only: bool,
}

impl PolynomialFeatures {
    pub fn new(n_features_in: usize, degree: usize) -> Self {
        Self {
            n_features_in,
            degree,
            include_bias: true,
            interaction_only: false,
        }
    }

    /// Column index combinations, one per output column
    pub fn combinations(&self) -> Vec<Vec<usize>> {
        let mut out = Vec::new();
        self.for_each_combination(|combo| out.push(combo.to_vec()));
        out
    }

    /// Number of output columns, or `None` if it does not fit in `usize`
    pub fn checked_output_width(&self) -> Option<usize> {
        let n = self.n_features_in;
        let with_bias = if self.interaction_only {
            (0..=self.degree.min(n)).try_fold(0usize, |acc, d| acc.checked_add(binomial(n, d)?))?
        } else {
            // Sum of C(n + d - 1, d) for d in 0..=degree
            binomial(n.checked_add(self.degree)?, self.degree)?
        };
        Some(if self.include_bias {
            with_bias
        } else {
            with_bias - 1
        })
    }

    /// Visit every combination in output order, reusing one index buffer
    fn for_each_combination<F: FnMut(&[usize])>(&self, mut visit: F) {
        let start = if self.include_bias { 0 } else { 1 };
        let n = self.n_features_in;
        let mut combo: Vec<usize> = Vec::new();

        for degree in start..=self.degree {
            combo.clear();
            if degree == 0 {
                visit(&combo);
                continue;
            }
            if n == 0 || (self.interaction_only && degree > n) {
                continue;
            }
            if self.interaction_only {
                combo.extend(0..degree);
            } else {
                combo.resize(degree, 0);
            }

            'walk: loop {
                visit(&combo);

                // Rightmost slot that can still advance.
                let mut pos = degree;
                loop {
                    if pos == 0 {
                        break 'walk;
                    }
                    pos -= 1;
                    let max = if self.interaction_only {
                        n - (degree - pos)
                    } else {
                        n - 1
                    };
                    if combo[pos] < max {
                        break;
                    }
                }

                combo[pos] += 1;
                for i in pos + 1..degree {
                    combo[i] = if self.interaction_only {
                        combo[i - 1] + 1
                    } else {
                        combo[pos]
                    };
                }
            }
        }
    }
}

/// `n choose k` with overflow detection
fn binomial(n: usize, k: usize) -> Option<usize> {
    if k > n {
        return Some(0);
    }
    let k = k.min(n - k);
    let mut acc: usize = 1;
    for i in 0..k {
        acc = acc.checked_mul(n - i)? / (i + 1);
    }
    Some(acc)
}

impl Transform for PolynomialFeatures {
    fn stage(&self) -> Stage {
        Stage::FeatureExpander
    }

    fn input_width(&self) -> usize {
        self.n_features_in
    }

    fn output_width(&self) -> usize {
        self.checked_output_width().unwrap_or(usize::MAX)
    }

    fn transform(&self, row: &[f64]) -> Result<Vec<f64>> {
        check_width(self.stage(), self.input_width(), row)?;
        let mut out = Vec::with_capacity(self.checked_output_width().unwrap_or(0));
        self.for_each_combination(|combo| out.push(combo.iter().map(|&col| row[col]).product()));
        Ok(out)
    }
}

/// Standardizes columns to zero mean and unit variance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Learn column means and population standard deviations.
    ///
    /// Near-constant columns get a scale of 1.0 so they map to zero.
    pub fn fit(rows: &[Vec<f64>], width: usize) -> Self {
        let n = rows.len().max(1) as f64;
        let mut mean = vec![0.0; width];
        for row in rows {
            for (acc, &value) in mean.iter_mut().zip(row) {
                *acc += value;
            }
        }
        for acc in &mut mean {
            *acc /= n;
        }

        let mut scale = vec![0.0; width];
        for row in rows {
            for ((acc, &value), &mu) in scale.iter_mut().zip(row).zip(&mean) {
                *acc += (value - mu) * (value - mu);
            }
        }
        for acc in &mut scale {
            let std = (*acc / n).sqrt();
            *acc = if std < 10.0 * f64::EPSILON { 1.0 } else { std };
        }

        Self { mean, scale }
    }
}

impl Transform for StandardScaler {
    fn stage(&self) -> Stage {
        Stage::Scaler
    }

    fn input_width(&self) -> usize {
        self.mean.len()
    }

    fn output_width(&self) -> usize {
        self.mean.len()
    }

    fn transform(&self, row: &[f64]) -> Result<Vec<f64>> {
        check_width(self.stage(), self.input_width(), row)?;
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(&value, (&mu, &sigma))| (value - mu) / sigma)
            .collect())
    }
}

/// Penalty used when the regressor was fitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegressorKind {
    Linear,
    Ridge,
    Lasso,
}

impl std::fmt::Display for RegressorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RegressorKind::Linear => "linear",
            RegressorKind::Ridge => "ridge",
            RegressorKind::Lasso => "lasso",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for RegressorKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linear" | "ols" => Ok(RegressorKind::Linear),
            "ridge" => Ok(RegressorKind::Ridge),
            "lasso" => Ok(RegressorKind::Lasso),
            other => Err(format!("unknown regressor kind: {other}")),
        }
    }
}

/// Fitted linear model: `intercept + coefficients · x`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub kind: RegressorKind,
    pub alpha: f64,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl Regressor for LinearModel {
    fn input_width(&self) -> usize {
        self.coefficients.len()
    }

    fn predict(&self, row: &[f64]) -> Result<f64> {
        check_width(Stage::Regressor, self.input_width(), row)?;
        let dot: f64 = row
            .iter()
            .zip(&self.coefficients)
            .map(|(x, w)| x * w)
            .sum();
        Ok(self.intercept + dot)
    }
}
