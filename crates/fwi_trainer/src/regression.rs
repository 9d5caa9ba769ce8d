//! Linear, ridge and lasso fitting on standardized rows
//!
//! All three fit an intercept by centering the design and the target first.
//! Ridge uses the penalty `alpha * ||w||²`, lasso minimizes
//! `(1 / 2n) * ||y - Xw||² + alpha * ||w||₁`.

use crate::errors::TrainerError;
use fwi_core::{LinearModel, RegressorKind};
use tracing::debug;

/// Relative diagonal jitter so rank-deficient designs still solve for OLS
const OLS_JITTER: f64 = 1e-10;
const LASSO_MAX_ITER: usize = 10_000;
const LASSO_TOL: f64 = 1e-6;

type Result<T> = std::result::Result<T, TrainerError>;

struct Centered {
    x: Vec<Vec<f64>>,
    y: Vec<f64>,
    x_mean: Vec<f64>,
    y_mean: f64,
}

fn center(rows: &[Vec<f64>], targets: &[f64]) -> Result<Centered> {
    if rows.is_empty() {
        return Err(TrainerError::Training("no training rows".into()));
    }
    if rows.len() != targets.len() {
        return Err(TrainerError::Training(format!(
            "{} rows but {} targets",
            rows.len(),
            targets.len()
        )));
    }
    let width = rows[0].len();
    if rows.iter().any(|row| row.len() != width) {
        return Err(TrainerError::Training("rows have differing widths".into()));
    }

    let n = rows.len() as f64;
    let mut x_mean = vec![0.0; width];
    for row in rows {
        for (acc, value) in x_mean.iter_mut().zip(row) {
            *acc += value / n;
        }
    }
    let y_mean = targets.iter().sum::<f64>() / n;

    let x = rows
        .iter()
        .map(|row| row.iter().zip(&x_mean).map(|(v, m)| v - m).collect())
        .collect();
    let y = targets.iter().map(|t| t - y_mean).collect();

    Ok(Centered {
        x,
        y,
        x_mean,
        y_mean,
    })
}

fn intercept(data: &Centered, coefficients: &[f64]) -> f64 {
    data.y_mean
        - data
            .x_mean
            .iter()
            .zip(coefficients)
            .map(|(m, w)| m * w)
            .sum::<f64>()
}

/// Fit a linear model of the given kind
pub fn fit(
    kind: RegressorKind,
    alpha: f64,
    rows: &[Vec<f64>],
    targets: &[f64],
) -> Result<LinearModel> {
    if !alpha.is_finite() || alpha < 0.0 {
        return Err(TrainerError::Training(format!(
            "alpha must be a non-negative number, got {alpha}"
        )));
    }
    let data = center(rows, targets)?;

    let coefficients = match kind {
        RegressorKind::Linear => solve_normal_equations(&data, None)?,
        RegressorKind::Ridge => solve_normal_equations(&data, Some(alpha))?,
        RegressorKind::Lasso => coordinate_descent(&data, alpha),
    };

    if coefficients.iter().any(|w| !w.is_finite()) {
        return Err(TrainerError::Training(format!(
            "{kind} fit produced non-finite coefficients"
        )));
    }

    let alpha = if kind == RegressorKind::Linear { 0.0 } else { alpha };
    let intercept = intercept(&data, &coefficients);
    Ok(LinearModel {
        kind,
        alpha,
        coefficients,
        intercept,
    })
}

/// Solve `(XᵀX + λI) w = Xᵀy`.
///
/// `None` means ordinary least squares with a small relative jitter.
fn solve_normal_equations(data: &Centered, penalty: Option<f64>) -> Result<Vec<f64>> {
    let p = data.x_mean.len();
    let mut gram = vec![vec![0.0; p]; p];
    let mut rhs = vec![0.0; p];

    for (row, &target) in data.x.iter().zip(&data.y) {
        for i in 0..p {
            rhs[i] += row[i] * target;
            for j in i..p {
                gram[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..p {
        for j in 0..i {
            gram[i][j] = gram[j][i];
        }
    }

    let lambda = match penalty {
        Some(alpha) => alpha,
        None => {
            let max_diag = (0..p).map(|i| gram[i][i]).fold(1.0, f64::max);
            OLS_JITTER * max_diag
        }
    };
    for (i, row) in gram.iter_mut().enumerate() {
        row[i] += lambda;
    }

    gaussian_elimination(gram, rhs)
}

/// Gaussian elimination with partial pivoting
fn gaussian_elimination(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() < f64::MIN_POSITIVE {
            return Err(TrainerError::Training(format!(
                "singular system at column {col}"
            )));
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Ok(x)
}

fn soft_threshold(value: f64, threshold: f64) -> f64 {
    if value > threshold {
        value - threshold
    } else if value < -threshold {
        value + threshold
    } else {
        0.0
    }
}

/// Cyclic coordinate descent for the lasso objective
fn coordinate_descent(data: &Centered, alpha: f64) -> Vec<f64> {
    let p = data.x_mean.len();
    let n = data.y.len() as f64;
    let col_sq: Vec<f64> = (0..p)
        .map(|j| data.x.iter().map(|row| row[j] * row[j]).sum())
        .collect();

    let mut w = vec![0.0; p];
    let mut residual = data.y.clone();
    let threshold = n * alpha;

    for iter in 0..LASSO_MAX_ITER {
        let mut max_delta: f64 = 0.0;
        let mut max_weight: f64 = 0.0;

        for j in 0..p {
            if col_sq[j] == 0.0 {
                continue;
            }
            let old = w[j];
            let rho: f64 = data
                .x
                .iter()
                .zip(&residual)
                .map(|(row, r)| row[j] * (r + row[j] * old))
                .sum();
            let new = soft_threshold(rho, threshold) / col_sq[j];

            let delta = new - old;
            if delta != 0.0 {
                for (row, r) in data.x.iter().zip(residual.iter_mut()) {
                    *r -= row[j] * delta;
                }
                w[j] = new;
            }
            max_delta = max_delta.max(delta.abs());
            max_weight = max_weight.max(new.abs());
        }

        if max_weight == 0.0 || max_delta / max_weight < LASSO_TOL {
            debug!(iterations = iter + 1, "lasso converged");
            return w;
        }
    }

    debug!(iterations = LASSO_MAX_ITER, "lasso hit the iteration limit");
    w
}

/// Coefficient of determination.
///
/// A constant target scores 1.0 when matched exactly and 0.0 otherwise.
pub fn r2_score(truth: &[f64], predicted: &[f64]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let mean = truth.iter().sum::<f64>() / truth.len() as f64;
    let ss_tot: f64 = truth.iter().map(|t| (t - mean).powi(2)).sum();
    let ss_res: f64 = truth
        .iter()
        .zip(predicted)
        .map(|(t, p)| (t - p).powi(2))
        .sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}
