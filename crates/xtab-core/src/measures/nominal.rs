//! Nominal-by-nominal measures.

use serde::Serialize;

use crate::distribution::chi_square_p;
use crate::statistic::{ratio, Statistic};
use crate::table::ContingencyTable;

/// Chi-square based measures: phi, contingency coefficient, Cramér's V.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociationMeasures {
    pub phi: Statistic,
    pub contingency_coefficient: Statistic,
    pub cramers_v: Statistic,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lambda {
    pub symmetric: Statistic,
    pub x_dependent: Statistic,
    pub y_dependent: Statistic,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoodmanKruskalTau {
    pub x_dependent: Statistic,
    pub y_dependent: Statistic,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UncertaintyCoefficient {
    pub symmetric: Statistic,
    pub x_dependent: Statistic,
    pub y_dependent: Statistic,
}

/// Phi, C and V from the Pearson chi-square.
///
/// Phi takes the sign of `ad - bc` on 2x2 tables. V is 0 when either
/// variable has a single category.
pub fn association_measures(table: &ContingencyTable, pearson: &Statistic) -> AssociationMeasures {
    let chi2 = pearson.value;
    let n = table.grand_total;
    let p = pearson.p_value.unwrap_or(f64::NAN);

    let mut phi = ratio(chi2, n).sqrt();
    if table.is_2x2() {
        let cross = table.cells[0][0] * table.cells[1][1] - table.cells[0][1] * table.cells[1][0];
        if cross < 0.0 {
            phi = -phi;
        }
    }

    let contingency = ratio(chi2, chi2 + n).sqrt();

    let min_dim = table.rows().min(table.cols()).saturating_sub(1);
    let cramers_v = if n <= 0.0 {
        f64::NAN
    } else if min_dim == 0 {
        0.0
    } else {
        (chi2 / (n * min_dim as f64)).sqrt().clamp(0.0, 1.0)
    };

    AssociationMeasures {
        phi: Statistic::new(phi).with_p(p),
        contingency_coefficient: Statistic::new(contingency).with_p(p),
        cramers_v: Statistic::new(cramers_v).with_p(p),
    }
}

fn transpose(cells: &[Vec<f64>], cols: usize) -> Vec<Vec<f64>> {
    (0..cols)
        .map(|j| cells.iter().map(|row| row[j]).collect())
        .collect()
}

fn max_with_index(values: &[f64]) -> (usize, f64) {
    values
        .iter()
        .copied()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, v)| if v > best.1 { (i, v) } else { best })
}

/// Goodman-Kruskal lambda for predicting the columns of `cells` from its rows.
/// Returns `(lambda, ase, sum of row maxima, max column total)`.
fn lambda_predicting_columns(cells: &[Vec<f64>], col_totals: &[f64], n: f64) -> (f64, f64, f64, f64) {
    let (c_idx, c_max) = max_with_index(col_totals);
    let mut sum_max = 0.0;
    let mut sum_in_modal_col = 0.0;
    for row in cells {
        let (j, m) = max_with_index(row);
        sum_max += m;
        if j == c_idx {
            sum_in_modal_col += m;
        }
    }

    let denom = n - c_max;
    let lambda = ratio(sum_max - c_max, denom);
    let ase = ratio(
        ((n - sum_max) * (sum_max + c_max - 2.0 * sum_in_modal_col)).max(0.0),
        denom.powi(3),
    )
    .sqrt();
    (lambda, ase, sum_max, c_max)
}

pub fn lambda(table: &ContingencyTable) -> Lambda {
    let n = table.grand_total;
    if n <= 0.0 || table.rows() == 0 {
        let nan = Statistic::nan();
        return Lambda {
            symmetric: nan,
            x_dependent: nan,
            y_dependent: nan,
        };
    }

    let (ly, ase_y, rows_max, c_max) = lambda_predicting_columns(&table.cells, &table.col_totals, n);
    let transposed = transpose(&table.cells, table.cols());
    let (lx, ase_x, cols_max, r_max) = lambda_predicting_columns(&transposed, &table.row_totals, n);

    let symmetric = ratio(
        rows_max + cols_max - c_max - r_max,
        2.0 * n - r_max - c_max,
    );

    Lambda {
        symmetric: Statistic::new(symmetric),
        x_dependent: Statistic::new(lx).with_se(ase_x),
        y_dependent: Statistic::new(ly).with_se(ase_y),
    }
}

/// Tau for predicting the columns of `cells` from its rows.
fn tau_predicting_columns(cells: &[Vec<f64>], row_totals: &[f64], col_totals: &[f64], n: f64) -> f64 {
    let mut within = 0.0;
    for (row, &r) in cells.iter().zip(row_totals) {
        if r > 0.0 {
            within += row.iter().map(|v| v * v).sum::<f64>() / r;
        }
    }
    let col_sq: f64 = col_totals.iter().map(|c| c * c).sum();
    ratio(n * within - col_sq, n * n - col_sq)
}

pub fn goodman_kruskal_tau(table: &ContingencyTable) -> GoodmanKruskalTau {
    let n = table.grand_total;
    let df = table.degrees_of_freedom();
    let rows = table.rows() as f64;
    let cols = table.cols() as f64;

    let ty = tau_predicting_columns(&table.cells, &table.row_totals, &table.col_totals, n);
    let transposed = transpose(&table.cells, table.cols());
    let tx = tau_predicting_columns(&transposed, &table.col_totals, &table.row_totals, n);

    let py = chi_square_p((n - 1.0) * (cols - 1.0) * ty, df);
    let px = chi_square_p((n - 1.0) * (rows - 1.0) * tx, df);

    GoodmanKruskalTau {
        x_dependent: Statistic::new(tx).with_p(px),
        y_dependent: Statistic::new(ty).with_p(py),
    }
}

/// `-Σ p·ln(p)` over the non-zero proportions `counts / n`.
fn entropy<'a>(counts: impl Iterator<Item = &'a f64>, n: f64) -> f64 {
    counts
        .filter(|c| **c > 0.0)
        .map(|c| {
            let p = c / n;
            -p * p.ln()
        })
        .sum()
}

/// Entropy-based uncertainty coefficients. The p-value is the
/// likelihood-ratio chi-square p-value.
pub fn uncertainty_coefficient(
    table: &ContingencyTable,
    likelihood_ratio: &Statistic,
) -> UncertaintyCoefficient {
    let n = table.grand_total;
    let p = likelihood_ratio.p_value.unwrap_or(f64::NAN);
    if n <= 0.0 {
        let nan = Statistic::nan();
        return UncertaintyCoefficient {
            symmetric: nan,
            x_dependent: nan,
            y_dependent: nan,
        };
    }

    let hx = entropy(table.row_totals.iter(), n);
    let hy = entropy(table.col_totals.iter(), n);
    let hxy = entropy(table.cells.iter().flatten(), n);
    let mutual = hx + hy - hxy;

    UncertaintyCoefficient {
        symmetric: Statistic::new(ratio(2.0 * mutual, hx + hy)).with_p(p),
        x_dependent: Statistic::new(ratio(mutual, hx)).with_p(p),
        y_dependent: Statistic::new(ratio(mutual, hy)).with_p(p),
    }
}
