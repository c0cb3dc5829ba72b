//! Interval-by-interval measures: Pearson's r, Spearman's rho and eta.

use serde::Serialize;

use crate::category::category_scores;
use crate::distribution::normal_two_sided_p;
use crate::statistic::{ratio, Statistic};
use crate::table::ContingencyTable;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Eta {
    /// X scores explained by Y groups.
    pub x_dependent: Statistic,
    /// Y scores explained by X groups.
    pub y_dependent: Statistic,
}

/// Pearson's r on the category scores, weighted by cell counts.
pub fn pearson(table: &ContingencyTable) -> Statistic {
    let u = category_scores(&table.categories_x);
    let v = category_scores(&table.categories_y);
    correlation_with_scores(table, &u, &v)
}

/// Spearman's rho: Pearson's r on midrank scores.
pub fn spearman(table: &ContingencyTable) -> Statistic {
    let u = midranks(&table.row_totals);
    let v = midranks(&table.col_totals);
    correlation_with_scores(table, &u, &v)
}

/// Just the value of Pearson's r, for the linear-by-linear test.
pub fn pearson_r(table: &ContingencyTable) -> f64 {
    pearson(table).value
}

fn correlation_with_scores(table: &ContingencyTable, u: &[f64], v: &[f64]) -> Statistic {
    let n = table.grand_total;
    if n <= 0.0 {
        return Statistic::nan();
    }
    let u_mean = weighted_mean(u, &table.row_totals, n);
    let v_mean = weighted_mean(v, &table.col_totals, n);
    let du: Vec<f64> = u.iter().map(|x| x - u_mean).collect();
    let dv: Vec<f64> = v.iter().map(|y| y - v_mean).collect();

    let ss_r: f64 = table.row_totals.iter().zip(&du).map(|(r, d)| r * d * d).sum();
    let ss_c: f64 = table.col_totals.iter().zip(&dv).map(|(c, d)| c * d * d).sum();
    let mut ss_rc = 0.0;
    for (i, row) in table.cells.iter().enumerate() {
        for (j, &nij) in row.iter().enumerate() {
            ss_rc += nij * du[i] * dv[j];
        }
    }

    let w = (ss_r * ss_c).sqrt();
    let r = ratio(ss_rc, w);
    if r.is_nan() {
        return Statistic::nan();
    }

    let mut acc = 0.0;
    for (i, row) in table.cells.iter().enumerate() {
        for (j, &nij) in row.iter().enumerate() {
            let b = du[i] * du[i] * ss_c + dv[j] * dv[j] * ss_r;
            let term = w * du[i] * dv[j] - b * ss_rc / (2.0 * w);
            acc += nij * term * term;
        }
    }
    let ase = acc.max(0.0).sqrt() / (w * w);

    // t on N-2 df, referred to the normal distribution.
    let t = r * ratio(n - 2.0, 1.0 - r * r).sqrt();
    let p = if n <= 2.0 {
        f64::NAN
    } else if (1.0 - r * r).abs() < 1e-15 {
        0.0
    } else {
        normal_two_sided_p(t)
    };

    Statistic::new(r).with_se(ase).with_p(p)
}

fn weighted_mean(scores: &[f64], totals: &[f64], n: f64) -> f64 {
    scores.iter().zip(totals).map(|(s, t)| s * t).sum::<f64>() / n
}

/// Midrank of each category given its marginal total.
pub fn midranks(totals: &[f64]) -> Vec<f64> {
    let mut below = 0.0;
    totals
        .iter()
        .map(|t| {
            let rank = below + (t + 1.0) / 2.0;
            below += t;
            rank
        })
        .collect()
}

pub fn eta(table: &ContingencyTable) -> Eta {
    let u = category_scores(&table.categories_x);
    let v = category_scores(&table.categories_y);

    let y_dependent = correlation_ratio(&table.cells, &table.col_totals, &v);
    let transposed: Vec<Vec<f64>> = (0..table.cols())
        .map(|j| table.cells.iter().map(|row| row[j]).collect())
        .collect();
    let x_dependent = correlation_ratio(&transposed, &table.row_totals, &u);

    Eta {
        x_dependent: Statistic::new(x_dependent),
        y_dependent: Statistic::new(y_dependent),
    }
}

/// Eta for scores attached to the columns of `cells`, grouped by its rows.
fn correlation_ratio(cells: &[Vec<f64>], col_totals: &[f64], scores: &[f64]) -> f64 {
    let n: f64 = col_totals.iter().sum();
    if n <= 0.0 {
        return f64::NAN;
    }
    let mean = weighted_mean(scores, col_totals, n);
    let ss_total: f64 = col_totals
        .iter()
        .zip(scores)
        .map(|(c, s)| c * (s - mean).powi(2))
        .sum();

    let mut ss_within = 0.0;
    for row in cells {
        let group_n: f64 = row.iter().sum();
        if group_n <= 0.0 {
            continue;
        }
        let group_mean = weighted_mean(scores, row, group_n);
        ss_within += row
            .iter()
            .zip(scores)
            .map(|(c, s)| c * (s - group_mean).powi(2))
            .sum::<f64>();
    }

    let explained = 1.0 - ratio(ss_within, ss_total);
    if explained.is_nan() {
        f64::NAN
    } else {
        explained.clamp(0.0, 1.0).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::CategoryKey;
    use approx::assert_abs_diff_eq;

    fn table(cells: Vec<Vec<f64>>) -> ContingencyTable {
        let rows = (1..=cells.len()).map(|i| CategoryKey::Number(i as f64)).collect();
        let cols = (1..=cells[0].len())
            .map(|j| CategoryKey::Number(j as f64))
            .collect();
        ContingencyTable::from_counts(rows, cols, cells).unwrap()
    }

    #[test]
    fn test_perfect_positive_correlation() {
        let t = table(vec![vec![2.0, 0.0], vec![0.0, 2.0]]);
        let r = pearson(&t);
        assert_abs_diff_eq!(r.value, 1.0, epsilon = 1e-12);
        assert_eq!(r.p_value, Some(0.0));
        assert_abs_diff_eq!(spearman(&t).value, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_negative_correlation() {
        let t = table(vec![vec![0.0, 3.0], vec![3.0, 0.0]]);
        assert_abs_diff_eq!(pearson_r(&t), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_pearson_matches_raw_data() {
        // x = [1,1,2,2,3,3], y = [1,2,2,3,3,3] -> r = 3 / sqrt(40/3)
        let t = table(vec![
            vec![1.0, 1.0, 0.0],
            vec![0.0, 1.0, 1.0],
            vec![0.0, 0.0, 2.0],
        ]);
        let r = pearson(&t);
        assert_abs_diff_eq!(r.value, 0.821584, epsilon = 1e-5);
        assert!(r.standard_error.unwrap() > 0.0);
    }

    #[test]
    fn test_constant_variable_is_nan() {
        let t = table(vec![vec![3.0, 4.0]]);
        assert!(pearson(&t).value.is_nan());
        assert!(spearman(&t).value.is_nan());
    }

    #[test]
    fn test_midranks() {
        assert_eq!(midranks(&[2.0, 3.0, 1.0]), vec![1.5, 4.0, 6.0]);
    }

    #[test]
    fn test_eta_perfect_separation() {
        let t = table(vec![vec![4.0, 0.0], vec![0.0, 4.0]]);
        let e = eta(&t);
        assert_abs_diff_eq!(e.y_dependent.value, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(e.x_dependent.value, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_eta_independent() {
        let t = table(vec![vec![2.0, 2.0], vec![2.0, 2.0]]);
        assert_abs_diff_eq!(eta(&t).y_dependent.value, 0.0, epsilon = 1e-12);
    }
}
