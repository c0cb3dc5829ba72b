//! Ordinal-by-ordinal measures built on concordant and discordant pairs.
//!
//! `P` and `Q` follow the convention where every unordered pair is counted
//! twice, which keeps the asymptotic standard error formulas compact.

use serde::Serialize;

use crate::distribution::normal_two_sided_p;
use crate::statistic::{ratio, Statistic};
use crate::table::ContingencyTable;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KendallsTau {
    pub tau_b: Statistic,
    pub tau_c: Statistic,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SomersD {
    pub symmetric: Statistic,
    pub x_dependent: Statistic,
    pub y_dependent: Statistic,
}

/// Pair counts for a table, plus the per-cell concordance used by the ASEs.
#[derive(Debug, Clone)]
pub struct Concordance {
    /// Weighted count of cases concordant with each cell.
    pub agree: Vec<Vec<f64>>,
    /// Weighted count of cases discordant with each cell.
    pub disagree: Vec<Vec<f64>>,
    pub p: f64,
    pub q: f64,
}

impl Concordance {
    /// Direct enumeration over category pairs, O(R²·C²).
    pub fn compute(table: &ContingencyTable) -> Self {
        let rows = table.rows();
        let cols = table.cols();
        let cells = &table.cells;
        let mut agree = vec![vec![0.0; cols]; rows];
        let mut disagree = vec![vec![0.0; cols]; rows];

        for i in 0..rows {
            for j in 0..cols {
                let mut a = 0.0;
                let mut d = 0.0;
                for (k, row) in cells.iter().enumerate() {
                    if k == i {
                        continue;
                    }
                    for (l, &nkl) in row.iter().enumerate() {
                        if l == j {
                            continue;
                        }
                        if (k > i) == (l > j) {
                            a += nkl;
                        } else {
                            d += nkl;
                        }
                    }
                }
                agree[i][j] = a;
                disagree[i][j] = d;
            }
        }

        let mut p = 0.0;
        let mut q = 0.0;
        for i in 0..rows {
            for j in 0..cols {
                p += cells[i][j] * agree[i][j];
                q += cells[i][j] * disagree[i][j];
            }
        }

        Self {
            agree,
            disagree,
            p,
            q,
        }
    }

    /// `sqrt(Σ n_ij (A_ij - D_ij)² - (P - Q)²/N)`, shared by the null-hypothesis ASEs.
    fn null_spread(&self, table: &ContingencyTable) -> f64 {
        let n = table.grand_total;
        let mut sum = 0.0;
        for (i, row) in table.cells.iter().enumerate() {
            for (j, &nij) in row.iter().enumerate() {
                let d = self.agree[i][j] - self.disagree[i][j];
                sum += nij * d * d;
            }
        }
        let s = self.p - self.q;
        (sum - s * s / n).max(0.0).sqrt()
    }

    fn weighted_sum(&self, table: &ContingencyTable, f: impl Fn(usize, usize, f64, f64) -> f64) -> f64 {
        let mut sum = 0.0;
        for (i, row) in table.cells.iter().enumerate() {
            for (j, &nij) in row.iter().enumerate() {
                let t = f(i, j, self.agree[i][j], self.disagree[i][j]);
                sum += nij * t * t;
            }
        }
        sum
    }
}

/// Ties-adjusted denominators `N² - Σr²` and `N² - Σc²`.
fn tie_denominators(table: &ContingencyTable) -> (f64, f64) {
    let n2 = table.grand_total * table.grand_total;
    let dr = n2 - table.row_totals.iter().map(|r| r * r).sum::<f64>();
    let dc = n2 - table.col_totals.iter().map(|c| c * c).sum::<f64>();
    (dr, dc)
}

fn with_test(value: f64, ase1: f64, ase0: f64) -> Statistic {
    Statistic::new(value)
        .with_se(ase1)
        .with_p(normal_two_sided_p(ratio(value, ase0)))
}

pub fn gamma(table: &ContingencyTable, conc: &Concordance) -> Statistic {
    let (p, q) = (conc.p, conc.q);
    let value = ratio(p - q, p + q);
    if value.is_nan() {
        return Statistic::nan();
    }
    let ase1 = 4.0 / (p + q).powi(2) * conc.weighted_sum(table, |_, _, a, d| q * a - p * d).sqrt();
    let ase0 = 2.0 / (p + q) * conc.null_spread(table);
    with_test(value, ase1, ase0)
}

pub fn kendalls_tau(table: &ContingencyTable, conc: &Concordance) -> KendallsTau {
    KendallsTau {
        tau_b: tau_b(table, conc),
        tau_c: tau_c(table, conc),
    }
}

fn tau_b(table: &ContingencyTable, conc: &Concordance) -> Statistic {
    let n = table.grand_total;
    let (dr, dc) = tie_denominators(table);
    let w = (dr * dc).sqrt();
    let s = conc.p - conc.q;
    let value = ratio(s, w);
    if value.is_nan() {
        return Statistic::nan();
    }

    let sum = conc.weighted_sum(table, |i, j, a, d| {
        let v = table.row_totals[i] * dc + table.col_totals[j] * dr;
        2.0 * w * (a - d) + value * v
    });
    let ase1 = (sum - n.powi(3) * value * value * (dr + dc).powi(2)).max(0.0).sqrt() / (w * w);
    let ase0 = 2.0 / w * conc.null_spread(table);
    with_test(value, ase1, ase0)
}

fn tau_c(table: &ContingencyTable, conc: &Concordance) -> Statistic {
    let n = table.grand_total;
    let m = table.rows().min(table.cols()) as f64;
    let scale = ratio(2.0 * m, (m - 1.0) * n * n);
    let value = ratio(m * (conc.p - conc.q), n * n * (m - 1.0));
    if value.is_nan() || scale.is_nan() {
        return Statistic::nan();
    }
    let ase = scale * conc.null_spread(table);
    with_test(value, ase, ase)
}

pub fn somers_d(table: &ContingencyTable, conc: &Concordance) -> SomersD {
    let n = table.grand_total;
    let (dr, dc) = tie_denominators(table);
    let s = conc.p - conc.q;
    let spread = conc.null_spread(table);

    // Y dependent: ties on X are excluded from the denominator.
    let y_dependent = {
        let value = ratio(s, dr);
        if value.is_nan() {
            Statistic::nan()
        } else {
            let sum = conc.weighted_sum(table, |i, _, a, d| {
                dr * (a - d) - s * (n - table.row_totals[i])
            });
            with_test(value, 2.0 / (dr * dr) * sum.sqrt(), 2.0 / dr * spread)
        }
    };

    let x_dependent = {
        let value = ratio(s, dc);
        if value.is_nan() {
            Statistic::nan()
        } else {
            let sum = conc.weighted_sum(table, |_, j, a, d| {
                dc * (a - d) - s * (n - table.col_totals[j])
            });
            with_test(value, 2.0 / (dc * dc) * sum.sqrt(), 2.0 / dc * spread)
        }
    };

    let symmetric = {
        let value = ratio(2.0 * s, dr + dc);
        if value.is_nan() {
            Statistic::nan()
        } else {
            let ase = 4.0 / (dr + dc) * spread;
            with_test(value, ase, ase)
        }
    };

    SomersD {
        symmetric,
        x_dependent,
        y_dependent,
    }
}
