//! Chi-square family tests, Fisher's exact test and McNemar-Bowker symmetry.

use serde::Serialize;
use tracing::warn;

use crate::distribution::{binomial_cdf, chi_square_p, ln_choose};
use crate::expected::ExpectedCounts;
use crate::measures::correlation;
use crate::statistic::{ratio, Statistic};
use crate::table::ContingencyTable;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChiSquareTests {
    pub pearson: Statistic,
    pub likelihood_ratio: Statistic,
    pub mantel_haenszel: Statistic,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fisher_exact: Option<FisherExact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yates_continuity: Option<Statistic>,
    /// Cells whose expected count is below 5.
    pub cells_below_five: usize,
    pub minimum_expected: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FisherExact {
    pub observed_probability: f64,
    pub two_sided: f64,
    pub one_sided: f64,
}

impl FisherExact {
    fn nan() -> Self {
        Self {
            observed_probability: f64::NAN,
            two_sided: f64::NAN,
            one_sided: f64::NAN,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct McNemarBowker {
    pub statistic: f64,
    pub degrees_of_freedom: f64,
    pub p_value: f64,
    /// Exact binomial two-sided p-value, 2x2 tables only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exact_p_value: Option<f64>,
}

impl McNemarBowker {
    fn nan() -> Self {
        Self {
            statistic: f64::NAN,
            degrees_of_freedom: f64::NAN,
            p_value: f64::NAN,
            exact_p_value: None,
        }
    }
}

/// Largest number of cases the exact tests enumerate. Above it Fisher's test
/// reports `NaN` and McNemar keeps only the chi-square p-value.
pub const EXACT_CASE_LIMIT: f64 = 1.0e6;

pub fn chi_square_tests(table: &ContingencyTable, expected: &ExpectedCounts) -> ChiSquareTests {
    let df = table.degrees_of_freedom();

    let pearson_value = pearson_chi_square(table, expected);
    let pearson = Statistic::new(pearson_value)
        .with_df(df)
        .with_p(chi_square_p(pearson_value, df));

    let lr_value = likelihood_ratio(table, expected);
    let likelihood_ratio = Statistic::new(lr_value)
        .with_df(df)
        .with_p(chi_square_p(lr_value, df));

    let mantel_haenszel = mantel_haenszel(table);

    let (fisher_exact, yates_continuity) = if table.is_2x2() {
        (Some(fisher_exact(table)), Some(yates_continuity(table)))
    } else {
        (None, None)
    };

    let cells_below_five = expected.cells().filter(|e| *e < 5.0).count();
    let minimum_expected = expected.cells().fold(f64::NAN, f64::min);

    ChiSquareTests {
        pearson,
        likelihood_ratio,
        mantel_haenszel,
        fisher_exact,
        yates_continuity,
        cells_below_five,
        minimum_expected,
    }
}

/// `Σ (O-E)²/E` over cells with `E > 0`.
pub fn pearson_chi_square(table: &ContingencyTable, expected: &ExpectedCounts) -> f64 {
    let mut chi2 = 0.0;
    for (i, row) in table.cells.iter().enumerate() {
        for (j, &o) in row.iter().enumerate() {
            let e = expected.get(i, j);
            if e > 0.0 {
                let diff = o - e;
                chi2 += diff * diff / e;
            }
        }
    }
    chi2
}

/// `2·Σ O·ln(O/E)` over cells with `O > 0` and `E > 0`.
pub fn likelihood_ratio(table: &ContingencyTable, expected: &ExpectedCounts) -> f64 {
    let mut g2 = 0.0;
    for (i, row) in table.cells.iter().enumerate() {
        for (j, &o) in row.iter().enumerate() {
            let e = expected.get(i, j);
            if o > 0.0 && e > 0.0 {
                g2 += o * (o / e).ln();
            }
        }
    }
    2.0 * g2
}

/// Linear-by-linear association, `N·r²` with one degree of freedom.
pub fn mantel_haenszel(table: &ContingencyTable) -> Statistic {
    let r = correlation::pearson_r(table);
    let value = table.grand_total * r * r;
    Statistic::new(value).with_df(1).with_p(chi_square_p(value, 1))
}

/// Continuity-corrected chi-square for a 2x2 table.
pub fn yates_continuity(table: &ContingencyTable) -> Statistic {
    let (a, b, c, d) = corners(table);
    let n = table.grand_total;
    let cross = (a * d - b * c).abs();
    let denom = table.row_totals[0] * table.row_totals[1] * table.col_totals[0] * table.col_totals[1];
    let corrected = (cross - n / 2.0).max(0.0);
    let value = ratio(n * corrected * corrected, denom);
    Statistic::new(value).with_df(1).with_p(chi_square_p(value, 1))
}

/// Fisher's exact test for a 2x2 table.
///
/// Hypergeometric probabilities are evaluated in log space. Weighted counts
/// are rounded to whole cases first. Tables with more than
/// [`EXACT_CASE_LIMIT`] cases are not enumerated and give `NaN`.
pub fn fisher_exact(table: &ContingencyTable) -> FisherExact {
    let (a, b, c, d) = corners(table);
    let total = a + b + c + d;
    if total.is_nan() || total > EXACT_CASE_LIMIT {
        warn!(
            cases = total,
            limit = EXACT_CASE_LIMIT,
            "fisher exact test skipped: too many cases"
        );
        return FisherExact::nan();
    }
    let counts = [a, b, c, d].map(|v| v.max(0.0).round());
    if counts.iter().zip([a, b, c, d]).any(|(r, v)| (r - v).abs() > 1e-9) {
        warn!("fisher exact test: rounded non-integer cell counts");
    }
    let [a, b, c, d] = counts.map(|v| v as u64);

    let n = a + b + c + d;
    if n == 0 {
        return FisherExact::nan();
    }
    let r1 = a + b;
    let r2 = c + d;
    let c1 = a + c;
    let ln_margin = ln_choose(n, c1);
    let prob = |x: u64| (ln_choose(r1, x) + ln_choose(r2, c1 - x) - ln_margin).exp();

    let lo = c1.saturating_sub(r2);
    let hi = r1.min(c1);
    let observed = prob(a);
    let threshold = observed * (1.0 + 1e-7);

    let mut two_sided = 0.0;
    let mut lower = 0.0;
    let mut upper = 0.0;
    for x in lo..=hi {
        let p = prob(x);
        if p <= threshold {
            two_sided += p;
        }
        if x <= a {
            lower += p;
        }
        if x >= a {
            upper += p;
        }
    }

    FisherExact {
        observed_probability: observed,
        two_sided: f64::min(two_sided, 1.0),
        one_sided: f64::min(f64::min(lower, upper), 1.0),
    }
}

/// McNemar-Bowker test of symmetry. `NaN` everywhere for non-square tables.
pub fn mcnemar_bowker(table: &ContingencyTable) -> McNemarBowker {
    if !table.is_square() {
        return McNemarBowker::nan();
    }
    let k = table.rows();
    let mut statistic = 0.0;
    for i in 0..k {
        for j in (i + 1)..k {
            let nij = table.cells[i][j];
            let nji = table.cells[j][i];
            let sum = nij + nji;
            if sum > 0.0 {
                statistic += (nij - nji).powi(2) / sum;
            }
        }
    }
    let df = k * (k - 1) / 2;

    let discordant = if k == 2 {
        table.cells[0][1] + table.cells[1][0]
    } else {
        f64::NAN
    };
    let exact_p_value = (discordant <= EXACT_CASE_LIMIT).then(|| {
        let b = table.cells[0][1].max(0.0).round() as u64;
        let c = table.cells[1][0].max(0.0).round() as u64;
        let n = b + c;
        if n == 0 {
            1.0
        } else {
            (2.0 * binomial_cdf(b.min(c) as i64, n, 0.5)).min(1.0)
        }
    });

    McNemarBowker {
        statistic,
        degrees_of_freedom: df as f64,
        p_value: chi_square_p(statistic, df),
        exact_p_value,
    }
}

fn corners(table: &ContingencyTable) -> (f64, f64, f64, f64) {
    (
        table.cells[0][0],
        table.cells[0][1],
        table.cells[1][0],
        table.cells[1][1],
    )
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

    fn tests_for(cells: Vec<Vec<f64>>) -> ChiSquareTests {
        let t = table(cells);
        let e = ExpectedCounts::compute(&t);
        chi_square_tests(&t, &e)
    }

    #[test]
    fn test_independent_table_is_zero() {
        let tests = tests_for(vec![vec![1.0, 1.0], vec![1.0, 1.0]]);
        assert_abs_diff_eq!(tests.pearson.value, 0.0);
        assert_abs_diff_eq!(tests.likelihood_ratio.value, 0.0);
        assert_eq!(tests.pearson.degrees_of_freedom, Some(1.0));
        assert_eq!(tests.cells_below_five, 4);
        assert_abs_diff_eq!(tests.minimum_expected, 1.0);
    }

    #[test]
    fn test_perfect_association() {
        let tests = tests_for(vec![vec![2.0, 0.0], vec![0.0, 2.0]]);
        assert_abs_diff_eq!(tests.pearson.value, 4.0, epsilon = 1e-12);
        // 2 * 4 * 2 * ln 2
        assert_abs_diff_eq!(tests.likelihood_ratio.value, 8.0 * 2f64.ln(), epsilon = 1e-12);
        assert_abs_diff_eq!(tests.mantel_haenszel.value, 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_textbook_2x2() {
        // [[10, 20], [30, 40]]: chi2 = 0.7937, Yates = 0.4464
        let tests = tests_for(vec![vec![10.0, 20.0], vec![30.0, 40.0]]);
        assert_abs_diff_eq!(tests.pearson.value, 0.79365, epsilon = 1e-4);
        let yates = tests.yates_continuity.unwrap();
        assert_abs_diff_eq!(yates.value, 0.44643, epsilon = 1e-4);
        assert!(tests.fisher_exact.is_some());
    }

    #[test]
    fn test_fisher_tea_tasting() {
        // Fisher's lady tasting tea: [[3, 1], [1, 3]]
        let t = table(vec![vec![3.0, 1.0], vec![1.0, 3.0]]);
        let f = fisher_exact(&t);
        assert_abs_diff_eq!(f.observed_probability, 16.0 / 70.0, epsilon = 1e-12);
        assert_abs_diff_eq!(f.one_sided, 17.0 / 70.0, epsilon = 1e-12);
        assert_abs_diff_eq!(f.two_sided, 34.0 / 70.0, epsilon = 1e-12);
    }

    #[test]
    fn test_fisher_large_margins_stay_finite() {
        let t = table(vec![vec![600.0, 400.0], vec![450.0, 550.0]]);
        let f = fisher_exact(&t);
        assert!(f.two_sided.is_finite());
        assert!(f.two_sided > 0.0 && f.two_sided < 1e-6);
    }

    #[test]
    fn test_fisher_weighted_counts_beyond_limit() {
        let t = table(vec![vec![1e13, 2e13], vec![3e13, 4e13]]);
        let f = fisher_exact(&t);
        assert!(f.observed_probability.is_nan());
        assert!(f.two_sided.is_nan());
        assert!(f.one_sided.is_nan());

        let t = table(vec![vec![1.5e12, 2.25e12], vec![3.75e12, 0.5]]);
        assert!(fisher_exact(&t).two_sided.is_nan());

        // the rest of the batch is still computed
        let tests = tests_for(vec![vec![1e13, 2e13], vec![3e13, 4e13]]);
        assert!(tests.pearson.value.is_finite());
        assert!(tests.fisher_exact.unwrap().two_sided.is_nan());
    }

    #[test]
    fn test_fisher_near_limit_with_fractional_weights() {
        // about 600k cases, rounded from non-integer weights
        let t = table(vec![
            vec![150_000.4, 150_000.6],
            vec![149_000.2, 151_000.7],
        ]);
        let f = fisher_exact(&t);
        assert!(f.two_sided.is_finite());
        assert!(f.two_sided > 0.0 && f.two_sided <= 1.0);
        assert!(f.one_sided <= f.two_sided);
    }

    #[test]
    fn test_larger_table_has_no_2x2_tests() {
        let tests = tests_for(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        assert!(tests.fisher_exact.is_none());
        assert!(tests.yates_continuity.is_none());
        assert_eq!(tests.pearson.degrees_of_freedom, Some(2.0));
    }

    #[test]
    fn test_single_row_p_value_is_nan() {
        let tests = tests_for(vec![vec![3.0, 5.0]]);
        assert_abs_diff_eq!(tests.pearson.value, 0.0);
        assert!(tests.pearson.p_value.unwrap().is_nan());
    }

    #[test]
    fn test_mcnemar_2x2() {
        let t = table(vec![vec![10.0, 5.0], vec![1.0, 10.0]]);
        let m = mcnemar_bowker(&t);
        assert_abs_diff_eq!(m.statistic, 16.0 / 6.0, epsilon = 1e-12);
        assert_eq!(m.degrees_of_freedom, 1.0);
        // 2 * P(X <= 1 | n = 6, p = 0.5) = 2 * 7/64
        assert_abs_diff_eq!(m.exact_p_value.unwrap(), 14.0 / 64.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mcnemar_symmetric_with_many_discordant_pairs() {
        let t = table(vec![vec![10.0, 600.0], vec![600.0, 10.0]]);
        let m = mcnemar_bowker(&t);
        assert_abs_diff_eq!(m.statistic, 0.0);
        assert_abs_diff_eq!(m.p_value, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(m.exact_p_value.unwrap(), 1.0, epsilon = 1e-9);

        let t = table(vec![vec![10.0, 560.0], vec![640.0, 10.0]]);
        let exact = mcnemar_bowker(&t).exact_p_value.unwrap();
        assert!(exact > 0.01 && exact < 0.05, "got {exact}");
    }

    #[test]
    fn test_mcnemar_exact_skipped_beyond_limit() {
        let t = table(vec![vec![1.0, 2e13], vec![3e13, 1.0]]);
        let m = mcnemar_bowker(&t);
        assert!(m.exact_p_value.is_none());
        assert!(m.statistic.is_finite());
    }

    #[test]
    fn test_bowker_3x3() {
        let t = table(vec![
            vec![5.0, 2.0, 0.0],
            vec![4.0, 5.0, 1.0],
            vec![0.0, 3.0, 5.0],
        ]);
        let m = mcnemar_bowker(&t);
        // (2-4)²/6 + (1-3)²/4, the empty (1,3)/(3,1) pair contributes nothing
        assert_abs_diff_eq!(m.statistic, 4.0 / 6.0 + 1.0, epsilon = 1e-12);
        assert_eq!(m.degrees_of_freedom, 3.0);
        assert!(m.exact_p_value.is_none());
    }

    #[test]
    fn test_mcnemar_non_square_is_nan() {
        let t = table(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        let m = mcnemar_bowker(&t);
        assert!(m.statistic.is_nan());
        assert!(m.degrees_of_freedom.is_nan());
        assert!(m.p_value.is_nan());
    }
}
