use serde::Serialize;

use crate::table::ContingencyTable;

/// Cell counts expected under independence, `row_total * col_total / N`.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct ExpectedCounts(pub Vec<Vec<f64>>);

impl ExpectedCounts {
    /// Every entry is `NaN` when the grand total is zero.
    pub fn compute(table: &ContingencyTable) -> Self {
        let n = table.grand_total;
        let grid = table
            .row_totals
            .iter()
            .map(|r| {
                table
                    .col_totals
                    .iter()
                    .map(|c| if n > 0.0 { r * c / n } else { f64::NAN })
                    .collect()
            })
            .collect();
        Self(grid)
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.0[i][j]
    }

    pub fn cells(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().flatten().copied()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Residuals {
    pub raw: Vec<Vec<f64>>,
    pub standardized: Vec<Vec<f64>>,
    pub adjusted: Vec<Vec<f64>>,
}

impl Residuals {
    /// Cells whose expected count is zero (or undefined) get 0 in every grid.
    pub fn compute(table: &ContingencyTable, expected: &ExpectedCounts) -> Self {
        let n = table.grand_total;
        let rows = table.rows();
        let cols = table.cols();
        let mut raw = vec![vec![0.0; cols]; rows];
        let mut standardized = vec![vec![0.0; cols]; rows];
        let mut adjusted = vec![vec![0.0; cols]; rows];

        for i in 0..rows {
            for j in 0..cols {
                let e = expected.get(i, j);
                if e.is_nan() || e <= 0.0 {
                    continue;
                }
                let r = table.cells[i][j] - e;
                raw[i][j] = r;
                standardized[i][j] = r / e.sqrt();

                let row_prop = table.row_totals[i] / n;
                let col_prop = table.col_totals[j] / n;
                let denom = (e * (1.0 - row_prop) * (1.0 - col_prop)).sqrt();
                adjusted[i][j] = if denom > 0.0 { r / denom } else { 0.0 };
            }
        }

        Self {
            raw,
            standardized,
            adjusted,
        }
    }
}

/// Cell percentages (0-100) of the row, column and grand totals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Percentages {
    pub row: Vec<Vec<f64>>,
    pub column: Vec<Vec<f64>>,
    pub total: Vec<Vec<f64>>,
}

impl Percentages {
    pub fn compute(table: &ContingencyTable) -> Self {
        let pct = |v: f64, d: f64| if d > 0.0 { 100.0 * v / d } else { 0.0 };
        let grid = |f: &dyn Fn(usize, usize, f64) -> f64| -> Vec<Vec<f64>> {
            table
                .cells
                .iter()
                .enumerate()
                .map(|(i, row)| row.iter().enumerate().map(|(j, &v)| f(i, j, v)).collect())
                .collect()
        };

        Self {
            row: grid(&|i, _, v| pct(v, table.row_totals[i])),
            column: grid(&|_, j, v| pct(v, table.col_totals[j])),
            total: grid(&|_, _, v| pct(v, table.grand_total)),
        }
    }
}
