use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use crate::category::{CategoryKey, RawValue};
use crate::error::{XtabError, XtabResult};

/// Unweighted case counts seen by the table builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseSummary {
    pub valid: usize,
    pub missing: usize,
    pub total: usize,
}

/// Cross-tabulation of two categorical variables.
///
/// Rows follow `categories_x`, columns follow `categories_y`. The table is
/// immutable once built; every total is derived from `cells`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContingencyTable {
    pub categories_x: Vec<CategoryKey>,
    pub categories_y: Vec<CategoryKey>,
    pub cells: Vec<Vec<f64>>,
    pub row_totals: Vec<f64>,
    pub col_totals: Vec<f64>,
    pub grand_total: f64,
    pub case_summary: CaseSummary,
}

impl ContingencyTable {
    /// Build a table from paired observations and optional case weights.
    ///
    /// A pair is counted when both values are present and its weight is a
    /// positive finite number. Categories come only from counted pairs.
    pub fn build(
        x: &[Option<RawValue>],
        y: &[Option<RawValue>],
        weights: Option<&[f64]>,
    ) -> XtabResult<Self> {
        if y.len() != x.len() {
            return Err(XtabError::ShapeMismatch {
                what: "y values",
                expected: x.len(),
                actual: y.len(),
            });
        }
        if let Some(w) = weights {
            if w.len() != x.len() {
                return Err(XtabError::ShapeMismatch {
                    what: "weights",
                    expected: x.len(),
                    actual: w.len(),
                });
            }
        }

        let mut pairs = Vec::with_capacity(x.len());
        for i in 0..x.len() {
            let weight = weights.map_or(1.0, |w| w[i]);
            if !(weight.is_finite() && weight > 0.0) {
                continue;
            }
            let (Some(kx), Some(ky)) = (
                CategoryKey::from_raw(x[i].as_ref()),
                CategoryKey::from_raw(y[i].as_ref()),
            ) else {
                continue;
            };
            pairs.push((kx, ky, weight));
        }

        let categories_x: Vec<CategoryKey> = pairs
            .iter()
            .map(|(kx, _, _)| kx.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let categories_y: Vec<CategoryKey> = pairs
            .iter()
            .map(|(_, ky, _)| ky.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut cells = vec![vec![0.0; categories_y.len()]; categories_x.len()];
        for (kx, ky, w) in &pairs {
            // Both keys came from these lists, so the searches always hit.
            if let (Ok(i), Ok(j)) = (categories_x.binary_search(kx), categories_y.binary_search(ky)) {
                cells[i][j] += w;
            }
        }

        let case_summary = CaseSummary {
            valid: pairs.len(),
            missing: x.len() - pairs.len(),
            total: x.len(),
        };

        debug!(
            rows = categories_x.len(),
            cols = categories_y.len(),
            valid = case_summary.valid,
            missing = case_summary.missing,
            "built contingency table"
        );

        Ok(Self::assemble(categories_x, categories_y, cells, case_summary))
    }

    /// Build a table from an already aggregated grid of counts.
    pub fn from_counts(
        categories_x: Vec<CategoryKey>,
        categories_y: Vec<CategoryKey>,
        cells: Vec<Vec<f64>>,
    ) -> XtabResult<Self> {
        if cells.len() != categories_x.len() {
            return Err(XtabError::ShapeMismatch {
                what: "table rows",
                expected: categories_x.len(),
                actual: cells.len(),
            });
        }
        if let Some(row) = cells.iter().find(|r| r.len() != categories_y.len()) {
            return Err(XtabError::ShapeMismatch {
                what: "table columns",
                expected: categories_y.len(),
                actual: row.len(),
            });
        }

        let cases = cells.iter().flatten().sum::<f64>().round().max(0.0) as usize;
        let case_summary = CaseSummary {
            valid: cases,
            missing: 0,
            total: cases,
        };
        Ok(Self::assemble(categories_x, categories_y, cells, case_summary))
    }

    fn assemble(
        categories_x: Vec<CategoryKey>,
        categories_y: Vec<CategoryKey>,
        cells: Vec<Vec<f64>>,
        case_summary: CaseSummary,
    ) -> Self {
        let row_totals: Vec<f64> = cells.iter().map(|row| row.iter().sum()).collect();
        let col_totals: Vec<f64> = (0..categories_y.len())
            .map(|j| cells.iter().map(|row| row[j]).sum())
            .collect();
        let grand_total = row_totals.iter().sum();

        Self {
            categories_x,
            categories_y,
            cells,
            row_totals,
            col_totals,
            grand_total,
            case_summary,
        }
    }

    pub fn rows(&self) -> usize {
        self.categories_x.len()
    }

    pub fn cols(&self) -> usize {
        self.categories_y.len()
    }

    /// Square in the agreement sense: X and Y share the same ordered categories.
    pub fn is_square(&self) -> bool {
        self.rows() > 0 && self.categories_x == self.categories_y
    }

    pub fn is_2x2(&self) -> bool {
        self.rows() == 2 && self.cols() == 2
    }

    /// `(R-1)(C-1)`, zero for an empty or single-line table.
    pub fn degrees_of_freedom(&self) -> usize {
        self.rows().saturating_sub(1) * self.cols().saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn nums(values: &[f64]) -> Vec<Option<RawValue>> {
        values.iter().map(|v| Some(RawValue::Number(*v))).collect()
    }

    #[test]
    fn test_build_balanced_2x2() {
        let table = ContingencyTable::build(
            &nums(&[1.0, 1.0, 2.0, 2.0]),
            &nums(&[1.0, 2.0, 1.0, 2.0]),
            None,
        )
        .unwrap();
        assert!(table.is_2x2());
        assert_eq!(table.cells, vec![vec![1.0, 1.0], vec![1.0, 1.0]]);
        assert_eq!(table.grand_total, 4.0);
        assert_eq!(table.row_totals, vec![2.0, 2.0]);
        assert_eq!(table.col_totals, vec![2.0, 2.0]);
    }

    #[test]
    fn test_shape_mismatch() {
        let result = ContingencyTable::build(&nums(&[1.0, 2.0]), &nums(&[1.0]), None);
        assert!(matches!(
            result,
            Err(XtabError::ShapeMismatch { what: "y values", .. })
        ));

        let result = ContingencyTable::build(&nums(&[1.0]), &nums(&[1.0]), Some(&[1.0, 1.0]));
        assert!(matches!(
            result,
            Err(XtabError::ShapeMismatch { what: "weights", .. })
        ));
    }

    #[test]
    fn test_missing_and_invalid_weights_excluded() {
        let x = vec![
            Some(RawValue::Number(1.0)),
            None,
            Some(RawValue::Number(2.0)),
            Some(RawValue::Number(3.0)),
            Some(RawValue::Number(4.0)),
        ];
        let y = nums(&[1.0, 1.0, 2.0, 2.0, 1.0]);
        let weights = [2.0, 1.0, 0.5, 0.0, f64::NAN];
        let table = ContingencyTable::build(&x, &y, Some(&weights)).unwrap();

        // 3 has zero weight and 4 has NaN weight: neither becomes a category.
        assert_eq!(
            table.categories_x,
            vec![CategoryKey::Number(1.0), CategoryKey::Number(2.0)]
        );
        assert_abs_diff_eq!(table.grand_total, 2.5);
        assert_eq!(table.case_summary.valid, 2);
        assert_eq!(table.case_summary.missing, 3);
        assert_eq!(table.case_summary.total, 5);
    }

    #[test]
    fn test_totals_consistent() {
        let table = ContingencyTable::build(
            &nums(&[1.0, 1.0, 2.0, 3.0, 3.0, 3.0]),
            &nums(&[1.0, 2.0, 2.0, 1.0, 2.0, 2.0]),
            Some(&[1.5, 2.0, 1.0, 0.25, 3.0, 1.0]),
        )
        .unwrap();
        let cell_sum: f64 = table.cells.iter().flatten().sum();
        let row_sum: f64 = table.row_totals.iter().sum();
        let col_sum: f64 = table.col_totals.iter().sum();
        assert_abs_diff_eq!(cell_sum, table.grand_total, epsilon = 1e-12);
        assert_abs_diff_eq!(row_sum, table.grand_total, epsilon = 1e-12);
        assert_abs_diff_eq!(col_sum, table.grand_total, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_table() {
        let table = ContingencyTable::build(&[None], &nums(&[1.0]), None).unwrap();
        assert_eq!(table.rows(), 0);
        assert_eq!(table.grand_total, 0.0);
        assert_eq!(table.degrees_of_freedom(), 0);
        assert!(!table.is_square());
    }

    #[test]
    fn test_mixed_text_and_numbers() {
        let x = vec![
            Some(RawValue::Text("b".into())),
            Some(RawValue::Text("1".into())),
            Some(RawValue::Number(1.0)),
            Some(RawValue::Text("a".into())),
        ];
        let y = nums(&[1.0, 1.0, 1.0, 1.0]);
        let table = ContingencyTable::build(&x, &y, None).unwrap();
        assert_eq!(table.rows(), 3);
        assert_eq!(table.cells[0][0], 2.0);
        assert_eq!(table.categories_x[2], CategoryKey::Text("b".into()));
    }

    #[test]
    fn test_from_counts_rejects_ragged_grid() {
        let cats = vec![CategoryKey::Number(1.0), CategoryKey::Number(2.0)];
        let result = ContingencyTable::from_counts(
            cats.clone(),
            cats,
            vec![vec![1.0, 2.0], vec![3.0]],
        );
        assert!(matches!(result, Err(XtabError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_is_square_requires_same_categories() {
        let a = vec![CategoryKey::Number(1.0), CategoryKey::Number(2.0)];
        let b = vec![CategoryKey::Number(1.0), CategoryKey::Number(3.0)];
        let grid = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let square = ContingencyTable::from_counts(a.clone(), a.clone(), grid.clone()).unwrap();
        let shifted = ContingencyTable::from_counts(a, b, grid).unwrap();
        assert!(square.is_square());
        assert!(!shifted.is_square());
    }
}
