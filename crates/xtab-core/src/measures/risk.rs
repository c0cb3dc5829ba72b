use serde::Serialize;

use crate::statistic::{ratio, z_for_confidence, Statistic};
use crate::table::ContingencyTable;

/// Risk estimates for a 2x2 table.
///
/// Rows are the exposure groups; the relative risks compare the chance of
/// landing in the first (or second) column between row 1 and row 2.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskEstimate {
    pub odds_ratio: Statistic,
    pub relative_risk_first_column: Statistic,
    pub relative_risk_second_column: Statistic,
}

/// `None` unless the table is 2x2.
pub fn relative_risk(table: &ContingencyTable, confidence_level: f64) -> Option<RiskEstimate> {
    if !table.is_2x2() {
        return None;
    }
    let a = table.cells[0][0];
    let b = table.cells[0][1];
    let c = table.cells[1][0];
    let d = table.cells[1][1];
    let z = z_for_confidence(confidence_level);

    let odds_ratio = log_wald(
        ratio(a * d, b * c),
        (1.0 / a + 1.0 / b + 1.0 / c + 1.0 / d).sqrt(),
        z,
    );
    let relative_risk_first_column = log_wald(
        ratio(ratio(a, a + b), ratio(c, c + d)),
        (b / (a * (a + b)) + d / (c * (c + d))).sqrt(),
        z,
    );
    let relative_risk_second_column = log_wald(
        ratio(ratio(b, a + b), ratio(d, c + d)),
        (a / (b * (a + b)) + c / (d * (c + d))).sqrt(),
        z,
    );

    Some(RiskEstimate {
        odds_ratio,
        relative_risk_first_column,
        relative_risk_second_column,
    })
}

/// Estimate with a Wald interval built on the log scale. The interval is
/// left out when the estimate or its log standard error is not finite.
fn log_wald(estimate: f64, se_log: f64, z: f64) -> Statistic {
    let stat = Statistic::new(estimate);
    if !(estimate.is_finite() && estimate > 0.0 && se_log.is_finite()) {
        return stat;
    }
    let ln = estimate.ln();
    stat.with_se(se_log)
        .with_ci((ln - z * se_log).exp(), (ln + z * se_log).exp())
}
