use crate::distribution::normal_two_sided_p;
use crate::statistic::{ratio, z_for_confidence, Statistic};
use crate::table::ContingencyTable;

/// Cohen's kappa with the Fleiss-Cohen-Everitt standard errors.
///
/// Only defined when X and Y share the same ordered categories; anything
/// else yields `NaN`.
pub fn cohens_kappa(table: &ContingencyTable, confidence_level: f64) -> Statistic {
    let n = table.grand_total;
    if !table.is_square() || n <= 0.0 {
        return Statistic::nan();
    }
    let k = table.rows();
    let pr: Vec<f64> = table.row_totals.iter().map(|r| r / n).collect();
    let pc: Vec<f64> = table.col_totals.iter().map(|c| c / n).collect();

    let po: f64 = (0..k).map(|i| table.cells[i][i] / n).sum();
    let pe: f64 = (0..k).map(|i| pr[i] * pc[i]).sum();
    let kappa = ratio(po - pe, 1.0 - pe);
    if kappa.is_nan() {
        return Statistic::nan();
    }

    let one_minus = 1.0 - kappa;
    let mut a = 0.0;
    let mut b = 0.0;
    for i in 0..k {
        for j in 0..k {
            let pij = table.cells[i][j] / n;
            if i == j {
                a += pij * (1.0 - (pr[i] + pc[i]) * one_minus).powi(2);
            } else {
                b += pij * (pc[i] + pr[j]).powi(2);
            }
        }
    }
    b *= one_minus * one_minus;
    let c = (kappa - pe * one_minus).powi(2);
    let ase1 = ((a + b - c).max(0.0) / n).sqrt() / (1.0 - pe);

    let null_term: f64 = (0..k).map(|i| pr[i] * pc[i] * (pr[i] + pc[i])).sum();
    let ase0 = ((pe + pe * pe - null_term).max(0.0) / n).sqrt() / (1.0 - pe);

    let z = z_for_confidence(confidence_level);
    Statistic::new(kappa)
        .with_se(ase1)
        .with_p(normal_two_sided_p(ratio(kappa, ase0)))
        .with_ci(kappa - z * ase1, kappa + z * ase1)
}
