//! Single entry point that builds the table and runs every test and measure.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::category::RawValue;
use crate::error::XtabResult;
use crate::expected::{ExpectedCounts, Percentages, Residuals};
use crate::measures::{
    agreement, correlation, nominal, ordinal, risk, AssociationMeasures, Concordance, Eta,
    GoodmanKruskalTau, KendallsTau, Lambda, RiskEstimate, SomersD, UncertaintyCoefficient,
};
use crate::significance::{self, ChiSquareTests, McNemarBowker};
use crate::statistic::Statistic;
use crate::table::{CaseSummary, ContingencyTable};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalysisOptions {
    /// Level for the kappa and risk intervals. 0.95 and 0.99 are tabulated.
    pub confidence_level: f64,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            confidence_level: 0.95,
        }
    }
}

/// Every table, test and measure for one pair of variables.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrosstabAnalysis {
    pub case_summary: CaseSummary,
    pub table: ContingencyTable,
    pub expected_counts: ExpectedCounts,
    pub percentages: Percentages,
    pub residuals: Residuals,
    pub chi_square: ChiSquareTests,
    pub association_measures: AssociationMeasures,
    pub lambda: Lambda,
    pub goodman_kruskal_tau: GoodmanKruskalTau,
    pub uncertainty_coefficient: UncertaintyCoefficient,
    pub cohens_kappa: Statistic,
    pub kendalls_tau: KendallsTau,
    pub gamma: Statistic,
    pub somers_d: SomersD,
    pub pearson_correlation: Statistic,
    pub spearman_correlation: Statistic,
    pub eta: Eta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_risk: Option<RiskEstimate>,
    pub mc_nemar_bowker: McNemarBowker,
}

impl CrosstabAnalysis {
    /// Wire form: camelCase keys, `null` for undefined statistics.
    pub fn to_json(&self) -> XtabResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Cross-tabulate `x` against `y` and compute the full statistics batch.
///
/// Only a length mismatch between the inputs is an error. Degenerate tables
/// still produce a complete result with `NaN` where a statistic is undefined.
pub fn analyze_crosstab(
    x: &[Option<RawValue>],
    y: &[Option<RawValue>],
    weights: Option<&[f64]>,
    options: &AnalysisOptions,
) -> XtabResult<CrosstabAnalysis> {
    let table = ContingencyTable::build(x, y, weights)?;
    Ok(analyze_table(table, options))
}

/// Run the statistics batch on an already built table.
pub fn analyze_table(table: ContingencyTable, options: &AnalysisOptions) -> CrosstabAnalysis {
    let expected_counts = ExpectedCounts::compute(&table);
    let percentages = Percentages::compute(&table);
    let residuals = Residuals::compute(&table, &expected_counts);
    let chi_square = significance::chi_square_tests(&table, &expected_counts);

    let association_measures = nominal::association_measures(&table, &chi_square.pearson);
    let lambda = nominal::lambda(&table);
    let goodman_kruskal_tau = nominal::goodman_kruskal_tau(&table);
    let uncertainty_coefficient =
        nominal::uncertainty_coefficient(&table, &chi_square.likelihood_ratio);

    let cohens_kappa = agreement::cohens_kappa(&table, options.confidence_level);

    let concordance = Concordance::compute(&table);
    let kendalls_tau = ordinal::kendalls_tau(&table, &concordance);
    let gamma = ordinal::gamma(&table, &concordance);
    let somers_d = ordinal::somers_d(&table, &concordance);

    let pearson_correlation = correlation::pearson(&table);
    let spearman_correlation = correlation::spearman(&table);
    let eta = correlation::eta(&table);

    let relative_risk = risk::relative_risk(&table, options.confidence_level);
    let mc_nemar_bowker = significance::mcnemar_bowker(&table);

    debug!(
        rows = table.rows(),
        cols = table.cols(),
        n = table.grand_total,
        chi_square = chi_square.pearson.value,
        "crosstab analysis complete"
    );

    CrosstabAnalysis {
        case_summary: table.case_summary,
        table,
        expected_counts,
        percentages,
        residuals,
        chi_square,
        association_measures,
        lambda,
        goodman_kruskal_tau,
        uncertainty_coefficient,
        cohens_kappa,
        kendalls_tau,
        gamma,
        somers_d,
        pearson_correlation,
        spearman_correlation,
        eta,
        relative_risk,
        mc_nemar_bowker,
    }
}
