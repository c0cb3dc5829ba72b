//! Plain-text rendering of an analysis.

use xtab_core::{
    CaseSummary, ChiSquareTests, ContingencyTable, CrosstabAnalysis, ExpectedCounts, McNemarBowker,
    Residuals, RiskEstimate, Statistic,
};

/// Presentation settings for the text report.
pub struct ReportOptions<'a> {
    pub row_label: &'a str,
    pub col_label: &'a str,
    pub decimals: usize,
    pub show_expected: bool,
    pub show_residuals: bool,
}

const LABEL_WIDTH: usize = 36;
const NUM_WIDTH: usize = 11;

#[derive(Default)]
struct Report {
    lines: Vec<String>,
}

impl Report {
    fn line(&mut self, s: impl Into<String>) {
        self.lines.push(s.into());
    }

    fn blank(&mut self) {
        self.lines.push(String::new());
    }

    fn heading(&mut self, title: &str) {
        self.line(title);
        self.line("-".repeat(title.chars().count()));
    }

    fn finish(self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }
}

/// Fixed-precision number, or `N/A` when the value is undefined.
pub fn number(v: f64, decimals: usize) -> String {
    if v.is_finite() {
        format!("{v:.decimals$}")
    } else {
        "N/A".into()
    }
}

/// Counts print without decimals when they are whole.
fn count(v: f64, decimals: usize) -> String {
    if v.is_finite() && v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        number(v, decimals)
    }
}

fn percent(part: usize, whole: usize, decimals: usize) -> String {
    if whole == 0 {
        return "N/A".into();
    }
    format!("{}%", number(part as f64 / whole as f64 * 100.0, decimals.min(1)))
}

fn opt(v: Option<f64>, decimals: usize) -> String {
    v.map(|x| number(x, decimals)).unwrap_or_default()
}

/// Full report: every section in order.
pub fn render_analysis(analysis: &CrosstabAnalysis, opts: &ReportOptions<'_>) -> String {
    let mut r = Report::default();
    case_summary(&mut r, &analysis.case_summary, opts);
    r.blank();
    crosstab(
        &mut r,
        &analysis.table,
        Some(&analysis.expected_counts),
        Some(&analysis.residuals),
        opts,
    );
    r.blank();
    chi_square(&mut r, &analysis.chi_square, &analysis.mc_nemar_bowker, &analysis.table, opts);
    r.blank();
    directional(&mut r, analysis, opts);
    r.blank();
    symmetric(&mut r, analysis, opts);
    if let Some(risk) = &analysis.relative_risk {
        r.blank();
        risk_estimate(&mut r, risk, &analysis.table, opts);
    }
    r.finish()
}

/// Only the crosstabulation with its marginals.
pub fn render_table(table: &ContingencyTable, opts: &ReportOptions<'_>) -> String {
    let mut r = Report::default();
    crosstab(&mut r, table, None, None, opts);
    r.finish()
}

fn case_summary(r: &mut Report, cs: &CaseSummary, opts: &ReportOptions<'_>) {
    r.heading(&format!("Case Summary: {} * {}", opts.row_label, opts.col_label));
    r.line(format!("{:<10}{:>10}{:>10}", "", "N", "Percent"));
    for (label, n) in [("Valid", cs.valid), ("Missing", cs.missing), ("Total", cs.total)] {
        r.line(format!(
            "{label:<10}{n:>10}{:>10}",
            percent(n, cs.total, opts.decimals)
        ));
    }
}

fn crosstab(
    r: &mut Report,
    table: &ContingencyTable,
    expected: Option<&ExpectedCounts>,
    residuals: Option<&Residuals>,
    opts: &ReportOptions<'_>,
) {
    let d = opts.decimals;
    let show_expected = opts.show_expected && expected.is_some();
    let show_residuals = opts.show_residuals && residuals.is_some();

    let row_names: Vec<String> = table.categories_x.iter().map(|c| c.to_string()).collect();
    let col_names: Vec<String> = table.categories_y.iter().map(|c| c.to_string()).collect();

    let label_w = row_names
        .iter()
        .map(|s| s.chars().count())
        .chain([opts.row_label.chars().count(), "Total".len()])
        .max()
        .unwrap_or(5)
        + 2;
    let kind_w = if show_residuals { 15 } else { 10 };
    let cell_w = col_names
        .iter()
        .map(|s| s.chars().count())
        .chain(std::iter::once(table.grand_total.abs().max(1.0).log10() as usize + d + 3))
        .max()
        .unwrap_or(8)
        .max(8)
        + 2;

    let fmt_row = |label: &str, kind: &str, values: &[String]| {
        let mut s = format!("{label:<label_w$}{kind:<kind_w$}");
        for v in values {
            s.push_str(&format!("{v:>cell_w$}"));
        }
        s
    };

    r.heading(&format!("Crosstab: {} * {}", opts.row_label, opts.col_label));
    let mut header = col_names.clone();
    header.push("Total".into());
    r.line(fmt_row(opts.row_label, "", &header));

    for (i, name) in row_names.iter().enumerate() {
        let mut counts: Vec<String> = table.cells[i].iter().map(|&v| count(v, d)).collect();
        counts.push(count(table.row_totals[i], d));
        r.line(fmt_row(name, "Count", &counts));

        if show_expected {
            if let Some(e) = expected {
                let mut values: Vec<String> =
                    (0..table.cols()).map(|j| number(e.get(i, j), d)).collect();
                values.push(number(table.row_totals[i], d));
                r.line(fmt_row("", "Expected", &values));
            }
        }
        if show_residuals {
            if let Some(res) = residuals {
                let values: Vec<String> = res.adjusted[i].iter().map(|&v| number(v, d)).collect();
                r.line(fmt_row("", "Adj. residual", &values));
            }
        }
    }

    let mut totals: Vec<String> = table.col_totals.iter().map(|&v| count(v, d)).collect();
    totals.push(count(table.grand_total, d));
    r.line(fmt_row("Total", "Count", &totals));
}

fn chi_square(
    r: &mut Report,
    tests: &ChiSquareTests,
    bowker: &McNemarBowker,
    table: &ContingencyTable,
    opts: &ReportOptions<'_>,
) {
    let d = opts.decimals;
    r.heading("Chi-Square Tests");
    r.line(format!(
        "{:<LABEL_WIDTH$}{:>NUM_WIDTH$}{:>NUM_WIDTH$}{:>NUM_WIDTH$}",
        "", "Value", "df", "Sig."
    ));

    let test_line = |label: &str, s: &Statistic| {
        format!(
            "{label:<LABEL_WIDTH$}{:>NUM_WIDTH$}{:>NUM_WIDTH$}{:>NUM_WIDTH$}",
            number(s.value, d),
            s.degrees_of_freedom.map(|df| number(df, 0)).unwrap_or_default(),
            opt(s.p_value, d),
        )
    };

    r.line(test_line("Pearson Chi-Square", &tests.pearson));
    if let Some(yates) = &tests.yates_continuity {
        r.line(test_line("Continuity Correction", yates));
    }
    r.line(test_line("Likelihood Ratio", &tests.likelihood_ratio));
    r.line(test_line("Linear-by-Linear Association", &tests.mantel_haenszel));
    if let Some(fisher) = &tests.fisher_exact {
        r.line(format!(
            "{:<LABEL_WIDTH$}{:>NUM_WIDTH$}{:>NUM_WIDTH$}{:>NUM_WIDTH$}",
            "Fisher's Exact Test (2-sided)",
            "",
            "",
            number(fisher.two_sided, d)
        ));
        r.line(format!(
            "{:<LABEL_WIDTH$}{:>NUM_WIDTH$}{:>NUM_WIDTH$}{:>NUM_WIDTH$}",
            "Fisher's Exact Test (1-sided)",
            "",
            "",
            number(fisher.one_sided, d)
        ));
    }
    if table.is_square() {
        let label = if table.is_2x2() {
            "McNemar Test"
        } else {
            "McNemar-Bowker Test"
        };
        let sig = bowker.exact_p_value.unwrap_or(bowker.p_value);
        r.line(format!(
            "{label:<LABEL_WIDTH$}{:>NUM_WIDTH$}{:>NUM_WIDTH$}{:>NUM_WIDTH$}",
            number(bowker.statistic, d),
            number(bowker.degrees_of_freedom, 0),
            number(sig, d),
        ));
    }
    r.line(format!(
        "{:<LABEL_WIDTH$}{:>NUM_WIDTH$}",
        "N of Valid Cases",
        count(table.grand_total, d)
    ));

    let cells = table.rows() * table.cols();
    if cells > 0 {
        r.line(format!(
            "{} cells ({}) have expected count less than 5. The minimum expected count is {}.",
            tests.cells_below_five,
            percent(tests.cells_below_five, cells, d),
            number(tests.minimum_expected, 2),
        ));
    }
}

fn measure_header(r: &mut Report) {
    r.line(format!(
        "{:<LABEL_WIDTH$}{:>NUM_WIDTH$}{:>NUM_WIDTH$}{:>NUM_WIDTH$}",
        "", "Value", "Asymp. SE", "Approx. Sig."
    ));
}

fn measure_line(r: &mut Report, label: &str, s: &Statistic, d: usize) {
    r.line(format!(
        "{label:<LABEL_WIDTH$}{:>NUM_WIDTH$}{:>NUM_WIDTH$}{:>NUM_WIDTH$}",
        number(s.value, d),
        opt(s.standard_error, d),
        opt(s.p_value, d),
    ));
}

fn directional(r: &mut Report, a: &CrosstabAnalysis, opts: &ReportOptions<'_>) {
    let d = opts.decimals;
    let row_dep = format!("{} dependent", opts.row_label);
    let col_dep = format!("{} dependent", opts.col_label);

    r.heading("Directional Measures");
    measure_header(r);
    measure_line(r, "Lambda: Symmetric", &a.lambda.symmetric, d);
    measure_line(r, &format!("Lambda: {row_dep}"), &a.lambda.x_dependent, d);
    measure_line(r, &format!("Lambda: {col_dep}"), &a.lambda.y_dependent, d);
    measure_line(r, &format!("GK tau: {row_dep}"), &a.goodman_kruskal_tau.x_dependent, d);
    measure_line(r, &format!("GK tau: {col_dep}"), &a.goodman_kruskal_tau.y_dependent, d);
    measure_line(r, "Uncertainty: Symmetric", &a.uncertainty_coefficient.symmetric, d);
    measure_line(r, &format!("Uncertainty: {row_dep}"), &a.uncertainty_coefficient.x_dependent, d);
    measure_line(r, &format!("Uncertainty: {col_dep}"), &a.uncertainty_coefficient.y_dependent, d);
    measure_line(r, "Somers' d: Symmetric", &a.somers_d.symmetric, d);
    measure_line(r, &format!("Somers' d: {row_dep}"), &a.somers_d.x_dependent, d);
    measure_line(r, &format!("Somers' d: {col_dep}"), &a.somers_d.y_dependent, d);
    measure_line(r, &format!("Eta: {row_dep}"), &a.eta.x_dependent, d);
    measure_line(r, &format!("Eta: {col_dep}"), &a.eta.y_dependent, d);
}

fn symmetric(r: &mut Report, a: &CrosstabAnalysis, opts: &ReportOptions<'_>) {
    let d = opts.decimals;
    r.heading("Symmetric Measures");
    measure_header(r);
    measure_line(r, "Phi", &a.association_measures.phi, d);
    measure_line(r, "Cramer's V", &a.association_measures.cramers_v, d);
    measure_line(r, "Contingency Coefficient", &a.association_measures.contingency_coefficient, d);
    measure_line(r, "Kendall's tau-b", &a.kendalls_tau.tau_b, d);
    measure_line(r, "Kendall's tau-c", &a.kendalls_tau.tau_c, d);
    measure_line(r, "Gamma", &a.gamma, d);
    measure_line(r, "Spearman Correlation", &a.spearman_correlation, d);
    measure_line(r, "Pearson's R", &a.pearson_correlation, d);
    measure_line(r, "Kappa", &a.cohens_kappa, d);
    r.line(format!(
        "{:<LABEL_WIDTH$}{:>NUM_WIDTH$}",
        "N of Valid Cases",
        count(a.table.grand_total, d)
    ));
}

fn risk_estimate(r: &mut Report, risk: &RiskEstimate, table: &ContingencyTable, opts: &ReportOptions<'_>) {
    let d = opts.decimals;
    r.heading("Risk Estimate");
    r.line(format!(
        "{:<LABEL_WIDTH$}{:>NUM_WIDTH$}{:>NUM_WIDTH$}{:>NUM_WIDTH$}",
        "", "Value", "Lower", "Upper"
    ));

    let x = &table.categories_x;
    let y = &table.categories_y;
    let rows = [
        (
            format!("Odds Ratio for {} ({} / {})", opts.row_label, x[0], x[1]),
            &risk.odds_ratio,
        ),
        (
            format!("For cohort {} = {}", opts.col_label, y[0]),
            &risk.relative_risk_first_column,
        ),
        (
            format!("For cohort {} = {}", opts.col_label, y[1]),
            &risk.relative_risk_second_column,
        ),
    ];
    for (label, s) in rows {
        let (lo, hi) = s
            .confidence_interval
            .map(|(lo, hi)| (number(lo, d), number(hi, d)))
            .unwrap_or_default();
        r.line(format!(
            "{label:<LABEL_WIDTH$}{:>NUM_WIDTH$}{lo:>NUM_WIDTH$}{hi:>NUM_WIDTH$}",
            number(s.value, d)
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xtab_core::{analyze_crosstab, AnalysisOptions, RawValue};

    fn opts() -> ReportOptions<'static> {
        ReportOptions {
            row_label: "exposed",
            col_label: "ill",
            decimals: 3,
            show_expected: true,
            show_residuals: true,
        }
    }

    fn nums(values: &[f64]) -> Vec<Option<RawValue>> {
        values.iter().map(|v| Some(RawValue::Number(*v))).collect()
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(number(0.12345, 3), "0.123");
        assert_eq!(number(f64::NAN, 3), "N/A");
        assert_eq!(count(12.0, 3), "12");
        assert_eq!(count(2.5, 2), "2.50");
        assert_eq!(percent(1, 4, 3), "25.0%");
        assert_eq!(percent(0, 0, 3), "N/A");
    }

    #[test]
    fn test_full_report_sections() {
        let a = analyze_crosstab(
            &nums(&[1.0, 1.0, 1.0, 2.0, 2.0, 2.0]),
            &nums(&[1.0, 1.0, 2.0, 2.0, 2.0, 1.0]),
            None,
            &AnalysisOptions::default(),
        )
        .unwrap();
        let text = render_analysis(&a, &opts());
        for section in [
            "Case Summary: exposed * ill",
            "Crosstab: exposed * ill",
            "Chi-Square Tests",
            "Directional Measures",
            "Symmetric Measures",
            "Risk Estimate",
        ] {
            assert!(text.contains(section), "missing section {section}");
        }
        assert!(text.contains("Fisher's Exact Test (2-sided)"));
        assert!(text.contains("McNemar Test"));
        assert!(text.contains("Adj. residual"));
    }

    #[test]
    fn test_undefined_values_render_na() {
        let a = analyze_crosstab(
            &nums(&[1.0, 1.0, 2.0]),
            &nums(&[1.0, 2.0, 3.0]),
            None,
            &AnalysisOptions::default(),
        )
        .unwrap();
        let text = render_analysis(&a, &opts());
        let kappa = text.lines().find(|l| l.starts_with("Kappa")).unwrap();
        assert!(kappa.contains("N/A"));
        assert!(!text.contains("Risk Estimate"));
        assert!(!text.contains("McNemar"));
    }

    #[test]
    fn test_table_only() {
        let a = analyze_crosstab(
            &[Some("a".into()), Some("b".into()), None],
            &nums(&[1.0, 2.0, 2.0]),
            None,
            &AnalysisOptions::default(),
        )
        .unwrap();
        let text = render_table(&a.table, &opts());
        assert!(text.starts_with("Crosstab: exposed * ill"));
        assert!(!text.contains("Expected"));
        assert!(!text.contains("Chi-Square"));
        let total = text.lines().last().unwrap();
        assert!(total.starts_with("Total"));
        assert!(total.trim_end().ends_with('2'));
    }
}
