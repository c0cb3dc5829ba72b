pub mod analysis;
pub mod category;
pub mod distribution;
pub mod error;
pub mod expected;
pub mod measures;
pub mod significance;
pub mod statistic;
pub mod table;

pub use analysis::{analyze_crosstab, AnalysisOptions, CrosstabAnalysis};
pub use category::{CategoryKey, RawValue};
pub use error::{XtabError, XtabResult};
pub use expected::{ExpectedCounts, Percentages, Residuals};
pub use measures::{
    AssociationMeasures, Eta, GoodmanKruskalTau, KendallsTau, Lambda, RiskEstimate, SomersD,
    UncertaintyCoefficient,
};
pub use significance::{ChiSquareTests, FisherExact, McNemarBowker};
pub use statistic::Statistic;
pub use table::{CaseSummary, ContingencyTable};
