pub mod agreement;
pub mod correlation;
pub mod nominal;
pub mod ordinal;
pub mod risk;

pub use correlation::Eta;
pub use nominal::{AssociationMeasures, GoodmanKruskalTau, Lambda, UncertaintyCoefficient};
pub use ordinal::{Concordance, KendallsTau, SomersD};
pub use risk::RiskEstimate;
