use serde::Serialize;

/// One reported test or measure.
///
/// Degenerate inputs never raise; `value` and `p_value` become `NaN` and the
/// optional parts are left out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistic {
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standard_error: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degrees_of_freedom: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_interval: Option<(f64, f64)>,
}

impl Statistic {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            standard_error: None,
            degrees_of_freedom: None,
            p_value: None,
            confidence_interval: None,
        }
    }

    pub fn nan() -> Self {
        Self::new(f64::NAN)
    }

    pub fn with_se(mut self, se: f64) -> Self {
        self.standard_error = Some(se);
        self
    }

    pub fn with_df(mut self, df: usize) -> Self {
        self.degrees_of_freedom = Some(df as f64);
        self
    }

    pub fn with_p(mut self, p: f64) -> Self {
        self.p_value = Some(p);
        self
    }

    pub fn with_ci(mut self, lower: f64, upper: f64) -> Self {
        self.confidence_interval = Some((lower, upper));
        self
    }
}

/// `num / den`, or `NaN` when the denominator is zero or not finite.
pub(crate) fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 || !den.is_finite() {
        f64::NAN
    } else {
        num / den
    }
}

/// z for the two-sided interval at `confidence_level`.
///
/// Only 95% and 99% are tabulated; any other level falls back to 1.96.
pub fn z_for_confidence(confidence_level: f64) -> f64 {
    if (confidence_level - 0.99).abs() < 1e-9 {
        2.576
    } else {
        1.96
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_guards_denominator() {
        assert_eq!(ratio(3.0, 2.0), 1.5);
        assert!(ratio(1.0, 0.0).is_nan());
        assert!(ratio(1.0, f64::INFINITY).is_nan());
        assert!(ratio(0.0, f64::NAN).is_nan());
    }

    #[test]
    fn test_z_for_confidence() {
        assert_eq!(z_for_confidence(0.95), 1.96);
        assert_eq!(z_for_confidence(0.99), 2.576);
        assert_eq!(z_for_confidence(0.90), 1.96);
    }

    #[test]
    fn test_optional_parts_are_skipped() {
        let json = serde_json::to_value(Statistic::new(0.5).with_df(2)).unwrap();
        assert_eq!(json, serde_json::json!({"value": 0.5, "degreesOfFreedom": 2.0}));

        let json = serde_json::to_value(Statistic::nan().with_ci(1.0, 2.0)).unwrap();
        assert!(json["value"].is_null());
        assert_eq!(json["confidenceInterval"], serde_json::json!([1.0, 2.0]));
    }
}
