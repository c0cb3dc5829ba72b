use serde::Deserialize;
use serde_json::{json, Value};

use xtab_core::{analyze_crosstab, AnalysisOptions, ContingencyTable, RawValue};

// ---------------------------------------------------------------------------
// Method catalogue for methods/list
// ---------------------------------------------------------------------------

pub const ANALYZE: &str = "crosstab/analyze";
pub const TABLE: &str = "crosstab/table";

fn column_schema(description: &str) -> Value {
    json!({
        "type": "array",
        "items": { "type": ["number", "string", "null"] },
        "description": description
    })
}

fn weights_schema() -> Value {
    json!({
        "type": "array",
        "items": { "type": ["number", "null"] },
        "description": "Optional case weights; cases with a missing, zero, negative or non-finite weight are excluded"
    })
}

pub fn method_definitions() -> Value {
    json!({
        "methods": [
            {
                "name": ANALYZE,
                "description": "Cross-tabulate two variables and compute chi-square tests, association, ordinal, agreement and risk measures.",
                "paramsSchema": {
                    "type": "object",
                    "properties": {
                        "x": column_schema("Row variable values, one per case"),
                        "y": column_schema("Column variable values, one per case"),
                        "weights": weights_schema(),
                        "options": {
                            "type": "object",
                            "properties": {
                                "confidenceLevel": {
                                    "type": "number",
                                    "default": 0.95,
                                    "description": "Interval level for kappa and risk estimates (0.95 or 0.99)"
                                }
                            }
                        }
                    },
                    "required": ["x", "y"]
                }
            },
            {
                "name": TABLE,
                "description": "Build only the contingency table with marginal totals.",
                "paramsSchema": {
                    "type": "object",
                    "properties": {
                        "x": column_schema("Row variable values, one per case"),
                        "y": column_schema("Column variable values, one per case"),
                        "weights": weights_schema()
                    },
                    "required": ["x", "y"]
                }
            }
        ]
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CrosstabParams {
    x: Vec<Option<RawValue>>,
    y: Vec<Option<RawValue>>,
    #[serde(default)]
    weights: Option<Vec<Option<f64>>>,
    #[serde(default)]
    options: AnalysisOptions,
}

impl CrosstabParams {
    fn parse(params: Option<&Value>) -> Result<Self, String> {
        let params = params.ok_or_else(|| "missing params".to_string())?;
        serde_json::from_value(params.clone()).map_err(|e| format!("invalid params: {e}"))
    }

    /// Null weights become NaN so the table builder drops those cases.
    fn weights(&self) -> Option<Vec<f64>> {
        self.weights
            .as_ref()
            .map(|w| w.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    }
}

pub fn analyze(params: Option<&Value>) -> Result<Value, String> {
    let p = CrosstabParams::parse(params)?;
    let weights = p.weights();
    let analysis = analyze_crosstab(&p.x, &p.y, weights.as_deref(), &p.options)
        .map_err(|e| e.to_string())?;
    analysis.to_json().map_err(|e| e.to_string())
}

pub fn table(params: Option<&Value>) -> Result<Value, String> {
    let p = CrosstabParams::parse(params)?;
    let weights = p.weights();
    let table = ContingencyTable::build(&p.x, &p.y, weights.as_deref()).map_err(|e| e.to_string())?;
    serde_json::to_value(table).map_err(|e| format!("serialization error: {e}"))
}
