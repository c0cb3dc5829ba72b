//! JSON datasets: either an object of column arrays or an array of records.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};

use xtab_core::RawValue;

#[derive(Debug)]
pub struct Dataset {
    columns: Map<String, Value>,
}

impl Dataset {
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let value: Value =
            serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        Self::from_json(value).with_context(|| format!("loading dataset {}", path.display()))
    }

    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Object(columns) => {
                if let Some((name, _)) = columns.iter().find(|(_, v)| !v.is_array()) {
                    bail!("column '{name}' is not an array");
                }
                Ok(Self { columns })
            }
            Value::Array(records) => Self::from_records(records),
            _ => bail!("dataset must be an object of columns or an array of records"),
        }
    }

    fn from_records(records: Vec<Value>) -> Result<Self> {
        let mut names: Vec<String> = Vec::new();
        for (i, record) in records.iter().enumerate() {
            let Some(obj) = record.as_object() else {
                bail!("record {i} is not an object");
            };
            for key in obj.keys() {
                if !names.contains(key) {
                    names.push(key.clone());
                }
            }
        }

        let mut columns = Map::new();
        for name in names {
            let values: Vec<Value> = records
                .iter()
                .map(|r| r.get(&name).cloned().unwrap_or(Value::Null))
                .collect();
            columns.insert(name, Value::Array(values));
        }
        Ok(Self { columns })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    fn column(&self, name: &str) -> Result<&Vec<Value>> {
        match self.columns.get(name) {
            Some(Value::Array(values)) => Ok(values),
            _ => {
                let known: Vec<&str> = self.names().collect();
                bail!("unknown variable '{name}' (available: {})", known.join(", "))
            }
        }
    }

    /// Category values of a variable. Booleans code as 0/1.
    pub fn variable(&self, name: &str) -> Result<Vec<Option<RawValue>>> {
        self.column(name)?
            .iter()
            .enumerate()
            .map(|(i, v)| match v {
                Value::Null => Ok(None),
                Value::Number(n) => Ok(n.as_f64().map(RawValue::Number)),
                Value::String(s) => Ok(Some(RawValue::Text(s.clone()))),
                Value::Bool(b) => Ok(Some(RawValue::Number(if *b { 1.0 } else { 0.0 }))),
                _ => bail!("variable '{name}' row {i}: nested values are not supported"),
            })
            .collect()
    }

    /// Case weights. Anything that is not a number becomes NaN, which the
    /// table builder treats as an invalid weight.
    pub fn weights(&self, name: &str) -> Result<Vec<f64>> {
        Ok(self
            .column(name)?
            .iter()
            .map(|v| v.as_f64().unwrap_or(f64::NAN))
            .collect())
    }
}
