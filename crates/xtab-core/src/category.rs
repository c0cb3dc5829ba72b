use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A single observed value as it arrives from the caller.
///
/// Missing observations are modelled as `Option::<RawValue>::None`, which is
/// what a JSON `null` deserialises to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        Self::Number(v as f64)
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Normalised category key used for table lookup and ordering.
///
/// Numbers order before text; numbers ascend by value, text ascends
/// lexicographically.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CategoryKey {
    Number(f64),
    Text(String),
}

impl CategoryKey {
    /// Normalise a raw observation. Returns `None` for anything that counts as
    /// missing: null, non-finite numbers, and blank strings.
    pub fn from_raw(value: Option<&RawValue>) -> Option<Self> {
        match value? {
            RawValue::Number(n) => Self::number(*n),
            RawValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return None;
                }
                match trimmed.parse::<f64>() {
                    Ok(n) if n.is_finite() => Self::number(n),
                    _ => Some(Self::Text(trimmed.to_string())),
                }
            }
        }
    }

    fn number(n: f64) -> Option<Self> {
        // `+ 0.0` folds -0.0 into 0.0 so both land in one category.
        n.is_finite().then(|| Self::Number(n + 0.0))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }
}

impl PartialEq for CategoryKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CategoryKey {}

impl PartialOrd for CategoryKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CategoryKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
        }
    }
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Numeric scores for an ordered category list.
///
/// Numeric categories score as themselves; text categories score as their
/// 1-based position in the list.
pub fn category_scores(categories: &[CategoryKey]) -> Vec<f64> {
    categories
        .iter()
        .enumerate()
        .map(|(i, c)| c.as_number().unwrap_or((i + 1) as f64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(v: RawValue) -> Option<CategoryKey> {
        CategoryKey::from_raw(Some(&v))
    }

    #[test]
    fn test_missing_values() {
        assert_eq!(CategoryKey::from_raw(None), None);
        assert_eq!(key(RawValue::Number(f64::NAN)), None);
        assert_eq!(key(RawValue::Number(f64::INFINITY)), None);
        assert_eq!(key("   ".into()), None);
    }

    #[test]
    fn test_numeric_strings_normalise() {
        assert_eq!(key("2".into()), key(2.0.into()));
        assert_eq!(key(" 2.5 ".into()), Some(CategoryKey::Number(2.5)));
        assert_eq!(key("-0".into()), key(0.0.into()));
    }

    #[test]
    fn test_ordering_numbers_before_text() {
        let mut keys = vec![
            CategoryKey::Text("b".into()),
            CategoryKey::Number(10.0),
            CategoryKey::Text("a".into()),
            CategoryKey::Number(2.0),
        ];
        keys.sort();
        let shown: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        assert_eq!(shown, vec!["2", "10", "a", "b"]);
    }

    #[test]
    fn test_category_scores() {
        let cats = vec![
            CategoryKey::Number(5.0),
            CategoryKey::Text("x".into()),
            CategoryKey::Text("y".into()),
        ];
        assert_eq!(category_scores(&cats), vec![5.0, 2.0, 3.0]);
    }

    #[test]
    fn test_raw_value_deserialize() {
        let values: Vec<Option<RawValue>> = serde_json::from_str(r#"[1, "a", null]"#).unwrap();
        assert_eq!(values[0], Some(RawValue::Number(1.0)));
        assert_eq!(values[1], Some(RawValue::Text("a".into())));
        assert_eq!(values[2], None);
    }
}
