use std::fmt;

/// A cell value as extracted by a column. Typed row fields are erased into
/// this form once the column is built.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Number(f64),
    Text(String),
    Tags(Vec<String>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_tags(&self) -> Option<&[String]> {
        match self {
            Value::Tags(tags) => Some(tags),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "∅"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Tags(tags) => write!(f, "{}", tags.join(", ")),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n.into())
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<Vec<String>> for Value {
    fn from(tags: Vec<String>) -> Self {
        Value::Tags(tags)
    }
}

impl<V: Into<Value>> From<Option<V>> for Value {
    fn from(value: Option<V>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// A field that holds either a number or a free text fallback such as
/// `"unknown"`.
#[derive(Debug, Clone, PartialEq)]
pub enum Mixed {
    Number(f64),
    Text(String),
}

impl Mixed {
    /// Reads a raw string, accepting `,` thousands separators.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.replace(',', "").parse::<f64>() {
            Ok(n) if n.is_finite() => Mixed::Number(n),
            _ => Mixed::Text(trimmed.to_string()),
        }
    }
}

impl From<Mixed> for Value {
    fn from(m: Mixed) -> Self {
        match m {
            Mixed::Number(n) => Value::Number(n),
            Mixed::Text(s) => Value::Text(s),
        }
    }
}

/// The comparable key a sortable column extracts from a row. `Null` always
/// orders after every other value.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Number(f64),
    Text(String),
    Null,
}

impl SortValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SortValue::Null)
    }
}

impl From<f64> for SortValue {
    fn from(n: f64) -> Self {
        SortValue::Number(n)
    }
}

impl From<String> for SortValue {
    fn from(s: String) -> Self {
        SortValue::Text(s)
    }
}

impl From<&str> for SortValue {
    fn from(s: &str) -> Self {
        SortValue::Text(s.to_string())
    }
}

impl<V: Into<SortValue>> From<Option<V>> for SortValue {
    fn from(value: Option<V>) -> Self {
        value.map(Into::into).unwrap_or(SortValue::Null)
    }
}
