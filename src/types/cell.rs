use serde::{Deserialize, Serialize};
use std::fmt;

/// A single cell value as the pipelines see it.
///
/// Numbers stay numbers and text stays text from load to write-back; the
/// only place a value changes type is the code-padding rule, which turns a
/// five-digit number into six-character text.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "t", content = "v", rename_all = "lowercase")]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    /// True for `Empty` and for text that is whitespace only.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Number(_) => false,
            Self::Text(s) => s.trim().is_empty(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// String form used for keys, prefix checks and the replacement log.
    ///
    /// Integral numbers print without a fractional part (`12345.0` → `"12345"`).
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }

    /// `display()` trimmed and uppercased; the normalized form used for
    /// prefix matching and lookup keys.
    #[must_use]
    pub fn normalized_key(&self) -> String {
        self.display().trim().to_uppercase()
    }

    /// Numeric reading of the value: numbers as-is, text parsed after trimming.
    /// Non-finite results count as not numeric.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            Self::Empty => return None,
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        n.is_finite().then_some(n)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}
