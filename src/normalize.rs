//! Normalizer: the three row-level rules of the chunked export.
//!
//! Rules run as separate passes in a fixed order, each seeing the output
//! of the previous one:
//! 1. code padding (five-digit numeric codes gain a leading zero),
//! 2. passport/birthdate placeholders for missing or foreign passports,
//! 3. duplicate-identifier suppression (first occurrence wins).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

use crate::types::{CellValue, Dataset, Row};

/// Column layout and literals used by [`normalize`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeRules {
    pub key_column: usize,
    /// Columns `0..block_width` are cleared together on a duplicate.
    pub block_width: usize,
    pub passport_column: usize,
    pub birthdate_column: usize,
    pub code_column: usize,
    pub allowed_prefixes: Vec<String>,
    pub placeholder_passport: String,
    pub placeholder_birthdate: String,
}

impl Default for NormalizeRules {
    fn default() -> Self {
        Self {
            key_column: 0,
            block_width: 8,
            passport_column: 4,
            birthdate_column: 5,
            code_column: 10,
            allowed_prefixes: ["AB", "AC", "AA", "AD", "FA", "XS", "AE"]
                .into_iter()
                .map(String::from)
                .collect(),
            placeholder_passport: "AB0663236".into(),
            placeholder_birthdate: "23,12,1988".into(),
        }
    }
}

/// What a [`normalize`] run changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeReport {
    pub codes_padded: usize,
    pub placeholders_filled: usize,
    pub duplicates_cleared: usize,
}

/// Apply all three rules in order, mutating the dataset in place.
pub fn normalize(dataset: &mut Dataset, rules: &NormalizeRules) -> NormalizeReport {
    let report = NormalizeReport {
        codes_padded: pad_codes(&mut dataset.rows, rules.code_column),
        placeholders_filled: fill_placeholders(&mut dataset.rows, rules),
        duplicates_cleared: suppress_duplicates(&mut dataset.rows, rules),
    };
    dataset.square_up();
    info!(
        rows = dataset.len(),
        codes_padded = report.codes_padded,
        placeholders_filled = report.placeholders_filled,
        duplicates_cleared = report.duplicates_cleared,
        "normalized dataset"
    );
    report
}

/// Six-character code for a value whose integer part has exactly five
/// digits; `None` leaves the cell as it was.
///
/// Text and numbers are both accepted, and a fractional tail is truncated
/// (`"12345.0"` reads as 12345). Negative values never qualify.
#[must_use]
pub fn pad_code(value: &CellValue) -> Option<String> {
    let n = value.as_number()?.trunc();
    (10_000.0..100_000.0)
        .contains(&n)
        .then(|| format!("0{n}"))
}

fn pad_codes(rows: &mut [Row], column: usize) -> usize {
    let mut padded = 0;
    for row in rows {
        if let Some(code) = pad_code(row.get(column)) {
            row.set(column, CellValue::Text(code));
            padded += 1;
        }
    }
    padded
}

/// True when the passport cell holds a value starting with an allowed prefix.
#[must_use]
pub fn has_allowed_prefix(value: &CellValue, prefixes: &[String]) -> bool {
    if value.is_blank() {
        return false;
    }
    let key = value.normalized_key();
    prefixes.iter().any(|p| key.starts_with(p.as_str()))
}

fn fill_placeholders(rows: &mut [Row], rules: &NormalizeRules) -> usize {
    let mut filled = 0;
    for row in rows {
        if has_allowed_prefix(row.get(rules.passport_column), &rules.allowed_prefixes) {
            continue;
        }
        row.set(
            rules.passport_column,
            CellValue::Text(rules.placeholder_passport.clone()),
        );
        row.set(
            rules.birthdate_column,
            CellValue::Text(rules.placeholder_birthdate.clone()),
        );
        filled += 1;
    }
    filled
}

fn suppress_duplicates(rows: &mut [Row], rules: &NormalizeRules) -> usize {
    let mut seen: HashSet<String> = HashSet::new();
    let mut cleared = 0;

    for (idx, row) in rows.iter_mut().enumerate() {
        let key = row.get(rules.key_column).display().trim().to_string();
        if key.is_empty() {
            continue;
        }
        if seen.contains(&key) {
            for col in 0..rules.block_width {
                row.set(col, CellValue::Empty);
            }
            debug!(record = idx, key = %key, "cleared duplicate passport block");
            cleared += 1;
        } else {
            seen.insert(key);
        }
    }

    cleared
}
