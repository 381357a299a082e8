//! PinflMatcher: cross-document passport → PINFL substitution.
//!
//! The lookup document maps passport numbers (column 8) to PINFL values
//! (column 9). Each data row of the source document is then patched in
//! place, preserving the source's styling:
//! - a blank passport gets the placeholder passport and birthdate,
//! - a passport with a valid leading character and a lookup hit is
//!   replaced by its PINFL and logged,
//! - anything else is left alone.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::diagnostic::Diagnostic;
use crate::editor::Document;
use crate::error::Result;
use crate::loader::load_dataset;
use crate::types::{CellValue, Dataset};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinflRules {
    pub passport_column: u32,
    pub birthdate_column: u32,
    /// Lookup document column holding the passport number.
    pub key_column: usize,
    /// Lookup document column holding the PINFL.
    pub value_column: usize,
    /// Characters a passport may start with to be eligible for lookup.
    pub valid_start: String,
    pub placeholder_passport: String,
    pub placeholder_birthdate: String,
    /// Leading source rows never modified.
    pub header_rows: u32,
}

impl Default for PinflRules {
    fn default() -> Self {
        Self {
            passport_column: 4,
            birthdate_column: 5,
            key_column: 8,
            value_column: 9,
            valid_start: "0123456789AKJTIFHBMNCXZSDQWRYUPLE".into(),
            placeholder_passport: "AB0663236".into(),
            placeholder_birthdate: "23.12.1988".into(),
            header_rows: 1,
        }
    }
}

/// Normalized passport → PINFL mapping. Later rows overwrite earlier ones.
#[derive(Debug, Clone, Default)]
pub struct LookupTable {
    entries: HashMap<String, CellValue>,
}

impl LookupTable {
    /// Scan `dataset` top to bottom. Rows with a blank key contribute
    /// nothing; a blank value drops any earlier entry for its key.
    #[must_use]
    pub fn build(dataset: &Dataset, rules: &PinflRules) -> Self {
        let mut entries = HashMap::new();
        for row in &dataset.rows {
            let key = row.get(rules.key_column);
            let value = row.get(rules.value_column);
            if key.is_blank() {
                continue;
            }
            if value.is_blank() {
                entries.remove(&key.normalized_key());
            } else {
                entries.insert(key.normalized_key(), value.clone());
            }
        }
        debug!(entries = entries.len(), "built lookup table");
        Self { entries }
    }

    /// Look up an already normalized key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<CellValue>> FromIterator<(K, V)> for LookupTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Replacement {
    /// The passport cell as it was, spacing and case untouched.
    pub old: CellValue,
    pub new: CellValue,
}

/// Substitutions in the order they were made.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReplacementLog {
    entries: Vec<Replacement>,
}

impl ReplacementLog {
    pub fn push(&mut self, old: CellValue, new: CellValue) {
        self.entries.push(Replacement { old, new });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Replacement> {
        self.entries.iter()
    }

    /// One `old → new` line per substitution.
    #[must_use]
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|r| format!("{} → {}\n", r.old, r.new))
            .collect()
    }
}

/// Result of patching a document in place.
#[derive(Debug, Clone, Default)]
pub struct PinflReport {
    pub log: ReplacementLog,
    pub placeholders_filled: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// A finished PINFL run: the corrected workbook and everything it did.
#[derive(Debug, Clone)]
pub struct PinflOutcome {
    pub document: Vec<u8>,
    pub log: ReplacementLog,
    pub placeholders_filled: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl PinflOutcome {
    #[must_use]
    pub fn replacement_count(&self) -> usize {
        self.log.len()
    }
}

/// Patch every data row of `doc` against `lookup`.
pub fn apply_pinfl(doc: &mut Document, lookup: &LookupTable, rules: &PinflRules) -> PinflReport {
    let mut report = PinflReport::default();

    for row in rules.header_rows..doc.max_row() {
        let current = doc.get(row, rules.passport_column).clone();

        if current.is_blank() {
            if let Some(diagnostic) = doc.set_checked(
                row,
                rules.passport_column,
                rules.placeholder_passport.as_str(),
            ) {
                // a row never gets a placeholder birthdate without its passport
                report.diagnostics.push(diagnostic);
                continue;
            }
            report.diagnostics.extend(doc.set_checked(
                row,
                rules.birthdate_column,
                rules.placeholder_birthdate.as_str(),
            ));
            report.placeholders_filled += 1;
            continue;
        }

        let key = current.normalized_key();
        if !starts_with_any(&key, &rules.valid_start) {
            continue;
        }
        let Some(pinfl) = lookup.get(&key) else {
            continue;
        };
        match doc.set_checked(row, rules.passport_column, pinfl.clone()) {
            Some(diagnostic) => report.diagnostics.push(diagnostic),
            None => report.log.push(current, pinfl.clone()),
        }
    }

    info!(
        replacements = report.log.len(),
        placeholders = report.placeholders_filled,
        diagnostics = report.diagnostics.len(),
        "applied PINFL lookup"
    );
    report
}

/// Full PINFL flow on raw bytes: the lookup document is read without any
/// header skip, the source document is patched and re-serialized.
pub fn replace_pinfl(source: Vec<u8>, lookup: &[u8], rules: &PinflRules) -> Result<PinflOutcome> {
    let table = LookupTable::build(&load_dataset(lookup, 0)?, rules);
    let mut doc = Document::open(source)?;
    let report = apply_pinfl(&mut doc, &table, rules);
    Ok(PinflOutcome {
        document: doc.save()?,
        log: report.log,
        placeholders_filled: report.placeholders_filled,
        diagnostics: report.diagnostics,
    })
}

/// True when the first character of `key` is one of `chars`.
pub(crate) fn starts_with_any(key: &str, chars: &str) -> bool {
    key.chars().next().is_some_and(|c| chars.contains(c))
}
