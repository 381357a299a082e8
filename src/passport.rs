//! PassportMacro: single-document passport correction.
//!
//! Every non-blank passport whose first character is in the configured set
//! is replaced by the placeholder passport and birthdate. Blank passports
//! are left untouched here, unlike the PINFL flow.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::diagnostic::Diagnostic;
use crate::editor::Document;
use crate::error::Result;
use crate::pinfl::starts_with_any;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassportMacroRules {
    pub passport_column: u32,
    pub birthdate_column: u32,
    /// First characters (case-insensitive) that mark a passport for replacement.
    pub valid_start: String,
    pub placeholder_passport: String,
    pub placeholder_birthdate: String,
    pub header_rows: u32,
}

impl Default for PassportMacroRules {
    fn default() -> Self {
        Self {
            passport_column: 4,
            birthdate_column: 5,
            valid_start: "123456789MRTGKZECUVFBNDGHJLKQIP".into(),
            placeholder_passport: "AB0663236".into(),
            placeholder_birthdate: "23,12,1988".into(),
            header_rows: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PassportOutcome {
    pub document: Vec<u8>,
    /// Rows whose passport was replaced.
    pub corrected: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Correct passports in place; returns the corrected row count.
pub fn apply_passport_macro(
    doc: &mut Document,
    rules: &PassportMacroRules,
    diagnostics: &mut Vec<Diagnostic>,
) -> usize {
    let mut corrected = 0;

    for row in rules.header_rows..doc.max_row() {
        let current = doc.get(row, rules.passport_column);
        if current.is_blank() || !starts_with_any(&current.normalized_key(), &rules.valid_start) {
            continue;
        }

        if let Some(diagnostic) = doc.set_checked(
            row,
            rules.passport_column,
            rules.placeholder_passport.as_str(),
        ) {
            diagnostics.push(diagnostic);
            continue;
        }
        diagnostics.extend(doc.set_checked(
            row,
            rules.birthdate_column,
            rules.placeholder_birthdate.as_str(),
        ));
        corrected += 1;
    }

    info!(corrected, diagnostics = diagnostics.len(), "applied passport macro");
    corrected
}

/// Full passport-macro flow on raw bytes.
pub fn run_passport_macro(source: Vec<u8>, rules: &PassportMacroRules) -> Result<PassportOutcome> {
    let mut doc = Document::open(source)?;
    let mut diagnostics = Vec::new();
    let corrected = apply_passport_macro(&mut doc, rules, &mut diagnostics);
    Ok(PassportOutcome {
        document: doc.save()?,
        corrected,
        diagnostics,
    })
}
