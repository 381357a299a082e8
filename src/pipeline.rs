//! End-to-end flows: raw upload bytes in, named artifacts out.
//!
//! All intermediate documents are owned buffers scoped to one call, so a
//! failing run releases everything it produced and delivers nothing.

use serde::Serialize;
use tracing::{info, info_span};

use crate::archive::bundle;
use crate::chunker::chunk;
use crate::config::Config;
use crate::diagnostic::Diagnostic;
use crate::error::Result;
use crate::loader::load_dataset;
use crate::normalize::{normalize, NormalizeReport};
use crate::passport::run_passport_macro as correct_passports;
use crate::pinfl::replace_pinfl;
use crate::template::render_all;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Archive,
    Workbook,
    Log,
}

/// One output file ready to hand back to the caller.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub name: String,
    pub kind: ArtifactKind,
    pub bytes: Vec<u8>,
}

/// Machine-readable account of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RunReport {
    Chunk {
        rows: usize,
        chunk_size: usize,
        documents: usize,
        normalize: NormalizeReport,
    },
    PassportMacro {
        corrected: usize,
        diagnostics: Vec<Diagnostic>,
    },
    PinflReplace {
        replacements: usize,
        placeholders_filled: usize,
        diagnostics: Vec<Diagnostic>,
    },
}

/// Everything a successful run delivers.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub artifacts: Vec<Artifact>,
    /// Message for the caller.
    pub summary: String,
    pub report: RunReport,
}

/// Loader → Normalizer → Chunker → TemplateRenderer → Archiver.
pub fn export_chunks(
    bytes: &[u8],
    config: &Config,
    chunk_size: usize,
    caller: &str,
) -> Result<Delivery> {
    let _span = info_span!("export_chunks", caller, chunk_size).entered();

    let mut dataset = load_dataset(bytes, config.header_skip)?;
    let normalized = normalize(&mut dataset, &config.normalize);
    let partitions = chunk(&dataset, chunk_size)?;
    let documents = render_all(&config.template(), &partitions, &config.render_options())?;
    let archive = bundle(&documents)?;

    info!(
        rows = dataset.len(),
        documents = documents.len(),
        "chunked export finished"
    );
    Ok(Delivery {
        artifacts: vec![Artifact {
            name: format!("{}_{caller}.zip", config.output_prefix),
            kind: ArtifactKind::Archive,
            bytes: archive,
        }],
        summary: format!(
            "Processing finished: {} rows in {} documents.",
            dataset.len(),
            documents.len()
        ),
        report: RunReport::Chunk {
            rows: dataset.len(),
            chunk_size,
            documents: documents.len(),
            normalize: normalized,
        },
    })
}

/// Passport macro over a single workbook.
pub fn run_passport_macro(source: Vec<u8>, config: &Config, caller: &str) -> Result<Delivery> {
    let _span = info_span!("passport_macro", caller).entered();

    let outcome = correct_passports(source, &config.passport)?;
    Ok(Delivery {
        artifacts: vec![Artifact {
            name: format!("PassportUpdated_{caller}.xlsx"),
            kind: ArtifactKind::Workbook,
            bytes: outcome.document,
        }],
        summary: format!("Macro finished: {} passports corrected.", outcome.corrected),
        report: RunReport::PassportMacro {
            corrected: outcome.corrected,
            diagnostics: outcome.diagnostics,
        },
    })
}

/// PINFL substitution of `source` against `lookup`; delivers the corrected
/// workbook followed by the replacement log.
pub fn run_pinfl(source: Vec<u8>, lookup: &[u8], config: &Config, caller: &str) -> Result<Delivery> {
    let _span = info_span!("pinfl_replace", caller).entered();

    let outcome = replace_pinfl(source, lookup, &config.pinfl)?;
    let replacements = outcome.replacement_count();
    Ok(Delivery {
        artifacts: vec![
            Artifact {
                name: format!("{}_GOOD_{caller}.xlsx", config.output_prefix),
                kind: ArtifactKind::Workbook,
                bytes: outcome.document,
            },
            Artifact {
                name: format!("замены_log_{caller}.txt"),
                kind: ArtifactKind::Log,
                bytes: outcome.log.render().into_bytes(),
            },
        ],
        summary: format!("Done! Replaced {replacements} passports."),
        report: RunReport::PinflReplace {
            replacements,
            placeholders_filled: outcome.placeholders_filled,
            diagnostics: outcome.diagnostics,
        },
    })
}
