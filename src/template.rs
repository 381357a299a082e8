//! TemplateRenderer: one output document per partition.
//!
//! Every partition gets its own freshly loaded copy of the template, so no
//! write ever leaks from one chunk into the next.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::chunker::Partition;
use crate::editor::Document;
use crate::error::{ParcelError, Result};

/// Reference to the fixed-layout template workbook on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateAsset {
    path: PathBuf,
}

impl TemplateAsset {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load an independent copy of the template.
    ///
    /// The file is read again on every call; a missing or unparseable
    /// template is a [`ParcelError::MissingTemplateAsset`].
    pub fn instantiate(&self) -> Result<Document> {
        let missing = |reason: String| {
            ParcelError::MissingTemplateAsset(format!("{}: {reason}", self.path.display()))
        };
        let bytes = std::fs::read(&self.path).map_err(|e| missing(e.to_string()))?;
        Document::open(bytes).map_err(|e| missing(e.to_string()))
    }
}

/// Where and under what name partitions are rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Output names are `{prefix}_{offset}.xlsx`.
    pub prefix: String,
    /// First data row, 0-indexed (template rows above it are layout).
    pub start_row: u32,
    pub start_col: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            prefix: "AllPackageEC".into(),
            start_row: 3,
            start_col: 0,
        }
    }
}

/// A rendered output workbook, named after its partition offset.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub name: String,
    pub bytes: Vec<u8>,
    /// Number of records written.
    pub rows: usize,
}

/// Write one partition into a fresh template copy.
///
/// Records land at `options.start_row`, one per row in order, with every
/// column copied as-is (numbers stay numbers, text stays text).
pub fn render_partition(
    template: &TemplateAsset,
    partition: &Partition<'_>,
    options: &RenderOptions,
) -> Result<RenderedDocument> {
    let mut doc = template.instantiate()?;

    for (row, record) in (options.start_row..).zip(partition.rows) {
        for (col, value) in (options.start_col..).zip(&record.cells) {
            doc.set(row, col, value.clone());
        }
    }

    let name = format!("{}_{}.xlsx", options.prefix, partition.offset);
    debug!(name = %name, rows = partition.len(), "rendered partition");
    Ok(RenderedDocument {
        name,
        bytes: doc.save()?,
        rows: partition.len(),
    })
}

/// Render every partition; the first failure aborts the whole run.
pub fn render_all(
    template: &TemplateAsset,
    partitions: &[Partition<'_>],
    options: &RenderOptions,
) -> Result<Vec<RenderedDocument>> {
    let docs = partitions
        .iter()
        .map(|p| render_partition(template, p, options))
        .collect::<Result<Vec<_>>>()?;
    info!(
        template = %template.path.display(),
        documents = docs.len(),
        "rendered all partitions"
    );
    Ok(docs)
}
