//! Archiver: bundle rendered documents into a single ZIP.

use std::io::{Cursor, Write};
use tracing::{info, warn};
use zip::write::FileOptions;
use zip::ZipWriter;

use crate::error::Result;
use crate::template::RenderedDocument;

/// Deflated ZIP with one entry per document, in input order.
///
/// Entry names are the documents' base names; any directory components are
/// stripped. An empty input still yields a valid, zero-entry archive.
pub fn bundle(documents: &[RenderedDocument]) -> Result<Vec<u8>> {
    if documents.is_empty() {
        warn!("bundling zero documents into an empty archive");
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for doc in documents {
        writer.start_file(base_name(&doc.name), options)?;
        writer.write_all(&doc.bytes)?;
    }

    let bytes = writer.finish()?.into_inner();
    info!(entries = documents.len(), size = bytes.len(), "bundled archive");
    Ok(bytes)
}

fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}
