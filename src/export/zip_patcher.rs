//! Swap one entry of a ZIP package.
//!
//! Every other entry goes through `raw_copy_file`, so its compressed bytes,
//! CRC and position in the central directory stay exactly as they were.

use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::Result;

/// Rebuild `package` with the entry named `part` holding `content`.
pub(crate) fn replace_entry(package: &[u8], part: &str, content: &[u8]) -> Result<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(package))?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(package.len())));
    let deflated = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for index in 0..archive.len() {
        let entry = archive.by_index_raw(index)?;
        if entry.name() != part {
            writer.raw_copy_file(entry)?;
            continue;
        }
        let name = entry.name().to_owned();
        drop(entry);
        writer.start_file(name, deflated)?;
        writer.write_all(content)?;
    }

    Ok(writer.finish()?.into_inner())
}
