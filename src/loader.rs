//! Loader: raw spreadsheet bytes to an ordered [`Dataset`].
//!
//! No header row is interpreted; columns are addressed purely by position
//! and the first `skip` physical rows of the active sheet are dropped.

use tracing::info;

use crate::error::Result;
use crate::parser::read_active_sheet;
use crate::types::Dataset;

/// Load the active sheet, skipping `skip` leading rows. The first record
/// corresponds to source row `skip + 1`.
pub fn load_dataset(data: &[u8], skip: u32) -> Result<Dataset> {
    let part = read_active_sheet(data)?;
    let dataset = part.grid.to_dataset(skip);
    info!(
        rows = dataset.len(),
        width = dataset.width,
        skip,
        "loaded dataset"
    );
    Ok(dataset)
}
