//! Data types shared by the loader, the normalizer and the editor.

mod cell;
mod dataset;
mod sheet;

pub use cell::*;
pub use dataset::*;
pub use sheet::*;
