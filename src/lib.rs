//! parcelsheet - parcel manifest spreadsheet processing
//!
//! Cleans, re-keys and repartitions XLSX parcel manifests:
//! - Chunked export: normalize rows, split into fixed-size blocks, render
//!   each block into a template workbook, bundle the results as one ZIP
//! - PINFL replacement: patch passport numbers from a lookup workbook,
//!   keeping the source's styling, with a replacement log
//! - Passport macro: single-workbook placeholder correction
//!
//! # Usage
//!
//! ```no_run
//! use parcelsheet::{export_chunks, Config};
//!
//! let config = Config::load(None)?;
//! let input = std::fs::read("manifest.xlsx")?;
//! let delivery = export_chunks(&input, &config, config.chunk_size, "cli")?;
//! for artifact in &delivery.artifacts {
//!     std::fs::write(&artifact.name, &artifact.bytes)?;
//! }
//! # Ok::<(), parcelsheet::ParcelError>(())
//! ```

// Package I/O
pub mod cell_ref;
pub mod parser;
pub mod types;
pub mod xml_helpers;

// Editing and write-back
pub mod editor;
pub(crate) mod export;

// Pipeline stages
pub mod archive;
pub mod chunker;
pub mod diagnostic;
pub mod loader;
pub mod normalize;
pub mod passport;
pub mod pinfl;
pub mod template;

pub mod config;
pub mod error;
pub mod pipeline;
pub mod session;

pub use config::Config;
pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use editor::Document;
pub use error::{ParcelError, Result};
pub use pipeline::{export_chunks, run_passport_macro, run_pinfl, Artifact, ArtifactKind, Delivery, RunReport};
pub use session::{Mode, SessionStore, Submission, Upload};
pub use types::*;
