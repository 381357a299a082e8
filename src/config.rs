//! Layered configuration.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. Environment variables prefixed `PARCELSHEET_` (`__` separates nested
//!    keys, e.g. `PARCELSHEET_NORMALIZE__CODE_COLUMN=11`)
//! 2. TOML file (`parcelsheet.toml` in the working directory, or an
//!    explicit path)
//! 3. Built-in defaults

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{ParcelError, Result};
use crate::normalize::NormalizeRules;
use crate::passport::PassportMacroRules;
use crate::pinfl::PinflRules;
use crate::template::{RenderOptions, TemplateAsset};

pub const DEFAULT_CONFIG_FILE: &str = "parcelsheet.toml";
pub const ENV_PREFIX: &str = "PARCELSHEET_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Workbook every chunk is rendered into.
    pub template_path: PathBuf,
    /// Chunk documents are named `{output_prefix}_{offset}.xlsx`.
    pub output_prefix: String,
    /// Leading rows of the chunked-export input that are not data.
    pub header_skip: u32,
    pub chunk_size: usize,
    pub normalize: NormalizeRules,
    pub pinfl: PinflRules,
    pub passport: PassportMacroRules,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            template_path: PathBuf::from("template.xlsx"),
            output_prefix: RenderOptions::default().prefix,
            header_skip: 3,
            chunk_size: 1000,
            normalize: NormalizeRules::default(),
            pinfl: PinflRules::default(),
            passport: PassportMacroRules::default(),
        }
    }
}

impl Config {
    /// The provider chain without extracting; `file` overrides the default
    /// file name.
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let file = file.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), Path::to_path_buf);
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load and validate. A missing TOML file is not an error; a named file
    /// that does not exist is.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        if let Some(path) = file {
            if !path.exists() {
                return Err(ParcelError::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
        }
        let config: Self = Self::figment(file).extract()?;
        config.validate()?;
        debug!(?config, "loaded configuration");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(ParcelError::Config("chunk_size must be at least 1".into()));
        }
        if let Some(bad) = self
            .normalize
            .allowed_prefixes
            .iter()
            .find(|p| p.chars().count() != 2)
        {
            return Err(ParcelError::Config(format!(
                "allowed prefix {bad:?} must be exactly two characters"
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn template(&self) -> TemplateAsset {
        TemplateAsset::new(&self.template_path)
    }

    #[must_use]
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            prefix: self.output_prefix.clone(),
            start_row: self.header_skip,
            ..RenderOptions::default()
        }
    }
}
