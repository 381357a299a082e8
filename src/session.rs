//! Per-caller mode routing.
//!
//! A caller picks a mode, then uploads documents. The store remembers the
//! choice per caller only until the run it selected has finished (or
//! failed), so a stale mode never applies to a later, unrelated upload.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{ParcelError, Result};
use crate::pipeline::{export_chunks, run_passport_macro, run_pinfl, Delivery};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Chunk { size: usize },
    PassportMacro,
    PinflReplace,
}

impl Mode {
    /// Chunk sizes offered as menu choices.
    pub const CHUNK_PRESETS: [usize; 3] = [1000, 500, 250];

    /// Parse a menu key: `chunk`, `chunk500`, `chunk250`, `passport` or
    /// `pinfl_replace`.
    pub fn parse(key: &str) -> Result<Self> {
        match key {
            "chunk" => Ok(Self::Chunk { size: 1000 }),
            "chunk500" => Ok(Self::Chunk { size: 500 }),
            "chunk250" => Ok(Self::Chunk { size: 250 }),
            "passport" => Ok(Self::PassportMacro),
            "pinfl_replace" => Ok(Self::PinflReplace),
            other => Err(ParcelError::UnknownMode(other.to_string())),
        }
    }

    /// Menu key for this mode. Chunk sizes outside the presets have no key
    /// of their own and report as `chunk{size}`.
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::Chunk { size: 1000 } => "chunk".into(),
            Self::Chunk { size } => format!("chunk{size}"),
            Self::PassportMacro => "passport".into(),
            Self::PinflReplace => "pinfl_replace".into(),
        }
    }
}

impl FromStr for Mode {
    type Err = ParcelError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// A document handed in by a caller.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

#[derive(Debug, Clone)]
struct Session {
    mode: Mode,
    /// PINFL only: the source workbook, held until the lookup arrives.
    source: Option<Upload>,
}

/// What happened to a submitted upload.
#[derive(Debug)]
pub enum Submission {
    /// The upload was kept as the PINFL source; the lookup document is next.
    AwaitingLookup,
    Delivered(Delivery),
}

/// Mode selections keyed by caller.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<String, Session>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh session for `caller`, discarding any previous one.
    pub fn select_mode(&mut self, caller: impl Into<String>, mode: Mode) {
        let caller = caller.into();
        debug!(caller = %caller, %mode, "mode selected");
        self.sessions.insert(caller, Session { mode, source: None });
    }

    #[must_use]
    pub fn mode(&self, caller: &str) -> Option<Mode> {
        self.sessions.get(caller).map(|s| s.mode)
    }

    pub fn clear(&mut self, caller: &str) {
        self.sessions.remove(caller);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Route one upload through the caller's selected mode.
    ///
    /// The session is taken out of the store before the run starts, so it
    /// is gone afterwards whether the run succeeded or failed. Only the
    /// first PINFL upload puts it back, now holding the source document.
    pub fn submit(&mut self, caller: &str, upload: Upload, config: &Config) -> Result<Submission> {
        let session = self
            .sessions
            .remove(caller)
            .ok_or(ParcelError::NoModeSelected)?;
        info!(caller, mode = %session.mode, upload = %upload.name, "routing upload");

        let delivery = match (session.mode, session.source) {
            (Mode::Chunk { size }, _) => export_chunks(&upload.bytes, config, size, caller)?,
            (Mode::PassportMacro, _) => run_passport_macro(upload.bytes, config, caller)?,
            (Mode::PinflReplace, None) => {
                self.sessions.insert(
                    caller.to_string(),
                    Session {
                        mode: Mode::PinflReplace,
                        source: Some(upload),
                    },
                );
                return Ok(Submission::AwaitingLookup);
            }
            (Mode::PinflReplace, Some(source)) => {
                run_pinfl(source.bytes, &upload.bytes, config, caller)?
            }
        };
        Ok(Submission::Delivered(delivery))
    }
}
