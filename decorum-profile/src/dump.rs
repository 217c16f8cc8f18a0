//! Profile dump file format.
//!
//! # File Format
//!
//! A JSON document:
//!
//! ```text
//! {
//!   "format": "decorum-profile/1",
//!   "function": "handler",
//!   "created_at": "2026-01-01T00:00:00Z",
//!   "total_time": 0.0123,
//!   "entries": [
//!     { "file": "src/main.rs", "line": 10, "name": "handler",
//!       "calls": 1, "primitive_calls": 1, "tottime": 0.001, "cumtime": 0.0123 }
//!   ]
//! }
//! ```
//!
//! Times are in seconds.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use decorum_core::constants::PROFILE_FORMAT;
use decorum_core::error::{DecorumError, Result};

use crate::session::{FunctionId, FunctionStats};

/// One profiled function's row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProfileEntry {
    /// Source file
    pub file: String,
    /// Line in `file`
    pub line: u32,
    /// Function name
    pub name: String,
    /// All calls
    pub calls: u64,
    /// Non-recursive calls
    pub primitive_calls: u64,
    /// Internal time, seconds
    pub tottime: f64,
    /// Cumulative time, seconds
    pub cumtime: f64,
}

impl ProfileEntry {
    pub(crate) fn from_stats(id: FunctionId, stats: &FunctionStats) -> Self {
        Self {
            file: id.file,
            line: id.line,
            name: id.name,
            calls: stats.calls,
            primitive_calls: stats.primitive_calls,
            tottime: stats.tottime.as_secs_f64(),
            cumtime: stats.cumtime.as_secs_f64(),
        }
    }

    /// `file:line(name)`.
    pub fn std_name(&self) -> String {
        format!("{}:{}({})", self.file, self.line, self.name)
    }
}

/// Everything recorded during one profiled call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProfileDump {
    /// Format marker, always [`PROFILE_FORMAT`]
    pub format: String,
    /// Name of the profiled function
    pub function: String,
    /// When the dump was taken
    pub created_at: DateTime<Utc>,
    /// Wall time of the profiled call, seconds
    pub total_time: f64,
    /// Per-function rows
    pub entries: Vec<ProfileEntry>,
}

impl ProfileDump {
    /// Creates a dump stamped with the current time.
    pub fn new(function: impl Into<String>, total_time: f64, entries: Vec<ProfileEntry>) -> Self {
        Self {
            format: PROFILE_FORMAT.to_string(),
            function: function.into(),
            created_at: Utc::now(),
            total_time,
            entries,
        }
    }

    /// Writes the dump to `path`, replacing any existing file.
    #[instrument(skip(self), fields(function = %self.function))]
    pub fn write(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_vec_pretty(self)?;
        fs::write(path, contents)?;
        debug!(entries = self.entries.len(), "Profile dump written");
        Ok(())
    }

    /// Reads a dump from `path`.
    ///
    /// Content that is not a profile dump is reported as
    /// [`DecorumError::InvalidProfile`].
    pub fn read(path: &Path) -> Result<Self> {
        let contents = fs::read(path)?;
        Self::parse(path, &contents)
    }

    fn parse(path: &Path, contents: &[u8]) -> Result<Self> {
        let invalid = |reason: String| DecorumError::InvalidProfile {
            path: path.display().to_string(),
            reason,
        };

        let dump: Self = serde_json::from_slice(contents).map_err(|e| invalid(e.to_string()))?;
        if dump.format != PROFILE_FORMAT {
            return Err(invalid(format!("unsupported format {:?}", dump.format)));
        }
        Ok(dump)
    }

    /// Sum of all calls.
    pub fn total_calls(&self) -> u64 {
        self.entries.iter().map(|e| e.calls).sum()
    }

    /// Sum of primitive calls.
    pub fn primitive_calls(&self) -> u64 {
        self.entries.iter().map(|e| e.primitive_calls).sum()
    }
}
