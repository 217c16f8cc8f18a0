//! Loading, sorting and printing profile dumps.

use std::cmp::Ordering;
use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use decorum_core::error::{DecorumError, Result};

use crate::dump::{ProfileDump, ProfileEntry};

/// Column a report is ordered by.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SortKey {
    /// Call count
    Calls,
    /// Cumulative time
    #[default]
    Cumulative,
    /// File name
    File,
    /// File name (alias of `file`)
    Module,
    /// Primitive call count
    PCalls,
    /// Line number
    Line,
    /// Function name
    Name,
    /// Name, then file, then line
    Nfl,
    /// `file:line(name)` text
    StdName,
    /// Internal time
    Time,
}

impl SortKey {
    /// Every key, in the order options are listed.
    pub const ALL: [SortKey; 10] = [
        SortKey::Calls,
        SortKey::Cumulative,
        SortKey::File,
        SortKey::Module,
        SortKey::PCalls,
        SortKey::Line,
        SortKey::Name,
        SortKey::Nfl,
        SortKey::StdName,
        SortKey::Time,
    ];

    /// Command-line spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Calls => "calls",
            SortKey::Cumulative => "cumulative",
            SortKey::File => "file",
            SortKey::Module => "module",
            SortKey::PCalls => "pcalls",
            SortKey::Line => "line",
            SortKey::Name => "name",
            SortKey::Nfl => "nfl",
            SortKey::StdName => "stdname",
            SortKey::Time => "time",
        }
    }

    /// Human-readable meaning.
    pub fn description(self) -> &'static str {
        match self {
            SortKey::Calls => "Call count",
            SortKey::Cumulative => "Cumulative time",
            SortKey::File | SortKey::Module => "File name",
            SortKey::PCalls => "Primitive call count",
            SortKey::Line => "Line number",
            SortKey::Name => "Function name",
            SortKey::Nfl => "Name/File/Line",
            SortKey::StdName => "Standard name",
            SortKey::Time => "Internal time",
        }
    }

    /// Measurements sort largest first; locations and names sort ascending.
    pub fn is_descending(self) -> bool {
        matches!(self, SortKey::Calls | SortKey::Cumulative | SortKey::PCalls | SortKey::Time)
    }

    fn compare(self, a: &ProfileEntry, b: &ProfileEntry) -> Ordering {
        let primary = match self {
            SortKey::Calls => b.calls.cmp(&a.calls),
            SortKey::PCalls => b.primitive_calls.cmp(&a.primitive_calls),
            SortKey::Cumulative => b.cumtime.total_cmp(&a.cumtime),
            SortKey::Time => b.tottime.total_cmp(&a.tottime),
            SortKey::File | SortKey::Module => a.file.cmp(&b.file),
            SortKey::Line => a.line.cmp(&b.line),
            SortKey::Name => a.name.cmp(&b.name),
            SortKey::Nfl => (&a.name, &a.file, a.line).cmp(&(&b.name, &b.file, b.line)),
            SortKey::StdName => a.std_name().cmp(&b.std_name()),
        };
        primary.then_with(|| a.std_name().cmp(&b.std_name()))
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = DecorumError;

    fn from_str(s: &str) -> Result<Self> {
        SortKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| DecorumError::UnknownSortKey(s.to_string()))
    }
}

/// A loaded profile dump.
#[derive(Clone, Debug)]
pub struct Stats {
    source: Option<PathBuf>,
    dump: ProfileDump,
}

impl Stats {
    /// Loads the dump at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        Ok(Self {
            source: Some(path.to_path_buf()),
            dump: ProfileDump::read(path)?,
        })
    }

    /// Wraps an in-memory dump.
    pub fn from_dump(dump: ProfileDump) -> Self {
        Self { source: None, dump }
    }

    /// The underlying dump.
    pub fn dump(&self) -> &ProfileDump {
        &self.dump
    }

    /// Entries ordered by `key`.
    pub fn sorted(&self, key: SortKey) -> Vec<&ProfileEntry> {
        let mut rows: Vec<&ProfileEntry> = self.dump.entries.iter().collect();
        rows.sort_by(|a, b| key.compare(a, b));
        rows
    }

    /// Renders a report ordered by `sort`, showing at most `limit` rows.
    ///
    /// ```text
    /// 2026-01-01T00:00:00+00:00    /tmp/handler.profile
    ///
    ///          181 function calls (5 primitive calls) in 0.012 seconds
    ///
    ///    Ordered by: cumulative time
    ///
    ///    ncalls  tottime  percall  cumtime  percall filename:lineno(function)
    ///         1    0.000    0.000    0.012    0.012 src/main.rs:10(handler)
    ///     177/1    0.012    0.000    0.012    0.012 src/main.rs:3(fib)
    /// ```
    pub fn report(&self, sort: SortKey, limit: usize) -> String {
        let mut out = String::new();
        let title = self
            .source
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| self.dump.function.clone());

        let _ = writeln!(out, "{}    {}", self.dump.created_at.to_rfc3339(), title);
        let _ = writeln!(out);

        let total = self.dump.total_calls();
        let primitive = self.dump.primitive_calls();
        let _ = write!(out, "{total:>9} function calls");
        if total != primitive {
            let _ = write!(out, " ({primitive} primitive calls)");
        }
        let _ = writeln!(out, " in {:.3} seconds", self.dump.total_time);
        let _ = writeln!(out);

        let _ = writeln!(out, "   Ordered by: {}", sort.description().to_lowercase());
        let rows = self.sorted(sort);
        if rows.len() > limit {
            let _ = writeln!(out, "   List reduced from {} to {} due to restriction <{}>", rows.len(), limit, limit);
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "   ncalls  tottime  percall  cumtime  percall filename:lineno(function)");
        for row in rows.into_iter().take(limit) {
            let _ = writeln!(out, "{}", format_row(row));
        }
        out
    }
}

fn format_row(row: &ProfileEntry) -> String {
    let ncalls = if row.calls == row.primitive_calls {
        row.calls.to_string()
    } else {
        format!("{}/{}", row.calls, row.primitive_calls)
    };
    format!(
        "{:>9} {:>8.3} {} {:>8.3} {} {}",
        ncalls,
        row.tottime,
        per_call(row.tottime, row.calls),
        row.cumtime,
        per_call(row.cumtime, row.primitive_calls),
        row.std_name()
    )
}

fn per_call(time: f64, calls: u64) -> String {
    if calls == 0 {
        " ".repeat(8)
    } else {
        format!("{:>8.3}", time / calls as f64)
    }
}
