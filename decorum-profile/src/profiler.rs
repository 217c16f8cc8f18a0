//! The `profileit` wrapper.

use std::marker::PhantomData;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, warn};

use decorum_core::config::DecorumConfig;
use decorum_core::error::DecorumError;

use crate::dump::{ProfileDump, ProfileEntry};
use crate::session::{ActiveSession, FunctionId, Scope};

/// Wraps functions so every call is profiled and dumped to disk.
#[derive(Clone, Debug)]
pub struct Profiler {
    config: DecorumConfig,
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new(DecorumConfig::default())
    }
}

impl Profiler {
    /// Uses `config.profile_dir` for dumps.
    pub fn new(config: DecorumConfig) -> Self {
        Self { config }
    }

    /// Dumps into `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(DecorumConfig::default().with_profile_dir(dir.into()))
    }

    /// Wraps `f`, recorded under `name` at the caller's location.
    #[track_caller]
    pub fn wrap<A, R, E, F>(&self, name: impl Into<String>, f: F) -> Profiled<A, F>
    where
        F: Fn(&A) -> Result<R, E>,
    {
        let name = name.into();
        Profiled {
            id: FunctionId::at(Location::caller(), &name),
            path: self.config.profile_path(&name),
            name,
            f,
            _args: PhantomData,
        }
    }
}

/// Wraps `f` so each call writes `/tmp/<name>.profile` (or the configured
/// profile directory).
#[track_caller]
pub fn profileit<A, R, E, F>(name: impl Into<String>, f: F) -> Profiled<A, F>
where
    F: Fn(&A) -> Result<R, E>,
{
    let config = DecorumConfig::from_env().unwrap_or_else(|e| {
        warn!(error = %e, "Invalid profile configuration, using defaults");
        DecorumConfig::default()
    });
    Profiler::new(config).wrap(name, f)
}

/// A profiled function.
pub struct Profiled<A, F> {
    name: String,
    id: FunctionId,
    path: PathBuf,
    f: F,
    _args: PhantomData<fn(&A)>,
}

impl<A, F> Profiled<A, F> {
    /// Function name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Where dumps are written.
    pub fn dump_path(&self) -> &Path {
        &self.path
    }

    /// Runs the function in a fresh session and writes the dump.
    ///
    /// An error from the function is returned without writing a dump. A
    /// failure to write the dump is returned as [`DecorumError::IoError`].
    pub fn call<R, E>(&self, args: &A) -> Result<R, E>
    where
        F: Fn(&A) -> Result<R, E>,
        E: From<DecorumError>,
    {
        let session = ActiveSession::begin();
        let started = Instant::now();

        let result = {
            let _root = Scope::enter(self.id.clone());
            (self.f)(args)
        };

        let total_time = started.elapsed().as_secs_f64();
        let entries: Vec<ProfileEntry> = session
            .finish()
            .into_iter()
            .map(|(id, stats)| ProfileEntry::from_stats(id, &stats))
            .collect();

        let value = result?;

        debug!(function = %self.name, total_time, "Profiled call finished");
        ProfileDump::new(&self.name, total_time, entries).write(&self.path)?;
        info!(path = %self.path.display(), "Profile written");

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope;
    use tempfile::TempDir;

    fn fib(n: u64) -> u64 {
        let _scope = scope("fib");
        if n < 2 {
            n
        } else {
            fib(n - 1) + fib(n - 2)
        }
    }

    #[test]
    fn test_profiled_call_writes_dump() {
        let dir = TempDir::new().unwrap();
        let profiled = Profiler::in_dir(dir.path()).wrap("compute", |n: &u64| Ok::<_, DecorumError>(fib(*n)));

        assert_eq!(profiled.call(&10).unwrap(), 55);
        assert_eq!(profiled.dump_path(), dir.path().join("compute.profile"));

        let dump = ProfileDump::read(profiled.dump_path()).unwrap();
        assert_eq!(dump.function, "compute");

        let root = dump.entries.iter().find(|e| e.name == "compute").unwrap();
        assert_eq!(root.calls, 1);

        let fib_row = dump.entries.iter().find(|e| e.name == "fib").unwrap();
        assert_eq!(fib_row.calls, 177);
        assert_eq!(fib_row.primitive_calls, 1);
        assert!(root.cumtime >= fib_row.cumtime);
    }

    #[test]
    fn test_each_call_replaces_dump() {
        let dir = TempDir::new().unwrap();
        let profiled = Profiler::in_dir(dir.path()).wrap("twice", |n: &u64| Ok::<_, DecorumError>(fib(*n)));

        profiled.call(&3).unwrap();
        profiled.call(&1).unwrap();

        let dump = ProfileDump::read(profiled.dump_path()).unwrap();
        let fib_row = dump.entries.iter().find(|e| e.name == "fib").unwrap();
        assert_eq!(fib_row.calls, 1);
    }

    #[test]
    fn test_error_skips_dump() {
        let dir = TempDir::new().unwrap();
        let profiled = Profiler::in_dir(dir.path()).wrap("broken", |_: &()| {
            Err::<(), _>(DecorumError::InternalError("boom".into()))
        });

        assert!(matches!(profiled.call(&()), Err(DecorumError::InternalError(_))));
        assert!(!profiled.dump_path().exists());
    }

    #[test]
    fn test_unwritable_dir_returns_io_error() {
        let dir = TempDir::new().unwrap();
        let profiled = Profiler::in_dir(dir.path().join("missing")).wrap("lost", |_: &()| Ok::<_, DecorumError>(7));

        assert!(matches!(profiled.call(&()), Err(DecorumError::IoError(_))));
    }
}
