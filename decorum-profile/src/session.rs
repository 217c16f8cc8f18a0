//! Per-thread profiling sessions.
//!
//! A session is active on a thread while a profiled function runs. Inside it,
//! every [`Scope`] guard records one call of its function: on drop the time
//! since creation is charged as cumulative time, minus the time spent in
//! nested scopes as internal time.
//!
//! Recursive calls are counted in `calls` but only the outermost invocation
//! is a primitive call, and only primitive calls add to cumulative time.

use std::cell::RefCell;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::panic::Location;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static SESSION: RefCell<Option<Session>> = const { RefCell::new(None) };
}

/// Identifies a profiled function by source location and name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FunctionId {
    /// Source file
    pub file: String,
    /// Line in `file`
    pub line: u32,
    /// Function name
    pub name: String,
}

impl FunctionId {
    /// Builds an id for `name` at the given source location.
    pub fn new(file: impl Into<String>, line: u32, name: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            name: name.into(),
        }
    }

    pub(crate) fn at(location: &Location<'_>, name: &str) -> Self {
        Self::new(location.file(), location.line(), name)
    }

    /// `file:line(name)`.
    pub fn std_name(&self) -> String {
        format!("{}:{}({})", self.file, self.line, self.name)
    }
}

/// Accumulated timings for one function.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FunctionStats {
    /// All calls, recursive ones included
    pub calls: u64,
    /// Calls not nested inside another call of the same function
    pub primitive_calls: u64,
    /// Time spent in the function itself
    pub tottime: Duration,
    /// Time spent in the function and everything it called
    pub cumtime: Duration,
}

struct Frame {
    id: FunctionId,
    started: Instant,
    children: Duration,
}

struct Session {
    generation: u64,
    stack: Vec<Frame>,
    active: HashMap<FunctionId, usize>,
    stats: HashMap<FunctionId, FunctionStats>,
}

impl Session {
    fn new() -> Self {
        Self {
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
            stack: Vec::new(),
            active: HashMap::new(),
            stats: HashMap::new(),
        }
    }

    fn enter(&mut self, id: FunctionId) -> usize {
        *self.active.entry(id.clone()).or_insert(0) += 1;
        self.stack.push(Frame {
            id,
            started: Instant::now(),
            children: Duration::ZERO,
        });
        self.stack.len() - 1
    }

    /// Closes every frame at or above `depth`.
    fn exit_to(&mut self, depth: usize) {
        let now = Instant::now();
        while self.stack.len() > depth {
            let Some(frame) = self.stack.pop() else { break };
            let elapsed = now.saturating_duration_since(frame.started);

            let remaining = match self.active.get_mut(&frame.id) {
                Some(n) => {
                    *n = n.saturating_sub(1);
                    *n
                }
                None => 0,
            };

            let stats = self.stats.entry(frame.id).or_default();
            stats.calls += 1;
            stats.tottime += elapsed.saturating_sub(frame.children);
            if remaining == 0 {
                stats.primitive_calls += 1;
                stats.cumtime += elapsed;
            }

            if let Some(parent) = self.stack.last_mut() {
                parent.children += elapsed;
            }
        }
    }
}

/// Records one call of a function while alive.
///
/// Created by [`scope`]. Does nothing when no session is active.
#[must_use = "the call is recorded when the guard is dropped"]
pub struct Scope {
    token: Option<(u64, usize)>,
    _thread_bound: PhantomData<*const ()>,
}

impl Scope {
    pub(crate) fn enter(id: FunctionId) -> Self {
        let token = SESSION.with(|cell| {
            cell.borrow_mut()
                .as_mut()
                .map(|session| (session.generation, session.enter(id)))
        });
        Self {
            token,
            _thread_bound: PhantomData,
        }
    }

    /// Whether this guard is recording into a session.
    pub fn is_recording(&self) -> bool {
        self.token.is_some()
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        let Some((generation, depth)) = self.token else {
            return;
        };
        SESSION.with(|cell| {
            if let Some(session) = cell.borrow_mut().as_mut() {
                if session.generation == generation {
                    session.exit_to(depth);
                }
            }
        });
    }
}

/// Marks the enclosing function as profiled under `name`.
///
/// ```rust
/// fn parse(input: &str) -> usize {
///     let _scope = decorum_profile::scope("parse");
///     input.len()
/// }
/// # assert_eq!(parse("abc"), 3);
/// ```
#[track_caller]
pub fn scope(name: &str) -> Scope {
    Scope::enter(FunctionId::at(Location::caller(), name))
}

/// Whether a session is active on this thread.
pub fn is_active() -> bool {
    SESSION.with(|cell| cell.borrow().is_some())
}

/// An active session on the current thread. Dropping it without
/// [`finish`](ActiveSession::finish) discards the recording.
pub(crate) struct ActiveSession {
    previous: Option<Session>,
    closed: bool,
    _thread_bound: PhantomData<*const ()>,
}

impl ActiveSession {
    /// Starts a fresh session, shelving any session already active.
    pub(crate) fn begin() -> Self {
        let previous = SESSION.with(|cell| cell.borrow_mut().replace(Session::new()));
        Self {
            previous,
            closed: false,
            _thread_bound: PhantomData,
        }
    }

    /// Ends the session, returning what it recorded.
    pub(crate) fn finish(mut self) -> Vec<(FunctionId, FunctionStats)> {
        let session = self.close();
        let mut entries: Vec<(FunctionId, FunctionStats)> = session
            .map(|mut s| {
                s.exit_to(0);
                s.stats.into_iter().collect()
            })
            .unwrap_or_default();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    fn close(&mut self) -> Option<Session> {
        if self.closed {
            return None;
        }
        self.closed = true;
        let previous = self.previous.take();
        SESSION.with(|cell| std::mem::replace(&mut *cell.borrow_mut(), previous))
    }
}

impl Drop for ActiveSession {
    fn drop(&mut self) {
        self.close();
    }
}
