//! Monotonic timestamp source for audit-record ordering.
//!
//! Combines physical wall-clock milliseconds with a logical counter so that
//! records emitted by one service are totally ordered even when the system
//! clock stalls or steps backwards. This is what makes per-actor ordering
//! of audit records within a session reliable without coordinating clocks
//! across services.

use std::cmp::Ordering;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// A hybrid timestamp: physical millis, logical counter, originating service.
///
/// Ordering is defined as: millis first, then counter, then service id
/// (lexicographic byte order), giving a total order across the platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    /// Physical wall-clock milliseconds since Unix epoch.
    pub millis: u64,
    /// Logical counter for events within the same millisecond.
    pub counter: u32,
    /// Identifier of the service that issued this timestamp.
    pub service_id: String,
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.millis
            .cmp(&other.millis)
            .then_with(|| self.counter.cmp(&other.counter))
            .then_with(|| self.service_id.cmp(&other.service_id))
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Abstraction over the system clock for dependency injection.
///
/// Allows deterministic testing by replacing the real clock with a manual
/// one. The default implementation ([`SystemClock`]) reads `SystemTime`.
pub trait ClockSource: Send + Sync {
    /// Returns the current time as milliseconds since Unix epoch.
    fn now(&self) -> u64;
}

/// Default clock source that reads the real system time.
#[derive(Debug, Clone)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn now(&self) -> u64 {
        u64::try_from(
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("system clock is before Unix epoch")
                .as_millis(),
        )
        .expect("system clock beyond u64 millis range")
    }
}

/// Issues strictly monotonic [`Timestamp`]s for one service process.
///
/// When the wall clock advances, the counter resets to 0; when it is
/// unchanged or behind the last issued timestamp, the counter increments.
/// Safe to share across threads; the internal lock is held only for the
/// few instructions of a tick.
pub struct AuditClock {
    service_id: String,
    state: Mutex<ClockState>,
    clock_source: Box<dyn ClockSource>,
}

#[derive(Debug)]
struct ClockState {
    last_millis: u64,
    last_counter: u32,
}

impl AuditClock {
    /// Creates a clock for the given service, backed by the system time.
    #[must_use]
    pub fn new(service_id: impl Into<String>) -> Self {
        Self::with_source(service_id, Box::new(SystemClock))
    }

    /// Creates a clock backed by an injected [`ClockSource`].
    #[must_use]
    pub fn with_source(service_id: impl Into<String>, clock_source: Box<dyn ClockSource>) -> Self {
        Self {
            service_id: service_id.into(),
            state: Mutex::new(ClockState {
                last_millis: 0,
                last_counter: 0,
            }),
            clock_source,
        }
    }

    /// Issues the next timestamp, strictly greater than every previous one.
    ///
    /// # Panics
    ///
    /// Panics if another thread panicked while holding the clock lock.
    pub fn now(&self) -> Timestamp {
        let wall = self.clock_source.now();
        let mut state = self.state.lock().expect("audit clock lock poisoned");
        if wall > state.last_millis {
            state.last_millis = wall;
            state.last_counter = 0;
        } else {
            state.last_counter += 1;
        }
        Timestamp {
            millis: state.last_millis,
            counter: state.last_counter,
            service_id: self.service_id.clone(),
        }
    }
}
