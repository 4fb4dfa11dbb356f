//! Server time source.

use std::time::{SystemTime, UNIX_EPOCH};

/// Source of server-assigned timestamps.
///
/// The lifecycle store stamps `srvCreated`/`srvModified` through this seam
/// so tests can pin time.
pub trait Clock: Send + Sync {
    /// Returns the current time in unix millis.
    fn now_ms(&self) -> u64;
}

/// Wall-clock time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// A clock pinned to a fixed instant. Useful for testing.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now_ms(&self) -> u64 {
        self.0
    }
}
