//! Wall-clock collaborator.
//!
//! The only time-dependent operation in the engine is stamping a log entry or a vital reading
//! when the clinician did not type an explicit time. The clock is injected so that callers and
//! tests control what "now" means.

/// Supplies the current local time of day.
pub trait Clock {
    /// Current local time formatted as `HH:MM`.
    fn now_hhmm(&self) -> String;
}

/// Reads the local system clock. No timezone conversion is applied.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_hhmm(&self) -> String {
        chrono::Local::now().format("%H:%M").to_string()
    }
}

/// A clock frozen at a fixed time of day.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FixedClock(String);

impl FixedClock {
    pub fn new(hhmm: impl Into<String>) -> Self {
        Self(hhmm.into())
    }
}

impl Clock for FixedClock {
    fn now_hhmm(&self) -> String {
        self.0.clone()
    }
}
