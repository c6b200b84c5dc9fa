use std::time::Duration;

use tokio::time::Instant;

/// Default pause between automatic commits of the data file.
pub const DEFAULT_COMMIT_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Decides when the data file should be committed again. It is polled from the prompt loop
/// instead of running on its own, so commits never overlap with a command.
#[derive(Debug, Clone, Copy)]
pub struct CommitSchedule {
    interval: Duration,
    last: Instant,
}

impl CommitSchedule {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            last: now,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last) >= self.interval
    }

    /// Starts a new interval. Called after every attempt, successful or not.
    pub fn mark(&mut self, now: Instant) {
        self.last = now;
    }
}
