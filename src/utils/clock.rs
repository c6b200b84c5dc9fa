use chrono::{DateTime, FixedOffset, Local};
use tokio::time::Instant;

/// Represents an entity responsible for providing dates across application. Wall-clock time is
/// used for recording sessions, the monotonic instant for scheduling commits. Both can be
/// replaced during testing.
pub trait Clock: Sync + Send + 'static {
    /// Current local time. The offset is kept so that nights are computed from the local
    /// time of day the user actually saw.
    fn time(&self) -> DateTime<FixedOffset>;

    fn instant(&self) -> Instant;
}

pub struct DefaultClock;

impl Clock for DefaultClock {
    fn time(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }
}
