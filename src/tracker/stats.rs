use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};

use crate::storage::entities::Session;

/// Accumulated time for a single night.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NightSummary {
    pub total: Duration,
    pub sessions: usize,
}

impl NightSummary {
    fn new() -> Self {
        Self {
            total: Duration::zero(),
            sessions: 0,
        }
    }

    /// Average length of a session during this night.
    pub fn average_session(&self) -> Duration {
        average(self.total, self.sessions)
    }
}

/// Derived statistics. Never persisted, always recomputed from the sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsReport {
    pub session_count: usize,
    pub total: Duration,
    /// Total divided by the number of distinct nights. Zero when nothing was recorded.
    pub average_per_night: Duration,
    pub nights: BTreeMap<NaiveDate, NightSummary>,
}

impl StatsReport {
    pub fn is_empty(&self) -> bool {
        self.session_count == 0
    }

    pub fn night_count(&self) -> usize {
        self.nights.len()
    }

    pub fn nights_newest_first(&self) -> impl Iterator<Item = (&NaiveDate, &NightSummary)> {
        self.nights.iter().rev()
    }
}

/// Folds sessions into a [StatsReport] in a single pass.
pub fn compute_stats<'a>(sessions: impl IntoIterator<Item = &'a Session>) -> StatsReport {
    let mut nights = BTreeMap::<NaiveDate, NightSummary>::new();
    let mut total = Duration::zero();
    let mut session_count = 0;

    for session in sessions {
        total += session.duration;
        session_count += 1;
        let night = nights.entry(session.night).or_insert_with(NightSummary::new);
        night.total += session.duration;
        night.sessions += 1;
    }

    StatsReport {
        session_count,
        total,
        average_per_night: average(total, nights.len()),
        nights,
    }
}

/// Whole-second average. Dividing by zero items yields zero.
fn average(total: Duration, count: usize) -> Duration {
    match i64::try_from(count) {
        Ok(0) | Err(_) => Duration::zero(),
        Ok(count) => Duration::seconds(total.num_seconds() / count),
    }
}
