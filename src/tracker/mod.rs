//! Session recording. [Tracker] owns the only mutable state of the application: the finished
//! sessions, the start of the active session and the commit schedule.

pub mod night;
pub mod schedule;
pub mod stats;

use std::time::Duration as StdDuration;

use anyhow::Result;
use chrono::{DateTime, Duration, FixedOffset};
use schedule::CommitSchedule;
use stats::{compute_stats, StatsReport};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    storage::{entities::Session, session_store::SessionStore},
    utils::{clock::Clock, time::format_moment},
    vcs::{CommitOutcome, Committer},
};

/// Commands issued in the wrong order, or a session that couldn't be saved. The tracker state
/// is unchanged whenever one of these is returned.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Session is already running! Started at {}", format_moment(.since))]
    AlreadyActive { since: DateTime<FixedOffset> },
    #[error("No active session to stop!")]
    NotActive,
    #[error("Couldn't save the session, it is still running: {0:#}")]
    Persist(anyhow::Error),
}

pub struct Tracker<S> {
    store: S,
    sessions: Vec<Session>,
    active: Option<DateTime<FixedOffset>>,
    clock: Box<dyn Clock>,
    committer: Box<dyn Committer>,
    schedule: CommitSchedule,
}

impl<S: SessionStore> Tracker<S> {
    /// Loads the stored history. A damaged data file is an error here, so that it is never
    /// overwritten by a later save.
    pub async fn open(
        store: S,
        clock: Box<dyn Clock>,
        committer: Box<dyn Committer>,
        commit_interval: StdDuration,
    ) -> Result<Self> {
        let sessions = store.load().await?;
        info!(
            "Loaded {} sessions from {:?}",
            sessions.len(),
            store.path()
        );
        let schedule = CommitSchedule::new(commit_interval, clock.instant());
        Ok(Self {
            store,
            sessions,
            active: None,
            clock,
            committer,
            schedule,
        })
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn active_since(&self) -> Option<DateTime<FixedOffset>> {
        self.active
    }

    /// Time spent in the active session so far. Computed on every call, never stored.
    pub fn elapsed(&self) -> Option<Duration> {
        self.active
            .map(|start| (self.clock.time() - start).max(Duration::zero()))
    }

    pub fn start(&mut self) -> Result<DateTime<FixedOffset>, TrackerError> {
        if let Some(since) = self.active {
            return Err(TrackerError::AlreadyActive { since });
        }
        let now = self.clock.time();
        self.active = Some(now);
        info!("Started session at {now}");
        Ok(now)
    }

    /// Finalizes the active session and persists the whole history. When saving fails the
    /// session is kept running so that nothing is lost and `stop` can be retried.
    pub async fn stop(&mut self) -> Result<Session, TrackerError> {
        let Some(start) = self.active else {
            return Err(TrackerError::NotActive);
        };
        let session = Session::finish(start, self.clock.time());

        self.sessions.push(session.clone());
        if let Err(e) = self.store.save(&self.sessions).await {
            self.sessions.pop();
            warn!("Failed to save session {session:?}: {e:?}");
            return Err(TrackerError::Persist(e));
        }

        self.active = None;
        info!(
            "Stopped session after {}s, night {}",
            session.duration.num_seconds(),
            session.night
        );
        Ok(session)
    }

    /// Stops the active session, if any. Used when the tracker is closing.
    pub async fn finish(&mut self) -> Result<Option<Session>, TrackerError> {
        if self.active.is_none() {
            return Ok(None);
        }
        self.stop().await.map(Some)
    }

    /// Statistics over everything currently persisted.
    pub async fn stats(&self) -> Result<StatsReport> {
        let sessions = self.store.load().await?;
        Ok(compute_stats(&sessions))
    }

    /// Commits the data file once the schedule says so. Returns `None` when no attempt was
    /// made. Failures are logged and returned, they never affect the tracker.
    pub async fn tick(&mut self) -> Option<Result<CommitOutcome>> {
        let now = self.clock.instant();
        if !self.schedule.is_due(now) {
            return None;
        }
        self.schedule.mark(now);

        debug!("Commit is due after {:?}", self.schedule.interval());
        let result = self.committer.commit(self.store.path()).await;
        match &result {
            Ok(outcome) => info!("Auto-commit finished: {outcome}"),
            Err(e) => warn!("Auto-commit failed {e:?}"),
        }
        Some(result)
    }
}
