//! Version control side effect. The tracker only knows the [Committer] contract, so the git
//! implementation can be switched off or replaced in tests.

pub mod git;

use std::{fmt::Display, path::Path};

use anyhow::Result;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

/// What happened during a commit attempt. Everything except an `Err` is a normal outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed { pushed: bool },
    NothingToCommit,
    NotARepository,
    GitUnavailable,
    Disabled,
}

impl Display for CommitOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommitOutcome::Committed { pushed: true } => write!(f, "committed and pushed"),
            CommitOutcome::Committed { pushed: false } => write!(f, "committed locally"),
            CommitOutcome::NothingToCommit => write!(f, "nothing to commit"),
            CommitOutcome::NotARepository => write!(f, "not a git repository"),
            CommitOutcome::GitUnavailable => write!(f, "git is not installed"),
            CommitOutcome::Disabled => write!(f, "auto-commit disabled"),
        }
    }
}

/// Records the current state of the data file in version control. Best-effort: callers log
/// errors and carry on.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Committer: Send + Sync {
    async fn commit(&self, file: &Path) -> Result<CommitOutcome>;
}

/// Used when auto-commit is turned off.
pub struct DisabledCommitter;

#[async_trait]
impl Committer for DisabledCommitter {
    async fn commit(&self, _file: &Path) -> Result<CommitOutcome> {
        Ok(CommitOutcome::Disabled)
    }
}
