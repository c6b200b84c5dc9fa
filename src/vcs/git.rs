use std::{
    ffi::OsStr,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    process::{Output, Stdio},
};

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::Local;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

use super::{CommitOutcome, Committer};

const DEFAULT_BRANCH: &str = "main";

/// Commits the data file with the `git` binary found on `PATH`, then optionally pushes the
/// current branch to the first configured remote.
pub struct GitCommitter {
    push: bool,
}

impl GitCommitter {
    pub fn new(push: bool) -> Self {
        Self { push }
    }
}

#[async_trait]
impl Committer for GitCommitter {
    #[instrument(skip(self))]
    async fn commit(&self, file: &Path) -> Result<CommitOutcome> {
        Repository::for_file(file)?.commit(self.push).await
    }
}

/// Runs git inside the data file's directory and only ever touches that one file.
struct Repository {
    dir: PathBuf,
    file: PathBuf,
}

impl Repository {
    fn for_file(file: &Path) -> Result<Self> {
        let name = file
            .file_name()
            .ok_or_else(|| anyhow!("{file:?} does not name a file"))?;
        let dir = match file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Ok(Self {
            dir,
            file: PathBuf::from(name),
        })
    }

    async fn git<I, S>(&self, args: I) -> io::Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        Command::new("git")
            .args(args)
            .current_dir(&self.dir)
            .stdin(Stdio::null())
            .output()
            .await
    }

    /// Like [Repository::git], but a non-zero exit is an error.
    async fn git_checked<I, S>(&self, args: I, action: &str) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let output = self
            .git(args)
            .await
            .with_context(|| format!("Failed to run git {action}"))?;
        if !output.status.success() {
            bail!(
                "git {action} failed with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(output)
    }

    async fn commit(&self, push: bool) -> Result<CommitOutcome> {
        let output = match self.git(["rev-parse", "--git-dir"]).await {
            Ok(output) => output,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(CommitOutcome::GitUnavailable),
            Err(e) => return Err(e).context("Failed to run git rev-parse"),
        };
        if !output.status.success() {
            return Ok(CommitOutcome::NotARepository);
        }

        let file = self.file.as_os_str();
        let status = self
            .git_checked(
                [OsStr::new("status"), OsStr::new("--porcelain"), OsStr::new("--"), file],
                "status",
            )
            .await?;
        if String::from_utf8_lossy(&status.stdout).trim().is_empty() {
            return Ok(CommitOutcome::NothingToCommit);
        }

        self.git_checked([OsStr::new("add"), OsStr::new("--"), file], "add")
            .await?;

        let message = format!(
            "Auto-commit: Time tracking update at {}",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        self.git_checked(
            [
                OsStr::new("commit"),
                OsStr::new("-m"),
                OsStr::new(&message),
                OsStr::new("--"),
                file,
            ],
            "commit",
        )
        .await?;
        info!("Committed {:?} in {:?}", self.file, self.dir);

        let pushed = push && self.push().await;
        Ok(CommitOutcome::Committed { pushed })
    }

    /// Push failures leave the commit in place locally, so they are only logged.
    async fn push(&self) -> bool {
        let remote = match self.git_checked(["remote"], "remote").await {
            Ok(output) => first_line(&output.stdout),
            Err(e) => {
                warn!("Couldn't list remotes {e:?}");
                return false;
            }
        };
        let Some(remote) = remote else {
            info!("No remote repository configured. Skipping push");
            return false;
        };

        let branch = match self.git_checked(["branch", "--show-current"], "branch").await {
            Ok(output) => first_line(&output.stdout).unwrap_or_else(|| DEFAULT_BRANCH.into()),
            Err(_) => DEFAULT_BRANCH.into(),
        };

        debug!("Pushing {branch} to {remote}");
        match self.git_checked(["push", remote.as_str(), branch.as_str()], "push").await {
            Ok(_) => true,
            Err(e) => {
                warn!("Push failed, changes are only committed locally {e:?}");
                false
            }
        }
    }
}

fn first_line(output: &[u8]) -> Option<String> {
    String::from_utf8_lossy(output)
        .lines()
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(String::from)
}
