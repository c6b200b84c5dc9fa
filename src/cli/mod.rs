pub mod prompt;
pub mod report;
pub mod shutdown;

use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use clap::Parser;
use prompt::run_prompt;
use shutdown::detect_shutdown;
use tokio::{io::BufReader, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{info, level_filters::LevelFilter, warn};

use crate::{
    storage::session_store::JsonSessionStore,
    tracker::{schedule::DEFAULT_COMMIT_INTERVAL, Tracker},
    utils::{clock::DefaultClock, dir::create_application_default_path, logging::enable_logging},
    vcs::{git::GitCommitter, Committer, DisabledCommitter},
};

#[derive(Parser, Debug)]
#[command(name = "studytime", version, long_about = None)]
#[command(about = "Tracks study time per night and keeps the data file committed", long_about = None)]
pub struct Args {
    #[arg(
        long,
        default_value = "time_data.json",
        help = "Data file holding every finished session"
    )]
    file: PathBuf,
    #[arg(
        long = "commit-interval",
        default_value_t = DEFAULT_COMMIT_INTERVAL.as_secs() / 60,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Minutes between automatic commits of the data file"
    )]
    commit_interval: u64,
    #[arg(long = "no-commit", help = "Never commit the data file")]
    no_commit: bool,
    #[arg(long = "no-push", help = "Commit locally without pushing to the remote")]
    no_push: bool,
    #[arg(long, help = "Print logs to the console")]
    log: bool,
    #[arg(long = "log-filter", help = "Log level, overrides RUST_LOG")]
    log_filter: Option<LevelFilter>,
    #[arg(
        long = "log-dir",
        help = "Log directory. By default logs go into $XDG_STATE_HOME/studytime/logs or $HOME/.local/state/studytime/logs"
    )]
    log_dir: Option<PathBuf>,
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let log_dir = match args.log_dir {
        Some(dir) => dir,
        None => create_application_default_path()?.join("logs"),
    };
    let logging_level = match args.log_filter {
        Some(level) => Some(level),
        None if args.log => Some(LevelFilter::TRACE),
        None => None,
    };
    enable_logging(&log_dir, logging_level, args.log)?;

    let committer: Box<dyn Committer> = if args.no_commit {
        Box::new(DisabledCommitter)
    } else {
        Box::new(GitCommitter::new(!args.no_push))
    };

    let mut tracker = Tracker::open(
        JsonSessionStore::new(args.file),
        Box::new(DefaultClock),
        committer,
        Duration::from_secs(args.commit_interval * 60),
    )
    .await?;

    let shutdown_token = CancellationToken::new();
    let watcher = tokio::spawn(detect_shutdown(shutdown_token.clone()));

    let result = run_prompt(
        &mut tracker,
        BufReader::new(tokio::io::stdin()),
        &mut std::io::stdout(),
        shutdown_token.clone(),
    )
    .await;

    shutdown_token.cancel();
    join_watcher(watcher).await;
    info!("Tracker closed");
    result
}

/// A watcher that panicked or was aborted has nothing left to clean up, so it is only logged.
async fn join_watcher(watcher: JoinHandle<()>) {
    if let Err(e) = watcher.await {
        warn!("Shutdown watcher ended abnormally {e:?}");
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use crate::tracker::schedule::DEFAULT_COMMIT_INTERVAL;

    use super::{join_watcher, Args};

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["studytime"]).unwrap();

        assert_eq!(args.file.to_str(), Some("time_data.json"));
        assert_eq!(args.commit_interval, 15);
        assert_eq!(args.commit_interval * 60, DEFAULT_COMMIT_INTERVAL.as_secs());
        assert!(!args.no_commit && !args.no_push && !args.log);
    }

    #[test]
    fn test_rejects_zero_interval() {
        assert!(Args::try_parse_from(["studytime", "--commit-interval", "0"]).is_err());
    }

    #[test]
    fn test_options() {
        let args = Args::try_parse_from([
            "studytime",
            "--file",
            "notes/hours.json",
            "--commit-interval",
            "5",
            "--no-push",
            "--log-filter",
            "debug",
        ])
        .unwrap();

        assert_eq!(args.file.to_str(), Some("notes/hours.json"));
        assert_eq!(args.commit_interval, 5);
        assert!(args.no_push);
        assert_eq!(args.log_filter, Some(tracing::level_filters::LevelFilter::DEBUG));
    }

    #[tokio::test]
    async fn test_panicked_watcher_is_only_logged() {
        let watcher = tokio::spawn(async { panic!("signal handler failed") });

        join_watcher(watcher).await;
    }
}
