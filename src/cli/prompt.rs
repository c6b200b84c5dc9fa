use std::{io::Write, str::FromStr, time::Duration};

use ansi_term::Colour;
use anyhow::{anyhow, bail, Result};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt},
    time::MissedTickBehavior,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::{
    storage::session_store::SessionStore,
    tracker::Tracker,
    utils::time::{format_duration, format_moment},
    vcs::CommitOutcome,
};

use super::report::{write_banner, write_report, write_session_end};

/// How often the loop wakes up to check whether a commit is due.
const TICK: Duration = Duration::from_secs(1);

/// The four keywords understood at the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptCommand {
    Start,
    Stop,
    Stats,
    Quit,
}

impl FromStr for PromptCommand {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            "stats" => Ok(Self::Stats),
            "quit" => Ok(Self::Quit),
            _ => Err(anyhow!(
                "Unknown command. Use 'start', 'stop', 'stats', or 'quit'"
            )),
        }
    }
}

enum Flow {
    Continue,
    Exit,
}

/// Executes the prompt loop until `quit`, end of input or cancellation. Commands, commit checks
/// and the shutdown signal are handled strictly one after another.
pub async fn run_prompt<S: SessionStore>(
    tracker: &mut Tracker<S>,
    mut input: impl AsyncBufRead + Unpin,
    out: &mut impl Write,
    shutdown: CancellationToken,
) -> Result<()> {
    write_banner(out)?;
    write_prompt(out, tracker)?;

    // Lines are read as raw bytes so that input which isn't UTF-8 is just an unknown command.
    // Partially read bytes stay in the buffer when another branch wins the select.
    let mut buffer = Vec::new();
    let mut ticker = tokio::time::interval(TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                info!("Interrupted");
                writeln!(out)?;
                return close_on_exit(tracker, out).await;
            }
            read = input.read_until(b'\n', &mut buffer) => {
                match read {
                    Ok(0) if buffer.is_empty() => {
                        info!("Input closed");
                        writeln!(out)?;
                        return close_on_exit(tracker, out).await;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!("Failed to read input {e:?}");
                        writeln!(out)?;
                        close_on_exit(tracker, out).await?;
                        return Err(anyhow!(e).context("Failed to read input"));
                    }
                }
                let line = String::from_utf8_lossy(&buffer).into_owned();
                buffer.clear();
                if let Flow::Exit = handle_line(tracker, out, &line).await? {
                    return Ok(());
                }
                write_prompt(out, tracker)?;
            }
            _ = ticker.tick() => {
                if write_commit_outcome(out, tracker.tick().await)? {
                    write_prompt(out, tracker)?;
                }
            }
        }
    }
}

async fn handle_line<S: SessionStore>(
    tracker: &mut Tracker<S>,
    out: &mut impl Write,
    line: &str,
) -> Result<Flow> {
    if line.trim().is_empty() {
        return Ok(Flow::Continue);
    }
    let command = match line.parse::<PromptCommand>() {
        Ok(command) => command,
        Err(e) => {
            writeln!(out, "{e}")?;
            return Ok(Flow::Continue);
        }
    };
    debug!("Running {command:?}");

    match command {
        PromptCommand::Start => match tracker.start() {
            Ok(started) => {
                writeln!(out, "Started tracking at {}", format_moment(&started))?;
                writeln!(out, "Type 'stop' to end the session, or Ctrl+C to exit")?;
            }
            Err(e) => writeln!(out, "{e}")?,
        },
        PromptCommand::Stop => {
            match tracker.stop().await {
                Ok(session) => write_session_end(out, &session)?,
                Err(e) => writeln!(out, "{e}")?,
            }
            write_commit_outcome(out, tracker.tick().await)?;
        }
        PromptCommand::Stats => match tracker.stats().await {
            Ok(report) => write_report(out, &report)?,
            Err(e) => {
                error!("Failed to compute statistics {e:?}");
                writeln!(out, "Couldn't compute statistics: {e:#}")?;
            }
        },
        PromptCommand::Quit => return close(tracker, out).await,
    }
    Ok(Flow::Continue)
}

/// Finalizes the active session before leaving. If it can't be saved the tracker stays open.
async fn close<S: SessionStore>(tracker: &mut Tracker<S>, out: &mut impl Write) -> Result<Flow> {
    if tracker.active_since().is_some() {
        writeln!(out, "Stopping active session...")?;
    }
    match tracker.finish().await {
        Ok(Some(session)) => write_session_end(out, &session)?,
        Ok(None) => {}
        Err(e) => {
            writeln!(out, "{e}")?;
            return Ok(Flow::Continue);
        }
    }
    write_commit_outcome(out, tracker.tick().await)?;
    writeln!(out, "Goodbye!")?;
    Ok(Flow::Exit)
}

/// Like [close], but there is no prompt left to retry from.
async fn close_on_exit<S: SessionStore>(
    tracker: &mut Tracker<S>,
    out: &mut impl Write,
) -> Result<()> {
    match close(tracker, out).await? {
        Flow::Exit => Ok(()),
        Flow::Continue => bail!("The active session could not be saved before exiting"),
    }
}

fn write_prompt<S: SessionStore>(out: &mut impl Write, tracker: &Tracker<S>) -> Result<()> {
    match tracker.elapsed() {
        Some(elapsed) => write!(out, "[Running] Elapsed: {} > ", format_duration(elapsed))?,
        None => write!(out, "> ")?,
    }
    out.flush()?;
    Ok(())
}

/// Only actual commits and failures are worth interrupting the user for. Returns whether
/// anything was written.
fn write_commit_outcome(
    out: &mut impl Write,
    outcome: Option<Result<CommitOutcome>>,
) -> Result<bool> {
    match outcome {
        Some(Ok(outcome @ CommitOutcome::Committed { .. })) => {
            writeln!(out, "\n[Auto-commit] Data file {outcome}")?;
            Ok(true)
        }
        Some(Err(e)) => {
            writeln!(
                out,
                "\n{} Git commit failed: {e:#}",
                Colour::Yellow.paint("[Warning]")
            )?;
            Ok(true)
        }
        Some(Ok(_)) | None => Ok(false),
    }
}
