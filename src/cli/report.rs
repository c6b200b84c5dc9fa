use std::io::{self, Write};

use ansi_term::Style;

use crate::{
    storage::entities::Session,
    tracker::stats::StatsReport,
    utils::time::{date_to_night_name, format_duration, format_hours, format_moment},
};

const RULE_WIDTH: usize = 60;

pub fn write_banner(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
    writeln!(out, "{}", Style::new().bold().paint("COURSE TIME TRACKER"))?;
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
    writeln!(out, "Commands:")?;
    writeln!(out, "  start  - Start tracking time")?;
    writeln!(out, "  stop   - Stop tracking and save session")?;
    writeln!(out, "  stats  - Show statistics")?;
    writeln!(out, "  quit   - Exit the tracker")?;
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))
}

pub fn write_session_end(out: &mut impl Write, session: &Session) -> io::Result<()> {
    writeln!(out, "Session ended at {}", format_moment(&session.end))?;
    writeln!(out, "Duration: {}", format_duration(session.duration))?;
    writeln!(out, "Date (night): {}", date_to_night_name(session.night))
}

/// Prints totals followed by a per-night breakdown, newest night first.
pub fn write_report(out: &mut impl Write, report: &StatsReport) -> io::Result<()> {
    if report.is_empty() {
        return writeln!(out, "No sessions recorded yet.");
    }

    writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
    writeln!(out, "{}", Style::new().bold().paint("TIME TRACKING STATISTICS"))?;
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
    writeln!(out, "Total sessions: {}", report.session_count)?;
    writeln!(
        out,
        "Total time: {} ({} hours)",
        format_duration(report.total),
        format_hours(report.total)
    )?;
    writeln!(out, "Total nights tracked: {}", report.night_count())?;
    writeln!(
        out,
        "Average time per night: {} ({} hours)",
        format_duration(report.average_per_night),
        format_hours(report.average_per_night)
    )?;
    writeln!(out)?;
    writeln!(out, "Per-night breakdown:")?;
    writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;
    for (night, summary) in report.nights_newest_first() {
        writeln!(
            out,
            "{}: {} ({} session{}, avg: {})",
            date_to_night_name(*night),
            format_duration(summary.total),
            summary.sessions,
            if summary.sessions == 1 { "" } else { "s" },
            format_duration(summary.average_session())
        )?;
    }
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::Duration;

    use crate::{
        storage::entities::Session,
        tracker::stats::compute_stats,
        utils::clock::test_clock::test_time,
    };

    use super::{write_report, write_session_end};

    fn render(sessions: &[Session]) -> Result<String> {
        let mut out = Vec::new();
        write_report(&mut out, &compute_stats(sessions))?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn test_empty_report() -> Result<()> {
        assert_eq!(render(&[])?, "No sessions recorded yet.\n");
        Ok(())
    }

    #[test]
    fn test_report_lines() -> Result<()> {
        let first = test_time(2024, 3, 9, 19, 0, 0);
        let second = test_time(2024, 3, 10, 20, 0, 0);
        let sessions = [
            Session::finish(first, first + Duration::minutes(30)),
            Session::finish(first + Duration::hours(1), first + Duration::hours(2)),
            Session::finish(second, second + Duration::hours(1)),
        ];

        let text = render(&sessions)?;

        assert!(text.contains("Total sessions: 3\n"));
        assert!(text.contains("Total time: 2h 30m 0s (2.50 hours)\n"));
        assert!(text.contains("Total nights tracked: 2\n"));
        assert!(text.contains("Average time per night: 1h 15m 0s (1.25 hours)\n"));
        let newest = text.find("2024-03-10: 1h 0m 0s (1 session, avg: 1h 0m 0s)");
        let oldest = text.find("2024-03-09: 1h 30m 0s (2 sessions, avg: 45m 0s)");
        assert!(newest.is_some() && oldest.is_some());
        assert!(newest < oldest);
        Ok(())
    }

    #[test]
    fn test_session_end() -> Result<()> {
        let start = test_time(2024, 3, 10, 2, 0, 0);
        let mut out = Vec::new();

        write_session_end(&mut out, &Session::finish(start, start + Duration::seconds(75)))?;

        assert_eq!(
            String::from_utf8(out)?,
            "Session ended at 2024-03-10 02:01:15\nDuration: 1m 15s\nDate (night): 2024-03-09\n"
        );
        Ok(())
    }
}
