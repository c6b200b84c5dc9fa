use chrono::{DateTime, Duration, NaiveDate, TimeZone};

/// This is the standard way of converting a night to a string in studytime.
pub fn date_to_night_name(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Moments are shown to the user with second precision and without an offset.
pub fn format_moment<Tz: TimeZone>(moment: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    moment.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Formats a duration as `1h 2m 3s`, dropping leading zero units.
pub fn format_duration(v: Duration) -> String {
    let seconds = v.num_seconds().max(0);
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let seconds = seconds % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// Decimal hours rounded to two places, e.g. `1.50`.
pub fn format_hours(v: Duration) -> String {
    format!("{:.2}", duration_hours(v))
}

pub fn duration_hours(v: Duration) -> f64 {
    (v.num_seconds() as f64 / 36.).round() / 100.
}
