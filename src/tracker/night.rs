use chrono::{DateTime, NaiveDate, TimeZone, Timelike};

/// Local hour at which a new night begins.
pub const NIGHT_START_HOUR: u32 = 18;

/// Returns the night a moment belongs to. A night runs from 18:00 of its date until 18:00 of the
/// next day, so anything earlier in the day still counts towards the previous date.
pub fn night_of<Tz: TimeZone>(moment: &DateTime<Tz>) -> NaiveDate {
    let date = moment.date_naive();
    if moment.hour() >= NIGHT_START_HOUR {
        date
    } else {
        date.pred_opt().unwrap_or(date)
    }
}
