use anyhow::{bail, Result};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{tracker::night::night_of, utils::time::duration_hours};

/// A finished start-to-stop interval. Only finished sessions are ever stored.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Session {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    /// Whole seconds between start and end.
    pub duration: Duration,
    /// Night the session is attributed to, derived from its start.
    pub night: NaiveDate,
}

impl Session {
    /// Finalizes an interval. An end before the start (the clock was moved backwards) is treated
    /// as an empty session rather than a negative one.
    pub fn finish(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Self {
        let end = end.max(start);
        Self {
            start,
            end,
            duration: Duration::seconds((end - start).num_seconds()),
            night: night_of(&start),
        }
    }
}

/// On-disk shape of a [Session]. `duration_hours` is informational only and is never read back.
#[derive(PartialEq, Debug, Serialize, Deserialize, Clone)]
pub struct SessionEntity {
    #[serde(with = "timestamp_ser")]
    pub start: DateTime<FixedOffset>,
    #[serde(with = "timestamp_ser")]
    pub end: DateTime<FixedOffset>,
    #[serde(rename = "duration_seconds", with = "duration_ser")]
    pub duration: Duration,
    #[serde(default, skip_deserializing)]
    pub duration_hours: f64,
    #[serde(rename = "date")]
    pub night: NaiveDate,
}

impl From<&Session> for SessionEntity {
    fn from(session: &Session) -> Self {
        SessionEntity {
            start: session.start,
            end: session.end,
            duration: session.duration,
            duration_hours: duration_hours(session.duration),
            night: session.night,
        }
    }
}

impl TryFrom<SessionEntity> for Session {
    type Error = anyhow::Error;

    /// Stored values must agree with the timestamps. Anything else means the file was edited or
    /// damaged, and guessing which field is right would silently change the statistics.
    ///
    /// The recorded duration may match either the elapsed time or the difference between the
    /// two local wall-clock readings. Files written without offsets measured the latter, which
    /// differs from the elapsed time when a session crosses a daylight saving change.
    fn try_from(entity: SessionEntity) -> Result<Self> {
        let elapsed = entity.end - entity.start;
        let wall_clock = entity.end.naive_local() - entity.start.naive_local();
        if elapsed < Duration::zero() && wall_clock < Duration::zero() {
            bail!(
                "session starting at {} ends before it starts ({})",
                entity.start,
                entity.end
            );
        }
        let recorded = entity.duration.num_seconds();
        if recorded != elapsed.num_seconds() && recorded != wall_clock.num_seconds() {
            bail!(
                "session starting at {} records {}s but its timestamps span {}s",
                entity.start,
                recorded,
                elapsed.num_seconds()
            );
        }
        let night = night_of(&entity.start);
        if night != entity.night {
            bail!(
                "session starting at {} is recorded for night {} but belongs to {}",
                entity.start,
                entity.night,
                night
            );
        }
        Ok(Session {
            start: entity.start,
            end: entity.end,
            duration: entity.duration,
            night,
        })
    }
}

/// The whole data file. `last_session` mirrors the final entry for quick inspection.
#[derive(PartialEq, Debug, Serialize, Deserialize, Clone, Default)]
pub struct DataFileEntity {
    #[serde(default)]
    pub sessions: Vec<SessionEntity>,
    #[serde(default)]
    pub last_session: Option<SessionEntity>,
}

mod duration_ser {
    use chrono::Duration;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(duration.num_seconds())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = i64::deserialize(deserializer)?;
        let duration = Duration::seconds(s);
        Ok(duration)
    }
}

/// RFC 3339 with the local offset. Timestamps without an offset are accepted too and read as
/// local time, which is what older data files contain.
mod timestamp_ser {
    use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, SecondsFormat, TimeZone};
    use serde::{self, de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(moment: &DateTime<FixedOffset>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&moment.to_rfc3339_opts(SecondsFormat::AutoSi, false))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if let Ok(moment) = DateTime::parse_from_rfc3339(&s) {
            return Ok(moment);
        }
        let naive = s
            .parse::<NaiveDateTime>()
            .map_err(|e| D::Error::custom(format!("invalid timestamp {s:?}: {e}")))?;
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|v| v.fixed_offset())
            .ok_or_else(|| D::Error::custom(format!("timestamp {s:?} does not exist locally")))
    }
}
