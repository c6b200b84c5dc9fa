use std::{
    future::Future,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::fs::operations::{read_locked, write_atomically};

use super::entities::{DataFileEntity, Session, SessionEntity};

/// Interface for abstracting storage of finished sessions. The whole history is small, so it is
/// always read and written as one piece.
pub trait SessionStore {
    /// Retrieves every stored session in the order they were recorded.
    fn load(&self) -> impl Future<Output = Result<Vec<Session>>>;

    /// Replaces the stored history with `sessions`.
    fn save(&self, sessions: &[Session]) -> impl Future<Output = Result<()>>;

    /// Location of the data, handed to the version control side effect.
    fn path(&self) -> &Path;
}

/// The main realization of [SessionStore], a single pretty-printed JSON document.
pub struct JsonSessionStore {
    path: PathBuf,
}

impl JsonSessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl SessionStore for JsonSessionStore {
    async fn load(&self) -> Result<Vec<Session>> {
        let Some(contents) = read_locked(&self.path)
            .await
            .with_context(|| format!("Failed to read {:?}", self.path))?
        else {
            info!("No data file at {:?}, starting with an empty history", self.path);
            return Ok(vec![]);
        };

        if contents.trim().is_empty() {
            return Ok(vec![]);
        }

        let data: DataFileEntity = serde_json::from_str(&contents)
            .with_context(|| format!("{:?} is not a valid time tracking file", self.path))?;

        let sessions = data
            .sessions
            .into_iter()
            .enumerate()
            .map(|(index, entity)| {
                Session::try_from(entity).with_context(|| {
                    format!("Session #{} in {:?} is malformed", index + 1, self.path)
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!("Loaded {} sessions from {:?}", sessions.len(), self.path);
        Ok(sessions)
    }

    async fn save(&self, sessions: &[Session]) -> Result<()> {
        let entities = sessions.iter().map(SessionEntity::from).collect::<Vec<_>>();
        let data = DataFileEntity {
            last_session: entities.last().cloned(),
            sessions: entities,
        };

        let mut buffer = serde_json::to_vec_pretty(&data)?;
        buffer.push(b'\n');

        write_atomically(&self.path, &buffer)
            .await
            .with_context(|| format!("Failed to write {:?}", self.path))?;
        debug!("Saved {} sessions into {:?}", sessions.len(), self.path);
        Ok(())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{Duration, NaiveDate};
    use tempfile::tempdir;

    use crate::{
        storage::entities::{DataFileEntity, Session},
        utils::clock::test_clock::test_time,
    };

    use super::{JsonSessionStore, SessionStore};

    fn test_sessions() -> Vec<Session> {
        let first = test_time(2024, 3, 9, 19, 0, 0);
        let second = test_time(2024, 3, 10, 1, 15, 30);
        vec![
            Session::finish(first, first + Duration::minutes(30)),
            Session::finish(second, second + Duration::seconds(3725)),
        ]
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_history() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonSessionStore::new(dir.path().join("time_data.json"));

        assert_eq!(store.load().await?, vec![]);
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_file_is_empty_history() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("time_data.json");
        std::fs::write(&path, "\n")?;

        assert_eq!(JsonSessionStore::new(path).load().await?, vec![]);
        Ok(())
    }

    #[tokio::test]
    async fn test_save_and_reload() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonSessionStore::new(dir.path().join("time_data.json"));
        let sessions = test_sessions();

        store.save(&sessions).await?;
        let loaded = store.load().await?;

        assert_eq!(loaded, sessions);
        assert_eq!(loaded[1].start, sessions[1].start);
        assert_eq!(loaded[1].end, sessions[1].end);
        assert_eq!(loaded[1].duration, Duration::seconds(3725));
        assert_eq!(loaded[1].night, NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        Ok(())
    }

    #[tokio::test]
    async fn test_save_writes_last_session() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("time_data.json");
        let store = JsonSessionStore::new(path.clone());
        let sessions = test_sessions();

        store.save(&sessions).await?;

        let data: DataFileEntity = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        assert_eq!(data.sessions.len(), 2);
        assert_eq!(
            data.last_session.map(|v| v.start),
            Some(sessions[1].start)
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("time_data.json");
        std::fs::write(&path, r#"{"sessions": [{"start": "#)?;

        let error = JsonSessionStore::new(path).load().await.unwrap_err();

        assert!(format!("{error:#}").contains("not a valid time tracking file"));
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_entry_names_its_position() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("time_data.json");
        std::fs::write(
            &path,
            r#"{
                "sessions": [
                    {
                        "start": "2024-03-09T19:00:00+02:00",
                        "end": "2024-03-09T19:30:00+02:00",
                        "duration_seconds": 1800,
                        "date": "2024-03-09"
                    },
                    {
                        "start": "2024-03-09T20:00:00+02:00",
                        "end": "2024-03-09T19:00:00+02:00",
                        "duration_seconds": 0,
                        "date": "2024-03-09"
                    }
                ],
                "last_session": null
            }"#,
        )?;

        let error = JsonSessionStore::new(path).load().await.unwrap_err();

        assert!(format!("{error:#}").contains("Session #2"));
        Ok(())
    }
}
