use std::{
    ffi::OsString,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{self, AsyncReadExt, AsyncWriteExt},
};
use tracing::debug;

/// Reads the whole file under a shared lock. A missing file is reported as `None`.
pub async fn read_locked(path: &Path) -> Result<Option<String>, io::Error> {
    let mut file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    file.lock_shared()?;
    let mut contents = String::new();
    let result = file.read_to_string(&mut contents).await;
    file.unlock_async().await?;
    result?;
    Ok(Some(contents))
}

/// Replaces the file contents so that a reader sees either the old or the new version, never a
/// partial write. Data goes into a sibling temporary file first and is then renamed over the
/// target. The target itself stays exclusively locked until the rename is done, which is the
/// lock [`read_locked`] waits on.
pub async fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), io::Error> {
    let temporary = temporary_path(path);
    debug!("Writing {path:?} through {temporary:?}");

    let target = File::options()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .await?;

    // Semi-safe acquire-release for a file
    target.lock_exclusive()?;
    let result = replace(path, &temporary, contents).await;
    target.unlock_async().await?;

    result
}

async fn replace(path: &Path, temporary: &Path, contents: &[u8]) -> Result<(), io::Error> {
    let mut file = File::options()
        .write(true)
        .create(true)
        .truncate(true)
        .open(temporary)
        .await?;
    let result = write_and_sync(&mut file, contents).await;
    drop(file);

    if let Err(e) = result {
        let _ = tokio::fs::remove_file(temporary).await;
        return Err(e);
    }

    tokio::fs::rename(temporary, path).await
}

async fn write_and_sync(file: &mut File, contents: &[u8]) -> Result<(), io::Error> {
    file.write_all(contents).await?;
    file.flush().await?;
    file.sync_all().await
}

/// `dir/data.json` becomes `dir/.data.json.tmp`.
fn temporary_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or_else(|| "data".as_ref()));
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use std::{path::Path, time::Duration};

    use anyhow::Result;
    use fs4::tokio::AsyncFileExt;
    use tempfile::tempdir;
    use tokio::fs::File;

    use super::{read_locked, temporary_path, write_atomically};

    #[tokio::test]
    async fn test_read_missing_file() -> Result<()> {
        let dir = tempdir()?;
        assert_eq!(read_locked(&dir.path().join("absent.json")).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_write_then_read() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("data.json");

        write_atomically(&path, b"first").await?;
        assert_eq!(read_locked(&path).await?.as_deref(), Some("first"));

        write_atomically(&path, b"second, longer").await?;
        assert_eq!(read_locked(&path).await?.as_deref(), Some("second, longer"));

        write_atomically(&path, b"3").await?;
        assert_eq!(read_locked(&path).await?.as_deref(), Some("3"));
        Ok(())
    }

    #[tokio::test]
    async fn test_write_leaves_no_temporary_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("data.json");

        write_atomically(&path, b"{}").await?;

        let files = std::fs::read_dir(dir.path())?.collect::<Result<Vec<_>, _>>()?;
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name(), "data.json");
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_write_waits_for_readers_lock() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("data.json");
        write_atomically(&path, b"old").await?;

        let reader = File::open(&path).await?;
        reader.lock_shared()?;

        let writing = tokio::spawn({
            let path = path.clone();
            async move { write_atomically(&path, b"new").await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!writing.is_finished());

        reader.unlock_async().await?;
        writing.await??;

        assert_eq!(read_locked(&path).await?.as_deref(), Some("new"));
        Ok(())
    }

    #[test]
    fn test_temporary_path_is_sibling() {
        assert_eq!(
            temporary_path(Path::new("some/dir/time_data.json")),
            Path::new("some/dir/.time_data.json.tmp")
        );
    }
}
