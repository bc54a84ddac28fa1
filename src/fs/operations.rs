use std::path::{Path, PathBuf};

use tokio::{
    fs::File,
    io::{self, AsyncWriteExt},
};

/// Replaces contents of `path` with `data` so that readers either see the old file or the new
/// one, never a half written mix. Data goes into a sibling temporary file first which is then
/// renamed over the original.
pub async fn write_atomically(path: &Path, data: &[u8]) -> Result<(), io::Error> {
    let temporary = temporary_sibling(path);
    let mut file = File::create(&temporary).await?;
    file.write_all(data).await?;
    file.sync_all().await?;
    drop(file);

    match tokio::fs::rename(&temporary, path).await {
        Ok(()) => Ok(()),
        Err(e) => {
            let _ = tokio::fs::remove_file(&temporary).await;
            Err(e)
        }
    }
}

fn temporary_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use super::{temporary_sibling, write_atomically};

    #[tokio::test]
    async fn test_write_atomically_creates_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("state.json");

        write_atomically(&path, b"{}").await?;

        assert_eq!(tokio::fs::read_to_string(&path).await?, "{}");
        assert!(!temporary_sibling(&path).exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_write_atomically_replaces_longer_content() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("state.json");

        write_atomically(&path, b"a much longer previous value").await?;
        write_atomically(&path, b"short").await?;

        assert_eq!(tokio::fs::read_to_string(&path).await?, "short");
        Ok(())
    }

    #[tokio::test]
    async fn test_write_atomically_missing_directory() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("missing").join("state.json");

        assert!(write_atomically(&path, b"{}").await.is_err());
        Ok(())
    }

    #[test]
    fn test_temporary_sibling_name() {
        let sibling = temporary_sibling(std::path::Path::new("/tmp/dir/state.json"));
        assert_eq!(sibling, std::path::Path::new("/tmp/dir/state.json.tmp"));
    }
}
