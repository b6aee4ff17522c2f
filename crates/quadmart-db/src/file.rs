use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::KvError;
use crate::kv::KvBackend;

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Key-value store on the local filesystem.
///
/// Each key is stored as a single flat file at `{dir}/{key}.json`. Writes
/// land in a temporary sibling first and are renamed over the target, so
/// readers see either the old blob or the new one.
#[derive(Debug, Clone)]
pub struct FileKv {
    dir: PathBuf,
}

impl FileKv {
    pub async fn new(dir: PathBuf) -> Result<Self, KvError> {
        fs::create_dir_all(&dir).await?;
        info!("Key-value directory: {}", dir.display());
        Ok(Self { dir })
    }

    /// Path to the file for a given key.
    pub fn file_path(&self, key: &str) -> Result<PathBuf, KvError> {
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(KvError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }

    fn tmp_path(&self, key: &str) -> PathBuf {
        let n = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.dir
            .join(format!(".{key}.{}.{n}.tmp", std::process::id()))
    }
}

async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

impl KvBackend for FileKv {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let path = self.file_path(key)?;
        match fs::read_to_string(&path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), KvError> {
        let path = self.file_path(key)?;
        let tmp = self.tmp_path(key);

        if let Err(e) = write_synced(&tmp, value.as_bytes()).await {
            fs::remove_file(&tmp).await.ok();
            return Err(e.into());
        }

        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), KvError> {
        let path = self.file_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Deleted {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let kv = FileKv::new(dir.path().to_path_buf()).await.unwrap();

        assert_eq!(kv.get("listings").await.unwrap(), None);

        kv.set("listings", "[\"a\"]".into()).await.unwrap();
        assert_eq!(kv.get("listings").await.unwrap().as_deref(), Some("[\"a\"]"));
        assert!(dir.path().join("listings.json").exists());

        kv.remove("listings").await.unwrap();
        kv.remove("listings").await.unwrap();
        assert_eq!(kv.get("listings").await.unwrap(), None);
    }

    #[tokio::test]
    async fn overwrite_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let kv = FileKv::new(dir.path().to_path_buf()).await.unwrap();

        kv.set("listings", "1".into()).await.unwrap();
        kv.set("listings", "2".into()).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["listings.json".to_string()]);
        assert_eq!(kv.get("listings").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let kv = FileKv::new(dir.path().to_path_buf()).await.unwrap();

        for key in ["", "../escape", "a/b", "with space"] {
            assert!(matches!(kv.get(key).await, Err(KvError::InvalidKey(_))), "{key:?}");
        }
    }
}
