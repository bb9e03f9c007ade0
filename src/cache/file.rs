use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    error::{CacheError, CacheResult},
    traits::Cache,
};
use crate::config::FileCacheConfig;

/// On-disk envelope: the stored bytes plus their expiry.
#[derive(Debug, Serialize, Deserialize)]
struct FileEntry {
    key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
    value: serde_json::Value,
}

/// File-based cache.
///
/// Stores one JSON file per key in a directory. Values must themselves be
/// JSON (the cache is only written through [`CacheExt`](super::CacheExt)).
/// Writes go to a temporary file first and are renamed into place.
#[derive(Debug, Clone)]
pub struct FileCache {
    path: PathBuf,
}

impl FileCache {
    pub fn new(config: &FileCacheConfig) -> Self {
        Self::at(&config.path)
    }

    pub fn at(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| match c {
                'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => c,
                _ => '_',
            })
            .collect();
        self.path.join(format!("{file_name}.json"))
    }
}

#[async_trait]
impl Cache for FileCache {
    async fn get_bytes(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let path = self.entry_path(key);
        let contents = match tokio::fs::read(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let entry: FileEntry = serde_json::from_slice(&contents)
            .map_err(|e| CacheError::Deserialization(e.to_string()))?;

        if entry.key != key {
            // Two keys sanitized to the same file name
            return Ok(None);
        }

        if entry.expires_at.is_some_and(|exp| Utc::now() > exp) {
            tracing::debug!(path = ?path, "Removing expired cache file");
            if let Err(e) = tokio::fs::remove_file(&path).await {
                tracing::debug!(path = ?path, error = %e, "Failed to remove expired cache file");
            }
            return Ok(None);
        }

        let bytes =
            serde_json::to_vec(&entry.value).map_err(|e| CacheError::Serialization(e.to_string()))?;
        Ok(Some(bytes))
    }

    async fn set_bytes(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<()> {
        let value: serde_json::Value = serde_json::from_slice(value)
            .map_err(|e| CacheError::Serialization(format!("file cache stores JSON only: {e}")))?;

        let expires_at = if ttl.is_zero() {
            None
        } else {
            let ttl = chrono::Duration::from_std(ttl)
                .map_err(|e| CacheError::Internal(e.to_string()))?;
            Some(Utc::now() + ttl)
        };

        let entry = FileEntry {
            key: key.to_string(),
            expires_at,
            value,
        };
        let contents =
            serde_json::to_vec(&entry).map_err(|e| CacheError::Serialization(e.to_string()))?;

        tokio::fs::create_dir_all(&self.path).await?;

        let path = self.entry_path(key);
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &contents).await?;
        tokio::fs::rename(&tmp_path, &path).await?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        match tokio::fs::remove_file(self.entry_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheExt;

    #[tokio::test]
    async fn test_set_and_get_json() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::at(dir.path().join("nested/cache"));

        cache
            .set_json("llm-registry:registry:v1", &vec!["a", "b"], Duration::from_secs(60))
            .await
            .unwrap();

        let value: Option<Vec<String>> = cache.get_json("llm-registry:registry:v1").await.unwrap();
        assert_eq!(value, Some(vec!["a".to_string(), "b".to_string()]));
        assert!(
            dir.path()
                .join("nested/cache/llm-registry_registry_v1.json")
                .exists()
        );
    }

    #[tokio::test]
    async fn test_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::at(dir.path());
        assert!(cache.get_bytes("absent").await.unwrap().is_none());
        cache.delete("absent").await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::at(dir.path());

        cache
            .set_json("short", &1u32, Duration::from_millis(50))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let value: Option<u32> = cache.get_json("short").await.unwrap();
        assert!(value.is_none());
        assert!(!dir.path().join("short.json").exists());
    }

    #[tokio::test]
    async fn test_survives_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        FileCache::at(dir.path())
            .set_json("k", &"persisted", Duration::ZERO)
            .await
            .unwrap();

        let value: Option<String> = FileCache::at(dir.path()).get_json("k").await.unwrap();
        assert_eq!(value.as_deref(), Some("persisted"));
    }

    #[tokio::test]
    async fn test_rejects_non_json_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::at(dir.path());
        let err = cache
            .set_bytes("k", b"\xff\x00", Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("k.json"), b"{ truncated")
            .await
            .unwrap();

        let err = FileCache::at(dir.path()).get_bytes("k").await.unwrap_err();
        assert!(matches!(err, CacheError::Deserialization(_)));
    }

    #[tokio::test]
    async fn test_delete() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::at(dir.path());
        cache.set_json("k", &true, Duration::ZERO).await.unwrap();
        cache.delete("k").await.unwrap();
        assert!(cache.get_bytes("k").await.unwrap().is_none());
    }
}
