//! JSON Page Cache - 文件系统上的页面缓存
//!
//! 实现 PageCachePort trait。每个条目一个 JSON 文件：
//! `<dir>/<category>/<sanitized-key>.json`，
//! 内容是取得时刻 + 原始值的信封

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::application::ports::{CacheEnvelope, CacheError, PageCachePort};

/// 键中的路径分隔符替换为下划线
fn sanitize_key(key: &str) -> String {
    key.replace(['/', '\\'], "_")
}

/// JSON 文件页面缓存
pub struct JsonPageCache {
    /// 缓存根目录
    base_dir: PathBuf,
}

impl JsonPageCache {
    /// 创建缓存（确保根目录存在）
    pub async fn new(base_dir: impl AsRef<Path>) -> Result<Self, CacheError> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)
            .await
            .map_err(|e| CacheError::IoError(e.to_string()))?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn entry_path(&self, category: &str, key: &str) -> PathBuf {
        self.base_dir
            .join(category)
            .join(format!("{}.json", sanitize_key(key)))
    }
}

#[async_trait]
impl PageCachePort for JsonPageCache {
    async fn get(&self, category: &str, key: &str) -> Result<Option<CacheEnvelope>, CacheError> {
        let path = self.entry_path(category, key);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::IoError(e.to_string())),
        };

        let envelope: CacheEnvelope = serde_json::from_slice(&bytes)
            .map_err(|e| CacheError::SerializationError(e.to_string()))?;

        tracing::debug!(category, key, "Page cache hit");
        Ok(Some(envelope))
    }

    async fn put(
        &self,
        category: &str,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<(), CacheError> {
        let path = self.entry_path(category, key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| CacheError::IoError(e.to_string()))?;
        }

        let envelope = CacheEnvelope::new(value.clone());
        let bytes = serde_json::to_vec_pretty(&envelope)
            .map_err(|e| CacheError::SerializationError(e.to_string()))?;

        fs::write(&path, bytes)
            .await
            .map_err(|e| CacheError::IoError(e.to_string()))?;
        Ok(())
    }

    async fn clear(&self, ncode: Option<&str>) -> Result<u64, CacheError> {
        if !self.base_dir.exists() {
            return Ok(0);
        }

        // 全消去はツリーごと
        let Some(ncode) = ncode else {
            let removed = count_entries(&self.base_dir).await?;
            fs::remove_dir_all(&self.base_dir)
                .await
                .map_err(|e| CacheError::IoError(e.to_string()))?;
            return Ok(removed);
        };

        // 作品指定はキー前缀一致で各カテゴリから削除
        let prefix = sanitize_key(ncode);
        let mut removed = 0u64;
        let mut categories = fs::read_dir(&self.base_dir)
            .await
            .map_err(|e| CacheError::IoError(e.to_string()))?;

        while let Some(category) = categories
            .next_entry()
            .await
            .map_err(|e| CacheError::IoError(e.to_string()))?
        {
            if !category.path().is_dir() {
                continue;
            }
            let mut entries = fs::read_dir(category.path())
                .await
                .map_err(|e| CacheError::IoError(e.to_string()))?;
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| CacheError::IoError(e.to_string()))?
            {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                if name.starts_with(prefix.as_str()) {
                    fs::remove_file(entry.path())
                        .await
                        .map_err(|e| CacheError::IoError(e.to_string()))?;
                    removed += 1;
                }
            }
        }

        Ok(removed)
    }
}

/// ツリー内の JSON エントリ数
async fn count_entries(base_dir: &Path) -> Result<u64, CacheError> {
    let mut count = 0u64;
    let mut categories = fs::read_dir(base_dir)
        .await
        .map_err(|e| CacheError::IoError(e.to_string()))?;
    while let Some(category) = categories
        .next_entry()
        .await
        .map_err(|e| CacheError::IoError(e.to_string()))?
    {
        if !category.path().is_dir() {
            continue;
        }
        let mut entries = fs::read_dir(category.path())
            .await
            .map_err(|e| CacheError::IoError(e.to_string()))?;
        while let Some(_entry) = entries
            .next_entry()
            .await
            .map_err(|e| CacheError::IoError(e.to_string()))?
        {
            count += 1;
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_roundtrip() {
        let dir = tempdir().unwrap();
        let cache = JsonPageCache::new(dir.path().join("cache")).await.unwrap();

        assert!(cache.get("metadata", "n1234ab").await.unwrap().is_none());

        let value = json!({"title": "テスト"});
        cache.put("metadata", "n1234ab", &value).await.unwrap();

        let envelope = cache.get("metadata", "n1234ab").await.unwrap().unwrap();
        assert_eq!(envelope.value, value);
    }

    #[tokio::test]
    async fn test_key_sanitization() {
        let dir = tempdir().unwrap();
        let cache = JsonPageCache::new(dir.path().join("cache")).await.unwrap();

        cache
            .put("episode", "n1234ab/1", &json!("body"))
            .await
            .unwrap();

        // パス区切りは下線に置換されてファイル名になる
        assert!(dir
            .path()
            .join("cache/episode/n1234ab_1.json")
            .exists());
        assert!(cache.get("episode", "n1234ab/1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_clear_single_work_keeps_others() {
        let dir = tempdir().unwrap();
        let cache = JsonPageCache::new(dir.path().join("cache")).await.unwrap();

        cache.put("metadata", "n1111aa", &json!(1)).await.unwrap();
        cache.put("episode", "n1111aa_1", &json!(1)).await.unwrap();
        cache.put("episode", "n1111aa_2", &json!(2)).await.unwrap();
        cache.put("metadata", "n2222bb", &json!(3)).await.unwrap();

        let removed = cache.clear(Some("n1111aa")).await.unwrap();
        assert_eq!(removed, 3);

        assert!(cache.get("metadata", "n1111aa").await.unwrap().is_none());
        assert!(cache.get("episode", "n1111aa_1").await.unwrap().is_none());
        assert!(cache.get("metadata", "n2222bb").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_clear_all() {
        let dir = tempdir().unwrap();
        let cache = JsonPageCache::new(dir.path().join("cache")).await.unwrap();

        cache.put("metadata", "n1111aa", &json!(1)).await.unwrap();
        cache.put("toc", "n1111aa", &json!(2)).await.unwrap();

        let removed = cache.clear(None).await.unwrap();
        assert_eq!(removed, 2);
        assert!(cache.get("metadata", "n1111aa").await.unwrap().is_none());
    }
}
