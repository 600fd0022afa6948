//! 上传目录里的媒体文件
//!
//! Records only keep a path reference (`/uploads/<name>`, a bare file name or
//! a full URL ending in one). Every reference is resolved against the upload
//! root before touching the disk, so a record can never point outside it.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, SystemTime};

use thiserror::Error;

const UPLOADS_PREFIX: &str = "uploads/";

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media path `{0}` is outside the upload directory")]
    InvalidPath(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Clone, Debug)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 上传目录内的相对路径
    pub fn relative_name(media_path: &str) -> Result<String, MediaError> {
        let invalid = || MediaError::InvalidPath(media_path.to_string());
        let mut path = media_path.trim();
        if let Some((_, rest)) = path.split_once("://") {
            path = rest.find('/').map(|index| &rest[index..]).unwrap_or("");
        }
        let path = path.split(['?', '#']).next().unwrap_or("");
        let path = path.trim_start_matches('/');
        let path = path.strip_prefix(UPLOADS_PREFIX).unwrap_or(path);
        if path.is_empty() {
            return Err(invalid());
        }
        let relative = Path::new(path);
        if !relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
        {
            return Err(invalid());
        }
        Ok(path.to_string())
    }

    pub fn resolve(&self, media_path: &str) -> Result<PathBuf, MediaError> {
        Ok(self.root.join(Self::relative_name(media_path)?))
    }

    /// 删除文件；文件本来就不存在时返回 false
    pub async fn remove(&self, media_path: &str) -> Result<bool, MediaError> {
        let path = self.resolve(media_path)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// 删除失败只记日志，不影响调用方
    pub async fn remove_logged(&self, media_path: Option<&str>) {
        let Some(media_path) = media_path.filter(|path| !path.is_empty()) else {
            return;
        };
        match self.remove(media_path).await {
            Ok(true) => tracing::info!("media removed - path:{}", media_path),
            Ok(false) => tracing::debug!("media already gone - path:{}", media_path),
            Err(err) => tracing::warn!("media remove failed - path:{} | err:{}", media_path, err),
        }
    }

    /// 清理超过 max_age 且没有被任何记录引用的文件，返回删除数量
    pub async fn sweep_stale(
        &self,
        max_age: Duration,
        referenced: &HashSet<String>,
    ) -> Result<usize, MediaError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(err.into()),
        };
        let now = SystemTime::now();
        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if referenced.contains(&name) {
                continue;
            }
            let age = metadata
                .modified()
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .unwrap_or_default();
            if age < max_age {
                continue;
            }
            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(err) => tracing::warn!("media sweep remove failed - file:{} | err:{}", name, err),
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_resolve_inside_the_root() {
        let store = MediaStore::new("/srv/uploads");
        for reference in [
            "/uploads/a.jpg",
            "uploads/a.jpg",
            "a.jpg",
            "http://venue.local:5001/uploads/a.jpg?v=2",
        ] {
            assert_eq!(
                store.resolve(reference).unwrap(),
                PathBuf::from("/srv/uploads/a.jpg"),
                "{reference}"
            );
        }
        assert!(store.resolve("/uploads/../etc/passwd").is_err());
        assert!(store.resolve("").is_err());
    }

    #[tokio::test]
    async fn remove_tolerates_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path());
        std::fs::write(dir.path().join("b.png"), b"png").unwrap();

        assert!(store.remove("/uploads/b.png").await.unwrap());
        assert!(!store.remove("/uploads/b.png").await.unwrap());
        store.remove_logged(Some("/uploads/../x")).await;
    }

    #[tokio::test]
    async fn sweep_keeps_referenced_and_fresh_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path());
        std::fs::write(dir.path().join("kept.jpg"), b"1").unwrap();
        std::fs::write(dir.path().join("orphan.jpg"), b"2").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let referenced: HashSet<String> = ["kept.jpg".to_string()].into();
        // 刚写入的文件不够旧
        assert_eq!(store.sweep_stale(Duration::from_secs(3600), &referenced).await.unwrap(), 0);

        assert_eq!(store.sweep_stale(Duration::ZERO, &referenced).await.unwrap(), 1);
        assert!(dir.path().join("kept.jpg").exists());
        assert!(!dir.path().join("orphan.jpg").exists());
        assert!(dir.path().join("nested").exists());
    }
}
