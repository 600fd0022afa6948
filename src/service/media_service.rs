use crate::error::api_error::ApiError;
use crate::error::db_error::DbError;
use crate::repository::history_repository::HistoryRepositoryTrait;
use crate::repository::queue_repository::QueueRepositoryTrait;
use crate::utils::media::{MediaError, MediaStore};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};

/// 媒体文件跟随记录的生命周期
///
/// Counting references and deleting the file happen under `refs`. Anything
/// that adds a new reference to an existing file (restore) takes the same
/// lock, so a file is never removed between a count and a new insert.
pub struct MediaService {
    store: MediaStore,
    queue_repo: Arc<dyn QueueRepositoryTrait>,
    history_repo: Arc<dyn HistoryRepositoryTrait>,
    refs: Mutex<()>,
}

impl MediaService {
    pub fn new(
        store: MediaStore,
        queue_repo: Arc<dyn QueueRepositoryTrait>,
        history_repo: Arc<dyn HistoryRepositoryTrait>,
    ) -> Self {
        Self {
            store,
            queue_repo,
            history_repo,
            refs: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &MediaStore {
        &self.store
    }

    /// 新增文件引用前先拿这把锁
    pub async fn lock_references(&self) -> MutexGuard<'_, ()> {
        self.refs.lock().await
    }

    /// 删除记录的媒体文件。`own_references` 是调用方自己仍持有的引用数，
    /// 超出这个数说明还有别的记录（例如恢复出的副本）在用，文件保留
    pub async fn release(&self, media_path: Option<&str>, own_references: usize) {
        let Some(media_path) = media_path.filter(|path| !path.is_empty()) else {
            return;
        };
        let Ok(name) = MediaStore::relative_name(media_path) else {
            tracing::warn!("media release skipped - invalid path:{}", media_path);
            return;
        };
        let _refs = self.refs.lock().await;
        match self.references().await {
            Ok(references) => {
                let in_use = references.iter().filter(|other| **other == name).count();
                if in_use > own_references {
                    tracing::info!("media still referenced - path:{} | refs:{}", media_path, in_use);
                    return;
                }
            }
            Err(err) => {
                tracing::warn!("media release skipped - path:{} | err:{}", media_path, err);
                return;
            }
        }
        self.store.remove_logged(Some(media_path)).await;
    }

    /// 清理没人引用的旧文件
    pub async fn sweep_stale(&self, max_age: Duration) -> Result<usize, MediaError> {
        let _refs = self.refs.lock().await;
        let referenced: HashSet<String> = match self.references().await {
            Ok(references) => references.into_iter().collect(),
            Err(err) => {
                // 拿不到引用时不能删除任何文件
                tracing::warn!("media sweep skipped - err:{}", err);
                return Ok(0);
            }
        };
        self.store.sweep_stale(max_age, &referenced).await
    }

    async fn references(&self) -> Result<Vec<String>, ApiError> {
        let mut paths = self
            .queue_repo
            .media_references()
            .await
            .map_err(|err| DbError::log("queue media references", err))?;
        paths.extend(
            self.history_repo
                .media_references()
                .await
                .map_err(|err| DbError::log("history media references", err))?,
        );
        Ok(paths
            .iter()
            .filter_map(|path| MediaStore::relative_name(path).ok())
            .collect())
    }
}
