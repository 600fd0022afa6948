use crate::error::api_error::ApiError;
use crate::error::db_error::DbError;
use crate::error::queue_error::QueueError;
use crate::model::history::HistoryRecord;
use crate::model::legacy::HistoryDocument;
use crate::model::queue::QueueRecord;
use crate::repository::history_repository::HistoryRepositoryTrait;
use crate::repository::queue_repository::QueueRepositoryTrait;
use crate::service::media_service::MediaService;
use crate::service::status_service::StatusService;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("read history file failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("history file is not a JSON array: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImportReport {
    pub imported: usize,
    pub duplicates: usize,
    pub skipped: usize,
}

pub struct HistoryService {
    history_repo: Arc<dyn HistoryRepositoryTrait>,
    queue_repo: Arc<dyn QueueRepositoryTrait>,
    media_service: Arc<MediaService>,
    status_service: Arc<StatusService>,
    retention: Duration,
}

impl HistoryService {
    pub fn new(
        history_repo: Arc<dyn HistoryRepositoryTrait>,
        queue_repo: Arc<dyn QueueRepositoryTrait>,
        media_service: &Arc<MediaService>,
        status_service: &Arc<StatusService>,
        retention_secs: i64,
    ) -> Self {
        Self {
            history_repo,
            queue_repo,
            media_service: Arc::clone(media_service),
            status_service: Arc::clone(status_service),
            retention: Duration::seconds(retention_secs),
        }
    }

    pub async fn list(&self) -> Result<Vec<HistoryRecord>, ApiError> {
        Ok(self
            .history_repo
            .list()
            .await
            .map_err(|err| DbError::log("history list", err))?)
    }

    pub async fn delete(&self, id: &str) -> Result<HistoryRecord, ApiError> {
        let removed = self
            .history_repo
            .delete(id)
            .await
            .map_err(|err| DbError::log("history delete", err))?
            .ok_or_else(|| QueueError::HistoryNotFound(id.to_string()))?;
        self.media_service
            .release(removed.media_path.as_deref(), 0)
            .await;
        Ok(removed)
    }

    pub async fn delete_all(&self) -> Result<usize, ApiError> {
        let removed = self
            .history_repo
            .delete_all()
            .await
            .map_err(|err| DbError::log("history delete_all", err))?;
        self.release_all(&removed).await;
        tracing::info!("history cleared - deleted:{}", removed.len());
        Ok(removed.len())
    }

    /// 用历史快照生成新的 pending 记录，重新进入审核
    pub async fn restore(&self, id: &str, now: DateTime<Utc>) -> Result<QueueRecord, ApiError> {
        let history = self
            .history_repo
            .find(id)
            .await
            .map_err(|err| DbError::log("history restore find", err))?
            .ok_or_else(|| QueueError::HistoryNotFound(id.to_string()))?;
        // 副本和历史共用一个文件，插入期间不能有人按旧计数删除它
        let refs = self.media_service.lock_references().await;
        let record = self
            .queue_repo
            .insert(&history.to_queue_record(now))
            .await
            .map_err(|err| DbError::log("history restore insert", err))?;
        drop(refs);
        tracing::info!("history restored - history_id:{} | new_id:{}", id, record.id);
        self.status_service.publish().await;
        Ok(record)
    }

    /// 删除超过保留期的非礼物记录
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, ApiError> {
        let removed = self
            .history_repo
            .purge_expired(now - self.retention)
            .await
            .map_err(|err| DbError::log("history purge", err))?;
        if !removed.is_empty() {
            tracing::info!("history retention purge - deleted:{}", removed.len());
            self.release_all(&removed).await;
        }
        Ok(removed.len())
    }

    /// 导入旧版导出的历史记录，transactionId 已存在的跳过
    pub async fn import_legacy(&self, path: &Path, now: DateTime<Utc>) -> Result<ImportReport, ImportError> {
        let raw = tokio::fs::read_to_string(path).await?;
        let documents: Vec<Value> = serde_json::from_str(&raw)?;

        let mut report = ImportReport::default();
        for (index, document) in documents.into_iter().enumerate() {
            let record = serde_json::from_value::<HistoryDocument>(document)
                .map_err(|err| err.to_string())
                .and_then(|doc| doc.into_record(now).map_err(|err| err.to_string()));
            let record = match record {
                Ok(record) => record,
                Err(err) => {
                    tracing::warn!("legacy import skipped - index:{} | err:{}", index, err);
                    report.skipped += 1;
                    continue;
                }
            };
            let inserted = self
                .history_repo
                .insert_if_absent(&record)
                .await
                .map_err(|err| ApiError::from(DbError::log("legacy import", err)))?;
            if inserted {
                report.imported += 1;
            } else {
                report.duplicates += 1;
            }
        }
        tracing::info!(
            "legacy import done - file:{} | imported:{} | duplicates:{} | skipped:{}",
            path.display(),
            report.imported,
            report.duplicates,
            report.skipped
        );
        Ok(report)
    }

    async fn release_all(&self, removed: &[HistoryRecord]) {
        for record in removed {
            self.media_service
                .release(record.media_path.as_deref(), 0)
                .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::history::{Archival, Outcome};
    use crate::model::queue::{ContentType, QueueStatus};
    use crate::service::test_support;

    #[tokio::test]
    async fn restore_creates_a_fresh_pending_copy() {
        let ctx = test_support::context().await;
        let original = ctx.pending_image("again.jpg").await;
        ctx.services
            .moderation
            .approve(&original.id, Default::default(), Utc::now())
            .await
            .unwrap();
        ctx.services.playback.mark_playing(&original.id, Utc::now()).await.unwrap();
        let archived = ctx
            .services
            .playback
            .complete(&original.id, None, Utc::now())
            .await
            .unwrap();

        let restored = ctx
            .services
            .history
            .restore(&archived.id, Utc::now())
            .await
            .unwrap();
        assert_ne!(restored.id, original.id);

        let queue = ctx.services.queue_repo.list().await.unwrap();
        assert_eq!(queue.len(), 1);
        let copy = &queue[0];
        assert_eq!(copy.id, restored.id);
        assert_eq!(copy.status, QueueStatus::Pending);
        assert_eq!(copy.sender, original.sender);
        assert_eq!(copy.media_path, original.media_path);
        assert_eq!(copy.text, original.text);
        assert_eq!(copy.duration_seconds, original.duration_seconds);

        let missing = ctx.services.history.restore("nope", Utc::now()).await;
        assert!(matches!(
            missing,
            Err(ApiError::QueueError(QueueError::HistoryNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn deleting_history_keeps_media_of_restored_copies() {
        let ctx = test_support::context().await;
        let original = ctx.approved_image("shared.jpg").await;
        ctx.services.playback.mark_playing(&original.id, Utc::now()).await.unwrap();
        let archived = ctx
            .services
            .playback
            .complete(&original.id, None, Utc::now())
            .await
            .unwrap();
        ctx.services.history.restore(&archived.id, Utc::now()).await.unwrap();

        ctx.services.history.delete(&archived.id).await.unwrap();
        assert!(ctx.upload_dir().join("shared.jpg").exists());

        let again = ctx.services.history.delete(&archived.id).await;
        assert!(matches!(
            again,
            Err(ApiError::QueueError(QueueError::HistoryNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn retention_purge_removes_old_media_but_keeps_gifts() {
        let ctx = test_support::context().await;
        let old = Utc::now() - Duration::days(3);
        let image = ctx.pending_image("old.jpg").await;
        ctx.services
            .queue_repo
            .archive(&image.id, &Archival::rejected(old, "admin".into(), None))
            .await
            .unwrap();
        let gift = ctx.pending_gift(5).await;
        ctx.services
            .queue_repo
            .archive(&gift.id, &Archival::rejected(old, "admin".into(), None))
            .await
            .unwrap();

        assert_eq!(ctx.services.history.purge_expired(Utc::now()).await.unwrap(), 1);
        assert!(!ctx.upload_dir().join("old.jpg").exists());
        let left = ctx.services.history.list().await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].content_type, ContentType::Gift);
    }

    #[tokio::test]
    async fn legacy_export_is_imported_once() {
        let ctx = test_support::context().await;
        let file = ctx.upload_dir().join("legacy.json");
        std::fs::write(
            &file,
            serde_json::json!([
                { "giftId": "g-1", "giftName": "Cake", "senderName": "Nan", "amount": 120,
                  "status": "verified", "tableNumber": 2, "type": "gift" },
                { "transactionId": "t-2", "type": "text", "sender": "Mai", "status": "rejected",
                  "content": "hi", "rejectReason": "spam" },
                { "transactionId": "t-3", "status": "pending" },
                "not an object"
            ])
            .to_string(),
        )
        .unwrap();

        let report = ctx.services.history.import_legacy(&file, Utc::now()).await.unwrap();
        assert_eq!(report, ImportReport { imported: 2, duplicates: 0, skipped: 2 });
        let again = ctx.services.history.import_legacy(&file, Utc::now()).await.unwrap();
        assert_eq!(again, ImportReport { imported: 0, duplicates: 2, skipped: 2 });

        let list = ctx.services.history.list().await.unwrap();
        let gift = list.iter().find(|h| h.transaction_id == "g-1").unwrap();
        assert_eq!(gift.outcome, Outcome::Approved);
        assert_eq!(gift.metadata.table_number, 2);
        assert_eq!(gift.amount, 120);
    }
}
