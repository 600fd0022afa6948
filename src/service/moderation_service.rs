use crate::error::api_error::ApiError;
use crate::error::db_error::DbError;
use crate::error::queue_error::QueueError;
use crate::model::history::{Archival, HistoryRecord};
use crate::model::queue::{Dimensions, QueueRecord};
use crate::repository::queue_repository::QueueRepositoryTrait;
use crate::service::media_service::MediaService;
use crate::service::status_service::StatusService;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub const DEFAULT_MODERATOR: &str = "admin";

pub struct ModerationService {
    queue_repo: Arc<dyn QueueRepositoryTrait>,
    media_service: Arc<MediaService>,
    status_service: Arc<StatusService>,
}

impl ModerationService {
    pub fn new(
        queue_repo: Arc<dyn QueueRepositoryTrait>,
        media_service: &Arc<MediaService>,
        status_service: &Arc<StatusService>,
    ) -> Self {
        Self {
            queue_repo,
            media_service: Arc::clone(media_service),
            status_service: Arc::clone(status_service),
        }
    }

    /// pending -> approved；已经审核过的记录原样返回
    pub async fn approve(
        &self,
        id: &str,
        dims: Dimensions,
        now: DateTime<Utc>,
    ) -> Result<QueueRecord, ApiError> {
        let approved = self
            .queue_repo
            .approve(id, dims, now)
            .await
            .map_err(|err| DbError::log("approve", err))?;
        if let Some(record) = approved {
            tracing::info!("approved - id:{} | type:{}", record.id, record.content_type);
            self.status_service.publish().await;
            return Ok(record);
        }

        match self
            .queue_repo
            .find(id)
            .await
            .map_err(|err| DbError::log("approve find", err))?
        {
            Some(record) => {
                tracing::debug!("approve no-op - id:{} | status:{}", id, record.status);
                Ok(record)
            }
            None => Err(QueueError::NotFound(id.to_string()))?,
        }
    }

    /// 归档为 rejected，提交成功后再删除媒体文件
    pub async fn reject(
        &self,
        id: &str,
        decided_by: Option<String>,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<HistoryRecord, ApiError> {
        let decided_by = decided_by
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODERATOR.to_string());
        let archival = Archival::rejected(now, decided_by, reason);
        let history = self
            .queue_repo
            .archive(id, &archival)
            .await
            .map_err(|err| DbError::log("reject", err))?
            .ok_or_else(|| QueueError::NotFound(id.to_string()))?;

        self.media_service
            .release(history.media_path.as_deref(), 1)
            .await;
        self.status_service.publish().await;
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::history::Outcome;
    use crate::model::queue::{ContentType, QueueStatus};
    use crate::service::test_support;

    #[tokio::test]
    async fn reject_archives_and_removes_media() {
        let ctx = test_support::context().await;
        let record = ctx.pending_image("reject-me.jpg").await;

        let history = ctx
            .services
            .moderation
            .reject(&record.id, None, Some("blurry".into()), Utc::now())
            .await
            .unwrap();
        assert_eq!(history.outcome, Outcome::Rejected);
        assert_eq!(history.decided_by.as_deref(), Some(DEFAULT_MODERATOR));
        assert!(ctx.services.queue_repo.list().await.unwrap().is_empty());

        let archived = ctx.services.history.list().await.unwrap();
        assert_eq!(archived.len(), 1);
        assert_eq!(archived[0].transaction_id, record.id);
        assert_eq!(archived[0].notes.as_deref(), Some("blurry"));
        assert!(!ctx.upload_dir().join("reject-me.jpg").exists());

        let again = ctx.services.moderation.reject(&record.id, None, None, Utc::now()).await;
        assert!(matches!(again, Err(ApiError::QueueError(QueueError::NotFound(_)))));
        assert_eq!(ctx.services.history.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn approve_is_idempotent_and_keeps_first_stamp() {
        let ctx = test_support::context().await;
        let record = ctx.pending_image("ok.jpg").await;
        let first = Utc::now();

        let approved = ctx
            .services
            .moderation
            .approve(&record.id, Dimensions { width: Some(1080), height: Some(1920) }, first)
            .await
            .unwrap();
        assert_eq!(approved.status, QueueStatus::Approved);
        assert_eq!(approved.width, Some(1080));
        assert_eq!(approved.content_type, ContentType::Image);

        let later = first + chrono::Duration::seconds(60);
        let again = ctx
            .services
            .moderation
            .approve(&record.id, Dimensions::default(), later)
            .await
            .unwrap();
        assert_eq!(again.approved_at, approved.approved_at);

        let missing = ctx
            .services
            .moderation
            .approve("nope", Dimensions::default(), later)
            .await;
        assert!(matches!(missing, Err(ApiError::QueueError(QueueError::NotFound(_)))));
    }

    #[tokio::test]
    async fn racing_approve_and_reject_archive_once() {
        let ctx = test_support::context().await;
        let record = ctx.pending_image("race.jpg").await;
        let moderation = &ctx.services.moderation;

        let now = Utc::now();
        let (approved, rejected) = tokio::join!(
            moderation.approve(&record.id, Dimensions::default(), now),
            moderation.reject(&record.id, None, None, now)
        );

        // 驳回对 pending 和 approved 都有效；先驳回时审核拿到 NotFound
        let history = rejected.unwrap();
        assert_eq!(history.outcome, Outcome::Rejected);
        match approved {
            Ok(record) => assert_eq!(record.status, QueueStatus::Approved),
            Err(err) => assert!(matches!(err, ApiError::QueueError(QueueError::NotFound(_)))),
        }
        assert_eq!(ctx.services.history.list().await.unwrap().len(), 1);
        assert!(ctx.services.queue_repo.list().await.unwrap().is_empty());
    }
}
