use crate::dto::realtime_dto::ServerEvent;
use crate::dto::status_dto::{QueueCounts, StatusSnapshot};
use crate::error::api_error::ApiError;
use crate::error::db_error::DbError;
use crate::model::queue::QueueRecord;
use crate::realtime::hub::RealtimeHub;
use crate::repository::queue_repository::QueueRepositoryTrait;
use crate::service::config_service::ConfigService;
use std::sync::Arc;

pub struct StatusService {
    queue_repo: Arc<dyn QueueRepositoryTrait>,
    config_service: Arc<ConfigService>,
    hub: RealtimeHub,
}

impl StatusService {
    pub fn new(
        queue_repo: Arc<dyn QueueRepositoryTrait>,
        config_service: &Arc<ConfigService>,
        hub: &RealtimeHub,
    ) -> Self {
        Self {
            queue_repo,
            config_service: Arc::clone(config_service),
            hub: hub.clone(),
        }
    }

    /// 未归档的记录，按提交顺序
    pub async fn queue(&self) -> Result<Vec<QueueRecord>, ApiError> {
        Ok(self
            .queue_repo
            .list()
            .await
            .map_err(|err| DbError::log("queue list", err))?)
    }

    pub async fn snapshot(&self) -> Result<StatusSnapshot, ApiError> {
        let records = self.queue().await?;
        Ok(StatusSnapshot {
            config: self.config_service.current().await,
            queue: QueueCounts::of(&records),
        })
    }

    /// 队列或配置变化后广播最新状态，失败只记日志
    pub async fn publish(&self) {
        match self.snapshot().await {
            Ok(snapshot) => self.hub.publish(ServerEvent::Status(snapshot)),
            Err(err) => tracing::warn!("status publish skipped - err:{}", err),
        }
    }
}
