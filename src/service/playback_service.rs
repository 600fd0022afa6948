//! 播放位调度
//!
//! The display has exactly one slot. Every transition into `playing` runs
//! under `slot`, and the store update itself only succeeds when no other
//! record is playing, so two concurrent `mark_playing` calls cannot both win.

use crate::dto::order_status_dto::OrderStatus;
use crate::dto::realtime_dto::{NowPlaying, ServerEvent};
use crate::error::api_error::ApiError;
use crate::error::db_error::DbError;
use crate::error::queue_error::QueueError;
use crate::model::history::{Archival, HistoryRecord};
use crate::model::queue::{QueueRecord, QueueStatus};
use crate::realtime::hub::RealtimeHub;
use crate::repository::history_repository::HistoryRepositoryTrait;
use crate::repository::queue_repository::QueueRepositoryTrait;
use crate::service::estimator;
use crate::service::status_service::StatusService;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;

pub const DISPLAY_CLIENT: &str = "display";

pub struct PlaybackService {
    queue_repo: Arc<dyn QueueRepositoryTrait>,
    history_repo: Arc<dyn HistoryRepositoryTrait>,
    status_service: Arc<StatusService>,
    hub: RealtimeHub,
    slot: Mutex<()>,
}

impl PlaybackService {
    pub fn new(
        queue_repo: Arc<dyn QueueRepositoryTrait>,
        history_repo: Arc<dyn HistoryRepositoryTrait>,
        status_service: &Arc<StatusService>,
        hub: &RealtimeHub,
    ) -> Self {
        Self {
            queue_repo,
            history_repo,
            status_service: Arc::clone(status_service),
            hub: hub.clone(),
            slot: Mutex::new(()),
        }
    }

    /// approved -> playing，先强制结束占着播放位的记录
    pub async fn mark_playing(&self, id: &str, now: DateTime<Utc>) -> Result<QueueRecord, ApiError> {
        let _slot = self.slot.lock().await;

        let target = self
            .queue_repo
            .find(id)
            .await
            .map_err(|err| DbError::log("mark_playing find", err))?
            .ok_or_else(|| QueueError::NotFound(id.to_string()))?;
        let status = target.status;
        match status {
            QueueStatus::Playing => {
                // 显示端重连后重试，照样下发渲染事件
                tracing::debug!("mark_playing no-op - id:{} already playing", id);
                self.hub.publish(ServerEvent::NowPlaying(NowPlaying::from(&target)));
                return Ok(target);
            }
            QueueStatus::Pending => Err(QueueError::InvalidTransition {
                id: id.to_string(),
                status,
                expected: QueueStatus::Approved,
            })?,
            QueueStatus::Approved => {}
        }

        let playing = self
            .queue_repo
            .find_playing()
            .await
            .map_err(|err| DbError::log("mark_playing find_playing", err))?;
        for stuck in playing.iter().filter(|record| record.id != id) {
            self.force_complete(stuck, id, now).await;
        }

        let claimed = self
            .queue_repo
            .claim_slot(id, now)
            .await
            .map_err(|err| DbError::log("mark_playing claim_slot", err))?;
        match claimed {
            Some(record) => {
                tracing::info!(
                    "now playing - id:{} | type:{} | duration:{}",
                    record.id,
                    record.content_type,
                    record.duration_seconds
                );
                self.hub.publish(ServerEvent::NowPlaying(NowPlaying::from(&record)));
                self.status_service.publish().await;
                Ok(record)
            }
            None => Err(self.claim_refused(id).await?)?,
        }
    }

    /// 显示端播放结束，只接受 playing 的记录；重复调用返回 NotFound
    pub async fn complete(
        &self,
        id: &str,
        decided_by: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<HistoryRecord, ApiError> {
        let decided_by = decided_by
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DISPLAY_CLIENT.to_string());
        let archived = self
            .queue_repo
            .archive(id, &Archival::completed(now, decided_by))
            .await
            .map_err(|err| DbError::log("complete", err))?;
        let Some(history) = archived else {
            let current = self
                .queue_repo
                .find(id)
                .await
                .map_err(|err| DbError::log("complete find", err))?;
            let err = match current {
                Some(record) => QueueError::InvalidTransition {
                    id: id.to_string(),
                    status: record.status,
                    expected: QueueStatus::Playing,
                },
                None => QueueError::NotFound(id.to_string()),
            };
            return Err(err.into());
        };
        self.status_service.publish().await;
        Ok(history)
    }

    pub async fn order_status(&self, id: &str, now: DateTime<Utc>) -> Result<OrderStatus, ApiError> {
        let queue = self
            .queue_repo
            .list()
            .await
            .map_err(|err| DbError::log("order_status list", err))?;
        if let Some(status) = estimator::estimate(&queue, id, now) {
            return Ok(status);
        }
        let archived = self
            .history_repo
            .find_by_transaction(id)
            .await
            .map_err(|err| DbError::log("order_status history", err))?;
        Ok(match archived {
            Some(history) => OrderStatus::Archived {
                outcome: history.outcome,
                decision_at: history.decision_at,
            },
            None => OrderStatus::NotFound,
        })
    }

    /// 显示端没有回调 complete 时，超过 playingAt + duration + grace 由服务端结束
    pub async fn expire_overdue(&self, now: DateTime<Utc>, grace_secs: i64) -> Result<usize, ApiError> {
        let _slot = self.slot.lock().await;
        let playing = self
            .queue_repo
            .find_playing()
            .await
            .map_err(|err| DbError::log("expire_overdue find_playing", err))?;

        let mut expired = 0;
        for record in playing {
            let Some(expires_at) = record.expires_at() else {
                continue;
            };
            if expires_at + Duration::seconds(grace_secs) > now {
                continue;
            }
            match self.queue_repo.archive(&record.id, &Archival::expired(now)).await {
                Ok(Some(_)) => {
                    tracing::warn!(
                        "expired playing record - id:{} | playing_at:{:?} | duration:{}",
                        record.id,
                        record.playing_at,
                        record.duration_seconds
                    );
                    expired += 1;
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::error!("expire_overdue archive - id:{} | err:{}", record.id, err)
                }
            }
        }
        if expired > 0 {
            self.status_service.publish().await;
        }
        Ok(expired)
    }

    // 单条记录失败不影响新记录抢占播放位
    async fn force_complete(&self, stuck: &QueueRecord, replaced_by: &str, now: DateTime<Utc>) {
        match self
            .queue_repo
            .archive(&stuck.id, &Archival::forced(now, replaced_by))
            .await
        {
            Ok(Some(history)) => tracing::info!(
                "force-completed - id:{} | ended_at:{:?}",
                stuck.id,
                history.ended_at
            ),
            Ok(None) => tracing::debug!("force-complete skipped - id:{} already archived", stuck.id),
            Err(err) => {
                tracing::error!("force-complete archive failed - id:{} | err:{}", stuck.id, err);
                self.force_evict(stuck, replaced_by, now).await;
            }
        }
    }

    // 事务归档失败时分两步：先写历史，确认历史存在后再移出队列
    async fn force_evict(&self, stuck: &QueueRecord, replaced_by: &str, now: DateTime<Utc>) {
        let history = HistoryRecord::snapshot(stuck, &Archival::forced(now, replaced_by));
        match self.history_repo.insert_if_absent(&history).await {
            Ok(true) => {}
            Ok(false) => tracing::debug!("force-complete history exists - id:{}", stuck.id),
            Err(err) => {
                tracing::error!("force-complete history failed - id:{} | err:{}", stuck.id, err);
                return;
            }
        }
        match self.queue_repo.evict(&stuck.id).await {
            Ok(_) => tracing::warn!("force-complete evicted after history write - id:{}", stuck.id),
            Err(err) => {
                tracing::error!("force-complete evict failed - id:{} | err:{}", stuck.id, err)
            }
        }
    }

    async fn claim_refused(&self, id: &str) -> Result<QueueError, ApiError> {
        let playing = self
            .queue_repo
            .find_playing()
            .await
            .map_err(|err| DbError::log("claim_refused find_playing", err))?;
        if let Some(holder) = playing.into_iter().find(|record| record.id != id) {
            return Ok(QueueError::SlotBusy(holder.id));
        }
        let current = self
            .queue_repo
            .find(id)
            .await
            .map_err(|err| DbError::log("claim_refused find", err))?;
        Ok(match current {
            Some(record) => QueueError::InvalidTransition {
                id: id.to_string(),
                status: record.status,
                expected: QueueStatus::Approved,
            },
            None => QueueError::NotFound(id.to_string()),
        })
    }
}
