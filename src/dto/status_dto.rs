use serde::Serialize;

use crate::config::display_config::DisplayConfig;
use crate::model::queue::{QueueRecord, QueueStatus};

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueCounts {
    pub pending: usize,
    pub approved: usize,
    /// 正在播放的记录 id
    pub playing: Option<String>,
}

impl QueueCounts {
    pub fn of(records: &[QueueRecord]) -> Self {
        let count = |status: QueueStatus| records.iter().filter(|r| r.status == status).count();
        Self {
            pending: count(QueueStatus::Pending),
            approved: count(QueueStatus::Approved),
            playing: records
                .iter()
                .find(|r| r.status == QueueStatus::Playing)
                .map(|r| r.id.clone()),
        }
    }
}

/// 配置与队列概况，`status` 事件和 `/api/status` 共用
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub config: DisplayConfig,
    pub queue: QueueCounts,
}
