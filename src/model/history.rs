//! 审核/播放历史
//!
//! A history record is written exactly once, when a queue record reaches a
//! terminal state, and is never changed afterwards.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use crate::model::queue::{ContentType, GiftItem, GiftOrder, QueueRecord, QueueStatus, SocialType};
use crate::utils::clock;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Outcome {
    Approved,
    Rejected,
    Completed,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Approved => "approved",
            Outcome::Rejected => "rejected",
            Outcome::Completed => "completed",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialTag {
    #[serde(rename = "type")]
    pub kind: Option<SocialType>,
    pub name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryMetadata {
    #[serde(default)]
    pub table_number: i64,
    #[serde(default)]
    pub gift_items: Vec<GiftItem>,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub theme: String,
    #[serde(default)]
    pub social: SocialTag,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: String,
    pub transaction_id: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub sender: String,
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub amount: i64,
    pub outcome: Outcome,
    pub content: String,
    pub media_path: Option<String>,
    pub composed: bool,
    pub metadata: HistoryMetadata,
    pub received_at: Option<DateTime<Utc>>,
    pub decision_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_seconds: i64,
    pub decided_by: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 一次终态转换的描述
#[derive(Clone, Debug, PartialEq)]
pub struct Archival {
    pub outcome: Outcome,
    pub decided_at: DateTime<Utc>,
    pub decided_by: String,
    pub notes: Option<String>,
    /// 结束时间不晚于 playingAt + duration（强制结束、超时回收时使用）
    pub cap_at_expiry: bool,
    /// 只归档处于该状态的记录；None 表示任意未归档状态
    pub from_status: Option<QueueStatus>,
}

impl Archival {
    pub fn rejected(decided_at: DateTime<Utc>, decided_by: String, notes: Option<String>) -> Self {
        Self {
            outcome: Outcome::Rejected,
            decided_at,
            decided_by,
            notes,
            cap_at_expiry: false,
            from_status: None,
        }
    }

    pub fn completed(decided_at: DateTime<Utc>, decided_by: String) -> Self {
        Self {
            outcome: Outcome::Completed,
            decided_at,
            decided_by,
            notes: None,
            cap_at_expiry: false,
            from_status: Some(QueueStatus::Playing),
        }
    }

    /// 新记录抢占播放位时，旧的播放记录被强制结束
    pub fn forced(decided_at: DateTime<Utc>, replaced_by: &str) -> Self {
        Self {
            outcome: Outcome::Completed,
            decided_at,
            decided_by: "scheduler".to_string(),
            notes: Some(format!("force-completed, slot claimed by {replaced_by}")),
            cap_at_expiry: true,
            from_status: Some(QueueStatus::Playing),
        }
    }

    /// 显示端没有回调 complete，由服务端超时回收
    pub fn expired(decided_at: DateTime<Utc>) -> Self {
        Self {
            outcome: Outcome::Completed,
            decided_at,
            decided_by: "expiry-sweep".to_string(),
            notes: Some("display client never completed the item".to_string()),
            cap_at_expiry: true,
            from_status: Some(QueueStatus::Playing),
        }
    }
}

impl HistoryRecord {
    /// 队列记录的快照
    pub fn snapshot(record: &QueueRecord, archival: &Archival) -> Self {
        let (started_at, ended_at) = match archival.outcome {
            Outcome::Completed => {
                let ended = match (archival.cap_at_expiry, record.expires_at()) {
                    (true, Some(expiry)) => expiry.min(archival.decided_at),
                    _ => archival.decided_at,
                };
                (record.playing_at, Some(ended))
            }
            _ => (record.playing_at, None),
        };
        let gift = record.gift.clone().unwrap_or_default();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            transaction_id: record.id.clone(),
            content_type: record.content_type,
            sender: record.sender.clone(),
            user_id: record.user_id.clone(),
            email: record.email.clone(),
            avatar: record.avatar.clone(),
            amount: record.amount,
            outcome: archival.outcome,
            content: record.text.clone(),
            media_path: record.media_path.clone(),
            composed: record.composed,
            metadata: HistoryMetadata {
                table_number: gift.table_number,
                gift_items: gift.items,
                note: gift.note,
                theme: record.text_color.clone(),
                social: SocialTag {
                    kind: record.social_type,
                    name: record.social_name.clone(),
                },
            },
            received_at: Some(record.received_at),
            decision_at: archival.decided_at,
            started_at,
            ended_at,
            duration_seconds: record.duration_seconds,
            decided_by: Some(archival.decided_by.clone()),
            notes: archival.notes.clone(),
            created_at: archival.decided_at,
        }
    }

    /// 礼物记录永久保留，其它类型按保留期清理
    pub fn retained_indefinitely(&self) -> bool {
        self.content_type == ContentType::Gift
    }

    /// 重新入队：新的 id 和 receivedAt，状态回到 pending
    pub fn to_queue_record(&self, now: DateTime<Utc>) -> QueueRecord {
        let mut record = QueueRecord::pending(self.content_type, self.sender.clone(), now);
        record.user_id = self.user_id.clone();
        record.email = self.email.clone();
        record.avatar = self.avatar.clone();
        record.media_path = self.media_path.clone();
        record.text = self.content.clone();
        if !self.metadata.theme.is_empty() {
            record.text_color = self.metadata.theme.clone();
        }
        record.social_type = self.metadata.social.kind;
        record.social_name = self.metadata.social.name.clone();
        record.composed = self.composed;
        record.duration_seconds = self.duration_seconds.max(1);
        record.amount = self.amount;
        if self.content_type == ContentType::Gift {
            record.gift = Some(GiftOrder {
                table_number: self.metadata.table_number,
                items: self.metadata.gift_items.clone(),
                note: self.metadata.note.clone(),
            });
        }
        record
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct HistoryRow {
    pub id: String,
    pub transaction_id: String,
    pub content_type: ContentType,
    pub sender: String,
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub amount: i64,
    pub outcome: Outcome,
    pub content: String,
    pub media_path: Option<String>,
    pub composed: bool,
    pub metadata: Json<HistoryMetadata>,
    pub received_at: Option<i64>,
    pub decision_at: i64,
    pub started_at: Option<i64>,
    pub ended_at: Option<i64>,
    pub duration_seconds: i64,
    pub decided_by: Option<String>,
    pub notes: Option<String>,
    pub created_at: i64,
}

impl From<HistoryRow> for HistoryRecord {
    fn from(row: HistoryRow) -> Self {
        Self {
            id: row.id,
            transaction_id: row.transaction_id,
            content_type: row.content_type,
            sender: row.sender,
            user_id: row.user_id,
            email: row.email,
            avatar: row.avatar,
            amount: row.amount,
            outcome: row.outcome,
            content: row.content,
            media_path: row.media_path,
            composed: row.composed,
            metadata: row.metadata.0,
            received_at: clock::opt_from_millis(row.received_at),
            decision_at: clock::from_millis(row.decision_at),
            started_at: clock::opt_from_millis(row.started_at),
            ended_at: clock::opt_from_millis(row.ended_at),
            duration_seconds: row.duration_seconds,
            decided_by: row.decided_by,
            notes: row.notes,
            created_at: clock::from_millis(row.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn playing_gift(start: DateTime<Utc>) -> QueueRecord {
        let mut record = QueueRecord::pending(ContentType::Gift, "Ploy".into(), start);
        record.duration_seconds = 20;
        record.amount = 300;
        record.user_id = Some("u-9".into());
        record.gift = Some(GiftOrder {
            table_number: 7,
            items: vec![GiftItem { id: "g1".into(), name: "Rose".into(), quantity: 3, price: 100 }],
            note: "happy birthday".into(),
        });
        record.playing_at = Some(start);
        record
    }

    #[test]
    fn forced_completion_ends_at_recorded_expiry() {
        let start = Utc.with_ymd_and_hms(2025, 12, 14, 21, 0, 0).unwrap();
        let record = playing_gift(start);
        let late = start + Duration::seconds(300);

        let history = HistoryRecord::snapshot(&record, &Archival::forced(late, "next"));
        assert_eq!(history.outcome, Outcome::Completed);
        assert_eq!(history.started_at, Some(start));
        assert_eq!(history.ended_at, Some(start + Duration::seconds(20)));
        assert_eq!(history.decision_at, late);
        assert_eq!(history.transaction_id, record.id);
        assert_eq!(history.metadata.table_number, 7);
    }

    #[test]
    fn natural_completion_ends_now() {
        let start = Utc.with_ymd_and_hms(2025, 12, 14, 21, 0, 0).unwrap();
        let record = playing_gift(start);
        let early = start + Duration::seconds(5);

        let history = HistoryRecord::snapshot(&record, &Archival::completed(early, "display".into()));
        assert_eq!(history.ended_at, Some(early));
    }

    #[test]
    fn rejection_has_no_end_time() {
        let now = Utc::now();
        let record = QueueRecord::pending(ContentType::Text, "A".into(), now);
        let history =
            HistoryRecord::snapshot(&record, &Archival::rejected(now, "admin".into(), None));
        assert_eq!(history.outcome, Outcome::Rejected);
        assert_eq!(history.ended_at, None);
        assert!(!history.retained_indefinitely());
    }

    #[test]
    fn restore_copies_content_with_fresh_identity() {
        let start = Utc.with_ymd_and_hms(2025, 12, 14, 21, 0, 0).unwrap();
        let record = playing_gift(start);
        let history =
            HistoryRecord::snapshot(&record, &Archival::completed(start, "display".into()));
        let later = start + Duration::hours(1);

        let restored = history.to_queue_record(later);
        assert_ne!(restored.id, record.id);
        assert_eq!(restored.received_at, later);
        assert_eq!(restored.status, crate::model::queue::QueueStatus::Pending);
        assert_eq!(restored.gift, record.gift);
        assert_eq!(restored.user_id, record.user_id);
        assert_eq!(restored.amount, 300);
        assert_eq!(restored.playing_at, None);
    }
}
