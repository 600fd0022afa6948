//! 展示队列的数据模型
//!
//! A queue record lives here from intake until it is archived. Status only
//! moves forward: pending -> approved -> playing.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use crate::utils::clock;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ContentType {
    Image,
    Text,
    Gift,
    Birthday,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Image => "image",
            ContentType::Text => "text",
            ContentType::Gift => "gift",
            ContentType::Birthday => "birthday",
        }
    }

    /// 图片和生日祝福必须带媒体文件
    pub fn requires_media(&self) -> bool {
        matches!(self, ContentType::Image | ContentType::Birthday)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum QueueStatus {
    Pending,
    Approved,
    Playing,
}

impl QueueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Pending => "pending",
            QueueStatus::Approved => "approved",
            QueueStatus::Playing => "playing",
        }
    }

    /// 状态只能前进一步，不能回退
    pub fn can_advance_to(&self, next: QueueStatus) -> bool {
        matches!(
            (self, next),
            (QueueStatus::Pending, QueueStatus::Approved)
                | (QueueStatus::Approved, QueueStatus::Playing)
        )
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum SocialType {
    Ig,
    Fb,
    Line,
    Tiktok,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftItem {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub quantity: i64,
    pub price: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftOrder {
    pub table_number: i64,
    pub items: Vec<GiftItem>,
    #[serde(default)]
    pub note: String,
}

impl GiftOrder {
    pub fn total_price(&self) -> i64 {
        self.items
            .iter()
            .map(|item| item.price.saturating_mul(item.quantity))
            .sum()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: Option<i64>,
    pub height: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueRecord {
    pub id: String,
    /// 入库顺序，receivedAt 相同时用于排序
    pub seq: i64,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub sender: String,
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub media_path: Option<String>,
    pub text: String,
    pub text_color: String,
    pub social_type: Option<SocialType>,
    pub social_name: Option<String>,
    pub composed: bool,
    pub duration_seconds: i64,
    pub amount: i64,
    pub status: QueueStatus,
    pub received_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub playing_at: Option<DateTime<Utc>>,
    pub gift: Option<GiftOrder>,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

impl QueueRecord {
    /// 刚提交的记录，id 与 receivedAt 都是新的
    pub fn pending(content_type: ContentType, sender: String, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            seq: 0,
            content_type,
            sender,
            user_id: None,
            email: None,
            avatar: None,
            media_path: None,
            text: String::new(),
            text_color: "white".to_string(),
            social_type: None,
            social_name: None,
            composed: false,
            duration_seconds: 1,
            amount: 0,
            status: QueueStatus::Pending,
            received_at: now,
            approved_at: None,
            playing_at: None,
            gift: None,
            width: None,
            height: None,
        }
    }

    /// 计划的播放结束时间，没有开始播放则为 None
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.playing_at
            .map(|started| started + Duration::seconds(self.duration_seconds))
    }

    /// 剩余播放秒数，最小为 0；缺少 playingAt 时按 0 处理
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        match self.playing_at {
            Some(started) => {
                let elapsed = (now - started).num_seconds();
                (self.duration_seconds - elapsed).max(0)
            }
            None => 0,
        }
    }

    pub fn identity(&self) -> Option<&str> {
        self.user_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// 数据库中的一行队列记录
#[derive(Debug, sqlx::FromRow)]
pub struct QueueRow {
    pub seq: i64,
    pub id: String,
    pub content_type: ContentType,
    pub sender: String,
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub media_path: Option<String>,
    pub text: String,
    pub text_color: String,
    pub social_type: Option<SocialType>,
    pub social_name: Option<String>,
    pub composed: bool,
    pub duration_seconds: i64,
    pub amount: i64,
    pub status: QueueStatus,
    pub received_at: i64,
    pub approved_at: Option<i64>,
    pub playing_at: Option<i64>,
    pub gift_table: Option<i64>,
    pub gift_items: Option<Json<Vec<GiftItem>>>,
    pub gift_note: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

impl From<QueueRow> for QueueRecord {
    fn from(row: QueueRow) -> Self {
        let gift = match (row.content_type, row.gift_table) {
            (ContentType::Gift, Some(table_number)) => Some(GiftOrder {
                table_number,
                items: row.gift_items.map(|items| items.0).unwrap_or_default(),
                note: row.gift_note.unwrap_or_default(),
            }),
            _ => None,
        };
        Self {
            id: row.id,
            seq: row.seq,
            content_type: row.content_type,
            sender: row.sender,
            user_id: row.user_id,
            email: row.email,
            avatar: row.avatar,
            media_path: row.media_path,
            text: row.text,
            text_color: row.text_color,
            social_type: row.social_type,
            social_name: row.social_name,
            composed: row.composed,
            duration_seconds: row.duration_seconds,
            amount: row.amount,
            status: row.status,
            received_at: clock::from_millis(row.received_at),
            approved_at: clock::opt_from_millis(row.approved_at),
            playing_at: clock::opt_from_millis(row.playing_at),
            gift,
            width: row.width,
            height: row.height,
        }
    }
}
