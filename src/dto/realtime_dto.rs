//! 实时通道的消息格式：`{"event": <name>, "data": <payload>}`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::display_config::{DisplayConfig, DisplayConfigUpdate};
use crate::dto::rank_dto::RankBoard;
use crate::dto::status_dto::StatusSnapshot;
use crate::model::queue::{ContentType, GiftOrder, QueueRecord, SocialType};
use crate::model::setting::TimeSetting;

/// 显示端渲染需要的字段
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NowPlaying {
    pub id: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub sender: String,
    pub avatar: Option<String>,
    pub media_path: Option<String>,
    pub text: String,
    pub text_color: String,
    pub social_type: Option<SocialType>,
    pub social_name: Option<String>,
    pub composed: bool,
    pub duration_seconds: i64,
    pub playing_at: Option<DateTime<Utc>>,
    pub gift: Option<GiftOrder>,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

impl From<&QueueRecord> for NowPlaying {
    fn from(record: &QueueRecord) -> Self {
        Self {
            id: record.id.clone(),
            content_type: record.content_type,
            sender: record.sender.clone(),
            avatar: record.avatar.clone(),
            media_path: record.media_path.clone(),
            text: record.text.clone(),
            text_color: record.text_color.clone(),
            social_type: record.social_type,
            social_name: record.social_name.clone(),
            composed: record.composed,
            duration_seconds: record.duration_seconds,
            playing_at: record.playing_at,
            gift: record.gift.clone(),
            width: record.width,
            height: record.height,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    Status(StatusSnapshot),
    NowPlaying(NowPlaying),
    RankingUpdate(RankBoard),
    SettingsUpdated(DisplayConfig),
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientMessage {
    GetConfig,
    AddSetting(TimeSetting),
    /// 套餐 id
    RemoveSetting(String),
    AdminUpdateConfig(DisplayConfigUpdate),
}
