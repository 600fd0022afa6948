//! 队列相关的请求/响应结构

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::model::queue::{ContentType, Dimensions, GiftItem, GiftOrder, SocialType};

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GiftReq {
    #[validate(range(min = 1, message = "tableNumber must be a positive number"))]
    pub table_number: i64,
    #[validate(length(min = 1, message = "a gift order needs at least one item"))]
    pub items: Vec<GiftItem>,
    #[validate(length(max = 500, message = "note must be at most 500 characters"))]
    pub note: Option<String>,
}

impl From<GiftReq> for GiftOrder {
    fn from(req: GiftReq) -> Self {
        Self {
            table_number: req.table_number,
            items: req.items,
            note: req.note.unwrap_or_default(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReq {
    #[serde(rename = "type")]
    pub content_type: ContentType,
    #[validate(length(max = 500, message = "text must be at most 500 characters"))]
    pub text: Option<String>,
    #[validate(length(max = 32, message = "textColor must be at most 32 characters"))]
    pub text_color: Option<String>,
    pub social_type: Option<SocialType>,
    #[validate(length(max = 64, message = "socialName must be at most 64 characters"))]
    pub social_name: Option<String>,
    #[serde(default)]
    pub composed: bool,
    #[validate(range(
        min = 1,
        max = 86_400,
        message = "durationSeconds must be between 1 and 86400"
    ))]
    pub duration_seconds: i64,
    #[validate(range(min = 0, max = 100_000_000, message = "amount must not be negative"))]
    #[serde(default)]
    pub amount: i64,
    #[validate(length(min = 1, max = 64, message = "sender must be between 1 and 64 characters"))]
    pub sender: String,
    #[validate(length(max = 128, message = "userId must be at most 128 characters"))]
    pub user_id: Option<String>,
    #[validate(email(message = "email is not valid"))]
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub media_path: Option<String>,
    #[validate(nested)]
    pub gift: Option<GiftReq>,
}

#[derive(Clone, Debug, Default, Deserialize, Validate)]
pub struct ApproveReq {
    #[validate(range(min = 1, max = 16_384, message = "width must be between 1 and 16384"))]
    pub width: Option<i64>,
    #[validate(range(min = 1, max = 16_384, message = "height must be between 1 and 16384"))]
    pub height: Option<i64>,
}

impl From<ApproveReq> for Dimensions {
    fn from(req: ApproveReq) -> Self {
        Self {
            width: req.width,
            height: req.height,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RejectReq {
    #[validate(length(max = 64, message = "decidedBy must be at most 64 characters"))]
    pub decided_by: Option<String>,
    #[validate(length(max = 500, message = "reason must be at most 500 characters"))]
    pub reason: Option<String>,
}

/// 新建记录的 id
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreatedRes {
    pub id: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeletedRes {
    pub deleted: usize,
}
