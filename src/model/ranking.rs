//! 排行榜数据模型

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::utils::clock;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    pub user_id: String,
    pub name: String,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub points: i64,
    /// 1 + 分数严格大于自己的人数
    pub rank: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 一次加分请求
#[derive(Clone, Debug, PartialEq)]
pub struct PointsCredit {
    pub user_id: String,
    pub name: String,
    pub amount: i64,
    pub email: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct RankingRow {
    pub user_id: String,
    pub name: String,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub points: i64,
    pub rank: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<RankingRow> for RankingEntry {
    fn from(row: RankingRow) -> Self {
        Self {
            user_id: row.user_id,
            name: row.name,
            email: row.email,
            avatar: row.avatar,
            points: row.points,
            rank: row.rank,
            created_at: clock::from_millis(row.created_at),
            updated_at: clock::from_millis(row.updated_at),
        }
    }
}
