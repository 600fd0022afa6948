//! 排行榜传输用到的数据结构

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::model::ranking::RankingEntry;

#[derive(Clone, Debug, Default, Deserialize, Validate)]
pub struct TopQuery {
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankView {
    /// 榜单中的顺序，从 1 开始
    pub position: i64,
    pub rank: i64,
    pub user_id: String,
    pub name: String,
    pub avatar: Option<String>,
    pub points: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RankBoard {
    pub ranks: Vec<RankView>,
    pub total: i64,
}

impl RankBoard {
    pub fn new(entries: Vec<RankingEntry>, total: i64) -> Self {
        let ranks = entries
            .into_iter()
            .zip(1..)
            .map(|(entry, position)| RankView {
                position,
                rank: entry.rank,
                user_id: entry.user_id,
                name: entry.name,
                avatar: entry.avatar,
                points: entry.points,
            })
            .collect();
        Self { ranks, total }
    }
}
