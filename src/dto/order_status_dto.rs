//! 订单进度查询的返回值

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::history::Outcome;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum OrderStatus {
    #[serde(rename_all = "camelCase")]
    Pending { position: i64 },
    #[serde(rename_all = "camelCase")]
    Approved {
        position: i64,
        lead_seconds: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        projected_start: Option<DateTime<Utc>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        projected_end: Option<DateTime<Utc>>,
    },
    #[serde(rename_all = "camelCase")]
    Playing { position: i64, remaining_seconds: i64 },
    #[serde(rename_all = "camelCase")]
    Archived {
        outcome: Outcome,
        decision_at: DateTime<Utc>,
    },
    NotFound,
}
