//! 时长/价格套餐，通过实时通道增删

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TimeSetting {
    #[validate(length(min = 1, max = 64, message = "id must be between 1 and 64 characters"))]
    pub id: String,
    #[validate(length(min = 1, max = 32, message = "mode must be between 1 and 32 characters"))]
    pub mode: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub duration: String,
    #[validate(range(min = 0, max = 100_000_000, message = "price must not be negative"))]
    #[serde(default)]
    pub price: i64,
}
