//! 显示端开关配置
//!
//! All toggles are named fields; [`DisplayConfig::apply`] is the only way to
//! change them.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::model::queue::ContentType;
use crate::model::setting::TimeSetting;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayConfig {
    pub system_on: bool,
    pub enable_image: bool,
    pub enable_text: bool,
    pub enable_gift: bool,
    pub enable_birthday: bool,
    /// 默认价格
    pub price: i64,
    /// 默认时长（秒）
    pub time: i64,
    pub settings: Vec<TimeSetting>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            system_on: true,
            enable_image: true,
            enable_text: true,
            enable_gift: true,
            enable_birthday: true,
            price: 100,
            time: 10,
            settings: vec![],
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DisplayConfigUpdate {
    pub system_on: Option<bool>,
    pub enable_image: Option<bool>,
    pub enable_text: Option<bool>,
    pub enable_gift: Option<bool>,
    pub enable_birthday: Option<bool>,
    #[validate(range(min = 0, max = 100_000_000, message = "price must not be negative"))]
    pub price: Option<i64>,
    #[validate(range(min = 1, max = 86_400, message = "time must be between 1 and 86400 seconds"))]
    pub time: Option<i64>,
}

impl DisplayConfig {
    /// 当前是否接收该类型的投稿
    pub fn accepts(&self, content_type: ContentType) -> bool {
        self.system_on
            && match content_type {
                ContentType::Image => self.enable_image,
                ContentType::Text => self.enable_text,
                ContentType::Gift => self.enable_gift,
                ContentType::Birthday => self.enable_birthday,
            }
    }

    pub fn apply(&mut self, update: DisplayConfigUpdate) -> Result<(), ValidationErrors> {
        update.validate()?;
        let DisplayConfigUpdate {
            system_on,
            enable_image,
            enable_text,
            enable_gift,
            enable_birthday,
            price,
            time,
        } = update;
        if let Some(value) = system_on {
            self.system_on = value;
        }
        if let Some(value) = enable_image {
            self.enable_image = value;
        }
        if let Some(value) = enable_text {
            self.enable_text = value;
        }
        if let Some(value) = enable_gift {
            self.enable_gift = value;
        }
        if let Some(value) = enable_birthday {
            self.enable_birthday = value;
        }
        if let Some(value) = price {
            self.price = value;
        }
        if let Some(value) = time {
            self.time = value;
        }
        Ok(())
    }
}
