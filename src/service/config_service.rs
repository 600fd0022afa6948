use crate::config::display_config::{DisplayConfig, DisplayConfigUpdate};
use crate::error::api_error::ApiError;
use crate::error::db_error::DbError;
use crate::error::request_error::RequestError;
use crate::model::setting::TimeSetting;
use crate::repository::setting_repository::SettingRepositoryTrait;
use std::sync::Arc;
use tokio::sync::RwLock;
use validator::Validate;

/// 显示端配置，开关保存在内存，套餐保存在数据库
pub struct ConfigService {
    config: RwLock<DisplayConfig>,
    setting_repo: Arc<dyn SettingRepositoryTrait>,
}

impl ConfigService {
    pub fn new(setting_repo: Arc<dyn SettingRepositoryTrait>) -> Self {
        Self {
            config: RwLock::new(DisplayConfig::default()),
            setting_repo,
        }
    }

    /// 启动时从数据库加载套餐
    pub async fn load(&self) -> Result<DisplayConfig, ApiError> {
        self.refresh_settings().await
    }

    pub async fn current(&self) -> DisplayConfig {
        self.config.read().await.clone()
    }

    /// 唯一的配置修改入口
    pub async fn update(&self, update: DisplayConfigUpdate) -> Result<DisplayConfig, ApiError> {
        let mut guard = self.config.write().await;
        guard.apply(update).map_err(RequestError::from)?;
        tracing::info!(
            "display config updated - system_on:{} | price:{} | time:{}",
            guard.system_on,
            guard.price,
            guard.time
        );
        Ok(guard.clone())
    }

    pub async fn add_setting(&self, setting: TimeSetting) -> Result<DisplayConfig, ApiError> {
        setting.validate().map_err(RequestError::from)?;
        self.setting_repo
            .insert(&setting)
            .await
            .map_err(|err| DbError::log("add_setting", err))?;
        self.refresh_settings().await
    }

    pub async fn remove_setting(&self, id: &str) -> Result<DisplayConfig, ApiError> {
        let removed = self
            .setting_repo
            .delete(id)
            .await
            .map_err(|err| DbError::log("remove_setting", err))?;
        if !removed {
            tracing::warn!("remove_setting - id:{} not found", id);
        }
        self.refresh_settings().await
    }

    async fn refresh_settings(&self) -> Result<DisplayConfig, ApiError> {
        let settings = self
            .setting_repo
            .list()
            .await
            .map_err(|err| DbError::log("list settings", err))?;
        let mut guard = self.config.write().await;
        guard.settings = settings;
        Ok(guard.clone())
    }
}
