use crate::db::database::{Database, DatabaseTrait};
use crate::model::setting::TimeSetting;
use crate::utils::clock;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

#[derive(Clone)]
pub struct SettingRepository {
    pub(crate) db_conn: Arc<Database>,
}

impl SettingRepository {
    pub fn new(db_conn: &Arc<Database>) -> Self {
        Self {
            db_conn: Arc::clone(db_conn),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettingRepositoryTrait: Send + Sync {
    /// 全部套餐，最新的在前
    async fn list(&self) -> Result<Vec<TimeSetting>, sqlx::Error>;

    async fn insert(&self, setting: &TimeSetting) -> Result<(), sqlx::Error>;

    /// 返回是否删除了记录
    async fn delete(&self, id: &str) -> Result<bool, sqlx::Error>;
}

#[async_trait]
impl SettingRepositoryTrait for SettingRepository {
    async fn list(&self) -> Result<Vec<TimeSetting>, sqlx::Error> {
        sqlx::query_as::<_, TimeSetting>(
            "SELECT id, mode, date, duration, price FROM time_settings ORDER BY seq DESC",
        )
        .fetch_all(self.db_conn.get_pool())
        .await
    }

    async fn insert(&self, setting: &TimeSetting) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO time_settings (id, mode, date, duration, price, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&setting.id)
        .bind(&setting.mode)
        .bind(&setting.date)
        .bind(&setting.duration)
        .bind(setting.price)
        .bind(clock::to_millis(Utc::now()))
        .execute(self.db_conn.get_pool())
        .await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, sqlx::Error> {
        let sql_ret = sqlx::query("DELETE FROM time_settings WHERE id = ?")
            .bind(id)
            .execute(self.db_conn.get_pool())
            .await?;
        Ok(sql_ret.rows_affected() > 0)
    }
}
