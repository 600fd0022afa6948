use crate::db::database::{Database, DatabaseTrait};
use crate::model::history::{HistoryRecord, HistoryRow};
use crate::utils::clock;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::Sqlite;
use std::sync::Arc;

pub(crate) const HISTORY_COLUMNS: &str = "id, transaction_id, content_type, sender, user_id, \
     email, avatar, amount, outcome, content, media_path, composed, metadata, received_at, \
     decision_at, started_at, ended_at, duration_seconds, decided_by, notes, created_at";

#[derive(Clone)]
pub struct HistoryRepository {
    pub(crate) db_conn: Arc<Database>,
}

impl HistoryRepository {
    pub fn new(db_conn: &Arc<Database>) -> Self {
        Self {
            db_conn: Arc::clone(db_conn),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistoryRepositoryTrait: Send + Sync {
    /// 写入历史，transactionId 已存在时忽略
    async fn insert_if_absent(&self, record: &HistoryRecord) -> Result<bool, sqlx::Error>;

    /// 全部历史，最新的在前
    async fn list(&self) -> Result<Vec<HistoryRecord>, sqlx::Error>;

    async fn find(&self, id: &str) -> Result<Option<HistoryRecord>, sqlx::Error>;

    /// 按队列 id 查找归档记录
    async fn find_by_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Option<HistoryRecord>, sqlx::Error>;

    /// 删除单条历史
    async fn delete(&self, id: &str) -> Result<Option<HistoryRecord>, sqlx::Error>;

    /// 清空历史
    async fn delete_all(&self) -> Result<Vec<HistoryRecord>, sqlx::Error>;

    /// 清理过期的非礼物记录
    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> Result<Vec<HistoryRecord>, sqlx::Error>;

    /// 历史记录引用的媒体文件
    async fn media_references(&self) -> Result<Vec<String>, sqlx::Error>;
}

/// 在给定连接/事务上写入一条历史
pub(crate) async fn insert_history<'e, E>(
    executor: E,
    record: &HistoryRecord,
    or_ignore: bool,
) -> Result<u64, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let verb = if or_ignore { "INSERT OR IGNORE" } else { "INSERT" };
    let sql = format!(
        "{verb} INTO history ({HISTORY_COLUMNS}) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    );
    let sql_ret = sqlx::query(&sql)
        .bind(&record.id)
        .bind(&record.transaction_id)
        .bind(record.content_type)
        .bind(&record.sender)
        .bind(&record.user_id)
        .bind(&record.email)
        .bind(&record.avatar)
        .bind(record.amount)
        .bind(record.outcome)
        .bind(&record.content)
        .bind(&record.media_path)
        .bind(record.composed)
        .bind(Json(record.metadata.clone()))
        .bind(clock::opt_to_millis(record.received_at))
        .bind(clock::to_millis(record.decision_at))
        .bind(clock::opt_to_millis(record.started_at))
        .bind(clock::opt_to_millis(record.ended_at))
        .bind(record.duration_seconds)
        .bind(&record.decided_by)
        .bind(&record.notes)
        .bind(clock::to_millis(record.created_at))
        .execute(executor)
        .await?;
    tracing::debug!(
        "insert_history - transaction_id:{} | outcome:{} | rows_affected:{}",
        record.transaction_id,
        record.outcome,
        sql_ret.rows_affected()
    );
    Ok(sql_ret.rows_affected())
}

#[async_trait]
impl HistoryRepositoryTrait for HistoryRepository {
    async fn insert_if_absent(&self, record: &HistoryRecord) -> Result<bool, sqlx::Error> {
        let rows = insert_history(self.db_conn.get_pool(), record, true).await?;
        Ok(rows > 0)
    }

    async fn list(&self) -> Result<Vec<HistoryRecord>, sqlx::Error> {
        let sql = format!("SELECT {HISTORY_COLUMNS} FROM history ORDER BY decision_at DESC, seq DESC");
        let rows = sqlx::query_as::<_, HistoryRow>(&sql)
            .fetch_all(self.db_conn.get_pool())
            .await?;
        Ok(rows.into_iter().map(HistoryRecord::from).collect())
    }

    async fn find(&self, id: &str) -> Result<Option<HistoryRecord>, sqlx::Error> {
        let sql = format!("SELECT {HISTORY_COLUMNS} FROM history WHERE id = ?");
        let row = sqlx::query_as::<_, HistoryRow>(&sql)
            .bind(id)
            .fetch_optional(self.db_conn.get_pool())
            .await?;
        Ok(row.map(HistoryRecord::from))
    }

    async fn find_by_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Option<HistoryRecord>, sqlx::Error> {
        let sql = format!(
            "SELECT {HISTORY_COLUMNS} FROM history WHERE transaction_id = ? \
             ORDER BY decision_at DESC, seq DESC LIMIT 1"
        );
        let row = sqlx::query_as::<_, HistoryRow>(&sql)
            .bind(transaction_id)
            .fetch_optional(self.db_conn.get_pool())
            .await?;
        Ok(row.map(HistoryRecord::from))
    }

    async fn delete(&self, id: &str) -> Result<Option<HistoryRecord>, sqlx::Error> {
        let sql = format!("DELETE FROM history WHERE id = ? RETURNING {HISTORY_COLUMNS}");
        let row = sqlx::query_as::<_, HistoryRow>(&sql)
            .bind(id)
            .fetch_optional(self.db_conn.get_pool())
            .await?;
        Ok(row.map(HistoryRecord::from))
    }

    async fn delete_all(&self) -> Result<Vec<HistoryRecord>, sqlx::Error> {
        let sql = format!("DELETE FROM history RETURNING {HISTORY_COLUMNS}");
        let rows = sqlx::query_as::<_, HistoryRow>(&sql)
            .fetch_all(self.db_conn.get_pool())
            .await?;
        Ok(rows.into_iter().map(HistoryRecord::from).collect())
    }

    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> Result<Vec<HistoryRecord>, sqlx::Error> {
        let sql = format!(
            "DELETE FROM history WHERE content_type != 'gift' AND created_at < ? \
             RETURNING {HISTORY_COLUMNS}"
        );
        let rows = sqlx::query_as::<_, HistoryRow>(&sql)
            .bind(clock::to_millis(cutoff))
            .fetch_all(self.db_conn.get_pool())
            .await?;
        Ok(rows.into_iter().map(HistoryRecord::from).collect())
    }

    async fn media_references(&self) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT media_path FROM history WHERE media_path IS NOT NULL")
            .fetch_all(self.db_conn.get_pool())
            .await
    }
}
