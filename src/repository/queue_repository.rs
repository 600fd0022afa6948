use crate::db::database::{Database, DatabaseTrait};
use crate::model::history::{Archival, HistoryRecord};
use crate::model::queue::{Dimensions, QueueRecord, QueueRow};
use crate::repository::history_repository::insert_history;
use crate::utils::clock;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use std::sync::Arc;

pub(crate) const QUEUE_COLUMNS: &str = "seq, id, content_type, sender, user_id, email, avatar, \
     media_path, text, text_color, social_type, social_name, composed, duration_seconds, amount, \
     status, received_at, approved_at, playing_at, gift_table, gift_items, gift_note, width, height";

#[derive(Clone)]
pub struct QueueRepository {
    pub(crate) db_conn: Arc<Database>,
}

impl QueueRepository {
    pub fn new(db_conn: &Arc<Database>) -> Self {
        Self {
            db_conn: Arc::clone(db_conn),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueueRepositoryTrait: Send + Sync {
    /// 新记录入库，返回带 seq 的记录
    async fn insert(&self, record: &QueueRecord) -> Result<QueueRecord, sqlx::Error>;

    async fn find(&self, id: &str) -> Result<Option<QueueRecord>, sqlx::Error>;

    /// 未归档的记录，按 receivedAt、seq 升序
    async fn list(&self) -> Result<Vec<QueueRecord>, sqlx::Error>;

    /// 正在播放的记录
    async fn find_playing(&self) -> Result<Vec<QueueRecord>, sqlx::Error>;

    /// pending -> approved，记录不是 pending 时返回 None
    async fn approve(
        &self,
        id: &str,
        dims: Dimensions,
        at: DateTime<Utc>,
    ) -> Result<Option<QueueRecord>, sqlx::Error>;

    /// approved -> playing，仅当没有其它记录在播放时成功
    async fn claim_slot(&self, id: &str, at: DateTime<Utc>)
        -> Result<Option<QueueRecord>, sqlx::Error>;

    /// 在一个事务里删除队列记录并写入历史；
    /// 记录已不存在或状态不是 `archival.from_status` 时返回 None
    async fn archive(
        &self,
        id: &str,
        archival: &Archival,
    ) -> Result<Option<HistoryRecord>, sqlx::Error>;

    /// 直接删除，不写历史
    async fn evict(&self, id: &str) -> Result<bool, sqlx::Error>;

    /// 队列记录引用的媒体文件
    async fn media_references(&self) -> Result<Vec<String>, sqlx::Error>;
}

#[async_trait]
impl QueueRepositoryTrait for QueueRepository {
    async fn insert(&self, record: &QueueRecord) -> Result<QueueRecord, sqlx::Error> {
        let sql = format!(
            "INSERT INTO queue (id, content_type, sender, user_id, email, avatar, media_path, \
             text, text_color, social_type, social_name, composed, duration_seconds, amount, \
             status, received_at, approved_at, playing_at, gift_table, gift_items, gift_note, \
             width, height) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING {QUEUE_COLUMNS}"
        );
        let gift = record.gift.as_ref();
        let row = sqlx::query_as::<_, QueueRow>(&sql)
            .bind(&record.id)
            .bind(record.content_type)
            .bind(&record.sender)
            .bind(&record.user_id)
            .bind(&record.email)
            .bind(&record.avatar)
            .bind(&record.media_path)
            .bind(&record.text)
            .bind(&record.text_color)
            .bind(record.social_type)
            .bind(&record.social_name)
            .bind(record.composed)
            .bind(record.duration_seconds)
            .bind(record.amount)
            .bind(record.status)
            .bind(clock::to_millis(record.received_at))
            .bind(clock::opt_to_millis(record.approved_at))
            .bind(clock::opt_to_millis(record.playing_at))
            .bind(gift.map(|order| order.table_number))
            .bind(gift.map(|order| Json(order.items.clone())))
            .bind(gift.map(|order| order.note.clone()))
            .bind(record.width)
            .bind(record.height)
            .fetch_one(self.db_conn.get_pool())
            .await?;
        tracing::debug!(
            "queue insert - id:{} | type:{} | seq:{}",
            row.id,
            row.content_type,
            row.seq
        );
        Ok(QueueRecord::from(row))
    }

    async fn find(&self, id: &str) -> Result<Option<QueueRecord>, sqlx::Error> {
        let sql = format!("SELECT {QUEUE_COLUMNS} FROM queue WHERE id = ?");
        let row = sqlx::query_as::<_, QueueRow>(&sql)
            .bind(id)
            .fetch_optional(self.db_conn.get_pool())
            .await?;
        Ok(row.map(QueueRecord::from))
    }

    async fn list(&self) -> Result<Vec<QueueRecord>, sqlx::Error> {
        let sql = format!("SELECT {QUEUE_COLUMNS} FROM queue ORDER BY received_at ASC, seq ASC");
        let rows = sqlx::query_as::<_, QueueRow>(&sql)
            .fetch_all(self.db_conn.get_pool())
            .await?;
        Ok(rows.into_iter().map(QueueRecord::from).collect())
    }

    async fn find_playing(&self) -> Result<Vec<QueueRecord>, sqlx::Error> {
        let sql = format!(
            "SELECT {QUEUE_COLUMNS} FROM queue WHERE status = 'playing' ORDER BY playing_at ASC"
        );
        let rows = sqlx::query_as::<_, QueueRow>(&sql)
            .fetch_all(self.db_conn.get_pool())
            .await?;
        Ok(rows.into_iter().map(QueueRecord::from).collect())
    }

    async fn approve(
        &self,
        id: &str,
        dims: Dimensions,
        at: DateTime<Utc>,
    ) -> Result<Option<QueueRecord>, sqlx::Error> {
        let sql = format!(
            "UPDATE queue SET status = 'approved', approved_at = ?, \
             width = COALESCE(?, width), height = COALESCE(?, height) \
             WHERE id = ? AND status = 'pending' RETURNING {QUEUE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, QueueRow>(&sql)
            .bind(clock::to_millis(at))
            .bind(dims.width)
            .bind(dims.height)
            .bind(id)
            .fetch_optional(self.db_conn.get_pool())
            .await?;
        Ok(row.map(QueueRecord::from))
    }

    async fn claim_slot(
        &self,
        id: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<QueueRecord>, sqlx::Error> {
        let sql = format!(
            "UPDATE queue SET status = 'playing', playing_at = ? \
             WHERE id = ? AND status = 'approved' \
             AND NOT EXISTS (SELECT 1 FROM queue WHERE status = 'playing') \
             RETURNING {QUEUE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, QueueRow>(&sql)
            .bind(clock::to_millis(at))
            .bind(id)
            .fetch_optional(self.db_conn.get_pool())
            .await?;
        Ok(row.map(QueueRecord::from))
    }

    async fn archive(
        &self,
        id: &str,
        archival: &Archival,
    ) -> Result<Option<HistoryRecord>, sqlx::Error> {
        let mut tx = self.db_conn.get_pool().begin().await?;
        let sql = format!(
            "DELETE FROM queue WHERE id = ? AND (? IS NULL OR status = ?) RETURNING {QUEUE_COLUMNS}"
        );
        let removed = sqlx::query_as::<_, QueueRow>(&sql)
            .bind(id)
            .bind(archival.from_status)
            .bind(archival.from_status)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = removed else {
            // 已被其它请求归档，或者状态不符
            tx.rollback().await?;
            return Ok(None);
        };

        let history = HistoryRecord::snapshot(&QueueRecord::from(row), archival);
        insert_history(&mut *tx, &history, false).await?;
        tx.commit().await?;
        tracing::info!(
            "queue archive - id:{} | outcome:{} | decided_by:{}",
            id,
            history.outcome,
            archival.decided_by
        );
        Ok(Some(history))
    }

    async fn evict(&self, id: &str) -> Result<bool, sqlx::Error> {
        let sql_ret = sqlx::query("DELETE FROM queue WHERE id = ?")
            .bind(id)
            .execute(self.db_conn.get_pool())
            .await?;
        Ok(sql_ret.rows_affected() > 0)
    }

    async fn media_references(&self) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT media_path FROM queue WHERE media_path IS NOT NULL")
            .fetch_all(self.db_conn.get_pool())
            .await
    }
}
