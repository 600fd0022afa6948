use crate::db::database::{Database, DatabaseTrait};
use crate::model::ranking::{PointsCredit, RankingEntry, RankingRow};
use crate::utils::clock;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

const RANKING_COLUMNS: &str =
    "user_id, name, email, avatar, points, rank, created_at, updated_at";

#[derive(Clone)]
pub struct RankRepository {
    pub(crate) db_conn: Arc<Database>,
}

impl RankRepository {
    pub fn new(db_conn: &Arc<Database>) -> Self {
        Self {
            db_conn: Arc::clone(db_conn),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RankRepositoryTrait: Send + Sync {
    /// 加分并重新计算全部名次，返回更新后的条目
    async fn add_points(
        &self,
        credit: &PointsCredit,
        at: DateTime<Utc>,
    ) -> Result<RankingEntry, sqlx::Error>;

    /// 前 N 名，分数相同按加入顺序
    async fn top(&self, limit: i64) -> Result<Vec<RankingEntry>, sqlx::Error>;

    /// 上榜人数
    async fn count(&self) -> Result<i64, sqlx::Error>;

    async fn find(&self, user_id: &str) -> Result<Option<RankingEntry>, sqlx::Error>;
}

#[async_trait]
impl RankRepositoryTrait for RankRepository {
    async fn add_points(
        &self,
        credit: &PointsCredit,
        at: DateTime<Utc>,
    ) -> Result<RankingEntry, sqlx::Error> {
        let now = clock::to_millis(at);
        let mut tx = self.db_conn.get_pool().begin().await?;

        sqlx::query(
            "INSERT INTO rankings (user_id, name, email, avatar, points, rank, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, 0, ?, ?) \
             ON CONFLICT(user_id) DO UPDATE SET \
                points = rankings.points + excluded.points, \
                name = excluded.name, \
                email = COALESCE(excluded.email, rankings.email), \
                avatar = COALESCE(excluded.avatar, rankings.avatar), \
                updated_at = excluded.updated_at",
        )
        .bind(&credit.user_id)
        .bind(&credit.name)
        .bind(&credit.email)
        .bind(&credit.avatar)
        .bind(credit.amount)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        // 名次 = 1 + 分数严格更高的人数
        sqlx::query(
            "UPDATE rankings SET rank = 1 + \
             (SELECT COUNT(*) FROM rankings AS other WHERE other.points > rankings.points)",
        )
        .execute(&mut *tx)
        .await?;

        let sql = format!("SELECT {RANKING_COLUMNS} FROM rankings WHERE user_id = ?");
        let row = sqlx::query_as::<_, RankingRow>(&sql)
            .bind(&credit.user_id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::debug!(
            "add_points - user_id:{} | amount:{} | points:{} | rank:{}",
            row.user_id,
            credit.amount,
            row.points,
            row.rank
        );
        Ok(RankingEntry::from(row))
    }

    async fn top(&self, limit: i64) -> Result<Vec<RankingEntry>, sqlx::Error> {
        let sql = format!(
            "SELECT {RANKING_COLUMNS} FROM rankings ORDER BY points DESC, seq ASC LIMIT ?"
        );
        let rows = sqlx::query_as::<_, RankingRow>(&sql)
            .bind(limit)
            .fetch_all(self.db_conn.get_pool())
            .await?;
        Ok(rows.into_iter().map(RankingEntry::from).collect())
    }

    async fn count(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM rankings")
            .fetch_one(self.db_conn.get_pool())
            .await
    }

    async fn find(&self, user_id: &str) -> Result<Option<RankingEntry>, sqlx::Error> {
        let sql = format!("SELECT {RANKING_COLUMNS} FROM rankings WHERE user_id = ?");
        let row = sqlx::query_as::<_, RankingRow>(&sql)
            .bind(user_id)
            .fetch_optional(self.db_conn.get_pool())
            .await?;
        Ok(row.map(RankingEntry::from))
    }
}
