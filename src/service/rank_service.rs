use crate::dto::rank_dto::RankBoard;
use crate::dto::realtime_dto::ServerEvent;
use crate::error::api_error::ApiError;
use crate::error::db_error::DbError;
use crate::model::ranking::{PointsCredit, RankingEntry};
use crate::realtime::hub::RealtimeHub;
use crate::repository::rank_repository::RankRepositoryTrait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub const DEFAULT_TOP_LIMIT: i64 = 3;

pub struct RankService {
    rank_repo: Arc<dyn RankRepositoryTrait>,
    hub: RealtimeHub,
    /// 广播的榜单人数
    top_n: i64,
}

impl RankService {
    pub fn new(rank_repo: Arc<dyn RankRepositoryTrait>, hub: &RealtimeHub, top_n: i64) -> Self {
        Self {
            rank_repo,
            hub: hub.clone(),
            top_n: top_n.max(1),
        }
    }

    /// 匿名或金额不大于 0 时不加分，返回 None
    pub async fn add_points(
        &self,
        credit: PointsCredit,
        at: DateTime<Utc>,
    ) -> Result<Option<RankingEntry>, ApiError> {
        let user_id = credit.user_id.trim();
        if user_id.is_empty() || credit.amount <= 0 {
            return Ok(None);
        }
        let credit = PointsCredit {
            user_id: user_id.to_string(),
            ..credit
        };
        let entry = self
            .rank_repo
            .add_points(&credit, at)
            .await
            .map_err(|err| DbError::log("add_points", err))?;

        let board = self.top(self.top_n).await?;
        self.hub.publish(ServerEvent::RankingUpdate(board));
        Ok(Some(entry))
    }

    pub async fn top(&self, limit: i64) -> Result<RankBoard, ApiError> {
        let entries = self
            .rank_repo
            .top(limit)
            .await
            .map_err(|err| DbError::log("ranking top", err))?;
        let total = self
            .rank_repo
            .count()
            .await
            .map_err(|err| DbError::log("ranking count", err))?;
        Ok(RankBoard::new(entries, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::database::Database;
    use crate::repository::rank_repository::{MockRankRepositoryTrait, RankRepository};

    fn credit(user_id: &str, amount: i64) -> PointsCredit {
        PointsCredit {
            user_id: user_id.into(),
            name: "Pim".into(),
            amount,
            email: None,
            avatar: None,
        }
    }

    #[tokio::test]
    async fn anonymous_and_free_submissions_earn_nothing() {
        let mut repo = MockRankRepositoryTrait::new();
        repo.expect_add_points().never();
        let hub = RealtimeHub::default();
        let mut rx = hub.subscribe();
        let service = RankService::new(Arc::new(repo), &hub, 3);

        assert_eq!(service.add_points(credit("  ", 50), Utc::now()).await.unwrap(), None);
        assert_eq!(service.add_points(credit("u1", 0), Utc::now()).await.unwrap(), None);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn every_credit_broadcasts_top_board() {
        let db = Arc::new(Database::in_memory().await);
        let hub = RealtimeHub::default();
        let mut rx = hub.subscribe();
        let service = RankService::new(Arc::new(RankRepository::new(&db)), &hub, 2);

        service.add_points(credit("u1", 50), Utc::now()).await.unwrap();
        let entry = service
            .add_points(credit("u1", 30), Utc::now())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.points, 80);
        service.add_points(credit("u2", 100), Utc::now()).await.unwrap();
        service.add_points(credit("u3", 10), Utc::now()).await.unwrap();

        let mut last = None;
        while let Ok(event) = rx.try_recv() {
            last = Some(event);
        }
        let Some(ServerEvent::RankingUpdate(board)) = last else {
            panic!("no ranking update");
        };
        assert_eq!(board.total, 3);
        assert_eq!(board.ranks.len(), 2);
        assert_eq!(board.ranks[0].user_id, "u2");
        assert_eq!(board.ranks[0].position, 1);
        assert_eq!(board.ranks[1].user_id, "u1");
        assert_eq!(board.ranks[1].points, 80);
        assert_eq!(board.ranks[1].rank, 2);
    }
}
