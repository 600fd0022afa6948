use crate::dto::queue_dto::SubmissionReq;
use crate::error::api_error::ApiError;
use crate::error::db_error::DbError;
use crate::error::queue_error::QueueError;
use crate::error::request_error::RequestError;
use crate::model::queue::{ContentType, GiftOrder, QueueRecord};
use crate::model::ranking::PointsCredit;
use crate::repository::queue_repository::QueueRepositoryTrait;
use crate::service::config_service::ConfigService;
use crate::service::rank_service::RankService;
use crate::service::status_service::StatusService;
use crate::utils::media::MediaStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use validator::Validate;

pub struct IntakeService {
    queue_repo: Arc<dyn QueueRepositoryTrait>,
    config_service: Arc<ConfigService>,
    rank_service: Arc<RankService>,
    status_service: Arc<StatusService>,
    gift_table_count: i64,
}

impl IntakeService {
    pub fn new(
        queue_repo: Arc<dyn QueueRepositoryTrait>,
        config_service: &Arc<ConfigService>,
        rank_service: &Arc<RankService>,
        status_service: &Arc<StatusService>,
        gift_table_count: i64,
    ) -> Self {
        Self {
            queue_repo,
            config_service: Arc::clone(config_service),
            rank_service: Arc::clone(rank_service),
            status_service: Arc::clone(status_service),
            gift_table_count,
        }
    }

    /// 新投稿入队，状态为 pending
    pub async fn submit(
        &self,
        req: SubmissionReq,
        now: DateTime<Utc>,
    ) -> Result<QueueRecord, ApiError> {
        req.validate().map_err(RequestError::from)?;
        if !self.config_service.current().await.accepts(req.content_type) {
            return Err(QueueError::Disabled(req.content_type).into());
        }
        let record = self.build_record(req, now)?;
        let record = self
            .queue_repo
            .insert(&record)
            .await
            .map_err(|err| DbError::log("submit", err))?;
        tracing::info!(
            "submission received - id:{} | type:{} | amount:{}",
            record.id,
            record.content_type,
            record.amount
        );

        if let Some(user_id) = record.identity() {
            let credit = PointsCredit {
                user_id: user_id.to_string(),
                name: record.sender.clone(),
                amount: record.amount,
                email: record.email.clone(),
                avatar: record.avatar.clone(),
            };
            // 排行榜失败不影响投稿
            if let Err(err) = self.rank_service.add_points(credit, now).await {
                tracing::error!("submit add_points failed - id:{} | err:{}", record.id, err);
            }
        }
        self.status_service.publish().await;
        Ok(record)
    }

    fn build_record(&self, req: SubmissionReq, now: DateTime<Utc>) -> Result<QueueRecord, RequestError> {
        let text = req.text.map(|text| text.trim().to_string()).unwrap_or_default();
        let media_path = req.media_path.filter(|path| !path.trim().is_empty());
        if let Some(path) = &media_path {
            MediaStore::relative_name(path)
                .map_err(|err| RequestError::CommonError(err.to_string()))?;
        }
        if req.content_type.requires_media() && media_path.is_none() {
            return Err(RequestError::CommonError(format!(
                "{} submissions require a mediaPath",
                req.content_type
            )));
        }
        if req.content_type == ContentType::Text && text.is_empty() {
            return Err(RequestError::CommonError("text submissions require text".into()));
        }

        let gift = match (req.content_type, req.gift) {
            (ContentType::Gift, Some(gift)) => {
                if gift.table_number > self.gift_table_count {
                    return Err(RequestError::CommonError(format!(
                        "tableNumber must be between 1 and {}",
                        self.gift_table_count
                    )));
                }
                Some(GiftOrder::from(gift))
            }
            (ContentType::Gift, None) => {
                return Err(RequestError::CommonError("gift submissions require a gift order".into()))
            }
            _ => None,
        };
        // 礼物没有填金额时按明细计算
        let amount = match &gift {
            Some(order) if req.amount == 0 => order.total_price(),
            _ => req.amount,
        };

        let mut record = QueueRecord::pending(req.content_type, req.sender.trim().to_string(), now);
        record.user_id = req.user_id;
        record.email = req.email;
        record.avatar = req.avatar;
        record.media_path = media_path;
        record.text = text;
        if let Some(color) = req.text_color.filter(|color| !color.is_empty()) {
            record.text_color = color;
        }
        record.social_type = req.social_type;
        record.social_name = req.social_name;
        record.composed = req.composed;
        record.duration_seconds = req.duration_seconds;
        record.amount = amount;
        record.gift = gift;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::display_config::DisplayConfigUpdate;
    use crate::service::test_support;

    fn image_req() -> SubmissionReq {
        serde_json::from_value(serde_json::json!({
            "type": "image",
            "durationSeconds": 30,
            "amount": 0,
            "sender": "Fern",
            "mediaPath": "/uploads/fern.jpg"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn anonymous_image_enters_as_pending() {
        let ctx = test_support::context().await;
        let record = ctx.services.intake.submit(image_req(), Utc::now()).await.unwrap();

        let queue = ctx.services.queue_repo.list().await.unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].id, record.id);
        assert_eq!(queue[0].status, crate::model::queue::QueueStatus::Pending);
        assert_eq!(ctx.services.rank.top(10).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn disabled_type_is_refused() {
        let ctx = test_support::context().await;
        ctx.services
            .config
            .update(DisplayConfigUpdate {
                enable_image: Some(false),
                ..Default::default()
            })
            .await
            .unwrap();

        let err = ctx.services.intake.submit(image_req(), Utc::now()).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::QueueError(QueueError::Disabled(ContentType::Image))
        ));
        assert!(ctx.services.queue_repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn gift_amount_defaults_to_item_total_and_credits_points() {
        let ctx = test_support::context().await;
        let req: SubmissionReq = serde_json::from_value(serde_json::json!({
            "type": "gift",
            "durationSeconds": 15,
            "sender": "Best",
            "userId": "line-42",
            "gift": {
                "tableNumber": 4,
                "items": [{ "id": "b", "name": "Beer", "quantity": 3, "price": 90 }]
            }
        }))
        .unwrap();

        let record = ctx.services.intake.submit(req, Utc::now()).await.unwrap();
        assert_eq!(record.amount, 270);
        let board = ctx.services.rank.top(3).await.unwrap();
        assert_eq!(board.total, 1);
        assert_eq!(board.ranks[0].points, 270);
    }

    #[tokio::test]
    async fn missing_required_fields_are_rejected() {
        let ctx = test_support::context().await;
        let mut no_media = image_req();
        no_media.media_path = None;
        assert!(ctx.services.intake.submit(no_media, Utc::now()).await.is_err());

        let mut zero_duration = image_req();
        zero_duration.duration_seconds = 0;
        assert!(ctx.services.intake.submit(zero_duration, Utc::now()).await.is_err());

        let table_out_of_range: SubmissionReq = serde_json::from_value(serde_json::json!({
            "type": "gift",
            "durationSeconds": 15,
            "sender": "Best",
            "gift": { "tableNumber": 99, "items": [{ "name": "Beer", "quantity": 1, "price": 90 }] }
        }))
        .unwrap();
        assert!(ctx.services.intake.submit(table_out_of_range, Utc::now()).await.is_err());
        assert!(ctx.services.queue_repo.list().await.unwrap().is_empty());
    }
}
